//! Session module — the reveal/edit access-control state machine.
//!
//! This module provides:
//! - `SessionController`, which gates every decrypt and re-encrypt
//!   behind a fresh master-password verification (`controller`)
//! - The public `Phase`, `Pending` and `SubmitOutcome` views (`state`)

pub mod controller;
pub mod state;

pub use controller::SessionController;
pub use state::{Pending, Phase, SubmitOutcome};
