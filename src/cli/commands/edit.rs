//! `credvault edit` — replace a credential's secret.
//!
//! The record is unlocked first; the new value is then encrypted with
//! the master password verified for that unlock.

use crate::cli::output;
use crate::cli::{read_secret_value, resolve_record_id, submit_with_prompt, Cli, Context};
use crate::errors::Result;

/// Execute the `edit` command.
pub fn execute(cli: &Cli, id: &str, value: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut session = ctx.open_session()?;

    let id = resolve_record_id(&session, id)?;
    session.request_reveal_by_id(&id)?;
    submit_with_prompt(&mut session)?;

    let service = session
        .active_record()
        .map(|r| r.service.clone())
        .unwrap_or_default();

    let new_secret = read_secret_value(&format!("Enter new secret for {service}"), value)?;
    session.save_edit(&new_secret)?;
    drop(new_secret);
    session.sign_out();

    output::success(&format!("Updated credential for '{service}' ({id})"));
    Ok(())
}
