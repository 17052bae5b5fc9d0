//! One module per subcommand, each exposing `execute`.

pub mod add;
pub mod delete;
pub mod edit;
pub mod list;
pub mod register;
pub mod reveal;
