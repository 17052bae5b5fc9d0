//! `credvault list` — display the owner's credentials in a table.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;

/// Execute the `list` command.
///
/// Only plaintext labels are shown, so no master password is needed.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let session = ctx.open_session()?;

    let records = session.list_records()?;
    output::info(&format!("{} — {} credential(s)", ctx.owner, records.len()));
    output::print_records_table(&records);

    session.sign_out();
    Ok(())
}
