//! `credvault reveal` — decrypt and print a single credential's secret.

use crate::cli::{resolve_record_id, submit_with_prompt, Cli, Context};
use crate::errors::Result;

/// Execute the `reveal` command.
pub fn execute(cli: &Cli, id: &str) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut session = ctx.open_session()?;

    let id = resolve_record_id(&session, id)?;
    session.request_reveal_by_id(&id)?;
    submit_with_prompt(&mut session)?;

    // Print only the value to stdout so it can be piped.
    if let Some(secret) = session.revealed() {
        println!("{secret}");
    }

    session.sign_out();
    Ok(())
}
