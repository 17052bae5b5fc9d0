//! `credvault delete` — remove a credential from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{resolve_record_id, submit_with_prompt, Cli, Context};
use crate::errors::{CredVaultError, Result};

/// Execute the `delete` command.
///
/// Deleting requires the same master-password unlock as revealing.
pub fn execute(cli: &Cli, id: &str, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut session = ctx.open_session()?;

    let id = resolve_record_id(&session, id)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete credential '{id}'?"))
            .default(false)
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    session.request_reveal_by_id(&id)?;
    submit_with_prompt(&mut session)?;
    let deleted = session.delete_active()?;
    session.sign_out();

    output::success(&format!("Deleted credential '{deleted}'"));
    Ok(())
}
