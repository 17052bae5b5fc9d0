//! `credvault add` — encrypt and store a new credential.

use crate::cli::output;
use crate::cli::{read_secret_value, submit_with_prompt, Cli, Context};
use crate::errors::{CredVaultError, Result};
use crate::session::SubmitOutcome;

/// Execute the `add` command.
pub fn execute(cli: &Cli, service: &str, identifier: &str, value: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut session = ctx.open_session()?;

    let secret = read_secret_value(&format!("Enter secret for {service}"), value)?;
    session.create_record(service, identifier, &secret)?;
    drop(secret);

    // Nothing is encrypted until the master password checks out.
    let outcome = submit_with_prompt(&mut session)?;
    session.sign_out();

    match outcome {
        SubmitOutcome::Created(id) => {
            output::success(&format!("Saved credential for '{service}' ({id})"));
            output::tip("Run `credvault list` to see all credentials.");
            Ok(())
        }
        SubmitOutcome::Revealed => Err(CredVaultError::CommandFailed(
            "unexpected reveal while creating a record".into(),
        )),
    }
}
