//! `credvault register` — create an account for the owner.

use crate::auth::AccountStore;
use crate::cli::output;
use crate::cli::{prompt_new_password, Cli, Context};
use crate::errors::{CredVaultError, Result};

/// Execute the `register` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;

    let mut accounts = AccountStore::open(&ctx.vault_dir)?;
    if accounts.contains(&ctx.owner) {
        return Err(CredVaultError::AccountAlreadyExists(ctx.owner.to_string()));
    }

    let password = prompt_new_password()?;
    accounts.register(&ctx.owner, &password)?;

    output::success(&format!(
        "Account created for '{}' in {}",
        ctx.owner,
        ctx.vault_dir.display()
    ));
    output::tip("Run `credvault add <SERVICE> <IDENTIFIER>` to store a credential.");

    Ok(())
}
