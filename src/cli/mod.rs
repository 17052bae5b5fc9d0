//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use crate::auth::AccountStore;
use crate::config::Settings;
use crate::crypto::EnvelopeCodec;
use crate::errors::{CredVaultError, Result};
use crate::session::{SessionController, SubmitOutcome};
use crate::vault::{FileRecordStore, OwnerId, RecordId};

/// Environment variable consulted before prompting for the master password.
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// CredVault CLI: personal credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Personal credential vault with envelope-encrypted secrets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: .credvault, or `vault_dir` in .credvault.toml)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,

    /// Vault owner identity, e.g. your email address
    #[arg(short, long, env = "CREDVAULT_OWNER", global = true)]
    pub owner: Option<String>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create an account protected by a master password
    Register,

    /// Store a new credential
    Add {
        /// Service name (e.g. github.com)
        service: String,
        /// Login identifier for the service (username or email)
        identifier: String,
        /// Secret value (omit for interactive prompt)
        value: Option<String>,
    },

    /// List stored credentials (never decrypts)
    List,

    /// Decrypt and print a credential's secret
    Reveal {
        /// Record id (or a unique prefix of it)
        id: String,
    },

    /// Replace a credential's secret
    Edit {
        /// Record id (or a unique prefix of it)
        id: String,
        /// New secret value (omit for interactive prompt)
        value: Option<String>,
    },

    /// Delete a credential
    Delete {
        /// Record id (or a unique prefix of it)
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// The session type every command works with.
pub type CliSession = SessionController<FileRecordStore, AccountStore>;

/// Resolved settings, paths, and identity for one invocation.
pub struct Context {
    pub settings: Settings,
    pub vault_dir: PathBuf,
    pub owner: OwnerId,
}

impl Context {
    /// Load `.credvault.toml` from the working directory and apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut settings = Settings::load(&cwd)?;
        if let Some(dir) = &cli.vault_dir {
            settings.vault_dir = dir.clone();
            settings.validate()?;
        }
        let vault_dir = settings.vault_dir(&cwd);

        let owner = cli
            .owner
            .as_deref()
            .or(settings.default_owner.as_deref())
            .ok_or_else(|| {
                CredVaultError::ConfigError(
                    "no owner given — pass --owner, set CREDVAULT_OWNER, or set default_owner in .credvault.toml".into(),
                )
            })?;
        let owner = OwnerId::new(owner)?;

        Ok(Self {
            settings,
            vault_dir,
            owner,
        })
    }

    /// Open the record store, the account registry, and a session over both.
    ///
    /// The codec uses the KDF settings recorded in the vault, not the
    /// current config, so existing envelopes stay readable.
    pub fn open_session(&self) -> Result<CliSession> {
        let store = FileRecordStore::open(&self.vault_dir, self.settings.kdf_params()?)?;
        let codec = EnvelopeCodec::new(store.kdf_params()?);
        let accounts = AccountStore::open(&self.vault_dir)?;

        if !accounts.contains(&self.owner) {
            output::tip("No account for this owner yet — run `credvault register` first.");
        }

        let mut session = SessionController::new(self.owner.clone(), store, accounts, codec)
            .with_max_attempts(self.settings.max_credential_attempts);
        if let Some(timeout) = self.settings.unlock_timeout() {
            session = session.with_unlock_timeout(timeout);
        }
        Ok(session)
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` enables debug logs
/// for this crate and everything else stays at `warn`.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "credvault=debug" } else { "warn" })
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Get the master password from `CREDVAULT_PASSWORD` or an interactive prompt.
///
/// The flag is `true` when the value came from the environment, where
/// retrying would only repeat the same answer.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<(Zeroizing<String>, bool)> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok((Zeroizing::new(pw), true));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok((Zeroizing::new(pw), false))
}

/// Prompt for a new master password with confirmation (used by `register`).
///
/// Also respects `CREDVAULT_PASSWORD` for scripted usage.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let password = dialoguer::Password::new()
        .with_prompt("Choose master password")
        .with_confirmation(
            "Confirm master password",
            "Passwords do not match, try again",
        )
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))?;

    Ok(Zeroizing::new(password))
}

/// Read a secret value from the command line, piped stdin, or a hidden prompt.
pub fn read_secret_value(prompt: &str, inline: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = inline {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line — it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\r', '\n']).to_string();
        return Ok(Zeroizing::new(trimmed));
    }

    // Source 3: Interactive secure prompt (default).
    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Feed master passwords to `session` until the pending action runs.
///
/// Wrong interactive passwords are retried until the session's attempt
/// limit is hit; a wrong `CREDVAULT_PASSWORD` fails immediately.
pub fn submit_with_prompt(session: &mut CliSession) -> Result<SubmitOutcome> {
    loop {
        let (password, from_env) = prompt_password()?;
        match session.submit_credential(&password) {
            Err(CredVaultError::InvalidCredential) if !from_env => {
                output::warning("Invalid master password. Please try again.");
            }
            other => return other,
        }
    }
}

/// Resolve a full record id or a unique prefix among the owner's records.
pub fn resolve_record_id(session: &CliSession, input: &str) -> Result<RecordId> {
    let records = session.list_records()?;

    if let Some(exact) = records.iter().find(|r| r.id.as_str() == input) {
        return Ok(exact.id.clone());
    }

    let mut matches = records.iter().filter(|r| r.id.as_str().starts_with(input));
    match (matches.next(), matches.next()) {
        (Some(only), None) if !input.is_empty() => Ok(only.id.clone()),
        (Some(_), Some(_)) => Err(CredVaultError::InvalidInput(format!(
            "record id prefix '{input}' is ambiguous"
        ))),
        _ => Err(CredVaultError::RecordNotFound(input.to_string())),
    }
}
