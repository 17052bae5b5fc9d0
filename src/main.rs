use clap::Parser;
use credvault::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    credvault::cli::init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Register => credvault::cli::commands::register::execute(&cli),
        Commands::Add {
            ref service,
            ref identifier,
            ref value,
        } => credvault::cli::commands::add::execute(&cli, service, identifier, value.as_deref()),
        Commands::List => credvault::cli::commands::list::execute(&cli),
        Commands::Reveal { ref id } => credvault::cli::commands::reveal::execute(&cli, id),
        Commands::Edit { ref id, ref value } => {
            credvault::cli::commands::edit::execute(&cli, id, value.as_deref())
        }
        Commands::Delete { ref id, force } => {
            credvault::cli::commands::delete::execute(&cli, id, force)
        }
    };

    if let Err(e) = result {
        credvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
