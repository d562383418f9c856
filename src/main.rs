use clap::Parser;
use credvault::cli::{commands, output, Cli, Commands, Context};
use tracing::{debug, warn};

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = Context::load(&cli).and_then(|ctx| match cli.command {
        Commands::Keygen => commands::keygen::execute(&ctx),
        Commands::CheckKey => commands::check_key::execute(&ctx),
        Commands::Set {
            ref name,
            ref value,
        } => commands::set::execute(&ctx, name, value.as_deref()),
        Commands::Get { ref name } => commands::get::execute(&ctx, name),
        Commands::List => commands::list::execute(&ctx),
        Commands::Delete { ref name, force } => commands::delete::execute(&ctx, name, force),
        Commands::Check {
            ref require,
            json,
        } => commands::check::execute(&ctx, require, json),
        Commands::Migrate { dry_run, json } => commands::migrate_cmd::execute(&ctx, dry_run, json),
        Commands::Verify => commands::verify::execute(&ctx),
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&ctx, last, since.as_deref())
        }
    });

    if let Err(e) = result {
        // Operators get the concrete failure; users get the safe text.
        if e.is_decryption_failure() || e.kind() == "configuration" {
            warn!(kind = e.kind(), detail = %e, "command failed");
        } else {
            debug!(kind = e.kind(), detail = %e, "command failed");
        }
        output::error(&e.user_message());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr so stdout stays clean for `get` and `keygen`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("credvault={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
