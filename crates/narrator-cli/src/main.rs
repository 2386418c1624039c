//! CLI entry point - the composition root.
//!
//! Loads `.env`, installs logging, resolves settings and dispatches to the
//! handlers. Errors are mapped to exit codes here and nowhere else.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use narrator_cli::handlers::{self, play::PlayOptions};
use narrator_cli::{Cli, CliError, Commands};

#[tokio::main]
async fn main() {
    // Load environment variables (NARRATOR_TTS_KEY, NARRATOR_TTS_REGION)
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = handlers::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Split {
            script,
            mode,
            max_chars,
            protect,
        } => handlers::split::execute(&settings, &script, mode, max_chars, &protect),
        Commands::Windows { script, duration } => {
            handlers::windows::execute(&settings, &script, duration)
        }
        Commands::Play {
            script,
            anchors,
            offline,
            speaker,
            json,
            handoff,
        } => {
            let options = PlayOptions {
                anchors,
                offline,
                speaker,
                json,
                handoff,
            };
            handlers::play::execute(settings, &script, &options).await?;
            Ok(())
        }
    }
}
