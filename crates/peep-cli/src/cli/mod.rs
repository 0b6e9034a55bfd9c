//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use peep_core::{config, interrupt, logging};

mod commands;

#[derive(Parser)]
#[command(name = "peep")]
#[command(version = "0.1")]
#[command(about = "Sign in with Google and view your profile birthday and gender")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with Google (browser flow) and cache the account identity
    Login,

    /// Sign out: revoke nothing persisted, clear the cached account
    Logout,

    /// Fetch and print the profile record once
    Profile {
        /// Exchange this server auth code instead of running the browser flow
        #[arg(long, value_name = "CODE")]
        auth_code: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    // default to the interactive screen
    let Some(command) = cli.command else {
        // The screen owns the terminal; diagnostics go to a log file.
        let _log_guard = logging::init_file_logging(&config::paths::logs_dir())?;
        tracing::info!("starting interactive screen");
        return commands::screen::run(config);
    };

    logging::init_stderr_logging();

    match command {
        Commands::Login => commands::auth::login(&config).await,
        Commands::Logout => commands::auth::logout(&config).await,
        Commands::Profile {
            auth_code,
        } => commands::profile::run(&config, auth_code.as_deref()).await,
        Commands::Config {
            command,
        } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
