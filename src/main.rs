use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tabsplit::config::{Config, ConfigError};
use tabsplit::dashboard::Dashboard;
use tabsplit::error::ErrorCode;
use tabsplit::session::SessionFile;
use tabsplit::shell::Shell;
use tabsplit::store::{PresetStore, StoreError};
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for StartupError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Io(_) => "E_IO",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tabsplit", about = "Split a bill, share the tip, keep presets")]
struct Cli {
    /// Preset backend: memory, postgres or rest. Overrides TABSPLIT_BACKEND.
    #[arg(long)]
    backend: Option<String>,

    /// Where the signed-in username is remembered. Overrides TABSPLIT_SESSION_FILE.
    #[arg(long)]
    session_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tabsplit=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, code = e.error_code(), "tabsplit failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let mut config = Config::from_env_with_backend(cli.backend.as_deref())?;
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    info!(backend = ?config.backend, session_file = %config.session_file.display(), "starting");

    let store = PresetStore::from_config(&config).await?;
    let mut dashboard = Dashboard::new(store, SessionFile::new(&config.session_file));
    if let Err(e) = dashboard.start().await {
        warn!(error = %e, "could not load presets for remembered user");
    }

    let mut shell = Shell::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    shell.run(&mut dashboard).await?;
    Ok(())
}
