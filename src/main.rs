use std::{io, path::PathBuf, sync::Arc};

use anyhow::Result;
use cellscan::{
    config,
    output::{self, Format},
    source::ReplaySource,
    wifi::{self, WifiSession},
    CellScanSource, CellScanner,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a recorded telephony session through the cell scanner
    Scan {
        session: PathBuf,
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },
    /// Report access points from a recorded WiFi session
    Wifi { session: PathBuf },
    /// Validate the configuration and print the effective values
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = config::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Scan { session, format } => {
            let replay = ReplaySource::load(&session)?;
            let capability = replay.session().capability;
            let source: Option<Arc<dyn CellScanSource>> = if replay.session().telephony {
                Some(Arc::new(replay))
            } else {
                None
            };

            let scanner = CellScanner::new(source, config.scan);
            let outcome = scanner.get_cell_scan_results(capability).await;
            if let Some(failure) = outcome.failure() {
                info!(code = failure.code(), "{}", failure.description());
            }
            output::write_outcome(&outcome, format, io::stdout().lock())?;
        }

        Command::Wifi { session } => {
            let session = WifiSession::load(&session)?;
            let outcome = wifi::get_network_scan_results(session.source(), &session.capability);
            output::write_wifi(&outcome, io::stdout().lock())?;
        }

        Command::CheckConfig => print!("{}", toml::to_string(&config)?),
    };

    Ok(())
}
