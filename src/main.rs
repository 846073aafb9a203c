//! media-export
//!
//! Exports media assets and their metadata from a MongoDB-backed asset
//! repository into a directory.
//!
//! # Usage
//!
//! ```bash
//! # Export every asset
//! media-export all
//!
//! # Export unused assets of one asset source tagged "B" or "C"
//! media-export unused --asset-source neos --only-tags B,C
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use media_export::cli::CliInterface;
use media_export::config::Config;
use media_export::connection::ConnectionManager;
use media_export::error::Result;
use media_export::export::{AssetExporter, ConsoleReport, ExportCoordinator, FilterCriteria};
use media_export::repository::MongoAssetRepository;
use media_export::utils::fs::expand_home;

/// Exit code of a run interrupted with Ctrl+C
const EXIT_CANCELLED: i32 = 130;

/// Application entry point
#[tokio::main]
async fn main() {
    match run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands or run the export
///
/// # Returns
/// * `Result<i32>` - Process exit code or error
async fn run() -> Result<i32> {
    let cli = CliInterface::new()?;

    initialize_logging(cli.config());

    if cli.handle_subcommand()? {
        return Ok(0);
    }

    let Some(criteria) = cli.filter_criteria() else {
        return Ok(0);
    };

    cli.config().validate()?;
    run_export(&cli, criteria).await
}

/// Connect, export and disconnect
async fn run_export(cli: &CliInterface, criteria: FilterCriteria) -> Result<i32> {
    let config = cli.config();

    info!("Connecting to {}", cli.get_sanitized_connection_uri());
    let mut conn_manager = ConnectionManager::new(config.connection.clone());
    conn_manager.connect().await?;

    let database = conn_manager.database()?;
    let repository = MongoAssetRepository::new(
        &database,
        &config.connection.assets_collection,
        &config.connection.resource_bucket,
        config.connection.batch_size,
    );

    let export_dir = expand_home(&config.export.directory.to_string_lossy());
    let exporter = AssetExporter::new(export_dir)
        .with_pairing(config.export.pairing)
        .with_filename_policy(config.export.filename_policy);

    let report = ConsoleReport::new(
        cli.show_progress(),
        config.display.color_output,
        config.display.table_style,
    );

    let cancel_token = CancellationToken::new();
    let ctrl_c_handle = spawn_ctrl_c_listener(cancel_token.clone());

    let mut coordinator =
        ExportCoordinator::new(Arc::new(repository), criteria, exporter, Box::new(report))
            .with_colors(config.display.color_output)
            .with_cancellation(cancel_token);

    let outcome = coordinator.execute().await;

    ctrl_c_handle.abort();
    conn_manager.disconnect().await?;

    let result = outcome?;
    if result.cancelled {
        warn!(
            "Export cancelled, {} assets were exported before the interruption",
            result.exported
        );
        return Ok(EXIT_CANCELLED);
    }
    Ok(0)
}

/// Cancel `token` on the first Ctrl+C
fn spawn_ctrl_c_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("Interrupted, finishing the current asset...");
                token.cancel();
            }
            Err(err) => {
                eprintln!("Failed to listen for Ctrl+C: {}", err);
            }
        }
    })
}

/// Initialize logging on stderr
///
/// The configured level is the default; `RUST_LOG` directives refine it.
fn initialize_logging(config: &Config) {
    let level = LevelFilter::from_level(config.logging.level.to_tracing_level());
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
