pub mod config;
pub mod db;
pub mod entities;
pub mod kv;
pub mod models;
pub mod storage;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::Config;
pub use storage::{StoreError, SubtitleStore, open_store};

#[derive(Parser)]
#[command(name = "subarr", about = "Subtitle library storage tool", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy every record family from one store into another.
    Migrate {
        /// Source backend name ("sqlite" or "redb").
        #[arg(long)]
        from_backend: String,
        /// Source database location.
        #[arg(long)]
        from_path: String,
        /// Destination backend name.
        #[arg(long)]
        to_backend: String,
        /// Destination database location.
        #[arg(long)]
        to_path: String,
    },
    /// Print record counts for the configured store.
    Stats,
}

pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.general.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// CLI entry point: loads config, builds the runtime, and dispatches the
/// requested command.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    config.validate()?;
    init_tracing(&config);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if config.general.worker_threads > 0 {
        builder.worker_threads(config.general.worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(execute(cli.command, &config))
}

async fn execute(command: Command, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Migrate {
            from_backend,
            from_path,
            to_backend,
            to_path,
        } => {
            let src = open_store(&from_path, &from_backend).await?;
            let dst = open_store(&to_path, &to_backend).await?;
            let summary = storage::migrate::copy_store(src.as_ref(), dst.as_ref()).await?;
            info!(
                subtitles = summary.subtitles,
                downloads = summary.downloads,
                media_items = summary.media_items,
                total = summary.total(),
                "migration complete"
            );
            src.close().await?;
            dst.close().await?;
        }
        Command::Stats => {
            let store = open_store(&config.storage.path, &config.storage.backend).await?;
            info!(
                subtitles = store.count_subtitles().await?,
                downloads = store.count_downloads().await?,
                media_items = store.count_media_items().await?,
                "store contents"
            );
            store.close().await?;
        }
    }

    Ok(())
}
