use anyhow::{Context, Result};
use clap::Parser;
use spmap::db::Db;
use spmap::remote::SharePointClient;
use spmap::scan::report_summary;
use spmap::{scan_to_store, Config, ScanOptions};
use std::path::PathBuf;
use std::time::Instant;

/// Map the folders and files of a SharePoint document library, with their
/// descriptions, into a fresh SQLite database.
#[derive(Parser, Debug)]
#[command(name = "spmap")]
#[command(about = "Scan a SharePoint folder tree and its descriptions into SQLite")]
struct Args {
    /// TOML file holding tenant, site and client credentials
    /// [default: $SPMAP_CONFIG, then private/secret.toml]
    #[arg(short, long = "credentials")]
    credentials: Option<PathBuf>,

    /// Path of the database to create (must not already hold a snapshot)
    #[arg(short, long = "database", default_value = "database/file_struct.db")]
    database: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    let config = match &args.credentials {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    log::info!("Configuration loaded successfully");
    log::info!("Site: {}", config.site_url());
    log::info!("Root: {}", config.root_path());
    log::info!("Database path: {}", args.database.display());

    if let Some(parent) = args.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let client = SharePointClient::connect(
        &config.site_url(),
        &config.sharepoint.client_id,
        &config.client_secret()?,
        config.request_timeout(),
    )
    .await?;

    let db = Db::new(&args.database);
    let start = Instant::now();

    let snapshot = scan_to_store(&client, &client, ScanOptions::from_config(&config), &db).await?;

    log::info!("=== Scan Complete ===");
    log::info!("Folders: {}", snapshot.folders.len());
    log::info!("Files: {}", snapshot.files.len());
    log::info!("Time: {:?}", start.elapsed());

    report_summary(&snapshot.missing);

    Ok(())
}
