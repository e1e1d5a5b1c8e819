//! List folders and files in a finished snapshot that still lack a description.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use spmap::db::query::{self, UndocumentedEntry};
use spmap::db::Db;
use spmap::error::SpmapError;
use spmap::scan::MissingCounts;
use spmap::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "undocumented")]
#[command(about = "Report items without descriptions, with links to fill them in")]
struct Args {
    /// Snapshot database written by spmap
    #[arg(short, long = "database", default_value = "database/file_struct.db")]
    database: PathBuf,

    /// Configuration file; its tenant is used to build browser links
    #[arg(short, long = "credentials")]
    credentials: Option<PathBuf>,

    /// Print counts only
    #[arg(long)]
    summary: bool,

    /// Emit the report as JSON
    #[arg(long, conflicts_with = "summary")]
    json: bool,
}

#[derive(Serialize)]
struct LinkedEntry<'a> {
    #[serde(flatten)]
    entry: &'a UndocumentedEntry,
    link: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    undocumented: Vec<LinkedEntry<'a>>,
    missing: &'a MissingCounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    if !args.database.exists() {
        anyhow::bail!("Database not found: {}", args.database.display());
    }

    let config = match &args.credentials {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let tenant = config.tenant_url().to_string();
    let extension = config.scan.spreadsheet_extension.clone();

    let db = Db::new(&args.database);
    let (entries, missing) = db
        .with_connection(move |conn| {
            let entries = query::undocumented(conn)?;
            let missing = query::missing_counts(conn, &extension)?;
            Ok::<_, SpmapError>((entries, missing))
        })
        .await
        .with_context(|| format!("Failed to read snapshot from {}", args.database.display()))?;

    if args.json {
        let report = JsonReport {
            undocumented: entries
                .iter()
                .map(|entry| LinkedEntry {
                    entry,
                    link: query::browse_link(&tenant, &entry.rel_url),
                })
                .collect(),
            missing: &missing,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !args.summary {
        if entries.is_empty() {
            println!("Every folder and file has a description.");
        } else {
            println!("{:<7} {:>6}  {:<40} {}", "Kind", "Id", "Name", "Link");
            println!("{:-<100}", "");
            for entry in &entries {
                let kind = match entry.kind {
                    query::EntryKind::Folder => "folder",
                    query::EntryKind::File => "file",
                };
                println!(
                    "{:<7} {:>6}  {:<40} {}",
                    kind,
                    entry.id,
                    entry.name,
                    query::browse_link(&tenant, &entry.rel_url)
                );
            }
            println!();
        }
    }

    println!("{}", missing);

    Ok(())
}
