//! Load titles from a delimited file into the `title` table.
//!
//! Usage: import_titles [FILE] [--delimiter ,]

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use steam_review_ingest::config::DEFAULT_TITLES_PATH;
use steam_review_ingest::import::import_titles_from_path;
use steam_review_ingest::storage::ReviewStore;
use steam_review_ingest::tracing::init_tracing;
use steam_review_ingest::util::env as env_util;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "import_titles", about = "Import titles (id,name,developer,release_date) from CSV")]
struct Args {
    /// Input file; the first row is treated as a header
    #[arg(default_value = DEFAULT_TITLES_PATH)]
    file: PathBuf,

    /// Single-character field delimiter
    #[arg(long, short = 'd', default_value = ",")]
    delimiter: String,

    /// SQLite database path (default: $DATABASE_PATH or database/database.db)
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info")?;
    let args = Args::parse();

    let delimiter = match args.delimiter.as_bytes() {
        [b] if b.is_ascii() => *b,
        _ => bail!("delimiter must be a single ASCII character, got {:?}", args.delimiter),
    };

    let path = env_util::database_path(args.db.as_deref());
    env_util::ensure_parent_dir(&path)?;
    let store = ReviewStore::open(&path)?;
    store.create_schema()?;

    let summary = import_titles_from_path(&store, &args.file, delimiter)?;
    println!("inserted={} skipped={}", summary.inserted, summary.skipped);

    if let Err(err) = store.close() {
        warn!(error = %err, "failed to close review store");
    }
    Ok(())
}
