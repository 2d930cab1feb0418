//! Create the review store and its tables. Safe to re-run.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use steam_review_ingest::storage::ReviewStore;
use steam_review_ingest::tracing::init_tracing;
use steam_review_ingest::util::env as env_util;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "create_database", about = "Create the review database schema")]
struct Args {
    /// SQLite database path (default: $DATABASE_PATH or database/database.db)
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info")?;
    let args = Args::parse();

    let path = env_util::database_path(args.db.as_deref());
    env_util::ensure_parent_dir(&path)?;
    let store = ReviewStore::open(&path)?;
    store.create_schema()?;
    info!(db = %path.display(), "schema ready");

    if let Err(err) = store.close() {
        warn!(error = %err, "failed to close review store");
    }
    Ok(())
}
