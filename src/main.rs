use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use steam_review_ingest::config::{
    IngestOptions, PurchaseType, RecordErrorPolicy, ReviewFilter, ReviewQueryConfig, ReviewType,
    DEFAULT_BASE_URL,
};
use steam_review_ingest::fetch::HttpReviewFetcher;
use steam_review_ingest::ingest::ReviewIngestor;
use steam_review_ingest::selector::TitleSelector;
use steam_review_ingest::storage::ReviewStore;
use steam_review_ingest::tracing::init_tracing;
use steam_review_ingest::util::env as env_util;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "review-ingest",
    version,
    about = "Page storefront user reviews for known titles into SQLite"
)]
struct Cli {
    /// `*` for every known title, a numeric title id, or an alphabetic name fragment
    #[arg(default_value = "*", allow_hyphen_values = true)]
    app: String,

    /// SQLite database path (default: $DATABASE_PATH or database/database.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Review filter; unset uses the storefront default
    #[arg(long, value_enum)]
    filter: Option<ReviewFilter>,

    /// Comma-separated language codes, e.g. german,english
    #[arg(long)]
    language: Option<String>,

    /// Only reviews from the last N days (max 365)
    #[arg(long)]
    day_range: Option<u16>,

    #[arg(long, value_enum)]
    review_type: Option<ReviewType>,

    #[arg(long, value_enum)]
    purchase_type: Option<PurchaseType>,

    /// Reviews per page (1-100)
    #[arg(long, default_value_t = 100)]
    num_per_page: u8,

    /// 1 to exclude off-topic review bombs, 0 to include them
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    filter_offtopic_activity: Option<u8>,

    /// What to do when a single record fails to persist
    #[arg(long, value_enum, default_value_t = RecordErrorPolicy::Continue)]
    on_record_error: RecordErrorPolicy,

    /// Review endpoint base URL
    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    base_url: String,
}

impl Cli {
    fn query_config(&self) -> ReviewQueryConfig {
        let mut cfg = ReviewQueryConfig::empty()
            .with_day_range(self.day_range)
            .with_num_per_page(Some(self.num_per_page));
        cfg.filter = self.filter;
        cfg.language = self.language.clone();
        cfg.review_type = self.review_type;
        cfg.purchase_type = self.purchase_type;
        cfg.filter_offtopic_activity = self.filter_offtopic_activity.map(|v| v == 1);
        cfg
    }

    fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            base_url: self.base_url.clone(),
            on_record_error: self.on_record_error,
            ..IngestOptions::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info")?;

    let cli = Cli::parse();
    // Reject a bad selector before touching the database.
    let selector: TitleSelector = cli.app.parse()?;
    let query = cli.query_config();
    let options = cli.ingest_options();

    let db_path = env_util::database_path(cli.db.as_deref());
    env_util::ensure_parent_dir(&db_path)?;
    let store = ReviewStore::open(&db_path)?;
    store
        .create_schema()
        .with_context(|| format!("prepare schema in {}", db_path.display()))?;
    info!(db = %db_path.display(), %selector, "review store ready");

    let app_ids = selector.resolve(&store)?;
    if app_ids.is_empty() {
        warn!(%selector, "selector matched no titles");
    }

    let fetcher = HttpReviewFetcher::new(options.http_timeout)?;
    let ingestor = ReviewIngestor::new(store, fetcher, &query, &options);
    let result = ingestor.run(&app_ids).await;
    ingestor.close();

    let summary = result?;
    println!(
        "titles={} pages={} reviewers(+{} ~{}) reviews(+{} ~{}) failed_writes={}",
        summary.titles,
        summary.pages,
        summary.reviewers_inserted,
        summary.reviewers_updated,
        summary.reviews_inserted,
        summary.reviews_updated,
        summary.failed_writes
    );
    Ok(())
}
