use std::time::Duration;

use clap::ValueEnum;

pub const DEFAULT_BASE_URL: &str = "https://store.steampowered.com/appreviews/";
pub const DEFAULT_DATABASE_PATH: &str = "database/database.db";
pub const DEFAULT_TITLES_PATH: &str = "data/apps.csv";

/// Sentinel cursor that requests the first page.
pub const FIRST_PAGE_CURSOR: &str = "*";

const MAX_DAY_RANGE: u16 = 365;
const MAX_PER_PAGE: u8 = 100;

/// Review ordering/selection understood by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum ReviewFilter {
    All,
    Recent,
    Updated,
    AllTime,
    Funny,
    Helpful,
    Awards,
}

impl ReviewFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewFilter::All => "all",
            ReviewFilter::Recent => "recent",
            ReviewFilter::Updated => "updated",
            ReviewFilter::AllTime => "all_time",
            ReviewFilter::Funny => "funny",
            ReviewFilter::Helpful => "helpful",
            ReviewFilter::Awards => "awards",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewType {
    All,
    Positive,
    Negative,
}

impl ReviewType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewType::All => "all",
            ReviewType::Positive => "positive",
            ReviewType::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum PurchaseType {
    All,
    NonSteamPurchase,
    Steam,
}

impl PurchaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseType::All => "all",
            PurchaseType::NonSteamPurchase => "non_steam_purchase",
            PurchaseType::Steam => "steam",
        }
    }
}

/// Query options sent with every review page request.
///
/// `None` (and an empty `language`) means the parameter is left off the URL
/// and the storefront default applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewQueryConfig {
    pub filter: Option<ReviewFilter>,
    /// Comma-joined language codes, e.g. `german,english`.
    pub language: Option<String>,
    day_range: Option<u16>,
    pub review_type: Option<ReviewType>,
    pub purchase_type: Option<PurchaseType>,
    num_per_page: Option<u8>,
    pub filter_offtopic_activity: Option<bool>,
}

impl Default for ReviewQueryConfig {
    fn default() -> Self {
        Self {
            filter: None,
            language: None,
            day_range: None,
            review_type: None,
            purchase_type: None,
            num_per_page: Some(MAX_PER_PAGE),
            filter_offtopic_activity: None,
        }
    }
}

impl ReviewQueryConfig {
    /// Config with every option unset (no `num_per_page` either).
    pub fn empty() -> Self {
        Self {
            num_per_page: None,
            ..Self::default()
        }
    }

    /// Recency window in days, clamped to the storefront maximum of 365.
    pub fn with_day_range(mut self, days: Option<u16>) -> Self {
        self.day_range = days.map(|d| d.min(MAX_DAY_RANGE));
        self
    }

    /// Page size, clamped to 1..=100.
    pub fn with_num_per_page(mut self, n: Option<u8>) -> Self {
        self.num_per_page = n.map(|n| n.clamp(1, MAX_PER_PAGE));
        self
    }

    pub fn day_range(&self) -> Option<u16> {
        self.day_range
    }

    pub fn num_per_page(&self) -> Option<u8> {
        self.num_per_page
    }
}

/// What the ingestion loop does when a single record fails to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RecordErrorPolicy {
    /// Log the failure, count it, and move on to the next record.
    #[default]
    Continue,
    /// Stop the run and surface the storage error.
    Abort,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub base_url: String,
    /// Pause between consecutive page requests for one title.
    pub page_delay: Duration,
    pub http_timeout: Duration,
    pub on_record_error: RecordErrorPolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_delay: Duration::from_secs(1),
            http_timeout: Duration::from_secs(5),
            on_record_error: RecordErrorPolicy::Continue,
        }
    }
}
