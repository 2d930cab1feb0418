//! Review ingestion loop: fetch a page, persist it, follow the cursor.
//!
//! Titles are paged one after another and pages strictly in sequence; the
//! only waits are the HTTP call and the fixed delay between pages.

use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{IngestOptions, RecordErrorPolicy, ReviewQueryConfig, FIRST_PAGE_CURSOR};
use crate::fetch::ReviewFetcher;
use crate::models::WireReview;
use crate::query::{encode_cursor, ReviewUrlBuilder};
use crate::storage::{ReviewStore, StoreResult, UpsertOutcome};

const FETCHED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Counters for one ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub titles: usize,
    pub pages: usize,
    pub reviewers_inserted: usize,
    pub reviewers_updated: usize,
    pub reviews_inserted: usize,
    pub reviews_updated: usize,
    pub failed_writes: usize,
}

impl IngestSummary {
    fn record_reviewer(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.reviewers_inserted += 1,
            UpsertOutcome::Updated => self.reviewers_updated += 1,
        }
    }

    fn record_review(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.reviews_inserted += 1,
            UpsertOutcome::Updated => self.reviews_updated += 1,
        }
    }
}

pub struct ReviewIngestor<'a, F> {
    store: ReviewStore,
    fetcher: F,
    query: &'a ReviewQueryConfig,
    options: &'a IngestOptions,
}

impl<'a, F: ReviewFetcher> ReviewIngestor<'a, F> {
    pub fn new(
        store: ReviewStore,
        fetcher: F,
        query: &'a ReviewQueryConfig,
        options: &'a IngestOptions,
    ) -> Self {
        Self {
            store,
            fetcher,
            query,
            options,
        }
    }

    pub fn store(&self) -> &ReviewStore {
        &self.store
    }

    /// Release the store connection. Failure here is only worth a warning.
    pub fn close(self) {
        if let Err(err) = self.store.close() {
            warn!(error = %err, "failed to close review store");
        }
    }

    /// Page every title in `app_ids` to exhaustion, in order.
    pub async fn run(&self, app_ids: &[i64]) -> Result<IngestSummary> {
        info!(titles = app_ids.len(), ?app_ids, "starting review ingestion");
        let mut summary = IngestSummary::default();
        for &app_id in app_ids {
            self.ingest_title(app_id, &mut summary).await?;
            summary.titles += 1;
        }
        info!(
            titles = summary.titles,
            pages = summary.pages,
            reviewers_inserted = summary.reviewers_inserted,
            reviewers_updated = summary.reviewers_updated,
            reviews_inserted = summary.reviews_inserted,
            reviews_updated = summary.reviews_updated,
            failed_writes = summary.failed_writes,
            "review ingestion finished"
        );
        Ok(summary)
    }

    /// Follow one title's cursor chain until the endpoint runs dry or starts
    /// repeating a cursor it already handed out.
    pub async fn ingest_title(&self, app_id: i64, summary: &mut IngestSummary) -> Result<()> {
        let builder = ReviewUrlBuilder::new(&self.options.base_url, self.query);
        let name = self.store.title_name(app_id).ok().flatten();
        let mut cursor = FIRST_PAGE_CURSOR.to_string();
        // Encoded form of every cursor this title has returned.
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            let url = builder.build(app_id, &cursor);
            info!(
                app_id,
                name = name.as_deref().unwrap_or(""),
                %cursor,
                %url,
                "fetching review page"
            );

            let page = match self.fetcher.fetch_page(&url).await {
                Ok(Some(page)) => page,
                Ok(None) => {
                    debug!(app_id, "empty review response; paging done");
                    break;
                }
                Err(err) => {
                    warn!(app_id, error = %err, "review fetch failed; paging done");
                    break;
                }
            };
            summary.pages += 1;

            let fetched_at = Utc::now().format(FETCHED_AT_FORMAT).to_string();
            self.persist_page(app_id, &page.reviews, &fetched_at, summary)?;

            let Some(next) = page.cursor.filter(|c| !c.is_empty()) else {
                debug!(app_id, "no next cursor; paging done");
                break;
            };
            if !seen.insert(encode_cursor(&next)) {
                debug!(app_id, cursor = %next, "cursor repeated; paging done");
                break;
            }
            cursor = next;

            tokio::time::sleep(self.options.page_delay).await;
        }
        Ok(())
    }

    /// Upsert one page of reviews and commit them together. A page that
    /// fails under [`RecordErrorPolicy::Abort`] is rolled back.
    fn persist_page(
        &self,
        app_id: i64,
        reviews: &[Value],
        fetched_at: &str,
        summary: &mut IngestSummary,
    ) -> Result<()> {
        let result = self.write_page(app_id, reviews, fetched_at, summary);
        if result.is_err() {
            if let Err(err) = self.store.rollback() {
                warn!(app_id, error = %err, "failed to roll back review page");
            }
        }
        result
    }

    fn write_page(
        &self,
        app_id: i64,
        reviews: &[Value],
        fetched_at: &str,
        summary: &mut IngestSummary,
    ) -> Result<()> {
        let store = &self.store;
        if let Err(err) = store.begin_page() {
            self.on_record_error(err.into(), summary)?;
        }

        match store.title_exists(app_id) {
            Ok(true) => {
                if let Err(err) = store.update_title_last_fetched(app_id, fetched_at) {
                    self.on_record_error(err.into(), summary)?;
                }
            }
            Ok(false) => {}
            Err(err) => self.on_record_error(err.into(), summary)?,
        }

        for raw in reviews {
            let wire = match WireReview::from_value(raw) {
                Ok(wire) => wire,
                Err(err) => {
                    let err = anyhow::Error::new(err).context(format!("undecodable review entry {raw}"));
                    self.on_record_error(err, summary)?;
                    continue;
                }
            };
            let (reviewer, review) = wire.into_records(app_id, fetched_at);
            self.apply(store.upsert_reviewer(&reviewer), summary, IngestSummary::record_reviewer)?;
            self.apply(store.upsert_review(&review), summary, IngestSummary::record_review)?;
        }

        if let Err(err) = store.commit() {
            self.on_record_error(err.into(), summary)?;
        }
        Ok(())
    }

    fn apply(
        &self,
        result: StoreResult<UpsertOutcome>,
        summary: &mut IngestSummary,
        record: fn(&mut IngestSummary, UpsertOutcome),
    ) -> Result<()> {
        match result {
            Ok(outcome) => {
                record(summary, outcome);
                Ok(())
            }
            Err(err) => self.on_record_error(err.into(), summary),
        }
    }

    /// Count a record that could not be decoded or written, then skip it or
    /// stop the run according to the configured policy.
    fn on_record_error(&self, err: anyhow::Error, summary: &mut IngestSummary) -> Result<()> {
        summary.failed_writes += 1;
        match self.options.on_record_error {
            RecordErrorPolicy::Continue => {
                warn!(error = %format!("{err:#}"), "skipping record");
                Ok(())
            }
            RecordErrorPolicy::Abort => Err(err),
        }
    }
}
