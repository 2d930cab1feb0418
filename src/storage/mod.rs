//! SQLite-backed persistence for titles, reviewers and reviews.
//!
//! Upserts are existence-check then insert-or-update. That is only sound
//! because a run is strictly sequential; a concurrent writer would need
//! `INSERT .. ON CONFLICT DO UPDATE` instead.

pub mod schema;

use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::models::{Review, Reviewer, Title};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Title,
    Reviewer,
    Review,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Title => "title",
            Entity::Reviewer => "reviewer",
            Entity::Review => "review",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Insert,
    Update,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteOp::Insert => "insert",
            WriteOp::Update => "update",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open review store at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    /// A single row write failed; `key` identifies the offending record.
    #[error("failed to {op} {entity} {key}: {source}")]
    Write {
        entity: Entity,
        op: WriteOp,
        key: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("review store query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

fn write_err(
    entity: Entity,
    op: WriteOp,
    key: impl fmt::Display,
) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::Write {
        entity,
        op,
        key: key.to_string(),
        source,
    }
}

const REVIEW_COLUMNS: &str = "author_steamid, app_id, comment_count, hidden_in_steam_china, language, \
     received_for_free, recommendationid, review, steam_china_location, steam_purchase, \
     timestamp_created, timestamp_updated, voted_up, votes_funny, votes_up, weighted_vote_score, \
     written_during_early_access, author_playtime_at_review, author_playtime_forever, \
     author_playtime_last_two_weeks, author_last_played, last_time_fetched";

/// Storage gateway over one SQLite connection, held for a whole run.
pub struct ReviewStore {
    conn: Connection,
}

impl ReviewStore {
    /// Open (or create) the database file. The schema is not touched; see
    /// [`ReviewStore::create_schema`].
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { conn })
    }

    /// In-memory store with the schema already created.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// Idempotently create all tables and indexes.
    pub fn create_schema(&self) -> StoreResult<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Release the connection, committing nothing that is still pending.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Query(e))
    }

    /// Open the transaction that groups one page of writes.
    pub fn begin_page(&self) -> StoreResult<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    /// Commit the current page. No-op when no page transaction is open.
    pub fn commit(&self) -> StoreResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Discard the current page. No-op when no page transaction is open.
    pub fn rollback(&self) -> StoreResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    /// True while a page transaction is open.
    pub fn in_page(&self) -> bool {
        !self.conn.is_autocommit()
    }

    // ---- titles -------------------------------------------------------------

    pub fn title_exists(&self, id: i64) -> StoreResult<bool> {
        self.exists("SELECT 1 FROM title WHERE id = ?1", params![id])
    }

    pub fn insert_title(&self, title: &Title) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO title (id, name, developer, release_date, last_time_fetched)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    title.id,
                    title.name,
                    title.developer,
                    title.release_date,
                    title.last_time_fetched
                ],
            )
            .map_err(write_err(Entity::Title, WriteOp::Insert, title.id))?;
        Ok(())
    }

    pub fn update_title_last_fetched(&self, id: i64, fetched_at: &str) -> StoreResult<()> {
        self.conn
            .execute(
                "UPDATE title SET last_time_fetched = ?2 WHERE id = ?1",
                params![id, fetched_at],
            )
            .map_err(write_err(Entity::Title, WriteOp::Update, id))?;
        Ok(())
    }

    pub fn get_title(&self, id: i64) -> StoreResult<Option<Title>> {
        let title = self
            .conn
            .query_row(
                "SELECT id, name, developer, release_date, last_time_fetched FROM title WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Title {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        developer: row.get(2)?,
                        release_date: row.get(3)?,
                        last_time_fetched: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(title)
    }

    pub fn all_title_ids(&self) -> StoreResult<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM title ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    pub fn title_name(&self, id: i64) -> StoreResult<Option<String>> {
        let name: Option<Option<String>> = self
            .conn
            .query_row("SELECT name FROM title WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(name.flatten())
    }

    /// Ids of titles whose name contains `fragment` (SQLite `LIKE`, so ASCII
    /// case-insensitive).
    pub fn title_ids_matching_name(&self, fragment: &str) -> StoreResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM title WHERE name LIKE '%' || ?1 || '%' ORDER BY id")?;
        let ids = stmt
            .query_map(params![fragment], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    // ---- reviewers ----------------------------------------------------------

    pub fn reviewer_exists(&self, steamid: i64) -> StoreResult<bool> {
        self.exists("SELECT 1 FROM author WHERE steamid = ?1", params![steamid])
    }

    pub fn insert_reviewer(&self, reviewer: &Reviewer) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO author (steamid, num_games_owned, num_reviews, last_time_fetched)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    reviewer.steamid,
                    reviewer.num_games_owned,
                    reviewer.num_reviews,
                    reviewer.last_time_fetched
                ],
            )
            .map_err(write_err(Entity::Reviewer, WriteOp::Insert, reviewer.steamid))?;
        Ok(())
    }

    /// Rewrite every non-key column. Touches zero rows when the id is unknown.
    pub fn update_reviewer(&self, reviewer: &Reviewer) -> StoreResult<()> {
        self.conn
            .execute(
                "UPDATE author SET num_games_owned = ?2, num_reviews = ?3, last_time_fetched = ?4
                 WHERE steamid = ?1",
                params![
                    reviewer.steamid,
                    reviewer.num_games_owned,
                    reviewer.num_reviews,
                    reviewer.last_time_fetched
                ],
            )
            .map_err(write_err(Entity::Reviewer, WriteOp::Update, reviewer.steamid))?;
        Ok(())
    }

    pub fn upsert_reviewer(&self, reviewer: &Reviewer) -> StoreResult<UpsertOutcome> {
        if self.reviewer_exists(reviewer.steamid)? {
            self.update_reviewer(reviewer)?;
            Ok(UpsertOutcome::Updated)
        } else {
            self.insert_reviewer(reviewer)?;
            Ok(UpsertOutcome::Inserted)
        }
    }

    pub fn get_reviewer(&self, steamid: i64) -> StoreResult<Option<Reviewer>> {
        let reviewer = self
            .conn
            .query_row(
                "SELECT steamid, num_games_owned, num_reviews, last_time_fetched
                 FROM author WHERE steamid = ?1",
                params![steamid],
                |row| {
                    Ok(Reviewer {
                        steamid: row.get(0)?,
                        num_games_owned: row.get(1)?,
                        num_reviews: row.get(2)?,
                        last_time_fetched: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(reviewer)
    }

    pub fn count_reviewers(&self) -> StoreResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM author", [], |row| row.get(0))?)
    }

    // ---- reviews ------------------------------------------------------------

    pub fn review_exists(&self, author_steamid: i64, app_id: i64) -> StoreResult<bool> {
        self.exists(
            "SELECT 1 FROM review WHERE author_steamid = ?1 AND app_id = ?2",
            params![author_steamid, app_id],
        )
    }

    pub fn insert_review(&self, review: &Review) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO review ({REVIEW_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
        );
        self.conn
            .execute(
                &sql,
                params![
                    review.author_steamid,
                    review.app_id,
                    review.comment_count,
                    review.hidden_in_steam_china,
                    review.language,
                    review.received_for_free,
                    review.recommendationid,
                    review.review,
                    review.steam_china_location,
                    review.steam_purchase,
                    review.timestamp_created,
                    review.timestamp_updated,
                    review.voted_up,
                    review.votes_funny,
                    review.votes_up,
                    review.weighted_vote_score,
                    review.written_during_early_access,
                    review.author_playtime_at_review,
                    review.author_playtime_forever,
                    review.author_playtime_last_two_weeks,
                    review.author_last_played,
                    review.last_time_fetched,
                ],
            )
            .map_err(write_err(Entity::Review, WriteOp::Insert, review_key(review)))?;
        Ok(())
    }

    /// Rewrite every non-key column of the `(author_steamid, app_id)` row.
    pub fn update_review(&self, review: &Review) -> StoreResult<()> {
        self.conn
            .execute(
                "UPDATE review SET
                    comment_count = ?3,
                    hidden_in_steam_china = ?4,
                    language = ?5,
                    received_for_free = ?6,
                    recommendationid = ?7,
                    review = ?8,
                    steam_china_location = ?9,
                    steam_purchase = ?10,
                    timestamp_created = ?11,
                    timestamp_updated = ?12,
                    voted_up = ?13,
                    votes_funny = ?14,
                    votes_up = ?15,
                    weighted_vote_score = ?16,
                    written_during_early_access = ?17,
                    author_playtime_at_review = ?18,
                    author_playtime_forever = ?19,
                    author_playtime_last_two_weeks = ?20,
                    author_last_played = ?21,
                    last_time_fetched = ?22
                 WHERE author_steamid = ?1 AND app_id = ?2",
                params![
                    review.author_steamid,
                    review.app_id,
                    review.comment_count,
                    review.hidden_in_steam_china,
                    review.language,
                    review.received_for_free,
                    review.recommendationid,
                    review.review,
                    review.steam_china_location,
                    review.steam_purchase,
                    review.timestamp_created,
                    review.timestamp_updated,
                    review.voted_up,
                    review.votes_funny,
                    review.votes_up,
                    review.weighted_vote_score,
                    review.written_during_early_access,
                    review.author_playtime_at_review,
                    review.author_playtime_forever,
                    review.author_playtime_last_two_weeks,
                    review.author_last_played,
                    review.last_time_fetched,
                ],
            )
            .map_err(write_err(Entity::Review, WriteOp::Update, review_key(review)))?;
        Ok(())
    }

    pub fn upsert_review(&self, review: &Review) -> StoreResult<UpsertOutcome> {
        if self.review_exists(review.author_steamid, review.app_id)? {
            self.update_review(review)?;
            Ok(UpsertOutcome::Updated)
        } else {
            self.insert_review(review)?;
            Ok(UpsertOutcome::Inserted)
        }
    }

    pub fn get_review(&self, author_steamid: i64, app_id: i64) -> StoreResult<Option<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review WHERE author_steamid = ?1 AND app_id = ?2"
        );
        let review = self
            .conn
            .query_row(&sql, params![author_steamid, app_id], row_to_review)
            .optional()?;
        Ok(review)
    }

    pub fn count_reviews(&self) -> StoreResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM review", [], |row| row.get(0))?)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn exists(&self, sql: &str, params: impl rusqlite::Params) -> StoreResult<bool> {
        let hit = self
            .conn
            .query_row(sql, params, |_| Ok(()))
            .optional()?
            .is_some();
        Ok(hit)
    }
}

fn review_key(review: &Review) -> String {
    format!("({}, {})", review.author_steamid, review.app_id)
}

fn row_to_review(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        author_steamid: row.get(0)?,
        app_id: row.get(1)?,
        comment_count: row.get(2)?,
        hidden_in_steam_china: row.get(3)?,
        language: row.get(4)?,
        received_for_free: row.get(5)?,
        recommendationid: row.get(6)?,
        review: row.get(7)?,
        steam_china_location: row.get(8)?,
        steam_purchase: row.get(9)?,
        timestamp_created: row.get(10)?,
        timestamp_updated: row.get(11)?,
        voted_up: row.get(12)?,
        votes_funny: row.get(13)?,
        votes_up: row.get(14)?,
        weighted_vote_score: row.get(15)?,
        written_during_early_access: row.get(16)?,
        author_playtime_at_review: row.get(17)?,
        author_playtime_forever: row.get(18)?,
        author_playtime_last_two_weeks: row.get(19)?,
        author_last_played: row.get(20)?,
        last_time_fetched: row.get(21)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(id: i64, name: &str) -> Title {
        Title {
            id,
            name: Some(name.to_string()),
            developer: None,
            release_date: None,
            last_time_fetched: None,
        }
    }

    fn reviewer(steamid: i64, num_reviews: i64) -> Reviewer {
        Reviewer {
            steamid,
            num_games_owned: 10,
            num_reviews,
            last_time_fetched: "2026-01-01 00:00:00".into(),
        }
    }

    fn review(author: i64, app: i64, votes_up: i64) -> Review {
        Review {
            author_steamid: author,
            app_id: app,
            comment_count: 0,
            hidden_in_steam_china: false,
            language: "english".into(),
            received_for_free: false,
            recommendationid: "1".into(),
            review: "ok".into(),
            steam_china_location: String::new(),
            steam_purchase: true,
            timestamp_created: 1,
            timestamp_updated: 2,
            voted_up: true,
            votes_funny: 0,
            votes_up,
            weighted_vote_score: 0.5,
            written_during_early_access: false,
            author_playtime_at_review: None,
            author_playtime_forever: 60,
            author_playtime_last_two_weeks: 0,
            author_last_played: 3,
            last_time_fetched: "2026-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn title_lookups() {
        let store = ReviewStore::open_in_memory().unwrap();
        store.insert_title(&title(440, "Team Fortress")).unwrap();
        store.insert_title(&title(570, "Dota")).unwrap();
        store.insert_title(&title(620, "Portal")).unwrap();

        assert!(store.title_exists(440).unwrap());
        assert!(!store.title_exists(1).unwrap());
        assert_eq!(store.all_title_ids().unwrap(), vec![440, 570, 620]);
        assert_eq!(store.title_name(570).unwrap().as_deref(), Some("Dota"));
        assert_eq!(store.title_name(1).unwrap(), None);
        assert_eq!(store.title_ids_matching_name("ort").unwrap(), vec![440, 620]);
        assert!(store.title_ids_matching_name("zzz").unwrap().is_empty());

        store
            .update_title_last_fetched(440, "2026-10-19 08:00:00")
            .unwrap();
        assert_eq!(
            store.get_title(440).unwrap().unwrap().last_time_fetched.as_deref(),
            Some("2026-10-19 08:00:00")
        );
    }

    #[test]
    fn duplicate_title_insert_is_reported_not_fatal() {
        let store = ReviewStore::open_in_memory().unwrap();
        store.insert_title(&title(1, "A")).unwrap();
        let err = store.insert_title(&title(1, "B")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Write {
                entity: Entity::Title,
                op: WriteOp::Insert,
                ..
            }
        ));
        assert_eq!(store.title_name(1).unwrap().as_deref(), Some("A"));
    }

    #[test]
    fn reviewer_upsert_updates_in_place() {
        let store = ReviewStore::open_in_memory().unwrap();
        assert_eq!(
            store.upsert_reviewer(&reviewer(555, 1)).unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_reviewer(&reviewer(555, 9)).unwrap(),
            UpsertOutcome::Updated
        );
        assert_eq!(store.count_reviewers().unwrap(), 1);
        assert_eq!(store.get_reviewer(555).unwrap().unwrap().num_reviews, 9);
    }

    #[test]
    fn update_of_missing_review_touches_nothing() {
        let store = ReviewStore::open_in_memory().unwrap();
        store.update_review(&review(1, 2, 3)).unwrap();
        assert_eq!(store.count_reviews().unwrap(), 0);
    }

    #[test]
    fn review_upsert_keys_on_author_and_title() {
        let store = ReviewStore::open_in_memory().unwrap();
        store.upsert_review(&review(555, 100, 3)).unwrap();
        store.upsert_review(&review(555, 200, 1)).unwrap();
        let outcome = store.upsert_review(&review(555, 100, 7)).unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(store.count_reviews().unwrap(), 2);
        let stored = store.get_review(555, 100).unwrap().unwrap();
        assert_eq!(stored.votes_up, 7);
        assert_eq!((stored.author_steamid, stored.app_id), (555, 100));
    }

    #[test]
    fn page_transaction_commits_and_is_reentrant() {
        let store = ReviewStore::open_in_memory().unwrap();
        store.begin_page().unwrap();
        store.begin_page().unwrap();
        store.insert_reviewer(&reviewer(1, 1)).unwrap();
        store.commit().unwrap();
        store.commit().unwrap();
        assert_eq!(store.count_reviewers().unwrap(), 1);
    }

    #[test]
    fn rollback_discards_the_open_page() {
        let store = ReviewStore::open_in_memory().unwrap();
        store.begin_page().unwrap();
        assert!(store.in_page());
        store.insert_reviewer(&reviewer(1, 1)).unwrap();
        store.rollback().unwrap();
        assert!(!store.in_page());
        store.rollback().unwrap();
        assert_eq!(store.count_reviewers().unwrap(), 0);
    }
}
