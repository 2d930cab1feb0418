//! Table definitions for the review store.
//!
//! No foreign keys: reviews may reference titles that were never imported.

pub const CREATE_TITLE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS title (
    id INTEGER PRIMARY KEY,
    name TEXT,
    developer TEXT,
    release_date TEXT,
    last_time_fetched TEXT
)
"#;

pub const CREATE_AUTHOR_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS author (
    steamid INTEGER PRIMARY KEY,
    num_games_owned INTEGER,
    num_reviews INTEGER,
    last_time_fetched TEXT
)
"#;

pub const CREATE_REVIEW_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS review (
    author_steamid INTEGER NOT NULL,
    app_id INTEGER NOT NULL,
    comment_count INTEGER,
    hidden_in_steam_china INTEGER,
    language TEXT,
    received_for_free INTEGER,
    recommendationid TEXT,
    review TEXT,
    steam_china_location TEXT,
    steam_purchase INTEGER,
    timestamp_created INTEGER,
    timestamp_updated INTEGER,
    voted_up INTEGER,
    votes_funny INTEGER,
    votes_up INTEGER,
    weighted_vote_score REAL,
    written_during_early_access INTEGER,
    author_playtime_at_review INTEGER,
    author_playtime_forever INTEGER,
    author_playtime_last_two_weeks INTEGER,
    author_last_played INTEGER,
    last_time_fetched TEXT,
    PRIMARY KEY (author_steamid, app_id)
)
"#;

pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_title_name ON title(name)",
    "CREATE INDEX IF NOT EXISTS idx_review_app ON review(app_id)",
];

pub fn all_schema_statements() -> impl Iterator<Item = &'static str> {
    [CREATE_TITLE_TABLE, CREATE_AUTHOR_TABLE, CREATE_REVIEW_TABLE]
        .into_iter()
        .chain(CREATE_INDEXES.iter().copied())
}
