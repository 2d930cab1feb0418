//! Storefront wire format and the rows persisted from it.
//!
//! The `appreviews` endpoint is loose about numeric types: steam ids arrive as
//! strings and `weighted_vote_score` flips between a string and a number, so
//! both go through lenient deserializers.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One page of the `appreviews` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReviewsResponse {
    #[serde(default)]
    pub success: Option<i64>,
    #[serde(default)]
    pub query_summary: Option<QuerySummary>,
    /// Raw review entries. Each is decoded on its own with
    /// [`WireReview::from_value`] so one bad entry cannot sink the page.
    #[serde(default)]
    pub reviews: Vec<Value>,
    /// Token for the next page; absent once the endpoint is exhausted.
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuerySummary {
    #[serde(default)]
    pub num_reviews: Option<i64>,
    #[serde(default)]
    pub total_reviews: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireReview {
    pub recommendationid: String,
    pub author: WireAuthor,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub timestamp_created: i64,
    #[serde(default)]
    pub timestamp_updated: i64,
    #[serde(default)]
    pub voted_up: bool,
    #[serde(default)]
    pub votes_up: i64,
    #[serde(default)]
    pub votes_funny: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weighted_vote_score: f64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub steam_purchase: bool,
    #[serde(default)]
    pub received_for_free: bool,
    #[serde(default)]
    pub written_during_early_access: bool,
    #[serde(default)]
    pub hidden_in_steam_china: bool,
    #[serde(default)]
    pub steam_china_location: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireAuthor {
    #[serde(deserialize_with = "lenient_i64")]
    pub steamid: i64,
    #[serde(default)]
    pub num_games_owned: i64,
    #[serde(default)]
    pub num_reviews: i64,
    #[serde(default)]
    pub playtime_forever: i64,
    #[serde(default)]
    pub playtime_last_two_weeks: i64,
    #[serde(default)]
    pub playtime_at_review: Option<i64>,
    #[serde(default)]
    pub last_played: i64,
}

/// Row in the `title` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub id: i64,
    pub name: Option<String>,
    pub developer: Option<String>,
    pub release_date: Option<String>,
    pub last_time_fetched: Option<String>,
}

/// Row in the `author` table, keyed by `steamid`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reviewer {
    pub steamid: i64,
    pub num_games_owned: i64,
    pub num_reviews: i64,
    pub last_time_fetched: String,
}

/// Row in the `review` table, keyed by `(author_steamid, app_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub author_steamid: i64,
    pub app_id: i64,
    pub comment_count: i64,
    pub hidden_in_steam_china: bool,
    pub language: String,
    pub received_for_free: bool,
    pub recommendationid: String,
    pub review: String,
    pub steam_china_location: String,
    pub steam_purchase: bool,
    pub timestamp_created: i64,
    pub timestamp_updated: i64,
    pub voted_up: bool,
    pub votes_funny: i64,
    pub votes_up: i64,
    pub weighted_vote_score: f64,
    pub written_during_early_access: bool,
    pub author_playtime_at_review: Option<i64>,
    pub author_playtime_forever: i64,
    pub author_playtime_last_two_weeks: i64,
    pub author_last_played: i64,
    pub last_time_fetched: String,
}

impl WireReview {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Split a wire review into its reviewer row and the flattened review row.
    ///
    /// Playtime and last-played come off the embedded author; the review row
    /// gets the title id, the reviewer id and the fetch stamp merged in.
    pub fn into_records(self, app_id: i64, fetched_at: &str) -> (Reviewer, Review) {
        let author = self.author;
        let reviewer = Reviewer {
            steamid: author.steamid,
            num_games_owned: author.num_games_owned,
            num_reviews: author.num_reviews,
            last_time_fetched: fetched_at.to_string(),
        };
        let review = Review {
            author_steamid: author.steamid,
            app_id,
            comment_count: self.comment_count,
            hidden_in_steam_china: self.hidden_in_steam_china,
            language: self.language,
            received_for_free: self.received_for_free,
            recommendationid: self.recommendationid,
            review: self.review,
            steam_china_location: self.steam_china_location,
            steam_purchase: self.steam_purchase,
            timestamp_created: self.timestamp_created,
            timestamp_updated: self.timestamp_updated,
            voted_up: self.voted_up,
            votes_funny: self.votes_funny,
            votes_up: self.votes_up,
            weighted_vote_score: self.weighted_vote_score,
            written_during_early_access: self.written_during_early_access,
            author_playtime_at_review: author.playtime_at_review,
            author_playtime_forever: author.playtime_forever,
            author_playtime_last_two_weeks: author.playtime_last_two_weeks,
            author_last_played: author.last_played,
            last_time_fetched: fetched_at.to_string(),
        };
        (reviewer, review)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumOrString::deserialize(deserializer)? {
        NumOrString::Int(v) => Ok(v),
        NumOrString::Float(v) => Ok(v as i64),
        NumOrString::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| de::Error::custom(format!("invalid integer {s:?}: {e}"))),
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumOrString::deserialize(deserializer)? {
        NumOrString::Int(v) => Ok(v as f64),
        NumOrString::Float(v) => Ok(v),
        NumOrString::Str(s) if s.trim().is_empty() => Ok(0.0),
        NumOrString::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| de::Error::custom(format!("invalid float {s:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "success": 1,
            "query_summary": { "num_reviews": 1 },
            "reviews": [{
                "recommendationid": "150112233",
                "author": {
                    "steamid": "76561198000000555",
                    "num_games_owned": 42,
                    "num_reviews": 3,
                    "playtime_forever": 600,
                    "playtime_last_two_weeks": 12,
                    "playtime_at_review": 480,
                    "last_played": 1700000000
                },
                "language": "english",
                "review": "Solid.",
                "timestamp_created": 1690000000,
                "timestamp_updated": 1690000500,
                "voted_up": true,
                "votes_up": 3,
                "votes_funny": 0,
                "weighted_vote_score": "0.523809552192687988",
                "comment_count": 1,
                "steam_purchase": true,
                "received_for_free": false,
                "written_during_early_access": false,
                "hidden_in_steam_china": true,
                "steam_china_location": "",
                "primarily_steam_deck": false
            }],
            "cursor": "AoJwZ1+2/Ig="
        })
    }

    #[test]
    fn decodes_string_encoded_numbers() {
        let resp: ReviewsResponse = serde_json::from_value(sample()).unwrap();
        assert_eq!(resp.reviews.len(), 1);
        let r = WireReview::from_value(&resp.reviews[0]).unwrap();
        assert_eq!(r.author.steamid, 76561198000000555);
        assert!((r.weighted_vote_score - 0.5238).abs() < 1e-3);
        assert_eq!(resp.cursor.as_deref(), Some("AoJwZ1+2/Ig="));
    }

    #[test]
    fn numeric_vote_score_and_missing_playtime_at_review() {
        let mut v = sample();
        v["reviews"][0]["weighted_vote_score"] = json!(0);
        v["reviews"][0]["author"]
            .as_object_mut()
            .unwrap()
            .remove("playtime_at_review");
        let resp: ReviewsResponse = serde_json::from_value(v).unwrap();
        let r = WireReview::from_value(&resp.reviews[0]).unwrap();
        assert_eq!(r.weighted_vote_score, 0.0);
        assert_eq!(r.author.playtime_at_review, None);
    }

    #[test]
    fn malformed_entry_fails_alone() {
        let mut v = sample();
        v["reviews"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "recommendationid": "9", "author": { "steamid": "not-a-number" } }));
        let resp: ReviewsResponse = serde_json::from_value(v).unwrap();
        assert_eq!(resp.reviews.len(), 2);
        assert!(WireReview::from_value(&resp.reviews[0]).is_ok());
        assert!(WireReview::from_value(&resp.reviews[1]).is_err());
    }

    #[test]
    fn empty_object_decodes_to_empty_page() {
        let resp: ReviewsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.reviews.is_empty());
        assert!(resp.cursor.is_none());
    }

    #[test]
    fn flattens_author_fields_into_review() {
        let resp: ReviewsResponse = serde_json::from_value(sample()).unwrap();
        let wire = WireReview::from_value(&resp.reviews[0]).unwrap();
        let (reviewer, review) = wire.into_records(100, "2026-10-19 12:00:00");

        assert_eq!(reviewer.steamid, 76561198000000555);
        assert_eq!(reviewer.num_games_owned, 42);
        assert_eq!(reviewer.last_time_fetched, "2026-10-19 12:00:00");

        assert_eq!(review.author_steamid, reviewer.steamid);
        assert_eq!(review.app_id, 100);
        assert_eq!(review.author_playtime_at_review, Some(480));
        assert_eq!(review.author_playtime_forever, 600);
        assert_eq!(review.author_playtime_last_two_weeks, 12);
        assert_eq!(review.author_last_played, 1700000000);
        assert!(review.voted_up);
        assert!(review.hidden_in_steam_china);
        assert_eq!(review.last_time_fetched, "2026-10-19 12:00:00");
    }
}
