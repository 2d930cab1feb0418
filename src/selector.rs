use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::storage::{ReviewStore, StoreResult};

/// Which titles a run should page through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleSelector {
    /// `*`: every title in the store.
    All,
    /// A purely numeric argument: that one title id.
    Id(i64),
    /// A purely alphabetic argument: titles whose name contains it.
    Name(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid title selector {0:?}: expected `*`, a numeric id, or an alphabetic name fragment")]
pub struct SelectorError(pub String);

impl FromStr for TitleSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(TitleSelector::All);
        }
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return s
                .parse::<i64>()
                .map(TitleSelector::Id)
                .map_err(|_| SelectorError(s.to_string()));
        }
        if !s.is_empty() && s.chars().all(char::is_alphabetic) {
            return Ok(TitleSelector::Name(s.to_string()));
        }
        Err(SelectorError(s.to_string()))
    }
}

impl fmt::Display for TitleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleSelector::All => f.write_str("*"),
            TitleSelector::Id(id) => write!(f, "{id}"),
            TitleSelector::Name(name) => f.write_str(name),
        }
    }
}

impl TitleSelector {
    /// Title ids to ingest. A numeric id is taken as-is, even if the store
    /// has no row for it.
    pub fn resolve(&self, store: &ReviewStore) -> StoreResult<Vec<i64>> {
        match self {
            TitleSelector::All => store.all_title_ids(),
            TitleSelector::Id(id) => Ok(vec![*id]),
            TitleSelector::Name(fragment) => store.title_ids_matching_name(fragment),
        }
    }
}
