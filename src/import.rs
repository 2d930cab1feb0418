//! Bulk title import from a delimited file.
//!
//! Columns are positional: `id, name, developer, release_date`. The first
//! line is a header and is skipped. Short rows are padded with NULLs.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::models::Title;
use crate::storage::ReviewStore;

const TITLE_COLUMNS: usize = 4;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn import_titles_from_path(store: &ReviewStore, path: &Path, delimiter: u8) -> Result<ImportSummary> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    import_titles(store, BufReader::new(file), delimiter)
}

/// Insert every row of `input` as a title inside a single transaction.
/// Rows that fail to parse or insert are logged and skipped.
pub fn import_titles<R: Read>(store: &ReviewStore, input: R, delimiter: u8) -> Result<ImportSummary> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = rdr.headers().context("read header row")?.clone();
    info!(header = ?headers, "importing titles");

    let mut summary = ImportSummary::default();
    store.begin_page()?;
    for (line, record) in rdr.records().enumerate() {
        // +2: one for the header, one for 1-based numbering.
        let line = line + 2;
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                warn!(line, error = %err, "unreadable title row");
                summary.skipped += 1;
                continue;
            }
        };
        let title = match title_from_record(&record) {
            Ok(t) => t,
            Err(err) => {
                warn!(line, row = ?record, error = %err, "invalid title row");
                summary.skipped += 1;
                continue;
            }
        };
        match store.insert_title(&title) {
            Ok(()) => summary.inserted += 1,
            Err(err) => {
                warn!(line, row = ?record, error = %err, "title insert failed");
                summary.skipped += 1;
            }
        }
    }
    store.commit()?;
    info!(inserted = summary.inserted, skipped = summary.skipped, "title import done");
    Ok(summary)
}

fn title_from_record(record: &StringRecord) -> Result<Title> {
    let mut fields: Vec<Option<String>> = record
        .iter()
        .take(TITLE_COLUMNS)
        .map(|f| (!f.is_empty()).then(|| f.to_string()))
        .collect();
    fields.resize(TITLE_COLUMNS, None);

    let Some(raw_id) = fields[0].take() else {
        bail!("missing title id");
    };
    let id = raw_id
        .parse::<i64>()
        .with_context(|| format!("title id {raw_id:?} is not an integer"))?;
    Ok(Title {
        id,
        name: fields[1].take(),
        developer: fields[2].take(),
        release_date: fields[3].take(),
        last_time_fetched: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_rows_and_skips_header() {
        let store = ReviewStore::open_in_memory().unwrap();
        let data = "appid,name,developer,release\n440,Team Fortress 2,Valve,2007\n570,Dota 2\n";

        let summary = import_titles(&store, data.as_bytes(), b',').unwrap();

        assert_eq!(summary, ImportSummary { inserted: 2, skipped: 0 });
        let dota = store.get_title(570).unwrap().unwrap();
        assert_eq!(dota.name.as_deref(), Some("Dota 2"));
        assert_eq!(dota.developer, None);
        assert_eq!(dota.release_date, None);
        assert_eq!(
            store.get_title(440).unwrap().unwrap().developer.as_deref(),
            Some("Valve")
        );
    }

    #[test]
    fn bad_and_duplicate_rows_are_skipped() {
        let store = ReviewStore::open_in_memory().unwrap();
        let data = "id;name\nabc;Broken\n10;First\n10;Again\n;NoId\n20;Second\n";

        let summary = import_titles(&store, data.as_bytes(), b';').unwrap();

        assert_eq!(summary, ImportSummary { inserted: 2, skipped: 3 });
        assert_eq!(store.all_title_ids().unwrap(), vec![10, 20]);
        assert_eq!(store.title_name(10).unwrap().as_deref(), Some("First"));
    }
}
