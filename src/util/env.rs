//! Deployment settings: `.env` loading and the database location.
//!
//! Query options never come from here; they are fixed at startup by the CLI.
use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use tracing::debug;

use crate::config::DEFAULT_DATABASE_PATH;

pub const DATABASE_PATH_VAR: &str = "DATABASE_PATH";

static INIT: Once = Once::new();

/// Load `.env` from the working directory, falling back to the crate root.
/// Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        let _ = dotenv::from_filename(candidate);
    });
}

/// Optional env var (None if unset or blank).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// SQLite path: explicit override, then `DATABASE_PATH`, then the default.
pub fn database_path(override_path: Option<&Path>) -> PathBuf {
    if let Some(p) = override_path {
        return p.to_path_buf();
    }
    env_opt(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
            debug!(dir = %parent.display(), "created database directory");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let p = database_path(Some(Path::new("/tmp/reviews.db")));
        assert_eq!(p, PathBuf::from("/tmp/reviews.db"));
    }

    #[test]
    fn parent_dir_is_created() {
        let root = std::env::temp_dir().join(format!("review-ingest-{}", std::process::id()));
        let db = root.join("nested").join("db.sqlite");
        ensure_parent_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
