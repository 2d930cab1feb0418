use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber shared by every binary.
///
/// Events go to stderr with target, file and line so stdout stays free for
/// run summaries.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let env_value = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(resolve_filter(env_value.as_deref(), default_filter))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow!(e))
        .context("install tracing subscriber")
}

/// `RUST_LOG` when it parses, `default_filter` otherwise.
fn resolve_filter(env_value: Option<&str>, default_filter: &str) -> EnvFilter {
    env_value
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter))
}
