//! Entry file loading.

use anyhow::{Context, Result};
use resonator_recur::Entry;

/// ## Summary
/// Reads the entry list from a JSON file.
///
/// ## Errors
/// Returns an error when the file is unreadable or does not hold a JSON
/// entry list.
pub async fn load_entries(path: &str) -> Result<Vec<Entry>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading entry file {path}"))?;
    let entries: Vec<Entry> =
        serde_json::from_str(&raw).with_context(|| format!("parsing entry file {path}"))?;
    Ok(entries)
}
