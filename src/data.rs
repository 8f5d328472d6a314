//! Leaf cache - keeps the last good fetch on disk as JSON.

use std::fs;
use std::path::Path;

use crate::error::PodVizError;
use crate::models::NodeRecord;

/// Loads cached leaves.
///
/// # Errors
///
/// Returns `PodVizError::Io` if the file cannot be read.
/// Returns `PodVizError::JsonParse` if the JSON is malformed.
pub fn load_cached_leaves(path: &Path) -> Result<Vec<NodeRecord>, PodVizError> {
    let content = fs::read_to_string(path)?;
    let nodes: Vec<NodeRecord> = serde_json::from_str(&content)?;
    Ok(nodes)
}

/// Writes leaves to the cache, creating parent directories as needed.
///
/// Ranks are derived data and are not written.
pub fn save_cached_leaves(path: &Path, nodes: &[NodeRecord]) -> Result<(), PodVizError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let unranked: Vec<NodeRecord> = nodes
        .iter()
        .map(|n| NodeRecord {
            credit_rank: None,
            ..n.clone()
        })
        .collect();
    fs::write(path, serde_json::to_string_pretty(&unranked)?)?;
    Ok(())
}
