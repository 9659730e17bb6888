use std::path::Path;

use anyhow::{Context, Result};
use document_tree::SnapshotTree;
use text_locator::Anchor;
use tokio::fs;

pub async fn read_tree(path: &Path) -> Result<SnapshotTree> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read tree file {}", path.display()))?;
    SnapshotTree::from_json_str(&raw)
        .with_context(|| format!("Failed to parse tree file {}", path.display()))
}

pub async fn read_anchor(path: &Path) -> Result<Anchor> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read anchor file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse anchor file {}", path.display()))
}
