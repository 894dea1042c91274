use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::Institution;

/// A finished collection saved as JSON, so a menu session can be reopened
/// without visiting the portal again.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub collected_at: DateTime<Utc>,
    pub institutions: Vec<Institution>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    collected_at: DateTime<Utc>,
    institutions: &'a [Institution],
}

pub fn save(path: &Path, institutions: &[Institution]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(&SnapshotRef {
        collected_at: Utc::now(),
        institutions,
    })?;
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} institutions to {}", institutions.len(), path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<Snapshot> {
    let body =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&body)
        .with_context(|| format!("{} is not a catalog snapshot", path.display()))?;
    info!(
        "Loaded {} institutions collected at {}",
        snapshot.institutions.len(),
        snapshot.collected_at
    );
    Ok(snapshot)
}
