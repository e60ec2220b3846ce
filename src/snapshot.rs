//! Snapshot persistence
//!
//! The refresh task is the sole writer of the snapshot file; the HTTP
//! server reads the same path. The catalog is written to a temporary file
//! and renamed into place so a reader never observes a half-written
//! snapshot.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::catalog::CourseCatalog;
use crate::error::{Error, Result};

/// File name of the persisted snapshot inside the assets directory
pub const SNAPSHOT_FILE: &str = "courses.json";

/// Well-known path of the snapshot inside `assets_dir`.
pub fn snapshot_path(assets_dir: &Path) -> PathBuf {
    assets_dir.join(SNAPSHOT_FILE)
}

/// Serialize the catalog and atomically replace the snapshot file.
pub async fn write_snapshot(assets_dir: &Path, catalog: &CourseCatalog) -> Result<()> {
    let body = serde_json::to_vec(catalog).map_err(|e| Error::Parse(e.to_string()))?;

    let final_path = snapshot_path(assets_dir);
    let tmp_path = assets_dir.join(format!("{SNAPSHOT_FILE}.tmp"));

    tokio::fs::create_dir_all(assets_dir).await?;
    tokio::fs::write(&tmp_path, &body).await?;
    tokio::fs::rename(&tmp_path, &final_path).await?;

    info!(path = %final_path.display(), bytes = body.len(), "snapshot written");
    Ok(())
}

/// Load a previously written snapshot.
pub async fn read_snapshot(assets_dir: &Path) -> Result<CourseCatalog> {
    let body = tokio::fs::read(snapshot_path(assets_dir)).await?;
    serde_json::from_slice(&body).map_err(|e| Error::Parse(e.to_string()))
}
