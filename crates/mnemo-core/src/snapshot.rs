//! Optional on-disk cache of parsed notes.
//!
//! The snapshot is keyed by the exact list of file stamps (path, size,
//! mtime). Any mismatch or decode failure means a full parse; a broken
//! snapshot is never an error.

use crate::document::{ParseWarning, SkillDocument};
use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    pub path: String,
    pub size: u64,
    pub modified_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    stamps: Vec<FileStamp>,
    documents: Vec<SkillDocument>,
    #[serde(default)]
    warnings: Vec<ParseWarning>,
}

/// Documents and extraction warnings restored from a matching snapshot.
#[derive(Debug)]
pub struct Cached {
    pub documents: Vec<SkillDocument>,
    pub warnings: Vec<ParseWarning>,
}

/// Stamp every file. `None` if any file's metadata cannot be read, which
/// disables the snapshot for this pass.
pub fn stamp_files(root: &Path, files: &[PathBuf]) -> Option<Vec<FileStamp>> {
    files
        .iter()
        .map(|file| {
            let meta = std::fs::metadata(file).ok()?;
            let modified_ms = meta
                .modified()
                .ok()?
                .duration_since(UNIX_EPOCH)
                .ok()?
                .as_millis() as u64;
            let rel = file.strip_prefix(root).unwrap_or(file);
            Some(FileStamp {
                path: rel.to_string_lossy().replace('\\', "/"),
                size: meta.len(),
                modified_ms,
            })
        })
        .collect()
}

pub fn load_matching(root: &Path, stamps: &[FileStamp]) -> Option<Cached> {
    let path = paths::snapshot_path(root);
    let data = std::fs::read(&path).ok()?;
    let snap: SnapshotFile = match serde_json::from_slice(&data) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable snapshot");
            return None;
        }
    };
    if snap.version != SNAPSHOT_VERSION || snap.stamps != stamps {
        tracing::debug!("snapshot is stale");
        return None;
    }
    tracing::debug!(documents = snap.documents.len(), "using snapshot");
    Some(Cached {
        documents: snap.documents,
        warnings: snap.warnings,
    })
}

/// Write the cache for a pass in which every discovered file was read.
pub fn save(
    root: &Path,
    stamps: &[FileStamp],
    documents: &[SkillDocument],
    warnings: &[ParseWarning],
) -> Result<()> {
    #[derive(Serialize)]
    struct SnapshotRef<'a> {
        version: u32,
        stamps: &'a [FileStamp],
        documents: &'a [SkillDocument],
        warnings: &'a [ParseWarning],
    }

    let data = serde_json::to_vec(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        stamps,
        documents,
        warnings,
    })?;
    crate::io::write_if_changed(&paths::snapshot_path(root), &data)?;
    Ok(())
}
