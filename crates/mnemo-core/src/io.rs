use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `data` unless it already holds exactly that.
///
/// The new content goes through a tempfile next to the target, so a reader
/// sees the old file or the new one and never a partial write. An existing
/// file keeps its permissions across the swap. Returns whether anything was
/// written, which keeps regenerated catalog files from churning.
pub fn write_if_changed(path: &Path, data: &[u8]) -> Result<bool> {
    let previous = std::fs::metadata(path).ok();
    if let Some(meta) = &previous {
        if meta.len() == data.len() as u64 && std::fs::read(path)? == data {
            tracing::debug!(path = %path.display(), "unchanged, not rewriting");
            return Ok(false);
        }
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    if let Some(meta) = previous {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(true)
}

/// Pretty JSON with a trailing newline, for files people read and diff.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<bool> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');
    write_if_changed(path, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".claude-plugin/nested/marketplace.json");
        assert!(write_if_changed(&path, b"{}").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn identical_content_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        assert!(write_if_changed(&path, b"v1").unwrap());
        assert!(!write_if_changed(&path, b"v1").unwrap());
        assert!(write_if_changed(&path, b"v2").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "v2");
    }

    #[cfg(unix)]
    #[test]
    fn replacement_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("marketplace.json");
        std::fs::write(&path, b"old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert!(write_if_changed(&path, b"new").unwrap());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn pretty_json_ends_with_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        write_json_pretty(&path, &serde_json::json!({ "plugins": [] })).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n"));
        assert!(text.ends_with("}\n"));
    }
}
