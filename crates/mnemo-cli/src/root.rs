use mnemo_core::paths::{MNEMO_DIR, PLUGINS_DIR};
use std::path::{Path, PathBuf};

/// Markers that identify a notes root, in priority order.
const MARKERS: &[&str] = &[MNEMO_DIR, PLUGINS_DIR, ".git"];

/// Resolve the notes root directory.
///
/// Priority:
/// 1. `--root` flag / `MNEMO_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.mnemo/`
/// 3. Walk upward from `cwd` looking for `plugins/`
/// 4. Walk upward from `cwd` looking for `.git/`
/// 5. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd)
}

fn resolve_from(start: &Path) -> PathBuf {
    MARKERS
        .iter()
        .find_map(|marker| {
            start
                .ancestors()
                .find(|dir| dir.join(marker).is_dir())
                .map(Path::to_path_buf)
        })
        .unwrap_or_else(|| start.to_path_buf())
}
