use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const MNEMO_DIR: &str = ".mnemo";
pub const PLUGINS_DIR: &str = "plugins";

pub const CONFIG_FILE: &str = ".mnemo/config.yaml";
pub const SNAPSHOT_FILE: &str = ".mnemo/snapshot.json";
pub const MARKETPLACE_FILE: &str = ".claude-plugin/marketplace.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn mnemo_dir(root: &Path) -> PathBuf {
    root.join(MNEMO_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn snapshot_path(root: &Path) -> PathBuf {
    root.join(SNAPSHOT_FILE)
}

pub fn marketplace_path(root: &Path) -> PathBuf {
    root.join(MARKETPLACE_FILE)
}
