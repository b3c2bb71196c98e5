use crate::error::{MnemoError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ValidationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_min_description_len")]
    pub min_description_len: usize,
}

fn default_categories() -> Vec<String> {
    [
        "training",
        "evaluation",
        "optimization",
        "debugging",
        "architecture",
        "tooling",
        "ci-cd",
        "testing",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_description_len() -> usize {
    20
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            min_description_len: default_min_description_len(),
        }
    }
}

impl ValidationConfig {
    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

// ---------------------------------------------------------------------------
// MarketplaceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OwnerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    #[serde(default = "default_marketplace_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_marketplace_version")]
    pub version: String,
    #[serde(default)]
    pub owner: OwnerConfig,
}

fn default_marketplace_name() -> String {
    "skills".to_string()
}

fn default_marketplace_version() -> String {
    "1.0.0".to_string()
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            name: default_marketplace_name(),
            description: String::new(),
            version: default_marketplace_version(),
            owner: OwnerConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// File extensions (without the dot) treated as skill notes.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
    /// Per-file read timeout in milliseconds; `0` disables the timeout.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub snapshot: bool,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
}

fn default_version() -> u32 {
    1
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            extensions: default_extensions(),
            skip_hidden: true,
            read_timeout_ms: default_read_timeout_ms(),
            parallel: true,
            snapshot: false,
            validation: ValidationConfig::default(),
            marketplace: MarketplaceConfig::default(),
        }
    }
}

impl Config {
    /// Load `.mnemo/config.yaml` under `root`. A missing file means defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        if cfg.version != 1 {
            return Err(MnemoError::Config(format!(
                "unsupported config version {} in {}",
                cfg.version,
                path.display()
            )));
        }
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::write_if_changed(&path, data.as_bytes())?;
        Ok(())
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// True when `path` has one of the configured note extensions.
    pub fn is_note_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.extensions.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "extensions is empty: no file will be loaded".to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        for category in &self.validation.categories {
            if !seen.insert(category.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("duplicate category '{category}' in validation.categories"),
                });
            }
            if category.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "empty entry in validation.categories".to_string(),
                });
            }
        }

        if self.read_timeout_ms > 0 && self.read_timeout_ms < 50 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "read_timeout_ms={} is very low; slow disks will skip notes",
                    self.read_timeout_ms
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.extensions, vec!["md".to_string()]);
        assert!(cfg.parallel);
        assert!(!cfg.snapshot);
        assert_eq!(cfg.read_timeout(), Some(Duration::from_millis(5_000)));
        assert_eq!(cfg.validation.categories.len(), 8);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".mnemo")).unwrap();
        std::fs::write(
            dir.path().join(".mnemo/config.yaml"),
            "snapshot: true\nread_timeout_ms: 0\nmarketplace:\n  name: Mnemosyne\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert!(cfg.snapshot);
        assert_eq!(cfg.read_timeout(), None);
        assert_eq!(cfg.marketplace.name, "Mnemosyne");
        assert_eq!(cfg.marketplace.version, "1.0.0");
        assert_eq!(cfg.validation.min_description_len, 20);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".mnemo")).unwrap();
        std::fs::write(dir.path().join(".mnemo/config.yaml"), "parallel: [not, a, bool\n").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.extensions.push("markdown".to_string());
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.extensions, vec!["md", "markdown"]);
    }

    #[test]
    fn note_file_matching_ignores_case_and_dot() {
        let mut cfg = Config::default();
        cfg.extensions = vec![".md".to_string()];
        assert!(cfg.is_note_file(Path::new("a/SKILL.MD")));
        assert!(!cfg.is_note_file(Path::new("a/plugin.json")));
        assert!(!cfg.is_note_file(Path::new("a/README")));
    }

    #[test]
    fn validate_flags_empty_extensions_and_duplicates() {
        let mut cfg = Config::default();
        cfg.extensions.clear();
        cfg.validation.categories.push("debugging".to_string());
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
        assert!(warnings.iter().any(|w| w.message.contains("duplicate category")));
    }

    #[test]
    fn default_config_validates_clean() {
        assert!(Config::default().validate().is_empty());
    }
}
