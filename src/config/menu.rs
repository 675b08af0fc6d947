use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::constants::categories::{DEFAULT_LABELS, DEFAULT_ORDER, DEFAULT_SINGLE_SELECT};
use crate::constants::config::{APP_DIR, DEFAULT_FALLBACK_CSV, FILENAME};
use crate::selection::SelectionPolicies;

/// Display labels for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub en: String,
    pub ja: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the remote menu store; None runs offline
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(default = "default_single_select")]
    pub single_select_categories: Vec<String>,

    #[serde(default = "default_category_order")]
    pub category_order: Vec<String>,

    #[serde(default = "default_category_labels")]
    pub category_labels: IndexMap<String, CategoryLabel>,

    #[serde(default)]
    pub remote: RemoteSettings,

    /// Relative paths resolve against the config directory
    #[serde(default = "default_fallback_csv")]
    pub fallback_csv: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_single_select() -> Vec<String> {
    DEFAULT_SINGLE_SELECT.iter().map(|s| s.to_string()).collect()
}

fn default_category_order() -> Vec<String> {
    DEFAULT_ORDER.iter().map(|s| s.to_string()).collect()
}

fn default_category_labels() -> IndexMap<String, CategoryLabel> {
    DEFAULT_LABELS
        .iter()
        .map(|(category, en, ja)| {
            (
                category.to_string(),
                CategoryLabel {
                    en: en.to_string(),
                    ja: ja.to_string(),
                },
            )
        })
        .collect()
}

fn default_fallback_csv() -> PathBuf {
    PathBuf::from(DEFAULT_FALLBACK_CSV)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            single_select_categories: default_single_select(),
            category_order: default_category_order(),
            category_labels: default_category_labels(),
            remote: RemoteSettings::default(),
            fallback_csv: default_fallback_csv(),
            log_level: default_log_level(),
        }
    }
}

impl MenuConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Load configuration from a JSON file or create default
    ///
    /// A malformed file is logged and replaced by defaults in memory; the
    /// file itself is left alone so the user can fix it.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default config");
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config = match serde_json::from_str::<MenuConfig>(&contents) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();

        info!(
            path = %path.display(),
            single_select = ?config.single_select_categories,
            remote = config.remote.base_url.as_deref().unwrap_or("offline"),
            "Loaded config"
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("MENU_REMOTE_URL") {
            self.remote.base_url = Some(url).filter(|u| !u.trim().is_empty());
        }
    }

    pub fn policies(&self) -> SelectionPolicies {
        SelectionPolicies::with_single_select(self.single_select_categories.iter().cloned())
    }

    /// Fallback catalog path, relative paths taken from `base`
    pub fn fallback_csv_path(&self, base: &Path) -> PathBuf {
        if self.fallback_csv.is_absolute() {
            self.fallback_csv.clone()
        } else {
            base.join(&self.fallback_csv)
        }
    }

    /// Categories in configured order, unknown ones after in first-seen order
    pub fn ordered_categories<'a>(&self, present: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let present: Vec<&str> = present.into_iter().collect();

        let mut ordered: Vec<String> = self
            .category_order
            .iter()
            .filter(|c| present.contains(&c.as_str()))
            .cloned()
            .collect();
        for category in present {
            if !ordered.iter().any(|c| c == category) {
                ordered.push(category.to_string());
            }
        }
        ordered
    }

    /// Labels for a category; unknown categories use their name upper-cased
    pub fn label_for(&self, category: &str) -> CategoryLabel {
        self.category_labels
            .get(category)
            .cloned()
            .unwrap_or_else(|| CategoryLabel {
                en: category.to_uppercase(),
                ja: category.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionPolicy;

    #[test]
    fn test_defaults() {
        let config = MenuConfig::default();
        assert_eq!(config.single_select_categories, vec!["主食"]);
        assert_eq!(config.category_order[0], "主食");
        assert_eq!(config.remote.base_url, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"single_select_categories":["主食","SOUP"],"remote":{"base_url":"http://localhost:8080"}}"#;
        let config: MenuConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.single_select_categories, vec!["主食", "SOUP"]);
        assert_eq!(config.remote.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.category_order, default_category_order());
        assert_eq!(config.fallback_csv, PathBuf::from("menu.csv"));
    }

    #[test]
    fn test_policies_from_config() {
        let config = MenuConfig::default();
        let policies = config.policies();
        assert_eq!(policies.policy_for("主食"), SelectionPolicy::SingleSelect);
        assert_eq!(policies.policy_for("DRINK"), SelectionPolicy::MultiSelect);
    }

    #[test]
    fn test_ordered_categories_appends_unknown() {
        let config = MenuConfig::default();
        let ordered = config.ordered_categories(["DRINK", "Specials", "主食", "副菜", "Kids"]);
        assert_eq!(ordered, vec!["主食", "副菜", "DRINK", "Specials", "Kids"]);
    }

    #[test]
    fn test_label_for_known_and_unknown() {
        let config = MenuConfig::default();
        assert_eq!(config.label_for("主菜").en, "MAIN");
        assert_eq!(config.label_for("SOUP").ja, "スープ");

        let unknown = config.label_for("specials");
        assert_eq!(unknown.en, "SPECIALS");
        assert_eq!(unknown.ja, "specials");
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu-configurator").join("config.json");

        let config = MenuConfig::load_from(&path).unwrap();
        assert!(path.exists());

        let written: MenuConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, config);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = MenuConfig::load_from(&path).unwrap();
        assert_eq!(config.single_select_categories, default_single_select());
        // The broken file is left for the user to fix
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_fallback_csv_path_resolution() {
        let mut config = MenuConfig::default();
        assert_eq!(config.fallback_csv_path(Path::new("/etc/menu")), PathBuf::from("/etc/menu/menu.csv"));

        config.fallback_csv = PathBuf::from("/srv/menu.csv");
        assert_eq!(config.fallback_csv_path(Path::new("/etc/menu")), PathBuf::from("/srv/menu.csv"));
    }
}
