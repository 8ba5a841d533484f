use anyhow::{Context, Result};
use caisse_docs::images::DefaultImageLoader;
use caisse_docs::preview::DEFAULT_PREVIEW_ROWS;
use caisse_docs::{FormatLocale, Orientation, ReportType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CaisseConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.caisse/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaisseConfig {
    // Output
    /// Where exports are written; `None` means `~/.caisse/exports/`.
    pub output_dir: Option<PathBuf>,
    /// Institution logo drawn when a template's header asks for one.
    pub logo_path: Option<String>,
    pub preview_rows: usize,

    // Images
    pub allow_remote_images: bool,
    pub image_timeout_secs: u64,

    // Number formatting
    pub group_separator: char,
    pub decimal_separator: char,

    // New templates
    pub default_orientation: Orientation,
    pub default_report_type: ReportType,

    // General
    pub log_level: String,
}

impl Default for CaisseConfig {
    fn default() -> Self {
        let locale = FormatLocale::default();
        Self {
            output_dir: None,
            logo_path: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            allow_remote_images: true,
            image_timeout_secs: 10,
            group_separator: locale.group_separator,
            decimal_separator: locale.decimal_separator,
            default_orientation: Orientation::Portrait,
            default_report_type: ReportType::Recettes,
            log_level: "info".into(),
        }
    }
}

impl CaisseConfig {
    /// Returns the base config directory: `~/.caisse/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".caisse"))
    }

    /// Returns the config file path: `~/.caisse/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.caisse/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Returns the default exports directory: `~/.caisse/exports/`
    pub fn exports_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("exports"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?, Self::exports_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk, or creates default if missing.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let mut config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            config.sanitize();
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Separators used by every renderer.
    pub fn format_locale(&self) -> FormatLocale {
        FormatLocale {
            group_separator: self.group_separator,
            decimal_separator: self.decimal_separator,
        }
    }

    /// Image loader honouring the remote-image settings.
    pub fn image_loader(&self) -> DefaultImageLoader {
        DefaultImageLoader {
            allow_remote: self.allow_remote_images,
            timeout: Duration::from_secs(self.image_timeout_secs),
        }
    }

    /// Resolved export directory.
    pub fn resolved_output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::exports_dir(),
        }
    }

    /// Replace values a hand-edited file may have broken.
    fn sanitize(&mut self) {
        if self.group_separator == self.decimal_separator {
            warn!(
                "Group and decimal separators are both {:?}; using defaults",
                self.decimal_separator
            );
            let locale = FormatLocale::default();
            self.group_separator = locale.group_separator;
            self.decimal_separator = locale.decimal_separator;
        }
        if self.image_timeout_secs == 0 {
            self.image_timeout_secs = Self::default().image_timeout_secs;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_temp_config_dir() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let config_path = tmp.path().join("config.json");
        (tmp, config_path)
    }

    #[test]
    fn default_config_values() {
        let config = CaisseConfig::default();
        assert_eq!(config.preview_rows, 20);
        assert_eq!(config.group_separator, ' ');
        assert_eq!(config.decimal_separator, ',');
        assert_eq!(config.default_orientation, Orientation::Portrait);
        assert_eq!(config.log_level, "info");
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn load_creates_default_when_missing() {
        let (_tmp, path) = make_temp_config_dir();
        assert!(!path.exists());
        let config = CaisseConfig::load_from_path(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, CaisseConfig::default());
    }

    #[test]
    fn save_and_reload_round_trip() {
        let (_tmp, path) = make_temp_config_dir();
        let config = CaisseConfig {
            logo_path: Some("/srv/logo.png".into()),
            preview_rows: 50,
            default_report_type: ReportType::FeuilleCaisse,
            default_orientation: Orientation::Landscape,
            ..Default::default()
        };
        config.save_to_path(&path).unwrap();
        let loaded = CaisseConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let (_tmp, path) = make_temp_config_dir();
        std::fs::write(&path, r#"{"preview_rows": 5, "default_report_type": "depenses"}"#).unwrap();
        let config = CaisseConfig::load_from_path(&path).unwrap();
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.default_report_type, ReportType::Depenses);
        assert!(config.allow_remote_images);
    }

    #[test]
    fn corrupted_file_is_an_error() {
        let (_tmp, path) = make_temp_config_dir();
        std::fs::write(&path, "not-valid-json{{{").unwrap();
        assert!(CaisseConfig::load_from_path(&path).is_err());
    }

    #[test]
    fn clashing_separators_fall_back() {
        let (_tmp, path) = make_temp_config_dir();
        std::fs::write(&path, r#"{"group_separator": ",", "decimal_separator": ","}"#).unwrap();
        let config = CaisseConfig::load_from_path(&path).unwrap();
        assert_eq!(config.format_locale(), FormatLocale::default());
    }

    #[test]
    fn locale_and_loader_follow_settings() {
        let config = CaisseConfig {
            group_separator: '.',
            decimal_separator: ',',
            allow_remote_images: false,
            image_timeout_secs: 3,
            ..Default::default()
        };
        let locale = config.format_locale();
        assert_eq!(locale.group_separator, '.');
        let loader = config.image_loader();
        assert!(!loader.allow_remote);
        assert_eq!(loader.timeout, Duration::from_secs(3));
    }

    #[test]
    fn explicit_output_dir_wins() {
        let config = CaisseConfig {
            output_dir: Some(PathBuf::from("/tmp/exports")),
            ..Default::default()
        };
        assert_eq!(config.resolved_output_dir().unwrap(), PathBuf::from("/tmp/exports"));
    }
}
