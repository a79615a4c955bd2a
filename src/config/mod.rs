use crate::models::RobotSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat, Map};
use std::fs;

/// File name of the settings file inside the settings directory
pub const SETTINGS_FILE: &str = "uirobot.yaml";

/// Prefix of environment variables overriding settings, e.g. `UIROBOT_POLL_INTERVAL`
pub const ENV_PREFIX: &str = "UIROBOT";

/// Settings manager for loading and saving [`RobotSettings`].
///
/// Settings are layered, later sources winning:
/// 1. built-in defaults
/// 2. `uirobot.yaml` in the settings directory (optional)
/// 3. `UIROBOT_*` environment variables
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl SettingsManager {
    /// Create a new SettingsManager for the specified directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new<P: AsRef<Utf8Path>>(settings_dir: P) -> Result<Self> {
        let settings_dir = settings_dir.as_ref().to_path_buf();

        if !settings_dir.exists() {
            fs::create_dir_all(&settings_dir)
                .with_context(|| format!("Failed to create settings directory: {}", settings_dir))?;
        }

        Ok(Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
            settings_dir,
        })
    }

    /// Load settings from the file and the process environment.
    pub fn load(&self) -> Result<RobotSettings> {
        self.load_layers(None)
    }

    /// Load settings with `vars` standing in for the process environment.
    ///
    /// Keys are full variable names, e.g. `UIROBOT_WAIT_TIMEOUT`.
    pub fn load_with_env(&self, vars: Map<String, String>) -> Result<RobotSettings> {
        self.load_layers(Some(vars))
    }

    fn load_layers(&self, vars: Option<Map<String, String>>) -> Result<RobotSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings = Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: RobotSettings = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!(
            "Loaded settings: platform={:?}, drag_threshold={}px, idle_timeout={:?}",
            settings.platform(),
            settings.drag_threshold(),
            settings.idle_timeout()
        );
        Ok(settings)
    }

    /// Save settings as YAML.
    pub fn save(&self, settings: &RobotSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    pub fn settings_dir(&self) -> &Utf8Path {
        &self.settings_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;
    use tempfile::TempDir;

    fn create_test_settings_manager() -> (SettingsManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = SettingsManager::new(&dir).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (manager, _temp_dir) = create_test_settings_manager();

        let settings = manager.load_with_env(Map::new()).unwrap();

        assert_eq!(settings, RobotSettings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (manager, _temp_dir) = create_test_settings_manager();
        let settings = RobotSettings {
            drop_delay: 250,
            platform: Some(Platform::Windows),
            ..RobotSettings::default()
        };

        manager.save(&settings).unwrap();
        let loaded = manager.load_with_env(Map::new()).unwrap();

        assert_eq!(loaded, settings);
        assert!(manager.settings_path().exists());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let (manager, _temp_dir) = create_test_settings_manager();
        fs::write(manager.settings_path(), "poll_interval: 25\nplatform: x11\n").unwrap();

        let settings = manager.load_with_env(Map::new()).unwrap();

        assert_eq!(settings.poll_interval, 25);
        assert_eq!(settings.platform, Some(Platform::X11));
        assert_eq!(settings.wait_timeout, 30_000);
    }

    #[test]
    fn test_environment_overrides_file() {
        let (manager, _temp_dir) = create_test_settings_manager();
        fs::write(manager.settings_path(), "wait_timeout: 5000\n").unwrap();

        let mut vars = Map::new();
        vars.insert("UIROBOT_WAIT_TIMEOUT".to_string(), "1500".to_string());
        let settings = manager.load_with_env(vars).unwrap();

        assert_eq!(settings.wait_timeout, 1500);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let (manager, _temp_dir) = create_test_settings_manager();
        fs::write(manager.settings_path(), "poll_interval: [not a number\n").unwrap();

        assert!(manager.load_with_env(Map::new()).is_err());
    }
}
