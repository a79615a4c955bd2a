//! Integration tests for SettingsManager and settings file handling
//!
//! These tests verify:
//! - Settings directory creation
//! - Loading, saving and layering of file and environment values
//! - Settings flowing into a working Robot

use camino::Utf8PathBuf;
use config::Map;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use uirobot::{Platform, Robot, RobotSettings, SettingsManager};

fn create_test_settings_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, settings_path)
}

#[test]
fn test_create_settings_manager_creates_directory() {
    let (_temp_dir, dir) = create_test_settings_dir();
    let nested = dir.join("robot").join("settings");

    let manager = SettingsManager::new(&nested).unwrap();

    assert!(nested.exists());
    assert_eq!(manager.settings_dir(), nested.as_path());
    assert_eq!(manager.settings_path(), nested.join("uirobot.yaml").as_path());
}

#[test]
fn test_environment_layers_over_saved_file() {
    let (_temp_dir, dir) = create_test_settings_dir();
    let manager = SettingsManager::new(&dir).unwrap();
    manager
        .save(&RobotSettings {
            drag_threshold: Some(12),
            poll_interval: 20,
            ..RobotSettings::default()
        })
        .unwrap();

    let mut vars = Map::new();
    vars.insert("UIROBOT_PLATFORM".to_string(), "macos".to_string());
    vars.insert("UIROBOT_POLL_INTERVAL".to_string(), "5".to_string());
    vars.insert("UNRELATED_POLL_INTERVAL".to_string(), "999".to_string());
    let settings = manager.load_with_env(vars).unwrap();

    assert_eq!(settings.platform(), Platform::MacOs);
    assert_eq!(settings.drag_threshold(), 12);
    assert_eq!(settings.poll_interval(), Duration::from_millis(5));
}

#[test]
fn test_saved_file_is_readable_yaml() {
    let (_temp_dir, dir) = create_test_settings_dir();
    let manager = SettingsManager::new(&dir).unwrap();

    manager.save(&RobotSettings::default()).unwrap();

    let contents = fs::read_to_string(manager.settings_path()).unwrap();
    assert!(contents.contains("delay_between_events: 60"));
    assert!(contents.contains("wait_timeout: 30000"));
}

#[test]
fn test_zero_response_timeout_means_unbounded() {
    let (_temp_dir, dir) = create_test_settings_dir();
    let manager = SettingsManager::new(&dir).unwrap();
    fs::write(manager.settings_path(), "ui_response_timeout: 0\n").unwrap();

    let settings = manager.load_with_env(Map::new()).unwrap();

    assert_eq!(settings.ui_response_timeout(), None);
}

#[test]
fn test_loaded_settings_drive_a_robot() {
    let (_temp_dir, dir) = create_test_settings_dir();
    let manager = SettingsManager::new(&dir).unwrap();
    fs::write(
        manager.settings_path(),
        "delay_between_events: 0\npoll_interval: 7\nwait_timeout: 1234\n",
    )
    .unwrap();

    let settings = manager.load_with_env(Map::new()).unwrap();
    let robot = Robot::headless(settings).unwrap();

    assert_eq!(robot.pause().poll_interval(), Duration::from_millis(7));
    assert_eq!(robot.pause().default_timeout().duration(), Duration::from_millis(1234));
}
