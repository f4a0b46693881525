//! Persistent scheduler configuration.
//!
//! Stored as JSON in `<config_dir>/phosphor-scheduler/config.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default cap on the normal queue's pending-record count.
pub const DEFAULT_NORMAL_QUEUE_CAP: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on `normal` queue length.
    pub normal_queue_cap: usize,
    /// `log` crate level filter (`"info"`, `"debug"`, ...). `None`
    /// defers to `RUST_LOG`.
    pub log_level: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            normal_queue_cap: DEFAULT_NORMAL_QUEUE_CAP,
            log_level: None,
        }
    }
}

impl SchedulerConfig {
    /// Path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|d| d.join("config.json"))
    }

    /// Load config from disk, or return defaults if not found or
    /// invalid.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Some(p) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                eprintln!("[phosphor-scheduler] Cannot parse config: {e}");
                Self::default()
            }),
            Err(e) => {
                eprintln!("[phosphor-scheduler] Cannot read config: {e}");
                Self::default()
            }
        }
    }

    /// Save config to disk.
    pub fn save(&self) {
        let path = match Self::config_path() {
            Some(p) => p,
            None => return,
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    eprintln!("[phosphor-scheduler] Cannot save config: {e}");
                } else {
                    eprintln!("[phosphor-scheduler] Config saved to {}", path.display());
                }
            }
            Err(e) => eprintln!("[phosphor-scheduler] Cannot serialize config: {e}"),
        }
    }
}

fn config_dir() -> Option<PathBuf> {
    // macOS:   ~/Library/Application Support/phosphor-scheduler/
    // Linux:   ~/.config/phosphor-scheduler/
    // Windows: %APPDATA%/phosphor-scheduler/

    #[cfg(target_os = "macos")]
    {
        let home = std::env::var("HOME").ok()?;
        Some(
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("phosphor-scheduler"),
        )
    }

    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").ok()?;
        Some(PathBuf::from(appdata).join("phosphor-scheduler"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("phosphor-scheduler"));
        }
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".config").join("phosphor-scheduler"))
    }
}
