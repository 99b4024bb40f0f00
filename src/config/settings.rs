//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// DetectionBackend
// ---------------------------------------------------------------------------

/// Selects which pose backend the capture context uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DetectionBackend {
    /// Deterministic synthetic angles — development and demos, no camera or
    /// model required.
    Synthetic,
    /// A real pose model wired in by the embedder.  Starting a session
    /// without one configured fails with a descriptive error.
    External,
}

impl Default for DetectionBackend {
    fn default() -> Self {
        Self::Synthetic
    }
}

// ---------------------------------------------------------------------------
// DetectionConfig
// ---------------------------------------------------------------------------

/// Settings for the detection tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Pose backend for new capture contexts.
    pub backend: DetectionBackend,
    /// Milliseconds between detection ticks (100 ms ≈ 10 FPS).  A tick that
    /// fires while the previous estimate is still running is skipped, not
    /// queued.
    pub interval_ms: u64,
    /// Seconds between keep-alive pings to the coordinator.
    pub keep_alive_secs: u64,
    /// Capture device name — `None` means the system default.
    pub camera_device: Option<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            backend: DetectionBackend::default(),
            interval_ms: 100,
            keep_alive_secs: 20,
            camera_device: None,
        }
    }
}

// ---------------------------------------------------------------------------
// FeedbackConfig
// ---------------------------------------------------------------------------

/// Settings for periodic aggregate feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Seconds between periodic feedback broadcasts (and backend posture
    /// logs).  Default: 5 minutes.
    pub interval_secs: u64,
    /// Minimum seconds between spoken nudges on a presentation surface.
    pub nudge_cooldown_secs: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            nudge_cooldown_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Settings for the session-reporting backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Whether to report sessions at all.  Monitoring works fully offline.
    pub enabled: bool,
    /// Base URL of the backend API.
    pub base_url: String,
    /// User identifier sent with `POST /session/start`.
    pub user_id: String,
    /// Maximum seconds to wait for a backend response.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:5000".into(),
            user_id: "user_001".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Detection tick settings.
    pub detection: DetectionConfig,
    /// Periodic feedback settings.
    pub feedback: FeedbackConfig,
    /// Session-reporting backend settings.
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.detection.backend, loaded.detection.backend);
        assert_eq!(original.detection.interval_ms, loaded.detection.interval_ms);
        assert_eq!(original.feedback.interval_secs, loaded.feedback.interval_secs);
        assert_eq!(original.backend.base_url, loaded.backend.base_url);
        assert_eq!(original.backend.user_id, loaded.backend.user_id);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.detection.interval_ms, 100);
        assert!(!config.backend.enabled);
    }

    #[test]
    fn default_values_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.detection.backend, DetectionBackend::Synthetic);
        assert_eq!(cfg.detection.interval_ms, 100);
        assert_eq!(cfg.detection.keep_alive_secs, 20);
        assert_eq!(cfg.feedback.interval_secs, 300);
        assert_eq!(cfg.feedback.nudge_cooldown_secs, 60);
        assert_eq!(cfg.backend.base_url, "http://localhost:5000");
        assert_eq!(cfg.backend.timeout_secs, 10);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.detection.backend = DetectionBackend::External;
        cfg.detection.interval_ms = 250;
        cfg.detection.camera_device = Some("/dev/video1".into());
        cfg.feedback.interval_secs = 60;
        cfg.backend.enabled = true;
        cfg.backend.base_url = "https://posture.example.com".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.detection.backend, DetectionBackend::External);
        assert_eq!(loaded.detection.interval_ms, 250);
        assert_eq!(loaded.detection.camera_device.as_deref(), Some("/dev/video1"));
        assert_eq!(loaded.feedback.interval_secs, 60);
        assert!(loaded.backend.enabled);
        assert_eq!(loaded.backend.base_url, "https://posture.example.com");
    }
}
