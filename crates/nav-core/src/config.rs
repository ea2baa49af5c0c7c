//! Runtime configuration for the guidance assistant.

use crate::{NavError, Result};
use intent_parser::KeywordSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vision_detect::ComputeDevice;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Minimum detector confidence for a detection to count
    pub confidence_threshold: f32,
    /// Minimum gap between two spoken announcements
    pub announcement_interval_secs: f64,
    /// Upper bound on how long an idle coordinator waits for a command
    pub poll_interval_ms: u64,
    /// Camera device index or video file path
    pub camera: String,
    pub device: ComputeDevice,
    pub model_path: String,
    pub labels_path: String,
    pub debug_display: bool,
    pub keywords: KeywordSet,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            announcement_interval_secs: 5.0,
            poll_interval_ms: 100,
            camera: "0".to_string(),
            device: ComputeDevice::Auto,
            model_path: "yolov8n.onnx".to_string(),
            labels_path: "coco.names".to_string(),
            debug_display: false,
            keywords: KeywordSet::default(),
        }
    }
}

impl NavConfig {
    /// Load from a YAML file, or JSON when the extension is `.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| NavError::Io {
            path: shown.clone(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&contents).map_err(|e| NavError::Parse {
                path: shown.clone(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| NavError::Parse {
                path: shown.clone(),
                message: e.to_string(),
            })?
        };

        config.validate()?;
        tracing::info!("Loaded configuration from {}", shown);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(NavError::Config(format!(
                "confidence_threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if Duration::try_from_secs_f64(self.announcement_interval_secs).is_err() {
            return Err(NavError::Config(format!(
                "announcement_interval_secs {} is not a representable non-negative duration",
                self.announcement_interval_secs
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(NavError::Config("poll_interval_ms must be positive".to_string()));
        }
        let words = [
            ("start", &self.keywords.start),
            ("stop", &self.keywords.stop),
            ("sleep", &self.keywords.sleep),
        ];
        if let Some((name, _)) = words.iter().find(|(_, word)| word.trim().is_empty()) {
            return Err(NavError::Config(format!("{name} keyword must not be empty")));
        }
        Ok(())
    }

    /// Interval as a `Duration`. Out-of-range values that skipped
    /// [`validate`](Self::validate) saturate instead of panicking.
    pub fn announcement_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.announcement_interval_secs).unwrap_or(
            if self.announcement_interval_secs > 0.0 {
                Duration::MAX
            } else {
                Duration::ZERO
            },
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = NavConfig::default();
        assert_eq!(config.confidence_threshold, 0.8);
        assert_eq!(config.announcement_interval(), Duration::from_secs(5));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.keywords.start, "assist");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "confidence_threshold: 0.6\ndevice: cpu\nkeywords:\n  start: guide me\n"
        )
        .unwrap();

        let config = NavConfig::load(file.path()).unwrap();
        assert_eq!(config.confidence_threshold, 0.6);
        assert_eq!(config.device, ComputeDevice::Cpu);
        assert_eq!(config.keywords.start, "guide me");
        assert_eq!(config.keywords.stop, "stop");
        assert_eq!(config.announcement_interval_secs, 5.0);
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"announcement_interval_secs": 2.5, "camera": "clip.mp4"}}"#).unwrap();

        let config = NavConfig::load(file.path()).unwrap();
        assert_eq!(config.announcement_interval(), Duration::from_millis(2500));
        assert_eq!(config.camera, "clip.mp4");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = NavConfig::default();
        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = NavConfig::default();
        config.announcement_interval_secs = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = NavConfig::default();
        config.announcement_interval_secs = -1.0;
        assert!(config.validate().is_err());

        let mut config = NavConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = NavConfig::default();
        config.keywords.sleep = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_interval_rejected_without_panic() {
        let config = NavConfig {
            announcement_interval_secs: 1e20,
            ..NavConfig::default()
        };
        assert!(matches!(config.validate(), Err(NavError::Config(_))));
        assert_eq!(config.announcement_interval(), Duration::MAX);

        let config = NavConfig {
            announcement_interval_secs: f64::NAN,
            ..NavConfig::default()
        };
        assert_eq!(config.announcement_interval(), Duration::ZERO);
    }

    #[test]
    fn test_zero_interval_accepted() {
        let config = NavConfig {
            announcement_interval_secs: 0.0,
            ..NavConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.announcement_interval(), Duration::ZERO);
    }

    #[test]
    fn test_missing_file() {
        let err = NavConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, NavError::Io { .. }));
    }
}
