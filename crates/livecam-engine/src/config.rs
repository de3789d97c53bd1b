use livecam_frame::Rotation;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid rotation in config: {0}")]
    Rotation(#[from] livecam_frame::RotationError),
}

/// Engine configuration, loaded from environment variables or a TOML file.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Name of the analysis thread (default: livecam-analysis).
    pub thread_name: String,
    /// Capacity of the result channel; the analysis thread waits when it is full.
    pub result_queue: usize,
    /// Clockwise rotation applied to frames that carry none of their own.
    pub rotation: Rotation,
    /// Whether each result carries a copy of the (rotated) BGR image.
    pub keep_images: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_name: "livecam-analysis".to_string(),
            result_queue: 4,
            rotation: Rotation::Deg0,
            keep_images: false,
        }
    }
}

/// On-disk form; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    thread_name: Option<String>,
    result_queue: Option<usize>,
    rotation: Option<i32>,
    keep_images: Option<bool>,
}

impl EngineConfig {
    /// Load configuration from `LIVECAM_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `var`.
    /// Unparseable values fall back to their defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let rotation = match parsed::<i32>(&var, "LIVECAM_ROTATION") {
            Some(degrees) => Rotation::from_degrees(degrees).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring LIVECAM_ROTATION");
                defaults.rotation
            }),
            None => defaults.rotation,
        };

        Self {
            thread_name: var("LIVECAM_THREAD_NAME").unwrap_or(defaults.thread_name),
            result_queue: parsed(&var, "LIVECAM_RESULT_QUEUE")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.result_queue),
            rotation,
            keep_images: var("LIVECAM_KEEP_IMAGES")
                .map(|v| v != "0")
                .unwrap_or(defaults.keep_images),
        }
    }

    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(src)?;
        let defaults = Self::default();
        Ok(Self {
            thread_name: file.thread_name.unwrap_or(defaults.thread_name),
            result_queue: file
                .result_queue
                .filter(|&n| n > 0)
                .unwrap_or(defaults.result_queue),
            rotation: file
                .rotation
                .map(Rotation::from_degrees)
                .transpose()?
                .unwrap_or(defaults.rotation),
            keep_images: file.keep_images.unwrap_or(defaults.keep_images),
        })
    }
}

fn parsed<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_vars_defaults() {
        assert_eq!(EngineConfig::from_vars(vars(&[])), EngineConfig::default());
    }

    #[test]
    fn test_from_vars_overrides() {
        let config = EngineConfig::from_vars(vars(&[
            ("LIVECAM_THREAD_NAME", "cam0"),
            ("LIVECAM_RESULT_QUEUE", "8"),
            ("LIVECAM_ROTATION", "270"),
            ("LIVECAM_KEEP_IMAGES", "1"),
        ]));
        assert_eq!(config.thread_name, "cam0");
        assert_eq!(config.result_queue, 8);
        assert_eq!(config.rotation, Rotation::Deg270);
        assert!(config.keep_images);
    }

    #[test]
    fn test_from_vars_bad_values_fall_back() {
        let config = EngineConfig::from_vars(vars(&[
            ("LIVECAM_RESULT_QUEUE", "0"),
            ("LIVECAM_ROTATION", "45"),
            ("LIVECAM_KEEP_IMAGES", "0"),
        ]));
        assert_eq!(config.result_queue, 4);
        assert_eq!(config.rotation, Rotation::Deg0);
        assert!(!config.keep_images);
    }

    #[test]
    fn test_from_toml_str_partial() {
        let config = EngineConfig::from_toml_str("rotation = 90\nkeep_images = true\n").unwrap();
        assert_eq!(config.rotation, Rotation::Deg90);
        assert!(config.keep_images);
        assert_eq!(config.result_queue, 4);
    }

    #[test]
    fn test_from_toml_str_rejects_bad_rotation() {
        let err = EngineConfig::from_toml_str("rotation = 30").unwrap_err();
        assert!(matches!(err, ConfigError::Rotation(_)));
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_key() {
        let err = EngineConfig::from_toml_str("fps = 30").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "thread_name = \"front-camera\"").unwrap();
        writeln!(file, "result_queue = 2").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.thread_name, "front-camera");
        assert_eq!(config.result_queue, 2);
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
