use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("LOOKALIKE_CONFIG_PATH").unwrap_or("/usr/local/etc/lookalike/config.toml"))
});

pub static MODEL_DIR: Lazy<PathBuf> = Lazy::new(|| {
    ProjectDirs::from("", "", "lookalike")
        .map(|dirs| dirs.data_dir().join("models"))
        .unwrap_or_else(|| PathBuf::from("/usr/local/share/lookalike/models"))
});

pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Settings read from the TOML config. Every field may be left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// YuNet ONNX model.
    pub detector_model: PathBuf,
    /// SFace ONNX model.
    pub recognizer_model: PathBuf,
    /// Minimum detector confidence for a face.
    pub score_threshold: f32,
    /// IoU above which overlapping detections are merged.
    pub nms_threshold: f32,
    /// Matches returned per query.
    pub top_k: usize,
    /// Largest accepted query photo.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector_model: MODEL_DIR.join("face_detection_yunet_2023mar.onnx"),
            recognizer_model: MODEL_DIR.join("face_recognition_sface_2021dec.onnx"),
            score_threshold: 0.6,
            nms_threshold: 0.3,
            top_k: DEFAULT_TOP_K,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    #[cfg(feature = "onnx")]
    pub fn models(&self) -> lookalike_vision::ModelPaths {
        lookalike_vision::ModelPaths {
            detector: self.detector_model.clone(),
            recognizer: self.recognizer_model.clone(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

/// Write `cfg` as TOML, creating the parent directory when needed.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)
        .with_context(|| format!("writing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.top_k, 10);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "top_k = 3\nrecognizer_model = \"/models/sface.onnx\"\n").unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.top_k, 3);
        assert_eq!(cfg.recognizer_model, PathBuf::from("/models/sface.onnx"));
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            score_threshold: 0.75,
            ..Config::default()
        };
        save_config(&cfg, Some(&path)).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), cfg);
    }

    #[test]
    fn test_save_reports_blocked_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();

        let err = save_config(&Config::default(), Some(&blocker.join("config.toml"))).unwrap_err();
        assert!(err.to_string().contains("creating config directory"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "top_k = \"many\"").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
