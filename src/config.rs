use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::device::CameraIndex;
use crate::transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_CAMERA_INDEX: u64 = 0;
const DEFAULT_SAVE_DIR: &str = ".";

#[derive(Debug, Deserialize, Default)]
struct ClientConfigFile {
    service_url: Option<String>,
    camera_index: Option<serde_json::Value>,
    save_dir: Option<PathBuf>,
    timeouts: Option<TimeoutConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct TimeoutConfigFile {
    connect_secs: Option<u64>,
    request_secs: Option<u64>,
}

/// Settings for the `webcam_ctl` binary. `CameraClient` takes plain
/// arguments and never reads these itself.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub service_url: String,
    pub camera_index: CameraIndex,
    pub save_dir: PathBuf,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            camera_index: CameraIndex::Number(DEFAULT_CAMERA_INDEX),
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Loads from the file named by `WEBCAM_CONFIG` (if any), then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("WEBCAM_CONFIG")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let file_cfg = match config_path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ClientConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let camera_index = match file.camera_index {
            None => defaults.camera_index,
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .map(CameraIndex::Number)
                .ok_or_else(|| anyhow!("camera_index must be a non-negative integer"))?,
            Some(serde_json::Value::String(s)) => CameraIndex::Name(s),
            Some(other) => {
                return Err(anyhow!(
                    "camera_index must be an integer or string, got {}",
                    other
                ))
            }
        };
        let timeouts = file.timeouts.unwrap_or_default();
        Ok(Self {
            service_url: file.service_url.unwrap_or(defaults.service_url),
            camera_index,
            save_dir: file.save_dir.unwrap_or(defaults.save_dir),
            connect_timeout: timeouts
                .connect_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            request_timeout: timeouts
                .request_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("WEBCAM_SERVICE_URL") {
            if !url.trim().is_empty() {
                self.service_url = url;
            }
        }
        if let Ok(index) = std::env::var("WEBCAM_CAMERA_INDEX") {
            if !index.trim().is_empty() {
                self.camera_index = CameraIndex::parse(&index);
            }
        }
        if let Ok(dir) = std::env::var("WEBCAM_SAVE_DIR") {
            if !dir.trim().is_empty() {
                self.save_dir = PathBuf::from(dir);
            }
        }
        if let Ok(secs) = std::env::var("WEBCAM_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout = parse_secs("WEBCAM_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        if let Ok(secs) = std::env::var("WEBCAM_REQUEST_TIMEOUT_SECS") {
            self.request_timeout = parse_secs("WEBCAM_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let url = url::Url::parse(self.service_url.trim())
            .map_err(|e| anyhow!("invalid service_url {}: {}", self.service_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("service_url must use http or https"));
        }
        if self.connect_timeout.is_zero() {
            return Err(anyhow!("connect timeout must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ClientConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let seconds: u64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow!("{} must be an integer number of seconds", key))?;
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = ClientConfig::from_file(ClientConfigFile::default()).unwrap();
        assert_eq!(cfg.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(cfg.camera_index, CameraIndex::Number(0));
        assert_eq!(cfg.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn camera_index_accepts_numbers_and_strings() {
        let file: ClientConfigFile = serde_json::from_str(r#"{"camera_index": "usb-1"}"#).unwrap();
        let cfg = ClientConfig::from_file(file).unwrap();
        assert_eq!(cfg.camera_index, CameraIndex::Name("usb-1".into()));

        let file: ClientConfigFile = serde_json::from_str(r#"{"camera_index": -2}"#).unwrap();
        assert!(ClientConfig::from_file(file).is_err());

        let file: ClientConfigFile = serde_json::from_str(r#"{"camera_index": [1]}"#).unwrap();
        assert!(ClientConfig::from_file(file).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = ClientConfig {
            request_timeout: Duration::from_secs(0),
            ..ClientConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_http_service_url_is_rejected() {
        let cfg = ClientConfig {
            service_url: "ftp://cam.local".to_string(),
            ..ClientConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
