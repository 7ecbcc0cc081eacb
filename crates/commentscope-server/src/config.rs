//! Server configuration

use crate::cli::ServeArgs;
use commentscope_history::DEFAULT_HISTORY_LIMIT;
use commentscope_models::ModelsConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Prediction history file
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,

    /// Number of history entries kept
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Model bundle locations
    #[serde(default)]
    pub models: ModelsConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &Path, args: &ServeArgs) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        if let Some(listen) = &args.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = args.port {
            config.port = port;
        }

        if let Some(history_file) = &args.history_file {
            config.history_file = history_file.clone();
        }

        if let Some(device) = &args.device {
            config.models.device = device.parse()?;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.listen, self.port).parse()?)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            history_file: default_history_file(),
            history_limit: default_history_limit(),
            models: ModelsConfig::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_history_file() -> PathBuf {
    PathBuf::from("./history.json")
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use commentscope_models::DeviceType;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            ServerConfig::load(Path::new("/nonexistent/commentscope.yaml"), &ServeArgs::default())
                .unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 5000);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_yaml_with_cli_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("commentscope.yaml");
        std::fs::write(
            &path,
            "port: 8080\nhistory_limit: 10\nmodels:\n  emotion_dir: /srv/emotion\n  device: cpu\n",
        )
        .unwrap();

        let args = ServeArgs {
            listen: Some("127.0.0.1".to_string()),
            device: Some("cuda:0".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::load(&path, &args).unwrap();

        assert_eq!(config.listen, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.models.emotion_dir, PathBuf::from("/srv/emotion"));
        assert_eq!(config.models.device, DeviceType::Cuda(0));
        assert_eq!(
            config.models.sentiment_dir,
            PathBuf::from("./models/model_sentiment")
        );
    }

    #[test]
    fn test_invalid_device_override_fails() {
        let args = ServeArgs {
            device: Some("tpu".to_string()),
            ..Default::default()
        };
        assert!(ServerConfig::load(Path::new("/nonexistent.yaml"), &args).is_err());
    }
}
