use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Runtime configuration. Values come from `Default`, then an optional TOML
/// file, then whatever the binary overrides from its flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address of the HTTP server.
    pub bind_addr: SocketAddr,

    /// Directory holding the model artifact (`model.json` / `model.json.gz`).
    pub model_dir: PathBuf,

    /// Reported by `GET /`.
    pub service_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            model_dir: PathBuf::from("models/premium"),
            service_name: "insurance-premium-api".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("parse config toml")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("load config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(r#"model_dir = "/srv/models/v3""#).unwrap();
        assert_eq!(cfg.model_dir, PathBuf::from("/srv/models/v3"));
        assert_eq!(cfg.service_name, "insurance-premium-api");
        assert_eq!(cfg.bind_addr.port(), 8000);
    }

    #[test]
    fn bad_addr_is_rejected() {
        assert!(Config::from_toml_str(r#"bind_addr = "nowhere""#).is_err());
    }
}
