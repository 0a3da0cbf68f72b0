use serde::Deserialize;
use std::{
    fs,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use crate::encoder::EncodingPolicy;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub features_path: PathBuf,
    pub thresholds_path: PathBuf,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub encoding_policy: EncodingPolicy,
    pub log_pred: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("crop_yield_model.json"),
            features_path: PathBuf::from("model_features.json"),
            thresholds_path: PathBuf::from("yield_thresholds.json"),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            encoding_policy: EncodingPolicy::FixedVocabulary,
            log_pred: false,
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file; missing keys keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    /// `CROP_YIELD_CONFIG` file first (if set), then individual env vars on top.
    pub fn from_env() -> anyhow::Result<Self> {
        let base = match std::env::var("CROP_YIELD_CONFIG") {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_overrides(|k| std::env::var(k).ok()))
    }

    /// Applies overrides from `lookup`; unparsable values keep the current setting.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(p) = lookup("MODEL_PATH") {
            self.model_path = p.into();
        }
        if let Some(p) = lookup("FEATURES_PATH").or_else(|| lookup("META_PATH")) {
            self.features_path = p.into();
        }
        if let Some(p) = lookup("THRESHOLDS_PATH") {
            self.thresholds_path = p.into();
        }
        if let Some(addr) = lookup("BIND_ADDR").and_then(|s| s.parse().ok()) {
            self.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT").and_then(|s| s.parse().ok()) {
            self.port = port;
        }
        if let Some(policy) = lookup("ENCODING_POLICY") {
            match policy.parse() {
                Ok(p) => self.encoding_policy = p,
                Err(e) => tracing::warn!("ignoring ENCODING_POLICY: {}", e),
            }
        }
        if let Some(flag) = lookup("LOG_PRED") {
            self.log_pred = flag == "1";
        }
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
