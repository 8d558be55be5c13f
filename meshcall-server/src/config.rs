use anyhow::{Context, Result};
use meshcall_core::IceServerConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Signaling server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Handed to every client in the `ice_config` greeting.
    pub ice_servers: Vec<IceServerConfig>,
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ice_servers: IceServerConfig::default_stun(),
            max_message_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: ServerConfig = serde_json::from_str(&data).context("parse config json")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_message_bytes == 0 {
            anyhow::bail!("max_message_bytes must be positive");
        }
        for server in &self.ice_servers {
            if server.urls.is_empty() {
                anyhow::bail!("ice server entry without urls");
            }
        }
        Ok(())
    }
}
