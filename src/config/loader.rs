//! File-based config loader.
//!
//! Reads and writes `config.toml` at a fixed path.

use super::schema::AgentConfiguration;
use super::traits::ConfigLoader;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Loader bound to a single TOML file.
pub struct FileConfigLoader {
    path: PathBuf,
}

impl FileConfigLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loader for `~/.rumagent/config.toml`.
    pub fn default_location() -> anyhow::Result<Self> {
        Ok(Self::new(AgentConfiguration::default_config_path()?))
    }
}

#[async_trait]
impl ConfigLoader for FileConfigLoader {
    async fn load(&self) -> anyhow::Result<AgentConfiguration> {
        AgentConfiguration::load(&self.path).await
    }

    async fn save(&self, config: &AgentConfiguration) -> anyhow::Result<()> {
        config.save(&self.path).await
    }

    fn config_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn name(&self) -> &str {
        "file"
    }
}
