use super::schema::AgentConfiguration;
use async_trait::async_trait;
use std::path::Path;

/// Config loader abstraction for pluggable config sources.
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// Load configuration from the source.
    async fn load(&self) -> anyhow::Result<AgentConfiguration>;
    /// Save configuration back to the source.
    async fn save(&self, config: &AgentConfiguration) -> anyhow::Result<()>;
    /// Return the config file path (if file-based).
    fn config_path(&self) -> Option<&Path>;
    /// Return the loader name.
    fn name(&self) -> &str;
}

/// Config validator for checking configuration consistency.
pub trait ConfigValidator: Send + Sync {
    /// Validate a configuration, returning a list of warnings/errors.
    fn validate(&self, config: &AgentConfiguration) -> Vec<ConfigIssue>;
    /// Return the validator name.
    fn name(&self) -> &str;
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueSeverity {
    Warning,
    Error,
}

/// A single configuration issue found during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: ConfigIssueSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigIssueSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigIssueSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Owner of the effective agent configuration and the raw remote document it
/// was merged with.
pub trait AgentConfigurationHandler: Send + Sync {
    fn configuration(&self) -> AgentConfiguration;
    fn configuration_data(&self) -> Option<Vec<u8>>;
}

/// Byte-valued key/value persistence used for remote configuration documents.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}
