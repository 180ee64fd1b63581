pub mod endpoint;
pub mod error;
pub mod handler;
pub mod loader;
pub mod remote;
pub mod schema;
pub mod traits;

pub use endpoint::EndpointConfiguration;
pub use error::AgentConfigurationError;
pub use handler::{
    DefaultConfigurationHandler, FileStorage, InMemoryStorage, StoredConfigurationHandler,
    REMOTE_CONFIGURATION_KEY,
};
pub use loader::FileConfigLoader;
pub use remote::{AgentModule, RemoteConfiguration};
pub use schema::{
    AgentConfiguration, StandardValidator, DEFAULT_MAX_SESSION_LENGTH_SECS,
    DEFAULT_SESSION_SAMPLING_RATE, DEFAULT_SESSION_TIMEOUT_SECS,
};
pub use traits::{
    AgentConfigurationHandler, ConfigIssue, ConfigIssueSeverity, ConfigLoader, ConfigValidator,
    KeyValueStorage,
};

/// Serializes tests that read or write `RUM_*` environment variables.
#[cfg(test)]
pub(crate) async fn env_override_lock() -> tokio::sync::MutexGuard<'static, ()> {
    static ENV_OVERRIDE_TEST_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());
    ENV_OVERRIDE_TEST_LOCK.lock().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reexported_configuration_is_constructible() {
        let config = AgentConfiguration::new(
            EndpointConfiguration::with_realm("us0", "token"),
            "app",
            "prod",
        );

        assert_eq!(config.app_name, "app");
        assert!(config.endpoint.trace_endpoint().is_some());
        assert!(config.validate().is_ok());
    }
}
