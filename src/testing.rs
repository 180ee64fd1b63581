//! Canned configurations for tests.
//!
//! Every builder is deterministic: repeated calls return value-equal
//! configurations.

use crate::attributes::MutableAttributes;
use crate::config::{AgentConfiguration, EndpointConfiguration};
use reqwest::Url;

/// Factory for preconfigured [`AgentConfiguration`] values.
pub struct ConfigurationTestBuilder;

impl ConfigurationTestBuilder {
    pub const CUSTOM_TRACES_URL: &'static str = "http://sampledomain.com/tenant/traces";
    pub const CUSTOM_SESSION_REPLAY_URL: &'static str =
        "http://sampledomain.com/tenant/sessionreplay";
    pub const REALM: &'static str = "dev";
    pub const DEPLOYMENT_ENVIRONMENT: &'static str = "testenv";
    pub const APP_NAME: &'static str = "Tests";
    pub const APP_VERSION: &'static str = "1.0.1";
    pub const RUM_ACCESS_TOKEN: &'static str = "token";

    pub fn custom_traces_url() -> Url {
        Url::parse(Self::CUSTOM_TRACES_URL).expect("CUSTOM_TRACES_URL is a valid URL")
    }

    pub fn custom_session_replay_url() -> Url {
        Url::parse(Self::CUSTOM_SESSION_REPLAY_URL)
            .expect("CUSTOM_SESSION_REPLAY_URL is a valid URL")
    }

    /// Realm-routed configuration with every optional value set.
    pub fn build_default() -> AgentConfiguration {
        let global_attributes: MutableAttributes = [("attribute", "value")].into_iter().collect();

        Self::build_minimal()
            .app_version(Self::APP_VERSION)
            .enable_debug_logging(true)
            .session_sampling_rate(0.1)
            .global_attributes(global_attributes)
            .span_interceptor(Some)
    }

    /// Only the mandatory values; everything else at its default.
    pub fn build_minimal() -> AgentConfiguration {
        AgentConfiguration::new(
            EndpointConfiguration::with_realm(Self::REALM, Self::RUM_ACCESS_TOKEN),
            Self::APP_NAME,
            Self::DEPLOYMENT_ENVIRONMENT,
        )
    }

    /// [`build_default`](Self::build_default) with both endpoint URLs overridden.
    pub fn build_with_custom_urls() -> AgentConfiguration {
        let default = Self::build_default();
        let endpoint = default
            .endpoint
            .clone()
            .traces_url(Self::custom_traces_url())
            .session_replay_url(Self::custom_session_replay_url());

        default.endpoint(endpoint)
    }

    /// Realm without an access token; fails validation.
    pub fn build_invalid_endpoint() -> AgentConfiguration {
        Self::build_minimal().endpoint(EndpointConfiguration::with_realm(Self::REALM, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_declared_constants_without_overrides() {
        let c = ConfigurationTestBuilder::build_default();

        assert_eq!(c.endpoint.realm.as_deref(), Some(ConfigurationTestBuilder::REALM));
        assert_eq!(
            c.endpoint.rum_access_token.as_deref(),
            Some(ConfigurationTestBuilder::RUM_ACCESS_TOKEN)
        );
        assert_eq!(c.app_name, ConfigurationTestBuilder::APP_NAME);
        assert_eq!(c.app_version, ConfigurationTestBuilder::APP_VERSION);
        assert_eq!(
            c.deployment_environment,
            ConfigurationTestBuilder::DEPLOYMENT_ENVIRONMENT
        );
        assert!(c.endpoint.traces_url.is_none());
        assert!(c.endpoint.session_replay_url.is_none());
    }

    #[test]
    fn custom_urls_differ_from_default_only_in_endpoint_urls() {
        let default = ConfigurationTestBuilder::build_default();
        let custom = ConfigurationTestBuilder::build_with_custom_urls();

        assert_ne!(default, custom);

        let mut reverted = custom.clone();
        reverted.endpoint.traces_url = None;
        reverted.endpoint.session_replay_url = None;
        assert_eq!(reverted, default);
    }

    #[test]
    fn builders_are_idempotent() {
        assert_eq!(
            ConfigurationTestBuilder::build_default(),
            ConfigurationTestBuilder::build_default()
        );
        assert_eq!(
            ConfigurationTestBuilder::build_with_custom_urls(),
            ConfigurationTestBuilder::build_with_custom_urls()
        );
        assert_eq!(
            ConfigurationTestBuilder::build_minimal(),
            ConfigurationTestBuilder::build_minimal()
        );
    }

    #[test]
    fn invalid_endpoint_fails_validation() {
        assert!(ConfigurationTestBuilder::build_invalid_endpoint()
            .validate()
            .is_err());
    }
}
