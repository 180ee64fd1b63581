use super::endpoint::EndpointConfiguration;

/// An error that indicates an invalid agent configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentConfigurationError {
    /// The endpoint URLs cannot be resolved, or the supplied realm is empty.
    #[error(
        "The supplied endpoint configuration is invalid. Please check the agent configuration. \
         Supplied endpoint configuration: {supplied}"
    )]
    InvalidEndpoint { supplied: EndpointConfiguration },

    /// The application name is missing or empty.
    #[error(
        "Invalid app name supplied, please check your configuration settings. \
         Supplied app name: \"{}\"",
        display_supplied(.supplied)
    )]
    InvalidAppName { supplied: Option<String> },

    /// The RUM access token is missing or empty.
    #[error(
        "Invalid RUM access token supplied, please check the agent configuration. \
         Supplied access token: \"{}\"",
        display_supplied(.supplied)
    )]
    InvalidRumAccessToken { supplied: Option<String> },

    /// The deployment environment is missing or empty.
    #[error(
        "Invalid deployment environment supplied, please check the agent configuration. \
         Supplied deployment environment: \"{}\"",
        display_supplied(.supplied)
    )]
    InvalidDeploymentEnvironment { supplied: Option<String> },
}

fn display_supplied(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("nil")
}
