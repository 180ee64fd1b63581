//! Collector endpoint configuration.
//!
//! Endpoints are defined either by a RUM `realm` and access token, which routes
//! all instrumentation to the realm's ingest collector, or by custom trace and
//! session replay URLs. Custom URLs always take precedence over realm routing.

use super::error::AgentConfigurationError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

const INGEST_HOST_PREFIX: &str = "rum-ingest";
const INGEST_HOST_SUFFIX: &str = "signalfx.com";
const INGEST_PATH: &str = "/v1/rumotlp";
const AUTH_QUERY_KEY: &str = "auth";

/// Endpoint configuration for the instrumentation collector (`[endpoint]` section).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfiguration {
    /// RUM realm to which all instrumentation is sent (e.g. `"us0"`).
    #[serde(default)]
    pub realm: Option<String>,
    /// RUM access token, sent as the `auth` query of realm-derived URLs.
    #[serde(default)]
    pub rum_access_token: Option<String>,
    /// Custom trace export URL. Overrides realm routing when set.
    #[serde(default, with = "optional_url", skip_serializing_if = "Option::is_none")]
    pub traces_url: Option<Url>,
    /// Custom session replay upload URL.
    #[serde(default, with = "optional_url", skip_serializing_if = "Option::is_none")]
    pub session_replay_url: Option<Url>,
}

impl EndpointConfiguration {
    /// Route instrumentation to the ingest collector of `realm`.
    pub fn with_realm(realm: impl Into<String>, rum_access_token: impl Into<String>) -> Self {
        Self {
            realm: Some(realm.into()),
            rum_access_token: Some(rum_access_token.into()),
            traces_url: None,
            session_replay_url: None,
        }
    }

    /// Route instrumentation to custom URLs. No realm or token is attached.
    pub fn custom(traces: Url, session_replay: Option<Url>) -> Self {
        Self {
            realm: None,
            rum_access_token: None,
            traces_url: Some(traces),
            session_replay_url: session_replay,
        }
    }

    pub fn traces_url(mut self, url: Url) -> Self {
        self.traces_url = Some(url);
        self
    }

    pub fn session_replay_url(mut self, url: Url) -> Self {
        self.session_replay_url = Some(url);
        self
    }

    /// Resolved trace export URL.
    ///
    /// Returns the custom URL when set, otherwise the authenticated ingest URL
    /// derived from the realm. `None` when neither can be built.
    pub fn trace_endpoint(&self) -> Option<Url> {
        if let Some(url) = &self.traces_url {
            return Some(url.clone());
        }

        let realm = self.realm.as_deref().map(str::trim).filter(|r| !r.is_empty())?;
        let token = self
            .rum_access_token
            .as_deref()
            .filter(|t| !t.is_empty())?;

        let mut url = Url::parse(&format!(
            "https://{INGEST_HOST_PREFIX}.{realm}.{INGEST_HOST_SUFFIX}{INGEST_PATH}"
        ))
        .ok()?;
        url.query_pairs_mut().append_pair(AUTH_QUERY_KEY, token);

        Some(url)
    }

    /// Resolved session replay URL. Realm routing has no session replay
    /// collector, so only a custom URL resolves.
    pub fn session_replay_endpoint(&self) -> Option<Url> {
        self.session_replay_url.clone()
    }

    /// Whether instrumentation is routed through a realm rather than custom URLs.
    pub fn is_realm_routed(&self) -> bool {
        self.traces_url.is_none() && self.realm.is_some()
    }

    /// Check that a trace endpoint can be resolved.
    pub fn validate(&self) -> Result<(), AgentConfigurationError> {
        if self.realm.is_some()
            && self
                .rum_access_token
                .as_deref()
                .map_or(true, |token| token.trim().is_empty())
        {
            return Err(AgentConfigurationError::InvalidRumAccessToken {
                supplied: self.rum_access_token.clone(),
            });
        }

        if self.realm.as_deref().is_some_and(|r| r.trim().is_empty()) && self.traces_url.is_none()
        {
            return Err(AgentConfigurationError::InvalidEndpoint {
                supplied: self.clone(),
            });
        }

        if self.trace_endpoint().is_none() {
            return Err(AgentConfigurationError::InvalidEndpoint {
                supplied: self.clone(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for EndpointConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Realm: {}, RUM access token: {}, Trace endpoint: {}, Session replay endpoint: {}",
            self.realm.as_deref().unwrap_or("nil"),
            self.rum_access_token
                .as_deref()
                .map_or_else(|| "nil".to_string(), mask_token),
            self.trace_endpoint()
                .map_or_else(|| "nil".to_string(), |url| without_query(&url)),
            self.session_replay_endpoint()
                .map_or_else(|| "nil".to_string(), |url| without_query(&url)),
        )
    }
}

impl fmt::Debug for EndpointConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfiguration")
            .field("realm", &self.realm)
            .field(
                "rum_access_token",
                &self.rum_access_token.as_deref().map(mask_token),
            )
            .field("traces_url", &self.traces_url.as_ref().map(without_query))
            .field(
                "session_replay_url",
                &self.session_replay_url.as_ref().map(without_query),
            )
            .finish()
    }
}

/// Keep at most the first four characters of a token.
fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    let visible: String = token.chars().take(4).collect();
    if visible.len() == token.len() {
        "***".to_string()
    } else {
        format!("{visible}***")
    }
}

fn without_query(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Serde adapter for optional URLs stored as plain strings.
mod optional_url {
    use reqwest::Url;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Url>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(url) => serializer.serialize_str(url.as_str()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Url>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Url::parse(value)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid URL {value:?}: {e}"))),
        }
    }
}
