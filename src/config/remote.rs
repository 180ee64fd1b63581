//! Remote (server-side) configuration documents.

use super::schema::{DEFAULT_MAX_SESSION_LENGTH_SECS, DEFAULT_SESSION_TIMEOUT_SECS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level remote configuration document: `{"configuration": {"mrum": {...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfiguration {
    pub configuration: RemoteConfigurationBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfigurationBody {
    pub mrum: RemoteAgentSettings,
}

/// Agent settings pushed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAgentSettings {
    /// Master switch for recording.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum session length in seconds.
    #[serde(default = "default_max_session_length")]
    pub max_session_length: f64,
    /// Background timeout after which a session ends, in seconds.
    #[serde(default = "default_session_timeout")]
    pub session_timeout: f64,
    #[serde(default)]
    pub session_replay: ModuleToggle,
    #[serde(default)]
    pub crash_reporting: ModuleToggle,
    #[serde(default)]
    pub network_tracing: ModuleToggle,
    #[serde(default)]
    pub slow_frame_detector: SlowFrameDetectorSettings,
    #[serde(default)]
    pub app_start: ModuleToggle,
}

/// `{"enabled": bool}` block of a single module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleToggle {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ModuleToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowFrameDetectorSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_slow_frame_threshold_ms")]
    pub slow_frame_detector_threshold_milliseconds: f64,
    #[serde(default = "default_frozen_frame_threshold_ms")]
    pub frozen_frame_detector_threshold_milliseconds: f64,
}

impl Default for SlowFrameDetectorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            slow_frame_detector_threshold_milliseconds: default_slow_frame_threshold_ms(),
            frozen_frame_detector_threshold_milliseconds: default_frozen_frame_threshold_ms(),
        }
    }
}

/// Agent modules whose enablement is controlled remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentModule {
    SessionReplay,
    CrashReporting,
    NetworkTracing,
    SlowFrameDetector,
    AppStart,
}

impl AgentModule {
    pub const ALL: [AgentModule; 5] = [
        AgentModule::SessionReplay,
        AgentModule::CrashReporting,
        AgentModule::NetworkTracing,
        AgentModule::SlowFrameDetector,
        AgentModule::AppStart,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionReplay => "sessionReplay",
            Self::CrashReporting => "crashReporting",
            Self::NetworkTracing => "networkTracing",
            Self::SlowFrameDetector => "slowFrameDetector",
            Self::AppStart => "appStart",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_session_length() -> f64 {
    DEFAULT_MAX_SESSION_LENGTH_SECS
}

fn default_session_timeout() -> f64 {
    DEFAULT_SESSION_TIMEOUT_SECS
}

fn default_slow_frame_threshold_ms() -> f64 {
    1000.0
}

fn default_frozen_frame_threshold_ms() -> f64 {
    5000.0
}

impl RemoteConfiguration {
    /// Decode a JSON document.
    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).context("Failed to decode remote configuration")
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("Failed to encode remote configuration")
    }

    /// Built-in document used until the backend supplies one.
    pub fn default_document() -> Self {
        Self {
            configuration: RemoteConfigurationBody {
                mrum: RemoteAgentSettings {
                    enabled: true,
                    max_session_length: DEFAULT_MAX_SESSION_LENGTH_SECS,
                    session_timeout: DEFAULT_SESSION_TIMEOUT_SECS,
                    session_replay: ModuleToggle::default(),
                    crash_reporting: ModuleToggle::default(),
                    network_tracing: ModuleToggle::default(),
                    slow_frame_detector: SlowFrameDetectorSettings::default(),
                    app_start: ModuleToggle::default(),
                },
            },
        }
    }

    pub fn settings(&self) -> &RemoteAgentSettings {
        &self.configuration.mrum
    }

    /// A module is enabled only when recording itself is enabled.
    pub fn is_module_enabled(&self, module: AgentModule) -> bool {
        let settings = self.settings();
        if !settings.enabled {
            return false;
        }
        match module {
            AgentModule::SessionReplay => settings.session_replay.enabled,
            AgentModule::CrashReporting => settings.crash_reporting.enabled,
            AgentModule::NetworkTracing => settings.network_tracing.enabled,
            AgentModule::SlowFrameDetector => settings.slow_frame_detector.enabled,
            AgentModule::AppStart => settings.app_start.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "configuration": {
            "mrum": {
                "enabled": true,
                "maxSessionLength": 3600.0,
                "sessionTimeout": 300.0,
                "sessionReplay": { "enabled": false },
                "crashReporting": { "enabled": true },
                "networkTracing": { "enabled": true },
                "slowFrameDetector": {
                    "enabled": true,
                    "slowFrameDetectorThresholdMilliseconds": 700.0,
                    "frozenFrameDetectorThresholdMilliseconds": 4000.0
                },
                "appStart": { "enabled": true }
            }
        }
    }"#;

    #[test]
    fn decodes_camel_case_document() {
        let remote = RemoteConfiguration::decode(DOCUMENT.as_bytes()).unwrap();
        let settings = remote.settings();

        assert!((settings.max_session_length - 3600.0).abs() < f64::EPSILON);
        assert!((settings.session_timeout - 300.0).abs() < f64::EPSILON);
        assert!(!settings.session_replay.enabled);
        assert!(
            (settings
                .slow_frame_detector
                .slow_frame_detector_threshold_milliseconds
                - 700.0)
                .abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let remote =
            RemoteConfiguration::decode(br#"{"configuration":{"mrum":{}}}"#).unwrap();
        assert_eq!(remote, RemoteConfiguration::default_document());
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(RemoteConfiguration::decode(b"{\"configuration\":").is_err());
        assert!(RemoteConfiguration::decode(b"").is_err());
    }

    #[test]
    fn disabled_recording_disables_every_module() {
        let mut remote = RemoteConfiguration::default_document();
        assert!(AgentModule::ALL
            .iter()
            .all(|m| remote.is_module_enabled(*m)));

        remote.configuration.mrum.enabled = false;
        assert!(AgentModule::ALL
            .iter()
            .all(|m| !remote.is_module_enabled(*m)));
    }

    #[test]
    fn module_toggle_is_respected() {
        let remote = RemoteConfiguration::decode(DOCUMENT.as_bytes()).unwrap();
        assert!(!remote.is_module_enabled(AgentModule::SessionReplay));
        assert!(remote.is_module_enabled(AgentModule::CrashReporting));
    }

    #[test]
    fn encoded_document_uses_camel_case_keys() {
        let encoded = RemoteConfiguration::default_document().encode().unwrap();
        let text = String::from_utf8(encoded).unwrap();
        assert!(text.contains("\"maxSessionLength\""));
        assert!(text.contains("\"frozenFrameDetectorThresholdMilliseconds\""));
    }
}
