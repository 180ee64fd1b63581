use super::endpoint::EndpointConfiguration;
use super::error::AgentConfigurationError;
use super::remote::RemoteConfiguration;
use super::traits::{ConfigIssue, ConfigIssueSeverity, ConfigValidator};
use crate::attributes::MutableAttributes;
use crate::span::{SpanData, SpanInterceptor};
use anyhow::{Context, Result};
use directories::UserDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(unix)]
use tokio::fs::File;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Default background timeout after which a session ends (15 minutes).
pub const DEFAULT_SESSION_TIMEOUT_SECS: f64 = 15.0 * 60.0;

/// Default maximum session length (4 hours).
pub const DEFAULT_MAX_SESSION_LENGTH_SECS: f64 = 4.0 * 60.0 * 60.0;

/// Default session sampling rate: every session is recorded.
pub const DEFAULT_SESSION_SAMPLING_RATE: f64 = 1.0;

// ── Agent configuration ───────────────────────────────────────────

/// Configuration for the initial agent setup, loaded from `config.toml`.
///
/// Optional values can be set either through the public fields or through the
/// consuming builder methods; both give the same result.
///
/// Equality and serialization cover the public values only. The span
/// interceptor and the remotely managed session settings are neither compared
/// nor persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfiguration {
    /// Application name. Sent with all signals as a resource.
    pub app_name: String,
    /// Deployment environment (e.g. `"dev"`, `"production"`). Sent with all signals as a resource.
    pub deployment_environment: String,
    /// Application version. Sent with all signals as a resource.
    #[serde(default = "default_app_version")]
    pub app_version: String,
    /// Print span contents to the log. Default: `false`.
    #[serde(default)]
    pub enable_debug_logging: bool,
    /// Share of sessions recorded, in `[0.0, 1.0]`. `1.0` records everything. Default: `1.0`.
    #[serde(default = "default_session_sampling_rate")]
    pub session_sampling_rate: f64,

    /// Collector endpoints (`[endpoint]`).
    pub endpoint: EndpointConfiguration,

    /// Attributes sent with all signals (`[global_attributes]`).
    #[serde(default)]
    pub global_attributes: MutableAttributes,

    /// Filters or rewrites every outgoing span.
    #[serde(skip)]
    pub span_interceptor: Option<SpanInterceptor>,

    #[serde(skip, default = "default_session_timeout")]
    session_timeout: f64,
    #[serde(skip, default = "default_max_session_length")]
    max_session_length: f64,
    #[serde(skip, default = "default_true")]
    recording_enabled: bool,
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_session_sampling_rate() -> f64 {
    DEFAULT_SESSION_SAMPLING_RATE
}

fn default_session_timeout() -> f64 {
    DEFAULT_SESSION_TIMEOUT_SECS
}

fn default_max_session_length() -> f64 {
    DEFAULT_MAX_SESSION_LENGTH_SECS
}

fn default_true() -> bool {
    true
}

impl AgentConfiguration {
    pub fn new(
        endpoint: EndpointConfiguration,
        app_name: impl Into<String>,
        deployment_environment: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            deployment_environment: deployment_environment.into(),
            app_version: default_app_version(),
            enable_debug_logging: false,
            session_sampling_rate: DEFAULT_SESSION_SAMPLING_RATE,
            endpoint,
            global_attributes: MutableAttributes::new(),
            span_interceptor: None,
            session_timeout: DEFAULT_SESSION_TIMEOUT_SECS,
            max_session_length: DEFAULT_MAX_SESSION_LENGTH_SECS,
            recording_enabled: true,
        }
    }

    // ── Builder methods ──────────────────────────────────────────

    pub fn endpoint(mut self, endpoint: EndpointConfiguration) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = app_version.into();
        self
    }

    pub fn enable_debug_logging(mut self, enable_debug_logging: bool) -> Self {
        self.enable_debug_logging = enable_debug_logging;
        self
    }

    pub fn session_sampling_rate(mut self, session_sampling_rate: f64) -> Self {
        self.session_sampling_rate = session_sampling_rate;
        self
    }

    pub fn global_attributes(mut self, global_attributes: MutableAttributes) -> Self {
        self.global_attributes = global_attributes;
        self
    }

    /// Set the span interceptor. Spans are kept by returning them from the
    /// callback and discarded by returning `None`.
    pub fn span_interceptor<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(SpanData) -> Option<SpanData> + Send + Sync + 'static,
    {
        self.span_interceptor = Some(Arc::new(interceptor));
        self
    }

    pub fn without_span_interceptor(mut self) -> Self {
        self.span_interceptor = None;
        self
    }

    // ── Remotely managed session settings ────────────────────────

    /// Background timeout after which a session ends, in seconds.
    pub fn session_timeout(&self) -> f64 {
        self.session_timeout
    }

    /// Maximum session length, in seconds.
    pub fn max_session_length(&self) -> f64 {
        self.max_session_length
    }

    pub fn recording_enabled(&self) -> bool {
        self.recording_enabled
    }

    /// Adopt the session settings of a remote configuration document.
    ///
    /// Non-positive or non-finite durations are ignored.
    pub fn merge_remote(&mut self, remote: &RemoteConfiguration) {
        let settings = remote.settings();

        if settings.session_timeout.is_finite() && settings.session_timeout > 0.0 {
            self.session_timeout = settings.session_timeout;
        } else {
            tracing::warn!(
                value = settings.session_timeout,
                "Ignoring invalid remote sessionTimeout"
            );
        }

        if settings.max_session_length.is_finite() && settings.max_session_length > 0.0 {
            self.max_session_length = settings.max_session_length;
        } else {
            tracing::warn!(
                value = settings.max_session_length,
                "Ignoring invalid remote maxSessionLength"
            );
        }

        self.recording_enabled = settings.enabled;
    }

    // ── Validation ───────────────────────────────────────────────

    /// Validate the endpoint first, then the remaining values.
    ///
    /// An unusable endpoint is an error. Other problems are logged and
    /// returned as issues so the agent can still start.
    pub fn validate(&self) -> Result<Vec<ConfigIssue>, AgentConfigurationError> {
        self.endpoint.validate()?;

        let issues = StandardValidator.validate(self);
        for issue in &issues {
            match issue.severity {
                ConfigIssueSeverity::Error => {
                    tracing::error!(field = %issue.field, "{}", issue.message);
                }
                ConfigIssueSeverity::Warning => {
                    tracing::warn!(field = %issue.field, "{}", issue.message);
                }
            }
        }

        Ok(issues)
    }

    /// Like [`validate`](Self::validate), but an empty app name or deployment
    /// environment is an error too.
    pub fn validate_strict(&self) -> Result<(), AgentConfigurationError> {
        self.endpoint.validate()?;

        if self.app_name.trim().is_empty() {
            return Err(AgentConfigurationError::InvalidAppName {
                supplied: Some(self.app_name.clone()),
            });
        }

        if self.deployment_environment.trim().is_empty() {
            return Err(AgentConfigurationError::InvalidDeploymentEnvironment {
                supplied: Some(self.deployment_environment.clone()),
            });
        }

        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────

    /// Default location: `~/.rumagent/config.toml`.
    pub fn default_config_path() -> Result<PathBuf> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Ok(home.join(".rumagent").join("config.toml"))
    }

    /// Load from a TOML file, apply environment overrides and validate.
    pub async fn load(path: &Path) -> Result<Self> {
        // Warn if config file is world-readable (contains the access token)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = fs::metadata(path).await {
                if meta.permissions().mode() & 0o004 != 0 {
                    tracing::warn!(
                        "Config file {:?} is world-readable (mode {:o}). \
                         Consider restricting with: chmod 600 {:?}",
                        path,
                        meta.permissions().mode() & 0o777,
                        path,
                    );
                }
            }
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml(&contents)?;

        config.apply_env_overrides();
        let issues = config.validate()?;
        tracing::info!(
            path = %path.display(),
            app = %config.app_name,
            environment = %config.deployment_environment,
            issues = issues.len(),
            "Config loaded"
        );
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config file")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Atomically write the configuration to `path` as TOML.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let toml_str = self.to_toml()?;

        let parent_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        fs::create_dir_all(parent_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                parent_dir.display()
            )
        })?;

        let file_name = path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("config.toml");
        let temp_path = parent_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));
        let backup_path = parent_dir.join(format!("{file_name}.bak"));

        let mut temp_file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create temporary config file: {}",
                    temp_path.display()
                )
            })?;
        temp_file
            .write_all(toml_str.as_bytes())
            .await
            .context("Failed to write temporary config contents")?;
        temp_file
            .sync_all()
            .await
            .context("Failed to fsync temporary config file")?;
        drop(temp_file);

        let had_existing_config = path.exists();
        if had_existing_config {
            fs::copy(path, &backup_path).await.with_context(|| {
                format!(
                    "Failed to create config backup before atomic replace: {}",
                    backup_path.display()
                )
            })?;
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            if had_existing_config && backup_path.exists() {
                fs::copy(&backup_path, path)
                    .await
                    .context("Failed to restore config backup")?;
            }
            anyhow::bail!("Failed to atomically replace config file: {e}");
        }

        // Restrict permissions (file holds the access token)
        #[cfg(unix)]
        {
            use std::{fs::Permissions, os::unix::fs::PermissionsExt};
            let _ = fs::set_permissions(path, Permissions::from_mode(0o600)).await;
        }

        sync_directory(parent_dir).await?;

        if had_existing_config {
            let _ = fs::remove_file(&backup_path).await;
        }

        Ok(())
    }

    // ── Environment overrides ────────────────────────────────────

    /// Apply `RUM_*` environment variable overrides. Empty or unparsable
    /// values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(realm) = non_empty_env("RUM_REALM") {
            self.endpoint.realm = Some(realm);
        }

        if let Some(token) = non_empty_env("RUM_ACCESS_TOKEN") {
            self.endpoint.rum_access_token = Some(token);
        }

        if let Some(raw) = non_empty_env("RUM_TRACES_URL") {
            match Url::parse(raw.trim()) {
                Ok(url) => self.endpoint.traces_url = Some(url),
                Err(error) => {
                    tracing::warn!(value = %raw, %error, "Ignoring invalid RUM_TRACES_URL");
                }
            }
        }

        if let Some(raw) = non_empty_env("RUM_SESSION_REPLAY_URL") {
            match Url::parse(raw.trim()) {
                Ok(url) => self.endpoint.session_replay_url = Some(url),
                Err(error) => {
                    tracing::warn!(value = %raw, %error, "Ignoring invalid RUM_SESSION_REPLAY_URL");
                }
            }
        }

        if let Some(app_name) = non_empty_env("RUM_APP_NAME") {
            self.app_name = app_name;
        }

        if let Some(environment) = non_empty_env("RUM_DEPLOYMENT_ENVIRONMENT") {
            self.deployment_environment = environment;
        }

        if let Some(version) = non_empty_env("RUM_APP_VERSION") {
            self.app_version = version;
        }

        if let Some(flag) = non_empty_env("RUM_DEBUG_LOGGING") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.enable_debug_logging = true,
                "0" | "false" | "no" | "off" => self.enable_debug_logging = false,
                _ => tracing::warn!(value = %flag, "Ignoring invalid RUM_DEBUG_LOGGING"),
            }
        }

        if let Some(rate_str) = non_empty_env("RUM_SESSION_SAMPLING_RATE") {
            match rate_str.trim().parse::<f64>() {
                Ok(rate) if (0.0..=1.0).contains(&rate) => self.session_sampling_rate = rate,
                _ => tracing::warn!(
                    value = %rate_str,
                    "Ignoring RUM_SESSION_SAMPLING_RATE outside [0.0, 1.0]"
                ),
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

async fn sync_directory(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        let dir = File::open(path)
            .await
            .with_context(|| format!("Failed to open directory for fsync: {}", path.display()))?;
        dir.sync_all()
            .await
            .with_context(|| format!("Failed to fsync directory metadata: {}", path.display()))?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

impl PartialEq for AgentConfiguration {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint
            && self.app_name == other.app_name
            && self.deployment_environment == other.deployment_environment
            && self.app_version == other.app_version
            && self.enable_debug_logging == other.enable_debug_logging
            && self.session_sampling_rate == other.session_sampling_rate
            && self.global_attributes == other.global_attributes
    }
}

impl fmt::Debug for AgentConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfiguration")
            .field("endpoint", &format_args!("{}", self.endpoint))
            .field("app_name", &self.app_name)
            .field("deployment_environment", &self.deployment_environment)
            .field("app_version", &self.app_version)
            .field("enable_debug_logging", &self.enable_debug_logging)
            .field("session_sampling_rate", &self.session_sampling_rate)
            .field("global_attributes", &self.global_attributes)
            .field("span_interceptor", &self.span_interceptor.is_some())
            .field("session_timeout", &self.session_timeout)
            .field("max_session_length", &self.max_session_length)
            .field("recording_enabled", &self.recording_enabled)
            .finish()
    }
}

// ── Validators ───────────────────────────────────────────────────

/// Checks the non-endpoint values of a configuration.
pub struct StandardValidator;

impl ConfigValidator for StandardValidator {
    fn validate(&self, config: &AgentConfiguration) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if config.app_name.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "app_name",
                AgentConfigurationError::InvalidAppName {
                    supplied: Some(config.app_name.clone()),
                }
                .to_string(),
            ));
        }

        if config.deployment_environment.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "deployment_environment",
                AgentConfigurationError::InvalidDeploymentEnvironment {
                    supplied: Some(config.deployment_environment.clone()),
                }
                .to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&config.session_sampling_rate) {
            issues.push(ConfigIssue::warning(
                "session_sampling_rate",
                format!(
                    "session_sampling_rate must be within [0.0, 1.0], got {}",
                    config.session_sampling_rate
                ),
            ));
        }

        if config.endpoint.session_replay_url.is_none() && config.recording_enabled {
            issues.push(ConfigIssue::warning(
                "endpoint.session_replay_url",
                "No session replay endpoint configured; session replay data will not be uploaded",
            ));
        }

        issues
    }

    fn name(&self) -> &str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_override_lock;
    use crate::testing::ConfigurationTestBuilder;
    use tokio::test;

    // ── Defaults ─────────────────────────────────────────────

    #[test]
    async fn new_configuration_has_documented_defaults() {
        let c = AgentConfiguration::new(
            EndpointConfiguration::with_realm("us0", "token"),
            "app",
            "prod",
        );
        assert_eq!(c.app_version, env!("CARGO_PKG_VERSION"));
        assert!(!c.enable_debug_logging);
        assert!((c.session_sampling_rate - 1.0).abs() < f64::EPSILON);
        assert!(c.global_attributes.is_empty());
        assert!(c.span_interceptor.is_none());
        assert!((c.session_timeout() - 900.0).abs() < f64::EPSILON);
        assert!((c.max_session_length() - 14_400.0).abs() < f64::EPSILON);
        assert!(c.recording_enabled());
    }

    #[test]
    async fn builder_methods_match_field_assignment() {
        let attributes: MutableAttributes = [("tier", "gold")].into_iter().collect();

        let built = ConfigurationTestBuilder::build_minimal()
            .app_version("2.0")
            .enable_debug_logging(true)
            .session_sampling_rate(0.25)
            .global_attributes(attributes.clone());

        let mut assigned = ConfigurationTestBuilder::build_minimal();
        assigned.app_version = "2.0".into();
        assigned.enable_debug_logging = true;
        assigned.session_sampling_rate = 0.25;
        assigned.global_attributes = attributes;

        assert_eq!(built, assigned);
    }

    #[test]
    async fn equality_ignores_interceptor_and_session_settings() {
        let a = ConfigurationTestBuilder::build_minimal();
        let mut b = a.clone().span_interceptor(|_| None);

        let mut remote = RemoteConfiguration::default_document();
        remote.configuration.mrum.session_timeout = 60.0;
        b.merge_remote(&remote);

        assert_eq!(a, b);
    }

    // ── Validation ───────────────────────────────────────────

    #[test]
    async fn validate_accepts_builder_defaults() {
        let issues = ConfigurationTestBuilder::build_with_custom_urls()
            .validate()
            .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    async fn validate_reports_empty_names_as_issues() {
        let mut c = ConfigurationTestBuilder::build_with_custom_urls();
        c.app_name = String::new();
        c.deployment_environment = " ".into();

        let issues = c.validate().unwrap();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["app_name", "deployment_environment"]);
        assert!(issues
            .iter()
            .all(|i| matches!(i.severity, ConfigIssueSeverity::Error)));
    }

    #[test]
    async fn validate_strict_rejects_empty_names() {
        let mut c = ConfigurationTestBuilder::build_minimal();
        c.deployment_environment = String::new();
        assert_eq!(
            c.validate_strict(),
            Err(AgentConfigurationError::InvalidDeploymentEnvironment {
                supplied: Some(String::new())
            })
        );

        c.app_name = String::new();
        assert!(matches!(
            c.validate_strict(),
            Err(AgentConfigurationError::InvalidAppName { .. })
        ));
    }

    #[test]
    async fn validate_warns_on_sampling_rate_out_of_range() {
        let c = ConfigurationTestBuilder::build_with_custom_urls().session_sampling_rate(1.5);
        let issues = c.validate().unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "session_sampling_rate");
        assert!(matches!(issues[0].severity, ConfigIssueSeverity::Warning));
    }

    #[test]
    async fn validate_fails_on_invalid_endpoint() {
        let c = ConfigurationTestBuilder::build_invalid_endpoint();
        assert!(matches!(
            c.validate(),
            Err(AgentConfigurationError::InvalidRumAccessToken { .. })
        ));
    }

    // ── Remote merge ─────────────────────────────────────────

    #[test]
    async fn merge_remote_adopts_session_settings() {
        let mut c = ConfigurationTestBuilder::build_minimal();
        let mut remote = RemoteConfiguration::default_document();
        remote.configuration.mrum.session_timeout = 120.0;
        remote.configuration.mrum.max_session_length = 600.0;
        remote.configuration.mrum.enabled = false;

        c.merge_remote(&remote);

        assert!((c.session_timeout() - 120.0).abs() < f64::EPSILON);
        assert!((c.max_session_length() - 600.0).abs() < f64::EPSILON);
        assert!(!c.recording_enabled());
    }

    #[test]
    async fn merge_remote_ignores_non_positive_durations() {
        let mut c = ConfigurationTestBuilder::build_minimal();
        let mut remote = RemoteConfiguration::default_document();
        remote.configuration.mrum.session_timeout = 0.0;
        remote.configuration.mrum.max_session_length = -5.0;

        c.merge_remote(&remote);

        assert!((c.session_timeout() - DEFAULT_SESSION_TIMEOUT_SECS).abs() < f64::EPSILON);
        assert!(
            (c.max_session_length() - DEFAULT_MAX_SESSION_LENGTH_SECS).abs() < f64::EPSILON
        );
    }

    // ── Serialization ────────────────────────────────────────

    #[test]
    async fn config_toml_roundtrip() {
        let c = ConfigurationTestBuilder::build_with_custom_urls();
        let toml_str = c.to_toml().unwrap();
        let parsed = AgentConfiguration::from_toml(&toml_str).unwrap();

        assert_eq!(parsed, c);
        assert!(parsed.span_interceptor.is_none());
    }

    #[test]
    async fn config_json_roundtrip() {
        let c = ConfigurationTestBuilder::build_default();
        let json = serde_json::to_string(&c).unwrap();
        let parsed: AgentConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, c);
    }

    #[test]
    async fn config_minimal_toml_uses_defaults() {
        let raw = r#"
app_name = "shop"
deployment_environment = "prod"

[endpoint]
realm = "us1"
rum_access_token = "abc"
"#;
        let parsed = AgentConfiguration::from_toml(raw).unwrap();
        assert_eq!(parsed.app_version, env!("CARGO_PKG_VERSION"));
        assert!((parsed.session_sampling_rate - 1.0).abs() < f64::EPSILON);
        assert!(parsed.global_attributes.is_empty());
        assert!(parsed.recording_enabled());
        assert!(parsed.endpoint.is_realm_routed());
    }

    #[test]
    async fn config_toml_rejects_missing_app_name() {
        let raw = r#"
deployment_environment = "prod"

[endpoint]
realm = "us1"
"#;
        assert!(AgentConfiguration::from_toml(raw).is_err());
    }

    #[test]
    async fn config_save_and_load_tmpdir() {
        let _env_guard = env_override_lock().await;
        clear_env_test_vars();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let c = ConfigurationTestBuilder::build_default();
        c.save(&path).await.unwrap();
        assert!(path.exists());

        let loaded = AgentConfiguration::load(&path).await.unwrap();
        assert_eq!(loaded, c);
    }

    #[test]
    async fn config_save_atomic_replaces_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        ConfigurationTestBuilder::build_minimal()
            .save(&path)
            .await
            .unwrap();
        ConfigurationTestBuilder::build_default()
            .save(&path)
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed = AgentConfiguration::from_toml(&contents).unwrap();
        assert_eq!(parsed, ConfigurationTestBuilder::build_default());

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["config.toml".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    async fn saved_config_file_has_restricted_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        ConfigurationTestBuilder::build_minimal()
            .save(&path)
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    async fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AgentConfiguration::load(&dir.path().join("absent.toml")).await;
        assert!(result.is_err());
    }

    // ── Env override helpers ─────────────────────────────────

    fn clear_env_test_vars() {
        for key in [
            "RUM_REALM",
            "RUM_ACCESS_TOKEN",
            "RUM_TRACES_URL",
            "RUM_SESSION_REPLAY_URL",
            "RUM_APP_NAME",
            "RUM_DEPLOYMENT_ENVIRONMENT",
            "RUM_APP_VERSION",
            "RUM_DEBUG_LOGGING",
            "RUM_SESSION_SAMPLING_RATE",
        ] {
            std::env::remove_var(key);
        }
    }

    // ── Env override tests ───────────────────────────────────

    #[test]
    async fn env_override_endpoint_credentials() {
        let _env_guard = env_override_lock().await;
        clear_env_test_vars();
        let mut c = ConfigurationTestBuilder::build_minimal();

        std::env::set_var("RUM_REALM", "eu0");
        std::env::set_var("RUM_ACCESS_TOKEN", "env-token");
        c.apply_env_overrides();

        assert_eq!(c.endpoint.realm.as_deref(), Some("eu0"));
        assert_eq!(c.endpoint.rum_access_token.as_deref(), Some("env-token"));
        clear_env_test_vars();
    }

    #[test]
    async fn env_override_custom_urls() {
        let _env_guard = env_override_lock().await;
        clear_env_test_vars();
        let mut c = ConfigurationTestBuilder::build_minimal();

        std::env::set_var("RUM_TRACES_URL", "https://collector.example.com/traces");
        std::env::set_var("RUM_SESSION_REPLAY_URL", "not a url");
        c.apply_env_overrides();

        assert_eq!(
            c.endpoint.traces_url.as_ref().map(Url::as_str),
            Some("https://collector.example.com/traces")
        );
        assert!(c.endpoint.session_replay_url.is_none());
        clear_env_test_vars();
    }

    #[test]
    async fn env_override_identity_fields() {
        let _env_guard = env_override_lock().await;
        clear_env_test_vars();
        let mut c = ConfigurationTestBuilder::build_minimal();

        std::env::set_var("RUM_APP_NAME", "from-env");
        std::env::set_var("RUM_DEPLOYMENT_ENVIRONMENT", "staging");
        std::env::set_var("RUM_APP_VERSION", "9.9.9");
        c.apply_env_overrides();

        assert_eq!(c.app_name, "from-env");
        assert_eq!(c.deployment_environment, "staging");
        assert_eq!(c.app_version, "9.9.9");
        clear_env_test_vars();
    }

    #[test]
    async fn env_override_debug_logging() {
        let _env_guard = env_override_lock().await;
        clear_env_test_vars();
        let mut c = ConfigurationTestBuilder::build_minimal();

        std::env::set_var("RUM_DEBUG_LOGGING", "on");
        c.apply_env_overrides();
        assert!(c.enable_debug_logging);

        std::env::set_var("RUM_DEBUG_LOGGING", "maybe");
        c.apply_env_overrides();
        assert!(c.enable_debug_logging);

        std::env::set_var("RUM_DEBUG_LOGGING", "0");
        c.apply_env_overrides();
        assert!(!c.enable_debug_logging);
        clear_env_test_vars();
    }

    #[test]
    async fn env_override_sampling_rate_out_of_range_ignored() {
        let _env_guard = env_override_lock().await;
        clear_env_test_vars();
        let mut c = ConfigurationTestBuilder::build_minimal();

        std::env::set_var("RUM_SESSION_SAMPLING_RATE", "0.3");
        c.apply_env_overrides();
        assert!((c.session_sampling_rate - 0.3).abs() < f64::EPSILON);

        std::env::set_var("RUM_SESSION_SAMPLING_RATE", "3");
        c.apply_env_overrides();
        assert!((c.session_sampling_rate - 0.3).abs() < f64::EPSILON);
        clear_env_test_vars();
    }

    #[test]
    async fn env_override_empty_values_ignored() {
        let _env_guard = env_override_lock().await;
        clear_env_test_vars();
        let mut c = ConfigurationTestBuilder::build_minimal();
        let original = c.clone();

        std::env::set_var("RUM_APP_NAME", "");
        std::env::set_var("RUM_REALM", "   ");
        c.apply_env_overrides();

        assert_eq!(c, original);
        clear_env_test_vars();
    }
}
