#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::float_cmp,
    clippy::missing_errors_doc,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Url;
use rumagent::config::{
    AgentConfiguration, AgentModule, ConfigIssueSeverity, EndpointConfiguration,
    RemoteConfiguration,
};
use rumagent::observability;
use rumagent::sampling::{SamplingDecision, SessionSampler};
use std::path::PathBuf;
use tracing::info;

fn parse_sampling_rate(s: &str) -> std::result::Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err("sampling rate must be between 0.0 and 1.0".to_string());
    }
    Ok(rate)
}

/// `rumagent` - inspect and manage RUM agent configuration.
#[derive(Parser, Debug)]
#[command(name = "rumagent")]
#[command(version)]
#[command(about = "Manage real-user-monitoring agent configuration.", long_about = None)]
struct Cli {
    /// Path to config.toml (default: ~/.rumagent/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new configuration file
    #[command(long_about = "\
Write a new configuration file.

Either --realm with --token, or --traces-url (optionally with \
--session-replay-url), must be given.

Examples:
  rumagent init --app-name shop --environment prod --realm us0 --token abc
  rumagent init --app-name shop --environment dev --traces-url http://localhost:4318/v1/traces")]
    Init {
        /// Application name
        #[arg(long)]
        app_name: String,

        /// Deployment environment (e.g. dev, production)
        #[arg(long)]
        environment: String,

        /// Application version
        #[arg(long)]
        app_version: Option<String>,

        /// RUM realm (e.g. us0)
        #[arg(long, requires = "token")]
        realm: Option<String>,

        /// RUM access token
        #[arg(long, requires = "realm")]
        token: Option<String>,

        /// Custom trace export URL
        #[arg(long)]
        traces_url: Option<Url>,

        /// Custom session replay URL
        #[arg(long)]
        session_replay_url: Option<Url>,

        /// Session sampling rate in [0.0, 1.0]
        #[arg(long, value_parser = parse_sampling_rate)]
        sampling_rate: Option<f64>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Load and validate the configuration
    Validate {
        /// Treat an empty app name or environment as an error
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective configuration
    Show,
    /// Merge a remote configuration document and print the result
    Remote {
        /// JSON document to merge
        file: PathBuf,
    },
    /// Simulate session sampling with the configured rate
    Sample {
        /// Number of sessions to simulate
        #[arg(long, default_value = "1000")]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    observability::init_logging(cli.debug);

    let config_path = match cli.config {
        Some(path) => path,
        None => AgentConfiguration::default_config_path()?,
    };

    match cli.command {
        Commands::Init {
            app_name,
            environment,
            app_version,
            realm,
            token,
            traces_url,
            session_replay_url,
            sampling_rate,
            force,
        } => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }

            let endpoint = init_endpoint(realm, token, traces_url, session_replay_url)?;

            let mut config = AgentConfiguration::new(endpoint, app_name, environment);
            if let Some(version) = app_version {
                config = config.app_version(version);
            }
            if let Some(rate) = sampling_rate {
                config = config.session_sampling_rate(rate);
            }

            config.validate_strict()?;
            config.save(&config_path).await?;
            info!(path = %config_path.display(), "Config written");
            println!("Wrote {}", config_path.display());
            Ok(())
        }
        Commands::Validate { strict } => {
            let config = AgentConfiguration::load(&config_path).await?;
            if strict {
                config.validate_strict()?;
            }

            let issues = config.validate()?;
            if issues.is_empty() {
                println!("Configuration is valid.");
            }
            for issue in &issues {
                let label = match issue.severity {
                    ConfigIssueSeverity::Error => "error",
                    ConfigIssueSeverity::Warning => "warning",
                };
                println!("{label}: {}: {}", issue.field, issue.message);
            }
            Ok(())
        }
        Commands::Show => {
            let config = AgentConfiguration::load(&config_path).await?;
            print_configuration(&config);
            Ok(())
        }
        Commands::Remote { file } => {
            let mut config = AgentConfiguration::load(&config_path).await?;
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let remote = RemoteConfiguration::decode(&data)?;
            config.merge_remote(&remote);

            print_configuration(&config);
            println!("Modules:");
            for module in AgentModule::ALL {
                let state = if remote.is_module_enabled(module) {
                    "enabled"
                } else {
                    "disabled"
                };
                println!("  {:<18} {state}", module.as_str());
            }
            Ok(())
        }
        Commands::Sample { count } => {
            let config = AgentConfiguration::load(&config_path).await?;
            let sampler = SessionSampler::for_configuration(&config);
            let kept = (0..count)
                .filter(|_| sampler.sample() == SamplingDecision::NotSampledOut)
                .count();
            println!(
                "Sampling rate {}: kept {kept} of {count} sessions",
                config.session_sampling_rate
            );
            Ok(())
        }
    }
}

fn init_endpoint(
    realm: Option<String>,
    token: Option<String>,
    traces_url: Option<Url>,
    session_replay_url: Option<Url>,
) -> Result<EndpointConfiguration> {
    let mut endpoint = match (realm, token, traces_url) {
        (Some(realm), Some(token), None) => EndpointConfiguration::with_realm(realm, token),
        (Some(realm), Some(token), Some(url)) => {
            EndpointConfiguration::with_realm(realm, token).traces_url(url)
        }
        (None, None, Some(url)) => EndpointConfiguration::custom(url, None),
        (None, Some(_), _) => bail!("--token requires --realm"),
        _ => bail!("either --realm with --token, or --traces-url is required"),
    };
    if let Some(url) = session_replay_url {
        endpoint = endpoint.session_replay_url(url);
    }
    Ok(endpoint)
}

fn print_configuration(config: &AgentConfiguration) {
    println!("App name:               {}", config.app_name);
    println!("App version:            {}", config.app_version);
    println!("Deployment environment: {}", config.deployment_environment);
    println!("Endpoint:               {}", config.endpoint);
    println!("Debug logging:          {}", config.enable_debug_logging);
    println!("Session sampling rate:  {}", config.session_sampling_rate);
    println!("Session timeout:        {}s", config.session_timeout());
    println!("Max session length:     {}s", config.max_session_length());
    println!("Recording enabled:      {}", config.recording_enabled());
    let attributes = config.global_attributes.snapshot();
    if attributes.is_empty() {
        println!("Global attributes:      (none)");
    } else {
        println!("Global attributes:");
        for (key, value) in attributes {
            println!("  {key} = {value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn init_rejects_token_without_realm() {
        let parsed = Cli::try_parse_from([
            "rumagent",
            "init",
            "--app-name",
            "shop",
            "--environment",
            "dev",
            "--token",
            "abc",
            "--traces-url",
            "http://localhost:4318/v1/traces",
        ]);
        assert!(parsed.is_err());

        let traces = Url::parse("http://localhost:4318/v1/traces").unwrap();
        assert!(init_endpoint(None, Some("abc".into()), Some(traces), None).is_err());
    }

    #[test]
    fn init_endpoint_keeps_realm_credentials() {
        let endpoint = init_endpoint(Some("us0".into()), Some("abc".into()), None, None).unwrap();
        assert_eq!(endpoint.realm.as_deref(), Some("us0"));
        assert_eq!(endpoint.rum_access_token.as_deref(), Some("abc"));
    }

    #[test]
    fn init_endpoint_accepts_custom_urls() {
        let traces = Url::parse("http://localhost:4318/v1/traces").unwrap();
        let replay = Url::parse("http://localhost:4318/v1/replay").unwrap();
        let endpoint =
            init_endpoint(None, None, Some(traces.clone()), Some(replay.clone())).unwrap();
        assert_eq!(endpoint.trace_endpoint(), Some(traces));
        assert_eq!(endpoint.session_replay_endpoint(), Some(replay));
        assert!(endpoint.rum_access_token.is_none());
    }
}
