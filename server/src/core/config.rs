use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_EVAL_TIMEOUT_SECS, DEFAULT_HOST,
    DEFAULT_MAX_IDS_PER_AGENT, DEFAULT_MAX_PERIOD_DAYS, DEFAULT_PORT, DEFAULT_SPAN_LIMIT,
    DEFAULT_STORE_MAX_EVALUATIONS, DEFAULT_STORE_MAX_SPANS, MIN_MAX_PERIOD_DAYS,
};

// =============================================================================
// File Configuration Structs (for JSON parsing)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Agent activity configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AgentsFileConfig {
    pub max_ids_per_agent: Option<usize>,
    pub max_period_days: Option<i64>,
    pub span_limit: Option<usize>,
    pub eval_timeout_secs: Option<u64>,
}

/// In-memory store configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoreFileConfig {
    pub fixture_path: Option<String>,
    pub max_spans: Option<usize>,
    pub max_evaluations: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub agents: Option<AgentsFileConfig>,
    pub store: Option<StoreFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Server
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        // Agents
        if let Some(agents) = other.agents {
            let current = self.agents.get_or_insert_with(AgentsFileConfig::default);
            if agents.max_ids_per_agent.is_some() {
                tracing::trace!(value = ?agents.max_ids_per_agent, "Merging agents.max_ids_per_agent");
                current.max_ids_per_agent = agents.max_ids_per_agent;
            }
            if agents.max_period_days.is_some() {
                tracing::trace!(value = ?agents.max_period_days, "Merging agents.max_period_days");
                current.max_period_days = agents.max_period_days;
            }
            if agents.span_limit.is_some() {
                tracing::trace!(value = ?agents.span_limit, "Merging agents.span_limit");
                current.span_limit = agents.span_limit;
            }
            if agents.eval_timeout_secs.is_some() {
                tracing::trace!(value = ?agents.eval_timeout_secs, "Merging agents.eval_timeout_secs");
                current.eval_timeout_secs = agents.eval_timeout_secs;
            }
        }

        // Store
        if let Some(store) = other.store {
            let current = self.store.get_or_insert_with(StoreFileConfig::default);
            if store.fixture_path.is_some() {
                tracing::trace!(path = ?store.fixture_path, "Merging store.fixture_path");
                current.fixture_path = store.fixture_path;
            }
            if store.max_spans.is_some() {
                tracing::trace!(value = ?store.max_spans, "Merging store.max_spans");
                current.max_spans = store.max_spans;
            }
            if store.max_evaluations.is_some() {
                tracing::trace!(value = ?store.max_evaluations, "Merging store.max_evaluations");
                current.max_evaluations = store.max_evaluations;
            }
        }

        if other.debug.is_some() {
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Final Application Configuration
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Agent activity configuration
#[derive(Debug, Clone)]
pub struct AgentsConfig {
    pub max_ids_per_agent: usize,
    pub max_period_days: i64,
    pub span_limit: usize,
    pub eval_timeout_secs: u64,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_ids_per_agent: DEFAULT_MAX_IDS_PER_AGENT,
            max_period_days: DEFAULT_MAX_PERIOD_DAYS,
            span_limit: DEFAULT_SPAN_LIMIT,
            eval_timeout_secs: DEFAULT_EVAL_TIMEOUT_SECS,
        }
    }
}

/// In-memory store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub fixture_path: Option<PathBuf>,
    pub max_spans: usize,
    pub max_evaluations: usize,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub agents: AgentsConfig,
    pub store: StoreConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.agentdash/agentdash.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.agentdash/agentdash.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(file_config, cli);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            max_ids_per_agent = config.agents.max_ids_per_agent,
            max_period_days = config.agents.max_period_days,
            span_limit = config.agents.span_limit,
            debug = config.debug,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer CLI/env overrides over file values over defaults
    fn layer(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_agents = file_config.agents.unwrap_or_default();
        let file_store = file_config.store.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let agents = AgentsConfig {
            max_ids_per_agent: cli
                .max_ids_per_agent
                .or(file_agents.max_ids_per_agent)
                .unwrap_or(DEFAULT_MAX_IDS_PER_AGENT),
            max_period_days: cli
                .max_period_days
                .or(file_agents.max_period_days)
                .unwrap_or(DEFAULT_MAX_PERIOD_DAYS),
            span_limit: cli
                .span_limit
                .or(file_agents.span_limit)
                .unwrap_or(DEFAULT_SPAN_LIMIT),
            eval_timeout_secs: cli
                .eval_timeout_secs
                .or(file_agents.eval_timeout_secs)
                .unwrap_or(DEFAULT_EVAL_TIMEOUT_SECS),
        };

        let store = StoreConfig {
            fixture_path: cli
                .fixture
                .clone()
                .or_else(|| file_store.fixture_path.map(|p| expand_path(&p))),
            max_spans: cli
                .store_max_spans
                .or(file_store.max_spans)
                .unwrap_or(DEFAULT_STORE_MAX_SPANS),
            max_evaluations: file_store
                .max_evaluations
                .unwrap_or(DEFAULT_STORE_MAX_EVALUATIONS),
        };

        // debug: CLI flag wins when set, otherwise file value
        let debug = cli.debug || file_config.debug.unwrap_or(false);

        Self {
            server,
            agents,
            store,
            debug,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would bind a random port
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.agents.max_ids_per_agent == 0 {
            anyhow::bail!("Configuration error: agents.max_ids_per_agent must be at least 1");
        }

        if self.agents.max_period_days < MIN_MAX_PERIOD_DAYS {
            anyhow::bail!(
                "Configuration error: agents.max_period_days ({}) must be at least {}",
                self.agents.max_period_days,
                MIN_MAX_PERIOD_DAYS
            );
        }

        if self.agents.span_limit == 0 {
            anyhow::bail!("Configuration error: agents.span_limit must be at least 1");
        }

        if self.agents.eval_timeout_secs == 0 {
            anyhow::bail!("Configuration error: agents.eval_timeout_secs must be greater than 0");
        }

        if self.store.max_spans == 0 || self.store.max_evaluations == 0 {
            anyhow::bail!(
                "Configuration error: store.max_spans and store.max_evaluations must be greater than 0"
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.agentdash/agentdash.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub(crate) fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 8080 },
            "agents": { "max_ids_per_agent": 10, "max_period_days": 60, "span_limit": 500 },
            "store": { "fixture_path": "/tmp/spans.json", "max_spans": 2000 },
            "debug": true
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("0.0.0.0".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(8080));
        let agents = config.agents.as_ref().unwrap();
        assert_eq!(agents.max_ids_per_agent, Some(10));
        assert_eq!(agents.max_period_days, Some(60));
        assert_eq!(agents.span_limit, Some(500));
        assert!(agents.eval_timeout_secs.is_none());
        let store = config.store.as_ref().unwrap();
        assert_eq!(store.fixture_path.as_deref(), Some("/tmp/spans.json"));
        assert_eq!(store.max_spans, Some(2000));
        assert_eq!(config.debug, Some(true));
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();

        assert!(config.server.is_none());
        assert!(config.agents.is_none());
        assert!(config.store.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "server": { "host": "localhost" }, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("localhost".to_string())
        );
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = FileConfig {
            server: Some(ServerFileConfig {
                host: Some("base.host".to_string()),
                port: Some(1000),
            }),
            agents: Some(AgentsFileConfig {
                max_ids_per_agent: Some(5),
                span_limit: Some(100),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = FileConfig {
            server: Some(ServerFileConfig {
                host: None,
                port: Some(2000),
            }),
            agents: Some(AgentsFileConfig {
                span_limit: Some(200),
                ..Default::default()
            }),
            debug: Some(true),
            ..Default::default()
        };

        base.merge(overlay);

        let server = base.server.unwrap();
        assert_eq!(server.host, Some("base.host".to_string()));
        assert_eq!(server.port, Some(2000));
        let agents = base.agents.unwrap();
        assert_eq!(agents.max_ids_per_agent, Some(5));
        assert_eq!(agents.span_limit, Some(200));
        assert_eq!(base.debug, Some(true));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::layer(FileConfig::default(), &CliConfig::default());

        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.agents.max_ids_per_agent, DEFAULT_MAX_IDS_PER_AGENT);
        assert_eq!(config.agents.max_period_days, DEFAULT_MAX_PERIOD_DAYS);
        assert_eq!(config.agents.span_limit, DEFAULT_SPAN_LIMIT);
        assert_eq!(config.agents.eval_timeout_secs, DEFAULT_EVAL_TIMEOUT_SECS);
        assert!(config.store.fixture_path.is_none());
        assert_eq!(config.store.max_spans, DEFAULT_STORE_MAX_SPANS);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_cli_override() {
        let file_config = FileConfig {
            server: Some(ServerFileConfig {
                host: Some("file.host".to_string()),
                port: Some(1000),
            }),
            agents: Some(AgentsFileConfig {
                max_ids_per_agent: Some(5),
                span_limit: Some(100),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cli = CliConfig {
            host: Some("cli.host".to_string()),
            port: Some(3000),
            debug: true,
            max_ids_per_agent: Some(7),
            eval_timeout_secs: Some(5),
            fixture: Some(PathBuf::from("fixture.json")),
            ..Default::default()
        };
        let config = AppConfig::layer(file_config, &cli);

        assert_eq!(config.server.host, "cli.host");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.agents.max_ids_per_agent, 7);
        assert_eq!(config.agents.span_limit, 100);
        assert_eq!(config.agents.eval_timeout_secs, 5);
        assert_eq!(
            config.store.fixture_path,
            Some(PathBuf::from("fixture.json"))
        );
        assert!(config.debug);
    }

    #[test]
    fn test_app_config_load_from_cli_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "server": {{ "port": 6001 }}, "agents": {{ "max_period_days": 45 }} }}"#
        )
        .unwrap();

        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 6001);
        assert_eq!(config.agents.max_period_days, 45);
    }

    #[test]
    fn test_app_config_missing_config_file() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/agentdash.json")),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    fn validate_with(cli: CliConfig) -> Result<AppConfig> {
        let config = AppConfig::layer(FileConfig::default(), &cli);
        config.validate().map(|_| config)
    }

    #[test]
    fn test_app_config_validation_server_port_zero() {
        let result = validate_with(CliConfig {
            port: Some(0),
            ..Default::default()
        });
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("server.port must be greater than 0")
        );
    }

    #[test]
    fn test_app_config_validation_empty_host() {
        let result = validate_with(CliConfig {
            host: Some(String::new()),
            ..Default::default()
        });
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("server.host must not be empty")
        );
    }

    #[test]
    fn test_app_config_validation_max_ids_zero() {
        let result = validate_with(CliConfig {
            max_ids_per_agent: Some(0),
            ..Default::default()
        });
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("agents.max_ids_per_agent")
        );
    }

    #[test]
    fn test_app_config_validation_max_period_below_builtin() {
        let result = validate_with(CliConfig {
            max_period_days: Some(29),
            ..Default::default()
        });
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("agents.max_period_days (29) must be at least 30")
        );

        assert!(
            validate_with(CliConfig {
                max_period_days: Some(30),
                ..Default::default()
            })
            .is_ok()
        );
    }

    #[test]
    fn test_app_config_validation_span_limit_zero() {
        let result = validate_with(CliConfig {
            span_limit: Some(0),
            ..Default::default()
        });
        assert!(result.unwrap_err().to_string().contains("agents.span_limit"));
    }

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(is_all_interfaces("[::]"));

        assert!(!is_all_interfaces("127.0.0.1"));
        assert!(!is_all_interfaces("localhost"));
        assert!(!is_all_interfaces("::1"));
    }
}
