use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// DuckDB database file, or `:memory:`
    pub path: String,
    /// Catalog schema whose base tables are introspected
    pub schema: String,
    pub pool_size: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub backend: String, // "openai" (alias "remote") or "ollama"
    pub model: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineConfig {
    pub completion_timeout_secs: u64,
    pub query_timeout_secs: u64,
    pub refresh_on_startup: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// DuckDB database file to query
    #[arg(long, value_name = "PATH")]
    pub database: Option<String>,

    /// Load the schema from the database before serving requests
    #[arg(long)]
    pub refresh_on_startup: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

const ENV_PREFIX: &str = "SQLCHAT";

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Built-in defaults are the lowest layer
        let mut config_builder =
            Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/sqlchat/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // SQLCHAT_LLM__MODEL=... overrides llm.model
        config_builder = config_builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(host) = &args.host {
            config.web.host = host.clone();
        }
        if let Some(port) = args.port {
            config.web.port = port;
        }
        if let Some(database) = &args.database {
            config.database.path = database.clone();
        }
        if args.refresh_on_startup {
            config.pipeline.refresh_on_startup = true;
        }

        Ok(config)
    }
}

// Default implementation
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: "sqlchat.duckdb".to_string(),
                schema: "main".to_string(),
                pool_size: 5,
                connect_timeout_secs: 5,
            },
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 4000,
            },
            llm: LlmConfig {
                backend: "openai".to_string(),
                model: "llama3".to_string(),
                api_key: None,
                api_url: Some("http://localhost:11434".to_string()),
                temperature: 0.1,
                request_timeout_secs: 120,
            },
            pipeline: PipelineConfig {
                completion_timeout_secs: 120,
                query_timeout_secs: 30,
                refresh_on_startup: false,
            },
        }
    }
}
