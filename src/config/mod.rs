use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod validator;

use crate::cli::Cli;

/// Default configuration file name, resolved relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "cortex-gateway.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub snowflake: SnowflakeSettings,
    pub cortex: CortexSettings,
    pub warehouse: WarehouseSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Key-pair identity used to sign assertions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnowflakeSettings {
    pub account: String,
    pub user: String,
    /// PEM private key (`.p8`)
    pub private_key_path: PathBuf,
    /// Environment variable holding the key passphrase
    #[serde(default = "default_passphrase_env")]
    pub private_key_passphrase_env: String,
    /// Regenerate the assertion this many seconds before it expires
    #[serde(default = "default_refresh_margin")]
    pub token_refresh_margin_seconds: u64,
}

fn default_passphrase_env() -> String {
    "RSA_PRIVATE_KEY_PASSPHRASE".to_string()
}

fn default_refresh_margin() -> u64 {
    60
}

/// Cortex agent endpoint and fixed tool manifest
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CortexSettings {
    /// Full URL of the `agent:run` endpoint
    pub agent_url: String,
    pub model: String,
    /// Fully qualified Cortex Search service name
    pub search_service: String,
    /// Staged semantic model file (`@DB.SCHEMA.STAGE/model.yaml`)
    #[serde(default)]
    pub semantic_model_file: Option<String>,
    /// Semantic view (`DB.SCHEMA.VIEW`)
    #[serde(default)]
    pub semantic_view: Option<String>,
    #[serde(default = "default_search_tool_name")]
    pub search_tool_name: String,
    #[serde(default = "default_analyst_tool_name")]
    pub analyst_tool_name: String,
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,
    #[serde(default = "default_title_column")]
    pub search_title_column: String,
    #[serde(default = "default_id_column")]
    pub search_id_column: String,
}

fn default_search_tool_name() -> String {
    "vehicles_info_search".to_string()
}

fn default_analyst_tool_name() -> String {
    "supply_chain".to_string()
}

fn default_search_max_results() -> u32 {
    1
}

fn default_title_column() -> String {
    "title".to_string()
}

fn default_id_column() -> String {
    "relative_path".to_string()
}

/// Where extracted queries are executed
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum WarehouseSettings {
    /// Any sqlx-supported database (`postgres://`, `mysql://`, `sqlite://`)
    Sql(SqlWarehouseSettings),
    /// Snowflake SQL API v2 with key-pair authentication
    SnowflakeSqlApi(SnowflakeSqlApiSettings),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqlWarehouseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnowflakeSqlApiSettings {
    /// Account URL, e.g. `https://myorg-myaccount.snowflakecomputing.com`
    pub base_url: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Server-side statement timeout
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

fn default_statement_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    500
}

fn default_max_poll_attempts() -> u32 {
    120
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Create settings from CLI arguments (config file plus CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let settings = Self::load(path)?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }
}
