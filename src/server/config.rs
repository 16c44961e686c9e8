use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub listen_addr: SocketAddr,
    pub log_dir: String,
    pub max_connections: u32,
    /// Create missing tables from the entities at startup.
    pub auto_create_schema: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
    log_dir: Option<String>,
    max_connections: Option<u32>,
    auto_create_schema: Option<bool>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

impl ServerConfig {
    /// Loads the TOML file at `config_path` (if any), then lets environment
    /// variables override it.
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path_str) => read_file_config(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        Self::merge(env_config, file_config)
    }

    fn merge(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Result<Self, String> {
        let listen_addr = env_config
            .listen_addr
            .or(file_config.listen_addr)
            .unwrap_or_else(default_listen_addr);
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid LISTEN_ADDR '{listen_addr}': {e}"))?;

        Ok(ServerConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            jwt_secret: env_config
                .jwt_secret
                .or(file_config.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            listen_addr,
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            max_connections: env_config
                .max_connections
                .or(file_config.max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            auto_create_schema: env_config
                .auto_create_schema
                .or(file_config.auto_create_schema)
                .unwrap_or(false),
        })
    }
}

/// A missing file is treated as empty.
fn read_file_config(path: &Path) -> Result<PartialServerConfig, String> {
    if !path.exists() {
        return Ok(PartialServerConfig::default());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
    toml::from_str(&contents)
        .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
}
