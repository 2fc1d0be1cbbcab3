use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

/// Pagination bounds per endpoint family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_list_limit: u32,
    pub max_list_limit: u32,
    pub default_viewport_limit: u32,
    pub max_viewport_limit: u32,
    pub default_search_limit: u32,
    pub max_search_limit: u32,
    pub default_review_limit: u32,
    pub max_review_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            database: DatabaseConfig {
                path: "data/reviews.db".to_string(),
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            api: ApiConfig {
                default_list_limit: 100,
                max_list_limit: 1000,
                default_viewport_limit: 1000,
                max_viewport_limit: 5000,
                default_search_limit: 20,
                max_search_limit: 100,
                default_review_limit: 50,
                max_review_limit: 500,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        // Start with default values
        let mut builder = Config::builder();
        for (key, value) in Self::default() {
            builder = builder.set_default(key, value)?;
        }

        let config = builder
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("REVIEW_PULSE").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("server host must not be empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("server port must be greater than 0"));
        }

        // Validate database config
        if self.database.path.is_empty() {
            return Err(anyhow::anyhow!("database path must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate pagination bounds
        let limit_pairs = [
            ("list", self.api.default_list_limit, self.api.max_list_limit),
            (
                "viewport",
                self.api.default_viewport_limit,
                self.api.max_viewport_limit,
            ),
            (
                "search",
                self.api.default_search_limit,
                self.api.max_search_limit,
            ),
            (
                "review",
                self.api.default_review_limit,
                self.api.max_review_limit,
            ),
        ];
        for (name, default, max) in limit_pairs {
            if default == 0 {
                return Err(anyhow::anyhow!("default_{name}_limit must be greater than 0"));
            }
            if default > max {
                return Err(anyhow::anyhow!(
                    "default_{name}_limit ({default}) must not exceed max_{name}_limit ({max})"
                ));
            }
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        Ok(())
    }

    /// Get database path from environment or config
    pub fn get_database_path(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.path.clone())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl IntoIterator for AppConfig {
    type Item = (String, config::Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, config::Value>;

    fn into_iter(self) -> Self::IntoIter {
        let mut map = std::collections::HashMap::new();

        // Flatten the configuration into key-value pairs
        map.insert("server.host".to_string(), config::Value::from(self.server.host));
        map.insert("server.port".to_string(), config::Value::from(self.server.port));
        map.insert(
            "server.allowed_origins".to_string(),
            config::Value::from(self.server.allowed_origins),
        );

        map.insert("database.path".to_string(), config::Value::from(self.database.path));
        map.insert(
            "database.max_connections".to_string(),
            config::Value::from(self.database.max_connections),
        );
        map.insert(
            "database.connection_timeout_secs".to_string(),
            config::Value::from(self.database.connection_timeout_secs),
        );

        map.insert(
            "api.default_list_limit".to_string(),
            config::Value::from(self.api.default_list_limit),
        );
        map.insert(
            "api.max_list_limit".to_string(),
            config::Value::from(self.api.max_list_limit),
        );
        map.insert(
            "api.default_viewport_limit".to_string(),
            config::Value::from(self.api.default_viewport_limit),
        );
        map.insert(
            "api.max_viewport_limit".to_string(),
            config::Value::from(self.api.max_viewport_limit),
        );
        map.insert(
            "api.default_search_limit".to_string(),
            config::Value::from(self.api.default_search_limit),
        );
        map.insert(
            "api.max_search_limit".to_string(),
            config::Value::from(self.api.max_search_limit),
        );
        map.insert(
            "api.default_review_limit".to_string(),
            config::Value::from(self.api.default_review_limit),
        );
        map.insert(
            "api.max_review_limit".to_string(),
            config::Value::from(self.api.max_review_limit),
        );

        map.insert("logging.level".to_string(), config::Value::from(self.logging.level));
        if let Some(file_path) = self.logging.file_path {
            map.insert("logging.file_path".to_string(), config::Value::from(file_path));
        }

        map.into_iter()
    }
}
