use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing configuration: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub catalogue: CatalogueConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub sslmode: String,
    /// Full connection URL; takes precedence over the discrete fields
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// Log scan, match and page counts for every search at debug level
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        AppConfig::development().server
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::Postgres }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        AppConfig::development().database
    }
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        AppConfig::development().catalogue
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        AppConfig::development().security
    }
}

impl AppConfig {
    /// Preset for `APP_ENV`, then the optional `CONFIG_PATH` YAML file, then
    /// per-key environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let base = match env::var("CONFIG_PATH") {
            Ok(path) => Self::from_yaml_file(PathBuf::from(path))?,
            Err(_) => Self::preset(environment),
        };

        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    pub fn from_yaml_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
        Self::from_yaml_str(&content)
    }

    /// Missing keys fall back to the development preset
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn with_env_overrides(self) -> Self {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Storage overrides
        if let Some(v) = var("STORAGE_BACKEND") {
            self.storage.backend = v.parse().unwrap_or(self.storage.backend);
        }

        // Database overrides
        if let Some(v) = var("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = var("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Some(v) = var("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = var("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = var("DB_SSLMODE") {
            self.database.sslmode = v;
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Catalogue overrides
        if let Some(v) = var("CATALOGUE_DEBUG_LOGGING") {
            self.catalogue.debug_logging = v.parse().unwrap_or(self.catalogue.debug_logging);
        }

        // Security overrides
        if let Some(v) = var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig { backend: StorageBackend::Postgres },
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: String::new(),
                name: "benefits".to_string(),
                sslmode: "disable".to_string(),
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            catalogue: CatalogueConfig { debug_logging: true },
            security: SecurityConfig {
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig { backend: StorageBackend::Postgres },
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "benefits".to_string(),
                password: String::new(),
                name: "benefits".to_string(),
                sslmode: "prefer".to_string(),
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            catalogue: CatalogueConfig { debug_logging: false },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig { backend: StorageBackend::Postgres },
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "benefits".to_string(),
                password: String::new(),
                name: "benefits".to_string(),
                sslmode: "require".to_string(),
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            catalogue: CatalogueConfig { debug_logging: false },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}
