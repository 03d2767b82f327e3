//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required in environment variables")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MongoDb,
    /// Process-local storage; data is lost on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub max_pool_size: u32,
    pub server_selection_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub storage: StorageBackend,
    pub mongo: Option<MongoConfig>,
    pub firebase_project_id: String,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("mongodb") => StorageBackend::MongoDb,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        let mongo = match storage {
            StorageBackend::Memory => None,
            StorageBackend::MongoDb => Some(MongoConfig {
                uri: get("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
                database: get("MONGODB_DATABASE").unwrap_or_else(|| "fpv_blog".to_string()),
                max_pool_size: parse_or("MONGODB_MAX_POOL_SIZE", get("MONGODB_MAX_POOL_SIZE"), 10)?,
                server_selection_timeout: Duration::from_millis(parse_or(
                    "MONGODB_SERVER_SELECTION_TIMEOUT_MS",
                    get("MONGODB_SERVER_SELECTION_TIMEOUT_MS"),
                    5000,
                )?),
            }),
        };

        let environment = get("APP_ENV").unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = get("CORS_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        // Credentialed CORS cannot use a wildcard; development already allows any origin.
        if environment != "development" && cors_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::Invalid {
                name: "CORS_ORIGIN",
                value: cors_origins.join(","),
            });
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", get("PORT"), 5000)?,
            environment,
            storage,
            mongo,
            firebase_project_id: get("FIREBASE_PROJECT_ID")
                .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            cors_origins,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn mongodb_is_the_default_backend() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("FIREBASE_PROJECT_ID", "project-fpv"),
        ]))
        .unwrap();

        assert_eq!(config.storage, StorageBackend::MongoDb);
        assert_eq!(config.port, 5000);
        let mongo = config.mongo.unwrap();
        assert_eq!(mongo.database, "fpv_blog");
        assert_eq!(mongo.max_pool_size, 10);
        assert_eq!(mongo.server_selection_timeout, Duration::from_secs(5));
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn mongodb_uri_is_required_for_mongodb() {
        let err = AppConfig::from_lookup(lookup(&[("FIREBASE_PROJECT_ID", "p")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MONGODB_URI")));
    }

    #[test]
    fn memory_backend_needs_no_uri() {
        let config = AppConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("FIREBASE_PROJECT_ID", "p"),
        ]))
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.mongo.is_none());
    }

    #[test]
    fn firebase_project_is_required() {
        let err = AppConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "memory")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("FIREBASE_PROJECT_ID")));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("FIREBASE_PROJECT_ID", "p"),
            ("CORS_ORIGIN", "https://a.dev, https://b.dev ,"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(config.cors_origins, vec!["https://a.dev", "https://b.dev"]);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn bad_port_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("FIREBASE_PROJECT_ID", "p"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn wildcard_origin_is_rejected_outside_development() {
        let err = AppConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("FIREBASE_PROJECT_ID", "p"),
            ("APP_ENV", "production"),
            ("CORS_ORIGIN", "https://a.dev,*"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CORS_ORIGIN", .. }));

        let config = AppConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("FIREBASE_PROJECT_ID", "p"),
            ("CORS_ORIGIN", "*"),
        ]))
        .unwrap();
        assert!(config.is_development());
    }
}
