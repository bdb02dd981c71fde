use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; without one the in-memory store is used
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Deadline of a single storage call
    pub query_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    /// Deadline of a whole request, enforced at the HTTP boundary
    pub request_timeout_ms: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub restaurant_page_size: u64,
    pub product_page_size: u64,
    pub max_page_size: u64,
    pub search_radius_meters: f64,
}

impl DatabaseConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source (the process environment in production)
    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)
    }

    fn with_overrides<L>(mut self, lookup: &L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        // Database overrides
        if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            self.database.url = Some(url);
        }
        set(lookup, "DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        set(lookup, "DATABASE_CONNECTION_TIMEOUT", &mut self.database.connection_timeout);
        set(lookup, "DATABASE_QUERY_TIMEOUT_MS", &mut self.database.query_timeout_ms);

        // API overrides
        set(lookup, "PORT", &mut self.api.port);
        set(lookup, "CATALOG_API_PORT", &mut self.api.port);
        set(lookup, "API_REQUEST_TIMEOUT_MS", &mut self.api.request_timeout_ms);
        set(lookup, "API_MAX_REQUEST_SIZE_BYTES", &mut self.api.max_request_size_bytes);

        // Security overrides
        if let Some(secret) = lookup("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        set(lookup, "SECURITY_JWT_EXPIRY_HOURS", &mut self.security.jwt_expiry_hours);
        set(lookup, "SECURITY_ENABLE_CORS", &mut self.security.enable_cors);
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Catalog overrides
        set(lookup, "CATALOG_RESTAURANT_PAGE_SIZE", &mut self.catalog.restaurant_page_size);
        set(lookup, "CATALOG_PRODUCT_PAGE_SIZE", &mut self.catalog.product_page_size);
        set(lookup, "CATALOG_MAX_PAGE_SIZE", &mut self.catalog.max_page_size);
        set(lookup, "CATALOG_SEARCH_RADIUS_METERS", &mut self.catalog.search_radius_meters);

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                query_timeout_ms: 1000,
            },
            api: ApiConfig {
                port: 3000,
                request_timeout_ms: 2000,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                jwt_secret: "catalog-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            catalog: CatalogConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                query_timeout_ms: 1000,
            },
            api: ApiConfig {
                port: 3000,
                request_timeout_ms: 2000,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            catalog: CatalogConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                query_timeout_ms: 1000,
            },
            api: ApiConfig {
                port: 3000,
                request_timeout_ms: 2000,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            catalog: CatalogConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            restaurant_page_size: 10,
            product_page_size: 50,
            max_page_size: 100,
            search_radius_meters: 10_000.0,
        }
    }
}

/// Unparseable values keep the current setting
fn set<L, T>(lookup: &L, key: &str, target: &mut T)
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(parsed) = lookup(key).and_then(|v| v.trim().parse().ok()) {
        *target = parsed;
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_development_config() {
        let config = from_vars(&[]);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.database.url.is_none());
        assert_eq!(config.database.query_timeout(), Duration::from_secs(1));
        assert_eq!(config.api.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.catalog.restaurant_page_size, 10);
        assert_eq!(config.catalog.product_page_size, 50);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = from_vars(&[("APP_ENV", "production")]);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn env_overrides_apply() {
        let config = from_vars(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("PORT", "8080"),
            ("DATABASE_QUERY_TIMEOUT_MS", "250"),
            ("CATALOG_MAX_PAGE_SIZE", "20"),
            ("SECURITY_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("JWT_SECRET", "s3cret"),
        ]);
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/catalog"));
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.database.query_timeout_ms, 250);
        assert_eq!(config.catalog.max_page_size, 20);
        assert_eq!(config.security.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.security.jwt_secret, "s3cret");
    }

    #[test]
    fn dedicated_port_wins_and_bad_values_are_ignored() {
        let config = from_vars(&[
            ("CATALOG_API_PORT", "4000"),
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "lots"),
            ("DATABASE_URL", "  "),
        ]);
        assert_eq!(config.api.port, 4000);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.url.is_none());
    }
}
