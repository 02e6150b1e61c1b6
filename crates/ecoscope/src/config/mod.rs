use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::geo::{Location, LocationOrigin};
use crate::overlay::providers::google::{
    GoogleEndpoints, DEFAULT_AIR_QUALITY_URL, DEFAULT_PLACES_URL, DEFAULT_SOLAR_URL,
};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub services: ServiceConfig,
    pub initial_location: Location,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let services = ServiceConfig {
            google_api_key: non_empty("GOOGLE_MAPS_API_KEY"),
            air_quality_url: env::var("AIR_QUALITY_URL")
                .unwrap_or_else(|_| DEFAULT_AIR_QUALITY_URL.to_string()),
            solar_url: env::var("SOLAR_URL").unwrap_or_else(|_| DEFAULT_SOLAR_URL.to_string()),
            places_url: env::var("PLACES_URL").unwrap_or_else(|_| DEFAULT_PLACES_URL.to_string()),
            insights_url: non_empty("INSIGHTS_API_URL"),
        };

        let defaults = Location::default();
        let initial_location = Location::new(
            coordinate("INITIAL_LAT", defaults.lat, 90.0)?,
            coordinate("INITIAL_LNG", defaults.lng, 180.0)?,
            Location::DEFAULT_ALTITUDE,
            LocationOrigin::Initial,
        );

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            services,
            initial_location,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn coordinate(key: &'static str, default: f64, limit: f64) -> Result<f64, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() <= limit => Ok(value),
        _ => Err(ConfigError::InvalidCoordinate { key, value: raw }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Upstream data services. A missing key or URL leaves that service
/// unavailable rather than failing startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub google_api_key: Option<String>,
    pub air_quality_url: String,
    pub solar_url: String,
    pub places_url: String,
    pub insights_url: Option<String>,
}

impl ServiceConfig {
    pub fn google_endpoints(&self) -> GoogleEndpoints {
        GoogleEndpoints {
            air_quality_url: self.air_quality_url.clone(),
            solar_url: self.solar_url.clone(),
            places_url: self.places_url.clone(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCoordinate { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCoordinate { key, value } => {
                write!(f, "{key} must be a coordinate in degrees, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidCoordinate { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "GOOGLE_MAPS_API_KEY",
            "AIR_QUALITY_URL",
            "SOLAR_URL",
            "PLACES_URL",
            "INSIGHTS_API_URL",
            "INITIAL_LAT",
            "INITIAL_LNG",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.services.places_url, DEFAULT_PLACES_URL);
        assert_eq!(config.services.insights_url, None);
        assert_eq!(config.initial_location, Location::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_service_settings_and_initial_location() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GOOGLE_MAPS_API_KEY", "abc123");
        env::set_var("INSIGHTS_API_URL", "http://localhost:8787");
        env::set_var("APP_LOG_FORMAT", "JSON");
        env::set_var("INITIAL_LAT", "40.7128");
        env::set_var("INITIAL_LNG", "-74.006");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.services.google_api_key.as_deref(), Some("abc123"));
        assert_eq!(
            config.services.insights_url.as_deref(),
            Some("http://localhost:8787")
        );
        assert_eq!(config.telemetry.format, LogFormat::Json);
        assert_eq!(config.initial_location.lat, 40.7128);
        assert_eq!(config.initial_location.origin, LocationOrigin::Initial);
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("INITIAL_LAT", "123.0");
        let err = AppConfig::load().expect_err("latitude out of range");
        assert!(matches!(
            err,
            ConfigError::InvalidCoordinate {
                key: "INITIAL_LAT",
                ..
            }
        ));
        reset_env();
    }
}
