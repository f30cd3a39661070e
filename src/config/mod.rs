use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::contest::registration::RegistrationWindow;

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
    pub contest: ContestConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            contest: ContestConfig::load()?,
        })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Contest-specific settings: where the submission file lives, when the
/// registration window runs, and the limits applied at intake.
#[derive(Debug, Clone)]
pub struct ContestConfig {
    pub data_dir: PathBuf,
    pub registration_opens: NaiveDateTime,
    pub registration_closes: NaiveDateTime,
    pub event_day: NaiveDateTime,
    pub max_team_members: usize,
    pub export_pin: String,
    pub service_email: String,
    pub service_extensions: String,
}

impl ContestConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir =
            PathBuf::from(env::var("CONTEST_DATA_DIR").unwrap_or_else(|_| "data".to_string()));

        let registration_opens = datetime_var("CONTEST_REG_OPEN", "2025-10-02T00:00:00")?;
        let registration_closes = datetime_var("CONTEST_REG_CLOSE", "2025-10-14T23:59:59")?;
        let event_day = datetime_var("CONTEST_EVENT_DAY", "2025-10-17T10:00:00")?;

        let max_team_members = env::var("CONTEST_MAX_TEAM")
            .unwrap_or_else(|_| "5".to_string())
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidCount {
                var: "CONTEST_MAX_TEAM",
            })?;

        let export_pin =
            env::var("CONTEST_EXPORT_PIN").unwrap_or_else(|_| "serviciomedico".to_string());
        let service_email = env::var("CONTEST_SERVICE_EMAIL")
            .unwrap_or_else(|_| "nancy.lazaro@lacostena.com.mx".to_string());
        let service_extensions = env::var("CONTEST_SERVICE_EXTS")
            .unwrap_or_else(|_| "5552, 5580, 5581, 5582 y 5583".to_string());

        Ok(Self {
            data_dir,
            registration_opens,
            registration_closes,
            event_day,
            max_team_members,
            export_pin,
            service_email,
            service_extensions,
        })
    }

    pub fn registration_window(&self) -> RegistrationWindow {
        RegistrationWindow::new(self.registration_opens, self.registration_closes)
    }
}

fn datetime_var(var: &'static str, default: &str) -> Result<NaiveDateTime, ConfigError> {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S")
        .map_err(|source| ConfigError::InvalidDateTime { var, source })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDateTime { var: &'static str, source: chrono::ParseError },
    InvalidCount { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDateTime { var, .. } => {
                write!(f, "{var} must match YYYY-MM-DDTHH:MM:SS")
            }
            ConfigError::InvalidCount { var } => {
                write!(f, "{var} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidCount { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidDateTime { source, .. } => Some(source),
        }
    }
}
