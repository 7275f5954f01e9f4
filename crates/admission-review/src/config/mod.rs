use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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

pub const DEFAULT_APPROVAL_REMARK: &str = "Document approved";

const DEFAULT_COMMIT_ATTEMPTS: u32 = 3;
const DEFAULT_COMMIT_BACKOFF_MS: u64 = 250;
const DEFAULT_COMMIT_MAX_BACKOFF_MS: u64 = 2_000;

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub review: ReviewConfig,
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
            review: ReviewConfig::from_env()?,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the document review workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewConfig {
    /// Remark recorded for approvals staged without one.
    pub default_approval_remark: String,
    pub commit_retry: RetryPolicy,
}

impl ReviewConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_approval_remark = env::var("REVIEW_DEFAULT_APPROVAL_REMARK")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_APPROVAL_REMARK.to_string());

        let max_attempts = read_number("REVIEW_COMMIT_MAX_ATTEMPTS", DEFAULT_COMMIT_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidAttempts);
        }
        let initial_backoff_ms =
            read_number("REVIEW_COMMIT_BACKOFF_MS", DEFAULT_COMMIT_BACKOFF_MS)?;
        let max_backoff_ms =
            read_number("REVIEW_COMMIT_MAX_BACKOFF_MS", DEFAULT_COMMIT_MAX_BACKOFF_MS)?;

        Ok(Self {
            default_approval_remark,
            commit_retry: RetryPolicy {
                max_attempts,
                initial_backoff: Duration::from_millis(initial_backoff_ms),
                max_backoff: Duration::from_millis(max_backoff_ms.max(initial_backoff_ms)),
            },
        })
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            default_approval_remark: DEFAULT_APPROVAL_REMARK.to_string(),
            commit_retry: RetryPolicy::default(),
        }
    }
}

/// Bounded exponential backoff applied to transient commit failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the given (1-based) failed attempt.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let scaled = self.initial_backoff.saturating_mul(1u32 << exponent);
        scaled.min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_COMMIT_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_COMMIT_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_COMMIT_MAX_BACKOFF_MS),
        }
    }
}

fn read_number<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidAttempts,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::InvalidAttempts => {
                write!(f, "REVIEW_COMMIT_MAX_ATTEMPTS must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidAttempts => None,
        }
    }
}
