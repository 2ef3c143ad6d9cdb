use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

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
    pub intake: IntakeConfig,
    pub mail: MailConfig,
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

        let courses_path = env::var("APP_COURSES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/courses.csv"));
        let max_resume_bytes = match env::var("APP_MAX_RESUME_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or(ConfigError::InvalidResumeLimit)?,
            Err(_) => DEFAULT_MAX_RESUME_BYTES,
        };

        let smtp = match non_empty_var("APP_SMTP_HOST") {
            Some(host) => {
                let username = non_empty_var("APP_SMTP_USER")
                    .ok_or(ConfigError::IncompleteSmtp { missing: "APP_SMTP_USER" })?;
                let password = non_empty_var("APP_SMTP_PASSWORD").ok_or(
                    ConfigError::IncompleteSmtp {
                        missing: "APP_SMTP_PASSWORD",
                    },
                )?;
                Some(SmtpConfig {
                    host,
                    username,
                    password,
                })
            }
            None => None,
        };
        let from_address =
            non_empty_var("APP_MAIL_FROM").unwrap_or_else(|| "no-reply@localhost".to_string());
        let signature =
            non_empty_var("APP_MAIL_SIGNATURE").unwrap_or_else(|| "Committee Head".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            intake: IntakeConfig {
                courses_path,
                max_resume_bytes,
            },
            mail: MailConfig {
                smtp,
                from_address,
                signature,
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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

/// Where the course catalog lives and how large an uploaded resume may be.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub courses_path: PathBuf,
    pub max_resume_bytes: usize,
}

/// Outbound status e-mail settings. SMTP stays disabled unless a relay host is configured.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp: Option<SmtpConfig>,
    pub from_address: String,
    pub signature: String,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidResumeLimit,
    IncompleteSmtp { missing: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidResumeLimit => {
                write!(f, "APP_MAX_RESUME_BYTES must be a positive integer")
            }
            ConfigError::IncompleteSmtp { missing } => {
                write!(f, "{missing} must be set when APP_SMTP_HOST is configured")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidResumeLimit
            | ConfigError::IncompleteSmtp { .. } => None,
        }
    }
}
