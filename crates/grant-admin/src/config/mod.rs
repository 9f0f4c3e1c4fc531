use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub auth: AuthConfig,
    pub contentful: Option<ContentfulConfig>,
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

        let lambda_secret = non_empty_var("LAMBDA_SECRET");
        if lambda_secret.is_none() && environment == AppEnvironment::Production {
            return Err(ConfigError::MissingLambdaSecret);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig { lambda_secret },
            contentful: ContentfulConfig::from_env(),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credentials for system-to-system callers such as the scheduling lambdas.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub lambda_secret: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("lambda_secret", &self.lambda_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Connection details for the Contentful management API.
#[derive(Clone)]
pub struct ContentfulConfig {
    pub base_url: String,
    pub space_id: String,
    pub environment_id: String,
    pub access_token: String,
    pub content_type: String,
    pub locale: String,
}

impl ContentfulConfig {
    /// Returns `None` unless both the space id and the access token are set.
    pub fn from_env() -> Option<Self> {
        let space_id = non_empty_var("CONTENTFUL_SPACE_ID")?;
        let access_token = non_empty_var("CONTENTFUL_ACCESS_TOKEN")?;

        Some(Self {
            base_url: non_empty_var("CONTENTFUL_BASE_URL")
                .unwrap_or_else(|| "https://api.contentful.com".to_string()),
            space_id,
            environment_id: non_empty_var("CONTENTFUL_ENVIRONMENT_ID")
                .unwrap_or_else(|| "master".to_string()),
            access_token,
            content_type: non_empty_var("CONTENTFUL_CONTENT_TYPE")
                .unwrap_or_else(|| "grantDetails".to_string()),
            locale: non_empty_var("CONTENTFUL_LOCALE").unwrap_or_else(|| "en-US".to_string()),
        })
    }
}

impl fmt::Debug for ContentfulConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentfulConfig")
            .field("base_url", &self.base_url)
            .field("space_id", &self.space_id)
            .field("environment_id", &self.environment_id)
            .field("content_type", &self.content_type)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingLambdaSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingLambdaSecret => {
                write!(f, "LAMBDA_SECRET must be set when APP_ENV is production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::MissingLambdaSecret => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
