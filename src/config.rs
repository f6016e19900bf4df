/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, TOKEN_PASSWORD, bypass paths など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

pub const DEFAULT_BYPASS_PATHS: [&str; 2] = ["/api/user/new", "/api/user/login"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // HMAC secret shared with the login collaborator that mints tokens
    pub token_password: String,
    pub token_algorithm: Algorithm,
    pub token_leeway_seconds: u64,

    pub auth_bypass_paths: Vec<String>,
    pub auth_require_bearer_scheme: bool,

    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the signing secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("token_algorithm", &self.token_algorithm)
            .field("token_leeway_seconds", &self.token_leeway_seconds)
            .field("auth_bypass_paths", &self.auth_bypass_paths)
            .field("auth_require_bearer_scheme", &self.auth_require_bearer_scheme)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_number(&get, "PORT")?.unwrap_or(8000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let cors_allowed_origins = split_list(&get("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let token_password = get("TOKEN_PASSWORD")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("TOKEN_PASSWORD"))?;

        let token_algorithm = match get("TOKEN_ALGORITHM") {
            None => Algorithm::HS256,
            Some(raw) => parse_hmac_algorithm(&raw)
                .ok_or(ConfigError::Invalid("TOKEN_ALGORITHM"))?,
        };

        let token_leeway_seconds: u64 = parse_number(&get, "TOKEN_LEEWAY_SECONDS")?.unwrap_or(60);

        let auth_bypass_paths = match get("AUTH_BYPASS_PATHS") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_BYPASS_PATHS.iter().map(|p| p.to_string()).collect(),
        };

        let auth_require_bearer_scheme = match get("AUTH_REQUIRE_BEARER_SCHEME") {
            None => false,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => return Err(ConfigError::Invalid("AUTH_REQUIRE_BEARER_SCHEME")),
            },
        };

        let request_timeout_seconds: u64 =
            parse_number(&get, "REQUEST_TIMEOUT_SECONDS")?.unwrap_or(30);
        if request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"));
        }

        let request_body_limit_bytes: usize =
            parse_number(&get, "REQUEST_BODY_LIMIT_BYTES")?.unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            token_password,
            token_algorithm,
            token_leeway_seconds,
            auth_bypass_paths,
            auth_require_bearer_scheme,
            request_timeout_seconds,
            request_body_limit_bytes,
        })
    }
}

// Unset or blank means "use the default"; anything else must parse.
fn parse_number<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    get(key)
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<T>().map_err(|_| ConfigError::Invalid(key)))
        .transpose()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Only the HMAC family can be verified with a shared secret.
fn parse_hmac_algorithm(raw: &str) -> Option<Algorithm> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Some(Algorithm::HS256),
        "HS384" => Some(Algorithm::HS384),
        "HS512" => Some(Algorithm::HS512),
        _ => None,
    }
}
