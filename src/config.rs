/*
 * Responsibility
 * - Load settings from the environment (.env supported): listen port, app env, DPoP policy
 * - Validate values (invalid numbers fail startup)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::dpop::verifier::{CLOCK_SKEW_SECONDS, FRESHNESS_WINDOW_SECONDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
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
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // Absolute base (e.g. https://api.example.com) used to rebuild the expected htu.
    // Production deployments must set it: without it the expected host comes from
    // client-supplied x-forwarded-* / Host headers, so binding is only as strong as the proxy.
    pub public_base_url: Option<String>,

    pub dpop_freshness_window_seconds: i64,
    pub dpop_clock_skew_seconds: i64,
    pub dpop_replay_sweep_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&get, "PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = get("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let public_base_url = match get("PUBLIC_BASE_URL").map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => {
                url::Url::parse(&v).map_err(|_| ConfigError::Invalid("PUBLIC_BASE_URL"))?;
                Some(v)
            }
            _ => None,
        };

        let dpop_freshness_window_seconds: i64 = parse_or(
            &get,
            "DPOP_FRESHNESS_WINDOW_SECONDS",
            FRESHNESS_WINDOW_SECONDS,
        )?;
        if dpop_freshness_window_seconds <= 0 {
            return Err(ConfigError::Invalid("DPOP_FRESHNESS_WINDOW_SECONDS"));
        }

        let dpop_clock_skew_seconds: i64 =
            parse_or(&get, "DPOP_CLOCK_SKEW_SECONDS", CLOCK_SKEW_SECONDS)?;
        if dpop_clock_skew_seconds < 0 {
            return Err(ConfigError::Invalid("DPOP_CLOCK_SKEW_SECONDS"));
        }

        let dpop_replay_sweep_interval_seconds: u64 =
            parse_or(&get, "DPOP_REPLAY_SWEEP_INTERVAL_SECONDS", 60)?;
        if dpop_replay_sweep_interval_seconds == 0 {
            return Err(ConfigError::Invalid("DPOP_REPLAY_SWEEP_INTERVAL_SECONDS"));
        }

        Ok(Self {
            addr,
            app_env,
            public_base_url,
            dpop_freshness_window_seconds,
            dpop_clock_skew_seconds,
            dpop_replay_sweep_interval_seconds,
        })
    }
}

impl Config {
    /// True when the expected htu is derived from request headers.
    pub fn trusts_forwarded_headers(&self) -> bool {
        self.public_base_url.is_none()
    }
}

// Unset → default; set but unparsable → Invalid.
fn parse_or<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
