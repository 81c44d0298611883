// Environment-driven configuration for the aggregator, retry executor and error reporter

use std::collections::HashSet;
use std::time::Duration;

use crate::error::ConfigError;
use crate::provider::ProviderKind;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    #[default]
    Development,
    Test,
    Production,
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeMode::Development => write!(f, "development"),
            RuntimeMode::Test => write!(f, "test"),
            RuntimeMode::Production => write!(f, "production"),
        }
    }
}

/// One entry of the provider priority list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub mode: RuntimeMode,
    pub endpoint: Option<String>,
    pub site_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::Development,
            endpoint: None,
            site_url: "http://localhost".to_string(),
            user_agent: "stay-aggregator/0.1".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub mode: RuntimeMode,
    pub log_level: String,
    pub api_key: Option<String>,
    /// Adapters in the order they are tried.
    pub providers: Vec<ProviderSettings>,
    pub http_timeout_secs: u64,
    pub retry: RetryPolicy,
    pub reporter: ReporterConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("mode", &self.mode)
            .field("log_level", &self.log_level)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("providers", &self.providers)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("retry", &self.retry)
            .field("reporter", &self.reporter)
            .finish()
    }
}

impl AppConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Loads `.env` (if present) and then reads the process environment.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

// Parsing is decoupled from the real environment so tests can feed a map
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let mode = parse_mode(&or_default("STAY_ENV", "development"))?;
    let log_level = or_default("STAY_LOG_LEVEL", "info");

    let order = parse_provider_order(&or_default(
        "STAY_PROVIDER_ORDER",
        "booking,tripadvisor,hotels",
    ))?;
    let providers = order
        .into_iter()
        .map(|kind| ProviderSettings {
            kind,
            base_url: or_default(kind.base_url_env_var(), kind.default_base_url()),
        })
        .collect::<Vec<_>>();

    let api_key = lookup("RAPIDAPI_KEY").ok().filter(|k| !k.trim().is_empty());
    if !providers.is_empty() && api_key.is_none() {
        return Err(ConfigError::MissingEnvVar("RAPIDAPI_KEY".to_string()));
    }

    let http_timeout_secs = parse_u64("STAY_HTTP_TIMEOUT_SECS", "10")?;
    let retry = RetryPolicy {
        max_attempts: parse_u32("STAY_RETRY_MAX_ATTEMPTS", "3")?,
        base_delay: Duration::from_millis(parse_u64("STAY_RETRY_BASE_DELAY_MS", "1000")?),
    };

    let endpoint = lookup("STAY_ERROR_ENDPOINT").ok();
    if mode == RuntimeMode::Production && endpoint.is_none() {
        return Err(ConfigError::MissingEnvVar("STAY_ERROR_ENDPOINT".to_string()));
    }
    let reporter_defaults = ReporterConfig::default();
    let reporter = ReporterConfig {
        mode,
        endpoint,
        site_url: or_default("STAY_SITE_URL", &reporter_defaults.site_url),
        user_agent: or_default("STAY_USER_AGENT", &reporter_defaults.user_agent),
        timeout_secs: reporter_defaults.timeout_secs,
    };

    Ok(AppConfig {
        mode,
        log_level,
        api_key,
        providers,
        http_timeout_secs,
        retry,
        reporter,
    })
}

fn parse_mode(raw: &str) -> Result<RuntimeMode, ConfigError> {
    match raw.trim() {
        "development" => Ok(RuntimeMode::Development),
        "test" => Ok(RuntimeMode::Test),
        "production" => Ok(RuntimeMode::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STAY_ENV".to_string(),
            reason: format!("unknown runtime mode '{other}'"),
        }),
    }
}

/// Parses the comma-separated priority list. Order is kept exactly as written.
fn parse_provider_order(raw: &str) -> Result<Vec<ProviderKind>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "STAY_PROVIDER_ORDER".to_string(),
        reason,
    };

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let kind = name
            .parse::<ProviderKind>()
            .map_err(|_| invalid(format!("unknown provider '{name}'")))?;
        if !seen.insert(kind) {
            return Err(invalid(format!("provider '{name}' listed twice")));
        }
        order.push(kind);
    }
    Ok(order)
}
