use anyhow::Result;
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default DTMF characters the IVR can send
pub const DEFAULT_SUPPORTED_DTMF_CHARS: &str = "0123456789*";

static DURATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(ms|s|m|h)$").expect("valid duration regex"));

/// PSTN Transfer Lambda
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Run a single invocation locally: read the event from FILE or stdin, print the response
    #[arg(long)]
    pub test: bool,

    /// Event file for --test mode (defaults to stdin)
    #[arg(requires = "test")]
    pub event_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Retry client settings
#[derive(Clone, Debug, PartialEq)]
pub struct HttpSettings {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            timeout: Duration::from_millis(10_000),
        }
    }
}

impl HttpSettings {
    /// Read `HTTP_MAX_RETRIES`, `HTTP_RETRY_BASE_DELAY` and `HTTP_CLIENT_TIMEOUT`
    pub fn from_env(env: &EnvDefaults) -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env
                .get("HTTP_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            base_delay: env
                .get("HTTP_RETRY_BASE_DELAY")
                .and_then(parse_duration)
                .unwrap_or(defaults.base_delay),
            timeout: env
                .get("HTTP_CLIENT_TIMEOUT")
                .and_then(parse_duration)
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Snapshot of the process environment
///
/// Event parameters fall back to these values, so they are captured once at
/// startup and passed around instead of being read ad hoc.
#[derive(Clone, Debug, Default)]
pub struct EnvDefaults {
    vars: HashMap<String, String>,
}

impl EnvDefaults {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Non-empty value of a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvDefaults {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    // HTTP client
    pub http: HttpSettings,

    // Handler settings
    pub supported_dtmf_chars: String,
    pub version: String,

    // Logging
    pub log_level: String,

    // Fallback values for event parameters
    pub env: EnvDefaults,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self::from_env(EnvDefaults::from_process()))
    }

    pub fn from_env(env: EnvDefaults) -> Self {
        let log_level = env
            .get("LOG_LEVEL")
            .map(str::to_string)
            .unwrap_or_else(|| {
                if env
                    .get("DEBUG_LOGGING")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true"))
                {
                    "debug".to_string()
                } else {
                    "info".to_string()
                }
            });

        Config {
            http: HttpSettings::from_env(&env),
            supported_dtmf_chars: env
                .get("supportedDtmfChars")
                .unwrap_or(DEFAULT_SUPPORTED_DTMF_CHARS)
                .to_string(),
            version: env
                .get("LAMBDA_VERSION")
                .unwrap_or(env!("CARGO_PKG_VERSION"))
                .to_string(),
            log_level,
            env,
        }
    }
}

/// Parse duration strings such as `100ms`, `2s`, `1m` or `1h`
pub fn parse_duration(s: &str) -> Option<Duration> {
    let caps = DURATION_PATTERN.captures(s.trim())?;
    let value: u64 = caps.get(1)?.as_str().parse().ok()?;
    let millis = match caps.get(2)?.as_str() {
        "ms" => value,
        "s" => value.checked_mul(1_000)?,
        "m" => value.checked_mul(60_000)?,
        "h" => value.checked_mul(3_600_000)?,
        _ => return None,
    };
    Some(Duration::from_millis(millis))
}
