use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub api_url: String,
    pub api_key: String,
    pub handler_timeout: Duration,
    pub request_timeout: Duration,
    pub probe_interval: Duration,
    pub probe_max_interval: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_or("FIELDSYNC_DATABASE_URL", "sqlite://fieldsync.db");
        let api_url = env_required("FIELDSYNC_API_URL")?;
        let api_key = env_required("FIELDSYNC_API_KEY")?;

        let handler_timeout = env_secs("FIELDSYNC_HANDLER_TIMEOUT_SECS", 30)?;
        let request_timeout = env_secs("FIELDSYNC_REQUEST_TIMEOUT_SECS", 15)?;
        let probe_interval = env_secs("FIELDSYNC_PROBE_INTERVAL_SECS", 5)?;
        let probe_max_interval = env_secs("FIELDSYNC_PROBE_MAX_INTERVAL_SECS", 60)?;

        if handler_timeout.is_zero() {
            return Err("Invalid FIELDSYNC_HANDLER_TIMEOUT_SECS: must be greater than 0".to_string());
        }
        if probe_interval.is_zero() {
            return Err("Invalid FIELDSYNC_PROBE_INTERVAL_SECS: must be greater than 0".to_string());
        }

        let log_level = env_or("FIELDSYNC_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            api_url,
            api_key,
            handler_timeout,
            request_timeout,
            probe_interval,
            probe_max_interval,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs(key: &str, default: u64) -> Result<Duration, String> {
    env_or(key, &default.to_string())
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| format!("Invalid {key}: {e}"))
}
