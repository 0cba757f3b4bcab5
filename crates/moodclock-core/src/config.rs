use crate::app_config::{AppConfig, ProviderMode};
use crate::ConfigError;

pub(crate) const DEFAULT_TOP_COUNTRIES: &str = "US,GB,CA,DE,FR,BR,IN,JP,AU,ZA,MX,ES,IT,NL,SE,NO,FI,DK,PL,TR,\
AR,CL,CO,NG,EG,KE,SA,AE,CN,KR,ID,PH,TH,VN,PK,BD,UA,CH,BE,AT";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `.env` templates can leave credentials blank.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_weight = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(var, format!("{value} is outside [0, 1]")));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let bind_addr = parse_addr("MOODCLOCK_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("MOODCLOCK_LOG_LEVEL", "info");
    let countries_path = PathBuf::from(or_default(
        "MOODCLOCK_COUNTRIES_PATH",
        "./config/countries.yaml",
    ));

    let db_max_connections = parse_u32("MOODCLOCK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("MOODCLOCK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("MOODCLOCK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let provider_raw = or_default("MOODCLOCK_PROVIDER", "composite");
    let (provider, unrecognized_provider) = match parse_provider(&provider_raw) {
        Some(mode) => (mode, None),
        None => (ProviderMode::Mock, Some(provider_raw)),
    };
    let x_bearer_token = optional("X_BEARER_TOKEN");
    let reddit_client_id = optional("REDDIT_CLIENT_ID");
    let reddit_client_secret = optional("REDDIT_CLIENT_SECRET");
    let reddit_user_agent = or_default("REDDIT_USER_AGENT", "global-mood-clock");
    let source_weight_x = parse_weight("MOODCLOCK_SOURCE_WEIGHT_X", "0.6")?;
    let source_weight_reddit = parse_weight("MOODCLOCK_SOURCE_WEIGHT_REDDIT", "0.4")?;
    let provider_timeout_secs = parse_u64("MOODCLOCK_PROVIDER_TIMEOUT_SECS", "10")?;

    let window_minutes = parse_u32("MOODCLOCK_WINDOW_MINUTES", "15")?;
    if window_minutes == 0 {
        return Err(invalid(
            "MOODCLOCK_WINDOW_MINUTES",
            "window must be at least one minute".to_string(),
        ));
    }

    let top_countries = parse_country_list(&or_default(
        "MOODCLOCK_TOP_COUNTRIES",
        DEFAULT_TOP_COUNTRIES,
    ));
    let max_concurrent_refreshes = parse_usize("MOODCLOCK_MAX_CONCURRENT_REFRESHES", "4")?.max(1);
    let refresh_cron = optional("MOODCLOCK_REFRESH_CRON")
        .unwrap_or_else(|| default_refresh_cron(window_minutes));

    Ok(AppConfig {
        database_url,
        bind_addr,
        log_level,
        countries_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        provider,
        unrecognized_provider,
        x_bearer_token,
        reddit_client_id,
        reddit_client_secret,
        reddit_user_agent,
        source_weight_x,
        source_weight_reddit,
        provider_timeout_secs,
        window_minutes,
        top_countries,
        max_concurrent_refreshes,
        refresh_cron,
    })
}

/// Parse a provider mode name, case-insensitively.
///
/// `None` for unrecognized values; the caller falls back to
/// [`ProviderMode::Mock`].
fn parse_provider(s: &str) -> Option<ProviderMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "x" => Some(ProviderMode::X),
        "reddit" => Some(ProviderMode::Reddit),
        "composite" => Some(ProviderMode::Composite),
        "mock" => Some(ProviderMode::Mock),
        _ => None,
    }
}

/// Split a comma-separated list of country codes, uppercasing and dropping blanks.
fn parse_country_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_ascii_uppercase)
        .collect()
}

/// Cron expression (with seconds) that fires once per window.
fn default_refresh_cron(window_minutes: u32) -> String {
    if window_minutes < 60 {
        format!("0 */{window_minutes} * * * *")
    } else {
        let hours = (window_minutes / 60).max(1);
        format!("0 0 */{hours} * * *")
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
