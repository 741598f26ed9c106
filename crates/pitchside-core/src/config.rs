use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

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
/// Decoupled from the process environment so tests can drive it with a
/// `HashMap` lookup instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values count as unset so a blank line in `.env` does not enable
    // an integration with an empty key.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse = |var: &str, default: &str| (var.to_string(), or_default(var, default));

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("PITCHSIDE_ENV", "development"))?;
    let log_level = or_default("PITCHSIDE_LOG_LEVEL", "info");

    let db_max_connections = parse_value(parse("PITCHSIDE_DB_MAX_CONNECTIONS", "10"))?;
    let db_min_connections = parse_value(parse("PITCHSIDE_DB_MIN_CONNECTIONS", "1"))?;
    let db_acquire_timeout_secs =
        parse_value(parse("PITCHSIDE_DB_ACQUIRE_TIMEOUT_SECS", "10"))?;

    let llm_api_key = optional("OPENAI_API_KEY");
    let llm_base_url = or_default("PITCHSIDE_LLM_BASE_URL", "https://api.openai.com/v1");
    let llm_model = or_default("PITCHSIDE_LLM_MODEL", "gpt-4o-mini");
    let llm_temperature = parse_value(parse("PITCHSIDE_LLM_TEMPERATURE", "0.7"))?;
    let llm_timeout_secs = parse_value(parse("PITCHSIDE_LLM_TIMEOUT_SECS", "120"))?;

    let max_attempts: u32 = parse_value(parse("PITCHSIDE_MAX_ATTEMPTS", "3"))?;
    if max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PITCHSIDE_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let retry_backoff_base_ms = parse_value(parse("PITCHSIDE_RETRY_BACKOFF_BASE_MS", "1000"))?;

    let processing_interval_secs: u64 =
        parse_value(parse("PITCHSIDE_PROCESSING_INTERVAL_SECS", "300"))?;
    if processing_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PITCHSIDE_PROCESSING_INTERVAL_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let inter_fixture_delay_ms = parse_value(parse("PITCHSIDE_INTER_FIXTURE_DELAY_MS", "2000"))?;
    let article_length = or_default("PITCHSIDE_ARTICLE_LENGTH", "800-1200 words");
    let max_articles_per_fixture =
        parse_value(parse("PITCHSIDE_MAX_ARTICLES_PER_FIXTURE", "3"))?;

    let articles_dir = {
        let raw = or_default("PITCHSIDE_ARTICLES_DIR", "generated_articles");
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    };

    let supabase_url = optional("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string());
    let supabase_key = optional("SUPABASE_KEY");
    let image_bucket = or_default("PITCHSIDE_IMAGE_BUCKET", "article-images");
    let google_api_key = optional("GOOGLE_API_KEY");
    let image_model = or_default("PITCHSIDE_IMAGE_MODEL", "gemini-2.5-flash-image-preview");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        llm_api_key,
        llm_base_url,
        llm_model,
        llm_temperature,
        llm_timeout_secs,
        max_attempts,
        retry_backoff_base_ms,
        processing_interval_secs,
        inter_fixture_delay_ms,
        article_length,
        max_articles_per_fixture,
        articles_dir,
        supabase_url,
        supabase_key,
        image_bucket,
        google_api_key,
        image_model,
    })
}

fn parse_value<T>((var, raw): (String, String)) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var,
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PITCHSIDE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
