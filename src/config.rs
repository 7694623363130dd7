use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

use crate::escape::EscapeDialect;
use crate::render::DEFAULT_MAX_BLOCK_CHARS;
use crate::types::{
    Config, Monitor, ReportPolicy, RetryPolicy, ZohoCredentials, DEFAULT_CRITICAL_SECONDS,
    DEFAULT_MIN_SECONDS, DEFAULT_WARN_SECONDS,
};

pub const DEFAULT_ZOHO_TOKEN_URL: &str = "https://accounts.zoho.com/oauth/v2/token";
pub const DEFAULT_RUM_API_BASE: &str = "https://www.site24x7.com/api";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_RUM_PERIOD: &str = "H";
const DEFAULT_MONITORS: &str =
    r#"{"AWC7": "509934000004443003", "IG7": "509934000004441003", "QM7": "509934000004443045"}"#;

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let telegram_bot_token = required(env, "TELEGRAM_BOT_TOKEN")?;
    let telegram_chat_id = required(env, "TELEGRAM_CHAT_ID")?;
    let telegram_api_base = env
        .get_var("TELEGRAM_API_BASE")
        .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string());

    let max_attempts: u32 = parse_or(env, "TELEGRAM_MAX_ATTEMPTS", 3)?;
    if max_attempts == 0 {
        bail!("TELEGRAM_MAX_ATTEMPTS must be at least 1");
    }
    let backoff_ms: u64 = parse_or(env, "TELEGRAM_BACKOFF_MS", 1000)?;

    let zoho_credentials = match (
        env.get_var("ZOHO_REFRESH_TOKEN"),
        env.get_var("ZOHO_CLIENT_ID"),
        env.get_var("ZOHO_CLIENT_SECRET"),
    ) {
        (Some(refresh_token), Some(client_id), Some(client_secret))
            if !refresh_token.is_empty() && !client_id.is_empty() && !client_secret.is_empty() =>
        {
            ZohoCredentials { refresh_token, client_id, client_secret }
        }
        _ => bail!("ZOHO_REFRESH_TOKEN, ZOHO_CLIENT_ID and ZOHO_CLIENT_SECRET must all be set"),
    };
    let zoho_token_url = env
        .get_var("ZOHO_TOKEN_URL")
        .unwrap_or_else(|| DEFAULT_ZOHO_TOKEN_URL.to_string());

    let rum_api_base = env
        .get_var("RUM_API_BASE")
        .unwrap_or_else(|| DEFAULT_RUM_API_BASE.to_string());
    let rum_period = env
        .get_var("RUM_PERIOD")
        .unwrap_or_else(|| DEFAULT_RUM_PERIOD.to_string());

    let monitors_json = env
        .get_var("RUM_MONITORS")
        .unwrap_or_else(|| DEFAULT_MONITORS.to_string());
    let monitors = parse_monitors(&monitors_json).context("Invalid RUM_MONITORS")?;

    let policy = ReportPolicy {
        min_seconds: parse_or(env, "RUM_MIN_SECONDS", DEFAULT_MIN_SECONDS)?,
        warn_seconds: parse_or(env, "RUM_WARN_SECONDS", DEFAULT_WARN_SECONDS)?,
        critical_seconds: parse_or(env, "RUM_CRITICAL_SECONDS", DEFAULT_CRITICAL_SECONDS)?,
    };
    if policy.warn_seconds > policy.critical_seconds {
        bail!(
            "RUM_WARN_SECONDS ({}) must not exceed RUM_CRITICAL_SECONDS ({})",
            policy.warn_seconds,
            policy.critical_seconds
        );
    }

    let dialect: EscapeDialect = match env.get_var("RUM_ESCAPE_DIALECT") {
        Some(v) => v.parse().context("Invalid RUM_ESCAPE_DIALECT")?,
        None => EscapeDialect::default(),
    };

    let max_block_chars: usize = parse_or(env, "RUM_MAX_BLOCK_CHARS", DEFAULT_MAX_BLOCK_CHARS)?;
    if max_block_chars == 0 {
        bail!("RUM_MAX_BLOCK_CHARS must be greater than zero");
    }

    let debug_dir = env
        .get_var("RUM_DEBUG_DIR")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    let report_hours_utc = match env.get_var("RUM_REPORT_HOURS_UTC") {
        Some(v) if !v.trim().is_empty() => {
            Some(parse_hours(&v).context("Invalid RUM_REPORT_HOURS_UTC")?)
        }
        _ => None,
    };

    Ok(Config {
        telegram_bot_token,
        telegram_chat_id,
        telegram_api_base,
        delivery_retry: RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(backoff_ms),
        },
        zoho_token_url,
        zoho_credentials,
        rum_api_base,
        rum_period,
        monitors,
        policy,
        dialect,
        max_block_chars,
        debug_dir,
        report_hours_utc,
    })
}

/// Parse the label → id mapping, keeping the document's key order.
pub fn parse_monitors(json: &str) -> Result<Vec<Monitor>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let map = value
        .as_object()
        .ok_or_else(|| anyhow!("expected a JSON object of label -> monitor id"))?;
    let monitors = map
        .iter()
        .map(|(label, id)| match id {
            serde_json::Value::String(s) => Ok(Monitor::new(label.as_str(), s.as_str())),
            serde_json::Value::Number(n) => Ok(Monitor::new(label.as_str(), n.to_string())),
            other => Err(anyhow!("monitor '{}' has a non-scalar id: {}", label, other)),
        })
        .collect::<Result<Vec<_>>>()?;
    if monitors.is_empty() {
        bail!("no monitors configured");
    }
    Ok(monitors)
}

fn parse_hours(v: &str) -> Result<Vec<u32>> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            let hour: u32 = s.parse().with_context(|| format!("'{}' is not an hour", s))?;
            if hour > 23 {
                bail!("hour {} is out of range 0-23", hour);
            }
            Ok(hour)
        })
        .collect()
}

/// Whether a run at `now` falls inside the configured reporting hours.
/// No configured hours means every run reports.
pub fn within_schedule(hours: Option<&[u32]>, now: DateTime<Utc>) -> bool {
    match hours {
        None => true,
        Some(hours) => hours.contains(&now.hour()),
    }
}

fn required<E: EnvironmentProvider>(env: &E, key: &str) -> Result<String> {
    env.get_var(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} must be provided via Secret env", key))
}

fn parse_or<E, T>(env: &E, key: &str, default: T) -> Result<T>
where
    E: EnvironmentProvider,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env.get_var(key) {
        Some(v) => v.trim().parse().with_context(|| format!("Invalid {}", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_env() -> MockEnvironment {
        MockEnvironment::new()
            .with_var("TELEGRAM_BOT_TOKEN", "123:abc")
            .with_var("TELEGRAM_CHAT_ID", "-100200")
            .with_var("ZOHO_REFRESH_TOKEN", "refresh")
            .with_var("ZOHO_CLIENT_ID", "client")
            .with_var("ZOHO_CLIENT_SECRET", "secret")
    }

    #[test]
    fn test_config_loading_defaults() {
        let config = load_config_with_env(&base_env()).unwrap();

        assert_eq!(config.telegram_bot_token, "123:abc");
        assert_eq!(config.telegram_chat_id, "-100200");
        assert_eq!(config.telegram_api_base, DEFAULT_TELEGRAM_API_BASE);
        assert_eq!(config.zoho_token_url, DEFAULT_ZOHO_TOKEN_URL);
        assert_eq!(config.rum_api_base, DEFAULT_RUM_API_BASE);
        assert_eq!(config.rum_period, "H");
        assert_eq!(config.policy, ReportPolicy::default());
        assert_eq!(config.dialect, EscapeDialect::MarkdownV2);
        assert_eq!(config.max_block_chars, DEFAULT_MAX_BLOCK_CHARS);
        assert_eq!(config.delivery_retry, RetryPolicy::default());
        assert_eq!(config.debug_dir, None);
        assert_eq!(config.report_hours_utc, None);

        let labels: Vec<&str> = config.monitors.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["AWC7", "IG7", "QM7"]);
        assert_eq!(config.monitors[1].id, "509934000004441003");
    }

    #[test]
    fn test_config_loading_with_env() {
        let env = base_env()
            .with_var("RUM_MONITORS", r#"{"Zeta": "3", "Alpha": "1", "Mid": 2}"#)
            .with_var("RUM_MIN_SECONDS", "5")
            .with_var("RUM_WARN_SECONDS", "4.5")
            .with_var("RUM_CRITICAL_SECONDS", "9")
            .with_var("RUM_ESCAPE_DIALECT", "html")
            .with_var("RUM_MAX_BLOCK_CHARS", "1000")
            .with_var("RUM_DEBUG_DIR", "/tmp/rum")
            .with_var("RUM_REPORT_HOURS_UTC", "8, 20")
            .with_var("TELEGRAM_MAX_ATTEMPTS", "5")
            .with_var("TELEGRAM_BACKOFF_MS", "250");

        let config = load_config_with_env(&env).unwrap();

        let monitors: Vec<(&str, &str)> =
            config.monitors.iter().map(|m| (m.label.as_str(), m.id.as_str())).collect();
        assert_eq!(monitors, vec![("Zeta", "3"), ("Alpha", "1"), ("Mid", "2")]);
        assert_eq!(config.policy.min_seconds, 5.0);
        assert_eq!(config.policy.warn_seconds, 4.5);
        assert_eq!(config.policy.critical_seconds, 9.0);
        assert_eq!(config.dialect, EscapeDialect::Html);
        assert_eq!(config.max_block_chars, 1000);
        assert_eq!(config.debug_dir, Some(PathBuf::from("/tmp/rum")));
        assert_eq!(config.report_hours_utc, Some(vec![8, 20]));
        assert_eq!(config.delivery_retry.max_attempts, 5);
        assert_eq!(config.delivery_retry.initial_backoff, Duration::from_millis(250));
    }

    #[test]
    fn test_config_loading_missing_required() {
        let env = MockEnvironment::new()
            .with_var("TELEGRAM_CHAT_ID", "1")
            .with_var("ZOHO_REFRESH_TOKEN", "r")
            .with_var("ZOHO_CLIENT_ID", "c")
            .with_var("ZOHO_CLIENT_SECRET", "s");
        let result = load_config_with_env(&env);
        assert!(result.unwrap_err().to_string().contains("TELEGRAM_BOT_TOKEN"));

        let env = MockEnvironment::new()
            .with_var("TELEGRAM_BOT_TOKEN", "t")
            .with_var("TELEGRAM_CHAT_ID", "1")
            .with_var("ZOHO_REFRESH_TOKEN", "r")
            .with_var("ZOHO_CLIENT_ID", "c");
        let result = load_config_with_env(&env);
        assert!(result.unwrap_err().to_string().contains("ZOHO_CLIENT_SECRET"));

        let env = base_env().with_var("ZOHO_CLIENT_ID", "");
        assert!(load_config_with_env(&env).is_err());
    }

    #[test]
    fn test_config_loading_invalid_values() {
        let cases = [
            ("RUM_MIN_SECONDS", "soon"),
            ("RUM_MAX_BLOCK_CHARS", "0"),
            ("RUM_MAX_BLOCK_CHARS", "-5"),
            ("RUM_ESCAPE_DIALECT", "bbcode"),
            ("RUM_MONITORS", "[1, 2]"),
            ("RUM_MONITORS", "{}"),
            ("RUM_MONITORS", "not json"),
            ("RUM_REPORT_HOURS_UTC", "25"),
            ("TELEGRAM_MAX_ATTEMPTS", "0"),
        ];
        for (key, value) in cases {
            let env = base_env().with_var(key, value);
            let err = load_config_with_env(&env).unwrap_err();
            assert!(
                format!("{:#}", err).contains(key),
                "error for {}={} should name the variable: {:#}",
                key,
                value,
                err
            );
        }
    }

    #[test]
    fn test_thresholds_must_ascend() {
        let env = base_env()
            .with_var("RUM_WARN_SECONDS", "7")
            .with_var("RUM_CRITICAL_SECONDS", "6");
        assert!(load_config_with_env(&env).is_err());
    }

    #[test]
    fn test_parse_monitors_rejects_nested_ids() {
        assert!(parse_monitors(r#"{"A": {"id": 1}}"#).is_err());
        assert!(parse_monitors(r#"{"A": null}"#).is_err());
    }

    #[test]
    fn test_within_schedule() {
        let at_eight = Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap();
        let at_nine = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        assert!(within_schedule(None, at_eight));
        assert!(within_schedule(Some(&[8, 20]), at_eight));
        assert!(!within_schedule(Some(&[8, 20]), at_nine));
        assert!(!within_schedule(Some(&[]), at_nine));
    }
}
