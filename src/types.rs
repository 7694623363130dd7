use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::escape::EscapeDialect;

/// Records above this many seconds are flagged as slow.
pub const DEFAULT_WARN_SECONDS: f64 = 5.0;
/// Records above this many seconds are flagged as critical.
pub const DEFAULT_CRITICAL_SECONDS: f64 = 6.0;
/// Default inclusion floor: every record is reported, negative times included.
pub const DEFAULT_MIN_SECONDS: f64 = f64::NEG_INFINITY;
/// Stricter inclusion floor that keeps only slow transactions.
pub const STRICT_MIN_SECONDS: f64 = 5.0;

/// A single untyped transaction record as returned by the RUM API.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub telegram_api_base: String,
    pub delivery_retry: RetryPolicy,
    pub zoho_token_url: String,
    pub zoho_credentials: ZohoCredentials,
    pub rum_api_base: String,
    pub rum_period: String,
    pub monitors: Vec<Monitor>,
    pub policy: ReportPolicy,
    pub dialect: EscapeDialect,
    pub max_block_chars: usize,
    pub debug_dir: Option<PathBuf>,
    pub report_hours_utc: Option<Vec<u32>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZohoCredentials {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
}

/// One configured RUM monitor: a display label and the upstream monitor id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub label: String,
    pub id: String,
}

impl Monitor {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self { label: label.into(), id: id.into() }
    }
}

/// Inclusion floor and severity thresholds applied while building a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportPolicy {
    pub min_seconds: f64,
    pub warn_seconds: f64,
    pub critical_seconds: f64,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            min_seconds: DEFAULT_MIN_SECONDS,
            warn_seconds: DEFAULT_WARN_SECONDS,
            critical_seconds: DEFAULT_CRITICAL_SECONDS,
        }
    }
}

impl ReportPolicy {
    /// Default thresholds with the strict inclusion floor.
    pub fn strict() -> Self {
        Self { min_seconds: STRICT_MIN_SECONDS, ..Self::default() }
    }
}

/// Bounded exponential backoff for message delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    None,
    Warn,
    Critical,
}

impl Severity {
    /// Both comparisons are strict: a value sitting exactly on a threshold
    /// stays in the lower band.
    pub fn classify(seconds: f64, policy: &ReportPolicy) -> Self {
        if seconds > policy.critical_seconds {
            Severity::Critical
        } else if seconds > policy.warn_seconds {
            Severity::Warn
        } else {
            Severity::None
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Severity::Critical => "🚨",
            Severity::Warn => "⚠️",
            Severity::None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub label: String,
    pub seconds: f64,
    pub formatted_seconds: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportRow {
    Data(DisplayRow),
    /// Placeholder used when no record qualified for the report.
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorReport {
    pub monitor_label: String,
    pub rows: Vec<ReportRow>,
}

/// One physical chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundBlock {
    /// Escaped row content; this is what the chunk budget applies to.
    pub body: String,
    /// Full message text including header and divider.
    pub text: String,
}

#[derive(Serialize)]
pub struct TelegramPayload<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'a str,
    pub disable_web_page_preview: bool,
}

/// Outcome of one pass over all configured monitors.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reported: Vec<String>,
    pub failed: Vec<String>,
    pub blocks_delivered: usize,
}

impl RunSummary {
    pub fn total_monitors(&self) -> usize {
        self.reported.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
