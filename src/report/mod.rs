mod layout;

pub use layout::{ColumnLayout, MIN_LABEL_WIDTH, MIN_VALUE_WIDTH};

use crate::normalize::display_label;
use crate::parsing::{format_seconds, millis_to_seconds, parse_response_time_ms};
use crate::types::*;

const NAME_FIELD: &str = "name";
const RESPONSE_TIME_FIELD: &str = "average_response_time";
pub const NO_DATA_TEXT: &str = "No data";

/// Build the display report for one monitor.
///
/// Records whose path is excluded or below `policy.min_seconds` are skipped.
/// Rows come back sorted slowest first; equal values keep their input order.
pub fn build_report(monitor_label: &str, records: &[RawRecord], policy: &ReportPolicy) -> MonitorReport {
    let mut rows: Vec<DisplayRow> = records
        .iter()
        .filter_map(|record| display_row(record, policy))
        .collect();

    // sort_by is stable
    rows.sort_by(|a, b| b.seconds.total_cmp(&a.seconds));

    let rows = if rows.is_empty() {
        vec![ReportRow::NoData]
    } else {
        rows.into_iter().map(ReportRow::Data).collect()
    };

    MonitorReport {
        monitor_label: monitor_label.to_string(),
        rows,
    }
}

fn display_row(record: &RawRecord, policy: &ReportPolicy) -> Option<DisplayRow> {
    let label = display_label(record.get(NAME_FIELD))?;
    let seconds = millis_to_seconds(parse_response_time_ms(record.get(RESPONSE_TIME_FIELD)));
    if seconds < policy.min_seconds {
        return None;
    }
    Some(DisplayRow {
        label,
        seconds,
        formatted_seconds: format_seconds(seconds),
        severity: Severity::classify(seconds, policy),
    })
}

impl MonitorReport {
    pub fn data_rows(&self) -> impl Iterator<Item = &DisplayRow> {
        self.rows.iter().filter_map(|row| match row {
            ReportRow::Data(r) => Some(r),
            ReportRow::NoData => None,
        })
    }

    pub fn has_data(&self) -> bool {
        self.data_rows().next().is_some()
    }

    pub fn layout(&self) -> ColumnLayout {
        let rows: Vec<&DisplayRow> = self.data_rows().collect();
        ColumnLayout::for_rows(&rows)
    }

    /// Unescaped, aligned lines: one per data row, or the placeholder text.
    pub fn render_lines(&self) -> Vec<String> {
        if !self.has_data() {
            return vec![NO_DATA_TEXT.to_string()];
        }
        let layout = self.layout();
        self.data_rows().map(|row| layout.render_row(row)).collect()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.data_rows().filter(|r| r.severity == severity).count()
    }
}
