use crate::escape::EscapeDialect;
use crate::report::NO_DATA_TEXT;
use crate::types::{MonitorReport, OutboundBlock};

pub const TITLE: &str = "📊 Site24x7 RUM Summary";
pub const DEFAULT_MAX_BLOCK_CHARS: usize = 3500;
const DIVIDER_WIDTH: usize = 40;
const ERROR_GLYPH: &str = "❌";

/// Turns reports into chat messages for one formatting dialect.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub dialect: EscapeDialect,
    pub max_block_chars: usize,
}

impl Renderer {
    pub fn new(dialect: EscapeDialect, max_block_chars: usize) -> Self {
        Self { dialect, max_block_chars }
    }

    pub fn render_blocks(&self, report: &MonitorReport) -> Vec<OutboundBlock> {
        render_blocks(report, self.max_block_chars, self.dialect)
    }

    pub fn render_error(&self, monitor_label: &str, message: &str) -> String {
        render_error(monitor_label, message, self.dialect)
    }
}

/// Render a report into one or more messages, in order.
///
/// Only escaped row content counts toward `max_block_chars`; the header and
/// divider added around each chunk do not. A row longer than the budget is
/// sent alone rather than cut.
pub fn render_blocks(report: &MonitorReport, max_block_chars: usize, dialect: EscapeDialect) -> Vec<OutboundBlock> {
    let label = &report.monitor_label;

    if !report.has_data() {
        let body = dialect.escape_text(NO_DATA_TEXT);
        let text = format!("{}\n\n{}\n{}", header(label, None, dialect), body, divider(dialect));
        return vec![OutboundBlock { body, text }];
    }

    let layout = report.layout();
    let lines: Vec<String> = report
        .data_rows()
        .map(|row| dialect.escape_code(&layout.render_row(row)))
        .collect();
    let heading = dialect.escape_code(&layout.heading());

    let chunks = chunk_lines(&lines, max_block_chars);
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let body = chunk.join("\n");
            let part = (total > 1).then_some((i + 1, total));
            let text = format!(
                "{}\n\n{}\n{}",
                header(label, part, dialect),
                dialect.pre(&format!("{}\n{}", heading, body)),
                divider(dialect)
            );
            OutboundBlock { body, text }
        })
        .collect()
}

/// Group lines so that each group's length, counting one terminator per
/// line, stays within `max_block_chars`.
pub fn chunk_lines(lines: &[String], max_block_chars: usize) -> Vec<Vec<String>> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for line in lines {
        let line_len = line.chars().count() + 1;
        if !current.is_empty() && current_len + line_len > max_block_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(line.clone());
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Short notice sent instead of a report when a monitor fails.
pub fn render_error(monitor_label: &str, message: &str, dialect: EscapeDialect) -> String {
    format!(
        "{}\n\n{} {}",
        header(monitor_label, None, dialect),
        ERROR_GLYPH,
        dialect.escape_text(message)
    )
}

fn header(monitor_label: &str, part: Option<(usize, usize)>, dialect: EscapeDialect) -> String {
    let mut out = format!(
        "{}\n\n{}",
        dialect.bold(&dialect.escape_text(TITLE)),
        dialect.bold(&dialect.escape_text(monitor_label))
    );
    if let Some((index, total)) = part {
        out.push(' ');
        out.push_str(&dialect.escape_text(&format!("({}/{})", index, total)));
    }
    out
}

fn divider(dialect: EscapeDialect) -> String {
    dialect.escape_text(&"-".repeat(DIVIDER_WIDTH))
}
