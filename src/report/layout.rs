use crate::types::DisplayRow;

pub const MIN_LABEL_WIDTH: usize = 20;
pub const MIN_VALUE_WIDTH: usize = 8;
/// Space between the value column and the severity glyph.
const GLYPH_GAP: &str = "   ";

const LABEL_HEADING: &str = "Game";
const VALUE_HEADING: &str = "Avg";

/// Column widths for one report. Widths are measured in characters and
/// recomputed for every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub label_width: usize,
    pub value_width: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            label_width: MIN_LABEL_WIDTH,
            value_width: MIN_VALUE_WIDTH,
        }
    }
}

impl ColumnLayout {
    pub fn for_rows(rows: &[&DisplayRow]) -> Self {
        let longest_label = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
        let longest_value = rows
            .iter()
            .map(|r| r.formatted_seconds.chars().count())
            .max()
            .unwrap_or(0);
        Self {
            label_width: MIN_LABEL_WIDTH.max(longest_label + 2),
            value_width: MIN_VALUE_WIDTH.max(longest_value),
        }
    }

    pub fn render_row(&self, row: &DisplayRow) -> String {
        format!(
            "{}{}{}",
            self.cells(&row.label, &row.formatted_seconds),
            GLYPH_GAP,
            row.severity.glyph()
        )
    }

    pub fn heading(&self) -> String {
        format!("{}{}", self.cells(LABEL_HEADING, VALUE_HEADING), GLYPH_GAP)
    }

    fn cells(&self, label: &str, value: &str) -> String {
        format!(
            "{:<lw$}{:>vw$}",
            label,
            value,
            lw = self.label_width,
            vw = self.value_width
        )
    }
}
