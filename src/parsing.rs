use serde_json::Value;

/// Coerce a response-time field to milliseconds.
///
/// Accepts JSON numbers and numeric strings. Missing, null, boolean,
/// unparsable or non-finite values all become `0.0`.
pub fn parse_response_time_ms(value: Option<&Value>) -> f64 {
    let ms = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    // `+ 0.0` folds -0.0 into 0.0 so equal times compare and print the same
    ms.filter(|v| v.is_finite()).map(|v| v + 0.0).unwrap_or(0.0)
}

pub fn millis_to_seconds(ms: f64) -> f64 {
    ms / 1000.0
}

/// Render seconds with exactly two decimals and the unit suffix.
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.2} sec", seconds)
}
