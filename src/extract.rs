use serde_json::Value;
use tracing::debug;

use crate::types::RawRecord;

/// The nesting variants the RUM API has been seen to return.
#[derive(Debug, PartialEq)]
pub enum ResponseShape<'a> {
    /// `{"data": [...]}`
    Sequence(&'a [Value]),
    /// `{"data": {"list": [...]}}`
    ListField(&'a [Value]),
    /// `{"data": {"<any key>": [...]}}`, first array in document order.
    FirstSequence(&'a [Value]),
    /// No usable `data` payload.
    Missing,
}

impl<'a> ResponseShape<'a> {
    pub fn classify(response: &'a Value) -> Self {
        let Some(data) = response.get("data") else {
            return ResponseShape::Missing;
        };
        match data {
            Value::Array(items) => ResponseShape::Sequence(items),
            Value::Object(map) => match map.get("list") {
                Some(Value::Array(items)) => ResponseShape::ListField(items),
                _ => map
                    .values()
                    .find_map(|v| v.as_array())
                    .map(|items| ResponseShape::FirstSequence(items))
                    .unwrap_or(ResponseShape::Missing),
            },
            _ => ResponseShape::Missing,
        }
    }

    pub fn items(&self) -> &'a [Value] {
        match self {
            ResponseShape::Sequence(items)
            | ResponseShape::ListField(items)
            | ResponseShape::FirstSequence(items) => *items,
            ResponseShape::Missing => &[],
        }
    }
}

/// Flatten a RUM response into its transaction records.
///
/// Unknown shapes yield no records rather than an error. Array entries that
/// are not objects are dropped.
pub fn extract_records(response: &Value) -> Vec<RawRecord> {
    let shape = ResponseShape::classify(response);
    let items = shape.items();
    let records: Vec<RawRecord> = items
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect();
    if records.len() != items.len() {
        debug!("dropped {} non-object record(s)", items.len() - records.len());
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_data_field() {
        assert!(extract_records(&json!({})).is_empty());
        assert!(extract_records(&json!({"result": [1, 2]})).is_empty());
        assert!(extract_records(&json!([{"name": "x"}])).is_empty());
        assert!(extract_records(&Value::Null).is_empty());
    }

    #[test]
    fn test_data_is_sequence() {
        let response = json!({"data": [{"name": "a"}, {"name": "b"}]});
        assert!(matches!(ResponseShape::classify(&response), ResponseShape::Sequence(_)));
        let records = extract_records(&response);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["name"], "b");
    }

    #[test]
    fn test_data_with_list_field() {
        let response = json!({"data": {"other": [{"name": "wrong"}], "list": [{"name": "right"}]}});
        assert!(matches!(ResponseShape::classify(&response), ResponseShape::ListField(_)));
        let records = extract_records(&response);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "right");
    }

    #[test]
    fn test_data_first_sequence_in_key_order() {
        let response: Value = serde_json::from_str(
            r#"{"data": {"meta": {"k": 1}, "zeta": [{"name": "first"}], "alpha": [{"name": "second"}]}}"#,
        )
        .unwrap();
        assert!(matches!(ResponseShape::classify(&response), ResponseShape::FirstSequence(_)));
        let records = extract_records(&response);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "first");
    }

    #[test]
    fn test_list_field_not_array_falls_back() {
        let response = json!({"data": {"list": "nope", "rows": [{"name": "r"}]}});
        let records = extract_records(&response);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "r");
    }

    #[test]
    fn test_data_without_any_sequence() {
        assert_eq!(ResponseShape::classify(&json!({"data": {"a": 1}})), ResponseShape::Missing);
        assert_eq!(ResponseShape::classify(&json!({"data": "text"})), ResponseShape::Missing);
        assert_eq!(ResponseShape::classify(&json!({"data": null})), ResponseShape::Missing);
    }

    #[test]
    fn test_non_object_items_dropped() {
        let response = json!({"data": [{"name": "a"}, 3, "x", null, {"name": "b"}]});
        let records = extract_records(&response);
        assert_eq!(records.len(), 2);
    }
}
