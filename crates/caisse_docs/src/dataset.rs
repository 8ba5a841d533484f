//! Row-oriented datasets.
//!
//! Rows are open key/value maps whose shape follows the user-configured
//! columns. Key order is preserved (`serde_json` with `preserve_order`).

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// One dataset row: column key to scalar value.
pub type Row = Map<String, Value>;

static NULL: Value = Value::Null;

/// Look up `key` in `row`; a missing key reads as `null`.
pub fn cell<'a>(row: &'a Row, key: &str) -> &'a Value {
    row.get(key).unwrap_or(&NULL)
}

/// Convert a JSON array of objects into rows.
pub fn rows_from_json(value: Value) -> Result<Vec<Row>> {
    let Value::Array(items) = value else {
        bail!("Dataset must be a JSON array of objects");
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => bail!("Dataset row {i} is not an object: {other}"),
        })
        .collect()
}

/// Parse a JSON document holding an array of row objects.
pub fn parse_rows(json: &str) -> Result<Vec<Row>> {
    let value: Value = serde_json::from_str(json).context("Failed to parse dataset JSON")?;
    rows_from_json(value)
}

/// First `limit` rows, or all of them.
pub fn take_rows(rows: &[Row], limit: Option<usize>) -> &[Row] {
    match limit {
        Some(n) if n < rows.len() => &rows[..n],
        _ => rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_is_null() {
        let rows = rows_from_json(json!([{"a": 1}])).unwrap();
        assert_eq!(cell(&rows[0], "a"), &json!(1));
        assert!(cell(&rows[0], "b").is_null());
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(rows_from_json(json!({"a": 1})).is_err());
        assert!(rows_from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_rows_keeps_key_order() {
        let rows = parse_rows(r#"[{"z": 1, "a": 2, "m": 3}]"#).unwrap();
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_take_rows() {
        let rows = rows_from_json(json!([{}, {}, {}])).unwrap();
        assert_eq!(take_rows(&rows, Some(2)).len(), 2);
        assert_eq!(take_rows(&rows, Some(10)).len(), 3);
        assert_eq!(take_rows(&rows, None).len(), 3);
    }
}
