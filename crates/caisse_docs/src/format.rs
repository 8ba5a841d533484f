//! Cell value formatting shared by every renderer.
//!
//! A cell renders to the same string in the preview, the PDF, the Word
//! document and the CSV; the spreadsheet stores numbers natively but its text
//! cells go through here as well.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::ColumnType;

/// Separators used when grouping numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatLocale {
    pub group_separator: char,
    pub decimal_separator: char,
}

impl Default for FormatLocale {
    /// French conventions: `1 234 567,5`.
    fn default() -> Self {
        Self {
            group_separator: ' ',
            decimal_separator: ',',
        }
    }
}

const CURRENCY_DECIMALS: usize = 2;
const NUMBER_DECIMALS: usize = 3;

/// Format `value` for a column of type `column_type` with the French locale.
pub fn format_value(value: &Value, column_type: ColumnType) -> String {
    FormatLocale::default().format(value, column_type)
}

impl FormatLocale {
    /// Format one cell. Never fails: anything unusable becomes `""`.
    pub fn format(&self, value: &Value, column_type: ColumnType) -> String {
        if is_blank(value) {
            return String::new();
        }
        match column_type {
            ColumnType::Currency => self.format_number(to_number(value), CURRENCY_DECIMALS),
            ColumnType::Number => self.format_number(to_number(value), NUMBER_DECIMALS),
            ColumnType::Date => match value {
                Value::String(s) => format_date(s),
                other => display(other),
            },
            ColumnType::Text => display(value),
        }
    }

    /// Group the integer part and keep at most `max_decimals` fraction digits
    /// (trailing zeros trimmed). Non-finite input yields `""`.
    pub fn format_number(&self, n: f64, max_decimals: usize) -> String {
        if !n.is_finite() {
            return String::new();
        }
        let fixed = format!("{:.*}", max_decimals, n.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, f.trim_end_matches('0')),
            None => (fixed.as_str(), ""),
        };

        let mut out = String::new();
        let negative = n < 0.0 && (int_part != "0" || !frac_part.is_empty());
        if negative {
            out.push('-');
        }
        let digits = int_part.len();
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (digits - i) % 3 == 0 {
                out.push(self.group_separator);
            }
            out.push(ch);
        }
        if !frac_part.is_empty() {
            out.push(self.decimal_separator);
            out.push_str(frac_part);
        }
        out
    }

    /// Format an aggregated total for a column.
    pub fn format_total(&self, total: f64, column_type: ColumnType) -> String {
        match column_type {
            ColumnType::Currency => self.format_number(total, CURRENCY_DECIMALS),
            ColumnType::Number => self.format_number(total, NUMBER_DECIMALS),
            _ => String::new(),
        }
    }
}

/// Most fraction digits a numeric column displays.
pub fn max_decimals(column_type: ColumnType) -> usize {
    match column_type {
        ColumnType::Currency => CURRENCY_DECIMALS,
        _ => NUMBER_DECIMALS,
    }
}

/// Fraction digits [`FormatLocale::format_number`] keeps for `n`.
pub fn fraction_digits(n: f64, max_decimals: usize) -> usize {
    let fixed = format!("{:.*}", max_decimals, n.abs());
    fixed
        .split_once('.')
        .map_or(0, |(_, frac)| frac.trim_end_matches('0').len())
}

/// `null`, a missing key or an empty string.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Numeric cast with the usual loose semantics: `null` and blank strings are
/// 0, booleans are 0/1, numeric strings parse, everything else is NaN.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Plain string conversion. Strings are used verbatim, not JSON-quoted.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a date string as `dd/mm/yyyy`. Unparseable input is returned as-is.
pub fn format_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
