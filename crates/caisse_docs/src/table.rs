//! The formatted table every renderer draws.
//!
//! Building the table once per render is what keeps the formats in step:
//! column order, alignment defaults, display strings and the totals row are
//! decided here and nowhere else.

use crate::dataset::{Row, cell, take_rows};
use crate::format::{FormatLocale, is_blank, to_number};
use crate::template::{Align, Column, ColumnType, Template};
use crate::totals::{TOTAL_LABEL, aggregate};

/// Typed cell content for outputs that keep numbers native.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Locale-formatted string shown by every renderer.
    pub display: String,
    pub value: CellValue,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            display: String::new(),
            value: CellValue::Empty,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            return Self::empty();
        }
        Self {
            display: s.clone(),
            value: CellValue::Text(s),
        }
    }
}

/// Column as resolved for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub key: String,
    pub header: String,
    pub column_type: ColumnType,
    pub align: Align,
    /// Template width in percent.
    pub width: f64,
}

impl From<&Column> for TableColumn {
    fn from(c: &Column) -> Self {
        Self {
            key: c.key.clone(),
            header: c.header.clone(),
            column_type: c.column_type,
            align: c.effective_align(),
            width: c.width,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub columns: Vec<TableColumn>,
    pub body: Vec<Vec<Cell>>,
    pub totals: Option<Vec<Cell>>,
}

impl ReportTable {
    /// Format `rows` (optionally only the first `limit`) against the template.
    pub fn build(template: &Template, rows: &[Row], locale: &FormatLocale, limit: Option<usize>) -> Self {
        let rows = take_rows(rows, limit);
        let columns: Vec<TableColumn> = template.columns.iter().map(TableColumn::from).collect();

        let body = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| body_cell(cell(row, &col.key), col.column_type, locale))
                    .collect()
            })
            .collect();

        let totals = template
            .show_totals
            .then(|| summary_row(TOTAL_LABEL, &columns, rows, &template.columns, locale));

        Self {
            columns,
            body,
            totals,
        }
    }

    /// Relative column widths normalised to sum to 1.
    pub fn width_fractions(&self) -> Vec<f64> {
        let sum: f64 = self.columns.iter().map(|c| c.width.max(0.0)).sum();
        if sum <= 0.0 {
            let n = self.columns.len().max(1) as f64;
            return vec![1.0 / n; self.columns.len()];
        }
        self.columns.iter().map(|c| c.width.max(0.0) / sum).collect()
    }

    pub fn header_labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }
}

/// A `label` row: the label in the first column, column sums elsewhere.
pub fn summary_row(
    label: &str,
    columns: &[TableColumn],
    rows: &[Row],
    template_columns: &[Column],
    locale: &FormatLocale,
) -> Vec<Cell> {
    let sums = aggregate(rows, template_columns);
    columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            if i == 0 {
                return Cell::text(label);
            }
            let total = sums.get(&col.key).filter(|_| col.column_type.is_numeric());
            match total {
                Some(total) => Cell {
                    display: locale.format_total(*total, col.column_type),
                    value: CellValue::Number(*total),
                },
                None => Cell::empty(),
            }
        })
        .collect()
}

fn body_cell(raw: &serde_json::Value, column_type: ColumnType, locale: &FormatLocale) -> Cell {
    let display = locale.format(raw, column_type);
    if display.is_empty() || is_blank(raw) {
        return Cell::empty();
    }
    let value = if column_type.is_numeric() {
        CellValue::Number(to_number(raw))
    } else {
        CellValue::Text(display.clone())
    };
    Cell { display, value }
}
