use std::collections::HashMap;

use crate::dataset::{Row, cell};
use crate::format::to_number;
use crate::template::Column;

/// Label written in the first cell of every totals row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Label of a page subtotal row.
pub const SUBTOTAL_LABEL: &str = "SOUS-TOTAL";

/// Sum every number/currency column over `rows`, keyed by column key.
///
/// Missing and non-numeric cells count as zero. Columns of other types are
/// absent from the map, which renderers read as "no total".
pub fn aggregate(rows: &[Row], columns: &[Column]) -> HashMap<String, f64> {
    let mut totals = HashMap::new();
    for column in columns.iter().filter(|c| c.column_type.is_numeric()) {
        let sum = rows
            .iter()
            .map(|row| to_number(cell(row, &column.key)))
            .filter(|n| n.is_finite())
            .sum::<f64>();
        totals.insert(column.key.clone(), sum);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::rows_from_json;
    use crate::template::ColumnType;
    use serde_json::json;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("montant", "Montant", ColumnType::Currency, 20.0),
            Column::new("libelle", "Libellé", ColumnType::Text, 30.0),
            Column::new("qte", "Qté", ColumnType::Number, 10.0),
        ]
    }

    #[test]
    fn test_aggregate_skips_bad_values() {
        let rows = rows_from_json(json!([
            {"montant": 1000, "libelle": "A", "qte": "2"},
            {"montant": "abc", "libelle": "B", "qte": 3},
            {"montant": null, "libelle": "C"},
        ]))
        .unwrap();
        let totals = aggregate(&rows, &columns());
        assert_eq!(totals["montant"], 1000.0);
        assert_eq!(totals["qte"], 5.0);
        assert!(!totals.contains_key("libelle"));
    }

    #[test]
    fn test_aggregate_empty_dataset_is_zero() {
        let totals = aggregate(&[], &columns());
        assert_eq!(totals["montant"], 0.0);
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_aggregate_ignores_infinite_strings() {
        let rows = rows_from_json(json!([{"montant": "inf"}, {"montant": 5}])).unwrap();
        assert_eq!(aggregate(&rows, &columns())["montant"], 5.0);
    }
}
