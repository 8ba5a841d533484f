//! Built-in templates, one per [`ReportType`].
//!
//! Every call builds a brand new value: there is no shared default instance
//! that a caller could mutate.

use chrono::Utc;
use uuid::Uuid;

use crate::template::{
    Align, Column, ColumnType, FooterConfig, HeaderConfig, Orientation, ReportType, Styles,
    Template,
};

/// Build the preset template for `report_type`.
pub fn preset(report_type: ReportType) -> Template {
    let now = Utc::now();
    let (orientation, columns, show_totals, description) = match report_type {
        ReportType::Recettes => (
            Orientation::Portrait,
            vec![
                Column::new("numero", "N°", ColumnType::Text, 8.0).with_align(Align::Center),
                Column::new("date", "Date", ColumnType::Date, 12.0),
                Column::new("libelle", "Libellé", ColumnType::Text, 35.0),
                Column::new("beo", "BEO", ColumnType::Text, 15.0),
                Column::new("montant", "Montant", ColumnType::Currency, 20.0),
            ],
            true,
            "Recettes encaissées sur la période",
        ),
        ReportType::Depenses => (
            Orientation::Portrait,
            vec![
                Column::new("numero", "N°", ColumnType::Text, 8.0).with_align(Align::Center),
                Column::new("date", "Date", ColumnType::Date, 12.0),
                Column::new("rubrique", "Rubrique", ColumnType::Text, 15.0),
                Column::new("libelle", "Libellé", ColumnType::Text, 35.0),
                Column::new("montant", "Montant", ColumnType::Currency, 20.0),
            ],
            true,
            "Dépenses payées sur la période",
        ),
        ReportType::FeuilleCaisse => (
            Orientation::Landscape,
            vec![
                Column::new("date", "Date", ColumnType::Date, 10.0),
                Column::new("libelle", "Libellé", ColumnType::Text, 30.0),
                Column::new("beo", "BEO", ColumnType::Text, 12.0),
                Column::new("recette", "Recettes", ColumnType::Currency, 16.0),
                Column::new("depense", "Dépenses", ColumnType::Currency, 16.0),
                Column::new("solde", "Solde", ColumnType::Currency, 16.0),
            ],
            true,
            "Feuille de caisse avec solde précédent et solde courant",
        ),
        ReportType::Rubriques => (
            Orientation::Portrait,
            vec![
                Column::new("code", "Code", ColumnType::Text, 10.0),
                Column::new("rubrique", "Rubrique", ColumnType::Text, 40.0),
                Column::new("budget", "Budget", ColumnType::Currency, 17.0),
                Column::new("engage", "Engagé", ColumnType::Currency, 17.0),
                Column::new("taux", "Taux (%)", ColumnType::Number, 16.0),
            ],
            true,
            "Consommation des crédits par rubrique budgétaire",
        ),
        ReportType::Custom => (
            Orientation::Portrait,
            vec![
                Column::new("libelle", "Libellé", ColumnType::Text, 50.0),
                Column::new("montant", "Montant", ColumnType::Currency, 25.0),
            ],
            false,
            "",
        ),
    };

    Template {
        id: Uuid::new_v4().to_string(),
        name: report_type.label().to_string(),
        report_type,
        description: description.to_string(),
        orientation,
        header: HeaderConfig::default(),
        footer: FooterConfig::default(),
        styles: Styles::default(),
        columns,
        show_totals,
        show_subtotals: false,
        watermark: None,
        watermark_config: None,
        created_at: now,
        updated_at: now,
    }
}

/// All presets in menu order.
pub fn all_presets() -> Vec<Template> {
    ReportType::all().into_iter().map(preset).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_a_preset() {
        let presets = all_presets();
        assert_eq!(presets.len(), ReportType::all().len());
        for (t, kind) in presets.iter().zip(ReportType::all()) {
            assert_eq!(t.report_type, kind);
            assert!(!t.columns.is_empty());
            assert!(t.columns.iter().all(|c| (5.0..=50.0).contains(&c.width)));
        }
    }

    #[test]
    fn test_presets_are_independent() {
        let mut a = preset(ReportType::Recettes);
        let b = preset(ReportType::Recettes);
        assert_ne!(a.id, b.id);
        a.styles.header_color = "#000000".into();
        a.columns.clear();
        let c = preset(ReportType::Recettes);
        assert_eq!(c.styles.header_color, b.styles.header_color);
        assert_eq!(c.columns.len(), b.columns.len());
    }

    #[test]
    fn test_cash_sheet_is_landscape() {
        assert_eq!(preset(ReportType::FeuilleCaisse).orientation, Orientation::Landscape);
    }

    #[test]
    fn test_column_ids_are_unique() {
        for t in all_presets() {
            let mut ids: Vec<&str> = t.columns.iter().map(|c| c.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), t.columns.len());
        }
    }
}
