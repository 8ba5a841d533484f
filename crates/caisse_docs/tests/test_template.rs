use caisse_docs::presets::all_presets;
use caisse_docs::template::{Column, ColumnType, ReportType, Template, WatermarkConfig};

// ---------------------------------------------------------------------------
// Clone isolation
// ---------------------------------------------------------------------------

#[test]
fn clone_does_not_share_nested_parts() {
    let mut source = Template::from_preset(ReportType::Recettes);
    source.watermark_config = Some(WatermarkConfig::default());
    let snapshot = source.clone();

    let mut copy = source.clone();
    copy.columns.push(Column::new("extra", "Extra", ColumnType::Text, 10.0));
    copy.columns[0].header = "Changed".into();
    copy.header.line1 = "Autre".into();
    copy.footer.email = "autre@example.org".into();
    if let Some(wm) = copy.watermark_config.as_mut() {
        wm.text = "AUTRE".into();
    }

    assert_eq!(source, snapshot);
}

#[test]
fn duplicate_is_independent() {
    let source = Template::from_preset(ReportType::Depenses);
    let mut dup = source.duplicate();
    assert_ne!(dup.id, source.id);
    assert!(dup.name.ends_with(" (copie)"));
    dup.styles.header_color = "#000000".into();
    assert_ne!(source.styles.header_color, dup.styles.header_color);
}

#[test]
fn presets_are_fresh_each_call() {
    let mut first = Template::from_preset(ReportType::Custom);
    first.columns.clear();
    let second = Template::from_preset(ReportType::Custom);
    assert!(!second.columns.is_empty());
}

#[test]
fn every_preset_round_trips_through_json() {
    for preset in all_presets() {
        let json = serde_json::to_string(&preset).unwrap();
        assert!(json.contains("\"watermarkConfig\"") || json.contains("\"showTotals\""));
        let back: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(back, preset);
    }
}
