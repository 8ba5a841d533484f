//! Report template model.
//!
//! A [`Template`] is the declarative description of a report: letterhead,
//! footer, style sheet, watermark and the ordered column list. Renderers only
//! ever read it. Every nested part is owned, so `clone()` is always a deep copy
//! and two templates can never share a column list or a watermark.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::presets;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of report a template was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Revenue ledger.
    Recettes,
    /// Expense ledger.
    Depenses,
    /// Cash sheet combining revenue and expenses with a running balance.
    FeuilleCaisse,
    /// Budget rubrics summary.
    Rubriques,
    Custom,
}

impl ReportType {
    /// Display label used in template names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Recettes => "Journal des recettes",
            Self::Depenses => "Journal des dépenses",
            Self::FeuilleCaisse => "Feuille de caisse",
            Self::Rubriques => "Situation par rubrique",
            Self::Custom => "Rapport personnalisé",
        }
    }

    /// All variants in menu order.
    pub fn all() -> [Self; 5] {
        [
            Self::Recettes,
            Self::Depenses,
            Self::FeuilleCaisse,
            Self::Rubriques,
            Self::Custom,
        ]
    }

    /// Parse the serialized (snake_case) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|t| t.name() == name.trim().to_lowercase())
    }

    /// Serialized name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recettes => "recettes",
            Self::Depenses => "depenses",
            Self::FeuilleCaisse => "feuille_caisse",
            Self::Rubriques => "rubriques",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Page size in points for an A4 sheet in this orientation: `(width, height)`.
    pub fn a4_points(&self) -> (f64, f64) {
        const SHORT: f64 = 595.28;
        const LONG: f64 = 841.89;
        match self {
            Self::Portrait => (SHORT, LONG),
            Self::Landscape => (LONG, SHORT),
        }
    }

    /// CSS `@page` size.
    pub fn css_page_size(&self) -> &'static str {
        match self {
            Self::Portrait => "21cm 29.7cm",
            Self::Landscape => "29.7cm 21cm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoPosition {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Currency,
    Date,
}

impl ColumnType {
    /// Number and currency columns are summed and written as raw numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Currency)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn css(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Row kinds a style rule can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Header,
    Subheader,
    Data,
    Total,
    Subtotal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkType {
    #[default]
    Text,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkPosition {
    Center,
    #[default]
    Diagonal,
    Tiled,
}

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Letterhead printed above the title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderConfig {
    pub line1: String,
    pub line2: String,
    pub line3: String,
    pub line4: String,
    pub show_logo: bool,
    pub logo_position: LogoPosition,
    pub reference_number: String,
}

impl HeaderConfig {
    /// The four letterhead lines in print order.
    pub fn lines(&self) -> [&str; 4] {
        [&self.line1, &self.line2, &self.line3, &self.line4]
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            line1: "RÉPUBLIQUE".into(),
            line2: "MINISTÈRE DES FINANCES".into(),
            line3: "DIRECTION GÉNÉRALE DES DOUANES".into(),
            line4: "Régie des recettes et des dépenses".into(),
            show_logo: true,
            logo_position: LogoPosition::Left,
            reference_number: String::new(),
        }
    }
}

/// Footer repeated on every page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterConfig {
    pub slogan: String,
    pub address: String,
    pub contact: String,
    pub email: String,
    pub show_page_numbers: bool,
}

impl FooterConfig {
    /// The four footer text lines in print order.
    pub fn lines(&self) -> [&str; 4] {
        [&self.slogan, &self.address, &self.contact, &self.email]
    }
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            slogan: "Au service de l'économie nationale".into(),
            address: "Direction Générale des Douanes, BP 100".into(),
            contact: "Tél : +000 00 00 00 00".into(),
            email: "regie@douanes.gov".into(),
            show_page_numbers: true,
        }
    }
}

/// Styling applied to one kind of row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowStyle {
    pub kind: RowKind,
    pub background: String,
    pub text_color: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl RowStyle {
    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }
}

/// Fonts, colours and row rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Styles {
    pub title_font: String,
    pub title_font_size: f64,
    pub body_font: String,
    pub body_font_size: f64,
    pub header_color: String,
    pub alternate_row_color: String,
    pub border_color: String,
    pub accent_color: String,
    pub row_styles: Vec<RowStyle>,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            title_font: "helvetica".into(),
            title_font_size: 16.0,
            body_font: "helvetica".into(),
            body_font_size: 9.0,
            header_color: "#1e3a5f".into(),
            alternate_row_color: "#f2f5f9".into(),
            border_color: "#c8d0da".into(),
            accent_color: "#0b6e4f".into(),
            row_styles: vec![
                RowStyle {
                    kind: RowKind::Header,
                    background: "#1e3a5f".into(),
                    text_color: "#ffffff".into(),
                    font_weight: FontWeight::Bold,
                    italic: false,
                    underline: false,
                },
                RowStyle {
                    kind: RowKind::Total,
                    background: "#e6ecf2".into(),
                    text_color: "#000000".into(),
                    font_weight: FontWeight::Bold,
                    italic: false,
                    underline: false,
                },
            ],
        }
    }
}

impl Styles {
    /// The rule for `kind`, or a default derived from the sheet colours.
    pub fn row_style(&self, kind: RowKind) -> RowStyle {
        if let Some(rule) = self.row_styles.iter().find(|r| r.kind == kind) {
            return rule.clone();
        }
        let (background, text_color, font_weight, italic) = match kind {
            RowKind::Header => (self.header_color.clone(), "#ffffff", FontWeight::Bold, false),
            RowKind::Subheader => (self.alternate_row_color.clone(), "#000000", FontWeight::Bold, false),
            RowKind::Data => ("#ffffff".to_string(), "#000000", FontWeight::Normal, false),
            RowKind::Total => (self.alternate_row_color.clone(), "#000000", FontWeight::Bold, false),
            RowKind::Subtotal => ("#ffffff".to_string(), "#000000", FontWeight::Bold, true),
        };
        RowStyle {
            kind,
            background,
            text_color: text_color.into(),
            font_weight,
            italic,
            underline: false,
        }
    }
}

/// One table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub header: String,
    pub key: String,
    /// Share of the table width in percent (5–50).
    pub width: f64,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Column {
    pub const MIN_WIDTH: f64 = 5.0;
    pub const MAX_WIDTH: f64 = 50.0;

    pub fn new(key: impl Into<String>, header: impl Into<String>, column_type: ColumnType, width: f64) -> Self {
        let key = key.into();
        Self {
            id: key.clone(),
            header: header.into(),
            key,
            width: width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH),
            column_type,
            align: None,
            format: None,
        }
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    /// Explicit alignment, else right for number/currency and left otherwise.
    pub fn effective_align(&self) -> Align {
        self.align.unwrap_or(if self.column_type.is_numeric() {
            Align::Right
        } else {
            Align::Left
        })
    }
}

/// Structured watermark settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatermarkConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub watermark_type: WatermarkType,
    pub text: String,
    pub image_url: String,
    /// 5–100.
    pub opacity: f64,
    /// Degrees, −90..90.
    pub rotation: f64,
    pub font_size: f64,
    /// Percent of the page width.
    pub image_size: f64,
    pub color: String,
    pub position: WatermarkPosition,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            watermark_type: WatermarkType::Text,
            text: "CONFIDENTIEL".into(),
            image_url: String::new(),
            opacity: 15.0,
            rotation: -45.0,
            font_size: 60.0,
            image_size: 40.0,
            color: "#888888".into(),
            position: WatermarkPosition::Diagonal,
        }
    }
}

/// Root entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub header: HeaderConfig,
    #[serde(default)]
    pub footer: FooterConfig,
    #[serde(default)]
    pub styles: Styles,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub show_totals: bool,
    #[serde(default)]
    pub show_subtotals: bool,
    /// Legacy single-string watermark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark_config: Option<WatermarkConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Fresh template for a report kind.
    pub fn from_preset(report_type: ReportType) -> Self {
        presets::preset(report_type)
    }

    /// Deep copy under a new id.
    pub fn duplicate(&self) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: format!("{} (copie)", self.name),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Switch to another report kind: columns, name and totals flags come from
    /// the preset, the letterhead, footer, styles and watermark are kept.
    pub fn change_type(&mut self, report_type: ReportType) {
        let preset = presets::preset(report_type);
        self.report_type = report_type;
        self.name = preset.name;
        self.description = preset.description;
        self.columns = preset.columns;
        self.orientation = preset.orientation;
        self.show_totals = preset.show_totals;
        self.show_subtotals = preset.show_subtotals;
        self.touch();
    }

    /// Back to the preset of the current report kind, keeping the id.
    pub fn reset(&mut self) {
        let id = std::mem::take(&mut self.id);
        let created_at = self.created_at;
        *self = presets::preset(self.report_type);
        self.id = id;
        self.created_at = created_at;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
        self.touch();
    }

    /// Removes the column with `id`. Returns whether one was removed.
    pub fn remove_column(&mut self, id: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.id != id);
        let removed = self.columns.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Applies `f` to the column with `id`, then re-clamps its width.
    pub fn update_column(&mut self, id: &str, f: impl FnOnce(&mut Column)) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        f(column);
        column.width = column.width.clamp(Column::MIN_WIDTH, Column::MAX_WIDTH);
        self.touch();
        true
    }

    /// Array move: take the column at `from` and insert it at `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if from >= self.columns.len() || to >= self.columns.len() {
            return false;
        }
        if from != to {
            let column = self.columns.remove(from);
            self.columns.insert(to, column);
            self.touch();
        }
        true
    }

    /// Clamp every bounded field into its documented range.
    pub fn normalize(&mut self) {
        for column in &mut self.columns {
            column.width = sanitize(column.width, Column::MIN_WIDTH, Column::MAX_WIDTH, 15.0);
        }
        self.styles.title_font_size = sanitize(self.styles.title_font_size, 6.0, 48.0, 16.0);
        self.styles.body_font_size = sanitize(self.styles.body_font_size, 5.0, 24.0, 9.0);
        if let Some(wm) = &mut self.watermark_config {
            wm.opacity = sanitize(wm.opacity, 5.0, 100.0, 15.0);
            wm.rotation = sanitize(wm.rotation, -90.0, 90.0, -45.0);
            wm.font_size = sanitize(wm.font_size, 8.0, 200.0, 60.0);
            wm.image_size = sanitize(wm.image_size, 5.0, 100.0, 40.0);
        }
    }

    /// The watermark the renderers should draw, if any.
    ///
    /// A structured config always wins over the legacy string, even when it
    /// is disabled.
    pub fn effective_watermark(&self) -> Option<WatermarkConfig> {
        match (&self.watermark_config, &self.watermark) {
            (Some(config), _) => config.enabled.then(|| config.clone()),
            (None, Some(text)) if !text.trim().is_empty() => Some(WatermarkConfig {
                enabled: true,
                text: text.clone(),
                ..WatermarkConfig::default()
            }),
            _ => None,
        }
    }
}

fn sanitize(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}
