//! HTML building blocks shared by the on-screen preview and the Word export.

use crate::color::Rgb;
use crate::report::ReportRequest;
use crate::table::{Cell, ReportTable};
use crate::template::{
    FooterConfig, HeaderConfig, LogoPosition, RowKind, RowStyle, Styles, WatermarkConfig,
    WatermarkType,
};
use crate::watermark::{Placement, placements};

/// Generate a complete HTML document with the given title, extra CSS and body.
pub fn generate_html(title: &str, css: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
{body_html}
</body>
</html>"#,
        title = escape_html(title),
    )
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Map a template font name to a CSS font stack.
pub fn font_stack(name: &str) -> &'static str {
    match name.to_lowercase().as_str() {
        "times" | "times new roman" | "serif" => "\"Times New Roman\", Times, serif",
        "courier" | "courier new" | "monospace" => "\"Courier New\", Courier, monospace",
        _ => "Helvetica, Arial, sans-serif",
    }
}

/// Stylesheet for the report blocks, driven by the template style sheet.
pub fn report_css(styles: &Styles) -> String {
    let accent = Rgb::parse_or(&styles.accent_color, Rgb::BLACK).to_hex();
    let border = Rgb::parse_or(&styles.border_color, Rgb::BLACK).to_hex();
    format!(
        r#"        .caisse-header {{ text-align: center; margin-bottom: 6pt; }}
        .caisse-header p {{ margin: 0; line-height: 1.3; }}
        .caisse-header .l1 {{ font-style: italic; }}
        .caisse-header .l2, .caisse-header .l3 {{ font-weight: bold; }}
        .caisse-header .l4 {{ font-weight: bold; font-style: italic; }}
        .caisse-header .ref {{ text-align: left; margin-top: 4pt; }}
        .caisse-logo {{ height: 48pt; }}
        .caisse-rule {{ border: 0; border-top: 2px solid {accent}; margin: 6pt 0 10pt 0; }}
        .caisse-title {{ font-family: {title_font}; font-size: {title_size}pt; font-weight: bold; text-decoration: underline; text-align: center; margin: 8pt 0 2pt 0; }}
        .caisse-subtitle {{ font-style: italic; text-align: center; margin: 0 0 8pt 0; }}
        table.caisse-table {{ border-collapse: collapse; width: 100%; font-family: {body_font}; font-size: {body_size}pt; }}
        table.caisse-table th, table.caisse-table td {{ border: 1px solid {border}; padding: 3pt 4pt; }}
        .caisse-footer {{ text-align: center; font-size: {footer_size}pt; margin-top: 12pt; }}
        .caisse-footer p {{ margin: 0; }}
        .caisse-footer .slogan {{ font-style: italic; }}
        .caisse-footer .email {{ font-size: {email_size}pt; }}
        .caisse-footer .pages {{ border-top: 0.5pt solid {border}; margin-top: 3pt; padding-top: 2pt; }}
        .caisse-watermark {{ position: absolute; inset: 0; overflow: hidden; pointer-events: none; }}
        .caisse-watermark .wm {{ position: absolute; white-space: nowrap; font-weight: bold; }}"#,
        title_font = font_stack(&styles.title_font),
        title_size = styles.title_font_size,
        body_font = font_stack(&styles.body_font),
        body_size = styles.body_font_size,
        footer_size = (styles.body_font_size - 1.0).max(6.0),
        email_size = (styles.body_font_size - 2.0).max(5.0),
    )
}

/// Letterhead: optional logo, the four lines, optional reference, accent rule.
pub fn header_block(header: &HeaderConfig, logo_src: Option<&str>) -> String {
    let mut html = String::from("<div class=\"caisse-header\">\n");
    if let (true, Some(src)) = (header.show_logo, logo_src) {
        let align = match header.logo_position {
            LogoPosition::Left => "left",
            LogoPosition::Center => "center",
            LogoPosition::Right => "right",
        };
        html.push_str(&format!(
            "<div style=\"text-align: {align};\"><img class=\"caisse-logo\" src=\"{}\" alt=\"logo\"></div>\n",
            escape_html(src)
        ));
    }
    for (i, line) in header.lines().iter().enumerate() {
        if !line.trim().is_empty() {
            html.push_str(&format!("<p class=\"l{}\">{}</p>\n", i + 1, escape_html(line)));
        }
    }
    if !header.reference_number.trim().is_empty() {
        html.push_str(&format!(
            "<p class=\"ref\">{}</p>\n",
            escape_html(&reference_line(&header.reference_number))
        ));
    }
    html.push_str("</div>\n<hr class=\"caisse-rule\">\n");
    html
}

/// Text of the reference number line.
pub fn reference_line(reference: &str) -> String {
    format!("Réf. : {}", reference.trim())
}

/// Upper-cased title and optional italic subtitle.
pub fn title_block(title: &str, subtitle: Option<&str>) -> String {
    let mut html = format!(
        "<div class=\"caisse-title\">{}</div>\n",
        escape_html(&title.to_uppercase())
    );
    if let Some(sub) = subtitle.filter(|s| !s.trim().is_empty()) {
        html.push_str(&format!("<div class=\"caisse-subtitle\">{}</div>\n", escape_html(sub)));
    }
    html
}

fn row_style_css(style: &RowStyle) -> String {
    let mut css = format!(
        "background-color: {}; color: {};",
        Rgb::parse_or(&style.background, Rgb::WHITE).to_hex(),
        Rgb::parse_or(&style.text_color, Rgb::BLACK).to_hex()
    );
    if style.is_bold() {
        css.push_str(" font-weight: bold;");
    }
    if style.italic {
        css.push_str(" font-style: italic;");
    }
    if style.underline {
        css.push_str(" text-decoration: underline;");
    }
    css
}

/// The data table: header row, body rows with alternating background, totals.
pub fn table_block(table: &ReportTable, styles: &Styles) -> String {
    let header_style = row_style_css(&styles.row_style(RowKind::Header));
    let data_rule = styles.row_style(RowKind::Data);
    let mut alternate_rule = data_rule.clone();
    alternate_rule.background = styles.alternate_row_color.clone();
    let data_style = row_style_css(&data_rule);
    let alternate_style = row_style_css(&alternate_rule);
    let total_style = row_style_css(&styles.row_style(RowKind::Total));
    let widths = table.width_fractions();

    let mut html = String::from("<table class=\"caisse-table\">\n<thead>\n");
    html.push_str(&format!("<tr style=\"{header_style}\">\n"));
    for (col, width) in table.columns.iter().zip(&widths) {
        html.push_str(&format!(
            "    <th style=\"width: {:.1}%; text-align: center;\">{}</th>\n",
            width * 100.0,
            escape_html(&col.header)
        ));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for (i, row) in table.body.iter().enumerate() {
        let style = if i % 2 == 1 { &alternate_style } else { &data_style };
        push_row(&mut html, table, row, style);
    }
    if let Some(totals) = &table.totals {
        push_row(&mut html, table, totals, &total_style);
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn push_row(html: &mut String, table: &ReportTable, cells: &[Cell], style: &str) {
    html.push_str(&format!("<tr style=\"{style}\">\n"));
    for (col, cell) in table.columns.iter().zip(cells) {
        html.push_str(&format!(
            "    <td style=\"text-align: {};\">{}</td>\n",
            col.align.css(),
            escape_html(&cell.display)
        ));
    }
    html.push_str("</tr>\n");
}

/// Footer lines; `page_numbers` is the already-rendered "Page x sur n" markup.
pub fn footer_block(footer: &FooterConfig, page_numbers: Option<&str>) -> String {
    let mut html = String::from("<div class=\"caisse-footer\">\n");
    let classes = ["slogan", "address", "contact", "email"];
    for (class, line) in classes.iter().zip(footer.lines()) {
        if !line.trim().is_empty() {
            html.push_str(&format!("<p class=\"{class}\">{}</p>\n", escape_html(line)));
        }
    }
    if let (true, Some(pages)) = (footer.show_page_numbers, page_numbers) {
        html.push_str(&format!("<p class=\"pages\">{pages}</p>\n"));
    }
    html.push_str("</div>\n");
    html
}

/// Absolutely positioned watermark layer mirroring the PDF placement rules.
pub fn watermark_layer(config: &WatermarkConfig) -> String {
    // Percent coordinates; the grid is symmetric so top-down y is fine.
    let anchors = placements(config, 100.0, 100.0);

    let mut html = String::from("<div class=\"caisse-watermark\">\n");
    for Placement { x: left, y: top, rotation } in anchors {
        // CSS rotates clockwise, PDF counter-clockwise.
        let placement = format!(
            "left: {left:.2}%; top: {top:.2}%; transform: translate(-50%, -50%) rotate({:.1}deg);",
            -rotation
        );
        match config.watermark_type {
            WatermarkType::Text => {
                let color = Rgb::parse_or(&config.color, Rgb::BLACK).blend_toward_white(config.opacity);
                html.push_str(&format!(
                    "<div class=\"wm\" style=\"{placement} font-size: {:.0}pt; color: {};\">{}</div>\n",
                    config.font_size,
                    color.to_hex(),
                    escape_html(&config.text)
                ));
            }
            WatermarkType::Image => {
                if config.image_url.trim().is_empty() {
                    continue;
                }
                html.push_str(&format!(
                    "<img class=\"wm\" style=\"{placement} width: {:.0}%; opacity: {:.2};\" src=\"{}\" alt=\"\">\n",
                    config.image_size,
                    config.opacity / 100.0,
                    escape_html(&config.image_url)
                ));
            }
        }
    }
    html.push_str("</div>\n");
    html
}

/// "Généré le ..." line shared by the spreadsheet and HTML outputs.
pub fn generated_line(request: &ReportRequest) -> String {
    format!(
        "Généré le {}",
        request.generated_at.format("%d/%m/%Y à %H:%M")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::rows_from_json;
    use crate::template::{ReportType, Template, WatermarkPosition};
    use serde_json::json;

    #[test]
    fn test_generate_html_structure() {
        let html = generate_html("Test Page", "", "<p>Hello</p>");
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("<title>Test Page</title>"));
        assert!(html.contains("<p>Hello</p>"));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn test_generate_html_escapes_title() {
        let html = generate_html("<script>alert('xss')</script>", "", "body");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_header_block_order_and_reference() {
        let header = HeaderConfig {
            reference_number: "N° 42/DGD".into(),
            ..Default::default()
        };
        let html = header_block(&header, None);
        let p1 = html.find("class=\"l1\"").unwrap();
        let p4 = html.find("class=\"l4\"").unwrap();
        assert!(p1 < p4);
        assert!(html.contains("Réf. : N° 42/DGD"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_header_block_logo_only_when_enabled() {
        let mut header = HeaderConfig::default();
        assert!(header_block(&header, Some("logo.png")).contains("<img"));
        header.show_logo = false;
        assert!(!header_block(&header, Some("logo.png")).contains("<img"));
    }

    #[test]
    fn test_title_is_upper_case() {
        let html = title_block("Journal <des> recettes", Some("Janvier"));
        assert!(html.contains("JOURNAL &lt;DES&gt; RECETTES"));
        assert!(html.contains("caisse-subtitle"));
        assert!(!title_block("x", Some("  ")).contains("caisse-subtitle"));
    }

    #[test]
    fn test_headers_centred_cells_aligned() {
        let template = Template::from_preset(ReportType::Custom);
        let rows = rows_from_json(json!([{"libelle": "Timbres", "montant": 1000}])).unwrap();
        let table = ReportTable::build(&template, &rows, &crate::format::FormatLocale::default(), None);
        let html = table_block(&table, &template.styles);
        let headers: Vec<&str> = html.lines().filter(|l| l.contains("<th ")).collect();
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|l| l.contains("text-align: center;")));
        assert!(html.contains("<td style=\"text-align: right;\">1 000</td>"));
    }

    #[test]
    fn test_tiled_layer_has_twelve_instances() {
        let config = WatermarkConfig {
            enabled: true,
            position: WatermarkPosition::Tiled,
            text: "COPIE".into(),
            ..Default::default()
        };
        assert_eq!(watermark_layer(&config).matches(">COPIE<").count(), 12);
    }

    #[test]
    fn test_center_layer_is_not_rotated() {
        let config = WatermarkConfig {
            enabled: true,
            position: WatermarkPosition::Center,
            rotation: 30.0,
            ..Default::default()
        };
        assert!(watermark_layer(&config).contains("rotate(-0.0deg)") || watermark_layer(&config).contains("rotate(0.0deg)"));
    }

    #[test]
    fn test_font_stack() {
        assert!(font_stack("Times").contains("Times New Roman"));
        assert!(font_stack("helvetica").contains("Helvetica"));
    }
}
