//! Word export as a `.doc`-typed HTML document.
//!
//! Word processors open HTML carrying the Office namespaces as a native
//! document, honouring `@page` for size and orientation. The raster logo is
//! not embedded; the watermark is carried as an absolutely positioned layer
//! with the same placement rules as the PDF.

use crate::format::FormatLocale;
use crate::html::{
    escape_html, font_stack, footer_block, generated_line, header_block, report_css, table_block, title_block,
    watermark_layer,
};
use crate::report::ReportRequest;
use crate::table::ReportTable;
use crate::template::Orientation;

/// Page number fields resolved by the word processor. The field code is only
/// recognised in its quoted form.
const PAGE_FIELDS: &str = "Page <span style='mso-field-code:\" PAGE \"'>1</span> sur \
                           <span style='mso-field-code:\" NUMPAGES \"'>1</span>";

/// Render the report as Word-compatible HTML.
pub fn generate_word_report(request: &ReportRequest, locale: &FormatLocale) -> String {
    let template = &request.template;
    let table = ReportTable::build(template, &request.rows, locale, None);
    let orientation = match template.orientation {
        Orientation::Portrait => "portrait",
        Orientation::Landscape => "landscape",
    };

    let mut body = String::from("<div class=\"Section1\" style=\"position: relative;\">\n");
    if let Some(wm) = template.effective_watermark() {
        body.push_str(&watermark_layer(&wm));
    }
    body.push_str(&header_block(&template.header, None));
    body.push_str(&title_block(&request.title, request.subtitle()));
    body.push_str(&format!(
        "<p class=\"caisse-generated\">{}</p>\n",
        escape_html(&generated_line(request))
    ));
    body.push_str(&table_block(&table, &template.styles));
    body.push_str(&footer_block(&template.footer, Some(PAGE_FIELDS)));
    body.push_str("</div>\n");

    format!(
        r#"<html xmlns:o="urn:schemas-microsoft-com:office:office" xmlns:w="urn:schemas-microsoft-com:office:word" xmlns="http://www.w3.org/TR/REC-html40">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <!--[if gte mso 9]><xml><w:WordDocument><w:View>Print</w:View><w:Zoom>100</w:Zoom></w:WordDocument></xml><![endif]-->
    <style>
        @page Section1 {{ size: {size}; mso-page-orientation: {orientation}; margin: 1.5cm; }}
        div.Section1 {{ page: Section1; }}
        body {{ font-family: {body_font}; font-size: {body_size}pt; }}
        .caisse-generated {{ text-align: center; font-style: italic; font-size: {small}pt; margin: 0 0 8pt 0; }}
{css}
    </style>
</head>
<body>
{body}</body>
</html>"#,
        title = escape_html(&request.title),
        size = template.orientation.css_page_size(),
        body_font = font_stack(&template.styles.body_font),
        body_size = template.styles.body_font_size,
        small = (template.styles.body_font_size - 1.0).max(6.0),
        css = report_css(&template.styles),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::rows_from_json;
    use crate::template::{ReportType, Template, WatermarkConfig};
    use serde_json::json;

    fn request() -> ReportRequest {
        let rows = rows_from_json(json!([
            {"libelle": "Timbres", "montant": 1000},
            {"libelle": "Amende", "montant": 20},
        ]))
        .unwrap();
        let mut template = Template::from_preset(ReportType::Custom);
        template.show_totals = true;
        ReportRequest::new(template, rows, "Journal des recettes").with_logo("logo.png")
    }

    #[test]
    fn test_word_namespaces_and_page() {
        let doc = generate_word_report(&request(), &FormatLocale::default());
        assert!(doc.starts_with("<html xmlns:o="));
        assert!(doc.contains("xmlns:w=\"urn:schemas-microsoft-com:office:word\""));
        assert!(doc.contains("mso-page-orientation: portrait"));
        assert!(doc.contains("size: 21cm 29.7cm;"));
    }

    #[test]
    fn test_word_content_matches_other_outputs() {
        let doc = generate_word_report(&request(), &FormatLocale::default());
        assert!(doc.contains(">1 000<"));
        assert!(doc.contains(">TOTAL<"));
        assert!(doc.contains(">1 020<"));
        assert!(doc.contains("JOURNAL DES RECETTES"));
    }

    #[test]
    fn test_page_number_fields_are_quoted() {
        let doc = generate_word_report(&request(), &FormatLocale::default());
        assert!(doc.contains("<span style='mso-field-code:\" PAGE \"'>1</span>"));
        assert!(doc.contains("<span style='mso-field-code:\" NUMPAGES \"'>1</span>"));
    }

    #[test]
    fn test_word_skips_logo() {
        let doc = generate_word_report(&request(), &FormatLocale::default());
        assert!(!doc.contains("<img class=\"caisse-logo\""));
    }

    #[test]
    fn test_word_landscape_and_watermark() {
        let mut req = request();
        req.template.orientation = Orientation::Landscape;
        req.template.watermark_config = Some(WatermarkConfig {
            enabled: true,
            text: "DUPLICATA".into(),
            ..Default::default()
        });
        let doc = generate_word_report(&req, &FormatLocale::default());
        assert!(doc.contains("mso-page-orientation: landscape"));
        assert!(doc.contains(">DUPLICATA<"));
    }
}
