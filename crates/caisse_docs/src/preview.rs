//! On-screen preview.
//!
//! Produces the same blocks as the exported documents, laid out on a single
//! page-sized sheet so the editor can show what the PDF will look like.

use crate::format::FormatLocale;
use crate::html::{
    escape_html, footer_block, generate_html, header_block, report_css, table_block, title_block,
    watermark_layer,
};
use crate::report::ReportRequest;
use crate::table::ReportTable;
use crate::template::Orientation;

/// Rows shown by the editor preview when the caller does not say otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Render the preview fragment. `max_rows` truncates the dataset (totals are
/// computed over the shown rows); `None` shows everything.
pub fn render_preview(request: &ReportRequest, locale: &FormatLocale, max_rows: Option<usize>) -> String {
    let template = &request.template;
    let table = ReportTable::build(template, &request.rows, locale, max_rows);
    let (width, height) = match template.orientation {
        Orientation::Portrait => ("21cm", "29.7cm"),
        Orientation::Landscape => ("29.7cm", "21cm"),
    };

    let mut html = format!(
        "<div class=\"caisse-page\" style=\"position: relative; width: {width}; min-height: {height}; \
         padding: 1.5cm; box-sizing: border-box; background: #ffffff; overflow: hidden;\">\n"
    );
    if let Some(wm) = template.effective_watermark() {
        html.push_str(&watermark_layer(&wm));
    }
    html.push_str("<div class=\"caisse-content\" style=\"position: relative;\">\n");
    html.push_str(&header_block(&template.header, request.logo_source()));
    html.push_str(&title_block(&request.title, request.subtitle()));
    html.push_str(&table_block(&table, &template.styles));
    if max_rows.is_some_and(|n| n < request.rows.len()) {
        html.push_str(&format!(
            "<p class=\"caisse-truncated\" style=\"font-style: italic; color: #777777;\">{}</p>\n",
            escape_html(&format!(
                "Aperçu limité à {} lignes sur {}",
                table.body.len(),
                request.rows.len()
            ))
        ));
    }
    html.push_str(&footer_block(&template.footer, Some("Page 1 sur 1")));
    html.push_str("</div>\n</div>\n");
    html
}

/// Standalone HTML page wrapping [`render_preview`].
pub fn render_preview_document(request: &ReportRequest, locale: &FormatLocale, max_rows: Option<usize>) -> String {
    let css = format!(
        "        body {{ background: #e5e7eb; margin: 0; padding: 1rem; }}\n{}",
        report_css(&request.template.styles)
    );
    generate_html(&request.title, &css, &render_preview(request, locale, max_rows))
}
