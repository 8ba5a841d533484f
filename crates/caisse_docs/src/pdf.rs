//! PDF report generation.
//!
//! Builds PDF 1.4 files directly from content-stream operators using the
//! base-14 fonts, so no font files are required. Layout runs in passes:
//! letterhead and title on the first page, the table across as many pages
//! as it needs (header row repeated, totals appended as the last row), then
//! the watermark and the footer are drawn on every page once the page count
//! is known.

use anyhow::Result;
use tracing::debug;

use crate::color::Rgb;
use crate::fonts::{BASE_FONTS, Font, FontFamily, pdf_escape};
use crate::format::FormatLocale;
use crate::html::reference_line;
use crate::images::{ImageLoader, RasterImage, load_image};
use crate::report::ReportRequest;
use crate::table::{Cell, ReportTable, summary_row};
use crate::template::{
    Align, LogoPosition, RowKind, RowStyle, Styles, Template, WatermarkConfig, WatermarkType,
};
use crate::totals::SUBTOTAL_LABEL;
use crate::watermark::placements;

const MARGIN: f64 = 36.0;
const CELL_PADDING: f64 = 3.0;
const LINE_SPACING: f64 = 1.25;
const LOGO_HEIGHT: f64 = 48.0;

/// Render the report to PDF bytes.
pub fn generate_pdf_report(
    request: &ReportRequest,
    locale: &FormatLocale,
    loader: &dyn ImageLoader,
) -> Result<Vec<u8>> {
    let document = layout_pdf_report(request, locale, loader);
    Ok(document.build(&request.title))
}

/// Lay the report out into pages without serialising it.
pub fn layout_pdf_report(
    request: &ReportRequest,
    locale: &FormatLocale,
    loader: &dyn ImageLoader,
) -> PdfDocument {
    let template = &request.template;
    let (width, height) = template.orientation.a4_points();
    let mut layout = Layout::new(PdfDocument::new(width, height), &template.styles);

    let logo = request.logo_source().and_then(|src| load_image(loader, src));
    layout.draw_header(template, logo);
    layout.draw_title(&request.title, request.subtitle());

    let table = ReportTable::build(template, &request.rows, locale, None);
    layout.draw_table(template, &table, request, locale);

    let mut document = layout.finish();
    if let Some(wm) = template.effective_watermark() {
        draw_watermark(&mut document, &wm, loader);
    }
    draw_footers(&mut document, template);
    debug!(pages = document.page_count(), "PDF layout complete");
    document
}

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

/// Pages as content streams plus the images they reference.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub width: f64,
    pub height: f64,
    pub pages: Vec<String>,
    images: Vec<RasterImage>,
}

impl PdfDocument {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pages: vec![String::new()],
            images: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self) -> usize {
        self.pages.push(String::new());
        self.pages.len() - 1
    }

    /// Register an image XObject and return its resource name (`Im1`, ...).
    fn add_image(&mut self, image: RasterImage) -> String {
        self.images.push(image);
        format!("Im{}", self.images.len())
    }

    /// Serialise to a complete PDF file.
    pub fn build(&self, title: &str) -> Vec<u8> {
        let mut pdf: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::new();

        let font_base = 4;
        let image_base = font_base + BASE_FONTS.len();
        let page_base = image_base + self.images.len();
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| page_base + i * 2).collect();

        pdf.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");

        // Obj 1: Catalog
        offsets.push(pdf.len());
        pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        // Obj 2: Pages
        offsets.push(pdf.len());
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        pdf.extend_from_slice(
            format!(
                "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
                kids.join(" "),
                self.pages.len()
            )
            .as_bytes(),
        );

        // Obj 3: Info
        offsets.push(pdf.len());
        pdf.extend_from_slice(
            format!(
                "3 0 obj\n<< /Title ({}) /Producer (Caisse) >>\nendobj\n",
                pdf_escape(title)
            )
            .as_bytes(),
        );

        // Fonts
        for (i, base) in BASE_FONTS.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>\nendobj\n",
                    font_base + i
                )
                .as_bytes(),
            );
        }

        // Images
        for (i, image) in self.images.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Length {} >>\nstream\n",
                    image_base + i,
                    image.width,
                    image.height,
                    image.rgb.len()
                )
                .as_bytes(),
            );
            pdf.extend_from_slice(&image.rgb);
            pdf.extend_from_slice(b"\nendstream\nendobj\n");
        }

        // Shared resource dictionary
        let fonts: Vec<String> = (0..BASE_FONTS.len())
            .map(|i| format!("/F{} {} 0 R", i + 1, font_base + i))
            .collect();
        let xobjects: Vec<String> = (0..self.images.len())
            .map(|i| format!("/Im{} {} 0 R", i + 1, image_base + i))
            .collect();
        let resources = if xobjects.is_empty() {
            format!("<< /Font << {} >> >>", fonts.join(" "))
        } else {
            format!(
                "<< /Font << {} >> /XObject << {} >> >>",
                fonts.join(" "),
                xobjects.join(" ")
            )
        };

        // Pages and their content streams
        for (content, page_id) in self.pages.iter().zip(&page_ids) {
            offsets.push(pdf.len());
            pdf.extend_from_slice(
                format!(
                    "{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources {resources} >>\nendobj\n",
                    self.width,
                    self.height,
                    page_id + 1
                )
                .as_bytes(),
            );

            offsets.push(pdf.len());
            pdf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Length {} >>\nstream\n{content}\nendstream\nendobj\n",
                    page_id + 1,
                    content.len()
                )
                .as_bytes(),
            );
        }

        // Cross-reference table
        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1; // +1 for free entry
        let mut xref = format!("xref\n0 {num_objects}\n0000000000 65535 f \n");
        for offset in &offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {num_objects} /Root 1 0 R /Info 3 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }
}

// ---------------------------------------------------------------------------
// Drawing primitives
// ---------------------------------------------------------------------------

fn fill_rect(out: &mut String, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
    out.push_str(&format!(
        "{} rg\n{x:.2} {y:.2} {w:.2} {h:.2} re f\n",
        color.pdf_operands()
    ));
}

fn stroke_rect(out: &mut String, x: f64, y: f64, w: f64, h: f64, color: Rgb, line_width: f64) {
    out.push_str(&format!(
        "{} RG\n{line_width:.2} w\n{x:.2} {y:.2} {w:.2} {h:.2} re S\n",
        color.pdf_operands()
    ));
}

fn line(out: &mut String, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgb, line_width: f64) {
    out.push_str(&format!(
        "{} RG\n{line_width:.2} w\n{x1:.2} {y1:.2} m {x2:.2} {y2:.2} l S\n",
        color.pdf_operands()
    ));
}

fn text(out: &mut String, font: Font, size: f64, color: Rgb, x: f64, y: f64, s: &str) {
    if s.is_empty() {
        return;
    }
    out.push_str(&format!(
        "BT\n/{} {size:.1} Tf\n{} rg\n{x:.2} {y:.2} Td\n({}) Tj\nET\n",
        font.resource(),
        color.pdf_operands(),
        pdf_escape(s)
    ));
}

/// Text placed inside `[left, left + width]` according to `align`.
#[allow(clippy::too_many_arguments)]
fn text_aligned(
    out: &mut String,
    font: Font,
    size: f64,
    color: Rgb,
    left: f64,
    width: f64,
    y: f64,
    align: Align,
    s: &str,
) {
    let w = font.text_width(s, size);
    let x = match align {
        Align::Left => left,
        Align::Center => left + (width - w) / 2.0,
        Align::Right => left + width - w,
    };
    text(out, font, size, color, x, y, s);
}

fn draw_image(out: &mut String, name: &str, x: f64, y: f64, w: f64, h: f64) {
    out.push_str(&format!("q\n{w:.2} 0 0 {h:.2} {x:.2} {y:.2} cm\n/{name} Do\nQ\n"));
}

/// Greedy word wrap to `max_width`; a single word wider than the column is
/// kept whole.
fn wrap_text(s: &str, font: Font, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in s.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if current.is_empty() || font.text_width(&candidate, size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

// ---------------------------------------------------------------------------
// Page layout
// ---------------------------------------------------------------------------

struct Layout<'a> {
    doc: PdfDocument,
    styles: &'a Styles,
    title_family: FontFamily,
    body_family: FontFamily,
    page: usize,
    /// Current baseline cursor, measured from the page bottom.
    y: f64,
}

/// One table row ready to draw.
struct RowSpec<'c> {
    cells: Vec<&'c str>,
    style: RowStyle,
}

impl<'a> Layout<'a> {
    fn new(doc: PdfDocument, styles: &'a Styles) -> Self {
        let y = doc.height - MARGIN;
        Self {
            doc,
            styles,
            title_family: FontFamily::from_name(&styles.title_font),
            body_family: FontFamily::from_name(&styles.body_font),
            page: 0,
            y,
        }
    }

    fn finish(self) -> PdfDocument {
        self.doc
    }

    fn out(&mut self) -> &mut String {
        &mut self.doc.pages[self.page]
    }

    fn content_width(&self) -> f64 {
        self.doc.width - 2.0 * MARGIN
    }

    fn new_page(&mut self) {
        self.page = self.doc.add_page();
        self.y = self.doc.height - MARGIN;
        debug!(page = self.page + 1, "PDF page break");
    }

    fn draw_header(&mut self, template: &Template, logo: Option<RasterImage>) {
        let header = &template.header;
        if let Some(logo) = logo {
            let h = LOGO_HEIGHT;
            let w = (h / logo.aspect()).min(self.content_width() / 3.0);
            let x = match header.logo_position {
                LogoPosition::Left => MARGIN,
                LogoPosition::Center => (self.doc.width - w) / 2.0,
                LogoPosition::Right => self.doc.width - MARGIN - w,
            };
            let name = self.doc.add_image(logo);
            let y = self.y - h;
            draw_image(self.out(), &name, x, y, w, h);
            self.y -= h + 6.0;
        }

        let size = self.styles.body_font_size + 1.0;
        let faces = [(false, true), (true, false), (true, false), (true, true)];
        let width = self.content_width();
        for (line_text, (bold, italic)) in header.lines().into_iter().zip(faces) {
            if line_text.trim().is_empty() {
                continue;
            }
            self.y -= size * LINE_SPACING;
            let font = Font::new(self.body_family, bold, italic);
            let y = self.y;
            text_aligned(self.out(), font, size, Rgb::BLACK, MARGIN, width, y, Align::Center, line_text);
        }
        if !header.reference_number.trim().is_empty() {
            self.y -= size * LINE_SPACING + 2.0;
            let y = self.y;
            let font = Font::regular(self.body_family);
            text(self.out(), font, size - 1.0, Rgb::BLACK, MARGIN, y, &reference_line(&header.reference_number));
        }

        self.y -= 8.0;
        let accent = Rgb::parse_or(&self.styles.accent_color, Rgb::BLACK);
        let (y, right) = (self.y, self.doc.width - MARGIN);
        line(self.out(), MARGIN, y, right, y, accent, 1.5);
        self.y -= 10.0;
    }

    fn draw_title(&mut self, title: &str, subtitle: Option<&str>) {
        let size = self.styles.title_font_size;
        let font = Font::new(self.title_family, true, false);
        let upper = title.to_uppercase();
        let w = font.text_width(&upper, size);
        let x = (self.doc.width - w) / 2.0;
        self.y -= size;
        let y = self.y;
        text(self.out(), font, size, Rgb::BLACK, x, y, &upper);
        line(self.out(), x, y - 2.0, x + w, y - 2.0, Rgb::BLACK, 0.8);
        self.y -= 6.0;

        if let Some(sub) = subtitle {
            let size = self.styles.body_font_size + 1.0;
            self.y -= size * LINE_SPACING;
            let y = self.y;
            let width = self.content_width();
            let font = Font::new(self.body_family, false, true);
            text_aligned(self.out(), font, size, Rgb::BLACK, MARGIN, width, y, Align::Center, sub);
        }
        self.y -= 10.0;
    }

    fn draw_table(&mut self, template: &Template, table: &ReportTable, request: &ReportRequest, locale: &FormatLocale) {
        if table.columns.is_empty() {
            return;
        }
        let widths: Vec<f64> = table
            .width_fractions()
            .iter()
            .map(|f| f * self.content_width())
            .collect();
        let bottom = MARGIN + footer_height(template);

        let header = RowSpec {
            cells: table.header_labels(),
            style: self.styles.row_style(RowKind::Header),
        };
        let data_style = self.styles.row_style(RowKind::Data);
        let mut alternate_style = data_style.clone();
        alternate_style.background = self.styles.alternate_row_color.clone();
        let subtotal_style = self.styles.row_style(RowKind::Subtotal);

        self.draw_row(table, &widths, &header, true);

        let mut page_start = 0;
        let mut rows_on_page = 0;
        let mut body: Vec<(RowSpec, Option<usize>)> = table
            .body
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                let style = if i % 2 == 1 { alternate_style.clone() } else { data_style.clone() };
                (row_spec(cells, style), Some(i))
            })
            .collect();
        if let Some(totals) = &table.totals {
            body.push((row_spec(totals, self.styles.row_style(RowKind::Total)), None));
        }

        for (spec, index) in &body {
            let height = self.row_height(table, &widths, spec);
            let reserve = if template.show_subtotals {
                self.single_line_row_height()
            } else {
                0.0
            };
            if rows_on_page > 0 && self.y - height < bottom + reserve {
                if template.show_subtotals {
                    let page_rows = &request.rows[page_start..page_start + rows_on_page];
                    let cells = summary_row(SUBTOTAL_LABEL, &table.columns, page_rows, &template.columns, locale);
                    let subtotal = row_spec(&cells, subtotal_style.clone());
                    self.draw_row(table, &widths, &subtotal, false);
                }
                self.new_page();
                self.draw_row(table, &widths, &header, true);
                page_start += rows_on_page;
                rows_on_page = 0;
            }

            // A row taller than what is left of an otherwise empty page is
            // split line by line, the header repeated above each piece.
            let mut lines = self.row_lines(table, &widths, spec);
            loop {
                let capacity = self.line_capacity(bottom + reserve);
                if lines.iter().map(Vec::len).max().unwrap_or(0) <= capacity {
                    break;
                }
                let piece: Vec<Vec<String>> = lines
                    .iter_mut()
                    .map(|cell| cell.drain(..capacity.min(cell.len())).collect())
                    .collect();
                debug!(lines = capacity, "Splitting table row across pages");
                self.draw_lines(table, &widths, &piece, &spec.style, false);
                self.new_page();
                self.draw_row(table, &widths, &header, true);
            }
            self.draw_lines(table, &widths, &lines, &spec.style, false);
            if index.is_some() {
                rows_on_page += 1;
            }
        }
    }

    /// Text lines that fit between the cursor and `floor`, never less than one.
    fn line_capacity(&self, floor: f64) -> usize {
        let line_height = self.styles.body_font_size * LINE_SPACING;
        let available = self.y - floor - 2.0 * CELL_PADDING;
        ((available / line_height).floor() as usize).max(1)
    }

    fn single_line_row_height(&self) -> f64 {
        self.styles.body_font_size * LINE_SPACING + 2.0 * CELL_PADDING
    }

    fn row_font(&self, style: &RowStyle) -> Font {
        Font::new(self.body_family, style.is_bold(), style.italic)
    }

    fn cell_lines(&self, table: &ReportTable, widths: &[f64], spec: &RowSpec, i: usize) -> Vec<String> {
        let size = self.styles.body_font_size;
        let font = self.row_font(&spec.style);
        let text = spec.cells.get(i).copied().unwrap_or("");
        if table.columns[i].column_type.is_numeric() {
            vec![text.to_string()]
        } else {
            wrap_text(text, font, size, widths[i] - 2.0 * CELL_PADDING)
        }
    }

    fn row_lines(&self, table: &ReportTable, widths: &[f64], spec: &RowSpec) -> Vec<Vec<String>> {
        (0..table.columns.len())
            .map(|i| self.cell_lines(table, widths, spec, i))
            .collect()
    }

    fn lines_height(&self, lines: &[Vec<String>]) -> f64 {
        let count = lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
        count as f64 * self.styles.body_font_size * LINE_SPACING + 2.0 * CELL_PADDING
    }

    fn row_height(&self, table: &ReportTable, widths: &[f64], spec: &RowSpec) -> f64 {
        self.lines_height(&self.row_lines(table, widths, spec))
    }

    fn draw_row(&mut self, table: &ReportTable, widths: &[f64], spec: &RowSpec, is_header: bool) {
        let lines = self.row_lines(table, widths, spec);
        self.draw_lines(table, widths, &lines, &spec.style, is_header);
    }

    fn draw_lines(
        &mut self,
        table: &ReportTable,
        widths: &[f64],
        lines: &[Vec<String>],
        style: &RowStyle,
        is_header: bool,
    ) {
        let size = self.styles.body_font_size;
        let height = self.lines_height(lines);
        let font = self.row_font(style);
        let background = Rgb::parse_or(&style.background, Rgb::WHITE);
        let color = Rgb::parse_or(&style.text_color, Rgb::BLACK);
        let border = Rgb::parse_or(&self.styles.border_color, Rgb::BLACK);
        let top = self.y;
        let bottom = top - height;

        let mut x = MARGIN;
        for (i, col) in table.columns.iter().enumerate() {
            let w = widths[i];
            let out = &mut self.doc.pages[self.page];
            if background != Rgb::WHITE {
                fill_rect(out, x, bottom, w, height, background);
            }
            stroke_rect(out, x, bottom, w, height, border, 0.5);
            // Header labels are centred over numeric columns too.
            let align = if is_header { Align::Center } else { col.align };
            for (n, line_text) in lines[i].iter().enumerate() {
                let baseline = top - CELL_PADDING - size * (n as f64 + 1.0) * LINE_SPACING + size * 0.25;
                text_aligned(out, font, size, color, x + CELL_PADDING, w - 2.0 * CELL_PADDING, baseline, align, line_text);
                if style.underline && !line_text.is_empty() {
                    let lw = font.text_width(line_text, size);
                    let lx = match align {
                        Align::Left => x + CELL_PADDING,
                        Align::Center => x + (w - lw) / 2.0,
                        Align::Right => x + w - CELL_PADDING - lw,
                    };
                    line(out, lx, baseline - 1.5, lx + lw, baseline - 1.5, color, 0.5);
                }
            }
            x += w;
        }
        self.y = bottom;
    }
}

fn row_spec(cells: &[Cell], style: RowStyle) -> RowSpec<'_> {
    RowSpec {
        cells: cells.iter().map(|c| c.display.as_str()).collect(),
        style,
    }
}

// ---------------------------------------------------------------------------
// Per-page passes
// ---------------------------------------------------------------------------

fn footer_font_sizes(styles: &Styles) -> (f64, f64) {
    let size = (styles.body_font_size - 1.0).max(6.0);
    (size, (size - 1.0).max(5.0))
}

/// Vertical space reserved at the bottom of every page for the footer.
fn footer_height(template: &Template) -> f64 {
    let (size, small) = footer_font_sizes(&template.styles);
    let mut h = 8.0;
    for (i, l) in template.footer.lines().iter().enumerate() {
        if !l.trim().is_empty() {
            h += (if i == 3 { small } else { size }) * LINE_SPACING;
        }
    }
    if template.footer.show_page_numbers {
        h += small * LINE_SPACING + 4.0;
    }
    h + 6.0
}

/// Footer lines and "Page x sur n" on every page.
fn draw_footers(doc: &mut PdfDocument, template: &Template) {
    let footer = &template.footer;
    let styles = &template.styles;
    let family = FontFamily::from_name(&styles.body_font);
    let (size, small) = footer_font_sizes(styles);
    let border = Rgb::parse_or(&styles.border_color, Rgb::BLACK);
    let width = doc.width - 2.0 * MARGIN;
    let total = doc.pages.len();
    let top = MARGIN + footer_height(template) - 6.0;

    let faces = [
        (Font::new(family, false, true), size),
        (Font::regular(family), size),
        (Font::regular(family), size),
        (Font::regular(family), small),
    ];

    for (i, out) in doc.pages.iter_mut().enumerate() {
        line(out, MARGIN, top, MARGIN + width, top, border, 0.5);
        let mut y = top;
        for (line_text, (font, sz)) in footer.lines().into_iter().zip(faces) {
            if line_text.trim().is_empty() {
                continue;
            }
            y -= sz * LINE_SPACING;
            text_aligned(out, font, sz, Rgb::BLACK, MARGIN, width, y, Align::Center, line_text);
        }
        if footer.show_page_numbers {
            y -= 4.0;
            let rule = width / 4.0;
            line(out, MARGIN + (width - rule) / 2.0, y, MARGIN + (width + rule) / 2.0, y, border, 0.3);
            y -= small * LINE_SPACING;
            let label = format!("Page {} sur {}", i + 1, total);
            text_aligned(out, Font::regular(family), small, Rgb::BLACK, MARGIN, width, y, Align::Center, &label);
        }
    }
}

/// Watermark on every page, each instance inside its own `q`/`Q` pair so the
/// graphics state after it is untouched.
fn draw_watermark(doc: &mut PdfDocument, config: &WatermarkConfig, loader: &dyn ImageLoader) {
    let instances = placements(config, doc.width, doc.height);
    match config.watermark_type {
        WatermarkType::Text => {
            if config.text.trim().is_empty() {
                return;
            }
            let font = Font::new(FontFamily::Helvetica, true, false);
            let size = config.font_size;
            let w = font.text_width(&config.text, size);
            let color = Rgb::parse_or(&config.color, Rgb::BLACK).blend_toward_white(config.opacity);
            let escaped = pdf_escape(&config.text);
            for out in doc.pages.iter_mut() {
                for p in &instances {
                    let (sin, cos) = p.rotation.to_radians().sin_cos();
                    out.push_str(&format!(
                        "q\n{} rg\n{cos:.4} {sin:.4} {:.4} {cos:.4} {:.2} {:.2} cm\nBT\n/{} {size:.1} Tf\n{:.2} {:.2} Td\n({escaped}) Tj\nET\nQ\n",
                        color.pdf_operands(),
                        -sin,
                        p.x,
                        p.y,
                        font.resource(),
                        -w / 2.0,
                        -size * 0.35,
                    ));
                }
            }
        }
        WatermarkType::Image => {
            let Some(image) = load_image(loader, &config.image_url) else {
                return;
            };
            let w = doc.width * config.image_size / 100.0;
            let h = w * image.aspect();
            let name = doc.add_image(image.faded(config.opacity));
            for out in doc.pages.iter_mut() {
                for p in &instances {
                    let (sin, cos) = p.rotation.to_radians().sin_cos();
                    out.push_str(&format!(
                        "q\n{cos:.4} {sin:.4} {:.4} {cos:.4} {:.2} {:.2} cm\n{w:.2} 0 0 {h:.2} {:.2} {:.2} cm\n/{name} Do\nQ\n",
                        -sin,
                        p.x,
                        p.y,
                        -w / 2.0,
                        -h / 2.0,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::rows_from_json;
    use crate::images::DefaultImageLoader;
    use crate::images::tests::png_data_url;
    use crate::template::{ReportType, WatermarkPosition};
    use serde_json::json;

    fn request(rows: usize) -> ReportRequest {
        let data: Vec<serde_json::Value> = (0..rows)
            .map(|i| json!({"libelle": format!("Ligne {i}"), "montant": 1000 + i}))
            .collect();
        let mut template = Template::from_preset(ReportType::Custom);
        template.show_totals = true;
        ReportRequest::new(template, rows_from_json(json!(data)).unwrap(), "Journal des recettes")
    }

    fn layout(req: &ReportRequest) -> PdfDocument {
        layout_pdf_report(req, &FormatLocale::default(), &DefaultImageLoader::default())
    }

    #[test]
    fn test_generate_pdf_report_basic() {
        let bytes = generate_pdf_report(&request(3), &FormatLocale::default(), &DefaultImageLoader::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 1"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
    }

    #[test]
    fn test_title_upper_case_and_cells() {
        let doc = layout(&request(2));
        let page = &doc.pages[0];
        assert!(page.contains("(JOURNAL DES RECETTES) Tj"));
        assert!(page.contains("(1 000) Tj"));
        assert!(page.contains("(1 001) Tj"));
        assert!(page.contains("(TOTAL) Tj"));
        assert!(page.contains("(2 001) Tj"));
    }

    #[test]
    fn test_long_table_paginates_with_repeated_header() {
        let doc = layout(&request(120));
        assert!(doc.page_count() > 1);
        for page in &doc.pages {
            assert!(page.contains("(Libell\\351) Tj"));
        }
        let last = doc.pages.last().unwrap();
        assert!(last.contains("(TOTAL) Tj"));
        let n = doc.page_count();
        assert!(last.contains(&format!("(Page {n} sur {n}) Tj")));
        assert!(doc.pages[0].contains(&format!("(Page 1 sur {n}) Tj")));
    }

    #[test]
    fn test_page_subtotals() {
        let mut req = request(120);
        req.template.show_subtotals = true;
        let doc = layout(&req);
        let pages = doc.page_count();
        assert!(pages > 1);
        for page in &doc.pages[..pages - 1] {
            assert!(page.contains("(SOUS-TOTAL) Tj"));
        }
        assert!(!doc.pages[pages - 1].contains("(SOUS-TOTAL) Tj"));
    }

    #[test]
    fn test_orientation_drives_media_box() {
        let mut req = request(1);
        req.template.orientation = crate::template::Orientation::Landscape;
        let doc = layout(&req);
        assert!(doc.width > doc.height);
        let text = String::from_utf8_lossy(&doc.build("x")).to_string();
        assert!(text.contains("/MediaBox [0 0 841.89 595.28]"));
    }

    #[test]
    fn test_watermark_on_every_page_with_saved_state() {
        let mut req = request(120);
        req.template.watermark_config = Some(WatermarkConfig {
            enabled: true,
            text: "COPIE".into(),
            position: WatermarkPosition::Diagonal,
            ..Default::default()
        });
        let doc = layout(&req);
        for page in &doc.pages {
            assert_eq!(page.matches("(COPIE) Tj").count(), 1);
            let wm = page.find("(COPIE) Tj").unwrap();
            let q = page[..wm].rfind("q\n").unwrap();
            let restore = page[wm..].find("Q\n").unwrap();
            assert!(q < wm && restore > 0);
        }
    }

    #[test]
    fn test_tiled_watermark_without_rows() {
        let mut req = request(0);
        req.template.watermark_config = Some(WatermarkConfig {
            enabled: true,
            text: "ANNULE".into(),
            position: WatermarkPosition::Tiled,
            ..Default::default()
        });
        let doc = layout(&req);
        assert_eq!(doc.pages[0].matches("(ANNULE) Tj").count(), 12);
    }

    #[test]
    fn test_image_watermark_and_logo() {
        let mut req = request(1).with_logo(png_data_url(20, 10));
        req.template.watermark_config = Some(WatermarkConfig {
            enabled: true,
            watermark_type: WatermarkType::Image,
            image_url: png_data_url(8, 8),
            position: WatermarkPosition::Center,
            ..Default::default()
        });
        let doc = layout(&req);
        assert!(doc.pages[0].contains("/Im1 Do"));
        assert!(doc.pages[0].contains("/Im2 Do"));
        let text = String::from_utf8_lossy(&doc.build("x")).to_string();
        assert!(text.contains("/Subtype /Image /Width 20 /Height 10"));
    }

    #[test]
    fn test_broken_logo_is_skipped() {
        let req = request(1).with_logo("data:image/png;base64,AAAA");
        let doc = layout(&req);
        assert!(!doc.pages[0].contains(" Do\n"));
        assert!(doc.pages[0].contains("(1 000) Tj"));
    }

    #[test]
    fn test_no_page_numbers_when_disabled() {
        let mut req = request(1);
        req.template.footer.show_page_numbers = false;
        let doc = layout(&req);
        assert!(!doc.pages[0].contains("sur 1) Tj"));
    }

    #[test]
    fn test_alternate_rows_are_shaded() {
        let req = request(2);
        let doc = layout(&req);
        let shade = Rgb::parse_or(&req.template.styles.alternate_row_color, Rgb::WHITE).pdf_operands();
        assert!(doc.pages[0].contains(&format!("{shade} rg")));
    }

    #[test]
    fn test_tall_row_is_split_across_pages() {
        let libelle: Vec<String> = (0..120).map(|i| format!("Ligne {i}")).collect();
        let rows = rows_from_json(json!([{"libelle": libelle.join("\n"), "montant": 5}])).unwrap();
        let mut template = Template::from_preset(ReportType::Custom);
        template.watermark = None;
        template.watermark_config = None;
        let doc = layout(&ReportRequest::new(template, rows, "Recettes"));

        assert!(doc.page_count() > 1);
        for page in &doc.pages {
            assert!(page.contains("(Libell\\351) Tj"));
            for op in page.lines().filter(|l| l.ends_with(" Td")) {
                let y: f64 = op.split_whitespace().nth(1).unwrap().parse().unwrap();
                assert!(y >= MARGIN, "text drawn below the margin at y={y}");
            }
        }
        let all = doc.pages.concat();
        assert!(all.contains("(Ligne 0) Tj"));
        assert!(all.contains("(Ligne 119) Tj"));
    }

    #[test]
    fn test_wrap_text() {
        let font = Font::regular(FontFamily::Helvetica);
        let lines = wrap_text("un deux trois quatre", font, 10.0, 40.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "un deux trois quatre");
        assert_eq!(wrap_text("", font, 10.0, 40.0), vec![String::new()]);
    }
}
