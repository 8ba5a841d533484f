use anyhow::Result;
use docx_rs::*;
use std::io::Cursor;

use crate::color::Rgb;
use crate::format::FormatLocale;
use crate::html::{generated_line, reference_line};
use crate::report::ReportRequest;
use crate::table::{Cell, ReportTable};
use crate::template::{Align, Orientation, RowKind, RowStyle, Styles};

/// A4 in twentieths of a point.
const A4_SHORT_TWIPS: u32 = 11_906;
const A4_LONG_TWIPS: u32 = 16_838;
/// Usable width between the default margins, in twips.
const MARGIN_TWIPS: u32 = 1_440;

/// Render the report as a native `.docx` document.
///
/// Same blocks as the other outputs: letterhead lines, upper-cased title,
/// the table with alternating rows and totals, then the footer lines in the
/// page footer.
pub fn generate_docx_report(request: &ReportRequest, locale: &FormatLocale) -> Result<Vec<u8>> {
    let template = &request.template;
    let styles = &template.styles;
    let table = ReportTable::build(template, &request.rows, locale, None);
    let body_size = half_points(styles.body_font_size);

    let (width, height, orient) = match template.orientation {
        Orientation::Portrait => (A4_SHORT_TWIPS, A4_LONG_TWIPS, PageOrientationType::Portrait),
        Orientation::Landscape => (A4_LONG_TWIPS, A4_SHORT_TWIPS, PageOrientationType::Landscape),
    };
    let mut docx = Docx::new().page_size(width, height).page_orient(orient);

    // Letterhead -- italic / bold / bold / bold-italic
    let faces = [(false, true), (true, false), (true, false), (true, true)];
    for (line, (bold, italic)) in template.header.lines().into_iter().zip(faces) {
        if line.trim().is_empty() {
            continue;
        }
        docx = docx.add_paragraph(centered(styled_run(line, body_size + 2, bold, italic)));
    }
    if !template.header.reference_number.trim().is_empty() {
        let run = Run::new()
            .add_text(reference_line(&template.header.reference_number))
            .size(body_size);
        docx = docx.add_paragraph(Paragraph::new().add_run(run));
    }
    docx = docx.add_paragraph(Paragraph::new());

    // Title block
    let title_run = Run::new()
        .add_text(request.title.to_uppercase())
        .bold()
        .underline("single")
        .size(half_points(styles.title_font_size));
    docx = docx.add_paragraph(centered(title_run));
    if let Some(subtitle) = request.subtitle() {
        docx = docx.add_paragraph(centered(styled_run(subtitle, body_size + 2, false, true)));
    }
    docx = docx.add_paragraph(centered(styled_run(&generated_line(request), body_size, false, true)));
    docx = docx.add_paragraph(Paragraph::new());

    // Table
    if !table.columns.is_empty() {
        docx = docx.add_table(build_table(&table, styles, width - 2 * MARGIN_TWIPS));
    }

    // Footer
    let footer_sizes = [body_size, body_size, body_size, body_size.saturating_sub(2)];
    let mut footer = Footer::new();
    for (i, (line, size)) in template.footer.lines().into_iter().zip(footer_sizes).enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        footer = footer.add_paragraph(centered(styled_run(line, size, false, i == 0)));
    }
    docx = docx.footer(footer);

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to pack DOCX: {}", e))?;

    Ok(buf.into_inner())
}

fn build_table(table: &ReportTable, styles: &Styles, usable_width: u32) -> Table {
    let size = half_points(styles.body_font_size);
    let grid: Vec<usize> = table
        .width_fractions()
        .iter()
        .map(|f| (f * f64::from(usable_width)).round() as usize)
        .collect();

    let mut table_rows = Vec::new();

    // Header row
    let header_style = styles.row_style(RowKind::Header);
    let header_cells: Vec<TableCell> = table
        .columns
        .iter()
        .map(|col| styled_cell(&col.header, &header_style, None, Align::Center, size))
        .collect();
    table_rows.push(TableRow::new(header_cells));

    // Data rows
    let data_style = styles.row_style(RowKind::Data);
    for (i, row) in table.body.iter().enumerate() {
        let background = (i % 2 == 1).then_some(styles.alternate_row_color.as_str());
        table_rows.push(row_of(table, row, &data_style, background, size));
    }
    if let Some(totals) = &table.totals {
        let total_style = styles.row_style(RowKind::Total);
        table_rows.push(row_of(table, totals, &total_style, None, size));
    }

    Table::new(table_rows).set_grid(grid)
}

fn row_of(table: &ReportTable, cells: &[Cell], style: &RowStyle, background: Option<&str>, size: usize) -> TableRow {
    let cells: Vec<TableCell> = table
        .columns
        .iter()
        .zip(cells)
        .map(|(col, cell)| styled_cell(&cell.display, style, background, col.align, size))
        .collect();
    TableRow::new(cells)
}

fn styled_cell(text: &str, style: &RowStyle, background: Option<&str>, align: Align, size: usize) -> TableCell {
    let fill = Rgb::parse_or(background.unwrap_or(&style.background), Rgb::WHITE);
    let color = Rgb::parse_or(&style.text_color, Rgb::BLACK);

    let mut run = styled_run(text, size, style.is_bold(), style.italic).color(color.to_ooxml());
    if style.underline {
        run = run.underline("single");
    }
    let paragraph = Paragraph::new().add_run(run).align(match align {
        Align::Left => AlignmentType::Left,
        Align::Center => AlignmentType::Center,
        Align::Right => AlignmentType::Right,
    });
    let mut cell = TableCell::new().add_paragraph(paragraph);
    if fill != Rgb::WHITE {
        cell = cell.shading(Shading::new().fill(fill.to_ooxml()));
    }
    cell
}

fn styled_run(text: &str, size: usize, bold: bool, italic: bool) -> Run {
    let mut run = Run::new().add_text(text).size(size);
    if bold {
        run = run.bold();
    }
    if italic {
        run = run.italic();
    }
    run
}

fn centered(run: Run) -> Paragraph {
    Paragraph::new().add_run(run).align(AlignmentType::Center)
}

/// Point size to the half-point unit used by run sizes.
fn half_points(points: f64) -> usize {
    (points * 2.0).round().max(2.0) as usize
}
