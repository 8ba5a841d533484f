//! Spreadsheet export.
//!
//! One worksheet laid out as plain rows: letterhead, title block, the table
//! with numeric cells written as numbers, the totals row and the footer.

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatUnderline, Workbook, Worksheet,
};

use crate::color::Rgb;
use crate::format::{FormatLocale, fraction_digits, max_decimals};
use crate::html::{generated_line, reference_line};
use crate::report::ReportRequest;
use crate::table::{Cell, CellValue, ReportTable, TableColumn};
use crate::template::{Align, Orientation, RowKind, RowStyle, Styles};

/// Longest string a cell accepts.
const MAX_CELL_CHARS: usize = 32_767;
/// Longest worksheet name.
const MAX_SHEET_NAME: usize = 31;
/// Paper size code for A4.
const PAPER_A4: u8 = 9;

/// Render the report as an `.xlsx` workbook.
pub fn generate_xlsx_report(request: &ReportRequest, locale: &FormatLocale) -> Result<Vec<u8>> {
    let template = &request.template;
    let table = ReportTable::build(template, &request.rows, locale, None);
    let styles = &template.styles;
    let last_col = table.columns.len().max(1) as u16 - 1;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name(&request.title))
        .with_context(|| format!("Failed to set sheet name for {:?}", request.title))?;
    worksheet.set_paper_size(PAPER_A4);
    if template.orientation == Orientation::Landscape {
        worksheet.set_landscape();
    }
    for (i, col) in table.columns.iter().enumerate() {
        worksheet
            .set_column_width(i as u16, col.width)
            .with_context(|| format!("Failed to set width of column {i}"))?;
    }

    let mut row: u32 = 0;
    let centered = Format::new().set_align(FormatAlign::Center);

    // Letterhead
    let faces = [
        centered.clone().set_italic(),
        centered.clone().set_bold(),
        centered.clone().set_bold(),
        centered.clone().set_bold().set_italic(),
    ];
    for (line, format) in template.header.lines().into_iter().zip(&faces) {
        write_span(worksheet, row, last_col, line, format)?;
        row += 1;
    }
    if !template.header.reference_number.trim().is_empty() {
        write_text(worksheet, row, 0, &reference_line(&template.header.reference_number), &Format::new())?;
        row += 1;
    }
    row += 1;

    // Title block
    let title_format = centered
        .clone()
        .set_bold()
        .set_underline(FormatUnderline::Single)
        .set_font_size(styles.title_font_size);
    write_span(worksheet, row, last_col, &request.title.to_uppercase(), &title_format)?;
    row += 1;
    if let Some(subtitle) = request.subtitle() {
        write_span(worksheet, row, last_col, subtitle, &centered.clone().set_italic())?;
        row += 1;
    }
    write_span(worksheet, row, last_col, &generated_line(request), &centered.clone().set_italic())?;
    row += 2;

    // Table
    let header_style = styles.row_style(RowKind::Header);
    for (i, col) in table.columns.iter().enumerate() {
        let format = cell_format(styles, &header_style, None, Align::Center, None);
        write_text(worksheet, row, i as u16, &col.header, &format)?;
    }
    row += 1;

    let data_style = styles.row_style(RowKind::Data);
    for (i, cells) in table.body.iter().enumerate() {
        let background = (i % 2 == 1).then_some(styles.alternate_row_color.as_str());
        write_table_row(worksheet, row, &table.columns, cells, styles, &data_style, background)?;
        row += 1;
    }
    if let Some(totals) = &table.totals {
        let total_style = styles.row_style(RowKind::Total);
        write_table_row(worksheet, row, &table.columns, totals, styles, &total_style, None)?;
        row += 1;
    }
    row += 1;

    // Footer
    let border = Rgb::parse_or(&styles.border_color, Rgb::BLACK);
    let separator = Format::new()
        .set_border_top(FormatBorder::Thin)
        .set_border_top_color(Color::RGB(border.to_u32()));
    for col in 0..=last_col {
        worksheet
            .write_blank(row, col, &separator)
            .with_context(|| format!("Failed to write separator at ({row}, {col})"))?;
    }
    row += 1;

    let footer_faces = [
        centered.clone().set_italic(),
        centered.clone(),
        centered.clone(),
        centered.clone().set_font_size((styles.body_font_size - 1.0).max(6.0)),
    ];
    for (line, format) in template.footer.lines().into_iter().zip(&footer_faces) {
        write_span(worksheet, row, last_col, line, format)?;
        row += 1;
    }

    let bytes = workbook
        .save_to_buffer()
        .context("Failed to save workbook to buffer")?;

    Ok(bytes)
}

fn write_table_row(
    worksheet: &mut Worksheet,
    row: u32,
    columns: &[TableColumn],
    cells: &[Cell],
    styles: &Styles,
    style: &RowStyle,
    background: Option<&str>,
) -> Result<()> {
    for (i, (col, cell)) in columns.iter().zip(cells).enumerate() {
        let c = i as u16;
        match &cell.value {
            CellValue::Number(n) if n.is_finite() => {
                let decimals = fraction_digits(*n, max_decimals(col.column_type));
                let format = cell_format(styles, style, background, col.align, Some(decimals));
                worksheet
                    .write_number_with_format(row, c, *n, &format)
                    .with_context(|| format!("Failed to write number at ({row}, {c})"))?;
            }
            _ => {
                let format = cell_format(styles, style, background, col.align, None);
                write_text(worksheet, row, c, &cell.display, &format)?;
            }
        }
    }
    Ok(())
}

/// Border, colours, weight and, for numbers, the format showing `decimals`
/// fraction digits.
fn cell_format(
    styles: &Styles,
    style: &RowStyle,
    background: Option<&str>,
    align: Align,
    decimals: Option<usize>,
) -> Format {
    let border = Rgb::parse_or(&styles.border_color, Rgb::BLACK);
    let fill = Rgb::parse_or(background.unwrap_or(&style.background), Rgb::WHITE);
    let text = Rgb::parse_or(&style.text_color, Rgb::BLACK);

    let mut format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(border.to_u32()))
        .set_font_color(Color::RGB(text.to_u32()))
        .set_align(match align {
            Align::Left => FormatAlign::Left,
            Align::Center => FormatAlign::Center,
            Align::Right => FormatAlign::Right,
        });
    if fill != Rgb::WHITE {
        format = format.set_background_color(Color::RGB(fill.to_u32()));
    }
    if style.is_bold() {
        format = format.set_bold();
    }
    if style.italic {
        format = format.set_italic();
    }
    if style.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    if let Some(decimals) = decimals {
        format = format.set_num_format(number_format(decimals));
    }
    format
}

/// Grouped number format with exactly `decimals` fraction digits, so a cell
/// reads like its text rendering in the other documents.
fn number_format(decimals: usize) -> String {
    if decimals == 0 {
        "#,##0".to_string()
    } else {
        format!("#,##0.{}", "0".repeat(decimals))
    }
}

/// A line of text merged across the table width.
fn write_span(worksheet: &mut Worksheet, row: u32, last_col: u16, text: &str, format: &Format) -> Result<()> {
    let text = sanitize_cell(text);
    if last_col == 0 {
        return write_text(worksheet, row, 0, &text, format);
    }
    worksheet
        .merge_range(row, 0, row, last_col, &text, format)
        .with_context(|| format!("Failed to merge row {row}"))?;
    Ok(())
}

fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, text: &str, format: &Format) -> Result<()> {
    let text = sanitize_cell(text);
    if text.is_empty() {
        worksheet
            .write_blank(row, col, format)
            .with_context(|| format!("Failed to write blank at ({row}, {col})"))?;
    } else {
        worksheet
            .write_string_with_format(row, col, &text, format)
            .with_context(|| format!("Failed to write string at ({row}, {col})"))?;
    }
    Ok(())
}

/// Drop control characters the file format cannot carry and cap the length.
pub fn sanitize_cell(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(MAX_CELL_CHARS)
        .collect()
}

/// A valid worksheet name derived from the report title.
pub fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => ' ',
            other => other,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('\'').trim();
    let name: String = trimmed.chars().take(MAX_SHEET_NAME).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() {
        "Rapport".to_string()
    } else {
        name
    }
}
