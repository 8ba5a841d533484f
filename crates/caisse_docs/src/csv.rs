use anyhow::{Context, Result};

use crate::format::FormatLocale;
use crate::report::ReportRequest;
use crate::table::ReportTable;

/// Field separator; `,` is the decimal separator in the report locale.
pub const CSV_DELIMITER: u8 = b';';

/// Generate a `;`-separated grid of the report table: header row, body and
/// the totals row, using the same display strings as the other outputs.
pub fn generate_csv_report(request: &ReportRequest, locale: &FormatLocale) -> Result<String> {
    let table = ReportTable::build(&request.template, &request.rows, locale, None);
    let rows: Vec<Vec<&str>> = table
        .body
        .iter()
        .chain(table.totals.iter())
        .map(|cells| cells.iter().map(|c| c.display.as_str()).collect())
        .collect();
    generate_delimited(&table.header_labels(), &rows, CSV_DELIMITER)
}

fn generate_delimited(headers: &[&str], rows: &[Vec<&str>], delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer
        .write_record(headers)
        .context("Failed to write header record")?;

    for row in rows {
        writer
            .write_record(row)
            .context("Failed to write data record")?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;

    String::from_utf8(bytes).context("CSV output contained invalid UTF-8")
}
