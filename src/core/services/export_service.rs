//! Spreadsheet export
//!
//! Every collected table becomes one worksheet: `A1` holds the title
//! `Parameter`, row 2 the bold column names, data from row 3. Failed outcomes
//! are left out.

use super::types::{EXPORT_FILE_NAME, ExportedWorkbook, ResultSet, XLSX_MIME_TYPE};
use crate::core::warehouse::ParameterTable;
use crate::error::ExportError;
use crate::utils::text::truncate_chars;
use indexmap::IndexMap;
use indexmap::map::Entry;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;

pub const MAX_SHEET_NAME_CHARS: usize = 31;
pub const SHEET_TITLE: &str = "Parameter";

const TITLE_ROW: u32 = 0;
const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;

/// Worksheet name for a result label.
///
/// Characters the format forbids become `_`, as do apostrophes at either
/// end; the result is cut to 31 characters.
pub fn sheet_name(label: &str) -> String {
    let replaced: String = label
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();

    let mut name = truncate_chars(&replaced, MAX_SHEET_NAME_CHARS);
    if name.starts_with('\'') {
        name.replace_range(..1, "_");
    }
    if name.ends_with('\'') {
        let last = name.len() - 1;
        name.replace_range(last.., "_");
    }
    name
}

/// Build the workbook in memory
pub fn export(results: &ResultSet) -> Result<ExportedWorkbook, ExportError> {
    if !results.has_tables() {
        return Err(ExportError::NothingToExport);
    }

    // Sheet names compare case-insensitively. Names that collide keep the
    // first position and spelling and take the latest table.
    let mut sheets: IndexMap<String, (String, &ParameterTable)> = IndexMap::new();
    for (label, table) in results.tables() {
        let name = sheet_name(label);
        match sheets.entry(name.to_lowercase()) {
            Entry::Occupied(mut entry) => {
                tracing::warn!(
                    "Sheet name '{}' is used by more than one result; '{}' replaces the earlier sheet",
                    entry.get().0,
                    label
                );
                entry.get_mut().1 = table;
            }
            Entry::Vacant(entry) => {
                entry.insert((name, table));
            }
        }
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for (name, table) in sheets.values() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        write_table(worksheet, table, &bold)?;
        tracing::debug!("Wrote sheet {} ({} rows)", name, table.row_count());
    }

    let bytes = workbook.save_to_buffer()?;

    Ok(ExportedWorkbook {
        file_name: EXPORT_FILE_NAME.to_string(),
        mime_type: XLSX_MIME_TYPE.to_string(),
        sheet_names: sheets.into_values().map(|(name, _)| name).collect(),
        bytes,
    })
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &ParameterTable,
    bold: &Format,
) -> Result<(), XlsxError> {
    worksheet.write_string(TITLE_ROW, 0, SHEET_TITLE)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, column_index(col)?, name, bold)?;
    }

    for (offset, row) in table.rows.iter().enumerate() {
        let row_index = u32::try_from(offset)
            .ok()
            .and_then(|o| o.checked_add(FIRST_DATA_ROW))
            .ok_or(XlsxError::RowColumnLimitError)?;
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_index, column_index(col)?, cell)?;
        }
    }

    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Value) -> Result<(), XlsxError> {
    match cell {
        Value::Null => {}
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                worksheet.write_number(row, col, f)?;
            }
            None => {
                worksheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            worksheet.write_string(row, col, s)?;
        }
        other => {
            worksheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

fn column_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}
