//! XLSX rendering of enriched category tables.

use crate::core::analytics::{self, EnrichedTable};
use crate::core::error::{EngineError, Result};
use crate::core::holding::Category;
use crate::core::store::RecordStore;
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, info};

/// Download name of the consolidated workbook.
pub const CONSOLIDATED_FILE_NAME: &str = "carteira_investimentos.xlsx";

fn write_sheet(workbook: &mut Workbook, table: &EnrichedTable) -> Result<()> {
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(table.category.sheet_name())?;

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }
    for (idx, row) in table.rows.iter().enumerate() {
        let line = idx as u32 + 1;
        sheet.write_string(line, 0, row.id.as_str())?;
        for (col, value) in row.values.iter().enumerate() {
            if !value.is_finite() {
                return Err(EngineError::Export(format!(
                    "{} of {} is not a finite number",
                    table.columns[col + 1],
                    row.id
                )));
            }
            sheet.write_number(line, col as u16 + 1, *value)?;
        }
    }
    sheet.autofit();

    debug!(sheet = table.category.sheet_name(), rows = table.rows.len(), "Wrote sheet");
    Ok(())
}

/// Renders a single category into a workbook with one sheet.
pub fn export_one(table: &EnrichedTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, table)?;
    let bytes = workbook.save_to_buffer()?;
    info!(category = %table.category, size = bytes.len(), "Exported category");
    Ok(bytes)
}

/// Computes and renders a single category of the store.
pub fn export_category(store: &RecordStore, category: Category) -> Result<Vec<u8>> {
    export_one(&analytics::compute_category(store, category))
}

/// Renders every non-empty category into one workbook, one sheet each.
/// Returns `None` when the store holds no records at all.
pub fn export_all(store: &RecordStore) -> Result<Option<Vec<u8>>> {
    let tables = analytics::compute_all(store);
    if tables.is_empty() {
        info!("No holdings in any category, skipping consolidated export");
        return Ok(None);
    }

    let mut workbook = Workbook::new();
    for table in &tables {
        write_sheet(&mut workbook, table)?;
    }
    let bytes = workbook.save_to_buffer()?;
    info!(sheets = tables.len(), size = bytes.len(), "Exported consolidated workbook");
    Ok(Some(bytes))
}
