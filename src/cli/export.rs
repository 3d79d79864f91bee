use super::ui;
use crate::core::export::{self, CONSOLIDATED_FILE_NAME};
use crate::core::holding::Category;
use crate::core::store::RecordStore;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the single category workbook, or the consolidated one when no
/// category is given. Returns `None` when there was nothing to export.
pub fn write_workbook(
    store: &RecordStore,
    category: Option<Category>,
    output_dir: &Path,
) -> Result<Option<PathBuf>> {
    let (file_name, bytes) = match category {
        Some(category) => {
            if store.len(category) == 0 {
                return Ok(None);
            }
            let bytes = export::export_category(store, category)
                .with_context(|| format!("Failed to export {category}"))?;
            (category.file_name(), bytes)
        }
        None => match export::export_all(store).context("Failed to export holdings")? {
            Some(bytes) => (CONSOLIDATED_FILE_NAME, bytes),
            None => return Ok(None),
        },
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;
    let path = output_dir.join(file_name);
    fs::write(&path, bytes)
        .with_context(|| format!("Failed to write workbook to {}", path.display()))?;
    info!("Wrote workbook to {}", path.display());
    Ok(Some(path))
}

pub fn run(store: &RecordStore, category: Option<Category>, output_dir: &Path) -> Result<()> {
    match write_workbook(store, category, output_dir)? {
        Some(path) => {
            let msg = format!("📥 Saved {}", path.display());
            println!("{}", ui::style_text(&msg, ui::StyleType::Success));
        }
        None => {
            let what = category.map_or_else(|| "any category".to_string(), |c| c.to_string());
            let msg = format!("➡️  No holdings in {what}, nothing to export");
            println!("{}", ui::style_text(&msg, ui::StyleType::Subtle));
        }
    }
    Ok(())
}
