use super::ui;
use crate::core::config::AppConfig;
use crate::core::error::EngineError;
use crate::core::holding::{Category, Record};
use crate::core::import;
use crate::core::store::{RecordStore, UpsertOutcome};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;

/// Record changes given on the command line, applied after the imports.
#[derive(Debug, Clone, Default)]
pub struct Edits {
    pub upserts: Vec<Record>,
    pub removals: Vec<(Category, String)>,
}

/// Parses `CATEGORY,ID,VALUE...` with the values in
/// [`Category::input_columns`] order, e.g. `acoes,PETR4,30,100,1.5`.
pub fn parse_upsert(arg: &str) -> Result<Record, EngineError> {
    let mut parts = arg.split(',').map(str::trim);
    let (Some(category), Some(id)) = (parts.next(), parts.next()) else {
        return Err(EngineError::Validation(format!(
            "expected CATEGORY,ID,VALUE..., got '{arg}'"
        )));
    };
    let category: Category = category.parse()?;
    let values = parts
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| EngineError::Validation(format!("'{v}' is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Record::from_inputs(category, id, &values)
}

/// Parses `CATEGORY:ID`, e.g. `criptos:BTC`.
pub fn parse_removal(arg: &str) -> Result<(Category, String), EngineError> {
    let (category, id) = arg
        .split_once(':')
        .ok_or_else(|| EngineError::Validation(format!("expected CATEGORY:ID, got '{arg}'")))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(EngineError::Validation(format!("missing identifier in '{arg}'")));
    }
    Ok((category.parse()?, id.to_string()))
}

/// Builds the session store: config seed first, then each file in order,
/// then the command line edits (upserts before removals).
///
/// Import and edit failures are reported and skipped so one bad upload does
/// not discard the rest of the session. Unreadable files are hard errors.
pub fn load(config: &AppConfig, files: &[PathBuf], edits: &Edits) -> Result<RecordStore> {
    let mut store = config.new_store()?;
    for file in files {
        import_one(&mut store, file)?;
    }
    apply_edits(&mut store, edits);
    Ok(store)
}

fn apply_edits(store: &mut RecordStore, edits: &Edits) {
    for record in &edits.upserts {
        let (label, emoji) = record.category().display_info();
        match store.upsert(record.clone()) {
            Ok(outcome) => {
                let action = match outcome {
                    UpsertOutcome::Inserted => "added",
                    UpsertOutcome::Updated => "updated",
                };
                let msg = format!("✅ {emoji} {label}: {} {action}", record.id());
                eprintln!("{}", ui::style_text(&msg, ui::StyleType::Success));
            }
            Err(e) => {
                error!(error = %e, id = record.id(), "Upsert failed");
                let msg = format!("❌ Failed to save {}: {e}", record.id());
                eprintln!("{}", ui::style_text(&msg, ui::StyleType::Error));
            }
        }
    }

    for (category, id) in &edits.removals {
        let (label, emoji) = category.display_info();
        match store.remove(*category, id) {
            Ok(removed) => {
                let msg = format!("🗑️  {emoji} {label}: {} removed", removed.id());
                eprintln!("{}", ui::style_text(&msg, ui::StyleType::Success));
            }
            Err(e) => {
                error!(error = %e, category = %category, id = %id, "Remove failed");
                let msg = format!("❌ Failed to remove {id}: {e}");
                eprintln!("{}", ui::style_text(&msg, ui::StyleType::Error));
            }
        }
    }
}

fn import_one(store: &mut RecordStore, path: &Path) -> Result<()> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    match import::import_file(store, file_name, &bytes) {
        Ok(report) if report.is_empty() => {
            let msg = format!("⚠️  No known layout in {file_name}, nothing imported");
            eprintln!("{}", ui::style_text(&msg, ui::StyleType::Warning));
        }
        Ok(report) => {
            for (category, count) in &report.replaced {
                let (label, emoji) = category.display_info();
                let msg = format!("✅ {emoji} {label}: {count} records imported from {file_name}");
                eprintln!("{}", ui::style_text(&msg, ui::StyleType::Success));
            }
        }
        Err(e) => {
            error!(error = %e, file = %path.display(), "Import failed");
            let msg = format!("❌ Failed to import {file_name}: {e}");
            eprintln!("{}", ui::style_text(&msg, ui::StyleType::Error));
        }
    }
    Ok(())
}
