pub mod cli;
pub mod core;

use crate::cli::session::Edits;
use crate::core::config::AppConfig;
use crate::core::holding::Category;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Summary {
        files: Vec<PathBuf>,
        edits: Edits,
        json: bool,
    },
    Export {
        files: Vec<PathBuf>,
        edits: Edits,
        category: Option<Category>,
        output_dir: Option<PathBuf>,
    },
    Payback {
        unit_price: f64,
        unit_yield: f64,
    },
}

pub fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Carteira starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Summary { files, edits, json } => {
            let store = cli::session::load(&config, &files, &edits)?;
            cli::summary::run(&store, json)
        }
        AppCommand::Export {
            files,
            edits,
            category,
            output_dir,
        } => {
            let store = cli::session::load(&config, &files, &edits)?;
            let output_dir = output_dir.unwrap_or_else(|| config.output_path());
            cli::export::run(&store, category, &output_dir)
        }
        AppCommand::Payback {
            unit_price,
            unit_yield,
        } => cli::payback::run(unit_price, unit_yield),
    }
}
