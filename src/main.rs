use anyhow::Result;
use carteira::cli::session::{Edits, parse_removal, parse_upsert};
use carteira::core::Record;
use carteira::core::holding::Category;
use carteira::core::log::init_logging;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct EditArgs {
    /// Add or update a holding after the imports: CATEGORY,ID,VALUE...
    /// (e.g. acoes,PETR4,30,100,1.5 or criptos,BTC,1000,65000)
    #[arg(long, value_name = "CATEGORY,ID,VALUES", value_parser = parse_upsert)]
    add: Vec<Record>,

    /// Remove a holding after the additions: CATEGORY:ID (e.g. criptos:BTC)
    #[arg(long, value_name = "CATEGORY:ID", value_parser = parse_removal)]
    remove: Vec<(Category, String)>,
}

impl From<EditArgs> for Edits {
    fn from(args: EditArgs) -> Edits {
        Edits {
            upserts: args.add,
            removals: args.remove,
        }
    }
}

impl From<Commands> for carteira::AppCommand {
    fn from(cmd: Commands) -> carteira::AppCommand {
        match cmd {
            Commands::Summary { file, edits, json } => carteira::AppCommand::Summary {
                files: file,
                edits: edits.into(),
                json,
            },
            Commands::Export {
                file,
                edits,
                category,
                output_dir,
            } => carteira::AppCommand::Export {
                files: file,
                edits: edits.into(),
                category,
                output_dir,
            },
            Commands::Payback { price, unit_yield } => carteira::AppCommand::Payback {
                unit_price: price,
                unit_yield,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display holdings with derived fields and totals
    Summary {
        /// CSV or XLSX file to import, may be repeated
        #[arg(short, long)]
        file: Vec<PathBuf>,

        #[command(flatten)]
        edits: EditArgs,

        /// Print the tables as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export holdings to an XLSX workbook
    Export {
        /// CSV or XLSX file to import, may be repeated
        #[arg(short, long)]
        file: Vec<PathBuf>,

        #[command(flatten)]
        edits: EditArgs,

        /// Export only this category (e.g. acoes, renda-fixa, criptos, moedas)
        #[arg(long)]
        category: Option<Category>,

        /// Directory for the workbook
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Minimum units for the yield to pay for one more unit
    Payback {
        /// Unit price
        #[arg(long)]
        price: f64,

        /// Yield per unit
        #[arg(long = "yield")]
        unit_yield: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => carteira::cli::setup::setup(),
        Some(cmd) => carteira::run_command(cmd.into(), cli.config_path.as_deref()),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
