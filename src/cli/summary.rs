use super::ui;
use crate::core::analytics::{self, EnrichedTable};
use crate::core::holding::{Category, columns};
use crate::core::store::RecordStore;
use anyhow::{Context, Result};
use comfy_table::Cell;

fn decimals(category: Category, column: &str) -> usize {
    match (category, column) {
        (Category::Crypto, columns::QUANTITY) => 8,
        (Category::ForeignCurrency, columns::QUANTITY) => 4,
        (Category::Equity, columns::QUANTITY) => 0,
        (Category::FixedIncome, columns::MONTHLY_RATE) => 4,
        _ => 2,
    }
}

impl EnrichedTable {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(self.columns.iter().map(|c| ui::header_cell(c)));

        for row in &self.rows {
            let mut cells = vec![Cell::new(&row.id)];
            cells.extend(
                row.values
                    .iter()
                    .zip(self.columns.iter().skip(1))
                    .map(|(v, c)| ui::number_cell(*v, decimals(self.category, c))),
            );
            table.add_row(cells);
        }

        let (label, emoji) = self.category.display_info();
        let mut output = format!("{emoji} {}\n\n", ui::style_text(label, ui::StyleType::Title));
        output.push_str(&table.to_string());

        let mut totals = ui::new_styled_table();
        totals.set_header(self.totals.iter().map(|t| ui::header_cell(t.label)));
        totals.add_row(self.totals.iter().map(|t| ui::total_cell(t.value)));
        output.push_str(&format!(
            "\n\n{}\n{}",
            ui::style_text("Totais", ui::StyleType::TotalLabel),
            totals
        ));

        output
    }
}

pub fn run(store: &RecordStore, json: bool) -> Result<()> {
    let tables = analytics::compute_all(store);

    if json {
        let out = serde_json::to_string_pretty(&tables).context("Failed to serialize summary")?;
        println!("{out}");
        return Ok(());
    }

    if tables.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "➡️  No holdings yet. Import a CSV/XLSX file or add holdings to the config.",
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    let num_tables = tables.len();
    for (i, table) in tables.iter().enumerate() {
        println!("{}", table.display_as_table());
        if i < num_tables - 1 {
            ui::print_separator();
        }
    }
    Ok(())
}
