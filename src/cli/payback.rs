use super::ui;
use crate::core::analytics;
use anyhow::Result;

/// Prints how many units are needed for their yield to buy one more unit.
pub fn run(unit_price: f64, unit_yield: f64) -> Result<()> {
    let plan = analytics::payback(unit_price, unit_yield)?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Quantidade mínima"),
        ui::header_cell("Valor a investir (R$)"),
        ui::header_cell("Rendimento estimado (R$)"),
    ]);
    table.add_row(vec![
        ui::number_cell(plan.units as f64, 0),
        ui::total_cell(plan.investment),
        ui::total_cell(plan.income),
    ]);

    println!(
        "{}\n\n{table}",
        ui::style_text("Calculadora de Dividendos", ui::StyleType::Title)
    );
    Ok(())
}
