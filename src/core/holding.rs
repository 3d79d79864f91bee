//! Record types for the four asset categories.

use crate::core::error::{EngineError, Result};
use crate::core::store::{Collection, RecordStore};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Column headers, shared by import detection and export.
pub mod columns {
    pub const NAME: &str = "NOME";
    pub const UNIT_PRICE: &str = "Valor Por Unidade";
    pub const QUANTITY: &str = "Quantidade";
    pub const UNIT_YIELD: &str = "Rendimento por Unidade";
    pub const TOTAL_VALUE: &str = "Quantidade Total (R$)";
    pub const EXPECTED_PAYOUT: &str = "Expectativa de Recebimentos (R$)";
    pub const MAGIC_NUMBER: &str = "Magic Number";

    pub const INVESTED: &str = "Valor Investido";
    pub const ANNUAL_RATE: &str = "Taxa (%)";
    pub const MONTHLY_RATE: &str = "Taxa Mensal (%)";
    pub const MONTHLY_PAYOUT: &str = "Rendimento Mensal (R$)";
    pub const ANNUAL_PAYOUT: &str = "Rendimento Anual (R$)";

    pub const CRYPTO: &str = "Cripto";
    pub const INVESTED_USD: &str = "Valor Investido (USD)";
    pub const QUOTE_USD: &str = "Cotação Atual (USD)";

    pub const CURRENCY: &str = "Moeda";
    pub const QUOTE: &str = "Cotação Atual";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Equity,
    FixedIncome,
    Crypto,
    ForeignCurrency,
}

impl Category {
    /// All categories in display, export and import priority order.
    pub const ALL: [Category; 4] = [
        Category::Equity,
        Category::FixedIncome,
        Category::Crypto,
        Category::ForeignCurrency,
    ];

    /// Canonical worksheet name.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Category::Equity => "Ações",
            Category::FixedIncome => "Renda Fixa",
            Category::Crypto => "Criptos",
            Category::ForeignCurrency => "Moedas Estrangeiras",
        }
    }

    /// English worksheet name, also accepted on import.
    pub fn alias(&self) -> &'static str {
        match self {
            Category::Equity => "Equities",
            Category::FixedIncome => "Fixed Income",
            Category::Crypto => "Crypto",
            Category::ForeignCurrency => "Foreign Currencies",
        }
    }

    /// Download name for a single category workbook.
    pub fn file_name(&self) -> &'static str {
        match self {
            Category::Equity => "acoes.xlsx",
            Category::FixedIncome => "renda_fixa.xlsx",
            Category::Crypto => "criptos.xlsx",
            Category::ForeignCurrency => "moedas_estrangeiras.xlsx",
        }
    }

    /// Table headers: identifier, inputs, then derived fields.
    pub fn columns(&self) -> &'static [&'static str] {
        use columns::*;
        match self {
            Category::Equity => &[
                NAME,
                UNIT_PRICE,
                QUANTITY,
                UNIT_YIELD,
                TOTAL_VALUE,
                EXPECTED_PAYOUT,
                MAGIC_NUMBER,
            ],
            Category::FixedIncome => &[
                NAME,
                INVESTED,
                ANNUAL_RATE,
                MONTHLY_RATE,
                MONTHLY_PAYOUT,
                ANNUAL_PAYOUT,
            ],
            Category::Crypto => &[CRYPTO, INVESTED_USD, QUOTE_USD, QUANTITY],
            Category::ForeignCurrency => &[CURRENCY, INVESTED, QUOTE, QUANTITY],
        }
    }

    pub fn id_column(&self) -> &'static str {
        self.columns()[0]
    }

    /// Columns a user fills in after the identifier.
    pub fn input_columns(&self) -> &'static [&'static str] {
        let count = match self {
            Category::Equity => 3,
            _ => 2,
        };
        &self.columns()[1..=count]
    }

    /// Returns display name and emoji for the category
    pub fn display_info(&self) -> (&'static str, &'static str) {
        match self {
            Category::Equity => ("Ações", "📈"),
            Category::FixedIncome => ("Renda Fixa", "🏦"),
            Category::Crypto => ("Criptomoedas", "💰"),
            Category::ForeignCurrency => ("Moedas Estrangeiras", "💶"),
        }
    }

    /// Matches a worksheet name against the canonical names and English aliases.
    pub fn from_sheet_name(name: &str) -> Option<Category> {
        let name = name.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.sheet_name() == name || c.alias().eq_ignore_ascii_case(name))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

impl FromStr for Category {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "equity" | "equities" | "acoes" | "ações" | "stocks" => Ok(Category::Equity),
            "fixed income" | "renda fixa" | "bonds" => Ok(Category::FixedIncome),
            "crypto" | "criptos" | "cripto" => Ok(Category::Crypto),
            "foreign currency" | "foreign currencies" | "currency" | "moedas"
            | "moedas estrangeiras" => Ok(Category::ForeignCurrency),
            _ => Err(EngineError::Validation(format!("unknown category '{s}'"))),
        }
    }
}

/// Trims and upper-cases an identifier.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// A record that lives in one category collection of the [`RecordStore`].
pub trait Holding: Clone + fmt::Debug {
    const CATEGORY: Category;

    fn id(&self) -> &str;

    fn id_mut(&mut self) -> &mut String;

    /// Checks the per-category entry minimums.
    fn validate_inputs(&self) -> Result<()>;

    /// Entry minimums, then every derived value must still be a finite number.
    fn validate(&self) -> Result<()> {
        self.validate_inputs()?;
        if self.row_values().iter().any(|v| !v.is_finite()) {
            return Err(EngineError::Validation(format!(
                "derived values of {} are out of range",
                self.id()
            )));
        }
        Ok(())
    }

    /// Input and derived values, in [`Category::columns`] order after the id.
    fn row_values(&self) -> Vec<f64>;

    /// Category totals as `(column, sum)` pairs.
    fn totals(records: &[Self]) -> Vec<Total>;

    fn collection(store: &RecordStore) -> &Collection<Self>;

    fn collection_mut(store: &mut RecordStore) -> &mut Collection<Self>;

    fn into_record(self) -> Record;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Total {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equity {
    pub name: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub unit_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedIncome {
    pub name: String,
    pub invested: f64,
    /// Annual rate in percent
    pub annual_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crypto {
    pub symbol: String,
    pub invested_usd: f64,
    pub quote_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignCurrency {
    pub code: String,
    pub invested: f64,
    pub quote: f64,
}

/// A record of any category, for callers that pick the category at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Equity(Equity),
    FixedIncome(FixedIncome),
    Crypto(Crypto),
    ForeignCurrency(ForeignCurrency),
}

impl Record {
    pub fn category(&self) -> Category {
        match self {
            Record::Equity(_) => Category::Equity,
            Record::FixedIncome(_) => Category::FixedIncome,
            Record::Crypto(_) => Category::Crypto,
            Record::ForeignCurrency(_) => Category::ForeignCurrency,
        }
    }

    /// Builds a record from its identifier and input values, in
    /// [`Category::input_columns`] order. Entry minimums are checked on upsert.
    pub fn from_inputs(category: Category, id: &str, values: &[f64]) -> Result<Record> {
        let expected = category.input_columns();
        if values.len() != expected.len() {
            return Err(EngineError::Validation(format!(
                "{category} takes {} values ({}), got {}",
                expected.len(),
                expected.join(", "),
                values.len()
            )));
        }

        let id = id.to_string();
        let record = match category {
            Category::Equity => Record::Equity(Equity {
                name: id,
                unit_price: values[0],
                quantity: values[1],
                unit_yield: values[2],
            }),
            Category::FixedIncome => Record::FixedIncome(FixedIncome {
                name: id,
                invested: values[0],
                annual_rate: values[1],
            }),
            Category::Crypto => Record::Crypto(Crypto {
                symbol: id,
                invested_usd: values[0],
                quote_usd: values[1],
            }),
            Category::ForeignCurrency => Record::ForeignCurrency(ForeignCurrency {
                code: id,
                invested: values[0],
                quote: values[1],
            }),
        };
        Ok(record)
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Equity(r) => r.id(),
            Record::FixedIncome(r) => r.id(),
            Record::Crypto(r) => r.id(),
            Record::ForeignCurrency(r) => r.id(),
        }
    }
}

fn check_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::Validation(format!("{field} must be a number")))
    }
}

fn check_positive(field: &str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::Validation(format!(
            "{field} must be greater than zero, got {value}"
        )))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::Validation(format!(
            "{field} must not be negative, got {value}"
        )))
    }
}

fn check_id(category: Category, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(EngineError::Validation(format!(
            "{} is required",
            category.id_column()
        )));
    }
    Ok(())
}

fn sum_by<H>(records: &[H], f: impl Fn(&H) -> f64) -> f64 {
    records.iter().map(f).sum()
}

impl Holding for Equity {
    const CATEGORY: Category = Category::Equity;

    fn id(&self) -> &str {
        &self.name
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn validate_inputs(&self) -> Result<()> {
        check_id(Self::CATEGORY, &self.name)?;
        check_positive(columns::UNIT_PRICE, self.unit_price)?;
        check_positive(columns::QUANTITY, self.quantity)?;
        check_non_negative(columns::UNIT_YIELD, self.unit_yield)
    }

    fn row_values(&self) -> Vec<f64> {
        vec![
            self.unit_price,
            self.quantity,
            self.unit_yield,
            self.total_value(),
            self.expected_payout(),
            self.payback_ratio(),
        ]
    }

    fn totals(records: &[Self]) -> Vec<Total> {
        vec![
            Total {
                label: columns::TOTAL_VALUE,
                value: sum_by(records, Equity::total_value),
            },
            Total {
                label: columns::EXPECTED_PAYOUT,
                value: sum_by(records, Equity::expected_payout),
            },
        ]
    }

    fn collection(store: &RecordStore) -> &Collection<Self> {
        &store.equities
    }

    fn collection_mut(store: &mut RecordStore) -> &mut Collection<Self> {
        &mut store.equities
    }

    fn into_record(self) -> Record {
        Record::Equity(self)
    }
}

impl Holding for FixedIncome {
    const CATEGORY: Category = Category::FixedIncome;

    fn id(&self) -> &str {
        &self.name
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.name
    }

    fn validate_inputs(&self) -> Result<()> {
        check_id(Self::CATEGORY, &self.name)?;
        check_positive(columns::INVESTED, self.invested)?;
        check_non_negative(columns::ANNUAL_RATE, self.annual_rate)
    }

    fn row_values(&self) -> Vec<f64> {
        vec![
            self.invested,
            self.annual_rate,
            self.monthly_rate(),
            self.monthly_payout(),
            self.annual_payout(),
        ]
    }

    fn totals(records: &[Self]) -> Vec<Total> {
        vec![
            Total {
                label: columns::INVESTED,
                value: sum_by(records, |r| r.invested),
            },
            Total {
                label: columns::MONTHLY_PAYOUT,
                value: sum_by(records, FixedIncome::monthly_payout),
            },
            Total {
                label: columns::ANNUAL_PAYOUT,
                value: sum_by(records, FixedIncome::annual_payout),
            },
        ]
    }

    fn collection(store: &RecordStore) -> &Collection<Self> {
        &store.fixed_income
    }

    fn collection_mut(store: &mut RecordStore) -> &mut Collection<Self> {
        &mut store.fixed_income
    }

    fn into_record(self) -> Record {
        Record::FixedIncome(self)
    }
}

impl Holding for Crypto {
    const CATEGORY: Category = Category::Crypto;

    fn id(&self) -> &str {
        &self.symbol
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.symbol
    }

    fn validate_inputs(&self) -> Result<()> {
        check_id(Self::CATEGORY, &self.symbol)?;
        check_non_negative(columns::INVESTED_USD, self.invested_usd)?;
        check_non_negative(columns::QUOTE_USD, self.quote_usd)
    }

    fn row_values(&self) -> Vec<f64> {
        vec![self.invested_usd, self.quote_usd, self.quantity()]
    }

    fn totals(records: &[Self]) -> Vec<Total> {
        vec![Total {
            label: columns::INVESTED_USD,
            value: sum_by(records, |r| r.invested_usd),
        }]
    }

    fn collection(store: &RecordStore) -> &Collection<Self> {
        &store.crypto
    }

    fn collection_mut(store: &mut RecordStore) -> &mut Collection<Self> {
        &mut store.crypto
    }

    fn into_record(self) -> Record {
        Record::Crypto(self)
    }
}

impl Holding for ForeignCurrency {
    const CATEGORY: Category = Category::ForeignCurrency;

    fn id(&self) -> &str {
        &self.code
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.code
    }

    fn validate_inputs(&self) -> Result<()> {
        check_id(Self::CATEGORY, &self.code)?;
        check_non_negative(columns::INVESTED, self.invested)?;
        check_non_negative(columns::QUOTE, self.quote)
    }

    fn row_values(&self) -> Vec<f64> {
        vec![self.invested, self.quote, self.quantity()]
    }

    fn totals(records: &[Self]) -> Vec<Total> {
        vec![Total {
            label: columns::INVESTED,
            value: sum_by(records, |r| r.invested),
        }]
    }

    fn collection(store: &RecordStore) -> &Collection<Self> {
        &store.foreign_currencies
    }

    fn collection_mut(store: &mut RecordStore) -> &mut Collection<Self> {
        &mut store.foreign_currencies
    }

    fn into_record(self) -> Record {
        Record::ForeignCurrency(self)
    }
}
