//! Provides the derived metrics and category totals of a portfolio.
//!
//! Every function here is pure. Ratios with a non-positive denominator are
//! reported as zero.
use crate::core::error::{EngineError, Result};
use crate::core::holding::{
    Category, Crypto, Equity, FixedIncome, ForeignCurrency, Holding, Total,
};
use crate::core::store::RecordStore;
use serde::Serialize;
use tracing::debug;

/// Divides `numerator` by `denominator`, or returns 0 when the denominator
/// is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Converts an annual percentage rate into the equivalent compound monthly
/// percentage rate.
pub fn monthly_rate_from_annual(annual_pct: f64) -> f64 {
    ((1.0 + annual_pct / 100.0).powf(1.0 / 12.0) - 1.0) * 100.0
}

impl Equity {
    pub fn total_value(&self) -> f64 {
        self.unit_price * self.quantity
    }

    pub fn expected_payout(&self) -> f64 {
        self.unit_yield * self.quantity
    }

    /// Price over yield, the "magic number".
    pub fn payback_ratio(&self) -> f64 {
        ratio(self.unit_price, self.unit_yield)
    }
}

impl FixedIncome {
    pub fn monthly_rate(&self) -> f64 {
        monthly_rate_from_annual(self.annual_rate)
    }

    pub fn monthly_payout(&self) -> f64 {
        self.invested * self.monthly_rate() / 100.0
    }

    pub fn annual_payout(&self) -> f64 {
        self.invested * self.annual_rate / 100.0
    }
}

impl Crypto {
    pub fn quantity(&self) -> f64 {
        ratio(self.invested_usd, self.quote_usd)
    }
}

impl ForeignCurrency {
    pub fn quantity(&self) -> f64 {
        ratio(self.invested, self.quote)
    }
}

/// A record with its input and derived values, aligned with the table columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    pub id: String,
    pub values: Vec<f64>,
}

/// Derived view of one category: its rows and totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTable {
    pub category: Category,
    pub columns: Vec<&'static str>,
    pub rows: Vec<EnrichedRow>,
    pub totals: Vec<Total>,
}

impl EnrichedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in `row`, if the column is numeric.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| *c == column)?;
        // Column 0 is the identifier
        let idx = idx.checked_sub(1)?;
        self.rows.get(row)?.values.get(idx).copied()
    }

    pub fn total(&self, label: &str) -> Option<f64> {
        self.totals.iter().find(|t| t.label == label).map(|t| t.value)
    }
}

/// Augments each record with its derived fields and sums the category totals.
pub fn compute<H: Holding>(records: &[H]) -> EnrichedTable {
    let rows = records
        .iter()
        .map(|r| EnrichedRow {
            id: r.id().to_string(),
            values: r.row_values(),
        })
        .collect();
    let table = EnrichedTable {
        category: H::CATEGORY,
        columns: H::CATEGORY.columns().to_vec(),
        rows,
        totals: H::totals(records),
    };
    debug!(category = %H::CATEGORY, rows = records.len(), "Computed enriched table");
    table
}

pub fn compute_category(store: &RecordStore, category: Category) -> EnrichedTable {
    match category {
        Category::Equity => compute(store.collection::<Equity>().as_slice()),
        Category::FixedIncome => compute(store.collection::<FixedIncome>().as_slice()),
        Category::Crypto => compute(store.collection::<Crypto>().as_slice()),
        Category::ForeignCurrency => compute(store.collection::<ForeignCurrency>().as_slice()),
    }
}

/// Enriched tables of every non-empty category, in canonical order.
pub fn compute_all(store: &RecordStore) -> Vec<EnrichedTable> {
    store
        .non_empty_categories()
        .into_iter()
        .map(|c| compute_category(store, c))
        .collect()
}

/// Smallest whole number of units whose combined yield beats one unit's price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaybackPlan {
    pub units: u64,
    pub investment: f64,
    pub income: f64,
}

/// 2^53, past which unit counts are no longer exact in `f64`.
const MAX_EXACT_UNITS: f64 = 9_007_199_254_740_992.0;

pub fn payback(unit_price: f64, unit_yield: f64) -> Result<PaybackPlan> {
    if !(unit_price.is_finite() && unit_price > 0.0) {
        return Err(EngineError::Validation(format!(
            "unit price must be greater than zero, got {unit_price}"
        )));
    }
    if !(unit_yield.is_finite() && unit_yield > 0.0) {
        return Err(EngineError::Validation(format!(
            "unit yield must be greater than zero, got {unit_yield}"
        )));
    }

    let whole = (unit_price / unit_yield).floor();
    if whole >= MAX_EXACT_UNITS {
        return Err(EngineError::Validation(format!(
            "price {unit_price} over yield {unit_yield} needs more units than can be counted"
        )));
    }
    let units = whole as u64 + 1;
    Ok(PaybackPlan {
        units,
        investment: units as f64 * unit_price,
        income: units as f64 * unit_yield,
    })
}
