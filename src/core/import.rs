//! Maps uploaded CSV or XLSX payloads onto the category record types.
//!
//! A flat table is matched against [`SCHEMAS`] by column set; a workbook is
//! matched sheet by sheet using the category sheet names. Matched categories
//! are replaced wholesale in the [`RecordStore`].

use crate::core::error::{EngineError, Result};
use crate::core::holding::{
    Category, Crypto, Equity, FixedIncome, ForeignCurrency, Holding, columns,
};
use crate::core::store::RecordStore;
use calamine::{Data, Range, Reader, Xlsx};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// A single cell of an imported table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

/// A header row plus data rows. Header names are trimmed on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(headers: &[S], rows: Vec<Vec<Cell>>) -> Self {
        Self {
            headers: headers.iter().map(|h| normalize_header(h.as_ref())).collect(),
            rows,
        }
    }
}

/// A named worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
}

/// Required columns of a category's flat-table layout.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub category: Category,
    pub required: &'static [&'static str],
}

/// Flat-table schemas in match priority order. The first schema whose
/// required columns are all present wins.
pub const SCHEMAS: [Schema; 4] = [
    Schema {
        category: Category::Equity,
        required: &[
            columns::NAME,
            columns::UNIT_PRICE,
            columns::QUANTITY,
            columns::UNIT_YIELD,
        ],
    },
    Schema {
        category: Category::FixedIncome,
        required: &[columns::NAME, columns::INVESTED, columns::ANNUAL_RATE],
    },
    Schema {
        category: Category::Crypto,
        required: &[columns::CRYPTO, columns::INVESTED_USD, columns::QUOTE_USD],
    },
    Schema {
        category: Category::ForeignCurrency,
        required: &[columns::CURRENCY, columns::INVESTED, columns::QUOTE],
    },
];

impl Schema {
    pub fn for_category(category: Category) -> Schema {
        match category {
            Category::Equity => SCHEMAS[0],
            Category::FixedIncome => SCHEMAS[1],
            Category::Crypto => SCHEMAS[2],
            Category::ForeignCurrency => SCHEMAS[3],
        }
    }

    fn missing(&self, headers: &HashSet<&str>) -> Option<&'static str> {
        self.required.iter().copied().find(|c| !headers.contains(c))
    }
}

/// Categories replaced by an import, with the number of records loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub replaced: Vec<(Category, usize)>,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.replaced.is_empty()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.replaced.iter().map(|(c, _)| *c).collect()
    }
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_string()
}

/// Returns the first category whose required columns are a subset of `headers`.
pub fn classify<S: AsRef<str>>(headers: &[S]) -> Option<Category> {
    let set: HashSet<&str> = headers.iter().map(|h| h.as_ref().trim()).collect();
    SCHEMAS
        .iter()
        .find(|schema| schema.missing(&set).is_none())
        .map(|schema| schema.category)
}

/// Imports a flat table. Unrecognized layouts are ignored and produce an
/// empty report.
pub fn import_table(store: &mut RecordStore, table: &Table) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let Some(category) = classify(table.headers.as_slice()) else {
        info!(headers = ?table.headers, "No category matches the table columns, nothing imported");
        return Ok(report);
    };

    let count = replace_from_table(store, category, table, "table")?;
    info!(%category, records = count, "Imported table");
    report.replaced.push((category, count));
    Ok(report)
}

/// Imports every sheet whose name matches a category, in category priority
/// order. Categories replaced before a failing sheet stay replaced.
pub fn import_sheets(store: &mut RecordStore, sheets: &[Sheet]) -> Result<ImportReport> {
    for sheet in sheets {
        if Category::from_sheet_name(&sheet.name).is_none() {
            warn!(sheet = %sheet.name, "Ignoring sheet with unrecognized name");
        }
    }

    let mut report = ImportReport::default();
    for category in Category::ALL {
        let Some(sheet) = sheets
            .iter()
            .find(|s| Category::from_sheet_name(&s.name) == Some(category))
        else {
            continue;
        };

        let count = replace_from_table(store, category, &sheet.table, &sheet.name)?;
        info!(%category, sheet = %sheet.name, records = count, "Imported sheet");
        report.replaced.push((category, count));
    }
    Ok(report)
}

/// Imports an uploaded file, picking the reader from the file extension.
pub fn import_file(store: &mut RecordStore, file_name: &str, bytes: &[u8]) -> Result<ImportReport> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    debug!(file_name, ?extension, size = bytes.len(), "Importing file");

    match extension.as_deref() {
        Some("csv") => {
            let table = read_csv(bytes)?;
            import_table(store, &table)
        }
        Some("xlsx") => {
            let sheets = read_xlsx(bytes)?;
            import_sheets(store, &sheets)
        }
        _ => Err(EngineError::Import(format!(
            "unsupported file type for '{file_name}', expected .csv or .xlsx"
        ))),
    }
}

/// Reads a CSV payload with a header row.
pub fn read_csv(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|s| {
                    if s.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(s.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(Table::new(headers.as_slice(), rows))
}

/// Reads the recognized sheets of an XLSX workbook. Sheets with other names
/// are skipped without being decoded.
pub fn read_xlsx(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::new();
    for name in sheet_names {
        if Category::from_sheet_name(&name).is_none() {
            warn!(sheet = %name, "Skipping sheet with unrecognized name");
            continue;
        }
        let range = workbook.worksheet_range(&name)?;
        sheets.push(Sheet {
            table: table_from_range(&range),
            name,
        });
    }
    Ok(sheets)
}

fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|c| cell_str(c).unwrap_or_default())
            .collect(),
        None => return Table::default(),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    Table::new(headers.as_slice(), rows)
}

fn cell_str(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::Empty => None,
        _ => Some(cell.to_string()),
    }
}

fn cell_from_data(cell: &Data) -> Cell {
    match cell {
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::Empty => Cell::Empty,
        other => cell_str(other).map_or(Cell::Empty, Cell::Text),
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// One data row with column lookup by header name.
struct RowReader<'a> {
    columns: &'a HashMap<&'a str, usize>,
    cells: &'a [Cell],
    source: &'a str,
    line: usize,
}

impl RowReader<'_> {
    fn cell(&self, column: &str) -> &Cell {
        self.columns
            .get(column)
            .and_then(|idx| self.cells.get(*idx))
            .unwrap_or(&EMPTY_CELL)
    }

    fn error(&self, message: impl std::fmt::Display) -> EngineError {
        EngineError::Import(format!("{} row {}: {message}", self.source, self.line))
    }

    fn text(&self, column: &str) -> String {
        match self.cell(column) {
            Cell::Empty => String::new(),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }

    fn number(&self, column: &str) -> Result<f64> {
        match self.cell(column) {
            Cell::Number(n) => Ok(*n),
            Cell::Empty => Err(self.error(format!("missing value for '{column}'"))),
            Cell::Text(s) => parse_number(s)
                .ok_or_else(|| self.error(format!("'{s}' in '{column}' is not a number"))),
        }
    }
}

/// Parses a number, accepting a decimal comma when the text has no dot.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().or_else(|| {
        if text.contains(',') && !text.contains('.') {
            text.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    })
}

trait FromRow: Holding + Sized {
    fn from_row(row: &RowReader<'_>) -> Result<Self>;
}

impl FromRow for Equity {
    fn from_row(row: &RowReader<'_>) -> Result<Self> {
        Ok(Equity {
            name: row.text(columns::NAME),
            unit_price: row.number(columns::UNIT_PRICE)?,
            quantity: row.number(columns::QUANTITY)?,
            unit_yield: row.number(columns::UNIT_YIELD)?,
        })
    }
}

impl FromRow for FixedIncome {
    fn from_row(row: &RowReader<'_>) -> Result<Self> {
        Ok(FixedIncome {
            name: row.text(columns::NAME),
            invested: row.number(columns::INVESTED)?,
            annual_rate: row.number(columns::ANNUAL_RATE)?,
        })
    }
}

impl FromRow for Crypto {
    fn from_row(row: &RowReader<'_>) -> Result<Self> {
        Ok(Crypto {
            symbol: row.text(columns::CRYPTO),
            invested_usd: row.number(columns::INVESTED_USD)?,
            quote_usd: row.number(columns::QUOTE_USD)?,
        })
    }
}

impl FromRow for ForeignCurrency {
    fn from_row(row: &RowReader<'_>) -> Result<Self> {
        Ok(ForeignCurrency {
            code: row.text(columns::CURRENCY),
            invested: row.number(columns::INVESTED)?,
            quote: row.number(columns::QUOTE)?,
        })
    }
}

fn parse_rows<H: FromRow>(table: &Table, source: &str) -> Result<Vec<H>> {
    let header_set: HashSet<&str> = table.headers.iter().map(String::as_str).collect();
    if let Some(column) = Schema::for_category(H::CATEGORY).missing(&header_set) {
        return Err(EngineError::Import(format!(
            "{source} is missing required column '{column}'"
        )));
    }

    let mut columns = HashMap::new();
    for (idx, header) in table.headers.iter().enumerate() {
        // Keep the first occurrence of a repeated header
        columns.entry(header.as_str()).or_insert(idx);
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(Cell::is_blank) {
            continue;
        }
        let row = RowReader {
            columns: &columns,
            cells,
            source,
            // Header is line 1
            line: idx + 2,
        };
        let record = H::from_row(&row)?;
        record.validate().map_err(|e| row.error(e.message()))?;
        records.push(record);
    }
    Ok(records)
}

fn replace<H: FromRow>(store: &mut RecordStore, table: &Table, source: &str) -> Result<usize> {
    let records = parse_rows::<H>(table, source)?;
    store.replace_all(records)
}

fn replace_from_table(
    store: &mut RecordStore,
    category: Category,
    table: &Table,
    source: &str,
) -> Result<usize> {
    match category {
        Category::Equity => replace::<Equity>(store, table, source),
        Category::FixedIncome => replace::<FixedIncome>(store, table, source),
        Category::Crypto => replace::<Crypto>(store, table, source),
        Category::ForeignCurrency => replace::<ForeignCurrency>(store, table, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn seeded_store() -> RecordStore {
        let mut store = RecordStore::new();
        store
            .upsert_holding(Equity {
                name: "OLD3".to_string(),
                unit_price: 1.0,
                quantity: 1.0,
                unit_yield: 0.0,
            })
            .unwrap();
        store
            .upsert_holding(Crypto {
                symbol: "BTC".to_string(),
                invested_usd: 10.0,
                quote_usd: 100.0,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_schema_priority_order() {
        let order: Vec<Category> = SCHEMAS.iter().map(|s| s.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        for category in Category::ALL {
            assert_eq!(Schema::for_category(category).category, category);
        }
    }

    #[test]
    fn test_classify_by_column_subset() {
        assert_eq!(
            classify(&["NOME", "Valor Por Unidade", "Quantidade", "Rendimento por Unidade", "Extra"]),
            Some(Category::Equity)
        );
        assert_eq!(
            classify(&["Taxa (%)", "NOME", "Valor Investido"]),
            Some(Category::FixedIncome)
        );
        assert_eq!(
            classify(&["Cripto", "Valor Investido (USD)", "Cotação Atual (USD)", "Quantidade"]),
            Some(Category::Crypto)
        );
        assert_eq!(
            classify(&["Moeda", "Valor Investido ", "Cotação Atual "]),
            Some(Category::ForeignCurrency)
        );
        assert_eq!(classify(&["NOME", "Valor Por Unidade"]), None);
        assert_eq!(classify::<&str>(&[]), None);
    }

    #[test]
    fn test_classify_prefers_earlier_schema() {
        // Satisfies both the equity and the fixed income layouts
        let headers = [
            "NOME",
            "Valor Por Unidade",
            "Quantidade",
            "Rendimento por Unidade",
            "Valor Investido",
            "Taxa (%)",
        ];
        assert_eq!(classify(&headers), Some(Category::Equity));
    }

    #[test]
    fn test_import_table_replaces_equities() {
        let mut store = seeded_store();
        let table = Table::new(
            &["NOME", "Valor Por Unidade", "Quantidade", "Rendimento por Unidade", "Obs"],
            vec![
                vec![text("petr4"), text("30.00"), text("100"), text("1.50"), text("x")],
                vec![text("vale3"), Cell::Number(60.0), Cell::Number(10.0), text("0"), Cell::Empty],
            ],
        );

        let report = import_table(&mut store, &table).unwrap();

        assert_eq!(report.replaced, vec![(Category::Equity, 2)]);
        let equities = store.collection::<Equity>();
        assert_eq!(equities.identifiers(), vec!["PETR4", "VALE3"]);
        assert_eq!(equities.get("PETR4").unwrap().unit_yield, 1.5);
        assert_eq!(store.len(Category::Crypto), 1);
    }

    #[test]
    fn test_import_unrecognized_table_is_noop() {
        let mut store = seeded_store();
        let table = Table::new(&["Date", "Amount"], vec![vec![text("2024-01-01"), text("10")]]);

        let report = import_table(&mut store, &table).unwrap();

        assert!(report.is_empty());
        assert_eq!(store.collection::<Equity>().identifiers(), vec!["OLD3"]);
        assert_eq!(store.len(Category::Crypto), 1);
        assert_eq!(store.len(Category::FixedIncome), 0);
        assert_eq!(store.len(Category::ForeignCurrency), 0);
    }

    #[test]
    fn test_malformed_row_keeps_prior_state() {
        let mut store = seeded_store();
        let table = Table::new(
            &["NOME", "Valor Por Unidade", "Quantidade", "Rendimento por Unidade"],
            vec![
                vec![text("ITSA4"), text("10"), text("5"), text("0.5")],
                vec![text("BAD"), text("ten"), text("5"), text("0.5")],
            ],
        );

        let err = import_table(&mut store, &table).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Import);
        assert_eq!(err.message(), "table row 3: 'ten' in 'Valor Por Unidade' is not a number");
        assert_eq!(store.collection::<Equity>().identifiers(), vec!["OLD3"]);
    }

    #[test]
    fn test_overflowing_row_is_import_error() {
        let mut store = seeded_store();
        let table = Table::new(
            &["NOME", "Valor Por Unidade", "Quantidade", "Rendimento por Unidade"],
            vec![vec![text("HUGE"), text("1e200"), text("1e200"), text("0")]],
        );

        let err = import_table(&mut store, &table).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Import);
        assert!(err.message().starts_with("table row 2:"), "{}", err.message());
        assert_eq!(store.collection::<Equity>().identifiers(), vec!["OLD3"]);
    }

    #[test]
    fn test_invalid_values_are_import_errors() {
        let mut store = RecordStore::new();
        let table = Table::new(
            &["NOME", "Valor Investido", "Taxa (%)"],
            vec![vec![Cell::Empty, text("100"), text("10")]],
        );

        let err = import_table(&mut store, &table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Import);
        assert!(err.message().contains("NOME is required"));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let mut store = RecordStore::new();
        let table = Table::new(
            &["Moeda", "Valor Investido", "Cotação Atual"],
            vec![
                vec![text("usd"), text("500"), text("5,00")],
                vec![Cell::Empty, text(" "), Cell::Empty],
            ],
        );

        let report = import_table(&mut store, &table).unwrap();

        assert_eq!(report.replaced, vec![(Category::ForeignCurrency, 1)]);
        let fx = store.collection::<ForeignCurrency>();
        assert_eq!(fx.get("USD").unwrap().quote, 5.0);
    }

    #[test]
    fn test_import_sheets_by_name() {
        let mut store = seeded_store();
        let sheets = vec![
            Sheet {
                name: "Notes".to_string(),
                table: Table::new(&["Anything"], vec![vec![text("ignored")]]),
            },
            Sheet {
                name: "Criptos".to_string(),
                table: Table::new(
                    &["Cripto", "Valor Investido (USD)", "Cotação Atual (USD)", "Quantidade"],
                    vec![vec![text("eth"), Cell::Number(300.0), Cell::Number(3000.0), Cell::Number(0.1)]],
                ),
            },
            Sheet {
                name: "Renda Fixa".to_string(),
                table: Table::new(
                    &["NOME", "Valor Investido", "Taxa (%)"],
                    vec![vec![text("tesouro selic"), Cell::Number(1000.0), Cell::Number(11.0)]],
                ),
            },
        ];

        let report = import_sheets(&mut store, &sheets).unwrap();

        assert_eq!(
            report.categories(),
            vec![Category::FixedIncome, Category::Crypto]
        );
        assert_eq!(store.collection::<Crypto>().identifiers(), vec!["ETH"]);
        assert_eq!(
            store.collection::<FixedIncome>().identifiers(),
            vec!["TESOURO SELIC"]
        );
        assert_eq!(store.collection::<Equity>().identifiers(), vec!["OLD3"]);
    }

    #[test]
    fn test_failed_sheet_keeps_earlier_categories() {
        let mut store = seeded_store();
        let sheets = vec![
            Sheet {
                name: "Ações".to_string(),
                table: Table::new(
                    &["NOME", "Valor Por Unidade", "Quantidade", "Rendimento por Unidade"],
                    vec![vec![text("WEGE3"), text("40"), text("3"), text("0.4")]],
                ),
            },
            Sheet {
                name: "Criptos".to_string(),
                table: Table::new(&["Cripto", "Valor Investido (USD)"], vec![]),
            },
        ];

        let err = import_sheets(&mut store, &sheets).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Import);
        assert!(err.message().contains("Cotação Atual (USD)"));
        assert_eq!(store.collection::<Equity>().identifiers(), vec!["WEGE3"]);
        assert_eq!(store.collection::<Crypto>().identifiers(), vec!["BTC"]);
    }

    #[test]
    fn test_read_csv_trims_headers() {
        let csv = "Moeda,Valor Investido ,Cotação Atual \nEUR,600,6.0\n";
        let table = read_csv(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Moeda", "Valor Investido", "Cotação Atual"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], text("EUR"));
    }

    #[test]
    fn test_import_file_rejects_unknown_extension() {
        let mut store = RecordStore::new();
        let err = import_file(&mut store, "carteira.ods", b"whatever").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Import);

        let err = import_file(&mut store, "carteira.xlsx", b"not a zip").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Import);
    }

    #[test]
    fn test_import_csv_file_uppercase_extension() {
        let mut store = RecordStore::new();
        let csv = "NOME,Valor Investido,Taxa (%)\ncdb banco,1000,12.68\n";

        let report = import_file(&mut store, "RENDA.CSV", csv.as_bytes()).unwrap();

        assert_eq!(report.replaced, vec![(Category::FixedIncome, 1)]);
        assert_eq!(
            store.collection::<FixedIncome>().get("CDB BANCO").unwrap().annual_rate,
            12.68
        );
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 1.5 "), Some(1.5));
        assert_eq!(parse_number("1,5"), Some(1.5));
        assert_eq!(parse_number("1,000.5"), None);
        assert_eq!(parse_number(""), None);
    }
}
