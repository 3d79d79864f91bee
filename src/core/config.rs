use crate::core::holding::{Crypto, Equity, FixedIncome, ForeignCurrency, Holding};
use crate::core::store::RecordStore;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Holdings loaded into every new session before any file is imported.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SeedHoldings {
    #[serde(default)]
    pub equities: Vec<Equity>,
    #[serde(default)]
    pub fixed_income: Vec<FixedIncome>,
    #[serde(default)]
    pub crypto: Vec<Crypto>,
    #[serde(default)]
    pub foreign_currencies: Vec<ForeignCurrency>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub holdings: SeedHoldings,
    pub output_dir: Option<String>,
}

fn seed_collection<H: Holding>(store: &mut RecordStore, records: &[H]) -> Result<()> {
    for record in records {
        store.upsert_holding(record.clone()).with_context(|| {
            format!(
                "Invalid {} holding '{}' in config",
                H::CATEGORY,
                record.id()
            )
        })?;
    }
    Ok(())
}

impl AppConfig {
    /// Loads the config from the default location. A missing file yields an
    /// empty config.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "carteira", "carteira")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Directory for exported workbooks: `output_dir` or the working directory.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Creates a session store holding the configured seed records.
    pub fn new_store(&self) -> Result<RecordStore> {
        let mut store = RecordStore::new();
        seed_collection(&mut store, &self.holdings.equities)?;
        seed_collection(&mut store, &self.holdings.fixed_income)?;
        seed_collection(&mut store, &self.holdings.crypto)?;
        seed_collection(&mut store, &self.holdings.foreign_currencies)?;
        debug!(
            categories = ?store.non_empty_categories(),
            "Seeded session store from config"
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::holding::Category;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
holdings:
  equities:
    - name: "petr4"
      unit_price: 30.0
      quantity: 100
      unit_yield: 1.5
    - name: "VALE3"
      unit_price: 60.0
      quantity: 10
      unit_yield: 4.2
  crypto:
    - symbol: "btc"
      invested_usd: 1000.0
      quote_usd: 50000.0
output_dir: "/tmp/carteira"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.holdings.equities.len(), 2);
        assert_eq!(config.holdings.equities[0].name, "petr4");
        assert_eq!(config.holdings.equities[1].unit_yield, 4.2);
        assert!(config.holdings.fixed_income.is_empty());
        assert_eq!(config.holdings.crypto[0].quote_usd, 50000.0);
        assert!(config.holdings.foreign_currencies.is_empty());
        assert_eq!(config.output_path(), PathBuf::from("/tmp/carteira"));

        let store = config.new_store().unwrap();
        assert_eq!(
            store.non_empty_categories(),
            vec![Category::Equity, Category::Crypto]
        );
        assert_eq!(store.identifiers(Category::Equity), vec!["PETR4", "VALE3"]);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.output_dir.is_none());
        assert_eq!(config.output_path(), PathBuf::from("."));
        assert!(config.new_store().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_seed_is_reported() {
        let yaml_str = r#"
holdings:
  fixed_income:
    - name: "cdb"
      invested: 0
      annual_rate: 12.0
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        let err = config.new_store().unwrap_err();
        assert!(err.to_string().contains("Invalid Renda Fixa holding 'cdb'"));
    }
}
