//! # Business Metrics Engine
//!
//! Turns loosely structured spreadsheet rows from a small-business upload into
//! inventory classifications and monthly financial totals for a dashboard.
//!
//! ## Core Concepts
//!
//! - **Raw rows**: Column label to cell maps, with labels in whatever language the sheet used
//! - **Canonical records**: Rows mapped onto a fixed item/ledger schema via header synonyms
//! - **ABC classification**: Tiers by cumulative share of total profit (80% / 95% cut-offs)
//! - **XYZ classification**: Tiers by how far an item's sales sit from the mean (20% / 50%)
//! - **Monthly buckets**: Sales, cost, expense, credit and debt summed per calendar month
//! - **Hard reset**: A new upload replaces the previous dataset wholesale, never merged
//!
//! ## Example
//!
//! ```rust,ignore
//! use business_metrics_engine::*;
//! use chrono::NaiveDate;
//!
//! let config = EngineConfig::default();
//! let rows: Vec<RawRow> = vec![
//!     [
//!         ("Sana".to_string(), CellValue::from("05.01.2026")),
//!         ("Mahsulot Nomi".to_string(), CellValue::from("Olma")),
//!         ("Tannarx".to_string(), CellValue::from(6000.0)),
//!         ("Sotish Narxi".to_string(), CellValue::from(8000.0)),
//!         ("Sotilgan".to_string(), CellValue::from(120.0)),
//!         ("Savdo".to_string(), CellValue::from(960_000.0)),
//!     ]
//!     .into_iter()
//!     .collect(),
//! ];
//!
//! let mut store = DatasetStore::new();
//! store.install(DashboardProcessor::process(rows, &config)?);
//!
//! let dataset = store.current().unwrap();
//! let quarter = dataset.items_in(
//!     &PeriodSelector::trailing(PeriodKind::LastQuarter),
//!     NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
//! );
//! ```

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod dates;
pub mod error;
pub mod ingestion;
pub mod period;
pub mod schema;
pub mod summary;
pub mod utils;

pub use aggregator::{aggregate_by_month, MonthlyTotals};
pub use classifier::{classify, verify_profit_shares};
pub use config::{CanonicalField, EngineConfig, HeaderMapping, PeriodVocabulary};
pub use dates::normalize_date;
pub use error::{DashboardError, Result};
pub use ingestion::{ingest, IngestOutput, RecordIngestor};
pub use period::{
    filter_buckets, filter_buckets_by_month_range, filter_by_category, filter_items,
    resolve_window, CategoryFilter, DateWindow, PeriodScoped,
};
pub use schema::*;
pub use summary::{CategoryStats, ItemSummary};

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything derived from one upload. Items and ledger lines point back into
/// `rows` through their `row_index`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<RawRow>,
    pub items: Vec<ClassifiedItem>,
    pub buckets: Vec<MonthlyBucket>,
    /// Non-blank rows left out of the monthly buckets for lack of a date.
    pub skipped_count: usize,
    pub blank_count: usize,
}

impl Dataset {
    pub fn original_row(&self, item: &ClassifiedItem) -> Option<&RawRow> {
        self.rows.get(item.record.row_index)
    }

    pub fn items_in(&self, selector: &PeriodSelector, now: NaiveDate) -> Vec<ClassifiedItem> {
        filter_items(&self.items, selector, now)
    }

    pub fn buckets_in(&self, selector: &PeriodSelector, now: NaiveDate) -> Vec<MonthlyBucket> {
        filter_buckets(&self.buckets, selector, now)
    }

    pub fn totals(&self) -> MonthlyTotals {
        MonthlyTotals::from_buckets(&self.buckets)
    }

    pub fn summary(&self) -> ItemSummary {
        ItemSummary::from_items(&self.items)
    }
}

pub struct DashboardProcessor;

impl DashboardProcessor {
    pub fn process(rows: Vec<RawRow>, config: &EngineConfig) -> Result<Dataset> {
        config.validate()?;

        info!("Processing upload of {} rows", rows.len());

        let IngestOutput {
            items,
            ledger,
            skipped_count,
            blank_count,
        } = RecordIngestor::new(config).ingest(&rows);

        let items = classify(&items);
        let buckets = aggregate_by_month(&ledger);

        debug!(
            "Upload produced {} classified items, {} ledger lines, {} monthly buckets",
            items.len(),
            ledger.len(),
            buckets.len()
        );
        info!(
            "Finished upload: {} items, {} months, {} rows without a date",
            items.len(),
            buckets.len(),
            skipped_count
        );

        Ok(Dataset {
            rows,
            items,
            buckets,
            skipped_count,
            blank_count,
        })
    }

    /// Accepts the upload as a JSON array of row objects.
    pub fn process_json(json: &str, config: &EngineConfig) -> Result<Dataset> {
        let rows: Vec<RawRow> = serde_json::from_str(json)
            .map_err(|e| DashboardError::InvalidRows(e.to_string()))?;
        Self::process(rows, config)
    }

    pub fn process_with_verification(
        rows: Vec<RawRow>,
        config: &EngineConfig,
        tolerance: f64,
    ) -> Result<Dataset> {
        let dataset = Self::process(rows, config)?;

        verify_profit_shares(&dataset.items, tolerance)?;

        Ok(dataset)
    }
}

pub fn process_rows(rows: Vec<RawRow>, config: &EngineConfig) -> Result<Dataset> {
    DashboardProcessor::process(rows, config)
}

pub fn process_with_verification(
    rows: Vec<RawRow>,
    config: &EngineConfig,
    tolerance: f64,
) -> Result<Dataset> {
    DashboardProcessor::process_with_verification(rows, config, tolerance)
}

/// Holds the dataset currently shown on the dashboard. A new upload replaces
/// it entirely.
#[derive(Debug, Default)]
pub struct DatasetStore {
    current: Option<Dataset>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `dataset`, returning whatever was loaded before.
    pub fn install(&mut self, dataset: Dataset) -> Option<Dataset> {
        debug!(
            "Installing dataset with {} items (replacing: {})",
            dataset.items.len(),
            self.current.is_some()
        );
        self.current.replace(dataset)
    }

    /// Processes an upload and installs it. On error the previous dataset stays.
    pub fn load(&mut self, rows: Vec<RawRow>, config: &EngineConfig) -> Result<&Dataset> {
        let dataset = DashboardProcessor::process(rows, config)?;
        if self.current.is_some() {
            debug!("Discarding previous dataset");
        }
        let installed: &Dataset = self.current.insert(dataset);
        Ok(installed)
    }

    pub fn reset(&mut self) -> Option<Dataset> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&Dataset> {
        self.current.as_ref()
    }
}
