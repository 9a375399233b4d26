use crate::error::{DashboardError, Result};
use crate::schema::PeriodKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Fields of the canonical schema that sheet columns are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    #[schemars(description = "Sale or booking date")]
    Date,
    #[schemars(description = "Product / item name")]
    Name,
    #[schemars(description = "Unit cost for items; total cost for ledger lines")]
    Cost,
    #[schemars(description = "Unit selling price")]
    Price,
    #[schemars(description = "Quantity sold")]
    SoldQty,
    #[schemars(description = "Quantity left in stock")]
    StockQty,
    #[schemars(description = "Sales revenue of a ledger line")]
    Sales,
    #[schemars(description = "Operating expense of a ledger line")]
    Expense,
    #[schemars(description = "Receivables (customer credit)")]
    Credit,
    #[schemars(description = "Payables (supplier debt)")]
    Debt,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::Date,
        CanonicalField::Name,
        CanonicalField::Cost,
        CanonicalField::Price,
        CanonicalField::SoldQty,
        CanonicalField::StockQty,
        CanonicalField::Sales,
        CanonicalField::Expense,
        CanonicalField::Credit,
        CanonicalField::Debt,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSynonyms {
    pub field: CanonicalField,

    #[schemars(
        description = "Accepted column headers in priority order. Exact matches are tried first, then case-insensitive ones, each in list order."
    )]
    pub synonyms: Vec<String>,
}

/// Ordered header synonym table, one entry per canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct HeaderMapping {
    pub fields: Vec<FieldSynonyms>,
}

impl HeaderMapping {
    pub fn synonyms_for(&self, field: CanonicalField) -> &[String] {
        self.fields
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.synonyms.as_slice())
            .unwrap_or(&[])
    }

    /// Replaces the synonym list of one field, keeping the others.
    pub fn with_synonyms<I, S>(mut self, field: CanonicalField, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let synonyms: Vec<String> = synonyms.into_iter().map(Into::into).collect();
        match self.fields.iter_mut().find(|entry| entry.field == field) {
            Some(entry) => entry.synonyms = synonyms,
            None => self.fields.push(FieldSynonyms { field, synonyms }),
        }
        self
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.fields {
            if !seen.insert(entry.field) {
                return Err(DashboardError::InvalidConfig(format!(
                    "field {:?} is listed more than once",
                    entry.field
                )));
            }
            if entry.synonyms.iter().any(|s| s.trim().is_empty()) {
                return Err(DashboardError::InvalidConfig(format!(
                    "field {:?} has a blank synonym",
                    entry.field
                )));
            }
        }

        for field in [CanonicalField::Date, CanonicalField::Name] {
            if self.synonyms_for(field).is_empty() {
                return Err(DashboardError::InvalidConfig(format!(
                    "field {:?} needs at least one header synonym",
                    field
                )));
            }
        }

        Ok(())
    }
}

fn entry(field: CanonicalField, synonyms: &[&str]) -> FieldSynonyms {
    FieldSynonyms {
        field,
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for HeaderMapping {
    fn default() -> Self {
        Self {
            fields: vec![
                entry(
                    CanonicalField::Date,
                    &[
                        "Sana", "Date", "Sotish Sana", "Sotish sanasi", "Дата", "Sana (Date)",
                        "Sotuv sana", "Kun", "Data",
                    ],
                ),
                entry(
                    CanonicalField::Name,
                    &[
                        "Mahsulot Nomi", "Mahsulot nomi", "Mahsulot", "Nomi", "Товар", "Товар номи",
                        "Product", "Product Name", "Наименование", "Nomenklatura",
                    ],
                ),
                entry(
                    CanonicalField::Cost,
                    &[
                        "Tannarx", "Tannarxi", "Cost", "Себестоимость", "Narx", "Xarid",
                        "Tovar Tannarxi", "Kirish narxi", "Purchase", "Buy Price",
                    ],
                ),
                entry(
                    CanonicalField::Price,
                    &[
                        "Sotish Narxi", "Sotish narxi", "Price", "Продажа", "Sotish", "Sale Price",
                        "Selling Price",
                    ],
                ),
                entry(
                    CanonicalField::SoldQty,
                    &["Sotilgan", "Sold", "Miqdori", "Количество", "Qty", "Quantity", "Dona"],
                ),
                entry(
                    CanonicalField::StockQty,
                    &[
                        "Ombor qoldigi", "Ombor qoldiq", "Qoldiq", "Остаток", "Stock", "Ombor",
                    ],
                ),
                entry(
                    CanonicalField::Sales,
                    &["Savdo", "Kassa", "Revenue", "Tushum", "Aylanma", "Sales"],
                ),
                entry(
                    CanonicalField::Expense,
                    &[
                        "Xarajat", "Harajat", "Expense", "Expenses", "Operatsion xarajat",
                        "Doimiy Xarajat", "Sotuv harajati",
                    ],
                ),
                entry(
                    CanonicalField::Credit,
                    &[
                        "Nasiya", "Nasiya (mijoz)", "Debitor", "Debitor qarz", "Receivable",
                        "Receivables",
                    ],
                ),
                entry(
                    CanonicalField::Debt,
                    &[
                        "Qarz", "Qarz (taminotchi)", "Kreditor", "Kreditor qarz", "Payable",
                        "Payables",
                    ],
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodToken {
    pub token: String,
    pub kind: PeriodKind,
}

/// Words a UI may send for a period selector, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PeriodVocabulary {
    pub tokens: Vec<PeriodToken>,
}

impl PeriodVocabulary {
    pub fn parse(&self, token: &str) -> Result<PeriodKind> {
        let wanted = token.trim();
        self.tokens
            .iter()
            .find(|t| t.token.to_lowercase() == wanted.to_lowercase())
            .map(|t| t.kind)
            .ok_or_else(|| DashboardError::UnknownPeriod(token.to_string()))
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for t in &self.tokens {
            if !seen.insert(t.token.to_lowercase()) {
                return Err(DashboardError::InvalidConfig(format!(
                    "period token '{}' is defined more than once",
                    t.token
                )));
            }
        }
        Ok(())
    }
}

impl Default for PeriodVocabulary {
    fn default() -> Self {
        let table: &[(&str, PeriodKind)] = &[
            ("all", PeriodKind::All),
            ("hammasi", PeriodKind::All),
            ("month", PeriodKind::LastMonth),
            ("lastMonth", PeriodKind::LastMonth),
            ("oxirgi oy", PeriodKind::LastMonth),
            ("quarter", PeriodKind::LastQuarter),
            ("lastQuarter", PeriodKind::LastQuarter),
            ("oxirgi kvartal", PeriodKind::LastQuarter),
            ("year", PeriodKind::LastYear),
            ("lastYear", PeriodKind::LastYear),
            ("oxirgi yil", PeriodKind::LastYear),
            ("custom", PeriodKind::Custom),
            ("maxsus davr", PeriodKind::Custom),
        ];

        Self {
            tokens: table
                .iter()
                .map(|(token, kind)| PeriodToken {
                    token: token.to_string(),
                    kind: *kind,
                })
                .collect(),
        }
    }
}

/// Everything about the engine that is data rather than logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(description = "Header synonyms per canonical field")]
    pub headers: HeaderMapping,

    #[schemars(description = "Accepted period selector tokens")]
    pub periods: PeriodVocabulary,

    #[schemars(description = "Name given to items whose name column is missing or blank")]
    pub unknown_item_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            headers: HeaderMapping::default(),
            periods: PeriodVocabulary::default(),
            unknown_item_name: "Unknown".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_headers(mut self, headers: HeaderMapping) -> Self {
        self.headers = headers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.headers.validate()?;
        self.periods.validate()?;
        if self.unknown_item_name.trim().is_empty() {
            return Err(DashboardError::InvalidConfig(
                "unknown_item_name must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());

        for field in CanonicalField::ALL {
            assert!(
                !config.headers.synonyms_for(field).is_empty(),
                "{:?} has no default synonyms",
                field
            );
        }
        assert_eq!(config.headers.synonyms_for(CanonicalField::Date)[0], "Sana");
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = EngineConfig::default().with_headers(
            HeaderMapping::default().with_synonyms(CanonicalField::Sales, ["Umsatz", "Sales"]),
        );
        let json = config.to_json().unwrap();
        let back = EngineConfig::from_json_str(&json).unwrap();

        assert_eq!(back, config);
        assert_eq!(
            back.headers.synonyms_for(CanonicalField::Sales),
            &["Umsatz".to_string(), "Sales".to_string()]
        );
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config = EngineConfig::from_json_str(r#"{"unknown_item_name": "Noma'lum"}"#).unwrap();
        assert_eq!(config.unknown_item_name, "Noma'lum");
        assert_eq!(config.headers, HeaderMapping::default());
        assert_eq!(config.periods, PeriodVocabulary::default());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let duplicated = r#"{"headers": [
            {"field": "date", "synonyms": ["Sana"]},
            {"field": "date", "synonyms": ["Date"]},
            {"field": "name", "synonyms": ["Nomi"]}
        ]}"#;
        assert!(matches!(
            EngineConfig::from_json_str(duplicated),
            Err(DashboardError::InvalidConfig(_))
        ));

        let no_name = r#"{"headers": [{"field": "date", "synonyms": ["Sana"]}]}"#;
        assert!(EngineConfig::from_json_str(no_name).is_err());

        assert!(matches!(
            EngineConfig::from_json_str("[1, 2, 3]"),
            Err(DashboardError::SerializationError(_))
        ));
    }

    #[test]
    fn test_period_vocabulary_lookup() {
        let vocab = PeriodVocabulary::default();
        assert_eq!(vocab.parse("quarter").unwrap(), PeriodKind::LastQuarter);
        assert_eq!(vocab.parse("LASTYEAR").unwrap(), PeriodKind::LastYear);
        assert_eq!(vocab.parse(" Oxirgi oy ").unwrap(), PeriodKind::LastMonth);
        assert!(matches!(
            vocab.parse("fortnight"),
            Err(DashboardError::UnknownPeriod(_))
        ));
    }

    #[test]
    fn test_config_schema_generation() {
        let schema = EngineConfig::schema_as_json().unwrap();
        assert!(schema.contains("unknown_item_name"));
        assert!(schema.contains("synonyms"));
    }

    #[test]
    fn test_config_from_path() {
        let path = std::env::temp_dir().join("business_metrics_engine_config_test.json");
        std::fs::write(&path, r#"{"unknown_item_name": "n/a"}"#).unwrap();

        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.unknown_item_name, "n/a");

        std::fs::remove_file(&path).ok();
        assert!(matches!(
            EngineConfig::from_path(&path),
            Err(DashboardError::IoError(_))
        ));
    }
}
