use crate::error::{DashboardError, Result};
use crate::utils::last_day_of_month;
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One spreadsheet cell as handed over by the sheet reader.
///
/// Deserializes untagged, so a JSON export such as
/// `{"Sana": "05.01.2026", "Sotilgan": 120, "Izoh": null}` maps cell by cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form used for item names.
    pub fn as_display_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// Column label to cell, in the sheet's column order.
pub type RawRow = IndexMap<String, CellValue>;

/// A row normalized onto the item schema, whatever the sheet called its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalItemRecord {
    pub name: String,
    pub cost: f64,
    pub price: f64,
    pub sold_qty: u64,
    pub stock_qty: u64,
    pub sale_date: Option<NaiveDate>,
    #[schemars(description = "Position of the source row in the ingested batch")]
    pub row_index: usize,
}

/// A dated row carrying the monthly ledger fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerRecord {
    pub date: NaiveDate,
    pub sales: f64,
    pub cost: f64,
    pub expense: f64,
    #[schemars(description = "Receivables owed by customers")]
    pub credit: f64,
    #[schemars(description = "Payables owed to suppliers")]
    pub debt: f64,
    pub row_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum AbcTier {
    #[schemars(description = "Items making up the first 80% of cumulative profit")]
    A,
    #[schemars(description = "Items between 80% and 95% of cumulative profit")]
    B,
    #[schemars(description = "The remaining tail")]
    C,
}

impl AbcTier {
    pub const ALL: [AbcTier; 3] = [AbcTier::A, AbcTier::B, AbcTier::C];

    pub fn as_char(self) -> char {
        match self {
            AbcTier::A => 'A',
            AbcTier::B => 'B',
            AbcTier::C => 'C',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum XyzTier {
    #[schemars(description = "Stable demand: deviation from the mean below 20%")]
    X,
    #[schemars(description = "Moderate demand variability: deviation below 50%")]
    Y,
    #[schemars(description = "Erratic demand: deviation of 50% or more")]
    Z,
}

impl XyzTier {
    pub const ALL: [XyzTier; 3] = [XyzTier::X, XyzTier::Y, XyzTier::Z];

    pub fn as_char(self) -> char {
        match self {
            XyzTier::X => 'X',
            XyzTier::Y => 'Y',
            XyzTier::Z => 'Z',
        }
    }
}

/// Combined ABC x XYZ class, rendered as a two-letter code such as `AX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category {
    pub abc: AbcTier,
    pub xyz: XyzTier,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::new(AbcTier::A, XyzTier::X),
        Category::new(AbcTier::A, XyzTier::Y),
        Category::new(AbcTier::A, XyzTier::Z),
        Category::new(AbcTier::B, XyzTier::X),
        Category::new(AbcTier::B, XyzTier::Y),
        Category::new(AbcTier::B, XyzTier::Z),
        Category::new(AbcTier::C, XyzTier::X),
        Category::new(AbcTier::C, XyzTier::Y),
        Category::new(AbcTier::C, XyzTier::Z),
    ];

    pub const fn new(abc: AbcTier, xyz: XyzTier) -> Self {
        Self { abc, xyz }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.abc.as_char(), self.xyz.as_char())
    }
}

impl FromStr for Category {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_uppercase();
        let mut chars = code.chars();
        let (Some(a), Some(x), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(DashboardError::InvalidCategory(s.to_string()));
        };

        let abc = AbcTier::ALL.into_iter().find(|t| t.as_char() == a);
        let xyz = XyzTier::ALL.into_iter().find(|t| t.as_char() == x);

        match (abc, xyz) {
            (Some(abc), Some(xyz)) => Ok(Category::new(abc, xyz)),
            _ => Err(DashboardError::InvalidCategory(s.to_string())),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassifiedItem {
    #[serde(flatten)]
    pub record: CanonicalItemRecord,

    #[schemars(description = "(price - cost) x sold quantity; negative for loss-making items")]
    pub profit: f64,

    #[schemars(description = "Percentage of total profit; all zero when total profit is not positive")]
    pub profit_share: f64,

    pub abc: AbcTier,

    pub xyz: XyzTier,

    #[schemars(with = "String", description = "Two-letter ABC/XYZ code, e.g. 'AX'")]
    pub category: Category,
}

impl ClassifiedItem {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ClassifiedItem)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// Calendar year-month, ordered chronologically and rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(DashboardError::InvalidMonthKey(format!(
                "{:04}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        last_day_of_month(self.year, self.month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DashboardError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// Sums of all ledger lines sharing one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyBucket {
    #[schemars(with = "String", description = "Calendar month in YYYY-MM format")]
    pub month_key: MonthKey,
    pub sales_total: f64,
    pub cost_total: f64,
    pub expense_total: f64,
    pub credit_total: f64,
    pub debt_total: f64,
    #[schemars(description = "sales_total - cost_total")]
    pub profit_total: f64,
    #[schemars(description = "sales_total - cost_total - expense_total; a proxy, not cash-basis accounting")]
    pub cashflow_total: f64,
    pub line_count: usize,
}

impl MonthlyBucket {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(MonthlyBucket)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum PeriodKind {
    #[default]
    #[schemars(description = "No time filtering")]
    All,
    #[schemars(description = "From one calendar month before the reference date up to it")]
    LastMonth,
    #[schemars(description = "From three calendar months before the reference date up to it")]
    LastQuarter,
    #[schemars(description = "From one calendar year before the reference date up to it")]
    LastYear,
    #[schemars(description = "Caller supplied start and end dates")]
    Custom,
}

impl PeriodKind {
    /// Calendar months covered by a trailing window, `None` for `All` and `Custom`.
    pub fn months_back(self) -> Option<u32> {
        match self {
            PeriodKind::LastMonth => Some(1),
            PeriodKind::LastQuarter => Some(3),
            PeriodKind::LastYear => Some(12),
            PeriodKind::All | PeriodKind::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct PeriodSelector {
    pub kind: PeriodKind,
    #[serde(default)]
    pub range: Option<DateRange>,
}

impl PeriodSelector {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn trailing(kind: PeriodKind) -> Self {
        Self { kind, range: None }
    }

    pub fn custom(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            kind: PeriodKind::Custom,
            range: Some(DateRange { start, end }),
        }
    }
}
