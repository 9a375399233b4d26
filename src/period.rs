use crate::config::PeriodVocabulary;
use crate::error::{DashboardError, Result};
use crate::schema::{
    CanonicalItemRecord, Category, ClassifiedItem, DateRange, LedgerRecord, MonthKey,
    MonthlyBucket, PeriodKind, PeriodSelector,
};
use crate::utils::months_before;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Inclusive day range a period selector resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when any day of the month falls inside the window.
    pub fn contains_month(&self, key: MonthKey) -> bool {
        key.first_day() <= self.end && self.start <= key.last_day()
    }
}

/// Resolves a selector against the reference day `now`.
///
/// `None` means "do not filter": the `All` selector, and a custom range with a
/// missing bound, both land here.
pub fn resolve_window(selector: &PeriodSelector, now: NaiveDate) -> Option<DateWindow> {
    match selector.kind {
        PeriodKind::All => None,
        PeriodKind::Custom => {
            let range = selector.range?;
            Some(DateWindow {
                start: range.start?,
                end: range.end?,
            })
        }
        kind => kind.months_back().map(|months| DateWindow {
            start: months_before(now, months),
            end: now,
        }),
    }
}

/// Builds a selector from a UI token such as `"quarter"` or `"custom"`.
pub fn selector_from_token(
    vocabulary: &PeriodVocabulary,
    token: &str,
    range: Option<DateRange>,
) -> Result<PeriodSelector> {
    let kind = vocabulary.parse(token)?;
    Ok(PeriodSelector {
        kind,
        range: if kind == PeriodKind::Custom { range } else { None },
    })
}

/// Anything that can be placed on the calendar for period filtering.
pub trait PeriodScoped {
    fn in_window(&self, window: &DateWindow) -> bool;
}

impl PeriodScoped for CanonicalItemRecord {
    fn in_window(&self, window: &DateWindow) -> bool {
        self.sale_date.is_some_and(|d| window.contains(d))
    }
}

impl PeriodScoped for ClassifiedItem {
    fn in_window(&self, window: &DateWindow) -> bool {
        self.record.in_window(window)
    }
}

impl PeriodScoped for LedgerRecord {
    fn in_window(&self, window: &DateWindow) -> bool {
        window.contains(self.date)
    }
}

impl PeriodScoped for MonthlyBucket {
    fn in_window(&self, window: &DateWindow) -> bool {
        window.contains_month(self.month_key)
    }
}

/// Returns the entries that fall inside the selected period as a new Vec.
pub fn filter_by_period<T>(entries: &[T], selector: &PeriodSelector, now: NaiveDate) -> Vec<T>
where
    T: PeriodScoped + Clone,
{
    match resolve_window(selector, now) {
        Some(window) => entries
            .iter()
            .filter(|e| e.in_window(&window))
            .cloned()
            .collect(),
        None => entries.to_vec(),
    }
}

pub fn filter_items(
    items: &[ClassifiedItem],
    selector: &PeriodSelector,
    now: NaiveDate,
) -> Vec<ClassifiedItem> {
    filter_by_period(items, selector, now)
}

pub fn filter_buckets(
    buckets: &[MonthlyBucket],
    selector: &PeriodSelector,
    now: NaiveDate,
) -> Vec<MonthlyBucket> {
    filter_by_period(buckets, selector, now)
}

/// Month-picker filter: each bound is optional and applied on its own.
pub fn filter_buckets_by_month_range(
    buckets: &[MonthlyBucket],
    start: Option<MonthKey>,
    end: Option<MonthKey>,
) -> Vec<MonthlyBucket> {
    buckets
        .iter()
        .filter(|b| start.map_or(true, |s| b.month_key >= s))
        .filter(|b| end.map_or(true, |e| b.month_key <= e))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

pub fn filter_by_category(items: &[ClassifiedItem], filter: CategoryFilter) -> Vec<ClassifiedItem> {
    match filter {
        CategoryFilter::All => items.to_vec(),
        CategoryFilter::Only(category) => items
            .iter()
            .filter(|i| i.category == category)
            .cloned()
            .collect(),
    }
}
