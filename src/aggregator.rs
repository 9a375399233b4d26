use crate::schema::{LedgerRecord, MonthKey, MonthlyBucket};
use crate::utils::months_between;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Default)]
struct MonthAccumulator {
    sales: f64,
    cost: f64,
    expense: f64,
    credit: f64,
    debt: f64,
    lines: usize,
}

impl MonthAccumulator {
    fn add(&mut self, line: &LedgerRecord) {
        self.sales += line.sales;
        self.cost += line.cost;
        self.expense += line.expense;
        self.credit += line.credit;
        self.debt += line.debt;
        self.lines += 1;
    }

    fn into_bucket(self, month_key: MonthKey) -> MonthlyBucket {
        MonthlyBucket {
            month_key,
            sales_total: self.sales,
            cost_total: self.cost,
            expense_total: self.expense,
            credit_total: self.credit,
            debt_total: self.debt,
            profit_total: self.sales - self.cost,
            cashflow_total: self.sales - self.cost - self.expense,
            line_count: self.lines,
        }
    }
}

/// Groups ledger lines by calendar month. Buckets come back in ascending
/// month order; lines are summed in input order, so equal input gives
/// bit-identical output.
pub fn aggregate_by_month(lines: &[LedgerRecord]) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<MonthKey, MonthAccumulator> = BTreeMap::new();

    for line in lines {
        months
            .entry(MonthKey::from_date(line.date))
            .or_default()
            .add(line);
    }

    debug!(
        "Aggregated {} ledger lines into {} months",
        lines.len(),
        months.len()
    );

    months
        .into_iter()
        .map(|(key, acc)| acc.into_bucket(key))
        .collect()
}

/// Grand totals over a run of monthly buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub sales: f64,
    pub cost: f64,
    pub expense: f64,
    pub credit: f64,
    pub debt: f64,
    pub profit: f64,
    pub cashflow: f64,
    pub lines: usize,
    pub first_month: Option<MonthKey>,
    pub last_month: Option<MonthKey>,
    /// Calendar months from the first to the last bucket, gaps included.
    pub months_spanned: usize,
}

impl MonthlyTotals {
    pub fn from_buckets(buckets: &[MonthlyBucket]) -> Self {
        let mut totals = buckets.iter().fold(Self::default(), |mut acc, b| {
            acc.sales += b.sales_total;
            acc.cost += b.cost_total;
            acc.expense += b.expense_total;
            acc.credit += b.credit_total;
            acc.debt += b.debt_total;
            acc.profit += b.profit_total;
            acc.cashflow += b.cashflow_total;
            acc.lines += b.line_count;
            acc
        });

        totals.first_month = buckets.iter().map(|b| b.month_key).min();
        totals.last_month = buckets.iter().map(|b| b.month_key).max();
        totals.months_spanned = match (totals.first_month, totals.last_month) {
            (Some(first), Some(last)) => {
                months_between(first.first_day(), last.first_day()).max(0) as usize + 1
            }
            _ => 0,
        };

        totals
    }
}
