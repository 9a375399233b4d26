use crate::schema::{AbcTier, Category, ClassifiedItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: Category,
    pub count: usize,
    pub profit: f64,
}

/// Dashboard headline numbers for a set of classified items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item_count: usize,
    pub total_profit: f64,
    /// One entry per category in `Category::ALL` order, empty ones included.
    pub categories: Vec<CategoryStats>,
    pub a_tier_count: usize,
    pub a_tier_profit: f64,
}

impl ItemSummary {
    pub fn from_items(items: &[ClassifiedItem]) -> Self {
        let categories = Category::ALL
            .iter()
            .map(|&category| {
                let (count, profit) = items
                    .iter()
                    .filter(|i| i.category == category)
                    .fold((0, 0.0), |(n, p), i| (n + 1, p + i.profit));
                CategoryStats {
                    category,
                    count,
                    profit,
                }
            })
            .collect();

        let a_tier = items.iter().filter(|i| i.abc == AbcTier::A);

        Self {
            item_count: items.len(),
            total_profit: items.iter().map(|i| i.profit).sum(),
            categories,
            a_tier_count: a_tier.clone().count(),
            a_tier_profit: a_tier.map(|i| i.profit).sum(),
        }
    }

    pub fn category(&self, category: Category) -> Option<&CategoryStats> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
