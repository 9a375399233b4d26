use crate::error::{DashboardError, Result};
use crate::schema::{AbcTier, CanonicalItemRecord, Category, ClassifiedItem, XyzTier};
use log::debug;

/// Upper bound (inclusive) of cumulative profit share for tier A.
pub const ABC_A_LIMIT: f64 = 80.0;
/// Upper bound (inclusive) of cumulative profit share for tier B.
pub const ABC_B_LIMIT: f64 = 95.0;
/// Deviation from mean demand below which an item is X.
pub const XYZ_X_LIMIT: f64 = 20.0;
/// Deviation from mean demand below which an item is Y.
pub const XYZ_Y_LIMIT: f64 = 50.0;

// Absorbs float drift so that shares adding up to exactly 80.0 on paper stay A.
const CUMULATIVE_EPSILON: f64 = 1e-9;

/// `(price - cost) * sold_qty`; a product too large for `f64` counts as 0.
pub fn item_profit(record: &CanonicalItemRecord) -> f64 {
    let profit = (record.price - record.cost) * record.sold_qty as f64;
    if profit.is_finite() {
        profit
    } else {
        0.0
    }
}

pub fn abc_tier(cumulative_share: f64) -> AbcTier {
    if cumulative_share <= ABC_A_LIMIT + CUMULATIVE_EPSILON {
        AbcTier::A
    } else if cumulative_share <= ABC_B_LIMIT + CUMULATIVE_EPSILON {
        AbcTier::B
    } else {
        AbcTier::C
    }
}

pub fn xyz_tier(deviation_pct: f64) -> XyzTier {
    if deviation_pct < XYZ_X_LIMIT {
        XyzTier::X
    } else if deviation_pct < XYZ_Y_LIMIT {
        XyzTier::Y
    } else {
        XyzTier::Z
    }
}

/// Percentage deviation of `sold` from `mean`; zero when the mean is zero.
pub fn demand_deviation(sold: u64, mean: f64) -> f64 {
    if mean > 0.0 {
        (sold as f64 - mean).abs() / mean * 100.0
    } else {
        0.0
    }
}

/// Runs the ABC/XYZ classification. The result keeps the input order; the
/// profit ranking only decides the cumulative shares.
pub fn classify(records: &[CanonicalItemRecord]) -> Vec<ClassifiedItem> {
    if records.is_empty() {
        return Vec::new();
    }

    let profits: Vec<f64> = records.iter().map(item_profit).collect();
    let total_profit: f64 = profits.iter().sum();

    let shares: Vec<f64> = profits
        .iter()
        .map(|p| {
            if total_profit > 0.0 && total_profit.is_finite() {
                p / total_profit * 100.0
            } else {
                0.0
            }
        })
        .collect();

    // sort_by is stable, so equal profits keep their input order
    let mut ranking: Vec<usize> = (0..records.len()).collect();
    ranking.sort_by(|&a, &b| profits[b].total_cmp(&profits[a]));

    let mut abc = vec![AbcTier::C; records.len()];
    let mut cumulative = 0.0;
    for &idx in &ranking {
        cumulative += shares[idx];
        abc[idx] = abc_tier(cumulative);
    }

    let mean_sold =
        records.iter().map(|r| r.sold_qty as f64).sum::<f64>() / records.len() as f64;

    debug!(
        "Classifying {} items: total profit {:.2}, mean sold {:.2}",
        records.len(),
        total_profit,
        mean_sold
    );

    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let xyz = xyz_tier(demand_deviation(record.sold_qty, mean_sold));
            ClassifiedItem {
                record: record.clone(),
                profit: profits[idx],
                profit_share: shares[idx],
                abc: abc[idx],
                xyz,
                category: Category::new(abc[idx], xyz),
            }
        })
        .collect()
}

/// Checks that profit shares add up to 100 when the total profit is positive
/// (and representable) and are all zero otherwise.
pub fn verify_profit_shares(items: &[ClassifiedItem], tolerance: f64) -> Result<()> {
    let total_profit: f64 = items.iter().map(|i| i.profit).sum();
    let share_sum: f64 = items.iter().map(|i| i.profit_share).sum();

    if total_profit > 0.0 && total_profit.is_finite() {
        if (share_sum - 100.0).abs() > tolerance {
            return Err(DashboardError::ProfitShareViolation {
                total: share_sum,
                expected: 100.0,
            });
        }
    } else if let Some(item) = items.iter().find(|i| i.profit_share != 0.0) {
        return Err(DashboardError::ProfitShareViolation {
            total: item.profit_share,
            expected: 0.0,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, cost: f64, price: f64, sold: u64) -> CanonicalItemRecord {
        CanonicalItemRecord {
            name: name.to_string(),
            cost,
            price,
            sold_qty: sold,
            stock_qty: 0,
            sale_date: None,
            row_index: 0,
        }
    }

    fn categories(items: &[ClassifiedItem]) -> Vec<String> {
        items.iter().map(|i| i.category.to_string()).collect()
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(classify(&[]).is_empty());
    }

    #[test]
    fn test_profit_and_shares() {
        let items = classify(&[
            record("Apple", 6000.0, 8000.0, 120),
            record("Mint", 5500.0, 7500.0, 80),
            record("Peach", 6200.0, 9000.0, 50),
        ]);

        assert_eq!(items[0].profit, 240_000.0);
        assert_eq!(items[1].profit, 160_000.0);
        assert_eq!(items[2].profit, 140_000.0);

        let share_sum: f64 = items.iter().map(|i| i.profit_share).sum();
        assert!((share_sum - 100.0).abs() < 1e-9);
        assert!(verify_profit_shares(&items, 1e-6).is_ok());
    }

    #[test]
    fn test_equal_profits_follow_input_order() {
        // each item holds 25%: cumulative 25, 50, 75, 100
        let items = classify(&[
            record("w", 0.0, 10.0, 10),
            record("x", 0.0, 10.0, 10),
            record("y", 0.0, 10.0, 10),
            record("z", 0.0, 10.0, 10),
        ]);

        let tiers: Vec<AbcTier> = items.iter().map(|i| i.abc).collect();
        assert_eq!(tiers, vec![AbcTier::A, AbcTier::A, AbcTier::A, AbcTier::C]);
    }

    #[test]
    fn test_straddling_item_uses_its_own_cumulative() {
        // shares 70, 20, 10 -> cumulative 70, 90, 100
        let items = classify(&[
            record("small", 0.0, 1.0, 10),
            record("big", 0.0, 1.0, 70),
            record("mid", 0.0, 1.0, 20),
        ]);

        assert_eq!(items[0].abc, AbcTier::C);
        assert_eq!(items[1].abc, AbcTier::A);
        assert_eq!(items[2].abc, AbcTier::B);
    }

    #[test]
    fn test_cumulative_exactly_at_boundary() {
        // shares 80, 15, 5 -> cumulative 80, 95, 100
        let items = classify(&[
            record("a", 0.0, 1.0, 80),
            record("b", 0.0, 1.0, 15),
            record("c", 0.0, 1.0, 5),
        ]);
        let tiers: Vec<AbcTier> = items.iter().map(|i| i.abc).collect();
        assert_eq!(tiers, vec![AbcTier::A, AbcTier::B, AbcTier::C]);
    }

    #[test]
    fn test_xyz_boundaries() {
        let stable = classify(&[
            record("a", 1.0, 2.0, 100),
            record("b", 1.0, 2.0, 100),
            record("c", 1.0, 2.0, 100),
        ]);
        assert!(stable.iter().all(|i| i.xyz == XyzTier::X));

        let spread = classify(&[
            record("a", 1.0, 2.0, 50),
            record("b", 1.0, 2.0, 100),
            record("c", 1.0, 2.0, 150),
        ]);
        let tiers: Vec<XyzTier> = spread.iter().map(|i| i.xyz).collect();
        assert_eq!(tiers, vec![XyzTier::Z, XyzTier::X, XyzTier::Z]);

        assert_eq!(xyz_tier(19.999), XyzTier::X);
        assert_eq!(xyz_tier(20.0), XyzTier::Y);
        assert_eq!(xyz_tier(49.999), XyzTier::Y);
        assert_eq!(xyz_tier(50.0), XyzTier::Z);
    }

    #[test]
    fn test_non_positive_total_profit_zeroes_shares() {
        let items = classify(&[
            record("loss", 10.0, 5.0, 10),
            record("flat", 3.0, 3.0, 7),
            record("gain", 1.0, 2.0, 10),
        ]);

        assert!(items.iter().all(|i| i.profit_share == 0.0));
        // cumulative never leaves zero, so the formula puts everything in A
        assert!(items.iter().all(|i| i.abc == AbcTier::A));
        assert!(verify_profit_shares(&items, 1e-6).is_ok());
    }

    #[test]
    fn test_zero_sales_everywhere_is_stable_demand() {
        let items = classify(&[record("a", 1.0, 2.0, 0), record("b", 1.0, 2.0, 0)]);
        assert!(items.iter().all(|i| i.xyz == XyzTier::X));
        assert!(items.iter().all(|i| i.profit_share == 0.0));
    }

    #[test]
    fn test_negative_items_inside_positive_total() {
        let items = classify(&[
            record("winner", 0.0, 10.0, 12),
            record("loser", 10.0, 0.0, 2),
        ]);

        assert!((items[0].profit_share - 120.0).abs() < 1e-9);
        assert!((items[1].profit_share + 20.0).abs() < 1e-9);
        assert_eq!(items[0].abc, AbcTier::C);
        assert_eq!(items[1].abc, AbcTier::C);
        assert!(verify_profit_shares(&items, 1e-9).is_ok());
    }

    #[test]
    fn test_classification_is_idempotent_and_order_preserving() {
        let records = vec![
            record("first", 2.0, 5.0, 30),
            record("second", 1.0, 9.0, 3),
            record("third", 4.0, 4.5, 300),
        ];

        let once = classify(&records);
        let twice = classify(&records);
        assert_eq!(once, twice);

        let names: Vec<&str> = once.iter().map(|i| i.record.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(categories(&once)
            .iter()
            .all(|c| Category::ALL.iter().any(|k| &k.to_string() == c)));
    }

    #[test]
    fn test_overflowing_profit_keeps_shares_finite() {
        let items = classify(&[
            record("huge", 0.0, 1e300, 10_000_000_000),
            record("normal", 1.0, 3.0, 10),
        ]);

        assert_eq!(items[0].profit, 0.0);
        assert_eq!(items[1].profit, 20.0);
        assert!(items.iter().all(|i| i.profit_share.is_finite()));
        assert!(verify_profit_shares(&items, 1e-9).is_ok());

        // each profit fits, the sum does not
        let saturated = classify(&[
            record("a", 0.0, 1e299, 1_000_000_000),
            record("b", 0.0, 1e299, 1_000_000_000),
        ]);
        assert!(saturated.iter().all(|i| i.profit.is_finite()));
        assert!(saturated.iter().all(|i| i.profit_share == 0.0));
        assert!(verify_profit_shares(&saturated, 1e-9).is_ok());
    }

    #[test]
    fn test_verify_detects_tampered_shares() {
        let mut items = classify(&[record("a", 0.0, 1.0, 10), record("b", 0.0, 1.0, 30)]);
        items[0].profit_share += 5.0;
        assert!(matches!(
            verify_profit_shares(&items, 0.01),
            Err(DashboardError::ProfitShareViolation { .. })
        ));
    }
}
