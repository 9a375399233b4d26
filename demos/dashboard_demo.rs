use business_metrics_engine::*;
use chrono::NaiveDate;

const UPLOAD: &str = r#"[
    {"Sana": "05.01.2026", "Mahsulot Nomi": "Olma", "Tannarx": 6000, "Sotish Narxi": 8000, "Sotilgan": 120, "Savdo": 960000, "Xarajat": 20000},
    {"Sana": "20.01.2026", "Mahsulot Nomi": "Yalpiz", "Tannarx": 5500, "Sotish Narxi": 7500, "Sotilgan": 80, "Savdo": 600000, "Xarajat": 15000, "Nasiya": 50000},
    {"Sana": "2026-02-03", "Mahsulot Nomi": "Shaftoli", "Tannarx": 6200, "Sotish Narxi": 9000, "Sotilgan": 50, "Savdo": 450000, "Qarz": 120000},
    {"Sana": 45000, "Mahsulot Nomi": "Non", "Tannarx": 1000, "Sotish Narxi": 1500, "Sotilgan": 100, "Savdo": 150000},
    {"Sana": "", "Mahsulot Nomi": "Choy", "Tannarx": "2 000", "Sotish Narxi": "2 600", "Sotilgan": 90}
]"#;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::default();
    let mut store = DatasetStore::new();
    let dataset = store.load(serde_json::from_str(UPLOAD)?, &config)?;

    println!("📦 Loaded {} items", dataset.items.len());
    if dataset.skipped_count > 0 {
        println!(
            "⚠️  {} rows had no usable date and are missing from monthly totals",
            dataset.skipped_count
        );
    }

    println!("\n{:<12} {:>12} {:>8} {:>4}", "Item", "Profit", "Share", "Cat");
    println!("{}", "-".repeat(40));
    for item in &dataset.items {
        println!(
            "{:<12} {:>12.0} {:>7.1}% {:>4}",
            item.record.name, item.profit, item.profit_share, item.category
        );
    }

    let now = NaiveDate::from_ymd_opt(2026, 2, 15).ok_or("invalid reference date")?;
    let quarter = PeriodSelector::trailing(PeriodKind::LastQuarter);

    println!("\n📅 Monthly totals (last quarter from {})", now);
    println!(
        "{:<8} {:>12} {:>12} {:>12}",
        "Month", "Sales", "Profit", "Cashflow"
    );
    for bucket in dataset.buckets_in(&quarter, now) {
        println!(
            "{:<8} {:>12.0} {:>12.0} {:>12.0}",
            bucket.month_key, bucket.sales_total, bucket.profit_total, bucket.cashflow_total
        );
    }

    println!("\n📊 Category summary");
    println!("{}", dataset.summary().to_json()?);

    Ok(())
}
