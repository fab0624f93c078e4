//! Descriptive statistics over prepared and scored customers

use chrono::NaiveDateTime;
use polars::prelude::*;

use crate::data::PreparedRecord;
use crate::error::{Result, RfmError};
use crate::segment::ScoredRecord;

/// Whole-dataset figures
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOverview {
    pub customers: usize,
    pub first_order: NaiveDateTime,
    pub last_order: NaiveDateTime,
    pub total_orders: u64,
    pub total_spend: f64,
}

/// Summarize the prepared dataset
pub fn overview(prepared: &[PreparedRecord]) -> Result<DatasetOverview> {
    let first_order = prepared
        .iter()
        .map(|r| r.order.first_order_date)
        .min()
        .ok_or(RfmError::EmptyDataset)?;
    let last_order = prepared
        .iter()
        .map(|r| r.order.last_order_date)
        .max()
        .ok_or(RfmError::EmptyDataset)?;

    Ok(DatasetOverview {
        customers: prepared.len(),
        first_order,
        last_order,
        total_orders: prepared.iter().map(|r| u64::from(r.order_count_total)).sum(),
        total_spend: prepared.iter().map(|r| r.spend_total).sum(),
    })
}

/// Customers, orders and spend per order channel
pub fn channel_summary(prepared: &[PreparedRecord]) -> Result<DataFrame> {
    let channels: Vec<&str> = prepared
        .iter()
        .map(|r| r.order.order_channel.as_deref().unwrap_or("unknown"))
        .collect();
    let orders: Vec<u64> = prepared.iter().map(|r| u64::from(r.order_count_total)).collect();
    let spend: Vec<f64> = prepared.iter().map(|r| r.spend_total).collect();

    let frame = df!(
        "order_channel" => channels,
        "order_count_total" => orders,
        "spend_total" => spend
    )?;

    let summary = frame
        .lazy()
        .group_by([col("order_channel")])
        .agg([
            col("order_count_total").count().alias("customers"),
            col("order_count_total").sum(),
            col("spend_total").sum(),
        ])
        .sort_by_exprs([col("order_channel")], SortMultipleOptions::default())
        .collect()?;

    Ok(summary)
}

/// Count and mean metrics per segment
pub fn segment_summary(scored: &[ScoredRecord]) -> Result<DataFrame> {
    let frame = df!(
        "segment" => scored.iter().map(|r| r.segment.as_str()).collect::<Vec<_>>(),
        "recency" => scored.iter().map(|r| r.recency).collect::<Vec<_>>(),
        "frequency" => scored.iter().map(|r| r.frequency).collect::<Vec<_>>(),
        "monetary" => scored.iter().map(|r| r.monetary).collect::<Vec<_>>()
    )?;

    let summary = frame
        .lazy()
        .group_by([col("segment")])
        .agg([
            col("recency").count().alias("customers"),
            col("recency").mean().alias("recency_mean"),
            col("frequency").mean().alias("frequency_mean"),
            col("monetary").mean().alias("monetary_mean"),
        ])
        .sort_by_exprs([col("segment")], SortMultipleOptions::default())
        .collect()?;

    Ok(summary)
}

/// The `n` customers with the highest spend
pub fn top_by_spend(prepared: &[PreparedRecord], n: usize) -> Vec<&PreparedRecord> {
    let mut ranked: Vec<&PreparedRecord> = prepared.iter().collect();
    ranked.sort_by(|a, b| b.spend_total.total_cmp(&a.spend_total));
    ranked.truncate(n);
    ranked
}

/// The `n` customers with the most orders
pub fn top_by_orders(prepared: &[PreparedRecord], n: usize) -> Vec<&PreparedRecord> {
    let mut ranked: Vec<&PreparedRecord> = prepared.iter().collect();
    ranked.sort_by(|a, b| b.order_count_total.cmp(&a.order_count_total));
    ranked.truncate(n);
    ranked
}

/// Print dataset statistics to console
pub fn print_dataset_statistics(prepared: &[PreparedRecord], top: usize) -> Result<()> {
    let overview = overview(prepared)?;

    println!("\n=== Dataset Overview ===");
    println!("Customers: {}", overview.customers);
    println!("Orders between {} and {}", overview.first_order, overview.last_order);
    println!("Total orders: {}", overview.total_orders);
    println!("Total spend: {:.2}", overview.total_spend);

    println!("\n=== Order Channels ===");
    println!("{}", channel_summary(prepared)?);

    println!("\nTop {top} customers by spend:");
    for record in top_by_spend(prepared, top) {
        println!("  {:<40} {:>12.2}", record.customer_id(), record.spend_total);
    }

    println!("\nTop {top} customers by order count:");
    for record in top_by_orders(prepared, top) {
        println!("  {:<40} {:>12}", record.customer_id(), record.order_count_total);
    }

    Ok(())
}

/// Print per-segment sizes and metric means to console
pub fn print_segment_statistics(scored: &[ScoredRecord]) -> Result<()> {
    println!("\n=== Segment Statistics ===");
    println!("Scored customers: {}", scored.len());
    println!("{}", segment_summary(scored)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{parse_datetime, prepare, RawOrderRecord};
    use crate::segment::Segment;

    fn raw(id: &str, channel: &str, last: &str, orders: &str, spend: &str) -> RawOrderRecord {
        RawOrderRecord {
            customer_id: Some(id.to_string()),
            order_channel: Some(channel.to_string()),
            first_order_date: Some("2020-01-01".to_string()),
            last_order_date: Some(last.to_string()),
            order_count_online: Some(orders.to_string()),
            spend_online: Some(spend.to_string()),
            ..RawOrderRecord::default()
        }
    }

    fn fixture() -> Vec<PreparedRecord> {
        prepare(&[
            raw("a", "Android App", "2021-01-10", "3", "300"),
            raw("b", "Desktop", "2021-02-10", "1", "50"),
            raw("c", "Android App", "2021-03-10", "7", "120"),
        ])
        .unwrap()
    }

    fn scored(id: &str, segment: Segment, recency: i64) -> ScoredRecord {
        ScoredRecord {
            customer_id: id.to_string(),
            recency,
            frequency: 2,
            monetary: 100.0,
            recency_score: 1,
            frequency_score: 1,
            monetary_score: 1,
            rf_code: "11".to_string(),
            segment,
        }
    }

    #[test]
    fn test_overview() {
        let overview = overview(&fixture()).unwrap();

        assert_eq!(overview.customers, 3);
        assert_eq!(overview.first_order, parse_datetime("2020-01-01").unwrap());
        assert_eq!(overview.last_order, parse_datetime("2021-03-10").unwrap());
        assert_eq!(overview.total_orders, 11);
        assert_eq!(overview.total_spend, 470.0);
    }

    #[test]
    fn test_overview_of_empty_dataset() {
        assert!(matches!(overview(&[]), Err(RfmError::EmptyDataset)));
    }

    #[test]
    fn test_channel_summary() {
        let summary = channel_summary(&fixture()).unwrap();
        assert_eq!(summary.height(), 2);

        let customers = summary
            .column("customers")
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::UInt64)
            .unwrap();
        let customers = customers.u64().unwrap();
        // sorted by channel name: Android App, Desktop
        assert_eq!(customers.get(0), Some(2));
        assert_eq!(customers.get(1), Some(1));

        let orders = summary
            .column("order_count_total")
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::UInt64)
            .unwrap();
        assert_eq!(orders.u64().unwrap().get(0), Some(10));
    }

    #[test]
    fn test_segment_summary() {
        let records = vec![
            scored("a", Segment::Champions, 2),
            scored("b", Segment::Champions, 4),
            scored("c", Segment::Hibernating, 90),
        ];
        let summary = segment_summary(&records).unwrap();
        assert_eq!(summary.height(), 2);

        let recency_mean = summary
            .column("recency_mean")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0);
        // champions sorts before hibernating
        assert_eq!(recency_mean, Some(3.0));
    }

    #[test]
    fn test_top_customers() {
        let prepared = fixture();

        let by_spend: Vec<&str> =
            top_by_spend(&prepared, 2).iter().map(|r| r.customer_id()).collect();
        assert_eq!(by_spend, vec!["a", "c"]);

        let by_orders: Vec<&str> =
            top_by_orders(&prepared, 10).iter().map(|r| r.customer_id()).collect();
        assert_eq!(by_orders, vec!["c", "a", "b"]);
    }
}
