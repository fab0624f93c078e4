//! Recency, frequency and monetary metrics per customer

use chrono::{NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::data::PreparedRecord;
use crate::error::{Result, RfmError};

/// RFM metrics for one customer
#[derive(Debug, Clone, PartialEq)]
pub struct RfmRecord {
    pub customer_id: String,
    /// Whole days between the customer's last order and the analysis date
    pub recency: i64,
    pub frequency: u32,
    pub monetary: f64,
}

/// Metrics for a run together with the anchor they were measured from
#[derive(Debug, Clone, PartialEq)]
pub struct RfmTable {
    pub analysis_date: NaiveDateTime,
    pub records: Vec<RfmRecord>,
}

/// Latest `last_order_date` in the dataset plus `offset_days`
pub fn analysis_date(prepared: &[PreparedRecord], offset_days: i64) -> Result<NaiveDateTime> {
    let latest = prepared
        .iter()
        .map(|r| r.order.last_order_date)
        .max()
        .ok_or(RfmError::EmptyDataset)?;
    TimeDelta::try_days(offset_days)
        .and_then(|offset| latest.checked_add_signed(offset))
        .ok_or_else(|| {
            RfmError::InvalidConfig(format!(
                "anchor offset of {offset_days} days from {latest} is out of range"
            ))
        })
}

/// Compute recency, frequency and monetary for every prepared record
///
/// # Arguments
/// * `prepared` - Prepared customer records
/// * `offset_days` - Days added to the latest order date to form the anchor
///
/// # Returns
/// * `RfmTable` with one record per customer, in input order
pub fn compute_rfm(prepared: &[PreparedRecord], offset_days: i64) -> Result<RfmTable> {
    let analysis_date = analysis_date(prepared, offset_days)?;

    let records = prepared
        .iter()
        .map(|r| RfmRecord {
            customer_id: r.order.customer_id.clone(),
            // num_days truncates; the span is never negative
            recency: (analysis_date - r.order.last_order_date).num_days(),
            frequency: r.order_count_total,
            monetary: r.spend_total,
        })
        .collect();

    debug!(%analysis_date, "computed rfm metrics");
    Ok(RfmTable {
        analysis_date,
        records,
    })
}
