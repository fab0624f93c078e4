//! End-to-end RFM run: prepare, measure, score and segment

use chrono::NaiveDateTime;
use tracing::info;

use crate::config::RfmConfig;
use crate::data::{prepare, PreparedRecord, RawOrderRecord};
use crate::error::Result;
use crate::rfm::{compute_rfm, RfmRecord};
use crate::segment::{segment_customers, ScoredRecord};

/// Every table produced by one run
#[derive(Debug, Clone, PartialEq)]
pub struct RfmAnalysis {
    pub prepared: Vec<PreparedRecord>,
    pub analysis_date: NaiveDateTime,
    pub metrics: Vec<RfmRecord>,
    pub scored: Vec<ScoredRecord>,
}

/// Run all three stages over a raw snapshot
///
/// # Arguments
/// * `raw` - Customer rows as loaded from the input
/// * `config` - Quantile count and anchor offset
///
/// # Returns
/// * `RfmAnalysis` holding each stage's output
pub fn run_pipeline(raw: &[RawOrderRecord], config: &RfmConfig) -> Result<RfmAnalysis> {
    config.validate()?;

    let prepared = prepare(raw)?;
    info!(customers = prepared.len(), "prepared customer records");

    let table = compute_rfm(&prepared, config.anchor_offset_days)?;
    info!(analysis_date = %table.analysis_date, "computed rfm metrics");

    let scored = segment_customers(&table.records, config)?;
    info!(quantiles = config.quantiles, "scored and segmented customers");

    Ok(RfmAnalysis {
        prepared,
        analysis_date: table.analysis_date,
        metrics: table.records,
        scored,
    })
}
