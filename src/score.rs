//! Quantile scoring of RFM metrics

use std::cmp::Ordering;

use crate::error::{Result, RfmError};
use crate::rfm::RfmRecord;

/// Quantile scores for one customer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricScores {
    pub recency: u8,
    pub frequency: u8,
    pub monetary: u8,
}

/// Assign each value to one of `buckets` equal-population bins
///
/// Values are ranked by `(value, position)`, so equal values are split
/// across bins by input order rather than collapsing bins together. Bin 1
/// holds the lowest values.
///
/// # Arguments
/// * `values` - Metric values in input order
/// * `buckets` - Number of bins to form
///
/// # Returns
/// * Bin number in `1..=buckets` for each value, in input order
pub fn quantile_bins(values: &[f64], buckets: usize) -> Result<Vec<u8>> {
    if buckets == 0 || buckets >= u8::MAX as usize {
        return Err(RfmError::InvalidConfig(format!(
            "bucket count must be between 1 and {}, got {buckets}",
            u8::MAX - 1
        )));
    }

    let population = values.len();
    if population < buckets {
        return Err(RfmError::InsufficientData {
            population,
            buckets,
        });
    }

    let mut order: Vec<usize> = (0..population).collect();
    order.sort_by(|&a, &b| match values[a].total_cmp(&values[b]) {
        Ordering::Equal => a.cmp(&b),
        other => other,
    });

    let mut bins = vec![0u8; population];
    for (rank, &index) in order.iter().enumerate() {
        bins[index] = bin_for_rank(rank, population, buckets);
    }

    Ok(bins)
}

/// Bin of the zero-based `rank` when `population` ranks are cut into
/// `buckets` intervals of equal width over `1..=population`.
fn bin_for_rank(rank: usize, population: usize, buckets: usize) -> u8 {
    if population == 1 {
        return 1;
    }
    (rank * buckets).div_ceil(population - 1).max(1) as u8
}

/// Score recency, frequency and monetary for every customer
///
/// Frequency and monetary scores rise with the metric. Recency is inverted:
/// the most recent customers get the highest score.
pub fn score_metrics(records: &[RfmRecord], buckets: usize) -> Result<Vec<MetricScores>> {
    let recency: Vec<f64> = records.iter().map(|r| r.recency as f64).collect();
    let frequency: Vec<f64> = records.iter().map(|r| f64::from(r.frequency)).collect();
    let monetary: Vec<f64> = records.iter().map(|r| r.monetary).collect();

    let recency_bins = quantile_bins(&recency, buckets)?;
    let frequency_bins = quantile_bins(&frequency, buckets)?;
    let monetary_bins = quantile_bins(&monetary, buckets)?;

    let top = buckets as u8 + 1;
    Ok(recency_bins
        .into_iter()
        .zip(frequency_bins)
        .zip(monetary_bins)
        .map(|((r, f), m)| MetricScores {
            recency: top - r,
            frequency: f,
            monetary: m,
        })
        .collect())
}
