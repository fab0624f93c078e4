//! Segment classification from recency and frequency scores

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::Deserialize;

use crate::config::RfmConfig;
use crate::error::{Result, RfmError};
use crate::rfm::RfmRecord;
use crate::score::score_metrics;

/// Marketing segment a customer lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Hibernating,
    AtRisk,
    CantLoose,
    AboutToSleep,
    NeedAttention,
    LoyalCustomers,
    Promising,
    NewCustomers,
    PotentialLoyalists,
    Champions,
}

impl Segment {
    /// Every segment, in rule priority order
    pub const ALL: [Segment; 10] = [
        Segment::Hibernating,
        Segment::AtRisk,
        Segment::CantLoose,
        Segment::AboutToSleep,
        Segment::NeedAttention,
        Segment::LoyalCustomers,
        Segment::Promising,
        Segment::NewCustomers,
        Segment::PotentialLoyalists,
        Segment::Champions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Hibernating => "hibernating",
            Segment::AtRisk => "at_risk",
            Segment::CantLoose => "cant_loose",
            Segment::AboutToSleep => "about_to_sleep",
            Segment::NeedAttention => "need_attention",
            Segment::LoyalCustomers => "loyal_customers",
            Segment::Promising => "promising",
            Segment::NewCustomers => "new_customers",
            Segment::PotentialLoyalists => "potential_loyalists",
            Segment::Champions => "champions",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = RfmError;

    fn from_str(s: &str) -> Result<Self> {
        Segment::ALL
            .into_iter()
            .find(|segment| segment.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RfmError::InvalidConfig(format!("unknown segment {s:?}")))
    }
}

/// Inclusive score ranges that place a customer in a segment
#[derive(Debug, Clone)]
pub struct SegmentRule {
    pub recency: RangeInclusive<u8>,
    pub frequency: RangeInclusive<u8>,
    pub segment: Segment,
}

impl SegmentRule {
    const fn new(
        recency: RangeInclusive<u8>,
        frequency: RangeInclusive<u8>,
        segment: Segment,
    ) -> Self {
        Self {
            recency,
            frequency,
            segment,
        }
    }

    pub fn matches(&self, recency_score: u8, frequency_score: u8) -> bool {
        self.recency.contains(&recency_score) && self.frequency.contains(&frequency_score)
    }
}

/// Rules in priority order; the first match wins.
pub const SEGMENT_RULES: [SegmentRule; 10] = [
    SegmentRule::new(1..=2, 1..=2, Segment::Hibernating),
    SegmentRule::new(1..=2, 3..=4, Segment::AtRisk),
    SegmentRule::new(1..=2, 5..=5, Segment::CantLoose),
    SegmentRule::new(3..=3, 1..=2, Segment::AboutToSleep),
    SegmentRule::new(3..=3, 3..=3, Segment::NeedAttention),
    SegmentRule::new(3..=4, 4..=5, Segment::LoyalCustomers),
    SegmentRule::new(4..=4, 1..=1, Segment::Promising),
    SegmentRule::new(5..=5, 1..=1, Segment::NewCustomers),
    SegmentRule::new(4..=5, 2..=3, Segment::PotentialLoyalists),
    SegmentRule::new(5..=5, 4..=5, Segment::Champions),
];

/// Customer with scores and segment attached
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub customer_id: String,
    pub recency: i64,
    pub frequency: u32,
    pub monetary: f64,
    pub recency_score: u8,
    pub frequency_score: u8,
    /// Reported for analysis; segmentation ignores it.
    pub monetary_score: u8,
    pub rf_code: String,
    pub segment: Segment,
}

/// Two-character code, recency digit first
pub fn rf_code(recency_score: u8, frequency_score: u8) -> String {
    format!("{recency_score}{frequency_score}")
}

/// Split an rf code such as `"53"` back into its two scores
pub fn parse_rf_code(code: &str) -> Option<(u8, u8)> {
    let mut digits = code.trim().chars();
    let recency = digits.next()?.to_digit(10)?;
    let frequency = digits.next()?.to_digit(10)?;
    if digits.next().is_some() {
        return None;
    }
    Some((recency as u8, frequency as u8))
}

/// Map a score pair to its segment
pub fn classify(recency_score: u8, frequency_score: u8) -> Result<Segment> {
    SEGMENT_RULES
        .iter()
        .find(|rule| rule.matches(recency_score, frequency_score))
        .map(|rule| rule.segment)
        .ok_or_else(|| RfmError::UnmappedSegment {
            rf_code: rf_code(recency_score, frequency_score),
        })
}

/// Score every customer and assign segments
///
/// # Arguments
/// * `records` - RFM metrics, one per customer
/// * `config` - Quantile count used for all three scores
///
/// # Returns
/// * One `ScoredRecord` per input record, in input order
pub fn segment_customers(records: &[RfmRecord], config: &RfmConfig) -> Result<Vec<ScoredRecord>> {
    let scores = score_metrics(records, config.quantiles)?;

    records
        .iter()
        .zip(scores)
        .map(|(record, score)| {
            let segment = classify(score.recency, score.frequency)?;
            Ok(ScoredRecord {
                customer_id: record.customer_id.clone(),
                recency: record.recency,
                frequency: record.frequency,
                monetary: record.monetary,
                recency_score: score.recency,
                frequency_score: score.frequency,
                monetary_score: score.monetary,
                rf_code: rf_code(score.recency, score.frequency),
                segment,
            })
        })
        .collect()
}

/// Customer counts per segment, in rule priority order
pub fn segment_counts(scored: &[ScoredRecord]) -> Vec<(Segment, usize)> {
    Segment::ALL
        .into_iter()
        .map(|segment| {
            let count = scored.iter().filter(|r| r.segment == segment).count();
            (segment, count)
        })
        .collect()
}
