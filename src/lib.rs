//! rfmforge: customer segmentation with RFM quantile scoring
//!
//! This library prepares per-customer order histories, derives Recency,
//! Frequency and Monetary metrics, scores each metric into quantile buckets
//! and maps the recency/frequency scores onto named marketing segments.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod report;
pub mod rfm;
pub mod score;
pub mod segment;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::{load_settings, Campaign, RfmConfig, Settings};
pub use data::{load_orders, prepare, read_orders, PreparedRecord, RawOrderRecord};
pub use error::{Result, RfmError};
pub use export::{select_targets, write_campaign, write_scores};
pub use pipeline::{run_pipeline, RfmAnalysis};
pub use rfm::{compute_rfm, RfmRecord};
pub use score::quantile_bins;
pub use segment::{classify, segment_customers, ScoredRecord, Segment};
pub use viz::create_segment_chart;
