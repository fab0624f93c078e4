//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::segment::parse_rf_code;

/// Customer segmentation CLI using RFM quantile scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "flo_data_20k.csv")]
    pub input: PathBuf,

    /// Optional TOML file with [rfm] settings and [[campaigns]]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory campaign exports are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of quantile buckets per metric (overrides the config file)
    #[arg(short = 'q', long)]
    pub quantiles: Option<usize>,

    /// Days added to the latest order date to form the analysis date
    #[arg(long)]
    pub anchor_offset_days: Option<i64>,

    /// Write a PNG bar chart of segment sizes to this path
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Write every scored customer to this CSV path
    #[arg(long)]
    pub scores_out: Option<PathBuf>,

    /// Number of customers listed in the top-spend and top-order tables
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Lookup mode: classify an rf code such as "53" or a score pair "5,3"
    #[arg(short, long)]
    pub lookup: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the recency and frequency scores from the lookup string
    /// Expected format: "RF" or "recency,frequency"
    pub fn parse_lookup_scores(&self) -> anyhow::Result<Option<(u8, u8)>> {
        let Some(ref lookup) = self.lookup else {
            return Ok(None);
        };

        if let Some((recency, frequency)) = lookup.split_once(',') {
            let recency: u8 = recency
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid recency score: {}", recency))?;
            let frequency: u8 = frequency
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid frequency score: {}", frequency))?;
            return Ok(Some((recency, frequency)));
        }

        match parse_rf_code(lookup) {
            Some(scores) => Ok(Some(scores)),
            None => {
                anyhow::bail!("Lookup must be a two-digit rf code like '53' or 'recency,frequency'")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup_scores() {
        let mut args = Args::parse_from(["rfmforge", "--lookup", "53"]);
        assert_eq!(args.parse_lookup_scores().unwrap(), Some((5, 3)));

        args.lookup = Some("2, 4".to_string());
        assert_eq!(args.parse_lookup_scores().unwrap(), Some((2, 4)));

        args.lookup = None;
        assert_eq!(args.parse_lookup_scores().unwrap(), None);

        args.lookup = Some("invalid".to_string());
        assert!(args.parse_lookup_scores().is_err());

        args.lookup = Some("5,x".to_string());
        assert!(args.parse_lookup_scores().is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["rfmforge"]);
        assert_eq!(args.input, PathBuf::from("flo_data_20k.csv"));
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.top, 10);
        assert_eq!(args.quantiles, None);
        assert!(!args.verbose);
    }
}
