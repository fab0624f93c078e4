//! rfmforge: Customer segmentation CLI using RFM quantile scoring
//!
//! This is the main entrypoint that orchestrates data loading, scoring,
//! segment reporting and campaign exports.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rfmforge::{
    classify, create_segment_chart, export, load_orders, load_settings, report, run_pipeline,
    segment, Args, RfmConfig, Settings,
};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    // Check if in lookup mode
    if let Some((recency, frequency)) = args.parse_lookup_scores()? {
        return run_lookup_mode(recency, frequency);
    }

    let settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    run_full_pipeline(&args, settings)
}

/// Classify a single score pair without loading data
fn run_lookup_mode(recency: u8, frequency: u8) -> Result<()> {
    println!("=== Lookup Mode ===");
    let segment = classify(recency, frequency)?;
    println!("rf code {}: {}", segment::rf_code(recency, frequency), segment);
    Ok(())
}

/// CLI flags take precedence over the config file
fn effective_config(args: &Args, settings: &Settings) -> Result<RfmConfig> {
    let config = RfmConfig {
        quantiles: args.quantiles.unwrap_or(settings.rfm.quantiles),
        anchor_offset_days: args.anchor_offset_days.unwrap_or(settings.rfm.anchor_offset_days),
    };
    config.validate()?;
    Ok(config)
}

/// Run the full segmentation pipeline
fn run_full_pipeline(args: &Args, settings: Settings) -> Result<()> {
    println!("=== RFM Segmentation Pipeline ===\n");

    let start_time = Instant::now();
    let config = effective_config(args, &settings)?;
    debug!(?config, campaigns = settings.campaigns.len(), "effective settings");

    // Step 1: Load data
    info!(input = %args.input.display(), "loading orders");
    let data_start = Instant::now();
    let raw = load_orders(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    debug!(elapsed = ?data_start.elapsed(), rows = raw.len(), "loaded orders");

    // Step 2: Prepare, measure, score and segment
    let analysis = run_pipeline(&raw, &config).context("segmentation failed")?;
    println!("✓ Data prepared: {} customers", analysis.prepared.len());
    println!("✓ Analysis date: {}", analysis.analysis_date);

    // Step 3: Descriptive statistics
    report::print_dataset_statistics(&analysis.prepared, args.top)?;
    report::print_segment_statistics(&analysis.scored)?;

    // Step 4: Exports
    for campaign in &settings.campaigns {
        let targets = export::select_targets(campaign, &analysis.prepared, &analysis.scored);
        let path = export::write_campaign(campaign, &targets, &args.output_dir)
            .with_context(|| format!("failed to export campaign {}", campaign.name))?;
        println!("✓ {}: {} customers -> {}", campaign.name, targets.len(), path.display());
    }

    if let Some(path) = &args.scores_out {
        export::write_scores(&analysis.scored, path).context("failed to export scores")?;
        println!("✓ Scores saved to: {}", path.display());
    }

    if let Some(path) = &args.chart {
        create_segment_chart(&analysis.scored, path).context("failed to draw segment chart")?;
        println!("✓ Segment chart saved to: {}", path.display());
    }

    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}
