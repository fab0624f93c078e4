//! Segment size chart using Plotters

use std::path::Path;

use plotters::prelude::*;

use crate::error::{Result, RfmError};
use crate::segment::{segment_counts, ScoredRecord};

fn chart_error(error: impl std::fmt::Display) -> RfmError {
    RfmError::Chart(error.to_string())
}

/// Draw a bar chart of customers per segment
///
/// # Arguments
/// * `scored` - Segmented customers
/// * `output_path` - Path to save the PNG chart
pub fn create_segment_chart(scored: &[ScoredRecord], output_path: &Path) -> Result<()> {
    let counts = segment_counts(scored);
    let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let labels: Vec<&'static str> = counts.iter().map(|(s, _)| s.as_str()).collect();

    let root = BitMapBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customers per RFM Segment", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0usize..counts.len()).into_segmented(),
            0usize..(max_count + max_count / 10 + 1),
        )
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&|value: &SegmentValue<usize>| match value {
            SegmentValue::CenterOf(i) => labels.get(*i).copied().unwrap_or_default().to_string(),
            _ => String::new(),
        })
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(chart_error)?;

    for (i, (_, count)) in counts.iter().enumerate() {
        let color = Palette99::pick(i);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(SegmentValue::Exact(i), 0), (SegmentValue::Exact(i + 1), *count)],
                color.filled(),
            )))
            .map_err(chart_error)?;
    }

    root.present().map_err(chart_error)?;
    Ok(())
}
