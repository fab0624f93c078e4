//! Campaign target selection and CSV exports

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::config::Campaign;
use crate::data::PreparedRecord;
use crate::error::{Result, RfmError};
use crate::segment::ScoredRecord;

/// Split category interest text such as `[KADIN, ERKEK]` into tags
pub fn category_tags(text: &str) -> Vec<String> {
    text.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|tag| tag.trim().trim_matches(|c: char| c == '\'' || c == '"').trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Campaign {
    /// Whether a scored customer with these category tags is targeted
    ///
    /// A wanted tag matches any interest tag containing it, ignoring case,
    /// so `COCUK` also selects `AKTIFCOCUK`.
    pub fn matches(&self, scored: &ScoredRecord, tags: &[String]) -> bool {
        if !self.segments.contains(&scored.segment) {
            return false;
        }
        let tags: Vec<String> = tags.iter().map(|tag| tag.to_ascii_uppercase()).collect();
        self.any_of_tags.iter().any(|wanted| {
            let wanted = wanted.to_ascii_uppercase();
            tags.iter().any(|tag| tag.contains(&wanted))
        })
    }
}

/// Customers selected by a campaign, in scored order
///
/// Category interests are joined from `prepared` by customer id.
pub fn select_targets<'a>(
    campaign: &Campaign,
    prepared: &[PreparedRecord],
    scored: &'a [ScoredRecord],
) -> Vec<&'a ScoredRecord> {
    let interests: HashMap<&str, Vec<String>> = prepared
        .iter()
        .map(|r| (r.customer_id(), category_tags(&r.order.interested_categories)))
        .collect();

    scored
        .iter()
        .filter(|record| {
            interests
                .get(record.customer_id.as_str())
                .is_some_and(|tags| campaign.matches(record, tags))
        })
        .collect()
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| RfmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_frame(frame: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = create_file(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(frame)?;
    Ok(())
}

/// Write a campaign's customer ids and segments to `output_dir`
///
/// # Returns
/// * Path of the written CSV
pub fn write_campaign(
    campaign: &Campaign,
    targets: &[&ScoredRecord],
    output_dir: &Path,
) -> Result<PathBuf> {
    let ids: Vec<&str> = targets.iter().map(|r| r.customer_id.as_str()).collect();
    let segments: Vec<&str> = targets.iter().map(|r| r.segment.as_str()).collect();

    let mut frame = df!(
        "customer_id" => ids,
        "segment" => segments
    )?;

    let path = output_dir.join(&campaign.file_name);
    write_frame(&mut frame, &path)?;
    info!(
        campaign = %campaign.name,
        customers = targets.len(),
        path = %path.display(),
        "wrote campaign targets"
    );
    Ok(path)
}

/// Build a frame of every scored record
pub fn scores_frame(scored: &[ScoredRecord]) -> Result<DataFrame> {
    let score = |f: fn(&ScoredRecord) -> u8| -> Vec<u32> {
        scored.iter().map(|r| u32::from(f(r))).collect()
    };
    let frame = df!(
        "customer_id" => scored.iter().map(|r| r.customer_id.as_str()).collect::<Vec<_>>(),
        "recency" => scored.iter().map(|r| r.recency).collect::<Vec<_>>(),
        "frequency" => scored.iter().map(|r| r.frequency).collect::<Vec<_>>(),
        "monetary" => scored.iter().map(|r| r.monetary).collect::<Vec<_>>(),
        "recency_score" => score(|r| r.recency_score),
        "frequency_score" => score(|r| r.frequency_score),
        "monetary_score" => score(|r| r.monetary_score),
        "rf_code" => scored.iter().map(|r| r.rf_code.as_str()).collect::<Vec<_>>(),
        "segment" => scored.iter().map(|r| r.segment.as_str()).collect::<Vec<_>>()
    )?;
    Ok(frame)
}

/// Write every scored record, monetary score included
pub fn write_scores(scored: &[ScoredRecord], path: &Path) -> Result<()> {
    let mut frame = scores_frame(scored)?;
    write_frame(&mut frame, path)?;
    info!(customers = scored.len(), path = %path.display(), "wrote scores");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{mens_kids_discount_campaign, womens_launch_campaign};
    use crate::data::{parse_datetime, CustomerOrder};
    use crate::segment::Segment;
    use tempfile::tempdir;

    fn customer(id: &str, segment: Segment, categories: &str) -> (PreparedRecord, ScoredRecord) {
        let date = parse_datetime("2021-01-01").unwrap();
        let prepared = PreparedRecord {
            order: CustomerOrder {
                customer_id: id.to_string(),
                order_channel: None,
                last_order_channel: None,
                first_order_date: date,
                last_order_date: date,
                last_order_date_online: None,
                last_order_date_offline: None,
                order_count_online: 1,
                order_count_offline: 0,
                spend_online: 10.0,
                spend_offline: 0.0,
                interested_categories: categories.to_string(),
            },
            order_count_total: 1,
            spend_total: 10.0,
        };
        let scored = ScoredRecord {
            customer_id: id.to_string(),
            recency: 2,
            frequency: 1,
            monetary: 10.0,
            recency_score: 3,
            frequency_score: 3,
            monetary_score: 3,
            rf_code: "33".to_string(),
            segment,
        };
        (prepared, scored)
    }

    fn fixture() -> (Vec<PreparedRecord>, Vec<ScoredRecord>) {
        [
            customer("champ", Segment::Champions, "KADIN,ERKEK"),
            customer("sleeper", Segment::Hibernating, "COCUK"),
            customer("drowsy", Segment::AboutToSleep, "[KADIN, ERKEK, COCUK]"),
            customer("loyal_men", Segment::LoyalCustomers, "[ERKEK]"),
            customer("new_women", Segment::NewCustomers, "[KADIN]"),
        ]
        .into_iter()
        .unzip()
    }

    fn ids(targets: &[&ScoredRecord]) -> Vec<String> {
        targets.iter().map(|r| r.customer_id.clone()).collect()
    }

    #[test]
    fn test_category_tags() {
        assert_eq!(category_tags("[KADIN, ERKEK]"), vec!["KADIN", "ERKEK"]);
        assert_eq!(category_tags("KADIN,ERKEK"), vec!["KADIN", "ERKEK"]);
        assert_eq!(category_tags("['COCUK']"), vec!["COCUK"]);
        assert!(category_tags("[]").is_empty());
        assert!(category_tags("").is_empty());
    }

    #[test]
    fn test_womens_launch_targets() {
        let (prepared, scored) = fixture();
        let targets = select_targets(&womens_launch_campaign(), &prepared, &scored);
        assert_eq!(ids(&targets), vec!["champ"]);
    }

    #[test]
    fn test_mens_kids_discount_targets() {
        let (prepared, scored) = fixture();
        let targets = select_targets(&mens_kids_discount_campaign(), &prepared, &scored);
        assert_eq!(ids(&targets), vec!["sleeper"]);
    }

    #[test]
    fn test_about_to_sleep_in_neither_export() {
        let (prepared, scored) = fixture();
        for campaign in [womens_launch_campaign(), mens_kids_discount_campaign()] {
            let targets = select_targets(&campaign, &prepared, &scored);
            assert!(!ids(&targets).contains(&"drowsy".to_string()));
        }
    }

    #[test]
    fn test_active_kids_tag_joins_discount_export() {
        let (prepared, scored): (Vec<_>, Vec<_>) = [
            customer("active_kid", Segment::Hibernating, "[AKTIFCOCUK]"),
            customer("sporty", Segment::Hibernating, "[AKTIFSPOR]"),
            customer("lowercase", Segment::AtRisk, "[erkek]"),
        ]
        .into_iter()
        .unzip();
        let targets = select_targets(&mens_kids_discount_campaign(), &prepared, &scored);
        assert_eq!(ids(&targets), vec!["active_kid", "lowercase"]);
    }

    #[test]
    fn test_write_campaign() {
        let (prepared, scored) = fixture();
        let campaign = womens_launch_campaign();
        let targets = select_targets(&campaign, &prepared, &scored);
        let temp_dir = tempdir().unwrap();

        let path = write_campaign(&campaign, &targets, temp_dir.path()).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines, vec!["customer_id,segment", "champ,champions"]);
    }

    #[test]
    fn test_write_scores() {
        let (_, scored) = fixture();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("scores.csv");

        write_scores(&scored, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();

        assert!(contents.starts_with(
            "customer_id,recency,frequency,monetary,recency_score,frequency_score,monetary_score,rf_code,segment"
        ));
        assert_eq!(contents.lines().count(), scored.len() + 1);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let (_, scored) = fixture();
        let err = write_scores(&scored, Path::new("/nonexistent/dir/scores.csv")).unwrap_err();
        assert!(matches!(err, RfmError::Io { .. }));
    }
}
