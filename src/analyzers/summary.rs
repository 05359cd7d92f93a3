//! Human-oriented report of a finished analysis.

use serde::Serialize;
use tracing::info;

use crate::analyzers::types::AnalysisResult;
use crate::stats::ReviewStats;
use crate::types::{AppDetails, ReviewRecord};

/// Number of recent reviews shown in the report.
pub const RECENT_REVIEWS: usize = 5;

const PREVIEW_CHARS: usize = 200;

/// Text-level facts about a batch of reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    /// Mean review length in characters over all records.
    pub average_text_length: Option<f64>,
    /// Newest first. Records without a timestamp are never included.
    pub most_recent: Vec<ReviewRecord>,
}

impl ReviewSummary {
    pub fn from_records(records: &[ReviewRecord], recent: usize) -> Self {
        let average_text_length = (!records.is_empty()).then(|| {
            let chars: usize = records.iter().map(|r| r.text.chars().count()).sum();
            chars as f64 / records.len() as f64
        });

        let mut dated: Vec<&ReviewRecord> =
            records.iter().filter(|r| r.timestamp.is_some()).collect();
        dated.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        ReviewSummary {
            average_text_length,
            most_recent: dated.into_iter().take(recent).cloned().collect(),
        }
    }
}

/// Serializable digest of a run for `--json` output.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub app_id: &'a str,
    pub title: Option<&'a str>,
    pub records: usize,
    pub stats: &'a ReviewStats,
    pub summary: ReviewSummary,
    pub artifacts: &'a crate::output::ArtifactPaths,
}

impl<'a> AnalysisReport<'a> {
    pub fn new(result: &'a AnalysisResult) -> Self {
        Self {
            app_id: result.app_id.as_str(),
            title: result.app_details.title(),
            records: result.records.len(),
            stats: &result.stats,
            summary: ReviewSummary::from_records(&result.records, RECENT_REVIEWS),
            artifacts: &result.artifacts,
        }
    }
}

pub fn log_app_details(details: &AppDetails) {
    let installs = details.installs();
    info!(
        title = details.title().unwrap_or("-"),
        package = details.package_name().unwrap_or("-"),
        score = ?details.average_rating(),
        reviews = ?details.review_count(),
        installs = installs.as_deref().unwrap_or("-"),
        updated = ?details.updated(),
        "App details"
    );
}

pub fn log_stats(stats: &ReviewStats) {
    for (star, count) in stats.distribution.iter() {
        info!(star, count, share = %format!("{:.1}%", stats.share(star)), "Ratings distribution");
    }
    match stats.mean_rating {
        Some(mean) => info!(
            total_count = stats.total_count,
            unrated_count = stats.unrated_count,
            mean_rating = %format!("{mean:.2}"),
            "Rating summary"
        ),
        None => info!(
            unrated_count = stats.unrated_count,
            "No rated reviews, mean rating unavailable"
        ),
    }
}

/// Logs the full report: details, distribution, text summary, artifacts.
pub fn log_report(result: &AnalysisResult) {
    log_app_details(&result.app_details);
    log_stats(&result.stats);

    let summary = ReviewSummary::from_records(&result.records, RECENT_REVIEWS);
    info!(
        reviews = result.records.len(),
        average_length = %summary
            .average_text_length
            .map(|l| format!("{l:.1}"))
            .unwrap_or_else(|| "-".to_string()),
        "Review analysis"
    );
    for review in &summary.most_recent {
        info!(
            rating = ?review.rating,
            date = ?review.timestamp,
            content = %preview(&review.text),
            "Recent review"
        );
    }

    info!(
        reviews = %result.artifacts.reviews_csv.display(),
        app_details = %result.artifacts.app_details_json.display(),
        chart = %result.artifacts.distribution_png.display(),
        "Artifacts saved"
    );
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn review(text: &str, day: Option<u32>) -> ReviewRecord {
        ReviewRecord {
            rating: Some(4),
            text: text.to_string(),
            timestamp: day.map(|d| Utc.with_ymd_and_hms(2024, 2, d, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_average_length_counts_characters() {
        let summary = ReviewSummary::from_records(&[review("héllo", None), review("", None)], 5);
        assert_eq!(summary.average_text_length, Some(2.5));
    }

    #[test]
    fn test_empty_records_have_no_average() {
        let summary = ReviewSummary::from_records(&[], 5);
        assert_eq!(summary.average_text_length, None);
        assert!(summary.most_recent.is_empty());
    }

    #[test]
    fn test_most_recent_is_newest_first_and_skips_undated() {
        let records = vec![
            review("old", Some(1)),
            review("undated", None),
            review("newest", Some(9)),
            review("middle", Some(5)),
        ];

        let summary = ReviewSummary::from_records(&records, 2);
        let texts: Vec<&str> = summary.most_recent.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["newest", "middle"]);
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "a".repeat(250);
        let p = preview(&long);
        assert_eq!(p.len(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
