//! Data types used by the analysis pipeline.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::app_id::AppId;
use crate::error::AnalysisError;
use crate::output::{ArtifactKind, ArtifactPaths, TimestampToken};
use crate::services::review_source::ReviewQuery;
use crate::stats::{RatingDistribution, ReviewStats};
use crate::types::{AppDetails, ReviewRecord};

/// Orchestrator state. `Failed` is reachable from every state after `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Fetching,
    Normalizing,
    Aggregating,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Normalizing => "normalizing",
            Stage::Aggregating => "aggregating",
            Stage::Writing => "writing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        })
    }
}

/// Knobs for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub query: ReviewQuery,
    /// Fixed artifact token; the current local time is used when `None`.
    pub token: Option<TimestampToken>,
}

/// Everything one successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub app_id: AppId,
    pub app_details: AppDetails,
    pub records: Vec<ReviewRecord>,
    pub stats: ReviewStats,
    pub artifacts: ArtifactPaths,
}

impl AnalysisResult {
    pub fn distribution(&self) -> &RatingDistribution {
        &self.stats.distribution
    }

    pub fn total_count(&self) -> u64 {
        self.stats.total_count
    }

    pub fn unrated_count(&self) -> u64 {
        self.stats.unrated_count
    }

    pub fn mean_rating(&self) -> Option<f64> {
        self.stats.mean_rating
    }
}

/// Whatever was computed before a stage failed.
#[derive(Debug, Clone, Default)]
pub struct PartialAnalysis {
    pub app_details: Option<AppDetails>,
    pub records: Option<Vec<ReviewRecord>>,
    pub stats: Option<ReviewStats>,
    pub completed_artifacts: Vec<(ArtifactKind, PathBuf)>,
}

/// A run that ended in [`Stage::Failed`]. Every failure is terminal;
/// `failed_during` names the stage that was active when the error occurred.
#[derive(Debug, thiserror::Error)]
#[error("analysis failed while {failed_during}: {error}")]
pub struct AnalysisFailure {
    pub failed_during: Stage,
    #[source]
    pub error: AnalysisError,
    /// `None` when nothing was produced (invalid id or fetch failure).
    pub partial: Option<PartialAnalysis>,
}

impl AnalysisFailure {
    /// State the orchestrator is left in.
    pub fn state(&self) -> Stage {
        Stage::Failed
    }

    pub fn is_fetch_error(&self) -> bool {
        matches!(self.error, AnalysisError::Fetch(_))
    }
}
