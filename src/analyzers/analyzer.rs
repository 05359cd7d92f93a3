use std::path::Path;
use tracing::{debug, error, info};

use crate::analyzers::progress::ProgressObserver;
use crate::analyzers::types::{
    AnalysisFailure, AnalysisOptions, AnalysisResult, PartialAnalysis, Stage,
};
use crate::app_id::AppId;
use crate::error::AnalysisError;
use crate::normalize::normalize_batch;
use crate::output::{TimestampToken, write_artifacts};
use crate::services::review_source::ReviewSource;
use crate::stats::ReviewStats;

/// Runs one analysis: fetch, normalize, aggregate, write.
///
/// The app id is validated before anything is fetched. A fetch failure ends
/// the run with no partial result and no files; later failures carry what
/// was computed up to that point. Dropping the returned future while it is
/// fetching cancels the run before anything is written.
#[tracing::instrument(
    skip(source, options, observer),
    fields(app_id = %app_id, output_root = %output_root.display())
)]
pub async fn analyze<S: ReviewSource + ?Sized>(
    app_id: &str,
    output_root: &Path,
    source: &S,
    options: &AnalysisOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<AnalysisResult, AnalysisFailure> {
    let app_id = AppId::parse(app_id).map_err(|e| fail(Stage::Idle, e, None))?;

    enter(Stage::Fetching);
    observer.on_fetch_start(&app_id);

    let app_details = source
        .fetch_app_details(&app_id)
        .await
        .map_err(|e| fail(Stage::Fetching, e, None))?;
    let raw_reviews = source
        .fetch_reviews(&app_id, &options.query)
        .await
        .map_err(|e| fail(Stage::Fetching, e, None))?;

    info!(title = app_details.title().unwrap_or("<untitled>"), "Fetched app details and reviews");
    observer.on_fetch_done(&app_details);

    enter(Stage::Normalizing);
    let records = match normalize_batch(raw_reviews) {
        Ok(records) => records,
        Err(e) => {
            let partial = PartialAnalysis {
                app_details: Some(app_details),
                ..Default::default()
            };
            return Err(fail(Stage::Normalizing, e, Some(partial)));
        }
    };

    enter(Stage::Aggregating);
    let stats = ReviewStats::from_records(&records);
    info!(
        records = records.len(),
        total_count = stats.total_count,
        unrated_count = stats.unrated_count,
        mean_rating = ?stats.mean_rating,
        "Aggregated ratings"
    );
    observer.on_aggregate_done(&stats);

    enter(Stage::Writing);
    let token = options.token.clone().unwrap_or_else(TimestampToken::now);
    let artifacts = match write_artifacts(
        output_root,
        &app_id,
        &token,
        &app_details,
        &records,
        &stats.distribution,
    ) {
        Ok(paths) => paths,
        Err(failure) => {
            let partial = PartialAnalysis {
                app_details: Some(app_details),
                records: Some(records),
                stats: Some(stats),
                completed_artifacts: failure.completed,
            };
            return Err(fail(Stage::Writing, failure.error, Some(partial)));
        }
    };
    observer.on_write_done(&artifacts);

    enter(Stage::Done);
    Ok(AnalysisResult {
        app_id,
        app_details,
        records,
        stats,
        artifacts,
    })
}

fn enter(stage: Stage) {
    debug!(%stage, "Entering stage");
}

fn fail(
    stage: Stage,
    error: impl Into<AnalysisError>,
    partial: Option<PartialAnalysis>,
) -> AnalysisFailure {
    let error = error.into();
    error!(failed_during = %stage, error = %error, "Analysis failed");
    enter(Stage::Failed);
    AnalysisFailure {
        failed_during: stage,
        error,
        partial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::progress::NoopObserver;
    use crate::error::{FetchError, WriteErrorKind};
    use crate::output::ArtifactPaths;
    use crate::services::review_source::ReviewQuery;
    use crate::stats::RatingDistribution;
    use crate::types::AppDetails;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource {
        details: Value,
        reviews: Value,
        fail_reviews: bool,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(reviews: Value) -> Self {
            Self {
                details: json!({ "title": "Example", "appId": "com.example.app", "score": 4.2 }),
                reviews,
                fail_reviews: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ReviewSource for StubSource {
        async fn fetch_app_details(&self, _app_id: &AppId) -> Result<AppDetails, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            AppDetails::from_value(self.details.clone())
        }

        async fn fetch_reviews(
            &self,
            _app_id: &AppId,
            _query: &ReviewQuery,
        ) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reviews {
                Err(FetchError::Timeout)
            } else {
                Ok(self.reviews.clone())
            }
        }
    }

    /// Records hook names in call order.
    #[derive(Default)]
    struct Recorder(Vec<&'static str>);

    impl ProgressObserver for Recorder {
        fn on_fetch_start(&mut self, _app_id: &AppId) {
            self.0.push("fetch_start");
        }
        fn on_fetch_done(&mut self, _details: &AppDetails) {
            self.0.push("fetch_done");
        }
        fn on_aggregate_done(&mut self, _stats: &ReviewStats) {
            self.0.push("aggregate_done");
        }
        fn on_write_done(&mut self, _paths: &ArtifactPaths) {
            self.0.push("write_done");
        }
    }

    fn options() -> AnalysisOptions {
        AnalysisOptions {
            token: Some(TimestampToken::from_datetime(
                &Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            )),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_successful_run_calls_every_hook_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new(json!([
            { "score": 5, "content": "love it" },
            { "score": 5 },
            { "score": 3 },
            { "score": "x" }
        ]));
        let mut recorder = Recorder::default();

        let result = analyze("com.example.app", dir.path(), &source, &options(), &mut recorder)
            .await
            .unwrap();

        assert_eq!(recorder.0, ["fetch_start", "fetch_done", "aggregate_done", "write_done"]);
        assert_eq!(result.records.len(), 4);
        assert_eq!(*result.distribution(), RatingDistribution::from([0, 0, 1, 0, 2]));
        assert_eq!(result.total_count(), 3);
        assert_eq!(result.unrated_count(), 1);
        assert!(result.artifacts.reviews_csv.exists());
        assert!(result.artifacts.app_details_json.exists());
        assert!(result.artifacts.distribution_png.exists());
    }

    #[tokio::test]
    async fn test_invalid_app_id_is_rejected_before_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new(json!([]));
        let mut recorder = Recorder::default();

        let failure = analyze("not a package", dir.path(), &source, &options(), &mut recorder)
            .await
            .unwrap_err();

        assert_eq!(failure.failed_during, Stage::Idle);
        assert!(matches!(failure.error, AnalysisError::InvalidAppId(_)));
        assert!(failure.partial.is_none());
        assert!(recorder.0.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_timeout_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = StubSource::new(json!([]));
        source.fail_reviews = true;
        let mut recorder = Recorder::default();

        let failure = analyze("com.example.app", dir.path(), &source, &options(), &mut recorder)
            .await
            .unwrap_err();

        assert_eq!(failure.failed_during, Stage::Fetching);
        assert_eq!(failure.state(), Stage::Failed);
        assert_eq!(
            failure.to_string(),
            "analysis failed while fetching: fetch failed: request timed out"
        );
        assert!(failure.is_fetch_error());
        assert!(failure.partial.is_none());
        assert_eq!(recorder.0, ["fetch_start"]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_batch_keeps_app_details() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new(json!({ "reviews": "nope" }));
        let mut observer = NoopObserver;

        let failure = analyze("com.example.app", dir.path(), &source, &options(), &mut observer)
            .await
            .unwrap_err();

        assert_eq!(failure.failed_during, Stage::Normalizing);
        assert!(matches!(failure.error, AnalysisError::Normalization(_)));
        let partial = failure.partial.unwrap();
        assert_eq!(partial.app_details.unwrap().title(), Some("Example"));
        assert!(partial.records.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_reports_computed_statistics() {
        let dir = tempfile::tempdir().unwrap();
        // a plain file where the per-app directory should be
        fs::write(dir.path().join("com.example.app"), b"").unwrap();
        let source = StubSource::new(json!([{ "score": 4 }]));
        let mut recorder = Recorder::default();

        let failure = analyze("com.example.app", dir.path(), &source, &options(), &mut recorder)
            .await
            .unwrap_err();

        assert_eq!(failure.failed_during, Stage::Writing);
        match &failure.error {
            AnalysisError::Write(e) => assert_ne!(e.kind(), WriteErrorKind::SerializationFailure),
            other => panic!("unexpected error: {other}"),
        }
        let partial = failure.partial.unwrap();
        assert_eq!(partial.stats.unwrap().mean_rating, Some(4.0));
        assert_eq!(partial.records.unwrap().len(), 1);
        assert!(partial.completed_artifacts.is_empty());
        assert_eq!(recorder.0, ["fetch_start", "fetch_done", "aggregate_done"]);
    }

    #[tokio::test]
    async fn test_empty_review_list_still_writes_chart() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new(json!([]));

        let result = analyze("com.example.app", dir.path(), &source, &options(), &mut NoopObserver)
            .await
            .unwrap();

        assert_eq!(result.total_count(), 0);
        assert_eq!(result.mean_rating(), None);
        assert!(result.artifacts.distribution_png.exists());
    }
}
