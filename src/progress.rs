//! Terminal progress display for a background analysis.

use indicatif::{ProgressBar, ProgressStyle};
use play_review_rater::analyzers::{AnalysisHandle, AnalysisOutcome, ProgressEvent};
use tracing::warn;

/// Status line shown for each completed step.
fn describe(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::FetchStarted { app_id } => format!("Fetching {app_id}"),
        ProgressEvent::FetchDone { title } => {
            format!("Fetched {}, normalizing", title.as_deref().unwrap_or("app"))
        }
        ProgressEvent::AggregateDone { stats } => {
            format!("Aggregated {} rated reviews, writing artifacts", stats.total_count)
        }
        ProgressEvent::WriteDone { .. } => "Artifacts written".to_string(),
    }
}

fn progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(ProgressEvent::STEPS);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Drives the progress bar until the run ends. Ctrl+C cancels the run.
pub async fn watch(mut handle: AnalysisHandle, hidden: bool) -> AnalysisOutcome {
    let pb = progress_bar(hidden);

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => {
                    pb.set_position(event.step());
                    pb.set_message(describe(&event));
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, cancelling analysis");
                handle.cancel();
                break;
            }
        }
    }

    let outcome = handle.join().await;
    match &outcome {
        AnalysisOutcome::Completed(_) => pb.finish_with_message("Analysis complete"),
        AnalysisOutcome::Failed(_) => pb.abandon_with_message("Analysis failed"),
        AnalysisOutcome::Cancelled => pb.abandon_with_message("Analysis cancelled"),
    }
    outcome
}
