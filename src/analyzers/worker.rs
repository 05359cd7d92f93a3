//! Runs an analysis on a background tokio task.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{Instrument, info_span, warn};

use crate::analyzers::analyzer::analyze;
use crate::analyzers::progress::{ChannelObserver, ProgressEvent};
use crate::analyzers::types::{AnalysisFailure, AnalysisOptions, AnalysisResult};
use crate::services::review_source::ReviewSource;

/// How a background run ended.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Completed(Box<AnalysisResult>),
    Failed(AnalysisFailure),
    Cancelled,
}

/// Handle to a run started by [`spawn_analysis`].
///
/// Progress events arrive on [`AnalysisHandle::next_event`]; the stream ends
/// when the run finishes or is cancelled.
pub struct AnalysisHandle {
    events: UnboundedReceiver<ProgressEvent>,
    task: JoinHandle<Result<AnalysisResult, AnalysisFailure>>,
}

impl AnalysisHandle {
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Abandons the run. Takes effect at the next await point, which is
    /// always inside the fetch stage; artifacts are written without awaiting.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub async fn join(self) -> AnalysisOutcome {
        match self.task.await {
            Ok(Ok(result)) => AnalysisOutcome::Completed(Box::new(result)),
            Ok(Err(failure)) => AnalysisOutcome::Failed(failure),
            Err(e) if e.is_cancelled() => {
                warn!("Analysis cancelled");
                AnalysisOutcome::Cancelled
            }
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

/// Spawns one analysis onto the tokio runtime.
pub fn spawn_analysis(
    app_id: String,
    output_root: PathBuf,
    source: Arc<dyn ReviewSource>,
    options: AnalysisOptions,
) -> AnalysisHandle {
    let (tx, events) = mpsc::unbounded_channel();
    let span = info_span!("analysis_worker", app_id = %app_id);

    let task = tokio::spawn(
        async move {
            let mut observer = ChannelObserver::new(tx);
            analyze(&app_id, &output_root, source.as_ref(), &options, &mut observer).await
        }
        .instrument(span),
    );

    AnalysisHandle { events, task }
}
