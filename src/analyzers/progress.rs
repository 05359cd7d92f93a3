//! Stage-completion notifications.
//!
//! The orchestrator calls each hook at most once, always in the order
//! fetch start, fetch done, aggregate done, write done. A failed run simply
//! stops calling hooks.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::app_id::AppId;
use crate::output::ArtifactPaths;
use crate::stats::ReviewStats;
use crate::types::AppDetails;

pub trait ProgressObserver: Send {
    fn on_fetch_start(&mut self, _app_id: &AppId) {}

    fn on_fetch_done(&mut self, _details: &AppDetails) {}

    fn on_aggregate_done(&mut self, _stats: &ReviewStats) {}

    fn on_write_done(&mut self, _paths: &ArtifactPaths) {}
}

/// Ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    FetchStarted { app_id: AppId },
    FetchDone { title: Option<String> },
    AggregateDone { stats: ReviewStats },
    WriteDone { paths: ArtifactPaths },
}

impl ProgressEvent {
    /// Position of this event in the fixed sequence, starting at 1.
    pub fn step(&self) -> u64 {
        match self {
            ProgressEvent::FetchStarted { .. } => 1,
            ProgressEvent::FetchDone { .. } => 2,
            ProgressEvent::AggregateDone { .. } => 3,
            ProgressEvent::WriteDone { .. } => 4,
        }
    }

    pub const STEPS: u64 = 4;
}

/// Forwards notifications as [`ProgressEvent`]s over a channel.
///
/// A dropped receiver is not an error; the run carries on unobserved.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_fetch_start(&mut self, app_id: &AppId) {
        self.send(ProgressEvent::FetchStarted {
            app_id: app_id.clone(),
        });
    }

    fn on_fetch_done(&mut self, details: &AppDetails) {
        self.send(ProgressEvent::FetchDone {
            title: details.title().map(str::to_string),
        });
    }

    fn on_aggregate_done(&mut self, stats: &ReviewStats) {
        self.send(ProgressEvent::AggregateDone {
            stats: stats.clone(),
        });
    }

    fn on_write_done(&mut self, paths: &ArtifactPaths) {
        self.send(ProgressEvent::WriteDone {
            paths: paths.clone(),
        });
    }
}
