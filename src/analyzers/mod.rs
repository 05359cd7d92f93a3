//! Analysis orchestration.
//!
//! [`analyzer::analyze`] drives one run through fetch, normalize, aggregate
//! and write, reporting each completed stage to a
//! [`progress::ProgressObserver`]. [`worker::spawn_analysis`] runs it on a
//! background task, and [`summary`] turns a result into an operator report.

pub mod analyzer;
pub mod progress;
pub mod summary;
pub mod types;
pub mod worker;

pub use analyzer::analyze;
pub use progress::{ChannelObserver, NoopObserver, ProgressEvent, ProgressObserver};
pub use types::{AnalysisFailure, AnalysisOptions, AnalysisResult, PartialAnalysis, Stage};
pub use worker::{AnalysisHandle, AnalysisOutcome, spawn_analysis};
