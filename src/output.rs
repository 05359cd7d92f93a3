//! Artifact persistence for one analysis run.
//!
//! Writes the review table (CSV), the app details (JSON) and the rating chart
//! (PNG) into `<output_root>/<app_id>/`, all named with the same timestamp
//! token. Also hosts the pretty/JSON printers used by the CLI.

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app_id::AppId;
use crate::chart;
use crate::error::WriteError;
use crate::stats::RatingDistribution;
use crate::types::{AppDetails, ReviewRecord};

pub const CSV_HEADER: [&str; 3] = ["rating", "text", "timestamp"];

/// `YYYYMMDD_HHMMSS`, shared by the three artifacts of one run.
///
/// Two runs within the same second get the same token and the later run
/// overwrites the earlier files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimestampToken(String);

impl TimestampToken {
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(dt.format("%Y%m%d_%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimestampToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Reviews,
    AppDetails,
    Chart,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Reviews => "reviews table",
            ArtifactKind::AppDetails => "app details",
            ArtifactKind::Chart => "ratings chart",
        })
    }
}

/// Where one run's artifacts live. Pure function of root, app id and token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub reviews_csv: PathBuf,
    pub app_details_json: PathBuf,
    pub distribution_png: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_root: &Path, app_id: &AppId, token: &TimestampToken) -> Self {
        let dir = output_root.join(app_id.as_str());
        Self {
            reviews_csv: dir.join(format!("reviews_{token}.csv")),
            app_details_json: dir.join(format!("app_details_{token}.json")),
            distribution_png: dir.join(format!("ratings_distribution_{token}.png")),
            dir,
        }
    }

    pub fn get(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Reviews => &self.reviews_csv,
            ArtifactKind::AppDetails => &self.app_details_json,
            ArtifactKind::Chart => &self.distribution_png,
        }
    }
}

/// A failed [`write_artifacts`] call. Files finished before the failure are
/// left on disk and listed in `completed`.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct WriteFailure {
    #[source]
    pub error: WriteError,
    pub completed: Vec<(ArtifactKind, PathBuf)>,
}

/// Writes the reviews CSV, app details JSON and distribution PNG.
#[tracing::instrument(
    skip(details, records, distribution),
    fields(app_id = %app_id, token = %token, records = records.len())
)]
pub fn write_artifacts(
    output_root: &Path,
    app_id: &AppId,
    token: &TimestampToken,
    details: &AppDetails,
    records: &[ReviewRecord],
    distribution: &RatingDistribution,
) -> std::result::Result<ArtifactPaths, WriteFailure> {
    let paths = ArtifactPaths::new(output_root, app_id, token);
    let mut completed = Vec::new();

    fs::create_dir_all(&paths.dir).map_err(|e| WriteFailure {
        error: WriteError::from_io(&paths.dir, e),
        completed: Vec::new(),
    })?;

    for kind in [ArtifactKind::Reviews, ArtifactKind::AppDetails, ArtifactKind::Chart] {
        let path = paths.get(kind);
        let written = match kind {
            ArtifactKind::Reviews => write_reviews_csv(path, records),
            ArtifactKind::AppDetails => write_app_details_json(path, details),
            ArtifactKind::Chart => chart::save_png(distribution, path),
        };
        if let Err(error) = written {
            return Err(WriteFailure { error, completed });
        }
        info!(artifact = %kind, path = %path.display(), "Artifact written");
        completed.push((kind, path.to_path_buf()));
    }

    Ok(paths)
}

/// Writes all records under a `rating,text,timestamp` header. The header is
/// written even when `records` is empty.
pub fn write_reviews_csv(
    path: &Path,
    records: &[ReviewRecord],
) -> std::result::Result<(), WriteError> {
    debug!(path = %path.display(), rows = records.len(), "Writing reviews CSV");

    let file = File::create(path).map_err(|e| WriteError::from_io(path, e))?;
    let mut writer = WriterBuilder::new()
        .has_headers(false) // header written by hand so empty tables keep it
        .from_writer(file);

    let csv_err = |e: csv::Error| match e.into_kind() {
        csv::ErrorKind::Io(io) => WriteError::from_io(path, io),
        other => WriteError::serialization(path, format!("{other:?}")),
    };

    writer.write_record(CSV_HEADER).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| WriteError::from_io(path, e))?;

    Ok(())
}

/// Writes the app details verbatim as pretty-printed JSON.
pub fn write_app_details_json(
    path: &Path,
    details: &AppDetails,
) -> std::result::Result<(), WriteError> {
    debug!(path = %path.display(), fields = details.fields().len(), "Writing app details JSON");

    let file = File::create(path).map_err(|e| WriteError::from_io(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, details).map_err(|e| {
        if e.is_io() {
            WriteError::from_io(path, io::Error::from(e))
        } else {
            WriteError::serialization(path, e)
        }
    })?;
    writer.flush().map_err(|e| WriteError::from_io(path, e))?;

    Ok(())
}

/// Reads back a table written by [`write_reviews_csv`].
pub fn read_reviews_csv(path: &Path) -> Result<Vec<ReviewRecord>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for result in rdr.deserialize() {
        let record: ReviewRecord = result?;
        records.push(record);
    }

    Ok(records)
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl fmt::Debug) {
    debug!("{:#?}", value);
}

/// Prints a value to stdout as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
