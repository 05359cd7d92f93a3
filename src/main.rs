//! CLI entry point for the Play Store review rater.
//!
//! Provides subcommands for analyzing an app's reviews end to end, fetching
//! just the app details, and recomputing statistics from an exported CSV.

mod infra;
mod progress;

use crate::infra::dump::DumpSource;
use crate::infra::scraper::ScraperClient;
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use play_review_rater::analyzers::summary::{AnalysisReport, log_app_details, log_report, log_stats};
use play_review_rater::analyzers::{AnalysisOptions, AnalysisOutcome, spawn_analysis};
use play_review_rater::app_id::AppId;
use play_review_rater::fetch::BasicClient;
use play_review_rater::fetch::auth::ApiKey;
use play_review_rater::output::{print_json, print_pretty, read_reviews_csv};
use play_review_rater::services::review_source::{ReviewQuery, ReviewSource, SortOrder};
use play_review_rater::stats::ReviewStats;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "play_review_rater")]
#[command(about = "Analyze Google Play reviews for an app", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch reviews, compute rating statistics and write CSV/JSON/PNG artifacts
    Analyze {
        /// Package name, e.g. com.whatsapp
        #[arg(value_name = "APP_ID")]
        app_id: String,

        /// Root directory; artifacts go to <OUTPUT_ROOT>/<APP_ID>/
        #[arg(short, long, env = "PLAY_REVIEW_OUTPUT_ROOT", default_value = "results")]
        output_root: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// Print the report as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch and show app details only
    Details {
        #[arg(value_name = "APP_ID")]
        app_id: String,

        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Recompute rating statistics from a reviews CSV written by `analyze`
    Stats {
        #[arg(value_name = "CSV")]
        file: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Base URL of the scraper JSON service
    #[arg(long, env = "PLAY_REVIEW_SOURCE_URL", conflicts_with = "from_file")]
    source_url: Option<String>,

    /// Read details and reviews from a local JSON dump instead
    #[arg(long, value_name = "PATH")]
    from_file: Option<PathBuf>,

    /// Bearer token for the scraper service
    #[arg(long, env = "PLAY_REVIEW_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "PLAY_REVIEW_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Language for store metadata
    #[arg(long, env = "PLAY_REVIEW_LANG", default_value = "en")]
    lang: String,

    /// Country for store metadata
    #[arg(long, env = "PLAY_REVIEW_COUNTRY", default_value = "us")]
    country: String,
}

#[derive(Args)]
struct QueryArgs {
    /// Maximum number of reviews to fetch (all when omitted)
    #[arg(short, long, env = "PLAY_REVIEW_LIMIT")]
    limit: Option<usize>,

    /// Review order: most-relevant or newest
    #[arg(long, default_value = "most-relevant")]
    sort: SortOrder,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/play_review_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("play_review_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            app_id,
            output_root,
            source,
            query,
            json,
        } => {
            let review_source = build_source(&source)?;
            let options = AnalysisOptions {
                query: ReviewQuery {
                    limit: query.limit,
                    lang: source.lang.clone(),
                    country: source.country.clone(),
                    sort: query.sort,
                },
                token: None,
            };

            info!(app_id = %app_id, output_root = %output_root.display(), "Starting analysis");
            let handle = spawn_analysis(app_id, output_root, review_source, options);

            match progress::watch(handle, json).await {
                AnalysisOutcome::Completed(result) => {
                    log_report(&result);
                    print_pretty(&result);
                    if json {
                        print_json(&AnalysisReport::new(&result))?;
                    }
                }
                AnalysisOutcome::Failed(failure) => {
                    if let Some(partial) = &failure.partial {
                        if let Some(stats) = &partial.stats {
                            log_stats(stats);
                        }
                        for (kind, path) in &partial.completed_artifacts {
                            info!(
                                artifact = %kind,
                                path = %path.display(),
                                "Artifact kept from failed run"
                            );
                        }
                    }
                    error!(
                        failed_during = %failure.failed_during,
                        error = %failure.error,
                        "Analysis failed"
                    );
                    return Err(failure.into());
                }
                AnalysisOutcome::Cancelled => bail!("analysis cancelled"),
            }
        }
        Commands::Details {
            app_id,
            source,
            json,
        } => {
            let app_id = AppId::parse(&app_id)?;
            let review_source = build_source(&source)?;
            let details = review_source
                .fetch_app_details(&app_id)
                .await
                .with_context(|| format!("failed to fetch details for {app_id}"))?;

            log_app_details(&details);
            if json {
                print_json(&details)?;
            }
        }
        Commands::Stats { file, json } => {
            let records = read_reviews_csv(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let stats = ReviewStats::from_records(&records);

            info!(path = %file.display(), records = records.len(), "Loaded reviews table");
            log_stats(&stats);
            if json {
                print_json(&stats)?;
            }
        }
    }

    Ok(())
}

/// Picks the review source from CLI flags.
fn build_source(args: &SourceArgs) -> Result<Arc<dyn ReviewSource>> {
    if let Some(path) = &args.from_file {
        info!(path = %path.display(), "Using local review dump");
        return Ok(Arc::new(DumpSource::new(path)));
    }

    let Some(url) = &args.source_url else {
        bail!("no review source: pass --source-url (or PLAY_REVIEW_SOURCE_URL) or --from-file");
    };

    let http = BasicClient::with_timeout(Duration::from_secs(args.timeout_secs))?;
    info!(url = %url, authenticated = args.api_key.is_some(), "Using scraper service");

    let source: Arc<dyn ReviewSource> = match &args.api_key {
        Some(key) => Arc::new(
            ScraperClient::new(url, ApiKey::bearer(http, key)?)
                .with_locale(&args.lang, &args.country),
        ),
        None => Arc::new(ScraperClient::new(url, http).with_locale(&args.lang, &args.country)),
    };
    Ok(source)
}
