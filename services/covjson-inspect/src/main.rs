//! CoverageJSON inspection tool.
//!
//! Reads a CoverageJSON document, asks before loading very large
//! documents, turns it into map layers and prints a JSON report:
//! - Document metadata (domain type, axes, CRS, time range)
//! - Per-parameter value statistics
//! - One entry per raster or vector layer, with its renderer

mod sinks;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use covjson::{CoverageJsonReader, RangeSummary, TimeRange};
use covjson_layers::{load_layers, LayerConfig, LayerMaterializer, LayerSummary, LoadOutcome};
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sinks::{LogStatus, SummarySink, TerminalConfirmation};

#[derive(Parser, Debug)]
#[command(name = "covjson-inspect")]
#[command(about = "Summarize the map layers of a CoverageJSON document")]
struct Args {
    /// CoverageJSON file to read
    file: PathBuf,

    /// YAML layer configuration (default: COVJSON_* environment variables)
    #[arg(short, long, env = "COVJSON_CONFIG")]
    config: Option<PathBuf>,

    /// Load large documents without asking
    #[arg(short, long)]
    yes: bool,

    /// Write vector layers as a GeoJSON FeatureCollection to this file
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    file: String,
    group: String,
    coverages: usize,
    size_mb: f64,
    domain_type: Option<String>,
    has_t: bool,
    has_z: bool,
    crs: Option<String>,
    time_range: Option<TimeRange>,
    parameters: BTreeMap<String, RangeSummary>,
    layers: Vec<LayerSummary>,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_tracing(&args.log_level, args.json_logs)?;

    let config = match &args.config {
        Some(path) => LayerConfig::from_file(path)
            .with_context(|| format!("Failed to load layer config from {}", path.display()))?,
        None => {
            let config = LayerConfig::from_env();
            config.validate().context("Invalid COVJSON_* configuration")?;
            config
        }
    };

    let reader = CoverageJsonReader::open(&args.file)
        .with_context(|| format!("Can't load CoverageJSON '{}'", args.file.display()))?;

    let group = group_name(&args.file);
    let materializer = LayerMaterializer::new(config);
    let mut confirmation = TerminalConfirmation { assume_yes: args.yes };
    let mut sink = SummarySink::default();

    let outcome = load_layers(
        &reader,
        &materializer,
        &group,
        &mut confirmation,
        &mut sink,
        &mut LogStatus,
    )
    .context("Failed to build layers")?;

    if outcome == LoadOutcome::Declined {
        info!("File not loaded");
        return Ok(());
    }

    if let Some(path) = &args.geojson {
        write_geojson(path, &sink)?;
    }

    let report = build_report(&args.file, &reader, sink);
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Layer group name: the file name without directories.
fn group_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_report(path: &Path, reader: &CoverageJsonReader, sink: SummarySink) -> Report {
    let mut parameters = BTreeMap::new();
    for name in reader.parameter_names() {
        match reader.parameter_ranges(&name) {
            Ok(summary) => {
                parameters.insert(name, summary);
            }
            Err(e) => warn!(parameter = %name, error = %e, "no range statistics"),
        }
    }

    Report {
        file: path.display().to_string(),
        group: sink.group.unwrap_or_default(),
        coverages: reader.coverages_count(),
        size_mb: reader.file_size_mb(),
        domain_type: reader.domain_type().map(|d| d.to_string()),
        has_t: reader.has_t(),
        has_z: reader.has_z(),
        crs: reader.crs().map(|c| c.definition().to_string()),
        time_range: reader.time_range(),
        parameters,
        layers: sink.layers,
    }
}

fn write_geojson(path: &Path, sink: &SummarySink) -> Result<()> {
    let features: Vec<serde_json::Value> = sink
        .vectors
        .iter()
        .filter_map(|l| l.as_vector())
        .flat_map(|v| {
            v.features.to_geojson()["features"]
                .as_array()
                .cloned()
                .unwrap_or_default()
        })
        .collect();

    if features.is_empty() {
        warn!(path = %path.display(), "no vector layers, GeoJSON not written");
        return Ok(());
    }

    let collection = serde_json::json!({"type": "FeatureCollection", "features": features});
    std::fs::write(path, serde_json::to_vec(&collection)?)
        .with_context(|| format!("Failed to write GeoJSON to {}", path.display()))?;
    info!(path = %path.display(), features = features.len(), "wrote GeoJSON");
    Ok(())
}
