//! Reader owning a parsed CoverageJSON document.
//!
//! The reader answers the cheap queries callers need before deciding to
//! run expensive assembly: domain type, axis presence, parameter names,
//! per-parameter value statistics, coverage count and file size.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::coverage_json::{Axis, AxisValue, CompositeValue, Coverage, Document, DomainType, RangeDataType};
use crate::domain::{classify, DomainClassification};
use crate::errors::{CovJsonError, CovJsonResult};
use crate::parameters::Parameter;
use crate::referencing::SpatialReference;
use crate::time::{parse_axis_time, parse_time, time_step, TimeRange};

const BYTES_PER_MB: f64 = 1_000_000.0;

/// Reader for CoverageJSON files and buffers.
#[derive(Debug, Clone)]
pub struct CoverageJsonReader {
    document: Document,
    source: Option<PathBuf>,
    size_bytes: u64,
}

impl CoverageJsonReader {
    /// Read and parse a document from disk.
    pub fn open(path: impl AsRef<Path>) -> CovJsonResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut reader = Self::from_slice(&bytes)?;
        reader.source = Some(path.to_path_buf());

        info!(
            path = %path.display(),
            coverages = reader.coverages_count(),
            size_mb = reader.file_size_mb(),
            "Loaded CoverageJSON"
        );

        Ok(reader)
    }

    /// Parse a document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> CovJsonResult<Self> {
        let document = Document::from_slice(bytes)?;
        Ok(Self {
            document,
            source: None,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Parse a document from a string.
    pub fn from_str(json: &str) -> CovJsonResult<Self> {
        Self::from_slice(json.as_bytes())
    }

    /// The parsed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Path the document was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_collection(&self) -> bool {
        self.document.is_collection()
    }

    pub fn coverages(&self) -> &[Coverage] {
        self.document.coverages()
    }

    pub fn coverages_count(&self) -> usize {
        self.document.coverages_count()
    }

    /// Get a single coverage by index.
    pub fn coverage(&self, index: usize) -> CovJsonResult<&Coverage> {
        self.coverages().get(index).ok_or_else(|| {
            CovJsonError::malformed(format!(
                "coverage index {} out of range ({} coverages)",
                index,
                self.coverages_count()
            ))
        })
    }

    pub fn file_size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Size of the source document in megabytes.
    pub fn file_size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MB
    }

    /// Domain type of the document.
    ///
    /// The collection-level type when declared, otherwise the first
    /// coverage's.
    pub fn domain_type(&self) -> Option<&DomainType> {
        self.document.domain_type().or_else(|| {
            self.coverages()
                .first()
                .and_then(|c| c.domain.domain_type.as_ref())
        })
    }

    /// Classify one coverage's domain.
    pub fn classify(&self, index: usize) -> CovJsonResult<DomainClassification> {
        classify(&self.coverage(index)?.domain, index)
    }

    /// Classify every coverage, checking that collection members share
    /// domain type and axis set.
    pub fn classify_all(&self) -> CovJsonResult<Vec<DomainClassification>> {
        let mut result: Vec<DomainClassification> = Vec::with_capacity(self.coverages_count());
        for (i, coverage) in self.coverages().iter().enumerate() {
            let classification = classify(&coverage.domain, i)?;
            if let Some(first) = result.first() {
                if first.domain_type != classification.domain_type
                    || first.axis_order != classification.axis_order
                {
                    return Err(CovJsonError::malformed(format!(
                        "coverage {} ({} {:?}) differs from coverage 0 ({} {:?})",
                        i,
                        classification.domain_type,
                        classification.axis_order,
                        first.domain_type,
                        first.axis_order
                    )));
                }
            }
            result.push(classification);
        }
        debug!(count = result.len(), "classified all coverages");
        Ok(result)
    }

    /// Check if there is an independent `t` axis.
    pub fn has_t(&self) -> bool {
        self.first_has_axis("t")
    }

    /// Check if there is an independent `z` axis.
    pub fn has_z(&self) -> bool {
        self.first_has_axis("z")
    }

    fn first_has_axis(&self, name: &str) -> bool {
        self.coverages()
            .first()
            .and_then(|c| c.domain.axis(name))
            .map(|a| !matches!(a, Axis::Composite(_)))
            .unwrap_or(false)
    }

    /// Scalar values of a named axis of the first coverage.
    ///
    /// Empty for unknown and composite axes.
    pub fn axis_values(&self, name: &str) -> Vec<AxisValue> {
        self.coverages()
            .first()
            .and_then(|c| c.domain.axis(name))
            .map(Axis::values)
            .unwrap_or_default()
    }

    /// Parameter names in document order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.coverages()
            .first()
            .map(|c| c.parameter_names())
            .unwrap_or_default()
    }

    /// Parameter metadata by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.coverages().first()?.parameters.get(name)
    }

    /// Summary statistics of a parameter's values across all coverages.
    pub fn parameter_ranges(&self, name: &str) -> CovJsonResult<RangeSummary> {
        let mut summary: Option<RangeSummary> = None;

        for coverage in self.coverages() {
            let Some(range) = coverage.ranges.get(name) else {
                continue;
            };
            let entry = summary.get_or_insert_with(|| RangeSummary {
                data_type: range.data_type,
                axis_names: range.axis_names.clone().unwrap_or_default(),
                shape: range.shape.clone().unwrap_or_else(|| vec![range.values.len()]),
                count: 0,
                valid_count: 0,
                min: None,
                max: None,
                mean: None,
            });
            entry.accumulate(range.numeric_values().into_iter(), range.values.len());
        }

        summary.ok_or_else(|| CovJsonError::ParameterNotFound(name.to_string()))
    }

    /// Horizontal spatial reference, if the document declares one.
    pub fn crs(&self) -> Option<SpatialReference> {
        SpatialReference::from_referencing(self.document.referencing())
    }

    /// Time range covered by the document.
    ///
    /// Considers independent `t` axes and `t` coordinates of composite
    /// axes of every coverage.
    pub fn time_range(&self) -> Option<TimeRange> {
        let mut range: Option<TimeRange> = None;
        let mut extend = |t: DateTime<Utc>| {
            range = Some(match range {
                None => TimeRange::new(t, t),
                Some(r) => TimeRange::new(r.start.min(t), r.end.max(t)),
            });
        };

        for coverage in self.coverages() {
            for (name, axis) in &coverage.domain.axes {
                match axis {
                    Axis::Composite(c) => {
                        let Some(ti) = c.coordinate_index("t") else {
                            continue;
                        };
                        for value in &c.values {
                            if let CompositeValue::Tuple(tuple) = value {
                                if let Some(t) = tuple.get(ti).and_then(parse_axis_time) {
                                    extend(t);
                                }
                            }
                        }
                    }
                    _ if name == "t" => {
                        for value in axis.values() {
                            if let Some(t) = value.as_str().and_then(parse_time) {
                                extend(t);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        range
    }

    /// Step of the first coverage's independent time axis.
    pub fn time_step(&self) -> Option<Duration> {
        let axis = self.coverages().first()?.domain.axis("t")?;
        time_step(&axis.values())
    }
}

/// Summary statistics of a parameter range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSummary {
    pub data_type: RangeDataType,
    pub axis_names: Vec<String>,
    pub shape: Vec<usize>,
    /// Total number of values, missing included.
    pub count: usize,
    /// Number of numeric, non-missing values.
    pub valid_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl RangeSummary {
    fn accumulate(&mut self, values: impl Iterator<Item = Option<f64>>, total: usize) {
        let mut sum = self.mean.unwrap_or(0.0) * self.valid_count as f64;
        for v in values.flatten() {
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
            sum += v;
            self.valid_count += 1;
        }
        self.count += total;
        self.mean = (self.valid_count > 0).then(|| sum / self.valid_count as f64);
    }
}
