//! Raster assembly for gridded coverages.
//!
//! A grid parameter's flat range is reinterpreted as an N-dimensional
//! array whose two trailing axes are `y` and `x`. Every combination of
//! the remaining (slicing) axes yields one 2-D raster.

use std::fmt;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use covjson::{
    classify, parse_time, AssemblyStrategy, AxisValue, CovJsonError, Coverage, RangeDataType,
    TimeRange,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LayerConfig;
use crate::error::{LayerError, LayerResult};
use crate::geo::{BoundingBox, GeoTransform};
use crate::strided::{element_count, StridedArray};

/// Identifies one 2-D slice: the slicing axes and their indices, slowest
/// varying first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SliceKey {
    pub indices: Vec<(String, usize)>,
}

impl SliceKey {
    /// Index along a named slicing axis.
    pub fn index_of(&self, axis: &str) -> Option<usize> {
        self.indices
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, i)| *i)
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indices.is_empty() {
            return f.write_str("-");
        }
        let parts: Vec<String> = self
            .indices
            .iter()
            .map(|(name, i)| format!("{}={}", name, i))
            .collect();
        f.write_str(&parts.join(","))
    }
}

/// One 2-D raster of a grid parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledRaster {
    pub parameter: String,
    pub coverage_index: usize,
    pub key: SliceKey,
    pub rows: usize,
    pub cols: usize,
    /// Row-major cells; missing values hold `no_data_value`.
    pub data: Vec<f64>,
    /// Row-major validity; a valid cell may equal `no_data_value`.
    pub valid: Vec<bool>,
    pub no_data_value: f64,
    pub geotransform: GeoTransform,
    /// Vertical coordinate, when the domain has a `z` axis.
    pub z: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    /// Validity window centred on `time`, one time step wide.
    pub temporal_range: Option<TimeRange>,
    /// Values of non-standard slicing axes such as ensemble members.
    pub extra: Vec<(String, AxisValue)>,
}

impl AssembledRaster {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Cell value, `None` if missing or out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let i = row * self.cols + col;
        self.valid[i].then_some(self.data[i])
    }

    /// Cells as options, missing values as `None`.
    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.data
            .iter()
            .zip(&self.valid)
            .map(|(&v, &valid)| valid.then_some(v))
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.geotransform.bounds(self.cols, self.rows)
    }

    /// Copy whose first row is the northernmost one.
    pub fn to_north_up(&self) -> AssembledRaster {
        if self.geotransform.is_north_up() || self.rows == 0 {
            return self.clone();
        }
        let width = self.cols.max(1);
        let data = self.data.chunks(width).rev().flatten().copied().collect();
        let valid = self.valid.chunks(width).rev().flatten().copied().collect();
        AssembledRaster {
            data,
            valid,
            geotransform: self.geotransform.flipped_rows(self.rows),
            ..self.clone()
        }
    }

    /// Time formatted for display and layer names.
    pub fn time_label(&self) -> Option<String> {
        self.time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Turns grid coverages into rasters.
#[derive(Debug, Clone)]
pub struct RasterAssembler {
    config: LayerConfig,
}

impl RasterAssembler {
    pub fn new(config: LayerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// Assemble every 2-D slice of `parameter` in a grid coverage.
    ///
    /// Slices are returned in row-major order of the slicing axes.
    pub fn assemble(
        &self,
        coverage: &Coverage,
        coverage_index: usize,
        parameter: &str,
    ) -> LayerResult<IndexMap<SliceKey, AssembledRaster>> {
        let classification = classify(&coverage.domain, coverage_index)?;
        if classification.strategy != AssemblyStrategy::Raster {
            return Err(CovJsonError::UnsupportedDomainType {
                domain_type: classification.domain_type.to_string(),
                coverage_index,
            }
            .into());
        }

        let range = coverage.range(parameter)?;
        if !range.is_inline() {
            return Err(CovJsonError::UnsupportedRange {
                parameter: parameter.to_string(),
                range_type: range.type_.clone(),
            }
            .into());
        }
        if range.data_type == RangeDataType::String {
            return Err(CovJsonError::UnsupportedRange {
                parameter: parameter.to_string(),
                range_type: "NdArray of strings".to_string(),
            }
            .into());
        }

        let domain = &coverage.domain;
        let axis_names = range
            .axis_names
            .clone()
            .unwrap_or_else(|| classification.axis_order.clone());
        let mismatch = |expected: String, observed: String| {
            LayerError::shape_mismatch(parameter, coverage_index, expected, observed)
        };

        validate_axis_order(&axis_names).map_err(|expected| {
            mismatch(expected, format!("{:?}", axis_names))
        })?;

        let mut domain_shape = Vec::with_capacity(axis_names.len());
        for name in &axis_names {
            let axis = domain.axis(name).ok_or_else(|| {
                mismatch(
                    format!("axes from {:?}", domain.axis_names()),
                    format!("range axis `{}`", name),
                )
            })?;
            domain_shape.push(axis.len());
        }
        let shape = range.shape.clone().unwrap_or_else(|| domain_shape.clone());
        if shape != domain_shape {
            return Err(mismatch(format!("{:?}", domain_shape), format!("{:?}", shape)));
        }

        let expected_len = element_count(&shape).ok_or_else(|| {
            mismatch(
                format!("shape {:?} addressable in memory", shape),
                "element count overflows usize".to_string(),
            )
        })?;
        if range.values.len() != expected_len {
            return Err(mismatch(
                format!("{} values for shape {:?}", expected_len, shape),
                format!("{} values", range.values.len()),
            ));
        }

        let array = StridedArray::new(range.numeric_values(), shape.clone(), axis_names.clone())
            .ok_or_else(|| mismatch(format!("{:?}", shape), format!("{:?}", axis_names)))?;

        let x = numeric_axis(coverage, "x")?;
        let y = numeric_axis(coverage, "y")?;
        let geotransform = GeoTransform::from_axes(
            &x,
            &y,
            self.config.spacing_tolerance,
            self.config.fallback_pixel_size,
        )?;

        let slicing = array.ndim() - 2;
        let context = SliceContext::new(coverage, &axis_names[..slicing]);
        let (rows, cols) = (y.len(), x.len());

        let mut rasters = IndexMap::new();
        for index in array.leading_indices(slicing) {
            let block = array
                .block(&index)
                .ok_or_else(|| mismatch(format!("{:?}", shape), format!("slice {:?}", index)))?;
            let data: Vec<f64> = block
                .iter()
                .map(|v| v.unwrap_or(self.config.no_data_value))
                .collect();
            let valid: Vec<bool> = block.iter().map(Option::is_some).collect();

            let key = SliceKey {
                indices: axis_names[..slicing]
                    .iter()
                    .cloned()
                    .zip(index.iter().copied())
                    .collect(),
            };

            let collisions = block
                .iter()
                .filter(|v| **v == Some(self.config.no_data_value))
                .count();
            if collisions > 0 {
                warn!(
                    parameter,
                    coverage_index,
                    slice = %key,
                    collisions,
                    no_data_value = self.config.no_data_value,
                    "Valid values equal the NoData marker"
                );
            }

            if block.iter().all(Option::is_none) {
                warn!(
                    parameter,
                    coverage_index,
                    slice = %key,
                    "Raster slice has no valid values"
                );
            }

            let time = context.time(&key);
            let raster = AssembledRaster {
                parameter: parameter.to_string(),
                coverage_index,
                rows,
                cols,
                data,
                valid,
                no_data_value: self.config.no_data_value,
                geotransform,
                z: context.z(&key),
                time,
                temporal_range: time
                    .zip(context.time_step)
                    .map(|(t, step)| TimeRange::centered(t, step)),
                extra: context.extra(&key),
                key: key.clone(),
            };
            rasters.insert(key, raster);
        }

        debug!(
            parameter,
            coverage_index,
            slices = rasters.len(),
            rows,
            cols,
            "assembled rasters"
        );

        Ok(rasters)
    }
}

/// `y` and `x` must be the two last axes and `t` must precede `z`.
fn validate_axis_order(names: &[String]) -> Result<(), String> {
    let n = names.len();
    if n < 2 || names[n - 2] != "y" || names[n - 1] != "x" {
        return Err("[..., y, x]".to_string());
    }
    let position = |axis: &str| names.iter().position(|a| a == axis);
    if let (Some(t), Some(z)) = (position("t"), position("z")) {
        if t > z {
            return Err("[..., t, z, y, x]".to_string());
        }
    }
    Ok(())
}

fn numeric_axis(coverage: &Coverage, name: &str) -> LayerResult<Vec<f64>> {
    coverage
        .domain
        .axis(name)
        .and_then(|a| a.numeric_values())
        .ok_or_else(|| CovJsonError::malformed(format!("axis `{}` is missing or not numeric", name)).into())
}

/// Domain values looked up while slicing.
struct SliceContext {
    z_values: Vec<f64>,
    times: Vec<Option<DateTime<Utc>>>,
    time_step: Option<Duration>,
    extra_axes: Vec<(String, Vec<AxisValue>)>,
}

impl SliceContext {
    fn new(coverage: &Coverage, slicing_axes: &[String]) -> Self {
        let domain = &coverage.domain;
        let z_values = domain
            .axis("z")
            .map(|a| a.values().iter().filter_map(AxisValue::as_f64).collect())
            .unwrap_or_default();
        let t_values = domain.axis("t").map(|a| a.values()).unwrap_or_default();
        let times = t_values
            .iter()
            .map(|v| v.as_str().and_then(parse_time))
            .collect();
        let extra_axes = slicing_axes
            .iter()
            .filter(|name| !matches!(name.as_str(), "t" | "z"))
            .filter_map(|name| domain.axis(name).map(|a| (name.clone(), a.values())))
            .collect();

        Self {
            z_values,
            times,
            time_step: covjson::time::time_step(&t_values),
            extra_axes,
        }
    }

    /// Index along an axis: the slice index when the axis is sliced, else
    /// the only value of a single-valued domain axis.
    fn pick<T: Clone>(key: &SliceKey, axis: &str, values: &[T]) -> Option<T> {
        match key.index_of(axis) {
            Some(i) => values.get(i).cloned(),
            None if values.len() == 1 => values.first().cloned(),
            None => None,
        }
    }

    fn z(&self, key: &SliceKey) -> Option<f64> {
        Self::pick(key, "z", &self.z_values)
    }

    fn time(&self, key: &SliceKey) -> Option<DateTime<Utc>> {
        Self::pick(key, "t", &self.times).flatten()
    }

    fn extra(&self, key: &SliceKey) -> Vec<(String, AxisValue)> {
        self.extra_axes
            .iter()
            .filter_map(|(name, values)| {
                key.index_of(name)
                    .and_then(|i| values.get(i))
                    .map(|v| (name.clone(), v.clone()))
            })
            .collect()
    }
}
