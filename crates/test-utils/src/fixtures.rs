//! Synthetic CoverageJSON documents for tests.
//!
//! Every fixture is a `serde_json::Value` so tests can tweak it before
//! handing it to the reader.

use serde_json::{json, Map, Value};

use crate::generators::{cell_plane, grid_cell_value, hourly_times};

/// CRS84 identifier URI.
pub const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

/// EPSG:3857 identifier URI.
pub const EPSG_3857: &str = "http://www.opengis.net/def/crs/EPSG/0/3857";

/// Prefix of the category ids used by the trajectory fixtures.
pub const TRACK_CATEGORY_PREFIX: &str = "track";

/// Builder for gridded coverages.
///
/// Cell values encode their position: `param * 1e8 + slice * 1e6 +
/// col * 1000 + row`, where `slice` enumerates the non-spatial axes
/// (extra, t, z) in row-major order.
#[derive(Debug, Clone)]
pub struct GridFixture {
    pub nx: usize,
    pub ny: usize,
    pub x_start: f64,
    pub x_step: f64,
    pub y_start: f64,
    pub y_step: f64,
    pub times: Vec<String>,
    pub levels: Vec<f64>,
    pub extra_axis: Option<(String, Vec<f64>)>,
    /// `(name, unit symbol)` pairs.
    pub parameters: Vec<(String, Option<String>)>,
    /// Flat indices (into every parameter's range) replaced by `null`.
    pub missing: Vec<usize>,
    pub crs: Option<String>,
}

impl GridFixture {
    /// A grid of `nx × ny` cells with one-degree spacing from (0, 0).
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            x_start: 0.0,
            x_step: 1.0,
            y_start: 0.0,
            y_step: 1.0,
            times: Vec::new(),
            levels: Vec::new(),
            extra_axis: None,
            parameters: Vec::new(),
            missing: Vec::new(),
            crs: Some(CRS84.to_string()),
        }
    }

    /// Single parameter, no time, no level: 432 × 270 cells.
    pub fn single_layer() -> Self {
        Self::new(432, 270)
            .with_origin(-10.0, 35.0, 0.1, 0.1)
            .with_parameter("TMP", Some("K"))
    }

    /// Two parameters on 16 × 14 cells over 13 hourly time steps.
    pub fn time_series() -> Self {
        Self::new(16, 14)
            .with_origin(4.0, 50.0, 0.25, 0.25)
            .with_times(13)
            .with_parameter("TMP", Some("K"))
            .with_parameter("UGRD", Some("m/s"))
    }

    pub fn with_origin(mut self, x_start: f64, y_start: f64, x_step: f64, y_step: f64) -> Self {
        self.x_start = x_start;
        self.y_start = y_start;
        self.x_step = x_step;
        self.y_step = y_step;
        self
    }

    pub fn with_times(mut self, count: usize) -> Self {
        self.times = hourly_times(count);
        self
    }

    pub fn with_levels(mut self, levels: &[f64]) -> Self {
        self.levels = levels.to_vec();
        self
    }

    pub fn with_extra_axis(mut self, name: &str, values: &[f64]) -> Self {
        self.extra_axis = Some((name.to_string(), values.to_vec()));
        self
    }

    pub fn with_parameter(mut self, name: &str, unit: Option<&str>) -> Self {
        self.parameters
            .push((name.to_string(), unit.map(|u| u.to_string())));
        self
    }

    pub fn with_missing(mut self, indices: &[usize]) -> Self {
        self.missing = indices.to_vec();
        self
    }

    pub fn with_crs(mut self, crs: Option<&str>) -> Self {
        self.crs = crs.map(|c| c.to_string());
        self
    }

    /// Number of 2-D slices per parameter.
    pub fn slice_count(&self) -> usize {
        let extra = self.extra_axis.as_ref().map_or(1, |(_, v)| v.len());
        extra * self.times.len().max(1) * self.levels.len().max(1)
    }

    /// Expected (non-missing) value of a cell.
    pub fn value_at(&self, param: usize, slice: usize, row: usize, col: usize) -> f64 {
        param as f64 * 1e8 + slice as f64 * 1e6 + grid_cell_value(row, col)
    }

    pub fn x_values(&self) -> Vec<f64> {
        (0..self.nx)
            .map(|i| self.x_start + self.x_step * i as f64)
            .collect()
    }

    pub fn y_values(&self) -> Vec<f64> {
        (0..self.ny)
            .map(|i| self.y_start + self.y_step * i as f64)
            .collect()
    }

    /// Range axis names, slowest varying first.
    pub fn axis_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some((name, _)) = &self.extra_axis {
            names.push(name.clone());
        }
        if !self.times.is_empty() {
            names.push("t".to_string());
        }
        if !self.levels.is_empty() {
            names.push("z".to_string());
        }
        names.push("y".to_string());
        names.push("x".to_string());
        names
    }

    /// Range shape, matching [`GridFixture::axis_names`].
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::new();
        if let Some((_, values)) = &self.extra_axis {
            shape.push(values.len());
        }
        if !self.times.is_empty() {
            shape.push(self.times.len());
        }
        if !self.levels.is_empty() {
            shape.push(self.levels.len());
        }
        shape.push(self.ny);
        shape.push(self.nx);
        shape
    }

    /// Flat range values of one parameter.
    pub fn range_values(&self, param: usize) -> Vec<Value> {
        let plane = cell_plane(self.nx, self.ny);
        let mut values = Vec::with_capacity(self.slice_count() * plane.len());
        for slice in 0..self.slice_count() {
            let offset = param as f64 * 1e8 + slice as f64 * 1e6;
            values.extend(plane.iter().map(|v| json!(offset + v)));
        }
        for &i in &self.missing {
            if let Some(v) = values.get_mut(i) {
                *v = Value::Null;
            }
        }
        values
    }

    /// Build the CoverageJSON document.
    pub fn build(&self) -> Value {
        let mut axes = Map::new();
        axes.insert("x".into(), json!({ "values": self.x_values() }));
        axes.insert("y".into(), json!({ "values": self.y_values() }));
        if !self.times.is_empty() {
            axes.insert("t".into(), json!({ "values": self.times }));
        }
        if !self.levels.is_empty() {
            axes.insert("z".into(), json!({ "values": self.levels }));
        }
        if let Some((name, values)) = &self.extra_axis {
            axes.insert(name.clone(), json!({ "values": values }));
        }

        let mut parameters = Map::new();
        let mut ranges = Map::new();
        for (i, (name, unit)) in self.parameters.iter().enumerate() {
            parameters.insert(name.clone(), parameter(name, unit.as_deref()));
            ranges.insert(
                name.clone(),
                json!({
                    "type": "NdArray",
                    "dataType": "float",
                    "axisNames": self.axis_names(),
                    "shape": self.shape(),
                    "values": self.range_values(i),
                }),
            );
        }

        let mut domain = json!({
            "type": "Domain",
            "domainType": "Grid",
            "axes": axes,
        });
        if let Some(crs) = &self.crs {
            domain["referencing"] = json!([horizontal_referencing(crs)]);
        }

        json!({
            "type": "Coverage",
            "domain": domain,
            "parameters": parameters,
            "ranges": ranges,
        })
    }
}

/// A continuous parameter definition.
pub fn parameter(name: &str, unit: Option<&str>) -> Value {
    let mut p = json!({
        "type": "Parameter",
        "description": { "en": format!("{} description", name) },
        "observedProperty": { "label": { "en": name } },
    });
    if let Some(symbol) = unit {
        p["unit"] = json!({ "symbol": symbol });
    }
    p
}

/// A categorical parameter with `count` categories encoded as `0..count`.
///
/// Even category indices carry a `preferredColor`.
pub fn categorical_parameter(name: &str, count: usize) -> Value {
    let categories: Vec<Value> = (0..count)
        .map(|i| {
            let mut c = json!({
                "id": format!("{}_{}", TRACK_CATEGORY_PREFIX, i),
                "label": { "en": format!("Track {}", i) },
            });
            if i % 2 == 0 {
                c["preferredColor"] = json!(format!("#{:02x}{:02x}{:02x}", (i * 10) % 256, 128, 200));
            }
            c
        })
        .collect();
    let encoding: Map<String, Value> = (0..count)
        .map(|i| (format!("{}_{}", TRACK_CATEGORY_PREFIX, i), json!(i)))
        .collect();

    json!({
        "type": "Parameter",
        "observedProperty": {
            "label": { "en": name },
            "categories": categories,
        },
        "categoryEncoding": encoding,
    })
}

/// Horizontal CRS connection for the given identifier.
pub fn horizontal_referencing(crs: &str) -> Value {
    json!({
        "coordinates": ["x", "y"],
        "system": { "type": "GeographicCRS", "id": crs },
    })
}

/// A collection of `count` trajectories of three points each.
///
/// The categorical parameter `track_type` takes value `i % categories`
/// on trajectory `i`, except every `missing_every`-th trajectory which
/// holds only `null`s.
pub fn trajectory_collection(count: usize, categories: usize, missing_every: Option<usize>) -> Value {
    let coverages: Vec<Value> = (0..count)
        .map(|i| {
            let x0 = -20.0 + (i % 40) as f64;
            let y0 = 30.0 + (i / 40) as f64;
            let tuples: Vec<Value> = (0..3)
                .map(|k| {
                    json!([
                        format!("2008-01-01T{:02}:{:02}:00Z", 4 + k, i % 60),
                        x0 + 0.1 * k as f64,
                        y0 + 0.05 * k as f64
                    ])
                })
                .collect();
            let missing = missing_every.is_some_and(|n| (i + 1) % n == 0);
            let value = if missing { Value::Null } else { json!(i % categories) };

            json!({
                "type": "Coverage",
                "domain": {
                    "type": "Domain",
                    "axes": {
                        "composite": {
                            "dataType": "tuple",
                            "coordinates": ["t", "x", "y"],
                            "values": tuples,
                        }
                    }
                },
                "ranges": {
                    "track_type": {
                        "type": "NdArray",
                        "dataType": "integer",
                        "axisNames": ["composite"],
                        "shape": [3],
                        "values": [value.clone(), value.clone(), value],
                    }
                }
            })
        })
        .collect();

    json!({
        "type": "CoverageCollection",
        "domainType": "Trajectory",
        "parameters": { "track_type": categorical_parameter("Track type", categories) },
        "referencing": [horizontal_referencing(CRS84)],
        "coverages": coverages,
    })
}

/// A single trajectory whose attribute values are given per point.
pub fn trajectory(points: &[(f64, f64)], values: &[Option<f64>]) -> Value {
    let tuples: Vec<Value> = points
        .iter()
        .enumerate()
        .map(|(i, (x, y))| json!([format!("2008-01-01T04:{:02}:00Z", i), x, y]))
        .collect();

    json!({
        "type": "Coverage",
        "domain": {
            "type": "Domain",
            "domainType": "Trajectory",
            "axes": {
                "composite": {
                    "dataType": "tuple",
                    "coordinates": ["t", "x", "y"],
                    "values": tuples,
                }
            },
            "referencing": [horizontal_referencing(CRS84)],
        },
        "parameters": { "speed": parameter("speed", Some("m/s")) },
        "ranges": {
            "speed": {
                "type": "NdArray",
                "dataType": "float",
                "axisNames": ["composite"],
                "shape": [values.len()],
                "values": values,
            }
        }
    })
}

/// A point series of `times` hourly air temperature values at (5, 52).
pub fn point_series(times: usize) -> Value {
    let values: Vec<f64> = (0..times).map(|i| 280.0 + i as f64).collect();
    json!({
        "type": "Coverage",
        "domain": {
            "type": "Domain",
            "domainType": "PointSeries",
            "axes": {
                "x": { "values": [5.0] },
                "y": { "values": [52.0] },
                "t": { "values": hourly_times(times) },
            },
            "referencing": [horizontal_referencing(CRS84)],
        },
        "parameters": { "tt": parameter("tt", Some("K")) },
        "ranges": {
            "tt": {
                "type": "NdArray",
                "dataType": "float",
                "axisNames": ["t"],
                "shape": [times],
                "values": values,
            }
        }
    })
}

/// A single point coverage.
pub fn point(x: f64, y: f64, value: f64) -> Value {
    json!({
        "type": "Coverage",
        "domain": {
            "type": "Domain",
            "domainType": "Point",
            "axes": {
                "x": { "values": [x] },
                "y": { "values": [y] },
            },
            "referencing": [horizontal_referencing(CRS84)],
        },
        "parameters": { "tt": parameter("tt", Some("K")) },
        "ranges": {
            "tt": { "type": "NdArray", "dataType": "float", "values": [value] }
        }
    })
}

/// A multi-point coverage with `count` points along the equator.
pub fn multipoint(count: usize) -> Value {
    let tuples: Vec<Value> = (0..count).map(|i| json!([i as f64, 0.0])).collect();
    let values: Vec<f64> = (0..count).map(|i| i as f64 * 10.0).collect();
    json!({
        "type": "Coverage",
        "domain": {
            "type": "Domain",
            "domainType": "MultiPoint",
            "axes": {
                "composite": {
                    "dataType": "tuple",
                    "coordinates": ["x", "y"],
                    "values": tuples,
                }
            },
            "referencing": [horizontal_referencing(CRS84)],
        },
        "parameters": { "depth": parameter("depth", Some("m")) },
        "ranges": {
            "depth": {
                "type": "NdArray",
                "dataType": "float",
                "axisNames": ["composite"],
                "shape": [count],
                "values": values,
            }
        }
    })
}

/// A polygon coverage with `count` unit squares along the x axis.
pub fn polygons(count: usize) -> Value {
    let polygons: Vec<Value> = (0..count)
        .map(|i| {
            let x = i as f64;
            json!([[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]])
        })
        .collect();
    let values: Vec<f64> = (0..count).map(|i| i as f64).collect();
    json!({
        "type": "Coverage",
        "domain": {
            "type": "Domain",
            "domainType": "MultiPolygon",
            "axes": {
                "composite": {
                    "dataType": "polygon",
                    "coordinates": ["x", "y"],
                    "values": polygons,
                }
            },
            "referencing": [horizontal_referencing(CRS84)],
        },
        "parameters": { "landuse": parameter("landuse", None) },
        "ranges": {
            "landuse": {
                "type": "NdArray",
                "dataType": "integer",
                "axisNames": ["composite"],
                "shape": [count],
                "values": values,
            }
        }
    })
}
