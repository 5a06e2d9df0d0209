//! Vector assembly for trajectory, point and polygon coverages.

use chrono::{DateTime, SecondsFormat, Utc};
use covjson::{
    classify, time::parse_axis_time, AssemblyStrategy, AxisValue, CompositeAxis, CompositeValue,
    CovJsonError, Coverage, DomainType, RangeDataType, RangeValue,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{LayerError, LayerResult};
use crate::geo::BoundingBox;

/// Geometry of an assembled feature, in the document CRS.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(f64, f64),
    LineString(Vec<(f64, f64)>),
    /// Rings, exterior first.
    Polygon(Vec<Vec<(f64, f64)>>),
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(..) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon(_) => GeometryType::Polygon,
        }
    }

    fn positions(&self) -> Vec<(f64, f64)> {
        match self {
            Geometry::Point(x, y) => vec![(*x, *y)],
            Geometry::LineString(coords) => coords.clone(),
            Geometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
        }
    }

    /// GeoJSON geometry object.
    pub fn to_geojson(&self) -> Value {
        let pos = |&(x, y): &(f64, f64)| json!([x, y]);
        match self {
            Geometry::Point(x, y) => json!({"type": "Point", "coordinates": [x, y]}),
            Geometry::LineString(coords) => json!({
                "type": "LineString",
                "coordinates": coords.iter().map(pos).collect::<Vec<_>>(),
            }),
            Geometry::Polygon(rings) => json!({
                "type": "Polygon",
                "coordinates": rings
                    .iter()
                    .map(|r| r.iter().map(pos).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    /// Features of more than one geometry type, e.g. a trajectory whose
    /// attribute changes leave single-position runs as points.
    Mixed,
}

impl GeometryType {
    /// Common geometry type of `features`; `None` when there are none.
    pub fn of_features(features: &[AssembledFeature]) -> Option<Self> {
        let mut types = features.iter().map(|f| f.geometry.geometry_type());
        let first = types.next()?;
        Some(if types.all(|t| t == first) { first } else { GeometryType::Mixed })
    }

    /// Geometry produced for a vector domain type.
    pub fn for_domain(domain_type: &DomainType) -> Option<Self> {
        match domain_type {
            DomainType::Trajectory => Some(GeometryType::LineString),
            DomainType::Point | DomainType::PointSeries | DomainType::MultiPoint => {
                Some(GeometryType::Point)
            }
            DomainType::Polygon | DomainType::MultiPolygon => Some(GeometryType::Polygon),
            _ => None,
        }
    }
}

/// Attribute type, from the range data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Integer,
    Double,
    String,
}

impl From<RangeDataType> for FieldType {
    fn from(dt: RangeDataType) -> Self {
        match dt {
            RangeDataType::Integer => FieldType::Integer,
            RangeDataType::Float => FieldType::Double,
            RangeDataType::String => FieldType::String,
        }
    }
}

/// One attribute column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    pub parameter: String,
    /// `param (unit)` when the parameter has a unit, else the parameter.
    pub name: String,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledFeature {
    pub coverage_index: usize,
    pub geometry: Geometry,
    /// Parameter → value; `None` is NoData.
    pub attributes: IndexMap<String, Option<RangeValue>>,
    pub time: Option<DateTime<Utc>>,
}

/// All features of one or more vector coverages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSet {
    pub domain_type: DomainType,
    pub geometry_type: GeometryType,
    pub schema: Vec<SchemaField>,
    pub features: Vec<AssembledFeature>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Numeric values of one parameter, one per feature.
    pub fn values(&self, parameter: &str) -> Vec<Option<f64>> {
        self.features
            .iter()
            .map(|f| {
                f.attributes
                    .get(parameter)
                    .and_then(|v| v.as_ref())
                    .and_then(RangeValue::as_f64)
            })
            .collect()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.features.iter().flat_map(|f| f.geometry.positions()))
    }

    /// GeoJSON FeatureCollection with schema field names as properties.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .features
            .iter()
            .map(|f| {
                let mut properties = serde_json::Map::new();
                for field in &self.schema {
                    let value = match f.attributes.get(&field.parameter) {
                        Some(Some(RangeValue::Number(n))) => json!(n),
                        Some(Some(RangeValue::Text(s))) => json!(s),
                        _ => Value::Null,
                    };
                    properties.insert(field.name.clone(), value);
                }
                if let Some(t) = f.time {
                    properties.insert(
                        "time".to_string(),
                        json!(t.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    );
                }
                json!({
                    "type": "Feature",
                    "geometry": f.geometry.to_geojson(),
                    "properties": properties,
                })
            })
            .collect();

        json!({"type": "FeatureCollection", "features": features})
    }
}

/// Turns vector coverages into features.
#[derive(Debug, Clone, Default)]
pub struct VectorAssembler;

impl VectorAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the features of all `coverages` into one set.
    ///
    /// The schema lists `parameter_names` in order; coverages lacking a
    /// parameter contribute NoData for it.
    pub fn assemble(
        &self,
        coverages: &[Coverage],
        parameter_names: &[String],
    ) -> LayerResult<FeatureSet> {
        let first = coverages
            .first()
            .ok_or_else(|| CovJsonError::malformed("no coverages to assemble"))?;
        let domain_type = classify(&first.domain, 0)?.domain_type;
        let domain_geometry = GeometryType::for_domain(&domain_type).ok_or_else(|| {
            CovJsonError::UnsupportedDomainType {
                domain_type: domain_type.to_string(),
                coverage_index: 0,
            }
        })?;

        let schema = build_schema(coverages, parameter_names)?;
        let mut features = Vec::new();

        for (index, coverage) in coverages.iter().enumerate() {
            let classification = classify(&coverage.domain, index)?;
            if classification.strategy != AssemblyStrategy::Vector {
                return Err(CovJsonError::UnsupportedDomainType {
                    domain_type: classification.domain_type.to_string(),
                    coverage_index: index,
                }
                .into());
            }
            if classification.domain_type != domain_type {
                return Err(CovJsonError::malformed(format!(
                    "coverage {} is a {} domain, coverage 0 is a {} domain",
                    index, classification.domain_type, domain_type
                ))
                .into());
            }

            let locations = locations(coverage, index)?;
            let attributes = attribute_rows(coverage, index, parameter_names, locations.len())?;

            let before = features.len();
            if classification.domain_type == DomainType::Trajectory {
                features.extend(split_trajectory(index, &locations, attributes));
            } else {
                features.extend(locations.into_iter().zip(attributes).map(
                    |(location, attributes)| AssembledFeature {
                        coverage_index: index,
                        geometry: location.geometry,
                        attributes,
                        time: location.time,
                    },
                ));
            }
            debug!(
                coverage_index = index,
                features = features.len() - before,
                "assembled vector coverage"
            );
        }

        let geometry_type = GeometryType::of_features(&features).unwrap_or(domain_geometry);
        Ok(FeatureSet {
            domain_type,
            geometry_type,
            schema,
            features,
        })
    }
}

fn build_schema(coverages: &[Coverage], parameter_names: &[String]) -> LayerResult<Vec<SchemaField>> {
    parameter_names
        .iter()
        .map(|name| {
            let (coverage, range) = coverages
                .iter()
                .find_map(|c| c.ranges.get(name).map(|r| (c, r)))
                .ok_or_else(|| CovJsonError::ParameterNotFound(name.clone()))?;
            let field_name = match coverage.parameters.get(name).and_then(|p| p.unit_label()) {
                Some(unit) => format!("{} ({})", name, unit),
                None => name.clone(),
            };
            Ok(SchemaField {
                parameter: name.clone(),
                name: field_name,
                field_type: range.data_type.into(),
            })
        })
        .collect()
}

/// A position (or polygon) of a vector domain with its time.
struct Location {
    geometry: Geometry,
    time: Option<DateTime<Utc>>,
}

fn locations(coverage: &Coverage, index: usize) -> LayerResult<Vec<Location>> {
    let domain = &coverage.domain;
    if let Some((name, composite)) = domain.composite_axis() {
        return composite_locations(name, composite, index);
    }

    let scalar = |axis: &str| -> LayerResult<f64> {
        domain
            .axis(axis)
            .and_then(|a| a.numeric_values())
            .and_then(|v| v.first().copied())
            .ok_or_else(|| {
                CovJsonError::malformed(format!("coverage {} lacks a numeric `{}` value", index, axis))
                    .into()
            })
    };
    let (x, y) = (scalar("x")?, scalar("y")?);

    let times: Vec<Option<DateTime<Utc>>> = domain
        .axis("t")
        .map(|t| t.values().iter().map(parse_axis_time).collect())
        .unwrap_or_default();

    // PointSeries: one point per time step
    if domain.domain_type == Some(DomainType::PointSeries) && !times.is_empty() {
        return Ok(times
            .into_iter()
            .map(|time| Location {
                geometry: Geometry::Point(x, y),
                time,
            })
            .collect());
    }

    Ok(vec![Location {
        geometry: Geometry::Point(x, y),
        time: times.first().copied().flatten(),
    }])
}

fn composite_locations(name: &str, axis: &CompositeAxis, index: usize) -> LayerResult<Vec<Location>> {
    let malformed = |what: String| -> LayerError {
        CovJsonError::malformed(format!("composite axis `{}` of coverage {}: {}", name, index, what)).into()
    };
    let xi = axis.coordinate_index("x");
    let yi = axis.coordinate_index("y");
    let ti = axis.coordinate_index("t");

    axis.values
        .iter()
        .enumerate()
        .map(|(i, value)| match value {
            CompositeValue::Tuple(tuple) => {
                let coord = |idx: Option<usize>| idx.and_then(|k| tuple.get(k)).and_then(AxisValue::as_f64);
                let (x, y) = coord(xi)
                    .zip(coord(yi))
                    .ok_or_else(|| malformed(format!("tuple {} has no numeric x/y", i)))?;
                Ok(Location {
                    geometry: Geometry::Point(x, y),
                    time: ti.and_then(|k| tuple.get(k)).and_then(parse_axis_time),
                })
            }
            CompositeValue::Polygon(rings) => {
                let rings = rings
                    .iter()
                    .map(|ring| {
                        ring.iter()
                            .map(|p| match p.as_slice() {
                                [x, y, ..] => Ok((*x, *y)),
                                _ => Err(malformed(format!("polygon {} has a short position", i))),
                            })
                            .collect::<LayerResult<Vec<_>>>()
                    })
                    .collect::<LayerResult<Vec<_>>>()?;
                Ok(Location {
                    geometry: Geometry::Polygon(rings),
                    time: None,
                })
            }
        })
        .collect()
}

/// Per-location attribute maps.
///
/// A range with one value per location is indexed directly; a single
/// value applies to every location.
fn attribute_rows(
    coverage: &Coverage,
    index: usize,
    parameter_names: &[String],
    count: usize,
) -> LayerResult<Vec<IndexMap<String, Option<RangeValue>>>> {
    let mut rows: Vec<IndexMap<String, Option<RangeValue>>> = vec![IndexMap::new(); count];

    for name in parameter_names {
        let Some(range) = coverage.ranges.get(name) else {
            for row in &mut rows {
                row.insert(name.clone(), None);
            }
            continue;
        };
        if !range.is_inline() {
            return Err(CovJsonError::UnsupportedRange {
                parameter: name.clone(),
                range_type: range.type_.clone(),
            }
            .into());
        }

        let values = &range.values;
        if values.len() != count && values.len() != 1 {
            return Err(LayerError::shape_mismatch(
                name.as_str(),
                index,
                format!("{} values (one per location) or 1", count),
                format!("{} values", values.len()),
            ));
        }
        for (i, row) in rows.iter_mut().enumerate() {
            let value = if values.len() == 1 { &values[0] } else { &values[i] };
            row.insert(name.clone(), value.clone());
        }
    }

    Ok(rows)
}

/// Split a trajectory into runs of identical attributes.
///
/// Runs of two or more positions become lines, single positions points.
fn split_trajectory(
    index: usize,
    locations: &[Location],
    attributes: Vec<IndexMap<String, Option<RangeValue>>>,
) -> Vec<AssembledFeature> {
    let mut features = Vec::new();
    let mut start = 0;

    for end in 1..=locations.len() {
        if end < locations.len() && attributes[end] == attributes[start] {
            continue;
        }
        let run = &locations[start..end];
        let coords: Vec<(f64, f64)> = run
            .iter()
            .filter_map(|l| match l.geometry {
                Geometry::Point(x, y) => Some((x, y)),
                _ => None,
            })
            .collect();
        let geometry = match coords.as_slice() {
            [(x, y)] => Geometry::Point(*x, *y),
            _ => Geometry::LineString(coords),
        };
        features.push(AssembledFeature {
            coverage_index: index,
            geometry,
            attributes: attributes[start].clone(),
            time: run[0].time,
        });
        start = end;
    }

    features
}
