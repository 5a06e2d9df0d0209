//! CoverageJSON document model.
//!
//! A CoverageJSON document is either a single `Coverage` or a
//! `CoverageCollection`. Each coverage holds a domain (its axes and
//! referencing), parameter metadata and one flat range per parameter.
//!
//! See: <https://covjson.org/>

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{CovJsonError, CovJsonResult};
use crate::parameters::Parameter;

/// A parsed CoverageJSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Single coverage.
    Coverage(Coverage),
    /// Ordered collection of coverages.
    CoverageCollection(CoverageCollection),
}

impl Document {
    /// Parse a document from raw JSON bytes.
    ///
    /// Members of a collection inherit the collection's parameters and
    /// domain type when they do not declare their own.
    pub fn from_slice(bytes: &[u8]) -> CovJsonResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Parse a document from an already decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> CovJsonResult<Self> {
        let type_ = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| CovJsonError::malformed("missing `type` element"))?
            .to_string();

        match type_.as_str() {
            "Coverage" => {
                require_keys(&value, &["domain", "ranges"], "coverage")?;
                let coverage: Coverage = serde_json::from_value(value)?;
                Ok(Document::Coverage(coverage))
            }
            "CoverageCollection" => {
                require_keys(&value, &["coverages"], "coverage collection")?;
                if let Some(members) = value.get("coverages").and_then(|c| c.as_array()) {
                    for (i, member) in members.iter().enumerate() {
                        require_keys(member, &["domain", "ranges"], &format!("coverage {}", i))?;
                    }
                }
                let mut collection: CoverageCollection = serde_json::from_value(value)?;
                collection.propagate_shared_metadata();
                Ok(Document::CoverageCollection(collection))
            }
            other => Err(CovJsonError::malformed(format!(
                "unsupported document type `{}`",
                other
            ))),
        }
    }

    /// Coverages in document order (one for a single coverage).
    pub fn coverages(&self) -> &[Coverage] {
        match self {
            Document::Coverage(c) => std::slice::from_ref(c),
            Document::CoverageCollection(c) => &c.coverages,
        }
    }

    /// Number of coverages in the document.
    pub fn coverages_count(&self) -> usize {
        self.coverages().len()
    }

    /// Check if this is a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Document::CoverageCollection(_))
    }

    /// Referencing that applies to the whole document.
    ///
    /// Collections carry it at the top level; single coverages inside
    /// their domain. A collection without top-level referencing falls back
    /// to the first member's domain.
    pub fn referencing(&self) -> &[ReferenceSystemConnection] {
        match self {
            Document::Coverage(c) => &c.domain.referencing,
            Document::CoverageCollection(c) if !c.referencing.is_empty() => &c.referencing,
            Document::CoverageCollection(c) => c
                .coverages
                .first()
                .map(|cov| cov.domain.referencing.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Domain type declared at document level.
    ///
    /// For collections this is the collection's `domainType`, which is
    /// optional; members may still declare their own.
    pub fn domain_type(&self) -> Option<&DomainType> {
        match self {
            Document::Coverage(c) => c.domain.domain_type.as_ref(),
            Document::CoverageCollection(c) => c.domain_type.as_ref(),
        }
    }
}

fn require_keys(value: &serde_json::Value, keys: &[&str], what: &str) -> CovJsonResult<()> {
    for key in keys {
        if value.get(*key).is_none() {
            return Err(CovJsonError::malformed(format!(
                "missing `{}` element in {}",
                key, what
            )));
        }
    }
    Ok(())
}

/// A single coverage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coverage {
    /// The domain defining the coverage's spatial/temporal extent.
    pub domain: Domain,

    /// Parameter definitions, in document order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,

    /// Data ranges for each parameter, in document order.
    pub ranges: IndexMap<String, NdArray>,
}

impl Coverage {
    /// Get the range of a parameter.
    pub fn range(&self, parameter: &str) -> CovJsonResult<&NdArray> {
        self.ranges
            .get(parameter)
            .ok_or_else(|| CovJsonError::ParameterNotFound(parameter.to_string()))
    }

    /// Names of the parameters, in document order.
    ///
    /// Falls back to range names when no parameter metadata exists.
    pub fn parameter_names(&self) -> Vec<String> {
        if self.parameters.is_empty() {
            self.ranges.keys().cloned().collect()
        } else {
            self.parameters.keys().cloned().collect()
        }
    }

    /// Check if the parameter's own range carries a `t` axis.
    pub fn has_t_in_data(&self, parameter: &str) -> CovJsonResult<bool> {
        Ok(self.range(parameter)?.has_axis("t"))
    }

    /// Check if the parameter's own range carries a `z` axis.
    pub fn has_z_in_data(&self, parameter: &str) -> CovJsonResult<bool> {
        Ok(self.range(parameter)?.has_axis("z"))
    }
}

/// A collection of coverages sharing referencing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageCollection {
    /// Domain type shared by all members, if declared.
    #[serde(rename = "domainType", default, skip_serializing_if = "Option::is_none")]
    pub domain_type: Option<DomainType>,

    /// Parameters shared by all members.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,

    /// Reference systems shared by all members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referencing: Vec<ReferenceSystemConnection>,

    /// Member coverages.
    pub coverages: Vec<Coverage>,
}

impl CoverageCollection {
    fn propagate_shared_metadata(&mut self) {
        for coverage in &mut self.coverages {
            if coverage.parameters.is_empty() {
                coverage.parameters = self.parameters.clone();
            }
            if coverage.domain.domain_type.is_none() {
                coverage.domain.domain_type = self.domain_type.clone();
            }
        }
    }
}

/// The domain of a coverage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Domain {
    /// The domain type (Point, Grid, etc.).
    #[serde(rename = "domainType", default, skip_serializing_if = "Option::is_none")]
    pub domain_type: Option<DomainType>,

    /// Axis definitions, in document order.
    pub axes: IndexMap<String, Axis>,

    /// Reference systems for axes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referencing: Vec<ReferenceSystemConnection>,
}

impl Domain {
    /// Axis names in document order.
    pub fn axis_names(&self) -> Vec<&str> {
        self.axes.keys().map(|k| k.as_str()).collect()
    }

    /// Get an axis by name.
    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.get(name)
    }

    /// The first composite axis, if any.
    pub fn composite_axis(&self) -> Option<(&str, &CompositeAxis)> {
        self.axes.iter().find_map(|(name, axis)| match axis {
            Axis::Composite(c) => Some((name.as_str(), c)),
            _ => None,
        })
    }
}

/// Domain types of CoverageJSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DomainType {
    Grid,
    Trajectory,
    PointSeries,
    Point,
    MultiPoint,
    Polygon,
    MultiPolygon,
    VerticalProfile,
    /// Any tag this crate does not know.
    Other(String),
}

impl DomainType {
    pub fn as_str(&self) -> &str {
        match self {
            DomainType::Grid => "Grid",
            DomainType::Trajectory => "Trajectory",
            DomainType::PointSeries => "PointSeries",
            DomainType::Point => "Point",
            DomainType::MultiPoint => "MultiPoint",
            DomainType::Polygon => "Polygon",
            DomainType::MultiPolygon => "MultiPolygon",
            DomainType::VerticalProfile => "VerticalProfile",
            DomainType::Other(s) => s,
        }
    }
}

impl From<String> for DomainType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Grid" => DomainType::Grid,
            "Trajectory" => DomainType::Trajectory,
            "PointSeries" => DomainType::PointSeries,
            "Point" => DomainType::Point,
            "MultiPoint" => DomainType::MultiPoint,
            "Polygon" => DomainType::Polygon,
            "MultiPolygon" => DomainType::MultiPolygon,
            "VerticalProfile" => DomainType::VerticalProfile,
            _ => DomainType::Other(s),
        }
    }
}

impl From<DomainType> for String {
    fn from(d: DomainType) -> Self {
        d.as_str().to_string()
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An axis in the domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Axis {
    /// Axis whose values are coordinate tuples or polygons.
    Composite(CompositeAxis),
    /// Regular axis defined by start, stop, and number of points.
    Regular { start: f64, stop: f64, num: usize },
    /// Explicit list of values.
    Values { values: Vec<AxisValue> },
}

impl Axis {
    /// Get the number of values in this axis.
    pub fn len(&self) -> usize {
        match self {
            Axis::Composite(c) => c.values.len(),
            Axis::Regular { num, .. } => *num,
            Axis::Values { values } => values.len(),
        }
    }

    /// Check if axis is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar axis values.
    ///
    /// Regular axes are expanded with linear spacing, endpoints included.
    /// Composite axes have no scalar values and return an empty list.
    pub fn values(&self) -> Vec<AxisValue> {
        match self {
            Axis::Values { values } => values.clone(),
            Axis::Regular { start, stop, num } => linspace(*start, *stop, *num)
                .into_iter()
                .map(AxisValue::Number)
                .collect(),
            Axis::Composite(_) => Vec::new(),
        }
    }

    /// Numeric axis values; `None` if any value is not a number.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        match self {
            Axis::Regular { start, stop, num } => Some(linspace(*start, *stop, *num)),
            Axis::Values { values } => values.iter().map(AxisValue::as_f64).collect(),
            Axis::Composite(_) => None,
        }
    }
}

fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// A scalar value on an axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AxisValue {
    /// Floating-point value (coordinates, levels).
    Number(f64),
    /// String value (timestamps).
    Text(String),
}

impl AxisValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AxisValue::Number(v) => Some(*v),
            AxisValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AxisValue::Text(s) => Some(s),
            AxisValue::Number(_) => None,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Number(v) => write!(f, "{}", v),
            AxisValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// An axis whose values are tuples of other coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeAxis {
    /// `tuple` or `polygon`.
    #[serde(rename = "dataType")]
    pub data_type: String,

    /// Names of the coordinates each tuple holds, e.g. `["t", "x", "y"]`.
    pub coordinates: Vec<String>,

    /// The tuples (or polygons).
    pub values: Vec<CompositeValue>,
}

impl CompositeAxis {
    /// Position of a coordinate within each tuple.
    pub fn coordinate_index(&self, name: &str) -> Option<usize> {
        self.coordinates.iter().position(|c| c == name)
    }

    pub fn is_polygon(&self) -> bool {
        self.data_type == "polygon"
    }
}

/// A single value of a composite axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CompositeValue {
    /// Coordinate tuple such as `["2008-01-01T04:00:00Z", 1.0, 20.0]`.
    Tuple(Vec<AxisValue>),
    /// Polygon as rings of positions, exterior ring first.
    Polygon(Vec<Vec<Vec<f64>>>),
}

/// Connection between axes and their reference system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceSystemConnection {
    /// Axes that use this reference system.
    pub coordinates: Vec<String>,

    /// The reference system.
    pub system: ReferenceSystem,
}

/// Reference system definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceSystem {
    /// `GeographicCRS`, `ProjectedCRS`, `VerticalCRS`, `TemporalRS`, ...
    #[serde(rename = "type")]
    pub type_: String,

    /// CRS identifier URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Well-known text definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wkt: Option<String>,

    /// Calendar of temporal reference systems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<String>,
}

/// Data type of range values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeDataType {
    Float,
    Integer,
    String,
}

/// N-dimensional array containing data values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NdArray {
    /// Range encoding ("NdArray" is the only one decoded).
    #[serde(rename = "type")]
    pub type_: String,

    /// Data type of values.
    #[serde(rename = "dataType")]
    pub data_type: RangeDataType,

    /// Names of axes in order.
    #[serde(rename = "axisNames", default, skip_serializing_if = "Option::is_none")]
    pub axis_names: Option<Vec<String>>,

    /// Shape of the array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,

    /// The data values (null for missing data).
    #[serde(default)]
    pub values: Vec<Option<RangeValue>>,
}

impl NdArray {
    /// Create an N-dimensional float array with missing data support.
    pub fn with_missing(
        values: Vec<Option<f64>>,
        shape: Vec<usize>,
        axis_names: Vec<String>,
    ) -> Self {
        Self {
            type_: "NdArray".to_string(),
            data_type: RangeDataType::Float,
            axis_names: Some(axis_names),
            shape: Some(shape),
            values: values.into_iter().map(|v| v.map(RangeValue::Number)).collect(),
        }
    }

    /// Check if the array names an axis.
    pub fn has_axis(&self, name: &str) -> bool {
        self.axis_names
            .as_ref()
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(false)
    }

    /// Whether this is an inline NdArray.
    pub fn is_inline(&self) -> bool {
        self.type_ == "NdArray"
    }

    /// Numeric view of the values; text and null both become `None`.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|v| v.as_ref().and_then(RangeValue::as_f64))
            .collect()
    }
}

/// A non-missing range value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RangeValue {
    Number(f64),
    Text(String),
}

impl RangeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RangeValue::Number(v) => Some(*v),
            RangeValue::Text(_) => None,
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeValue::Number(v) => write!(f, "{}", v),
            RangeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid_json() -> serde_json::Value {
        json!({
            "type": "Coverage",
            "domain": {
                "type": "Domain",
                "domainType": "Grid",
                "axes": {
                    "x": {"values": [1.0, 2.0, 3.0]},
                    "y": {"start": 10.0, "stop": 11.0, "num": 2},
                    "t": {"values": ["2024-12-29T12:00:00Z"]}
                },
                "referencing": [{
                    "coordinates": ["x", "y"],
                    "system": {"type": "GeographicCRS", "id": "http://www.opengis.net/def/crs/OGC/1.3/CRS84"}
                }]
            },
            "parameters": {
                "TMP": {"type": "Parameter", "observedProperty": {"label": {"en": "Temperature"}}}
            },
            "ranges": {
                "TMP": {
                    "type": "NdArray",
                    "dataType": "float",
                    "axisNames": ["t", "y", "x"],
                    "shape": [1, 2, 3],
                    "values": [1.0, 2.0, null, 4.0, 5.0, 6.0]
                }
            }
        })
    }

    #[test]
    fn test_parse_single_coverage() {
        let doc = Document::from_value(grid_json()).unwrap();

        assert!(!doc.is_collection());
        assert_eq!(doc.coverages_count(), 1);
        assert_eq!(doc.domain_type(), Some(&DomainType::Grid));

        let coverage = &doc.coverages()[0];
        assert_eq!(coverage.domain.axis_names(), vec!["x", "y", "t"]);
        assert_eq!(coverage.domain.axes["y"].numeric_values(), Some(vec![10.0, 11.0]));
        assert!(coverage.has_t_in_data("TMP").unwrap());
        assert!(!coverage.has_z_in_data("TMP").unwrap());

        let range = coverage.range("TMP").unwrap();
        assert_eq!(range.values[2], None);
        assert_eq!(range.numeric_values()[3], Some(4.0));
    }

    #[test]
    fn test_missing_ranges_is_malformed() {
        let mut value = grid_json();
        value.as_object_mut().unwrap().remove("ranges");

        let err = Document::from_value(value).unwrap_err();
        assert!(matches!(err, CovJsonError::MalformedDocument(ref m) if m.contains("ranges")));
    }

    #[test]
    fn test_unknown_document_type_is_malformed() {
        let err = Document::from_value(json!({"type": "FeatureCollection"})).unwrap_err();
        assert!(matches!(err, CovJsonError::MalformedDocument(_)));

        let err = Document::from_slice(b"{\"type\": ").unwrap_err();
        assert!(matches!(err, CovJsonError::MalformedDocument(_)));
    }

    #[test]
    fn test_collection_inherits_parameters_and_domain_type() {
        let value = json!({
            "type": "CoverageCollection",
            "domainType": "PointSeries",
            "parameters": {
                "tt": {"type": "Parameter", "observedProperty": {"label": {"en": "Air temperature"}}}
            },
            "referencing": [{
                "coordinates": ["x", "y"],
                "system": {"type": "GeographicCRS", "id": "http://www.opengis.net/def/crs/EPSG/0/4326"}
            }],
            "coverages": [{
                "type": "Coverage",
                "domain": {
                    "type": "Domain",
                    "axes": {
                        "x": {"values": [5.0]},
                        "y": {"values": [52.0]},
                        "t": {"values": ["2024-01-01T00:00:00Z", "2024-01-01T01:00:00Z"]}
                    }
                },
                "ranges": {
                    "tt": {"type": "NdArray", "dataType": "float", "axisNames": ["t"], "shape": [2], "values": [1.5, null]}
                }
            }]
        });

        let doc = Document::from_value(value).unwrap();
        assert!(doc.is_collection());
        assert_eq!(doc.referencing().len(), 1);

        let member = &doc.coverages()[0];
        assert_eq!(member.domain.domain_type, Some(DomainType::PointSeries));
        assert_eq!(member.parameter_names(), vec!["tt".to_string()]);
    }

    #[test]
    fn test_composite_axis_parsing() {
        let axis: Axis = serde_json::from_value(json!({
            "dataType": "tuple",
            "coordinates": ["t", "x", "y"],
            "values": [["2008-01-01T04:00:00Z", 1, 20], ["2008-01-01T04:30:00Z", 2, 21]]
        }))
        .unwrap();

        let Axis::Composite(composite) = axis else {
            panic!("Expected composite axis");
        };
        assert_eq!(composite.coordinate_index("x"), Some(1));
        assert_eq!(
            composite.values[1],
            CompositeValue::Tuple(vec![
                AxisValue::Text("2008-01-01T04:30:00Z".to_string()),
                AxisValue::Number(2.0),
                AxisValue::Number(21.0),
            ])
        );
    }

    #[test]
    fn test_polygon_composite_axis_parsing() {
        let axis: Axis = serde_json::from_value(json!({
            "dataType": "polygon",
            "coordinates": ["x", "y"],
            "values": [[[[0, 0], [1, 0], [1, 1], [0, 0]]]]
        }))
        .unwrap();

        let Axis::Composite(composite) = axis else {
            panic!("Expected composite axis");
        };
        assert!(composite.is_polygon());
        assert!(matches!(&composite.values[0], CompositeValue::Polygon(rings) if rings[0].len() == 4));
    }

    #[test]
    fn test_regular_axis_expansion() {
        let axis = Axis::Regular {
            start: 0.0,
            stop: 1.0,
            num: 5,
        };
        assert_eq!(axis.len(), 5);
        assert_eq!(axis.numeric_values(), Some(vec![0.0, 0.25, 0.5, 0.75, 1.0]));
    }

    #[test]
    fn test_unknown_domain_type_round_trips_as_other() {
        let dt: DomainType = serde_json::from_value(json!("Section")).unwrap();
        assert_eq!(dt, DomainType::Other("Section".to_string()));
        assert_eq!(serde_json::to_value(&dt).unwrap(), json!("Section"));
    }
}
