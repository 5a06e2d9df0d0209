//! CoverageJSON document model and domain classification.
//!
//! This crate parses CoverageJSON documents (single coverages and
//! coverage collections), answers cheap metadata queries about them and
//! classifies each coverage's domain so that downstream code knows
//! whether to assemble rasters or vector features.
//!
//! # Example
//!
//! ```rust
//! use covjson::{AssemblyStrategy, CoverageJsonReader};
//!
//! let json = r#"{
//!     "type": "Coverage",
//!     "domain": {
//!         "type": "Domain",
//!         "domainType": "Grid",
//!         "axes": {"x": {"values": [0.0, 1.0]}, "y": {"values": [0.0, 1.0]}}
//!     },
//!     "ranges": {
//!         "v": {"type": "NdArray", "dataType": "float", "axisNames": ["y", "x"],
//!               "shape": [2, 2], "values": [1, 2, 3, null]}
//!     }
//! }"#;
//!
//! let reader = CoverageJsonReader::from_str(json).unwrap();
//! assert_eq!(reader.coverages_count(), 1);
//! assert_eq!(reader.classify(0).unwrap().strategy, AssemblyStrategy::Raster);
//! ```

pub mod coverage_json;
pub mod domain;
pub mod errors;
pub mod parameters;
pub mod reader;
pub mod referencing;
pub mod time;

pub use coverage_json::{
    Axis, AxisValue, CompositeAxis, CompositeValue, Coverage, CoverageCollection, Document,
    Domain, DomainType, NdArray, RangeDataType, RangeValue, ReferenceSystem,
    ReferenceSystemConnection,
};
pub use domain::{classify, AssemblyStrategy, DomainClassification, TimeSource};
pub use errors::{CovJsonError, CovJsonResult};
pub use parameters::{
    Category, EncodingValue, LocalizedText, ObservedProperty, Parameter, Unit, UnitSymbol,
};
pub use reader::{CoverageJsonReader, RangeSummary};
pub use referencing::SpatialReference;
pub use time::{parse_time, TimeRange};

/// Media type of CoverageJSON documents.
pub const COVERAGE_JSON_MEDIA_TYPE: &str = "application/prs.coverage+json";
