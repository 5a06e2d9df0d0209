//! Assembly of CoverageJSON coverages into map layers.
//!
//! Grid coverages become stacks of 2-D rasters with a geotransform, one
//! per combination of the non-spatial axes. Trajectory, point and polygon
//! coverages become vector features with an attribute schema. Each layer
//! carries a renderer description derived from its parameter.
//!
//! # Example
//!
//! ```rust
//! use covjson::CoverageJsonReader;
//! use covjson_layers::{LayerConfig, LayerKind, LayerMaterializer};
//!
//! let json = r#"{
//!     "type": "Coverage",
//!     "domain": {
//!         "type": "Domain",
//!         "domainType": "Grid",
//!         "axes": {"x": {"values": [0.0, 1.0, 2.0]}, "y": {"values": [0.0, 1.0]}}
//!     },
//!     "ranges": {
//!         "v": {"type": "NdArray", "dataType": "float", "axisNames": ["y", "x"],
//!               "shape": [2, 3], "values": [1, 2, 3, 4, 5, null]}
//!     }
//! }"#;
//!
//! let reader = CoverageJsonReader::from_str(json).unwrap();
//! let layers = LayerMaterializer::new(LayerConfig::default())
//!     .map_layers(&reader)
//!     .unwrap();
//!
//! assert_eq!(layers.len(), 1);
//! assert_eq!(layers[0].kind(), LayerKind::Raster);
//! assert_eq!(layers[0].as_raster().unwrap().raster.shape(), (2, 3));
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod geo;
pub mod layer;
pub mod raster;
pub mod strided;
pub mod style;
pub mod vector;

pub use collaborators::{
    load_layers, LayerSink, LoadOutcome, SilentStatus, SizeConfirmation, StatusSink,
};
pub use config::{LayerConfig, SizeGuard, DEFAULT_NO_DATA_COLOR, DEFAULT_NO_DATA_VALUE};
pub use error::{LayerError, LayerResult};
pub use geo::{BoundingBox, GeoTransform};
pub use layer::{
    LayerKind, LayerMaterializer, LayerSize, LayerSummary, MapLayer, RasterLayer, VectorLayer,
};
pub use raster::{AssembledRaster, RasterAssembler, SliceKey};
pub use strided::StridedArray;
pub use style::{CategoryClass, Color, ColorStop, RendererBuilder, RendererSpec, NO_DATA_LABEL};
pub use vector::{
    AssembledFeature, FeatureSet, FieldType, Geometry, GeometryType, SchemaField, VectorAssembler,
};
