//! Map layers built from a CoverageJSON document.

use chrono::{DateTime, SecondsFormat, Utc};
use covjson::{
    AssemblyStrategy, AxisValue, CovJsonError, CoverageJsonReader, Parameter, SpatialReference,
    TimeRange,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LayerConfig;
use crate::error::{LayerError, LayerResult};
use crate::geo::{BoundingBox, GeoTransform};
use crate::raster::{AssembledRaster, RasterAssembler};
use crate::style::{RendererBuilder, RendererSpec};
use crate::vector::{FeatureSet, FieldType, GeometryType, VectorAssembler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Raster,
    Vector,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Raster => "raster",
            LayerKind::Vector => "vector",
        }
    }
}

/// One 2-D slice of a grid parameter, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    pub name: String,
    pub crs: SpatialReference,
    pub raster: AssembledRaster,
    /// `None` when no slice of the parameter holds a valid value.
    pub renderer: Option<RendererSpec>,
}

impl RasterLayer {
    pub fn geotransform(&self) -> &GeoTransform {
        &self.raster.geotransform
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.raster.time
    }

    pub fn temporal_range(&self) -> Option<TimeRange> {
        self.raster.temporal_range
    }
}

/// Features of all vector coverages of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    pub name: String,
    pub crs: SpatialReference,
    pub features: FeatureSet,
    /// Parameter the renderer classifies on.
    pub renderer_parameter: Option<String>,
    pub renderer: Option<RendererSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapLayer {
    Raster(RasterLayer),
    Vector(VectorLayer),
}

impl MapLayer {
    pub fn kind(&self) -> LayerKind {
        match self {
            MapLayer::Raster(_) => LayerKind::Raster,
            MapLayer::Vector(_) => LayerKind::Vector,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MapLayer::Raster(r) => &r.name,
            MapLayer::Vector(v) => &v.name,
        }
    }

    pub fn crs(&self) -> &SpatialReference {
        match self {
            MapLayer::Raster(r) => &r.crs,
            MapLayer::Vector(v) => &v.crs,
        }
    }

    pub fn renderer(&self) -> Option<&RendererSpec> {
        match self {
            MapLayer::Raster(r) => r.renderer.as_ref(),
            MapLayer::Vector(v) => v.renderer.as_ref(),
        }
    }

    pub fn as_raster(&self) -> Option<&RasterLayer> {
        match self {
            MapLayer::Raster(r) => Some(r),
            MapLayer::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorLayer> {
        match self {
            MapLayer::Vector(v) => Some(v),
            MapLayer::Raster(_) => None,
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            MapLayer::Raster(r) => Some(r.raster.bounds()),
            MapLayer::Vector(v) => v.features.bounds(),
        }
    }

    /// Compact description without cell or feature data.
    pub fn summary(&self) -> LayerSummary {
        let (size, time, z) = match self {
            MapLayer::Raster(r) => (
                LayerSize::Grid {
                    rows: r.raster.rows,
                    cols: r.raster.cols,
                    valid_cells: r.raster.valid_count(),
                },
                r.raster.time_label(),
                r.raster.z,
            ),
            MapLayer::Vector(v) => (
                LayerSize::Features {
                    count: v.features.len(),
                    geometry: v.features.geometry_type,
                },
                None,
                None,
            ),
        };
        LayerSummary {
            name: self.name().to_string(),
            kind: self.kind(),
            crs: self.crs().definition().to_string(),
            size,
            time,
            z,
            bounds: self.bounds(),
            renderer: self.renderer().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerSize {
    Grid {
        rows: usize,
        cols: usize,
        valid_cells: usize,
    },
    Features {
        count: usize,
        geometry: GeometryType,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub kind: LayerKind,
    /// WKT when the document embeds one, else an id such as `EPSG:4326`.
    pub crs: String,
    #[serde(flatten)]
    pub size: LayerSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    pub bounds: Option<BoundingBox>,
    pub renderer: Option<RendererSpec>,
}

/// Turns a document into map layers.
#[derive(Debug, Clone)]
pub struct LayerMaterializer {
    config: LayerConfig,
    rasters: RasterAssembler,
    vectors: VectorAssembler,
    renderers: RendererBuilder,
}

impl LayerMaterializer {
    pub fn new(config: LayerConfig) -> Self {
        Self {
            rasters: RasterAssembler::new(config.clone()),
            vectors: VectorAssembler::new(),
            renderers: RendererBuilder::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// All layers of the document.
    ///
    /// Grid documents give one raster layer per parameter and slice;
    /// vector documents give a single merged layer.
    pub fn map_layers(&self, reader: &CoverageJsonReader) -> LayerResult<Vec<MapLayer>> {
        let classifications = reader.classify_all()?;
        let first = classifications
            .first()
            .ok_or_else(|| CovJsonError::malformed("document has no coverages"))?;

        let layers: Vec<MapLayer> = match first.strategy {
            AssemblyStrategy::Raster => {
                let mut layers = Vec::new();
                for parameter in reader.parameter_names() {
                    layers.extend(
                        self.raster_layers(reader, &parameter)?
                            .into_iter()
                            .map(MapLayer::Raster),
                    );
                }
                layers
            }
            AssemblyStrategy::Vector => vec![MapLayer::Vector(self.vector_layer(reader)?)],
        };

        info!(
            domain_type = %first.domain_type,
            coverages = reader.coverages_count(),
            layers = layers.len(),
            "materialized layers"
        );
        Ok(layers)
    }

    /// Raster layers of one grid parameter, one per slice and coverage.
    pub fn raster_layers(
        &self,
        reader: &CoverageJsonReader,
        parameter: &str,
    ) -> LayerResult<Vec<RasterLayer>> {
        let crs = self.resolve_crs(reader);
        let definition = parameter_definition(reader, parameter);
        let base = match definition.unit_label() {
            Some(unit) => format!("{}-[{}]", parameter, unit),
            None => parameter.to_string(),
        };
        let multiple = reader.coverages_count() > 1;

        let mut rasters = Vec::new();
        for (index, coverage) in reader.coverages().iter().enumerate() {
            if !coverage.ranges.contains_key(parameter) {
                debug!(parameter, coverage_index = index, "coverage has no range for parameter");
                continue;
            }
            rasters.extend(self.rasters.assemble(coverage, index, parameter)?.into_values());
        }
        if rasters.is_empty() {
            return Err(CovJsonError::ParameterNotFound(parameter.to_string()).into());
        }

        // shared by every slice of the parameter
        let renderer = self.renderer(
            parameter,
            &definition,
            rasters.iter().flat_map(|r| r.values()).collect::<Vec<_>>(),
        )?;

        Ok(rasters
            .into_iter()
            .map(|raster| {
                let mut parts = vec![base.clone()];
                if multiple {
                    parts.push(raster.coverage_index.to_string());
                }
                parts.extend(raster.extra.iter().map(|(_, v)| axis_value_label(v)));
                if let Some(t) = raster.time {
                    parts.push(t.to_rfc3339_opts(SecondsFormat::Secs, true));
                }
                if let Some(z) = raster.z {
                    parts.push(z.to_string());
                }
                RasterLayer {
                    name: parts.join("_"),
                    crs: crs.clone(),
                    raster,
                    renderer: renderer.clone(),
                }
            })
            .collect())
    }

    /// One vector layer holding the features of every coverage.
    pub fn vector_layer(&self, reader: &CoverageJsonReader) -> LayerResult<VectorLayer> {
        let parameters = vector_parameters(reader);
        let features = self.vectors.assemble(reader.coverages(), &parameters)?;
        let name = format!("{} ({})", features.domain_type, parameters.join(", "));

        // renderer follows the first attribute
        let (renderer_parameter, renderer) = match features.schema.first() {
            Some(field) if field.field_type != FieldType::String => {
                let definition = parameter_definition(reader, &field.parameter);
                let values = features.values(&field.parameter);
                (
                    Some(field.parameter.clone()),
                    self.renderer(&field.parameter, &definition, values)?,
                )
            }
            _ => (None, None),
        };

        Ok(VectorLayer {
            name,
            crs: self.resolve_crs(reader),
            features,
            renderer_parameter,
            renderer,
        })
    }

    fn renderer(
        &self,
        name: &str,
        parameter: &Parameter,
        values: Vec<Option<f64>>,
    ) -> LayerResult<Option<RendererSpec>> {
        match self.renderers.build(name, parameter, values) {
            Ok(spec) => Ok(Some(spec)),
            Err(LayerError::EmptyRange(_)) => {
                warn!(parameter = name, "no valid values, layer has no renderer");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn resolve_crs(&self, reader: &CoverageJsonReader) -> SpatialReference {
        reader.crs().unwrap_or_else(|| {
            warn!(default = %self.config.default_crs, "document has no horizontal CRS, using default");
            SpatialReference::from_authid(self.config.default_crs.clone())
        })
    }
}

fn parameter_definition(reader: &CoverageJsonReader, name: &str) -> Parameter {
    reader
        .parameter(name)
        .cloned()
        .unwrap_or_else(|| Parameter::new(name))
}

/// Parameters with a range in at least one coverage, in first appearance
/// order.
fn vector_parameters(reader: &CoverageJsonReader) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for coverage in reader.coverages() {
        for name in coverage.parameter_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names.retain(|n| reader.coverages().iter().any(|c| c.ranges.contains_key(n)));
    names
}

fn axis_value_label(value: &AxisValue) -> String {
    match value {
        AxisValue::Number(n) => n.to_string(),
        AxisValue::Text(s) => s.clone(),
    }
}
