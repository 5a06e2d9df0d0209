//! Domain classification.
//!
//! Decides, once per coverage, which assembly strategy applies and which
//! axes take part in reshaping a range.

use serde::Serialize;
use tracing::debug;

use crate::coverage_json::{Axis, Domain, DomainType};
use crate::errors::{CovJsonError, CovJsonResult};

/// Canonical order of the well-known axes, slowest varying first.
pub const CANONICAL_AXIS_ORDER: [&str; 4] = ["t", "z", "y", "x"];

/// How a domain is turned into layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyStrategy {
    Raster,
    Vector,
}

/// Where the per-feature time of a domain comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    None,
    /// The independent `t` axis.
    Independent,
    /// The `t` coordinate of a composite axis.
    Composite,
}

/// Result of classifying a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainClassification {
    pub domain_type: DomainType,
    pub strategy: AssemblyStrategy,
    /// Independent `z` axis present.
    pub has_z: bool,
    /// Independent `t` axis present.
    pub has_t: bool,
    pub has_composite_axis: bool,
    /// Composite axis carries a `t` coordinate.
    pub composite_has_t: bool,
    pub time_source: TimeSource,
    /// Axes used for reshaping, slowest varying first.
    pub axis_order: Vec<String>,
}

/// Classify a domain.
///
/// `coverage_index` is only used for error context.
pub fn classify(domain: &Domain, coverage_index: usize) -> CovJsonResult<DomainClassification> {
    let domain_type = domain.domain_type.clone().ok_or_else(|| {
        CovJsonError::malformed(format!("missing `domainType` in coverage {}", coverage_index))
    })?;

    let strategy = match domain_type {
        DomainType::Grid => AssemblyStrategy::Raster,
        DomainType::Trajectory
        | DomainType::PointSeries
        | DomainType::Point
        | DomainType::MultiPoint
        | DomainType::Polygon
        | DomainType::MultiPolygon => AssemblyStrategy::Vector,
        DomainType::VerticalProfile | DomainType::Other(_) => {
            return Err(CovJsonError::UnsupportedDomainType {
                domain_type: domain_type.to_string(),
                coverage_index,
            })
        }
    };

    let composite = domain.composite_axis();
    if let Some((name, axis)) = composite {
        validate_composite(name, axis, coverage_index)?;
    }

    let has_independent = |name: &str| {
        domain
            .axes
            .get(name)
            .map(|a| !matches!(a, Axis::Composite(_)))
            .unwrap_or(false)
    };

    let composite_coords: &[String] = composite
        .map(|(_, c)| c.coordinates.as_slice())
        .unwrap_or(&[]);
    let covers = |name: &str| has_independent(name) || composite_coords.iter().any(|c| c == name);

    if !covers("x") || !covers("y") {
        return Err(CovJsonError::malformed(format!(
            "coverage {} has no `x`/`y` axes (found {:?})",
            coverage_index,
            domain.axis_names()
        )));
    }

    let has_t = has_independent("t");
    let has_z = has_independent("z");
    let composite_has_t = composite_coords.iter().any(|c| c == "t");

    // Composite time wins for trajectory-style domains; the independent axis
    // then only feeds aggregate time range queries.
    let time_source = if composite_has_t {
        TimeSource::Composite
    } else if has_t {
        TimeSource::Independent
    } else {
        TimeSource::None
    };

    let mut axis_order: Vec<String> = domain
        .axes
        .iter()
        .filter(|(name, axis)| {
            !matches!(axis, Axis::Composite(_)) && !CANONICAL_AXIS_ORDER.contains(&name.as_str())
        })
        .map(|(name, _)| name.clone())
        .collect();
    for name in CANONICAL_AXIS_ORDER {
        if has_independent(name) {
            axis_order.push(name.to_string());
        }
    }
    if let Some((name, _)) = composite {
        axis_order.retain(|a| a != "x" && a != "y");
        axis_order.push(name.to_string());
    }

    let classification = DomainClassification {
        domain_type,
        strategy,
        has_z,
        has_t,
        has_composite_axis: composite.is_some(),
        composite_has_t,
        time_source,
        axis_order,
    };

    debug!(
        coverage_index,
        domain_type = %classification.domain_type,
        axes = ?classification.axis_order,
        "classified domain"
    );

    Ok(classification)
}

fn validate_composite(
    name: &str,
    axis: &crate::coverage_json::CompositeAxis,
    coverage_index: usize,
) -> CovJsonResult<()> {
    match axis.data_type.as_str() {
        "tuple" => {
            if axis.coordinate_index("x").is_none() || axis.coordinate_index("y").is_none() {
                return Err(CovJsonError::malformed(format!(
                    "composite axis `{}` of coverage {} lacks x/y coordinates: {:?}",
                    name, coverage_index, axis.coordinates
                )));
            }
        }
        "polygon" => {
            if axis.coordinates != ["x", "y"] {
                return Err(CovJsonError::malformed(format!(
                    "unsupported polygon coordinates {:?} in coverage {}",
                    axis.coordinates, coverage_index
                )));
            }
        }
        other => {
            return Err(CovJsonError::malformed(format!(
                "unsupported composite data type `{}` in coverage {}",
                other, coverage_index
            )))
        }
    }
    Ok(())
}
