//! Coordinate reference system resolution from CoverageJSON referencing.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::coverage_json::ReferenceSystemConnection;

const CRS84_MARKER: &str = "CRS84";
const EPSG_URI_PREFIX: &str = "http://www.opengis.net/def/crs/EPSG/0/";

/// Spatial reference of the horizontal (x, y) axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    /// Authority identifier such as "EPSG:4326", the raw identifier when
    /// it cannot be mapped to an authority code, or "WKT" for a system
    /// given only as well-known text.
    pub authid: String,

    /// Well-known text, when the document embeds one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wkt: Option<String>,
}

impl SpatialReference {
    /// Create from an authority id.
    pub fn from_authid(authid: impl Into<String>) -> Self {
        Self {
            authid: authid.into(),
            wkt: None,
        }
    }

    /// WGS84 geographic.
    pub fn wgs84() -> Self {
        Self::from_authid("EPSG:4326")
    }

    /// Resolve the horizontal CRS from referencing connections.
    ///
    /// Accepts formats like:
    /// - "http://www.opengis.net/def/crs/OGC/1.3/CRS84" (mapped to EPSG:4326)
    /// - "http://www.opengis.net/def/crs/EPSG/0/3857"
    /// - "EPSG:4326"
    ///
    /// Returns `None` when no connection covers both `x` and `y`.
    pub fn from_referencing(referencing: &[ReferenceSystemConnection]) -> Option<Self> {
        let connection = referencing.iter().find(|r| {
            r.coordinates.iter().any(|c| c == "x") && r.coordinates.iter().any(|c| c == "y")
        })?;

        let system = &connection.system;
        let authid = match system.id.as_deref() {
            Some(id) => normalize_crs_id(id),
            None if system.wkt.is_some() => "WKT".to_string(),
            None => {
                warn!("Reference system `{}` has no id, assuming EPSG:4326", system.type_);
                "EPSG:4326".to_string()
            }
        };

        Some(Self {
            authid,
            wkt: system.wkt.clone(),
        })
    }

    /// Definition handed to consumers: the WKT when the document embeds
    /// one, else the authority id.
    pub fn definition(&self) -> &str {
        self.wkt.as_deref().unwrap_or(&self.authid)
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self.authid.as_str(), "EPSG:4326" | "EPSG:4269")
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.authid)
    }
}

fn normalize_crs_id(id: &str) -> String {
    if id.contains(CRS84_MARKER) {
        return "EPSG:4326".to_string();
    }

    if let Some(code) = id.strip_prefix(EPSG_URI_PREFIX) {
        return format!("EPSG:{}", code);
    }

    let upper = id.to_uppercase();
    if upper.starts_with("EPSG:") {
        return upper;
    }

    warn!("Unrecognised CRS identifier `{}`, passing through", id);
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage_json::ReferenceSystem;

    fn connection(coords: &[&str], id: Option<&str>, wkt: Option<&str>) -> ReferenceSystemConnection {
        ReferenceSystemConnection {
            coordinates: coords.iter().map(|c| c.to_string()).collect(),
            system: ReferenceSystem {
                type_: "GeographicCRS".to_string(),
                id: id.map(String::from),
                wkt: wkt.map(String::from),
                calendar: None,
            },
        }
    }

    #[test]
    fn test_crs84_maps_to_epsg_4326() {
        let refs = vec![connection(
            &["x", "y"],
            Some("http://www.opengis.net/def/crs/OGC/1.3/CRS84"),
            None,
        )];
        let crs = SpatialReference::from_referencing(&refs).unwrap();
        assert_eq!(crs.authid, "EPSG:4326");
        assert!(crs.is_geographic());
    }

    #[test]
    fn test_epsg_uri() {
        let refs = vec![connection(
            &["y", "x"],
            Some("http://www.opengis.net/def/crs/EPSG/0/3857"),
            None,
        )];
        let crs = SpatialReference::from_referencing(&refs).unwrap();
        assert_eq!(crs.to_string(), "EPSG:3857");
        assert!(!crs.is_geographic());
    }

    #[test]
    fn test_skips_temporal_connection() {
        let refs = vec![
            connection(&["t"], None, None),
            connection(&["x", "y", "z"], Some("epsg:4979"), None),
        ];
        let crs = SpatialReference::from_referencing(&refs).unwrap();
        assert_eq!(crs.authid, "EPSG:4979");
    }

    #[test]
    fn test_wkt_is_kept() {
        let wkt = r#"GEOGCS["Unknown",DATUM["Unknown",SPHEROID["WGS_1984",6378137,298.257223563]]]"#;
        let refs = vec![connection(&["x", "y"], None, Some(wkt))];
        let crs = SpatialReference::from_referencing(&refs).unwrap();
        assert_eq!(crs.wkt.as_deref(), Some(wkt));
        assert_eq!(crs.definition(), wkt);

        let with_id = vec![connection(&["x", "y"], Some("EPSG:4326"), Some(wkt))];
        let crs = SpatialReference::from_referencing(&with_id).unwrap();
        assert_eq!(crs.authid, "EPSG:4326");
        assert_eq!(crs.definition(), wkt);
        assert_eq!(SpatialReference::wgs84().definition(), "EPSG:4326");
    }

    #[test]
    fn test_no_horizontal_connection() {
        let refs = vec![connection(&["t"], None, None)];
        assert!(SpatialReference::from_referencing(&refs).is_none());
    }
}
