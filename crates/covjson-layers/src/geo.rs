//! Georeferencing of assembled rasters.

use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};

/// An axis-aligned extent in CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box holding all points, `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Self::new(x, y, x, y),
                Some(b) => b.expand_to(x, y),
            })
        })
    }

    /// Grow the box to contain a point.
    pub fn expand_to(self, x: f64, y: f64) -> Self {
        Self {
            min_x: self.min_x.min(x),
            min_y: self.min_y.min(y),
            max_x: self.max_x.max(x),
            max_y: self.max_y.max(y),
        }
    }

    /// Smallest box holding both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Affine transform from pixel (col, row) to CRS coordinates, without
/// rotation.
///
/// Pixel sizes are signed: a negative `pixel_height` means rows run from
/// north to south.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X of the outer edge of the first column.
    pub origin_x: f64,
    pub pixel_width: f64,
    /// Y of the outer edge of the first row.
    pub origin_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from cell-centre coordinates of the x and y axes.
    pub fn from_axes(
        x: &[f64],
        y: &[f64],
        tolerance: f64,
        fallback_pixel_size: f64,
    ) -> LayerResult<Self> {
        let pixel_width = uniform_spacing("x", x, tolerance, fallback_pixel_size)?;
        let pixel_height = uniform_spacing("y", y, tolerance, fallback_pixel_size)?;
        Ok(Self {
            origin_x: x[0] - pixel_width / 2.0,
            pixel_width,
            origin_y: y[0] - pixel_height / 2.0,
            pixel_height,
        })
    }

    /// GDAL-style coefficients.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    /// Centre of a pixel.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Extent covered by `cols × rows` pixels.
    pub fn bounds(&self, cols: usize, rows: usize) -> BoundingBox {
        let x2 = self.origin_x + cols as f64 * self.pixel_width;
        let y2 = self.origin_y + rows as f64 * self.pixel_height;
        BoundingBox::new(
            self.origin_x.min(x2),
            self.origin_y.min(y2),
            self.origin_x.max(x2),
            self.origin_y.max(y2),
        )
    }

    /// First row is the northernmost.
    pub fn is_north_up(&self) -> bool {
        self.pixel_height < 0.0
    }

    /// Same extent with the row order reversed.
    pub fn flipped_rows(&self, rows: usize) -> Self {
        Self {
            origin_y: self.origin_y + rows as f64 * self.pixel_height,
            pixel_height: -self.pixel_height,
            ..*self
        }
    }
}

/// Signed spacing of an evenly spaced axis.
///
/// Single-sample axes get `fallback`. Fails when the axis is empty, the
/// spacing is zero, or any step deviates from the mean step by more than
/// `tolerance` (relative).
pub fn uniform_spacing(axis: &str, values: &[f64], tolerance: f64, fallback: f64) -> LayerResult<f64> {
    match values.len() {
        0 => return Err(LayerError::non_uniform(axis, "axis has no values")),
        1 => return Ok(fallback),
        _ => {}
    }

    let n = values.len();
    let step = (values[n - 1] - values[0]) / (n - 1) as f64;
    if step == 0.0 || !step.is_finite() {
        return Err(LayerError::non_uniform(axis, format!("spacing is {}", step)));
    }

    for (i, pair) in values.windows(2).enumerate() {
        let d = pair[1] - pair[0];
        if (d - step).abs() > tolerance * step.abs() {
            return Err(LayerError::non_uniform(
                axis,
                format!("step {} between index {} and {} differs from {}", d, i, i + 1, step),
            ));
        }
    }

    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_spacing() {
        assert_eq!(uniform_spacing("x", &[0.0, 0.5, 1.0], 1e-3, 1.0).unwrap(), 0.5);
        assert_eq!(uniform_spacing("y", &[10.0, 9.0, 8.0], 1e-3, 1.0).unwrap(), -1.0);
        assert_eq!(uniform_spacing("x", &[3.0], 1e-3, 0.25).unwrap(), 0.25);
    }

    #[test]
    fn test_non_uniform_spacing_fails() {
        let err = uniform_spacing("x", &[0.0, 1.0, 3.0], 1e-3, 1.0).unwrap_err();
        assert!(matches!(err, LayerError::NonUniformGrid { ref axis, .. } if axis == "x"));

        assert!(uniform_spacing("x", &[1.0, 1.0], 1e-3, 1.0).is_err());
        assert!(uniform_spacing("x", &[], 1e-3, 1.0).is_err());

        // float noise well inside the tolerance
        assert!(uniform_spacing("x", &[0.0, 0.1, 0.2 + 1e-9, 0.3], 1e-3, 1.0).is_ok());
    }

    #[test]
    fn test_geotransform_half_pixel_origin() {
        let gt = GeoTransform::from_axes(&[0.5, 1.5, 2.5], &[10.0, 9.0], 1e-3, 1.0).unwrap();
        assert_eq!(gt.origin_x, 0.0);
        assert_eq!(gt.origin_y, 10.5);
        assert_eq!(gt.to_gdal(), [0.0, 1.0, 0.0, 10.5, 0.0, -1.0]);
        assert!(gt.is_north_up());
        assert_eq!(gt.pixel_center(1, 1), (1.5, 9.0));
        assert_eq!(gt.bounds(3, 2), BoundingBox::new(0.0, 8.5, 3.0, 10.5));
    }

    #[test]
    fn test_flipped_rows_keep_extent() {
        let gt = GeoTransform::from_axes(&[0.0, 1.0], &[0.0, 1.0, 2.0], 1e-3, 1.0).unwrap();
        assert!(!gt.is_north_up());
        let flipped = gt.flipped_rows(3);
        assert!(flipped.is_north_up());
        assert_eq!(flipped.origin_y, 2.5);
        assert_eq!(flipped.bounds(2, 3), gt.bounds(2, 3));
    }

    #[test]
    fn test_bbox_from_points() {
        let bbox = BoundingBox::from_points(vec![(1.0, 5.0), (-2.0, 3.0), (0.0, 7.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-2.0, 3.0, 1.0, 7.0));
        assert_eq!(bbox.width(), 3.0);
        assert_eq!(bbox.height(), 4.0);
        assert!(bbox.contains_point(0.0, 4.0));
        assert!(BoundingBox::from_points(Vec::<(f64, f64)>::new()).is_none());

        let other = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(bbox.union(&other), BoundingBox::new(-2.0, 0.0, 1.0, 7.0));
    }
}
