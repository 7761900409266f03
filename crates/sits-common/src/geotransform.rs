//! Affine geotransforms and the 2x2 matrix math behind them.
//!
//! A geotransform maps pixel coordinates (column, row) to CRS coordinates:
//!
//! ```text
//! x = origin_x + col * pixel_width + row * row_rotation
//! y = origin_y + col * col_rotation + row * pixel_height
//! ```
//!
//! The six coefficients use the usual GDAL ordering
//! `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.

use serde::{Deserialize, Serialize};

use crate::error::{SitsError, SitsResult};

/// A 2x2 matrix `[[a, b], [c, d]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix2 {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Matrix2 {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Invert the matrix. A zero determinant is a domain error.
    pub fn inverse(&self) -> SitsResult<Matrix2> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(SitsError::SingularMatrix);
        }
        Ok(Matrix2 {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
        })
    }

    /// Multiply the matrix with the column vector `(x, y)`.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.b * y, self.c * x + self.d * y)
    }
}

/// Six-parameter affine pixel-to-CRS transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation terms.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    /// Build from GDAL coefficient order.
    pub fn from_gdal(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_height: c[5],
        }
    }

    /// Coefficients in GDAL order.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// True when both rotation terms vanish.
    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// The linear part of the transform.
    pub fn linear(&self) -> Matrix2 {
        Matrix2::new(
            self.pixel_width,
            self.row_rotation,
            self.col_rotation,
            self.pixel_height,
        )
    }

    /// Map pixel coordinates (column, row) to CRS coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let (dx, dy) = self.linear().apply(col, row);
        (self.origin_x + dx, self.origin_y + dy)
    }

    /// CRS coordinates of the four image corners of a `width x height`
    /// image, clockwise from the upper-left.
    pub fn corners(&self, width: u32, height: u32) -> [(f64, f64); 4] {
        let (w, h) = (width as f64, height as f64);
        [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(w, h),
            self.apply(0.0, h),
        ]
    }

    /// The CRS-to-pixel inverse of this transform.
    pub fn inverse(&self) -> SitsResult<InverseGeoTransform> {
        Ok(InverseGeoTransform {
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            linear: self.linear().inverse()?,
        })
    }
}

/// Maps CRS coordinates back to fractional pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseGeoTransform {
    origin_x: f64,
    origin_y: f64,
    linear: Matrix2,
}

impl InverseGeoTransform {
    /// Fractional (column, row) of a CRS coordinate.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        self.linear.apply(x - self.origin_x, y - self.origin_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_inverse() {
        let m = Matrix2::new(2.0, 1.0, 1.0, 1.0);
        let inv = m.inverse().unwrap();
        let (x, y) = inv.apply(3.0, 2.0);
        assert!((x - 1.0).abs() < 1e-12);
        assert!((y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_matrix_fails() {
        let m = Matrix2::new(1.0, 2.0, 2.0, 4.0);
        assert!(matches!(m.inverse(), Err(SitsError::SingularMatrix)));
        let zero = Matrix2::new(0.0, 0.0, 0.0, 0.0);
        assert!(zero.inverse().is_err());
    }

    #[test]
    fn test_geotransform_round_trip() {
        let gt = GeoTransform::from_gdal([500000.0, 10.0, 0.0, 5100000.0, 0.0, -10.0]);
        let (x, y) = gt.apply(12.5, 7.25);
        assert_eq!((x, y), (500125.0, 5099927.5));
        let (col, row) = gt.inverse().unwrap().apply(x, y);
        assert!((col - 12.5).abs() < 1e-9);
        assert!((row - 7.25).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_geotransform_inverse() {
        let gt = GeoTransform::from_gdal([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        let (x, y) = gt.apply(3.0, 4.0);
        let (col, row) = gt.inverse().unwrap().apply(x, y);
        assert!((col - 3.0).abs() < 1e-9);
        assert!((row - 4.0).abs() < 1e-9);
        assert!(!gt.is_north_up());
    }

    #[test]
    fn test_degenerate_geotransform() {
        let gt = GeoTransform::north_up(0.0, 0.0, 0.0, -1.0);
        assert!(matches!(gt.inverse(), Err(SitsError::SingularMatrix)));
    }

    #[test]
    fn test_corners() {
        let gt = GeoTransform::north_up(10.0, 46.0, 0.5, -0.25);
        let corners = gt.corners(2, 4);
        assert_eq!(corners[0], (10.0, 46.0));
        assert_eq!(corners[1], (11.0, 46.0));
        assert_eq!(corners[2], (11.0, 45.0));
        assert_eq!(corners[3], (10.0, 45.0));
    }
}
