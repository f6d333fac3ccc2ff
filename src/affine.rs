use std::fmt;
use std::ops::Mul;

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{Error, TransformError};

/// A 2D affine transform representing a geotransform.
///
/// Maps pixel coordinates (col, row) to projected coordinates (x, y):
///   x = a * col + b * row + c
///   y = d * col + e * row + f
///
/// In GDAL convention: [c, a, b, f, d, e]
/// We store as: [a, b, c, d, e, f]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

/// The identity transform. Pixel and world coordinates coincide.
pub const IDENTITY: Affine = Affine::identity();

/// [`IDENTITY`] in GDAL geotransform ordering.
pub const GDAL_IDENTITY: [f64; 6] = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

impl Affine {
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// Pure translation by (xoff, yoff).
    pub const fn translation(xoff: f64, yoff: f64) -> Self {
        Self::new(1.0, 0.0, xoff, 0.0, 1.0, yoff)
    }

    /// Pure scaling about the origin.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// Create from a GDAL-style geotransform array [c, a, b, f, d, e].
    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        Self {
            a: gt[1],
            b: gt[2],
            c: gt[0],
            d: gt[4],
            e: gt[5],
            f: gt[3],
        }
    }

    /// Convert to GDAL-style geotransform array [c, a, b, f, d, e].
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Coefficients in (a, b, c, d, e, f) order.
    pub fn to_tuple(&self) -> (f64, f64, f64, f64, f64, f64) {
        (self.a, self.b, self.c, self.d, self.e, self.f)
    }

    /// Build from six coefficients in (a, b, c, d, e, f) order, or from all
    /// nine matrix elements with a final row of (0, 0, 1).
    ///
    /// Sequences that look like a GDAL geotransform are rejected.
    pub fn from_coefficients(seq: &[f64]) -> Result<Self, Error> {
        let seq = match seq {
            [head @ .., g, h, i] if head.len() == 6 && [*g, *h, *i] == [0.0, 0.0, 1.0] => head,
            _ => seq,
        };
        let coeffs: [f64; 6] = seq.try_into().map_err(|_| {
            Error::Value(format!(
                "expected 6 affine coefficients, got {}",
                seq.len()
            ))
        })?;
        if tastes_like_gdal(&coeffs) {
            return Err(Error::Value(
                "GDAL-style transforms are not accepted, use Affine::from_gdal".into(),
            ));
        }
        let [a, b, c, d, e, f] = coeffs;
        Ok(Self::new(a, b, c, d, e, f))
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    pub fn is_identity(&self) -> bool {
        *self == IDENTITY
    }

    /// True when the transform collapses the plane and has no inverse.
    pub fn is_degenerate(&self) -> bool {
        let det = self.determinant();
        det == 0.0 || !det.is_finite()
    }

    /// The homogeneous 3×3 matrix `[[a, b, c], [d, e, f], [0, 0, 1]]`.
    pub fn matrix(&self) -> Array2<f64> {
        ndarray::array![
            [self.a, self.b, self.c],
            [self.d, self.e, self.f],
            [0.0, 0.0, 1.0]
        ]
    }

    /// Apply the forward transform: (col, row) -> (x, y).
    pub fn forward(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.a * col + self.b * row + self.c;
        let y = self.d * col + self.e * row + self.f;
        (x, y)
    }

    /// Apply the forward transform to N points as a single 3×3 · 3×N product.
    pub fn forward_batch(
        &self,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let mut input = Array2::<f64>::ones((3, xs.len()));
        input.row_mut(0).assign(&xs);
        input.row_mut(1).assign(&ys);
        let output = self.matrix().dot(&input);
        (output.row(0).to_owned(), output.row(1).to_owned())
    }

    /// Compute the inverse affine transform.
    pub fn inverse(&self) -> Result<Affine, TransformError> {
        if self.is_degenerate() {
            return Err(TransformError::Singular);
        }
        let inv_det = 1.0 / self.determinant();
        Ok(Affine {
            a: self.e * inv_det,
            b: -self.b * inv_det,
            c: (self.b * self.f - self.e * self.c) * inv_det,
            d: -self.d * inv_det,
            e: self.a * inv_det,
            f: (self.d * self.c - self.a * self.f) * inv_det,
        })
    }
}

impl Default for Affine {
    fn default() -> Self {
        IDENTITY
    }
}

/// Composition: `(lhs * rhs)` applies `rhs` first, then `lhs`.
impl Mul for Affine {
    type Output = Affine;

    fn mul(self, rhs: Affine) -> Affine {
        Affine {
            a: self.a * rhs.a + self.b * rhs.d,
            b: self.a * rhs.b + self.b * rhs.e,
            c: self.a * rhs.c + self.b * rhs.f + self.c,
            d: self.d * rhs.a + self.e * rhs.d,
            e: self.d * rhs.b + self.e * rhs.e,
            f: self.d * rhs.c + self.e * rhs.f + self.f,
        }
    }
}

impl fmt::Display for Affine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "| {:.2}, {:.2}, {:.2}|\n| {:.2}, {:.2}, {:.2}|\n| 0.00, 0.00, 1.00|",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

/// Return true if `seq` matches the GDAL geotransform pattern.
fn tastes_like_gdal(seq: &[f64; 6]) -> bool {
    *seq == GDAL_IDENTITY || (seq[2] == 0.0 && seq[4] == 0.0 && seq[1] > 0.0 && seq[5] < 0.0)
}

/// Affine transform for a north-up raster given its upper-left corner and pixel sizes.
pub fn from_origin(west: f64, north: f64, xsize: f64, ysize: f64) -> Affine {
    Affine::translation(west, north) * Affine::scale(xsize, -ysize)
}

/// Affine transform for a north-up raster given its bounds and pixel dimensions.
pub fn from_bounds(
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    width: usize,
    height: usize,
) -> Affine {
    Affine::translation(west, north)
        * Affine::scale((east - west) / width as f64, (south - north) / height as f64)
}

/// Return the (west, south, east, north) bounds of an array given its shape and transform.
pub fn array_bounds(height: usize, width: usize, transform: &Affine) -> (f64, f64, f64, f64) {
    let (h, w) = (height as f64, width as f64);
    if transform.b == 0.0 && transform.d == 0.0 {
        let west = transform.c;
        let south = transform.f + transform.e * h;
        let east = transform.c + transform.a * w;
        let north = transform.f;
        return (west, south, east, north);
    }

    // Rotated or sheared: take the envelope of all four corners.
    let corners = [
        (transform.c, transform.f),
        transform.forward(0.0, h),
        transform.forward(w, h),
        transform.forward(w, 0.0),
    ];
    corners.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(west, south, east, north), &(x, y)| {
            (west.min(x), south.min(y), east.max(x), north.max(y))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_forward_identity() {
        let (x, y) = IDENTITY.forward(5.0, 10.0);
        assert_relative_eq!(x, 5.0);
        assert_relative_eq!(y, 10.0);
    }

    #[test]
    fn test_forward_with_offset_and_scale() {
        // 10m resolution, top-left at (500000, 6000000), north-up
        let aff = Affine::new(10.0, 0.0, 500000.0, 0.0, -10.0, 6000000.0);
        let (x, y) = aff.forward(100.0, 100.0);
        assert_relative_eq!(x, 501000.0);
        assert_relative_eq!(y, 5999000.0);
    }

    #[test]
    fn test_forward_batch_matches_pointwise() {
        let aff = Affine::new(2.0, 0.5, 100.0, -0.25, -2.0, 50.0);
        let cols = array![0.0, 1.5, 3.0, -4.0];
        let rows = array![0.0, 2.0, 7.5, 1.0];
        let (xs, ys) = aff.forward_batch(cols.view(), rows.view());
        for i in 0..cols.len() {
            let (x, y) = aff.forward(cols[i], rows[i]);
            assert_relative_eq!(xs[i], x, epsilon = 1e-12);
            assert_relative_eq!(ys[i], y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_forward_batch_empty() {
        let empty = Array1::<f64>::zeros(0);
        let (xs, ys) = IDENTITY.forward_batch(empty.view(), empty.view());
        assert!(xs.is_empty() && ys.is_empty());
    }

    #[test]
    fn test_inverse_roundtrip() {
        let aff = Affine::new(10.0, 0.0, 500000.0, 0.0, -10.0, 6000000.0);
        let inv = aff.inverse().unwrap();
        let (col, row) = inv.forward(501000.0, 5999000.0);
        assert_relative_eq!(col, 100.0, epsilon = 1e-10);
        assert_relative_eq!(row, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_inverse_of_tiny_pixels() {
        // Determinants far below f64::EPSILON are still invertible.
        let aff = Affine::new(1e-9, 0.0, 10.0, 0.0, -1e-9, 50.0);
        let inv = aff.inverse().unwrap();
        let (col, row) = inv.forward(10.0 + 5e-9, 50.0 - 3e-9);
        assert_relative_eq!(col, 5.0, epsilon = 1e-4);
        assert_relative_eq!(row, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_singular_affine() {
        let aff = Affine::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(matches!(aff.inverse(), Err(TransformError::Singular)));
    }

    #[test]
    fn test_gdal_roundtrip() {
        let gt = [500000.0, 10.0, 0.0, 6000000.0, 0.0, -10.0];
        let aff = Affine::from_gdal(&gt);
        let gt2 = aff.to_gdal();
        for (a, b) in gt.iter().zip(gt2.iter()) {
            assert_relative_eq!(a, b);
        }
    }

    #[test]
    fn test_from_coefficients_rejects_gdal_order() {
        assert!(Affine::from_coefficients(&[500000.0, 10.0, 0.0, 6000000.0, 0.0, -10.0]).is_err());
        assert!(Affine::from_coefficients(&GDAL_IDENTITY).is_err());
        assert!(Affine::from_coefficients(&[1.0, 2.0]).is_err());
        assert!(Affine::from_coefficients(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0]).is_err());

        let full = [2.0, 0.0, 5.0, 0.0, -2.0, 9.0, 0.0, 0.0, 1.0];
        assert_eq!(
            Affine::from_coefficients(&full).unwrap(),
            Affine::new(2.0, 0.0, 5.0, 0.0, -2.0, 9.0)
        );

        let aff = Affine::from_coefficients(&[10.0, 0.0, 500000.0, 0.0, -10.0, 6000000.0]).unwrap();
        assert_eq!(aff, Affine::new(10.0, 0.0, 500000.0, 0.0, -10.0, 6000000.0));
    }

    #[test]
    fn test_composition_order() {
        let t = Affine::translation(5.0, 7.0) * Affine::scale(2.0, 3.0);
        // Scale applies first.
        assert_eq!(t.forward(1.0, 1.0), (7.0, 10.0));
        let roundtrip = t.inverse().unwrap() * t;
        let (col, row) = roundtrip.forward(3.0, -4.0);
        assert_relative_eq!(col, 3.0, epsilon = 1e-12);
        assert_relative_eq!(row, -4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_origin() {
        let t = from_origin(0.0, 10.0, 2.0, 2.0);
        assert_eq!(t, Affine::new(2.0, 0.0, 0.0, 0.0, -2.0, 10.0));
    }

    #[test]
    fn test_from_bounds() {
        let t = from_bounds(-120.0, 30.0, -100.0, 50.0, 200, 100);
        assert_relative_eq!(t.a, 0.1);
        assert_relative_eq!(t.e, -0.2);
        assert_relative_eq!(t.c, -120.0);
        assert_relative_eq!(t.f, 50.0);
    }

    #[test]
    fn test_array_bounds() {
        let t = from_origin(0.0, 10.0, 1.0, 1.0);
        assert_eq!(array_bounds(2, 2, &t), (0.0, 8.0, 2.0, 10.0));
    }

    #[test]
    fn test_array_bounds_rotated() {
        // 90 degree rotation: columns run south, rows run east.
        let t = Affine::new(0.0, 1.0, 0.0, -1.0, 0.0, 0.0);
        let (west, south, east, north) = array_bounds(2, 3, &t);
        assert_relative_eq!(west, 0.0);
        assert_relative_eq!(south, -3.0);
        assert_relative_eq!(east, 2.0);
        assert_relative_eq!(north, 0.0);
    }
}
