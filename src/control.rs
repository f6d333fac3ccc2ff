//! Ground control points.

use crate::affine::Affine;
use crate::engine::polynomial::Polynomial2;
use crate::error::Error;

/// A mapping of a raster pixel (row, col) to a world coordinate (x, y, z).
#[derive(Clone, Debug, PartialEq)]
pub struct GroundControlPoint {
    pub row: f64,
    pub col: f64,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub id: Option<String>,
    pub info: Option<String>,
}

impl GroundControlPoint {
    pub fn new(row: f64, col: f64, x: f64, y: f64) -> Self {
        Self {
            row,
            col,
            x,
            y,
            z: None,
            id: None,
            info: None,
        }
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Pixel position as (col, row).
    pub(crate) fn pixel(&self) -> (f64, f64) {
        (self.col, self.row)
    }

    /// World position as (x, y).
    pub(crate) fn world(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Fit an affine geotransform to ground control points by least squares.
///
/// Fails when the points do not determine an affine transform (fewer than
/// three, or all collinear).
pub fn from_gcps(gcps: &[GroundControlPoint]) -> Result<Affine, Error> {
    let pixels: Vec<(f64, f64)> = gcps.iter().map(GroundControlPoint::pixel).collect();
    let world: Vec<(f64, f64)> = gcps.iter().map(GroundControlPoint::world).collect();
    let fit = Polynomial2::fit(&pixels, &world, 1)?;
    Ok(fit.to_affine())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::from_origin;
    use approx::assert_relative_eq;

    fn grid_gcps(transform: &Affine) -> Vec<GroundControlPoint> {
        let mut gcps = Vec::new();
        for row in [0.0, 50.0, 100.0] {
            for col in [0.0, 80.0, 160.0] {
                let (x, y) = transform.forward(col, row);
                gcps.push(GroundControlPoint::new(row, col, x, y));
            }
        }
        gcps
    }

    #[test]
    fn test_from_gcps_recovers_affine() {
        let expected = from_origin(300000.0, 4100000.0, 30.0, 30.0);
        let fitted = from_gcps(&grid_gcps(&expected)).unwrap();
        assert_relative_eq!(fitted.a, expected.a, epsilon = 1e-6);
        assert_relative_eq!(fitted.b, expected.b, epsilon = 1e-6);
        assert_relative_eq!(fitted.c, expected.c, epsilon = 1e-3);
        assert_relative_eq!(fitted.d, expected.d, epsilon = 1e-6);
        assert_relative_eq!(fitted.e, expected.e, epsilon = 1e-6);
        assert_relative_eq!(fitted.f, expected.f, epsilon = 1e-3);
    }

    #[test]
    fn test_from_gcps_rotated() {
        let expected = Affine::new(0.8, 0.6, 1000.0, 0.6, -0.8, 2000.0);
        let fitted = from_gcps(&grid_gcps(&expected)).unwrap();
        let (x, y) = fitted.forward(37.0, 12.0);
        let (ex, ey) = expected.forward(37.0, 12.0);
        assert_relative_eq!(x, ex, epsilon = 1e-6);
        assert_relative_eq!(y, ey, epsilon = 1e-6);
    }

    #[test]
    fn test_from_gcps_underdetermined() {
        let gcps = vec![
            GroundControlPoint::new(0.0, 0.0, 10.0, 20.0),
            GroundControlPoint::new(1.0, 1.0, 11.0, 19.0),
        ];
        assert!(from_gcps(&gcps).is_err());

        let collinear = vec![
            GroundControlPoint::new(0.0, 0.0, 0.0, 0.0),
            GroundControlPoint::new(1.0, 1.0, 1.0, 1.0),
            GroundControlPoint::new(2.0, 2.0, 2.0, 2.0),
        ];
        assert!(from_gcps(&collinear).is_err());
    }

    #[test]
    fn test_builder() {
        let gcp = GroundControlPoint::new(1.0, 2.0, 3.0, 4.0)
            .with_z(5.0)
            .with_id("1")
            .with_info("corner");
        assert_eq!(gcp.z, Some(5.0));
        assert_eq!(gcp.id.as_deref(), Some("1"));
        assert_eq!(gcp.pixel(), (2.0, 1.0));
    }
}
