//! Thin plate spline interpolation through control points.

use nalgebra::DMatrix;

use crate::engine::polynomial::Normalization;
use crate::error::EngineError;

/// Radial basis `r² ln r`, written in terms of r².
#[inline]
fn radial(r2: f64) -> f64 {
    if r2 == 0.0 {
        0.0
    } else {
        0.5 * r2 * r2.ln()
    }
}

/// An interpolating thin plate spline mapping (u, v) to (x, y).
#[derive(Clone, Debug)]
pub struct ThinPlateSpline {
    norm: Normalization,
    centers: Vec<(f64, f64)>,
    /// Per-center radial weights for x and y.
    weights: Vec<(f64, f64)>,
    /// Affine part: constant, u and v coefficients for x and y.
    affine: [(f64, f64); 3],
}

impl ThinPlateSpline {
    pub fn fit(src: &[(f64, f64)], dst: &[(f64, f64)]) -> Result<Self, EngineError> {
        let n = src.len();
        if n != dst.len() {
            return Err(EngineError::Fit(format!(
                "{n} source points but {} destination points",
                dst.len()
            )));
        }
        if n < 3 {
            return Err(EngineError::Fit(format!(
                "thin plate spline needs at least 3 control points, got {n}"
            )));
        }

        let norm = Normalization::from_points(src);
        let centers: Vec<(f64, f64)> = src.iter().map(|&(u, v)| norm.apply(u, v)).collect();

        let size = n + 3;
        let mut system = DMatrix::<f64>::zeros(size, size);
        for (i, &(ui, vi)) in centers.iter().enumerate() {
            for (j, &(uj, vj)) in centers.iter().enumerate().skip(i + 1) {
                let k = radial((ui - uj).powi(2) + (vi - vj).powi(2));
                system[(i, j)] = k;
                system[(j, i)] = k;
            }
            for (j, p) in [1.0, ui, vi].into_iter().enumerate() {
                system[(i, n + j)] = p;
                system[(n + j, i)] = p;
            }
        }

        let mut rhs = DMatrix::<f64>::zeros(size, 2);
        for (i, &(x, y)) in dst.iter().enumerate() {
            rhs[(i, 0)] = x;
            rhs[(i, 1)] = y;
        }

        let solution = system
            .lu()
            .solve(&rhs)
            .filter(|s| s.iter().all(|v| v.is_finite()))
            .ok_or_else(|| {
                EngineError::Fit("control points do not determine a thin plate spline".into())
            })?;

        let weights = (0..n).map(|i| (solution[(i, 0)], solution[(i, 1)])).collect();
        let affine = [0, 1, 2].map(|j| (solution[(n + j, 0)], solution[(n + j, 1)]));
        Ok(Self {
            norm,
            centers,
            weights,
            affine,
        })
    }

    pub fn eval(&self, u: f64, v: f64) -> (f64, f64) {
        let (u, v) = self.norm.apply(u, v);
        let [c, cu, cv] = self.affine;
        let mut x = c.0 + cu.0 * u + cv.0 * v;
        let mut y = c.1 + cu.1 * u + cv.1 * v;
        for (&(ui, vi), &(wx, wy)) in self.centers.iter().zip(&self.weights) {
            let k = radial((u - ui).powi(2) + (v - vi).powi(2));
            x += wx * k;
            y += wy * k;
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolates_control_points() {
        let src = vec![(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0), (40.0, 60.0)];
        let dst = vec![(10.0, 20.0), (110.0, 22.0), (8.0, 118.0), (112.0, 121.0), (52.0, 83.0)];
        let tps = ThinPlateSpline::fit(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(&dst) {
            let (x, y) = tps.eval(s.0, s.1);
            assert_relative_eq!(x, d.0, epsilon = 1e-6);
            assert_relative_eq!(y, d.1, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_reproduces_affine_maps() {
        let f = |u: f64, v: f64| (3.0 + 2.0 * u + 0.5 * v, -1.0 - 0.25 * u + 4.0 * v);
        let src = vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)];
        let dst: Vec<_> = src.iter().map(|&(u, v)| f(u, v)).collect();
        let tps = ThinPlateSpline::fit(&src, &dst).unwrap();
        let (x, y) = tps.eval(3.5, 8.0);
        let (ex, ey) = f(3.5, 8.0);
        assert_relative_eq!(x, ex, epsilon = 1e-8);
        assert_relative_eq!(y, ey, epsilon = 1e-8);
    }

    #[test]
    fn test_too_few_points() {
        let pts = vec![(0.0, 0.0), (1.0, 1.0)];
        assert!(ThinPlateSpline::fit(&pts, &pts).is_err());
    }

    #[test]
    fn test_duplicate_points_rejected() {
        let src = vec![(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let dst = vec![(0.0, 0.0), (5.0, 5.0), (1.0, 0.0), (0.0, 1.0)];
        assert!(ThinPlateSpline::fit(&src, &dst).is_err());
    }
}
