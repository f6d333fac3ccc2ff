//! Least-squares bivariate polynomials for GCP transforms.
//!
//! Terms are ordered by total degree, then by descending power of the
//! first coordinate: 1, u, v, u², uv, v², u³, u²v, uv², v³.

use nalgebra::{DMatrix, DVector};

use crate::affine::Affine;
use crate::error::EngineError;

/// Centre and scale applied to inputs before evaluation, to keep higher
/// order terms well conditioned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    pub cx: f64,
    pub cy: f64,
    pub scale: f64,
}

impl Normalization {
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let n = points.len().max(1) as f64;
        let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.1).sum::<f64>() / n;
        let spread = points
            .iter()
            .map(|p| (p.0 - cx).abs().max((p.1 - cy).abs()))
            .fold(0.0, f64::max);
        let scale = if spread > 0.0 && spread.is_finite() {
            spread
        } else {
            1.0
        };
        Self { cx, cy, scale }
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.cx) / self.scale, (y - self.cy) / self.scale)
    }
}

/// Number of coefficients of a bivariate polynomial of the given order.
pub fn num_terms(order: u8) -> usize {
    let o = order as usize;
    (o + 1) * (o + 2) / 2
}

fn terms(order: u8, u: f64, v: f64, out: &mut Vec<f64>) {
    out.clear();
    for degree in 0..=order as i32 {
        for q in 0..=degree {
            let p = degree - q;
            out.push(u.powi(p) * v.powi(q));
        }
    }
}

/// A pair of polynomials mapping (u, v) to (x, y).
#[derive(Clone, Debug)]
pub struct Polynomial2 {
    order: u8,
    norm: Normalization,
    x_coeffs: Vec<f64>,
    y_coeffs: Vec<f64>,
}

impl Polynomial2 {
    /// Fit `src -> dst` by least squares.
    pub fn fit(src: &[(f64, f64)], dst: &[(f64, f64)], order: u8) -> Result<Self, EngineError> {
        if !(1..=3).contains(&order) {
            return Err(EngineError::InvalidModel(format!(
                "polynomial order must be 1, 2 or 3, got {order}"
            )));
        }
        if src.len() != dst.len() {
            return Err(EngineError::Fit(format!(
                "{} source points but {} destination points",
                src.len(),
                dst.len()
            )));
        }
        let n = src.len();
        let n_terms = num_terms(order);
        if n < n_terms {
            return Err(EngineError::Fit(format!(
                "order {order} needs at least {n_terms} control points, got {n}"
            )));
        }

        let norm = Normalization::from_points(src);
        let mut design = DMatrix::<f64>::zeros(n, n_terms);
        let mut row = Vec::with_capacity(n_terms);
        for (i, &(u, v)) in src.iter().enumerate() {
            let (u, v) = norm.apply(u, v);
            terms(order, u, v, &mut row);
            for (j, t) in row.iter().enumerate() {
                design[(i, j)] = *t;
            }
        }

        let svd = design.svd(true, true);
        let max_sv = svd.singular_values.max();
        let tol = max_sv * 1e-10;
        if svd.rank(tol) < n_terms {
            return Err(EngineError::Fit(
                "degenerate control point configuration".into(),
            ));
        }

        let bx = DVector::from_iterator(n, dst.iter().map(|p| p.0));
        let by = DVector::from_iterator(n, dst.iter().map(|p| p.1));
        let x_coeffs = svd
            .solve(&bx, tol)
            .map_err(|e| EngineError::Fit(e.to_string()))?;
        let y_coeffs = svd
            .solve(&by, tol)
            .map_err(|e| EngineError::Fit(e.to_string()))?;

        Ok(Self {
            order,
            norm,
            x_coeffs: x_coeffs.iter().copied().collect(),
            y_coeffs: y_coeffs.iter().copied().collect(),
        })
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn eval(&self, u: f64, v: f64) -> (f64, f64) {
        let (u, v) = self.norm.apply(u, v);
        let mut row = Vec::with_capacity(self.x_coeffs.len());
        terms(self.order, u, v, &mut row);
        let x = row.iter().zip(&self.x_coeffs).map(|(t, c)| t * c).sum();
        let y = row.iter().zip(&self.y_coeffs).map(|(t, c)| t * c).sum();
        (x, y)
    }

    /// The linear part of the fit as an affine transform.
    ///
    /// Only meaningful for order 1; higher order terms are dropped.
    pub fn to_affine(&self) -> Affine {
        let Normalization { cx, cy, scale } = self.norm;
        let lin = |c: &[f64]| {
            let (c0, c1, c2) = (c[0], c[1] / scale, c[2] / scale);
            (c1, c2, c0 - c1 * cx - c2 * cy)
        };
        let (a, b, c) = lin(self.x_coeffs.as_slice());
        let (d, e, f) = lin(self.y_coeffs.as_slice());
        Affine::new(a, b, c, d, e, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(n: usize, step: f64) -> Vec<(f64, f64)> {
        let mut pts = Vec::new();
        for i in 0..n {
            for j in 0..n {
                pts.push((i as f64 * step, j as f64 * step));
            }
        }
        pts
    }

    #[test]
    fn test_num_terms() {
        assert_eq!(num_terms(1), 3);
        assert_eq!(num_terms(2), 6);
        assert_eq!(num_terms(3), 10);
    }

    #[test]
    fn test_fit_exact_quadratic() {
        let f = |u: f64, v: f64| {
            (1.0 + 2.0 * u - v + 0.01 * u * u, 3.0 - u + 0.5 * v + 0.02 * u * v)
        };
        let src = grid(4, 10.0);
        let dst: Vec<_> = src.iter().map(|&(u, v)| f(u, v)).collect();
        let poly = Polynomial2::fit(&src, &dst, 2).unwrap();
        let (x, y) = poly.eval(13.0, 7.0);
        let (ex, ey) = f(13.0, 7.0);
        assert_relative_eq!(x, ex, epsilon = 1e-8);
        assert_relative_eq!(y, ey, epsilon = 1e-8);
    }

    #[test]
    fn test_fit_cubic_large_coordinates() {
        let f = |u: f64, v: f64| (500000.0 + 30.0 * u + 1e-4 * u * u * v, 4.1e6 - 30.0 * v);
        let src = grid(5, 250.0);
        let dst: Vec<_> = src.iter().map(|&(u, v)| f(u, v)).collect();
        let poly = Polynomial2::fit(&src, &dst, 3).unwrap();
        let (x, y) = poly.eval(333.0, 777.0);
        let (ex, ey) = f(333.0, 777.0);
        assert_relative_eq!(x, ex, epsilon = 1e-5);
        assert_relative_eq!(y, ey, epsilon = 1e-5);
    }

    #[test]
    fn test_too_few_points() {
        let src = grid(2, 1.0);
        let err = Polynomial2::fit(&src, &src, 2);
        assert!(matches!(err, Err(EngineError::Fit(_))));
    }

    #[test]
    fn test_invalid_order() {
        let src = grid(4, 1.0);
        assert!(matches!(
            Polynomial2::fit(&src, &src, 4),
            Err(EngineError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_to_affine() {
        let src = grid(3, 100.0);
        let dst: Vec<_> = src.iter().map(|&(u, v)| (10.0 + 2.0 * u, 20.0 - 3.0 * v)).collect();
        let aff = Polynomial2::fit(&src, &dst, 1).unwrap().to_affine();
        assert_relative_eq!(aff.a, 2.0, epsilon = 1e-10);
        assert_relative_eq!(aff.b, 0.0, epsilon = 1e-10);
        assert_relative_eq!(aff.c, 10.0, epsilon = 1e-8);
        assert_relative_eq!(aff.e, -3.0, epsilon = 1e-10);
        assert_relative_eq!(aff.f, 20.0, epsilon = 1e-8);
    }
}
