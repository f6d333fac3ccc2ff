//! Rational polynomial coefficient (RPC) camera models.
//!
//! Ground to image is a direct evaluation of the RPC00B rational
//! polynomials. Image to ground at a fixed height inverts them with Newton
//! iteration on a finite-difference Jacobian.

use crate::error::EngineError;
use crate::options::RpcOptions;

/// RPC00B coefficients and normalization metadata.
///
/// Angles are in degrees, heights in metres above the ellipsoid.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcModel {
    pub err_bias: Option<f64>,
    pub err_rand: Option<f64>,
    pub height_off: f64,
    pub height_scale: f64,
    pub lat_off: f64,
    pub lat_scale: f64,
    pub long_off: f64,
    pub long_scale: f64,
    pub line_off: f64,
    pub line_scale: f64,
    pub samp_off: f64,
    pub samp_scale: f64,
    pub line_num_coeff: [f64; 20],
    pub line_den_coeff: [f64; 20],
    pub samp_num_coeff: [f64; 20],
    pub samp_den_coeff: [f64; 20],
}

impl RpcModel {
    /// Check that every normalization scale is usable.
    pub fn validate(&self) -> Result<(), EngineError> {
        let scales = [
            ("height_scale", self.height_scale),
            ("lat_scale", self.lat_scale),
            ("long_scale", self.long_scale),
            ("line_scale", self.line_scale),
            ("samp_scale", self.samp_scale),
        ];
        for (name, value) in scales {
            if value == 0.0 || !value.is_finite() {
                return Err(EngineError::InvalidModel(format!(
                    "RPC {name} must be finite and non-zero"
                )));
            }
        }
        Ok(())
    }

    /// Project a ground point to image coordinates (sample, line).
    pub fn ground_to_image(
        &self,
        lon: f64,
        lat: f64,
        height: f64,
    ) -> Result<(f64, f64), EngineError> {
        let l = (lon - self.long_off) / self.long_scale;
        let p = (lat - self.lat_off) / self.lat_scale;
        let h = (height - self.height_off) / self.height_scale;
        let (samp, line) = self.normalized_image(l, p, h)?;
        Ok((
            samp * self.samp_scale + self.samp_off,
            line * self.line_scale + self.line_off,
        ))
    }

    /// Locate the ground point at `height` that projects to (sample, line).
    pub fn image_to_ground(
        &self,
        samp: f64,
        line: f64,
        height: f64,
        options: &RpcOptions,
    ) -> Result<(f64, f64), EngineError> {
        const DELTA: f64 = 1e-7;
        let h = (height - self.height_off) / self.height_scale;
        let target = (
            (samp - self.samp_off) / self.samp_scale,
            (line - self.line_off) / self.line_scale,
        );
        let pixel_error = |ds: f64, dl: f64| (ds * self.samp_scale).hypot(dl * self.line_scale);

        // Start at the centre of the normalization domain.
        let (mut l, mut p) = (0.0, 0.0);
        for _ in 0..options.max_iterations {
            let (s0, l0) = self.normalized_image(l, p, h)?;
            let (err_s, err_l) = (target.0 - s0, target.1 - l0);
            if pixel_error(err_s, err_l) <= options.pixel_error_threshold {
                return Ok(self.denormalize_ground(l, p));
            }

            let (s_dl, l_dl) = self.normalized_image(l + DELTA, p, h)?;
            let (s_dp, l_dp) = self.normalized_image(l, p + DELTA, h)?;
            let (ds_dl, dl_dl) = ((s_dl - s0) / DELTA, (l_dl - l0) / DELTA);
            let (ds_dp, dl_dp) = ((s_dp - s0) / DELTA, (l_dp - l0) / DELTA);

            let det = ds_dl * dl_dp - ds_dp * dl_dl;
            if det.abs() < 1e-12 {
                return Err(EngineError::Evaluate(
                    "RPC Jacobian is singular at the current estimate".into(),
                ));
            }
            l += (dl_dp * err_s - ds_dp * err_l) / det;
            p += (ds_dl * err_l - dl_dl * err_s) / det;
        }

        let (s0, l0) = self.normalized_image(l, p, h)?;
        if pixel_error(target.0 - s0, target.1 - l0) <= options.pixel_error_threshold {
            return Ok(self.denormalize_ground(l, p));
        }
        Err(EngineError::NoConvergence(options.max_iterations))
    }

    fn denormalize_ground(&self, l: f64, p: f64) -> (f64, f64) {
        (
            l * self.long_scale + self.long_off,
            p * self.lat_scale + self.lat_off,
        )
    }

    fn normalized_image(&self, l: f64, p: f64, h: f64) -> Result<(f64, f64), EngineError> {
        let t = rpc_terms(l, p, h);
        let samp_den = dot(&self.samp_den_coeff, &t);
        let line_den = dot(&self.line_den_coeff, &t);
        if samp_den == 0.0 || line_den == 0.0 {
            return Err(EngineError::Evaluate(format!(
                "RPC denominator vanishes at ({l}, {p}, {h})"
            )));
        }
        Ok((
            dot(&self.samp_num_coeff, &t) / samp_den,
            dot(&self.line_num_coeff, &t) / line_den,
        ))
    }
}

#[inline]
fn dot(coeffs: &[f64; 20], terms: &[f64; 20]) -> f64 {
    coeffs.iter().zip(terms).map(|(c, t)| c * t).sum()
}

/// RPC00B term ordering, with L = longitude, P = latitude, H = height.
fn rpc_terms(l: f64, p: f64, h: f64) -> [f64; 20] {
    [
        1.0,
        l,
        p,
        h,
        l * p,
        l * h,
        p * h,
        l * l,
        p * p,
        h * h,
        p * l * h,
        l * l * l,
        l * p * p,
        l * h * h,
        l * l * p,
        p * p * p,
        p * h * h,
        l * l * h,
        p * p * h,
        h * h * h,
    ]
}
