use std::fmt;

use ndarray::{Array1, ArrayView1};

use crate::affine::Affine;
use crate::error::{Error, TransformError};
use crate::transformer::{TransformDirection, Transformer};

/// Transformer for affine geotransforms. Pure computation, nothing to open.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransformer {
    transform: Affine,
}

impl AffineTransformer {
    /// Construction always succeeds; a singular transform only fails
    /// when used in the reverse direction.
    pub fn new(transform: Affine) -> Self {
        Self { transform }
    }

    pub fn affine(&self) -> &Affine {
        &self.transform
    }
}

impl Transformer for AffineTransformer {
    fn transform(
        &mut self,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
        _zs: ArrayView1<'_, f64>,
        direction: TransformDirection,
    ) -> Result<(Array1<f64>, Array1<f64>), Error> {
        if xs.len() != ys.len() {
            return Err(TransformError::Shape(format!(
                "{} xs but {} ys",
                xs.len(),
                ys.len()
            ))
            .into());
        }
        let matrix = match direction {
            TransformDirection::Forward => self.transform,
            TransformDirection::Reverse => self.transform.inverse()?,
        };
        Ok(matrix.forward_batch(xs, ys))
    }
}

impl fmt::Display for AffineTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<AffineTransformer>")
    }
}
