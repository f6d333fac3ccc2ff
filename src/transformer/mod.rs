//! Pixel <-> world transformers.
//!
//! Every coordinate model implements [`Transformer::transform`]; the batch
//! converters [`Transformer::xy`] and [`Transformer::rowcol`] are layered on
//! top of it and never look at the concrete model.

pub mod affine;
pub mod factory;
pub mod gcp;
pub mod rpc;
mod session;

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use ndarray::{Array1, ArrayView1};

use crate::coords::{broadcast, Coords, Pair};
use crate::error::{Error, TransformError};

pub use self::affine::AffineTransformer;
pub use self::factory::{
    get_transformer, get_transformer_with, rowcol, rowcol_with, xy, xy_with, AnyTransformer,
    TransformSource, TransformerFactory,
};
pub use self::gcp::GcpTransformer;
pub use self::rpc::RpcTransformer;

/// Direction of a transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformDirection {
    /// Pixel -> world.
    Forward,
    /// World -> pixel.
    Reverse,
}

/// Which part of a pixel a world coordinate refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Offset {
    #[default]
    Center,
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl Offset {
    /// (column, row) fractions added to an integer pixel index.
    pub fn fractions(&self) -> (f64, f64) {
        match self {
            Offset::Center => (0.5, 0.5),
            Offset::UpperLeft => (0.0, 0.0),
            Offset::UpperRight => (1.0, 0.0),
            Offset::LowerLeft => (0.0, 1.0),
            Offset::LowerRight => (1.0, 1.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Offset::Center => "center",
            Offset::UpperLeft => "ul",
            Offset::UpperRight => "ur",
            Offset::LowerLeft => "ll",
            Offset::LowerRight => "lr",
        }
    }
}

impl FromStr for Offset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(Offset::Center),
            "ul" => Ok(Offset::UpperLeft),
            "ur" => Ok(Offset::UpperRight),
            "ll" => Ok(Offset::LowerLeft),
            "lr" => Ok(Offset::LowerRight),
            _ => Err(TransformError::InvalidOffset(s.to_string()).into()),
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rounding operations for [`Transformer::rowcol`].
pub mod ops {
    pub fn floor(v: f64) -> i64 {
        v.floor() as i64
    }

    pub fn ceil(v: f64) -> i64 {
        v.ceil() as i64
    }

    /// Round half away from zero.
    pub fn round(v: f64) -> i64 {
        v.round() as i64
    }
}

/// A coordinate model that converts between pixel and world space.
pub trait Transformer {
    /// Transform equal-length coordinate arrays in `direction`.
    ///
    /// Forward input is (cols, rows, zs) and output (xs, ys); reverse input
    /// is (xs, ys, zs) and output (cols, rows).
    fn transform(
        &mut self,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
        zs: ArrayView1<'_, f64>,
        direction: TransformDirection,
    ) -> Result<(Array1<f64>, Array1<f64>), Error>;

    /// Acquire whatever the model needs before evaluation.
    fn open(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Release resources. Idempotent.
    fn close(&mut self) {}

    fn closed(&self) -> bool {
        false
    }

    /// World coordinates of pixels at `rows`, `cols`.
    ///
    /// Scalar `rows` yield [`Pair::Scalar`] when a single point results;
    /// otherwise x and y values are returned as sequences in input order.
    fn xy<R, C>(
        &mut self,
        rows: R,
        cols: C,
        zs: Option<Coords>,
        offset: Offset,
    ) -> Result<Pair<f64>, Error>
    where
        R: Into<Coords>,
        C: Into<Coords>,
        Self: Sized,
    {
        if self.closed() {
            return Err(Error::Closed);
        }
        let (rows, cols) = (rows.into(), cols.into());
        let as_array = rows.is_array();
        let b = broadcast(&rows, &cols, zs.as_ref())?;

        let (coff, roff) = offset.fractions();
        let mut shift = AffineTransformer::new(crate::affine::Affine::translation(coff, roff));
        let (offset_cols, offset_rows) = shift.transform(
            b.second.view(),
            b.first.view(),
            b.third.view(),
            TransformDirection::Forward,
        )?;

        let (xs, ys) = self.transform(
            offset_cols.view(),
            offset_rows.view(),
            b.third.view(),
            TransformDirection::Forward,
        )?;
        if xs.len() == 1 && !as_array {
            Ok(Pair::Scalar(xs[0], ys[0]))
        } else {
            Ok(Pair::Seq(xs.to_vec(), ys.to_vec()))
        }
    }

    /// Pixel (row, col) indices of world coordinates `xs`, `ys`.
    ///
    /// `op` turns fractional pixel positions into indices, see [`ops`].
    /// Rows come first in the result. Coordinates that map to a NaN or
    /// infinite pixel position are rejected before `op` sees them.
    fn rowcol<X, Y, T, F>(
        &mut self,
        xs: X,
        ys: Y,
        zs: Option<Coords>,
        op: F,
    ) -> Result<Pair<T>, Error>
    where
        X: Into<Coords>,
        Y: Into<Coords>,
        F: Fn(f64) -> T,
        Self: Sized,
    {
        if self.closed() {
            return Err(Error::Closed);
        }
        let (xs, ys) = (xs.into(), ys.into());
        let as_array = xs.is_array() || ys.is_array() || zs.as_ref().is_some_and(Coords::is_array);
        let b = broadcast(&xs, &ys, zs.as_ref())?;

        let (cols, rows) = self.transform(
            b.first.view(),
            b.second.view(),
            b.third.view(),
            TransformDirection::Reverse,
        )?;
        if rows.iter().chain(cols.iter()).any(|v| !v.is_finite()) {
            return Err(TransformError::InvalidInputs(
                "coordinates do not map to a finite pixel position".into(),
            )
            .into());
        }
        if as_array {
            Ok(Pair::Seq(
                rows.iter().map(|&r| op(r)).collect(),
                cols.iter().map(|&c| op(c)).collect(),
            ))
        } else {
            let (row, col) = rows
                .first()
                .zip(cols.first())
                .ok_or_else(|| TransformError::InvalidInputs("no coordinates".into()))?;
            Ok(Pair::Scalar(op(*row), op(*col)))
        }
    }
}

/// Scoped use of a transformer.
///
/// Entering opens the transformer; dropping the scope closes it on every
/// exit path, including early returns through `?`.
pub struct Scope<'a, T: Transformer> {
    inner: &'a mut T,
}

impl<'a, T: Transformer> Scope<'a, T> {
    pub fn enter(inner: &'a mut T) -> Result<Self, Error> {
        inner.open()?;
        Ok(Self { inner })
    }
}

impl<T: Transformer> Deref for Scope<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.inner
    }
}

impl<T: Transformer> DerefMut for Scope<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.inner
    }
}

impl<T: Transformer> Drop for Scope<'_, T> {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Open `transformer`, run `f` on it and close it again.
pub fn with_transformer<T, R, F>(transformer: &mut T, f: F) -> Result<R, Error>
where
    T: Transformer,
    F: FnOnce(&mut T) -> Result<R, Error>,
{
    let mut scope = Scope::enter(transformer)?;
    f(&mut *scope)
}
