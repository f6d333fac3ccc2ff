//! Coordinate inputs and outputs for the batch converters.
//!
//! Callers hand in scalars or arrays; both are broadcast to three
//! equal-length 1-D arrays before any transformer sees them. Results are
//! handed back as a [`Pair`] whose variant mirrors the caller's input shape.

use ndarray::{Array1, ArrayD, IxDyn};
use num_traits::ToPrimitive;

use crate::error::TransformError;

/// A scalar or n-dimensional array of coordinate values.
#[derive(Clone, Debug, PartialEq)]
pub enum Coords {
    Scalar(f64),
    Array(ArrayD<f64>),
}

impl Coords {
    /// True when the input carries iteration semantics (anything but a bare scalar).
    pub fn is_array(&self) -> bool {
        matches!(self, Coords::Array(_))
    }

    fn to_dyn(&self) -> ArrayD<f64> {
        match self {
            Coords::Scalar(v) => ArrayD::from_elem(IxDyn(&[]), *v),
            Coords::Array(arr) => arr.clone(),
        }
    }
}

macro_rules! impl_scalar_coords {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Coords {
                fn from(v: $t) -> Self {
                    Coords::Scalar(v.to_f64().unwrap_or(f64::NAN))
                }
            }
        )*
    };
}

impl_scalar_coords!(f64, f32, i32, i64, u32, u64, isize, usize);

impl<T: ToPrimitive> From<Vec<T>> for Coords {
    fn from(v: Vec<T>) -> Self {
        Coords::from(v.as_slice())
    }
}

impl<T: ToPrimitive> From<&[T]> for Coords {
    fn from(v: &[T]) -> Self {
        let values: Array1<f64> = v.iter().map(|x| x.to_f64().unwrap_or(f64::NAN)).collect();
        Coords::Array(values.into_dyn())
    }
}

impl<T: ToPrimitive, const N: usize> From<[T; N]> for Coords {
    fn from(v: [T; N]) -> Self {
        Coords::from(v.as_slice())
    }
}

impl From<Array1<f64>> for Coords {
    fn from(arr: Array1<f64>) -> Self {
        Coords::Array(arr.into_dyn())
    }
}

impl From<ndarray::Array2<f64>> for Coords {
    fn from(arr: ndarray::Array2<f64>) -> Self {
        Coords::Array(arr.into_dyn())
    }
}

impl From<ArrayD<f64>> for Coords {
    fn from(arr: ArrayD<f64>) -> Self {
        Coords::Array(arr)
    }
}

/// Three equal-length coordinate arrays produced by [`broadcast`].
#[derive(Clone, Debug)]
pub struct Broadcast {
    pub first: Array1<f64>,
    pub second: Array1<f64>,
    pub third: Array1<f64>,
}

/// Broadcast two coordinate inputs and an optional third (defaulting to 0)
/// to a common 1-D length.
///
/// Scalars stretch to the common length. Array inputs must all share one
/// shape, and that shape must be one-dimensional.
pub fn broadcast(
    first: &Coords,
    second: &Coords,
    third: Option<&Coords>,
) -> Result<Broadcast, TransformError> {
    let mut inputs = vec![first, second];
    if let Some(third) = third {
        inputs.push(third);
    }
    let shape = common_shape(&inputs)?;
    if shape.len() != 1 {
        return Err(TransformError::Dimensions(shape.len()));
    }
    let n = shape[0];

    Ok(Broadcast {
        first: stretch(first, n)?,
        second: stretch(second, n)?,
        third: match third {
            Some(third) => stretch(third, n)?,
            None => Array1::zeros(n),
        },
    })
}

/// Shape shared by the array inputs, or `[1]` when every input is a scalar.
fn common_shape(inputs: &[&Coords]) -> Result<Vec<usize>, TransformError> {
    let mut common: Option<&[usize]> = None;
    for input in inputs {
        let Coords::Array(arr) = input else {
            continue;
        };
        if arr.ndim() == 0 {
            continue;
        }
        match common {
            None => common = Some(arr.shape()),
            Some(shape) if shape == arr.shape() => {}
            Some(shape) => {
                return Err(TransformError::Shape(format!(
                    "shapes {:?} and {:?} differ",
                    shape,
                    arr.shape()
                )))
            }
        }
    }
    Ok(common.map_or_else(|| vec![1], <[usize]>::to_vec))
}

fn stretch(input: &Coords, n: usize) -> Result<Array1<f64>, TransformError> {
    let arr = input.to_dyn();
    let view = arr.broadcast(IxDyn(&[n])).ok_or_else(|| {
        TransformError::Shape(format!("cannot broadcast {:?} to ({n},)", arr.shape()))
    })?;
    Ok(view.iter().copied().collect())
}

/// A pair of results shaped after the caller's input.
///
/// Scalar inputs produce [`Pair::Scalar`]; anything iterable produces
/// [`Pair::Seq`] with values in input order.
#[derive(Clone, Debug, PartialEq)]
pub enum Pair<T> {
    Scalar(T, T),
    Seq(Vec<T>, Vec<T>),
}

impl<T> Pair<T> {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Pair::Scalar(..))
    }

    pub fn len(&self) -> usize {
        match self {
            Pair::Scalar(..) => 1,
            Pair::Seq(first, _) => first.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The scalar pair, if this is the scalar variant.
    pub fn scalar(self) -> Option<(T, T)> {
        match self {
            Pair::Scalar(a, b) => Some((a, b)),
            Pair::Seq(..) => None,
        }
    }

    /// Both halves as vectors, regardless of variant.
    pub fn into_vecs(self) -> (Vec<T>, Vec<T>) {
        match self {
            Pair::Scalar(a, b) => (vec![a], vec![b]),
            Pair::Seq(a, b) => (a, b),
        }
    }
}
