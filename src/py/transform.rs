//! PyO3 bindings for pixel <-> world coordinate conversion.

use pyo3::exceptions::{PyDeprecationWarning, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyTuple};

use crate::affine::{self, Affine};
use crate::control::{self, GroundControlPoint};
use crate::coords::{Coords, Pair};
use crate::error::Error;
use crate::options::TransformerOptions;
use crate::transformer::{get_transformer, ops, Offset, Scope, TransformSource, Transformer};

use super::convert::{
    extract_coords, extract_gcp, extract_optional_coords, extract_options, extract_transform,
    pair_into_py,
};

type AffineTuple = (f64, f64, f64, f64, f64, f64);

/// Get the x and y coordinates of pixels at `rows` and `cols`.
///
/// Args:
///     transform: Affine coefficients (a, b, c, d, e, f), a list of
///         (row, col, x, y[, z]) ground control points, or an RPC dict.
///     rows: Pixel row(s). A scalar or a sequence.
///     cols: Pixel column(s). A scalar or a sequence.
///     zs: Optional height(s), used by RPC models.
///     offset: Which part of the pixel to return: "center", "ul", "ur",
///         "ll" or "lr".
///     **rpc_options: GDAL transformer options such as RPC_HEIGHT.
///
/// Returns:
///     (x, y) floats for a scalar row, otherwise (xs, ys) lists.
#[pyfunction]
#[pyo3(signature = (transform, rows, cols, zs=None, offset="center", **rpc_options))]
pub fn xy<'py>(
    py: Python<'py>,
    transform: &Bound<'py, PyAny>,
    rows: &Bound<'py, PyAny>,
    cols: &Bound<'py, PyAny>,
    zs: Option<&Bound<'py, PyAny>>,
    offset: &str,
    rpc_options: Option<&Bound<'py, PyDict>>,
) -> PyResult<Bound<'py, PyTuple>> {
    let source = extract_transform(transform)?;
    let offset: Offset = offset.parse()?;
    let rows = extract_coords(rows)?;
    let cols = extract_coords(cols)?;
    let zs = extract_optional_coords(zs)?;
    let options = extract_options(rpc_options)?;

    let pair = py.allow_threads(move || -> Result<Pair<f64>, Error> {
        let factory = get_transformer(source.as_ref(), &options)?;
        let mut transformer = factory()?;
        let mut scope = Scope::enter(&mut transformer)?;
        scope.xy(rows, cols, zs, offset)
    })?;
    pair_into_py(py, pair)
}

/// Get the rows and cols of the pixels containing `xs` and `ys`.
///
/// Args:
///     transform: Affine coefficients, GCPs or an RPC dict, as for `xy`.
///     xs: x coordinate(s).
///     ys: y coordinate(s).
///     zs: Optional height(s), used by RPC models.
///     op: "floor" (default), "ceil", "round", or a callable applied to
///         each fractional row and column.
///     precision: Deprecated and ignored.
///     **rpc_options: GDAL transformer options such as RPC_HEIGHT.
///
/// Returns:
///     (row, col) for scalar inputs, otherwise (rows, cols) lists.
#[pyfunction]
#[pyo3(signature = (transform, xs, ys, zs=None, op=None, precision=None, **rpc_options))]
#[allow(clippy::too_many_arguments)]
pub fn rowcol<'py>(
    py: Python<'py>,
    transform: &Bound<'py, PyAny>,
    xs: &Bound<'py, PyAny>,
    ys: &Bound<'py, PyAny>,
    zs: Option<&Bound<'py, PyAny>>,
    op: Option<&Bound<'py, PyAny>>,
    precision: Option<&Bound<'py, PyAny>>,
    rpc_options: Option<&Bound<'py, PyDict>>,
) -> PyResult<Bound<'py, PyTuple>> {
    if precision.is_some_and(|p| !p.is_none()) {
        PyErr::warn(
            py,
            py.get_type::<PyDeprecationWarning>().as_any(),
            c"The 'precision' parameter is unused, deprecated, and will be removed in 2.0.0.",
            1,
        )?;
    }
    let source = extract_transform(transform)?;
    let xs = extract_coords(xs)?;
    let ys = extract_coords(ys)?;
    let zs = extract_optional_coords(zs)?;
    let options = extract_options(rpc_options)?;

    let builtin = match op {
        None => Some(ops::floor as fn(f64) -> i64),
        Some(op) if op.is_none() => Some(ops::floor as fn(f64) -> i64),
        Some(op) => match op.extract::<String>() {
            Ok(name) => Some(builtin_op(&name)?),
            Err(_) if op.is_callable() => None,
            Err(_) => return Err(PyValueError::new_err("op must be a string or a callable")),
        },
    };

    match (builtin, op) {
        (Some(f), _) => {
            let pair = py.allow_threads(move || invert(source, options, xs, ys, zs, f))?;
            pair_into_py(py, pair)
        }
        (None, Some(op)) => {
            let pair = py.allow_threads(move || invert(source, options, xs, ys, zs, |v| v))?;
            apply_op(py, op, pair)
        }
        (None, None) => Err(PyValueError::new_err("op must be a string or a callable")),
    }
}

fn builtin_op(name: &str) -> PyResult<fn(f64) -> i64> {
    match name {
        "floor" => Ok(ops::floor),
        "ceil" => Ok(ops::ceil),
        "round" => Ok(ops::round),
        _ => Err(PyValueError::new_err(format!(
            "Unknown op '{name}', expected 'floor', 'ceil' or 'round'"
        ))),
    }
}

fn invert<T, F>(
    source: Option<TransformSource>,
    options: TransformerOptions,
    xs: Coords,
    ys: Coords,
    zs: Option<Coords>,
    op: F,
) -> Result<Pair<T>, Error>
where
    F: Fn(f64) -> T,
{
    let factory = get_transformer(source.as_ref(), &options)?;
    let mut transformer = factory()?;
    let mut scope = Scope::enter(&mut transformer)?;
    scope.rowcol(xs, ys, zs, op)
}

fn apply_op<'py>(
    py: Python<'py>,
    op: &Bound<'py, PyAny>,
    pair: Pair<f64>,
) -> PyResult<Bound<'py, PyTuple>> {
    let call = |v: f64| op.call1((v,));
    match pair {
        Pair::Scalar(row, col) => PyTuple::new(py, [call(row)?, call(col)?]),
        Pair::Seq(rows, cols) => {
            let rows = rows.into_iter().map(&call).collect::<PyResult<Vec<_>>>()?;
            let cols = cols.into_iter().map(&call).collect::<PyResult<Vec<_>>>()?;
            PyTuple::new(py, [PyList::new(py, rows)?, PyList::new(py, cols)?])
        }
    }
}

/// Affine transform for a north-up raster with its upper left corner at
/// (`west`, `north`).
#[pyfunction]
pub fn from_origin(west: f64, north: f64, xsize: f64, ysize: f64) -> AffineTuple {
    affine::from_origin(west, north, xsize, ysize).to_tuple()
}

/// Affine transform mapping a `width` x `height` raster onto the bounds.
#[pyfunction]
pub fn from_bounds(
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    width: usize,
    height: usize,
) -> AffineTuple {
    affine::from_bounds(west, south, east, north, width, height).to_tuple()
}

/// (west, south, east, north) bounds of an array under `transform`.
#[pyfunction]
pub fn array_bounds(
    height: usize,
    width: usize,
    transform: Vec<f64>,
) -> PyResult<(f64, f64, f64, f64)> {
    let transform = Affine::from_coefficients(&transform)?;
    Ok(affine::array_bounds(height, width, &transform))
}

/// Least-squares affine transform from ground control points.
#[pyfunction]
pub fn from_gcps<'py>(gcps: Vec<Bound<'py, PyAny>>) -> PyResult<AffineTuple> {
    let gcps = gcps
        .iter()
        .map(extract_gcp)
        .collect::<PyResult<Vec<GroundControlPoint>>>()?;
    Ok(control::from_gcps(&gcps)?.to_tuple())
}
