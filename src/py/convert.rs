//! Conversions between Python objects and crate types.

use std::collections::HashMap;

use numpy::PyReadonlyArrayDyn;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyFloat, PyInt, PyList, PySequence, PyString, PyTuple};

use crate::affine::Affine;
use crate::control::GroundControlPoint;
use crate::coords::{Coords, Pair};
use crate::engine::RpcModel;
use crate::options::TransformerOptions;
use crate::transformer::TransformSource;

/// Scalars stay scalars; sequences and numpy arrays become float arrays.
pub(crate) fn extract_coords(ob: &Bound<'_, PyAny>) -> PyResult<Coords> {
    if let Ok(arr) = ob.extract::<PyReadonlyArrayDyn<'_, f64>>() {
        return Ok(Coords::Array(arr.as_array().to_owned()));
    }
    if ob.is_instance_of::<PyFloat>() || ob.is_instance_of::<PyInt>() {
        return Ok(Coords::Scalar(ob.extract()?));
    }
    if ob.hasattr("__len__")? && !ob.is_instance_of::<PyString>() {
        let py = ob.py();
        let kwargs = PyDict::new(py);
        kwargs.set_item("dtype", "float64")?;
        let arr = py
            .import("numpy")?
            .call_method("asarray", (ob,), Some(&kwargs))?;
        let arr = arr.extract::<PyReadonlyArrayDyn<'_, f64>>()?;
        return Ok(Coords::Array(arr.as_array().to_owned()));
    }
    Ok(Coords::Scalar(ob.extract()?))
}

pub(crate) fn extract_optional_coords(ob: Option<&Bound<'_, PyAny>>) -> PyResult<Option<Coords>> {
    match ob {
        Some(ob) if !ob.is_none() => Ok(Some(extract_coords(ob)?)),
        _ => Ok(None),
    }
}

/// An affine 6- or 9-sequence, a sequence of GCPs or an RPC mapping.
///
/// `None` maps to `None` so the factory can reject it.
pub(crate) fn extract_transform(ob: &Bound<'_, PyAny>) -> PyResult<Option<TransformSource>> {
    if ob.is_none() {
        return Ok(None);
    }
    if let Ok(dict) = ob.downcast::<PyDict>() {
        return Ok(Some(TransformSource::Rpc(extract_rpc(dict)?)));
    }
    if let Ok(seq) = ob.downcast::<PySequence>() {
        if seq.len()? == 0 && !ob.is_instance_of::<PyString>() {
            return Ok(Some(TransformSource::Gcps(Vec::new())));
        }
    }
    if let Ok(coeffs) = ob.extract::<Vec<f64>>() {
        return Ok(Some(TransformSource::Affine(Affine::from_coefficients(&coeffs)?)));
    }
    if let Ok(items) = ob.extract::<Vec<Bound<'_, PyAny>>>() {
        let gcps = items.iter().map(extract_gcp).collect::<PyResult<Vec<_>>>()?;
        return Ok(Some(TransformSource::Gcps(gcps)));
    }
    Err(PyValueError::new_err("Invalid transform"))
}

fn not_a_gcp() -> PyErr {
    PyValueError::new_err("GCPTransformer requires sequence of GroundControlPoint")
}

/// A GCP object with `row`, `col`, `x`, `y` (and optional `z`) attributes, or
/// a `(row, col, x, y[, z])` tuple.
///
/// Anything else is a `ValueError`.
pub(crate) fn extract_gcp(ob: &Bound<'_, PyAny>) -> PyResult<GroundControlPoint> {
    if ob.hasattr("row")? {
        return gcp_from_attrs(ob).map_err(|_| not_a_gcp());
    }
    let values: Vec<f64> = ob.extract().map_err(|_| not_a_gcp())?;
    match values.as_slice() {
        &[row, col, x, y] => Ok(GroundControlPoint::new(row, col, x, y)),
        &[row, col, x, y, z] => Ok(GroundControlPoint::new(row, col, x, y).with_z(z)),
        _ => Err(PyValueError::new_err(format!(
            "GCP must be (row, col, x, y[, z]), got {} values",
            values.len()
        ))),
    }
}

fn gcp_from_attrs(ob: &Bound<'_, PyAny>) -> PyResult<GroundControlPoint> {
    let mut gcp = GroundControlPoint::new(
        ob.getattr("row")?.extract()?,
        ob.getattr("col")?.extract()?,
        ob.getattr("x")?.extract()?,
        ob.getattr("y")?.extract()?,
    );
    gcp.z = optional_attr(ob, "z")?;
    gcp.id = optional_attr(ob, "id")?;
    gcp.info = optional_attr(ob, "info")?;
    Ok(gcp)
}

fn optional_attr<'py, T: FromPyObject<'py>>(
    ob: &Bound<'py, PyAny>,
    name: &str,
) -> PyResult<Option<T>> {
    if !ob.hasattr(name)? {
        return Ok(None);
    }
    ob.getattr(name)?.extract()
}

/// RPC mapping with either `RPC.to_dict()` keys or GDAL metadata keys.
pub(crate) fn extract_rpc(dict: &Bound<'_, PyDict>) -> PyResult<RpcModel> {
    let mut values = HashMap::new();
    for (key, value) in dict.iter() {
        let key: String = key.extract()?;
        values.insert(key.to_lowercase(), value);
    }
    let get = |name: &str| {
        values
            .get(name)
            .ok_or_else(|| PyValueError::new_err(format!("RPC model is missing '{name}'")))
    };
    let scalar = |name: &str| get(name).and_then(rpc_number);
    let optional = |name: &str| match values.get(name) {
        Some(v) if !v.is_none() => rpc_number(v).map(Some),
        _ => Ok(None),
    };
    let coeffs = |name: &str| get(name).and_then(|v| rpc_coefficients(name, v));

    Ok(RpcModel {
        err_bias: optional("err_bias")?,
        err_rand: optional("err_rand")?,
        height_off: scalar("height_off")?,
        height_scale: scalar("height_scale")?,
        lat_off: scalar("lat_off")?,
        lat_scale: scalar("lat_scale")?,
        long_off: scalar("long_off")?,
        long_scale: scalar("long_scale")?,
        line_off: scalar("line_off")?,
        line_scale: scalar("line_scale")?,
        samp_off: scalar("samp_off")?,
        samp_scale: scalar("samp_scale")?,
        line_num_coeff: coeffs("line_num_coeff")?,
        line_den_coeff: coeffs("line_den_coeff")?,
        samp_num_coeff: coeffs("samp_num_coeff")?,
        samp_den_coeff: coeffs("samp_den_coeff")?,
    })
}

// GDAL metadata values are strings, optionally followed by a unit.
fn rpc_number(ob: &Bound<'_, PyAny>) -> PyResult<f64> {
    if let Ok(s) = ob.extract::<String>() {
        return s
            .split_whitespace()
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(|| PyValueError::new_err(format!("invalid RPC value '{s}'")));
    }
    ob.extract()
}

fn rpc_coefficients(name: &str, ob: &Bound<'_, PyAny>) -> PyResult<[f64; 20]> {
    let values: Vec<f64> = match ob.extract::<String>() {
        Ok(s) => s
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| PyValueError::new_err(format!("invalid RPC {name}")))?,
        Err(_) => ob.extract()?,
    };
    let n = values.len();
    values
        .try_into()
        .map_err(|_| PyValueError::new_err(format!("RPC {name} needs 20 coefficients, got {n}")))
}

/// GDAL transformer options from `**kwargs`.
pub(crate) fn extract_options(kwargs: Option<&Bound<'_, PyDict>>) -> PyResult<TransformerOptions> {
    let Some(kwargs) = kwargs else {
        return Ok(TransformerOptions::default());
    };
    let mut pairs = Vec::with_capacity(kwargs.len());
    for (key, value) in kwargs.iter() {
        pairs.push(format!("{}={}", key.str()?, value.str()?));
    }
    Ok(TransformerOptions::from_pairs(pairs)?)
}

/// `(a, b)` for a scalar pair, `([a...], [b...])` otherwise.
pub(crate) fn pair_into_py<'py, T>(py: Python<'py>, pair: Pair<T>) -> PyResult<Bound<'py, PyTuple>>
where
    T: IntoPyObject<'py>,
{
    match pair {
        Pair::Scalar(a, b) => PyTuple::new(py, [a, b]),
        Pair::Seq(a, b) => {
            let a = PyList::new(py, a)?;
            let b = PyList::new(py, b)?;
            PyTuple::new(py, [a, b])
        }
    }
}
