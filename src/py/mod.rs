use pyo3::create_exception;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::error::Error;

mod convert;
mod transform;

create_exception!(_rust, TransformError, PyValueError, "Coordinate transformation failed.");
create_exception!(
    _rust,
    ClosedTransformerError,
    PyRuntimeError,
    "A transformer was used after it was closed."
);

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        match err {
            Error::Transform(e) => TransformError::new_err(e.to_string()),
            Error::Closed => ClosedTransformerError::new_err(err.to_string()),
            Error::Value(msg) => PyValueError::new_err(msg),
        }
    }
}

/// Register all Python-visible functions and types.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("TransformError", py.get_type::<TransformError>())?;
    m.add("ClosedTransformerError", py.get_type::<ClosedTransformerError>())?;
    m.add_function(wrap_pyfunction!(transform::xy, m)?)?;
    m.add_function(wrap_pyfunction!(transform::rowcol, m)?)?;
    m.add_function(wrap_pyfunction!(transform::from_origin, m)?)?;
    m.add_function(wrap_pyfunction!(transform::from_bounds, m)?)?;
    m.add_function(wrap_pyfunction!(transform::array_bounds, m)?)?;
    m.add_function(wrap_pyfunction!(transform::from_gcps, m)?)?;
    Ok(())
}
