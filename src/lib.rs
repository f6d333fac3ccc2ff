//! Pixel <-> world coordinate transformation for rasters described by an
//! affine geotransform, ground control points or an RPC camera model.

pub mod affine;
pub mod control;
pub mod coords;
pub mod engine;
pub mod error;
pub mod options;
pub mod transformer;

#[cfg(feature = "python")]
mod py;

pub use affine::{array_bounds, from_bounds, from_origin, Affine};
pub use control::{from_gcps, GroundControlPoint};
pub use coords::{Coords, Pair};
pub use engine::{GeodeticEngine, NativeEngine, RpcModel};
pub use error::{EngineError, Error, TransformError};
pub use options::{RpcOptions, TransformerOptions};
pub use transformer::{
    get_transformer, rowcol, with_transformer, xy, AffineTransformer, GcpTransformer, Offset,
    RpcTransformer, Scope, TransformDirection, TransformSource, Transformer,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// A Python module implemented in Rust.
#[cfg(feature = "python")]
#[pymodule]
fn _rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    py::register(m)?;
    Ok(())
}
