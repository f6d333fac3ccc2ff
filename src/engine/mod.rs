//! Geodetic engines: the evaluators behind GCP and RPC transformers.
//!
//! An engine fits or loads a model when a handle is opened, evaluates
//! coordinate batches through that handle, and releases it on close.
//! [`NativeEngine`] is the built-in implementation.

pub mod native;
pub mod polynomial;
pub mod rpc;
pub mod tps;

use ndarray::{Array1, ArrayView1};

use crate::control::GroundControlPoint;
use crate::error::EngineError;
use crate::options::TransformerOptions;
use crate::transformer::TransformDirection;

pub use native::NativeEngine;
pub use rpc::RpcModel;

/// Model data an engine opens a handle for.
#[derive(Clone, Copy, Debug)]
pub enum ModelData<'a> {
    Gcps(&'a [GroundControlPoint]),
    Rpc(&'a RpcModel),
}

/// Trait for engines that evaluate non-affine pixel <-> world models.
///
/// `evaluate` receives (xs, ys, zs) in the input space of `direction`:
/// pixel (col, row, z) for [`TransformDirection::Forward`], world
/// (x, y, z) for [`TransformDirection::Reverse`].
pub trait GeodeticEngine {
    type Handle;

    /// Prepare a handle for `model`. Fitting happens here.
    fn open(
        &self,
        model: ModelData<'_>,
        options: &TransformerOptions,
    ) -> Result<Self::Handle, EngineError>;

    fn evaluate(
        &self,
        handle: &mut Self::Handle,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
        zs: ArrayView1<'_, f64>,
        direction: TransformDirection,
    ) -> Result<(Array1<f64>, Array1<f64>), EngineError>;

    fn close(&self, handle: Self::Handle);
}
