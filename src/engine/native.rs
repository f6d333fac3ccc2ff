//! Pure-Rust geodetic engine.

use ndarray::{Array1, ArrayView1};

use crate::control::GroundControlPoint;
use crate::engine::polynomial::Polynomial2;
use crate::engine::rpc::RpcModel;
use crate::engine::tps::ThinPlateSpline;
use crate::engine::{GeodeticEngine, ModelData};
use crate::error::EngineError;
use crate::options::{RpcOptions, TransformerOptions};
use crate::transformer::TransformDirection;

/// Built-in engine: least-squares GCP polynomials, thin plate splines and
/// RPC00B models, all evaluated in process.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeEngine;

/// A fitted model, ready for evaluation in both directions.
#[derive(Clone, Debug)]
pub enum NativeHandle {
    Polynomial {
        forward: Polynomial2,
        reverse: Polynomial2,
    },
    Tps {
        forward: ThinPlateSpline,
        reverse: ThinPlateSpline,
    },
    Rpc {
        model: RpcModel,
        options: RpcOptions,
    },
}

/// Polynomial order used when none is requested.
fn auto_order(n_points: usize) -> u8 {
    if n_points >= 10 {
        2
    } else {
        1
    }
}

fn fit_gcps(
    gcps: &[GroundControlPoint],
    options: &TransformerOptions,
) -> Result<NativeHandle, EngineError> {
    if gcps.is_empty() {
        return Err(EngineError::InvalidModel("no ground control points".into()));
    }
    let pixels: Vec<(f64, f64)> = gcps.iter().map(GroundControlPoint::pixel).collect();
    let world: Vec<(f64, f64)> = gcps.iter().map(GroundControlPoint::world).collect();

    if options.tps {
        return Ok(NativeHandle::Tps {
            forward: ThinPlateSpline::fit(&pixels, &world)?,
            reverse: ThinPlateSpline::fit(&world, &pixels)?,
        });
    }

    let order = match options.order {
        0 => auto_order(gcps.len()),
        order => order,
    };
    Ok(NativeHandle::Polynomial {
        forward: Polynomial2::fit(&pixels, &world, order)?,
        reverse: Polynomial2::fit(&world, &pixels, order)?,
    })
}

impl GeodeticEngine for NativeEngine {
    type Handle = NativeHandle;

    fn open(
        &self,
        model: ModelData<'_>,
        options: &TransformerOptions,
    ) -> Result<NativeHandle, EngineError> {
        match model {
            ModelData::Gcps(gcps) => fit_gcps(gcps, options),
            ModelData::Rpc(rpc) => {
                rpc.validate()?;
                Ok(NativeHandle::Rpc {
                    model: rpc.clone(),
                    options: options.rpc.clone(),
                })
            }
        }
    }

    fn evaluate(
        &self,
        handle: &mut NativeHandle,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
        zs: ArrayView1<'_, f64>,
        direction: TransformDirection,
    ) -> Result<(Array1<f64>, Array1<f64>), EngineError> {
        let n = xs.len();
        if ys.len() != n || zs.len() != n {
            return Err(EngineError::Evaluate(format!(
                "coordinate arrays differ in length: {n}, {}, {}",
                ys.len(),
                zs.len()
            )));
        }

        let mut out_x = Array1::zeros(n);
        let mut out_y = Array1::zeros(n);
        for i in 0..n {
            let (x, y, z) = (xs[i], ys[i], zs[i]);
            let (ox, oy) = match (&*handle, direction) {
                (NativeHandle::Polynomial { forward, .. }, TransformDirection::Forward) => {
                    forward.eval(x, y)
                }
                (NativeHandle::Polynomial { reverse, .. }, TransformDirection::Reverse) => {
                    reverse.eval(x, y)
                }
                (NativeHandle::Tps { forward, .. }, TransformDirection::Forward) => {
                    forward.eval(x, y)
                }
                (NativeHandle::Tps { reverse, .. }, TransformDirection::Reverse) => {
                    reverse.eval(x, y)
                }
                (NativeHandle::Rpc { model, options }, direction) => {
                    let height = z * options.height_scale + options.height;
                    match direction {
                        TransformDirection::Forward => {
                            model.image_to_ground(x, y, height, options)?
                        }
                        TransformDirection::Reverse => model.ground_to_image(x, y, height)?,
                    }
                }
            };
            out_x[i] = ox;
            out_y[i] = oy;
        }
        Ok((out_x, out_y))
    }

    fn close(&self, handle: NativeHandle) {
        drop(handle);
    }
}
