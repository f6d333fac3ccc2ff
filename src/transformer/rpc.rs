use std::fmt;

use ndarray::{Array1, ArrayView1};

use crate::engine::{GeodeticEngine, ModelData, NativeEngine, RpcModel};
use crate::error::Error;
use crate::options::TransformerOptions;
use crate::transformer::session::Session;
use crate::transformer::{TransformDirection, Transformer};

/// Transformer for rational polynomial coefficient camera models.
///
/// Forward maps (col, row, height) to (lon, lat); reverse maps
/// (lon, lat, height) to (col, row). RPC options in
/// [`TransformerOptions::rpc`] control height handling and the pixel -> ground
/// iteration.
pub struct RpcTransformer<E: GeodeticEngine = NativeEngine> {
    rpcs: RpcModel,
    options: TransformerOptions,
    session: Session<E>,
}

impl RpcTransformer<NativeEngine> {
    pub fn new(rpcs: RpcModel, options: TransformerOptions) -> Result<Self, Error> {
        Self::with_engine(rpcs, options, NativeEngine)
    }
}

impl<E: GeodeticEngine> RpcTransformer<E> {
    pub fn with_engine(
        rpcs: RpcModel,
        options: TransformerOptions,
        engine: E,
    ) -> Result<Self, Error> {
        rpcs.validate()
            .map_err(|e| Error::Value(format!("RPCTransformer requires a valid RPC model: {e}")))?;
        if options.rpc.max_iterations == 0 {
            return Err(Error::Value("RPC_MAX_ITERATIONS must be positive".into()));
        }
        Ok(Self {
            rpcs,
            options,
            session: Session::new(engine),
        })
    }

    pub fn rpcs(&self) -> &RpcModel {
        &self.rpcs
    }
}

impl<E: GeodeticEngine> Transformer for RpcTransformer<E> {
    fn transform(
        &mut self,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
        zs: ArrayView1<'_, f64>,
        direction: TransformDirection,
    ) -> Result<(Array1<f64>, Array1<f64>), Error> {
        self.session.evaluate(
            ModelData::Rpc(&self.rpcs),
            &self.options,
            xs,
            ys,
            zs,
            direction,
        )
    }

    fn open(&mut self) -> Result<(), Error> {
        self.session
            .open(ModelData::Rpc(&self.rpcs), &self.options)
            .map(|_| ())
    }

    fn close(&mut self) {
        self.session.close();
    }

    fn closed(&self) -> bool {
        self.session.is_closed()
    }
}

impl<E: GeodeticEngine> fmt::Display for RpcTransformer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.closed() { "closed" } else { "open" };
        write!(f, "<{state} RPCTransformer>")
    }
}
