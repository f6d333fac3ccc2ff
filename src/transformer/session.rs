//! Handle lifecycle shared by engine-backed transformers.

use ndarray::{Array1, ArrayView1};

use crate::engine::{GeodeticEngine, ModelData};
use crate::error::Error;
use crate::options::TransformerOptions;
use crate::transformer::TransformDirection;

enum State<H> {
    /// Not opened yet.
    Pending,
    Open(H),
    Closed,
}

/// Owns an engine and at most one open handle.
///
/// The handle is opened lazily and released exactly once. Once closed the
/// session stays closed: every later use fails with [`Error::Closed`].
pub(crate) struct Session<E: GeodeticEngine> {
    engine: E,
    state: State<E::Handle>,
}

impl<E: GeodeticEngine> Session<E> {
    pub(crate) fn new(engine: E) -> Self {
        Self {
            engine,
            state: State::Pending,
        }
    }

    pub(crate) fn open(
        &mut self,
        model: ModelData<'_>,
        options: &TransformerOptions,
    ) -> Result<&mut E::Handle, Error> {
        if let State::Pending = self.state {
            let handle = self.engine.open(model, options)?;
            log::debug!("opened {} engine handle", model_kind(&model));
            self.state = State::Open(handle);
        }
        match &mut self.state {
            State::Open(handle) => Ok(handle),
            _ => Err(Error::Closed),
        }
    }

    pub(crate) fn evaluate(
        &mut self,
        model: ModelData<'_>,
        options: &TransformerOptions,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
        zs: ArrayView1<'_, f64>,
        direction: TransformDirection,
    ) -> Result<(Array1<f64>, Array1<f64>), Error> {
        self.open(model, options)?;
        let Self { engine, state } = self;
        match state {
            State::Open(handle) => Ok(engine.evaluate(handle, xs, ys, zs, direction)?),
            _ => Err(Error::Closed),
        }
    }

    pub(crate) fn close(&mut self) {
        if let State::Open(handle) = std::mem::replace(&mut self.state, State::Closed) {
            self.engine.close(handle);
            log::debug!("closed engine handle");
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }
}

impl<E: GeodeticEngine> Drop for Session<E> {
    fn drop(&mut self) {
        self.close();
    }
}

fn model_kind(model: &ModelData<'_>) -> &'static str {
    match model {
        ModelData::Gcps(_) => "GCP",
        ModelData::Rpc(_) => "RPC",
    }
}
