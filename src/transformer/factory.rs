//! Transformer selection from a transform value.

use ndarray::{Array1, ArrayView1};

use crate::affine::Affine;
use crate::control::GroundControlPoint;
use crate::coords::{Coords, Pair};
use crate::engine::{GeodeticEngine, NativeEngine, RpcModel};
use crate::error::Error;
use crate::options::TransformerOptions;
use crate::transformer::{
    AffineTransformer, GcpTransformer, Offset, RpcTransformer, Scope, TransformDirection,
    Transformer,
};

/// Any value that describes a pixel <-> world mapping.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformSource {
    Affine(Affine),
    Gcps(Vec<GroundControlPoint>),
    Rpc(RpcModel),
}

impl From<Affine> for TransformSource {
    fn from(transform: Affine) -> Self {
        TransformSource::Affine(transform)
    }
}

impl From<Vec<GroundControlPoint>> for TransformSource {
    fn from(gcps: Vec<GroundControlPoint>) -> Self {
        TransformSource::Gcps(gcps)
    }
}

impl From<&[GroundControlPoint]> for TransformSource {
    fn from(gcps: &[GroundControlPoint]) -> Self {
        TransformSource::Gcps(gcps.to_vec())
    }
}

impl From<RpcModel> for TransformSource {
    fn from(rpcs: RpcModel) -> Self {
        TransformSource::Rpc(rpcs)
    }
}

/// The transformer chosen for a [`TransformSource`].
pub enum AnyTransformer<E: GeodeticEngine = NativeEngine> {
    Affine(AffineTransformer),
    Gcp(GcpTransformer<E>),
    Rpc(RpcTransformer<E>),
}

impl<E: GeodeticEngine> Transformer for AnyTransformer<E> {
    fn transform(
        &mut self,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
        zs: ArrayView1<'_, f64>,
        direction: TransformDirection,
    ) -> Result<(Array1<f64>, Array1<f64>), Error> {
        match self {
            AnyTransformer::Affine(t) => t.transform(xs, ys, zs, direction),
            AnyTransformer::Gcp(t) => t.transform(xs, ys, zs, direction),
            AnyTransformer::Rpc(t) => t.transform(xs, ys, zs, direction),
        }
    }

    fn open(&mut self) -> Result<(), Error> {
        match self {
            AnyTransformer::Affine(t) => t.open(),
            AnyTransformer::Gcp(t) => t.open(),
            AnyTransformer::Rpc(t) => t.open(),
        }
    }

    fn close(&mut self) {
        match self {
            AnyTransformer::Affine(t) => t.close(),
            AnyTransformer::Gcp(t) => t.close(),
            AnyTransformer::Rpc(t) => t.close(),
        }
    }

    fn closed(&self) -> bool {
        match self {
            AnyTransformer::Affine(t) => t.closed(),
            AnyTransformer::Gcp(t) => t.closed(),
            AnyTransformer::Rpc(t) => t.closed(),
        }
    }
}

/// A deferred transformer constructor.
pub type TransformerFactory<E = NativeEngine> =
    Box<dyn FnOnce() -> Result<AnyTransformer<E>, Error>>;

/// Select the transformer for `transform`.
///
/// Returns a constructor rather than an instance so callers decide when the
/// transformer's scope starts. A missing transform is rejected immediately.
pub fn get_transformer(
    transform: Option<&TransformSource>,
    options: &TransformerOptions,
) -> Result<TransformerFactory, Error> {
    get_transformer_with(transform, options, NativeEngine)
}

/// [`get_transformer`] with an explicit engine for GCP and RPC models.
pub fn get_transformer_with<E>(
    transform: Option<&TransformSource>,
    options: &TransformerOptions,
    engine: E,
) -> Result<TransformerFactory<E>, Error>
where
    E: GeodeticEngine + 'static,
{
    let transform = transform.ok_or_else(|| Error::Value("Invalid transform".into()))?;
    let factory: TransformerFactory<E> = match transform.clone() {
        TransformSource::Affine(affine) => {
            Box::new(move || Ok(AnyTransformer::Affine(AffineTransformer::new(affine))))
        }
        TransformSource::Rpc(rpcs) => {
            let options = options.clone();
            Box::new(move || {
                RpcTransformer::with_engine(rpcs, options, engine).map(AnyTransformer::Rpc)
            })
        }
        TransformSource::Gcps(gcps) => {
            let options = options.clone();
            Box::new(move || {
                GcpTransformer::with_engine(gcps, options, engine).map(AnyTransformer::Gcp)
            })
        }
    };
    Ok(factory)
}

/// World coordinates of the pixels at `rows`, `cols`.
///
/// Builds the transformer for `transform`, opens it for the duration of the
/// call and closes it again.
pub fn xy<R, C>(
    transform: &TransformSource,
    rows: R,
    cols: C,
    zs: Option<Coords>,
    offset: Offset,
) -> Result<Pair<f64>, Error>
where
    R: Into<Coords>,
    C: Into<Coords>,
{
    xy_with(transform, rows, cols, zs, offset, &TransformerOptions::default(), NativeEngine)
}

/// [`xy`] with explicit transformer options and engine.
pub fn xy_with<R, C, E>(
    transform: &TransformSource,
    rows: R,
    cols: C,
    zs: Option<Coords>,
    offset: Offset,
    options: &TransformerOptions,
    engine: E,
) -> Result<Pair<f64>, Error>
where
    R: Into<Coords>,
    C: Into<Coords>,
    E: GeodeticEngine + 'static,
{
    let factory = get_transformer_with(Some(transform), options, engine)?;
    let mut transformer = factory()?;
    let mut scope = Scope::enter(&mut transformer)?;
    scope.xy(rows, cols, zs, offset)
}

/// Row and column indices of the pixels containing `xs`, `ys`.
pub fn rowcol<X, Y, T, F>(
    transform: &TransformSource,
    xs: X,
    ys: Y,
    zs: Option<Coords>,
    op: F,
) -> Result<Pair<T>, Error>
where
    X: Into<Coords>,
    Y: Into<Coords>,
    F: Fn(f64) -> T,
{
    rowcol_with(transform, xs, ys, zs, op, &TransformerOptions::default(), NativeEngine)
}

/// [`rowcol`] with explicit transformer options and engine.
pub fn rowcol_with<X, Y, T, F, E>(
    transform: &TransformSource,
    xs: X,
    ys: Y,
    zs: Option<Coords>,
    op: F,
    options: &TransformerOptions,
    engine: E,
) -> Result<Pair<T>, Error>
where
    X: Into<Coords>,
    Y: Into<Coords>,
    F: Fn(f64) -> T,
    E: GeodeticEngine + 'static,
{
    let factory = get_transformer_with(Some(transform), options, engine)?;
    let mut transformer = factory()?;
    let mut scope = Scope::enter(&mut transformer)?;
    scope.rowcol(xs, ys, zs, op)
}
