use std::fmt;

use ndarray::{Array1, ArrayView1};

use crate::control::GroundControlPoint;
use crate::engine::{GeodeticEngine, ModelData, NativeEngine};
use crate::error::Error;
use crate::options::TransformerOptions;
use crate::transformer::session::Session;
use crate::transformer::{TransformDirection, Transformer};

/// Transformer for ground control point based models.
///
/// The engine fits a polynomial (or a thin plate spline when
/// `options.tps` is set) the first time the transformer is opened or used.
/// Close it, or use it through a [`Scope`](crate::transformer::Scope), to
/// release the fitted model.
pub struct GcpTransformer<E: GeodeticEngine = NativeEngine> {
    gcps: Vec<GroundControlPoint>,
    options: TransformerOptions,
    session: Session<E>,
}

impl GcpTransformer<NativeEngine> {
    pub fn new(gcps: Vec<GroundControlPoint>, options: TransformerOptions) -> Result<Self, Error> {
        Self::with_engine(gcps, options, NativeEngine)
    }
}

impl<E: GeodeticEngine> GcpTransformer<E> {
    pub fn with_engine(
        gcps: Vec<GroundControlPoint>,
        options: TransformerOptions,
        engine: E,
    ) -> Result<Self, Error> {
        if gcps.is_empty() {
            return Err(Error::Value(
                "GCPTransformer requires a non-empty sequence of GroundControlPoint".into(),
            ));
        }
        if options.order > 3 {
            return Err(Error::Value(format!(
                "GCP polynomial order must be between 0 and 3, got {}",
                options.order
            )));
        }
        Ok(Self {
            gcps,
            options,
            session: Session::new(engine),
        })
    }

    pub fn gcps(&self) -> &[GroundControlPoint] {
        &self.gcps
    }
}

impl<E: GeodeticEngine> Transformer for GcpTransformer<E> {
    fn transform(
        &mut self,
        xs: ArrayView1<'_, f64>,
        ys: ArrayView1<'_, f64>,
        zs: ArrayView1<'_, f64>,
        direction: TransformDirection,
    ) -> Result<(Array1<f64>, Array1<f64>), Error> {
        self.session.evaluate(
            ModelData::Gcps(&self.gcps),
            &self.options,
            xs,
            ys,
            zs,
            direction,
        )
    }

    fn open(&mut self) -> Result<(), Error> {
        self.session
            .open(ModelData::Gcps(&self.gcps), &self.options)
            .map(|_| ())
    }

    fn close(&mut self) {
        self.session.close();
    }

    fn closed(&self) -> bool {
        self.session.is_closed()
    }
}

impl<E: GeodeticEngine> fmt::Display for GcpTransformer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.closed() { "closed" } else { "open" };
        write!(f, "<{state} GCPTransformer>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::Affine;
    use crate::coords::Pair;
    use crate::transformer::session::tests::CountingEngine;
    use crate::transformer::{ops, Offset, Scope};
    use approx::assert_relative_eq;

    fn gcps() -> Vec<GroundControlPoint> {
        let t = Affine::new(10.0, 0.0, 1000.0, 0.0, -10.0, 5000.0);
        [(0.0, 0.0), (0.0, 100.0), (100.0, 0.0), (100.0, 100.0), (50.0, 30.0)]
            .iter()
            .map(|&(row, col)| {
                let (x, y) = t.forward(col, row);
                GroundControlPoint::new(row, col, x, y)
            })
            .collect()
    }

    #[test]
    fn test_empty_gcps_rejected() {
        let err = GcpTransformer::new(Vec::new(), TransformerOptions::default());
        assert!(matches!(err, Err(Error::Value(_))));
    }

    #[test]
    fn test_bad_order_rejected() {
        let err = GcpTransformer::new(gcps(), TransformerOptions::new().order(5));
        assert!(matches!(err, Err(Error::Value(_))));
    }

    #[test]
    fn test_xy_and_rowcol() {
        let mut t = GcpTransformer::new(gcps(), TransformerOptions::default()).unwrap();
        let mut scope = Scope::enter(&mut t).unwrap();
        let (x, y) = scope.xy(10, 20, None, Offset::UpperLeft).unwrap().scalar().unwrap();
        assert_relative_eq!(x, 1200.0, epsilon = 1e-6);
        assert_relative_eq!(y, 4900.0, epsilon = 1e-6);

        let pair = scope.rowcol(vec![1205.0], vec![4895.0], None, ops::floor).unwrap();
        assert_eq!(pair, Pair::Seq(vec![10], vec![20]));
    }

    #[test]
    fn test_closed_after_scope() {
        let mut t = GcpTransformer::new(gcps(), TransformerOptions::default()).unwrap();
        {
            let mut scope = Scope::enter(&mut t).unwrap();
            scope.xy(0, 0, None, Offset::Center).unwrap();
        }
        assert!(t.closed());
        assert_eq!(t.to_string(), "<closed GCPTransformer>");
        assert!(matches!(t.xy(0, 0, None, Offset::Center), Err(Error::Closed)));
        assert!(matches!(t.rowcol(0.0, 0.0, None, ops::floor), Err(Error::Closed)));
        assert!(matches!(Scope::enter(&mut t), Err(Error::Closed)));
        t.close();
    }

    #[test]
    fn test_scope_opens_once_and_closes_on_error() {
        let engine = CountingEngine::default();
        let mut t =
            GcpTransformer::with_engine(gcps(), TransformerOptions::default(), engine.clone())
                .unwrap();
        let result = (|| -> Result<(), Error> {
            let mut scope = Scope::enter(&mut t)?;
            scope.xy(vec![0, 1], vec![0, 1], None, Offset::Center)?;
            scope.xy(vec![0, 1], vec![0, 1, 2], None, Offset::Center)?;
            Ok(())
        })();
        assert!(result.is_err());
        assert_eq!(engine.opened.get(), 1);
        assert_eq!(engine.closed.get(), 1);
        assert!(t.closed());
    }
}
