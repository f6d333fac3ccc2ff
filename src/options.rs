//! Construction options for engine-backed transformers.

use std::collections::BTreeMap;

use crate::error::Error;

/// Options for RPC transformers, mirroring GDAL's `RPC_*` transformer options.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcOptions {
    /// Height above sea level added to every input z.
    pub height: f64,
    /// Factor applied to input z before `height` is added.
    pub height_scale: f64,
    /// Pixel error at which the pixel -> ground iteration stops.
    pub pixel_error_threshold: f64,
    /// Iteration limit for the pixel -> ground direction.
    pub max_iterations: usize,
}

impl Default for RpcOptions {
    fn default() -> Self {
        Self {
            height: 0.0,
            height_scale: 1.0,
            pixel_error_threshold: 0.1,
            max_iterations: 10,
        }
    }
}

/// Options forwarded to the geodetic engine when a GCP or RPC transformer opens.
///
/// Affine transformers ignore them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformerOptions {
    /// Fit a thin plate spline through the GCPs instead of a polynomial.
    pub tps: bool,
    /// GCP polynomial order (1..=3). Zero picks one from the point count.
    pub order: u8,
    pub rpc: RpcOptions,
    /// Unrecognised options, passed through to the engine untouched.
    pub extra: BTreeMap<String, String>,
}

impl TransformerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tps(mut self, tps: bool) -> Self {
        self.tps = tps;
        self
    }

    pub fn order(mut self, order: u8) -> Self {
        self.order = order;
        self
    }

    pub fn rpc_height(mut self, height: f64) -> Self {
        self.rpc.height = height;
        self
    }

    pub fn rpc_height_scale(mut self, scale: f64) -> Self {
        self.rpc.height_scale = scale;
        self
    }

    pub fn rpc_pixel_error_threshold(mut self, threshold: f64) -> Self {
        self.rpc.pixel_error_threshold = threshold;
        self
    }

    pub fn rpc_max_iterations(mut self, iterations: usize) -> Self {
        self.rpc.max_iterations = iterations;
        self
    }

    /// Accepted for compatibility. Has no effect on results.
    #[deprecated(note = "precision is unused and will be removed")]
    pub fn precision(self, _precision: f64) -> Self {
        warn_precision_deprecated();
        self
    }

    /// Parse GDAL-style `KEY=VALUE` option strings.
    ///
    /// Keys are case-insensitive. Unknown keys are kept in `extra`.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::Value(format!("expected KEY=VALUE, got '{pair}'")))?;
            let (key, value) = (key.trim(), value.trim());
            match key.to_uppercase().as_str() {
                "RPC_HEIGHT" => options.rpc.height = parse_value(key, value)?,
                "RPC_HEIGHT_SCALE" => options.rpc.height_scale = parse_value(key, value)?,
                "RPC_PIXEL_ERROR_THRESHOLD" => {
                    options.rpc.pixel_error_threshold = parse_value(key, value)?
                }
                "RPC_MAX_ITERATIONS" => options.rpc.max_iterations = parse_value(key, value)?,
                "ORDER" => options.order = parse_value(key, value)?,
                "TPS" => options.tps = parse_bool(key, value)?,
                _ => {
                    options.extra.insert(key.to_string(), value.to_string());
                }
            }
        }
        Ok(options)
    }
}

fn warn_precision_deprecated() {
    log::warn!("The precision parameter is unused, deprecated, and will be removed.");
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .parse()
        .map_err(|_| Error::Value(format!("invalid value for {key}: '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => Ok(true),
        "no" | "false" | "off" | "0" => Ok(false),
        _ => Err(Error::Value(format!("invalid value for {key}: '{value}'"))),
    }
}
