//! Run-time configuration.
//!
//! Two layers:
//! - [`ConfigSource`]: a flat key-value store (JSON backed) where every read is
//!   optional and comes with a caller-supplied default.
//! - [`SdcConfig`]: the explicit configuration struct assembled once from a
//!   source and passed by reference into sweeper/controller setup.
//!
//! # Example
//! ```
//! use pfasst_rs::config::{ConfigSource, SdcConfig};
//!
//! let source = ConfigSource::from_json_str(r#"{ "abs_res_tol": 1e-10, "num_iters": 8 }"#).unwrap();
//! let config = SdcConfig::from_source(&source).unwrap();
//! assert_eq!(config.num_iters, 8);
//! assert_eq!(config.abs_residual_tol, 1e-10);
//! assert_eq!(config.rel_residual_tol, 0.0);
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::quadrature::QuadratureType;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not valid JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Top-level JSON value is not an object.
    #[error("Configuration root must be an object")]
    NotAnObject,

    /// A key is present but its value has the wrong type.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Flat key-value configuration source.
#[derive(Clone, Debug, Default)]
pub struct ConfigSource {
    values: HashMap<String, Value>,
}

impl ConfigSource {
    /// Empty source: every lookup returns its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            _ => Err(ConfigError::NotAnObject),
        }
    }

    /// Read and parse a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Set (or replace) a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Look up `key`, falling back to `default` when absent.
    ///
    /// A present key whose value does not deserialize into `T` is an error,
    /// never silently replaced by the default.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Like [`get_value`](Self::get_value) but tries several keys in order.
    fn get_aliased<T: DeserializeOwned>(&self, keys: &[&str], default: T) -> Result<T, ConfigError> {
        for key in keys {
            if self.contains(key) {
                return self.get_value(key, default);
            }
        }
        Ok(default)
    }
}

/// Explicit configuration for SDC/MLSDC/PFASST runs.
///
/// Residual tolerances default to `0.0`, which disables the convergence check:
/// the sweeper then always reports "not converged" and runs the full iteration
/// budget.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SdcConfig {
    /// Absolute residual tolerance (0 disables).
    #[serde(alias = "abs_res_tol")]
    pub abs_residual_tol: f64,
    /// Relative residual tolerance (0 disables).
    #[serde(alias = "rel_res_tol")]
    pub rel_residual_tol: f64,
    /// Spatial degrees of freedom per dimension on the finest level.
    pub num_dofs: usize,
    /// Spatial coarsening factor between adjacent levels.
    #[serde(alias = "coarse_factor")]
    pub coarsening_factor: usize,
    /// Number of quadrature nodes on the finest level.
    pub num_nodes: usize,
    /// Quadrature node family.
    pub quadrature: QuadratureType,
    /// Start time.
    pub t0: f64,
    /// Time step size.
    pub dt: f64,
    /// Number of time steps.
    pub num_steps: usize,
    /// Iteration budget per step.
    pub num_iters: usize,
    /// Diffusivity for heat and advection-diffusion problems.
    pub nu: f64,
    /// Advection velocity.
    #[serde(alias = "vel")]
    pub velocity: f64,
    /// Eigenvalue for the Dahlquist test equation.
    pub lambda: f64,
}

impl Default for SdcConfig {
    fn default() -> Self {
        Self {
            abs_residual_tol: 0.0,
            rel_residual_tol: 0.0,
            num_dofs: 64,
            coarsening_factor: 2,
            num_nodes: 3,
            quadrature: QuadratureType::GaussLobatto,
            t0: 0.0,
            dt: 0.01,
            num_steps: 1,
            num_iters: 5,
            nu: 0.02,
            velocity: 1.0,
            lambda: -1.0,
        }
    }
}

impl SdcConfig {
    /// Assemble the configuration from a key-value source.
    pub fn from_source(source: &ConfigSource) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            abs_residual_tol: source
                .get_aliased(&["abs_residual_tol", "abs_res_tol"], d.abs_residual_tol)?,
            rel_residual_tol: source
                .get_aliased(&["rel_residual_tol", "rel_res_tol"], d.rel_residual_tol)?,
            num_dofs: source.get_value("num_dofs", d.num_dofs)?,
            coarsening_factor: source
                .get_aliased(&["coarsening_factor", "coarse_factor"], d.coarsening_factor)?,
            num_nodes: source.get_value("num_nodes", d.num_nodes)?,
            quadrature: source.get_value("quadrature", d.quadrature)?,
            t0: source.get_value("t0", d.t0)?,
            dt: source.get_value("dt", d.dt)?,
            num_steps: source.get_value("num_steps", d.num_steps)?,
            num_iters: source.get_value("num_iters", d.num_iters)?,
            nu: source.get_value("nu", d.nu)?,
            velocity: source.get_aliased(&["velocity", "vel"], d.velocity)?,
            lambda: source.get_value("lambda", d.lambda)?,
        })
    }

    /// Read a JSON file into a source and assemble the configuration.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_source(&ConfigSource::from_file(path)?)
    }

    /// End time of the run.
    pub fn t_end(&self) -> f64 {
        self.t0 + self.dt * self.num_steps as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_absent() {
        let source = ConfigSource::new();
        let cfg = SdcConfig::from_source(&source).unwrap();
        assert_eq!(cfg, SdcConfig::default());
        assert_eq!(cfg.abs_residual_tol, 0.0);
        assert_eq!(cfg.rel_residual_tol, 0.0);
        assert_eq!(cfg.coarsening_factor, 2);
    }

    #[test]
    fn test_aliases() {
        let source =
            ConfigSource::from_json_str(r#"{"abs_res_tol": 1e-8, "rel_res_tol": 1e-6, "coarse_factor": 2}"#)
                .unwrap();
        let cfg = SdcConfig::from_source(&source).unwrap();
        assert_eq!(cfg.abs_residual_tol, 1e-8);
        assert_eq!(cfg.rel_residual_tol, 1e-6);
    }

    #[test]
    fn test_invalid_value_is_error() {
        let source = ConfigSource::from_json_str(r#"{"num_dofs": "many"}"#).unwrap();
        let err = SdcConfig::from_source(&source).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "num_dofs"));
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(matches!(
            ConfigSource::from_json_str("[1, 2]"),
            Err(ConfigError::NotAnObject)
        ));
    }

    #[test]
    fn test_get_value_with_default() {
        let mut source = ConfigSource::new();
        source.set("nu", 0.5);
        assert_eq!(source.get_value("nu", 0.1).unwrap(), 0.5);
        assert_eq!(source.get_value("missing", 7usize).unwrap(), 7);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"num_nodes": 5, "quadrature": "gauss_radau", "dt": 0.1, "num_steps": 4}}"#
        )
        .unwrap();

        let cfg = SdcConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.num_nodes, 5);
        assert_eq!(cfg.quadrature, QuadratureType::GaussRadau);
        assert!((cfg.t_end() - 0.4).abs() < 1e-14);
    }

    #[test]
    fn test_struct_deserialize() {
        let cfg: SdcConfig = serde_json::from_str(r#"{"rel_res_tol": 1e-9}"#).unwrap();
        assert_eq!(cfg.rel_residual_tol, 1e-9);
        assert_eq!(cfg.num_iters, 5);
    }
}
