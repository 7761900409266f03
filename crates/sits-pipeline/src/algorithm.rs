//! Interface to the external SITS algorithms.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sits_common::{SitsError, SitsResult};

/// Name of the output holding the class-index raster.
pub const CLASSES_OUTPUT: &str = "classes";

/// Receiver of `(percent, message)` progress updates.
pub trait ProgressSink {
    fn update(&mut self, percent: u8, message: &str);
}

impl<F: FnMut(u8, &str)> ProgressSink for F {
    fn update(&mut self, percent: u8, message: &str) {
        self(percent, message)
    }
}

/// Free-form algorithm parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

impl ParamValue {
    /// Integers stay integers, other numbers become floats, anything else
    /// is kept as text.
    pub fn parse(value: &str) -> Self {
        if let Ok(v) = value.parse::<i64>() {
            ParamValue::Integer(v)
        } else if let Ok(v) = value.parse::<f64>() {
            ParamValue::Float(v)
        } else {
            ParamValue::Text(value.to_string())
        }
    }
}

/// Parameters handed to an algorithm run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmParams {
    /// Number of classes the algorithm produces
    pub n_classes: u32,
    #[serde(default)]
    pub named: BTreeMap<String, ParamValue>,
}

impl AlgorithmParams {
    pub fn new(n_classes: u32) -> Self {
        Self {
            n_classes,
            named: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.named.get(name)
    }
}

/// Result rasters of an algorithm run.
#[derive(Debug, Clone, PartialEq)]
pub enum AlgorithmOutputs {
    Single(PathBuf),
    Named(BTreeMap<String, PathBuf>),
}

impl AlgorithmOutputs {
    /// The output called `name`; a single output answers to any name.
    pub fn get(&self, name: &str) -> Option<&Path> {
        match self {
            AlgorithmOutputs::Single(path) => Some(path),
            AlgorithmOutputs::Named(outputs) => outputs.get(name).map(PathBuf::as_path),
        }
    }

    /// The class-index raster.
    pub fn classes(&self) -> SitsResult<&Path> {
        self.get(CLASSES_OUTPUT).ok_or_else(|| {
            SitsError::Algorithm(format!("no '{}' output produced", CLASSES_OUTPUT))
        })
    }

    pub fn paths(&self) -> Vec<&Path> {
        match self {
            AlgorithmOutputs::Single(path) => vec![path.as_path()],
            AlgorithmOutputs::Named(outputs) => outputs.values().map(PathBuf::as_path).collect(),
        }
    }
}

/// A clustering or classification algorithm run over an aligned stack.
pub trait Algorithm {
    fn name(&self) -> &str;

    fn run(
        &self,
        inputs: &[PathBuf],
        params: &AlgorithmParams,
        progress: &mut dyn ProgressSink,
    ) -> SitsResult<AlgorithmOutputs>;
}
