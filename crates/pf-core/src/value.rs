//! Numeric payloads carried on ports.

use crate::error::{CoreError, CoreResult};
use crate::shape::Shape;

/// A port value: one number or a time series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Scalar(f64),
    Series(Vec<f64>),
}

impl Value {
    /// A series of `len` copies of `v`.
    pub fn filled(len: usize, v: f64) -> Self {
        Value::Series(vec![v; len])
    }

    /// Default value for a port of the given shape.
    pub fn default_for(shape: Shape, v: f64) -> Self {
        match shape {
            Shape::Series(n) => Value::filled(n, v),
            Shape::Scalar | Shape::Dynamic => Value::Scalar(v),
        }
    }

    /// Series length, or `None` for a scalar.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Scalar(_) => None,
            Value::Series(v) => Some(v.len()),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Value::Scalar(_) => None,
            Value::Series(v) => Some(v),
        }
    }

    /// Sum over all entries (a scalar sums to itself).
    pub fn total(&self) -> f64 {
        match self {
            Value::Scalar(v) => *v,
            Value::Series(v) => v.iter().sum(),
        }
    }

    /// Multiply every entry by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        if factor == 1.0 {
            return self.clone();
        }
        match self {
            Value::Scalar(v) => Value::Scalar(v * factor),
            Value::Series(v) => Value::Series(v.iter().map(|x| x * factor).collect()),
        }
    }

    /// Apply `f` to every entry, keeping the shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Value::Scalar(v) => Value::Scalar(f(*v)),
            Value::Series(v) => Value::Series(v.iter().copied().map(f).collect()),
        }
    }

    /// Check the value against a declared shape.
    pub fn check_shape(&self, shape: Shape) -> CoreResult<()> {
        if shape.admits_len(self.len()) {
            Ok(())
        } else {
            Err(CoreError::ShapeMismatch {
                expected: shape.to_string(),
                found: self.describe(),
            })
        }
    }

    /// Check every entry is finite.
    pub fn check_finite(&self, what: &'static str) -> CoreResult<()> {
        let bad = match self {
            Value::Scalar(v) => (!v.is_finite()).then_some(*v),
            Value::Series(v) => v.iter().copied().find(|x| !x.is_finite()),
        };
        match bad {
            Some(value) => Err(CoreError::NonFinite { what, value }),
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Value::Scalar(_) => "scalar".to_string(),
            Value::Series(v) => format!("series[{}]", v.len()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Series(v)
    }
}
