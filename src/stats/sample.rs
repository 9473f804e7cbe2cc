//! Numeric sample and normality result records

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Smallest sample the Shapiro-Wilk test is defined for
pub const MIN_SAMPLE_SIZE: usize = 3;

/// Significance level for the normality decision (fixed, not configurable)
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Validated, immutable sequence of finite real numbers.
///
/// Construction fails for empty input, for fewer than [`MIN_SAMPLE_SIZE`]
/// values, and for any value that is not a finite number.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSample {
    values: Vec<f64>,
}

impl NumericSample {
    /// Create a sample from already-typed values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the input is empty, shorter than
    /// [`MIN_SAMPLE_SIZE`], or contains NaN/infinite values.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::Validation("No data provided".to_string()));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::Validation(format!(
                "Invalid numeric value at index {index}: {}",
                values[index]
            )));
        }
        if values.len() < MIN_SAMPLE_SIZE {
            return Err(Error::Validation(format!(
                "Data must be at least length {MIN_SAMPLE_SIZE}, got {}",
                values.len()
            )));
        }
        Ok(Self { values })
    }

    /// Create a sample from loosely typed JSON values.
    ///
    /// Numbers are taken as-is; strings are accepted when they parse to a
    /// finite number (`"2.5"`). Everything else is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending index, or
    /// any error from [`NumericSample::new`].
    pub fn from_json_values(values: &[Value]) -> Result<Self> {
        let parsed = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                json_to_f64(value).ok_or_else(|| {
                    Error::Validation(format!("Invalid numeric value at index {index}: {value}"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Self::new(parsed)
    }

    /// Get the values in input order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed sample; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in ascending order.
    #[must_use]
    pub fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        sorted
    }
}

fn json_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Outcome of a normality test.
///
/// `is_normal` is derived from `p_value` at construction, so the two can
/// never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityResult {
    is_normal: bool,
    p_value: f64,
    statistic: f64,
}

impl NormalityResult {
    /// Create a result, deriving `is_normal = p_value > SIGNIFICANCE_LEVEL`.
    #[must_use]
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            is_normal: p_value > SIGNIFICANCE_LEVEL,
            p_value,
            statistic,
        }
    }

    /// Test statistic (Shapiro-Wilk W).
    #[must_use]
    pub const fn statistic(&self) -> f64 {
        self.statistic
    }

    /// p-value in [0, 1].
    #[must_use]
    pub const fn p_value(&self) -> f64 {
        self.p_value
    }

    /// Whether the sample is plausibly normal at the fixed significance level.
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        self.is_normal
    }
}
