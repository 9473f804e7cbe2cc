//! Normality testing
//!
//! ```text
//! caller data ──► NumericSample (validated, n >= 3, finite)
//!                      │
//!                      ▼
//!               NormalityTester::evaluate  (Shapiro-Wilk, AS R94)
//!                      │
//!                      ▼
//!               NormalityResult { statistic, p_value, is_normal }
//! ```
//!
//! `is_normal` is always `p_value > 0.05`; the threshold is a constant.

pub mod normal;
mod sample;
mod shapiro;

pub use sample::{NormalityResult, NumericSample, MIN_SAMPLE_SIZE, SIGNIFICANCE_LEVEL};
pub use shapiro::{coefficients, NormalityTester, MAX_VALIDATED_SAMPLE_SIZE};
