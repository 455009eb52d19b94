//! Stateless statistics shared by the metrics report and score post-processing.

use crate::error::{EngineError, Result};
use std::str::FromStr;

/// Arithmetic mean; 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile `p` (0..=100, clamped) with linear interpolation between the two
/// closest ranks, `rank = p / 100 * (n - 1)`. 0.0 for empty input.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMethod {
    /// Rescale into [0, 1].
    #[default]
    MinMax,
    /// Z-score with the population standard deviation.
    Standard,
}

impl FromStr for NormalizeMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "minmax" => Ok(NormalizeMethod::MinMax),
            "standard" => Ok(NormalizeMethod::Standard),
            other => Err(EngineError::InvalidConfig(format!("unknown normalization method '{other}'"))),
        }
    }
}

/// Normalize scores. Without spread, minmax yields all ones and standard all zeros.
pub fn normalize(scores: &[f64], method: NormalizeMethod) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    match method {
        NormalizeMethod::MinMax => {
            let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max == min {
                return vec![1.0; scores.len()];
            }
            scores.iter().map(|s| (s - min) / (max - min)).collect()
        }
        NormalizeMethod::Standard => {
            let m = mean(scores);
            let var = scores.iter().map(|s| (s - m) * (s - m)).sum::<f64>() / scores.len() as f64;
            let std = var.sqrt();
            if std == 0.0 {
                return vec![0.0; scores.len()];
            }
            scores.iter().map(|s| (s - m) / std).collect()
        }
    }
}
