use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Multiple-testing procedure used to control the false discovery rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FdrMethod {
    /// Benjamini-Hochberg (independent or positively dependent tests).
    #[default]
    Bh,
    /// Benjamini-Yekutieli (arbitrary dependence).
    By,
}

impl fmt::Display for FdrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FdrMethod::Bh => write!(f, "bh"),
            FdrMethod::By => write!(f, "by"),
        }
    }
}

impl FromStr for FdrMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bh" => Ok(FdrMethod::Bh),
            "by" => Ok(FdrMethod::By),
            other => Err(format!(
                "unknown FDR method '{}', expected 'bh' or 'by'",
                other
            )),
        }
    }
}

/// Adjusts p-values for the false discovery rate.
///
/// NaN entries are excluded from the correction and stay NaN in place; every other
/// value is replaced by its adjusted p-value. The output is clipped to `[0, 1]` and
/// keeps the input order.
pub fn false_discovery_control(p_values: &[f64], method: FdrMethod) -> Vec<f64> {
    let mut order: Vec<usize> = (0..p_values.len())
        .filter(|&i| !p_values[i].is_nan())
        .collect();
    let m = order.len();
    let mut adjusted = vec![f64::NAN; p_values.len()];
    if m == 0 {
        return adjusted;
    }

    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let dependence_factor = match method {
        FdrMethod::Bh => 1.0,
        FdrMethod::By => (1..=m).map(|i| 1.0 / i as f64).sum(),
    };

    let mut running_min = f64::INFINITY;
    for (rank, &idx) in order.iter().enumerate().rev() {
        let scaled = p_values[idx] * m as f64 / (rank + 1) as f64 * dependence_factor;
        running_min = running_min.min(scaled);
        adjusted[idx] = running_min.clamp(0.0, 1.0);
    }
    adjusted
}
