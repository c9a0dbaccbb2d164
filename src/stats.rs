use crate::error::SimError;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Threshold below which a one-sided p-value is reported as significant.
pub const ALPHA: f64 = 0.05;

pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Outcome of comparing two groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Comparison {
    Tested { p_value: f64, significant: bool },
    /// One of the sides has fewer than 2 values.
    NotApplicable { len_a: usize, len_b: usize },
}

impl Comparison {
    pub fn p_value(&self) -> Option<f64> {
        match self {
            Comparison::Tested { p_value, .. } => Some(*p_value),
            Comparison::NotApplicable { .. } => None,
        }
    }

    pub fn is_significant(&self) -> bool {
        matches!(self, Comparison::Tested { significant: true, .. })
    }
}

fn mean_and_var(vals: &[f64]) -> (f64, f64) {
    let n_vals = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n_vals;
    let var = vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n_vals - 1.0);
    (mean, var)
}

/// One-sided p-value of the independent two-sample Student's t test.
///
/// Uses the pooled variance and halves the two-sided p-value. When both samples
/// have zero variance the p-value is NaN for equal means and 0 otherwise.
pub fn t_test_one_sided(vals_a: &[f64], vals_b: &[f64]) -> Result<f64, SimError> {
    let (len_a, len_b) = (vals_a.len(), vals_b.len());
    if len_a < 2 || len_b < 2 {
        return Err(SimError::InsufficientSampleSize { len_a, len_b });
    }

    let (mean_a, var_a) = mean_and_var(vals_a);
    let (mean_b, var_b) = mean_and_var(vals_b);

    let dof = (len_a + len_b - 2) as f64;
    let pooled_var = ((len_a - 1) as f64 * var_a + (len_b - 1) as f64 * var_b) / dof;
    let std_err = (pooled_var * (1.0 / len_a as f64 + 1.0 / len_b as f64)).sqrt();
    if std_err == 0.0 {
        return Ok(if mean_a == mean_b { f64::NAN } else { 0.0 });
    }
    let t = (mean_a - mean_b) / std_err;

    let dist = StudentsT::new(0.0, 1.0, dof).map_err(|_| SimError::InvalidParameter {
        name: "degrees of freedom",
        value: dof,
    })?;
    let p_two_sided = 2.0 * dist.sf(t.abs());

    Ok(p_two_sided / 2.0)
}

/// Compare two sample-point-weighted distributions at [`ALPHA`].
///
/// No correction for multiple comparisons is applied.
pub fn compare(vals_a: &[f64], vals_b: &[f64]) -> Comparison {
    match t_test_one_sided(vals_a, vals_b) {
        Ok(p_value) => Comparison::Tested {
            p_value,
            significant: p_value < ALPHA,
        },
        Err(SimError::InsufficientSampleSize { len_a, len_b }) => {
            Comparison::NotApplicable { len_a, len_b }
        }
        Err(error) => {
            log::warn!("{error}");
            Comparison::Tested {
                p_value: f64::NAN,
                significant: false,
            }
        }
    }
}
