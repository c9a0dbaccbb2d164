use crate::config::Config;
use crate::engine::RunReport;
use crate::model::Treatment;
use crate::stats::{ALPHA, Accumulator, AccumulatorReport};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Summary of one neighbouring comparison over all runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct PairSummary {
    pub first: String,
    pub second: String,
    /// Runs in which the test could be performed.
    pub n_tested: usize,
    /// Fraction of all runs found significant at `alpha`.
    pub power: f64,
    pub p_value: AccumulatorReport,
}

/// Summary of the density peak of one treatment over all runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct PeakSummary {
    pub treatment: String,
    pub peak_time: AccumulatorReport,
    pub peak_density: AccumulatorReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub n_runs: usize,
    pub alpha: f64,
    pub pairs: Vec<PairSummary>,
    pub peaks: Vec<PeakSummary>,
}

pub trait Obs {
    fn update(&mut self, report: &RunReport) -> Result<()>;
    fn report(&self, out: &mut AnalysisReport);
}

pub struct Power {
    n_runs: usize,
    n_sig_vec: Vec<usize>,
    acc_vec: Vec<Accumulator>,
}

impl Power {
    pub fn new() -> Self {
        let n_pairs = Treatment::ALL.len() - 1;
        let mut acc_vec = Vec::new();
        acc_vec.resize_with(n_pairs, Accumulator::new);
        Self {
            n_runs: 0,
            n_sig_vec: vec![0; n_pairs],
            acc_vec,
        }
    }
}

impl Obs for Power {
    fn update(&mut self, report: &RunReport) -> Result<()> {
        if report.pairs.len() != self.acc_vec.len() {
            bail!(
                "expected {} comparisons, but found {}",
                self.acc_vec.len(),
                report.pairs.len()
            );
        }
        self.n_runs += 1;
        for (i_pair, pair) in report.pairs.iter().enumerate() {
            if let Some(p_value) = pair.comparison.p_value() {
                self.acc_vec[i_pair].add(p_value);
            }
            if pair.comparison.is_significant() {
                self.n_sig_vec[i_pair] += 1;
            }
        }
        Ok(())
    }

    fn report(&self, out: &mut AnalysisReport) {
        for (i_pair, acc) in self.acc_vec.iter().enumerate() {
            let p_value = acc.report();
            out.pairs.push(PairSummary {
                first: Treatment::ALL[i_pair].to_string(),
                second: Treatment::ALL[i_pair + 1].to_string(),
                n_tested: p_value.n_vals,
                power: if self.n_runs > 0 {
                    self.n_sig_vec[i_pair] as f64 / self.n_runs as f64
                } else {
                    f64::NAN
                },
                p_value,
            });
        }
    }
}

pub struct Peak {
    time_acc_vec: Vec<Accumulator>,
    density_acc_vec: Vec<Accumulator>,
}

impl Peak {
    pub fn new() -> Self {
        let mut time_acc_vec = Vec::new();
        time_acc_vec.resize_with(Treatment::ALL.len(), Accumulator::new);
        let mut density_acc_vec = Vec::new();
        density_acc_vec.resize_with(Treatment::ALL.len(), Accumulator::new);
        Self {
            time_acc_vec,
            density_acc_vec,
        }
    }
}

impl Obs for Peak {
    fn update(&mut self, report: &RunReport) -> Result<()> {
        for group in &report.groups {
            let i_group = group.treatment.index();
            if let Some((time, density)) = group.peak(&report.sample_points) {
                self.time_acc_vec[i_group].add(time);
                self.density_acc_vec[i_group].add(density);
            }
        }
        Ok(())
    }

    fn report(&self, out: &mut AnalysisReport) {
        for (i_group, treatment) in Treatment::ALL.iter().enumerate() {
            out.peaks.push(PeakSummary {
                treatment: treatment.to_string(),
                peak_time: self.time_acc_vec[i_group].report(),
                peak_density: self.density_acc_vec[i_group].report(),
            });
        }
    }
}

/// Aggregates saved run reports.
pub struct Analyzer {
    cfg: Config,
    n_runs: usize,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![Box::new(Power::new()), Box::new(Peak::new())];
        Self {
            cfg,
            n_runs: 0,
            obs_ptr_vec,
        }
    }

    pub fn add_report(&mut self, report: &RunReport) -> Result<()> {
        if report.population != self.cfg.population() || report.hour != self.cfg.sampling.hour {
            bail!("run parameters differ from the current config");
        }
        for obs in &mut self.obs_ptr_vec {
            obs.update(report).context("failed to update observable")?;
        }
        self.n_runs += 1;
        Ok(())
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let report = RunReport::load(file).with_context(|| format!("failed to load {file:?}"))?;
        self.add_report(&report)
    }

    pub fn report(&self) -> AnalysisReport {
        let mut out = AnalysisReport {
            n_runs: self.n_runs,
            alpha: ALPHA,
            pairs: Vec::new(),
            peaks: Vec::new(),
        };
        for obs in &self.obs_ptr_vec {
            obs.report(&mut out);
        }
        out
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let contents =
            toml::to_string_pretty(&self.report()).context("failed to serialize analysis")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }
}
