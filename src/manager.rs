use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let config_file = sim_dir.join("config.toml");
        let cfg = if config_file.exists() {
            Config::from_file(&config_file).context("failed to construct cfg")?
        } else {
            log::warn!("{config_file:?} not found, using default config");
            Config::default()
        };
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self, seed: Option<u64>) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let mut engine = Engine::new(self.cfg.clone(), seed).context("failed to construct engine")?;
        log::info!("seed = {}", engine.seed());

        let report = engine
            .perform_simulation()
            .context("failed to perform simulation")?;

        // A run dir only ever exists with its results file inside.
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let results_file = self.results_file(run_idx);
        if let Err(error) = report.save(&results_file) {
            fs::remove_dir_all(&run_dir).ok();
            return Err(error.context("failed to save results"));
        }
        log::info!("saved {results_file:?}");

        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;

        let mut analyzer = Analyzer::new(self.cfg.clone());
        for run_idx in 0..n_runs {
            analyzer
                .add_file(self.results_file(run_idx))
                .with_context(|| format!("failed to add run {run_idx}"))?;
        }

        let analysis_file = self.analysis_file();
        analyzer
            .save_results(&analysis_file)
            .context("failed to save analysis")?;
        log::info!("analyzed {n_runs} runs into {analysis_file:?}");

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        let analysis_file = self.analysis_file();
        if analysis_file.exists() {
            fs::remove_file(&analysis_file)
                .with_context(|| format!("failed to remove {analysis_file:?}"))?;
            log::info!("removed {analysis_file:?}");
        }

        Ok(())
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.msgpack")
    }

    fn analysis_file(&self) -> PathBuf {
        self.sim_dir.join("analysis.toml")
    }
}
