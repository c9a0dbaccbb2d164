use crate::binning::{assign, create_bins, find_densities, find_sample_points, flatten};
use crate::config::Config;
use crate::error::SimError;
use crate::model::{Population, Treatment, generate_groups};
use crate::stats::{Comparison, compare};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Molting densities of one treatment group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub treatment: Treatment,
    /// Number of worms counted at each sample point.
    pub counts: Vec<usize>,
    /// Fraction of the group counted at each sample point.
    pub densities: Vec<f64>,
}

impl GroupReport {
    /// Sample point with the highest density, first one on ties.
    pub fn peak(&self, sample_points: &[f64]) -> Option<(f64, f64)> {
        sample_points
            .iter()
            .zip(&self.densities)
            .fold(None, |best, (&point, &density)| match best {
                Some((_, best_density)) if best_density >= density => best,
                _ => Some((point, density)),
            })
    }
}

/// Comparison between two neighbouring treatment groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub first: Treatment,
    pub second: Treatment,
    pub comparison: Comparison,
}

/// Result of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub population: Population,
    pub hour: f64,
    pub sample_points: Vec<f64>,
    pub groups: Vec<GroupReport>,
    pub pairs: Vec<PairReport>,
}

impl RunReport {
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, self).context("failed to serialize run report")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let report = decode::from_read(&mut reader).context("failed to deserialize run report")?;
        Ok(report)
    }
}

/// Run the whole pipeline once, drawing every random number from `rng`.
///
/// Neighbouring treatments (in canonical order) are compared with a one-sided
/// t test on their sample-point-weighted distributions.
pub fn simulate<R: Rng + ?Sized>(
    pop: &Population,
    hour: f64,
    seed: u64,
    rng: &mut R,
) -> Result<RunReport, SimError> {
    let groups = generate_groups(pop, rng)?;
    let molt_groups: Vec<_> = groups.iter().map(|group| group.molt_times()).collect();

    let sample_points = find_sample_points(&molt_groups, hour)?;
    let bins = create_bins(&sample_points);

    let assignments: Vec<_> = molt_groups
        .iter()
        .map(|molt_times| assign(molt_times, &bins))
        .collect();

    let flat_groups: Vec<_> = assignments
        .iter()
        .map(|assignment| flatten(assignment, &sample_points))
        .collect();

    let mut pairs = Vec::with_capacity(groups.len() - 1);
    for (i_group, pair) in flat_groups.windows(2).enumerate() {
        let comparison = compare(&pair[0], &pair[1]);
        pairs.push(PairReport {
            first: groups[i_group].treatment,
            second: groups[i_group + 1].treatment,
            comparison,
        });
    }

    let mut group_reports = Vec::with_capacity(groups.len());
    for (group, assignment) in groups.iter().zip(&assignments) {
        let counts: Vec<_> = assignment.iter().map(Vec::len).collect();
        log::debug!("{} counts: {counts:?}", group.treatment);
        group_reports.push(GroupReport {
            treatment: group.treatment,
            counts,
            densities: find_densities(assignment, pop.size)?,
        });
    }

    Ok(RunReport {
        seed,
        population: *pop,
        hour,
        sample_points,
        groups: group_reports,
        pairs,
    })
}

/// Simulation engine.
///
/// Holds the configuration and a seeded random number generator.
pub struct Engine {
    cfg: Config,
    seed: u64,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine`, drawing a seed from the OS if none is given.
    pub fn new(cfg: Config, seed: Option<u64>) -> Result<Self> {
        let seed = match seed {
            Some(seed) => seed,
            None => ChaCha12Rng::try_from_os_rng()
                .context("failed to seed from OS")?
                .random(),
        };
        let rng = ChaCha12Rng::seed_from_u64(seed);
        Ok(Self { cfg, seed, rng })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn perform_simulation(&mut self) -> Result<RunReport> {
        let pop = self.cfg.population();
        let report = simulate(&pop, self.cfg.sampling.hour, self.seed, &mut self.rng)
            .context("failed to simulate groups")?;

        for pair in &report.pairs {
            match pair.comparison {
                Comparison::Tested {
                    p_value,
                    significant,
                } => log::info!(
                    "{} vs {}: p value = {p_value:.6}{}",
                    pair.first,
                    pair.second,
                    if significant { " significant" } else { "" }
                ),
                Comparison::NotApplicable { len_a, len_b } => log::info!(
                    "{} vs {}: not applicable ({len_a} and {len_b} values)",
                    pair.first,
                    pair.second
                ),
            }
        }

        Ok(report)
    }
}
