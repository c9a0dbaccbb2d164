use crate::model::Population;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Shortest accepted interval between counts, in hours.
pub const MIN_HOUR: f64 = 0.01;

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub population: PopulationConfig,
    pub sampling: SamplingConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationConfig {
    /// Number of worms per treatment group.
    pub size: usize,
    /// Upper bound of the starting age of the worms.
    pub spread: f64,
    /// Difference in mean molt age between consecutive treatment groups.
    pub diff: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 50,
            spread: 8.0,
            diff: 1.0,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// Hours between consecutive counts.
    pub hour: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { hour: 1.0 }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.population.size, 1..100_000).context("invalid group size")?;
        check_num(self.population.spread, f64::MIN_POSITIVE..1e6).context("invalid spread")?;
        check_num(self.population.diff, -1e6..1e6).context("invalid diff")?;
        check_num(self.sampling.hour, MIN_HOUR..1e6).context("invalid hour")?;

        Ok(())
    }

    pub fn population(&self) -> Population {
        Population {
            size: self.population.size,
            spread: self.population.spread,
            diff: self.population.diff,
        }
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = toml::from_str("[population]\nsize = 20\n").unwrap();
        assert_eq!(config.population.size, 20);
        assert_eq!(config.population.spread, 8.0);
        assert_eq!(config.population.diff, 1.0);
        assert_eq!(config.sampling.hour, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::default();
        config.sampling.hour = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampling.hour = 1e-300;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampling.hour = MIN_HOUR;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.population.size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.population.spread = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.population.diff = -2.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("[population]\nsizes = 20\n").is_err());
    }
}
