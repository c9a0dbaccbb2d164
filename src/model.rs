//! Simulation entities.

use crate::error::{SimError, require_positive};
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean number of hours a worm takes to molt from one larval stage to the next.
pub const MEAN_MOLT_AGE: f64 = 15.0;
/// Standard deviation of the molt age.
pub const STD_DEV_MOLT_AGE: f64 = 2.0;

/// Food concentration of a treatment group.
///
/// Ordered by increasing food deprivation; less food delays the molt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Treatment {
    Food6,
    Food4p8,
    Food3p6,
    Food2p4,
}

impl Treatment {
    /// All treatments in canonical order.
    pub const ALL: [Treatment; 4] = [
        Treatment::Food6,
        Treatment::Food4p8,
        Treatment::Food3p6,
        Treatment::Food2p4,
    ];

    /// Position in the canonical order, used as the multiple of `diff`.
    pub fn index(self) -> usize {
        match self {
            Treatment::Food6 => 0,
            Treatment::Food4p8 => 1,
            Treatment::Food3p6 => 2,
            Treatment::Food2p4 => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Treatment::Food6 => "6 mg/mL",
            Treatment::Food4p8 => "4.8 mg/mL",
            Treatment::Food3p6 => "3.6 mg/mL",
            Treatment::Food2p4 => "2.4 mg/mL",
        }
    }

    /// Mean molt age of this treatment, shifted by `index * diff`.
    pub fn mean_molt_age(self, diff: f64) -> f64 {
        MEAN_MOLT_AGE + self.index() as f64 * diff
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameters shared by all treatment groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Population {
    /// Number of worms per group.
    pub size: usize,
    /// Upper bound of the uniformly drawn starting age.
    pub spread: f64,
    /// Difference in mean molt age between consecutive treatments.
    pub diff: f64,
}

impl Population {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.size == 0 {
            return Err(SimError::InvalidParameter {
                name: "size",
                value: 0.0,
            });
        }
        require_positive("spread", self.spread)?;
        if !self.diff.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "diff",
                value: self.diff,
            });
        }
        Ok(())
    }
}

/// A single worm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Worm {
    start_age: f64,
    target_molt_age: f64,
}

impl Worm {
    pub fn new(start_age: f64, target_molt_age: f64) -> Self {
        Self {
            start_age,
            target_molt_age,
        }
    }

    /// Hours left until this worm molts.
    pub fn molt_time(&self) -> f64 {
        self.target_molt_age - self.start_age
    }
}

/// All worms raised under one treatment.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub treatment: Treatment,
    pub worm_vec: Vec<Worm>,
}

impl Group {
    /// Generate `pop.size` worms for `treatment`.
    pub fn generate<R: Rng + ?Sized>(
        treatment: Treatment,
        pop: &Population,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        pop.validate()?;

        let age_dist = Uniform::new(0.0, pop.spread).map_err(|_| SimError::InvalidParameter {
            name: "spread",
            value: pop.spread,
        })?;
        let mean = treatment.mean_molt_age(pop.diff);
        let molt_dist =
            Normal::new(mean, STD_DEV_MOLT_AGE).map_err(|_| SimError::InvalidParameter {
                name: "diff",
                value: pop.diff,
            })?;

        let mut worm_vec = Vec::with_capacity(pop.size);
        for _ in 0..pop.size {
            let start_age = age_dist.sample(rng);
            let target_molt_age = molt_dist.sample(rng);
            worm_vec.push(Worm::new(start_age, target_molt_age));
        }

        Ok(Self {
            treatment,
            worm_vec,
        })
    }

    pub fn molt_times(&self) -> Vec<f64> {
        self.worm_vec.iter().map(Worm::molt_time).collect()
    }
}

/// Generate one group per treatment, in canonical order.
pub fn generate_groups<R: Rng + ?Sized>(
    pop: &Population,
    rng: &mut R,
) -> Result<Vec<Group>, SimError> {
    Treatment::ALL
        .iter()
        .map(|&treatment| Group::generate(treatment, pop, rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn pop() -> Population {
        Population {
            size: 50,
            spread: 8.0,
            diff: 1.0,
        }
    }

    #[test]
    fn groups_have_requested_size_and_order() {
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let groups = generate_groups(&pop(), &mut rng).unwrap();
        assert_eq!(groups.len(), 4);
        for (group, treatment) in groups.iter().zip(Treatment::ALL) {
            assert_eq!(group.treatment, treatment);
            assert_eq!(group.worm_vec.len(), 50);
        }
    }

    #[test]
    fn start_age_lies_in_spread() {
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        let group = Group::generate(Treatment::Food3p6, &pop(), &mut rng).unwrap();
        assert!(
            group
                .worm_vec
                .iter()
                .all(|worm| (0.0..8.0).contains(&worm.start_age))
        );
    }

    #[test]
    fn molt_time_is_target_minus_start() {
        let worm = Worm::new(3.5, 16.0);
        assert_eq!(worm.molt_time(), 12.5);
    }

    #[test]
    fn mean_shifts_by_multiples_of_diff() {
        assert_eq!(Treatment::Food6.mean_molt_age(1.5), 15.0);
        assert_eq!(Treatment::Food2p4.mean_molt_age(1.5), 19.5);
        assert_eq!(Treatment::Food4p8.mean_molt_age(-2.0), 13.0);
    }

    #[test]
    fn same_seed_same_groups() {
        let mut rng_a = ChaCha12Rng::seed_from_u64(3);
        let mut rng_b = ChaCha12Rng::seed_from_u64(3);
        assert_eq!(
            generate_groups(&pop(), &mut rng_a).unwrap(),
            generate_groups(&pop(), &mut rng_b).unwrap()
        );
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let zero_size = Population { size: 0, ..pop() };
        assert_eq!(
            Group::generate(Treatment::Food6, &zero_size, &mut rng),
            Err(SimError::InvalidParameter {
                name: "size",
                value: 0.0
            })
        );
        let neg_spread = Population {
            spread: -1.0,
            ..pop()
        };
        assert!(matches!(
            Group::generate(Treatment::Food6, &neg_spread, &mut rng),
            Err(SimError::InvalidParameter { name: "spread", .. })
        ));
    }
}
