use std::env;
use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::estimator::{Cost, Penalties};

/// Directory used when the binary is started without arguments.
pub const LOCAL_TEST_NO: &str = "01";

/// Dataset files in the order they are expected on the command line.
pub const DATASET_FILES: [&str; 7] = [
    "basic.utt",
    "courses.utt",
    "lecturers.utt",
    "rooms.utt",
    "curricula.utt",
    "relation.utt",
    "unavailability.utt",
];

pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Penalty weight of each soft constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weights {
    pub unscheduled: Cost,
    pub room_capacity: Cost,
    pub room_stability: Cost,
    pub min_working_days: Cost,
    pub curriculum_compactness: Cost,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            unscheduled: 10,
            room_capacity: 1,
            room_stability: 1,
            min_working_days: 5,
            curriculum_compactness: 2,
        }
    }
}

impl Weights {
    /// Weighted sum of a set of counters or deltas.
    pub fn cost_of(&self, penalties: &Penalties) -> Cost {
        penalties.unscheduled * self.unscheduled
            + penalties.room_capacity * self.room_capacity
            + penalties.room_stability * self.room_stability
            + penalties.min_working_days * self.min_working_days
            + penalties.curriculum_compactness * self.curriculum_compactness
    }
}

/// Settings of one random construction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of "add a random lecture" attempts.
    pub iterations: usize,
    /// Fixed seed for reproducible runs, fresh entropy otherwise.
    pub seed: Option<u64>,
    pub weights: Weights,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            weights: Weights::default(),
        }
    }
}

impl RunConfig {
    /// Reads `CTT_ITERATIONS` and `CTT_SEED`, keeping defaults for missing or
    /// malformed values.
    pub fn from_env() -> Self {
        let mut config = RunConfig::default();
        if let Some(iterations) = read_var("CTT_ITERATIONS") {
            config.iterations = iterations as usize;
        }
        config.seed = read_var("CTT_SEED");
        config
    }
}

fn read_var(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring {name}={raw:?}: not an unsigned integer");
            None
        }
    }
}

/// Paths of the local test dataset used when no arguments are given.
pub fn local_dataset() -> Vec<PathBuf> {
    let dir = PathBuf::from(format!("./TestDataUTT/Test{LOCAL_TEST_NO}/"));
    DATASET_FILES.iter().map(|file| dir.join(file)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights() {
        let w = Weights::default();
        assert_eq!(
            (
                w.room_capacity,
                w.room_stability,
                w.curriculum_compactness,
                w.min_working_days,
                w.unscheduled
            ),
            (1, 1, 2, 5, 10)
        );
    }

    #[test]
    fn cost_of_weights_every_counter() {
        let p = Penalties {
            unscheduled: 1,
            room_capacity: 2,
            room_stability: 3,
            min_working_days: 4,
            curriculum_compactness: 5,
        };
        assert_eq!(Weights::default().cost_of(&p), 10 + 2 + 3 + 20 + 10);
    }

    #[test]
    fn local_dataset_lists_seven_files_in_order() {
        let files = local_dataset();
        assert_eq!(files.len(), 7);
        assert!(files[0].ends_with("TestDataUTT/Test01/basic.utt"));
        assert!(files[6].ends_with("unavailability.utt"));
    }
}
