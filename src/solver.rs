use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use crate::config::RunConfig;
use crate::data::{Assignment, CourseId, Problem};
use crate::error::InvalidMove;
use crate::estimator::{CostEstimator, Delta, Report};
use crate::timetable::Timetable;

/// A timetable under construction together with its running cost.
#[derive(Debug)]
pub struct Solution<'p> {
    problem: &'p Problem,
    timetable: Timetable,
    estimator: CostEstimator<'p>,
    rng: StdRng,
}

impl<'p> Solution<'p> {
    pub fn new(problem: &'p Problem, config: &RunConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Solution {
            problem,
            timetable: Timetable::new(problem),
            estimator: CostEstimator::with_weights(problem, config.weights),
            rng,
        }
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn estimator(&self) -> &CostEstimator<'p> {
        &self.estimator
    }

    pub fn report(&self) -> Report {
        self.estimator.report()
    }

    /// Places one lecture. The move is checked against the hard constraints
    /// and the estimator contract first, so a rejected move leaves both
    /// untouched.
    pub fn assign(&mut self, assignment: Assignment) -> Result<Delta, InvalidMove> {
        self.timetable.check(self.problem, &assignment)?;
        self.estimator.validate(&assignment)?;
        self.timetable.place(self.problem, assignment)?;
        self.estimator.apply(&self.timetable, &assignment)
    }

    /// Tries to place one unscheduled lecture in a random room and timeslot.
    /// Returns `None` when the slot breaks a hard constraint or when every
    /// lecture is already scheduled.
    pub fn add_random_lecture(&mut self) -> Option<Delta> {
        let open: Vec<CourseId> = (0..self.problem.no_of_courses())
            .filter(|&c| self.timetable.remaining_lectures(c) > 0)
            .collect();
        if open.is_empty() || self.problem.no_of_rooms() == 0 {
            return None;
        }
        let assignment = Assignment::new(
            open[self.rng.random_range(0..open.len())],
            self.rng.random_range(0..self.problem.no_of_rooms()),
            self.rng.random_range(0..self.problem.days),
            self.rng.random_range(0..self.problem.periods_per_day),
        );
        self.assign(assignment).ok()
    }

    /// Runs `iterations` random placement attempts and returns the final
    /// report.
    pub fn run(&mut self, iterations: usize) -> Report {
        let start_time = Instant::now();
        let mut placed = 0usize;
        for _ in 0..iterations {
            if let Some(delta) = self.add_random_lecture() {
                placed += 1;
                debug!("placed lecture, cost {:+}", delta.cost);
            }
        }
        info!(
            "placed {} lectures in {} attempts ({:.2?}), {} still unscheduled, objective {}",
            placed,
            iterations,
            start_time.elapsed(),
            self.estimator.counts().unscheduled,
            self.estimator.total()
        );
        self.report()
    }
}
