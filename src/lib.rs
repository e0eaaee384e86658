//! Incremental soft-constraint cost estimation for curriculum-based course
//! timetabling.
//!
//! The [`estimator::CostEstimator`] is the core: it is told about every
//! lecture placed in a [`timetable::Timetable`] and keeps the penalty counters
//! and the weighted objective up to date without rescoring the timetable.

pub mod config;
pub mod data;
pub mod error;
pub mod estimator;
pub mod evaluate;
pub mod parser;
pub mod solver;
pub mod timetable;

pub use config::{RunConfig, Weights};
pub use data::{Assignment, Problem};
pub use error::{InvalidMove, LoadError};
pub use estimator::{Cost, CostEstimator, Delta, Penalties, Report, fast_compactness_estimate};
pub use solver::Solution;
pub use timetable::{CurriculumSlots, Timetable};
