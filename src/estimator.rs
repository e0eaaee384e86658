//! Incremental cost estimation.
//!
//! [`CostEstimator`] keeps per-course bookkeeping (lectures per day, lectures
//! per room, distinct rooms, remaining minimum-working-days deficit) so that
//! the penalty change caused by one new lecture can be computed without
//! scoring the whole timetable again.

use std::fmt;

use log::{debug, trace};
use serde::Serialize;

use crate::config::Weights;
use crate::data::{Assignment, CourseId, Day, Period, Problem};
use crate::error::InvalidMove;
use crate::timetable::{CurriculumSlots, Timetable};

/// Penalty units. Deltas are signed, so counters share the signed type.
pub type Cost = i64;

/// One value per soft constraint. Used both for running counters and for the
/// per-assignment deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Penalties {
    pub unscheduled: Cost,
    pub room_capacity: Cost,
    pub room_stability: Cost,
    pub min_working_days: Cost,
    pub curriculum_compactness: Cost,
}

impl Penalties {
    fn accumulate(&mut self, delta: &Penalties) {
        self.unscheduled += delta.unscheduled;
        self.room_capacity += delta.room_capacity;
        self.room_stability += delta.room_stability;
        self.min_working_days += delta.min_working_days;
        self.curriculum_compactness += delta.curriculum_compactness;
    }
}

/// The change caused by one applied assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub counts: Penalties,
    /// Weighted sum of `counts`.
    pub cost: Cost,
}

/// Snapshot of the running counters and the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(flatten)]
    pub counts: Penalties,
    pub objective: Cost,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UNSCHEDULED {}", self.counts.unscheduled)?;
        writeln!(f, "ROOMCAPACITY {}", self.counts.room_capacity)?;
        writeln!(f, "ROOMSTABILITY {}", self.counts.room_stability)?;
        writeln!(f, "MINIMUMWORKINGDAYS {}", self.counts.min_working_days)?;
        writeln!(
            f,
            "CURRICULUMCOMPACTNESS {}",
            self.counts.curriculum_compactness
        )?;
        writeln!(f, "OBJECTIVE {}", self.objective)
    }
}

/// Tracks the soft-constraint penalties of a timetable that only ever grows.
///
/// Each call to [`CostEstimator::apply`] must describe a lecture that has just
/// been accepted into the timetable. Removing or moving lectures is not
/// supported.
#[derive(Debug, Clone)]
pub struct CostEstimator<'p> {
    problem: &'p Problem,
    weights: Weights,
    // course * days + day -> lectures of the course on that day
    course_days: Vec<u32>,
    // course * rooms + room -> lectures of the course in that room
    course_rooms: Vec<u32>,
    course_no_of_rooms: Vec<u32>,
    // goes negative once a course uses more days than it needs
    course_days_below_minimum: Vec<i64>,
    course_scheduled: Vec<u32>,
    counts: Penalties,
    total: Cost,
}

impl<'p> CostEstimator<'p> {
    /// Estimator for an empty timetable with the default weights.
    pub fn new(problem: &'p Problem) -> Self {
        Self::with_weights(problem, Weights::default())
    }

    pub fn with_weights(problem: &'p Problem, weights: Weights) -> Self {
        let courses = problem.no_of_courses();
        let counts = Penalties {
            unscheduled: Cost::from(problem.total_lectures()),
            min_working_days: Cost::from(problem.total_min_work_days()),
            ..Penalties::default()
        };
        let total = weights.cost_of(&counts);
        debug!(
            "estimator seeded for {} courses: {} lectures unscheduled, objective {}",
            courses, counts.unscheduled, total
        );
        CostEstimator {
            problem,
            weights,
            course_days: vec![0; courses * problem.days],
            course_rooms: vec![0; courses * problem.no_of_rooms()],
            course_no_of_rooms: vec![0; courses],
            course_days_below_minimum: problem
                .courses
                .iter()
                .map(|c| i64::from(c.min_work_days))
                .collect(),
            course_scheduled: vec![0; courses],
            counts,
            total,
        }
    }

    /// Scores a finished timetable by applying its assignments in recording
    /// order. Every lecture sees the complete timetable when its compactness
    /// is estimated.
    pub fn score_timetable(
        problem: &'p Problem,
        timetable: &Timetable,
    ) -> Result<Self, InvalidMove> {
        let mut estimator = Self::new(problem);
        for assignment in timetable.assignments() {
            estimator.apply(timetable, assignment)?;
        }
        Ok(estimator)
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Checks the caller contract for `assignment` without changing anything.
    pub fn validate(&self, assignment: &Assignment) -> Result<(), InvalidMove> {
        let problem = self.problem;
        let course = problem
            .courses
            .get(assignment.course_id)
            .ok_or(InvalidMove::UnknownCourse(assignment.course_id))?;
        if assignment.room_id >= problem.no_of_rooms() {
            return Err(InvalidMove::UnknownRoom(assignment.room_id));
        }
        if assignment.day >= problem.days {
            return Err(InvalidMove::DayOutOfRange {
                day: assignment.day,
                days: problem.days,
            });
        }
        if assignment.period >= problem.periods_per_day {
            return Err(InvalidMove::PeriodOutOfRange {
                period: assignment.period,
                periods_per_day: problem.periods_per_day,
            });
        }
        if self.course_scheduled[assignment.course_id] >= course.lectures {
            return Err(InvalidMove::NoLecturesLeft(assignment.course_id));
        }
        Ok(())
    }

    /// Updates the bookkeeping for a newly accepted lecture and returns the
    /// change in every counter. `slots` must already contain the lecture.
    pub fn apply(
        &mut self,
        slots: &impl CurriculumSlots,
        assignment: &Assignment,
    ) -> Result<Delta, InvalidMove> {
        self.validate(assignment)?;
        let &Assignment {
            course_id,
            room_id,
            day,
            period,
        } = assignment;

        let counts = Penalties {
            unscheduled: -1,
            room_capacity: self.room_capacity_delta(course_id, room_id),
            room_stability: self.room_stability_delta(course_id, room_id),
            min_working_days: self.min_working_days_delta(course_id, day),
            curriculum_compactness: if fast_compactness_estimate(
                self.problem,
                slots,
                course_id,
                day,
                period,
            ) {
                1
            } else {
                0
            },
        };
        self.course_scheduled[course_id] += 1;

        let cost = self.weights.cost_of(&counts);
        self.counts.accumulate(&counts);
        self.total += cost;
        trace!("applied {assignment}: {counts:?}, cost {cost:+}, objective {}", self.total);

        Ok(Delta { counts, cost })
    }

    fn room_capacity_delta(&self, course: CourseId, room: usize) -> Cost {
        let students = Cost::from(self.problem.courses[course].students);
        let capacity = Cost::from(self.problem.rooms[room].capacity);
        (students - capacity).max(0)
    }

    fn min_working_days_delta(&mut self, course: CourseId, day: Day) -> Cost {
        let idx = course * self.problem.days + day;
        let mut delta = 0;
        if self.course_days[idx] == 0 {
            self.course_days_below_minimum[course] -= 1;
            if self.course_days_below_minimum[course] >= 0 {
                delta = -1;
            }
        }
        self.course_days[idx] += 1;
        delta
    }

    fn room_stability_delta(&mut self, course: CourseId, room: usize) -> Cost {
        let idx = course * self.problem.no_of_rooms() + room;
        let mut delta = 0;
        if self.course_rooms[idx] == 0 {
            self.course_no_of_rooms[course] += 1;
            // only rooms beyond the first are penalised
            if self.course_no_of_rooms[course] > 1 {
                delta = 1;
            }
        }
        self.course_rooms[idx] += 1;
        delta
    }

    pub fn counts(&self) -> &Penalties {
        &self.counts
    }

    pub fn total(&self) -> Cost {
        self.total
    }

    pub fn report(&self) -> Report {
        Report {
            counts: self.counts,
            objective: self.total,
        }
    }
}

/// Cheap stand-in for curriculum compactness: returns `true` (isolated, one
/// penalty) unless some curriculum of `course` already has a lecture in the
/// period right before or after `period` on the same day.
///
/// This undercounts the real constraint, which has to look at every lecture
/// of a curriculum once the timetable is complete. See
/// [`crate::evaluate::evaluate`] for the exact count.
pub fn fast_compactness_estimate(
    problem: &Problem,
    slots: &impl CurriculumSlots,
    course: CourseId,
    day: Day,
    period: Period,
) -> bool {
    let neighbours = [period.checked_sub(1), period.checked_add(1)];
    let compact = problem.courses[course].curricula.iter().any(|&curriculum| {
        neighbours
            .iter()
            .flatten()
            .filter(|&&adjacent| adjacent < problem.periods_per_day)
            .any(|&adjacent| slots.curriculum_occupied(curriculum, day, adjacent))
    });
    !compact
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use super::*;
    use crate::data::{Course, Curriculum, Room};

    /// Occupancy stub that also records every probe.
    #[derive(Default)]
    struct Slots {
        occupied: HashSet<(usize, Day, Period)>,
        probes: RefCell<Vec<(usize, Day, Period)>>,
    }

    impl CurriculumSlots for Slots {
        fn curriculum_occupied(&self, curriculum: usize, day: Day, period: Period) -> bool {
            self.probes.borrow_mut().push((curriculum, day, period));
            self.occupied.contains(&(curriculum, day, period))
        }
    }

    fn course(students: u32, lectures: u32, min_work_days: u32, curricula: Vec<usize>) -> Course {
        Course {
            name: "c".into(),
            lecturer: 0,
            lectures,
            min_work_days,
            students,
            double_lectures: false,
            curricula,
        }
    }

    fn room(capacity: u32) -> Room {
        Room {
            name: "r".into(),
            capacity,
            building: 0,
        }
    }

    fn problem(courses: Vec<Course>, rooms: Vec<Room>, days: usize, periods: usize) -> Problem {
        Problem {
            days,
            periods_per_day: periods,
            courses,
            rooms,
            curricula: vec![
                Curriculum { name: "k".into() },
                Curriculum { name: "m".into() },
            ],
            lecturers: vec![],
            unavailability: vec![],
        }
    }

    #[test]
    fn seeds_counters_from_empty_timetable() {
        let p = problem(
            vec![course(10, 3, 2, vec![]), course(10, 4, 3, vec![])],
            vec![room(10)],
            5,
            4,
        );
        let est = CostEstimator::new(&p);
        let report = est.report();
        assert_eq!(report.counts.unscheduled, 7);
        assert_eq!(report.counts.min_working_days, 5);
        assert_eq!(report.counts.room_capacity, 0);
        assert_eq!(report.counts.room_stability, 0);
        assert_eq!(report.counts.curriculum_compactness, 0);
        assert_eq!(report.objective, 7 * 10 + 5 * 5);
    }

    #[test]
    fn room_capacity_is_overflow_regardless_of_history() {
        let p = problem(
            vec![course(30, 5, 1, vec![]), course(10, 5, 1, vec![])],
            vec![room(25), room(40)],
            5,
            4,
        );
        let slots = Slots::default();
        let mut est = CostEstimator::new(&p);

        let first = est.apply(&slots, &Assignment::new(0, 0, 0, 0)).unwrap();
        assert_eq!(first.counts.room_capacity, 5);

        est.apply(&slots, &Assignment::new(1, 1, 1, 0)).unwrap();
        est.apply(&slots, &Assignment::new(0, 1, 2, 0)).unwrap();
        let later = est.apply(&slots, &Assignment::new(0, 0, 3, 3)).unwrap();
        assert_eq!(later.counts.room_capacity, 5);

        let fits = est.apply(&slots, &Assignment::new(1, 0, 0, 1)).unwrap();
        assert_eq!(fits.counts.room_capacity, 0);
        assert_eq!(est.counts().room_capacity, 10);
    }

    #[test]
    fn min_working_days_stops_improving_after_deficit_is_met() {
        let p = problem(vec![course(10, 6, 3, vec![])], vec![room(10)], 5, 4);
        let slots = Slots::default();
        let mut est = CostEstimator::new(&p);

        let deltas: Vec<Cost> = [(0, 0), (1, 0), (2, 0), (3, 0), (3, 1), (0, 2)]
            .iter()
            .map(|&(day, period)| {
                est.apply(&slots, &Assignment::new(0, 0, day, period))
                    .unwrap()
                    .counts
                    .min_working_days
            })
            .collect();
        assert_eq!(deltas, vec![-1, -1, -1, 0, 0, 0]);
        assert_eq!(est.counts().min_working_days, 0);
    }

    #[test]
    fn repeated_day_never_improves_min_working_days() {
        let p = problem(vec![course(10, 3, 3, vec![])], vec![room(10)], 5, 4);
        let slots = Slots::default();
        let mut est = CostEstimator::new(&p);
        est.apply(&slots, &Assignment::new(0, 0, 2, 0)).unwrap();
        let again = est.apply(&slots, &Assignment::new(0, 0, 2, 1)).unwrap();
        assert_eq!(again.counts.min_working_days, 0);
        assert_eq!(est.counts().min_working_days, 2);
    }

    #[test]
    fn room_stability_counts_extra_rooms_once() {
        let p = problem(vec![course(10, 4, 1, vec![])], vec![room(10), room(10)], 5, 4);
        let slots = Slots::default();
        let mut est = CostEstimator::new(&p);

        let deltas: Vec<Cost> = [(0, 0), (1, 1), (0, 2), (1, 3)]
            .iter()
            .map(|&(room, day)| {
                est.apply(&slots, &Assignment::new(0, room, day, 0))
                    .unwrap()
                    .counts
                    .room_stability
            })
            .collect();
        assert_eq!(deltas, vec![0, 1, 0, 0]);
        assert_eq!(est.counts().room_stability, 1);
    }

    #[test]
    fn isolated_lecture_is_penalised() {
        let p = problem(vec![course(10, 2, 1, vec![0])], vec![room(10)], 2, 8);
        let mut slots = Slots::default();
        // same period of another day and a non-adjacent period do not count
        slots.occupied.insert((0, 0, 4));
        slots.occupied.insert((0, 1, 3));
        let mut est = CostEstimator::new(&p);
        let delta = est.apply(&slots, &Assignment::new(0, 0, 1, 5)).unwrap();
        assert_eq!(delta.counts.curriculum_compactness, 1);
        assert_eq!(delta.cost, -10 + 2 - 5);
    }

    #[test]
    fn neighbour_before_or_after_makes_lecture_compact() {
        let p = problem(vec![course(10, 2, 1, vec![0])], vec![room(10)], 2, 8);
        for neighbour in [4, 6] {
            let mut slots = Slots::default();
            slots.occupied.insert((0, 1, neighbour));
            assert!(!fast_compactness_estimate(&p, &slots, 0, 1, 5));
        }
    }

    #[test]
    fn any_curriculum_of_the_course_can_make_it_compact() {
        let p = problem(vec![course(10, 2, 1, vec![0, 1])], vec![room(10)], 1, 3);
        let mut slots = Slots::default();
        slots.occupied.insert((1, 0, 0));
        assert!(!fast_compactness_estimate(&p, &slots, 0, 0, 1));
    }

    #[test]
    fn course_without_curricula_is_isolated() {
        let p = problem(vec![course(10, 2, 1, vec![])], vec![room(10)], 1, 3);
        let slots = Slots::default();
        assert!(fast_compactness_estimate(&p, &slots, 0, 0, 1));
    }

    #[test]
    fn boundary_periods_probe_only_inside_the_day() {
        let p = problem(vec![course(10, 2, 1, vec![0])], vec![room(10)], 1, 4);
        let slots = Slots::default();
        fast_compactness_estimate(&p, &slots, 0, 0, 0);
        fast_compactness_estimate(&p, &slots, 0, 0, 3);
        assert_eq!(*slots.probes.borrow(), vec![(0, 0, 1), (0, 0, 2)]);

        // period 0 is a valid neighbour
        let mut slots = Slots::default();
        slots.occupied.insert((0, 0, 0));
        assert!(!fast_compactness_estimate(&p, &slots, 0, 0, 1));
    }

    #[test]
    fn rejects_contract_violations_without_mutating() {
        let p = problem(vec![course(10, 1, 1, vec![])], vec![room(10)], 2, 2);
        let slots = Slots::default();
        let mut est = CostEstimator::new(&p);
        let before = est.report();

        assert_eq!(
            est.apply(&slots, &Assignment::new(3, 0, 0, 0)),
            Err(InvalidMove::UnknownCourse(3))
        );
        assert_eq!(
            est.apply(&slots, &Assignment::new(0, 1, 0, 0)),
            Err(InvalidMove::UnknownRoom(1))
        );
        assert_eq!(
            est.apply(&slots, &Assignment::new(0, 0, 2, 0)),
            Err(InvalidMove::DayOutOfRange { day: 2, days: 2 })
        );
        assert_eq!(
            est.apply(&slots, &Assignment::new(0, 0, 0, 2)),
            Err(InvalidMove::PeriodOutOfRange {
                period: 2,
                periods_per_day: 2
            })
        );
        assert_eq!(est.report(), before);

        est.apply(&slots, &Assignment::new(0, 0, 0, 0)).unwrap();
        let after_one = est.report();
        assert_eq!(
            est.apply(&slots, &Assignment::new(0, 0, 1, 0)),
            Err(InvalidMove::NoLecturesLeft(0))
        );
        assert_eq!(est.report(), after_one);
        assert_eq!(after_one.counts.unscheduled, 0);
    }

    #[test]
    fn report_block_format() {
        let report = Report {
            counts: Penalties {
                unscheduled: 1,
                room_capacity: 2,
                room_stability: 3,
                min_working_days: 4,
                curriculum_compactness: 5,
            },
            objective: 6,
        };
        assert_eq!(
            report.to_string(),
            "UNSCHEDULED 1\nROOMCAPACITY 2\nROOMSTABILITY 3\nMINIMUMWORKINGDAYS 4\nCURRICULUMCOMPACTNESS 5\nOBJECTIVE 6\n"
        );
    }

    #[test]
    fn report_serializes_flat() {
        let p = problem(vec![course(10, 1, 1, vec![])], vec![room(10)], 1, 1);
        let value = serde_json::to_value(CostEstimator::new(&p).report()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "unscheduled": 1,
                "roomCapacity": 0,
                "roomStability": 0,
                "minWorkingDays": 1,
                "curriculumCompactness": 0,
                "objective": 15
            })
        );
    }
}
