use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::Serialize;

use crate::config::Weights;
use crate::data::{Assignment, CourseId, CurriculumId, Day, Period, Problem, UnmetSoftConstraint};
use crate::estimator::{Cost, Penalties, Report};

/// Result of scoring a timetable from scratch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub report: Report,
    pub unmet_soft_constraints: Vec<UnmetSoftConstraint>,
}

/// Computes every soft-constraint counter of `assignments` from scratch.
///
/// Unlike the incremental estimator, curriculum compactness is exact here:
/// every lecture of a curriculum without a lecture of the same curriculum in
/// an adjacent period of the same day is one penalty, counted once per
/// curriculum.
pub fn evaluate(problem: &Problem, assignments: &[Assignment], weights: &Weights) -> Evaluation {
    let mut counts = Penalties::default();
    let mut unmet = Vec::new();

    // lectures that were never placed
    let placed = assignments.iter().map(|a| a.course_id).counts();
    for (course_id, course) in problem.courses.iter().enumerate() {
        let missing = course
            .lectures
            .saturating_sub(placed.get(&course_id).copied().unwrap_or(0) as u32);
        if missing > 0 {
            counts.unscheduled += Cost::from(missing);
            unmet.push(UnmetSoftConstraint {
                constraint_type: "Unscheduled".to_string(),
                description: format!(
                    "Course {} has {} of {} lectures unscheduled.",
                    course.name, missing, course.lectures
                ),
            });
        }
    }

    // seats
    for a in assignments {
        let course = &problem.courses[a.course_id];
        let room = &problem.rooms[a.room_id];
        let overflow = Cost::from(course.students) - Cost::from(room.capacity);
        if overflow > 0 {
            counts.room_capacity += overflow;
            unmet.push(UnmetSoftConstraint {
                constraint_type: "Room Capacity".to_string(),
                description: format!(
                    "Course {} ({} students) is taught in room {} ({} seats) on day {}, period {}.",
                    course.name, course.students, room.name, room.capacity, a.day, a.period
                ),
            });
        }
    }

    let by_course: HashMap<CourseId, Vec<&Assignment>> =
        assignments.iter().map(|a| (a.course_id, a)).into_group_map();

    for (course_id, course) in problem.courses.iter().enumerate() {
        let lectures = by_course.get(&course_id).map(Vec::as_slice).unwrap_or(&[]);

        let days = lectures.iter().map(|a| a.day).unique().count() as u32;
        if days < course.min_work_days {
            counts.min_working_days += Cost::from(course.min_work_days - days);
            unmet.push(UnmetSoftConstraint {
                constraint_type: "Minimum Working Days".to_string(),
                description: format!(
                    "Course {} is spread over {} days, at least {} are required.",
                    course.name, days, course.min_work_days
                ),
            });
        }

        let rooms = lectures.iter().map(|a| a.room_id).unique().count();
        if rooms > 1 {
            counts.room_stability += (rooms - 1) as Cost;
            unmet.push(UnmetSoftConstraint {
                constraint_type: "Room Stability".to_string(),
                description: format!("Course {} uses {} different rooms.", course.name, rooms),
            });
        }
    }

    // occupied timeslots per curriculum
    let occupied: HashSet<(CurriculumId, Day, Period)> = assignments
        .iter()
        .flat_map(|a| {
            problem.courses[a.course_id]
                .curricula
                .iter()
                .map(move |&q| (q, a.day, a.period))
        })
        .collect();

    for a in assignments {
        let course = &problem.courses[a.course_id];
        for &curriculum in &course.curricula {
            let before = a.period > 0 && occupied.contains(&(curriculum, a.day, a.period - 1));
            let after = occupied.contains(&(curriculum, a.day, a.period + 1));
            if !before && !after {
                counts.curriculum_compactness += 1;
                unmet.push(UnmetSoftConstraint {
                    constraint_type: "Curriculum Compactness".to_string(),
                    description: format!(
                        "Lecture of course {} on day {}, period {} is isolated in curriculum {}.",
                        course.name, a.day, a.period, problem.curricula[curriculum].name
                    ),
                });
            }
        }
    }

    Evaluation {
        report: Report {
            counts,
            objective: weights.cost_of(&counts),
        },
        unmet_soft_constraints: unmet,
    }
}
