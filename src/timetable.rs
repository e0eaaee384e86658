use std::collections::HashSet;

use log::trace;

use crate::data::{Assignment, CourseId, CurriculumId, Day, Period, Problem, Unavailability};
use crate::error::InvalidMove;

/// Read access to curriculum occupancy, which is all the cost estimator needs
/// from a timetable.
pub trait CurriculumSlots {
    /// Whether any course of `curriculum` already has a lecture at
    /// (`day`, `period`).
    fn curriculum_occupied(&self, curriculum: CurriculumId, day: Day, period: Period) -> bool;
}

/// A partial timetable: which course occupies every (room, day, period) and
/// how many lectures each curriculum, lecturer and course has per timeslot.
#[derive(Debug, Clone)]
pub struct Timetable {
    days: usize,
    periods_per_day: usize,
    rooms: Vec<Option<CourseId>>,
    curricula: Vec<u32>,
    lecturers: Vec<u32>,
    courses: Vec<u32>,
    remaining: Vec<u32>,
    unavailable: HashSet<Unavailability>,
    assignments: Vec<Assignment>,
}

impl Timetable {
    pub fn new(problem: &Problem) -> Self {
        let timeslots = problem.days * problem.periods_per_day;
        Timetable {
            days: problem.days,
            periods_per_day: problem.periods_per_day,
            rooms: vec![None; problem.no_of_rooms() * timeslots],
            curricula: vec![0; problem.no_of_curricula() * timeslots],
            lecturers: vec![0; problem.no_of_lecturers() * timeslots],
            courses: vec![0; problem.no_of_courses() * timeslots],
            remaining: problem.courses.iter().map(|c| c.lectures).collect(),
            unavailable: problem.unavailability.iter().copied().collect(),
            assignments: Vec::new(),
        }
    }

    fn slot(&self, day: Day, period: Period) -> usize {
        day * self.periods_per_day + period
    }

    fn per_timeslot(&self, owner: usize, day: Day, period: Period) -> usize {
        owner * self.days * self.periods_per_day + self.slot(day, period)
    }

    /// The course held by `room` at (`day`, `period`), if any.
    pub fn occupant(&self, room: usize, day: Day, period: Period) -> Option<CourseId> {
        if day >= self.days || period >= self.periods_per_day {
            return None;
        }
        self.rooms
            .get(self.per_timeslot(room, day, period))
            .copied()
            .flatten()
    }

    /// Lectures of `course` that are not in the timetable yet.
    pub fn remaining_lectures(&self, course: CourseId) -> u32 {
        self.remaining.get(course).copied().unwrap_or(0)
    }

    /// Accepted assignments in the order they were recorded.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Checks the hard constraints for placing `assignment` without changing
    /// anything.
    pub fn check(&self, problem: &Problem, assignment: &Assignment) -> Result<(), InvalidMove> {
        let Assignment {
            course_id,
            room_id,
            day,
            period,
        } = *assignment;
        let course = problem
            .courses
            .get(course_id)
            .ok_or(InvalidMove::UnknownCourse(course_id))?;
        if room_id >= problem.no_of_rooms() {
            return Err(InvalidMove::UnknownRoom(room_id));
        }
        if day >= self.days {
            return Err(InvalidMove::DayOutOfRange {
                day,
                days: self.days,
            });
        }
        if period >= self.periods_per_day {
            return Err(InvalidMove::PeriodOutOfRange {
                period,
                periods_per_day: self.periods_per_day,
            });
        }
        if self.remaining[course_id] == 0 {
            return Err(InvalidMove::NoLecturesLeft(course_id));
        }
        if self.rooms[self.per_timeslot(room_id, day, period)].is_some() {
            return Err(InvalidMove::RoomOccupied {
                room: room_id,
                day,
                period,
            });
        }
        if self.courses[self.per_timeslot(course_id, day, period)] > 0 {
            return Err(InvalidMove::CourseClash {
                course: course_id,
                day,
                period,
            });
        }
        if let Some(&curriculum) = course
            .curricula
            .iter()
            .find(|&&q| self.curriculum_occupied(q, day, period))
        {
            return Err(InvalidMove::CurriculumClash {
                curriculum,
                day,
                period,
            });
        }
        if problem.no_of_lecturers() > 0
            && self.lecturers[self.per_timeslot(course.lecturer, day, period)] > 0
        {
            return Err(InvalidMove::LecturerClash {
                lecturer: course.lecturer,
                day,
                period,
            });
        }
        let slot = Unavailability {
            course: course_id,
            day,
            period,
        };
        if self.unavailable.contains(&slot) {
            return Err(InvalidMove::Unavailable {
                course: course_id,
                day,
                period,
            });
        }
        Ok(())
    }

    /// Checks and records `assignment`.
    pub fn place(&mut self, problem: &Problem, assignment: Assignment) -> Result<(), InvalidMove> {
        self.check(problem, &assignment)?;

        let Assignment {
            course_id,
            room_id,
            day,
            period,
        } = assignment;
        let course = &problem.courses[course_id];

        let room_slot = self.per_timeslot(room_id, day, period);
        self.rooms[room_slot] = Some(course_id);
        let course_slot = self.per_timeslot(course_id, day, period);
        self.courses[course_slot] += 1;
        for &curriculum in &course.curricula {
            let idx = self.per_timeslot(curriculum, day, period);
            self.curricula[idx] += 1;
        }
        if problem.no_of_lecturers() > 0 {
            let idx = self.per_timeslot(course.lecturer, day, period);
            self.lecturers[idx] += 1;
        }
        self.remaining[course_id] -= 1;
        self.assignments.push(assignment);
        trace!("recorded {assignment}");
        Ok(())
    }
}

impl CurriculumSlots for Timetable {
    fn curriculum_occupied(&self, curriculum: CurriculumId, day: Day, period: Period) -> bool {
        if day >= self.days || period >= self.periods_per_day {
            return false;
        }
        self.curricula
            .get(self.per_timeslot(curriculum, day, period))
            .is_some_and(|&count| count > 0)
    }
}
