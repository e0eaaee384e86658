use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LoadError;

// Type aliases for clarity. Every id is a dense index into the matching
// `Problem` vector.
pub type CourseId = usize;
pub type RoomId = usize;
pub type CurriculumId = usize;
pub type LecturerId = usize;
pub type Day = usize;
pub type Period = usize;

/// A course whose lectures have to be placed in the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub name: String,
    pub lecturer: LecturerId,
    /// Number of lectures still to place.
    pub lectures: u32,
    /// Minimum number of distinct days the lectures should spread over.
    pub min_work_days: u32,
    pub students: u32,
    #[serde(default)]
    pub double_lectures: bool,
    #[serde(default)]
    pub curricula: Vec<CurriculumId>,
}

/// Represents a physical room with a given capacity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Room {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub building: u32,
}

/// A group of courses sharing students.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Curriculum {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Lecturer {
    pub name: String,
}

/// A timeslot in which a course must not be taught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Unavailability {
    pub course: CourseId,
    pub day: Day,
    pub period: Period,
}

/// The complete, immutable description of a timetabling instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub days: usize,
    pub periods_per_day: usize,
    pub courses: Vec<Course>,
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub curricula: Vec<Curriculum>,
    #[serde(default)]
    pub lecturers: Vec<Lecturer>,
    #[serde(default)]
    pub unavailability: Vec<Unavailability>,
}

impl Problem {
    /// Parses a problem from its JSON form and checks its references.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let problem: Problem = serde_json::from_str(json)?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn no_of_courses(&self) -> usize {
        self.courses.len()
    }

    pub fn no_of_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn no_of_curricula(&self) -> usize {
        self.curricula.len()
    }

    pub fn no_of_lecturers(&self) -> usize {
        self.lecturers.len()
    }

    /// Number of lectures across all courses.
    pub fn total_lectures(&self) -> u32 {
        self.courses.iter().map(|c| c.lectures).sum()
    }

    /// Sum of the minimum working days of all courses, i.e. the deficit of an
    /// empty timetable.
    pub fn total_min_work_days(&self) -> u32 {
        self.courses.iter().map(|c| c.min_work_days).sum()
    }

    /// Checks that every id stored in the problem points at an existing entity.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.days == 0 || self.periods_per_day == 0 {
            return Err(LoadError::Invalid(format!(
                "calendar must have at least one day and one period, got {} days x {} periods",
                self.days, self.periods_per_day
            )));
        }
        for course in &self.courses {
            // A missing lecturer list means lecturers are not modelled.
            if !self.lecturers.is_empty() && course.lecturer >= self.lecturers.len() {
                return Err(LoadError::Invalid(format!(
                    "course {} references unknown lecturer {}",
                    course.name, course.lecturer
                )));
            }
            if let Some(curriculum) = course
                .curricula
                .iter()
                .find(|&&q| q >= self.curricula.len())
            {
                return Err(LoadError::Invalid(format!(
                    "course {} references unknown curriculum {}",
                    course.name, curriculum
                )));
            }
        }
        for slot in &self.unavailability {
            if slot.course >= self.courses.len()
                || slot.day >= self.days
                || slot.period >= self.periods_per_day
            {
                return Err(LoadError::Invalid(format!(
                    "unavailability entry {slot} is outside the problem"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(course {}, day {}, period {})", self.course, self.day, self.period)
    }
}

/// Represents a single scheduled lecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub course_id: CourseId,
    pub room_id: RoomId,
    pub day: Day,
    pub period: Period,
}

impl Assignment {
    pub fn new(course_id: CourseId, room_id: RoomId, day: Day, period: Period) -> Self {
        Assignment {
            course_id,
            room_id,
            day,
            period,
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "course {} in room {} on day {}, period {}",
            self.course_id, self.room_id, self.day, self.period
        )
    }
}

/// Describes a soft constraint that is violated by a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetSoftConstraint {
    pub constraint_type: String,
    pub description: String,
}

impl fmt::Display for UnmetSoftConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.description)
    }
}
