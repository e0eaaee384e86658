//! Error types for loading problems and for rejected timetable moves.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::{CourseId, CurriculumId, Day, LecturerId, Period, RoomId};

/// A lecture placement that breaks the caller contract of the estimator or a
/// hard constraint of the timetable. Nothing is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMove {
    #[error("course {0} does not exist")]
    UnknownCourse(CourseId),

    #[error("room {0} does not exist")]
    UnknownRoom(RoomId),

    #[error("day {day} is outside the {days}-day calendar")]
    DayOutOfRange { day: Day, days: usize },

    #[error("period {period} is outside the {periods_per_day}-period day")]
    PeriodOutOfRange {
        period: Period,
        periods_per_day: usize,
    },

    #[error("course {0} has no unscheduled lectures left")]
    NoLecturesLeft(CourseId),

    #[error("room {room} is already taken on day {day}, period {period}")]
    RoomOccupied { room: RoomId, day: Day, period: Period },

    #[error("course {course} already has a lecture on day {day}, period {period}")]
    CourseClash {
        course: CourseId,
        day: Day,
        period: Period,
    },

    #[error("curriculum {curriculum} already has a lecture on day {day}, period {period}")]
    CurriculumClash {
        curriculum: CurriculumId,
        day: Day,
        period: Period,
    },

    #[error("lecturer {lecturer} already teaches on day {day}, period {period}")]
    LecturerClash {
        lecturer: LecturerId,
        day: Day,
        period: Period,
    },

    #[error("course {course} is unavailable on day {day}, period {period}")]
    Unavailable {
        course: CourseId,
        day: Day,
        period: Period,
    },
}

/// Failure while reading a problem instance.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("invalid problem JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected {expected} dataset files, got {got}")]
    FileCount { expected: usize, got: usize },

    #[error("inconsistent problem: {0}")]
    Invalid(String),
}
