//! Loader for the multi-file UTT instance format.
//!
//! Each file is a whitespace-separated table whose first line is a column
//! header. Entities are referenced by name and receive dense ids in file
//! order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info};

use crate::config::DATASET_FILES;
use crate::data::{Course, Curriculum, Lecturer, Problem, Room, Unavailability};
use crate::error::LoadError;

/// Contents of the seven dataset files, in `DATASET_FILES` order.
#[derive(Debug, Clone, Default)]
pub struct UttSources {
    pub basic: String,
    pub courses: String,
    pub lecturers: String,
    pub rooms: String,
    pub curricula: String,
    pub relation: String,
    pub unavailability: String,
}

/// Loads a problem from the given paths: either the seven UTT files in
/// `DATASET_FILES` order or a single `.json` file.
pub fn load_problem<P: AsRef<Path>>(paths: &[P]) -> Result<Problem, LoadError> {
    if let [single] = paths {
        let path = single.as_ref();
        if path.extension().is_some_and(|ext| ext == "json") {
            info!("loading JSON problem from {}", path.display());
            return Problem::from_json_str(&read(path)?);
        }
    }
    if paths.len() != DATASET_FILES.len() {
        return Err(LoadError::FileCount {
            expected: DATASET_FILES.len(),
            got: paths.len(),
        });
    }
    info!(
        "loading UTT problem from {}",
        paths[0].as_ref().parent().unwrap_or(Path::new(".")).display()
    );
    let sources = UttSources {
        basic: read(paths[0].as_ref())?,
        courses: read(paths[1].as_ref())?,
        lecturers: read(paths[2].as_ref())?,
        rooms: read(paths[3].as_ref())?,
        curricula: read(paths[4].as_ref())?,
        relation: read(paths[5].as_ref())?,
        unavailability: read(paths[6].as_ref())?,
    };
    parse_utt(&sources)
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: PathBuf::from(path),
        source,
    })
}

/// Data rows of a file: header skipped, blank lines dropped, 1-based line
/// numbers kept for error messages.
fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .skip(1)
        .map(|(i, line)| (i + 1, line.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, fields)| !fields.is_empty())
}

fn parse_error(file: &str, line: usize, message: impl Into<String>) -> LoadError {
    LoadError::Parse {
        file: file.to_string(),
        line,
        message: message.into(),
    }
}

fn number<T: std::str::FromStr>(file: &str, line: usize, field: &str) -> Result<T, LoadError> {
    field
        .parse()
        .map_err(|_| parse_error(file, line, format!("expected a number, got {field:?}")))
}

fn columns<'a, const N: usize>(
    file: &str,
    line: usize,
    fields: &[&'a str],
) -> Result<[&'a str; N], LoadError> {
    <[&str; N]>::try_from(fields).map_err(|_| {
        parse_error(
            file,
            line,
            format!("expected {} columns, got {}", N, fields.len()),
        )
    })
}

fn lookup(
    ids: &HashMap<String, usize>,
    file: &str,
    line: usize,
    kind: &str,
    name: &str,
) -> Result<usize, LoadError> {
    ids.get(name)
        .copied()
        .ok_or_else(|| parse_error(file, line, format!("unknown {kind} {name:?}")))
}

/// Header counts of `basic.utt`.
#[derive(Debug, Clone, Copy)]
struct Basic {
    courses: usize,
    rooms: usize,
    days: usize,
    periods_per_day: usize,
    curricula: usize,
    constraints: usize,
    lecturers: usize,
}

fn parse_basic(text: &str) -> Result<Basic, LoadError> {
    let file = "basic.utt";
    let (line, fields) = rows(text)
        .next()
        .ok_or_else(|| parse_error(file, 1, "missing data row"))?;
    let [courses, rooms, days, periods_per_day, curricula, constraints, lecturers] =
        columns::<7>(file, line, &fields)?;
    Ok(Basic {
        courses: number(file, line, courses)?,
        rooms: number(file, line, rooms)?,
        days: number(file, line, days)?,
        periods_per_day: number(file, line, periods_per_day)?,
        curricula: number(file, line, curricula)?,
        constraints: number(file, line, constraints)?,
        lecturers: number(file, line, lecturers)?,
    })
}

fn check_count(file: &str, what: &str, declared: usize, found: usize) -> Result<(), LoadError> {
    if declared != found {
        return Err(LoadError::Invalid(format!(
            "basic.utt declares {declared} {what}, {file} lists {found}"
        )));
    }
    Ok(())
}

/// Builds a problem from the text of the seven UTT files.
pub fn parse_utt(sources: &UttSources) -> Result<Problem, LoadError> {
    let basic = parse_basic(&sources.basic)?;

    let mut lecturer_ids = HashMap::new();
    let mut lecturers = Vec::new();
    for (line, fields) in rows(&sources.lecturers) {
        let [name] = columns::<1>("lecturers.utt", line, &fields)?;
        lecturer_ids.insert(name.to_string(), lecturers.len());
        lecturers.push(Lecturer {
            name: name.to_string(),
        });
    }
    check_count("lecturers.utt", "lecturers", basic.lecturers, lecturers.len())?;

    let mut course_ids = HashMap::new();
    let mut courses = Vec::new();
    for (line, fields) in rows(&sources.courses) {
        let file = "courses.utt";
        let [name, lecturer, lectures, min_days, students, double] =
            columns::<6>(file, line, &fields)?;
        course_ids.insert(name.to_string(), courses.len());
        courses.push(Course {
            name: name.to_string(),
            lecturer: lookup(&lecturer_ids, file, line, "lecturer", lecturer)?,
            lectures: number(file, line, lectures)?,
            min_work_days: number(file, line, min_days)?,
            students: number(file, line, students)?,
            double_lectures: number::<u32>(file, line, double)? != 0,
            curricula: Vec::new(),
        });
    }
    check_count("courses.utt", "courses", basic.courses, courses.len())?;

    let mut rooms = Vec::new();
    for (line, fields) in rows(&sources.rooms) {
        let file = "rooms.utt";
        let [name, capacity, building] = columns::<3>(file, line, &fields)?;
        rooms.push(Room {
            name: name.to_string(),
            capacity: number(file, line, capacity)?,
            building: number(file, line, building)?,
        });
    }
    check_count("rooms.utt", "rooms", basic.rooms, rooms.len())?;

    let mut curriculum_ids = HashMap::new();
    let mut curricula = Vec::new();
    let mut declared_members = Vec::new();
    for (line, fields) in rows(&sources.curricula) {
        let file = "curricula.utt";
        let [name, members] = columns::<2>(file, line, &fields)?;
        curriculum_ids.insert(name.to_string(), curricula.len());
        curricula.push(Curriculum {
            name: name.to_string(),
        });
        declared_members.push(number::<usize>(file, line, members)?);
    }
    check_count("curricula.utt", "curricula", basic.curricula, curricula.len())?;

    let memberships = rows(&sources.relation)
        .map(|(line, fields)| -> Result<(usize, usize), LoadError> {
            let file = "relation.utt";
            let [curriculum, course] = columns::<2>(file, line, &fields)?;
            Ok((
                lookup(&course_ids, file, line, "course", course)?,
                lookup(&curriculum_ids, file, line, "curriculum", curriculum)?,
            ))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let members_per_curriculum = memberships.iter().map(|&(_, q)| q).counts();
    for (q, &declared) in declared_members.iter().enumerate() {
        let found = members_per_curriculum.get(&q).copied().unwrap_or(0);
        if found != declared {
            return Err(LoadError::Invalid(format!(
                "curriculum {} declares {} courses, relation.utt lists {}",
                curricula[q].name, declared, found
            )));
        }
    }
    for (course, mut list) in memberships.into_iter().into_group_map() {
        list.sort_unstable();
        list.dedup();
        courses[course].curricula = list;
    }

    let mut unavailability = Vec::new();
    for (line, fields) in rows(&sources.unavailability) {
        let file = "unavailability.utt";
        let [course, day, period] = columns::<3>(file, line, &fields)?;
        unavailability.push(Unavailability {
            course: lookup(&course_ids, file, line, "course", course)?,
            day: number(file, line, day)?,
            period: number(file, line, period)?,
        });
    }
    check_count(
        "unavailability.utt",
        "constraints",
        basic.constraints,
        unavailability.len(),
    )?;

    let problem = Problem {
        days: basic.days,
        periods_per_day: basic.periods_per_day,
        courses,
        rooms,
        curricula,
        lecturers,
        unavailability,
    };
    problem.validate()?;
    debug!(
        "parsed {} courses, {} rooms, {} curricula, {} lectures over {} days x {} periods",
        problem.no_of_courses(),
        problem.no_of_rooms(),
        problem.no_of_curricula(),
        problem.total_lectures(),
        problem.days,
        problem.periods_per_day
    );
    Ok(problem)
}
