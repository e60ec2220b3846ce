//! Normalized catalog entities and the vendor-document normalizer
//!
//! The vendor document is an arbitrarily nested, loosely-typed JSON blob.
//! Normalization flattens it into six cross-referenced tables keyed by the
//! vendor's own GUIDs: courses, sections, calendar ranges, sessions,
//! instructors, and a derived school-name lookup. Each pass rebuilds the
//! whole graph from scratch; re-fetching the same GUID overwrites, never
//! merges.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fields::{
    parse_array, parse_date, parse_days, parse_integer, parse_single_element_array, parse_string,
    parse_time,
};

/// Time of day with minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

/// One catalog course. Retained courses always carry a code, name,
/// description, and school, but the snapshot keeps the fields nullable so
/// absent values serialize as explicit nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Institution GUID, resolved to a display name through `schools`
    pub school: Option<String>,
    /// GUIDs of this course's retained sections
    pub sections: Vec<String>,
}

/// Seat counts for one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub current: Option<i64>,
    pub max: Option<i64>,
}

/// One section of a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// GUID of the section's calendar range; sections only ever carry one
    pub calendar_range: Option<String>,
    pub enrollment: Enrollment,
    /// GUIDs of instructors with both a first and a last name on record
    pub instructors: Vec<String>,
    /// GUIDs of this section's scheduled meeting sessions
    pub sessions: Vec<String>,
}

/// First and last day of instruction for a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// A recurring weekly meeting of a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub start: Option<TimeOfDay>,
    pub end: Option<TimeOfDay>,
    /// Weekday numbers 1-5 (Monday-Friday); null when the vendor's flag
    /// string was malformed, as opposed to an empty set of class days
    pub days: Option<Vec<u8>>,
}

/// An instructor referenced by one or more sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// The five consortium schools a course code suffix can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum School {
    HarveyMudd,
    Pitzer,
    Pomona,
    ClaremontMckenna,
    Scripps,
}

impl School {
    /// Map a 2-character course-code suffix to a school.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "HM" => Some(School::HarveyMudd),
            "PZ" => Some(School::Pitzer),
            "PO" => Some(School::Pomona),
            "CM" => Some(School::ClaremontMckenna),
            "SC" => Some(School::Scripps),
            _ => None,
        }
    }

    /// Display name recorded in the snapshot.
    pub fn display_name(&self) -> &'static str {
        match self {
            School::HarveyMudd => "Harvey Mudd",
            School::Pitzer => "Pitzer",
            School::Pomona => "Pomona",
            School::ClaremontMckenna => "CMC",
            School::Scripps => "Scripps",
        }
    }
}

/// The full normalized entity graph for one refresh pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCatalog {
    pub courses: HashMap<String, Course>,
    pub sections: HashMap<String, Section>,
    pub calendar_ranges: HashMap<String, CalendarRange>,
    pub sessions: HashMap<String, Session>,
    pub instructors: HashMap<String, Instructor>,
    /// Institution GUID to school display name
    pub schools: HashMap<String, String>,
}

/// Normalizer knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizerOptions {
    /// Drop calendar-range/session/instructor entries that no retained
    /// section references. Off by default: the side tables are populated
    /// from every referenced record, whether or not its owner survived.
    pub prune_orphans: bool,
}

/// Normalize the vendor's root document with default options.
pub fn normalize(root: &Value) -> Result<CourseCatalog> {
    normalize_with(root, NormalizerOptions::default())
}

/// Normalize the vendor's root document into the six-table entity graph.
///
/// A document without a `data` array is a fatal parse error. Malformed
/// individual course or section records are skipped, never abort the pass.
pub fn normalize_with(root: &Value, options: NormalizerOptions) -> Result<CourseCatalog> {
    let data = root
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Parse("document has no `data` array".to_string()))?;

    let mut catalog = CourseCatalog::default();
    for record in data {
        normalize_course(record, &mut catalog);
    }
    if options.prune_orphans {
        prune_orphans(&mut catalog);
    }
    Ok(catalog)
}

fn normalize_course(record: &Value, catalog: &mut CourseCatalog) {
    let Some(course_guid) = parse_string(&record["courseGuid"]) else {
        debug!("skipping course record without a courseGuid");
        return;
    };

    let code = parse_string(&record["courseNumber"]);
    let name = parse_string(&record["courseTitle"]);
    let description = parse_string(&record["description"]);
    let school = parse_string(&record["institutionGuid"]);

    // School identity is derived from the raw course code whether or not
    // the course itself survives validation. One matching course per
    // institution is enough; later matches overwrite.
    if let (Some(code), Some(institution)) = (code.as_deref(), school.as_deref()) {
        record_school(code, institution, &mut catalog.schools);
    }

    let mut section_guids = Vec::new();
    if let Some(raw_sections) = record["courseSections"].as_array() {
        for raw_section in raw_sections {
            if let Some(guid) = normalize_section(raw_section, catalog) {
                section_guids.push(guid);
            }
        }
    }

    if code.is_none()
        || name.is_none()
        || description.is_none()
        || school.is_none()
        || section_guids.is_empty()
    {
        debug!(guid = %course_guid, "dropping incomplete course record");
        return;
    }

    catalog.courses.insert(
        course_guid,
        Course {
            code,
            name,
            description,
            school,
            sections: section_guids,
        },
    );
}

/// Normalize one raw section record, returning its GUID if it was retained.
///
/// The calendar-range, session, and instructor side tables are populated
/// before the enrollment check, so a dropped section still contributes the
/// records it references.
fn normalize_section(record: &Value, catalog: &mut CourseCatalog) -> Option<String> {
    let guid = parse_string(&record["courseSectionGuid"])?;

    if let Some(ranges) = record["calendarSessions"].as_array() {
        for raw in ranges {
            if let Some(range_guid) = parse_string(&raw["calendarSessionGuid"]) {
                catalog.calendar_ranges.insert(
                    range_guid,
                    CalendarRange {
                        start: parse_date(&raw["beginDate"]),
                        end: parse_date(&raw["endDate"]),
                    },
                );
            }
        }
    }
    if let Some(schedule) = record["courseSectionSchedule"].as_array() {
        for raw in schedule {
            if let Some(session_guid) = parse_string(&raw["CourseSectionScheduleGuid"]) {
                catalog.sessions.insert(
                    session_guid,
                    Session {
                        start: parse_time(&raw["ClassBeginningTime"]),
                        end: parse_time(&raw["ClassEndingTime"]),
                        days: parse_days(&raw["ClassMeetingDays"]),
                    },
                );
            }
        }
    }
    if let Some(staff) = record["sectionInstructor"].as_array() {
        for raw in staff {
            if let Some(staff_guid) = parse_string(&raw["staffGuid"]) {
                catalog.instructors.insert(
                    staff_guid,
                    Instructor {
                        first_name: parse_string(&raw["firstName"]),
                        last_name: parse_string(&raw["lastName"]),
                    },
                );
            }
        }
    }

    let enrollment = Enrollment {
        current: parse_integer(&record["currentEnrollment"]),
        max: parse_integer(&record["capacity"]),
    };
    // Zero is real data here: a section can legitimately have nobody
    // enrolled yet. Only a missing or unparseable figure drops the section.
    if enrollment.current.is_none() || enrollment.max.is_none() {
        debug!(guid = %guid, "dropping section without enrollment figures");
        return None;
    }

    let instructors = parse_array(&record["sectionInstructor"], |raw| {
        if parse_string(&raw["firstName"]).is_some() && parse_string(&raw["lastName"]).is_some() {
            parse_string(&raw["staffGuid"])
        } else {
            None
        }
    });
    let sessions = parse_array(&record["courseSectionSchedule"], |raw| {
        parse_string(&raw["CourseSectionScheduleGuid"])
    });
    let calendar_range = parse_single_element_array(&record["calendarSessions"], |raw| {
        parse_string(&raw["calendarSessionGuid"])
    });

    catalog.sections.insert(
        guid.clone(),
        Section {
            calendar_range,
            enrollment,
            instructors,
            sessions,
        },
    );
    Some(guid)
}

/// Record `institutionGuid -> school name` when the course code's last
/// three characters are a space followed by a known 2-letter school code.
fn record_school(code: &str, institution: &str, schools: &mut HashMap<String, String>) {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() < 3 || chars[chars.len() - 3] != ' ' {
        return;
    }
    let suffix: String = chars[chars.len() - 2..].iter().collect();
    if let Some(school) = School::from_code(&suffix) {
        schools.insert(institution.to_string(), school.display_name().to_string());
    }
}

/// Drop side-table entries no retained section references.
fn prune_orphans(catalog: &mut CourseCatalog) {
    let mut live_ranges = HashSet::new();
    let mut live_sessions = HashSet::new();
    let mut live_instructors = HashSet::new();
    for section in catalog.sections.values() {
        if let Some(range) = &section.calendar_range {
            live_ranges.insert(range.clone());
        }
        live_sessions.extend(section.sessions.iter().cloned());
        live_instructors.extend(section.instructors.iter().cloned());
    }
    catalog
        .calendar_ranges
        .retain(|guid, _| live_ranges.contains(guid));
    catalog
        .sessions
        .retain(|guid, _| live_sessions.contains(guid));
    catalog
        .instructors
        .retain(|guid, _| live_instructors.contains(guid));
}
