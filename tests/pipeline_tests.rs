//! End-to-end tests for the decode -> normalize -> persist pipeline
//!
//! These drive the same path the refresh loop takes, minus the outbound
//! HTTP request: a response body goes through the envelope decoder, the
//! normalizer, and the snapshot writer, and the result is read back the
//! way the server would serve it.

use serde_json::json;

use coursegraph::catalog::{normalize, normalize_with, NormalizerOptions};
use coursegraph::portal::decode_envelope;
use coursegraph::{snapshot, Error};

/// A realistic single-course response body, as the vendor would frame it.
fn wrapped_fixture() -> String {
    let document = json!({
        "data": [{
            "courseGuid": "course-1",
            "courseNumber": "MATH055 PZ",
            "courseTitle": "Discrete Mathematics",
            "description": "Sets, logic, graphs, and counting.",
            "institutionGuid": "inst-pitzer",
            "courseSections": [{
                "courseSectionGuid": "section-1",
                "currentEnrollment": 0,
                "capacity": "25",
                "calendarSessions": [{
                    "calendarSessionGuid": "range-1",
                    "beginDate": "2017-08-29",
                    "endDate": "2017-12-15"
                }],
                "courseSectionSchedule": [{
                    "CourseSectionScheduleGuid": "session-1",
                    "ClassBeginningTime": "0910",
                    "ClassEndingTime": "1025",
                    "ClassMeetingDays": "--T-R--"
                }],
                "sectionInstructor": [{
                    "staffGuid": "staff-1",
                    "firstName": "Dana",
                    "lastName": "Reyes"
                }]
            }]
        }]
    });
    format!("lingkCallback({document})\n")
}

// =============================================================================
// Envelope decoding
// =============================================================================

#[test]
fn test_garbage_body_reported_verbatim() {
    let err = decode_envelope("garbage").unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
    assert!(err.to_string().contains("garbage"));
}

#[test]
fn test_empty_feed_decodes_to_empty_tables() {
    let document = decode_envelope("lingkCallback({\"data\":[]})\n").unwrap();
    let catalog = normalize(&document).unwrap();

    assert!(catalog.courses.is_empty());
    assert!(catalog.sections.is_empty());
    assert!(catalog.calendar_ranges.is_empty());
    assert!(catalog.sessions.is_empty());
    assert!(catalog.instructors.is_empty());
    assert!(catalog.schools.is_empty());
}

// =============================================================================
// Full pipeline
// =============================================================================

#[tokio::test]
async fn test_response_body_to_persisted_snapshot() {
    let dir = tempfile::tempdir().unwrap();

    let document = decode_envelope(&wrapped_fixture()).unwrap();
    let catalog = normalize(&document).unwrap();
    snapshot::write_snapshot(dir.path(), &catalog).await.unwrap();

    let reloaded = snapshot::read_snapshot(dir.path()).await.unwrap();
    assert_eq!(catalog, reloaded);

    let course = &reloaded.courses["course-1"];
    assert_eq!(course.name.as_deref(), Some("Discrete Mathematics"));
    assert_eq!(course.sections, vec!["section-1".to_string()]);

    // Zero enrollment is data, not absence.
    let section = &reloaded.sections["section-1"];
    assert_eq!(section.enrollment.current, Some(0));
    assert_eq!(section.enrollment.max, Some(25));

    let session = &reloaded.sessions["session-1"];
    assert_eq!(session.days, Some(vec![2, 4]));

    assert_eq!(reloaded.schools["inst-pitzer"], "Pitzer");
}

#[tokio::test]
async fn test_refetch_replaces_snapshot_wholesale() {
    let dir = tempfile::tempdir().unwrap();

    let document = decode_envelope(&wrapped_fixture()).unwrap();
    let full = normalize(&document).unwrap();
    snapshot::write_snapshot(dir.path(), &full).await.unwrap();

    // A later pass with an empty feed replaces the graph, it never merges.
    let empty = normalize(&json!({"data": []})).unwrap();
    snapshot::write_snapshot(dir.path(), &empty).await.unwrap();

    let reloaded = snapshot::read_snapshot(dir.path()).await.unwrap();
    assert!(reloaded.courses.is_empty());
    assert!(reloaded.schools.is_empty());
}

#[tokio::test]
async fn test_pruning_is_a_pipeline_option() {
    let dir = tempfile::tempdir().unwrap();

    // Break the section so everything it references is orphaned.
    let body = wrapped_fixture().replace("\"capacity\":\"25\"", "\"capacity\":\"TBD\"");
    let document = decode_envelope(&body).unwrap();

    let catalog = normalize_with(&document, NormalizerOptions { prune_orphans: true }).unwrap();
    snapshot::write_snapshot(dir.path(), &catalog).await.unwrap();

    let reloaded = snapshot::read_snapshot(dir.path()).await.unwrap();
    assert!(reloaded.sections.is_empty());
    assert!(reloaded.calendar_ranges.is_empty());
    assert!(reloaded.sessions.is_empty());
    assert!(reloaded.instructors.is_empty());
}
