use std::fs;

use chrono::{TimeZone, Utc};
use harvest_core::{compose, EventCandidate, EventRecord, HarvestStats, Location};
use harvest_engine::{load_result, AtomicFileWriter, PersistError};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn sample_result(titles: &[&str]) -> harvest_core::HarvestResult {
    let seen = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
    let origin = Location::new("Chicago", 41.8781, -87.6298);
    let events = titles
        .iter()
        .map(|title| {
            let candidate = EventCandidate {
                title: title.to_string(),
                date: "June 14, 2025".to_string(),
                ..EventCandidate::default()
            };
            EventRecord::observe(candidate, &origin, seen)
        })
        .collect();
    let stats = HarvestStats {
        locations_scraped: 1,
        successful_scrapes: 1,
        interrupted: false,
    };
    compose(events, stats, seen)
}

#[test]
fn writer_replaces_previous_document() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("pokemon_events.json");
    let writer = AtomicFileWriter::new(&target);

    writer.write_result(&sample_result(&["First"])).unwrap();
    writer
        .write_result(&sample_result(&["Second", "Third"]))
        .unwrap();

    let loaded = load_result(&target).unwrap().expect("document");
    assert_eq!(loaded.total_events, 2);
    assert_eq!(loaded.events[0].title(), "Second");

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1, "temp files must not linger: {leftovers:?}");
}

#[test]
fn writer_creates_missing_output_directory() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("nested").join("deeper").join("events.json");

    AtomicFileWriter::new(&target)
        .write_result(&sample_result(&["League Cup"]))
        .unwrap();

    let text = fs::read_to_string(&target).unwrap();
    assert!(text.ends_with('\n'));
    assert!(text.contains("\"total_events\": 1"));
}

#[test]
fn writer_rejects_file_in_place_of_directory() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let err = AtomicFileWriter::new(blocker.join("events.json"))
        .write("{}")
        .unwrap_err();
    assert!(matches!(err, PersistError::OutputDir(_)));
}

#[test]
fn missing_document_loads_as_none() {
    let dir = tempdir().unwrap();
    assert!(load_result(&dir.path().join("absent.json")).unwrap().is_none());
}

#[test]
fn malformed_document_is_an_error() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("broken.json");
    fs::write(&target, "{ \"events\": ").unwrap();

    let err = load_result(&target).unwrap_err();
    assert!(matches!(err, PersistError::Json(_)));
}
