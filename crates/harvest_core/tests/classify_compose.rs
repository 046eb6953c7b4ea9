use chrono::{TimeZone, Utc};
use harvest_core::{
    classify, compose, Classification, EventCandidate, EventRecord, HarvestStats, Location,
};
use pretty_assertions::assert_eq;

#[test]
fn protection_markers_are_blocked_case_insensitively() {
    assert_eq!(
        classify("<html><script src=\"/_Incapsula_Resource?x=1\"></script></html>"),
        Classification::Blocked
    );
    assert_eq!(classify("<h1>ACCESS DENIED</h1>"), Classification::Blocked);
    assert_eq!(
        classify("Request unsuccessful. Incapsula incident ID: 123"),
        Classification::Blocked
    );
}

#[test]
fn no_results_phrasing_is_empty() {
    assert_eq!(
        classify("<p>There are No Events near this location.</p>"),
        Classification::Empty
    );
    assert_eq!(classify("<p>No results found</p>"), Classification::Empty);
}

#[test]
fn blocked_wins_over_empty() {
    assert_eq!(
        classify("Access denied. No results available."),
        Classification::Blocked
    );
}

#[test]
fn ordinary_listing_is_clean() {
    assert_eq!(
        classify("<div class=\"event-item\">Community Day</div>"),
        Classification::Clean
    );
    assert_eq!(classify(""), Classification::Clean);
}

fn record(title: &str, date: &str) -> EventRecord {
    let candidate = EventCandidate {
        title: title.to_string(),
        date: date.to_string(),
        ..EventCandidate::default()
    };
    EventRecord::observe(
        candidate,
        &Location::new("Austin", 30.2672, -97.7431),
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
    )
}

#[test]
fn compose_sorts_by_date_text_and_fills_counters() {
    let events = vec![
        record("late", "June 14, 2025"),
        record("tba", "Date TBA"),
        record("early", "April 2, 2025"),
        record("late-twin", "June 14, 2025"),
    ];
    let stats = HarvestStats {
        locations_scraped: 3,
        successful_scrapes: 2,
        interrupted: false,
    };
    let now = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();

    let result = compose(events, stats, now);

    let titles: Vec<_> = result.events.iter().map(|e| e.title()).collect();
    // Plain string order: "April" < "Date" < "June"; equal dates keep input order.
    assert_eq!(titles, vec!["early", "tba", "late", "late-twin"]);
    assert_eq!(result.total_events, 4);
    assert_eq!(result.locations_scraped, 3);
    assert_eq!(result.successful_scrapes, 2);
    assert_eq!(result.last_updated, now);
}

#[test]
fn serialized_record_has_exactly_the_documented_fields() {
    let result = compose(
        vec![record("Community Day", "June 14, 2025")],
        HarvestStats::default(),
        Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap(),
    );
    let value = serde_json::to_value(&result).unwrap();

    let mut top: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    top.sort();
    assert_eq!(
        top,
        vec![
            "events",
            "last_updated",
            "locations_scraped",
            "successful_scrapes",
            "total_events"
        ]
    );

    let mut fields: Vec<_> = value["events"][0].as_object().unwrap().keys().cloned().collect();
    fields.sort();
    assert_eq!(
        fields,
        vec![
            "address",
            "date",
            "description",
            "event_type",
            "id",
            "last_seen",
            "location",
            "search_city",
            "search_latitude",
            "search_longitude",
            "title"
        ]
    );
    assert_eq!(value["events"][0]["location"], "Location TBA");
}
