use std::time::Duration;

use chrono::NaiveDate;
use harvest_core::{classify, Classification, Location, RawQuery};
use harvest_engine::{
    AcquireSettings, FailureKind, HttpAcquirer, JitterRange, PageAcquirer, DEFAULT_USER_AGENT,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> AcquireSettings {
    AcquireSettings {
        base_url: server.uri(),
        settle: JitterRange::ZERO,
        ..AcquireSettings::default()
    }
}

fn austin_query() -> RawQuery {
    Location::new("Austin", 30.2672, -97.7431)
        .query(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

#[tokio::test]
async fn acquirer_sends_locator_query_and_decodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/EventLocator/Home"))
        .and(query_param("iskm", "false"))
        .and(query_param("latitude", "30.2672"))
        .and(query_param("longitude", "-97.7431"))
        .and(query_param("locale", "en-US"))
        .and(query_param("range", "100"))
        .and(query_param("startdate", "2025-06-01"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><div class=\"event-item\">League Cup</div></html>",
            "text/html; charset=utf-8",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let acquirer = HttpAcquirer::new(settings_for(&server)).expect("client");
    let content = acquirer.acquire(&austin_query()).await.expect("acquire ok");

    assert_eq!(content.status, 200);
    assert_eq!(content.encoding_label, "UTF-8");
    assert!(content.html.contains("League Cup"));
    assert!(content.final_url.contains("/EventLocator/Home?"));
}

#[tokio::test]
async fn forbidden_protection_page_is_returned_for_classification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/EventLocator/Home"))
        .respond_with(ResponseTemplate::new(403).set_body_raw(
            "<html><script src=\"/_Incapsula_Resource?x=1\"></script>Request unsuccessful.</html>",
            "text/html",
        ))
        .mount(&server)
        .await;

    let acquirer = HttpAcquirer::new(settings_for(&server)).expect("client");
    let content = acquirer.acquire(&austin_query()).await.expect("body passed through");

    assert_eq!(content.status, 403);
    assert_eq!(classify(&content.html), Classification::Blocked);
}

#[tokio::test]
async fn server_error_is_an_acquisition_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let acquirer = HttpAcquirer::new(settings_for(&server)).expect("client");
    let err = acquirer.acquire(&austin_query()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = AcquireSettings {
        request_timeout: Duration::from_millis(50),
        ..settings_for(&server)
    };
    let acquirer = HttpAcquirer::new(settings).expect("client");
    let err = acquirer.acquire(&austin_query()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = AcquireSettings {
        max_bytes: 10,
        ..settings_for(&server)
    };
    let acquirer = HttpAcquirer::new(settings).expect("client");
    let err = acquirer.acquire(&austin_query()).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn page_is_held_for_the_settle_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let settle = Duration::from_millis(300);
    let settings = AcquireSettings {
        settle: JitterRange::new(settle, settle),
        ..settings_for(&server)
    };
    let acquirer = HttpAcquirer::new(settings).expect("client");

    let start = std::time::Instant::now();
    acquirer.acquire(&austin_query()).await.expect("acquire ok");
    assert!(start.elapsed() >= settle);
}
