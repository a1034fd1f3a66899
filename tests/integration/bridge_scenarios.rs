//! End-to-end request/reply scenarios against a stub upstream.

use std::sync::Arc;
use std::time::{Duration, Instant};

use httpmock::prelude::*;

use paperbridge::broker::{Broker, MemoryBroker};
use paperbridge::test_utils::doubles::{SilentBroker, StaticSource};
use paperbridge::test_utils::fixtures::{plos_doc, plos_docs, plos_response};
use paperbridge::test_utils::logging::TestLogger;
use paperbridge::{BridgeError, CancelToken, SearchService};

use super::fixture::{REPLY_TIMEOUT, plos_client, service_over, stub_title_search};

#[test]
fn matching_documents_come_back_as_success() {
    let log = TestLogger::new("matching_documents_come_back_as_success");
    let server = MockServer::start();
    let mock = stub_title_search(
        &server,
        "covid",
        2,
        &[
            plos_doc("10.1371/journal.pone.0000001", "Covid transmission"),
            plos_doc("10.1371/journal.pone.0000002", "Covid vaccines"),
        ],
    );
    let broker = Arc::new(MemoryBroker::new());
    let service = service_over(plos_client(&server), broker.clone(), REPLY_TIMEOUT);

    let results = service.search("covid", 0, false).unwrap();
    log.log_actual(&results);

    mock.assert();
    assert!(!results.is_error());
    assert!(results.error_message().is_empty());
    assert_eq!(results.search_term(), "covid");
    assert_eq!(results.total_found(), 2);
    assert_eq!(results.items().len(), 2);
    assert_eq!(results.next_offset(), 2);
    assert_eq!(results.items()[1].title, "Covid vaccines");
    assert_eq!(results.items()[0].published_at, "2020-05-01");
    assert_eq!(broker.live_subscriptions(), 0);
    log.pass();
}

#[test]
fn upstream_failure_is_a_soft_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(500).body("internal error");
    });
    let broker = Arc::new(MemoryBroker::new());
    let service = service_over(plos_client(&server), broker.clone(), REPLY_TIMEOUT);

    let results = service.search("covid", 0, false).unwrap();

    assert!(results.is_error());
    assert!(results.items().is_empty());
    assert!(!results.error_message().is_empty());
    assert!(results.error_message().contains("500"));
    assert_eq!(broker.live_subscriptions(), 0);
}

#[test]
fn no_matches_names_the_term() {
    let server = MockServer::start();
    stub_title_search(&server, "zzqqxx", 0, &[]);
    let service = service_over(
        plos_client(&server),
        Arc::new(MemoryBroker::new()),
        REPLY_TIMEOUT,
    );

    let results = service.search("zzqqxx", 0, false).unwrap();

    assert!(results.is_error());
    assert!(results.items().is_empty());
    assert!(results.error_message().contains("zzqqxx"));
}

#[test]
fn malformed_upstream_payload_is_a_soft_error() {
    let log = TestLogger::new("malformed_upstream_payload_is_a_soft_error");
    let server = MockServer::start();
    let body = "{not json";
    log.log_input("upstream body", &body);
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", "title:covid");
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    });
    let broker = Arc::new(MemoryBroker::new());
    let service = service_over(plos_client(&server), broker.clone(), REPLY_TIMEOUT);

    let results = service.search("covid", 0, false).unwrap();
    log.log_actual(&results);

    mock.assert();
    assert!(results.is_error());
    assert!(results.items().is_empty());
    assert!(
        results
            .error_message()
            .starts_with("Malformed upstream payload"),
        "{}",
        results.error_message()
    );
    assert_eq!(broker.live_subscriptions(), 0);
    log.pass();
}

#[test]
fn unaddressable_offset_is_a_soft_error() {
    let log = TestLogger::new("unaddressable_offset_is_a_soft_error");
    log.log_input("offset", &usize::MAX);
    let source = Arc::new(StaticSource::new(plos_response(3, 0, &plos_docs(3))));
    let broker = Arc::new(MemoryBroker::new());
    let service = service_over(source, broker.clone(), REPLY_TIMEOUT);

    let results = service.search("covid", usize::MAX, false).unwrap();
    log.log_actual(&results);

    assert!(results.is_error());
    assert!(results.error_message().contains("offset"));
    assert_eq!(broker.live_subscriptions(), 0);
    log.pass();
}

#[test]
fn undelivered_reply_times_out_within_bound() {
    let log = TestLogger::new("undelivered_reply_times_out_within_bound");
    let broker = Arc::new(SilentBroker::new());
    let source = Arc::new(StaticSource::new(plos_response(1, 0, &plos_docs(1))));
    let service = service_over(source, broker.clone(), REPLY_TIMEOUT);

    let started = Instant::now();
    let err = service.search("covid", 0, false).unwrap_err();
    let elapsed = started.elapsed();
    log.log_actual(&elapsed);

    assert!(matches!(err, BridgeError::ReplyTimeout { .. }), "{err:?}");
    assert!(elapsed >= REPLY_TIMEOUT);
    assert!(elapsed < REPLY_TIMEOUT + Duration::from_secs(2));
    assert_eq!(broker.dropped(), 1);
    assert_eq!(broker.live_subscriptions(), 0);

    let rendered = SearchService::render_outcome("covid", Err(err));
    assert!(rendered.is_error());
    assert!(rendered.error_message().contains("No reply"));
    log.pass();
}

#[test]
fn cancellation_ends_the_wait_early() {
    let broker = Arc::new(SilentBroker::new());
    let source = Arc::new(StaticSource::new(plos_response(1, 0, &plos_docs(1))));
    let service = service_over(source, broker.clone(), Duration::from_secs(30));

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        trigger.cancel();
    });

    let started = Instant::now();
    let err = service
        .search_with_cancel("covid", 0, false, &cancel)
        .unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, BridgeError::Cancelled { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(broker.live_subscriptions(), 0);
}

#[test]
fn successful_search_is_never_flagged_as_error() {
    let source = Arc::new(StaticSource::new(plos_response(3, 0, &plos_docs(3))));
    let service = service_over(source, Arc::new(MemoryBroker::new()), REPLY_TIMEOUT);

    let outcome = service.search("anything", 0, false);
    assert!(outcome.is_ok());
    let results = outcome.unwrap();
    assert!(!results.is_error());
    assert_eq!(results.items().len(), 3);
}

#[test]
fn closed_broker_is_a_hard_error() {
    let broker = Arc::new(MemoryBroker::new());
    let source = Arc::new(StaticSource::new(plos_response(1, 0, &plos_docs(1))));
    let service = service_over(source.clone(), broker.clone(), REPLY_TIMEOUT);
    broker.close();

    let err = service.search("covid", 0, false).unwrap_err();
    assert!(matches!(err, BridgeError::BrokerUnavailable(_)));
    assert_eq!(err.http_status(), 503);
    // The broker is checked before the upstream is touched.
    assert_eq!(source.calls(), 0);
}

#[test]
fn cloud_request_without_cloud_broker_fails() {
    let source = Arc::new(StaticSource::new(plos_response(1, 0, &plos_docs(1))));
    let service = service_over(source, Arc::new(MemoryBroker::new()), REPLY_TIMEOUT);

    let err = service.search("covid", 0, true).unwrap_err();
    assert!(matches!(err, BridgeError::BrokerUnavailable(_)));
}

#[test]
fn paging_offset_reaches_upstream() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", "title:malaria")
            .query_param("start", "10");
        then.status(200).body(plos_response(25, 10, &plos_docs(10)));
    });
    let service = service_over(
        plos_client(&server),
        Arc::new(MemoryBroker::new()),
        REPLY_TIMEOUT,
    );

    let results = service.search("malaria", 10, false).unwrap();

    mock.assert();
    assert_eq!(results.offset(), 10);
    assert_eq!(results.next_offset(), 20);
    assert!(results.has_more());
    assert_eq!(results.previous_offset(), Some(0));
}

#[test]
fn doi_term_is_an_identifier_lookup() {
    let server = MockServer::start();
    let doi = "10.1371/journal.pone.0230133";
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", format!("id:\"{doi}\""));
        then.status(200)
            .body(plos_response(1, 0, &[plos_doc(doi, "Exact match")]));
    });
    let service = service_over(
        plos_client(&server),
        Arc::new(MemoryBroker::new()),
        REPLY_TIMEOUT,
    );

    let results = service.search(doi, 0, false).unwrap();

    mock.assert();
    assert_eq!(results.items()[0].id, doi);
}
