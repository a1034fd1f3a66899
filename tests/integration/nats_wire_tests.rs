//! Bridge over a real TCP connection speaking the NATS protocol.
//!
//! The server here is a scripted stand-in: it greets with INFO, answers
//! PING, records SUB/UNSUB and loops every PUB back to matching
//! subscriptions on the same connection. It can also hang up on the first
//! client right after the handshake to exercise reconnects.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::net::Shutdown;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use paperbridge::broker::{Broker, NatsBroker};
use paperbridge::test_utils::doubles::StaticSource;
use paperbridge::test_utils::fixtures::{plos_docs, plos_response};

use super::fixture::service_over;

#[derive(Debug, Default)]
struct ServerLog {
    connections: usize,
    subs: usize,
    unsubs: usize,
    pubs: usize,
}

fn serve(stream: TcpStream, log: &Mutex<ServerLog>, hang_up_after_handshake: bool) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;
    writer
        .write_all(b"INFO {\"server_id\":\"scripted\",\"version\":\"2.10.0\",\"proto\":1,\"max_payload\":1048576}\r\n")
        .unwrap();

    let mut subs: HashMap<String, Vec<String>> = HashMap::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        match parts.first().map(String::as_str) {
            Some("PING") => {
                writer.write_all(b"PONG\r\n").unwrap();
                if hang_up_after_handshake {
                    let _ = writer.shutdown(Shutdown::Both);
                    return;
                }
            }
            Some("SUB") => {
                log.lock().unwrap().subs += 1;
                subs.entry(parts[1].clone())
                    .or_default()
                    .push(parts[2].clone());
            }
            Some("UNSUB") => {
                log.lock().unwrap().unsubs += 1;
                for sids in subs.values_mut() {
                    sids.retain(|sid| *sid != parts[1]);
                }
            }
            Some("PUB") => {
                log.lock().unwrap().pubs += 1;
                let len: usize = parts[2].parse().unwrap();
                let mut payload = vec![0; len + 2];
                reader.read_exact(&mut payload).unwrap();
                for sid in subs.get(&parts[1]).into_iter().flatten() {
                    let header = format!("MSG {} {sid} {len}\r\n", parts[1]);
                    writer.write_all(header.as_bytes()).unwrap();
                    writer.write_all(&payload).unwrap();
                }
            }
            _ => {}
        }
    }
}

fn spawn_server() -> (String, Arc<Mutex<ServerLog>>) {
    spawn_server_with(false)
}

/// With `drop_first`, the first connection is closed once its handshake
/// PING is answered; later connections are served normally.
fn spawn_server_with(drop_first: bool) -> (String, Arc<Mutex<ServerLog>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("nats://{}", listener.local_addr().unwrap());
    let log = Arc::new(Mutex::new(ServerLog::default()));
    let server_log = Arc::clone(&log);
    let pending_drop = Arc::new(AtomicBool::new(drop_first));
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { return };
            server_log.lock().unwrap().connections += 1;
            let log = Arc::clone(&server_log);
            let hang_up = pending_drop.swap(false, Ordering::SeqCst);
            std::thread::spawn(move || serve(stream, &log, hang_up));
        }
    });
    (url, log)
}

#[test]
fn search_round_trips_through_nats_connection() {
    let (url, log) = spawn_server();
    let broker = Arc::new(NatsBroker::connect(&url, Duration::from_secs(2)).unwrap());
    let service = service_over(
        Arc::new(StaticSource::new(plos_response(5, 0, &plos_docs(5)))),
        broker.clone(),
        Duration::from_secs(2),
    );

    let results = service.search("covid", 0, false).unwrap();

    assert!(!results.is_error());
    assert_eq!(results.items().len(), 5);
    assert_eq!(broker.live_subscriptions(), 0);

    // Give the UNSUB frame a moment to land.
    std::thread::sleep(Duration::from_millis(50));
    let log = log.lock().unwrap();
    assert_eq!(log.subs, 1);
    assert_eq!(log.pubs, 1);
    assert_eq!(log.unsubs, 1);
}

#[test]
fn concurrent_searches_share_one_nats_connection() {
    let (url, _log) = spawn_server();
    let broker = Arc::new(NatsBroker::connect(&url, Duration::from_secs(2)).unwrap());
    let service = service_over(
        Arc::new(StaticSource::new(plos_response(2, 0, &plos_docs(2)))),
        broker.clone(),
        Duration::from_secs(2),
    );

    std::thread::scope(|scope| {
        for i in 0..8 {
            let service = service.clone();
            scope.spawn(move || {
                let results = service.search(&format!("t{i}"), 0, false).unwrap();
                assert_eq!(results.search_term(), format!("t{i}"));
            });
        }
    });

    assert_eq!(broker.live_subscriptions(), 0);
}

#[test]
fn client_reconnects_after_server_hangup() {
    let (url, log) = spawn_server_with(true);
    let broker = Arc::new(NatsBroker::connect(&url, Duration::from_secs(2)).unwrap());
    let service = service_over(
        Arc::new(StaticSource::new(plos_response(3, 0, &plos_docs(3)))),
        broker.clone(),
        Duration::from_secs(2),
    );

    // Calls made while the link is down fail fast; once the client is back
    // on a fresh connection the same service works again.
    let deadline = Instant::now() + Duration::from_secs(10);
    let results = loop {
        match service.search("covid", 0, false) {
            Ok(results) => break results,
            Err(err) => {
                assert!(Instant::now() < deadline, "never recovered: {err}");
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    };

    assert!(!results.is_error());
    assert_eq!(results.items().len(), 3);
    assert!(broker.is_connected());
    assert!(log.lock().unwrap().connections >= 2);
}
