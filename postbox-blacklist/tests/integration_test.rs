//! Integration tests for the blacklist client/service pair.
//!
//! These exercise the full wire round trip over a real TCP socket: request
//! encoding, the one-request-per-connection lifecycle, response parsing, and
//! error surfacing.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{sync::Arc, time::Duration};

use postbox_blacklist::{
    BlacklistClient, BlacklistError, BlacklistServer, BlacklistStore, RemoveOutcome,
};
use postbox_common::Signal;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::broadcast,
};

/// Start a service on an ephemeral port; returns a client pointed at it, the
/// bound address, and the shutdown handle.
async fn start_service() -> (BlacklistClient, String, broadcast::Sender<Signal>) {
    let store = Arc::new(BlacklistStore::new(8192, 3));
    let server = BlacklistServer::bind("127.0.0.1:0", store)
        .await
        .expect("bind service");
    let address = server.local_addr().expect("local addr").to_string();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        server.serve(shutdown_rx).await.expect("serve");
    });

    let client = BlacklistClient::new(address.clone()).with_timeout(Duration::from_secs(2));
    (client, address, shutdown_tx)
}

#[tokio::test]
async fn add_check_remove_round_trip() {
    let (client, _address, shutdown) = start_service().await;

    assert!(!client.check("http://evil.test").await.unwrap());

    client.add("http://evil.test").await.unwrap();
    assert!(client.check("http://evil.test").await.unwrap());

    assert_eq!(
        client.remove("http://evil.test").await.unwrap(),
        RemoveOutcome::Removed
    );
    assert!(!client.check("http://evil.test").await.unwrap());

    assert_eq!(
        client.remove("http://evil.test").await.unwrap(),
        RemoveOutcome::NotFound
    );

    let _ = shutdown.send(Signal::Shutdown);
}

#[tokio::test]
async fn urls_are_matched_exactly() {
    let (client, _address, shutdown) = start_service().await;

    client.add("http://evil.test/page").await.unwrap();

    assert!(client.check("http://evil.test/page").await.unwrap());
    assert!(!client.check("http://evil.test/page/").await.unwrap());
    assert!(!client.check("HTTP://evil.test/page").await.unwrap());
    // Surrounding whitespace is trimmed on both sides of the wire.
    assert!(client.check("  http://evil.test/page  ").await.unwrap());

    let _ = shutdown.send(Signal::Shutdown);
}

#[tokio::test]
async fn adding_twice_still_succeeds() {
    let (client, _address, shutdown) = start_service().await;

    client.add("http://evil.test").await.unwrap();
    client.add("http://evil.test").await.unwrap();
    assert!(client.check("http://evil.test").await.unwrap());

    let _ = shutdown.send(Signal::Shutdown);
}

#[tokio::test]
async fn unknown_verbs_get_a_bad_request_line() {
    let (_client, address, shutdown) = start_service().await;

    // Speak the protocol by hand with a verb outside the grammar.
    let mut stream = TcpStream::connect(&address).await.expect("connect");
    stream
        .write_all(b"GET http://seed.test\n")
        .await
        .expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    assert_eq!(response, "400 Bad Request\n");

    let _ = shutdown.send(Signal::Shutdown);
}

#[tokio::test]
async fn check_response_is_two_lines_on_the_wire() {
    let (client, address, shutdown) = start_service().await;
    client.add("http://evil.test").await.unwrap();

    let mut stream = TcpStream::connect(&address).await.expect("connect");
    stream.write_all(b"2 http://evil.test\n").await.expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    assert_eq!(response, "200 OK\ntrue true\n");

    let _ = shutdown.send(Signal::Shutdown);
}

#[tokio::test]
async fn connection_refused_never_reads_as_clean() {
    // Nothing is listening here; the verdict must be an error, not `false`.
    let client = BlacklistClient::new("127.0.0.1:1").with_timeout(Duration::from_secs(1));
    let result = client.check("http://evil.test").await;
    assert!(matches!(
        result,
        Err(BlacklistError::Connection(_) | BlacklistError::Timeout)
    ));
}
