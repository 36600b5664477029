//! Mock server helpers for channel file tests

use std::net::TcpListener;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Base URL of the feed on `server`, addressed by IP
pub fn feed_url(server: &MockServer) -> String {
    format!("{}/app", server.uri())
}

/// Base URL of the feed on `server`, addressed by the feed hostname
///
/// Only reachable when the hostname is pinned to the loopback address.
pub fn pinned_feed_url(server: &MockServer) -> String {
    format!("http://{}:{}/app", FEED_HOST, server.address().port())
}

/// Serve `body` as the channel file `channel_file`
pub async fn mock_channel_file(server: &MockServer, channel_file: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/app/{}", channel_file)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serve `body` only to requests whose `Host` header is `host`
pub async fn mock_channel_file_for_host(
    server: &MockServer,
    channel_file: &str,
    host: &str,
    body: &str,
) {
    Mock::given(method("GET"))
        .and(path(format!("/app/{}", channel_file)))
        .and(header("host", host))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer the channel file with 404, expecting exactly one request
pub async fn mock_missing_channel_file(server: &MockServer, channel_file: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/app/{}", channel_file)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer the channel file with `status`, expecting exactly one request
pub async fn mock_failing_channel_file(server: &MockServer, channel_file: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/app/{}", channel_file)))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(server)
        .await;
}

/// A loopback port nothing listens on
pub fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe listener");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    port
}
