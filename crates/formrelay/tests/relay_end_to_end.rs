//! A form post travels from the front door through the relay into the store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use formrelay::http::{build_app, AppState, Assets};
use formrelay::relay::{self, Inbox, UdpInbox, UdpRelay};
use formrelay::{Decoder, Store};

const BODY: &str = "name=Ann&msg=Hi+there";

fn post(body: &'static str) -> Request<Body> {
    Request::post("/message")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

async fn recv_one<I: Inbox>(inbox: &mut I) -> Vec<u8> {
    tokio::time::timeout(Duration::from_secs(5), inbox.recv())
        .await
        .expect("no datagram arrived")
        .unwrap()
        .expect("inbox closed")
}

fn assert_single_record(store: &Store) {
    let document = store.load().unwrap();
    assert_eq!(document.len(), 1);

    let record = document.values().next().unwrap();
    assert_eq!(record["name"], "Ann");
    assert_eq!(record["msg"], "Hi there");
}

#[tokio::test]
async fn test_post_over_channel_lands_in_store() {
    let dir = tempfile::tempdir().unwrap();
    let (relay, mut inbox) = relay::channel(4, 1024);
    let app = build_app(AppState::new(
        Arc::new(relay),
        Assets::new(dir.path().join("templates"), dir.path().join("static")),
    ));

    let response = app.oneshot(post(BODY)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/index");

    let payload = recv_one(&mut inbox).await;
    assert_eq!(payload, BODY.as_bytes());

    let decoder = Decoder::new(Store::new(dir.path().join("data").join("data.json")));
    decoder.handle(&payload).await.unwrap();
    assert_single_record(decoder.store());
}

#[tokio::test]
async fn test_post_over_udp_lands_in_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut inbox = UdpInbox::bind("127.0.0.1:0".parse().unwrap(), 1024)
        .await
        .unwrap();
    let relay = UdpRelay::bind(inbox.local_addr().unwrap()).await.unwrap();
    let app = build_app(AppState::new(
        Arc::new(relay),
        Assets::new(dir.path().join("templates"), dir.path().join("static")),
    ));

    let response = app.oneshot(post(BODY)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let payload = recv_one(&mut inbox).await;
    let decoder = Decoder::new(Store::new(dir.path().join("data.json")));
    decoder.handle(&payload).await.unwrap();
    assert_single_record(decoder.store());
}

#[tokio::test]
async fn test_decoder_loop_stops_when_relay_drops() {
    let dir = tempfile::tempdir().unwrap();
    let (relay, inbox) = relay::channel(4, 1024);
    let decoder = Decoder::new(Store::new(dir.path().join("data.json")));

    let app = build_app(AppState::new(
        Arc::new(relay),
        Assets::new(dir.path().join("templates"), dir.path().join("static")),
    ));
    let response = app.oneshot(post(BODY)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    // oneshot consumed the app, so the only sender is gone and run drains then returns
    tokio::time::timeout(Duration::from_secs(5), decoder.run(inbox))
        .await
        .expect("decoder did not stop")
        .unwrap();
    assert_single_record(decoder.store());
}
