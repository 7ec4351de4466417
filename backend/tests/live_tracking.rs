//! End-to-end tracking: samples submitted over HTTP reach live sockets.

#[path = "support/ws.rs"]
mod ws_support;

use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::header;
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message as ClientMessage};
use futures::{SinkExt, StreamExt};
use rstest::rstest;
use serde_json::{Value, json};

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

struct Running {
    url: String,
    _server: ServerHandle,
}

fn running(stack: &ws_support::Stack) -> Running {
    let (url, server) = ws_support::start_server(stack);
    let handle = server.handle();
    actix_web::rt::spawn(server);
    Running {
        url,
        _server: handle,
    }
}

/// Register over HTTP and return `(user id, bearer token)`.
async fn register(base: &str, email: &str) -> (i64, String) {
    let mut response = awc::Client::default()
        .post(format!("{base}/auth/register"))
        .send_json(&json!({"email": email, "password": "secret1", "name": "Driver"}))
        .await
        .expect("register request");
    assert_eq!(response.status().as_u16(), 201);
    let session: Value = response.json().await.expect("session body");
    let id = session
        .pointer("/user/id")
        .and_then(Value::as_i64)
        .expect("user id");
    let token = session
        .get("accessToken")
        .and_then(Value::as_str)
        .expect("token")
        .to_owned();
    (id, token)
}

async fn connect(base: &str, token: &str) -> Socket {
    let (_resp, socket) = awc::Client::default()
        .ws(format!("{base}/ws?token={token}"))
        .set_header(header::ORIGIN, ws_support::ALLOWED_ORIGIN)
        .connect()
        .await
        .expect("websocket connect");
    socket
}

async fn send(socket: &mut Socket, payload: Value) {
    socket
        .send(ClientMessage::Text(payload.to_string().into()))
        .await
        .expect("send text");
}

/// Next text frame within `wait`, skipping heartbeats.
async fn next_event_within(socket: &mut Socket, wait: Duration) -> Option<Value> {
    loop {
        let frame = tokio::time::timeout(wait, socket.next()).await.ok()??;
        match frame.expect("frame") {
            Frame::Text(bytes) => return Some(serde_json::from_slice(&bytes).expect("json")),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn next_event(socket: &mut Socket) -> Value {
    next_event_within(socket, Duration::from_secs(2))
        .await
        .expect("event within timeout")
}

fn event_name(event: &Value) -> Option<&str> {
    event.get("event").and_then(Value::as_str)
}

#[rstest]
#[actix_rt::test]
async fn http_submission_reaches_room_and_dashboard_once() {
    let stack = ws_support::stack();
    let server = running(&stack);
    let (driver_id, driver_token) = register(&server.url, "van@fleet.test").await;
    let (_, ops_token) = register(&server.url, "ops@fleet.test").await;

    let mut follower = connect(&server.url, &ops_token).await;
    let mut dashboard = connect(&server.url, &ops_token).await;
    send(
        &mut follower,
        json!({"event": "join_tracking", "data": {"userId": driver_id}}),
    )
    .await;
    // Frames on one socket are handled in order: once this is rejected the
    // join has been applied.
    send(
        &mut follower,
        json!({
            "event": "update_location",
            "data": {"userId": driver_id, "location": {"latitude": 1.0, "longitude": 1.0}}
        }),
    )
    .await;
    let ack = next_event(&mut follower).await;
    assert_eq!(event_name(&ack), Some("update_location_ack"));
    assert_eq!(ack.pointer("/data/success"), Some(&Value::Bool(false)));

    let mut response = awc::Client::default()
        .post(format!("{}/locations", server.url))
        .insert_header((header::AUTHORIZATION, format!("Bearer {driver_token}")))
        .send_json(&json!({"lat": 48.8566, "lng": 2.3522}))
        .await
        .expect("submit request");
    assert_eq!(response.status().as_u16(), 201);
    let stored: Value = response.json().await.expect("stored body");
    assert_eq!(
        stored.get("address").and_then(Value::as_str),
        Some(ws_support::RIVOLI)
    );

    for socket in [&mut follower, &mut dashboard] {
        let event = next_event(socket).await;
        assert_eq!(event_name(&event), Some("location_updated"));
        assert_eq!(event.pointer("/data/userId").and_then(Value::as_i64), Some(driver_id));
        assert_eq!(event.pointer("/data/location/id"), stored.get("id"));
        assert!(
            next_event_within(socket, Duration::from_millis(200))
                .await
                .is_none(),
            "exactly one delivery per channel"
        );
    }
    assert_eq!(stack.hub.open_channels(), 2);
}

#[rstest]
#[actix_rt::test]
async fn socket_submission_is_acknowledged_and_persisted() {
    let stack = ws_support::stack();
    let server = running(&stack);
    let (driver_id, driver_token) = register(&server.url, "van@fleet.test").await;
    let mut socket = connect(&server.url, &driver_token).await;

    send(
        &mut socket,
        json!({
            "event": "update_location",
            "data": {"userId": driver_id, "location": {"lat": 48.8566, "lng": 2.3522, "speed": 12.126}}
        }),
    )
    .await;
    let mut events = vec![next_event(&mut socket).await, next_event(&mut socket).await];
    events.sort_by(|a, b| event_name(a).cmp(&event_name(b)));

    let names: Vec<Option<&str>> = events.iter().map(event_name).collect();
    assert_eq!(names, vec![Some("location_updated"), Some("update_location_ack")]);
    let ack = events.last().expect("ack");
    assert_eq!(ack.pointer("/data/success"), Some(&Value::Bool(true)));
    assert_eq!(
        ack.pointer("/data/location/speed").and_then(Value::as_f64),
        Some(12.13)
    );

    let mut latest = awc::Client::default()
        .get(format!("{}/locations/latest", server.url))
        .insert_header((header::AUTHORIZATION, format!("Bearer {driver_token}")))
        .send()
        .await
        .expect("latest request");
    let body: Value = latest.json().await.expect("latest body");
    assert_eq!(body.get("id"), ack.pointer("/data/location/id"));
}

#[rstest]
#[actix_rt::test]
async fn dashboard_origin_passes_cors_preflight() {
    let stack = ws_support::stack();
    let server = running(&stack);

    let response = awc::Client::default()
        .request(actix_web::http::Method::OPTIONS, format!("{}/locations", server.url))
        .insert_header((header::ORIGIN, ws_support::ALLOWED_ORIGIN))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization"))
        .send()
        .await
        .expect("preflight request");

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some(ws_support::ALLOWED_ORIGIN)
    );
}
