use super::{PushPayload, Pusher, SensorDataValue};
use crate::error::LuftdatenError;
use crate::sensor_type::SensorType;
use crate::test_support::{refused_url, Canned, MockApi};
use axum::http::{Method, StatusCode};
use reqwest::Client;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

const PUSH_PATH: &str = "/v1/push-sensor-data/";

fn pusher_for(api: &MockApi, sensor_type: SensorType, chip_id: &str) -> Pusher {
    Pusher::new(sensor_type, chip_id, "luftdaten-rs-test", Client::new())
        .expect("pusher")
        .with_endpoint(api.url(PUSH_PATH))
}

#[test]
fn payload_has_one_entry_per_reading() {
    let readings = BTreeMap::from([("P1", 10.5), ("P2", 5.0)]);
    let payload = PushPayload::new("1.0", readings);

    assert_eq!(
        payload.sensordatavalues,
        vec![
            SensorDataValue {
                value_type: "P1".to_string(),
                value: 10.5
            },
            SensorDataValue {
                value_type: "P2".to_string(),
                value: 5.0
            },
        ]
    );
    assert_eq!(
        serde_json::to_value(&payload).expect("encode"),
        json!({
            "software_version": "1.0",
            "sensordatavalues": [
                {"value_type": "P1", "value": 10.5},
                {"value_type": "P2", "value": 5.0}
            ]
        })
    );
}

#[test]
fn headers_carry_pin_and_chip_id() {
    let pusher = Pusher::new(SensorType::Bme280, "esp8266-12345678", "v1", Client::new())
        .expect("pusher");
    let headers = pusher.headers();

    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["x-pin"], "11");
    assert_eq!(headers["x-sensor"], "esp8266-12345678");
    assert_eq!(pusher.pin(), 11);
}

#[test]
fn invalid_chip_id_is_rejected_at_construction() {
    let err = Pusher::from_pin(1, "esp\n8266", "v1", Client::new())
        .err()
        .expect("invalid header value");
    assert!(matches!(err, LuftdatenError::InvalidHeader { .. }), "{err:?}");
}

#[tokio::test]
async fn push_posts_json_with_sensor_headers() {
    let api = MockApi::start(vec![Canned::json(r#"{"status": "ok"}"#)]).await;
    let pusher = pusher_for(&api, SensorType::Sds011, "esp8266-1");

    pusher
        .push(vec![("P1", 10.5), ("P2", 5.0)])
        .await
        .expect("push");

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, PUSH_PATH);
    assert_eq!(request.header("x-pin"), Some("1"));
    assert_eq!(request.header("x-sensor"), Some("esp8266-1"));
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(
        request.json(),
        json!({
            "software_version": "luftdaten-rs-test",
            "sensordatavalues": [
                {"value_type": "P1", "value": 10.5},
                {"value_type": "P2", "value": 5.0}
            ]
        })
    );
}

#[tokio::test]
async fn html_and_broken_json_responses_are_ignored() {
    let api = MockApi::start(vec![
        Canned::html("<html>ok</html>"),
        Canned::json("{not json"),
    ])
    .await;
    let pusher = pusher_for(&api, SensorType::Bmp180, "esp8266-2");

    pusher
        .push([("temperature", 21.0), ("pressure", 101_325.0)])
        .await
        .expect("html response");
    pusher
        .push([("temperature", 21.5)])
        .await
        .expect("undecodable json response");
    assert_eq!(api.requests().len(), 2);
}

#[tokio::test]
async fn error_status_is_logged_but_not_raised_by_default() {
    let api = MockApi::start(vec![
        Canned::json(r#"{"detail": "bad pin"}"#).with_status(StatusCode::BAD_REQUEST)
    ])
    .await;
    let pusher = pusher_for(&api, SensorType::Sds011, "esp8266-3");

    pusher.push([("P1", 1.0)]).await.expect("lenient push");
}

#[tokio::test]
async fn strict_mode_rejects_error_status() {
    let api = MockApi::start(vec![
        Canned::html("server error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
    ])
    .await;
    let pusher = pusher_for(&api, SensorType::Sds011, "esp8266-4").strict_status(true);

    let err = pusher.push([("P1", 1.0)]).await.expect_err("strict push");
    match err {
        LuftdatenError::Rejected { status } => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR)
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn push_timeout_is_connection_error() {
    let api = MockApi::start(vec![
        Canned::json("{}").delayed(Duration::from_secs(5))
    ])
    .await;
    let pusher =
        pusher_for(&api, SensorType::Pms7003, "esp8266-5").with_timeout(Duration::from_millis(100));

    let err = pusher.push([("P0", 3.0)]).await.expect_err("timeout");
    assert!(err.is_timeout(), "{err:?}");
}

#[tokio::test]
async fn push_refused_is_connection_error() {
    let pusher = Pusher::new(SensorType::Sds011, "esp8266-6", "v1", Client::new())
        .expect("pusher")
        .with_endpoint(format!("{}{PUSH_PATH}", refused_url()));

    let err = pusher.push([("P1", 1.0)]).await.expect_err("refused");
    assert!(err.is_connection(), "{err:?}");
}
