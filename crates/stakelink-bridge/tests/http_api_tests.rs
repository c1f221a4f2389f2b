//! Control API Integration Tests
//!
//! These tests drive the real HTTP server over loopback:
//! - unicast and multicast control endpoints -> device queue
//! - request validation and error mapping
//! - fan-out over comma-separated device lists
//!
//! The network server is replaced by a recording queue.

use bytes::Bytes;
use serde_json::{json, Value};
use stakelink_test_utils::{EnqueueCall, TestBridge, TEST_GROUP, TEST_GROUP_ID};

async fn post(bridge: &TestBridge, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(bridge.url(path))
        .json(&body)
        .send()
        .await
        .expect("request failed");
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("response is not JSON");
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let bridge = TestBridge::start().await;
    let response = reqwest::get(bridge.url("/health")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_set_color_unicast() {
    let bridge = TestBridge::start().await;
    let (status, body) = post(
        &bridge,
        "/api/induction-lights/set-color",
        json!({ "stakeNo": "0102030405060708", "color": 1 }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], 200);
    assert_eq!(body["results"][0]["status"], "queued");
    assert_eq!(body["results"][0]["target"], "0102030405060708");

    let calls = bridge.queue.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        EnqueueCall::Unicast {
            dev_eui: "0102030405060708".to_string(),
            port: 11,
            confirmed: false,
            payload: Bytes::from_static(&[0x01]),
        }
    );
}

#[tokio::test]
async fn test_overall_setting_payload() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(
        &bridge,
        "/api/induction-lights/overall-setting",
        json!({
            "stakeNo": "A1",
            "color": 1,
            "frequency": 60,
            "level": 2000,
            "manner": 0
        }),
    )
    .await;

    assert_eq!(status, 200);
    let calls = bridge.queue.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].port(), 15);
    assert_eq!(calls[0].payload(), &[0x01, 0x3C, 0x07, 0xD0, 0x00]);
}

#[tokio::test]
async fn test_fan_out_continues_after_failure() {
    let bridge = TestBridge::start().await;
    bridge.queue.fail_for("B");

    let (status, body) = post(
        &bridge,
        "/api/induction-lights/set-level",
        json!({ "stakeNo": "A, B ,C", "level": 4000 }),
    )
    .await;

    assert_eq!(status, 200);
    let destinations: Vec<String> = bridge
        .queue
        .calls()
        .iter()
        .map(|c| c.destination().to_string())
        .collect();
    assert_eq!(destinations, vec!["A", "B", "C"]);
    assert!(bridge
        .queue
        .calls()
        .iter()
        .all(|c| c.payload() == [0x0F, 0xA0]));

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["status"], "queued");
    assert_eq!(results[1]["status"], "failed");
    assert!(results[1]["error"].as_str().unwrap().contains("B"));
    assert_eq!(results[2]["status"], "queued");
    assert_eq!(body["message"], "set-level: 2 of 3 downlinks queued");
}

#[tokio::test]
async fn test_single_target_failure_is_server_error() {
    let bridge = TestBridge::start().await;
    bridge.queue.fail_for("A1");

    let (status, body) = post(
        &bridge,
        "/api/induction-lights/set-switch",
        json!({ "stakeNo": "A1", "switch": 0 }),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["code"], 500);
    assert_eq!(bridge.queue.call_count(), 1);
}

#[tokio::test]
async fn test_array_body() {
    let bridge = TestBridge::start().await;
    let (status, body) = post(
        &bridge,
        "/api/induction-lights/set-frequency",
        json!([
            { "stakeNo": "A1", "frequency": 30 },
            { "stakeNo": "A2", "frequency": 120 }
        ]),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    let calls = bridge.queue.calls();
    assert_eq!(calls[0].payload(), &[0x1E]);
    assert_eq!(calls[1].payload(), &[0x78]);
    assert!(calls.iter().all(|c| c.port() == 10));
}

#[tokio::test]
async fn test_invalid_entry_rejects_whole_array() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(
        &bridge,
        "/api/induction-lights/set-frequency",
        json!([
            { "stakeNo": "A1", "frequency": 30 },
            { "stakeNo": "A2", "frequency": 45 }
        ]),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(bridge.queue.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_frequency_rejected() {
    let bridge = TestBridge::start().await;
    let (status, body) = post(
        &bridge,
        "/api/multicast-groups/set-frequency",
        json!({ "groupId": TEST_GROUP, "frequency": 45 }),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["code"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("unsupported frequency: 45 Hz"));
    assert_eq!(bridge.queue.call_count(), 0);
}

#[tokio::test]
async fn test_empty_array_rejected() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(&bridge, "/api/induction-lights/set-color", json!([])).await;
    assert_eq!(status, 400);
    assert_eq!(bridge.queue.call_count(), 0);
}

#[tokio::test]
async fn test_empty_stake_no_rejected() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(
        &bridge,
        "/api/induction-lights/set-color",
        json!({ "stakeNo": " , ", "color": 1 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(bridge.queue.call_count(), 0);
}

#[tokio::test]
async fn test_multicast_set_manner() {
    let bridge = TestBridge::start().await;
    let (status, body) = post(
        &bridge,
        "/api/multicast-groups/set-manner",
        json!({ "groupId": TEST_GROUP, "manner": 1 }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["results"][0]["target"], TEST_GROUP);
    assert_eq!(
        bridge.queue.calls(),
        vec![EnqueueCall::Multicast {
            group_id: TEST_GROUP_ID.to_string(),
            port: 12,
            payload: Bytes::from_static(&[0x01]),
        }]
    );
}

#[tokio::test]
async fn test_unknown_group_rejected() {
    let bridge = TestBridge::start().await;
    let (status, body) = post(
        &bridge,
        "/api/multicast-groups/set-color",
        json!({ "groupId": "group9", "color": 1 }),
    )
    .await;

    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("group9"));
    assert_eq!(bridge.queue.call_count(), 0);
}

#[tokio::test]
async fn test_set_character_multicast() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(
        &bridge,
        "/api/multicast-groups/set-character",
        json!({ "groupId": TEST_GROUP, "switch": 1 }),
    )
    .await;

    assert_eq!(status, 200);
    let calls = bridge.queue.calls();
    assert_eq!(calls[0].port(), 18);
    assert_eq!(calls[0].payload(), &[0x01]);
}

#[tokio::test]
async fn test_acceleration_mode() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(
        &bridge,
        "/api/device/set-acceleration-mode",
        json!({ "devEUI": "0102030405060708", "enable": 0 }),
    )
    .await;

    assert_eq!(status, 200);
    let calls = bridge.queue.calls();
    assert_eq!(calls[0].port(), 17);
    assert_eq!(calls[0].payload(), &[0x00]);
}

#[tokio::test]
async fn test_join_multicast_group() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(
        &bridge,
        "/api/induction-lights/set-multicast-group",
        json!({
            "stakeNo": "A1,A2",
            "devAddr": "01020304",
            "appSKey": "11".repeat(16),
            "nwkSKey": "22".repeat(16)
        }),
    )
    .await;

    assert_eq!(status, 200);
    let calls = bridge.queue.calls();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        assert_eq!(call.port(), 16);
        let payload = call.payload();
        assert_eq!(payload.len(), 36);
        assert_eq!(&payload[..4], &[0x01, 0x02, 0x03, 0x04]);
        assert!(payload[4..20].iter().all(|b| *b == 0x11));
        assert!(payload[20..].iter().all(|b| *b == 0x22));
    }
}

#[tokio::test]
async fn test_join_multicast_bad_hex_rejected() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(
        &bridge,
        "/api/induction-lights/set-multicast-group",
        json!({
            "stakeNo": "A1",
            "devAddr": "0102030Z",
            "appSKey": "11".repeat(16),
            "nwkSKey": "22".repeat(16)
        }),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(bridge.queue.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let bridge = TestBridge::start().await;
    let response = reqwest::Client::new()
        .post(bridge.url("/api/induction-lights/set-color"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(bridge.queue.call_count(), 0);
}

#[tokio::test]
async fn test_dot_device_id_rejected() {
    let bridge = TestBridge::start().await;
    let (status, _) = post(
        &bridge,
        "/api/induction-lights/set-color",
        json!({ "stakeNo": "A,..", "color": 1 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(bridge.queue.call_count(), 0);
}
