//! Common test helpers for stakelink tests
//!
//! - Recording fakes for the device queue and the status server
//! - Port allocation
//! - An in-process bridge server bound to an ephemeral port

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use stakelink_bridge::{
    build_router, AppState, BridgeError, BridgeSettings, DeviceQueue, Result, StatusSink,
    WarnType,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Default multicast group used by [`TestBridge::start`]
pub const TEST_GROUP: &str = "group1";
pub const TEST_GROUP_ID: &str = "e81cd77b-f1e9-40fc-87ba-10e1fc935596";

// ============================================================================
// Port Allocation
// ============================================================================

/// Find an available TCP port for testing
pub async fn find_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

// ============================================================================
// Recording Fakes
// ============================================================================

/// One recorded enqueue call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueCall {
    Unicast {
        dev_eui: String,
        port: u8,
        confirmed: bool,
        payload: Bytes,
    },
    Multicast {
        group_id: String,
        port: u8,
        payload: Bytes,
    },
}

impl EnqueueCall {
    pub fn destination(&self) -> &str {
        match self {
            EnqueueCall::Unicast { dev_eui, .. } => dev_eui,
            EnqueueCall::Multicast { group_id, .. } => group_id,
        }
    }

    pub fn port(&self) -> u8 {
        match self {
            EnqueueCall::Unicast { port, .. } | EnqueueCall::Multicast { port, .. } => *port,
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            EnqueueCall::Unicast { payload, .. } | EnqueueCall::Multicast { payload, .. } => {
                payload
            }
        }
    }
}

/// Device queue that records every call and fails for chosen destinations
#[derive(Default)]
pub struct RecordingQueue {
    calls: Mutex<Vec<EnqueueCall>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every call addressed to `destination` fail
    pub fn fail_for(&self, destination: &str) {
        self.failing.lock().insert(destination.to_string());
    }

    pub fn calls(&self) -> Vec<EnqueueCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: EnqueueCall) -> Result<String> {
        let fail = self.failing.lock().contains(call.destination());
        let destination = call.destination().to_string();
        self.calls.lock().push(call);
        if fail {
            Err(BridgeError::Downstream(format!(
                "enqueue rejected for {}",
                destination
            )))
        } else {
            Ok(uuid::Uuid::new_v4().to_string())
        }
    }
}

#[async_trait]
impl DeviceQueue for RecordingQueue {
    async fn enqueue_unicast(
        &self,
        dev_eui: &str,
        port: u8,
        confirmed: bool,
        payload: Bytes,
    ) -> Result<String> {
        self.record(EnqueueCall::Unicast {
            dev_eui: dev_eui.to_string(),
            port,
            confirmed,
            payload,
        })
    }

    async fn enqueue_multicast(&self, group_id: &str, port: u8, payload: Bytes) -> Result<String> {
        self.record(EnqueueCall::Multicast {
            group_id: group_id.to_string(),
            port,
            payload,
        })
    }
}

/// One recorded status server call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCall {
    Warning { device_id: String, warn_type: WarnType },
    Heartbeat { device_id: String },
}

/// Status sink that records every call
#[derive(Default)]
pub struct RecordingStatusSink {
    calls: Mutex<Vec<StatusCall>>,
    fail: Mutex<bool>,
}

impl RecordingStatusSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_all(&self) {
        *self.fail.lock() = true;
    }

    pub fn calls(&self) -> Vec<StatusCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: StatusCall) -> Result<()> {
        self.calls.lock().push(call);
        if *self.fail.lock() {
            Err(BridgeError::Downstream("status server unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StatusSink for RecordingStatusSink {
    async fn send_warning(&self, device_id: &str, warn_type: WarnType) -> Result<()> {
        self.record(StatusCall::Warning {
            device_id: device_id.to_string(),
            warn_type,
        })
    }

    async fn send_heartbeat(&self, device_id: &str) -> Result<()> {
        self.record(StatusCall::Heartbeat {
            device_id: device_id.to_string(),
        })
    }
}

// ============================================================================
// In-process Bridge
// ============================================================================

/// A running bridge server wired to recording fakes
pub struct TestBridge {
    pub base_url: String,
    pub queue: Arc<RecordingQueue>,
    pub status: Arc<RecordingStatusSink>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestBridge {
    /// Start with one multicast group, [`TEST_GROUP`]
    pub async fn start() -> Self {
        let mut settings = BridgeSettings::default();
        settings
            .multicast_groups
            .insert(TEST_GROUP.to_string(), TEST_GROUP_ID.to_string());
        Self::start_with(settings).await
    }

    pub async fn start_with(settings: BridgeSettings) -> Self {
        let queue = RecordingQueue::new();
        let status = RecordingStatusSink::new();
        let state = AppState::from_settings(&settings, queue.clone(), status.clone())
            .expect("invalid test settings");
        let router = build_router(Arc::new(state), settings.http.cors_enabled);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            base_url: format!("http://{}", addr),
            queue,
            status,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
