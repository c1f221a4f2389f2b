//! Collaborator capabilities
//!
//! The dispatch engine only talks to the network server and the status server
//! through these traits.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Network-server downlink queue
#[async_trait]
pub trait DeviceQueue: Send + Sync {
    /// Enqueue a downlink for one device, returning the queue item id
    async fn enqueue_unicast(
        &self,
        dev_eui: &str,
        port: u8,
        confirmed: bool,
        payload: Bytes,
    ) -> Result<String>;

    /// Enqueue a downlink for a multicast group, returning an acknowledgement
    async fn enqueue_multicast(&self, group_id: &str, port: u8, payload: Bytes) -> Result<String>;
}

/// Alarm classes understood by the status server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarnType {
    Manual,
    Accident,
}

impl WarnType {
    pub fn code(self) -> u8 {
        match self {
            WarnType::Manual => 1,
            WarnType::Accident => 2,
        }
    }
}

/// Alarm and heartbeat sink
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn send_warning(&self, device_id: &str, warn_type: WarnType) -> Result<()>;

    async fn send_heartbeat(&self, device_id: &str) -> Result<()>;
}
