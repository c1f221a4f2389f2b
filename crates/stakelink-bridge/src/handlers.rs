//! Uplink command handlers

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use stakelink_core::{telemetry, AccelerationSample, UplinkFrame};
use tracing::info;

use crate::traits::{DeviceQueue, StatusSink, WarnType};
use crate::Result;

/// Handles one uplink command kind
#[async_trait]
pub trait UplinkHandler: Send + Sync {
    async fn handle(&self, frame: &UplinkFrame) -> Result<()>;
}

/// Logs three-axis acceleration reports
#[derive(Debug, Default)]
pub struct AccelerationMonitor;

#[async_trait]
impl UplinkHandler for AccelerationMonitor {
    async fn handle(&self, frame: &UplinkFrame) -> Result<()> {
        let sample = AccelerationSample::decode(&frame.payload)?;
        info!(
            dev_eui = %frame.device_id,
            acc_x = sample.raw[0],
            acc_y = sample.raw[1],
            acc_z = sample.raw[2],
            acc_x_g = sample.x_g(),
            acc_y_g = sample.y_g(),
            acc_z_g = sample.z_g(),
            "acceleration report"
        );
        Ok(())
    }
}

/// Replies to time-sync requests with milliseconds since local midnight
pub struct TimeSyncResponder {
    queue: Arc<dyn DeviceQueue>,
    offset: FixedOffset,
    clock: fn() -> DateTime<Utc>,
}

impl TimeSyncResponder {
    pub fn new(queue: Arc<dyn DeviceQueue>, offset: FixedOffset) -> Self {
        Self {
            queue,
            offset,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock, mainly for tests
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl UplinkHandler for TimeSyncResponder {
    async fn handle(&self, frame: &UplinkFrame) -> Result<()> {
        let reply = telemetry::time_sync_reply((self.clock)(), self.offset);
        let payload = reply.encode();
        info!(
            dev_eui = %frame.device_id,
            payload = ?payload,
            "sending time-sync reply"
        );
        let id = self
            .queue
            .enqueue_unicast(&frame.device_id, reply.port(), false, payload)
            .await?;
        info!(dev_eui = %frame.device_id, id = %id, "time-sync reply queued");
        Ok(())
    }
}

/// Forwards alarm reports to the status server
pub struct AlarmForwarder {
    status: Arc<dyn StatusSink>,
    warn_type: WarnType,
}

impl AlarmForwarder {
    pub fn new(status: Arc<dyn StatusSink>, warn_type: WarnType) -> Self {
        Self { status, warn_type }
    }
}

#[async_trait]
impl UplinkHandler for AlarmForwarder {
    async fn handle(&self, frame: &UplinkFrame) -> Result<()> {
        self.status
            .send_warning(&frame.device_id, self.warn_type)
            .await?;
        info!(
            dev_eui = %frame.device_id,
            warn_type = self.warn_type.code(),
            "alarm forwarded"
        );
        Ok(())
    }
}

/// Forwards heartbeats to the status server
pub struct HeartbeatForwarder {
    status: Arc<dyn StatusSink>,
}

impl HeartbeatForwarder {
    pub fn new(status: Arc<dyn StatusSink>) -> Self {
        Self { status }
    }
}

#[async_trait]
impl UplinkHandler for HeartbeatForwarder {
    async fn handle(&self, frame: &UplinkFrame) -> Result<()> {
        self.status.send_heartbeat(&frame.device_id).await?;
        info!(dev_eui = %frame.device_id, "heartbeat forwarded");
        Ok(())
    }
}
