//! Uplink command registry and dispatcher

use std::sync::Arc;

use chrono::FixedOffset;
use stakelink_core::{CommandCode, UplinkFrame};
use tracing::{debug, error, warn};

use crate::handlers::{
    AccelerationMonitor, AlarmForwarder, HeartbeatForwarder, TimeSyncResponder, UplinkHandler,
};
use crate::traits::{DeviceQueue, StatusSink, WarnType};

/// One handler per interpreted command code, fixed after construction
pub struct CommandRegistry {
    acceleration_monitor: Arc<dyn UplinkHandler>,
    time_sync: Arc<dyn UplinkHandler>,
    manual_alarm: Arc<dyn UplinkHandler>,
    accident_alarm: Arc<dyn UplinkHandler>,
    heartbeat: Arc<dyn UplinkHandler>,
}

impl CommandRegistry {
    pub fn new(
        acceleration_monitor: Arc<dyn UplinkHandler>,
        time_sync: Arc<dyn UplinkHandler>,
        manual_alarm: Arc<dyn UplinkHandler>,
        accident_alarm: Arc<dyn UplinkHandler>,
        heartbeat: Arc<dyn UplinkHandler>,
    ) -> Self {
        Self {
            acceleration_monitor,
            time_sync,
            manual_alarm,
            accident_alarm,
            heartbeat,
        }
    }

    /// The production handler set
    pub fn standard(
        queue: Arc<dyn DeviceQueue>,
        status: Arc<dyn StatusSink>,
        time_offset: FixedOffset,
    ) -> Self {
        Self::new(
            Arc::new(AccelerationMonitor),
            Arc::new(TimeSyncResponder::new(queue, time_offset)),
            Arc::new(AlarmForwarder::new(status.clone(), WarnType::Manual)),
            Arc::new(AlarmForwarder::new(status.clone(), WarnType::Accident)),
            Arc::new(HeartbeatForwarder::new(status)),
        )
    }

    pub fn handler(&self, code: CommandCode) -> Option<&Arc<dyn UplinkHandler>> {
        match code {
            CommandCode::AccelerationMonitor => Some(&self.acceleration_monitor),
            CommandCode::TimeSync => Some(&self.time_sync),
            CommandCode::ManualAlarm => Some(&self.manual_alarm),
            CommandCode::AccidentAlarm => Some(&self.accident_alarm),
            CommandCode::Heartbeat => Some(&self.heartbeat),
            CommandCode::Unrecognized(_) => None,
        }
    }
}

/// What happened to a dispatched frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled(CommandCode),
    Unrecognized(u8),
    Failed { code: CommandCode, error: String },
}

/// Routes uplink frames by their command byte
///
/// Dispatch never fails from the device's point of view; handler errors are
/// logged and reported in the outcome only.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub async fn dispatch(&self, frame: &UplinkFrame) -> DispatchOutcome {
        let code = frame.command();
        let Some(handler) = self.registry.handler(code) else {
            warn!(
                dev_eui = %frame.device_id,
                code = code.as_u8(),
                "unknown command code, ignoring"
            );
            return DispatchOutcome::Unrecognized(code.as_u8());
        };

        debug!(dev_eui = %frame.device_id, "dispatching {}", code);
        match handler.handle(frame).await {
            Ok(()) => DispatchOutcome::Handled(code),
            Err(e) => {
                error!(dev_eui = %frame.device_id, "{} handler failed: {}", code, e);
                DispatchOutcome::Failed {
                    code,
                    error: e.to_string(),
                }
            }
        }
    }
}
