//! Downlink fan-out
//!
//! Sends one encoded command to every resolved target, one after another.
//! A failed target is logged and skipped; the remaining targets are still tried.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stakelink_core::DownlinkCommand;
use tracing::{error, info};

use crate::target::Target;
use crate::traits::DeviceQueue;
use crate::Result;

/// Result of enqueueing to one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Queued { id: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub target: String,
    pub command: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl TargetOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self.status, DeliveryStatus::Queued { .. })
    }
}

/// Encodes commands and hands them to the device queue
#[derive(Clone)]
pub struct DownlinkSender {
    queue: Arc<dyn DeviceQueue>,
    confirmed: bool,
}

impl DownlinkSender {
    pub fn new(queue: Arc<dyn DeviceQueue>, confirmed: bool) -> Self {
        Self { queue, confirmed }
    }

    /// Enqueue `command` for a single target
    pub async fn send_one(&self, target: &Target, command: &DownlinkCommand) -> Result<String> {
        let payload = command.encode();
        let port = command.port();
        match target {
            Target::Device(dev_eui) => {
                self.queue
                    .enqueue_unicast(dev_eui, port, self.confirmed, payload)
                    .await
            }
            Target::Group { id, .. } => self.queue.enqueue_multicast(id, port, payload).await,
        }
    }

    /// Enqueue `command` for every target, continuing past failures
    pub async fn send(&self, targets: &[Target], command: &DownlinkCommand) -> Vec<TargetOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let status = match self.send_one(target, command).await {
                Ok(id) => {
                    info!(
                        to = target.label(),
                        command = command.kind(),
                        port = command.port(),
                        id = %id,
                        "downlink queued"
                    );
                    DeliveryStatus::Queued { id }
                }
                Err(e) => {
                    error!(
                        to = target.label(),
                        command = command.kind(),
                        "downlink enqueue failed: {}",
                        e
                    );
                    DeliveryStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(TargetOutcome {
                target: target.label().to_string(),
                command: command.kind().to_string(),
                status,
            });
        }
        outcomes
    }
}
