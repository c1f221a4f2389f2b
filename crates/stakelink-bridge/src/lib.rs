//! stakelink Bridge
//!
//! Connects induction-light controllers to a LoRaWAN network server:
//! - Uplink dispatch: network-server events routed to command handlers
//! - Control API: JSON requests encoded into device downlinks
//! - Target resolution for device lists and multicast groups
//! - Clients for the ChirpStack device queue and the alarm/heartbeat status server

pub mod api;
pub mod config;
pub mod downlink;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod target;
pub mod traits;

#[cfg(feature = "chirpstack")]
pub mod chirpstack;

#[cfg(feature = "status-server")]
pub mod status;

#[cfg(feature = "server")]
pub mod server;

pub use config::BridgeSettings;
pub use downlink::{DeliveryStatus, DownlinkSender, TargetOutcome};
pub use error::{BridgeError, Result};
pub use handlers::UplinkHandler;
pub use registry::{CommandRegistry, DispatchOutcome, Dispatcher};
pub use target::{Addressing, MulticastGroupMap, Target, TargetResolver};
pub use traits::{DeviceQueue, StatusSink, WarnType};

#[cfg(feature = "chirpstack")]
pub use chirpstack::ChirpStackQueue;

#[cfg(feature = "status-server")]
pub use status::StatusServerClient;

#[cfg(feature = "server")]
pub use server::{build_router, serve, AppState};
