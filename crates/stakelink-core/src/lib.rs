//! stakelink Core
//!
//! Wire codec for the induction-light device protocol carried over LoRaWAN.
//!
//! This crate provides:
//! - Field encodings for frequency, brightness level and on/off flags ([`field`])
//! - Downlink command payloads and their application ports ([`DownlinkCommand`])
//! - Uplink frame decoding and command-code classification ([`UplinkFrame`], [`CommandCode`])
//! - Telemetry interpretation: acceleration samples and time-sync values ([`telemetry`])

pub mod downlink;
pub mod error;
pub mod field;
pub mod telemetry;
pub mod uplink;

pub use downlink::{port, DownlinkCommand, SessionCredentials, JOIN_PAYLOAD_LEN};
pub use error::{CodecError, Result};
pub use field::{Flag, Frequency, Level};
pub use telemetry::{AccelerationSample, ACCEL_SCALE_G_PER_LSB};
pub use uplink::{code, CommandCode, UplinkEnvelope, UplinkFrame};

/// Event selector value for uplink envelopes that carry device data
pub const UPLINK_EVENT: &str = "up";
