//! Uplink frame decoding

use crate::{CodecError, Result};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Uplink command codes agreed with the device firmware
pub mod code {
    pub const ACCELERATION_MONITOR: u8 = 0x05;
    pub const TIME_SYNC: u8 = 0x06;
    pub const MANUAL_ALARM: u8 = 0x07;
    pub const ACCIDENT_ALARM: u8 = 0x08;
    pub const HEARTBEAT: u8 = 0x09;
}

/// Command carried in the first byte of an uplink payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    AccelerationMonitor,
    TimeSync,
    ManualAlarm,
    AccidentAlarm,
    Heartbeat,
    /// Any code this system does not interpret
    Unrecognized(u8),
}

impl CommandCode {
    pub fn as_u8(self) -> u8 {
        match self {
            CommandCode::AccelerationMonitor => code::ACCELERATION_MONITOR,
            CommandCode::TimeSync => code::TIME_SYNC,
            CommandCode::ManualAlarm => code::MANUAL_ALARM,
            CommandCode::AccidentAlarm => code::ACCIDENT_ALARM,
            CommandCode::Heartbeat => code::HEARTBEAT,
            CommandCode::Unrecognized(c) => c,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandCode::AccelerationMonitor => "acceleration-monitor",
            CommandCode::TimeSync => "time-sync",
            CommandCode::ManualAlarm => "manual-alarm",
            CommandCode::AccidentAlarm => "accident-alarm",
            CommandCode::Heartbeat => "heartbeat",
            CommandCode::Unrecognized(_) => "unrecognized",
        }
    }
}

impl From<u8> for CommandCode {
    fn from(byte: u8) -> Self {
        match byte {
            code::ACCELERATION_MONITOR => CommandCode::AccelerationMonitor,
            code::TIME_SYNC => CommandCode::TimeSync,
            code::MANUAL_ALARM => CommandCode::ManualAlarm,
            code::ACCIDENT_ALARM => CommandCode::AccidentAlarm,
            code::HEARTBEAT => CommandCode::Heartbeat,
            other => CommandCode::Unrecognized(other),
        }
    }
}

impl std::fmt::Display for CommandCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.as_u8())
    }
}

/// Device block of a network-server uplink event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub dev_eui: String,
}

/// Network-server uplink event envelope
///
/// Unknown fields (rx metadata, fCnt, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkEnvelope {
    pub device_info: DeviceInfo,
    /// Base64 encoded application payload
    #[serde(default)]
    pub data: String,
}

/// A decoded uplink payload from one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkFrame {
    pub device_id: String,
    pub payload: Bytes,
}

impl UplinkFrame {
    /// Build a frame from raw bytes; the payload must carry a command byte
    pub fn new(device_id: impl Into<String>, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(CodecError::EmptyPayload);
        }
        Ok(Self {
            device_id: device_id.into(),
            payload,
        })
    }

    /// Decode a standard-alphabet base64 payload
    pub fn from_base64(device_id: impl Into<String>, data: &str) -> Result<Self> {
        let bytes = general_purpose::STANDARD.decode(data)?;
        Self::new(device_id, bytes)
    }

    pub fn from_envelope(envelope: &UplinkEnvelope) -> Result<Self> {
        Self::from_base64(envelope.device_info.dev_eui.clone(), &envelope.data)
    }

    pub fn command(&self) -> CommandCode {
        CommandCode::from(self.payload[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_mapping() {
        assert_eq!(CommandCode::from(0x05), CommandCode::AccelerationMonitor);
        assert_eq!(CommandCode::from(0x09), CommandCode::Heartbeat);
        assert_eq!(CommandCode::from(0x42), CommandCode::Unrecognized(0x42));
        for byte in 0..=u8::MAX {
            assert_eq!(CommandCode::from(byte).as_u8(), byte);
        }
    }

    #[test]
    fn test_from_base64() {
        // 0x06 0x01
        let frame = UplinkFrame::from_base64("a1b2", "BgE=").unwrap();
        assert_eq!(frame.device_id, "a1b2");
        assert_eq!(frame.command(), CommandCode::TimeSync);
        assert_eq!(frame.payload.as_ref(), &[0x06, 0x01]);
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert_eq!(
            UplinkFrame::from_base64("a1b2", ""),
            Err(CodecError::EmptyPayload)
        );
    }

    #[test]
    fn test_bad_base64_rejected() {
        assert!(matches!(
            UplinkFrame::from_base64("a1b2", "not base64!"),
            Err(CodecError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(CommandCode::Heartbeat.to_string(), "heartbeat (0x09)");
        assert_eq!(
            CommandCode::Unrecognized(0xAB).to_string(),
            "unrecognized (0xab)"
        );
    }
}
