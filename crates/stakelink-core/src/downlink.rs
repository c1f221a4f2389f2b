//! Downlink command payloads
//!
//! Each command kind owns a LoRaWAN application port and a fixed payload layout:
//!
//! ```text
//! ┌──────────────────────┬──────┬──────────────────────────────────────────┐
//! │ Command              │ Port │ Payload                                  │
//! ├──────────────────────┼──────┼──────────────────────────────────────────┤
//! │ time-sync reply      │  9   │ u32 BE ms since local midnight           │
//! │ set frequency        │ 10   │ frequency code                           │
//! │ set color            │ 11   │ flag                                     │
//! │ set manner           │ 12   │ flag                                     │
//! │ set level            │ 13   │ u16 BE literal level                     │
//! │ set switch           │ 14   │ flag                                     │
//! │ overall setting      │ 15   │ color, freq, level hi, level lo, manner  │
//! │ join multicast group │ 16   │ DevAddr(4) AppSKey(16) NwkSKey(16)       │
//! │ acceleration mode    │ 17   │ flag                                     │
//! │ character display    │ 18   │ flag                                     │
//! └──────────────────────┴──────┴──────────────────────────────────────────┘
//! ```

use crate::field::{Flag, Frequency, Level};
use crate::{CodecError, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Application port numbers
pub mod port {
    pub const TIME_SYNC: u8 = 9;
    pub const FREQUENCY: u8 = 10;
    pub const COLOR: u8 = 11;
    pub const MANNER: u8 = 12;
    pub const LEVEL: u8 = 13;
    pub const SWITCH: u8 = 14;
    pub const OVERALL: u8 = 15;
    pub const JOIN_MULTICAST: u8 = 16;
    pub const ACCELERATION_MODE: u8 = 17;
    pub const CHARACTER: u8 = 18;
}

pub const DEV_ADDR_LEN: usize = 4;
pub const SESSION_KEY_LEN: usize = 16;

/// Total size of a multicast-join payload
pub const JOIN_PAYLOAD_LEN: usize = DEV_ADDR_LEN + 2 * SESSION_KEY_LEN;

/// Multicast session credentials pushed to a single device
///
/// The keys are forwarded as-is; nothing here checks them cryptographically.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub dev_addr: [u8; DEV_ADDR_LEN],
    pub app_s_key: [u8; SESSION_KEY_LEN],
    pub nwk_s_key: [u8; SESSION_KEY_LEN],
}

impl SessionCredentials {
    /// Parse credentials from hex strings of exactly 8, 32 and 32 characters
    pub fn from_hex(dev_addr: &str, app_s_key: &str, nwk_s_key: &str) -> Result<Self> {
        Ok(Self {
            dev_addr: decode_hex_field("devAddr", dev_addr)?,
            app_s_key: decode_hex_field("appSKey", app_s_key)?,
            nwk_s_key: decode_hex_field("nwkSKey", nwk_s_key)?,
        })
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("dev_addr", &hex::encode(self.dev_addr))
            .finish_non_exhaustive()
    }
}

fn decode_hex_field<const N: usize>(field: &'static str, input: &str) -> Result<[u8; N]> {
    let invalid = CodecError::InvalidHex {
        field,
        expected: N * 2,
    };
    if input.len() != N * 2 {
        return Err(invalid);
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(input, &mut out).map_err(|_| invalid)?;
    Ok(out)
}

/// An outbound command ready to be encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownlinkCommand {
    SetColor(Flag),
    SetFrequency(Frequency),
    SetLevel(Level),
    SetManner(Flag),
    SetSwitch(Flag),
    OverallSetting {
        color: Flag,
        frequency: Frequency,
        level: Level,
        manner: Flag,
    },
    JoinMulticastGroup(SessionCredentials),
    SetAccelerationMode(Flag),
    SetCharacter(Flag),
    /// Milliseconds since local midnight
    TimeSync(u32),
}

impl DownlinkCommand {
    /// Application port this command is sent on
    pub fn port(&self) -> u8 {
        match self {
            DownlinkCommand::SetColor(_) => port::COLOR,
            DownlinkCommand::SetFrequency(_) => port::FREQUENCY,
            DownlinkCommand::SetLevel(_) => port::LEVEL,
            DownlinkCommand::SetManner(_) => port::MANNER,
            DownlinkCommand::SetSwitch(_) => port::SWITCH,
            DownlinkCommand::OverallSetting { .. } => port::OVERALL,
            DownlinkCommand::JoinMulticastGroup(_) => port::JOIN_MULTICAST,
            DownlinkCommand::SetAccelerationMode(_) => port::ACCELERATION_MODE,
            DownlinkCommand::SetCharacter(_) => port::CHARACTER,
            DownlinkCommand::TimeSync(_) => port::TIME_SYNC,
        }
    }

    /// Short name used in logs and API responses
    pub fn kind(&self) -> &'static str {
        match self {
            DownlinkCommand::SetColor(_) => "set-color",
            DownlinkCommand::SetFrequency(_) => "set-frequency",
            DownlinkCommand::SetLevel(_) => "set-level",
            DownlinkCommand::SetManner(_) => "set-manner",
            DownlinkCommand::SetSwitch(_) => "set-switch",
            DownlinkCommand::OverallSetting { .. } => "overall-setting",
            DownlinkCommand::JoinMulticastGroup(_) => "set-multicast-group",
            DownlinkCommand::SetAccelerationMode(_) => "set-acceleration-mode",
            DownlinkCommand::SetCharacter(_) => "set-character",
            DownlinkCommand::TimeSync(_) => "time-sync",
        }
    }

    /// Encoded payload length in bytes
    pub fn payload_len(&self) -> usize {
        match self {
            DownlinkCommand::SetLevel(_) => 2,
            DownlinkCommand::OverallSetting { .. } => 5,
            DownlinkCommand::JoinMulticastGroup(_) => JOIN_PAYLOAD_LEN,
            DownlinkCommand::TimeSync(_) => 4,
            _ => 1,
        }
    }

    /// Encode the payload bytes
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.payload_len());
        match self {
            DownlinkCommand::SetColor(flag)
            | DownlinkCommand::SetManner(flag)
            | DownlinkCommand::SetSwitch(flag)
            | DownlinkCommand::SetAccelerationMode(flag)
            | DownlinkCommand::SetCharacter(flag) => buf.put_u8(flag.byte()),
            DownlinkCommand::SetFrequency(frequency) => buf.put_u8(frequency.code()),
            DownlinkCommand::SetLevel(level) => buf.put_u16(level.value()),
            DownlinkCommand::OverallSetting {
                color,
                frequency,
                level,
                manner,
            } => {
                buf.put_u8(color.byte());
                buf.put_u8(frequency.code());
                buf.put_u16(level.value());
                buf.put_u8(manner.byte());
            }
            DownlinkCommand::JoinMulticastGroup(creds) => {
                buf.put_slice(&creds.dev_addr);
                buf.put_slice(&creds.app_s_key);
                buf.put_slice(&creds.nwk_s_key);
            }
            DownlinkCommand::TimeSync(ms) => buf.put_u32(*ms),
        }
        buf.freeze()
    }
}
