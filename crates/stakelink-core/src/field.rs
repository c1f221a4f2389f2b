//! Field encodings
//!
//! Enumerated request values and their single- or multi-byte wire forms.
//! The typed enums reject out-of-domain values during deserialization, so a
//! command that reaches the encoder can only carry a mapped value.

use crate::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Flash frequency wire codes
pub mod freq {
    pub const HZ_30: u8 = 0x1E;
    pub const HZ_60: u8 = 0x3C;
    pub const HZ_120: u8 = 0x78;
}

/// Flash frequency in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Frequency {
    Hz30,
    Hz60,
    Hz120,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Hz30, Frequency::Hz60, Frequency::Hz120];

    pub fn hz(self) -> u16 {
        match self {
            Frequency::Hz30 => 30,
            Frequency::Hz60 => 60,
            Frequency::Hz120 => 120,
        }
    }

    /// Single-byte wire code
    pub fn code(self) -> u8 {
        match self {
            Frequency::Hz30 => freq::HZ_30,
            Frequency::Hz60 => freq::HZ_60,
            Frequency::Hz120 => freq::HZ_120,
        }
    }
}

impl TryFrom<u16> for Frequency {
    type Error = CodecError;

    fn try_from(hz: u16) -> Result<Self> {
        match hz {
            30 => Ok(Frequency::Hz30),
            60 => Ok(Frequency::Hz60),
            120 => Ok(Frequency::Hz120),
            other => Err(CodecError::InvalidFrequency(other)),
        }
    }
}

impl From<Frequency> for u16 {
    fn from(f: Frequency) -> u16 {
        f.hz()
    }
}

/// Brightness level
///
/// Encoded as the literal value in big-endian order, not as an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Level {
    L500,
    L1000,
    L2000,
    L4000,
    L7000,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::L500,
        Level::L1000,
        Level::L2000,
        Level::L4000,
        Level::L7000,
    ];

    pub fn value(self) -> u16 {
        match self {
            Level::L500 => 500,
            Level::L1000 => 1000,
            Level::L2000 => 2000,
            Level::L4000 => 4000,
            Level::L7000 => 7000,
        }
    }

    pub fn to_be_bytes(self) -> [u8; 2] {
        self.value().to_be_bytes()
    }
}

impl TryFrom<u16> for Level {
    type Error = CodecError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            500 => Ok(Level::L500),
            1000 => Ok(Level::L1000),
            2000 => Ok(Level::L2000),
            4000 => Ok(Level::L4000),
            7000 => Ok(Level::L7000),
            other => Err(CodecError::InvalidLevel(other)),
        }
    }
}

impl From<Level> for u16 {
    fn from(l: Level) -> u16 {
        l.value()
    }
}

/// Boolean-style field (color, manner, switch, acceleration enable, character)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Flag {
    Off,
    On,
}

impl Flag {
    pub fn byte(self) -> u8 {
        match self {
            Flag::Off => 0,
            Flag::On => 1,
        }
    }
}

impl TryFrom<u8> for Flag {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Flag::Off),
            1 => Ok(Flag::On),
            other => Err(CodecError::InvalidFlag(other)),
        }
    }
}

impl From<Flag> for u8 {
    fn from(f: Flag) -> u8 {
        f.byte()
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        if b {
            Flag::On
        } else {
            Flag::Off
        }
    }
}

/// Encode a raw frequency in Hz
pub fn encode_frequency(hz: u16) -> Result<u8> {
    Frequency::try_from(hz).map(Frequency::code)
}

/// Encode a raw brightness level as two big-endian bytes
pub fn encode_level(level: u16) -> Result<[u8; 2]> {
    Level::try_from(level).map(Level::to_be_bytes)
}

/// Encode a raw 0/1 flag
pub fn encode_flag(flag: u8) -> Result<u8> {
    Flag::try_from(flag).map(Flag::byte)
}

/// Combine one little-endian two's-complement axis reading
#[inline]
pub fn decode_accel_axis(low: u8, high: u8) -> i16 {
    i16::from_le_bytes([low, high])
}
