//! Control API request and response bodies

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use stakelink_core::{DownlinkCommand, Flag, Frequency, Level, SessionCredentials};

use crate::downlink::TargetOutcome;
use crate::target::Addressing;
use crate::Result;

/// A control request body: one command or an array of them
///
/// The JSON shape picks the variant up front, so a bad field reports its own
/// error instead of a generic "no variant matched".
#[derive(Debug, Clone)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for OneOrMany<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let parsed = if value.is_array() {
            serde_json::from_value(value).map(OneOrMany::Many)
        } else {
            serde_json::from_value(value).map(OneOrMany::One)
        };
        parsed.map_err(D::Error::custom)
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// A request that names its targets and the command to send them
pub trait ControlRequest {
    fn addressing(&self) -> Addressing;

    fn command(&self) -> Result<DownlinkCommand>;
}

/// Setting fields shared by unicast and multicast endpoints
pub trait SettingFields {
    fn command(&self) -> DownlinkCommand;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorFields {
    pub color: Flag,
}

impl SettingFields for ColorFields {
    fn command(&self) -> DownlinkCommand {
        DownlinkCommand::SetColor(self.color)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrequencyFields {
    pub frequency: Frequency,
}

impl SettingFields for FrequencyFields {
    fn command(&self) -> DownlinkCommand {
        DownlinkCommand::SetFrequency(self.frequency)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelFields {
    pub level: Level,
}

impl SettingFields for LevelFields {
    fn command(&self) -> DownlinkCommand {
        DownlinkCommand::SetLevel(self.level)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MannerFields {
    pub manner: Flag,
}

impl SettingFields for MannerFields {
    fn command(&self) -> DownlinkCommand {
        DownlinkCommand::SetManner(self.manner)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchFields {
    pub switch: Flag,
}

impl SettingFields for SwitchFields {
    fn command(&self) -> DownlinkCommand {
        DownlinkCommand::SetSwitch(self.switch)
    }
}

/// Character display toggle; multicast only, carried in a `switch` field
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterFields {
    pub switch: Flag,
}

impl SettingFields for CharacterFields {
    fn command(&self) -> DownlinkCommand {
        DownlinkCommand::SetCharacter(self.switch)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverallFields {
    pub color: Flag,
    pub frequency: Frequency,
    pub level: Level,
    pub manner: Flag,
}

impl SettingFields for OverallFields {
    fn command(&self) -> DownlinkCommand {
        DownlinkCommand::OverallSetting {
            color: self.color,
            frequency: self.frequency,
            level: self.level,
            manner: self.manner,
        }
    }
}

/// `{ stakeNo, ...fields }`
#[derive(Debug, Clone, Deserialize)]
pub struct Unicast<F> {
    #[serde(rename = "stakeNo")]
    pub stake_no: String,
    #[serde(flatten)]
    pub fields: F,
}

impl<F: SettingFields> ControlRequest for Unicast<F> {
    fn addressing(&self) -> Addressing {
        Addressing::Devices(self.stake_no.clone())
    }

    fn command(&self) -> Result<DownlinkCommand> {
        Ok(self.fields.command())
    }
}

/// `{ groupId, ...fields }`
#[derive(Debug, Clone, Deserialize)]
pub struct Multicast<F> {
    #[serde(rename = "groupId")]
    pub group_id: String,
    #[serde(flatten)]
    pub fields: F,
}

impl<F: SettingFields> ControlRequest for Multicast<F> {
    fn addressing(&self) -> Addressing {
        Addressing::Group(self.group_id.clone())
    }

    fn command(&self) -> Result<DownlinkCommand> {
        Ok(self.fields.command())
    }
}

/// Pushes multicast session credentials to individual devices
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMulticastRequest {
    pub stake_no: String,
    pub dev_addr: String,
    pub app_s_key: String,
    pub nwk_s_key: String,
}

impl ControlRequest for JoinMulticastRequest {
    fn addressing(&self) -> Addressing {
        Addressing::Devices(self.stake_no.clone())
    }

    fn command(&self) -> Result<DownlinkCommand> {
        let creds = SessionCredentials::from_hex(&self.dev_addr, &self.app_s_key, &self.nwk_s_key)?;
        Ok(DownlinkCommand::JoinMulticastGroup(creds))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccelerationModeRequest {
    #[serde(rename = "devEUI")]
    pub dev_eui: String,
    pub enable: Flag,
}

impl ControlRequest for AccelerationModeRequest {
    fn addressing(&self) -> Addressing {
        Addressing::Devices(self.dev_eui.clone())
    }

    fn command(&self) -> Result<DownlinkCommand> {
        Ok(DownlinkCommand::SetAccelerationMode(self.enable))
    }
}

/// Body of every control API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TargetOutcome>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: message.into(),
            results: Vec::new(),
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            results: Vec::new(),
        }
    }

    pub fn with_outcomes(mut self, outcomes: Vec<TargetOutcome>) -> Self {
        self.results = outcomes;
        self
    }
}
