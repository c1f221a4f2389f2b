//! Downlink target resolution

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{BridgeError, Result};

/// Symbolic multicast group name to network-server group id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MulticastGroupMap(HashMap<String, String>);

impl MulticastGroupMap {
    pub fn new(groups: HashMap<String, String>) -> Self {
        Self(groups)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MulticastGroupMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Addressing field of a control request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addressing {
    /// One device id or a comma separated list
    Devices(String),
    /// Symbolic multicast group name
    Group(String),
}

/// A concrete downlink destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Device(String),
    Group { name: String, id: String },
}

impl Target {
    /// Identifier reported back to API callers
    pub fn label(&self) -> &str {
        match self {
            Target::Device(id) => id,
            Target::Group { name, .. } => name,
        }
    }
}

/// Resolves addressing fields against the static group map
#[derive(Debug, Clone)]
pub struct TargetResolver {
    groups: Arc<MulticastGroupMap>,
}

impl TargetResolver {
    pub fn new(groups: Arc<MulticastGroupMap>) -> Self {
        Self { groups }
    }

    pub fn resolve(&self, addressing: &Addressing) -> Result<Vec<Target>> {
        match addressing {
            Addressing::Devices(field) => self.resolve_devices(field),
            Addressing::Group(name) => self.resolve_group(name).map(|t| vec![t]),
        }
    }

    /// Split a comma separated device list, preserving order
    pub fn resolve_devices(&self, field: &str) -> Result<Vec<Target>> {
        field
            .split(',')
            .map(|id| {
                let id = id.trim();
                if id.is_empty() {
                    Err(BridgeError::MalformedInput(format!(
                        "empty device identifier in '{}'",
                        field
                    )))
                } else if id == "." || id == ".." {
                    Err(BridgeError::MalformedInput(format!(
                        "invalid device identifier '{}'",
                        id
                    )))
                } else {
                    Ok(Target::Device(id.to_string()))
                }
            })
            .collect()
    }

    pub fn resolve_group(&self, name: &str) -> Result<Target> {
        self.groups
            .get(name)
            .map(|id| Target::Group {
                name: name.to_string(),
                id: id.to_string(),
            })
            .ok_or_else(|| BridgeError::UnknownGroup(name.to_string()))
    }
}
