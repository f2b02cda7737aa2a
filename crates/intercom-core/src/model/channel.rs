// ── Channel identifiers ──
//
// Ports are named ("relay1", "input2"), switches are numbered (1..4).
// ChannelId covers both so entities and the registry can key on either.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a port or switch as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Numeric(u64),
    Named(String),
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Named(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for ChannelId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<u64> for ChannelId {
    fn from(n: u64) -> Self {
        Self::Numeric(n)
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        match s.parse::<u64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Named(s),
        }
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}
