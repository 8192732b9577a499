use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Notification change applied to a channel right after the account is in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostJoinAction {
    /// Suppress notifications until manually reversed.
    #[default]
    Mute,
    /// Restore default notification delivery.
    Unmute,
}

impl PostJoinAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mute => "mute",
            Self::Unmute => "unmute",
        }
    }
}

impl fmt::Display for PostJoinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the names as well as the numeric selector used at the prompt
/// (`0` mute, `1` unmute).
impl FromStr for PostJoinAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "mute" => Ok(Self::Mute),
            "1" | "unmute" => Ok(Self::Unmute),
            other => Err(Error::parse("post-join action", other)),
        }
    }
}
