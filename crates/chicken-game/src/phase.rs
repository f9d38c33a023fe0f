use chicken_core::*;
use serde::Deserialize;
use serde::Serialize;

/// Stage of the game a round belongs to.
///
/// Message rounds let paired players exchange one note each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Normal,
    Message,
    Indicator,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Message => "MESSAGE",
            Self::Indicator => "INDICATOR",
        }
    }
}

impl From<RoundNumber> for Phase {
    fn from(number: RoundNumber) -> Self {
        if MESSAGE_ROUNDS.contains(&number) {
            Self::Message
        } else if INDICATOR_ROUNDS.contains(&number) {
            Self::Indicator
        } else {
            Self::Normal
        }
    }
}

impl TryFrom<&str> for Phase {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "NORMAL" => Ok(Self::Normal),
            "MESSAGE" => Ok(Self::Message),
            "INDICATOR" => Ok(Self::Indicator),
            _ => Err(format!("unknown phase: {}", s)),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
