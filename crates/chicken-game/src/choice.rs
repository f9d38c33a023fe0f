use serde::Deserialize;
use serde::Serialize;

/// The move a player commits to for one round.
///
/// [`Choice::Turn`] is the default, substituted for players who never submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Choice {
    /// Swerve away. Safe, but loses face against an accelerating opponent.
    #[default]
    Turn,
    /// Hold course. Wins against a swerver, crashes against another accelerator.
    Accelerate,
}

impl Choice {
    pub const ALL: [Choice; 2] = [Choice::Turn, Choice::Accelerate];
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Turn => "TURN",
            Self::Accelerate => "ACCELERATE",
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Choice {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TURN" => Ok(Self::Turn),
            "ACCELERATE" => Ok(Self::Accelerate),
            _ => Err(format!("unknown choice: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Choice::try_from("turn"), Ok(Choice::Turn));
        assert_eq!(Choice::try_from(" Accelerate "), Ok(Choice::Accelerate));
        assert!(Choice::try_from("brake").is_err());
    }
    #[test]
    fn wire_format_is_uppercase() {
        assert_eq!(
            serde_json::to_string(&Choice::Accelerate).unwrap(),
            "\"ACCELERATE\""
        );
        for choice in Choice::ALL {
            assert_eq!(Choice::try_from(choice.as_str()), Ok(choice));
        }
    }
}
