use crate::*;
use chicken_core::*;

/// Failures raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A row with the same key already exists.
    Conflict,
    /// A stored value could not be decoded.
    Corrupt(String),
    /// The backend could not serve the request.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict => write!(f, "duplicate key"),
            Self::Corrupt(msg) => write!(f, "corrupt row: {}", msg),
            Self::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors surfaced by [`crate::Coordinator`] operations.
///
/// Every variant names what went wrong in terms a facilitator can act on.
/// [`Error::Storage`] is the only one that says nothing about game rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SessionNotFound(ID<Session>),
    CodeNotFound(String),
    RoundNotFound(ID<Round>),
    RoundNumberNotFound {
        session: ID<Session>,
        number: RoundNumber,
    },
    ParticipantNotFound(ID<Participant>),
    /// The player has no pair in the round, or the first round has none to copy.
    PairingNotFound {
        round: ID<Round>,
        player: Option<ID<Participant>>,
    },
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        to: String,
        legal: Vec<String>,
    },
    InvalidPlayerCount {
        count: usize,
    },
    MaxRoundsReached {
        limit: RoundNumber,
    },
    /// Joins are only accepted while the session is open.
    NotAccepting {
        status: SessionStatus,
    },
    /// Rounds only run while the session is active.
    NotActive {
        status: SessionStatus,
    },
    /// The latest round has not been published yet.
    RoundInProgress {
        number: RoundNumber,
        status: RoundStatus,
    },
    InvalidName,
    /// Message text is blank or longer than [`MESSAGE_LIMIT`].
    InvalidMessage,
    /// Messages are only exchanged during message rounds.
    MessageNotAllowed {
        number: RoundNumber,
    },
    MessageAlreadySent {
        round: ID<Round>,
        sender: ID<Participant>,
    },
    /// Nobody sent `receiver` a message in the round.
    MessageNotFound {
        round: ID<Round>,
        receiver: ID<Participant>,
    },
    /// Indicators wait until the session reaches [`INDICATOR_FROM`].
    IndicatorsTooEarly {
        current: RoundNumber,
    },
    IndicatorsAlreadyAssigned,
    IndicatorNotFound(ID<Participant>),
    /// Every drawn code collided with an existing session.
    CodeExhausted,
    Storage(StoreError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound(_)
                | Self::CodeNotFound(_)
                | Self::RoundNotFound(_)
                | Self::RoundNumberNotFound { .. }
                | Self::ParticipantNotFound(_)
                | Self::PairingNotFound { .. }
                | Self::MessageNotFound { .. }
                | Self::IndicatorNotFound(_)
        )
    }
    pub(crate) fn transition<M: Machine>(from: M, to: M) -> Self {
        Self::InvalidStateTransition {
            entity: M::ENTITY,
            from: from.to_string(),
            to: to.to_string(),
            legal: from.targets().iter().map(|s| s.to_string()).collect(),
        }
    }
    pub(crate) fn pairing(error: chicken_game::PairingError, round: ID<Round>) -> Self {
        match error {
            chicken_game::PairingError::InvalidPlayerCount(count) => {
                Self::InvalidPlayerCount { count }
            }
            chicken_game::PairingError::PairingNotFound => Self::PairingNotFound {
                round,
                player: None,
            },
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionNotFound(id) => write!(f, "session {} not found", id),
            Self::CodeNotFound(code) => write!(f, "no session with code {}", code),
            Self::RoundNotFound(id) => write!(f, "round {} not found", id),
            Self::RoundNumberNotFound { session, number } => {
                write!(f, "session {} has no round {}", session, number)
            }
            Self::ParticipantNotFound(id) => write!(f, "participant {} not found", id),
            Self::PairingNotFound {
                round,
                player: Some(player),
            } => write!(f, "player {} is not paired in round {}", player, round),
            Self::PairingNotFound { round, player: None } => {
                write!(f, "no pairings to copy into round {}", round)
            }
            Self::InvalidStateTransition {
                entity,
                from,
                to,
                legal,
            } => write!(
                f,
                "invalid {} transition {} -> {} (legal: [{}])",
                entity,
                from,
                to,
                legal.join(", ")
            ),
            Self::InvalidPlayerCount { count } => write!(
                f,
                "need an even number of at least {} players, have {}",
                MIN_PLAYERS, count
            ),
            Self::MaxRoundsReached { limit } => {
                write!(f, "all {} rounds have been played", limit)
            }
            Self::NotAccepting { status } => {
                write!(f, "session is {} and not accepting players", status)
            }
            Self::NotActive { status } => write!(f, "session is {}, not ACTIVE", status),
            Self::RoundInProgress { number, status } => {
                write!(f, "round {} is still {}", number, status)
            }
            Self::InvalidName => write!(
                f,
                "name must be 1 to {} characters after trimming",
                NAME_LIMIT
            ),
            Self::InvalidMessage => write!(
                f,
                "message must be 1 to {} characters after trimming",
                MESSAGE_LIMIT
            ),
            Self::MessageNotAllowed { number } => write!(
                f,
                "round {} is not a message round (messages allowed in rounds {}-{})",
                number,
                MESSAGE_ROUNDS.start(),
                MESSAGE_ROUNDS.end()
            ),
            Self::MessageAlreadySent { round, sender } => {
                write!(f, "player {} already sent a message in round {}", sender, round)
            }
            Self::MessageNotFound { round, receiver } => {
                write!(f, "no message for player {} in round {}", receiver, round)
            }
            Self::IndicatorsTooEarly { current } => write!(
                f,
                "indicators are assigned from round {}, session is at round {}",
                INDICATOR_FROM, current
            ),
            Self::IndicatorsAlreadyAssigned => write!(f, "indicators already assigned"),
            Self::IndicatorNotFound(id) => write!(f, "participant {} has no indicator", id),
            Self::CodeExhausted => write!(f, "could not allocate a unique session code"),
            Self::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}
