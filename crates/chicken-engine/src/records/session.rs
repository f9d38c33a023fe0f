use super::*;
use chicken_core::*;
use serde::Deserialize;
use serde::Serialize;
use std::time::SystemTime;

/// Lifecycle of a session. See [`crate::Machine`] for legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Accepting joins.
    Open,
    /// Rounds are being played.
    Active,
    /// Terminal.
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Active => "ACTIVE",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SessionStatus {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "OPEN" => Ok(Self::Open),
            "ACTIVE" => Ok(Self::Active),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(format!("unknown session status: {}", s)),
        }
    }
}

/// One classroom game.
///
/// Besides its lifecycle the session row carries two counters: `version`,
/// bumped once per committed mutation, and `seq`, the last event sequence
/// number handed out. Both only move while the row is locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: ID<Self>,
    code: String,
    status: SessionStatus,
    round: RoundNumber,
    version: Version,
    seq: Seq,
    created: SystemTime,
    updated: SystemTime,
}

impl Session {
    pub fn new(code: String) -> Self {
        let at = now();
        Self {
            id: ID::default(),
            code,
            status: SessionStatus::Open,
            round: 0,
            version: 0,
            seq: 0,
            created: at,
            updated: at,
        }
    }
    #[allow(clippy::too_many_arguments)]
    pub fn load(
        id: ID<Self>,
        code: String,
        status: SessionStatus,
        round: RoundNumber,
        version: Version,
        seq: Seq,
        created: SystemTime,
        updated: SystemTime,
    ) -> Self {
        Self {
            id,
            code,
            status,
            round,
            version,
            seq,
            created,
            updated,
        }
    }
    pub fn code(&self) -> &str {
        &self.code
    }
    pub fn status(&self) -> SessionStatus {
        self.status
    }
    /// Number of the latest round started, zero before the first.
    pub fn round(&self) -> RoundNumber {
        self.round
    }
    pub fn version(&self) -> Version {
        self.version
    }
    pub fn seq(&self) -> Seq {
        self.seq
    }
    pub fn created(&self) -> SystemTime {
        self.created
    }
    pub fn updated(&self) -> SystemTime {
        self.updated
    }
    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }
    pub(crate) fn advance_round(&mut self) -> RoundNumber {
        self.round += 1;
        self.round
    }
    pub(crate) fn bump(&mut self) -> Version {
        self.version += 1;
        self.updated = now();
        self.version
    }
    pub(crate) fn next_seq(&mut self) -> Seq {
        self.seq += 1;
        self.seq
    }
}

impl Unique for Session {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use chicken_pg::*;

    impl Schema for Session {
        fn name() -> &'static str {
            SESSIONS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                SESSIONS,
                " (
                    id              UUID PRIMARY KEY,
                    code            TEXT NOT NULL UNIQUE,
                    status          TEXT NOT NULL DEFAULT 'OPEN',
                    current_round   SMALLINT NOT NULL DEFAULT 0,
                    version         BIGINT NOT NULL DEFAULT 0,
                    seq             BIGINT NOT NULL DEFAULT 0,
                    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_sessions_status ON ",
                SESSIONS,
                " (status);"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn fresh_session_is_open_at_round_zero() {
        let session = Session::new("ABCDEF".into());
        assert_eq!(session.status(), SessionStatus::Open);
        assert_eq!(session.round(), 0);
        assert_eq!(session.version(), 0);
        assert_eq!(session.seq(), 0);
    }
    #[test]
    fn counters_only_move_forward() {
        let ref mut session = Session::new("ABCDEF".into());
        assert_eq!(session.bump(), 1);
        assert_eq!(session.bump(), 2);
        assert_eq!(session.next_seq(), 1);
        assert_eq!(session.advance_round(), 1);
        assert_eq!(session.version(), 2);
    }
}
