use super::*;
use chicken_core::*;
use chicken_game::Phase;
use serde::Deserialize;
use serde::Serialize;
use std::time::SystemTime;

/// Lifecycle of a round. See [`crate::Machine`] for legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    CollectingActions,
    Computing,
    ReadyToPublish,
    Published,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CollectingActions => "COLLECTING_ACTIONS",
            Self::Computing => "COMPUTING",
            Self::ReadyToPublish => "READY_TO_PUBLISH",
            Self::Published => "PUBLISHED",
        }
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RoundStatus {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "COLLECTING_ACTIONS" => Ok(Self::CollectingActions),
            "COMPUTING" => Ok(Self::Computing),
            "READY_TO_PUBLISH" => Ok(Self::ReadyToPublish),
            "PUBLISHED" => Ok(Self::Published),
            _ => Err(format!("unknown round status: {}", s)),
        }
    }
}

/// One simultaneous-move round within a session.
///
/// `computed` is the exactly-once guard for payoff computation. It flips
/// once, in the same unit of work that writes every payoff of the round,
/// and never flips back. `status` is the presentation lifecycle and is
/// checked by the transition table, not by finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    id: ID<Self>,
    session: ID<Session>,
    number: RoundNumber,
    phase: Phase,
    status: RoundStatus,
    computed: bool,
    version: Version,
    started: SystemTime,
    ended: Option<SystemTime>,
}

impl Round {
    pub fn new(session: ID<Session>, number: RoundNumber) -> Self {
        Self {
            id: ID::default(),
            session,
            number,
            phase: Phase::from(number),
            status: RoundStatus::CollectingActions,
            computed: false,
            version: 0,
            started: now(),
            ended: None,
        }
    }
    #[allow(clippy::too_many_arguments)]
    pub fn load(
        id: ID<Self>,
        session: ID<Session>,
        number: RoundNumber,
        phase: Phase,
        status: RoundStatus,
        computed: bool,
        version: Version,
        started: SystemTime,
        ended: Option<SystemTime>,
    ) -> Self {
        Self {
            id,
            session,
            number,
            phase,
            status,
            computed,
            version,
            started,
            ended,
        }
    }
    pub fn session(&self) -> ID<Session> {
        self.session
    }
    pub fn number(&self) -> RoundNumber {
        self.number
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn status(&self) -> RoundStatus {
        self.status
    }
    pub fn computed(&self) -> bool {
        self.computed
    }
    /// Bumped on every status transition.
    pub fn version(&self) -> Version {
        self.version
    }
    pub fn started(&self) -> SystemTime {
        self.started
    }
    pub fn ended(&self) -> Option<SystemTime> {
        self.ended
    }
    pub fn is_published(&self) -> bool {
        self.status == RoundStatus::Published
    }
    pub(crate) fn compute(&mut self) {
        self.computed = true;
    }
    pub(crate) fn set_status(&mut self, status: RoundStatus) {
        self.status = status;
        self.version += 1;
        if status == RoundStatus::Published {
            self.ended = Some(now());
        }
    }
}

impl Unique for Round {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use chicken_pg::*;

    impl Schema for Round {
        fn name() -> &'static str {
            ROUNDS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                ROUNDS,
                " (
                    id              UUID PRIMARY KEY,
                    session_id      UUID NOT NULL REFERENCES ",
                SESSIONS,
                "(id) ON DELETE CASCADE,
                    number          SMALLINT NOT NULL,
                    phase           TEXT NOT NULL,
                    status          TEXT NOT NULL DEFAULT 'COLLECTING_ACTIONS',
                    computed        BOOLEAN NOT NULL DEFAULT FALSE,
                    version         BIGINT NOT NULL DEFAULT 0,
                    started_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    ended_at        TIMESTAMPTZ,
                    UNIQUE (session_id, number)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_rounds_session ON ",
                ROUNDS,
                " (session_id);"
            )
        }
    }
}
