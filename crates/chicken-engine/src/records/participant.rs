use super::*;
use chicken_core::*;
use std::time::SystemTime;

/// Someone in a session: the facilitator or a player.
///
/// Only players are paired and submit actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    id: ID<Self>,
    session: ID<Session>,
    name: String,
    facilitator: bool,
    joined: SystemTime,
}

impl Participant {
    pub fn player(session: ID<Session>, name: String) -> Self {
        Self {
            id: ID::default(),
            session,
            name,
            facilitator: false,
            joined: now(),
        }
    }
    pub fn facilitator(session: ID<Session>) -> Self {
        Self {
            id: ID::default(),
            session,
            name: FACILITATOR_NAME.to_string(),
            facilitator: true,
            joined: now(),
        }
    }
    pub fn load(
        id: ID<Self>,
        session: ID<Session>,
        name: String,
        facilitator: bool,
        joined: SystemTime,
    ) -> Self {
        Self {
            id,
            session,
            name,
            facilitator,
            joined,
        }
    }
    pub fn session(&self) -> ID<Session> {
        self.session
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn is_facilitator(&self) -> bool {
        self.facilitator
    }
    pub fn joined(&self) -> SystemTime {
        self.joined
    }
}

impl Unique for Participant {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Trims a display name and checks it fits in [`NAME_LIMIT`] characters.
pub fn sanitize(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty() && name.chars().count() <= NAME_LIMIT).then(|| name.to_string())
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use chicken_pg::*;

    impl Schema for Participant {
        fn name() -> &'static str {
            PARTICIPANTS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                PARTICIPANTS,
                " (
                    id              UUID PRIMARY KEY,
                    session_id      UUID NOT NULL REFERENCES ",
                SESSIONS,
                "(id) ON DELETE CASCADE,
                    name            TEXT NOT NULL,
                    facilitator     BOOLEAN NOT NULL DEFAULT FALSE,
                    joined_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_participants_session ON ",
                PARTICIPANTS,
                " (session_id);
                 CREATE UNIQUE INDEX IF NOT EXISTS idx_participants_facilitator ON ",
                PARTICIPANTS,
                " (session_id) WHERE facilitator;"
            )
        }
    }
}
