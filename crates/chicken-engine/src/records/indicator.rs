use super::*;
use chicken_core::*;

/// Symbol a player carries through the indicator rounds.
/// Key: player_id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    session: ID<Session>,
    player: ID<Participant>,
    symbol: String,
}

impl Indicator {
    pub fn new(session: ID<Session>, player: ID<Participant>, symbol: String) -> Self {
        Self {
            session,
            player,
            symbol,
        }
    }
    pub fn session(&self) -> ID<Session> {
        self.session
    }
    pub fn player(&self) -> ID<Participant> {
        self.player
    }
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use chicken_pg::*;

    impl Schema for Indicator {
        fn name() -> &'static str {
            INDICATORS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                INDICATORS,
                " (
                    player_id       UUID PRIMARY KEY REFERENCES ",
                PARTICIPANTS,
                "(id) ON DELETE CASCADE,
                    session_id      UUID NOT NULL REFERENCES ",
                SESSIONS,
                "(id) ON DELETE CASCADE,
                    symbol          TEXT NOT NULL
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_indicators_session ON ",
                INDICATORS,
                " (session_id);"
            )
        }
    }
}
