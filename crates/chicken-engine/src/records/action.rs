use super::*;
use chicken_core::*;
use chicken_game::Choice;
use std::time::SystemTime;

/// A player's committed choice for one round.
/// Composite key: (round_id, player_id)
///
/// The choice is immutable once stored. Only the payoff is written later,
/// exactly once, during finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    round: ID<Round>,
    player: ID<Participant>,
    choice: Choice,
    payoff: Option<Score>,
    submitted: SystemTime,
}

impl Action {
    pub fn new(round: ID<Round>, player: ID<Participant>, choice: Choice) -> Self {
        Self {
            round,
            player,
            choice,
            payoff: None,
            submitted: now(),
        }
    }
    pub fn load(
        round: ID<Round>,
        player: ID<Participant>,
        choice: Choice,
        payoff: Option<Score>,
        submitted: SystemTime,
    ) -> Self {
        Self {
            round,
            player,
            choice,
            payoff,
            submitted,
        }
    }
    pub fn round(&self) -> ID<Round> {
        self.round
    }
    pub fn player(&self) -> ID<Participant> {
        self.player
    }
    pub fn choice(&self) -> Choice {
        self.choice
    }
    pub fn payoff(&self) -> Option<Score> {
        self.payoff
    }
    pub fn submitted(&self) -> SystemTime {
        self.submitted
    }
    pub(crate) fn settle(&mut self, payoff: Score) {
        self.payoff = Some(payoff);
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use chicken_pg::*;

    impl Schema for Action {
        fn name() -> &'static str {
            ACTIONS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                ACTIONS,
                " (
                    round_id        UUID NOT NULL REFERENCES ",
                ROUNDS,
                "(id) ON DELETE CASCADE,
                    player_id       UUID NOT NULL REFERENCES ",
                PARTICIPANTS,
                "(id) ON DELETE CASCADE,
                    choice          TEXT NOT NULL,
                    payoff          INTEGER,
                    submitted_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    PRIMARY KEY (round_id, player_id)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_actions_player ON ",
                ACTIONS,
                " (player_id);"
            )
        }
    }
}
