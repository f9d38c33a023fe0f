use super::*;
use chicken_core::*;
use std::time::SystemTime;

/// A note one player sends their opponent during a message round.
///
/// At most one per (round, sender). The receiver is always the sender's
/// opponent in that round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: ID<Self>,
    session: ID<Session>,
    round: ID<Round>,
    sender: ID<Participant>,
    receiver: ID<Participant>,
    content: String,
    sent: SystemTime,
}

impl Message {
    pub fn new(
        session: ID<Session>,
        round: ID<Round>,
        sender: ID<Participant>,
        receiver: ID<Participant>,
        content: String,
    ) -> Self {
        Self {
            id: ID::default(),
            session,
            round,
            sender,
            receiver,
            content,
            sent: now(),
        }
    }
    pub fn load(
        id: ID<Self>,
        session: ID<Session>,
        round: ID<Round>,
        sender: ID<Participant>,
        receiver: ID<Participant>,
        content: String,
        sent: SystemTime,
    ) -> Self {
        Self {
            id,
            session,
            round,
            sender,
            receiver,
            content,
            sent,
        }
    }
    pub fn session(&self) -> ID<Session> {
        self.session
    }
    pub fn round(&self) -> ID<Round> {
        self.round
    }
    pub fn sender(&self) -> ID<Participant> {
        self.sender
    }
    pub fn receiver(&self) -> ID<Participant> {
        self.receiver
    }
    pub fn content(&self) -> &str {
        &self.content
    }
    pub fn sent(&self) -> SystemTime {
        self.sent
    }
}

impl Unique for Message {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Trims message text and checks it fits in [`MESSAGE_LIMIT`] characters.
pub fn compose(content: &str) -> Option<String> {
    let content = content.trim();
    (!content.is_empty() && content.chars().count() <= MESSAGE_LIMIT)
        .then(|| content.to_string())
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use chicken_pg::*;

    impl Schema for Message {
        fn name() -> &'static str {
            MESSAGES
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                MESSAGES,
                " (
                    id              UUID PRIMARY KEY,
                    session_id      UUID NOT NULL REFERENCES ",
                SESSIONS,
                "(id) ON DELETE CASCADE,
                    round_id        UUID NOT NULL REFERENCES ",
                ROUNDS,
                "(id) ON DELETE CASCADE,
                    sender_id       UUID NOT NULL REFERENCES ",
                PARTICIPANTS,
                "(id) ON DELETE CASCADE,
                    receiver_id     UUID NOT NULL REFERENCES ",
                PARTICIPANTS,
                "(id) ON DELETE CASCADE,
                    content         TEXT NOT NULL,
                    sent_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    UNIQUE (round_id, sender_id)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_messages_receiver ON ",
                MESSAGES,
                " (round_id, receiver_id);"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn content_is_trimmed_and_bounded() {
        assert_eq!(compose("  swerve? "), Some("swerve?".to_string()));
        assert_eq!(compose(" \n "), None);
        assert!(compose(&"y".repeat(MESSAGE_LIMIT)).is_some());
        assert_eq!(compose(&"y".repeat(MESSAGE_LIMIT + 1)), None);
    }
}
