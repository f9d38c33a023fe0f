use super::*;
use chicken_core::*;
use serde::Deserialize;
use serde::Serialize;
use std::time::SystemTime;

/// Kinds of entries in the session event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SessionCreated,
    PlayerJoined,
    SessionStateChanged,
    SessionActivated,
    SessionEnded,
    RoundCreated,
    ActionSubmitted,
    RoundStateChanged,
    RoundCalculated,
    RoundPublished,
    MessageSent,
    IndicatorsAssigned,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionCreated => "SESSION_CREATED",
            Self::PlayerJoined => "PLAYER_JOINED",
            Self::SessionStateChanged => "SESSION_STATE_CHANGED",
            Self::SessionActivated => "SESSION_ACTIVATED",
            Self::SessionEnded => "SESSION_ENDED",
            Self::RoundCreated => "ROUND_CREATED",
            Self::ActionSubmitted => "ACTION_SUBMITTED",
            Self::RoundStateChanged => "ROUND_STATE_CHANGED",
            Self::RoundCalculated => "ROUND_CALCULATED",
            Self::RoundPublished => "ROUND_PUBLISHED",
            Self::MessageSent => "MESSAGE_SENT",
            Self::IndicatorsAssigned => "INDICATORS_ASSIGNED",
        }
    }
    const ALL: [Self; 12] = [
        Self::SessionCreated,
        Self::PlayerJoined,
        Self::SessionStateChanged,
        Self::SessionActivated,
        Self::SessionEnded,
        Self::RoundCreated,
        Self::ActionSubmitted,
        Self::RoundStateChanged,
        Self::RoundCalculated,
        Self::RoundPublished,
        Self::MessageSent,
        Self::IndicatorsAssigned,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EventKind {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event kind: {}", s))
    }
}

/// Append-only audit entry. Never updated or deleted on its own.
///
/// `seq` is unique and strictly increasing within its session, so a client
/// can resume a tail with "everything after the last seq I saw".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    seq: Seq,
    session: ID<Session>,
    kind: EventKind,
    payload: serde_json::Value,
    #[serde(serialize_with = "serialize_millis")]
    at: SystemTime,
}

impl Event {
    pub fn new(
        seq: Seq,
        session: ID<Session>,
        kind: EventKind,
        payload: serde_json::Value,
        at: SystemTime,
    ) -> Self {
        Self {
            seq,
            session,
            kind,
            payload,
            at,
        }
    }
    pub fn seq(&self) -> Seq {
        self.seq
    }
    pub fn session(&self) -> ID<Session> {
        self.session
    }
    pub fn kind(&self) -> EventKind {
        self.kind
    }
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
    pub fn at(&self) -> SystemTime {
        self.at
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use chicken_pg::*;

    impl Schema for Event {
        fn name() -> &'static str {
            EVENTS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                EVENTS,
                " (
                    session_id      UUID NOT NULL REFERENCES ",
                SESSIONS,
                "(id) ON DELETE CASCADE,
                    seq             BIGINT NOT NULL,
                    kind            TEXT NOT NULL,
                    payload         JSONB NOT NULL DEFAULT '{}'::jsonb,
                    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    PRIMARY KEY (session_id, seq)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_events_kind ON ",
                EVENTS,
                " (session_id, kind);"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn kinds_roundtrip_through_strings() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::try_from(kind.as_str()), Ok(kind));
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.as_str())
            );
        }
    }
    #[test]
    fn events_serialize_with_epoch_millis() {
        let at = std::time::UNIX_EPOCH + std::time::Duration::from_millis(1500);
        let event = Event::new(
            7,
            ID::default(),
            EventKind::RoundPublished,
            serde_json::json!({ "skipped": true }),
            at,
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["seq"], 7);
        assert_eq!(json["kind"], "ROUND_PUBLISHED");
        assert_eq!(json["at"], 1500);
        assert_eq!(json["payload"]["skipped"], true);
    }
}
