//! Event log and version counter for one locked session.
//!
//! A [`Ledger`] can only be built from a session row locked by the unit of
//! work, so every event sequence number and version bump it hands out is
//! serialized per session. Nothing it records is visible until
//! [`Ledger::settle`] commits the unit.
use crate::*;
use chicken_core::*;
use serde_json::json;

pub struct Ledger {
    session: Session,
    events: Vec<Event>,
}

/// What a settled unit of work left behind.
#[derive(Debug)]
pub struct Settled {
    pub session: Session,
    pub events: Vec<Event>,
}

impl Ledger {
    /// Locks `id` within `unit`.
    pub async fn open<U: Unit>(unit: &mut U, id: ID<Session>) -> Result<Self, Error> {
        unit.lock_session(id)
            .await?
            .map(Self::fresh)
            .ok_or(Error::SessionNotFound(id))
    }
    /// Wraps a session inserted by the same unit, so no other unit can see it yet.
    pub fn fresh(session: Session) -> Self {
        Self {
            session,
            events: Vec::new(),
        }
    }
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Appends an event with the next sequence number of the session.
    pub fn record(&mut self, kind: EventKind, payload: serde_json::Value) -> Seq {
        let seq = self.session.next_seq();
        log::debug!("[ledger {}] #{} {}", self.session.code(), seq, kind);
        self.events.push(Event::new(
            seq,
            self.session.id(),
            kind,
            payload,
            now(),
        ));
        seq
    }

    /// Moves the session to `to` if the transition table allows it.
    pub fn advance(&mut self, to: SessionStatus) -> Result<(), Error> {
        let from = self.session.status();
        from.check(to)?;
        self.session.set_status(to);
        self.record(
            EventKind::SessionStateChanged,
            json!({
                "from": from,
                "to": to,
                "timestamp": millis(now()),
            }),
        );
        log::info!("[session {}] {} -> {}", self.session.code(), from, to);
        Ok(())
    }

    /// Moves `round` to `to` if the transition table allows it.
    pub fn advance_round(&mut self, round: &mut Round, to: RoundStatus) -> Result<(), Error> {
        let from = round.status();
        from.check(to)?;
        round.set_status(to);
        self.record(
            EventKind::RoundStateChanged,
            json!({
                "round_id": round.id(),
                "round_number": round.number(),
                "from": from,
                "to": to,
                "timestamp": millis(now()),
            }),
        );
        log::info!(
            "[session {}] round {} {} -> {}",
            self.session.code(),
            round.number(),
            from,
            to
        );
        Ok(())
    }

    pub(crate) fn open_round(&mut self) -> RoundNumber {
        self.session.advance_round()
    }

    /// Bumps the version, writes the session row and its new events, and
    /// commits the unit.
    pub async fn settle<U: Unit>(mut self, mut unit: U) -> Result<Settled, Error> {
        let version = self.session.bump();
        for event in self.events.iter() {
            unit.insert_event(event).await?;
        }
        unit.update_session(&self.session).await?;
        unit.commit().await?;
        log::debug!(
            "[ledger {}] settled v{} with {} events",
            self.session.code(),
            version,
            self.events.len()
        );
        Ok(Settled {
            session: self.session,
            events: self.events,
        })
    }
}
