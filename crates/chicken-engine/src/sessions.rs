use crate::*;
use chicken_core::*;
use serde_json::json;

impl<S: Store> Coordinator<S> {
    /// Creates an open session with a fresh join code and its facilitator.
    pub async fn create(&self) -> Result<(Session, Participant), Error> {
        for _ in 0..CODE_ATTEMPTS {
            let code = chicken_game::code::generate(&mut rand::rng());
            let session = Session::new(code);
            let mut unit = self.store().begin().await?;
            match unit.insert_session(&session).await {
                Ok(()) => {}
                Err(StoreError::Conflict) => {
                    log::debug!("[session {}] code collision, redrawing", session.code());
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            let host = Participant::facilitator(session.id());
            unit.insert_participant(&host).await?;
            let mut ledger = Ledger::fresh(session);
            ledger.record(
                EventKind::SessionCreated,
                json!({
                    "code": ledger.session().code(),
                    "facilitator_id": host.id(),
                }),
            );
            let session = self.announce(ledger.settle(unit).await?);
            log::info!("[session {}] created", session.code());
            return Ok((session, host));
        }
        Err(Error::CodeExhausted)
    }

    /// Adds a player to an open session.
    pub async fn join(&self, session: ID<Session>, name: &str) -> Result<Participant, Error> {
        let name = sanitize(name).ok_or(Error::InvalidName)?;
        let mut unit = self.store().begin().await?;
        let mut ledger = Ledger::open(&mut unit, session).await?;
        match ledger.session().status() {
            SessionStatus::Open => {}
            status => return Err(Error::NotAccepting { status }),
        }
        let player = Participant::player(session, name);
        unit.insert_participant(&player).await?;
        ledger.record(
            EventKind::PlayerJoined,
            json!({
                "player_id": player.id(),
                "name": player.name(),
            }),
        );
        let session = self.announce(ledger.settle(unit).await?);
        log::info!("[session {}] {} joined", session.code(), player.name());
        Ok(player)
    }

    /// Adds a player to the open session that `code` names.
    pub async fn join_by_code(&self, code: &str, name: &str) -> Result<Participant, Error> {
        let session = self.session_by_code(code).await?;
        self.join(session.id(), name).await
    }

    /// Closes joining and starts play. Needs an even roster of at least two.
    pub async fn activate(&self, id: ID<Session>) -> Result<Session, Error> {
        let mut unit = self.store().begin().await?;
        let mut ledger = Ledger::open(&mut unit, id).await?;
        self.activation(&mut unit, &mut ledger).await?;
        Ok(self.announce(ledger.settle(unit).await?))
    }

    /// Activates and opens round 1 as a single unit of work.
    pub async fn activate_with_first_round(
        &self,
        id: ID<Session>,
    ) -> Result<(Session, Round), Error> {
        let mut unit = self.store().begin().await?;
        let mut ledger = Ledger::open(&mut unit, id).await?;
        self.activation(&mut unit, &mut ledger).await?;
        let round = self.open_round(&mut unit, &mut ledger).await?;
        Ok((self.announce(ledger.settle(unit).await?), round))
    }

    async fn activation<U: Unit>(&self, unit: &mut U, ledger: &mut Ledger) -> Result<(), Error> {
        ledger.session().status().check(SessionStatus::Active)?;
        let count = unit
            .participants(ledger.session().id())
            .await?
            .iter()
            .filter(|p| !p.is_facilitator())
            .count();
        chicken_game::validate(count).map_err(|_| Error::InvalidPlayerCount { count })?;
        ledger.advance(SessionStatus::Active)?;
        ledger.record(EventKind::SessionActivated, json!({ "players": count }));
        Ok(())
    }

    /// Closes an active session. Its history stays readable.
    pub async fn end(&self, id: ID<Session>) -> Result<Session, Error> {
        let mut unit = self.store().begin().await?;
        let mut ledger = Ledger::open(&mut unit, id).await?;
        ledger.advance(SessionStatus::Closed)?;
        let played = ledger.session().round();
        ledger.record(EventKind::SessionEnded, json!({ "rounds_played": played }));
        Ok(self.announce(ledger.settle(unit).await?))
    }

    /// Removes a session with all of its participants, rounds, and events.
    pub async fn delete(&self, id: ID<Session>) -> Result<(), Error> {
        let mut unit = self.store().begin().await?;
        match unit.delete_session(id).await? {
            true => {
                unit.commit().await?;
                log::info!("[session {}] deleted", id);
                Ok(())
            }
            false => Err(Error::SessionNotFound(id)),
        }
    }
}
