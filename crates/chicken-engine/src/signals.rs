//! Messages between paired players and indicator assignment.
use crate::*;
use chicken_core::*;
use chicken_game::Phase;
use serde_json::json;

fn deal(session: ID<Session>, players: &[ID<Participant>]) -> Vec<Indicator> {
    chicken_game::deal(players, &mut rand::rng())
        .into_iter()
        .map(|(player, symbol)| Indicator::new(session, player, symbol.to_string()))
        .collect()
}

impl<S: Store> Coordinator<S> {
    /// Sends `sender`'s one message of round `number` to their opponent.
    pub async fn send_message(
        &self,
        session: ID<Session>,
        number: RoundNumber,
        sender: ID<Participant>,
        content: &str,
    ) -> Result<Message, Error> {
        if Phase::from(number) != Phase::Message {
            return Err(Error::MessageNotAllowed { number });
        }
        let content = compose(content).ok_or(Error::InvalidMessage)?;
        let mut unit = self.store().begin().await?;
        let round = unit
            .round_by_number(session, number)
            .await?
            .ok_or(Error::RoundNumberNotFound { session, number })?;
        let receiver = Pairing::opponent(&unit.pairings(round.id()).await?, sender).map_err(
            |_| Error::PairingNotFound {
                round: round.id(),
                player: Some(sender),
            },
        )?;
        let message = Message::new(session, round.id(), sender, receiver, content);
        match unit.insert_message(&message).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                return Err(Error::MessageAlreadySent {
                    round: round.id(),
                    sender,
                });
            }
            Err(e) => return Err(e.into()),
        }
        let mut ledger = Ledger::open(&mut unit, session).await?;
        ledger.record(
            EventKind::MessageSent,
            json!({
                "round_id": round.id(),
                "round_number": number,
                "sender_id": sender,
                "receiver_id": receiver,
            }),
        );
        self.announce(ledger.settle(unit).await?);
        log::info!("[round {}] message from {} to {}", round.id(), sender, receiver);
        Ok(message)
    }

    /// The message `receiver` got in round `number`.
    pub async fn message(
        &self,
        session: ID<Session>,
        number: RoundNumber,
        receiver: ID<Participant>,
    ) -> Result<Message, Error> {
        let mut unit = self.store().view().await?;
        let round = unit
            .round_by_number(session, number)
            .await?
            .ok_or(Error::RoundNumberNotFound { session, number })?;
        unit.messages(round.id())
            .await?
            .into_iter()
            .find(|m| m.receiver() == receiver)
            .ok_or(Error::MessageNotFound {
                round: round.id(),
                receiver,
            })
    }

    /// Deals an indicator symbol to every player. Allowed once per
    /// session, from round [`INDICATOR_FROM`] on.
    pub async fn assign_indicators(&self, session: ID<Session>) -> Result<Vec<Indicator>, Error> {
        let mut unit = self.store().begin().await?;
        let mut ledger = Ledger::open(&mut unit, session).await?;
        match ledger.session().status() {
            SessionStatus::Active => {}
            status => return Err(Error::NotActive { status }),
        }
        let current = ledger.session().round();
        if current < INDICATOR_FROM {
            return Err(Error::IndicatorsTooEarly { current });
        }
        if !unit.indicators(session).await?.is_empty() {
            return Err(Error::IndicatorsAlreadyAssigned);
        }
        let players = unit
            .participants(session)
            .await?
            .iter()
            .filter(|p| !p.is_facilitator())
            .map(Participant::id)
            .collect::<Vec<_>>();
        let indicators = deal(session, &players);
        unit.insert_indicators(&indicators).await?;
        ledger.record(
            EventKind::IndicatorsAssigned,
            json!({ "count": indicators.len() }),
        );
        log::info!(
            "[session {}] dealt {} indicators",
            ledger.session().code(),
            indicators.len()
        );
        self.announce(ledger.settle(unit).await?);
        Ok(indicators)
    }

    pub async fn indicator(
        &self,
        session: ID<Session>,
        player: ID<Participant>,
    ) -> Result<Indicator, Error> {
        let mut unit = self.store().view().await?;
        unit.session(session)
            .await?
            .ok_or(Error::SessionNotFound(session))?;
        unit.indicators(session)
            .await?
            .into_iter()
            .find(|i| i.player() == player)
            .ok_or(Error::IndicatorNotFound(player))
    }
}
