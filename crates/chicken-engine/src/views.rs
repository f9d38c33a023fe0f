//! Read-only projections of a session for polling clients.
//!
//! Visibility rule: a player always sees their own choice, but payoffs and
//! the opponent's choice stay hidden until the round is published. Messages
//! and indicators are shown only to the player they belong to.
use crate::*;
use chicken_core::*;
use chicken_game::Choice;
use chicken_game::Phase;
use serde::Serialize;

/// Answer to a versioned poll. `data` is absent when nothing changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub version: Version,
    pub has_update: bool,
    pub data: Option<Snapshot>,
}

/// Everything a client renders for a session at one version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub session_id: ID<Session>,
    pub code: String,
    pub status: SessionStatus,
    pub version: Version,
    pub current_round: RoundNumber,
    pub max_rounds: RoundNumber,
    pub players: Vec<PlayerView>,
    pub round: Option<RoundView>,
    pub you: Option<SeatView>,
    pub indicators_assigned: bool,
    /// The viewer's indicator symbol, once dealt.
    pub indicator: Option<String>,
    /// What the viewer's opponent wrote in the current message round.
    pub message: Option<MessageView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageView {
    pub round_number: RoundNumber,
    pub content: String,
    pub from_player_id: ID<Participant>,
    pub from_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: ID<Participant>,
    pub name: String,
    pub facilitator: bool,
    /// Whether the player has acted in the current round.
    pub submitted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundView {
    pub id: ID<Round>,
    pub number: RoundNumber,
    pub phase: Phase,
    pub status: RoundStatus,
    pub version: Version,
    pub submitted: usize,
    pub total: usize,
    pub started_at: u64,
    pub ended_at: Option<u64>,
}

/// The viewer's own seat in the current round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatView {
    pub player_id: ID<Participant>,
    pub opponent_id: ID<Participant>,
    pub choice: Option<Choice>,
    pub payoff: Option<Score>,
    pub opponent_choice: Option<Choice>,
    pub opponent_payoff: Option<Score>,
}

/// Cumulative results over published rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub session_id: ID<Session>,
    pub code: String,
    pub status: SessionStatus,
    pub rounds_published: usize,
    pub standings: Vec<Standing>,
    pub rounds: Vec<Tally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub player_id: ID<Participant>,
    pub name: String,
    pub total: Score,
}

/// How the class split in one published round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    pub number: RoundNumber,
    pub turned: usize,
    pub accelerated: usize,
}

impl<S: Store> Coordinator<S> {
    /// Current state of a session, or just its version when the caller
    /// has already seen it. `viewer` adds that player's seat.
    pub async fn snapshot(
        &self,
        id: ID<Session>,
        since: Option<Version>,
        viewer: Option<ID<Participant>>,
    ) -> Result<Update, Error> {
        let mut unit = self.store().view().await?;
        let session = unit.session(id).await?.ok_or(Error::SessionNotFound(id))?;
        if since.is_some_and(|v| v >= session.version()) {
            return Ok(Update {
                version: session.version(),
                has_update: false,
                data: None,
            });
        }
        let participants = unit.participants(id).await?;
        if let Some(viewer) = viewer {
            if !participants.iter().any(|p| p.id() == viewer) {
                return Err(Error::ParticipantNotFound(viewer));
            }
        }
        let (round, pairings, actions, messages) =
            match unit.round_by_number(id, session.round()).await? {
                Some(round) => {
                    let pairings = unit.pairings(round.id()).await?;
                    let actions = unit.actions(round.id()).await?;
                    let messages = match round.phase() {
                        Phase::Message => unit.messages(round.id()).await?,
                        _ => Vec::new(),
                    };
                    (Some(round), pairings, actions, messages)
                }
                None => (None, Vec::new(), Vec::new(), Vec::new()),
            };
        let indicators = unit.indicators(id).await?;
        let indicator = viewer.and_then(|viewer| {
            indicators
                .iter()
                .find(|i| i.player() == viewer)
                .map(|i| i.symbol().to_string())
        });
        let message = match (viewer, round.as_ref()) {
            (Some(viewer), Some(round)) => messages
                .iter()
                .find(|m| m.receiver() == viewer)
                .map(|m| MessageView {
                    round_number: round.number(),
                    content: m.content().to_string(),
                    from_player_id: m.sender(),
                    from_name: participants
                        .iter()
                        .find(|p| p.id() == m.sender())
                        .map(|p| p.name().to_string())
                        .unwrap_or_default(),
                }),
            _ => None,
        };
        let acted = |player: ID<Participant>| actions.iter().find(|a| a.player() == player);
        let players = participants
            .iter()
            .map(|p| PlayerView {
                id: p.id(),
                name: p.name().to_string(),
                facilitator: p.is_facilitator(),
                submitted: acted(p.id()).is_some(),
            })
            .collect::<Vec<_>>();
        let you = match (viewer, round.as_ref()) {
            (Some(viewer), Some(round)) => Pairing::opponent(&pairings, viewer)
                .ok()
                .map(|opponent| {
                    let published = round.is_published();
                    let mine = acted(viewer);
                    let theirs = acted(opponent).filter(|_| published);
                    SeatView {
                        player_id: viewer,
                        opponent_id: opponent,
                        choice: mine.map(Action::choice),
                        payoff: mine.filter(|_| published).and_then(Action::payoff),
                        opponent_choice: theirs.map(Action::choice),
                        opponent_payoff: theirs.and_then(Action::payoff),
                    }
                }),
            _ => None,
        };
        let round = round.map(|r| RoundView {
            id: r.id(),
            number: r.number(),
            phase: r.phase(),
            status: r.status(),
            version: r.version(),
            submitted: Pairing::players(&pairings)
                .filter(|p| acted(*p).is_some())
                .count(),
            total: pairings.len() * 2,
            started_at: millis(r.started()),
            ended_at: r.ended().map(millis),
        });
        Ok(Update {
            version: session.version(),
            has_update: true,
            data: Some(Snapshot {
                session_id: id,
                code: session.code().to_string(),
                status: session.status(),
                version: session.version(),
                current_round: session.round(),
                max_rounds: MAX_ROUNDS,
                players,
                round,
                you,
                indicators_assigned: !indicators.is_empty(),
                indicator,
                message,
            }),
        })
    }

    /// Events after `after`, ascending by sequence number.
    pub async fn events_since(
        &self,
        id: ID<Session>,
        after: Seq,
        limit: Option<i64>,
    ) -> Result<Vec<Event>, Error> {
        let limit = limit.unwrap_or(EVENTS_LIMIT).clamp(0, EVENTS_LIMIT_MAX);
        let mut unit = self.store().view().await?;
        unit.session(id).await?.ok_or(Error::SessionNotFound(id))?;
        Ok(unit.events(id, after, limit).await?)
    }

    /// Totals per player over published rounds, best first.
    pub async fn summary(&self, id: ID<Session>) -> Result<Summary, Error> {
        let mut unit = self.store().view().await?;
        let session = unit.session(id).await?.ok_or(Error::SessionNotFound(id))?;
        let mut standings = unit
            .participants(id)
            .await?
            .into_iter()
            .filter(|p| !p.is_facilitator())
            .map(|p| Standing {
                player_id: p.id(),
                name: p.name().to_string(),
                total: 0,
            })
            .collect::<Vec<_>>();
        let mut rounds = Vec::new();
        for round in unit.rounds(id).await? {
            if !round.is_published() {
                continue;
            }
            let actions = unit.actions(round.id()).await?;
            for action in actions.iter() {
                if let Some(standing) = standings
                    .iter_mut()
                    .find(|s| s.player_id == action.player())
                {
                    standing.total += action.payoff().unwrap_or_default();
                }
            }
            let turned = actions
                .iter()
                .filter(|a| a.choice() == Choice::Turn)
                .count();
            rounds.push(Tally {
                number: round.number(),
                turned,
                accelerated: actions.len() - turned,
            });
        }
        standings.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        Ok(Summary {
            session_id: id,
            code: session.code().to_string(),
            status: session.status(),
            rounds_published: rounds.len(),
            standings,
            rounds,
        })
    }
}
