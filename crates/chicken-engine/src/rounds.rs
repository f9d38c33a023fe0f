use crate::*;
use chicken_core::*;
use chicken_game::Choice;
use chicken_game::PairingError;
use serde_json::json;
use std::collections::HashMap;

/// Outcome of one finalization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalized {
    /// Some paired players have not acted yet.
    Pending { submitted: usize, total: usize },
    /// This call computed the payoffs.
    Computed,
    /// An earlier call already computed them.
    Settled,
}

impl Finalized {
    pub fn is_done(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }
}

fn shuffle(round: ID<Round>, players: &[ID<Participant>]) -> Result<Vec<Pairing>, PairingError> {
    Pairing::draw(round, players, &mut rand::rng())
}

impl<S: Store> Coordinator<S> {
    /// Opens the next round of an active session.
    ///
    /// Round 1 shuffles the roster into pairs; later rounds reuse them.
    pub async fn start_round(&self, session: ID<Session>) -> Result<Round, Error> {
        let mut unit = self.store().begin().await?;
        let mut ledger = Ledger::open(&mut unit, session).await?;
        let round = self.open_round(&mut unit, &mut ledger).await?;
        self.announce(ledger.settle(unit).await?);
        Ok(round)
    }

    pub(crate) async fn open_round<U: Unit>(
        &self,
        unit: &mut U,
        ledger: &mut Ledger,
    ) -> Result<Round, Error> {
        let id = ledger.session().id();
        let current = ledger.session().round();
        match ledger.session().status() {
            SessionStatus::Active => {}
            status => return Err(Error::NotActive { status }),
        }
        if current >= MAX_ROUNDS {
            return Err(Error::MaxRoundsReached { limit: MAX_ROUNDS });
        }
        if let Some(last) = unit.round_by_number(id, current).await? {
            if !last.is_published() {
                return Err(Error::RoundInProgress {
                    number: last.number(),
                    status: last.status(),
                });
            }
        }
        let round = Round::new(id, current + 1);
        let pairings = match round.number() {
            1 => {
                let players = unit
                    .participants(id)
                    .await?
                    .iter()
                    .filter(|p| !p.is_facilitator())
                    .map(Participant::id)
                    .collect::<Vec<_>>();
                shuffle(round.id(), &players)
            }
            _ => match unit.round_by_number(id, 1).await? {
                Some(first) => Pairing::rebind(&unit.pairings(first.id()).await?, round.id()),
                None => Err(PairingError::PairingNotFound),
            },
        }
        .map_err(|e| Error::pairing(e, round.id()))?;
        unit.insert_round(&round).await?;
        unit.insert_pairings(&pairings).await?;
        ledger.open_round();
        ledger.record(
            EventKind::RoundCreated,
            json!({
                "round_id": round.id(),
                "round_number": round.number(),
                "phase": round.phase(),
                "pairs": pairings.len(),
            }),
        );
        log::info!(
            "[session {}] round {} opened with {} pairs",
            ledger.session().code(),
            round.number(),
            pairings.len()
        );
        Ok(round)
    }

    /// Records a player's choice. Idempotent per (round, player): a repeat
    /// returns the stored action unchanged and emits nothing.
    pub async fn submit(
        &self,
        round: ID<Round>,
        player: ID<Participant>,
        choice: Choice,
    ) -> Result<Action, Error> {
        let mut unit = self.store().begin().await?;
        let current = unit.round(round).await?.ok_or(Error::RoundNotFound(round))?;
        let pairings = unit.pairings(round).await?;
        Pairing::opponent(&pairings, player).map_err(|_| Error::PairingNotFound {
            round,
            player: Some(player),
        })?;
        let action = Action::new(round, player, choice);
        match unit.insert_action(&action).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                log::debug!("[round {}] repeat submission from {}", round, player);
                return unit
                    .action(round, player)
                    .await?
                    .ok_or(Error::Storage(StoreError::Conflict));
            }
            Err(e) => return Err(e.into()),
        }
        let mut ledger = Ledger::open(&mut unit, current.session()).await?;
        let players = Pairing::players(&pairings).collect::<Vec<_>>();
        let submitted = unit
            .actions(round)
            .await?
            .iter()
            .filter(|a| players.contains(&a.player()))
            .count();
        ledger.record(
            EventKind::ActionSubmitted,
            json!({
                "round_id": round,
                "round_number": current.number(),
                "player_id": player,
                "submitted": submitted,
                "total": players.len(),
            }),
        );
        self.announce(ledger.settle(unit).await?);
        Ok(action)
    }

    /// Computes payoffs once every paired player has acted.
    ///
    /// Safe to call any number of times from any number of tasks: the
    /// round row lock and the `computed` flag make exactly one call write
    /// payoffs and emit events. Everyone else sees [`Finalized::Settled`].
    pub async fn finalize(&self, id: ID<Round>) -> Result<Finalized, Error> {
        let mut unit = self.store().begin().await?;
        let mut round = unit.lock_round(id).await?.ok_or(Error::RoundNotFound(id))?;
        if round.computed() {
            return Ok(Finalized::Settled);
        }
        let pairings = unit.pairings(id).await?;
        let mut actions = unit
            .actions(id)
            .await?
            .into_iter()
            .map(|a| (a.player(), a))
            .collect::<HashMap<_, _>>();
        let total = pairings.len() * 2;
        let submitted = Pairing::players(&pairings)
            .filter(|p| actions.contains_key(p))
            .count();
        if total == 0 || submitted < total {
            return Ok(Finalized::Pending { submitted, total });
        }
        let mut ledger = Ledger::open(&mut unit, round.session()).await?;
        ledger.advance_round(&mut round, RoundStatus::Computing)?;
        let mut payoffs = Vec::with_capacity(total);
        for pairing in pairings.iter() {
            let (Some(a), Some(b)) = (actions.remove(&pairing.a()), actions.remove(&pairing.b()))
            else {
                let reason = format!("player paired twice in round {}", id);
                return Err(StoreError::Corrupt(reason).into());
            };
            let (x, y) = self.matrix().payoffs(a.choice(), b.choice());
            for (mut action, payoff) in [(a, x), (b, y)] {
                action.settle(payoff);
                unit.update_action(&action).await?;
                payoffs.push(json!({
                    "player_id": action.player(),
                    "choice": action.choice(),
                    "payoff": payoff,
                }));
            }
        }
        round.compute();
        ledger.advance_round(&mut round, RoundStatus::ReadyToPublish)?;
        ledger.record(
            EventKind::RoundCalculated,
            json!({
                "round_id": id,
                "round_number": round.number(),
                "payoffs": payoffs,
            }),
        );
        unit.update_round(&round).await?;
        self.announce(ledger.settle(unit).await?);
        Ok(Finalized::Computed)
    }

    /// True once payoffs exist, whether this call or an earlier one computed them.
    pub async fn try_finalize(&self, id: ID<Round>) -> Result<bool, Error> {
        self.finalize(id).await.map(|f| f.is_done())
    }

    /// Reveals a computed round. Publishing twice is a no-op.
    pub async fn publish(&self, id: ID<Round>) -> Result<Round, Error> {
        self.release(id, false).await
    }

    async fn release(&self, id: ID<Round>, skipped: bool) -> Result<Round, Error> {
        let mut unit = self.store().begin().await?;
        let mut round = unit.lock_round(id).await?.ok_or(Error::RoundNotFound(id))?;
        if round.is_published() {
            return Ok(round);
        }
        let mut ledger = Ledger::open(&mut unit, round.session()).await?;
        ledger.advance_round(&mut round, RoundStatus::Published)?;
        ledger.record(
            EventKind::RoundPublished,
            json!({
                "round_id": id,
                "round_number": round.number(),
                "skipped": skipped,
            }),
        );
        unit.update_round(&round).await?;
        self.announce(ledger.settle(unit).await?);
        Ok(round)
    }

    /// Fills every missing action with `default`, then finalizes and
    /// publishes. Players who already acted keep their choice.
    pub async fn force_complete(&self, id: ID<Round>, default: Choice) -> Result<Round, Error> {
        let (pairings, acted) = {
            let mut unit = self.store().begin().await?;
            unit.round(id).await?.ok_or(Error::RoundNotFound(id))?;
            let acted = unit
                .actions(id)
                .await?
                .iter()
                .map(Action::player)
                .collect::<Vec<_>>();
            (unit.pairings(id).await?, acted)
        };
        let missing = Pairing::players(&pairings)
            .filter(|p| !acted.contains(p))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            log::warn!(
                "[round {}] forcing {} missing actions to {}",
                id,
                missing.len(),
                default
            );
        }
        for player in missing {
            self.submit(id, player, default).await?;
        }
        self.finalize(id).await?;
        self.release(id, true).await
    }

    pub async fn round(&self, id: ID<Round>) -> Result<Round, Error> {
        self.store()
            .begin()
            .await?
            .round(id)
            .await?
            .ok_or(Error::RoundNotFound(id))
    }
    pub async fn round_by_number(
        &self,
        session: ID<Session>,
        number: RoundNumber,
    ) -> Result<Round, Error> {
        self.store()
            .begin()
            .await?
            .round_by_number(session, number)
            .await?
            .ok_or(Error::RoundNumberNotFound { session, number })
    }
    /// The latest round of the session, if one was started.
    pub async fn current_round(&self, session: ID<Session>) -> Result<Option<Round>, Error> {
        let mut unit = self.store().begin().await?;
        let number = unit
            .session(session)
            .await?
            .ok_or(Error::SessionNotFound(session))?
            .round();
        Ok(unit.round_by_number(session, number).await?)
    }
    pub async fn pairings(&self, id: ID<Round>) -> Result<Vec<Pairing>, Error> {
        Ok(self.store().begin().await?.pairings(id).await?)
    }
    pub async fn opponent(
        &self,
        round: ID<Round>,
        player: ID<Participant>,
    ) -> Result<ID<Participant>, Error> {
        Pairing::opponent(&self.pairings(round).await?, player).map_err(|_| {
            Error::PairingNotFound {
                round,
                player: Some(player),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::coordinator::fixtures::*;
    use crate::*;
    use chicken_core::*;
    use chicken_game::Choice;
    use chicken_game::Matrix;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn later_rounds_reuse_first_pairs() {
        let game = Game::new(MemoryStore::new());
        let (session, players, first) = playing(&game, 6).await;
        let mut round = first.clone();
        for number in 2..=MAX_ROUNDS {
            game.force_complete(round.id(), Choice::Turn).await.unwrap();
            round = game.start_round(session.id()).await.unwrap();
            assert_eq!(round.number(), number);
            for player in players.iter().map(Participant::id) {
                assert_eq!(
                    game.opponent(first.id(), player).await.unwrap(),
                    game.opponent(round.id(), player).await.unwrap(),
                );
            }
        }
    }
    #[tokio::test]
    async fn next_round_waits_for_publish() {
        let game = Game::new(MemoryStore::new());
        let (session, _, round) = playing(&game, 2).await;
        assert_eq!(
            game.start_round(session.id()).await,
            Err(Error::RoundInProgress {
                number: 1,
                status: RoundStatus::CollectingActions
            })
        );
        game.force_complete(round.id(), Choice::Accelerate)
            .await
            .unwrap();
        assert!(game.start_round(session.id()).await.is_ok());
    }
    #[tokio::test]
    async fn eleventh_round_is_refused() {
        let game = Game::new(MemoryStore::new());
        let (session, _, mut round) = playing(&game, 2).await;
        for number in 2..=MAX_ROUNDS {
            game.force_complete(round.id(), Choice::Turn).await.unwrap();
            round = game.start_round(session.id()).await.unwrap();
            assert_eq!(round.number(), number);
        }
        game.force_complete(round.id(), Choice::Turn).await.unwrap();
        assert_eq!(
            game.start_round(session.id()).await,
            Err(Error::MaxRoundsReached { limit: MAX_ROUNDS })
        );
        let current = game.current_round(session.id()).await.unwrap().unwrap();
        assert_eq!(current.number(), MAX_ROUNDS);
        assert_eq!(game.session(session.id()).await.unwrap().round(), MAX_ROUNDS);
    }
    #[tokio::test]
    async fn rounds_need_active_session() {
        let game = Game::new(MemoryStore::new());
        let (session, _) = game.create().await.unwrap();
        assert_eq!(
            game.start_round(session.id()).await,
            Err(Error::NotActive {
                status: SessionStatus::Open
            })
        );
    }
    #[tokio::test]
    async fn repeat_submission_keeps_first_choice() {
        let recorder = Arc::new(Recorder::default());
        let game = Game::new(MemoryStore::new()).with_notifier(recorder.clone());
        let (_, players, round) = playing(&game, 2).await;
        let player = players[0].id();
        let first = game.submit(round.id(), player, Choice::Turn).await.unwrap();
        let before = recorder.kinds().len();
        let again = game
            .submit(round.id(), player, Choice::Accelerate)
            .await
            .unwrap();
        assert_eq!(again, first);
        assert_eq!(recorder.kinds().len(), before);
    }
    #[tokio::test]
    async fn strangers_cannot_submit() {
        let game = Game::new(MemoryStore::new());
        let (session, _, round) = playing(&game, 2).await;
        let host = game
            .participants(session.id())
            .await
            .unwrap()
            .into_iter()
            .find(Participant::is_facilitator)
            .unwrap();
        assert_eq!(
            game.submit(round.id(), host.id(), Choice::Turn).await,
            Err(Error::PairingNotFound {
                round: round.id(),
                player: Some(host.id())
            })
        );
        let ghost = ID::default();
        assert_eq!(
            game.submit(ghost, host.id(), Choice::Turn).await,
            Err(Error::RoundNotFound(ghost))
        );
    }
    #[tokio::test]
    async fn finalize_waits_for_every_pair() {
        let game = Game::new(MemoryStore::new());
        let (_, players, round) = playing(&game, 4).await;
        for player in players.iter().take(3) {
            game.submit(round.id(), player.id(), Choice::Turn)
                .await
                .unwrap();
        }
        assert_eq!(
            game.finalize(round.id()).await,
            Ok(Finalized::Pending {
                submitted: 3,
                total: 4
            })
        );
        assert_eq!(game.try_finalize(round.id()).await, Ok(false));
        let ghost = ID::default();
        assert_eq!(
            game.try_finalize(ghost).await,
            Err(Error::RoundNotFound(ghost))
        );
    }
    #[tokio::test]
    async fn payoffs_follow_the_matrix() {
        let game = Game::new(MemoryStore::new());
        let (_, players, round) = playing(&game, 2).await;
        let a = players[0].id();
        let b = players[1].id();
        game.submit(round.id(), a, Choice::Accelerate).await.unwrap();
        game.submit(round.id(), b, Choice::Turn).await.unwrap();
        assert_eq!(game.finalize(round.id()).await, Ok(Finalized::Computed));
        assert_eq!(game.finalize(round.id()).await, Ok(Finalized::Settled));
        let ref mut unit = game.store().begin().await.unwrap();
        assert_eq!(
            unit.action(round.id(), a).await.unwrap().unwrap().payoff(),
            Some(5)
        );
        assert_eq!(
            unit.action(round.id(), b).await.unwrap().unwrap().payoff(),
            Some(1)
        );
        let stored = unit.round(round.id()).await.unwrap().unwrap();
        assert!(stored.computed());
        assert_eq!(stored.status(), RoundStatus::ReadyToPublish);
    }
    #[tokio::test]
    async fn publish_requires_computation() {
        let game = Game::new(MemoryStore::new());
        let (_, players, round) = playing(&game, 2).await;
        assert!(matches!(
            game.publish(round.id()).await,
            Err(Error::InvalidStateTransition { entity: "round", .. })
        ));
        for player in players.iter() {
            game.submit(round.id(), player.id(), Choice::Turn)
                .await
                .unwrap();
        }
        assert!(game.try_finalize(round.id()).await.unwrap());
        let published = game.publish(round.id()).await.unwrap();
        assert!(published.is_published());
        assert!(published.ended().is_some());
        let version = game.session(published.session()).await.unwrap().version();
        let again = game.publish(round.id()).await.unwrap();
        assert_eq!(again, published);
        assert_eq!(
            game.session(published.session()).await.unwrap().version(),
            version
        );
    }
    #[tokio::test]
    async fn finalize_after_publish_recomputes_nothing() {
        let matrix = Arc::new(Counting::default());
        let recorder = Arc::new(Recorder::default());
        let game = Game::new(MemoryStore::new())
            .with_matrix(matrix.clone())
            .with_notifier(recorder.clone());
        let (session, players, round) = playing(&game, 2).await;
        for player in players.iter() {
            game.submit(round.id(), player.id(), Choice::Accelerate)
                .await
                .unwrap();
        }
        assert_eq!(game.finalize(round.id()).await, Ok(Finalized::Computed));
        game.publish(round.id()).await.unwrap();
        let events = recorder.kinds().len();
        let version = game.session(session.id()).await.unwrap().version();
        assert_eq!(game.try_finalize(round.id()).await, Ok(true));
        assert_eq!(game.finalize(round.id()).await, Ok(Finalized::Settled));
        assert_eq!(matrix.0.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.kinds().len(), events);
        assert_eq!(game.session(session.id()).await.unwrap().version(), version);
        let stored = game.round(round.id()).await.unwrap();
        assert!(stored.is_published());
    }
    #[tokio::test]
    async fn force_complete_fills_missing_with_default() {
        let recorder = Arc::new(Recorder::default());
        let game = Game::new(MemoryStore::new()).with_notifier(recorder.clone());
        let (_, players, round) = playing(&game, 4).await;
        for player in players.iter().take(3) {
            game.submit(round.id(), player.id(), Choice::Accelerate)
                .await
                .unwrap();
        }
        let round = game
            .force_complete(round.id(), Choice::default())
            .await
            .unwrap();
        assert!(round.is_published());
        let ref mut unit = game.store().begin().await.unwrap();
        let actions = unit.actions(round.id()).await.unwrap();
        assert_eq!(actions.len(), 4);
        assert!(actions.iter().all(|a| a.payoff().is_some()));
        let last = unit
            .action(round.id(), players[3].id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(last.choice(), Choice::Turn);
        let events = recorder.0.lock().unwrap().clone();
        let published = events
            .iter()
            .find(|e| e.kind() == EventKind::RoundPublished)
            .unwrap();
        assert_eq!(published.payload()["skipped"], true);
    }
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_finalize_computes_once() {
        let matrix = Arc::new(Counting::default());
        let recorder = Arc::new(Recorder::default());
        let game = Arc::new(
            Game::new(MemoryStore::new())
                .with_matrix(matrix.clone())
                .with_notifier(recorder.clone()),
        );
        let (session, players, round) = playing(&game, 4).await;
        let round = round.id();
        let submits = players
            .iter()
            .map(|p| {
                let game = game.clone();
                let player = p.id();
                tokio::spawn(async move {
                    game.submit(round, player, Choice::Turn).await.unwrap();
                    game.try_finalize(round).await.unwrap()
                })
            })
            .collect::<Vec<_>>();
        for handle in futures::future::join_all(submits).await {
            handle.unwrap();
        }
        let finals = (0..16)
            .map(|_| {
                let game = game.clone();
                tokio::spawn(async move { game.finalize(round).await })
            })
            .collect::<Vec<_>>();
        let outcomes = futures::future::join_all(finals)
            .await
            .into_iter()
            .map(|h| h.unwrap().unwrap())
            .collect::<Vec<_>>();
        assert!(outcomes.iter().all(|f| *f == Finalized::Settled));
        assert_eq!(matrix.0.load(Ordering::SeqCst), 2);
        let kinds = recorder.kinds();
        let calculated = kinds
            .iter()
            .filter(|k| **k == EventKind::RoundCalculated)
            .count();
        assert_eq!(calculated, 1);
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == EventKind::ActionSubmitted)
                .count(),
            4
        );
        let session = game.session(session.id()).await.unwrap();
        let events = game.events_since(session.id(), 0, None).await.unwrap();
        let seqs = events.iter().map(Event::seq).collect::<Vec<_>>();
        assert_eq!(seqs, (1..=session.seq()).collect::<Vec<_>>());
    }
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn mixed_submitters_never_miss_finalization() {
        for _ in 0..50 {
            let matrix = Arc::new(Counting::default());
            let game = Arc::new(Game::new(MemoryStore::new()).with_matrix(matrix.clone()));
            let (_, players, round) = playing(&game, 4).await;
            let round = round.id();
            let choices = [
                Choice::Accelerate,
                Choice::Accelerate,
                Choice::Turn,
                Choice::Turn,
            ];
            let callers = players
                .iter()
                .zip(choices)
                .map(|(p, choice)| {
                    let game = game.clone();
                    let player = p.id();
                    tokio::spawn(async move {
                        game.submit(round, player, choice).await.unwrap();
                        game.finalize(round).await.unwrap()
                    })
                })
                .collect::<Vec<_>>();
            let outcomes = futures::future::join_all(callers)
                .await
                .into_iter()
                .map(|h| h.unwrap())
                .collect::<Vec<_>>();
            let computed = outcomes
                .iter()
                .filter(|f| **f == Finalized::Computed)
                .count();
            assert_eq!(computed, 1);
            assert_eq!(matrix.0.load(Ordering::SeqCst), 2);
            let ref mut unit = game.store().begin().await.unwrap();
            let stored = unit.round(round).await.unwrap().unwrap();
            assert!(stored.computed());
            assert_eq!(stored.status(), RoundStatus::ReadyToPublish);
            for pairing in unit.pairings(round).await.unwrap() {
                let a = unit.action(round, pairing.a()).await.unwrap().unwrap();
                let b = unit.action(round, pairing.b()).await.unwrap().unwrap();
                let (x, y) = chicken_game::Chicken.payoffs(a.choice(), b.choice());
                assert_eq!((a.payoff(), b.payoff()), (Some(x), Some(y)));
            }
        }
    }
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn progress_counts_are_distinct() {
        let recorder = Arc::new(Recorder::default());
        let game = Arc::new(Game::new(MemoryStore::new()).with_notifier(recorder.clone()));
        let (_, players, round) = playing(&game, 8).await;
        let round = round.id();
        let submits = players
            .iter()
            .map(|p| {
                let game = game.clone();
                let player = p.id();
                tokio::spawn(async move { game.submit(round, player, Choice::Turn).await })
            })
            .collect::<Vec<_>>();
        for handle in futures::future::join_all(submits).await {
            handle.unwrap().unwrap();
        }
        let mut counts = recorder
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind() == EventKind::ActionSubmitted)
            .map(|e| e.payload()["submitted"].as_u64().unwrap())
            .collect::<Vec<_>>();
        counts.sort();
        assert_eq!(counts, (1..=8).collect::<Vec<u64>>());
    }
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_finalizers_split_one_computed() {
        let matrix = Arc::new(Counting::default());
        let game = Arc::new(Game::new(MemoryStore::new()).with_matrix(matrix.clone()));
        let (_, players, round) = playing(&game, 8).await;
        let round = round.id();
        for player in players.iter() {
            game.submit(round, player.id(), Choice::Accelerate)
                .await
                .unwrap();
        }
        let racers = (0..32)
            .map(|_| {
                let game = game.clone();
                tokio::spawn(async move { game.finalize(round).await })
            })
            .collect::<Vec<_>>();
        let outcomes = futures::future::join_all(racers)
            .await
            .into_iter()
            .map(|h| h.unwrap().unwrap())
            .collect::<Vec<_>>();
        let computed = outcomes
            .iter()
            .filter(|f| **f == Finalized::Computed)
            .count();
        assert_eq!(computed, 1);
        assert_eq!(outcomes.len() - computed, 31);
        assert_eq!(matrix.0.load(Ordering::SeqCst), 4);
    }
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_submissions_store_one_action() {
        let game = Arc::new(Game::new(MemoryStore::new()));
        let (_, players, round) = playing(&game, 2).await;
        let round = round.id();
        let player = players[0].id();
        let racers = (0..8)
            .map(|i| {
                let game = game.clone();
                let choice = Choice::ALL[i % 2];
                tokio::spawn(async move { game.submit(round, player, choice).await })
            })
            .collect::<Vec<_>>();
        let actions = futures::future::join_all(racers)
            .await
            .into_iter()
            .map(|h| h.unwrap().unwrap())
            .collect::<Vec<_>>();
        assert!(actions.iter().all(|a| a == &actions[0]));
        let ref mut unit = game.store().begin().await.unwrap();
        assert_eq!(unit.actions(round).await.unwrap().len(), 1);
    }
}
