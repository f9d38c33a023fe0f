use super::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

/// In-process [`Store`] for tests and database-less deployments.
///
/// Committed rows live in one table set behind a mutex. Each unit stages
/// its writes and replays them over committed rows for its own reads, so
/// nothing is visible to other units before commit. Row locks are
/// per-key async mutexes held by the unit until it ends.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    type Unit = MemoryUnit;
    async fn begin(&self) -> Result<Self::Unit, StoreError> {
        Ok(MemoryUnit {
            inner: self.inner.clone(),
            held: HashMap::new(),
            writes: Vec::new(),
        })
    }
}

#[derive(Default)]
struct Inner {
    tables: Mutex<Tables>,
    locks: Mutex<HashMap<Key, Arc<tokio::sync::Mutex<()>>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Session(ID<Session>),
    Code(String),
    Round(ID<Round>),
    Action(ID<Round>, ID<Participant>),
    Message(ID<Round>, ID<Participant>),
}

#[derive(Debug, Clone)]
enum Write {
    Session(Session),
    DeleteSession(ID<Session>),
    Participant(Participant),
    Round(Round),
    Pairing(Pairing),
    Action(Action),
    Message(Message),
    Indicator(Indicator),
    Event(Event),
}

#[derive(Debug, Clone, Default)]
struct Tables {
    sessions: HashMap<ID<Session>, Session>,
    participants: Vec<Participant>,
    rounds: HashMap<ID<Round>, Round>,
    pairings: Vec<Pairing>,
    actions: HashMap<(ID<Round>, ID<Participant>), Action>,
    messages: Vec<Message>,
    indicators: HashMap<ID<Participant>, Indicator>,
    events: Vec<Event>,
}

impl Tables {
    fn apply(&mut self, write: &Write) {
        match write {
            Write::Session(s) => {
                self.sessions.insert(s.id(), s.clone());
            }
            Write::DeleteSession(id) => {
                let rounds = self
                    .rounds
                    .values()
                    .filter(|r| r.session() == *id)
                    .map(|r| r.id())
                    .collect::<Vec<_>>();
                self.sessions.remove(id);
                self.participants.retain(|p| p.session() != *id);
                self.rounds.retain(|_, r| r.session() != *id);
                self.pairings.retain(|p| !rounds.contains(&p.round()));
                self.actions.retain(|(r, _), _| !rounds.contains(r));
                self.messages.retain(|m| m.session() != *id);
                self.indicators.retain(|_, i| i.session() != *id);
                self.events.retain(|e| e.session() != *id);
            }
            Write::Participant(p) => self.participants.push(p.clone()),
            Write::Round(r) => {
                self.rounds.insert(r.id(), r.clone());
            }
            Write::Pairing(p) => self.pairings.push(*p),
            Write::Action(a) => {
                self.actions.insert((a.round(), a.player()), a.clone());
            }
            Write::Message(m) => self.messages.push(m.clone()),
            Write::Indicator(i) => {
                self.indicators.insert(i.player(), i.clone());
            }
            Write::Event(e) => self.events.push(e.clone()),
        }
    }
}

/// Unit of work over a [`MemoryStore`].
pub struct MemoryUnit {
    inner: Arc<Inner>,
    held: HashMap<Key, OwnedMutexGuard<()>>,
    writes: Vec<Write>,
}

impl MemoryUnit {
    /// Runs `f` over committed rows with this unit's staged writes on top.
    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError> {
        let tables = self
            .inner
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory tables poisoned".into()))?;
        if self.writes.is_empty() {
            return Ok(f(&tables));
        }
        let mut view = tables.clone();
        drop(tables);
        self.writes.iter().for_each(|w| view.apply(w));
        Ok(f(&view))
    }
    /// Blocks until this unit holds the row lock for `key`. Reentrant.
    async fn acquire(&mut self, key: Key) -> Result<(), StoreError> {
        if self.held.contains_key(&key) {
            return Ok(());
        }
        let mutex = self
            .inner
            .locks
            .lock()
            .map_err(|_| StoreError::Unavailable("memory locks poisoned".into()))?
            .entry(key.clone())
            .or_default()
            .clone();
        let guard = mutex.lock_owned().await;
        self.held.insert(key, guard);
        Ok(())
    }
    fn stage(&mut self, write: Write) -> Result<(), StoreError> {
        self.writes.push(write);
        Ok(())
    }
}

impl Drop for MemoryUnit {
    /// Releases row locks and forgets lock entries nobody else references.
    fn drop(&mut self) {
        let keys = self.held.drain().map(|(k, _)| k).collect::<Vec<_>>();
        if let Ok(mut locks) = self.inner.locks.lock() {
            for key in keys {
                if locks.get(&key).is_some_and(|m| Arc::strong_count(m) == 1) {
                    locks.remove(&key);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Unit for MemoryUnit {
    async fn insert_session(&mut self, session: &Session) -> Result<(), StoreError> {
        self.acquire(Key::Code(session.code().to_string())).await?;
        let taken = self.read(|t| {
            t.sessions.contains_key(&session.id())
                || t.sessions.values().any(|s| s.code() == session.code())
        })?;
        match taken {
            true => Err(StoreError::Conflict),
            false => self.stage(Write::Session(session.clone())),
        }
    }
    async fn session(&mut self, id: ID<Session>) -> Result<Option<Session>, StoreError> {
        self.read(|t| t.sessions.get(&id).cloned())
    }
    async fn session_by_code(&mut self, code: &str) -> Result<Option<Session>, StoreError> {
        self.read(|t| t.sessions.values().find(|s| s.code() == code).cloned())
    }
    async fn lock_session(&mut self, id: ID<Session>) -> Result<Option<Session>, StoreError> {
        self.acquire(Key::Session(id)).await?;
        self.session(id).await
    }
    async fn update_session(&mut self, session: &Session) -> Result<(), StoreError> {
        self.stage(Write::Session(session.clone()))
    }
    async fn delete_session(&mut self, id: ID<Session>) -> Result<bool, StoreError> {
        match self.lock_session(id).await? {
            None => Ok(false),
            Some(_) => {
                self.stage(Write::DeleteSession(id))?;
                Ok(true)
            }
        }
    }

    async fn insert_participant(&mut self, participant: &Participant) -> Result<(), StoreError> {
        self.stage(Write::Participant(participant.clone()))
    }
    async fn participants(
        &mut self,
        session: ID<Session>,
    ) -> Result<Vec<Participant>, StoreError> {
        self.read(|t| {
            t.participants
                .iter()
                .filter(|p| p.session() == session)
                .cloned()
                .collect()
        })
    }

    async fn insert_round(&mut self, round: &Round) -> Result<(), StoreError> {
        let taken = self.read(|t| {
            t.rounds.contains_key(&round.id())
                || t.rounds
                    .values()
                    .any(|r| r.session() == round.session() && r.number() == round.number())
        })?;
        match taken {
            true => Err(StoreError::Conflict),
            false => self.stage(Write::Round(round.clone())),
        }
    }
    async fn round(&mut self, id: ID<Round>) -> Result<Option<Round>, StoreError> {
        self.read(|t| t.rounds.get(&id).cloned())
    }
    async fn lock_round(&mut self, id: ID<Round>) -> Result<Option<Round>, StoreError> {
        self.acquire(Key::Round(id)).await?;
        self.round(id).await
    }
    async fn round_by_number(
        &mut self,
        session: ID<Session>,
        number: RoundNumber,
    ) -> Result<Option<Round>, StoreError> {
        self.read(|t| {
            t.rounds
                .values()
                .find(|r| r.session() == session && r.number() == number)
                .cloned()
        })
    }
    async fn rounds(&mut self, session: ID<Session>) -> Result<Vec<Round>, StoreError> {
        let mut rounds = self.read(|t| {
            t.rounds
                .values()
                .filter(|r| r.session() == session)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        rounds.sort_by_key(Round::number);
        Ok(rounds)
    }
    async fn update_round(&mut self, round: &Round) -> Result<(), StoreError> {
        self.stage(Write::Round(round.clone()))
    }

    async fn insert_pairings(&mut self, pairings: &[Pairing]) -> Result<(), StoreError> {
        for pairing in pairings {
            self.stage(Write::Pairing(*pairing))?;
        }
        Ok(())
    }
    async fn pairings(&mut self, round: ID<Round>) -> Result<Vec<Pairing>, StoreError> {
        self.read(|t| {
            t.pairings
                .iter()
                .filter(|p| p.round() == round)
                .copied()
                .collect()
        })
    }

    async fn insert_action(&mut self, action: &Action) -> Result<(), StoreError> {
        let ref key = (action.round(), action.player());
        self.acquire(Key::Action(key.0, key.1)).await?;
        match self.read(|t| t.actions.contains_key(key))? {
            true => Err(StoreError::Conflict),
            false => self.stage(Write::Action(action.clone())),
        }
    }
    async fn action(
        &mut self,
        round: ID<Round>,
        player: ID<Participant>,
    ) -> Result<Option<Action>, StoreError> {
        self.read(|t| t.actions.get(&(round, player)).cloned())
    }
    async fn actions(&mut self, round: ID<Round>) -> Result<Vec<Action>, StoreError> {
        let mut actions = self.read(|t| {
            t.actions
                .values()
                .filter(|a| a.round() == round)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        actions.sort_by_key(Action::submitted);
        Ok(actions)
    }
    async fn update_action(&mut self, action: &Action) -> Result<(), StoreError> {
        self.stage(Write::Action(action.clone()))
    }

    async fn insert_message(&mut self, message: &Message) -> Result<(), StoreError> {
        self.acquire(Key::Message(message.round(), message.sender()))
            .await?;
        let taken = self.read(|t| {
            t.messages
                .iter()
                .any(|m| m.round() == message.round() && m.sender() == message.sender())
        })?;
        match taken {
            true => Err(StoreError::Conflict),
            false => self.stage(Write::Message(message.clone())),
        }
    }
    async fn messages(&mut self, round: ID<Round>) -> Result<Vec<Message>, StoreError> {
        let mut messages = self.read(|t| {
            t.messages
                .iter()
                .filter(|m| m.round() == round)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        messages.sort_by_key(Message::sent);
        Ok(messages)
    }

    async fn insert_indicators(&mut self, indicators: &[Indicator]) -> Result<(), StoreError> {
        let taken = self.read(|t| {
            indicators
                .iter()
                .any(|i| t.indicators.contains_key(&i.player()))
        })?;
        if taken {
            return Err(StoreError::Conflict);
        }
        for indicator in indicators {
            self.stage(Write::Indicator(indicator.clone()))?;
        }
        Ok(())
    }
    async fn indicators(&mut self, session: ID<Session>) -> Result<Vec<Indicator>, StoreError> {
        self.read(|t| {
            t.indicators
                .values()
                .filter(|i| i.session() == session)
                .cloned()
                .collect()
        })
    }

    async fn insert_event(&mut self, event: &Event) -> Result<(), StoreError> {
        self.stage(Write::Event(event.clone()))
    }
    async fn events(
        &mut self,
        session: ID<Session>,
        after: Seq,
        limit: i64,
    ) -> Result<Vec<Event>, StoreError> {
        let mut events = self.read(|t| {
            t.events
                .iter()
                .filter(|e| e.session() == session && e.seq() > after)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        events.sort_by_key(Event::seq);
        events.truncate(limit.max(0) as usize);
        Ok(events)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        let writes = std::mem::take(&mut self.writes);
        let mut tables = self
            .inner
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory tables poisoned".into()))?;
        writes.iter().for_each(|w| tables.apply(w));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chicken_game::Choice;
    use std::time::Duration;

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let store = MemoryStore::new();
        let session = Session::new("ABCDEF".into());
        let ref mut writer = store.begin().await.unwrap();
        writer.insert_session(&session).await.unwrap();
        assert!(writer.session(session.id()).await.unwrap().is_some());
        let ref mut reader = store.begin().await.unwrap();
        assert!(reader.session(session.id()).await.unwrap().is_none());
    }
    #[tokio::test]
    async fn dropped_unit_rolls_back() {
        let store = MemoryStore::new();
        let session = Session::new("ABCDEF".into());
        {
            let mut unit = store.begin().await.unwrap();
            unit.insert_session(&session).await.unwrap();
        }
        let mut unit = store.begin().await.unwrap();
        assert!(unit.session(session.id()).await.unwrap().is_none());
        unit.insert_session(&session).await.unwrap();
        unit.commit().await.unwrap();
        let mut unit = store.begin().await.unwrap();
        assert!(unit.session_by_code("ABCDEF").await.unwrap().is_some());
    }
    #[tokio::test]
    async fn codes_are_unique() {
        let store = MemoryStore::new();
        let mut unit = store.begin().await.unwrap();
        unit.insert_session(&Session::new("ABCDEF".into()))
            .await
            .unwrap();
        assert_eq!(
            unit.insert_session(&Session::new("ABCDEF".into())).await,
            Err(StoreError::Conflict)
        );
    }
    #[tokio::test]
    async fn duplicate_action_conflicts_after_commit() {
        let store = MemoryStore::new();
        let round = ID::default();
        let player = ID::default();
        let mut first = store.begin().await.unwrap();
        first
            .insert_action(&Action::new(round, player, Choice::Turn))
            .await
            .unwrap();
        let racer = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await.unwrap();
                second
                    .insert_action(&Action::new(round, player, Choice::Accelerate))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!racer.is_finished());
        first.commit().await.unwrap();
        assert_eq!(racer.await.unwrap(), Err(StoreError::Conflict));
        let mut unit = store.begin().await.unwrap();
        let stored = unit.action(round, player).await.unwrap().unwrap();
        assert_eq!(stored.choice(), Choice::Turn);
    }
    #[tokio::test]
    async fn racing_codes_conflict_after_commit() {
        let store = MemoryStore::new();
        let mut first = store.begin().await.unwrap();
        first
            .insert_session(&Session::new("ABCDEF".into()))
            .await
            .unwrap();
        let racer = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await.unwrap();
                second.insert_session(&Session::new("ABCDEF".into())).await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!racer.is_finished());
        first.commit().await.unwrap();
        assert_eq!(racer.await.unwrap(), Err(StoreError::Conflict));
    }
    #[tokio::test]
    async fn one_message_per_sender_per_round() {
        let store = MemoryStore::new();
        let (session, round) = (ID::default(), ID::default());
        let (a, b) = (ID::default(), ID::default());
        let mut unit = store.begin().await.unwrap();
        unit.insert_message(&Message::new(session, round, a, b, "hi".into()))
            .await
            .unwrap();
        unit.commit().await.unwrap();
        let mut unit = store.begin().await.unwrap();
        assert_eq!(
            unit.insert_message(&Message::new(session, round, a, b, "again".into()))
                .await,
            Err(StoreError::Conflict)
        );
        unit.insert_message(&Message::new(session, round, b, a, "hey".into()))
            .await
            .unwrap();
        let messages = unit.messages(round).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content(), "hi");
    }
    #[tokio::test]
    async fn session_lock_is_exclusive_and_reentrant() {
        let store = MemoryStore::new();
        let session = Session::new("ABCDEF".into());
        let mut unit = store.begin().await.unwrap();
        unit.insert_session(&session).await.unwrap();
        unit.commit().await.unwrap();
        let mut holder = store.begin().await.unwrap();
        holder.lock_session(session.id()).await.unwrap();
        holder.lock_session(session.id()).await.unwrap();
        let waiter = {
            let store = store.clone();
            let id = session.id();
            tokio::spawn(async move {
                let mut unit = store.begin().await.unwrap();
                unit.lock_session(id).await.unwrap().map(|s| s.version())
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        let ref mut updated = holder.session(session.id()).await.unwrap().unwrap();
        updated.bump();
        holder.update_session(updated).await.unwrap();
        holder.commit().await.unwrap();
        assert_eq!(waiter.await.unwrap(), Some(1));
    }
    #[tokio::test]
    async fn deleting_a_session_cascades() {
        let store = MemoryStore::new();
        let session = Session::new("ABCDEF".into());
        let round = Round::new(session.id(), 1);
        let a = Participant::player(session.id(), "a".into());
        let b = Participant::player(session.id(), "b".into());
        let mut unit = store.begin().await.unwrap();
        unit.insert_session(&session).await.unwrap();
        unit.insert_participant(&a).await.unwrap();
        unit.insert_participant(&b).await.unwrap();
        unit.insert_round(&round).await.unwrap();
        unit.insert_pairings(&[Pairing::new(round.id(), a.id(), b.id())])
            .await
            .unwrap();
        unit.insert_action(&Action::new(round.id(), a.id(), Choice::Turn))
            .await
            .unwrap();
        unit.insert_message(&Message::new(
            session.id(),
            round.id(),
            a.id(),
            b.id(),
            "hi".into(),
        ))
        .await
        .unwrap();
        unit.insert_indicators(&[Indicator::new(session.id(), a.id(), "🍋".into())])
            .await
            .unwrap();
        unit.commit().await.unwrap();
        let mut unit = store.begin().await.unwrap();
        assert!(unit.delete_session(session.id()).await.unwrap());
        unit.commit().await.unwrap();
        let mut unit = store.begin().await.unwrap();
        assert!(!unit.delete_session(session.id()).await.unwrap());
        assert!(unit.participants(session.id()).await.unwrap().is_empty());
        assert!(unit.round(round.id()).await.unwrap().is_none());
        assert!(unit.pairings(round.id()).await.unwrap().is_empty());
        assert!(unit.actions(round.id()).await.unwrap().is_empty());
        assert!(unit.messages(round.id()).await.unwrap().is_empty());
        assert!(unit.indicators(session.id()).await.unwrap().is_empty());
    }
}
