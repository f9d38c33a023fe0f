use crate::*;
use chicken_core::*;
use chicken_game::Chicken;
use chicken_game::Matrix;
use std::sync::Arc;

/// Entry point for every operation on sessions and rounds.
///
/// Each operation runs as one unit of work on the [`Store`]. Events are
/// handed to the [`Notifier`] only after their unit commits. The
/// coordinator holds no per-session state of its own, so any number of
/// them may share a store.
pub struct Coordinator<S> {
    store: S,
    matrix: Arc<dyn Matrix>,
    notifier: Arc<dyn Notifier>,
}

impl<S: Store> Coordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            matrix: Arc::new(Chicken),
            notifier: Arc::new(Silent),
        }
    }
    pub fn with_matrix(mut self, matrix: Arc<dyn Matrix>) -> Self {
        self.matrix = matrix;
        self
    }
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
    pub fn store(&self) -> &S {
        &self.store
    }
    pub(crate) fn matrix(&self) -> &dyn Matrix {
        self.matrix.as_ref()
    }

    /// Hands committed events to the notifier.
    pub(crate) fn announce(&self, settled: Settled) -> Session {
        settled
            .events
            .iter()
            .for_each(|event| self.notifier.notify(event));
        settled.session
    }

    pub async fn session(&self, id: ID<Session>) -> Result<Session, Error> {
        self.store
            .begin()
            .await?
            .session(id)
            .await?
            .ok_or(Error::SessionNotFound(id))
    }
    /// Resolves a join code, ignoring case and surrounding whitespace.
    pub async fn session_by_code(&self, code: &str) -> Result<Session, Error> {
        let code = chicken_game::code::normalize(code);
        self.store
            .begin()
            .await?
            .session_by_code(&code)
            .await?
            .ok_or(Error::CodeNotFound(code))
    }
    pub async fn participants(&self, session: ID<Session>) -> Result<Vec<Participant>, Error> {
        let mut unit = self.store.begin().await?;
        unit.session(session)
            .await?
            .ok_or(Error::SessionNotFound(session))?;
        Ok(unit.participants(session).await?)
    }
    pub async fn participant(
        &self,
        session: ID<Session>,
        id: ID<Participant>,
    ) -> Result<Participant, Error> {
        self.participants(session)
            .await?
            .into_iter()
            .find(|p| p.id() == id)
            .ok_or(Error::ParticipantNotFound(id))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chicken_game::Choice;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    /// Chicken payoffs that count how often they are consulted.
    #[derive(Default)]
    pub struct Counting(pub AtomicUsize);

    impl Matrix for Counting {
        fn payoffs(&self, a: Choice, b: Choice) -> (Score, Score) {
            self.0.fetch_add(1, Ordering::SeqCst);
            Chicken.payoffs(a, b)
        }
    }

    /// Remembers every announced event.
    #[derive(Default)]
    pub struct Recorder(pub Mutex<Vec<Event>>);

    impl Notifier for Recorder {
        fn notify(&self, event: &Event) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    impl Recorder {
        pub fn kinds(&self) -> Vec<EventKind> {
            self.0.lock().unwrap().iter().map(Event::kind).collect()
        }
    }

    pub type Game = Coordinator<MemoryStore>;

    /// An active session with `n` players and round 1 open.
    pub async fn playing(game: &Game, n: usize) -> (Session, Vec<Participant>, Round) {
        let (session, _) = game.create().await.unwrap();
        let mut players = Vec::new();
        for i in 0..n {
            players.push(
                game.join(session.id(), &format!("player {}", i))
                    .await
                    .unwrap(),
            );
        }
        let (session, round) = game.activate_with_first_round(session.id()).await.unwrap();
        (session, players, round)
    }
}
