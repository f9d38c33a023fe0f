use super::*;
use chicken_game::Choice;
use chicken_game::Phase;
use chicken_pg::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;
use tokio_postgres::Client;
use tokio_postgres::Row;
use tokio_postgres::error::SqlState;

const SESSION_COLUMNS: &str = "id, code, status, current_round, version, seq, created_at, updated_at";
const PARTICIPANT_COLUMNS: &str = "id, session_id, name, facilitator, joined_at";
const ROUND_COLUMNS: &str =
    "id, session_id, number, phase, status, computed, version, started_at, ended_at";
const PAIRING_COLUMNS: &str = "round_id, player_a, player_b";
const ACTION_COLUMNS: &str = "round_id, player_id, choice, payoff, submitted_at";
const MESSAGE_COLUMNS: &str =
    "id, session_id, round_id, sender_id, receiver_id, content, sent_at";
const INDICATOR_COLUMNS: &str = "session_id, player_id, symbol";
const EVENT_COLUMNS: &str = "seq, session_id, kind, payload, created_at";

impl From<PgErr> for StoreError {
    fn from(e: PgErr) -> Self {
        match e.code() {
            Some(code) if *code == SqlState::UNIQUE_VIOLATION => Self::Conflict,
            _ => Self::Unavailable(e.to_string()),
        }
    }
}

/// PostgreSQL-backed [`Store`].
///
/// Transactions need exclusive use of a connection, so the store keeps a
/// small pool of clients and a unit checks one out for its lifetime.
/// Row locks are `SELECT ... FOR UPDATE`.
pub struct PgStore {
    pool: Vec<Arc<Mutex<Client>>>,
    next: AtomicUsize,
}

impl PgStore {
    /// Opens `size` connections to `url`.
    pub async fn connect(url: &str, size: usize) -> Result<Self, PgErr> {
        let mut pool = Vec::with_capacity(size.max(1));
        for _ in 0..size.max(1) {
            pool.push(Arc::new(Mutex::new(chicken_pg::connect(url).await?)));
        }
        log::info!("[pg] opened {} connections", pool.len());
        Ok(Self {
            pool,
            next: AtomicUsize::new(0),
        })
    }
    /// Creates every table and index that does not exist yet.
    pub async fn migrate(&self) -> Result<(), PgErr> {
        let client = self.pool[0].lock().await;
        for (name, ddl) in [
            (<Session as Schema>::name(), Session::migrates()),
            (<Participant as Schema>::name(), Participant::migrates()),
            (<Round as Schema>::name(), Round::migrates()),
            (<Pairing as Schema>::name(), Pairing::migrates()),
            (<Action as Schema>::name(), Action::migrates()),
            (<Message as Schema>::name(), Message::migrates()),
            (<Indicator as Schema>::name(), Indicator::migrates()),
            (<Event as Schema>::name(), Event::migrates()),
        ] {
            log::debug!("[pg] migrating {}", name);
            client.batch_execute(&ddl).await?;
        }
        Ok(())
    }
    /// Prefers an idle connection, else queues on the next in rotation.
    async fn checkout(&self) -> OwnedMutexGuard<Client> {
        let start = self.next.fetch_add(1, Ordering::Relaxed);
        let n = self.pool.len();
        for i in 0..n {
            if let Ok(guard) = self.pool[(start + i) % n].clone().try_lock_owned() {
                return guard;
            }
        }
        self.pool[start % n].clone().lock_owned().await
    }
    async fn open(&self, statement: &str) -> Result<PgUnit, StoreError> {
        let client = self.checkout().await;
        client.batch_execute(statement).await?;
        Ok(PgUnit {
            client: Some(client),
        })
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    type Unit = PgUnit;
    async fn begin(&self) -> Result<Self::Unit, StoreError> {
        self.open("BEGIN").await
    }
    async fn view(&self) -> Result<Self::Unit, StoreError> {
        self.open("BEGIN ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .await
    }
}

/// One open transaction on a checked-out connection.
pub struct PgUnit {
    client: Option<OwnedMutexGuard<Client>>,
}

impl PgUnit {
    fn client(&self) -> &Client {
        self.client.as_deref().expect("unit used after commit")
    }
}

impl Drop for PgUnit {
    /// Rolls back an uncommitted transaction before the connection is reused.
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = client.batch_execute("ROLLBACK").await {
                            log::warn!("[pg] rollback failed: {}", e);
                        }
                    });
                }
                Err(_) => log::warn!("[pg] unit dropped outside runtime, rollback skipped"),
            }
        }
    }
}

fn corrupt(e: String) -> StoreError {
    StoreError::Corrupt(e)
}

fn session(row: &Row) -> Result<Session, StoreError> {
    Ok(Session::load(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        row.get::<_, String>(1),
        SessionStatus::try_from(row.get::<_, &str>(2)).map_err(corrupt)?,
        row.get::<_, i16>(3),
        row.get::<_, i64>(4),
        row.get::<_, i64>(5),
        row.get::<_, SystemTime>(6),
        row.get::<_, SystemTime>(7),
    ))
}

fn participant(row: &Row) -> Participant {
    Participant::load(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        ID::from(row.get::<_, uuid::Uuid>(1)),
        row.get::<_, String>(2),
        row.get::<_, bool>(3),
        row.get::<_, SystemTime>(4),
    )
}

fn round(row: &Row) -> Result<Round, StoreError> {
    Ok(Round::load(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        ID::from(row.get::<_, uuid::Uuid>(1)),
        row.get::<_, i16>(2),
        Phase::try_from(row.get::<_, &str>(3)).map_err(corrupt)?,
        RoundStatus::try_from(row.get::<_, &str>(4)).map_err(corrupt)?,
        row.get::<_, bool>(5),
        row.get::<_, i64>(6),
        row.get::<_, SystemTime>(7),
        row.get::<_, Option<SystemTime>>(8),
    ))
}

fn pairing(row: &Row) -> Pairing {
    Pairing::new(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        ID::from(row.get::<_, uuid::Uuid>(1)),
        ID::from(row.get::<_, uuid::Uuid>(2)),
    )
}

fn action(row: &Row) -> Result<Action, StoreError> {
    Ok(Action::load(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        ID::from(row.get::<_, uuid::Uuid>(1)),
        Choice::try_from(row.get::<_, &str>(2)).map_err(corrupt)?,
        row.get::<_, Option<i32>>(3),
        row.get::<_, SystemTime>(4),
    ))
}

fn message(row: &Row) -> Message {
    Message::load(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        ID::from(row.get::<_, uuid::Uuid>(1)),
        ID::from(row.get::<_, uuid::Uuid>(2)),
        ID::from(row.get::<_, uuid::Uuid>(3)),
        ID::from(row.get::<_, uuid::Uuid>(4)),
        row.get::<_, String>(5),
        row.get::<_, SystemTime>(6),
    )
}

fn indicator(row: &Row) -> Indicator {
    Indicator::new(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        ID::from(row.get::<_, uuid::Uuid>(1)),
        row.get::<_, String>(2),
    )
}

fn event(row: &Row) -> Result<Event, StoreError> {
    Ok(Event::new(
        row.get::<_, i64>(0),
        ID::from(row.get::<_, uuid::Uuid>(1)),
        EventKind::try_from(row.get::<_, &str>(2)).map_err(corrupt)?,
        row.get::<_, serde_json::Value>(3),
        row.get::<_, SystemTime>(4),
    ))
}

#[async_trait::async_trait]
impl Unit for PgUnit {
    async fn insert_session(&mut self, session: &Session) -> Result<(), StoreError> {
        let inserted = self
            .client()
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    SESSIONS,
                    " (",
                    SESSION_COLUMNS,
                    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT DO NOTHING"
                ),
                &[
                    &session.id().inner(),
                    &session.code(),
                    &session.status().as_str(),
                    &session.round(),
                    &session.version(),
                    &session.seq(),
                    &session.created(),
                    &session.updated(),
                ],
            )
            .await?;
        match inserted {
            0 => Err(StoreError::Conflict),
            _ => Ok(()),
        }
    }
    async fn session(&mut self, id: ID<Session>) -> Result<Option<Session>, StoreError> {
        self.client()
            .query_opt(
                const_format::concatcp!(
                    "SELECT ",
                    SESSION_COLUMNS,
                    " FROM ",
                    SESSIONS,
                    " WHERE id = $1"
                ),
                &[&id.inner()],
            )
            .await?
            .as_ref()
            .map(session)
            .transpose()
    }
    async fn session_by_code(&mut self, code: &str) -> Result<Option<Session>, StoreError> {
        self.client()
            .query_opt(
                const_format::concatcp!(
                    "SELECT ",
                    SESSION_COLUMNS,
                    " FROM ",
                    SESSIONS,
                    " WHERE code = $1"
                ),
                &[&code],
            )
            .await?
            .as_ref()
            .map(session)
            .transpose()
    }
    async fn lock_session(&mut self, id: ID<Session>) -> Result<Option<Session>, StoreError> {
        self.client()
            .query_opt(
                const_format::concatcp!(
                    "SELECT ",
                    SESSION_COLUMNS,
                    " FROM ",
                    SESSIONS,
                    " WHERE id = $1 FOR UPDATE"
                ),
                &[&id.inner()],
            )
            .await?
            .as_ref()
            .map(session)
            .transpose()
    }
    async fn update_session(&mut self, session: &Session) -> Result<(), StoreError> {
        self.client()
            .execute(
                const_format::concatcp!(
                    "UPDATE ",
                    SESSIONS,
                    " SET status = $2, current_round = $3, version = $4, seq = $5, updated_at = $6 WHERE id = $1"
                ),
                &[
                    &session.id().inner(),
                    &session.status().as_str(),
                    &session.round(),
                    &session.version(),
                    &session.seq(),
                    &session.updated(),
                ],
            )
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
    async fn delete_session(&mut self, id: ID<Session>) -> Result<bool, StoreError> {
        self.client()
            .execute(
                const_format::concatcp!("DELETE FROM ", SESSIONS, " WHERE id = $1"),
                &[&id.inner()],
            )
            .await
            .map(|n| n > 0)
            .map_err(StoreError::from)
    }

    async fn insert_participant(&mut self, participant: &Participant) -> Result<(), StoreError> {
        self.client()
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    PARTICIPANTS,
                    " (",
                    PARTICIPANT_COLUMNS,
                    ") VALUES ($1, $2, $3, $4, $5)"
                ),
                &[
                    &participant.id().inner(),
                    &participant.session().inner(),
                    &participant.name(),
                    &participant.is_facilitator(),
                    &participant.joined(),
                ],
            )
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
    async fn participants(
        &mut self,
        session: ID<Session>,
    ) -> Result<Vec<Participant>, StoreError> {
        self.client()
            .query(
                const_format::concatcp!(
                    "SELECT ",
                    PARTICIPANT_COLUMNS,
                    " FROM ",
                    PARTICIPANTS,
                    " WHERE session_id = $1 ORDER BY joined_at, id"
                ),
                &[&session.inner()],
            )
            .await
            .map(|rows| rows.iter().map(participant).collect())
            .map_err(StoreError::from)
    }

    async fn insert_round(&mut self, round: &Round) -> Result<(), StoreError> {
        let inserted = self
            .client()
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    ROUNDS,
                    " (",
                    ROUND_COLUMNS,
                    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) ON CONFLICT DO NOTHING"
                ),
                &[
                    &round.id().inner(),
                    &round.session().inner(),
                    &round.number(),
                    &round.phase().as_str(),
                    &round.status().as_str(),
                    &round.computed(),
                    &round.version(),
                    &round.started(),
                    &round.ended(),
                ],
            )
            .await?;
        match inserted {
            0 => Err(StoreError::Conflict),
            _ => Ok(()),
        }
    }
    async fn round(&mut self, id: ID<Round>) -> Result<Option<Round>, StoreError> {
        self.client()
            .query_opt(
                const_format::concatcp!(
                    "SELECT ",
                    ROUND_COLUMNS,
                    " FROM ",
                    ROUNDS,
                    " WHERE id = $1"
                ),
                &[&id.inner()],
            )
            .await?
            .as_ref()
            .map(round)
            .transpose()
    }
    async fn lock_round(&mut self, id: ID<Round>) -> Result<Option<Round>, StoreError> {
        self.client()
            .query_opt(
                const_format::concatcp!(
                    "SELECT ",
                    ROUND_COLUMNS,
                    " FROM ",
                    ROUNDS,
                    " WHERE id = $1 FOR UPDATE"
                ),
                &[&id.inner()],
            )
            .await?
            .as_ref()
            .map(round)
            .transpose()
    }
    async fn round_by_number(
        &mut self,
        session: ID<Session>,
        number: RoundNumber,
    ) -> Result<Option<Round>, StoreError> {
        self.client()
            .query_opt(
                const_format::concatcp!(
                    "SELECT ",
                    ROUND_COLUMNS,
                    " FROM ",
                    ROUNDS,
                    " WHERE session_id = $1 AND number = $2"
                ),
                &[&session.inner(), &number],
            )
            .await?
            .as_ref()
            .map(round)
            .transpose()
    }
    async fn rounds(&mut self, session: ID<Session>) -> Result<Vec<Round>, StoreError> {
        self.client()
            .query(
                const_format::concatcp!(
                    "SELECT ",
                    ROUND_COLUMNS,
                    " FROM ",
                    ROUNDS,
                    " WHERE session_id = $1 ORDER BY number"
                ),
                &[&session.inner()],
            )
            .await?
            .iter()
            .map(round)
            .collect()
    }
    async fn update_round(&mut self, round: &Round) -> Result<(), StoreError> {
        self.client()
            .execute(
                const_format::concatcp!(
                    "UPDATE ",
                    ROUNDS,
                    " SET status = $2, computed = $3, version = $4, ended_at = $5 WHERE id = $1"
                ),
                &[
                    &round.id().inner(),
                    &round.status().as_str(),
                    &round.computed(),
                    &round.version(),
                    &round.ended(),
                ],
            )
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }

    async fn insert_pairings(&mut self, pairings: &[Pairing]) -> Result<(), StoreError> {
        for pairing in pairings {
            self.client()
                .execute(
                    const_format::concatcp!(
                        "INSERT INTO ",
                        PAIRINGS,
                        " (",
                        PAIRING_COLUMNS,
                        ") VALUES ($1, $2, $3)"
                    ),
                    &[
                        &pairing.round().inner(),
                        &pairing.a().inner(),
                        &pairing.b().inner(),
                    ],
                )
                .await?;
        }
        Ok(())
    }
    async fn pairings(&mut self, round: ID<Round>) -> Result<Vec<Pairing>, StoreError> {
        self.client()
            .query(
                const_format::concatcp!(
                    "SELECT ",
                    PAIRING_COLUMNS,
                    " FROM ",
                    PAIRINGS,
                    " WHERE round_id = $1 ORDER BY player_a"
                ),
                &[&round.inner()],
            )
            .await
            .map(|rows| rows.iter().map(pairing).collect())
            .map_err(StoreError::from)
    }

    async fn insert_action(&mut self, action: &Action) -> Result<(), StoreError> {
        let inserted = self
            .client()
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    ACTIONS,
                    " (",
                    ACTION_COLUMNS,
                    ") VALUES ($1, $2, $3, $4, $5) ON CONFLICT (round_id, player_id) DO NOTHING"
                ),
                &[
                    &action.round().inner(),
                    &action.player().inner(),
                    &action.choice().as_str(),
                    &action.payoff(),
                    &action.submitted(),
                ],
            )
            .await?;
        match inserted {
            0 => Err(StoreError::Conflict),
            _ => Ok(()),
        }
    }
    async fn action(
        &mut self,
        round: ID<Round>,
        player: ID<Participant>,
    ) -> Result<Option<Action>, StoreError> {
        self.client()
            .query_opt(
                const_format::concatcp!(
                    "SELECT ",
                    ACTION_COLUMNS,
                    " FROM ",
                    ACTIONS,
                    " WHERE round_id = $1 AND player_id = $2"
                ),
                &[&round.inner(), &player.inner()],
            )
            .await?
            .as_ref()
            .map(action)
            .transpose()
    }
    async fn actions(&mut self, round: ID<Round>) -> Result<Vec<Action>, StoreError> {
        self.client()
            .query(
                const_format::concatcp!(
                    "SELECT ",
                    ACTION_COLUMNS,
                    " FROM ",
                    ACTIONS,
                    " WHERE round_id = $1 ORDER BY submitted_at"
                ),
                &[&round.inner()],
            )
            .await?
            .iter()
            .map(action)
            .collect()
    }
    async fn update_action(&mut self, action: &Action) -> Result<(), StoreError> {
        self.client()
            .execute(
                const_format::concatcp!(
                    "UPDATE ",
                    ACTIONS,
                    " SET payoff = $3 WHERE round_id = $1 AND player_id = $2"
                ),
                &[
                    &action.round().inner(),
                    &action.player().inner(),
                    &action.payoff(),
                ],
            )
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }

    async fn insert_message(&mut self, message: &Message) -> Result<(), StoreError> {
        let inserted = self
            .client()
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    MESSAGES,
                    " (",
                    MESSAGE_COLUMNS,
                    ") VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (round_id, sender_id) DO NOTHING"
                ),
                &[
                    &message.id().inner(),
                    &message.session().inner(),
                    &message.round().inner(),
                    &message.sender().inner(),
                    &message.receiver().inner(),
                    &message.content(),
                    &message.sent(),
                ],
            )
            .await?;
        match inserted {
            0 => Err(StoreError::Conflict),
            _ => Ok(()),
        }
    }
    async fn messages(&mut self, round: ID<Round>) -> Result<Vec<Message>, StoreError> {
        self.client()
            .query(
                const_format::concatcp!(
                    "SELECT ",
                    MESSAGE_COLUMNS,
                    " FROM ",
                    MESSAGES,
                    " WHERE round_id = $1 ORDER BY sent_at, id"
                ),
                &[&round.inner()],
            )
            .await
            .map(|rows| rows.iter().map(message).collect())
            .map_err(StoreError::from)
    }

    async fn insert_indicators(&mut self, indicators: &[Indicator]) -> Result<(), StoreError> {
        for indicator in indicators {
            self.client()
                .execute(
                    const_format::concatcp!(
                        "INSERT INTO ",
                        INDICATORS,
                        " (",
                        INDICATOR_COLUMNS,
                        ") VALUES ($1, $2, $3)"
                    ),
                    &[
                        &indicator.session().inner(),
                        &indicator.player().inner(),
                        &indicator.symbol(),
                    ],
                )
                .await?;
        }
        Ok(())
    }
    async fn indicators(&mut self, session: ID<Session>) -> Result<Vec<Indicator>, StoreError> {
        self.client()
            .query(
                const_format::concatcp!(
                    "SELECT ",
                    INDICATOR_COLUMNS,
                    " FROM ",
                    INDICATORS,
                    " WHERE session_id = $1 ORDER BY player_id"
                ),
                &[&session.inner()],
            )
            .await
            .map(|rows| rows.iter().map(indicator).collect())
            .map_err(StoreError::from)
    }

    async fn insert_event(&mut self, event: &Event) -> Result<(), StoreError> {
        self.client()
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    EVENTS,
                    " (",
                    EVENT_COLUMNS,
                    ") VALUES ($1, $2, $3, $4, $5)"
                ),
                &[
                    &event.seq(),
                    &event.session().inner(),
                    &event.kind().as_str(),
                    event.payload(),
                    &event.at(),
                ],
            )
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
    async fn events(
        &mut self,
        session: ID<Session>,
        after: Seq,
        limit: i64,
    ) -> Result<Vec<Event>, StoreError> {
        self.client()
            .query(
                const_format::concatcp!(
                    "SELECT ",
                    EVENT_COLUMNS,
                    " FROM ",
                    EVENTS,
                    " WHERE session_id = $1 AND seq > $2 ORDER BY seq LIMIT $3"
                ),
                &[&session.inner(), &after, &limit],
            )
            .await?
            .iter()
            .map(event)
            .collect()
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        match self.client.take() {
            Some(client) => client.batch_execute("COMMIT").await.map_err(StoreError::from),
            None => Ok(()),
        }
    }
}
