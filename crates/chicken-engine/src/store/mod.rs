//! Transactional storage seam.
//!
//! A [`Store`] hands out [`Unit`]s of work. Writes made through a unit
//! become visible to others only on [`Unit::commit`]; dropping a unit
//! without committing discards them. The `lock_*` reads take an exclusive
//! row lock held until the unit ends, which is how the coordinator
//! serializes everything that touches one session or one round.
//!
//! Lock order is round before session. Session locks are always taken last.
mod memory;
#[cfg(feature = "database")]
mod postgres;

pub use memory::*;
#[cfg(feature = "database")]
pub use postgres::*;

use crate::*;
use chicken_core::*;

#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    type Unit: Unit;
    /// Opens a read-write unit of work.
    async fn begin(&self) -> Result<Self::Unit, StoreError>;
    /// Opens a unit for multi-read views. Backends with snapshot isolation
    /// should give every read in the unit the same snapshot.
    async fn view(&self) -> Result<Self::Unit, StoreError> {
        self.begin().await
    }
}

#[async_trait::async_trait]
pub trait Unit: Send {
    // sessions
    async fn insert_session(&mut self, session: &Session) -> Result<(), StoreError>;
    async fn session(&mut self, id: ID<Session>) -> Result<Option<Session>, StoreError>;
    async fn session_by_code(&mut self, code: &str) -> Result<Option<Session>, StoreError>;
    async fn lock_session(&mut self, id: ID<Session>) -> Result<Option<Session>, StoreError>;
    async fn update_session(&mut self, session: &Session) -> Result<(), StoreError>;
    /// Removes the session and everything under it. False if absent.
    async fn delete_session(&mut self, id: ID<Session>) -> Result<bool, StoreError>;

    // participants
    async fn insert_participant(&mut self, participant: &Participant) -> Result<(), StoreError>;
    /// All participants of a session in join order.
    async fn participants(&mut self, session: ID<Session>)
    -> Result<Vec<Participant>, StoreError>;

    // rounds
    async fn insert_round(&mut self, round: &Round) -> Result<(), StoreError>;
    async fn round(&mut self, id: ID<Round>) -> Result<Option<Round>, StoreError>;
    async fn lock_round(&mut self, id: ID<Round>) -> Result<Option<Round>, StoreError>;
    async fn round_by_number(
        &mut self,
        session: ID<Session>,
        number: RoundNumber,
    ) -> Result<Option<Round>, StoreError>;
    /// All rounds of a session by number.
    async fn rounds(&mut self, session: ID<Session>) -> Result<Vec<Round>, StoreError>;
    async fn update_round(&mut self, round: &Round) -> Result<(), StoreError>;

    // pairings
    async fn insert_pairings(&mut self, pairings: &[Pairing]) -> Result<(), StoreError>;
    async fn pairings(&mut self, round: ID<Round>) -> Result<Vec<Pairing>, StoreError>;

    // actions
    /// Fails with [`StoreError::Conflict`] if the player already acted in
    /// the round. A concurrent insert of the same key waits for the other
    /// unit to finish before deciding.
    async fn insert_action(&mut self, action: &Action) -> Result<(), StoreError>;
    async fn action(
        &mut self,
        round: ID<Round>,
        player: ID<Participant>,
    ) -> Result<Option<Action>, StoreError>;
    async fn actions(&mut self, round: ID<Round>) -> Result<Vec<Action>, StoreError>;
    async fn update_action(&mut self, action: &Action) -> Result<(), StoreError>;

    // messages
    /// Fails with [`StoreError::Conflict`] if the sender already wrote in
    /// the round. Waits on a concurrent insert of the same key like
    /// [`Unit::insert_action`].
    async fn insert_message(&mut self, message: &Message) -> Result<(), StoreError>;
    /// Messages of a round in send order.
    async fn messages(&mut self, round: ID<Round>) -> Result<Vec<Message>, StoreError>;

    // indicators
    async fn insert_indicators(&mut self, indicators: &[Indicator]) -> Result<(), StoreError>;
    async fn indicators(&mut self, session: ID<Session>) -> Result<Vec<Indicator>, StoreError>;

    // events
    async fn insert_event(&mut self, event: &Event) -> Result<(), StoreError>;
    /// Events with `seq > after`, ascending, at most `limit`.
    async fn events(
        &mut self,
        session: ID<Session>,
        after: Seq,
        limit: i64,
    ) -> Result<Vec<Event>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
