//! Session, round, and scoring coordination for the classroom chicken game.
//!
//! ## Records
//!
//! - [`Session`], [`Participant`], [`Round`], [`Pairing`], [`Action`], [`Event`]
//! - [`Message`], [`Indicator`] for the message and indicator phases
//!
//! ## Lifecycles
//!
//! - [`Machine`] — Transition tables for [`SessionStatus`] and [`RoundStatus`]
//! - [`Ledger`] — Event log and version counter of a locked session
//!
//! ## Storage
//!
//! - [`Store`] / [`Unit`] — Transactional seam with row locks
//! - [`MemoryStore`] — In-process backend
//! - `PgStore` — PostgreSQL backend (feature `database`)
//!
//! ## Orchestration
//!
//! - [`Coordinator`] — Every mutating operation and the read views
//! - [`Notifier`] — Post-commit event fan-out
mod coordinator;
mod error;
mod ledger;
mod machine;
mod notify;
mod records;
mod rounds;
mod sessions;
mod signals;
mod store;
mod views;

pub use coordinator::*;
pub use error::*;
pub use ledger::*;
pub use machine::*;
pub use notify::*;
pub use records::*;
pub use rounds::*;
pub use store::*;
pub use views::*;
