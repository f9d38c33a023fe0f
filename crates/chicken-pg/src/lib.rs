//! PostgreSQL connectivity and schema description.
//!
//! ## Connectivity
//!
//! - [`connect()`] — Opens one connection and drives it on the runtime
//!
//! ## Schema
//!
//! - [`Schema`] — Table metadata and DDL generation
//!
//! ## Table Names
//!
//! Constants for every persistent entity of a game session.
mod schema;

pub use schema::*;

use tokio_postgres::Client;

/// Opens a connection to `url` and spawns its driver task.
///
/// Quiets server notices so migrations do not spam the log.
pub async fn connect(url: &str) -> Result<Client, PgErr> {
    let tls = tokio_postgres::tls::NoTls;
    let (client, connection) = tokio_postgres::connect(url, tls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("[pg] connection closed: {}", e);
        }
    });
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await?;
    Ok(client)
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for submitted choices and their computed payoffs.
#[rustfmt::skip]
pub const ACTIONS:      &str = "actions";
/// Table for the append-only session event log.
#[rustfmt::skip]
pub const EVENTS:       &str = "events";
/// Table for indicator symbols, one row per player.
#[rustfmt::skip]
pub const INDICATORS:   &str = "indicators";
/// Table for messages between paired players.
#[rustfmt::skip]
pub const MESSAGES:     &str = "messages";
/// Table for fixed opponent pairs, one row per pair per round.
#[rustfmt::skip]
pub const PAIRINGS:     &str = "pairings";
/// Table for facilitators and players.
#[rustfmt::skip]
pub const PARTICIPANTS: &str = "participants";
/// Table for rounds and their lifecycle status.
#[rustfmt::skip]
pub const ROUNDS:       &str = "rounds";
/// Table for sessions and their version counters.
#[rustfmt::skip]
pub const SESSIONS:     &str = "sessions";
