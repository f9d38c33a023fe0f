//! Persistent entities of a classroom session.
//!
//! Each record owns its fields behind accessors and mutates only through
//! named operations. Under the `database` feature each record also
//! describes its table via [`chicken_pg::Schema`].
mod action;
mod event;
mod indicator;
mod message;
mod pairing;
mod participant;
mod round;
mod session;

pub use action::*;
pub use event::*;
pub use indicator::*;
pub use message::*;
pub use pairing::*;
pub use participant::*;
pub use round::*;
pub use session::*;

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Wall clock truncated to whole microseconds.
///
/// PostgreSQL keeps timestamps at microsecond resolution, so records
/// stamped here compare equal to themselves after a round trip.
pub fn now() -> SystemTime {
    let t = SystemTime::now();
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::from_micros(d.as_micros() as u64),
        Err(_) => t,
    }
}

/// Milliseconds since the unix epoch, as exposed to clients.
pub fn millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

pub(crate) fn serialize_millis<S>(t: &SystemTime, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_u64(millis(*t))
}


#[cfg(all(test, feature = "database"))]
mod codec {
    use super::*;
    use chicken_core::ID;
    use chicken_core::Unique;
    use chicken_game::Choice;
    use tokio_postgres::types::FromSql;
    use tokio_postgres::types::ToSql;
    use tokio_postgres::types::Type;

    fn reread(t: SystemTime) -> SystemTime {
        let mut buf = bytes::BytesMut::new();
        t.to_sql(&Type::TIMESTAMPTZ, &mut buf).unwrap();
        SystemTime::from_sql(&Type::TIMESTAMPTZ, &buf).unwrap()
    }

    #[test]
    fn stored_action_equals_submitted_action() {
        let first = Action::new(ID::default(), ID::default(), Choice::Accelerate);
        let again = Action::load(
            first.round(),
            first.player(),
            first.choice(),
            first.payoff(),
            reread(first.submitted()),
        );
        assert_eq!(first, again);
    }
    #[test]
    fn stored_timestamps_survive_the_codec() {
        let session = Session::new("ABCDEF".into());
        let host = Participant::facilitator(session.id());
        let round = Round::new(session.id(), 1);
        for t in [session.created(), host.joined(), round.started()] {
            assert_eq!(reread(t), t);
        }
    }
}
