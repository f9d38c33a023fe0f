//! Transition tables for session and round lifecycles.
//!
//! Legal moves are data, not control flow. Executing a move lives next to
//! the event log in [`crate::Ledger`], which owns the locked session.
use crate::*;

/// A lifecycle whose legal moves are listed in a static table.
pub trait Machine: Copy + Eq + std::fmt::Display + 'static {
    /// Entity name used in error messages and events.
    const ENTITY: &'static str;
    /// Every state with the states it may move to.
    const TABLE: &'static [(Self, &'static [Self])];

    fn targets(self) -> &'static [Self] {
        Self::TABLE
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, to)| *to)
            .unwrap_or(&[])
    }
    fn allows(self, to: Self) -> bool {
        self.targets().contains(&to)
    }
    fn check(self, to: Self) -> Result<(), Error> {
        match self.allows(to) {
            true => Ok(()),
            false => Err(Error::transition(self, to)),
        }
    }
}

impl Machine for SessionStatus {
    const ENTITY: &'static str = "session";
    #[rustfmt::skip]
    const TABLE: &'static [(Self, &'static [Self])] = &[
        (Self::Open,   &[Self::Active]),
        (Self::Active, &[Self::Closed]),
        (Self::Closed, &[]),
    ];
}

impl Machine for RoundStatus {
    const ENTITY: &'static str = "round";
    #[rustfmt::skip]
    const TABLE: &'static [(Self, &'static [Self])] = &[
        (Self::CollectingActions, &[Self::Computing]),
        (Self::Computing,         &[Self::ReadyToPublish]),
        (Self::ReadyToPublish,    &[Self::Published]),
        (Self::Published,         &[]),
    ];
}
