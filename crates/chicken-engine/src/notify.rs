use crate::*;

/// Receives events after the unit of work that produced them commits.
///
/// Delivery is best effort. Clients that miss a notification still catch
/// up by polling the version counter or tailing the event log.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &Event);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self, _: &Event) {}
}
