use chicken_core::ID;
use chicken_engine::Event;
use chicken_engine::Notifier;
use chicken_engine::Session;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Per-session fan-out of committed events to WebSocket subscribers.
///
/// Channels are created on first subscription and dropped once an event
/// finds nobody listening. Slow subscribers lose old messages and are told
/// to resync by polling.
#[derive(Default)]
pub struct Broadcaster {
    channels: RwLock<HashMap<ID<Session>, broadcast::Sender<String>>>,
}

impl Broadcaster {
    /// Messages buffered per session before slow subscribers start lagging.
    pub const CAPACITY: usize = 256;

    pub fn subscribe(&self, session: ID<Session>) -> broadcast::Receiver<String> {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(session)
            .or_insert_with(|| broadcast::channel(Self::CAPACITY).0)
            .subscribe()
    }
    pub fn subscribers(&self, session: ID<Session>) -> usize {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&session)
            .map(|tx| tx.receiver_count())
            .unwrap_or_default()
    }
    fn prune(&self, session: ID<Session>) {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        if channels
            .get(&session)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(&session);
            log::debug!("[broadcast {}] last subscriber gone", session);
        }
    }

    /// Spawns a task forwarding session notifications to one WebSocket.
    pub async fn bridge(
        &self,
        id: ID<Session>,
        mut session: actix_ws::Session,
        mut streams: actix_ws::MessageStream,
    ) -> anyhow::Result<()> {
        use futures::StreamExt;
        let mut rx = self.subscribe(id);
        session
            .text(serde_json::json!({ "kind": "SUBSCRIBED", "session_id": id }).to_string())
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        log::debug!("[bridge {}] connected", id);
        actix_web::rt::spawn(async move {
            'sesh: loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(json) => if session.text(json).await.is_err() { break 'sesh },
                        Err(RecvError::Lagged(missed)) => {
                            let notice = serde_json::json!({ "kind": "LAGGED", "missed": missed });
                            if session.text(notice.to_string()).await.is_err() { break 'sesh }
                        }
                        Err(RecvError::Closed) => break 'sesh,
                    },
                    msg = streams.next() => match msg {
                        Some(Ok(actix_ws::Message::Ping(bytes))) => if session.pong(&bytes).await.is_err() { break 'sesh },
                        Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                        Some(Err(_)) => break 'sesh,
                        None => break 'sesh,
                        _ => continue 'sesh,
                    },
                }
            }
            let _ = session.close(None).await;
            log::debug!("[bridge {}] disconnected", id);
        });
        Ok(())
    }
}

impl Notifier for Broadcaster {
    fn notify(&self, event: &Event) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => return log::warn!("[broadcast] unserializable event: {}", e),
        };
        let sent = self
            .channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&event.session())
            .map(|tx| tx.send(json).is_ok());
        if sent == Some(false) {
            self.prune(event.session());
        }
    }
}
