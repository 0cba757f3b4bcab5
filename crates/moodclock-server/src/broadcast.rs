//! Live fan-out of snapshot summaries to WebSocket subscribers.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use moodclock_core::{MoodPublisher, MoodUpdate};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::api::AppState;

/// Updates buffered per subscriber before the oldest are dropped.
pub const BROADCAST_CAPACITY: usize = 256;

/// Broadcast hub for [`MoodUpdate`]s.
///
/// Publishing with no subscribers is not an error, and a subscriber that
/// falls more than [`BROADCAST_CAPACITY`] updates behind loses the oldest.
#[derive(Debug, Clone)]
pub struct MoodBroadcaster {
    sender: broadcast::Sender<MoodUpdate>,
}

impl MoodBroadcaster {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MoodUpdate> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl MoodPublisher for MoodBroadcaster {
    fn publish(&self, update: &MoodUpdate) {
        match self.sender.send(update.clone()) {
            Ok(receivers) => {
                tracing::debug!(country = %update.country, receivers, "mood update broadcast");
            }
            Err(_) => {
                tracing::debug!(country = %update.country, "mood update dropped; no subscribers");
            }
        }
    }
}

/// `GET /ws/moods`: stream every published update as a JSON text frame.
pub(crate) async fn mood_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let updates = state.broadcaster.subscribe();
    ws.on_upgrade(move |socket| stream_updates(socket, updates))
}

async fn stream_updates(socket: WebSocket, mut updates: broadcast::Receiver<MoodUpdate>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::debug!("websocket subscriber connected");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    let text = match serde_json::to_string(&update) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to encode mood update");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "websocket subscriber lagged; updates dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("websocket subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(country: &str) -> MoodUpdate {
        MoodUpdate {
            country: country.to_string(),
            emoji: "😀".to_string(),
            mood_score: 0.4,
            energy: 0.2,
        }
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let broadcaster = MoodBroadcaster::new(4);
        broadcaster.publish(&update("US"));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_update() {
        let broadcaster = MoodBroadcaster::new(4);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        broadcaster.publish(&update("KE"));

        assert_eq!(a.recv().await.expect("a receives"), update("KE"));
        assert_eq!(b.recv().await.expect("b receives"), update("KE"));
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_oldest_updates() {
        let broadcaster = MoodBroadcaster::new(2);
        let mut slow = broadcaster.subscribe();

        for code in ["US", "GB", "FR"] {
            broadcaster.publish(&update(code));
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(slow.recv().await.expect("next").country, "GB");
    }

    #[test]
    fn update_serializes_to_the_wire_shape() {
        let json = serde_json::to_value(update("JP")).expect("serialize");
        assert_eq!(json["country"], "JP");
        assert_eq!(json["emoji"], "😀");
        assert!(json.get("mood_score").is_some());
        assert!(json.get("energy").is_some());
    }
}
