//! WebSocket connection lifecycle
//!
//! An accepted upgrade is split in two: the write half joins the hub as a
//! [`Subscriber`], the read half stays with the connection's own task and is
//! watched until the peer goes away.

use std::fmt;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{future, SinkExt, Stream, StreamExt};
use tokio::time;
use tracing::{debug, info, trace, warn};

use super::{DeliveryError, EventHub, HandshakeError, Payload, Subscriber, SubscriberId};

impl EventHub {
    /// Complete a WebSocket handshake for this hub.
    ///
    /// A rejected upgrade is returned to the caller untouched by the hub.
    /// Once the connection is upgraded it is registered and watched on the
    /// task axum spawns for it.
    pub fn subscribe(
        &self,
        upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    ) -> Result<Response, HandshakeError> {
        let upgrade = upgrade.map_err(|rejection| {
            warn!(
                hub = %self.name(),
                status = %rejection.status(),
                reason = %rejection.body_text(),
                "websocket handshake rejected"
            );
            HandshakeError::from(rejection)
        })?;

        let hub = self.clone();
        let name = self.name().to_string();
        Ok(upgrade
            .on_failed_upgrade(move |err| {
                warn!(hub = %name, error = %err, "websocket upgrade failed");
            })
            .on_upgrade(move |socket| async move { hub.attach(socket).await }))
    }

    /// Register an upgraded socket and read from it until it closes
    pub async fn attach(&self, socket: WebSocket) {
        let (sink, stream) = socket.split();
        let sink = sink.with(|payload: Payload| future::ready(Ok::<_, DeliveryError>(frame(payload))));

        let id = match self.register(Subscriber::new(sink)).await {
            Ok(id) => id,
            Err(err) => {
                warn!(hub = %self.name(), error = %err, "subscriber rejected");
                return;
            }
        };

        watch_inbound(self, id, stream).await;
    }
}

/// Read frames until the connection ends, then unregister `id` once.
///
/// Inbound content is only a sign of life; nothing is interpreted.
pub async fn watch_inbound<St, E>(hub: &EventHub, id: SubscriberId, mut stream: St)
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let idle = hub.config().idle_timeout;

    loop {
        let next = match idle {
            Some(limit) => match time::timeout(limit, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    info!(
                        hub = %hub.name(),
                        subscriber = %id,
                        idle_secs = limit.as_secs(),
                        "subscriber idle, dropping"
                    );
                    break;
                }
            },
            None => stream.next().await,
        };

        match next {
            Some(Ok(Message::Close(frame))) => {
                debug!(
                    hub = %hub.name(),
                    subscriber = %id,
                    code = ?frame.as_ref().map(|f| f.code),
                    "close frame received"
                );
                break;
            }
            Some(Ok(Message::Text(text))) => {
                trace!(hub = %hub.name(), subscriber = %id, len = text.len(), "inbound text ignored");
            }
            Some(Ok(_)) => {
                trace!(hub = %hub.name(), subscriber = %id, "keepalive frame");
            }
            Some(Err(err)) => {
                debug!(hub = %hub.name(), subscriber = %id, error = %err, "read failed");
                break;
            }
            None => {
                debug!(hub = %hub.name(), subscriber = %id, "connection ended");
                break;
            }
        }
    }

    hub.unregister(id);
}

/// Text payloads become text frames, the rest binary frames
fn frame(payload: Payload) -> Message {
    match payload {
        Payload::Text(text) => Message::Text(text.to_string()),
        Payload::Binary(bytes) => Message::Binary(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::HubConfig;
    use futures::channel::mpsc as fmpsc;
    use futures::stream;
    use std::time::Duration;
    use tokio::sync::watch;

    fn subscriber() -> (Subscriber, fmpsc::Receiver<Payload>) {
        let (tx, rx) = fmpsc::channel(16);
        (Subscriber::new(tx.sink_map_err(|_| DeliveryError::Disconnected)), rx)
    }

    async fn settle(hub: &EventHub, expected: usize) {
        time::timeout(Duration::from_secs(1), async {
            while hub.subscriber_count() != expected {
                time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("membership did not settle");
    }

    #[test]
    fn test_frame_kind_follows_payload() {
        assert!(matches!(frame(Payload::from("{\"id\":1}")), Message::Text(t) if t == "{\"id\":1}"));
        assert!(matches!(frame(Payload::from(vec![0xff, 0x00])), Message::Binary(b) if b == vec![0xff, 0x00]));
    }

    #[tokio::test]
    async fn test_inbound_text_keeps_subscriber_until_close() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (hub, _task) = EventHub::spawn("todo:created", HubConfig::default(), shutdown_rx);

        let (sub, _rx) = subscriber();
        let id = hub.register(sub).await.unwrap();

        let frames = stream::iter(vec![
            Ok::<_, String>(Message::Text("hello".into())),
            Ok(Message::Ping(vec![1])),
            Ok(Message::Close(None)),
            Ok(Message::Text("never read".into())),
        ]);
        watch_inbound(&hub, id, frames).await;

        settle(&hub, 0).await;
    }

    #[tokio::test]
    async fn test_read_error_unregisters() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (hub, _task) = EventHub::spawn("todo:updated", HubConfig::default(), shutdown_rx);

        let (a, _rx_a) = subscriber();
        let (b, _rx_b) = subscriber();
        let id_a = hub.register(a).await.unwrap();
        let id_b = hub.register(b).await.unwrap();

        let frames = stream::iter(vec![Err::<Message, _>("connection reset".to_string())]);
        watch_inbound(&hub, id_a, frames).await;

        settle(&hub, 1).await;
        assert_eq!(hub.members(), vec![id_b]);
    }

    #[tokio::test]
    async fn test_idle_subscriber_is_dropped() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = HubConfig {
            idle_timeout: Some(Duration::from_millis(50)),
            ..HubConfig::default()
        };
        let (hub, _task) = EventHub::spawn("todo:deleted", config, shutdown_rx);

        let (sub, _rx) = subscriber();
        let id = hub.register(sub).await.unwrap();

        watch_inbound(&hub, id, stream::pending::<Result<Message, String>>()).await;
        settle(&hub, 0).await;
    }
}
