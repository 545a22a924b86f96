//! Hub control loop
//!
//! The loop is the only place that touches a hub's membership. Registration,
//! unregistration and publish requests are handled strictly one at a time,
//! which keeps the set consistent without a lock and gives every subscriber
//! the same relative order of payloads.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::SinkExt;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, info, trace, warn};

use super::{DeliveryError, Payload, Registration, SubscriberId, SubscriberSink};

/// The serialized owner of one hub's subscriber set
pub struct HubLoop {
    name: Arc<str>,
    write_timeout: Duration,
    members: HashMap<SubscriberId, SubscriberSink>,
    publish_rx: mpsc::Receiver<Payload>,
    register_rx: mpsc::Receiver<Registration>,
    unregister_rx: mpsc::UnboundedReceiver<SubscriberId>,
    members_tx: watch::Sender<Vec<SubscriberId>>,
}

impl HubLoop {
    pub(super) fn new(
        name: Arc<str>,
        write_timeout: Duration,
        publish_rx: mpsc::Receiver<Payload>,
        register_rx: mpsc::Receiver<Registration>,
        unregister_rx: mpsc::UnboundedReceiver<SubscriberId>,
        members_tx: watch::Sender<Vec<SubscriberId>>,
    ) -> Self {
        Self {
            name,
            write_timeout,
            members: HashMap::new(),
            publish_rx,
            register_rx,
            unregister_rx,
            members_tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run until `shutdown` turns true (or its sender is dropped), or until
    /// every hub handle is gone. All member transports are closed on exit.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(hub = %self.name, "event hub started");

        if !*shutdown.borrow_and_update() {
            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    Some(registration) = self.register_rx.recv() => self.add(registration),
                    Some(id) = self.unregister_rx.recv() => self.remove(id),
                    payload = self.publish_rx.recv() => match payload {
                        Some(payload) => self.broadcast(payload).await,
                        None => break,
                    },
                }
            }
        }

        self.close_all().await;
    }

    fn add(&mut self, registration: Registration) {
        let Registration { subscriber, ack } = registration;
        let id = subscriber.id;

        self.members.insert(id, subscriber.sink);
        self.publish_members();
        // The registering side may have given up; membership stands either way.
        let _ = ack.send(());

        info!(
            hub = %self.name,
            subscriber = %id,
            total = self.members.len(),
            "subscriber registered"
        );
    }

    fn remove(&mut self, id: SubscriberId) {
        let Some(sink) = self.members.remove(&id) else {
            trace!(hub = %self.name, subscriber = %id, "subscriber already gone");
            return;
        };

        self.publish_members();
        self.close_detached(id, sink);

        info!(
            hub = %self.name,
            subscriber = %id,
            total = self.members.len(),
            "subscriber unregistered"
        );
    }

    /// Close a departed member's transport on its own task
    fn close_detached(&self, id: SubscriberId, sink: SubscriberSink) {
        let name = self.name.clone();
        let limit = self.write_timeout;
        tokio::spawn(async move { close_sink(&name, id, sink, limit).await });
    }

    /// Write `payload` to every member, then evict the ones that failed
    async fn broadcast(&mut self, payload: Payload) {
        if self.members.is_empty() {
            trace!(hub = %self.name, "no subscribers, payload dropped");
            return;
        }

        let limit = self.write_timeout;
        let frame = &payload;
        let writes = self.members.iter_mut().map(move |(id, sink)| {
            let payload = frame.clone();
            async move { (*id, deliver(sink, payload, limit).await) }
        });

        let failed: Vec<(SubscriberId, DeliveryError)> = join_all(writes)
            .await
            .into_iter()
            .filter_map(|(id, result)| result.err().map(|err| (id, err)))
            .collect();

        debug!(
            hub = %self.name,
            bytes = payload.len(),
            delivered = self.members.len() - failed.len(),
            failed = failed.len(),
            "payload broadcast"
        );

        if failed.is_empty() {
            return;
        }

        let evicted: Vec<(SubscriberId, SubscriberSink)> = failed
            .into_iter()
            .filter_map(|(id, err)| {
                warn!(hub = %self.name, subscriber = %id, error = %err, "delivery failed, evicting subscriber");
                self.members.remove(&id).map(|sink| (id, sink))
            })
            .collect();
        self.publish_members();

        for (id, sink) in evicted {
            self.close_detached(id, sink);
        }
    }

    async fn close_all(&mut self) {
        let name = self.name.clone();
        let limit = self.write_timeout;
        let count = self.members.len();

        join_all(
            self.members
                .drain()
                .map(|(id, sink)| close_sink(&name, id, sink, limit)),
        )
        .await;
        self.publish_members();

        info!(hub = %self.name, closed = count, "event hub stopped");
    }

    fn publish_members(&self) {
        let mut ids: Vec<SubscriberId> = self.members.keys().copied().collect();
        ids.sort_unstable();
        self.members_tx.send_replace(ids);
    }
}

async fn deliver(
    sink: &mut SubscriberSink,
    payload: Payload,
    limit: Duration,
) -> Result<(), DeliveryError> {
    time::timeout(limit, sink.send(payload))
        .await
        .unwrap_or(Err(DeliveryError::Timeout(limit)))
}

async fn close_sink(hub: &str, id: SubscriberId, mut sink: SubscriberSink, limit: Duration) {
    match time::timeout(limit, sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!(hub, subscriber = %id, error = %err, "transport close failed"),
        Err(_) => debug!(hub, subscriber = %id, "transport close timed out"),
    }
}
