//! Real-time event hubs
//!
//! One [`EventHub`] exists per event category. Each hub keeps its subscriber
//! set inside a single control loop task ([`HubLoop`]); producers reach it
//! only through a bounded publish queue, transports through register and
//! unregister requests.
//!
//! ## Layout
//! - `control`: the loop that owns membership and broadcasts payloads
//! - `connection`: WebSocket upgrade and the per-connection reader
//! - `set`: one hub per [`EventCategory`], started and stopped together

mod connection;
mod control;
mod error;
mod payload;
mod set;

pub use connection::watch_inbound;
pub use control::HubLoop;
pub use error::{DeliveryError, HandshakeError, HubError};
pub use payload::Payload;
pub use set::{EventCategory, HubRuntime, HubSet};

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::Sink;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Pending registrations the loop has not picked up yet
const REGISTRATION_BACKLOG: usize = 64;

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Tuning for a single hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Publish queue capacity before producers start waiting
    pub queue_capacity: usize,
    /// Upper bound on one write (or close) to one subscriber
    pub write_timeout: Duration,
    /// Drop subscribers that send nothing for this long (`None` disables)
    pub idle_timeout: Option<Duration>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            write_timeout: Duration::from_secs(5),
            idle_timeout: None,
        }
    }
}

/// Process-unique identity of one subscriber connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Write half of a subscriber connection, as seen by the control loop
pub type SubscriberSink = Pin<Box<dyn Sink<Payload, Error = DeliveryError> + Send>>;

/// A connection waiting to join a hub
pub struct Subscriber {
    id: SubscriberId,
    sink: SubscriberSink,
}

impl Subscriber {
    pub fn new<S>(sink: S) -> Self
    where
        S: Sink<Payload, Error = DeliveryError> + Send + 'static,
    {
        Self {
            id: SubscriberId::next(),
            sink: Box::pin(sink),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Registration request; `ack` fires once the loop has added the subscriber
pub(crate) struct Registration {
    pub(crate) subscriber: Subscriber,
    pub(crate) ack: oneshot::Sender<()>,
}

/// Cloneable handle to one category's hub.
///
/// All clones talk to the same control loop. The loop stops once shutdown
/// is signalled or every handle has been dropped.
#[derive(Clone)]
pub struct EventHub {
    name: Arc<str>,
    config: HubConfig,
    publish_tx: mpsc::Sender<Payload>,
    register_tx: mpsc::Sender<Registration>,
    unregister_tx: mpsc::UnboundedSender<SubscriberId>,
    members_rx: watch::Receiver<Vec<SubscriberId>>,
}

impl EventHub {
    /// Create a hub and its (not yet running) control loop
    pub fn new(name: impl Into<String>, config: HubConfig) -> (Self, HubLoop) {
        let name: Arc<str> = Arc::from(name.into());
        let (publish_tx, publish_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (register_tx, register_rx) = mpsc::channel(REGISTRATION_BACKLOG);
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (members_tx, members_rx) = watch::channel(Vec::new());

        let control = HubLoop::new(
            name.clone(),
            config.write_timeout,
            publish_rx,
            register_rx,
            unregister_rx,
            members_tx,
        );

        let hub = Self {
            name,
            config,
            publish_tx,
            register_tx,
            unregister_tx,
            members_rx,
        };

        (hub, control)
    }

    /// Create a hub and run its control loop on the tokio runtime
    pub fn spawn(
        name: impl Into<String>,
        config: HubConfig,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, JoinHandle<()>) {
        let (hub, control) = Self::new(name, config);
        (hub, tokio::spawn(control.run(shutdown)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Sorted snapshot of the current members
    pub fn members(&self) -> Vec<SubscriberId> {
        self.members_rx.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.members_rx.borrow().len()
    }

    /// Queue a payload for every current subscriber.
    ///
    /// Waits only while the publish queue is full. Nothing is reported back:
    /// delivery failures are handled inside the loop.
    pub async fn publish(&self, payload: impl Into<Payload>) {
        let payload = match self.publish_tx.try_send(payload.into()) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Full(payload)) => {
                debug!(hub = %self.name, "publish queue saturated, waiting for capacity");
                payload
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(hub = %self.name, "event hub is not running, payload dropped");
                return;
            }
        };

        if self.publish_tx.send(payload).await.is_err() {
            error!(hub = %self.name, "event hub stopped while waiting, payload dropped");
        }
    }

    /// Hand a subscriber to the loop and wait until it is a member
    pub async fn register(&self, subscriber: Subscriber) -> Result<SubscriberId, HubError> {
        let id = subscriber.id();
        let (ack, acked) = oneshot::channel();

        self.register_tx
            .send(Registration { subscriber, ack })
            .await
            .map_err(|_| HubError::Stopped(self.name.to_string()))?;
        acked
            .await
            .map_err(|_| HubError::Stopped(self.name.to_string()))?;

        Ok(id)
    }

    /// Ask the loop to drop a subscriber. Unknown ids are ignored.
    pub fn unregister(&self, id: SubscriberId) {
        if self.unregister_tx.send(id).is_err() {
            debug!(hub = %self.name, subscriber = %id, "event hub already stopped");
        }
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
