//! One hub per to-do event category

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{EventHub, HubConfig, HubError, Payload};

/// Kind of mutation a hub reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Created,
    Updated,
    Deleted,
}

impl EventCategory {
    pub const ALL: [EventCategory; 3] = [Self::Created, Self::Updated, Self::Deleted];

    /// Hub name used in logs and status output
    pub fn hub_name(self) -> &'static str {
        match self {
            Self::Created => "todo:created",
            Self::Updated => "todo:updated",
            Self::Deleted => "todo:deleted",
        }
    }

    /// Last segment of the subscribe endpoint, `/ws/todos/{segment}`
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hub_name())
    }
}

/// Parses the endpoint path segment (`created`, `updated`, `deleted`)
impl FromStr for EventCategory {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.path_segment() == s)
            .ok_or_else(|| HubError::UnknownCategory(s.to_string()))
    }
}

/// The running hubs, addressable by category
#[derive(Debug, Clone)]
pub struct HubSet {
    hubs: [EventHub; 3],
}

impl HubSet {
    /// Spawn one control loop per category.
    ///
    /// The loops run until [`HubRuntime::shutdown`] is called or the runtime
    /// is dropped.
    pub fn start(config: &HubConfig) -> (Self, HubRuntime) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(EventCategory::ALL.len());

        let hubs = EventCategory::ALL.map(|category| {
            let (hub, task) = EventHub::spawn(category.hub_name(), config.clone(), shutdown_rx.clone());
            tasks.push(task);
            hub
        });

        info!(
            hubs = hubs.len(),
            queue_capacity = config.queue_capacity,
            "event hubs started"
        );

        (Self { hubs }, HubRuntime { shutdown_tx, tasks })
    }

    pub fn hub(&self, category: EventCategory) -> &EventHub {
        &self.hubs[category.index()]
    }

    pub async fn publish(&self, category: EventCategory, payload: impl Into<Payload>) {
        self.hub(category).publish(payload).await;
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventCategory, &EventHub)> {
        EventCategory::ALL.into_iter().zip(self.hubs.iter())
    }
}

/// Owns the control loop tasks of a [`HubSet`]
pub struct HubRuntime {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl HubRuntime {
    /// Stop every loop, closing all subscriber connections, and wait for them
    pub async fn shutdown(self) {
        self.shutdown_tx.send_replace(true);

        for task in self.tasks {
            if let Err(err) = task.await {
                error!(error = %err, "event hub task failed");
            }
        }

        info!("event hubs stopped");
    }
}
