use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Domain events emitted by the services after a successful state change.
///
/// Consumers run out-of-band; emission failures are logged and never fail
/// the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    EmployeeCreated(Uuid),
    EmployeeUpdated(Uuid),
    EmployeeDeleted(Uuid),
    ResourceCreated(Uuid),
    ResourceUpdated(Uuid),
    ResourceDeleted(Uuid),
    ResourceTypeCreated(Uuid),
    ResourceTypeUpdated(Uuid),
    ResourceTypeDeleted(Uuid),
    AllocationCreated {
        allocation_id: Uuid,
        resource_id: Uuid,
        employee_id: Uuid,
    },
    AllocationClosed {
        allocation_id: Uuid,
        resource_id: Uuid,
        status: String,
    },
}

/// Cloneable handle used by the services to publish [`Event`]s.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.sender.send(event).await
    }

    /// Publish an event, logging instead of propagating a channel failure.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("failed to publish event: {}", e);
        }
    }
}

/// Drains the event channel, logging each event. Runs until every sender
/// handle has been dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match serde_json::to_string(&event) {
            Ok(payload) => debug!(event = %payload, "processed event"),
            Err(e) => error!("failed to serialize event: {}", e),
        }
    }
    debug!("event channel closed, processor shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send_or_log(Event::ResourceCreated(id)).await;

        match rx.recv().await {
            Some(Event::ResourceCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out.
        sender.send_or_log(Event::EmployeeDeleted(Uuid::new_v4())).await;
    }

    #[test]
    fn events_serialize_under_variant_names() {
        // Newtype variants must serialize too, not just struct variants.
        let id = Uuid::new_v4();
        let json = serde_json::to_value(Event::ResourceCreated(id)).unwrap();
        assert_eq!(json["resource_created"], id.to_string());

        let event = Event::AllocationClosed {
            allocation_id: Uuid::nil(),
            resource_id: Uuid::nil(),
            status: "Returned".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["allocation_closed"]["status"], "Returned");
    }
}
