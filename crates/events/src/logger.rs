//! Background subscriber that writes every domain event to the log.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::DomainEvent;

pub struct EventLogger;

impl EventLogger {
    /// Consume events until the bus closes or `cancel` fires.
    pub async fn run(mut receiver: broadcast::Receiver<DomainEvent>, cancel: CancellationToken) {
        tracing::info!("Event logger started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Event logger stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => Self::record(&event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, event logger shutting down");
                        break;
                    }
                },
            }
        }
    }

    fn record(event: &DomainEvent) {
        tracing::info!(
            event_type = %event.event_type,
            entity_type = ?event.source_entity_type,
            entity_id = ?event.source_entity_id,
            listing_id = ?event.listing_id,
            actor_user_id = ?event.actor_user_id,
            payload = %event.payload,
            "Domain event"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bus::EventBus;

    #[tokio::test]
    async fn stops_on_cancel() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(EventLogger::run(bus.subscribe(), cancel.clone()));

        bus.publish(DomainEvent::new("nda.requested"));
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("logger should stop")
            .expect("logger task should not panic");
    }

    #[tokio::test]
    async fn stops_when_bus_dropped() {
        let bus = EventBus::default();
        let rx = bus.subscribe();
        drop(bus);
        tokio::time::timeout(Duration::from_secs(5), EventLogger::run(rx, CancellationToken::new()))
            .await
            .expect("logger should stop once the bus is gone");
    }
}
