pub mod ddb;
pub mod events;
pub mod factory;
pub mod logs;
pub mod memory;
pub mod sns;

use tracing::{debug, warn};
use crate::core::events::CirculationEvent;
use crate::gateway::events::NotificationGateway;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum GatewayPublisherVia {
    Sns,
    LocalDynamoDB,
    Logs,
}

// Hands committed events to the gateway. Runs after the item lock is released; a failed
// notification is logged and dropped, it never undoes the state change that produced it.
pub async fn dispatch(gateway: &dyn NotificationGateway, events: Vec<CirculationEvent>) {
    for event in events {
        match gateway.trigger_event(&event).await {
            Ok(_) => {
                debug!(event_id = event.event_id.as_str(), code = %event.code,
                    borrower_id = event.borrower_id.as_str(), "event dispatched");
            }
            Err(err) => {
                warn!(event_id = event.event_id.as_str(), code = %event.code, item_id = event.item_id.as_str(),
                    borrower_id = event.borrower_id.as_str(), error = %err, "failed to dispatch event");
            }
        }
    }
}
