use async_trait::async_trait;
use tracing::info;
use crate::core::events::CirculationEvent;
use crate::core::library::LibraryResult;
use crate::gateway::events::NotificationGateway;

// LogGateway writes events to the trace log only, used with the in-memory store.
#[derive(Debug, Default)]
pub struct LogGateway {}

impl LogGateway {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl NotificationGateway for LogGateway {
    async fn trigger_event(&self, event: &CirculationEvent) -> LibraryResult<()> {
        info!(event_id = event.event_id.as_str(), code = %event.code, item_id = event.item_id.as_str(),
            borrower_id = event.borrower_id.as_str(), key = event.key.as_str(), "circulation event");
        Ok(())
    }
}
