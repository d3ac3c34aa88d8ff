use async_trait::async_trait;
use crate::core::events::CirculationEvent;
use crate::core::library::LibraryResult;

// NotificationGateway delivers one committed event to the borrower it concerns.
#[async_trait]
pub trait NotificationGateway: Sync + Send {
    async fn trigger_event(&self, event: &CirculationEvent) -> LibraryResult<()>;
}
