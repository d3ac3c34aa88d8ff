use std::sync::atomic::{AtomicBool, Ordering};
use async_trait::async_trait;
use tokio::sync::Mutex;
use crate::core::events::{CirculationEvent, EventCode};
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::NotificationGateway;

// RecordingGateway keeps every delivered event; with failing set it rejects them instead.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    events: Mutex<Vec<CirculationEvent>>,
    failing: AtomicBool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn events(&self) -> Vec<CirculationEvent> {
        self.events.lock().await.clone()
    }

    pub async fn codes(&self) -> Vec<EventCode> {
        self.events.lock().await.iter().map(|e| e.code).collect()
    }

    pub async fn for_borrower(&self, borrower_id: &str) -> Vec<EventCode> {
        self.events.lock().await.iter()
            .filter(|e| e.borrower_id == borrower_id).map(|e| e.code).collect()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn trigger_event(&self, event: &CirculationEvent) -> LibraryResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LibraryError::unavailable(
                format!("gateway rejected {}", event.code).as_str(), Some("GatewayDown".to_string()), true));
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
