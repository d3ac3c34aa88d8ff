use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::reservations::domain::ReservationService;
use crate::reservations::dto::ReservationDto;

pub struct CancelHoldCommand {
    reservation_service: Arc<dyn ReservationService>,
}

impl CancelHoldCommand {
    pub fn new(reservation_service: Arc<dyn ReservationService>) -> Self {
        Self {
            reservation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CancelHoldCommandRequest {
    reservation_id: String,
}

impl CancelHoldCommandRequest {
    pub fn new(reservation_id: &str) -> Self {
        Self {
            reservation_id: reservation_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelHoldCommandResponse {
    pub reservation: ReservationDto,
}

impl CancelHoldCommandResponse {
    pub fn new(reservation: ReservationDto) -> Self {
        Self {
            reservation,
        }
    }
}

#[async_trait]
impl Command<CancelHoldCommandRequest, CancelHoldCommandResponse> for CancelHoldCommand {
    async fn execute(&self, req: CancelHoldCommandRequest) -> Result<CancelHoldCommandResponse, CommandError> {
        self.reservation_service.cancel(req.reservation_id.as_str())
            .await.map_err(CommandError::from).map(CancelHoldCommandResponse::new)
    }
}
