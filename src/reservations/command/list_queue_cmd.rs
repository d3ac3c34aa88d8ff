use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::reservations::domain::ReservationService;
use crate::reservations::dto::ReservationDto;

pub struct ListQueueCommand {
    reservation_service: Arc<dyn ReservationService>,
}

impl ListQueueCommand {
    pub fn new(reservation_service: Arc<dyn ReservationService>) -> Self {
        Self {
            reservation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQueueCommandRequest {
    item_id: String,
}

impl ListQueueCommandRequest {
    pub fn new(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListQueueCommandResponse {
    pub item_id: String,
    pub reservations: Vec<ReservationDto>,
}

#[async_trait]
impl Command<ListQueueCommandRequest, ListQueueCommandResponse> for ListQueueCommand {
    async fn execute(&self, req: ListQueueCommandRequest) -> Result<ListQueueCommandResponse, CommandError> {
        let reservations = self.reservation_service.queue(req.item_id.as_str()).await.map_err(CommandError::from)?;
        Ok(ListQueueCommandResponse { item_id: req.item_id, reservations })
    }
}

#[cfg(test)]
mod tests {
    use crate::core::command::{Command, CommandError};
    use crate::reservations::command::list_queue_cmd::{ListQueueCommand, ListQueueCommandRequest};
    use crate::testing::Circulation;

    #[tokio::test]
    async fn test_should_run_list_queue() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let b = lib.member("b").await;
        lib.loans().create_loan(item.as_str(), a.as_str(), None).await.unwrap();
        lib.reservations().enqueue(item.as_str(), b.as_str()).await.unwrap();
        let cmd = ListQueueCommand::new(lib.reservations());

        let res = cmd.execute(ListQueueCommandRequest::new(item.as_str())).await.expect("should list");
        assert_eq!(1, res.reservations.len());
        assert_eq!("b", res.reservations[0].borrower_id.as_str());
        let err = cmd.execute(ListQueueCommandRequest::new("missing")).await.expect_err("no such item");
        assert!(matches!(err, CommandError::NotFound { .. }));
    }
}
