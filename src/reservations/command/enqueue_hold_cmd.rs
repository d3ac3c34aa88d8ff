use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::reservations::domain::ReservationService;
use crate::reservations::dto::ReservationDto;

pub struct EnqueueHoldCommand {
    reservation_service: Arc<dyn ReservationService>,
}

impl EnqueueHoldCommand {
    pub fn new(reservation_service: Arc<dyn ReservationService>) -> Self {
        Self {
            reservation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnqueueHoldCommandRequest {
    item_id: String,
    borrower_id: String,
}

impl EnqueueHoldCommandRequest {
    pub fn new(item_id: &str, borrower_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            borrower_id: borrower_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnqueueHoldCommandResponse {
    pub reservation: ReservationDto,
}

impl EnqueueHoldCommandResponse {
    pub fn new(reservation: ReservationDto) -> Self {
        Self {
            reservation,
        }
    }
}

#[async_trait]
impl Command<EnqueueHoldCommandRequest, EnqueueHoldCommandResponse> for EnqueueHoldCommand {
    async fn execute(&self, req: EnqueueHoldCommandRequest) -> Result<EnqueueHoldCommandResponse, CommandError> {
        self.reservation_service.enqueue(req.item_id.as_str(), req.borrower_id.as_str())
            .await.map_err(CommandError::from).map(EnqueueHoldCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::command::{Command, CommandError};
    use crate::core::library::{CirculationRule, MemberStanding, ReservationStatus};
    use crate::reservations::command::enqueue_hold_cmd::{EnqueueHoldCommand, EnqueueHoldCommandRequest};
    use crate::testing::Circulation;

    #[tokio::test]
    async fn test_should_run_enqueue_hold() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let b = lib.member("b").await;
        lib.loans().create_loan(item.as_str(), a.as_str(), None).await.unwrap();
        let cmd = EnqueueHoldCommand::new(lib.reservations());

        let res = cmd.execute(EnqueueHoldCommandRequest::new(item.as_str(), b.as_str())).await.expect("should enqueue");
        assert_eq!(ReservationStatus::Waiting, res.reservation.reservation_status);
        assert_eq!(Some(1), res.reservation.queue_position);

        lib.members.enroll("s", MemberStanding::Suspended).await;
        let err = cmd.execute(EnqueueHoldCommandRequest::new(item.as_str(), "s")).await.expect_err("suspended");
        assert!(matches!(err, CommandError::Conflict { rule: CirculationRule::BorrowerNotEligible, .. }));
        let err = cmd.execute(EnqueueHoldCommandRequest::new("", b.as_str())).await.expect_err("blank item");
        assert!(matches!(err, CommandError::Validation { .. }));
    }
}
