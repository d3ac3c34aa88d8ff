use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::loans::domain::LoanService;
use crate::loans::dto::LoanDto;
use crate::utils::date::opt_serializer;

pub struct CreateLoanCommand {
    loan_service: Arc<dyn LoanService>,
}

impl CreateLoanCommand {
    pub fn new(loan_service: Arc<dyn LoanService>) -> Self {
        Self {
            loan_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLoanCommandRequest {
    item_id: String,
    borrower_id: String,
    #[serde(with = "opt_serializer", default)]
    due_at: Option<NaiveDateTime>,
}

impl CreateLoanCommandRequest {
    pub fn new(item_id: &str, borrower_id: &str, due_at: Option<NaiveDateTime>) -> Self {
        Self {
            item_id: item_id.to_string(),
            borrower_id: borrower_id.to_string(),
            due_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateLoanCommandResponse {
    pub loan: LoanDto,
}

impl CreateLoanCommandResponse {
    pub fn new(loan: LoanDto) -> Self {
        Self {
            loan,
        }
    }
}

#[async_trait]
impl Command<CreateLoanCommandRequest, CreateLoanCommandResponse> for CreateLoanCommand {
    async fn execute(&self, req: CreateLoanCommandRequest) -> Result<CreateLoanCommandResponse, CommandError> {
        self.loan_service.create_loan(req.item_id.as_str(), req.borrower_id.as_str(), req.due_at)
            .await.map_err(CommandError::from).map(CreateLoanCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use crate::core::clock::Clock;
    use crate::core::command::{Command, CommandError};
    use crate::core::library::{CirculationRule, LoanStatus};
    use crate::loans::command::create_loan_cmd::{CreateLoanCommand, CreateLoanCommandRequest};
    use crate::testing::Circulation;

    #[tokio::test]
    async fn test_should_run_create_loan() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let cmd = CreateLoanCommand::new(lib.loans());
        let due_at = lib.clock.now() + Duration::days(3);

        let res = cmd.execute(CreateLoanCommandRequest::new(item.as_str(), a.as_str(), Some(due_at)))
            .await.expect("should create loan");
        assert_eq!(item, res.loan.item_id);
        assert_eq!(LoanStatus::Active, res.loan.loan_status);
        assert_eq!(due_at, res.loan.due_at);

        let err = cmd.execute(CreateLoanCommandRequest::new(item.as_str(), a.as_str(), None))
            .await.expect_err("item is on loan");
        assert!(matches!(err, CommandError::Conflict { rule: CirculationRule::ItemNotAvailable, .. }));
    }

    #[tokio::test]
    async fn test_should_parse_create_loan_request() {
        let req: CreateLoanCommandRequest = serde_json::from_str(r#"{"item_id": "i1", "borrower_id": "b1"}"#)
            .expect("due date is optional");
        assert_eq!(None, req.due_at);
        let req: CreateLoanCommandRequest = serde_json::from_str(
            r#"{"item_id": "i1", "borrower_id": "b1", "due_at": "2026-01-02T10:00:00"}"#).expect("should parse due date");
        assert!(req.due_at.is_some());
    }
}
