use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::core::library::LibraryResult;
use crate::loans::dto::LoanDto;

pub mod desk;
pub mod model;
pub mod service;

// LoanService is the loan transaction manager: the only writer that moves an item between
// available and loaned.
#[async_trait]
pub trait LoanService: Sync + Send {
    async fn create_loan(&self, item_id: &str, borrower_id: &str,
                         requested_due_at: Option<NaiveDateTime>) -> LibraryResult<LoanDto>;
    async fn return_loan(&self, loan_id: &str) -> LibraryResult<LoanDto>;
    async fn find_loan(&self, loan_id: &str) -> LibraryResult<LoanDto>;
}
