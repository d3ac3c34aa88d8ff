use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult, LoanStatus};
use crate::utils::date::{opt_serializer, serializer};

// LoanEntity records an item being in a borrower's possession.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanEntity {
    pub loan_id: String,
    pub version: i64,
    pub branch_id: String,
    pub item_id: String,
    pub borrower_id: String,
    pub loan_status: LoanStatus,
    #[serde(with = "serializer")]
    pub started_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub due_at: NaiveDateTime,
    #[serde(with = "opt_serializer")]
    pub returned_at: Option<NaiveDateTime>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl LoanEntity {
    pub fn new(branch_id: &str, item_id: &str, borrower_id: &str,
               started_at: NaiveDateTime, due_at: NaiveDateTime) -> Self {
        Self {
            loan_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: branch_id.to_string(),
            item_id: item_id.to_string(),
            borrower_id: borrower_id.to_string(),
            loan_status: LoanStatus::Active,
            started_at,
            due_at,
            returned_at: None,
            created_at: started_at,
            updated_at: started_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.loan_status.is_open()
    }

    pub fn mark_returned(&mut self, now: NaiveDateTime) -> LibraryResult<()> {
        if self.loan_status == LoanStatus::Returned {
            return Err(LibraryError::already_returned(
                format!("loan {} was already returned", self.loan_id).as_str()));
        }
        self.loan_status = LoanStatus::Returned;
        self.returned_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    // returns true only when the loan moved from active to overdue
    pub fn mark_overdue(&mut self, now: NaiveDateTime) -> bool {
        if self.loan_status != LoanStatus::Active || self.due_at >= now {
            return false;
        }
        self.loan_status = LoanStatus::Overdue;
        self.updated_at = now;
        true
    }
}

impl Identifiable for LoanEntity {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
