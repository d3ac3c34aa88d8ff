use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::core::library::LoanStatus;
use crate::loans::domain::model::LoanEntity;
use crate::reservations::dto::ReservationDto;
use crate::utils::date::{opt_serializer, serializer};

// LoanDto is the loan as seen by callers. A return that hands the item to the next holder
// carries the promoted hold as well.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanDto {
    pub loan_id: String,
    pub version: i64,
    pub item_id: String,
    pub borrower_id: String,
    pub loan_status: LoanStatus,
    #[serde(with = "serializer")]
    pub started_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub due_at: NaiveDateTime,
    #[serde(with = "opt_serializer")]
    pub returned_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub promoted: Option<ReservationDto>,
}

impl LoanDto {
    pub fn with_promoted(mut self, promoted: Option<ReservationDto>) -> Self {
        self.promoted = promoted;
        self
    }
}

impl From<&LoanEntity> for LoanDto {
    fn from(other: &LoanEntity) -> LoanDto {
        LoanDto {
            loan_id: other.loan_id.to_string(),
            version: other.version,
            item_id: other.item_id.to_string(),
            borrower_id: other.borrower_id.to_string(),
            loan_status: other.loan_status,
            started_at: other.started_at,
            due_at: other.due_at,
            returned_at: other.returned_at,
            promoted: None,
        }
    }
}

impl Identifiable for LoanDto {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
