use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::core::library::ReservationStatus;
use crate::reservations::domain::model::ReservationEntity;
use crate::utils::date::{opt_serializer, serializer};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ReservationDto {
    pub reservation_id: String,
    pub version: i64,
    pub item_id: String,
    pub borrower_id: String,
    pub reservation_status: ReservationStatus,
    pub queue_position: Option<i64>,
    #[serde(with = "opt_serializer")]
    pub ready_at: Option<NaiveDateTime>,
    #[serde(with = "opt_serializer")]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    // hold promoted because this one was cancelled while ready
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub promoted: Option<Box<ReservationDto>>,
}

impl ReservationDto {
    pub fn with_promoted(mut self, promoted: Option<ReservationDto>) -> Self {
        self.promoted = promoted.map(Box::new);
        self
    }
}

impl From<&ReservationEntity> for ReservationDto {
    fn from(other: &ReservationEntity) -> ReservationDto {
        ReservationDto {
            reservation_id: other.reservation_id.to_string(),
            version: other.version,
            item_id: other.item_id.to_string(),
            borrower_id: other.borrower_id.to_string(),
            reservation_status: other.reservation_status,
            queue_position: other.queue_position,
            ready_at: other.ready_at,
            expires_at: other.expires_at,
            created_at: other.created_at,
            promoted: None,
        }
    }
}

impl Identifiable for ReservationDto {
    fn id(&self) -> String {
        self.reservation_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
