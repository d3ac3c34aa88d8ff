use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult, ReservationStatus};
use crate::utils::date::{opt_serializer, serializer};

// ReservationEntity abstracts a borrower's place in line for an unavailable item.
// queue_position is only meaningful while the hold is waiting.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ReservationEntity {
    pub reservation_id: String,
    pub version: i64,
    pub branch_id: String,
    pub item_id: String,
    pub borrower_id: String,
    pub reservation_status: ReservationStatus,
    pub queue_position: Option<i64>,
    #[serde(with = "opt_serializer")]
    pub ready_at: Option<NaiveDateTime>,
    #[serde(with = "opt_serializer")]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(with = "opt_serializer")]
    pub closed_at: Option<NaiveDateTime>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl ReservationEntity {
    pub fn new(branch_id: &str, item_id: &str, borrower_id: &str,
               queue_position: i64, created_at: NaiveDateTime) -> Self {
        Self {
            reservation_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: branch_id.to_string(),
            item_id: item_id.to_string(),
            borrower_id: borrower_id.to_string(),
            reservation_status: ReservationStatus::Waiting,
            queue_position: Some(queue_position),
            ready_at: None,
            expires_at: None,
            closed_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_live(&self) -> bool {
        self.reservation_status.is_live()
    }

    // a ready hold whose window has lapsed strictly before now
    pub fn is_lapsed(&self, now: NaiveDateTime) -> bool {
        self.reservation_status == ReservationStatus::Ready &&
            self.expires_at.map(|at| at < now).unwrap_or(false)
    }

    pub fn promote(&mut self, now: NaiveDateTime, window: Duration) -> LibraryResult<()> {
        self.transition(ReservationStatus::Ready, now)?;
        self.queue_position = None;
        self.ready_at = Some(now);
        self.expires_at = Some(now + window);
        Ok(())
    }

    pub fn fulfil(&mut self, now: NaiveDateTime) -> LibraryResult<()> {
        self.transition(ReservationStatus::Fulfilled, now)?;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn expire(&mut self, now: NaiveDateTime) -> LibraryResult<()> {
        self.transition(ReservationStatus::Expired, now)?;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: NaiveDateTime) -> LibraryResult<()> {
        self.transition(ReservationStatus::Cancelled, now)?;
        self.queue_position = None;
        self.closed_at = Some(now);
        Ok(())
    }

    fn transition(&mut self, next: ReservationStatus, now: NaiveDateTime) -> LibraryResult<()> {
        if !self.reservation_status.can_transition_to(next) {
            return Err(LibraryError::illegal_transition(
                format!("reservation {} cannot move from {} to {}",
                        self.reservation_id, self.reservation_status, next).as_str()));
        }
        self.reservation_status = next;
        self.updated_at = now;
        Ok(())
    }
}

impl Identifiable for ReservationEntity {
    fn id(&self) -> String {
        self.reservation_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use crate::core::library::{CirculationRule, ReservationStatus};
    use crate::reservations::domain::model::ReservationEntity;

    #[tokio::test]
    async fn test_should_build_reservation() {
        let hold = ReservationEntity::new("branch", "item1", "borrower1", 1, Utc::now().naive_utc());
        assert_eq!("item1", hold.item_id.as_str());
        assert_eq!("borrower1", hold.borrower_id.as_str());
        assert_eq!(ReservationStatus::Waiting, hold.reservation_status);
        assert_eq!(Some(1), hold.queue_position);
    }

    #[tokio::test]
    async fn test_should_promote_and_lapse() {
        let now = Utc::now().naive_utc();
        let mut hold = ReservationEntity::new("branch", "item1", "borrower1", 1, now);
        hold.promote(now, Duration::days(7)).expect("should promote");
        assert_eq!(ReservationStatus::Ready, hold.reservation_status);
        assert_eq!(None, hold.queue_position);
        assert_eq!(Some(now + Duration::days(7)), hold.expires_at);
        assert!(!hold.is_lapsed(now + Duration::days(7)));
        assert!(hold.is_lapsed(now + Duration::days(7) + Duration::seconds(1)));
        hold.expire(now + Duration::days(8)).expect("should expire");
        assert!(!hold.is_live());
    }

    #[tokio::test]
    async fn test_should_reject_illegal_transitions() {
        let now = Utc::now().naive_utc();
        let mut hold = ReservationEntity::new("branch", "item1", "borrower1", 1, now);
        let err = hold.fulfil(now).expect_err("waiting hold cannot be fulfilled");
        assert_eq!(Some(CirculationRule::IllegalTransition), err.rule());
        assert!(hold.expire(now).is_err());
        hold.cancel(now).expect("should cancel");
        assert!(hold.cancel(now).is_err());
        assert!(hold.promote(now, Duration::days(1)).is_err());
        assert_eq!(ReservationStatus::Cancelled, hold.reservation_status);
    }
}
