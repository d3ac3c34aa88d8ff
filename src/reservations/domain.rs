use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::reservations::dto::ReservationDto;

pub mod model;
pub mod queue;
pub mod service;

// ReservationService is the reservation queue manager for holds placed by borrowers.
#[async_trait]
pub trait ReservationService: Sync + Send {
    async fn enqueue(&self, item_id: &str, borrower_id: &str) -> LibraryResult<ReservationDto>;
    async fn cancel(&self, reservation_id: &str) -> LibraryResult<ReservationDto>;
    // live holds of the item, the ready hold first and then the waiting queue in order
    async fn queue(&self, item_id: &str) -> LibraryResult<Vec<ReservationDto>>;
    async fn find_reservation(&self, reservation_id: &str) -> LibraryResult<ReservationDto>;
}
