pub mod ddb;
pub mod factory;
pub mod ledger;
pub mod locker;
pub mod memory;

use std::time::Duration;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::OwnedMutexGuard;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::items::domain::model::ItemEntity;
use crate::loans::domain::model::LoanEntity;
use crate::reservations::domain::model::ReservationEntity;
use crate::store::ledger::ItemLedger;

// ItemGuard is proof that the exclusive lock on one item row is held. An in-process lock is
// released when the guard drops, a leased lock when the store releases it or the lease lapses.
#[derive(Debug)]
pub struct ItemGuard {
    item_id: String,
    token: String,
    _local: Option<OwnedMutexGuard<()>>,
}

impl ItemGuard {
    pub(crate) fn local(item_id: &str, token: &str, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            item_id: item_id.to_string(),
            token: token.to_string(),
            _local: Some(guard),
        }
    }

    pub(crate) fn leased(item_id: &str, token: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            token: token.to_string(),
            _local: None,
        }
    }

    pub fn item_id(&self) -> &str {
        self.item_id.as_str()
    }

    pub fn token(&self) -> &str {
        self.token.as_str()
    }
}

// CirculationStore persists items together with the loans and reservations that depend on them.
// All writes go through commit while the item's guard is held, so one commit is one transaction.
#[async_trait]
pub trait CirculationStore: Sync + Send {
    // administrative seeding, outside the circulation core
    async fn add_item(&self, item: &ItemEntity) -> LibraryResult<()>;

    // unlocked read of the last committed item row
    async fn get_item(&self, item_id: &str) -> LibraryResult<ItemEntity>;

    // takes the exclusive lock on the item row, fails with busy once the timeout elapses
    async fn acquire(&self, item_id: &str, timeout: Duration) -> LibraryResult<ItemGuard>;

    // reads the item with its open loans and live reservations under the lock
    async fn load(&self, guard: &ItemGuard) -> LibraryResult<ItemLedger>;

    // writes the changed rows of the ledger atomically
    async fn commit(&self, guard: &ItemGuard, ledger: &ItemLedger) -> LibraryResult<()>;

    async fn release(&self, guard: ItemGuard) -> LibraryResult<()>;

    async fn find_loan(&self, loan_id: &str) -> LibraryResult<LoanEntity>;

    async fn find_reservation(&self, reservation_id: &str) -> LibraryResult<ReservationEntity>;

    // live reservations of the item, ready hold first and then by queue position
    async fn list_reservations(&self, item_id: &str) -> LibraryResult<Vec<ReservationEntity>>;

    async fn count_live_holds(&self, borrower_id: &str) -> LibraryResult<usize>;

    // ready reservations whose window lapsed before now
    async fn query_expired_holds(&self, now: NaiveDateTime, page: Option<&str>,
                                 page_size: usize) -> LibraryResult<PaginatedResult<ReservationEntity>>;

    // active loans whose due date passed before now
    async fn query_overdue_loans(&self, now: NaiveDateTime, page: Option<&str>,
                                 page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>>;
}
