use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use crate::core::clock::Clock;
use crate::core::library::{LibraryError, LibraryResult};
use crate::store::{CirculationStore, ItemGuard};
use crate::store::ledger::ItemLedger;

// row that must be re-read after the lock is held, on top of the item's live rows
enum Subject<'a> {
    Item,
    Loan(&'a str),
    Reservation(&'a str),
}

// ItemLocker runs every mutating operation as a synchronous closure over an ItemLedger loaded
// while the item's exclusive lock is held. The ledger is committed only when the closure
// succeeds and the lock is always released before control returns to the caller.
pub struct ItemLocker {
    store: Arc<dyn CirculationStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl ItemLocker {
    pub fn new(store: Arc<dyn CirculationStore>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            store,
            clock,
            timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn CirculationStore> {
        &self.store
    }

    pub async fn with_item_lock<T, F>(&self, item_id: &str, f: F) -> LibraryResult<T>
        where T: Send, F: FnOnce(&mut ItemLedger) -> LibraryResult<T> + Send {
        self.locked(item_id, Subject::Item, f).await
    }

    // locks the loan's item; the loan row is re-read under the lock so a racing return is seen
    pub async fn with_loan_lock<T, F>(&self, loan_id: &str, f: F) -> LibraryResult<T>
        where T: Send, F: FnOnce(&mut ItemLedger) -> LibraryResult<T> + Send {
        let loan = self.store.find_loan(loan_id).await?;
        self.locked(loan.item_id.as_str(), Subject::Loan(loan_id), f).await
    }

    pub async fn with_reservation_lock<T, F>(&self, reservation_id: &str, f: F) -> LibraryResult<T>
        where T: Send, F: FnOnce(&mut ItemLedger) -> LibraryResult<T> + Send {
        let hold = self.store.find_reservation(reservation_id).await?;
        self.locked(hold.item_id.as_str(), Subject::Reservation(reservation_id), f).await
    }

    async fn locked<T, F>(&self, item_id: &str, subject: Subject<'_>, f: F) -> LibraryResult<T>
        where T: Send, F: FnOnce(&mut ItemLedger) -> LibraryResult<T> + Send {
        let guard = match self.store.acquire(item_id, self.timeout).await {
            Ok(guard) => guard,
            Err(err) => {
                if err.retryable() {
                    warn!(item_id, timeout_ms = self.timeout.as_millis() as u64, "item lock not acquired");
                }
                return Err(err);
            }
        };
        let res = self.transact(&guard, subject, f).await;
        if let Err(err) = self.store.release(guard).await {
            warn!(item_id, error = %err, "failed to release item lock");
        }
        res
    }

    async fn transact<T, F>(&self, guard: &ItemGuard, subject: Subject<'_>, f: F) -> LibraryResult<T>
        where T: Send, F: FnOnce(&mut ItemLedger) -> LibraryResult<T> + Send {
        let mut ledger = self.store.load(guard).await?;
        match subject {
            Subject::Item => {}
            Subject::Loan(loan_id) => {
                let loan = self.store.find_loan(loan_id).await?;
                if loan.item_id != ledger.item_id() {
                    return Err(LibraryError::runtime(
                        format!("loan {} moved off item {}", loan_id, ledger.item_id()).as_str(), None));
                }
                ledger.attach_loan(loan);
            }
            Subject::Reservation(reservation_id) => {
                let hold = self.store.find_reservation(reservation_id).await?;
                if hold.item_id != ledger.item_id() {
                    return Err(LibraryError::runtime(
                        format!("reservation {} moved off item {}", reservation_id, ledger.item_id()).as_str(), None));
                }
                ledger.attach_reservation(hold);
            }
        }

        let out = match f(&mut ledger) {
            Ok(out) => out,
            Err(err) => {
                debug!(item_id = guard.item_id(), error = %err, "rolled back");
                return Err(err);
            }
        };
        ledger.sync_item_status(self.clock.now());
        if ledger.is_dirty() {
            self.store.commit(guard, &ledger).await?;
            debug!(item_id = guard.item_id(), item_status = %ledger.item().item_status, "committed");
        }
        Ok(out)
    }
}
