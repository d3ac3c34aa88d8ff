use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;
use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult, ReservationStatus};
use crate::items::domain::model::ItemEntity;
use crate::loans::domain::model::LoanEntity;
use crate::reservations::domain::model::ReservationEntity;
use crate::store::{CirculationStore, ItemGuard};
use crate::store::ledger::ItemLedger;

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<String, ItemEntity>,
    loans: HashMap<String, LoanEntity>,
    reservations: HashMap<String, ReservationEntity>,
}

// MemoryCirculationStore keeps every table in process. Each item has its own async mutex that
// plays the role of the row lock, and a commit swaps all changed rows under one write lock.
#[derive(Debug, Default)]
pub struct MemoryCirculationStore {
    tables: RwLock<Tables>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    failing_commits: AtomicUsize,
}

impl MemoryCirculationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // makes the next n commits fail as if the database had gone away
    pub fn fail_next_commits(&self, n: usize) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    // all reservations ever written for the item, including closed ones
    pub async fn reservation_history(&self, item_id: &str) -> Vec<ReservationEntity> {
        let tables = self.tables.read().await;
        let mut history: Vec<ReservationEntity> = tables.reservations.values()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect();
        history.sort_by_key(|r| r.created_at);
        history
    }

    pub async fn loan_history(&self, item_id: &str) -> Vec<LoanEntity> {
        let tables = self.tables.read().await;
        let mut history: Vec<LoanEntity> = tables.loans.values()
            .filter(|l| l.item_id == item_id)
            .cloned()
            .collect();
        history.sort_by_key(|l| l.started_at);
        history
    }

    fn take_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n - 1) } else { None })
            .is_ok()
    }
}

fn page_offset(page: Option<&str>) -> usize {
    page.and_then(|p| p.parse::<usize>().ok()).unwrap_or(0)
}

fn paginate<T: Clone>(records: Vec<T>, page: Option<&str>, page_size: usize) -> PaginatedResult<T> {
    let offset = page_offset(page);
    let end = std::cmp::min(offset + page_size, records.len());
    let slice = if offset < end { records[offset..end].to_vec() } else { vec![] };
    let next_page = if end < records.len() { Some(end.to_string()) } else { None };
    PaginatedResult::new(page, page_size, next_page, slice)
}

#[async_trait]
impl CirculationStore for MemoryCirculationStore {
    async fn add_item(&self, item: &ItemEntity) -> LibraryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.items.contains_key(&item.item_id) {
            return Err(LibraryError::validation(format!("item {} already exists", item.item_id).as_str(), None));
        }
        tables.items.insert(item.item_id.to_string(), item.clone());
        Ok(())
    }

    async fn get_item(&self, item_id: &str) -> LibraryResult<ItemEntity> {
        let tables = self.tables.read().await;
        tables.items.get(item_id).cloned()
            .ok_or_else(|| LibraryError::not_found(format!("item not found for {}", item_id).as_str()))
    }

    async fn acquire(&self, item_id: &str, timeout: Duration) -> LibraryResult<ItemGuard> {
        if !self.tables.read().await.items.contains_key(item_id) {
            return Err(LibraryError::not_found(format!("item not found for {}", item_id).as_str()));
        }
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(item_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(ItemGuard::local(item_id, Uuid::new_v4().to_string().as_str(), guard)),
            Err(_) => Err(LibraryError::busy(
                format!("item {} is locked by another request", item_id).as_str())),
        }
    }

    async fn load(&self, guard: &ItemGuard) -> LibraryResult<ItemLedger> {
        let tables = self.tables.read().await;
        let item = tables.items.get(guard.item_id()).cloned()
            .ok_or_else(|| LibraryError::not_found(format!("item not found for {}", guard.item_id()).as_str()))?;
        let loans = tables.loans.values()
            .filter(|l| l.item_id == guard.item_id() && l.is_open())
            .cloned()
            .collect();
        let reservations = tables.reservations.values()
            .filter(|r| r.item_id == guard.item_id() && r.is_live())
            .cloned()
            .collect();
        Ok(ItemLedger::new(item, loans, reservations))
    }

    async fn commit(&self, guard: &ItemGuard, ledger: &ItemLedger) -> LibraryResult<()> {
        if guard.item_id() != ledger.item_id() {
            return Err(LibraryError::runtime(
                format!("guard for {} cannot commit item {}", guard.item_id(), ledger.item_id()).as_str(), None));
        }
        if self.take_failure() {
            return Err(LibraryError::database("injected commit failure", Some("500".to_string()), false));
        }
        let mut tables = self.tables.write().await;
        if ledger.item_changed() {
            let mut item = ledger.item().clone();
            item.version += 1;
            tables.items.insert(item.item_id.to_string(), item);
        }
        for loan in ledger.dirty_loans() {
            let mut loan = loan.clone();
            loan.version += 1;
            tables.loans.insert(loan.loan_id.to_string(), loan);
        }
        for hold in ledger.dirty_reservations() {
            let mut hold = hold.clone();
            hold.version += 1;
            tables.reservations.insert(hold.reservation_id.to_string(), hold);
        }
        Ok(())
    }

    async fn release(&self, guard: ItemGuard) -> LibraryResult<()> {
        drop(guard);
        Ok(())
    }

    async fn find_loan(&self, loan_id: &str) -> LibraryResult<LoanEntity> {
        let tables = self.tables.read().await;
        tables.loans.get(loan_id).cloned()
            .ok_or_else(|| LibraryError::not_found(format!("loan not found for {}", loan_id).as_str()))
    }

    async fn find_reservation(&self, reservation_id: &str) -> LibraryResult<ReservationEntity> {
        let tables = self.tables.read().await;
        tables.reservations.get(reservation_id).cloned()
            .ok_or_else(|| LibraryError::not_found(format!("reservation not found for {}", reservation_id).as_str()))
    }

    async fn list_reservations(&self, item_id: &str) -> LibraryResult<Vec<ReservationEntity>> {
        let tables = self.tables.read().await;
        if !tables.items.contains_key(item_id) {
            return Err(LibraryError::not_found(format!("item not found for {}", item_id).as_str()));
        }
        let mut live: Vec<ReservationEntity> = tables.reservations.values()
            .filter(|r| r.item_id == item_id && r.is_live())
            .cloned()
            .collect();
        live.sort_by_key(|r| (r.queue_position.unwrap_or(0), r.created_at));
        Ok(live)
    }

    async fn count_live_holds(&self, borrower_id: &str) -> LibraryResult<usize> {
        let tables = self.tables.read().await;
        Ok(tables.reservations.values().filter(|r| r.borrower_id == borrower_id && r.is_live()).count())
    }

    async fn query_expired_holds(&self, now: NaiveDateTime, page: Option<&str>,
                                 page_size: usize) -> LibraryResult<PaginatedResult<ReservationEntity>> {
        let tables = self.tables.read().await;
        let mut expired: Vec<ReservationEntity> = tables.reservations.values()
            .filter(|r| r.reservation_status == ReservationStatus::Ready && r.is_lapsed(now))
            .cloned()
            .collect();
        expired.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.reservation_id.cmp(&b.reservation_id)));
        Ok(paginate(expired, page, page_size))
    }

    async fn query_overdue_loans(&self, now: NaiveDateTime, page: Option<&str>,
                                 page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let tables = self.tables.read().await;
        let mut overdue: Vec<LoanEntity> = tables.loans.values()
            .filter(|l| l.loan_status == LoanStatus::Active && l.due_at < now)
            .cloned()
            .collect();
        overdue.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.loan_id.cmp(&b.loan_id)));
        Ok(paginate(overdue, page, page_size))
    }
}
