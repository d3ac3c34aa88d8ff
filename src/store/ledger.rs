use std::collections::HashSet;
use chrono::NaiveDateTime;
use crate::core::library::{ItemStatus, LibraryError, LibraryResult, ReservationStatus};
use crate::items::domain::model::ItemEntity;
use crate::loans::domain::model::LoanEntity;
use crate::reservations::domain::model::ReservationEntity;

// ItemLedger holds the item row plus every row that depends on it, read under the item lock.
// Mutations reach the store only on commit; rows handed out through the _mut accessors or
// inserted are tracked as dirty and written on commit.
#[derive(Debug, Clone)]
pub struct ItemLedger {
    item: ItemEntity,
    loaded_status: ItemStatus,
    loans: Vec<LoanEntity>,
    reservations: Vec<ReservationEntity>,
    dirty_loans: HashSet<String>,
    dirty_reservations: HashSet<String>,
}

impl ItemLedger {
    pub fn new(item: ItemEntity, loans: Vec<LoanEntity>, reservations: Vec<ReservationEntity>) -> Self {
        Self {
            loaded_status: item.item_status,
            item,
            loans,
            reservations,
            dirty_loans: HashSet::new(),
            dirty_reservations: HashSet::new(),
        }
    }

    pub fn item(&self) -> &ItemEntity {
        &self.item
    }

    pub fn item_id(&self) -> &str {
        self.item.item_id.as_str()
    }

    pub fn loans(&self) -> &[LoanEntity] {
        &self.loans
    }

    pub fn reservations(&self) -> &[ReservationEntity] {
        &self.reservations
    }

    pub fn open_loan(&self) -> Option<&LoanEntity> {
        self.loans.iter().find(|l| l.is_open())
    }

    pub fn loan(&self, loan_id: &str) -> Option<&LoanEntity> {
        self.loans.iter().find(|l| l.loan_id == loan_id)
    }

    pub fn loan_mut(&mut self, loan_id: &str) -> Option<&mut LoanEntity> {
        let loan = self.loans.iter_mut().find(|l| l.loan_id == loan_id)?;
        self.dirty_loans.insert(loan.loan_id.to_string());
        Some(loan)
    }

    pub fn insert_loan(&mut self, loan: LoanEntity) -> LibraryResult<()> {
        if loan.is_open() {
            if let Some(open) = self.open_loan() {
                return Err(LibraryError::item_not_available(
                    format!("item {} is already on loan {}", self.item.item_id, open.loan_id).as_str()));
            }
        }
        self.dirty_loans.insert(loan.loan_id.to_string());
        self.loans.push(loan);
        Ok(())
    }

    // adds a row read under the lock that was outside the loaded set, e.g. a returned loan
    pub fn attach_loan(&mut self, loan: LoanEntity) {
        if self.loan(loan.loan_id.as_str()).is_none() {
            self.loans.push(loan);
        }
    }

    pub fn reservation(&self, reservation_id: &str) -> Option<&ReservationEntity> {
        self.reservations.iter().find(|r| r.reservation_id == reservation_id)
    }

    pub fn reservation_mut(&mut self, reservation_id: &str) -> Option<&mut ReservationEntity> {
        let hold = self.reservations.iter_mut().find(|r| r.reservation_id == reservation_id)?;
        self.dirty_reservations.insert(hold.reservation_id.to_string());
        Some(hold)
    }

    pub fn insert_reservation(&mut self, reservation: ReservationEntity) {
        self.dirty_reservations.insert(reservation.reservation_id.to_string());
        self.reservations.push(reservation);
    }

    pub fn attach_reservation(&mut self, reservation: ReservationEntity) {
        if self.reservation(reservation.reservation_id.as_str()).is_none() {
            self.reservations.push(reservation);
        }
    }

    pub fn ready_reservation(&self) -> Option<&ReservationEntity> {
        self.reservations.iter().find(|r| r.reservation_status == ReservationStatus::Ready)
    }

    pub fn live_hold_for(&self, borrower_id: &str) -> Option<&ReservationEntity> {
        self.reservations.iter().find(|r| r.is_live() && r.borrower_id == borrower_id)
    }

    // waiting reservations in queue order
    pub fn waiting(&self) -> Vec<&ReservationEntity> {
        let mut waiting: Vec<&ReservationEntity> = self.reservations.iter()
            .filter(|r| r.reservation_status == ReservationStatus::Waiting)
            .collect();
        waiting.sort_by_key(|r| (r.queue_position.unwrap_or(i64::MAX), r.created_at));
        waiting
    }

    pub fn max_queue_position(&self) -> i64 {
        self.waiting().iter().filter_map(|r| r.queue_position).max().unwrap_or(0)
    }

    pub fn derived_status(&self) -> ItemStatus {
        if self.open_loan().is_some() {
            ItemStatus::Loaned
        } else if self.ready_reservation().is_some() {
            ItemStatus::Reserved
        } else {
            ItemStatus::Available
        }
    }

    // sets the item status from the loans and reservations, never from outside
    pub fn sync_item_status(&mut self, now: NaiveDateTime) -> ItemStatus {
        let status = self.derived_status();
        if self.item.item_status != status {
            self.item.item_status = status;
            self.item.updated_at = now;
        }
        status
    }

    pub fn item_changed(&self) -> bool {
        self.item.item_status != self.loaded_status
    }

    pub fn is_dirty(&self) -> bool {
        self.item_changed() || !self.dirty_loans.is_empty() || !self.dirty_reservations.is_empty()
    }

    pub fn dirty_loans(&self) -> Vec<&LoanEntity> {
        self.loans.iter().filter(|l| self.dirty_loans.contains(&l.loan_id)).collect()
    }

    pub fn dirty_reservations(&self) -> Vec<&ReservationEntity> {
        self.reservations.iter().filter(|r| self.dirty_reservations.contains(&r.reservation_id)).collect()
    }

    pub fn open_loan_ids(&self) -> Vec<String> {
        self.loans.iter().filter(|l| l.is_open()).map(|l| l.loan_id.to_string()).collect()
    }

    pub fn live_hold_ids(&self) -> Vec<String> {
        self.reservations.iter().filter(|r| r.is_live()).map(|r| r.reservation_id.to_string()).collect()
    }
}
