use chrono::{Duration, NaiveDateTime};
use crate::core::library::{LibraryError, LibraryResult};
use crate::loans::domain::model::LoanEntity;
use crate::reservations::domain::model::ReservationEntity;
use crate::reservations::domain::queue;
use crate::store::ledger::ItemLedger;

#[derive(Debug, Clone, PartialEq)]
pub struct Lent {
    pub loan: LoanEntity,
    // the borrower's ready hold, closed by this loan
    pub fulfilled: Option<ReservationEntity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Returned {
    pub loan: LoanEntity,
    pub promoted: Option<ReservationEntity>,
}

// Opens a loan on the locked item. A reserved item only goes to the holder of its ready hold.
pub fn lend(ledger: &mut ItemLedger, branch_id: &str, borrower_id: &str,
            now: NaiveDateTime, due_at: NaiveDateTime) -> LibraryResult<Lent> {
    if let Some(open) = ledger.open_loan() {
        return Err(LibraryError::item_not_available(
            format!("item {} is on loan {}", ledger.item_id(), open.loan_id).as_str()));
    }
    if let Some(ready) = ledger.ready_reservation() {
        if ready.borrower_id != borrower_id {
            return Err(LibraryError::item_not_available(
                format!("item {} is reserved for another borrower", ledger.item_id()).as_str()));
        }
    }
    let fulfilled = queue::fulfil(ledger, borrower_id, now)?;
    let loan = LoanEntity::new(branch_id, ledger.item_id(), borrower_id, now, due_at);
    ledger.insert_loan(loan.clone())?;
    Ok(Lent { loan, fulfilled })
}

// Closes the loan and hands the item to the head of the queue in the same transaction.
pub fn take_back(ledger: &mut ItemLedger, loan_id: &str, now: NaiveDateTime,
                 window: Duration) -> LibraryResult<Returned> {
    let loan = match ledger.loan_mut(loan_id) {
        Some(loan) => {
            loan.mark_returned(now)?;
            loan.clone()
        }
        None => return Err(LibraryError::not_found(format!("loan not found for {}", loan_id).as_str())),
    };
    let promoted = queue::promote_next(ledger, now, window)?;
    Ok(Returned { loan, promoted })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use crate::core::library::{CirculationRule, ItemKind, ItemStatus, LoanStatus, ReservationStatus};
    use crate::items::domain::model::ItemEntity;
    use crate::loans::domain::desk::{lend, take_back};
    use crate::reservations::domain::queue;
    use crate::store::ledger::ItemLedger;

    #[tokio::test]
    async fn test_should_lend_and_take_back() {
        let now = Utc::now().naive_utc();
        let mut ledger = ItemLedger::new(ItemEntity::new("test", ItemKind::Film, "Alien"), vec![], vec![]);
        let lent = lend(&mut ledger, "test", "a", now, now + Duration::days(21)).expect("should lend");
        assert_eq!(None, lent.fulfilled);
        assert_eq!(ItemStatus::Loaned, ledger.sync_item_status(now));
        let err = lend(&mut ledger, "test", "b", now, now + Duration::days(21)).expect_err("on loan");
        assert_eq!(Some(CirculationRule::ItemNotAvailable), err.rule());

        let returned = take_back(&mut ledger, lent.loan.loan_id.as_str(), now, Duration::days(7)).expect("should return");
        assert_eq!(LoanStatus::Returned, returned.loan.loan_status);
        assert_eq!(None, returned.promoted);
        assert_eq!(ItemStatus::Available, ledger.sync_item_status(now));
        let err = take_back(&mut ledger, lent.loan.loan_id.as_str(), now, Duration::days(7)).expect_err("twice");
        assert_eq!(Some(CirculationRule::AlreadyReturned), err.rule());
    }

    #[tokio::test]
    async fn test_should_reserve_item_for_ready_holder() {
        let now = Utc::now().naive_utc();
        let mut ledger = ItemLedger::new(ItemEntity::new("test", ItemKind::Film, "Alien"), vec![], vec![]);
        let lent = lend(&mut ledger, "test", "a", now, now + Duration::days(21)).unwrap();
        ledger.sync_item_status(now);
        let hold = queue::enqueue(&mut ledger, "test", "b", now).unwrap();
        let returned = take_back(&mut ledger, lent.loan.loan_id.as_str(), now, Duration::days(7)).unwrap();
        assert_eq!(Some(hold.reservation_id.clone()), returned.promoted.map(|r| r.reservation_id));
        assert_eq!(ItemStatus::Reserved, ledger.sync_item_status(now));

        let err = lend(&mut ledger, "test", "c", now, now + Duration::days(21)).expect_err("reserved for b");
        assert_eq!(Some(CirculationRule::ItemNotAvailable), err.rule());
        let lent = lend(&mut ledger, "test", "b", now, now + Duration::days(21)).expect("holder may borrow");
        assert_eq!(Some(ReservationStatus::Fulfilled), lent.fulfilled.map(|r| r.reservation_status));
        assert_eq!(ItemStatus::Loaned, ledger.sync_item_status(now));
    }
}
