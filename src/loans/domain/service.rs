use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::info;
use crate::core::clock::Clock;
use crate::core::domain::{Configuration, validate_id};
use crate::core::events::{CirculationEvent, EventCode};
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::dispatch;
use crate::gateway::events::NotificationGateway;
use crate::loans::domain::desk::{lend, take_back};
use crate::loans::domain::LoanService;
use crate::loans::dto::LoanDto;
use crate::members::domain::{ensure_eligible, MemberDirectory};
use crate::reservations::dto::ReservationDto;
use crate::store::locker::ItemLocker;

pub(crate) struct LoanServiceImpl {
    config: Configuration,
    locker: Arc<ItemLocker>,
    members: Arc<dyn MemberDirectory>,
    gateway: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
}

impl LoanServiceImpl {
    pub(crate) fn new(config: &Configuration, locker: Arc<ItemLocker>, members: Arc<dyn MemberDirectory>,
                      gateway: Arc<dyn NotificationGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: config.clone(),
            locker,
            members,
            gateway,
            clock,
        }
    }

    fn due_at(&self, now: NaiveDateTime, requested: Option<NaiveDateTime>) -> LibraryResult<NaiveDateTime> {
        match requested {
            Some(due_at) if due_at <= now => {
                Err(LibraryError::validation(format!("requested due date {} is not in the future",
                                                     due_at).as_str(), Some("400".to_string())))
            }
            Some(due_at) => Ok(due_at),
            None => Ok(now + self.config.loan_period()),
        }
    }
}

#[async_trait]
impl LoanService for LoanServiceImpl {
    async fn create_loan(&self, item_id: &str, borrower_id: &str,
                         requested_due_at: Option<NaiveDateTime>) -> LibraryResult<LoanDto> {
        validate_id("item_id", item_id)?;
        validate_id("borrower_id", borrower_id)?;
        let now = self.clock.now();
        let due_at = self.due_at(now, requested_due_at)?;
        ensure_eligible(self.members.as_ref(), borrower_id).await?;

        let branch_id = self.config.branch_id.as_str();
        let lent = self.locker.with_item_lock(item_id, |ledger| {
            lend(ledger, branch_id, borrower_id, now, due_at)
        }).await?;

        let loan = LoanDto::from(&lent.loan);
        info!(item_id, borrower_id, loan_id = loan.loan_id.as_str(),
            fulfilled = lent.fulfilled.as_ref().map(|r| r.reservation_id.as_str()), "loan created");
        let events = CirculationEvent::staged(EventCode::LoanCreated, item_id, borrower_id,
                                              loan.loan_id.as_str(), &loan, now);
        dispatch(self.gateway.as_ref(), events.into_iter().collect()).await;
        Ok(loan)
    }

    async fn return_loan(&self, loan_id: &str) -> LibraryResult<LoanDto> {
        validate_id("loan_id", loan_id)?;
        let now = self.clock.now();
        let window = self.config.hold_window();
        let returned = self.locker.with_loan_lock(loan_id, |ledger| {
            take_back(ledger, loan_id, now, window)
        }).await?;

        let promoted = returned.promoted.as_ref().map(ReservationDto::from);
        let loan = LoanDto::from(&returned.loan).with_promoted(promoted.clone());
        info!(item_id = loan.item_id.as_str(), borrower_id = loan.borrower_id.as_str(), loan_id,
            promoted = promoted.as_ref().map(|r| r.reservation_id.as_str()), "loan returned");
        let mut events = vec![];
        events.extend(CirculationEvent::staged(EventCode::LoanReturned, loan.item_id.as_str(),
                                               loan.borrower_id.as_str(), loan_id, &loan, now));
        if let Some(hold) = promoted {
            events.extend(CirculationEvent::staged(EventCode::HoldReady, hold.item_id.as_str(),
                                                   hold.borrower_id.as_str(), hold.reservation_id.as_str(), &hold, now));
        }
        dispatch(self.gateway.as_ref(), events).await;
        Ok(loan)
    }

    async fn find_loan(&self, loan_id: &str) -> LibraryResult<LoanDto> {
        validate_id("loan_id", loan_id)?;
        self.locker.store().find_loan(loan_id).await.map(|loan| LoanDto::from(&loan))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use crate::core::clock::Clock;
    use crate::core::events::EventCode;
    use crate::core::library::{CirculationRule, ErrorKind, ItemStatus, LoanStatus, MemberStanding, ReservationStatus};
    use crate::store::CirculationStore;
    use crate::testing::Circulation;

    #[tokio::test]
    async fn test_should_create_and_return_loan() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let svc = lib.loans();

        let loan = svc.create_loan(item.as_str(), a.as_str(), None).await.expect("should create loan");
        assert_eq!(LoanStatus::Active, loan.loan_status);
        assert_eq!(lib.clock.now() + Duration::days(21), loan.due_at);
        assert_eq!(ItemStatus::Loaned, lib.status(item.as_str()).await);

        let returned = svc.return_loan(loan.loan_id.as_str()).await.expect("should return loan");
        assert_eq!(LoanStatus::Returned, returned.loan_status);
        assert_eq!(Some(lib.clock.now()), returned.returned_at);
        assert_eq!(None, returned.promoted);
        assert_eq!(ItemStatus::Available, lib.status(item.as_str()).await);
        assert_eq!(vec![EventCode::LoanCreated, EventCode::LoanReturned], lib.gateway.codes().await);
    }

    #[tokio::test]
    async fn test_should_reject_second_loan_and_double_return() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let b = lib.member("b").await;
        let svc = lib.loans();

        let loan = svc.create_loan(item.as_str(), a.as_str(), None).await.unwrap();
        let err = svc.create_loan(item.as_str(), b.as_str(), None).await.expect_err("item is loaned");
        assert_eq!(Some(CirculationRule::ItemNotAvailable), err.rule());

        svc.return_loan(loan.loan_id.as_str()).await.unwrap();
        let before = lib.store.loan_history(item.as_str()).await;
        let err = svc.return_loan(loan.loan_id.as_str()).await.expect_err("already returned");
        assert_eq!(Some(CirculationRule::AlreadyReturned), err.rule());
        assert_eq!(before, lib.store.loan_history(item.as_str()).await);
        // no event for the rejected calls
        assert_eq!(vec![EventCode::LoanCreated, EventCode::LoanReturned], lib.gateway.codes().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_should_allow_exactly_one_concurrent_loan() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let mut borrowers = vec![];
        for i in 0..16 {
            borrowers.push(lib.member(format!("b{}", i).as_str()).await);
        }
        let svc = lib.loans();
        let mut handles = vec![];
        for borrower in borrowers {
            let svc = svc.clone();
            let item = item.clone();
            handles.push(tokio::spawn(async move {
                svc.create_loan(item.as_str(), borrower.as_str(), None).await
            }));
        }
        let mut created = 0;
        for handle in handles {
            match handle.await.expect("task should finish") {
                Ok(_) => created += 1,
                Err(err) => assert_eq!(Some(CirculationRule::ItemNotAvailable), err.rule()),
            }
        }
        assert_eq!(1, created);
        let open = lib.store.loan_history(item.as_str()).await.iter().filter(|l| l.is_open()).count();
        assert_eq!(1, open);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_should_return_once_under_concurrent_returns() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let b = lib.member("b").await;
        let svc = lib.loans();
        let loan = svc.create_loan(item.as_str(), a.as_str(), None).await.unwrap();
        lib.reservations().enqueue(item.as_str(), b.as_str()).await.unwrap();

        let mut handles = vec![];
        for _ in 0..8 {
            let svc = svc.clone();
            let loan_id = loan.loan_id.clone();
            handles.push(tokio::spawn(async move {
                svc.return_loan(loan_id.as_str()).await
            }));
        }
        let mut returned = 0;
        for handle in handles {
            match handle.await.expect("task should finish") {
                Ok(_) => returned += 1,
                Err(err) => assert_eq!(Some(CirculationRule::AlreadyReturned), err.rule()),
            }
        }
        assert_eq!(1, returned);
        let ready = lib.store.reservation_history(item.as_str()).await.iter()
            .filter(|r| r.reservation_status == ReservationStatus::Ready).count();
        assert_eq!(1, ready);
        assert_eq!(ItemStatus::Reserved, lib.status(item.as_str()).await);
        assert_eq!(1, lib.gateway.codes().await.iter().filter(|c| **c == EventCode::HoldReady).count());
        assert_eq!(1, lib.gateway.codes().await.iter().filter(|c| **c == EventCode::LoanReturned).count());
    }

    #[tokio::test]
    async fn test_should_hand_item_to_queue_head_on_return() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let b = lib.member("b").await;
        let c = lib.member("c").await;
        let loans = lib.loans();
        let holds = lib.reservations();

        let loan = loans.create_loan(item.as_str(), a.as_str(), None).await.unwrap();
        let hold_b = holds.enqueue(item.as_str(), b.as_str()).await.unwrap();
        lib.clock.advance(Duration::seconds(1));
        let hold_c = holds.enqueue(item.as_str(), c.as_str()).await.unwrap();
        assert_eq!(Some(1), hold_b.queue_position);
        assert_eq!(Some(2), hold_c.queue_position);

        lib.clock.advance(Duration::days(3));
        let returned = loans.return_loan(loan.loan_id.as_str()).await.unwrap();
        let promoted = returned.promoted.expect("b should be promoted");
        assert_eq!(hold_b.reservation_id, promoted.reservation_id);
        assert_eq!(ReservationStatus::Ready, promoted.reservation_status);
        assert_eq!(Some(lib.clock.now() + Duration::days(7)), promoted.expires_at);
        assert_eq!(ItemStatus::Reserved, lib.status(item.as_str()).await);
        let queued = lib.store.find_reservation(hold_c.reservation_id.as_str()).await.unwrap();
        assert_eq!(Some(1), queued.queue_position);
        assert_eq!(vec![EventCode::HoldReady], lib.gateway.for_borrower(b.as_str()).await);

        // only the ready holder may borrow the reserved item
        let err = loans.create_loan(item.as_str(), c.as_str(), None).await.expect_err("reserved for b");
        assert_eq!(Some(CirculationRule::ItemNotAvailable), err.rule());
        loans.create_loan(item.as_str(), b.as_str(), None).await.expect("b should borrow");
        let fulfilled = lib.store.find_reservation(hold_b.reservation_id.as_str()).await.unwrap();
        assert_eq!(ReservationStatus::Fulfilled, fulfilled.reservation_status);
        assert_eq!(ItemStatus::Loaned, lib.status(item.as_str()).await);
    }

    #[tokio::test]
    async fn test_should_keep_loan_when_gateway_fails() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        lib.gateway.set_failing(true);
        let loan = lib.loans().create_loan(item.as_str(), a.as_str(), None).await.expect("gateway must not matter");
        assert_eq!(ItemStatus::Loaned, lib.status(item.as_str()).await);
        assert!(lib.store.find_loan(loan.loan_id.as_str()).await.is_ok());
        assert!(lib.gateway.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_should_roll_back_when_commit_fails() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        lib.store.fail_next_commits(1);
        let err = lib.loans().create_loan(item.as_str(), a.as_str(), None).await.expect_err("commit fails");
        assert_eq!(ErrorKind::Infrastructure, err.kind());
        assert_eq!(ItemStatus::Available, lib.status(item.as_str()).await);
        assert!(lib.store.loan_history(item.as_str()).await.is_empty());
        assert!(lib.gateway.events().await.is_empty());
        lib.loans().create_loan(item.as_str(), a.as_str(), None).await.expect("retry should succeed");
    }

    #[tokio::test]
    async fn test_should_validate_before_locking() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let s = lib.member("s").await;
        lib.members.enroll(s.as_str(), MemberStanding::Suspended).await;
        let svc = lib.loans();

        let err = svc.create_loan(item.as_str(), s.as_str(), None).await.expect_err("suspended");
        assert_eq!(Some(CirculationRule::BorrowerNotEligible), err.rule());
        let err = svc.create_loan(item.as_str(), "stranger", None).await.expect_err("unknown");
        assert_eq!(Some(CirculationRule::BorrowerNotEligible), err.rule());
        let err = svc.create_loan("", a.as_str(), None).await.expect_err("blank item");
        assert_eq!(ErrorKind::Validation, err.kind());
        let past = lib.clock.now() - Duration::days(1);
        let err = svc.create_loan(item.as_str(), a.as_str(), Some(past)).await.expect_err("past due date");
        assert_eq!(ErrorKind::Validation, err.kind());
        let err = svc.create_loan("missing", a.as_str(), None).await.expect_err("no such item");
        assert_eq!(ErrorKind::NotFound, err.kind());
        let err = svc.return_loan("missing").await.expect_err("no such loan");
        assert_eq!(ErrorKind::NotFound, err.kind());

        let due = lib.clock.now() + Duration::days(2);
        let loan = svc.create_loan(item.as_str(), a.as_str(), Some(due)).await.expect("should honour due date");
        assert_eq!(due, loan.due_at);
        let found = svc.find_loan(loan.loan_id.as_str()).await.expect("should find loan");
        assert_eq!(loan.loan_id, found.loan_id);
        assert_eq!(due, found.due_at);
    }

    #[tokio::test]
    async fn test_should_fail_busy_when_item_locked() {
        let lib = Circulation::new().await;
        let item = lib.item().await;
        let a = lib.member("a").await;
        let held = lib.store.acquire(item.as_str(), std::time::Duration::from_millis(10)).await.unwrap();
        let err = lib.loans().create_loan(item.as_str(), a.as_str(), None).await.expect_err("lock is held");
        assert_eq!(ErrorKind::Contention, err.kind());
        assert!(err.retryable());
        lib.store.release(held).await.unwrap();
    }
}
