use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::events::{CirculationEvent, EventCode};
use crate::core::library::{LibraryResult, LoanStatus};
use crate::gateway::dispatch;
use crate::gateway::events::NotificationGateway;
use crate::reservations::domain::queue;
use crate::reservations::domain::queue::Closed;
use crate::reservations::dto::ReservationDto;
use crate::store::locker::ItemLocker;
use crate::sweep::domain::{OverdueReport, SweepReport, SweepService};

// ExpirationSweep keeps no state between runs. Every candidate is re-read and re-checked under
// its item lock, so overlapping runs, or a rerun after a crash, converge on the same state.
pub struct ExpirationSweep {
    config: Configuration,
    locker: Arc<ItemLocker>,
    gateway: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
}

impl ExpirationSweep {
    pub(crate) fn new(config: &Configuration, locker: Arc<ItemLocker>,
                      gateway: Arc<dyn NotificationGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: config.clone(),
            locker,
            gateway,
            clock,
        }
    }

    // the candidate set is read up front, expiring holds while paging would shift the pages
    async fn expired_candidates(&self, now: NaiveDateTime) -> LibraryResult<Vec<String>> {
        let mut ids = vec![];
        let mut page: Option<String> = None;
        loop {
            let res = self.locker.store().query_expired_holds(now, page.as_deref(), self.config.sweep_page_size).await?;
            ids.extend(res.records.into_iter().map(|r| r.reservation_id));
            match res.next_page {
                Some(next) => page = Some(next),
                None => return Ok(ids),
            }
        }
    }

    async fn overdue_candidates(&self, now: NaiveDateTime) -> LibraryResult<Vec<String>> {
        let mut ids = vec![];
        let mut page: Option<String> = None;
        loop {
            let res = self.locker.store().query_overdue_loans(now, page.as_deref(), self.config.sweep_page_size).await?;
            ids.extend(res.records.into_iter().map(|l| l.loan_id));
            match res.next_page {
                Some(next) => page = Some(next),
                None => return Ok(ids),
            }
        }
    }

    // None when the hold is no longer a lapsed ready hold once its item is locked
    pub(crate) async fn expire_hold(&self, reservation_id: &str) -> LibraryResult<Option<Closed>> {
        let now = self.clock.now();
        let window = self.config.hold_window();
        self.locker.with_reservation_lock(reservation_id, |ledger| {
            queue::expire(ledger, reservation_id, now, window)
        }).await
    }

    async fn notify(&self, closed: &Closed, now: NaiveDateTime) {
        let expired = ReservationDto::from(&closed.closed);
        let mut events = vec![];
        events.extend(CirculationEvent::staged(EventCode::HoldExpired, expired.item_id.as_str(), expired.borrower_id.as_str(),
                                               expired.reservation_id.as_str(), &expired, now));
        if let Some(next) = closed.promoted.as_ref().map(ReservationDto::from) {
            events.extend(CirculationEvent::staged(EventCode::HoldReady, next.item_id.as_str(), next.borrower_id.as_str(),
                                                   next.reservation_id.as_str(), &next, now));
        }
        dispatch(self.gateway.as_ref(), events).await;
    }
}

#[async_trait]
impl SweepService for ExpirationSweep {
    async fn run(&self) -> LibraryResult<SweepReport> {
        let started = self.clock.now();
        let candidates = self.expired_candidates(started).await?;
        let mut report = SweepReport { scanned: candidates.len(), ..Default::default() };
        for reservation_id in candidates {
            match self.expire_hold(reservation_id.as_str()).await {
                Ok(Some(closed)) => {
                    report.expired += 1;
                    if closed.promoted.is_some() {
                        report.promoted += 1;
                    }
                    info!(reservation_id = reservation_id.as_str(), item_id = closed.closed.item_id.as_str(),
                        borrower_id = closed.closed.borrower_id.as_str(),
                        promoted = closed.promoted.as_ref().map(|r| r.reservation_id.as_str()), "hold expired");
                    self.notify(&closed, self.clock.now()).await;
                }
                Ok(None) => {
                    debug!(reservation_id = reservation_id.as_str(), "hold already handled, skipped");
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!(reservation_id = reservation_id.as_str(), error = %err, "failed to expire hold");
                    report.errored += 1;
                }
            }
        }
        info!(scanned = report.scanned, expired = report.expired, promoted = report.promoted,
            skipped = report.skipped, errored = report.errored, "expiration sweep finished");
        Ok(report)
    }

    async fn flag_overdue_loans(&self) -> LibraryResult<OverdueReport> {
        let started = self.clock.now();
        let candidates = self.overdue_candidates(started).await?;
        let mut report = OverdueReport { scanned: candidates.len(), ..Default::default() };
        for loan_id in candidates {
            let now = self.clock.now();
            let res = self.locker.with_loan_lock(loan_id.as_str(), |ledger| {
                let due = ledger.loan(loan_id.as_str())
                    .map(|l| l.loan_status == LoanStatus::Active && l.due_at < now)
                    .unwrap_or(false);
                if !due {
                    return Ok(false);
                }
                Ok(ledger.loan_mut(loan_id.as_str()).map(|l| l.mark_overdue(now)).unwrap_or(false))
            }).await;
            match res {
                Ok(true) => {
                    debug!(loan_id = loan_id.as_str(), "loan flagged overdue");
                    report.flagged += 1;
                }
                Ok(false) => report.skipped += 1,
                Err(err) => {
                    warn!(loan_id = loan_id.as_str(), error = %err, "failed to flag overdue loan");
                    report.errored += 1;
                }
            }
        }
        info!(scanned = report.scanned, flagged = report.flagged, skipped = report.skipped,
            errored = report.errored, "overdue pass finished");
        Ok(report)
    }
}
