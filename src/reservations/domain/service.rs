use std::sync::Arc;
use async_trait::async_trait;
use tracing::info;
use crate::core::clock::Clock;
use crate::core::domain::{Configuration, validate_id};
use crate::core::events::{CirculationEvent, EventCode};
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::dispatch;
use crate::gateway::events::NotificationGateway;
use crate::members::domain::{ensure_eligible, MemberDirectory};
use crate::reservations::domain::queue;
use crate::reservations::domain::ReservationService;
use crate::reservations::dto::ReservationDto;
use crate::store::locker::ItemLocker;

pub(crate) struct ReservationServiceImpl {
    config: Configuration,
    locker: Arc<ItemLocker>,
    members: Arc<dyn MemberDirectory>,
    gateway: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
}

impl ReservationServiceImpl {
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

    // the limit is counted outside the item lock, so racing holds on different items may overshoot it
    async fn check_hold_limit(&self, borrower_id: &str) -> LibraryResult<()> {
        let live = self.locker.store().count_live_holds(borrower_id).await?;
        if live as i64 >= self.config.max_holds {
            return Err(LibraryError::hold_limit_reached(
                format!("borrower {} already has {} live holds", borrower_id, live).as_str()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationService for ReservationServiceImpl {
    async fn enqueue(&self, item_id: &str, borrower_id: &str) -> LibraryResult<ReservationDto> {
        validate_id("item_id", item_id)?;
        validate_id("borrower_id", borrower_id)?;
        ensure_eligible(self.members.as_ref(), borrower_id).await?;
        self.check_hold_limit(borrower_id).await?;

        let now = self.clock.now();
        let branch_id = self.config.branch_id.as_str();
        let hold = self.locker.with_item_lock(item_id, |ledger| {
            queue::enqueue(ledger, branch_id, borrower_id, now)
        }).await?;
        info!(item_id, borrower_id, reservation_id = hold.reservation_id.as_str(),
            queue_position = hold.queue_position, "hold placed");
        Ok(ReservationDto::from(&hold))
    }

    async fn cancel(&self, reservation_id: &str) -> LibraryResult<ReservationDto> {
        validate_id("reservation_id", reservation_id)?;
        let now = self.clock.now();
        let window = self.config.hold_window();
        let closed = self.locker.with_reservation_lock(reservation_id, |ledger| {
            queue::cancel(ledger, reservation_id, now, window)
        }).await?;

        let promoted = closed.promoted.as_ref().map(ReservationDto::from);
        let hold = ReservationDto::from(&closed.closed).with_promoted(promoted.clone());
        info!(item_id = hold.item_id.as_str(), borrower_id = hold.borrower_id.as_str(), reservation_id,
            promoted = promoted.as_ref().map(|r| r.reservation_id.as_str()), "hold cancelled");
        if let Some(next) = promoted {
            let events = CirculationEvent::staged(EventCode::HoldReady, next.item_id.as_str(), next.borrower_id.as_str(),
                                                  next.reservation_id.as_str(), &next, now);
            dispatch(self.gateway.as_ref(), events.into_iter().collect()).await;
        }
        Ok(hold)
    }

    async fn queue(&self, item_id: &str) -> LibraryResult<Vec<ReservationDto>> {
        validate_id("item_id", item_id)?;
        let store = self.locker.store();
        store.get_item(item_id).await?;
        let holds = store.list_reservations(item_id).await?;
        Ok(holds.iter().map(ReservationDto::from).collect())
    }

    async fn find_reservation(&self, reservation_id: &str) -> LibraryResult<ReservationDto> {
        validate_id("reservation_id", reservation_id)?;
        self.locker.store().find_reservation(reservation_id).await.map(|r| ReservationDto::from(&r))
    }
}
