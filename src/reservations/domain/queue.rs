// FIFO hold queue of one item. Only called inside ItemLocker closures, so each call sees the
// committed queue and nothing observes it between a promotion and the re-sequencing after it.

use chrono::{Duration, NaiveDateTime};
use tracing::warn;
use crate::core::library::{ItemStatus, LibraryError, LibraryResult, ReservationStatus};
use crate::reservations::domain::model::ReservationEntity;
use crate::store::ledger::ItemLedger;

// Outcome of closing a hold, with the hold promoted in its place if any
#[derive(Debug, Clone, PartialEq)]
pub struct Closed {
    pub closed: ReservationEntity,
    pub promoted: Option<ReservationEntity>,
}

pub fn enqueue(ledger: &mut ItemLedger, branch_id: &str, borrower_id: &str,
               now: NaiveDateTime) -> LibraryResult<ReservationEntity> {
    if let Some(existing) = ledger.live_hold_for(borrower_id) {
        return Err(LibraryError::duplicate_hold(
            format!("borrower {} already holds {} on item {}",
                    borrower_id, existing.reservation_id, ledger.item_id()).as_str()));
    }
    if ledger.item().item_status == ItemStatus::Available {
        return Err(LibraryError::item_already_available(
            format!("item {} is available, borrow it directly", ledger.item_id()).as_str()));
    }
    let position = ledger.max_queue_position() + 1;
    let hold = ReservationEntity::new(branch_id, ledger.item_id(), borrower_id, position, now);
    ledger.insert_reservation(hold.clone());
    Ok(hold)
}

// Moves the head of the waiting queue to ready and closes the gap it leaves.
pub fn promote_next(ledger: &mut ItemLedger, now: NaiveDateTime,
                    window: Duration) -> LibraryResult<Option<ReservationEntity>> {
    if let Some(ready) = ledger.ready_reservation() {
        warn!(item_id = ledger.item_id(), reservation_id = ready.reservation_id.as_str(),
            "item already has a ready hold, nothing promoted");
        return Ok(None);
    }
    let head_id = match ledger.waiting().first() {
        Some(head) => head.reservation_id.to_string(),
        None => return Ok(None),
    };
    let promoted = match ledger.reservation_mut(head_id.as_str()) {
        Some(head) => {
            head.promote(now, window)?;
            head.clone()
        }
        None => return Ok(None),
    };
    resequence(ledger, now);
    Ok(Some(promoted))
}

// Renumbers waiting holds 1..N by creation order, touching only rows whose position changes.
pub fn resequence(ledger: &mut ItemLedger, now: NaiveDateTime) {
    let mut waiting: Vec<(NaiveDateTime, i64, String)> = ledger.waiting().iter()
        .map(|r| (r.created_at, r.queue_position.unwrap_or(i64::MAX), r.reservation_id.to_string()))
        .collect();
    waiting.sort();
    for (i, (_, position, reservation_id)) in waiting.into_iter().enumerate() {
        let expected = i as i64 + 1;
        if position != expected {
            if let Some(hold) = ledger.reservation_mut(reservation_id.as_str()) {
                hold.queue_position = Some(expected);
                hold.updated_at = now;
            }
        }
    }
}

// Cancelling a ready hold frees the item exactly like a return does.
pub fn cancel(ledger: &mut ItemLedger, reservation_id: &str, now: NaiveDateTime,
              window: Duration) -> LibraryResult<Closed> {
    let (closed, was_ready) = match ledger.reservation_mut(reservation_id) {
        Some(hold) => {
            let was_ready = hold.reservation_status == ReservationStatus::Ready;
            hold.cancel(now)?;
            (hold.clone(), was_ready)
        }
        None => return Err(LibraryError::not_found(
            format!("reservation not found for {}", reservation_id).as_str())),
    };
    let promoted = if was_ready {
        promote_next(ledger, now, window)?
    } else {
        resequence(ledger, now);
        None
    };
    Ok(Closed { closed, promoted })
}

// Expires a ready hold whose window lapsed. Returns None when the hold is no longer ready or
// not lapsed any more, which means another worker already handled it.
pub fn expire(ledger: &mut ItemLedger, reservation_id: &str, now: NaiveDateTime,
              window: Duration) -> LibraryResult<Option<Closed>> {
    let lapsed = match ledger.reservation(reservation_id) {
        Some(hold) => hold.is_lapsed(now),
        None => return Err(LibraryError::not_found(
            format!("reservation not found for {}", reservation_id).as_str())),
    };
    if !lapsed {
        return Ok(None);
    }
    let closed = match ledger.reservation_mut(reservation_id) {
        Some(hold) => {
            hold.expire(now)?;
            hold.clone()
        }
        None => return Ok(None),
    };
    let promoted = promote_next(ledger, now, window)?;
    Ok(Some(Closed { closed, promoted }))
}

// Marks the borrower's ready hold fulfilled when they pick the item up.
pub fn fulfil(ledger: &mut ItemLedger, borrower_id: &str,
              now: NaiveDateTime) -> LibraryResult<Option<ReservationEntity>> {
    let ready_id = match ledger.ready_reservation() {
        Some(ready) if ready.borrower_id == borrower_id => ready.reservation_id.to_string(),
        _ => return Ok(None),
    };
    match ledger.reservation_mut(ready_id.as_str()) {
        Some(hold) => {
            hold.fulfil(now)?;
            Ok(Some(hold.clone()))
        }
        None => Ok(None),
    }
}
