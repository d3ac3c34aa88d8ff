use std::cmp;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, Put, Select, TransactWriteItem, Update};
use chrono::{NaiveDateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use crate::core::library::{ItemKind, ItemStatus, LibraryError, LibraryResult, LoanStatus, PaginatedResult, ReservationStatus};
use crate::items::domain::model::ItemEntity;
use crate::loans::domain::model::LoanEntity;
use crate::reservations::domain::model::ReservationEntity;
use crate::store::{CirculationStore, ItemGuard};
use crate::store::ledger::ItemLedger;
use crate::utils::ddb::{from_ddb, parse_date_attribute, parse_item, parse_number_attribute, parse_opt_number_attribute, parse_string_attribute, parse_strings_attribute, string_date, string_list, to_ddb_page};

// DDBCirculationStore keeps items, loans and reservations in three tables. DynamoDB has no
// row locks, so the item lock is a lease written on the item row: lock_owner holds the
// guard's token and lock_expires_at the epoch millis after which another worker may take it.
// The item row also lists its open loans and live holds so the ledger can be read with
// strongly consistent gets instead of eventually consistent indexes.
#[derive(Debug)]
pub(crate) struct DDBCirculationStore {
    client: Client,
    items_table: String,
    loans_table: String,
    reservations_table: String,
    lease: chrono::Duration,
}

impl DDBCirculationStore {
    pub(crate) fn new(client: Client, items_table: &str, loans_table: &str,
                      reservations_table: &str, lease: chrono::Duration) -> Self {
        Self {
            client,
            items_table: items_table.to_string(),
            loans_table: loans_table.to_string(),
            reservations_table: reservations_table.to_string(),
            lease,
        }
    }

    async fn get_row(&self, table_name: &str, key: &str,
                     id: &str) -> LibraryResult<Option<HashMap<String, AttributeValue>>> {
        self.client
            .get_item()
            .table_name(table_name)
            .key(key, AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await.map(|out| out.item).map_err(LibraryError::from)
    }

    async fn get_item_row(&self, item_id: &str) -> LibraryResult<HashMap<String, AttributeValue>> {
        self.get_row(self.items_table.as_str(), "item_id", item_id).await?
            .ok_or_else(|| LibraryError::not_found(format!("item not found for {}", item_id).as_str()))
    }

    async fn get_reservations(&self, ids: &[String]) -> LibraryResult<Vec<ReservationEntity>> {
        let mut holds = vec![];
        for id in ids {
            if let Some(map) = self.get_row(self.reservations_table.as_str(), "reservation_id", id).await? {
                holds.push(ReservationEntity::from(&map));
            }
        }
        Ok(holds)
    }

    async fn try_lease(&self, item_id: &str, token: &str) -> LibraryResult<bool> {
        let now = Utc::now();
        let expires_at = now + self.lease;
        let res = self.client
            .update_item()
            .table_name(self.items_table.as_str())
            .key("item_id", AttributeValue::S(item_id.to_string()))
            .update_expression("SET lock_owner = :owner, lock_expires_at = :expires_at")
            .condition_expression("attribute_exists(item_id) AND (attribute_not_exists(lock_owner) OR lock_expires_at < :now)")
            .expression_attribute_values(":owner", AttributeValue::S(token.to_string()))
            .expression_attribute_values(":expires_at", AttributeValue::N(expires_at.timestamp_millis().to_string()))
            .expression_attribute_values(":now", AttributeValue::N(now.timestamp_millis().to_string()))
            .send()
            .await;
        match res {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_conditional_check_failed_exception() => Ok(false),
            Err(err) => Err(LibraryError::from(err)),
        }
    }

    async fn scan_page(&self, table_name: &str, filter: &str, values: HashMap<String, AttributeValue>,
                       page: Option<&str>, page_size: usize) -> LibraryResult<(Vec<HashMap<String, AttributeValue>>, Option<HashMap<String, AttributeValue>>)> {
        self.client
            .scan()
            .table_name(table_name)
            .limit(cmp::min(page_size, 500) as i32)
            .consistent_read(true)
            .set_exclusive_start_key(to_ddb_page(page))
            .filter_expression(filter)
            .set_expression_attribute_values(Some(values))
            .send()
            .await.map_err(LibraryError::from).map(|out| {
            (out.items.unwrap_or_default(), out.last_evaluated_key)
        })
    }
}

#[async_trait]
impl CirculationStore for DDBCirculationStore {
    async fn add_item(&self, item: &ItemEntity) -> LibraryResult<()> {
        let mut row = to_row(item)?;
        row.insert("open_loan_ids".to_string(), string_list(&[]));
        row.insert("live_hold_ids".to_string(), string_list(&[]));
        self.client
            .put_item()
            .table_name(self.items_table.as_str())
            .condition_expression("attribute_not_exists(item_id)")
            .set_item(Some(row))
            .send()
            .await.map(|_| ()).map_err(LibraryError::from)
    }

    async fn get_item(&self, item_id: &str) -> LibraryResult<ItemEntity> {
        self.get_item_row(item_id).await.map(|map| ItemEntity::from(&map))
    }

    async fn acquire(&self, item_id: &str, timeout: Duration) -> LibraryResult<ItemGuard> {
        self.get_item_row(item_id).await?;
        let token = Uuid::new_v4().to_string();
        let deadline = Instant::now() + timeout;
        loop {
            if self.try_lease(item_id, token.as_str()).await? {
                return Ok(ItemGuard::leased(item_id, token.as_str()));
            }
            if Instant::now() >= deadline {
                return Err(LibraryError::busy(
                    format!("lease on item {} not acquired within {}ms", item_id, timeout.as_millis()).as_str()));
            }
            let pause = {
                let mut rng = rand::thread_rng();
                rng.gen_range(20..=80)
            };
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }
    }

    async fn load(&self, guard: &ItemGuard) -> LibraryResult<ItemLedger> {
        let row = self.get_item_row(guard.item_id()).await?;
        if parse_string_attribute("lock_owner", &row).as_deref() != Some(guard.token()) {
            return Err(LibraryError::unavailable(
                format!("lease on item {} was lost", guard.item_id()).as_str(), Some("LeaseLost".to_string()), true));
        }
        let mut loans = vec![];
        for id in parse_strings_attribute("open_loan_ids", &row) {
            if let Some(map) = self.get_row(self.loans_table.as_str(), "loan_id", id.as_str()).await? {
                let loan = LoanEntity::from(&map);
                if loan.is_open() {
                    loans.push(loan);
                }
            }
        }
        let holds = self.get_reservations(&parse_strings_attribute("live_hold_ids", &row)).await?
            .into_iter().filter(|r| r.is_live()).collect();
        Ok(ItemLedger::new(ItemEntity::from(&row), loans, holds))
    }

    async fn commit(&self, guard: &ItemGuard, ledger: &ItemLedger) -> LibraryResult<()> {
        let item = ledger.item();
        let item_update = Update::builder()
            .table_name(self.items_table.as_str())
            .key("item_id", AttributeValue::S(item.item_id.to_string()))
            .update_expression("SET item_status = :item_status, updated_at = :updated_at, version = :version, open_loan_ids = :open_loan_ids, live_hold_ids = :live_hold_ids")
            .condition_expression("lock_owner = :owner")
            .expression_attribute_values(":item_status", AttributeValue::S(item.item_status.to_string()))
            .expression_attribute_values(":updated_at", string_date(item.updated_at))
            .expression_attribute_values(":version", AttributeValue::N((item.version + 1).to_string()))
            .expression_attribute_values(":open_loan_ids", string_list(&ledger.open_loan_ids()))
            .expression_attribute_values(":live_hold_ids", string_list(&ledger.live_hold_ids()))
            .expression_attribute_values(":owner", AttributeValue::S(guard.token().to_string()))
            .build();
        let mut writes = vec![TransactWriteItem::builder().update(item_update).build()];
        for loan in ledger.dirty_loans() {
            let mut loan = loan.clone();
            loan.version += 1;
            writes.push(TransactWriteItem::builder().put(Put::builder()
                .table_name(self.loans_table.as_str())
                .set_item(Some(to_row(&loan)?))
                .build()).build());
        }
        for hold in ledger.dirty_reservations() {
            let mut hold = hold.clone();
            hold.version += 1;
            writes.push(TransactWriteItem::builder().put(Put::builder()
                .table_name(self.reservations_table.as_str())
                .set_item(Some(to_row(&hold)?))
                .build()).build());
        }
        match self.client.transact_write_items().set_transact_items(Some(writes)).send().await {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_transaction_canceled_exception() => {
                Err(LibraryError::unavailable(
                    format!("commit on item {} cancelled, lease lost or conflict", guard.item_id()).as_str(),
                    Some("TransactionCanceled".to_string()), true))
            }
            Err(err) => Err(LibraryError::from(err)),
        }
    }

    async fn release(&self, guard: ItemGuard) -> LibraryResult<()> {
        let res = self.client
            .update_item()
            .table_name(self.items_table.as_str())
            .key("item_id", AttributeValue::S(guard.item_id().to_string()))
            .update_expression("REMOVE lock_owner, lock_expires_at")
            .condition_expression("lock_owner = :owner")
            .expression_attribute_values(":owner", AttributeValue::S(guard.token().to_string()))
            .send()
            .await;
        match res {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_conditional_check_failed_exception() => {
                debug!(item_id = guard.item_id(), "lease already lapsed before release");
                Ok(())
            }
            Err(err) => Err(LibraryError::from(err)),
        }
    }

    async fn find_loan(&self, loan_id: &str) -> LibraryResult<LoanEntity> {
        self.get_row(self.loans_table.as_str(), "loan_id", loan_id).await?
            .map(|map| LoanEntity::from(&map))
            .ok_or_else(|| LibraryError::not_found(format!("loan not found for {}", loan_id).as_str()))
    }

    async fn find_reservation(&self, reservation_id: &str) -> LibraryResult<ReservationEntity> {
        self.get_row(self.reservations_table.as_str(), "reservation_id", reservation_id).await?
            .map(|map| ReservationEntity::from(&map))
            .ok_or_else(|| LibraryError::not_found(format!("reservation not found for {}", reservation_id).as_str()))
    }

    async fn list_reservations(&self, item_id: &str) -> LibraryResult<Vec<ReservationEntity>> {
        let row = self.get_item_row(item_id).await?;
        let mut holds: Vec<ReservationEntity> = self.get_reservations(&parse_strings_attribute("live_hold_ids", &row)).await?
            .into_iter().filter(|r| r.is_live()).collect();
        holds.sort_by_key(|r| (r.reservation_status != ReservationStatus::Ready,
                               r.queue_position.unwrap_or(0), r.created_at));
        Ok(holds)
    }

    async fn count_live_holds(&self, borrower_id: &str) -> LibraryResult<usize> {
        let mut count = 0;
        let mut start_key = None;
        loop {
            let out = self.client
                .scan()
                .table_name(self.reservations_table.as_str())
                .select(Select::Count)
                .consistent_read(true)
                .set_exclusive_start_key(start_key)
                .filter_expression("borrower_id = :borrower_id AND (reservation_status = :waiting OR reservation_status = :ready)")
                .expression_attribute_values(":borrower_id", AttributeValue::S(borrower_id.to_string()))
                .expression_attribute_values(":waiting", AttributeValue::S(ReservationStatus::Waiting.to_string()))
                .expression_attribute_values(":ready", AttributeValue::S(ReservationStatus::Ready.to_string()))
                .send()
                .await?;
            count += out.count() as usize;
            start_key = out.last_evaluated_key;
            if start_key.is_none() {
                return Ok(count);
            }
        }
    }

    // Note you cannot use certain reserved words such as status in expressions per https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/ReservedWords.html
    async fn query_expired_holds(&self, now: NaiveDateTime, page: Option<&str>,
                                 page_size: usize) -> LibraryResult<PaginatedResult<ReservationEntity>> {
        let values = HashMap::from([
            (":ready".to_string(), AttributeValue::S(ReservationStatus::Ready.to_string())),
            (":now".to_string(), string_date(now)),
        ]);
        let (items, last_key) = self.scan_page(self.reservations_table.as_str(),
                                               "reservation_status = :ready AND expires_at < :now",
                                               values, page, page_size).await?;
        let records = items.iter().map(ReservationEntity::from).collect();
        Ok(from_ddb(page, page_size, last_key.as_ref(), records))
    }

    async fn query_overdue_loans(&self, now: NaiveDateTime, page: Option<&str>,
                                 page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let values = HashMap::from([
            (":active".to_string(), AttributeValue::S(LoanStatus::Active.to_string())),
            (":now".to_string(), string_date(now)),
        ]);
        let (items, last_key) = self.scan_page(self.loans_table.as_str(),
                                               "loan_status = :active AND due_at < :now",
                                               values, page, page_size).await?;
        let records = items.iter().map(LoanEntity::from).collect();
        Ok(from_ddb(page, page_size, last_key.as_ref(), records))
    }
}

fn to_row<T: Serialize>(entity: &T) -> LibraryResult<HashMap<String, AttributeValue>> {
    let val = serde_json::to_value(entity)?;
    Ok(parse_item(val)?)
}

impl From<&HashMap<String, AttributeValue>> for ItemEntity {
    fn from(map: &HashMap<String, AttributeValue>) -> Self {
        ItemEntity {
            item_id: parse_string_attribute("item_id", map).unwrap_or_default(),
            version: parse_number_attribute("version", map),
            branch_id: parse_string_attribute("branch_id", map).unwrap_or_default(),
            kind: ItemKind::from(parse_string_attribute("kind", map).unwrap_or_else(|| ItemKind::Book.to_string())),
            title: parse_string_attribute("title", map).unwrap_or_default(),
            item_status: ItemStatus::from(parse_string_attribute("item_status", map).unwrap_or_else(|| ItemStatus::Available.to_string())),
            created_at: parse_date_attribute("created_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
        }
    }
}

impl From<&HashMap<String, AttributeValue>> for LoanEntity {
    fn from(map: &HashMap<String, AttributeValue>) -> Self {
        LoanEntity {
            loan_id: parse_string_attribute("loan_id", map).unwrap_or_default(),
            version: parse_number_attribute("version", map),
            branch_id: parse_string_attribute("branch_id", map).unwrap_or_default(),
            item_id: parse_string_attribute("item_id", map).unwrap_or_default(),
            borrower_id: parse_string_attribute("borrower_id", map).unwrap_or_default(),
            loan_status: LoanStatus::from(parse_string_attribute("loan_status", map).unwrap_or_else(|| LoanStatus::Active.to_string())),
            started_at: parse_date_attribute("started_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            due_at: parse_date_attribute("due_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            returned_at: parse_date_attribute("returned_at", map),
            created_at: parse_date_attribute("created_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
        }
    }
}

impl From<&HashMap<String, AttributeValue>> for ReservationEntity {
    fn from(map: &HashMap<String, AttributeValue>) -> Self {
        ReservationEntity {
            reservation_id: parse_string_attribute("reservation_id", map).unwrap_or_default(),
            version: parse_number_attribute("version", map),
            branch_id: parse_string_attribute("branch_id", map).unwrap_or_default(),
            item_id: parse_string_attribute("item_id", map).unwrap_or_default(),
            borrower_id: parse_string_attribute("borrower_id", map).unwrap_or_default(),
            reservation_status: ReservationStatus::from(parse_string_attribute("reservation_status", map).unwrap_or_else(|| ReservationStatus::Waiting.to_string())),
            queue_position: parse_opt_number_attribute("queue_position", map),
            ready_at: parse_date_attribute("ready_at", map),
            expires_at: parse_date_attribute("expires_at", map),
            closed_at: parse_date_attribute("closed_at", map),
            created_at: parse_date_attribute("created_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
        }
    }
}
