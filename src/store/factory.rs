use std::sync::Arc;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::store::CirculationStore;
use crate::store::ddb::DDBCirculationStore;
use crate::store::memory::MemoryCirculationStore;
use crate::utils::ddb::{build_db_client, create_table};

const ITEMS_TABLE: &str = "items";
const LOANS_TABLE: &str = "loans";
const RESERVATIONS_TABLE: &str = "reservations";

pub async fn create_circulation_store(config: &Configuration, store: RepositoryStore) -> Arc<dyn CirculationStore> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Arc::new(DDBCirculationStore::new(client, ITEMS_TABLE, LOANS_TABLE, RESERVATIONS_TABLE, config.lock_lease()))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, ITEMS_TABLE, "item_id").await;
            let _ = create_table(&client, LOANS_TABLE, "loan_id").await;
            let _ = create_table(&client, RESERVATIONS_TABLE, "reservation_id").await;
            Arc::new(DDBCirculationStore::new(client, ITEMS_TABLE, LOANS_TABLE, RESERVATIONS_TABLE, config.lock_lease()))
        }
        RepositoryStore::InMemory => Arc::new(MemoryCirculationStore::new()),
    }
}
