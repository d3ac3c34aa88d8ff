use std::sync::Arc;
use crate::core::repository::RepositoryStore;
use crate::members::directory::ddb_member_directory::DDBMemberDirectory;
use crate::members::directory::memory_member_directory::MemoryMemberDirectory;
use crate::members::domain::MemberDirectory;
use crate::utils::ddb::{build_db_client, create_table};

const MEMBERS_TABLE: &str = "members";

pub async fn create_member_directory(store: RepositoryStore) -> Arc<dyn MemberDirectory> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Arc::new(DDBMemberDirectory::new(client, MEMBERS_TABLE))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, MEMBERS_TABLE, "borrower_id").await;
            Arc::new(DDBMemberDirectory::new(client, MEMBERS_TABLE))
        }
        RepositoryStore::InMemory => Arc::new(MemoryMemberDirectory::new()),
    }
}
