use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::core::library::{LibraryResult, MemberStanding};
use crate::members::domain::MemberDirectory;

#[derive(Debug, Default)]
pub struct MemoryMemberDirectory {
    members: RwLock<HashMap<String, MemberStanding>>,
}

impl MemoryMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enroll(&self, borrower_id: &str, standing: MemberStanding) {
        self.members.write().await.insert(borrower_id.to_string(), standing);
    }
}

#[async_trait]
impl MemberDirectory for MemoryMemberDirectory {
    async fn standing(&self, borrower_id: &str) -> LibraryResult<Option<MemberStanding>> {
        Ok(self.members.read().await.get(borrower_id).copied())
    }
}
