use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::core::library::{ItemKind, ItemStatus};
use crate::items::domain::Item;
use crate::utils::date::serializer;

// ItemEntity abstracts one physical copy of a game, book, film or disc. Several copies of the
// same title are separate items with their own queue.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ItemEntity {
    pub item_id: String,
    pub version: i64,
    pub branch_id: String,
    pub kind: ItemKind,
    pub title: String,
    pub item_status: ItemStatus,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl ItemEntity {
    pub fn new(branch_id: &str, kind: ItemKind, title: &str) -> Self {
        Self {
            item_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: branch_id.to_string(),
            kind,
            title: title.to_string(),
            item_status: ItemStatus::Available,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Identifiable for ItemEntity {
    fn id(&self) -> String {
        self.item_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Item for ItemEntity {
    fn kind(&self) -> ItemKind {
        self.kind
    }

    fn status(&self) -> ItemStatus {
        self.item_status
    }
}
