use serde::{Deserialize, Serialize};
use crate::gateway::GatewayPublisherVia;

// RepositoryStore selects where circulation state lives and, with it, where events go.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub enum RepositoryStore {
    DynamoDB,
    LocalDynamoDB,
    InMemory,
}

impl RepositoryStore {
    pub fn gateway_publisher(&self) -> GatewayPublisherVia {
        match self {
            RepositoryStore::DynamoDB => GatewayPublisherVia::Sns,
            RepositoryStore::LocalDynamoDB => GatewayPublisherVia::LocalDynamoDB,
            RepositoryStore::InMemory => GatewayPublisherVia::Logs,
        }
    }
}

impl From<String> for RepositoryStore {
    fn from(s: String) -> Self {
        match s.as_str() {
            "LocalDynamoDB" => RepositoryStore::LocalDynamoDB,
            "InMemory" => RepositoryStore::InMemory,
            _ => RepositoryStore::DynamoDB,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::repository::RepositoryStore;
    use crate::gateway::GatewayPublisherVia;

    #[tokio::test]
    async fn test_should_pick_publisher_for_store() {
        assert_eq!(GatewayPublisherVia::Sns, RepositoryStore::DynamoDB.gateway_publisher());
        assert_eq!(GatewayPublisherVia::LocalDynamoDB, RepositoryStore::from("LocalDynamoDB".to_string()).gateway_publisher());
        assert_eq!(GatewayPublisherVia::Logs, RepositoryStore::from("InMemory".to_string()).gateway_publisher());
    }
}
