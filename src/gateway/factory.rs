use std::sync::Arc;
use crate::core::library::LibraryResult;
use crate::core::repository::RepositoryStore;
use crate::gateway::ddb::publisher::DDBGateway;
use crate::gateway::events::NotificationGateway;
use crate::gateway::GatewayPublisherVia;
use crate::gateway::logs::LogGateway;
use crate::gateway::sns::publisher::SnsGateway;
use crate::utils::ddb::{build_db_client, build_sns_client, create_table};

const TOPIC: &str = "circulation-events";
const EVENTS_TABLE: &str = "circulation_events";

pub async fn create_gateway(via: GatewayPublisherVia) -> LibraryResult<Arc<dyn NotificationGateway>> {
    match via {
        GatewayPublisherVia::Sns => {
            let client = build_sns_client().await;
            let arn = SnsGateway::create_topic(&client, TOPIC).await?;
            Ok(Arc::new(SnsGateway::new(client, arn.as_str())))
        }
        GatewayPublisherVia::LocalDynamoDB => {
            let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
            let _ = create_table(&client, EVENTS_TABLE, "event_id").await;
            Ok(Arc::new(DDBGateway::new(client, EVENTS_TABLE)))
        }
        GatewayPublisherVia::Logs => Ok(Arc::new(LogGateway::new())),
    }
}
