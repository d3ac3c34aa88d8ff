use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use crate::core::events::CirculationEvent;
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::NotificationGateway;
use crate::utils::ddb::parse_item;

// DDBGateway appends events to a table, used against dynamodb-local where SNS is absent.
#[derive(Debug)]
pub struct DDBGateway {
    client: Client,
    table_name: String,
}

impl DDBGateway {
    pub(crate) fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[async_trait]
impl NotificationGateway for DDBGateway {
    async fn trigger_event(&self, event: &CirculationEvent) -> LibraryResult<()> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(event)?;
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(event_id)")
            .set_item(Some(parse_item(val)?))
            .send()
            .await.map(|_| ()).map_err(LibraryError::from)
    }
}
