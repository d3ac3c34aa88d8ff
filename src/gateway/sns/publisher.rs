use async_trait::async_trait;
use aws_sdk_sns::Client;
use aws_sdk_sns::error::SdkError;
use aws_sdk_sns::operation::create_topic::CreateTopicError;
use aws_sdk_sns::operation::publish::PublishError;
use aws_sdk_sns::types::MessageAttributeValue;
use tracing::info;
use crate::core::events::CirculationEvent;
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::NotificationGateway;

// SnsGateway publishes every event to one topic; subscribers filter on the code attribute.
#[derive(Debug)]
pub struct SnsGateway {
    client: Client,
    topic_arn: String,
}

impl SnsGateway {
    pub(crate) fn new(client: Client, topic_arn: &str) -> Self {
        Self {
            client,
            topic_arn: topic_arn.to_string(),
        }
    }

    // creating a topic is idempotent in SNS, so this also resolves the arn of an existing one
    pub(crate) async fn create_topic(client: &Client, topic: &str) -> LibraryResult<String> {
        let resp = client.create_topic().name(topic).send().await?;
        let arn = resp.topic_arn().unwrap_or_default();
        info!(topic, arn, "resolved notification topic");
        Ok(arn.to_string())
    }
}

#[async_trait]
impl NotificationGateway for SnsGateway {
    async fn trigger_event(&self, event: &CirculationEvent) -> LibraryResult<()> {
        let json = serde_json::to_string(event)?;
        let code = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(event.code.to_string())
            .build();
        self.client.publish()
            .topic_arn(self.topic_arn.as_str())
            .subject(event.code.to_string())
            .message_attributes("code", code)
            .message(json)
            .send().await?;
        Ok(())
    }
}

impl From<SdkError<CreateTopicError>> for LibraryError {
    fn from(err: SdkError<CreateTopicError>) -> Self {
        LibraryError::runtime(format!("{:?}", err).as_str(), None)
    }
}

impl From<SdkError<PublishError>> for LibraryError {
    fn from(err: SdkError<PublishError>) -> Self {
        LibraryError::unavailable(format!("{:?}", err).as_str(), Some("PublishFailed".to_string()), true)
    }
}
