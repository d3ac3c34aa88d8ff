use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use crate::core::library::{LibraryError, LibraryResult, MemberStanding};
use crate::members::domain::MemberDirectory;
use crate::utils::ddb::parse_string_attribute;

// Reads members rows keyed by borrower_id; the row is owned by membership administration.
#[derive(Debug)]
pub(crate) struct DDBMemberDirectory {
    client: Client,
    table_name: String,
}

impl DDBMemberDirectory {
    pub(crate) fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn enroll(&self, borrower_id: &str, standing: MemberStanding) -> LibraryResult<()> {
        self.client
            .put_item()
            .table_name(self.table_name.as_str())
            .item("borrower_id", AttributeValue::S(borrower_id.to_string()))
            .item("member_standing", AttributeValue::S(standing.to_string()))
            .send()
            .await.map(|_| ()).map_err(LibraryError::from)
    }
}

#[async_trait]
impl MemberDirectory for DDBMemberDirectory {
    async fn standing(&self, borrower_id: &str) -> LibraryResult<Option<MemberStanding>> {
        let out = self.client
            .get_item()
            .table_name(self.table_name.as_str())
            .key("borrower_id", AttributeValue::S(borrower_id.to_string()))
            .consistent_read(true)
            .send()
            .await?;
        Ok(out.item()
            .and_then(|map| parse_string_attribute("member_standing", map))
            .map(MemberStanding::from))
    }
}
