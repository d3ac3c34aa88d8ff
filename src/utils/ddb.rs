use std::collections::HashMap;
use std::time::Duration;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput, ScalarAttributeType, TableStatus};
use chrono::NaiveDateTime;
use serde_json::Value;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::RepositoryStore;
use crate::utils::date::DATE_FMT;

pub(crate) async fn create_table(client: &Client, table_name: &str, pk: &str) -> LibraryResult<()> {
    match client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(pk)
                .key_type(KeyType::Hash)
                .build(),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(pk)
                .attribute_type(ScalarAttributeType::S)
                .build(),
        )
        .provisioned_throughput(
            ProvisionedThroughput::builder()
                .read_capacity_units(10)
                .write_capacity_units(10)
                .build(),
        )
        .send()
        .await
    {
        Ok(_k) => {
            wait_until_table_status_is_not(client, table_name, TableStatus::Creating).await;
            Ok(())
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to create {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

#[cfg(test)]
pub(crate) async fn delete_table(client: &Client, table_name: &str) -> LibraryResult<()> {
    match client.delete_table().table_name(table_name).send().await {
        Ok(_k) => {
            wait_until_table_status_is_not(client, table_name, TableStatus::Deleting).await;
            Ok(())
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to delete {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

async fn wait_until_table_status_is_not(client: &Client, table_name: &str, other_status: TableStatus) {
    for _i in 0..30 {
        if let Ok(status) = describe_table(client, table_name).await {
            if status != other_status {
                return;
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

async fn describe_table(client: &Client, table_name: &str) -> LibraryResult<TableStatus> {
    match client
        .describe_table()
        .table_name(table_name)
        .send()
        .await
    {
        Ok(out) => {
            if let Some(status) = out.table().and_then(|t| t.table_status()) {
                return Ok(status.clone());
            }
            Err(LibraryError::runtime(format!("failed to describe {} table",
                                              table_name).as_str(), None))
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to describe {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

pub(crate) fn parse_item(value: Value) -> Result<HashMap<String, AttributeValue>, String> {
    match value_to_item(value) {
        AttributeValue::M(map) => Ok(map),
        other => Err(format!("failed to parse{:?}", other)),
    }
}

pub(crate) fn parse_string_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<String> {
    if let Some(AttributeValue::S(str)) = map.get(name) {
        return Some(str.clone());
    }
    None
}

pub(crate) fn parse_strings_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Vec<String> {
    match map.get(name) {
        Some(AttributeValue::L(list)) => list.iter().filter_map(|v| match v {
            AttributeValue::S(s) => Some(s.clone()),
            _ => None,
        }).collect(),
        Some(AttributeValue::Ss(set)) => set.clone(),
        _ => vec![],
    }
}

pub(crate) fn parse_date_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<NaiveDateTime> {
    if let Some(AttributeValue::S(str)) = map.get(name) {
        // e.g. 2022-09-24T04:40:35.726029
        if let Ok(date) = NaiveDateTime::parse_from_str(str, DATE_FMT) {
            return Some(date);
        }
    }
    None
}

pub(crate) fn string_date(date: NaiveDateTime) -> AttributeValue {
    AttributeValue::S(format!("{}", date.format(DATE_FMT)))
}

pub(crate) fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().map(|v| AttributeValue::S(v.to_string())).collect())
}

pub(crate) fn parse_number_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> i64 {
    parse_opt_number_attribute(name, map).unwrap_or(0)
}

pub(crate) fn parse_opt_number_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<i64> {
    if let Some(AttributeValue::N(str)) = map.get(name) {
        return str.parse::<i64>().ok();
    }
    None
}

#[cfg(test)]
pub(crate) fn opt_number(value: Option<i64>) -> AttributeValue {
    match value {
        Some(n) => AttributeValue::N(n.to_string()),
        None => AttributeValue::Null(true),
    }
}

// scan pages carry the last evaluated primary key only, so the token is a flat string map
pub(crate) fn to_ddb_page(page: Option<&str>) -> Option<HashMap<String, AttributeValue>> {
    let str_map = serde_json::from_str::<HashMap<String, String>>(page?).ok()?;
    Some(str_map.into_iter().map(|(k, v)| (k, AttributeValue::S(v))).collect())
}

pub(crate) fn from_ddb<T>(page: Option<&str>, page_size: usize,
                          last_evaluated_key: Option<&HashMap<String, AttributeValue>>,
                          records: Vec<T>) -> PaginatedResult<T> {
    let next_page = last_evaluated_key.and_then(|key| {
        let token: HashMap<&str, &str> = key.iter()
            .filter_map(|(k, v)| v.as_s().ok().map(|s| (k.as_str(), s.as_str())))
            .collect();
        serde_json::to_string(&token).ok()
    });
    PaginatedResult::new(page, page_size, next_page, records)
}

fn value_to_item(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(a) => AttributeValue::L(a.into_iter().map(value_to_item).collect()),
        Value::Object(o) => {
            AttributeValue::M(o.into_iter().map(|(k, v)| (k, value_to_item(v))).collect())
        }
    }
}

// helper method to build db-client, local store talks to dynamodb-local on port 8000
pub(crate) async fn build_db_client(store: RepositoryStore) -> Client {
    match store {
        RepositoryStore::LocalDynamoDB => {
            // See https://docs.aws.amazon.com/sdk-for-rust/latest/dg/dynamodb-local.html
            let dynamodb_local_config = aws_sdk_dynamodb::Config::builder()
                .region(Region::new("local"))
                .credentials_provider(
                    Credentials::new("AKIDLOCALSTACK", "localstacksecret", None, None, "faked"))
                .endpoint_url("http://localhost:8000")
                .build();
            Client::from_conf(dynamodb_local_config)
        }
        _ => {
            let config = aws_config::load_from_env().await;
            Client::new(&config)
        }
    }
}

pub(crate) async fn build_sns_client() -> aws_sdk_sns::Client {
    let config = aws_config::load_from_env().await;
    aws_sdk_sns::Client::new(&config)
}

// every DynamoDB operation error is classified the same way
macro_rules! library_error_from_sdk {
    ($($op:ty),+) => {
        $(
            impl From<SdkError<$op>> for LibraryError {
                fn from(err: SdkError<$op>) -> Self {
                    let (retryable, reason) = retryable_sdk_error(&err);
                    LibraryError::database_or_unavailable(format!("{:?}", err).as_str(), reason, retryable)
                }
            }
        )+
    };
}

library_error_from_sdk!(GetItemError, UpdateItemError, PutItemError, ScanError, TransactWriteItemsError);

pub(crate) fn retryable_sdk_error<T>(err: &SdkError<T>) -> (bool, Option<String>) {
    match err {
        SdkError::ConstructionFailure(_) => { (false, Some("ConstructionFailure".to_string())) }
        SdkError::TimeoutError(_) => { (true, Some("TimeoutError".to_string())) }
        SdkError::DispatchFailure(_) => { (true, Some("DispatchFailure".to_string())) }
        SdkError::ResponseError { .. } => { (true, Some("ResponseError".to_string())) }
        SdkError::ServiceError(ctx) => {
            (ctx.raw().http().status().is_server_error() || has_exceeded_limit(ctx.raw().http().body().bytes()), Some(ctx.raw().http().status().to_string()))
        }
        _ => { (true, Some("Unknown".to_string())) }
    }
}

// throttling responses read "...Exceeded..." in the body
fn has_exceeded_limit(opts: Option<&[u8]>) -> bool {
    match opts {
        Some(b) => b.windows(6).any(|w| w == b"ceeded"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use aws_sdk_dynamodb::types::AttributeValue;
    use chrono::Utc;
    use crate::utils::ddb::{from_ddb, has_exceeded_limit, opt_number, parse_date_attribute, parse_opt_number_attribute, parse_strings_attribute, string_date, string_list, to_ddb_page};

    #[tokio::test]
    async fn test_should_parse_attributes() {
        let now = Utc::now().naive_utc();
        let map = HashMap::from([
            ("ids".to_string(), string_list(&["a".to_string(), "b".to_string()])),
            ("at".to_string(), string_date(now)),
            ("position".to_string(), opt_number(Some(3))),
            ("none".to_string(), opt_number(None)),
        ]);
        assert_eq!(vec!["a".to_string(), "b".to_string()], parse_strings_attribute("ids", &map));
        assert_eq!(Some(now), parse_date_attribute("at", &map));
        assert_eq!(Some(3), parse_opt_number_attribute("position", &map));
        assert_eq!(None, parse_opt_number_attribute("none", &map));
        assert!(parse_strings_attribute("missing", &map).is_empty());
    }

    #[tokio::test]
    async fn test_should_carry_page_token() {
        let key = HashMap::from([("reservation_id".to_string(), AttributeValue::S("r1".to_string()))]);
        let res = from_ddb::<String>(None, 10, Some(&key), vec![]);
        let next = res.next_page.expect("should have next page");
        assert_eq!(Some(key), to_ddb_page(Some(next.as_str())));
        assert_eq!(None, to_ddb_page(None));
    }

    #[tokio::test]
    async fn test_should_detect_throttling() {
        assert!(has_exceeded_limit(Some(b"ProvisionedThroughputExceededException")));
        assert!(!has_exceeded_limit(Some(b"ok")));
        assert!(!has_exceeded_limit(None));
    }
}
