use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_s3::primitives::ByteStream;
use log::debug;
use serde_json::Value;

use crate::types::Payload;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, content: &str, content_type: &str) -> Result<()>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put_item(&self, table: &str, item: &Payload) -> Result<()>;
}

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, bucket: &str, key: &str, content: &str, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(content.as_bytes().to_vec()))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("Failed to put s3://{bucket}/{key}"))?;
        debug!("Wrote {} bytes to s3://{}/{}", content.len(), bucket, key);
        Ok(())
    }
}

pub struct DynamoRecordStore {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoRecordStore {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn put_item(&self, table: &str, item: &Payload) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_attribute_map(item)))
            .send()
            .await
            .with_context(|| format!("Failed to put item into {table}"))?;
        debug!("Wrote item with {} attributes to {}", item.len(), table);
        Ok(())
    }
}

fn to_attribute_map(item: &Payload) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(to_attribute_map(map)),
    }
}

/// Build the AWS-backed stores, sharing one SDK config between both clients.
pub async fn aws_stores() -> (S3BlobStore, DynamoRecordStore) {
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    (
        S3BlobStore::new(aws_sdk_s3::Client::new(&sdk_config)),
        DynamoRecordStore::new(aws_sdk_dynamodb::Client::new(&sdk_config)),
    )
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredBlob {
    pub bucket: String,
    pub key: String,
    pub content: String,
    pub content_type: String,
}

/// Blob store kept in memory, for dry runs and tests.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<Vec<StoredBlob>>>,
    fail_with: Option<String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every `put` fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn blobs(&self) -> Vec<StoredBlob> {
        self.blobs.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<String> {
        self.blobs()
            .into_iter()
            .rev()
            .find(|b| b.bucket == bucket && b.key == key)
            .map(|b| b.content)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bucket: &str, key: &str, content: &str, content_type: &str) -> Result<()> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{message}"));
        }

        self.blobs
            .lock()
            .map_err(|_| anyhow!("blob store lock poisoned"))?
            .push(StoredBlob {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                content: content.to_owned(),
                content_type: content_type.to_owned(),
            });
        Ok(())
    }
}

/// Record store kept in memory, keyed by partition and sort key attributes.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    items: Arc<Mutex<Vec<(String, Payload)>>>,
    key_attributes: Option<(String, String)>,
    fail_with: Option<String>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items sharing the same values for both attributes overwrite one another.
    pub fn keyed_by(partition_key: &str, sort_key: &str) -> Self {
        Self {
            key_attributes: Some((partition_key.to_owned(), sort_key.to_owned())),
            ..Self::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn items(&self, table: &str) -> Vec<Payload> {
        self.items
            .lock()
            .map(|items| {
                items
                    .iter()
                    .filter(|(t, _)| t == table)
                    .map(|(_, item)| item.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn same_key(&self, a: &Payload, b: &Payload) -> bool {
        match &self.key_attributes {
            Some((pk, sk)) => a.get(pk) == b.get(pk) && a.get(sk) == b.get(sk),
            None => false,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put_item(&self, table: &str, item: &Payload) -> Result<()> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{message}"));
        }

        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow!("record store lock poisoned"))?;
        items.retain(|(t, existing)| !(t == table && self.same_key(existing, item)));
        items.push((table.to_owned(), item.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_attribute_value_scalars() {
        assert_eq!(
            to_attribute_value(&json!("12")),
            AttributeValue::S("12".to_owned())
        );
        assert_eq!(
            to_attribute_value(&json!(12)),
            AttributeValue::N("12".to_owned())
        );
        assert_eq!(
            to_attribute_value(&json!(1.5)),
            AttributeValue::N("1.5".to_owned())
        );
        assert_eq!(
            to_attribute_value(&json!(true)),
            AttributeValue::Bool(true)
        );
        assert_eq!(
            to_attribute_value(&Value::Null),
            AttributeValue::Null(true)
        );
    }

    #[test]
    fn test_attribute_value_nested() {
        let value = to_attribute_value(&json!({ "stops": ["A", 2] }));
        let expected = AttributeValue::M(HashMap::from([(
            "stops".to_owned(),
            AttributeValue::L(vec![
                AttributeValue::S("A".to_owned()),
                AttributeValue::N("2".to_owned()),
            ]),
        )]));
        assert_eq!(value, expected);
    }

    #[test]
    fn test_attribute_map_keeps_all_fields() {
        let item = payload(json!({ "RouteNumber": "12", "Busbreakdown ID": 1 }));
        let map = to_attribute_map(&item);
        assert_eq!(map.len(), 2);
        assert_eq!(map["RouteNumber"], AttributeValue::S("12".to_owned()));
        assert_eq!(map["Busbreakdown ID"], AttributeValue::N("1".to_owned()));
    }

    #[tokio::test]
    async fn test_memory_blob_store_put_and_get() {
        let store = MemoryBlobStore::new();
        store
            .put("raw", "a.json", r#"{"a": 1}"#, "application/json")
            .await
            .unwrap();

        assert_eq!(store.get("raw", "a.json").as_deref(), Some(r#"{"a": 1}"#));
        assert_eq!(store.get("raw", "b.json"), None);
        assert_eq!(store.blobs()[0].content_type, "application/json");
    }

    #[tokio::test]
    async fn test_memory_blob_store_failing() {
        let store = MemoryBlobStore::failing("bucket unavailable");
        let err = store
            .put("raw", "a.json", "{}", "application/json")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bucket unavailable");
        assert!(store.blobs().is_empty());
    }

    #[tokio::test]
    async fn test_memory_record_store_last_write_wins() {
        let store = MemoryRecordStore::keyed_by("RouteNumber", "OccurredOn");
        let first = payload(json!({ "RouteNumber": "12", "OccurredOn": "t", "v": 1 }));
        let second = payload(json!({ "RouteNumber": "12", "OccurredOn": "t", "v": 2 }));
        let other = payload(json!({ "RouteNumber": "13", "OccurredOn": "t", "v": 3 }));

        store.put_item("incidents", &first).await.unwrap();
        store.put_item("incidents", &second).await.unwrap();
        store.put_item("incidents", &other).await.unwrap();

        let items = store.items("incidents");
        assert_eq!(items, vec![second, other]);
        assert!(store.items("elsewhere").is_empty());
    }

    #[tokio::test]
    async fn test_memory_record_store_unkeyed_keeps_everything() {
        let store = MemoryRecordStore::new();
        let item = payload(json!({ "RouteNumber": "12" }));

        store.put_item("incidents", &item).await.unwrap();
        store.put_item("incidents", &item).await.unwrap();

        assert_eq!(store.items("incidents").len(), 2);
    }
}
