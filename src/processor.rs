use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::Value;

use crate::config::Config;
use crate::delay::parse_delay;
use crate::error::IncidentError;
use crate::priority::{AlertPriority, priority};
use crate::storage::{BlobStore, RecordStore};
use crate::types::{
    ALERT_PRIORITY, AVERAGE_DELAY_MINUTES, HOW_LONG_DELAYED, IncidentEvent, IncidentResponse,
    OCCURRED_ON, OCCURRED_ON_KEY, Payload, REASON, REQUIRED_FIELDS, ROUTE_NUMBER,
    ROUTE_NUMBER_KEY, json_type,
};

pub const SUCCESS_MESSAGE: &str = "Processed successfully";
const ARCHIVE_CONTENT_TYPE: &str = "application/json";

pub struct IncidentProcessor {
    config: Config,
    blobs: Box<dyn BlobStore>,
    records: Box<dyn RecordStore>,
}

impl IncidentProcessor {
    pub fn new(
        config: Config,
        blobs: impl BlobStore + 'static,
        records: impl RecordStore + 'static,
    ) -> Self {
        Self {
            config,
            blobs: Box::new(blobs),
            records: Box::new(records),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle a raw invocation event, whatever shape it arrives in.
    pub async fn handle_value(&self, event: &Value) -> IncidentResponse {
        self.handle_value_at(event, Utc::now()).await
    }

    pub async fn handle_value_at(&self, event: &Value, now: DateTime<Utc>) -> IncidentResponse {
        match IncidentEvent::from_value(event) {
            Ok(event) => self.handle_at(&event, now).await,
            Err(e) => respond(Err(e)),
        }
    }

    pub async fn handle(&self, event: &IncidentEvent) -> IncidentResponse {
        self.handle_at(event, Utc::now()).await
    }

    pub async fn handle_at(&self, event: &IncidentEvent, now: DateTime<Utc>) -> IncidentResponse {
        let result = match event.body.as_deref() {
            Some(body) => self.process_at(body, now).await,
            None => Err(IncidentError::parse("Event has no body")),
        };
        respond(result)
    }

    /// Run one raw report body through to the table, returning the stored item.
    pub async fn process_at(
        &self,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Payload, IncidentError> {
        let payload = match serde_json::from_str::<Value>(body)? {
            Value::Object(payload) => payload,
            other => {
                return Err(IncidentError::parse(format!(
                    "Expected a JSON object body, got {}",
                    json_type(&other)
                )));
            }
        };

        validate(&payload)?;

        let archive_key = archive_key(now);
        self.blobs
            .put(
                &self.config.raw_bucket_name,
                &archive_key,
                body,
                ARCHIVE_CONTENT_TYPE,
            )
            .await
            .map_err(|e| IncidentError::Storage(e.context("Failed to archive raw payload")))?;
        info!("Archived raw payload as {archive_key}");

        let item = record_item(enrich(payload)?, now);
        self.records
            .put_item(&self.config.table_name, &item)
            .await
            .map_err(|e| IncidentError::Storage(e.context("Failed to persist breakdown")))?;

        Ok(item)
    }
}

fn respond(result: Result<Payload, IncidentError>) -> IncidentResponse {
    match result {
        Ok(item) => {
            info!(
                "Processed breakdown on route {}",
                item.get(ROUTE_NUMBER_KEY).unwrap_or(&Value::Null)
            );
            IncidentResponse::success(SUCCESS_MESSAGE)
        }
        Err(e) => {
            warn!("Rejected breakdown report: {e}");
            IncidentResponse::failure(&e.to_string())
        }
    }
}

pub fn validate(payload: &Payload) -> Result<(), IncidentError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|f| !payload.contains_key(**f))
        .map(|f| (*f).to_owned())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(IncidentError::Validation { missing })
    }
}

/// Attach the computed priority and delay estimate.
///
/// A `Reason` that is a list or map, or a non-empty `How Long Delayed` that isn't text, is
/// rejected rather than guessed at.
pub fn enrich(mut payload: Payload) -> Result<Payload, IncidentError> {
    let alert_priority = match payload.get(REASON) {
        Some(Value::String(reason)) => priority(reason),
        Some(other @ (Value::Array(_) | Value::Object(_))) => {
            return Err(IncidentError::invalid_field(REASON, "a string", other));
        }
        _ => AlertPriority::Low,
    };

    let average_delay_minutes = match payload.get(HOW_LONG_DELAYED) {
        Some(Value::String(text)) => parse_delay(Some(text.as_str())),
        Some(other) if !is_empty_value(other) => {
            return Err(IncidentError::invalid_field(
                HOW_LONG_DELAYED,
                "a string",
                other,
            ));
        }
        _ => parse_delay(None),
    };
    debug!("alert_priority={alert_priority}, average_delay_minutes={average_delay_minutes}");

    payload.insert(ALERT_PRIORITY.to_owned(), alert_priority.as_str().into());
    payload.insert(AVERAGE_DELAY_MINUTES.to_owned(), average_delay_minutes.into());
    Ok(payload)
}

/// The stored item: table keys first, with the payload's own fields spread over them.
pub fn record_item(payload: Payload, now: DateTime<Utc>) -> Payload {
    let route_number = payload.get(ROUTE_NUMBER).cloned().unwrap_or(Value::Null);
    let occurred_on = payload
        .get(OCCURRED_ON)
        .cloned()
        .unwrap_or_else(|| timestamp(now).into());

    let mut item = Payload::new();
    item.insert(ROUTE_NUMBER_KEY.to_owned(), route_number);
    item.insert(OCCURRED_ON_KEY.to_owned(), occurred_on);
    item.extend(payload);
    item
}

/// Null, false, zero and empty values all read as "no delay given".
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(values) => values.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// ISO-8601 without a zone; the fraction is left off on whole seconds.
fn timestamp(now: DateTime<Utc>) -> String {
    if now.timestamp_subsec_micros() == 0 {
        now.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

pub fn archive_key(now: DateTime<Utc>) -> String {
    format!("{}.json", timestamp(now))
}
