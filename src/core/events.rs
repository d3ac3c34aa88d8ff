use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;
use crate::utils::date::serializer;

// EventCode identifies the circulation events handed to the notification gateway
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum EventCode {
    #[serde(rename = "LOAN_CREATED")]
    LoanCreated,
    #[serde(rename = "LOAN_RETURNED")]
    LoanReturned,
    #[serde(rename = "HOLD_READY")]
    HoldReady,
    #[serde(rename = "HOLD_EXPIRED")]
    HoldExpired,
}

impl Display for EventCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            EventCode::LoanCreated => write!(f, "LOAN_CREATED"),
            EventCode::LoanReturned => write!(f, "LOAN_RETURNED"),
            EventCode::HoldReady => write!(f, "HOLD_READY"),
            EventCode::HoldExpired => write!(f, "HOLD_EXPIRED"),
        }
    }
}

// CirculationEvent is the payload of a committed state change addressed to one borrower
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CirculationEvent {
    pub event_id: String,
    pub code: EventCode,
    pub item_id: String,
    pub borrower_id: String,
    // loan or reservation the event is about
    pub key: String,
    pub metadata: HashMap<String, String>,
    pub json_data: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl CirculationEvent {
    pub fn build<T: Serialize>(code: EventCode, item_id: &str, borrower_id: &str, key: &str,
                               metadata: &HashMap<String, String>, data: &T,
                               created_at: NaiveDateTime) -> serde_json::Result<Self> {
        let json = serde_json::to_string(&data)?;
        Ok(CirculationEvent {
            event_id: Uuid::new_v4().to_string(),
            code,
            item_id: item_id.to_string(),
            borrower_id: borrower_id.to_string(),
            key: key.to_string(),
            metadata: metadata.clone(),
            json_data: json,
            created_at,
        })
    }

    // Builds an event for a change that is already committed. A payload that cannot be encoded
    // costs the notification only, never the change, so the failure is logged and dropped.
    pub fn staged<T: Serialize>(code: EventCode, item_id: &str, borrower_id: &str, key: &str,
                                data: &T, created_at: NaiveDateTime) -> Option<Self> {
        let metadata = HashMap::from([("code".to_string(), code.to_string())]);
        match CirculationEvent::build(code, item_id, borrower_id, key, &metadata, data, created_at) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(code = %code, item_id, borrower_id, key, error = %err, "failed to encode event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use chrono::Utc;
    use crate::core::events::{CirculationEvent, EventCode};

    #[tokio::test]
    async fn test_should_build_event() {
        let data = HashMap::from([("a", 1), ("b", 2)]);
        let event = CirculationEvent::build(EventCode::HoldReady, "item", "borrower", "key",
                                            &HashMap::from([("k".to_string(), "v".to_string())]), &data,
                                            Utc::now().naive_utc()).expect("build event");
        assert_eq!(EventCode::HoldReady, event.code);
        assert_eq!("item", event.item_id.as_str());
        assert_eq!("borrower", event.borrower_id.as_str());
        assert_eq!("key", event.key.as_str());
    }

    #[tokio::test]
    async fn test_should_render_event_codes() {
        assert_eq!("LOAN_CREATED", EventCode::LoanCreated.to_string());
        assert_eq!("LOAN_RETURNED", EventCode::LoanReturned.to_string());
        assert_eq!("HOLD_READY", EventCode::HoldReady.to_string());
        assert_eq!("HOLD_EXPIRED", EventCode::HoldExpired.to_string());
        let json = serde_json::to_string(&EventCode::HoldExpired).expect("should serialize");
        assert_eq!("\"HOLD_EXPIRED\"", json);
    }
}
