use chrono::{DateTime, Utc};
use serde_json::Value;

/// Event Grid event, used both for triggers and for the output binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventGridEvent {
    pub id: String,
    pub data: Value,
    pub topic: Option<String>,
    pub subject: String,
    pub event_type: String,
    pub event_time: Option<DateTime<Utc>>,
    pub data_version: String,
}

impl EventGridEvent {
    pub fn get_json(&self) -> &Value {
        &self.data
    }

    /// Wire shape of an output event. `topic` is set by the host, not the function.
    pub fn to_output_json(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "subject": self.subject,
            "dataVersion": self.data_version,
            "eventType": self.event_type,
            "data": self.data,
            "eventTime": self.event_time.map(|t| t.to_rfc3339()),
        })
    }
}
