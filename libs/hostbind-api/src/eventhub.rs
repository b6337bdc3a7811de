use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A single Event Hub event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventHubEvent {
    body: Vec<u8>,
    pub enqueued_time: Option<DateTime<Utc>>,
    pub partition_key: Option<String>,
    pub sequence_number: Option<i64>,
    pub offset: Option<String>,
    /// IoT Hub system properties, keys without the `iothub-` prefix.
    pub iothub_metadata: BTreeMap<String, String>,
}

impl EventHubEvent {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn get_body(&self) -> &[u8] {
        &self.body
    }
}
