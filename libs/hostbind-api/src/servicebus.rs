use std::cell::OnceCell;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::datum::TriggerMetadata;

/// Service Bus message delivered to a `serviceBusTrigger` function.
///
/// An empty body is valid: the host sends no payload datum for it.
#[derive(Debug, Clone, Default)]
pub struct ServiceBusMessage {
    body: Vec<u8>,
    trigger_metadata: Option<TriggerMetadata>,
    metadata: OnceCell<Map<String, Value>>,

    pub application_properties: Option<Map<String, Value>>,
    pub content_type: Option<String>,
    pub correlation_id: Option<String>,
    pub dead_letter_error_description: Option<String>,
    pub dead_letter_reason: Option<String>,
    pub dead_letter_source: Option<String>,
    pub delivery_count: Option<i64>,
    pub enqueued_sequence_number: Option<i64>,
    pub enqueued_time_utc: Option<DateTime<Utc>>,
    pub expires_at_utc: Option<DateTime<Utc>>,
    pub label: Option<String>,
    pub locked_until: Option<DateTime<Utc>>,
    pub lock_token: Option<String>,
    pub message_id: Option<String>,
    pub partition_key: Option<String>,
    pub reply_to: Option<String>,
    pub reply_to_session_id: Option<String>,
    pub scheduled_enqueue_time_utc: Option<DateTime<Utc>>,
    pub sequence_number: Option<i64>,
    pub session_id: Option<String>,
    pub state: Option<i64>,
    pub subject: Option<String>,
    /// Raw host text; durations are not decoded.
    pub time_to_live: Option<String>,
    pub to: Option<String>,
    pub transaction_partition_key: Option<String>,
    pub user_properties: Option<Map<String, Value>>,
}

impl ServiceBusMessage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_trigger_metadata(mut self, metadata: TriggerMetadata) -> Self {
        self.trigger_metadata = Some(metadata);
        self.metadata = OnceCell::new();
        self
    }

    pub fn get_body(&self) -> &[u8] {
        &self.body
    }

    pub fn trigger_metadata(&self) -> Option<&TriggerMetadata> {
        self.trigger_metadata.as_ref()
    }

    /// Trigger metadata as plain JSON values.
    ///
    /// Built on first access and cached for the lifetime of the message.
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        let raw = self.trigger_metadata.as_ref()?;
        Some(self.metadata.get_or_init(|| {
            raw.iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect()
        }))
    }
}

// The lazily built metadata view is a cache and takes no part in equality.
impl PartialEq for ServiceBusMessage {
    fn eq(&self, other: &Self) -> bool {
        let Self {
            body,
            trigger_metadata,
            metadata: _,
            application_properties,
            content_type,
            correlation_id,
            dead_letter_error_description,
            dead_letter_reason,
            dead_letter_source,
            delivery_count,
            enqueued_sequence_number,
            enqueued_time_utc,
            expires_at_utc,
            label,
            locked_until,
            lock_token,
            message_id,
            partition_key,
            reply_to,
            reply_to_session_id,
            scheduled_enqueue_time_utc,
            sequence_number,
            session_id,
            state,
            subject,
            time_to_live,
            to,
            transaction_partition_key,
            user_properties,
        } = self;
        *body == other.body
            && *trigger_metadata == other.trigger_metadata
            && *application_properties == other.application_properties
            && *content_type == other.content_type
            && *correlation_id == other.correlation_id
            && *dead_letter_error_description == other.dead_letter_error_description
            && *dead_letter_reason == other.dead_letter_reason
            && *dead_letter_source == other.dead_letter_source
            && *delivery_count == other.delivery_count
            && *enqueued_sequence_number == other.enqueued_sequence_number
            && *enqueued_time_utc == other.enqueued_time_utc
            && *expires_at_utc == other.expires_at_utc
            && *label == other.label
            && *locked_until == other.locked_until
            && *lock_token == other.lock_token
            && *message_id == other.message_id
            && *partition_key == other.partition_key
            && *reply_to == other.reply_to
            && *reply_to_session_id == other.reply_to_session_id
            && *scheduled_enqueue_time_utc == other.scheduled_enqueue_time_utc
            && *sequence_number == other.sequence_number
            && *session_id == other.session_id
            && *state == other.state
            && *subject == other.subject
            && *time_to_live == other.time_to_live
            && *to == other.to
            && *transaction_partition_key == other.transaction_partition_key
            && *user_properties == other.user_properties
    }
}

#[cfg(test)]
mod tests {
    use crate::datum::Datum;

    use super::*;

    #[test]
    fn metadata_is_materialized_once() {
        let mut raw = TriggerMetadata::new();
        raw.insert("DeliveryCount".into(), Datum::int(2));
        raw.insert("UserProperties".into(), Datum::json(r#"{"k":"v"}"#));
        let msg = ServiceBusMessage::new(b"x".to_vec()).with_trigger_metadata(raw);

        let first = msg.metadata().unwrap() as *const Map<String, Value>;
        let second = msg.metadata().unwrap() as *const Map<String, Value>;
        assert_eq!(first, second);
        assert_eq!(msg.metadata().unwrap()["DeliveryCount"], 2);
        assert_eq!(msg.metadata().unwrap()["UserProperties"]["k"], "v");
    }

    #[test]
    fn reading_metadata_keeps_equality() {
        let mut raw = TriggerMetadata::new();
        raw.insert("MessageId".into(), Datum::string("m1"));
        let msg = ServiceBusMessage::new(b"x".to_vec()).with_trigger_metadata(raw);
        let copy = msg.clone();

        assert!(msg.metadata().is_some());
        assert_eq!(msg, copy);
        assert_ne!(msg, ServiceBusMessage::new(b"y".to_vec()));
    }

    #[test]
    fn no_trigger_metadata_means_no_view() {
        assert!(ServiceBusMessage::new(Vec::new()).metadata().is_none());
    }
}
