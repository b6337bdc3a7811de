//! Typed constructors for every built-in binding kind.
//!
//! Each takes the settings the host requires for that kind; optional ones
//! are added with [`Binding::with_setting`].

use serde::{Deserialize, Serialize};

use crate::decl::{Binding, RETURN_BINDING};

/// HTTP trigger authorization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthLevel {
    Anonymous,
    Function,
    Admin,
}

impl AuthLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthLevel::Anonymous => "anonymous",
            AuthLevel::Function => "function",
            AuthLevel::Admin => "admin",
        }
    }
}

/// Whether a streaming trigger delivers one event or a batch per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::One => "one",
            Cardinality::Many => "many",
        }
    }
}

// --- HTTP ---

pub fn http_trigger(name: &str, auth_level: AuthLevel) -> Binding {
    Binding::trigger("httpTrigger", name).with_setting("auth_level", auth_level.as_str())
}

/// The response binding; `$return` unless the function writes it through a parameter.
pub fn http_output(name: Option<&str>) -> Binding {
    Binding::output("http", name.unwrap_or(RETURN_BINDING))
}

// --- Blob ---

pub fn blob_trigger(name: &str, path: &str, connection: &str) -> Binding {
    Binding::trigger("blobTrigger", name)
        .with_setting("path", path)
        .with_setting("connection", connection)
}

pub fn blob_input(name: &str, path: &str, connection: &str) -> Binding {
    Binding::input("blob", name)
        .with_setting("path", path)
        .with_setting("connection", connection)
}

pub fn blob_output(name: &str, path: &str, connection: &str) -> Binding {
    Binding::output("blob", name)
        .with_setting("path", path)
        .with_setting("connection", connection)
}

// --- Storage queue ---

pub fn queue_trigger(name: &str, queue_name: &str, connection: &str) -> Binding {
    Binding::trigger("queueTrigger", name)
        .with_setting("queue_name", queue_name)
        .with_setting("connection", connection)
}

pub fn queue_output(name: &str, queue_name: &str, connection: &str) -> Binding {
    Binding::output("queue", name)
        .with_setting("queue_name", queue_name)
        .with_setting("connection", connection)
}

// --- Event Hub ---

pub fn event_hub_trigger(
    name: &str,
    event_hub_name: &str,
    connection: &str,
    cardinality: Cardinality,
) -> Binding {
    Binding::trigger("eventHubTrigger", name)
        .with_setting("event_hub_name", event_hub_name)
        .with_setting("connection", connection)
        .with_setting("cardinality", cardinality.as_str())
}

pub fn event_hub_output(name: &str, event_hub_name: &str, connection: &str) -> Binding {
    Binding::output("eventHub", name)
        .with_setting("event_hub_name", event_hub_name)
        .with_setting("connection", connection)
}

// --- Kafka ---

pub fn kafka_trigger(name: &str, topic: &str, broker_list: &str, cardinality: Cardinality) -> Binding {
    Binding::trigger("kafkaTrigger", name)
        .with_setting("topic", topic)
        .with_setting("broker_list", broker_list)
        .with_setting("cardinality", cardinality.as_str())
}

pub fn kafka_output(name: &str, topic: &str, broker_list: &str) -> Binding {
    Binding::output("kafka", name)
        .with_setting("topic", topic)
        .with_setting("broker_list", broker_list)
}

// --- Service Bus ---

pub fn service_bus_queue_trigger(name: &str, queue_name: &str, connection: &str) -> Binding {
    Binding::trigger("serviceBusTrigger", name)
        .with_setting("queue_name", queue_name)
        .with_setting("connection", connection)
}

pub fn service_bus_topic_trigger(
    name: &str,
    topic_name: &str,
    subscription_name: &str,
    connection: &str,
) -> Binding {
    Binding::trigger("serviceBusTrigger", name)
        .with_setting("topic_name", topic_name)
        .with_setting("subscription_name", subscription_name)
        .with_setting("connection", connection)
}

pub fn service_bus_queue_output(name: &str, queue_name: &str, connection: &str) -> Binding {
    Binding::output("serviceBus", name)
        .with_setting("queue_name", queue_name)
        .with_setting("connection", connection)
}

pub fn service_bus_topic_output(name: &str, topic_name: &str, connection: &str) -> Binding {
    Binding::output("serviceBus", name)
        .with_setting("topic_name", topic_name)
        .with_setting("connection", connection)
}

// --- Timer ---

pub fn timer_trigger(name: &str, schedule: &str) -> Binding {
    Binding::trigger("timerTrigger", name).with_setting("schedule", schedule)
}

// --- SQL / MySQL ---

pub fn sql_trigger(name: &str, table_name: &str, connection_string_setting: &str) -> Binding {
    Binding::trigger("sqlTrigger", name)
        .with_setting("table_name", table_name)
        .with_setting("connection_string_setting", connection_string_setting)
}

pub fn sql_input(name: &str, command_text: &str, connection_string_setting: &str) -> Binding {
    Binding::input("sql", name)
        .with_setting("command_text", command_text)
        .with_setting("connection_string_setting", connection_string_setting)
}

pub fn sql_output(name: &str, command_text: &str, connection_string_setting: &str) -> Binding {
    Binding::output("sql", name)
        .with_setting("command_text", command_text)
        .with_setting("connection_string_setting", connection_string_setting)
}

pub fn mysql_trigger(name: &str, table_name: &str, connection_string_setting: &str) -> Binding {
    Binding::trigger("mysqlTrigger", name)
        .with_setting("table_name", table_name)
        .with_setting("connection_string_setting", connection_string_setting)
}

pub fn mysql_input(name: &str, command_text: &str, connection_string_setting: &str) -> Binding {
    Binding::input("mysql", name)
        .with_setting("command_text", command_text)
        .with_setting("connection_string_setting", connection_string_setting)
}

pub fn mysql_output(name: &str, command_text: &str, connection_string_setting: &str) -> Binding {
    Binding::output("mysql", name)
        .with_setting("command_text", command_text)
        .with_setting("connection_string_setting", connection_string_setting)
}

// --- Cosmos DB ---

pub fn cosmos_db_trigger(
    name: &str,
    database_name: &str,
    container_name: &str,
    connection: &str,
) -> Binding {
    Binding::trigger("cosmosDBTrigger", name)
        .with_setting("database_name", database_name)
        .with_setting("container_name", container_name)
        .with_setting("connection", connection)
}

pub fn cosmos_db_input(
    name: &str,
    database_name: &str,
    container_name: &str,
    connection: &str,
) -> Binding {
    Binding::input("cosmosDB", name)
        .with_setting("database_name", database_name)
        .with_setting("container_name", container_name)
        .with_setting("connection", connection)
}

pub fn cosmos_db_output(
    name: &str,
    database_name: &str,
    container_name: &str,
    connection: &str,
) -> Binding {
    Binding::output("cosmosDB", name)
        .with_setting("database_name", database_name)
        .with_setting("container_name", container_name)
        .with_setting("connection", connection)
}

// --- Table ---

pub fn table_input(name: &str, table_name: &str, connection: &str) -> Binding {
    Binding::input("table", name)
        .with_setting("table_name", table_name)
        .with_setting("connection", connection)
}

pub fn table_output(name: &str, table_name: &str, connection: &str) -> Binding {
    Binding::output("table", name)
        .with_setting("table_name", table_name)
        .with_setting("connection", connection)
}

// --- Event Grid ---

pub fn event_grid_trigger(name: &str) -> Binding {
    Binding::trigger("eventGridTrigger", name)
}

pub fn event_grid_output(name: &str, topic_endpoint_uri: &str, topic_key_setting: &str) -> Binding {
    Binding::output("eventGrid", name)
        .with_setting("topic_endpoint_uri", topic_endpoint_uri)
        .with_setting("topic_key_setting", topic_key_setting)
}

// --- Durable ---

pub fn orchestration_trigger(name: &str) -> Binding {
    Binding::trigger("orchestrationTrigger", name)
}

pub fn entity_trigger(name: &str) -> Binding {
    Binding::trigger("entityTrigger", name)
}

pub fn activity_trigger(name: &str) -> Binding {
    Binding::trigger("activityTrigger", name)
}

pub fn durable_client_input(name: &str) -> Binding {
    Binding::input("durableClient", name)
}

// --- Authentication events ---

pub fn authentication_events_trigger(name: &str) -> Binding {
    Binding::trigger("authenticationEventsTrigger", name)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn settings_are_camel_cased() {
        let binding = sql_input("products", "SELECT * FROM Products", "SqlConnectionString");
        assert_eq!(
            binding.dict_repr(),
            json!({
                "direction": "IN",
                "type": "sql",
                "name": "products",
                "commandText": "SELECT * FROM Products",
                "connectionStringSetting": "SqlConnectionString"
            })
        );
    }

    #[test]
    fn http_pair_uses_return_binding() {
        let trigger = http_trigger("req", AuthLevel::Anonymous);
        assert!(trigger.is_trigger());
        assert_eq!(trigger.dict_repr()["authLevel"], "anonymous");
        assert_eq!(http_output(None).name(), RETURN_BINDING);
    }

    #[test]
    fn batch_triggers_carry_cardinality() {
        let binding = event_hub_trigger("events", "hub", "Conn", Cardinality::Many);
        assert_eq!(binding.dict_repr()["cardinality"], "many");
        assert_eq!(binding.dict_repr()["eventHubName"], "hub");
    }
}
