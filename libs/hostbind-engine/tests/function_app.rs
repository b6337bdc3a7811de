use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use hostbind_api::durable::{CustomObject, CustomTypes, Serializable};
use hostbind_api::http::HttpResponse;
use hostbind_api::rows::Row;
use hostbind_api::{ConvertError, Datum, Native, TriggerMetadata};
use hostbind_engine::config::AppConfig;
use hostbind_engine::{default_registry, EngineError, FunctionApp};
use pretty_assertions::assert_eq;
use serde_json::json;

const APP: &str = r#"
script_file = "app.rs"

[[functions]]
name = "hello"
auth_level = "anonymous"

[[functions.bindings]]
type = "httpTrigger"
name = "req"
methods = ["get", "post"]
route = "hello/{name}"

[[functions.bindings]]
type = "http"
name = "$return"

[[functions]]
name = "drain"
script_file = "drain.rs"

[[functions.bindings]]
type = "serviceBusTrigger"
name = "msg"
queue_name = "orders"
connection = "ServiceBus"

[[functions.bindings]]
type = "sql"
name = "orders"
direction = "out"
command_text = "dbo.Orders"
connection_string_setting = "Sql"

[[functions]]
name = "price"

[[functions.bindings]]
type = "activityTrigger"
name = "quote"
"#;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[derive(Debug, PartialEq)]
struct Quote {
    cents: i64,
}

impl Serializable for Quote {
    const CLASS: &'static str = "Quote";
    const MODULE: &'static str = "pricing";

    fn to_wire(&self) -> String {
        json!({ "cents": self.cents }).to_string()
    }

    fn from_wire(data: &str) -> Result<Self, ConvertError> {
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|e| ConvertError::json("quote", e))?;
        value["cents"]
            .as_i64()
            .map(|cents| Quote { cents })
            .ok_or_else(|| ConvertError::invalid("activityTrigger", "quote without cents"))
    }
}

#[test]
fn manifest_lists_every_binding() {
    let file = write_config(APP);
    let config = AppConfig::load(file.path()).unwrap();
    let app = FunctionApp::bootstrap(&config).unwrap();

    let manifest = app.manifest();
    assert_eq!(
        manifest["hello"],
        json!({
            "scriptFile": "app.rs",
            "bindings": [
                {
                    "direction": "IN",
                    "type": "httpTrigger",
                    "name": "req",
                    "methods": ["get", "post"],
                    "route": "hello/{name}",
                    "authLevel": "anonymous"
                },
                {"direction": "OUT", "type": "http", "name": "$return"}
            ]
        })
    );
    assert_eq!(manifest["drain"]["scriptFile"], "drain.rs");
    assert_eq!(
        manifest["drain"]["bindings"][1],
        json!({
            "direction": "OUT",
            "type": "sql",
            "name": "orders",
            "commandText": "dbo.Orders",
            "connectionStringSetting": "Sql"
        })
    );
}

#[test]
fn function_without_trigger_fails_bootstrap() {
    let config = AppConfig::parse(
        r#"
[[functions]]
name = "lonely"

[[functions.bindings]]
type = "blob"
name = "doc"
path = "c/{name}"
"#,
    )
    .unwrap();
    let err = FunctionApp::bootstrap(&config).unwrap_err();
    assert!(matches!(err, EngineError::MissingTrigger(ref name) if name == "lonely"));
}

#[test]
fn two_triggers_fail_bootstrap() {
    let config = AppConfig::parse(
        r#"
[[functions]]
name = "greedy"

[[functions.bindings]]
type = "queueTrigger"
name = "a"

[[functions.bindings]]
type = "timerTrigger"
name = "b"
schedule = "0 */5 * * * *"
"#,
    )
    .unwrap();
    let err = FunctionApp::bootstrap(&config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "function 'greedy' already has trigger 'a', cannot add trigger 'b'"
    );
}

#[test]
fn unknown_binding_kind_names_its_location() {
    let config = AppConfig::parse(
        "[[functions]]\nname = \"f\"\n[[functions.bindings]]\ntype = \"smtp\"\nname = \"mail\"\n",
    )
    .unwrap();
    let err = FunctionApp::bootstrap(&config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "binding type not registered: function 'f': binding 'mail': smtp"
    );
}

#[test]
fn http_request_round_trip() {
    let app = FunctionApp::bootstrap(&AppConfig::parse(APP).unwrap()).unwrap();
    let inv = app.invocation("hello").unwrap();

    let mut fields = std::collections::BTreeMap::new();
    fields.insert("method".to_string(), Datum::string("post"));
    fields.insert("url".to_string(), Datum::string("http://localhost/api/hello/ann"));
    fields.insert("body".to_string(), Datum::json(r#"{"greeting": "hi"}"#));
    let mut inputs = HashMap::new();
    inputs.insert("req".to_string(), Datum::http(fields));

    let args = inv.decode_args(&inputs, Some(&TriggerMetadata::new())).unwrap();
    let Some(Some(Native::HttpRequest(req))) = args.get("req") else {
        panic!("expected an http request");
    };
    assert_eq!(req.method(), "POST");
    assert_eq!(req.get_json().unwrap()["greeting"], "hi");

    let datum = inv
        .encode_return(Native::HttpResponse(HttpResponse::new("hello ann").with_status(201)))
        .unwrap();
    let fields = datum.fields().unwrap();
    assert_eq!(fields["status_code"], Datum::string("201"));
    assert_eq!(fields["body"], Datum::bytes(b"hello ann".to_vec()));
}

#[test]
fn service_bus_batch_to_sql_rows() {
    let app = FunctionApp::bootstrap(&AppConfig::parse(APP).unwrap()).unwrap();
    let inv = app.invocation("drain").unwrap();

    let mut inputs = HashMap::new();
    inputs.insert(
        "msg".to_string(),
        Datum::collection_string(vec![r#"{"id": 1}"#.into(), r#"{"id": 2}"#.into()]),
    );
    let mut meta = TriggerMetadata::new();
    meta.insert(
        "MessageIdArray".into(),
        Datum::collection_string(vec!["m1".into(), "m2".into()]),
    );

    let args = inv.decode_args(&inputs, Some(&meta)).unwrap();
    let Some(Some(Native::ServiceBusMessages(msgs))) = args.get("msg") else {
        panic!("expected a message batch");
    };
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[1].message_id.as_deref(), Some("m2"));
    assert!(!args.contains_key("orders"));

    let rows = msgs
        .iter()
        .map(|m| serde_json::from_slice::<Row>(m.get_body()).map(Native::Row))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let datum = inv.encode_output("orders", Native::List(rows)).unwrap();
    assert_eq!(datum.to_json(), json!([{"id": 1}, {"id": 2}]));

    let err = inv
        .encode_output("orders", Native::List(vec![Native::Json(json!({"id": 3}))]))
        .unwrap_err();
    assert!(matches!(
        err.convert_error(),
        Some(ConvertError::UnsupportedNativeType { binding: "sql", native: "json" })
    ));
}

#[test]
fn activity_custom_objects_cross_the_boundary() {
    let types = Arc::new(CustomTypes::new().with::<Quote>());
    let registry = Arc::new(default_registry(types).unwrap());
    let app = FunctionApp::with_registry(&AppConfig::parse(APP).unwrap(), registry).unwrap();
    let inv = app.invocation("price").unwrap();

    let wire = CustomObject::new(Quote { cents: 1250 }).to_json();
    let mut inputs = HashMap::new();
    inputs.insert("quote".to_string(), Datum::json(wire.to_string()));

    let args = inv.decode_args(&inputs, None).unwrap();
    let Some(Some(Native::Custom(obj))) = args.get("quote") else {
        panic!("expected a custom object");
    };
    assert_eq!(obj.downcast_ref::<Quote>(), Some(&Quote { cents: 1250 }));

    let out = inv.encode_return(Native::Custom(obj.clone())).unwrap();
    assert_eq!(out.to_json(), wire);
}
