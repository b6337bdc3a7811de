use hostbind_api::blob::InputStream;
use hostbind_api::rows::{Row, RowFlavor, RowList};
use hostbind_api::{ConvertError, Converter, Datum, DatumType, Native, NativeType, TriggerMetadata};
use serde_json::Value;

use crate::util::{body_bytes, body_json, unsupported_native};

/// Row-oriented bindings: SQL, MySQL, Cosmos DB and Table storage.
///
/// Decoding always yields a row list. A single JSON object becomes a
/// one-element list and `null` entries stay in place as `None`. Encoding
/// always produces a JSON array, even for one row.
#[derive(Debug, Clone, Copy)]
pub struct RowsConverter {
    binding: &'static str,
    trigger: Option<&'static str>,
    flavor: RowFlavor,
    /// SQL-style change triggers hand the change list through as JSON text.
    raw_changes: bool,
}

impl RowsConverter {
    pub const fn sql() -> Self {
        Self::input_output("sql", RowFlavor::Sql)
    }

    pub const fn sql_trigger() -> Self {
        Self::change_trigger("sqlTrigger", RowFlavor::Sql)
    }

    pub const fn mysql() -> Self {
        Self::input_output("mysql", RowFlavor::MySql)
    }

    pub const fn mysql_trigger() -> Self {
        Self::change_trigger("mysqlTrigger", RowFlavor::MySql)
    }

    pub const fn cosmos_db() -> Self {
        Self::input_output("cosmosDB", RowFlavor::CosmosDb)
    }

    pub const fn cosmos_db_trigger() -> Self {
        Self {
            binding: "cosmosDBTrigger",
            trigger: Some("cosmosDBTrigger"),
            flavor: RowFlavor::CosmosDb,
            raw_changes: false,
        }
    }

    pub const fn table() -> Self {
        Self::input_output("table", RowFlavor::Table)
    }

    const fn input_output(binding: &'static str, flavor: RowFlavor) -> Self {
        Self {
            binding,
            trigger: None,
            flavor,
            raw_changes: false,
        }
    }

    const fn change_trigger(binding: &'static str, flavor: RowFlavor) -> Self {
        Self {
            binding,
            trigger: Some(binding),
            flavor,
            raw_changes: true,
        }
    }

    pub fn flavor(&self) -> RowFlavor {
        self.flavor
    }

    fn is_table(&self) -> bool {
        self.flavor == RowFlavor::Table
    }
}

impl Converter for RowsConverter {
    fn binding(&self) -> &'static str {
        self.binding
    }

    fn trigger(&self) -> Option<&'static str> {
        self.trigger
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        if self.raw_changes {
            return matches!(ty, NativeType::Str);
        }
        match ty {
            NativeType::Row(f) | NativeType::RowList(f) => *f == self.flavor,
            NativeType::Str | NativeType::Bytes => self.is_table(),
            _ => false,
        }
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        if self.trigger.is_some() {
            return false;
        }
        match ty {
            NativeType::Row(f) | NativeType::RowList(f) => *f == self.flavor,
            NativeType::List(inner) => matches!(**inner, NativeType::Row(f) if f == self.flavor),
            NativeType::Str | NativeType::Bytes | NativeType::InputStream => self.is_table(),
            _ => false,
        }
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let Some(datum) = datum else {
            return Ok(None);
        };

        if self.raw_changes {
            let raw = body_bytes(datum, self.binding)?;
            let text = String::from_utf8(raw)
                .map_err(|e| ConvertError::invalid(self.binding, format!("change list is not UTF-8: {e}")))?;
            return Ok(Some(Native::Str(text)));
        }

        if self.is_table() {
            match datum.datum_type() {
                DatumType::String => {
                    return Ok(datum.as_str().map(|s| Native::Str(s.to_string())));
                }
                DatumType::Bytes => {
                    return Ok(datum.as_bytes().map(|b| Native::Bytes(b.to_vec())));
                }
                _ => {}
            }
        }

        let value = body_json(datum, self.binding)?;
        rows_from_json(value, self.binding).map(|rows| rows.map(Native::Rows))
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        let rows = match value {
            Native::Row(row) => vec![Value::Object(row.into_map())],
            Native::Rows(rows) => rows.into_iter().map(row_value).collect(),
            Native::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Native::Row(row) => Ok(Value::Object(row.into_map())),
                    other => Err(unsupported_native(self.binding, &other)),
                })
                .collect::<Result<_, _>>()?,
            Native::Json(Value::Object(map)) => vec![Value::Object(map)],
            Native::Json(Value::Array(items)) => items,
            Native::Str(s) if self.is_table() => return Ok(Datum::string(s)),
            Native::Bytes(b) if self.is_table() => return Ok(Datum::bytes(b)),
            Native::Stream(stream) if self.is_table() => return Ok(read_stream(stream)),
            other => return Err(unsupported_native(self.binding, &other)),
        };
        Ok(Datum::json_value(&Value::Array(rows)))
    }
}

fn read_stream(mut stream: InputStream) -> Datum {
    Datum::bytes(stream.read_remaining())
}

fn row_value(row: Option<Row>) -> Value {
    match row {
        Some(row) => Value::Object(row.into_map()),
        None => Value::Null,
    }
}

/// Normalize a decoded JSON payload into a row list.
///
/// A top-level `null` means no rows at all and decodes to nothing.
fn rows_from_json(value: Value, binding: &'static str) -> Result<Option<RowList>, ConvertError> {
    let items = match value {
        Value::Null => return Ok(None),
        Value::Object(map) => return Ok(Some(vec![Some(Row::from(map))])),
        Value::Array(items) => items,
        other => {
            return Err(ConvertError::invalid(
                binding,
                format!("expected a JSON object or array of rows, got {other}"),
            ));
        }
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(Row::from(map))),
            other => Err(ConvertError::invalid(
                binding,
                format!("row entries must be JSON objects, got {other}"),
            )),
        })
        .collect::<Result<_, _>>()
        .map(Some)
}
