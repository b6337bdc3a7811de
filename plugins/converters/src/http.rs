use std::collections::BTreeMap;

use hostbind_api::http::{HttpHeaders, HttpRequest, HttpResponse};
use hostbind_api::{ConvertError, Converter, Datum, DatumType, Native, NativeType, TriggerMetadata};

use crate::util::{require, unsupported_native};

const TRIGGER: &str = "httpTrigger";
const OUTPUT: &str = "http";

/// `httpTrigger`: rebuilds an [`HttpRequest`] from the host's nested field map.
#[derive(Debug, Default)]
pub struct HttpRequestConverter;

impl Converter for HttpRequestConverter {
    fn binding(&self) -> &'static str {
        TRIGGER
    }

    fn trigger(&self) -> Option<&'static str> {
        Some(TRIGGER)
    }

    fn check_input_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::HttpRequest)
    }

    fn decode(
        &self,
        datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        let datum = require(datum, TRIGGER)?;
        if datum.datum_type() != &DatumType::Http {
            return Err(ConvertError::unsupported_for_binding(TRIGGER, datum.datum_type()));
        }
        let fields = datum
            .fields()
            .ok_or_else(|| ConvertError::invalid(TRIGGER, "http datum carries no fields"))?;

        let method = text_field(fields, "method")?;
        let url = text_field(fields, "url")?;

        let mut request = HttpRequest::new(method, url).with_body(request_body(fields.get("body"))?);
        request.headers = string_map(fields, "headers")?.into_iter().collect();
        request.params = string_map(fields, "query")?;
        request.route_params = string_map(fields, "params")?;

        Ok(Some(Native::HttpRequest(request)))
    }
}

fn text_field(fields: &BTreeMap<String, Datum>, name: &str) -> Result<String, ConvertError> {
    fields
        .get(name)
        .and_then(Datum::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConvertError::invalid(TRIGGER, format!("missing or non-text field '{name}'")))
}

/// A nested `http` datum of string datums; absent maps are empty.
fn string_map(
    fields: &BTreeMap<String, Datum>,
    name: &str,
) -> Result<BTreeMap<String, String>, ConvertError> {
    let Some(nested) = fields.get(name) else {
        return Ok(BTreeMap::new());
    };
    let entries = nested
        .fields()
        .ok_or_else(|| ConvertError::invalid(TRIGGER, format!("field '{name}' is not a map")))?;
    entries
        .iter()
        .map(|(k, v)| {
            v.as_str()
                .map(|s| (k.clone(), s.to_string()))
                .ok_or_else(|| ConvertError::invalid(TRIGGER, format!("non-text value for '{name}.{k}'")))
        })
        .collect()
}

fn request_body(body: Option<&Datum>) -> Result<Vec<u8>, ConvertError> {
    let Some(body) = body else {
        return Ok(Vec::new());
    };
    match body.datum_type() {
        DatumType::Bytes | DatumType::String | DatumType::Json => {
            Ok(body.as_bytes().map(<[u8]>::to_vec).unwrap_or_default())
        }
        other => Err(ConvertError::UnsupportedDatumType {
            datum_type: other.to_string(),
            context: "http request body".to_string(),
        }),
    }
}

/// `http` output: encodes an [`HttpResponse`] (or a bare string body).
#[derive(Debug, Default)]
pub struct HttpResponseConverter;

impl Converter for HttpResponseConverter {
    fn binding(&self) -> &'static str {
        OUTPUT
    }

    fn check_output_type(&self, ty: &NativeType) -> bool {
        matches!(ty, NativeType::HttpResponse | NativeType::Str)
    }

    fn encode(&self, value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        match value {
            Native::Str(s) => Ok(Datum::string(s)),
            Native::HttpResponse(response) => Ok(encode_response(&response)),
            other => Err(unsupported_native(OUTPUT, &other)),
        }
    }
}

fn encode_response(response: &HttpResponse) -> Datum {
    let mut headers: HttpHeaders = response.headers.iter().collect();
    if !headers.contains("content-type") {
        headers.insert("content-type", response.content_type());
    }

    let header_fields = headers
        .iter()
        .map(|(k, v)| (k.to_string(), Datum::string(v)))
        .collect();

    let mut fields = BTreeMap::new();
    fields.insert(
        "status_code".to_string(),
        Datum::string(response.status_code.to_string()),
    );
    fields.insert("headers".to_string(), Datum::http(header_fields));
    fields.insert("body".to_string(), Datum::bytes(response.get_body().to_vec()));
    Datum::http(fields)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn string_fields(pairs: &[(&str, &str)]) -> Datum {
        Datum::http(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Datum::string(*v)))
                .collect(),
        )
    }

    fn request_datum(body: Datum) -> Datum {
        let mut fields = BTreeMap::new();
        fields.insert("method".into(), Datum::string("post"));
        fields.insert("url".into(), Datum::string("http://localhost/api/orders/7"));
        fields.insert("headers".into(), string_fields(&[("Content-Type", "application/json")]));
        fields.insert("query".into(), string_fields(&[("verbose", "1")]));
        fields.insert("params".into(), string_fields(&[("id", "7")]));
        fields.insert("body".into(), body);
        Datum::http(fields)
    }

    #[test]
    fn decodes_request_fields() {
        let datum = request_datum(Datum::string(r#"{"qty": 2}"#));
        let Some(Native::HttpRequest(req)) = HttpRequestConverter.decode(Some(&datum), None).unwrap()
        else {
            panic!("expected an http request");
        };
        assert_eq!(req.method(), "POST");
        assert_eq!(req.url(), "http://localhost/api/orders/7");
        assert_eq!(req.headers.get("content-type"), Some("application/json"));
        assert_eq!(req.params["verbose"], "1");
        assert_eq!(req.route_params["id"], "7");
        assert_eq!(req.get_json().unwrap()["qty"], 2);
    }

    #[test]
    fn rejects_non_http_datums() {
        let err = HttpRequestConverter
            .decode(Some(&Datum::new(hostbind_api::DatumValue::String("<a/>".into()), "xml")), None)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("xml") && msg.contains("httpTrigger"), "{msg}");
    }

    #[test]
    fn synthesizes_content_type() {
        let response = HttpResponse::new(b"<p>hi</p>".to_vec())
            .with_status(201)
            .with_mimetype("text/html");
        let datum = HttpResponseConverter
            .encode(Native::HttpResponse(response), None)
            .unwrap();

        let fields = datum.fields().unwrap();
        assert_eq!(fields["status_code"], Datum::string("201"));
        assert_eq!(fields["body"], Datum::bytes(b"<p>hi</p>".to_vec()));
        let headers = fields["headers"].fields().unwrap();
        assert_eq!(headers["content-type"], Datum::string("text/html; charset=utf-8"));
    }

    #[test]
    fn explicit_content_type_wins() {
        let response = HttpResponse::new(Vec::new()).with_header("Content-Type", "application/xml");
        let datum = HttpResponseConverter
            .encode(Native::HttpResponse(response), None)
            .unwrap();
        let headers = datum.fields().unwrap()["headers"].fields().unwrap().clone();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["content-type"], Datum::string("application/xml"));
    }

    #[test]
    fn string_return_is_a_string_datum() {
        let datum = HttpResponseConverter.encode(Native::Str("ok".into()), None).unwrap();
        assert_eq!(datum, Datum::string("ok"));
        assert!(HttpResponseConverter.encode(Native::Int(1), None).is_err());
    }
}
