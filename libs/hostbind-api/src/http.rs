use std::collections::BTreeMap;

/// Case-insensitive header map. Names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders(BTreeMap<String, String>);

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HttpHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HttpHeaders::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// Incoming HTTP request handed to an `httpTrigger` function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequest {
    method: String,
    url: String,
    pub headers: HttpHeaders,
    /// Query string parameters.
    pub params: BTreeMap<String, String>,
    pub route_params: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn get_body(&self) -> &[u8] {
        &self.body
    }

    pub fn get_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Outgoing HTTP response for the `http` output binding.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    body: Vec<u8>,
    pub status_code: u16,
    pub headers: HttpHeaders,
    pub mimetype: String,
    pub charset: String,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            body: Vec::new(),
            status_code: 200,
            headers: HttpHeaders::new(),
            mimetype: "text/plain".to_string(),
            charset: "utf-8".to_string(),
        }
    }
}

impl HttpResponse {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = mimetype.into();
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn get_body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// `content-type` value derived from mimetype and charset.
    ///
    /// Only `text/*` mimetypes carry the charset parameter.
    pub fn content_type(&self) -> String {
        if self.mimetype.starts_with("text/") {
            format!("{}; charset={}", self.mimetype, self.charset)
        } else {
            self.mimetype.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive() {
        let headers: HttpHeaders = [("Content-Type", "text/html")].into_iter().collect();
        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn content_type_includes_charset_for_text() {
        assert_eq!(HttpResponse::new("x").content_type(), "text/plain; charset=utf-8");
        let json = HttpResponse::new("{}").with_mimetype("application/json");
        assert_eq!(json.content_type(), "application/json");
    }

    #[test]
    fn request_method_is_upper_cased() {
        let req = HttpRequest::new("post", "http://localhost/api").with_body(br#"{"a":1}"#.to_vec());
        assert_eq!(req.method(), "POST");
        assert_eq!(req.get_json().unwrap()["a"], 1);
    }
}
