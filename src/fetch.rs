//! Request descriptors for calls into the campus activity API

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// How the response body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// A JSON envelope that is validated against its application code
    Envelope,
    /// A file download; envelope validation is skipped
    Binary,
}

/// One file part of a multipart upload
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Body carried by a request
#[derive(Debug, Clone)]
pub enum Body {
    Json(Value),
    Multipart(Vec<FilePart>),
}

/// Describes a single endpoint call: method, path, query and body.
///
/// API modules only build these; `HttpClient::send` executes them.
#[derive(Debug, Clone)]
pub struct Fetch {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
    pub response: ResponseKind,
}

impl Fetch {
    /// Create a new descriptor
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            response: ResponseKind::Envelope,
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a single query parameter
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add every populated field of `params` as a query parameter.
    ///
    /// `None` fields are omitted entirely rather than sent empty.
    pub fn query<T: Serialize>(mut self, params: &T) -> Result<Self> {
        match serde_json::to_value(params)? {
            Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        Value::Null => {}
                        Value::String(s) => self.query.push((key, s)),
                        Value::Number(n) => self.query.push((key, n.to_string())),
                        Value::Bool(b) => self.query.push((key, b.to_string())),
                        other => {
                            return Err(Error::invalid_input(format!(
                                "query parameter `{}` must be a scalar, got {}",
                                key, other
                            )))
                        }
                    }
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(Error::invalid_input(format!(
                "query parameters must serialize to an object, got {}",
                other
            ))),
        }
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(Body::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Add a multipart body made of file parts
    pub fn multipart(mut self, parts: Vec<FilePart>) -> Self {
        self.body = Some(Body::Multipart(parts));
        self
    }

    /// Mark the response as a binary download
    pub fn binary(mut self) -> Self {
        self.response = ResponseKind::Binary;
        self
    }

    /// Value of a query parameter, if present
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The JSON body, if one was set
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Some(Body::Json(value)) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Params {
        keyword: Option<String>,
        page_size: Option<u32>,
        organizer_id: Option<i64>,
    }

    #[test]
    fn test_query_skips_missing_fields() {
        let fetch = Fetch::get("/activities")
            .query(&Params {
                keyword: Some("跑步".to_string()),
                page_size: Some(20),
                organizer_id: None,
            })
            .unwrap();

        assert_eq!(fetch.query_value("keyword"), Some("跑步"));
        assert_eq!(fetch.query_value("pageSize"), Some("20"));
        assert_eq!(fetch.query_value("organizerId"), None);
        assert_eq!(fetch.query.len(), 2);
    }

    #[test]
    fn test_query_rejects_nested_values() {
        let result = Fetch::get("/x").query(&json!({ "tags": ["a", "b"] }));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_binary_and_json_body() {
        let fetch = Fetch::post("/checkin/generate-code/4")
            .json(&json!({ "duration": 15 }))
            .unwrap();
        assert_eq!(fetch.method, Method::POST);
        assert_eq!(fetch.response, ResponseKind::Envelope);
        assert_eq!(fetch.json_body(), Some(&json!({ "duration": 15 })));

        let download = Fetch::get("/statistics/export/4").binary();
        assert_eq!(download.response, ResponseKind::Binary);
        assert!(download.json_body().is_none());
    }
}
