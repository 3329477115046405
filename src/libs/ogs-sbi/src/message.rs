//! SBI Message Structures
//!
//! Request/response envelopes passed between the HTTP/2 transport and the
//! network function handlers, plus the `ProblemDetails` error body.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{content_type, header, method};
use crate::error::SbiResult;

/// Request line of an SBI message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SbiHeader {
    pub method: String,
    pub uri: String,
}

impl SbiHeader {
    pub fn with_method_uri(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
        }
    }

    /// Path portion of the URI, without scheme, authority or query.
    pub fn path(&self) -> &str {
        let uri = self.uri.as_str();
        let without_authority = match uri.find("://") {
            Some(idx) => {
                let rest = &uri[idx + 3..];
                rest.find('/').map(|p| &rest[p..]).unwrap_or("/")
            }
            None => uri,
        };
        without_authority
            .split('?')
            .next()
            .unwrap_or(without_authority)
    }

    /// Non-empty path segments
    pub fn segments(&self) -> Vec<&str> {
        self.path().split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Headers, query parameters and body shared by requests and responses
#[derive(Debug, Clone, Default)]
pub struct SbiHttpMessage {
    pub headers: HashMap<String, String>,
    pub params: HashMap<String, String>,
    pub content: Option<String>,
}

impl SbiHttpMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    /// Header lookup, case-insensitive on the name
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get_param(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    pub fn content_type(&self) -> Option<&String> {
        self.get_header(header::CONTENT_TYPE)
    }
}

/// SBI Request
#[derive(Debug, Clone, Default)]
pub struct SbiRequest {
    pub header: SbiHeader,
    pub http: SbiHttpMessage,
}

impl SbiRequest {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            header: SbiHeader::with_method_uri(method, uri),
            http: SbiHttpMessage::new(),
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(method::GET, uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(method::PUT, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(method::POST, uri)
    }

    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(method::PATCH, uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(method::DELETE, uri)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_param(key, value);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_header(key, value);
        self
    }

    pub fn with_body(mut self, content: impl Into<String>, ctype: &str) -> Self {
        self.http.set_content(content);
        self.http.set_header(header::CONTENT_TYPE, ctype);
        self
    }

    /// Serialize `body` as `application/json`
    pub fn with_json_body<T: Serialize>(self, body: &T) -> SbiResult<Self> {
        let json = serde_json::to_string(body)?;
        Ok(self.with_body(json, content_type::APPLICATION_JSON))
    }

    pub fn path(&self) -> &str {
        self.header.path()
    }

    pub fn segments(&self) -> Vec<&str> {
        self.header.segments()
    }

    /// Deserialize the body, `None` when the request carries no content
    pub fn json<T: DeserializeOwned>(&self) -> Option<SbiResult<T>> {
        self.http
            .content
            .as_deref()
            .map(|c| serde_json::from_str(c).map_err(Into::into))
    }
}

/// SBI Response
#[derive(Debug, Clone)]
pub struct SbiResponse {
    pub status: u16,
    pub http: SbiHttpMessage,
}

impl SbiResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            http: SbiHttpMessage::new(),
        }
    }

    pub fn ok() -> Self {
        Self::with_status(200)
    }

    pub fn no_content() -> Self {
        Self::with_status(204)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_header(key, value);
        self
    }

    pub fn with_body(mut self, content: impl Into<String>, ctype: &str) -> Self {
        self.http.set_content(content);
        self.http.set_header(header::CONTENT_TYPE, ctype);
        self
    }

    pub fn with_json_body<T: Serialize>(self, body: &T) -> SbiResult<Self> {
        let json = serde_json::to_string(body)?;
        Ok(self.with_body(json, content_type::APPLICATION_JSON))
    }

    pub fn with_problem(self, problem: &ProblemDetails) -> SbiResult<Self> {
        let json = serde_json::to_string(problem)?;
        Ok(self.with_body(json, content_type::APPLICATION_PROBLEM_JSON))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, key: &str) -> Option<&String> {
        self.http.get_header(key)
    }

    pub fn json<T: DeserializeOwned>(&self) -> SbiResult<T> {
        let content = self.http.content.as_deref().unwrap_or("null");
        Ok(serde_json::from_str(content)?)
    }

    /// Parse the body as `ProblemDetails`, if it is one
    pub fn problem(&self) -> Option<ProblemDetails> {
        self.http
            .content
            .as_deref()
            .and_then(|c| serde_json::from_str(c).ok())
    }
}

/// RFC 7807 problem details, as profiled by TS 29.571
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ProblemDetails {
    pub fn new(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// 500 with cause `SYSTEM_FAILURE`
    pub fn system_failure(detail: impl Into<String>) -> Self {
        Self::new(500)
            .with_cause("SYSTEM_FAILURE")
            .with_detail(detail)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Status to answer with, 500 when the problem carries none
    pub fn status_or_default(&self) -> u16 {
        self.status.unwrap_or(500)
    }
}
