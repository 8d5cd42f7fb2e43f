//! # Request / Response Model
//!
//! One [`Request`] is built per dispatch from the transport's [`Inbound`]
//! data and a fresh [`Response`] seeded with the router's default serializer.
//! The request is owned by that dispatch alone and dropped once the handler's
//! value has been encoded into a [`RouteResponse`].
//!
//! The only mutable surface a handler sees is `request.response`: swapping
//! `response.serializer` changes the encoding and content type of that
//! handler's own reply, and `response.status` changes its status code.
//!
//! ```rust
//! use pyre_router::request::{Inbound, Request};
//! use pyre_router::serializer::{JsonSerializer, TextSerializer};
//! use std::sync::Arc;
//!
//! let mut req = Request::new(Inbound::get("/text"), Arc::new(JsonSerializer::default()));
//! assert_eq!(req.response.content_type(), "application/json");
//!
//! req.response.set_serializer(TextSerializer);
//! assert_eq!(req.response.content_type(), "text");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::Serialize;
use serde_json::json;

use crate::error::DispatchError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::serializer::Serializer;

/// Header name carried on every [`RouteResponse`].
pub const CONTENT_TYPE: &str = "content-type";

/// Raw request data handed over by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub method: Method,
    /// Path without the query string; matched exactly.
    pub path: String,
    pub query_params: HashMap<String, String>,
    /// Header names are expected lower-case.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Inbound {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method,
            path: path.into(),
            query_params: HashMap::new(),
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, Vec::new())
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::POST, path, body)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }
}

/// Outbound response in progress.
#[derive(Debug, Clone)]
pub struct Response {
    /// Serializer that will encode the handler's return value.
    pub serializer: Arc<dyn Serializer>,
    /// Status code of the reply (default 200).
    pub status: u16,
}

impl Response {
    #[must_use]
    pub fn new(serializer: Arc<dyn Serializer>) -> Self {
        Self {
            serializer,
            status: 200,
        }
    }

    pub fn set_serializer<S: Serializer + 'static>(&mut self, serializer: S) {
        self.serializer = Arc::new(serializer);
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        self.serializer.content_type()
    }
}

/// Live request for one dispatch.
pub struct Request {
    request_id: RequestId,
    method: Method,
    path: String,
    query_params: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    /// Response in progress; handlers may replace its serializer or status.
    pub response: Response,
}

impl Request {
    /// Build the request for one dispatch.
    ///
    /// The request id is taken from an `x-request-id` header when it holds a
    /// valid ULID, otherwise a new one is generated.
    #[must_use]
    pub fn new(inbound: Inbound, default_serializer: Arc<dyn Serializer>) -> Self {
        let Inbound {
            method,
            path,
            query_params,
            headers,
            body,
        } = inbound;
        let request_id =
            RequestId::from_header_or_new(headers.get(REQUEST_ID_HEADER).map(String::as_str));
        Self {
            request_id,
            method,
            path,
            query_params,
            headers,
            body,
            response: Response::new(default_serializer),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw request body as received from the transport.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Fails when the body is not valid UTF-8.
    pub fn body_str(&self) -> anyhow::Result<&str> {
        Ok(std::str::from_utf8(&self.body)?)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or a shape mismatch with `T`.
    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Header value by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("body_len", &self.body.len())
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

/// Summary form, so a handler can echo the live request in its reply.
impl Serialize for Request {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Request", 6)?;
        state.serialize_field("request_id", &self.request_id)?;
        state.serialize_field("method", self.method.as_str())?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("body", &String::from_utf8_lossy(&self.body))?;
        state.serialize_field("content_type", self.response.content_type())?;
        state.serialize_field("status", &self.response.status)?;
        state.end()
    }
}

/// Finalized, protocol-agnostic result of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResponse {
    pub body: Option<Vec<u8>>,
    pub status: u16,
    pub headers: HashMap<String, String>,
}

impl RouteResponse {
    #[must_use]
    pub fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        let mut headers = HashMap::with_capacity(1);
        headers.insert(CONTENT_TYPE.to_string(), content_type.to_string());
        Self {
            body: Some(body),
            status,
            headers,
        }
    }

    /// Problem body for a failed dispatch: `{"error": ..., "kind": ...}`.
    #[must_use]
    pub fn from_error(err: &DispatchError) -> Self {
        let body = match err {
            DispatchError::RouteNotFound { method, path } => json!({
                "error": "Not Found",
                "kind": err.kind(),
                "method": method.as_str(),
                "path": path,
            }),
            other => json!({
                "error": other.to_string(),
                "kind": other.kind(),
            }),
        };
        Self::new(
            err.status_code(),
            "application/json",
            body.to_string().into_bytes(),
        )
    }

    /// Header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// Body as UTF-8 text, if present and valid.
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|b| std::str::from_utf8(b).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::{JsonSerializer, TextSerializer};
    use serde::Deserialize;

    fn json_default() -> Arc<dyn Serializer> {
        Arc::new(JsonSerializer::default())
    }

    #[test]
    fn test_response_defaults() {
        let req = Request::new(Inbound::get("/"), json_default());
        assert_eq!(req.response.status, 200);
        assert_eq!(req.response.content_type(), "application/json");
    }

    #[test]
    fn test_handler_may_swap_serializer_and_status() {
        let mut req = Request::new(Inbound::get("/"), json_default());
        req.response.set_serializer(TextSerializer);
        req.response.set_status(201);
        assert_eq!(req.response.content_type(), "text");
        assert_eq!(req.response.status, 201);
    }

    #[test]
    fn test_json_body_and_headers() {
        #[derive(Deserialize)]
        struct Payload {
            a: i64,
        }
        let inbound = Inbound::post("/body", br#"{"a": 7}"#.to_vec())
            .with_header("X-Trace", "abc")
            .with_query("debug", "true");
        let req = Request::new(inbound, json_default());
        assert_eq!(req.json::<Payload>().unwrap().a, 7);
        assert_eq!(req.header("x-trace"), Some("abc"));
        assert_eq!(req.header("X-TRACE"), Some("abc"));
        assert_eq!(req.query_param("debug"), Some("true"));
        assert_eq!(req.body_str().unwrap(), r#"{"a": 7}"#);
    }

    #[test]
    fn test_request_id_from_header() {
        let id = RequestId::new();
        let inbound = Inbound::get("/").with_header(REQUEST_ID_HEADER, id.to_string());
        let req = Request::new(inbound, json_default());
        assert_eq!(req.request_id(), id);
    }

    #[test]
    fn test_request_summary_serializes() {
        let req = Request::new(Inbound::post("/text", b"hi".to_vec()), json_default());
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["path"], "/text");
        assert_eq!(value["body"], "hi");
        assert_eq!(value["content_type"], "application/json");
        assert_eq!(value["status"], 200);
    }

    #[test]
    fn test_route_response_from_not_found() {
        let err = DispatchError::RouteNotFound {
            method: Method::GET,
            path: "/missing".to_string(),
        };
        let res = RouteResponse::from_error(&err);
        assert_eq!(res.status, 404);
        assert_eq!(res.content_type(), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(res.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["kind"], "route_not_found");
        assert_eq!(body["path"], "/missing");
    }
}
