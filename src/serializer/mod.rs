//! # Serializer Module
//!
//! Pluggable output encoders. A [`Serializer`] turns the value a handler
//! returned into bytes and names the content type of those bytes.
//!
//! ## Overview
//!
//! Handlers return any `serde::Serialize` value. After the handler returns, the
//! router lowers that value into the serde data model ([`serde_json::Value`])
//! and hands it to the serializer currently selected on the request's
//! [`Response`](crate::request::Response). Which serializer that is depends on
//! the router's default and on whether the handler swapped it during its run.
//!
//! ## Stock Variants
//!
//! | Variant | Content type | Rendering |
//! |---|---|---|
//! | [`JsonSerializer`] | `application/json` | `{"result": "test"}` (spaced by default) |
//! | [`TextSerializer`] | `text` | strings as-is, everything else as spaced JSON |
//! | [`YamlSerializer`] | `application/yaml` | `serde_yaml` document |
//!
//! ## Writing a Serializer
//!
//! ```rust
//! use pyre_router::error::EncodingError;
//! use pyre_router::serializer::Serializer;
//! use serde_json::Value;
//!
//! #[derive(Debug)]
//! struct Csv;
//!
//! impl Serializer for Csv {
//!     fn name(&self) -> &str {
//!         "csv"
//!     }
//!
//!     fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodingError> {
//!         let row = value
//!             .as_array()
//!             .ok_or_else(|| EncodingError::new(self.name(), "expected an array"))?;
//!         let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
//!         Ok(cells.join(",").into_bytes())
//!     }
//!
//!     fn content_type(&self) -> &str {
//!         "text/csv"
//!     }
//! }
//! ```
//!
//! Serializers hold no per-request state and are shared across concurrent
//! dispatches behind an `Arc`.

mod core;

pub use self::core::{
    to_spaced_json, JsonSerializer, JsonStyle, Serializer, SerializerKind, TextSerializer,
    YamlSerializer,
};
