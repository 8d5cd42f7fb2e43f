use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::Value;

use crate::error::EncodingError;

/// Encoder from a handler's return value to response bytes.
pub trait Serializer: Send + Sync + fmt::Debug {
    /// Short variant name used in [`EncodingError`] messages.
    fn name(&self) -> &str;

    /// Encode `value` into the body bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError`] when the value cannot be represented in this
    /// serializer's format.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodingError>;

    /// Content type of the bytes produced by [`Serializer::encode`].
    fn content_type(&self) -> &str;
}

/// Separators `", "` between items and `": "` after keys.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    #[inline]
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    #[inline]
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    #[inline]
    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Render `value` as single-line JSON with spaced separators.
///
/// # Errors
///
/// Propagates the writer error from `serde_json`.
pub fn to_spaced_json(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

/// Layout of [`JsonSerializer`] output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// `{"a": 1, "b": [1, 2]}`
    #[default]
    Spaced,
    /// `{"a":1,"b":[1,2]}`
    Compact,
    /// Multi-line, two-space indent
    Pretty,
}

/// Structured JSON encoding, content type `application/json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    style: JsonStyle,
}

impl JsonSerializer {
    #[must_use]
    pub fn new(style: JsonStyle) -> Self {
        Self { style }
    }

    #[must_use]
    pub fn compact() -> Self {
        Self::new(JsonStyle::Compact)
    }

    #[must_use]
    pub fn pretty() -> Self {
        Self::new(JsonStyle::Pretty)
    }

    #[must_use]
    pub fn style(&self) -> JsonStyle {
        self.style
    }
}

impl Serializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodingError> {
        let encoded = match self.style {
            JsonStyle::Spaced => to_spaced_json(value),
            JsonStyle::Compact => serde_json::to_vec(value),
            JsonStyle::Pretty => {
                let mut out = Vec::with_capacity(256);
                let mut ser = serde_json::Serializer::with_formatter(
                    &mut out,
                    PrettyFormatter::with_indent(b"  "),
                );
                value.serialize(&mut ser).map(|()| out)
            }
        };
        encoded.map_err(|e| EncodingError::new(self.name(), e))
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

/// Human-readable text, content type `text`.
///
/// A string value is written verbatim; any other value is written in its
/// spaced JSON form, so `{"result": "test"}` reads the same in both
/// serializers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSerializer;

impl Serializer for TextSerializer {
    fn name(&self) -> &str {
        "text"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodingError> {
        match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => to_spaced_json(other).map_err(|e| EncodingError::new(self.name(), e)),
        }
    }

    fn content_type(&self) -> &str {
        "text"
    }
}

/// YAML document, content type `application/yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSerializer;

impl Serializer for YamlSerializer {
    fn name(&self) -> &str {
        "yaml"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodingError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| EncodingError::new(self.name(), e))
    }

    fn content_type(&self) -> &str {
        "application/yaml"
    }
}

/// Named stock serializer, as selected from configuration or the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SerializerKind {
    #[default]
    Json,
    Text,
    Yaml,
}

impl SerializerKind {
    /// Instantiate the serializer behind an `Arc` for sharing across dispatches.
    #[must_use]
    pub fn build(self) -> Arc<dyn Serializer> {
        match self {
            SerializerKind::Json => Arc::new(JsonSerializer::default()),
            SerializerKind::Text => Arc::new(TextSerializer),
            SerializerKind::Yaml => Arc::new(YamlSerializer),
        }
    }
}

impl FromStr for SerializerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SerializerKind::Json),
            "text" => Ok(SerializerKind::Text),
            "yaml" => Ok(SerializerKind::Yaml),
            other => Err(anyhow::anyhow!(
                "unknown serializer '{other}' (expected json, text or yaml)"
            )),
        }
    }
}
