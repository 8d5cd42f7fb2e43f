//! Error taxonomy for a single dispatch.
//!
//! Every failure here is scoped to one dispatch call: none of them touch the
//! route table or the resolution table, and none of them cross the dispatch
//! boundary as a panic. The transport adapter maps them to status codes with
//! [`DispatchError::status_code`].

use std::any::Any;
use std::fmt;

use http::Method;
use thiserror::Error;

/// A serializer could not turn a handler's return value into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{serializer} serializer cannot encode value: {reason}")]
pub struct EncodingError {
    /// Name of the serializer variant that failed (e.g. `json`)
    pub serializer: String,
    /// Description of the offending value
    pub reason: String,
}

impl EncodingError {
    #[must_use]
    pub fn new(serializer: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            serializer: serializer.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of a single dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the exact `(method, path)` pair.
    #[error("no route registered for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// The handler declares a parameter type that has no resolver.
    ///
    /// This is a setup defect; [`crate::router::Router::validate`] reports it
    /// before the first request is served.
    #[error("handler '{handler}' declares parameter type `{type_name}` with no registered resolver")]
    UnresolvedDependency { handler: String, type_name: String },

    /// A registered resolver failed (e.g. malformed JSON body).
    #[error("failed to resolve parameter '{param}' (`{type_name}`) for handler '{handler}': {source:#}")]
    Resolution {
        handler: String,
        param: String,
        type_name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The selected serializer could not encode the handler's return value.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The handler itself failed or panicked.
    #[error("handler '{handler}' failed: {source:#}")]
    Handler {
        handler: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// HTTP status the transport boundary should report for this failure.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::RouteNotFound { .. } => 404,
            DispatchError::UnresolvedDependency { .. } | DispatchError::Resolution { .. } => 400,
            DispatchError::Encoding(_) | DispatchError::Handler { .. } => 500,
        }
    }

    /// Stable snake-case label, used in problem bodies and log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::RouteNotFound { .. } => "route_not_found",
            DispatchError::UnresolvedDependency { .. } => "unresolved_dependency",
            DispatchError::Resolution { .. } => "resolution",
            DispatchError::Encoding(_) => "encoding",
            DispatchError::Handler { .. } => "handler",
        }
    }
}

/// One handler parameter whose type has no resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{method} {path} -> {handler}({param}: {type_name})")]
pub struct MissingDependency {
    pub method: Method,
    pub path: String,
    pub handler: String,
    pub param: String,
    pub type_name: String,
}

/// Result of the startup validation pass over every registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{} handler parameter(s) have no registered resolver{}",
    .missing.len(),
    indented_list(.missing)
)]
pub struct ValidationError {
    pub missing: Vec<MissingDependency>,
}

fn indented_list(missing: &[MissingDependency]) -> String {
    missing.iter().map(|m| format!("\n  {m}")).collect()
}

/// Text carried by a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let not_found = DispatchError::RouteNotFound {
            method: Method::GET,
            path: "/missing".to_string(),
        };
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(not_found.kind(), "route_not_found");

        let unresolved = DispatchError::UnresolvedDependency {
            handler: "h".into(),
            type_name: "Body".into(),
        };
        assert_eq!(unresolved.status_code(), 400);

        let resolution = DispatchError::Resolution {
            handler: "h".into(),
            param: "body".into(),
            type_name: "Body".into(),
            source: anyhow::anyhow!("bad json"),
        };
        assert_eq!(resolution.status_code(), 400);

        let encoding = DispatchError::from(EncodingError::new("json", "non-string key"));
        assert_eq!(encoding.status_code(), 500);
        assert_eq!(encoding.kind(), "encoding");

        let handler = DispatchError::Handler {
            handler: "h".into(),
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(handler.status_code(), 500);
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = EncodingError::new("json", "key must be a string");
        assert_eq!(
            err.to_string(),
            "json serializer cannot encode value: key must be a string"
        );

        let err = DispatchError::UnresolvedDependency {
            handler: "echo_body".into(),
            type_name: "demo::Body".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("echo_body"));
        assert!(msg.contains("demo::Body"));
    }

    #[test]
    fn test_validation_error_lists_every_missing_type() {
        let err = ValidationError {
            missing: vec![
                MissingDependency {
                    method: Method::POST,
                    path: "/body".into(),
                    handler: "c".into(),
                    param: "body".into(),
                    type_name: "Body".into(),
                },
                MissingDependency {
                    method: Method::GET,
                    path: "/user".into(),
                    handler: "u".into(),
                    param: "user".into(),
                    type_name: "User".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 handler parameter(s)"));
        assert!(msg.contains("POST /body -> c(body: Body)"));
        assert!(msg.contains("GET /user -> u(user: User)"));
    }

    #[test]
    fn test_panic_message_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_validation_error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<ValidationError>();
        assert_error::<MissingDependency>();
    }
}
