use std::collections::HashMap;
use std::io::{self, Read};

use http::Method;
use may_minihttp::Request;
use thiserror::Error;
use tracing::debug;

use crate::request::Inbound;

/// Why an HTTP request never reached the router.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("unsupported HTTP method '{0}'")]
    BadMethod(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Body(#[from] io::Error),
}

impl Rejection {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Rejection::BadMethod(_) | Rejection::Body(_) => 400,
            Rejection::PayloadTooLarge { .. } => 413,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::BadMethod(_) => "bad_method",
            Rejection::PayloadTooLarge { .. } => "payload_too_large",
            Rejection::Body(_) => "bad_body",
        }
    }
}

/// Split a request target into path and query string.
#[must_use]
pub fn split_path(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    }
}

/// Decode an `application/x-www-form-urlencoded` query string.
///
/// A repeated key keeps its last value.
#[must_use]
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Turn a raw `may_minihttp` request into router input.
pub(crate) fn parse_request(req: Request, max_body_bytes: usize) -> Result<Inbound, Rejection> {
    let method = Method::from_bytes(req.method().as_bytes())
        .map_err(|_| Rejection::BadMethod(req.method().to_string()))?;

    let (path, query) = split_path(req.path());
    let path = if path.is_empty() { "/" } else { path }.to_string();
    let query_params = query.map(parse_query_params).unwrap_or_default();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();

    let declared = headers
        .get("content-length")
        .and_then(|v| v.trim().parse::<usize>().ok());
    if declared.is_some_and(|len| len > max_body_bytes) {
        return Err(Rejection::PayloadTooLarge {
            limit: max_body_bytes,
        });
    }

    // Read one byte past the limit to detect oversize bodies without a length.
    let mut body = Vec::new();
    let limit = u64::try_from(max_body_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    req.body().take(limit).read_to_end(&mut body)?;
    if body.len() > max_body_bytes {
        return Err(Rejection::PayloadTooLarge {
            limit: max_body_bytes,
        });
    }

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        query_param_count = query_params.len(),
        body_size_bytes = body.len(),
        "HTTP request parsed"
    );

    Ok(Inbound {
        method,
        path,
        query_params,
        headers,
        body,
    })
}
