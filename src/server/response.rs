use std::sync::OnceLock;

use dashmap::DashMap;
use may_minihttp::Response;
use tracing::warn;

use crate::request::RouteResponse;

/// Reason phrase for the status line.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

static HEADER_LINES: OnceLock<DashMap<String, &'static str>> = OnceLock::new();

/// `"{name}: {value}"` as a `'static` line, leaked once per distinct line.
///
/// The writer only accepts `'static` header lines; header values here come
/// from serializer content types, so the set stays small.
#[must_use]
pub fn header_line(name: &str, value: &str) -> &'static str {
    let line = format!("{name}: {value}");
    let lines = HEADER_LINES.get_or_init(DashMap::new);
    if let Some(existing) = lines.get(&line) {
        return *existing;
    }
    *lines
        .entry(line.clone())
        .or_insert_with(|| Box::leak(line.into_boxed_str()))
}

/// Write status, headers and body of `route` into `res`.
pub fn write_route_response(res: &mut Response, route: &RouteResponse) {
    res.status_code(usize::from(route.status), status_reason(route.status));
    for (name, value) in &route.headers {
        if name.contains(['\r', '\n']) || value.contains(['\r', '\n']) {
            warn!(header = %name, "Dropping header with line break");
            continue;
        }
        res.header(header_line(name, value));
    }
    res.body_vec(route.body.clone().unwrap_or_default());
}
