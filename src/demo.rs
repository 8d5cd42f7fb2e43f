//! Echo service used by the `pyre-router` binary and the integration tests.
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `GET /` | `{"result": "test"}` |
//! | `GET /text` | switches to the text serializer and echoes a request summary |
//! | `POST /body` | decodes [`Body`] from the JSON body and echoes it as `{"body": ...}` |

use std::sync::Arc;

use pyre_router_macros::handler;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::injector::{FromRequest, Injector};
use crate::request::Request;
use crate::router::Router;
use crate::serializer::{JsonSerializer, Serializer, TextSerializer};

/// Payload accepted by `POST /body`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Body {
    pub a: i64,
    pub b: String,
    pub c: Map<String, Value>,
}

impl FromRequest for Body {
    fn from_request(request: &Request) -> anyhow::Result<Self> {
        request.json()
    }
}

#[handler]
pub fn root() -> anyhow::Result<Value> {
    Ok(json!({ "result": "test" }))
}

#[handler]
pub fn text(request: &mut Request) -> anyhow::Result<Value> {
    request.response.set_serializer(TextSerializer);
    let summary = serde_json::to_value(&*request)?;
    Ok(json!({ "result": summary }))
}

#[handler]
pub fn body(body: Body) -> anyhow::Result<Value> {
    Ok(json!({ "body": body }))
}

/// Injector knowing how to build a [`Body`].
#[must_use]
pub fn injector() -> Injector {
    let mut injector = Injector::new();
    injector.register_from_request::<Body>();
    injector
}

/// Echo service with JSON as the default serializer.
#[must_use]
pub fn router() -> Router {
    router_with(Arc::new(JsonSerializer::default()))
}

/// Echo service with a caller-chosen default serializer.
#[must_use]
pub fn router_with(default_serializer: Arc<dyn Serializer>) -> Router {
    let mut router = Router::new(default_serializer, injector());
    router
        .get("/", root())
        .get("/text", text())
        .post("/body", body());
    router
}
