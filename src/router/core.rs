//! Router core module - hot path for request dispatch.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use http::Method;
use tracing::{debug, error, info, info_span, warn};

use crate::error::{panic_message, DispatchError, EncodingError, MissingDependency, ValidationError};
use crate::handler::{Handler, InvokeError};
use crate::injector::{DependencyResolver, Injector};
use crate::request::{Inbound, Request, RouteResponse};
use crate::serializer::{JsonSerializer, Serializer};

/// Exact-match route table plus the dispatch pipeline.
#[derive(Clone)]
pub struct Router {
    /// Method first so lookups borrow the request path without allocating.
    routes: HashMap<Method, HashMap<String, Handler>>,
    default_serializer: Arc<dyn Serializer>,
    injector: Arc<dyn DependencyResolver>,
}

impl Router {
    /// Create an empty router.
    ///
    /// # Arguments
    ///
    /// * `default_serializer` - Serializer every response starts with
    /// * `injector` - Resolution table for handler parameters
    #[must_use]
    pub fn new<R>(default_serializer: Arc<dyn Serializer>, injector: R) -> Self
    where
        R: DependencyResolver + 'static,
    {
        Self {
            routes: HashMap::new(),
            default_serializer,
            injector: Arc::new(injector),
        }
    }

    /// JSON by default and an injector that only knows the request type.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(JsonSerializer::default()), Injector::new())
    }

    /// Store `handler` under `(method, path)`.
    ///
    /// A handler already registered under the same key is replaced.
    pub fn register(&mut self, method: Method, path: &str, handler: Handler) -> &mut Self {
        let handler_name = handler.name().to_string();
        let params = handler.params().len();
        let table = self.routes.entry(method.clone()).or_default();

        if let Some(old) = table.insert(path.to_string(), handler) {
            warn!(
                method = %method,
                path = %path,
                old_handler = old.name(),
                new_handler = %handler_name,
                "Replaced existing route"
            );
        } else {
            info!(
                method = %method,
                path = %path,
                handler_name = %handler_name,
                param_count = params,
                total_routes = self.len(),
                "Route registered"
            );
        }
        self
    }

    pub fn get(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.register(Method::GET, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.register(Method::POST, path, handler)
    }

    pub fn put(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.register(Method::PUT, path, handler)
    }

    pub fn patch(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.register(Method::PATCH, path, handler)
    }

    pub fn delete(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.register(Method::DELETE, path, handler)
    }

    /// Handler registered under exactly `(method, path)`.
    #[inline]
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&Handler> {
        self.routes.get(method).and_then(|table| table.get(path))
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every registered route, sorted by path then method.
    #[must_use]
    pub fn routes(&self) -> Vec<(&Method, &str, &Handler)> {
        let mut all: Vec<(&Method, &str, &Handler)> = self
            .routes
            .iter()
            .flat_map(|(method, table)| {
                table
                    .iter()
                    .map(move |(path, handler)| (method, path.as_str(), handler))
            })
            .collect();
        all.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        all
    }

    #[must_use]
    pub fn default_serializer(&self) -> &Arc<dyn Serializer> {
        &self.default_serializer
    }

    /// Startup check that every declared parameter type is resolvable.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] listing every parameter without a resolver.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        for (method, path, handler) in self.routes() {
            for param in handler.params() {
                if !self.injector.can_resolve(param.ty()) {
                    missing.push(MissingDependency {
                        method: method.clone(),
                        path: path.to_string(),
                        handler: handler.name().to_string(),
                        param: param.name().to_string(),
                        type_name: param.ty().name().to_string(),
                    });
                }
            }
        }

        if missing.is_empty() {
            info!(total_routes = self.len(), "Route table validated");
            Ok(())
        } else {
            for m in &missing {
                error!(
                    method = %m.method,
                    path = %m.path,
                    handler = %m.handler,
                    param = %m.param,
                    type_name = %m.type_name,
                    "Handler parameter has no resolver"
                );
            }
            Err(ValidationError { missing })
        }
    }

    /// Run one request through the pipeline.
    ///
    /// # Errors
    ///
    /// Any [`DispatchError`]; the route table is never affected.
    pub fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: impl Into<Vec<u8>>,
    ) -> Result<RouteResponse, DispatchError> {
        self.dispatch_inbound(Inbound::new(method, path, body))
    }

    /// [`Router::dispatch`] with query parameters and headers.
    ///
    /// # Errors
    ///
    /// Any [`DispatchError`]; the route table is never affected.
    pub fn dispatch_inbound(&self, inbound: Inbound) -> Result<RouteResponse, DispatchError> {
        let Some(handler) = self.lookup(&inbound.method, &inbound.path) else {
            debug!(method = %inbound.method, path = %inbound.path, "No route matched");
            return Err(DispatchError::RouteNotFound {
                method: inbound.method,
                path: inbound.path,
            });
        };

        let start = Instant::now();
        let mut request = Request::new(inbound, Arc::clone(&self.default_serializer));
        let span = info_span!(
            "dispatch",
            request_id = %request.request_id(),
            method = %request.method(),
            path = %request.path(),
            handler = handler.name()
        );
        let _entered = span.enter();

        // A custom resolver table may panic outside any single resolver.
        let live = &mut request;
        let args = match catch_unwind(AssertUnwindSafe(move || {
            let live = live;
            self.injector.resolve(handler, live)
        })) {
            Ok(resolved) => resolved?,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(panic = %message, "Dependency resolution panicked");
                return Err(DispatchError::Resolution {
                    handler: handler.name().to_string(),
                    param: "*".to_string(),
                    type_name: "*".to_string(),
                    source: anyhow!("resolver panicked: {message}"),
                });
            }
        };
        debug!(arg_count = args.len(), "Arguments resolved");

        let value = match catch_unwind(AssertUnwindSafe(|| handler.invoke(args))) {
            Ok(Ok(value)) => value,
            Ok(Err(InvokeError::Handler(source))) => {
                return Err(DispatchError::Handler {
                    handler: handler.name().to_string(),
                    source,
                });
            }
            Ok(Err(InvokeError::Lowering(e))) => {
                return Err(EncodingError::new(request.response.serializer.name(), e).into());
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(panic = %message, "Handler panicked");
                return Err(DispatchError::Handler {
                    handler: handler.name().to_string(),
                    source: anyhow!("handler panicked: {message}"),
                });
            }
        };

        // Read after the handler ran: it may have swapped the serializer.
        let serializer = Arc::clone(&request.response.serializer);
        let body = match catch_unwind(AssertUnwindSafe(|| serializer.encode(&value))) {
            Ok(encoded) => encoded?,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(panic = %message, serializer = serializer.name(), "Serializer panicked");
                return Err(EncodingError::new(
                    serializer.name(),
                    format_args!("serializer panicked: {message}"),
                )
                .into());
            }
        };
        let status = request.response.status;

        debug!(
            status = status,
            content_type = serializer.content_type(),
            body_size_bytes = body.len(),
            latency_us = start.elapsed().as_micros() as u64,
            "Dispatch complete"
        );

        Ok(RouteResponse::new(status, serializer.content_type(), body))
    }

    /// Like [`Router::dispatch`], turning failures into error responses.
    #[must_use]
    pub fn handle(&self, method: Method, path: &str, body: impl Into<Vec<u8>>) -> RouteResponse {
        self.handle_inbound(Inbound::new(method, path, body))
    }

    /// Like [`Router::dispatch_inbound`], turning failures into error responses.
    #[must_use]
    pub fn handle_inbound(&self, inbound: Inbound) -> RouteResponse {
        self.dispatch_inbound(inbound).unwrap_or_else(|err| {
            warn!(
                kind = err.kind(),
                status = err.status_code(),
                error = %err,
                "Dispatch failed"
            );
            RouteResponse::from_error(&err)
        })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<String> = self
            .routes()
            .into_iter()
            .map(|(m, p, h)| format!("{m} {p} -> {}", h.name()))
            .collect();
        f.debug_struct("Router")
            .field("routes", &routes)
            .field("default_serializer", &self.default_serializer.name())
            .finish_non_exhaustive()
    }
}
