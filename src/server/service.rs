use std::io;
use std::sync::Arc;
use std::time::Instant;

use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use tracing::{info, warn};

use super::request::{parse_request, Rejection};
use super::response::write_route_response;
use crate::request::RouteResponse;
use crate::router::Router;
use crate::runtime_config::DEFAULT_MAX_BODY_BYTES;

/// `may_minihttp` service that feeds every request to a shared [`Router`].
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub max_body_bytes: usize,
}

impl AppService {
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

fn rejection_response(rejection: &Rejection) -> RouteResponse {
    let body = json!({
        "error": rejection.to_string(),
        "kind": rejection.kind(),
    });
    RouteResponse::new(
        rejection.status_code(),
        "application/json",
        body.to_string().into_bytes(),
    )
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let start = Instant::now();
        let target = req.path().to_string();

        let route = match parse_request(req, self.max_body_bytes) {
            Ok(inbound) => self.router.handle_inbound(inbound),
            Err(rejection) => {
                warn!(
                    target_path = %target,
                    kind = rejection.kind(),
                    error = %rejection,
                    "Request rejected before dispatch"
                );
                rejection_response(&rejection)
            }
        };

        write_route_response(res, &route);

        info!(
            target_path = %target,
            status = route.status,
            body_size_bytes = route.body.as_ref().map_or(0, Vec::len),
            latency_us = start.elapsed().as_micros() as u64,
            "HTTP response sent"
        );
        Ok(())
    }
}
