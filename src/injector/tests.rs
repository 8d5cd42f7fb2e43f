use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::Map;

use super::{DependencyResolver, FromRequest, Injector, TypeKey};
use crate::error::DispatchError;
use crate::handler::Handler;
use crate::request::{Inbound, Request};
use crate::serializer::{JsonSerializer, TextSerializer};

#[derive(Debug, Deserialize, PartialEq)]
struct Body {
    a: i64,
    b: String,
    c: Map<String, serde_json::Value>,
}

#[derive(Debug, PartialEq)]
struct Agent(String);

impl FromRequest for Agent {
    fn from_request(request: &Request) -> anyhow::Result<Self> {
        request
            .header("user-agent")
            .map(|v| Agent(v.to_string()))
            .ok_or_else(|| anyhow::anyhow!("missing user-agent"))
    }
}

fn request(inbound: Inbound) -> Request {
    Request::new(inbound, Arc::new(JsonSerializer::default()))
}

fn noop(name: &str) -> crate::handler::HandlerBuilder {
    Handler::builder(name)
}

#[test]
fn test_zero_params_resolve_to_empty_arguments() {
    let injector = Injector::new();
    let handler = Handler::from_fn("root", || Ok(()));
    let mut req = request(Inbound::get("/"));
    let args = injector.resolve(&handler, &mut req).unwrap();
    assert!(args.is_empty());
    assert_eq!(args.len(), 0);
}

#[test]
fn test_request_param_is_the_live_request() {
    let injector = Injector::new();
    let handler = noop("text").param::<Request>("r").build(|_| Ok(()));
    let mut req = request(Inbound::get("/text"));
    let expected: *const Request = &req;

    let mut args = injector.resolve(&handler, &mut req).unwrap();
    let live = args.request("r").unwrap();
    assert!(std::ptr::eq(&*live, expected));

    live.response.set_serializer(TextSerializer);
    drop(args);
    assert_eq!(req.response.content_type(), "text");
}

#[test]
fn test_json_body_resolver() {
    let mut injector = Injector::new();
    injector.register_json::<Body>();
    let handler = noop("c").param::<Body>("body").build(|_| Ok(()));
    let mut req = request(Inbound::post("/body", br#"{"a":1,"b":"x","c":{}}"#.to_vec()));

    let mut args = injector.resolve(&handler, &mut req).unwrap();
    let body: Body = args.take("body").unwrap();
    assert_eq!(
        body,
        Body {
            a: 1,
            b: "x".into(),
            c: Map::new()
        }
    );
    assert!(args.is_empty());
}

#[test]
fn test_missing_type_is_unresolved_dependency() {
    let injector = Injector::new();
    let handler = noop("c").param::<Body>("body").build(|_| Ok(()));
    let mut req = request(Inbound::post("/body", b"{}".to_vec()));

    match injector.resolve(&handler, &mut req) {
        Err(DispatchError::UnresolvedDependency { handler, type_name }) => {
            assert_eq!(handler, "c");
            assert!(type_name.ends_with("Body"));
        }
        other => panic!("expected UnresolvedDependency, got {other:?}"),
    }
}

#[test]
fn test_failing_resolver_is_resolution_error() {
    let mut injector = Injector::new();
    injector.register_json::<Body>();
    let handler = noop("c").param::<Body>("body").build(|_| Ok(()));
    let mut req = request(Inbound::post("/body", b"{not json".to_vec()));

    match injector.resolve(&handler, &mut req) {
        Err(DispatchError::Resolution { handler, param, .. }) => {
            assert_eq!(handler, "c");
            assert_eq!(param, "body");
        }
        other => panic!("expected Resolution, got {other:?}"),
    }
}

#[test]
fn test_resolvers_run_in_declaration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut injector = Injector::new();
    let o = Arc::clone(&order);
    injector.register::<u8, _>(move |_| {
        o.lock().unwrap().push("u8");
        Ok(1)
    });
    let o = Arc::clone(&order);
    injector.register::<u16, _>(move |_| {
        o.lock().unwrap().push("u16");
        Ok(2)
    });
    let handler = noop("h")
        .param::<u16>("second")
        .param::<Request>("r")
        .param::<u8>("first")
        .build(|_| Ok(()));
    let mut req = request(Inbound::get("/"));

    let args = injector.resolve(&handler, &mut req).unwrap();
    let names: Vec<&str> = args.names().collect();
    assert_eq!(names, ["second", "r", "first"]);
    assert_eq!(*order.lock().unwrap(), ["u16", "u8"]);
}

#[test]
fn test_stops_at_first_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut injector = Injector::new();
    injector.register::<u8, _>(|_| Err(anyhow::anyhow!("nope")));
    let c = Arc::clone(&calls);
    injector.register::<u16, _>(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(2)
    });
    let handler = noop("h")
        .param::<u8>("a")
        .param::<u16>("b")
        .build(|_| Ok(()));
    let mut req = request(Inbound::get("/"));

    assert!(injector.resolve(&handler, &mut req).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_resolver_panic_becomes_resolution_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut injector = Injector::new();
    injector.register::<u8, _>(|_| panic!("resolver bug"));
    let c = Arc::clone(&calls);
    injector.register::<u16, _>(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(2)
    });
    let handler = noop("h")
        .param::<u8>("a")
        .param::<u16>("b")
        .build(|_| Ok(()));
    let mut req = request(Inbound::get("/"));

    match injector.resolve(&handler, &mut req) {
        Err(DispatchError::Resolution { param, source, .. }) => {
            assert_eq!(param, "a");
            assert!(source.to_string().contains("resolver bug"));
        }
        other => panic!("expected Resolution, got {:?}", other.map(|a| a.len())),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_last_registration_wins() {
    let mut injector = Injector::new();
    injector.register::<u32, _>(|_| Ok(1));
    injector.register::<u32, _>(|_| Ok(2));
    let handler = noop("h").param::<u32>("n").build(|_| Ok(()));
    let mut req = request(Inbound::get("/"));

    let mut args = injector.resolve(&handler, &mut req).unwrap();
    assert_eq!(args.take::<u32>("n").unwrap(), 2);
}

#[test]
fn test_request_identity_cannot_be_replaced() {
    let mut injector = Injector::new();
    injector.register::<Request, _>(|_| {
        Ok(Request::new(
            Inbound::get("/other"),
            Arc::new(JsonSerializer::default()),
        ))
    });
    let handler = noop("h").param::<Request>("r").build(|_| Ok(()));
    let mut req = request(Inbound::get("/mine"));

    let mut args = injector.resolve(&handler, &mut req).unwrap();
    assert_eq!(args.request("r").unwrap().path(), "/mine");
}

#[test]
fn test_from_request_resolver() {
    let mut injector = Injector::new();
    injector.register_from_request::<Agent>();
    assert!(injector.can_resolve(&TypeKey::of::<Agent>()));
    let handler = noop("h").param::<Agent>("agent").build(|_| Ok(()));

    let mut req = request(Inbound::get("/").with_header("User-Agent", "curl/8"));
    let mut args = injector.resolve(&handler, &mut req).unwrap();
    assert_eq!(args.take::<Agent>("agent").unwrap(), Agent("curl/8".into()));
}

#[test]
fn test_take_errors() {
    let mut injector = Injector::new();
    injector.register::<u32, _>(|_| Ok(7));
    let handler = noop("h")
        .param::<u32>("n")
        .param::<Request>("r")
        .build(|_| Ok(()));
    let mut req = request(Inbound::get("/"));
    let mut args = injector.resolve(&handler, &mut req).unwrap();

    assert!(args.take::<u32>("missing").is_err());
    assert!(args.take::<u32>("r").is_err());
    assert!(args.request("n").is_err());
    assert!(args.take::<String>("n").is_err());
    // a failed downcast consumes the binding
    assert!(!args.contains("n"));
}

#[test]
fn test_registered_types_always_include_request() {
    let injector = Injector::new();
    assert_eq!(injector.len(), 1);
    assert!(!injector.is_empty());
    assert!(injector
        .registered_types()
        .iter()
        .any(|name| name.ends_with("request::Request")));
}
