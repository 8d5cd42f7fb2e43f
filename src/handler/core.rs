use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::lowering::lower;
use crate::injector::{Arguments, TypeKey};

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: Arc<str>,
    ty: TypeKey,
}

impl Param {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[must_use]
    pub fn ty(&self) -> &TypeKey {
        &self.ty
    }
}

/// Why invoking a handler did not produce a value.
pub(crate) enum InvokeError {
    /// The handler returned `Err` (or panicked).
    Handler(anyhow::Error),
    /// The returned value has no JSON data model representation.
    Lowering(serde_json::Error),
}

type HandlerFn = dyn for<'r> Fn(Arguments<'r>) -> Result<Value, InvokeError> + Send + Sync;

/// Named handler with its ordered parameter manifest.
///
/// Immutable once built; cloning shares the underlying function.
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    params: Arc<[Param]>,
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Start a manifest for a handler called `name`.
    #[must_use]
    pub fn builder(name: &str) -> HandlerBuilder {
        HandlerBuilder {
            name: Arc::from(name),
            params: Vec::new(),
        }
    }

    /// Handler that declares no parameters.
    #[must_use]
    pub fn from_fn<F, R>(name: &str, f: F) -> Self
    where
        F: Fn() -> anyhow::Result<R> + Send + Sync + 'static,
        R: Serialize,
    {
        Self::builder(name).build(move |_args| f())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn invoke(&self, args: Arguments<'_>) -> Result<Value, InvokeError> {
        (self.func)(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Handler`] manifest.
#[derive(Debug)]
pub struct HandlerBuilder {
    name: Arc<str>,
    params: Vec<Param>,
}

impl HandlerBuilder {
    /// Declare the next parameter, resolved from the table entry for `T`.
    ///
    /// Declaring a name twice keeps its original position and takes the new
    /// type.
    #[must_use]
    pub fn param<T: Any>(mut self, name: &str) -> Self {
        let ty = TypeKey::of::<T>();
        if let Some(existing) = self.params.iter_mut().find(|p| &*p.name == name) {
            debug!(
                handler = %self.name,
                param = name,
                old_type = existing.ty.name(),
                new_type = ty.name(),
                "Parameter redeclared"
            );
            existing.ty = ty;
        } else {
            self.params.push(Param {
                name: Arc::from(name),
                ty,
            });
        }
        self
    }

    /// Finish the manifest with the function that runs it.
    #[must_use]
    pub fn build<F, R>(self, f: F) -> Handler
    where
        F: for<'r> Fn(Arguments<'r>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Serialize,
    {
        let func: Arc<HandlerFn> = Arc::new(move |args: Arguments<'_>| {
            let out = f(args).map_err(InvokeError::Handler)?;
            lower(&out).map_err(InvokeError::Lowering)
        });
        Handler {
            name: self.name,
            params: Arc::from(self.params),
            func,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;

    #[test]
    fn test_manifest_keeps_declaration_order() {
        let h = Handler::builder("h")
            .param::<String>("a")
            .param::<Request>("r")
            .param::<i64>("b")
            .build(|_args| Ok(()));
        let names: Vec<&str> = h.params().iter().map(Param::name).collect();
        assert_eq!(names, ["a", "r", "b"]);
        assert_eq!(h.params()[1].ty(), &TypeKey::of::<Request>());
    }

    #[test]
    fn test_redeclared_param_takes_new_type_in_place() {
        let h = Handler::builder("h")
            .param::<String>("a")
            .param::<i64>("b")
            .param::<u8>("a")
            .build(|_args| Ok(()));
        assert_eq!(h.params().len(), 2);
        assert_eq!(h.params()[0].name(), "a");
        assert_eq!(h.params()[0].ty(), &TypeKey::of::<u8>());
    }

    #[test]
    fn test_from_fn_has_no_params() {
        let h = Handler::from_fn("root", || Ok(serde_json::json!({"result": "test"})));
        assert!(h.params().is_empty());
        assert_eq!(format!("{h:?}"), r#"Handler { name: "root", params: [], .. }"#);
    }
}
