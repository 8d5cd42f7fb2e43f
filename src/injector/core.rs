use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use tracing::{debug, error, info, warn};

use super::arguments::{Arguments, Bound};
use crate::error::{panic_message, DispatchError};
use crate::handler::Handler;
use crate::request::Request;

/// Identifier of a declared parameter type.
///
/// Equality and hashing use the `TypeId` only; the name is kept for messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

/// Produces the arguments for a handler from a live request.
pub trait DependencyResolver: Send + Sync {
    /// Resolve every declared parameter of `handler`, in declaration order.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnresolvedDependency`] for the first declared type with
    /// no entry, [`DispatchError::Resolution`] for the first resolver that fails.
    fn resolve<'r>(
        &self,
        handler: &Handler,
        request: &'r mut Request,
    ) -> Result<Arguments<'r>, DispatchError>;

    /// Whether a parameter of type `ty` can be resolved at all.
    fn can_resolve(&self, ty: &TypeKey) -> bool;
}

/// Types that know how to build themselves from a request.
pub trait FromRequest: Sized + Send + 'static {
    /// # Errors
    ///
    /// Any failure is reported as a resolution error for the parameter.
    fn from_request(request: &Request) -> anyhow::Result<Self>;
}

type ResolverFn = dyn Fn(&Request) -> anyhow::Result<Box<dyn Any + Send>> + Send + Sync;

#[derive(Clone)]
enum Entry {
    /// Bind the live request itself.
    Identity,
    Resolver(Arc<ResolverFn>),
}

/// Resolution table keyed by parameter type.
#[derive(Clone)]
pub struct Injector {
    entries: HashMap<TypeKey, Entry>,
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector {
    /// Table containing only the identity entry for [`Request`].
    #[must_use]
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(TypeKey::of::<Request>(), Entry::Identity);
        Self { entries }
    }

    /// Register the resolver for parameters of type `T`; last write wins.
    ///
    /// The entry for [`Request`] is fixed to the live request and a resolver
    /// registered for it is ignored.
    pub fn register<T, F>(&mut self, resolver: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn(&Request) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        if matches!(self.entries.get(&key), Some(Entry::Identity)) {
            warn!(
                type_name = key.name(),
                "Ignoring resolver for the request type; it always resolves to the live request"
            );
            return self;
        }

        let erased: Arc<ResolverFn> = Arc::new(move |req: &Request| {
            resolver(req).map(|v| Box::new(v) as Box<dyn Any + Send>)
        });
        if self.entries.insert(key, Entry::Resolver(erased)).is_some() {
            warn!(type_name = key.name(), "Replaced existing resolver");
        } else {
            info!(
                type_name = key.name(),
                total_resolvers = self.entries.len(),
                "Resolver registered"
            );
        }
        self
    }

    /// Register `T::from_request` as the resolver for `T`.
    pub fn register_from_request<T: FromRequest>(&mut self) -> &mut Self {
        self.register::<T, _>(T::from_request)
    }

    /// Register "deserialize the body as JSON" as the resolver for `T`.
    pub fn register_json<T>(&mut self) -> &mut Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.register::<T, _>(Request::json::<T>)
    }

    /// Names of every type with an entry, sorted.
    #[must_use]
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.keys().map(TypeKey::name).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the identity entry is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("types", &self.registered_types())
            .finish()
    }
}

impl DependencyResolver for Injector {
    fn resolve<'r>(
        &self,
        handler: &Handler,
        request: &'r mut Request,
    ) -> Result<Arguments<'r>, DispatchError> {
        let mut bindings = SmallVec::with_capacity(handler.params().len());

        for param in handler.params() {
            let ty = param.ty();
            let entry =
                self.entries
                    .get(ty)
                    .ok_or_else(|| DispatchError::UnresolvedDependency {
                        handler: handler.name().to_string(),
                        type_name: ty.name().to_string(),
                    })?;

            let bound = match entry {
                Entry::Identity => Bound::Request,
                Entry::Resolver(resolve) => {
                    let live: &Request = request;
                    let outcome = catch_unwind(AssertUnwindSafe(|| resolve(live)))
                        .unwrap_or_else(|panic| {
                            let message = panic_message(panic.as_ref());
                            error!(
                                handler = handler.name(),
                                param = param.name(),
                                type_name = ty.name(),
                                panic = %message,
                                "Resolver panicked"
                            );
                            Err(anyhow!("resolver panicked: {message}"))
                        });
                    let value = outcome.map_err(|source| DispatchError::Resolution {
                        handler: handler.name().to_string(),
                        param: param.name().to_string(),
                        type_name: ty.name().to_string(),
                        source,
                    })?;
                    Bound::Value(value)
                }
            };

            debug!(
                handler = handler.name(),
                param = param.name(),
                type_name = ty.name(),
                "Parameter resolved"
            );
            bindings.push((Arc::clone(param.name_arc()), bound));
        }

        Ok(Arguments::new(request, bindings))
    }

    fn can_resolve(&self, ty: &TypeKey) -> bool {
        self.entries.contains_key(ty)
    }
}
