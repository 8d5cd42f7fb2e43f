use std::any::Any;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use smallvec::SmallVec;

use crate::request::Request;

/// Number of bound arguments kept inline before spilling to the heap.
/// Handlers rarely declare more than a handful of parameters.
pub const MAX_INLINE_ARGS: usize = 8;

pub(crate) enum Bound {
    Request,
    Value(Box<dyn Any + Send>),
}

pub(crate) type Bindings = SmallVec<[(Arc<str>, Bound); MAX_INLINE_ARGS]>;

/// Resolved arguments of one handler invocation, by parameter name.
///
/// Owned values are moved out with [`Arguments::take`]; a `Request`-typed
/// parameter hands out the dispatch's live request through
/// [`Arguments::request`].
pub struct Arguments<'r> {
    request: &'r mut Request,
    bindings: Bindings,
}

impl<'r> Arguments<'r> {
    pub(crate) fn new(request: &'r mut Request, bindings: Bindings) -> Self {
        Self { request, bindings }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Names still bound, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_ref())
    }

    /// Move the value bound to `name` out as a `T`.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not bound, is bound to the live request, or holds
    /// a value of another type.
    pub fn take<T: Any>(&mut self, name: &str) -> anyhow::Result<T> {
        let idx = self
            .position(name)
            .ok_or_else(|| anyhow!("no argument named '{name}'"))?;
        if matches!(self.bindings[idx].1, Bound::Request) {
            return Err(anyhow!(
                "argument '{name}' is the live request; use Arguments::request"
            ));
        }
        let (_, bound) = self.bindings.remove(idx);
        match bound {
            Bound::Value(value) => value.downcast::<T>().map(|b| *b).map_err(|_| {
                anyhow!(
                    "argument '{name}' is not a `{}`",
                    std::any::type_name::<T>()
                )
            }),
            Bound::Request => Err(anyhow!("argument '{name}' is the live request")),
        }
    }

    /// The live request, for a parameter declared with the `Request` type.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not a `Request`-typed parameter.
    pub fn request(&mut self, name: &str) -> anyhow::Result<&mut Request> {
        match self.position(name).map(|idx| &self.bindings[idx].1) {
            Some(Bound::Request) => Ok(&mut *self.request),
            Some(Bound::Value(_)) => Err(anyhow!("argument '{name}' is not the request")),
            None => Err(anyhow!("no argument named '{name}'")),
        }
    }

    /// Like [`Arguments::request`], keeping the full dispatch lifetime.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not a `Request`-typed parameter.
    pub fn into_request(self, name: &str) -> anyhow::Result<&'r mut Request> {
        match self.position(name).map(|idx| &self.bindings[idx].1) {
            Some(Bound::Request) => Ok(self.request),
            Some(Bound::Value(_)) => Err(anyhow!("argument '{name}' is not the request")),
            None => Err(anyhow!("no argument named '{name}'")),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.bindings.iter().position(|(n, _)| n.as_ref() == name)
    }
}

impl fmt::Debug for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
