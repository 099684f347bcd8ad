//! Providers, the instances they produce, and the context they run in.

use crate::container::Container;
use crate::error::Result;
use crate::key::{Tag, TagValue};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased, shareable instance produced by a [`Provider`].
pub type Instance = Arc<dyn Any + Send + Sync>;

type ProviderFn = dyn Fn(&Context, &Container) -> Result<Instance> + Send + Sync;

/// Factory logic for a binding.
///
/// A provider receives the resolution [`Context`] and the [`Container`] that is
/// resolving it, and may ask that container for further keys.
#[derive(Clone)]
pub struct Provider {
  factory: Arc<ProviderFn>,
}

impl Provider {
  /// Wraps a typed factory. Each call produces a fresh `Arc<T>`.
  pub fn new<T, F>(factory: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Context, &Container) -> Result<T> + Send + Sync + 'static,
  {
    Self::from_fn(move |context, container| {
      factory(context, container).map(|value| Arc::new(value) as Instance)
    })
  }

  /// Wraps a factory that already produces erased instances.
  pub fn from_fn<F>(factory: F) -> Self
  where
    F: Fn(&Context, &Container) -> Result<Instance> + Send + Sync + 'static,
  {
    Self {
      factory: Arc::new(factory),
    }
  }

  /// A provider that always returns the same instance.
  pub fn from_instance<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_shared(Arc::new(value))
  }

  pub fn from_shared(instance: Instance) -> Self {
    Self::from_fn(move |_, _| Ok(instance.clone()))
  }

  /// Invokes the factory.
  pub fn provide(&self, context: &Context, container: &Container) -> Result<Instance> {
    (self.factory)(context, container)
  }
}

impl fmt::Debug for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Provider").finish_non_exhaustive()
  }
}

/// An opaque handle correlating scoped cache entries with a unit of work,
/// such as one inbound request.
///
/// [`Context::none`] is the context used when no unit of work applies.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Context(Option<Tag>);

impl Context {
  pub fn new(handle: impl TagValue) -> Self {
    Context(Some(Tag::new(handle)))
  }

  pub fn none() -> Self {
    Context(None)
  }

  pub fn handle(&self) -> Option<&Tag> {
    self.0.as_ref()
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.0 {
      Some(tag) => write!(f, "Context({:?})", tag),
      None => f.write_str("Context(none)"),
    }
  }
}
