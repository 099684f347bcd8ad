//! The per-resolution `Container` session.

use crate::error::{InjectError, Result};
use crate::injector::Injector;
use crate::key::{Key, TagValue};
use crate::provider::{Context, Instance, Provider};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A short-lived resolution session created by [`Injector::create_container`].
///
/// A container hands out each key at most once. The key is marked when it is
/// requested, not when its provider completes, so a provider for `A` that asks
/// for `B`, whose provider asks for `A` again, fails with
/// [`InjectError::RepeatedLookup`] instead of recursing forever. The same rule
/// rejects diamond dependencies: two providers both needing `C` within one
/// container is an error. Use a fresh container per top-level request.
pub struct Container {
  injector: Injector,
  visited: RefCell<HashSet<Key>>,
}

impl Container {
  pub(crate) fn new(injector: Injector) -> Self {
    Self {
      injector,
      visited: RefCell::new(HashSet::new()),
    }
  }

  /// The injector this container resolves from.
  pub fn injector(&self) -> &Injector {
    &self.injector
  }

  /// True if `key` has already been looked up through this container.
  pub fn has_visited(&self, key: &Key) -> bool {
    self.visited.borrow().contains(key)
  }

  /// Returns the provider bound to `key` without invoking it.
  pub fn get_provider(&self, key: &Key) -> Result<Provider> {
    if !self.visited.borrow_mut().insert(key.clone()) {
      return Err(InjectError::RepeatedLookup { key: key.clone() });
    }
    tracing::trace!(key = %key, "looking up provider");
    self
      .injector
      .resolve_binding(key)
      .ok_or_else(|| InjectError::UnboundKey { key: key.clone() })
  }

  pub fn get_tagged_provider(&self, key: &Key, tag: impl TagValue) -> Result<Provider> {
    self.get_provider(&key.with_tag(tag))
  }

  /// Resolves `key` and invokes its provider with this container.
  pub fn get_instance(&self, context: &Context, key: &Key) -> Result<Instance> {
    self.get_provider(key)?.provide(context, self)
  }

  pub fn get_tagged_instance(&self, context: &Context, key: &Key, tag: impl TagValue) -> Result<Instance> {
    self.get_instance(context, &key.with_tag(tag))
  }

  /// Resolves `key` and downcasts the instance to `T`.
  pub fn get<T: Any + Send + Sync>(&self, context: &Context, key: &Key) -> Result<Arc<T>> {
    self
      .get_instance(context, key)?
      .downcast::<T>()
      .map_err(|_| InjectError::TypeMismatch {
        key: key.clone(),
        expected: std::any::type_name::<T>(),
      })
  }

  pub fn get_tagged<T: Any + Send + Sync>(
    &self,
    context: &Context,
    key: &Key,
    tag: impl TagValue,
  ) -> Result<Arc<T>> {
    self.get(context, &key.with_tag(tag))
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("injector", &self.injector)
      .field("visited", &self.visited.borrow().len())
      .finish()
  }
}
