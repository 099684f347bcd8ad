//! Scopes: caching policies that decide how long a provider's result is reused.

use crate::error::{InjectError, Result};
use crate::key::Key;
use crate::provider::{Context, Instance, Provider};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tag under which every root injector registers its [`SingletonScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Singleton;

/// A caching policy keyed by binding key.
pub trait Scope: Send + Sync {
  fn name(&self) -> &str;

  /// Wraps `provider` so that its results are cached by this scope.
  fn scope(&self, key: &Key, provider: Provider) -> Provider;

  /// Starts a fresh cache for `context`.
  fn enter(&self, context: &Context) -> Result<()>;

  /// Discards the cache for `context`.
  fn exit(&self, context: &Context) -> Result<()>;
}

/// A cache slot: the scoped key plus the id of the `Scope::scope` call that
/// produced the provider. Sibling injectors may bind the same key in one scope
/// and must not share a slot.
type Slot = (Key, u64);

type ContextCache = HashMap<Slot, Instance>;

/// A scope holding one cache per entered [`Context`], e.g. one per request.
pub struct SimpleScope {
  name: String,
  next_slot: AtomicU64,
  values: Arc<DashMap<Context, ContextCache>>,
}

impl SimpleScope {
  pub fn new() -> Arc<Self> {
    Self::with_name("SimpleScope")
  }

  pub fn with_name(name: impl Into<String>) -> Arc<Self> {
    Arc::new(Self {
      name: name.into(),
      next_slot: AtomicU64::new(0),
      values: Arc::new(DashMap::new()),
    })
  }

  /// The number of contexts currently entered.
  pub fn active_contexts(&self) -> usize {
    self.values.len()
  }

  pub fn is_entered(&self, context: &Context) -> bool {
    self.values.contains_key(context)
  }
}

impl fmt::Debug for SimpleScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SimpleScope")
      .field("name", &self.name)
      .field("active_contexts", &self.values.len())
      .finish()
  }
}

impl Scope for SimpleScope {
  fn name(&self) -> &str {
    &self.name
  }

  fn scope(&self, key: &Key, provider: Provider) -> Provider {
    let values = self.values.clone();
    let name = self.name.clone();
    let slot: Slot = (key.clone(), self.next_slot.fetch_add(1, Ordering::Relaxed));
    Provider::from_fn(move |context, container| {
      let key = &slot.0;
      // The shard guard must be released before the provider runs, since it
      // may resolve further keys in this same scope.
      let cached = match values.get(context) {
        Some(cache) => cache.get(&slot).cloned(),
        None => {
          return Err(InjectError::OutOfScope {
            scope: name.clone(),
            key: key.clone(),
          })
        }
      };
      if let Some(instance) = cached {
        tracing::trace!(scope = %name, key = %key, "scope cache hit");
        return Ok(instance);
      }

      tracing::trace!(scope = %name, key = %key, "scope cache miss");
      let instance = provider.provide(context, container)?;
      match values.get_mut(context) {
        Some(mut cache) => Ok(cache.entry(slot.clone()).or_insert(instance).clone()),
        // The context was exited while the provider ran.
        None => Ok(instance),
      }
    })
  }

  fn enter(&self, context: &Context) -> Result<()> {
    match self.values.entry(context.clone()) {
      dashmap::mapref::entry::Entry::Occupied(_) => Err(InjectError::AlreadyEntered {
        scope: self.name.clone(),
      }),
      dashmap::mapref::entry::Entry::Vacant(slot) => {
        slot.insert(HashMap::new());
        tracing::debug!(scope = %self.name, context = ?context, "entered scope");
        Ok(())
      }
    }
  }

  fn exit(&self, context: &Context) -> Result<()> {
    match self.values.remove(context) {
      Some(_) => {
        tracing::debug!(scope = %self.name, context = ?context, "exited scope");
        Ok(())
      }
      None => Err(InjectError::NotEntered {
        scope: self.name.clone(),
      }),
    }
  }
}

/// The scope that is always entered: one cached instance per key for the
/// life of the injector tree.
#[derive(Default)]
pub struct SingletonScope {
  next_slot: AtomicU64,
  values: Arc<DashMap<Slot, Arc<OnceCell<Instance>>>>,
}

impl SingletonScope {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }
}

impl fmt::Debug for SingletonScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SingletonScope")
      .field("cached", &self.values.len())
      .finish()
  }
}

impl Scope for SingletonScope {
  fn name(&self) -> &str {
    "Singleton"
  }

  fn scope(&self, key: &Key, provider: Provider) -> Provider {
    let values = self.values.clone();
    let slot: Slot = (key.clone(), self.next_slot.fetch_add(1, Ordering::Relaxed));
    Provider::from_fn(move |context, container| {
      let cell = values.entry(slot.clone()).or_default().value().clone();
      // A failed initialization leaves the cell empty for the next attempt.
      cell
        .get_or_try_init(|| {
          tracing::trace!(key = %slot.0, "initializing singleton");
          provider.provide(context, container)
        })
        .map(Arc::clone)
    })
  }

  fn enter(&self, _context: &Context) -> Result<()> {
    Err(InjectError::SingletonLifecycle)
  }

  fn exit(&self, _context: &Context) -> Result<()> {
    Err(InjectError::SingletonLifecycle)
  }
}

/// An entered scope context; exits the context when dropped.
///
/// ```
/// use fibre_inject::{Context, Injector, Key, Provider, ScopeEntry, SimpleScope};
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// struct RequestScoped;
/// struct Counter;
///
/// let scope = SimpleScope::with_name("request");
/// let injector = Injector::new();
/// injector.bind_scope(scope.clone(), RequestScoped).unwrap();
/// injector
///   .bind_in_scope(Key::of::<Counter>(), Provider::new(|_, _| Ok(7u32)), RequestScoped)
///   .unwrap();
///
/// let entry = ScopeEntry::enter(scope.clone(), Context::new(1u64)).unwrap();
/// let value = injector
///   .create_container()
///   .get::<u32>(entry.context(), &Key::of::<Counter>())
///   .unwrap();
/// assert_eq!(*value, 7);
/// drop(entry);
/// assert_eq!(scope.active_contexts(), 0);
/// ```
#[must_use = "dropping the entry immediately exits the scope"]
pub struct ScopeEntry {
  scope: Arc<dyn Scope>,
  context: Context,
  active: bool,
}

impl ScopeEntry {
  pub fn enter(scope: Arc<dyn Scope>, context: Context) -> Result<Self> {
    scope.enter(&context)?;
    Ok(Self {
      scope,
      context,
      active: true,
    })
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  /// Exits the context now, reporting any failure.
  pub fn exit(mut self) -> Result<()> {
    self.active = false;
    self.scope.exit(&self.context)
  }
}

impl fmt::Debug for ScopeEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ScopeEntry")
      .field("scope", &self.scope.name())
      .field("context", &self.context)
      .field("active", &self.active)
      .finish()
  }
}

impl Drop for ScopeEntry {
  fn drop(&mut self) {
    if self.active {
      if let Err(err) = self.scope.exit(&self.context) {
        tracing::warn!(scope = %self.scope.name(), error = %err, "failed to exit scope");
      }
    }
  }
}
