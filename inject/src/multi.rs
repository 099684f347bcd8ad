//! Multi-bindings: one map-shaped binding populated by many contributors.
//!
//! Each `(injector, key)` pair owns one live [`ProviderMap`]. Independent
//! configuration code adds entries to it with [`bind_map`] and friends, without
//! coordinating with each other. Two bindings are installed on the injector:
//!
//! - `key` resolves to the live [`ProviderMap`];
//! - `key` tagged with [`Values`] resolves to a [`MapValues`], invoking every
//!   entry's provider once per resolution.
//!
//! ```
//! use fibre_inject::multi::{self, MapValues, Values};
//! use fibre_inject::{Context, Injector, Key, Provider};
//!
//! struct Plugins;
//!
//! let injector = Injector::new();
//! multi::bind_map_instance(&injector, Key::of::<Plugins>(), "a", 1u32).unwrap();
//! multi::bind_map(&injector, Key::of::<Plugins>(), "b", Provider::new(|_, _| Ok(2u32))).unwrap();
//!
//! let values = injector
//!   .create_container()
//!   .get_tagged::<MapValues>(&Context::none(), &Key::of::<Plugins>(), Values)
//!   .unwrap();
//! assert_eq!(*values.get::<u32>("a").unwrap(), 1);
//! assert_eq!(*values.get::<u32>("b").unwrap(), 2);
//! ```

use crate::builder::MapPolicy;
use crate::error::{InjectError, Result};
use crate::injector::Injector;
use crate::key::{Key, Tag, TagValue};
use crate::provider::{Instance, Provider};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Tag marking the resolved-values view of a multi-binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Values;

/// The live mapping from entry key to provider behind a multi-binding.
pub struct ProviderMap {
  key: Key,
  policy: MapPolicy,
  entries: DashMap<Tag, Provider>,
}

impl ProviderMap {
  fn new(key: Key, policy: MapPolicy) -> Self {
    Self {
      key,
      policy,
      entries: DashMap::new(),
    }
  }

  /// The outer key this map is bound under.
  pub fn key(&self) -> &Key {
    &self.key
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn contains(&self, entry: impl TagValue) -> bool {
    self.entries.contains_key(&Tag::new(entry))
  }

  pub fn get(&self, entry: impl TagValue) -> Option<Provider> {
    self
      .entries
      .get(&Tag::new(entry))
      .map(|provider| provider.value().clone())
  }

  /// A copy of the current entries.
  pub fn snapshot(&self) -> HashMap<Tag, Provider> {
    self
      .entries
      .iter()
      .map(|entry| (entry.key().clone(), entry.value().clone()))
      .collect()
  }

  fn insert(&self, entry: Tag, provider: Provider) -> Result<()> {
    match (self.entries.entry(entry.clone()), self.policy) {
      (Entry::Occupied(_), MapPolicy::RejectDuplicates) => Err(InjectError::DuplicateMapEntry {
        key: self.key.clone(),
        entry,
      }),
      (Entry::Occupied(mut slot), MapPolicy::LastWriterWins) => {
        tracing::debug!(key = %self.key, entry = %entry, "replaced multi-binding entry");
        slot.insert(provider);
        Ok(())
      }
      (Entry::Vacant(slot), _) => {
        tracing::debug!(key = %self.key, entry = %entry, "added multi-binding entry");
        slot.insert(provider);
        Ok(())
      }
    }
  }
}

impl fmt::Debug for ProviderMap {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ProviderMap")
      .field("key", &self.key)
      .field("policy", &self.policy)
      .field("entries", &self.entries.len())
      .finish()
  }
}

/// The resolved values of a multi-binding, keyed by entry key.
#[derive(Clone, Default)]
pub struct MapValues(HashMap<Tag, Instance>);

impl MapValues {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// The value for `entry`, downcast to `T`.
  pub fn get<T: Any + Send + Sync>(&self, entry: impl TagValue) -> Option<Arc<T>> {
    self
      .get_instance(&Tag::new(entry))
      .and_then(|instance| instance.clone().downcast::<T>().ok())
  }

  pub fn get_instance(&self, entry: &Tag) -> Option<&Instance> {
    self.0.get(entry)
  }

  pub fn keys(&self) -> impl Iterator<Item = &Tag> {
    self.0.keys()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Tag, &Instance)> {
    self.0.iter()
  }

  pub fn into_inner(self) -> HashMap<Tag, Instance> {
    self.0
  }
}

impl fmt::Debug for MapValues {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.0.keys()).finish()
  }
}

fn values_provider(map: Arc<ProviderMap>) -> Provider {
  Provider::new(move |context, container| {
    let mut values = HashMap::with_capacity(map.len());
    for (entry, provider) in map.snapshot() {
      let instance = provider.provide(context, container)?;
      values.insert(entry, instance);
    }
    Ok(MapValues(values))
  })
}

fn create_or_get_map(injector: &Injector, key: &Key) -> Result<Arc<ProviderMap>> {
  match injector.maps().entry(key.clone()) {
    Entry::Occupied(existing) => Ok(existing.get().clone()),
    Entry::Vacant(slot) => {
      let values_key = key.with_tag(Values);
      // A conflict on either key must leave both unbound.
      injector.check_bindable(key)?;
      injector.check_bindable(&values_key)?;
      let map = Arc::new(ProviderMap::new(key.clone(), injector.tree().map_policy));
      injector.bind_shared(key.clone(), map.clone() as Instance)?;
      injector.bind(values_key, values_provider(map.clone()))?;
      slot.insert(map.clone());
      Ok(map)
    }
  }
}

/// Installs the provider map and values bindings for `key` if they are missing.
pub fn ensure_map_bound(injector: &Injector, key: Key) -> Result<()> {
  create_or_get_map(injector, &key).map(|_| ())
}

/// Adds `provider` under `entry` to the map bound at `key`.
pub fn bind_map(injector: &Injector, key: Key, entry: impl TagValue, provider: Provider) -> Result<()> {
  create_or_get_map(injector, &key)?.insert(Tag::new(entry), provider)
}

pub fn bind_map_instance<T: Any + Send + Sync>(
  injector: &Injector,
  key: Key,
  entry: impl TagValue,
  instance: T,
) -> Result<()> {
  bind_map(injector, key, entry, Provider::from_instance(instance))
}

/// Adds `provider` under `entry`, cached in the scope registered under `scope_tag`.
///
/// Each entry gets its own cache slot: the outer key tagged with the entry key.
pub fn bind_map_in_scope(
  injector: &Injector,
  key: Key,
  entry: impl TagValue,
  provider: Provider,
  scope_tag: impl TagValue,
) -> Result<()> {
  let entry = Tag::new(entry);
  let scoped = injector.scope(&key.with_tag(entry.clone()), provider, scope_tag)?;
  bind_map(injector, key, entry, scoped)
}

pub fn bind_map_instance_in_scope<T: Any + Send + Sync>(
  injector: &Injector,
  key: Key,
  entry: impl TagValue,
  instance: T,
  scope_tag: impl TagValue,
) -> Result<()> {
  bind_map_in_scope(injector, key, entry, Provider::from_instance(instance), scope_tag)
}

pub fn bind_map_tagged(
  injector: &Injector,
  key: Key,
  tag: impl TagValue,
  entry: impl TagValue,
  provider: Provider,
) -> Result<()> {
  bind_map(injector, key.with_tag(tag), entry, provider)
}

pub fn bind_map_tagged_instance<T: Any + Send + Sync>(
  injector: &Injector,
  key: Key,
  tag: impl TagValue,
  entry: impl TagValue,
  instance: T,
) -> Result<()> {
  bind_map_instance(injector, key.with_tag(tag), entry, instance)
}

pub fn bind_map_tagged_in_scope(
  injector: &Injector,
  key: Key,
  tag: impl TagValue,
  entry: impl TagValue,
  provider: Provider,
  scope_tag: impl TagValue,
) -> Result<()> {
  bind_map_in_scope(injector, key.with_tag(tag), entry, provider, scope_tag)
}

pub fn bind_map_tagged_instance_in_scope<T: Any + Send + Sync>(
  injector: &Injector,
  key: Key,
  tag: impl TagValue,
  entry: impl TagValue,
  instance: T,
  scope_tag: impl TagValue,
) -> Result<()> {
  bind_map_instance_in_scope(injector, key.with_tag(tag), entry, instance, scope_tag)
}
