//! Root injector configuration.

use crate::error::Result;
use crate::injector::{Injector, Tree};
use crate::key::{Tag, TagValue};
use crate::scope::Scope;
use std::fmt;
use std::sync::Arc;

/// How a multi-binding map treats a second contribution for the same entry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapPolicy {
  /// The most recent provider for an entry key replaces the earlier one.
  #[default]
  LastWriterWins,
  /// A second provider for an entry key fails with
  /// [`InjectError::DuplicateMapEntry`](crate::InjectError::DuplicateMapEntry).
  RejectDuplicates,
}

/// A builder for root [`Injector`]s.
pub struct InjectorBuilder {
  name: String,
  map_policy: MapPolicy,
  scopes: Vec<(Tag, Arc<dyn Scope>)>,
}

impl fmt::Debug for InjectorBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("InjectorBuilder")
      .field("name", &self.name)
      .field("map_policy", &self.map_policy)
      .field("scopes", &self.scopes.iter().map(|(tag, _)| tag).collect::<Vec<_>>())
      .finish()
  }
}

impl Default for InjectorBuilder {
  fn default() -> Self {
    Self {
      name: String::from("injector"),
      map_policy: MapPolicy::default(),
      scopes: Vec::new(),
    }
  }
}

impl InjectorBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the label carried by log events from this tree.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn map_policy(mut self, policy: MapPolicy) -> Self {
    self.map_policy = policy;
    self
  }

  /// Registers `scope` under `tag` when the injector is built.
  pub fn scope(mut self, scope: Arc<dyn Scope>, tag: impl TagValue) -> Self {
    self.scopes.push((Tag::new(tag), scope));
    self
  }

  /// Builds the root injector.
  ///
  /// Fails if two scopes were registered under the same tag, or a scope was
  /// registered under the [`Singleton`](crate::Singleton) tag.
  pub fn build(self) -> Result<Injector> {
    let injector = Injector::with_tree(Arc::new(Tree::new(self.name, self.map_policy)));
    for (tag, scope) in self.scopes {
      injector.bind_scope(scope, tag)?;
    }
    Ok(injector)
  }
}
