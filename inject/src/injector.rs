//! The hierarchical binding registry.

use crate::builder::{InjectorBuilder, MapPolicy};
use crate::container::Container;
use crate::error::{InjectError, Result};
use crate::key::{Key, Tag, TagValue};
use crate::multi::ProviderMap;
use crate::provider::{Instance, Provider};
use crate::scope::{Scope, Singleton, SingletonScope};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Ids of a node and all of its ancestors, root first.
type Lineage = Arc<[u64]>;

#[derive(Clone, Copy)]
enum ClaimMode {
  /// A fresh binding: conflicts with any claim on an ancestor, itself or a descendant.
  Bind,
  /// A binding promoted from a child: conflicts only with claims on itself or an ancestor.
  Expose,
}

/// State shared by every node of one injector tree.
pub(crate) struct Tree {
  pub(crate) name: String,
  pub(crate) map_policy: MapPolicy,
  claims: DashMap<Key, Vec<Lineage>>,
  scopes: DashMap<Tag, Arc<dyn Scope>>,
}

impl Tree {
  pub(crate) fn new(name: String, map_policy: MapPolicy) -> Self {
    Self {
      name,
      map_policy,
      claims: DashMap::new(),
      scopes: DashMap::new(),
    }
  }

  /// Fails if `lineage` may not claim `key`, without recording anything.
  fn check_claim(&self, key: &Key, lineage: &Lineage, mode: ClaimMode) -> Result<()> {
    match self.claims.get(key) {
      Some(claimed) if conflicts(&claimed, lineage, mode) => {
        Err(InjectError::DuplicateBinding { key: key.clone() })
      }
      _ => Ok(()),
    }
  }

  fn claim(&self, key: &Key, lineage: &Lineage, mode: ClaimMode) -> Result<()> {
    match self.claims.entry(key.clone()) {
      Entry::Occupied(mut claimed) => {
        if conflicts(claimed.get(), lineage, mode) {
          return Err(InjectError::DuplicateBinding { key: key.clone() });
        }
        claimed.get_mut().push(lineage.clone());
      }
      Entry::Vacant(slot) => {
        slot.insert(vec![lineage.clone()]);
      }
    }
    Ok(())
  }
}

fn conflicts(owners: &[Lineage], lineage: &Lineage, mode: ClaimMode) -> bool {
  owners.iter().any(|owner| match mode {
    ClaimMode::Bind => related(owner, lineage),
    ClaimMode::Expose => lineage.starts_with(owner),
  })
}

// One node is an ancestor-or-self of the other.
fn related(a: &[u64], b: &[u64]) -> bool {
  let shared = a.len().min(b.len());
  a[..shared] == b[..shared]
}

struct Node {
  lineage: Lineage,
  bindings: DashMap<Key, Provider>,
  maps: DashMap<Key, Arc<ProviderMap>>,
  parent: Option<Arc<Node>>,
  tree: Arc<Tree>,
}

impl Node {
  fn new(parent: Option<Arc<Node>>, tree: Arc<Tree>) -> Self {
    let id = NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed);
    let lineage: Lineage = match &parent {
      Some(parent) => parent.lineage.iter().copied().chain([id]).collect(),
      None => Arc::from(vec![id]),
    };
    Self {
      lineage,
      bindings: DashMap::new(),
      maps: DashMap::new(),
      parent,
      tree,
    }
  }

  fn depth(&self) -> usize {
    self.lineage.len() - 1
  }
}

/// A node in the hierarchical binding registry.
///
/// An `Injector` maps [`Key`]s to [`Provider`]s. Child injectors see every
/// binding of their ancestors, but their own bindings stay invisible to the
/// parent until [exposed](Injector::expose). A key may be bound only once
/// along any ancestor/descendant line of the tree; siblings may bind the same
/// key independently.
///
/// Cloning an `Injector` yields another handle to the same node.
///
/// ```
/// use fibre_inject::{Context, Injector, Key, Provider};
///
/// struct Name;
/// struct Greeting;
///
/// let injector = Injector::new();
/// injector.bind_instance(Key::of::<Name>(), String::from("world")).unwrap();
/// injector
///   .bind(
///     Key::of::<Greeting>(),
///     Provider::new(|context, container| {
///       let name = container.get::<String>(context, &Key::of::<Name>())?;
///       Ok(format!("Hello, {}!", name))
///     }),
///   )
///   .unwrap();
///
/// let greeting = injector
///   .create_container()
///   .get::<String>(&Context::none(), &Key::of::<Greeting>())
///   .unwrap();
/// assert_eq!(*greeting, "Hello, world!");
/// ```
#[derive(Clone)]
pub struct Injector {
  node: Arc<Node>,
}

impl Default for Injector {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Injector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Injector")
      .field("tree", &self.node.tree.name)
      .field("depth", &self.node.depth())
      .field("bindings", &self.node.bindings.len())
      .finish_non_exhaustive()
  }
}

impl Injector {
  /// Creates a root injector with the default configuration.
  pub fn new() -> Self {
    let tree = Arc::new(Tree::new(String::from("injector"), MapPolicy::default()));
    Self::with_tree(tree)
  }

  pub fn builder() -> InjectorBuilder {
    InjectorBuilder::new()
  }

  pub(crate) fn with_tree(tree: Arc<Tree>) -> Self {
    tree
      .scopes
      .insert(Tag::new(Singleton), SingletonScope::new() as Arc<dyn Scope>);
    tracing::debug!(injector = %tree.name, "created root injector");
    Self {
      node: Arc::new(Node::new(None, tree)),
    }
  }

  pub(crate) fn tree(&self) -> &Tree {
    &self.node.tree
  }

  pub(crate) fn maps(&self) -> &DashMap<Key, Arc<ProviderMap>> {
    &self.node.maps
  }

  /// Distance from the root injector.
  pub fn depth(&self) -> usize {
    self.node.depth()
  }

  pub fn parent(&self) -> Option<Injector> {
    self.node.parent.clone().map(|node| Injector { node })
  }

  /// True if both handles refer to the same node.
  pub fn same_node(&self, other: &Injector) -> bool {
    Arc::ptr_eq(&self.node, &other.node)
  }

  // --- Binding ---

  /// Binds `key` to `provider` on this node.
  pub fn bind(&self, key: Key, provider: Provider) -> Result<()> {
    self.tree().claim(&key, &self.node.lineage, ClaimMode::Bind)?;
    tracing::debug!(injector = %self.tree().name, depth = self.depth(), key = %key, "bound key");
    self.node.bindings.insert(key, provider);
    Ok(())
  }

  /// Binds `key` to a single instance.
  pub fn bind_instance<T: Any + Send + Sync>(&self, key: Key, instance: T) -> Result<()> {
    self.bind(key, Provider::from_instance(instance))
  }

  /// Fails with `DuplicateBinding` if `bind(key, ..)` would fail on this node.
  pub(crate) fn check_bindable(&self, key: &Key) -> Result<()> {
    self.tree().check_claim(key, &self.node.lineage, ClaimMode::Bind)
  }

  pub(crate) fn bind_shared(&self, key: Key, instance: Instance) -> Result<()> {
    self.bind(key, Provider::from_shared(instance))
  }

  /// Binds `key` to `provider`, caching its results in the scope registered
  /// under `scope_tag`.
  pub fn bind_in_scope(&self, key: Key, provider: Provider, scope_tag: impl TagValue) -> Result<()> {
    let scoped = self.scope(&key, provider, scope_tag)?;
    self.bind(key, scoped)
  }

  pub fn bind_instance_in_scope<T: Any + Send + Sync>(
    &self,
    key: Key,
    instance: T,
    scope_tag: impl TagValue,
  ) -> Result<()> {
    self.bind_in_scope(key, Provider::from_instance(instance), scope_tag)
  }

  pub fn bind_tagged(&self, key: Key, tag: impl TagValue, provider: Provider) -> Result<()> {
    self.bind(key.with_tag(tag), provider)
  }

  pub fn bind_tagged_instance<T: Any + Send + Sync>(
    &self,
    key: Key,
    tag: impl TagValue,
    instance: T,
  ) -> Result<()> {
    self.bind_instance(key.with_tag(tag), instance)
  }

  pub fn bind_tagged_in_scope(
    &self,
    key: Key,
    tag: impl TagValue,
    provider: Provider,
    scope_tag: impl TagValue,
  ) -> Result<()> {
    self.bind_in_scope(key.with_tag(tag), provider, scope_tag)
  }

  pub fn bind_tagged_instance_in_scope<T: Any + Send + Sync>(
    &self,
    key: Key,
    tag: impl TagValue,
    instance: T,
    scope_tag: impl TagValue,
  ) -> Result<()> {
    self.bind_instance_in_scope(key.with_tag(tag), instance, scope_tag)
  }

  // --- Scopes ---

  /// Registers `scope` under `tag` for the whole tree.
  pub fn bind_scope(&self, scope: Arc<dyn Scope>, tag: impl TagValue) -> Result<()> {
    let tag = Tag::new(tag);
    match self.tree().scopes.entry(tag.clone()) {
      Entry::Occupied(_) => Err(InjectError::DuplicateScope { tag }),
      Entry::Vacant(slot) => {
        tracing::debug!(injector = %self.tree().name, tag = %tag, scope = %scope.name(), "bound scope");
        slot.insert(scope);
        Ok(())
      }
    }
  }

  /// Wraps `provider` in the scope registered under `scope_tag` without binding it.
  pub fn scope(&self, key: &Key, provider: Provider, scope_tag: impl TagValue) -> Result<Provider> {
    let tag = Tag::new(scope_tag);
    let scope = self
      .tree()
      .scopes
      .get(&tag)
      .map(|scope| scope.value().clone())
      .ok_or(InjectError::UnboundScope { tag })?;
    Ok(scope.scope(key, provider))
  }

  // --- Hierarchy ---

  /// Creates a child whose bindings are not visible to this injector.
  pub fn create_child_injector(&self) -> Injector {
    let child = Node::new(Some(self.node.clone()), self.node.tree.clone());
    tracing::debug!(injector = %self.tree().name, depth = child.depth(), "created child injector");
    Injector {
      node: Arc::new(child),
    }
  }

  /// Creates a resolution session over this injector.
  pub fn create_container(&self) -> Container {
    Container::new(self.clone())
  }

  /// Installs this node's binding for `key` into the parent under the same key.
  ///
  /// Exposure reaches the immediate parent only.
  pub fn expose(&self, key: Key) -> Result<()> {
    self.expose_as(&key, key.clone())
  }

  pub fn expose_tagged(&self, key: Key, tag: impl TagValue) -> Result<()> {
    self.expose(key.with_tag(tag))
  }

  /// Exposes the binding for `key` to the parent as `key` tagged with `tag`.
  pub fn expose_and_tag(&self, key: Key, tag: impl TagValue) -> Result<()> {
    let target = key.with_tag(tag);
    self.expose_as(&key, target)
  }

  /// Exposes the binding for `key` to the parent under an arbitrary `target` key.
  ///
  /// The exposed binding is a real binding on the parent, checked only against
  /// the parent and its ancestors. The outcome against siblings depends on
  /// order:
  ///
  /// - once `target` is exposed, a sibling binding the same key fails with
  ///   [`InjectError::DuplicateBinding`];
  /// - a sibling that bound `target` earlier keeps its binding, and the
  ///   exposure still succeeds. The sibling resolves its own binding first;
  ///   everything else under the parent sees the exposed one.
  pub fn expose_as(&self, key: &Key, target: Key) -> Result<()> {
    let parent = self
      .node
      .parent
      .as_ref()
      .ok_or_else(|| InjectError::NoParent { key: key.clone() })?;
    let provider = self
      .get_binding(key)
      .ok_or_else(|| InjectError::NotBoundLocally { key: key.clone() })?;

    self.tree().claim(&target, &parent.lineage, ClaimMode::Expose)?;
    tracing::debug!(
      injector = %self.tree().name,
      depth = self.depth(),
      key = %key,
      target = %target,
      "exposed binding to parent"
    );
    parent.bindings.insert(target, provider);
    Ok(())
  }

  // --- Lookup ---

  /// The binding registered directly on this node.
  pub(crate) fn get_binding(&self, key: &Key) -> Option<Provider> {
    self.node.bindings.get(key).map(|provider| provider.value().clone())
  }

  /// Walks strictly upward from the parent until a binding is found.
  pub(crate) fn find_ancestor_binding(&self, key: &Key) -> Option<Provider> {
    let mut current = self.node.parent.as_ref();
    while let Some(node) = current {
      if let Some(provider) = node.bindings.get(key) {
        return Some(provider.value().clone());
      }
      current = node.parent.as_ref();
    }
    None
  }

  /// This node first, then ancestors from nearest to farthest.
  pub(crate) fn resolve_binding(&self, key: &Key) -> Option<Provider> {
    self
      .get_binding(key)
      .or_else(|| self.find_ancestor_binding(key))
  }

  /// True if `key` resolves from this node.
  pub fn is_bound(&self, key: &Key) -> bool {
    self.resolve_binding(key).is_some()
  }
}
