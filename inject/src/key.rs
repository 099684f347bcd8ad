//! Binding keys: a type descriptor optionally paired with a tag.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Values that can be used as a [`Tag`].
///
/// Implemented for every `Eq + Hash + Debug` type that is `Send + Sync + 'static`,
/// so unit marker structs, integers, strings and small parameterized structs
/// all work as tags without any extra code.
pub trait TagValue: Any + Send + Sync + fmt::Debug {
  #[doc(hidden)]
  fn as_any(&self) -> &dyn Any;
  #[doc(hidden)]
  fn dyn_eq(&self, other: &dyn TagValue) -> bool;
  #[doc(hidden)]
  fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> TagValue for T
where
  T: Any + Eq + Hash + fmt::Debug + Send + Sync,
{
  fn as_any(&self) -> &dyn Any {
    self
  }

  fn dyn_eq(&self, other: &dyn TagValue) -> bool {
    other
      .as_any()
      .downcast_ref::<T>()
      .map_or(false, |other| self == other)
  }

  fn dyn_hash(&self, mut state: &mut dyn Hasher) {
    // Two tags of different types with equal payloads must not collide.
    TypeId::of::<T>().hash(&mut state);
    self.hash(&mut state);
  }
}

/// An arbitrary comparable discriminator.
///
/// Two tags are equal only if they hold values of the same type that compare
/// equal, so `Tag::new(0u8)` and `Tag::new(0u32)` are distinct.
#[derive(Clone)]
pub struct Tag(Arc<dyn TagValue>);

impl Tag {
  pub fn new<V: TagValue>(value: V) -> Self {
    // Wrapping a tag in a tag would change its identity.
    if let Some(tag) = (&value as &dyn Any).downcast_ref::<Tag>() {
      return tag.clone();
    }
    Tag(Arc::new(value))
  }

  /// Returns the tag's value if it holds a `V`.
  pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
    self.0.as_any().downcast_ref::<V>()
  }

  pub fn is<V: Any>(&self) -> bool {
    self.downcast_ref::<V>().is_some()
  }
}

impl PartialEq for Tag {
  fn eq(&self, other: &Self) -> bool {
    self.0.dyn_eq(&*other.0)
  }
}

impl Eq for Tag {}

impl Hash for Tag {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.0.dyn_hash(state);
  }
}

impl fmt::Debug for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&*self.0, f)
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&*self.0, f)
  }
}

/// Identifies the "shape" of a binding through a statically known type.
#[derive(Clone, Copy)]
pub(crate) struct TypeDescriptor {
  id: TypeId,
  name: &'static str,
}

impl TypeDescriptor {
  fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }
}

impl PartialEq for TypeDescriptor {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum Descriptor {
  Type(TypeDescriptor),
  // A tagged key re-tagged again, e.g. `Handlers(Func)` tagged with `Values`.
  Key(Arc<Key>),
}

/// Uniquely identifies a binding.
///
/// A key is a descriptor (a marker type, see [`Key::of`]) with an optional
/// [`Tag`]. Keys compare structurally: equal descriptors and equal tags, where
/// "no tag" is distinct from every tag value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
  descriptor: Descriptor,
  tag: Option<Tag>,
}

impl Key {
  /// The untagged key for the descriptor type `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      descriptor: Descriptor::Type(TypeDescriptor::of::<T>()),
      tag: None,
    }
  }

  /// The key for the descriptor type `T` tagged with `tag`.
  pub fn tagged<T: ?Sized + Any>(tag: impl TagValue) -> Self {
    Self {
      descriptor: Descriptor::Type(TypeDescriptor::of::<T>()),
      tag: Some(Tag::new(tag)),
    }
  }

  /// Returns a key that adds `tag` to this key.
  ///
  /// An untagged key simply gains the tag. A key that is already tagged is
  /// nested, so `Key::tagged::<H>(Func).with_tag(Values)` differs from both
  /// `Key::tagged::<H>(Func)` and `Key::tagged::<H>(Values)`.
  pub fn with_tag(&self, tag: impl TagValue) -> Self {
    let tag = Some(Tag::new(tag));
    match self.tag {
      None => Self {
        descriptor: self.descriptor.clone(),
        tag,
      },
      Some(_) => Self {
        descriptor: Descriptor::Key(Arc::new(self.clone())),
        tag,
      },
    }
  }

  pub fn tag(&self) -> Option<&Tag> {
    self.tag.as_ref()
  }

  pub fn is_tagged(&self) -> bool {
    self.tag.is_some()
  }

  /// The untagged key this key was derived from.
  pub fn untagged(&self) -> Key {
    match &self.descriptor {
      Descriptor::Type(descriptor) => Key {
        descriptor: Descriptor::Type(*descriptor),
        tag: None,
      },
      Descriptor::Key(inner) => inner.untagged(),
    }
  }
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.descriptor {
      Descriptor::Type(descriptor) => f.write_str(descriptor.name)?,
      Descriptor::Key(inner) => fmt::Display::fmt(inner, f)?,
    }
    match &self.tag {
      Some(tag) => write!(f, "({:?})", tag),
      None => Ok(()),
    }
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[derive(Debug, PartialEq, Eq, Hash)]
  struct Thing1;
  #[derive(Debug, PartialEq, Eq, Hash)]
  struct Thing2;
  #[derive(Debug, PartialEq, Eq, Hash)]
  struct Parameterized(&'static str);

  #[test]
  fn untagged_keys_compare_by_descriptor() {
    assert_eq!(Key::of::<String>(), Key::of::<String>());
    assert_ne!(Key::of::<String>(), Key::of::<u32>());
  }

  #[test]
  fn no_tag_differs_from_zero_value_tag() {
    assert_ne!(Key::of::<String>(), Key::tagged::<String>(0u32));
    assert_ne!(Key::of::<String>(), Key::tagged::<String>(""));
  }

  #[test]
  fn tags_of_different_types_never_match() {
    assert_ne!(Tag::new(0u8), Tag::new(0u32));
    assert_ne!(Key::tagged::<String>(Thing1), Key::tagged::<String>(Thing2));
    assert_eq!(
      Key::tagged::<String>(Parameterized("foo")),
      Key::tagged::<String>(Parameterized("foo"))
    );
    assert_ne!(
      Key::tagged::<String>(Parameterized("foo")),
      Key::tagged::<String>(Parameterized("bar"))
    );
  }

  #[test]
  fn keys_hash_structurally() {
    let mut set = HashSet::new();
    set.insert(Key::tagged::<String>(Parameterized("foo")));
    assert!(set.contains(&Key::tagged::<String>(Parameterized("foo"))));
    assert!(!set.contains(&Key::of::<String>()));
  }

  #[test]
  fn retagging_a_tagged_key_nests() {
    let base = Key::tagged::<String>(Thing1);
    let nested = base.with_tag(Thing2);
    assert_ne!(nested, Key::tagged::<String>(Thing2));
    assert_ne!(nested, base);
    assert_eq!(nested, Key::tagged::<String>(Thing1).with_tag(Thing2));
    assert_eq!(Key::of::<String>().with_tag(Thing1), base);
    assert_eq!(nested.untagged(), Key::of::<String>());
  }

  #[test]
  fn tag_accessors_report_the_outer_tag() {
    let plain = Key::of::<String>();
    assert!(!plain.is_tagged());
    assert!(plain.tag().is_none());

    let nested = Key::tagged::<String>(Thing1).with_tag(Thing2);
    assert!(nested.is_tagged());
    assert_eq!(nested.tag(), Some(&Tag::new(Thing2)));
  }

  #[test]
  fn tag_of_tag_keeps_identity() {
    let tag = Tag::new(Thing1);
    assert_eq!(Tag::new(tag.clone()), tag);
    assert!(Tag::new(tag).is::<Thing1>());
  }

  #[test]
  fn display_names_descriptor_and_tag() {
    let key = Key::tagged::<String>(Thing1);
    assert_eq!(key.to_string(), "alloc::string::String(Thing1)");
  }
}
