use fibre_inject::{Context, ErrorKind, InjectError, Injector, Key, Provider};

// --- Test Fixtures ---

#[derive(Debug, PartialEq, Eq, Hash)]
struct Thing1;
#[derive(Debug, PartialEq, Eq, Hash)]
struct Thing2;

fn string_key() -> Key {
  Key::of::<String>()
}

fn resolve_str(injector: &Injector, key: &Key) -> fibre_inject::Result<&'static str> {
  injector
    .create_container()
    .get::<&'static str>(&Context::none(), key)
    .map(|value| *value)
}

// --- Visibility Tests ---

#[test]
fn test_child_delegates_to_parent() {
  // Arrange
  let parent = Injector::new();
  let child = parent.create_child_injector();

  // Binding after the child exists is still visible to it.
  parent.bind_instance(string_key(), "foo").unwrap();

  // Act & Assert
  assert_eq!(resolve_str(&child, &string_key()).unwrap(), "foo");
}

#[test]
fn test_grandchild_sees_every_ancestor() {
  let root = Injector::new();
  let child = root.create_child_injector();
  let grandchild = child.create_child_injector();
  root.bind_tagged_instance(string_key(), Thing1, "from root").unwrap();
  child.bind_tagged_instance(string_key(), Thing2, "from child").unwrap();

  let container = grandchild.create_container();
  let ctx = Context::none();
  assert_eq!(
    *container.get_tagged::<&str>(&ctx, &string_key(), Thing1).unwrap(),
    "from root"
  );
  assert_eq!(
    *container.get_tagged::<&str>(&ctx, &string_key(), Thing2).unwrap(),
    "from child"
  );
}

#[test]
fn test_child_binding_is_invisible_to_parent() {
  let parent = Injector::new();
  let child = parent.create_child_injector();
  child.bind_instance(string_key(), "foo").unwrap();

  let err = resolve_str(&parent, &string_key()).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unbound);
}

#[test]
fn test_child_provider_resolves_its_own_tagged_binding_after_expose() {
  // Arrange
  let parent = Injector::new();
  let child = parent.create_child_injector();
  child.bind_tagged_instance(string_key(), Thing1, "foo").unwrap();
  child
    .bind(
      string_key(),
      Provider::from_fn(|context, container| {
        container.get_tagged_instance(context, &Key::of::<String>(), Thing1)
      }),
    )
    .unwrap();

  // Act
  child.expose(string_key()).unwrap();

  // Assert: the provider runs with the parent's container, but its binding
  // for the tagged key stays private to the child.
  let err = resolve_str(&parent, &string_key()).unwrap_err();
  assert!(matches!(err, InjectError::UnboundKey { .. }));

  child.expose_tagged(string_key(), Thing1).unwrap();
  assert_eq!(resolve_str(&parent, &string_key()).unwrap(), "foo");
}

// --- Exposure Tests ---

#[test]
fn test_expose_to_parent() {
  let parent = Injector::new();
  let child = parent.create_child_injector();

  child.bind_instance(string_key(), "foo").unwrap();
  child.expose(string_key()).unwrap();

  assert_eq!(resolve_str(&parent, &string_key()).unwrap(), "foo");
}

#[test]
fn test_expose_does_not_reach_grandparent() {
  // Arrange
  let parent = Injector::new();
  let child = parent.create_child_injector();
  let grandchild = child.create_child_injector();

  // Act
  grandchild.bind_instance(string_key(), "foo").unwrap();
  grandchild.expose(string_key()).unwrap();

  // Assert
  assert_eq!(resolve_str(&child, &string_key()).unwrap(), "foo");
  assert_eq!(
    resolve_str(&parent, &string_key()).unwrap_err().kind(),
    ErrorKind::Unbound
  );

  // Once the middle injector exposes it too, the grandparent sees it.
  child.expose(string_key()).unwrap();
  assert_eq!(resolve_str(&parent, &string_key()).unwrap(), "foo");
}

#[test]
fn test_expose_without_parent_fails() {
  let root = Injector::new();
  root.bind_instance(string_key(), "foo").unwrap();

  let err = root.expose(string_key()).unwrap_err();

  assert_eq!(err.kind(), ErrorKind::Exposure);
  assert!(matches!(err, InjectError::NoParent { .. }));
}

#[test]
fn test_expose_without_local_binding_fails() {
  let parent = Injector::new();
  let child = parent.create_child_injector();
  let grandchild = child.create_child_injector();
  parent.bind_instance(string_key(), "foo").unwrap();

  // Inherited bindings are not local bindings.
  let err = grandchild.expose(string_key()).unwrap_err();

  assert!(matches!(err, InjectError::NotBoundLocally { .. }));
  assert_eq!(err.kind(), ErrorKind::Exposure);
}

#[test]
fn test_expose_and_tag_avoids_untagged_collision() {
  // Arrange
  let parent = Injector::new();
  let child = parent.create_child_injector();
  child.bind_instance(string_key(), "bar").unwrap();
  parent.bind_tagged_instance(string_key(), Thing2, "unrelated").unwrap();

  // Act
  child.expose_and_tag(string_key(), Thing1).unwrap();

  // Assert
  let container = parent.create_container();
  let ctx = Context::none();
  assert_eq!(
    *container.get_tagged::<&str>(&ctx, &string_key(), Thing1).unwrap(),
    "bar"
  );
  assert_eq!(
    resolve_str(&parent, &string_key()).unwrap_err().kind(),
    ErrorKind::Unbound
  );
}

#[test]
fn test_expose_and_tag_into_already_bound_tag_fails() {
  let parent = Injector::new();
  let child = parent.create_child_injector();
  child.bind_instance(string_key(), "bar").unwrap();
  parent.bind_tagged_instance(string_key(), Thing1, "foo").unwrap();

  let err = child.expose_and_tag(string_key(), Thing1).unwrap_err();

  assert_eq!(err.kind(), ErrorKind::DuplicateBinding);
}

#[test]
fn test_sibling_children_expose_same_key_under_distinct_tags() {
  // Arrange
  let parent = Injector::new();
  let one = parent.create_child_injector();
  let two = parent.create_child_injector();
  one.bind_instance(string_key(), "one").unwrap();
  two.bind_instance(string_key(), "two").unwrap();

  // Act
  one.expose_and_tag(string_key(), Thing1).unwrap();
  two.expose_and_tag(string_key(), Thing2).unwrap();

  // Assert
  let container = parent.create_container();
  let ctx = Context::none();
  assert_eq!(
    *container.get_tagged::<&str>(&ctx, &string_key(), Thing1).unwrap(),
    "one"
  );
  assert_eq!(
    *container.get_tagged::<&str>(&ctx, &string_key(), Thing2).unwrap(),
    "two"
  );
}

#[test]
fn test_sibling_tagged_bindings_exposed_and_renamed() {
  let parent = Injector::new();
  let child1 = parent.create_child_injector();
  let child2 = parent.create_child_injector();
  child1.bind_tagged_instance(string_key(), Thing1, "foo").unwrap();
  child2.bind_tagged_instance(string_key(), Thing1, "bar").unwrap();

  child1.expose_tagged(string_key(), Thing1).unwrap();
  child2
    .expose_as(&Key::tagged::<String>(Thing1), Key::tagged::<String>(Thing2))
    .unwrap();

  let container = parent.create_container();
  let ctx = Context::none();
  assert_eq!(
    *container.get_tagged::<&str>(&ctx, &string_key(), Thing1).unwrap(),
    "foo"
  );
  assert_eq!(
    *container.get_tagged::<&str>(&ctx, &string_key(), Thing2).unwrap(),
    "bar"
  );
}

#[test]
fn test_two_siblings_cannot_expose_the_same_key() {
  let parent = Injector::new();
  let one = parent.create_child_injector();
  let two = parent.create_child_injector();
  one.bind_instance(string_key(), "one").unwrap();
  two.bind_instance(string_key(), "two").unwrap();

  one.expose(string_key()).unwrap();
  let err = two.expose(string_key()).unwrap_err();

  assert_eq!(err.kind(), ErrorKind::DuplicateBinding);
}

// --- Uniqueness Tests ---

#[test]
fn test_siblings_may_bind_the_same_key() {
  let parent = Injector::new();
  let alice = parent.create_child_injector();
  let bob = parent.create_child_injector();

  alice.bind_instance(string_key(), "foo").unwrap();
  bob.bind_instance(string_key(), "bar").unwrap();

  assert_eq!(resolve_str(&alice, &string_key()).unwrap(), "foo");
  assert_eq!(resolve_str(&bob, &string_key()).unwrap(), "bar");
}

#[test]
fn test_already_bound_in_parent_fails_in_child() {
  let parent = Injector::new();
  let child = parent.create_child_injector();

  parent.bind_instance(string_key(), "foo").unwrap();
  let err = child.bind_instance(string_key(), "foo").unwrap_err();

  assert_eq!(err.kind(), ErrorKind::DuplicateBinding);
}

#[test]
fn test_already_bound_in_child_fails_in_parent() {
  let parent = Injector::new();
  let child = parent.create_child_injector();

  child.bind_instance(string_key(), "foo").unwrap();
  let err = parent.bind_instance(string_key(), "foo").unwrap_err();

  assert_eq!(err.kind(), ErrorKind::DuplicateBinding);
}

#[test]
fn test_already_bound_in_grandchild_fails_in_root() {
  let root = Injector::new();
  let grandchild = root.create_child_injector().create_child_injector();

  grandchild.bind_instance(string_key(), "deep").unwrap();

  assert_eq!(
    root.bind_instance(string_key(), "top").unwrap_err().kind(),
    ErrorKind::DuplicateBinding
  );
}

#[test]
fn test_exposed_key_blocks_later_sibling_bindings() {
  let parent = Injector::new();
  let one = parent.create_child_injector();
  one.bind_instance(string_key(), "one").unwrap();
  one.expose(string_key()).unwrap();

  let late = parent.create_child_injector();
  let err = late.bind_instance(string_key(), "late").unwrap_err();

  assert_eq!(err.kind(), ErrorKind::DuplicateBinding);
}

#[test]
fn test_expose_after_sibling_binding_shadows_it_for_others() {
  // Arrange
  let parent = Injector::new();
  let early = parent.create_child_injector();
  let exposer = parent.create_child_injector();
  early.bind_instance(string_key(), "early").unwrap();
  exposer.bind_instance(string_key(), "exposed").unwrap();

  // Act
  exposer.expose(string_key()).unwrap();

  // Assert
  assert_eq!(resolve_str(&early, &string_key()).unwrap(), "early");
  assert_eq!(resolve_str(&parent, &string_key()).unwrap(), "exposed");
  let cousin = parent.create_child_injector().create_child_injector();
  assert_eq!(resolve_str(&cousin, &string_key()).unwrap(), "exposed");
}

#[test]
fn test_separate_roots_are_isolated() {
  let first = Injector::new();
  let second = Injector::new();

  first.bind_instance(string_key(), "first").unwrap();
  second.bind_instance(string_key(), "second").unwrap();

  assert_eq!(resolve_str(&first, &string_key()).unwrap(), "first");
  assert_eq!(resolve_str(&second, &string_key()).unwrap(), "second");
}

#[test]
fn test_is_bound_follows_resolution_precedence() {
  let parent = Injector::new();
  let child = parent.create_child_injector();
  parent.bind_tagged_instance(string_key(), Thing1, "parent").unwrap();
  child.bind_tagged_instance(string_key(), Thing2, "child").unwrap();

  assert!(child.is_bound(&Key::tagged::<String>(Thing1)));
  assert!(child.is_bound(&Key::tagged::<String>(Thing2)));
  assert!(!parent.is_bound(&Key::tagged::<String>(Thing2)));
}
