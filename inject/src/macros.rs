//! Public macros for building keys and resolving typed instances.

/// Builds a [`Key`](crate::Key) from a descriptor type and an optional tag.
///
/// # Examples
///
/// ```
/// use fibre_inject::{key, Key};
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// struct Greeting;
///
/// assert_eq!(key!(String), Key::of::<String>());
/// assert_eq!(key!(String, Greeting), Key::tagged::<String>(Greeting));
/// ```
#[macro_export]
macro_rules! key {
  ($descriptor:ty) => {
    $crate::Key::of::<$descriptor>()
  };

  ($descriptor:ty, $tag:expr) => {
    $crate::Key::tagged::<$descriptor>($tag)
  };
}

/// Resolves a typed instance from a container.
///
/// `resolve!(container, context, Value => Descriptor)` looks up the key for
/// `Descriptor` and downcasts the instance to `Value`. A tag may follow the
/// descriptor. Expands to a `Result<Arc<Value>, InjectError>`.
///
/// # Examples
///
/// ```
/// use fibre_inject::{resolve, Context, Injector, Key};
///
/// struct Port;
///
/// let injector = Injector::new();
/// injector.bind_instance(Key::of::<Port>(), 8080u16).unwrap();
///
/// let container = injector.create_container();
/// let port = resolve!(container, &Context::none(), u16 => Port).unwrap();
/// assert_eq!(*port, 8080);
/// ```
#[macro_export]
macro_rules! resolve {
  ($container:expr, $context:expr, $value:ty => $descriptor:ty) => {
    $container.get::<$value>($context, &$crate::Key::of::<$descriptor>())
  };

  ($container:expr, $context:expr, $value:ty => $descriptor:ty, $tag:expr) => {
    $container.get::<$value>($context, &$crate::Key::tagged::<$descriptor>($tag))
  };
}
