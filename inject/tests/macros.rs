use fibre_inject::{key, resolve, Context, ErrorKind, Injector, Key, Provider};

#[derive(Debug, PartialEq, Eq, Hash)]
struct English;

#[derive(Debug, PartialEq, Eq, Hash)]
struct German;

struct Greeting;

#[test]
fn test_key_macro_matches_constructors() {
  assert_eq!(key!(Greeting), Key::of::<Greeting>());
  assert_eq!(key!(Greeting, English), Key::tagged::<Greeting>(English));
  assert_ne!(key!(Greeting, English), key!(Greeting, German));
  assert_ne!(key!(Greeting, English), key!(Greeting));
}

#[test]
fn test_resolve_macro_untagged_and_tagged() {
  // Arrange
  let injector = Injector::new();
  injector.bind_instance(key!(Greeting), String::from("Hi")).unwrap();
  injector
    .bind(key!(Greeting, English), Provider::new(|_, _| Ok(String::from("Hello"))))
    .unwrap();
  injector
    .bind(key!(Greeting, German), Provider::new(|_, _| Ok(String::from("Hallo"))))
    .unwrap();

  // Act
  let container = injector.create_container();
  let context = Context::none();
  let plain = resolve!(container, &context, String => Greeting).unwrap();
  let english = resolve!(container, &context, String => Greeting, English).unwrap();
  let german = resolve!(container, &context, String => Greeting, German).unwrap();

  // Assert
  assert_eq!(*plain, "Hi");
  assert_eq!(*english, "Hello");
  assert_eq!(*german, "Hallo");
}

#[test]
fn test_resolve_macro_reports_errors() {
  let injector = Injector::new();
  injector.bind_instance(key!(Greeting), 1u8).unwrap();
  let container = injector.create_container();

  let err = resolve!(container, &Context::none(), String => Greeting).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::TypeMismatch);

  let err = resolve!(container, &Context::none(), String => Greeting, English).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Unbound);
}
