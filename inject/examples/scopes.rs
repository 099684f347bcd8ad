use fibre_inject::{Context, InjectError, Injector, Key, Provider, ScopeEntry, SimpleScope, Singleton};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Hash)]
struct RequestScoped;

// Each tracker records the sequence number it was created with.
struct RequestTracker {
  id: usize,
}

struct AppTracker;

static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn new_tracker() -> Provider {
  Provider::new(|_, _| {
    let id = ID_COUNTER.fetch_add(1, Ordering::SeqCst);
    println!("Creating RequestTracker {}", id);
    Ok(RequestTracker { id })
  })
}

fn main() -> Result<(), InjectError> {
  let request_scope = SimpleScope::with_name("request");
  let injector = Injector::builder()
    .name("scopes-demo")
    .scope(request_scope.clone(), RequestScoped)
    .build()?;

  injector.bind_in_scope(Key::of::<AppTracker>(), new_tracker(), Singleton)?;
  injector.bind_in_scope(Key::of::<RequestTracker>(), new_tracker(), RequestScoped)?;

  println!("--- Singleton ---");
  let s1 = injector
    .create_container()
    .get::<RequestTracker>(&Context::none(), &Key::of::<AppTracker>())?;
  let s2 = injector
    .create_container()
    .get::<RequestTracker>(&Context::none(), &Key::of::<AppTracker>())?;
  assert!(Arc::ptr_eq(&s1, &s2));
  println!("Singleton IDs: {} {}", s1.id, s2.id);

  println!("--- Request scope ---");
  for request in 0..2u32 {
    let entry = ScopeEntry::enter(request_scope.clone(), Context::new(request))?;
    let first = injector
      .create_container()
      .get::<RequestTracker>(entry.context(), &Key::of::<RequestTracker>())?;
    let second = injector
      .create_container()
      .get::<RequestTracker>(entry.context(), &Key::of::<RequestTracker>())?;
    assert_eq!(first.id, second.id);
    println!("Request {} tracker IDs: {} {}", request, first.id, second.id);
  }

  // Outside an entered context the request-scoped binding is unavailable.
  match injector
    .create_container()
    .get_instance(&Context::none(), &Key::of::<RequestTracker>())
  {
    Ok(_) => println!("Unexpectedly resolved outside a request"),
    Err(err) => println!("Outside a request: {}", err),
  }
  Ok(())
}
