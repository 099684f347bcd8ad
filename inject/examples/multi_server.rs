//! Two "servers" configured by the same module in sibling child injectors.
//!
//! Each server collects its routes through a multi-binding, is exposed to the
//! root injector under its own tag, and handles requests inside a request scope.

use fibre_inject::multi::{self, MapValues, Values};
use fibre_inject::{Context, InjectError, Injector, Key, Provider, ScopeEntry, SimpleScope, TagValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Keys.
struct Server;
struct Handlers;
struct Port;
struct Counter;

// Tags.
#[derive(Debug, PartialEq, Eq, Hash)]
struct RequestScoped;
#[derive(Debug, PartialEq, Eq, Hash)]
struct OneServer;
#[derive(Debug, PartialEq, Eq, Hash)]
struct TwoServer;

type Handler = Arc<dyn Fn(&Injector, &Context) -> Result<String, InjectError> + Send + Sync>;

struct HttpServer {
  port: u16,
  routes: MapValues,
  injector: Injector,
  scope: Arc<SimpleScope>,
}

impl HttpServer {
  fn handle(&self, request_id: u64, path: &'static str) -> Result<String, InjectError> {
    let handler = match self.routes.get::<Handler>(path) {
      Some(handler) => handler,
      None => return Ok(format!(":{} 404 {}", self.port, path)),
    };
    let entry = ScopeEntry::enter(self.scope.clone(), Context::new(request_id))?;
    handler(&self.injector, entry.context())
  }
}

fn bind_handler(injector: &Injector, path: &'static str, handler: Handler) -> Result<(), InjectError> {
  multi::bind_map_instance(injector, Key::of::<Handlers>(), path, handler)
}

fn configure_http(injector: &Injector, scope: Arc<SimpleScope>) -> Result<(), InjectError> {
  multi::ensure_map_bound(injector, Key::of::<Handlers>())?;
  let server_injector = injector.clone();
  injector.bind(
    Key::of::<Server>(),
    Provider::new(move |context, _| {
      // Port and routes are private to the server's own injector.
      let local = server_injector.create_container();
      let port = local.get::<u16>(context, &Key::of::<Port>())?;
      let routes = local.get_tagged::<MapValues>(context, &Key::of::<Handlers>(), Values)?;
      tracing::info!(port = *port, routes = routes.len(), "creating server");
      Ok(HttpServer {
        port: *port,
        routes: (*routes).clone(),
        injector: server_injector.clone(),
        scope: scope.clone(),
      })
    }),
  )
}

fn configure_routes(injector: &Injector) -> Result<(), InjectError> {
  bind_handler(
    injector,
    "/",
    Arc::new(|injector: &Injector, context: &Context| -> Result<String, InjectError> {
      // Two lookups in one request share the request-scoped counter.
      let first = injector.create_container().get::<usize>(context, &Key::of::<Counter>())?;
      let second = injector.create_container().get::<usize>(context, &Key::of::<Counter>())?;
      Ok(format!("Hello! ({}, {})", first, second))
    }),
  )?;
  bind_handler(
    injector,
    "/foo/",
    Arc::new(|_: &Injector, _: &Context| -> Result<String, InjectError> { Ok(String::from("Foo")) }),
  )
}

fn configure_server(injector: &Injector, scope: Arc<SimpleScope>, port: u16, tag: impl TagValue) -> Result<(), InjectError> {
  injector.bind_instance(Key::of::<Port>(), port)?;
  configure_http(injector, scope)?;
  configure_routes(injector)?;
  injector.expose_and_tag(Key::of::<Server>(), tag)
}

fn main() -> Result<(), InjectError> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let request_scope = SimpleScope::with_name("HTTP Request");
  let injector = Injector::builder()
    .name("multi-server")
    .scope(request_scope.clone(), RequestScoped)
    .build()?;

  // One counter shared by both servers, cached per request.
  let requests = Arc::new(AtomicUsize::new(0));
  injector.bind_in_scope(
    Key::of::<Counter>(),
    Provider::new(move |_, _| Ok(requests.fetch_add(1, Ordering::SeqCst) + 1)),
    RequestScoped,
  )?;

  // Sibling children can bind the same keys; only the exposed servers are tagged apart.
  configure_server(&injector.create_child_injector(), request_scope.clone(), 8080, OneServer)?;
  configure_server(&injector.create_child_injector(), request_scope.clone(), 8081, TwoServer)?;

  let one = injector
    .create_container()
    .get_tagged::<HttpServer>(&Context::none(), &Key::of::<Server>(), OneServer)?;
  let two = injector
    .create_container()
    .get_tagged::<HttpServer>(&Context::none(), &Key::of::<Server>(), TwoServer)?;

  println!(":{} {}", one.port, one.handle(1, "/")?);
  println!(":{} {}", two.port, two.handle(2, "/")?);
  println!(":{} {}", one.port, one.handle(3, "/foo/")?);
  println!("{}", two.handle(4, "/missing")?);
  Ok(())
}
