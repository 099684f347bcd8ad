use fibre_inject::{Context, InjectError, Injector, Key, Provider};

// Key descriptors.
struct Greeting;
struct Name;

fn configure_injector(injector: &Injector, name: String) -> Result<(), InjectError> {
  injector.bind(
    Key::of::<Greeting>(),
    Provider::new(|context, container| {
      let name = container.get::<String>(context, &Key::of::<Name>())?;
      Ok(format!("Hello, {}!", name))
    }),
  )?;
  injector.bind_instance(Key::of::<Name>(), name)
}

fn main() -> Result<(), InjectError> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  // The first argument, if any, seeds the name.
  let name = std::env::args().nth(1).unwrap_or_else(|| String::from("world"));

  let injector = Injector::new();
  configure_injector(&injector, name)?;

  let greeting = injector
    .create_container()
    .get::<String>(&Context::none(), &Key::of::<Greeting>())?;
  println!("{}", greeting);
  Ok(())
}
