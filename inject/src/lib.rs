//! # Fibre Inject
//!
//! A hierarchical dependency injection runtime for Rust.
//!
//! Independent parts of a program register how to construct a value without
//! knowing who else contributes bindings, or in which order. Values are built
//! on demand, dependencies are resolved transitively, and results are cached
//! according to pluggable scopes.
//!
//! ## Core Concepts
//!
//! - **Key**: a descriptor type plus an optional [`Tag`], e.g. `Key::of::<Name>()`
//!   or `Key::tagged::<String>(Greeting)`.
//! - **Provider**: a factory receiving a [`Context`] and the resolving [`Container`].
//! - **Injector**: a node of the binding registry. Children see their ancestors'
//!   bindings; parents see a child's binding only once it is exposed.
//! - **Container**: a single-use resolution session that rejects repeated and
//!   cyclic lookups.
//! - **Scope**: a caching policy. Every tree has a [`Singleton`] scope; a
//!   [`SimpleScope`] caches per entered context (e.g. per request).
//! - **Multi-binding**: see [`multi`] for map-shaped bindings filled by many
//!   contributors.
//!
//! All failures are reported as [`InjectError`]s. They signal configuration
//! mistakes and are meant to be propagated, not recovered from.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{Context, Injector, Key, Provider, Singleton};
//!
//! #[derive(Debug, PartialEq, Eq, Hash)]
//! struct Greeting;
//! struct Name;
//!
//! let injector = Injector::new();
//! injector.bind_instance(Key::of::<Name>(), String::from("world")).unwrap();
//! injector
//!   .bind_tagged_in_scope(
//!     Key::of::<String>(),
//!     Greeting,
//!     Provider::new(|context, container| {
//!       let name = container.get::<String>(context, &Key::of::<Name>())?;
//!       Ok(format!("Hello, {}!", name))
//!     }),
//!     Singleton,
//!   )
//!   .unwrap();
//!
//! let greeting = injector
//!   .create_container()
//!   .get_tagged::<String>(&Context::none(), &Key::of::<String>(), Greeting)
//!   .unwrap();
//! assert_eq!(*greeting, "Hello, world!");
//! ```

mod builder;
mod container;
mod error;
mod injector;
mod key;
mod macros;
pub mod multi;
mod provider;
mod scope;

pub use builder::{InjectorBuilder, MapPolicy};
pub use container::Container;
pub use error::{ErrorKind, InjectError, Result};
pub use injector::Injector;
pub use key::{Key, Tag, TagValue};
pub use provider::{Context, Instance, Provider};
pub use scope::{Scope, ScopeEntry, SimpleScope, Singleton, SingletonScope};
