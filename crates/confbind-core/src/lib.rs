//! confbind-core: hierarchical configuration with typed options binding
//!
//! Key-value pairs from ordered sources are merged into one
//! [`ConfigurationStore`]. Keys are `:`-delimited and case-insensitive.
//! [`SectionView`]s give scoped read access to subtrees, and any type
//! implementing [`Options`] can be bound from a section, nested objects and
//! indexed collections included. An [`OptionsRegistry`] binds each options
//! type once per section and shares the result.
//!
//! # Example
//!
//! ```rust
//! use std::sync::OnceLock;
//! use confbind_core::{ConfigurationStore, MemorySource, Options, OptionsRegistry, Shape};
//!
//! #[derive(Debug, Default)]
//! struct ServerOptions {
//!     name: String,
//!     port: u16,
//! }
//!
//! impl Options for ServerOptions {
//!     fn shape() -> &'static Shape<Self> {
//!         static SHAPE: OnceLock<Shape<ServerOptions>> = OnceLock::new();
//!         SHAPE.get_or_init(|| {
//!             Shape::<Self>::builder("ServerOptions")
//!                 .scalar("Name", |s| &mut s.name)
//!                 .scalar("Port", |s| &mut s.port)
//!                 .build()
//!         })
//!     }
//! }
//!
//! let store = ConfigurationStore::builder()
//!     .add_source(MemorySource::new("defaults", [("Settings:Server:Name", "web")]))
//!     .add_source(MemorySource::new("overrides", [("settings:server:port", "8080")]))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(store.section("Settings").get_value("Server:Name"), Some("web"));
//!
//! let registry = OptionsRegistry::new(store);
//! let server = registry.resolve::<ServerOptions>("Settings:Server").unwrap();
//! assert_eq!(server.port, 8080);
//! ```

pub mod binder;
pub mod error;
pub mod path;
pub mod registry;
pub mod section;
pub mod shape;
pub mod source;
pub mod store;

pub use binder::{bind, bind_into, bind_with, BindOptions};
pub use error::{BindingError, CoercionError, Error, ErrorKind, Result};
pub use path::PathKey;
pub use registry::OptionsRegistry;
pub use section::SectionView;
pub use shape::{Field, FieldKind, Options, Scalar, ScalarKind, Shape, ShapeBuilder};
pub use source::{ArgsSource, EnvSource, FileSource, FileSpec, MemorySource, Source};
pub use store::{ConfigurationEntry, ConfigurationStore, StoreBuilder};
