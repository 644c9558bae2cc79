//! Content-pack loading: root discovery, declaration parsing, recipe extraction,
//! and catalog assembly.

pub mod config;
pub mod discovery;
pub mod extract;
pub mod loader;
pub mod schema;
pub mod script;

pub use config::LoaderConfig;
pub use loader::{DataLoadError, LoadReport, load_catalog};
