//! Configuration parsing and validation
//!
//! This module handles the rigger.yml project file, package metadata,
//! run-control files, and the resolution of runtime settings.

pub mod package;
pub mod parse;
pub mod rc;
pub mod schema;
pub mod settings;
pub mod types;

// Re-export main types
pub use package::*;
pub use parse::*;
pub use rc::*;
pub use schema::*;
pub use settings::*;
pub use types::*;
