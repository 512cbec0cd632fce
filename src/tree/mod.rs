//! Declarative folder trees
//!
//! A project layout is described once as a nested mapping of folder names
//! and materialized into a [`FolderTree`] that every build step queries
//! for concrete paths and glob patterns.

pub mod folder;
pub mod layout;
pub mod spec;

pub use folder::*;
pub use layout::*;
pub use spec::*;
