//! Regulation document storage: lookup, naming, versioning and upload

pub mod library;
pub mod naming;
pub mod resolver;
pub mod versioning;

pub use library::DocumentLibrary;
pub use naming::{namespace_for, secure_filename};
pub use resolver::DocumentResolver;
pub use versioning::next_available_name;
