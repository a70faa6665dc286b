//! Model-backed analysis stages

pub mod decode;
pub mod prompt;
pub mod stages;

pub use decode::{decode, strip_code_fence};
pub use prompt::PromptBuilder;
pub use stages::StageAdapters;
