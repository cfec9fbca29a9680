//! Rendering deployment templates into a release directory

pub mod apply;
pub mod template;

pub use apply::apply_release;
pub use template::{Template, discover_templates, prepare_release_dir, render, write_release};
