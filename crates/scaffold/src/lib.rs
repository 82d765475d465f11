//! Test scaffolding generator for server-rendered websites
//!
//! Materializes a fixed template set (harness configuration plus YAML check
//! specs) into a website project, skipping files that already exist.

pub mod materialize;
pub mod templates;

pub use materialize::{materialize, Materialization};
pub use templates::{TemplateEntry, TEMPLATES};
