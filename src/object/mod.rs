//! Typed domain objects (`Document`, pages) layered on top of
//! `crate::primitive::Value`. `crate::read`/`crate::write` are the
//! transformer pipelines that translate between this layer and raw
//! primitives.

pub mod document;
pub mod page;

pub use document::{Document, DocumentInfo};
pub use page::{flatten_pages, inherited_attribute};
