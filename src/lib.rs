//! Indirect-object graph model, read/write transformer pipelines, a
//! content-stream interpreter and Type-1 font encoding resolution for PDF
//! documents.
//!
//! The crate is organized the way the object graph is actually used:
//! `primitive` is the value model everything else sits on, `read`/`write`
//! are the handler-chain pipelines that translate between raw primitives
//! and the typed objects in `object`, `canvas` executes content streams
//! against those objects, and `encoding` resolves the glyph identifiers
//! `canvas` emits down to Unicode.

#![allow(clippy::len_zero, clippy::should_implement_trait, clippy::manual_map)]

#[macro_use]
pub mod error;
pub mod canvas;
pub mod encoding;
pub mod filter;
pub mod object;
pub mod primitive;
pub mod read;
pub mod tokenizer;
pub mod write;

pub use crate::error::{PdfError, Result};
pub use crate::object::Document;
pub use crate::primitive::{Dictionary, Number, PdfStream, PdfString, Reference, Value, ValueKind};
