//! Type-1 simple font character-identifier <-> Unicode resolution.
//!
//! Three collaborating pieces, each grounded on a distinct part of
//! `ptext/pdf/canvas/font/simple_font/font_type_1.py` in the teacher's
//! Python ancestor: `cmap` parses `ToUnicode` CMaps, `standard`/`agl`
//! resolve named encodings and `/Differences` arrays down to Unicode, and
//! `type1` composes both into the priority-ordered resolver.

pub mod agl;
pub mod cmap;
pub mod standard;
pub mod type1;

pub use standard::NamedEncoding;
pub use type1::{canonical_name, is_standard_14, Type1Font, STANDARD_14_FONT_NAMES};
