//! Classic (non-stream) xref table + trailer emission.
//!
//! spec.md doesn't fully specify cross-reference mechanics, only that the
//! write pipeline must produce output a conforming reader can open; a
//! classic `xref`/`trailer`/`startxref` footer is the minimum for that,
//! and is what the teacher's own `Storage<Vec<u8>>::save()`
//! (examples/pdf-rs-pdf/pdf/src/file.rs) builds before it falls back to an
//! xref stream. This only ever emits the classic table: xref streams are
//! an optional, newer (PDF 1.5+) mechanism this crate doesn't need.

use std::io::Write;

use crate::error::*;
use crate::object::document::Document;
use crate::primitive::{Reference, Value};
use crate::write::{WriteContext, WriteRoot};

/// Serializes every object in `doc` plus a classic xref table and
/// trailer, preserving each object's existing object number. Assumes
/// object numbers are densely packed starting at 1 (true for anything
/// this crate's own read pipeline has produced); a document with gaps
/// would need a multi-subsection xref table, which is out of scope here.
pub fn write_document(doc: &Document) -> Result<Vec<u8>> {
    let root = WriteRoot::new();
    let mut ctx = WriteContext::new();
    let mut out = Vec::new();

    writeln!(out, "%PDF-1.7")?;

    let mut object_numbers: Vec<u64> = doc.object_numbers().collect();
    object_numbers.sort_unstable();

    let mut offsets: Vec<(u64, u64)> = Vec::with_capacity(object_numbers.len());
    for object_number in &object_numbers {
        let reference = Reference { object_number: *object_number, generation_number: 0 };
        let value = doc.resolve(reference)?.clone();
        let assigned = ctx.get_reference(&value)?;
        let offset = out.len() as u64;
        root.write_indirect_object(&mut ctx, &mut out, assigned, &value)?;
        offsets.push((assigned.object_number, offset));
    }

    let xref_offset = out.len() as u64;
    writeln!(out, "xref")?;
    writeln!(out, "0 {}", offsets.len() + 1)?;
    writeln!(out, "0000000000 65535 f ")?;
    for (_, offset) in &offsets {
        writeln!(out, "{:010} 00000 n ", offset)?;
    }

    let mut trailer = doc.trailer.clone();
    trailer.insert("Size", Value::integer(offsets.len() as i64 + 1));
    writeln!(out, "trailer")?;
    Value::dictionary(trailer).serialize(&mut out)?;
    writeln!(out)?;
    writeln!(out, "startxref")?;
    writeln!(out, "{}", xref_offset)?;
    write!(out, "%%EOF")?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Dictionary;

    #[test]
    fn writes_header_xref_and_trailer() {
        let mut doc = Document::new();
        let catalog_ref = Reference { object_number: 1, generation_number: 0 };
        let mut catalog = Dictionary::new();
        catalog.insert("Type", Value::name("Catalog"));
        doc.insert(catalog_ref, Value::dictionary(catalog));
        doc.trailer.insert("Root", Value::reference(catalog_ref));

        let bytes = write_document(&doc).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.contains("1 0 obj"));
        assert!(text.contains("xref"));
        assert!(text.contains("trailer"));
        assert!(text.ends_with("%%EOF"));
    }
}
