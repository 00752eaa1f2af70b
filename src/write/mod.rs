//! Write transformer pipeline: the inverse of `crate::read`, turning typed
//! values back into PDF object syntax plus the xref table/trailer that
//! make a buffer a conforming file (spec.md §4.3).
//!
//! `WriteContext`'s `by_id`/`by_hash` registries and `get_reference`'s
//! id-then-hash-then-mint algorithm are a direct port of
//! `WriteTransformerContext`/`WriteBaseTransformer.get_reference` in the
//! teacher's Python ancestor
//! (`ptext/io/write/write_base_transformer.py`); the `"N G obj\n"` ...
//! `"endobj\n\n"` framing matches both that file and the teacher's own
//! `Storage<Vec<u8>>::save()` (examples/pdf-rs-pdf/pdf/src/file.rs).

mod xref;

use std::collections::HashMap;
use std::io::Write;

use crate::error::*;
use crate::primitive::{Reference, Value, ValueKind};

pub use xref::write_document;

/// Registries + object-number counter threaded through the whole write
/// pass. `by_id` lets a value that already carries a `Reference` (read
/// from an existing document) keep its original object number; `by_hash`
/// deduplicates structurally-identical values that don't yet have one (the
/// "build a fresh document and let equal sub-objects collapse to one
/// indirect object" path).
#[derive(Default)]
pub struct WriteContext {
    pub by_id: HashMap<u64, Reference>,
    pub by_hash: HashMap<u64, Vec<(Value, Reference)>>,
    pub bodies: HashMap<u64, Value>,
    next_object_number: u64,
}

impl WriteContext {
    pub fn new() -> WriteContext {
        WriteContext::default()
    }

    /// Returns the `Reference` `value` should be written under, minting a
    /// fresh object number only if `value` has neither an existing
    /// reference nor a structurally-equal twin already registered.
    pub fn get_reference(&mut self, value: &Value) -> Result<Reference> {
        if let Some(r) = value.get_reference() {
            self.by_id.entry(r.object_number).or_insert(r);
            self.bodies.entry(r.object_number).or_insert_with(|| value.clone());
            self.next_object_number = self.next_object_number.max(r.object_number);
            return Ok(r);
        }

        let hash = value.hash_value()?;
        if let Some(candidates) = self.by_hash.get(&hash) {
            for (existing, reference) in candidates {
                if existing.equals(value) {
                    // Adopt the existing entry's reference onto the current
                    // object too, so a later `value.get_reference()` call
                    // (e.g. `CatalogHandler`'s `Kids` array, built from
                    // `leaf.get_reference()`) sees it (spec.md §4.3 step 2;
                    // `write_base_transformer.py:208`'s `object.set_reference(ref)`).
                    value.set_reference(*reference)?;
                    return Ok(*reference);
                }
            }
        }

        self.next_object_number += 1;
        let new_ref = Reference { object_number: self.next_object_number, generation_number: 0 };
        value.set_reference(new_ref)?;
        self.by_id.insert(new_ref.object_number, new_ref);
        self.by_hash.entry(hash).or_default().push((value.clone(), new_ref));
        self.bodies.insert(new_ref.object_number, value.clone());
        Ok(new_ref)
    }
}

/// One stage of the write pipeline: first-match-wins dispatch by value
/// kind, same shape as `crate::read::ReadHandler`.
pub trait WriteHandler {
    fn can_transform(&self, value: &Value) -> bool;
    fn write(&self, root: &WriteRoot, ctx: &mut WriteContext, out: &mut Vec<u8>, value: &Value) -> Result<()>;
}

/// Streams get their `/Length` recomputed from the actual raw payload
/// before serializing -- the one write-time concern that can't just
/// delegate to `Value::serialize`, since a hand-built stream may have a
/// stale or absent `/Length`.
pub struct StreamWriteHandler;
impl WriteHandler for StreamWriteHandler {
    fn can_transform(&self, value: &Value) -> bool {
        matches!(value.kind, ValueKind::Stream(_))
    }
    fn write(&self, _root: &WriteRoot, _ctx: &mut WriteContext, out: &mut Vec<u8>, value: &Value) -> Result<()> {
        let stream = value.as_stream().expect("can_transform guarantees Stream");
        let mut dict = stream.dict.clone();
        dict.insert("Length", Value::integer(stream.raw_data.len() as i64));
        let fixed = Value::stream(crate::primitive::PdfStream::new(dict, stream.raw_data.clone()));
        fixed.serialize(out)?;
        Ok(())
    }
}

pub struct DictionaryWriteHandler;
impl WriteHandler for DictionaryWriteHandler {
    fn can_transform(&self, value: &Value) -> bool {
        matches!(value.kind, ValueKind::Dictionary(_))
    }
    fn write(&self, _root: &WriteRoot, _ctx: &mut WriteContext, out: &mut Vec<u8>, value: &Value) -> Result<()> {
        value.serialize(out)
    }
}

pub struct ArrayWriteHandler;
impl WriteHandler for ArrayWriteHandler {
    fn can_transform(&self, value: &Value) -> bool {
        matches!(value.kind, ValueKind::Array(_))
    }
    fn write(&self, _root: &WriteRoot, _ctx: &mut WriteContext, out: &mut Vec<u8>, value: &Value) -> Result<()> {
        value.serialize(out)
    }
}

/// Catch-all: Names/Numbers/Strings/Booleans/Null/References serialize the
/// same way regardless of where they're written from.
pub struct PrimitiveWriteHandler;
impl WriteHandler for PrimitiveWriteHandler {
    fn can_transform(&self, _value: &Value) -> bool {
        true
    }
    fn write(&self, _root: &WriteRoot, _ctx: &mut WriteContext, out: &mut Vec<u8>, value: &Value) -> Result<()> {
        value.serialize(out)
    }
}

pub struct WriteRoot {
    handlers: Vec<Box<dyn WriteHandler>>,
}

impl Default for WriteRoot {
    fn default() -> WriteRoot {
        WriteRoot {
            handlers: vec![
                Box::new(StreamWriteHandler),
                Box::new(DictionaryWriteHandler),
                Box::new(ArrayWriteHandler),
                Box::new(PrimitiveWriteHandler),
            ],
        }
    }
}

impl WriteRoot {
    pub fn new() -> WriteRoot {
        WriteRoot::default()
    }

    pub fn write(&self, ctx: &mut WriteContext, out: &mut Vec<u8>, value: &Value) -> Result<()> {
        for handler in &self.handlers {
            if handler.can_transform(value) {
                return handler.write(self, ctx, out, value);
            }
        }
        Err(PdfError::NoWriteHandler { debug_name: value.get_debug_name() })
    }

    /// Writes `value` as a standalone indirect object: `"N G obj\n"`,
    /// the serialized body, `"\nendobj\n\n"` -- byte-for-byte the framing
    /// `WriteBaseTransformer._start_object`/`_end_object` use in the
    /// teacher's Python ancestor.
    pub fn write_indirect_object(&self, ctx: &mut WriteContext, out: &mut Vec<u8>, reference: Reference, value: &Value) -> Result<()> {
        write!(out, "{} {} obj\n", reference.object_number, reference.generation_number)?;
        self.write(ctx, out, value)?;
        write!(out, "\nendobj\n\n")?;
        Ok(())
    }
}

/// Convenience used by tests and `write_document`: writes `value` under a
/// freshly-minted or reused reference and returns it.
pub fn write_value(root: &WriteRoot, ctx: &mut WriteContext, out: &mut Vec<u8>, value: &Value) -> Result<Reference> {
    let reference = ctx.get_reference(value)?;
    root.write_indirect_object(ctx, out, reference, value)?;
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Dictionary;

    fn font_dict() -> Value {
        let mut d = Dictionary::new();
        d.insert("Type", Value::name("Font"));
        d.insert("Subtype", Value::name("Type1"));
        Value::dictionary(d)
    }

    /// Two freshly-built, not-yet-referenced dictionaries with the same
    /// entries must collapse to one object number (spec.md §8's "Reference
    /// dedup" scenario). `write_document` never reaches this branch of
    /// `get_reference` (every object it resolves already carries a distinct
    /// `Reference` from `Document::insert`), so this drives it directly
    /// through `write_value`/`WriteContext` instead.
    #[test]
    fn structurally_equal_values_dedup_to_one_object_number() {
        let root = WriteRoot::new();
        let mut ctx = WriteContext::new();
        let mut out = Vec::new();

        let first = font_dict();
        let second = font_dict();
        assert!(first.get_reference().is_none());
        assert!(second.get_reference().is_none());

        let first_ref = write_value(&root, &mut ctx, &mut out, &first).unwrap();
        let second_ref = write_value(&root, &mut ctx, &mut out, &second).unwrap();

        assert_eq!(first_ref, second_ref);
        assert_eq!(second.get_reference(), Some(first_ref));
    }

    #[test]
    fn distinct_values_get_distinct_object_numbers() {
        let root = WriteRoot::new();
        let mut ctx = WriteContext::new();
        let mut out = Vec::new();

        let mut other = Dictionary::new();
        other.insert("Type", Value::name("Font"));
        other.insert("Subtype", Value::name("TrueType"));

        let first_ref = write_value(&root, &mut ctx, &mut out, &font_dict()).unwrap();
        let second_ref = write_value(&root, &mut ctx, &mut out, &Value::dictionary(other)).unwrap();

        assert_ne!(first_ref, second_ref);
    }
}
