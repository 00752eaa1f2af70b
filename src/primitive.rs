//! Primitive PDF values: the sum type every higher-level object is built
//! from or serializes back down to. See `crate::object` for the read/write
//! transformer pipelines that sit on top of this module, and `crate::error`
//! for `PdfError`.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::io::Write as _;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::*;

/// Indirect-object pointer: `(object_number, generation_number)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub object_number: u64,
    pub generation_number: u16,
}

/// Arbitrary-precision-flavored PDF number.
///
/// PDF numbers are either integers or reals; spec.md §3 asks for a single
/// "arbitrary-precision decimal" variant rather than the teacher's
/// `Integer(i32)`/`Number(f32)` split. No bignum crate appears anywhere in
/// the sampled corpus, so this keeps a plain `f64` plus an `is_integer` flag
/// that records how the token was spelled, which is enough to round-trip
/// serialization byte-for-byte for the common case (see DESIGN.md).
#[derive(Debug, Clone, Copy)]
pub struct Number {
    value: f64,
    is_integer: bool,
}

impl Number {
    pub fn integer(v: i64) -> Number {
        Number { value: v as f64, is_integer: true }
    }
    pub fn real(v: f64) -> Number {
        Number { value: v, is_integer: false }
    }
    pub fn as_f64(&self) -> f64 {
        self.value
    }
    pub fn as_i64(&self) -> i64 {
        self.value as i64
    }
    pub fn is_integer(&self) -> bool {
        self.is_integer
    }
}
impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        self.is_integer == other.is_integer && self.value.to_bits() == other.value.to_bits()
    }
}
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_integer {
            write!(f, "{}", self.value as i64)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// Raw PDF string: the bytes as tokenized, plus a decoded-text view.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfString {
    pub data: Vec<u8>,
}
impl PdfString {
    pub fn new(data: Vec<u8>) -> PdfString {
        PdfString { data }
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
    /// Decoded-text view: UTF-16BE if BOM-prefixed (PDF's convention for
    /// non-PDFDocEncoding text strings), else treated as Latin-1/ASCII.
    pub fn as_text(&self) -> String {
        if self.data.starts_with(&[0xfe, 0xff]) {
            let utf16: Vec<u16> = self.data[2..]
                .chunks(2)
                .map(|c| (c[0] as u16) << 8 | *c.get(1).unwrap_or(&0) as u16)
                .collect();
            String::from_utf16_lossy(&utf16)
        } else {
            self.data.iter().map(|&b| b as char).collect()
        }
    }
    fn serialize(&self, out: &mut dyn io::Write) -> Result<()> {
        if self.data.iter().any(|&b| b >= 0x80) {
            write!(out, "<")?;
            for &b in &self.data {
                write!(out, "{:02x}", b)?;
            }
            write!(out, ">")?;
        } else {
            write!(out, "(")?;
            for &b in &self.data {
                if matches!(b, b'\\' | b'(' | b')') {
                    write!(out, "\\")?;
                }
                out.write_all(&[b])?;
            }
            write!(out, ")")?;
        }
        Ok(())
    }
}

/// Raw PDF stream: dictionary + raw payload + (lazily filled in) decoded
/// payload. Filter decoding is applied by `crate::filter` on demand; the
/// decoded bytes are cached on first decode (same one-shot-memoize shape as
/// the font encoding tables in `crate::encoding`).
#[derive(Debug, Clone)]
pub struct PdfStream {
    pub dict: Dictionary,
    pub raw_data: Vec<u8>,
    decoded: std::cell::RefCell<Option<Vec<u8>>>,
}
impl PartialEq for PdfStream {
    fn eq(&self, other: &PdfStream) -> bool {
        self.dict == other.dict && self.raw_data == other.raw_data
    }
}
impl PdfStream {
    pub fn new(dict: Dictionary, raw_data: Vec<u8>) -> PdfStream {
        PdfStream { dict, raw_data, decoded: std::cell::RefCell::new(None) }
    }

    /// Decoded-byte payload, applying `/Filter` once and caching the result.
    pub fn decoded_data(&self) -> Result<Vec<u8>> {
        if let Some(cached) = self.decoded.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let decoded = crate::filter::decode(&self.dict, &self.raw_data)?;
        *self.decoded.borrow_mut() = Some(decoded.clone());
        Ok(decoded)
    }

    fn serialize(&self, out: &mut dyn io::Write) -> Result<()> {
        self.dict.serialize(out)?;
        writeln!(out, "stream")?;
        out.write_all(&self.raw_data)?;
        writeln!(out, "\nendstream")?;
        Ok(())
    }
}

/// Ordered `Name -> Value` mapping. Backed by `indexmap::IndexMap` rather
/// than the teacher's `BTreeMap` because spec.md §3 requires insertion
/// order to be preserved for byte-exact serialization, which a key-sorted
/// map cannot give us; `indexmap` is already part of the teacher's own
/// dependency table (and is how `pdf-rs/font`'s `type1.rs` keeps ordered
/// glyph tables in the sampled pack).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: IndexMap<String, Value>,
}
impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary::default()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
    pub fn iter(&self) -> indexmap::map::Iter<String, Value> {
        self.entries.iter()
    }
    /// True if `key` holds a Name primitive equal to `value`.
    pub fn is_type(&self, key: &str, value: &str) -> bool {
        matches!(self.get(key), Some(v) if v.as_name() == Some(value))
    }
    fn serialize(&self, out: &mut dyn io::Write) -> Result<()> {
        write!(out, "<<")?;
        for (key, val) in self.iter() {
            write!(out, " ")?;
            serialize_name(key, out)?;
            write!(out, " ")?;
            val.serialize(out)?;
        }
        write!(out, " >>")?;
        Ok(())
    }
}
impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
impl FromIterator<(String, Value)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Dictionary { entries: iter.into_iter().collect() }
    }
}

fn serialize_name(name: &str, out: &mut dyn io::Write) -> Result<()> {
    write!(out, "/")?;
    for c in name.chars() {
        match c {
            '\\' | '(' | ')' | '/' | '<' | '>' | '[' | ']' | ' ' | '#' => write!(out, "#{:02x}", c as u32)?,
            c => write!(out, "{}", c)?,
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Number(Number),
    Name(String),
    String(PdfString),
    Array(Vec<Value>),
    Dictionary(Dictionary),
    Stream(PdfStream),
    Reference(Reference),
}

/// Metadata side-carried by every `Value`, per spec.md §3's invariants:
/// at most one (weak, non-owning) parent back-reference, and at most one
/// `Reference` if the value is promoted to an indirect object.
///
/// The parent link is deliberately *not* a live pointer/handle into the
/// tree (spec.md §9's "arena-allocated nodes; parent links are indices or
/// weak handles, never owning"): it stores the parent's own `Reference`
/// token, resolved lazily against the owning `Document`'s object registry
/// only when a caller actually asks for the parent. This sidesteps
/// self-referential `Rc`/`Weak` plumbing for a graph that is otherwise
/// plain owned data, at the cost of requiring indirect objects to look
/// their parent up through a registry rather than following a raw pointer.
#[derive(Debug, Clone, Default)]
struct Meta {
    parent: Option<Reference>,
    reference: Option<Reference>,
}

#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    meta: std::cell::RefCell<Meta>,
}

impl Value {
    fn new(kind: ValueKind) -> Value {
        Value { kind, meta: std::cell::RefCell::new(Meta::default()) }
    }
    pub fn null() -> Value {
        Value::new(ValueKind::Null)
    }
    pub fn boolean(b: bool) -> Value {
        Value::new(ValueKind::Boolean(b))
    }
    pub fn integer(v: i64) -> Value {
        Value::new(ValueKind::Number(Number::integer(v)))
    }
    pub fn real(v: f64) -> Value {
        Value::new(ValueKind::Number(Number::real(v)))
    }
    pub fn name(n: impl Into<String>) -> Value {
        Value::new(ValueKind::Name(n.into()))
    }
    pub fn string(data: Vec<u8>) -> Value {
        Value::new(ValueKind::String(PdfString::new(data)))
    }
    pub fn array(items: Vec<Value>) -> Value {
        Value::new(ValueKind::Array(items))
    }
    pub fn dictionary(dict: Dictionary) -> Value {
        Value::new(ValueKind::Dictionary(dict))
    }
    pub fn stream(stream: PdfStream) -> Value {
        Value::new(ValueKind::Stream(stream))
    }
    pub fn reference(r: Reference) -> Value {
        Value::new(ValueKind::Reference(r))
    }

    pub fn get_debug_name(&self) -> &'static str {
        match self.kind {
            ValueKind::Null => "Null",
            ValueKind::Boolean(_) => "Boolean",
            ValueKind::Number(_) => "Number",
            ValueKind::Name(_) => "Name",
            ValueKind::String(_) => "String",
            ValueKind::Array(_) => "Array",
            ValueKind::Dictionary(_) => "Dictionary",
            ValueKind::Stream(_) => "Stream",
            ValueKind::Reference(_) => "Reference",
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Name(n) => Some(n.as_str()),
            _ => None,
        }
    }
    pub fn as_number(&self) -> Option<Number> {
        match &self.kind {
            ValueKind::Number(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number().map(|n| n.as_i64())
    }
    pub fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            ValueKind::Boolean(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_string(&self) -> Option<&PdfString> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_array(&self) -> Option<&[Value]> {
        match &self.kind {
            ValueKind::Array(a) => Some(a),
            _ => None,
        }
    }
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.kind {
            ValueKind::Array(a) => Some(a),
            _ => None,
        }
    }
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match &self.kind {
            ValueKind::Dictionary(d) => Some(d),
            ValueKind::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }
    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match &mut self.kind {
            ValueKind::Dictionary(d) => Some(d),
            ValueKind::Stream(s) => Some(&mut s.dict),
            _ => None,
        }
    }
    pub fn as_stream(&self) -> Option<&PdfStream> {
        match &self.kind {
            ValueKind::Stream(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_reference(&self) -> Option<Reference> {
        match &self.kind {
            ValueKind::Reference(r) => Some(*r),
            _ => None,
        }
    }

    pub fn require_dict(&self) -> Result<&Dictionary> {
        self.as_dict().ok_or_else(|| PdfError::UnexpectedValue {
            expected: "Dictionary",
            found: self.get_debug_name(),
        })
    }

    /// Structural equality: ignores the `parent`/`reference` side-metadata,
    /// per spec.md §4.1 `equals(a, b)`.
    pub fn equals(&self, other: &Value) -> bool {
        self.kind == other.kind
    }

    /// Stable structural hash, defined for every `Value` variant (spec.md
    /// §4.1). The closed `ValueKind` enum never actually contains a
    /// sub-value this can't hash, so `Unhashable` is unreachable here --
    /// kept in the error type for API fidelity, the same way spec.md §7
    /// keeps `MalformedPagesTree` as "impossible in practice".
    pub fn hash_value(&self) -> Result<u64> {
        let mut hasher = DefaultHasher::new();
        hash_kind(&self.kind, &mut hasher)?;
        Ok(hasher.finish())
    }

    pub fn get_parent(&self) -> Option<Reference> {
        self.meta.borrow().parent
    }
    pub fn set_parent(&self, parent: Reference) {
        self.meta.borrow_mut().parent = Some(parent);
    }
    pub fn get_reference(&self) -> Option<Reference> {
        self.meta.borrow().reference
    }
    /// At-most-once set; re-setting to a *different* `object_number` fails
    /// with `ReferenceConflict` (spec.md §4.1).
    pub fn set_reference(&self, r: Reference) -> Result<()> {
        let mut meta = self.meta.borrow_mut();
        match meta.reference {
            None => {
                meta.reference = Some(r);
                Ok(())
            }
            Some(existing) if existing.object_number == r.object_number => Ok(()),
            Some(existing) => Err(PdfError::ReferenceConflict {
                existing: existing.object_number,
                attempted: r.object_number,
            }),
        }
    }

    pub fn serialize(&self, out: &mut dyn io::Write) -> Result<()> {
        match &self.kind {
            ValueKind::Null => write!(out, "null")?,
            ValueKind::Boolean(b) => write!(out, "{}", b)?,
            ValueKind::Number(n) => write!(out, "{}", n)?,
            ValueKind::Name(n) => serialize_name(n, out)?,
            ValueKind::String(s) => s.serialize(out)?,
            ValueKind::Array(items) => {
                write!(out, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(out, " ")?;
                    }
                    item.serialize(out)?;
                }
                write!(out, "]")?;
            }
            ValueKind::Dictionary(d) => d.serialize(out)?,
            ValueKind::Stream(s) => s.serialize(out)?,
            ValueKind::Reference(r) => write!(out, "{} {} R", r.object_number, r.generation_number)?,
        }
        Ok(())
    }
}
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.equals(other)
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean(b) => write!(f, "{}", b),
            ValueKind::Number(n) => write!(f, "{}", n),
            ValueKind::Name(n) => write!(f, "/{}", n),
            ValueKind::String(s) => write!(f, "{:?}", s.as_bytes()),
            ValueKind::Array(items) => write!(f, "[{}]", items.iter().format(", ")),
            ValueKind::Dictionary(d) => write!(
                f,
                "<<{}>>",
                d.iter().format_with(", ", |(k, v), cb| cb(&format_args!("/{}={}", k, v)))
            ),
            ValueKind::Stream(s) => write!(f, "stream({} bytes)", s.raw_data.len()),
            ValueKind::Reference(r) => write!(f, "{} {} R", r.object_number, r.generation_number),
        }
    }
}

fn hash_kind(kind: &ValueKind, hasher: &mut impl Hasher) -> Result<()> {
    match kind {
        ValueKind::Null => 0u8.hash(hasher),
        ValueKind::Boolean(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        ValueKind::Number(n) => {
            2u8.hash(hasher);
            n.is_integer.hash(hasher);
            n.value.to_bits().hash(hasher);
        }
        ValueKind::Name(n) => {
            3u8.hash(hasher);
            n.hash(hasher);
        }
        ValueKind::String(s) => {
            4u8.hash(hasher);
            s.data.hash(hasher);
        }
        ValueKind::Array(items) => {
            5u8.hash(hasher);
            for item in items {
                hash_kind(&item.kind, hasher)?;
            }
        }
        ValueKind::Dictionary(d) => {
            6u8.hash(hasher);
            // Dictionary equality for dedup purposes is order-independent
            // (two fonts with the same entries in different insertion
            // order are still "the same object"), so entries are hashed
            // via a commutative fold rather than streamed positionally.
            let mut acc: u64 = 0;
            for (k, v) in d.iter() {
                let mut entry_hasher = DefaultHasher::new();
                k.hash(&mut entry_hasher);
                hash_kind(&v.kind, &mut entry_hasher)?;
                acc ^= entry_hasher.finish();
            }
            acc.hash(hasher);
        }
        ValueKind::Stream(s) => {
            7u8.hash(hasher);
            hash_kind(&ValueKind::Dictionary(s.dict.clone()), hasher)?;
            s.raw_data.hash(hasher);
        }
        ValueKind::Reference(r) => {
            8u8.hash(hasher);
            r.hash(hasher);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_not_strings() {
        let name = Value::name("Foo");
        let string = Value::string(b"Foo".to_vec());
        assert!(!name.equals(&string));
    }

    #[test]
    fn equals_ignores_parent_and_reference() {
        let a = Value::integer(42);
        let b = Value::integer(42);
        a.set_reference(Reference { object_number: 1, generation_number: 0 }).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn reference_is_at_most_once() {
        let v = Value::null();
        v.set_reference(Reference { object_number: 1, generation_number: 0 }).unwrap();
        assert!(v.set_reference(Reference { object_number: 1, generation_number: 0 }).is_ok());
        assert!(v.set_reference(Reference { object_number: 2, generation_number: 0 }).is_err());
    }

    #[test]
    fn dictionary_hash_is_order_independent() {
        let mut d1 = Dictionary::new();
        d1.insert("Type", Value::name("Font"));
        d1.insert("Subtype", Value::name("Type1"));

        let mut d2 = Dictionary::new();
        d2.insert("Subtype", Value::name("Type1"));
        d2.insert("Type", Value::name("Font"));

        let v1 = Value::dictionary(d1);
        let v2 = Value::dictionary(d2);
        assert!(v1.equals(&v2));
        assert_eq!(v1.hash_value().unwrap(), v2.hash_value().unwrap());
    }

    #[test]
    fn round_trip_primitives() {
        for v in [
            Value::null(),
            Value::boolean(true),
            Value::integer(42),
            Value::real(1.5),
            Value::name("Type1"),
            Value::string(b"hello".to_vec()),
        ] {
            let mut bytes = Vec::new();
            v.serialize(&mut bytes).unwrap();
            assert!(!bytes.is_empty());
        }
    }
}
