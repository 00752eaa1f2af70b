//! The indirect-object graph: a flat registry of `Reference -> Value`, plus
//! the trailer dictionary and document-info metadata that sit outside the
//! object graph proper.
//!
//! Grounded on the teacher's `pdf::file::Storage`
//! (examples/pdf-rs-pdf/pdf/src/file.rs), simplified down to an in-memory
//! registry: this crate consumes/produces an already-tokenized object
//! tree (see `crate::tokenizer`), so the teacher's `memmap2`-backed lazy
//! file backend has no counterpart here.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::canvas::event::SharedListener;
use crate::error::*;
use crate::primitive::{Dictionary, Reference, Value};

/// `/Info` dictionary fields, parsed out of the trailer's optional `/Info`
/// entry. Dates use PDF's `D:YYYYMMDDHHmmSSOHH'mm` format, the same
/// `DateTime<FixedOffset>` parse the teacher implements as
/// `impl Object for DateTime<FixedOffset>` in `pdf::primitive`.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub mod_date: Option<DateTime<FixedOffset>>,
}

impl DocumentInfo {
    pub fn from_dictionary(dict: &Dictionary) -> DocumentInfo {
        DocumentInfo {
            title: string_field(dict, "Title"),
            author: string_field(dict, "Author"),
            subject: string_field(dict, "Subject"),
            creator: string_field(dict, "Creator"),
            producer: string_field(dict, "Producer"),
            creation_date: date_field(dict, "CreationDate"),
            mod_date: date_field(dict, "ModDate"),
        }
    }
}

fn string_field(dict: &Dictionary, key: &str) -> Option<String> {
    dict.get(key).and_then(Value::as_string).map(|s| s.as_text())
}

fn date_field(dict: &Dictionary, key: &str) -> Option<DateTime<FixedOffset>> {
    let raw = dict.get(key).and_then(Value::as_string)?.as_text();
    parse_pdf_date(&raw)
}

/// Parses PDF's `D:YYYYMMDDHHmmSSOHH'mm` date string format.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.strip_prefix("D:").unwrap_or(raw);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let get = |range: std::ops::Range<usize>, default: u32| -> u32 {
        digits.get(range).and_then(|s| s.parse().ok()).unwrap_or(default)
    };
    let year: i32 = digits.get(0..4)?.parse().ok()?;
    let month = get(4..6, 1);
    let day = get(6..8, 1);
    let hour = get(8..10, 0);
    let minute = get(10..12, 0);
    let second = get(12..14, 0);

    let rest = &s[digits.len()..];
    let offset_seconds = parse_offset(rest).unwrap_or(0);

    let naive = chrono::NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = FixedOffset::east_opt(offset_seconds)?;
    Some(DateTime::from_naive_utc_and_offset(naive - chrono::Duration::seconds(offset_seconds as i64), offset))
}

fn parse_offset(rest: &str) -> Option<i32> {
    let mut chars = rest.chars();
    match chars.next()? {
        'Z' => Some(0),
        sign @ ('+' | '-') => {
            let tail: String = chars.collect();
            let mut parts = tail.splitn(2, '\'');
            let hh: i32 = parts.next()?.parse().ok()?;
            let mm: i32 = parts.next().unwrap_or("0").trim_end_matches('\'').parse().unwrap_or(0);
            let total = hh * 3600 + mm * 60;
            Some(if sign == '-' { -total } else { total })
        }
        _ => None,
    }
}

/// The full in-memory object graph for one PDF document: every indirect
/// object keyed by object number, plus the trailer dictionary spec.md §3
/// asks `Document` to carry (root catalog reference, `/Info`, `/ID`, ...),
/// plus a registry of event listeners attached at read time (spec.md
/// §4.2's "the Catalog handler attaches every caller-supplied listener to
/// the transformed dictionary"), keyed by object number so a later
/// `Canvas` built for that object's content stream can pick them back up.
#[derive(Default)]
pub struct Document {
    objects: HashMap<u64, Value>,
    pub trailer: Dictionary,
    listeners: RefCell<HashMap<u64, Vec<SharedListener>>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("objects", &self.objects)
            .field("trailer", &self.trailer)
            .field("listener_count", &self.listeners.borrow().values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    /// Registers `listeners` against `reference`'s object number, appending
    /// to whatever is already attached there.
    pub fn attach_listeners(&self, reference: Reference, listeners: &[SharedListener]) {
        if listeners.is_empty() {
            return;
        }
        self.listeners.borrow_mut().entry(reference.object_number).or_default().extend(listeners.iter().cloned());
    }

    /// Listeners previously attached to `reference`'s object number, if any.
    pub fn listeners_for(&self, reference: Reference) -> Vec<SharedListener> {
        self.listeners.borrow().get(&reference.object_number).cloned().unwrap_or_default()
    }

    pub fn insert(&mut self, reference: Reference, value: Value) {
        let _ = value.set_reference(reference);
        self.objects.insert(reference.object_number, value);
    }

    pub fn resolve(&self, reference: Reference) -> Result<&Value> {
        self.objects.get(&reference.object_number).ok_or(PdfError::MissingReference {
            object_number: reference.object_number,
            generation_number: reference.generation_number,
        })
    }

    /// Follows `value` one level if it is itself a `Reference`; otherwise
    /// returns `value` unchanged. Content-stream/page-tree consumers are
    /// expected to have already had indirection resolved by the read
    /// pipeline (`crate::read`), so this is the rare direct-dereference
    /// path, not the primary way objects are walked.
    pub fn deref<'a>(&'a self, value: &'a Value) -> Result<&'a Value> {
        match value.as_reference() {
            Some(r) => self.resolve(r),
            None => Ok(value),
        }
    }

    pub fn root(&self) -> Result<&Value> {
        let root_ref = self
            .trailer
            .get("Root")
            .and_then(Value::as_reference)
            .ok_or_else(|| PdfError::MalformedPagesTree { reason: "trailer has no /Root entry".into() })?;
        self.resolve(root_ref)
    }

    pub fn info(&self) -> Option<DocumentInfo> {
        let info_ref = self.trailer.get("Info")?.as_reference()?;
        let dict = self.resolve(info_ref).ok()?.as_dict()?;
        Some(DocumentInfo::from_dictionary(dict))
    }

    /// Resolves `value`'s parent back-reference (spec.md §3's weak,
    /// non-owning parent link) against this document's object registry.
    pub fn parent_of<'a>(&'a self, value: &'a Value) -> Option<&'a Value> {
        value.get_parent().and_then(|r| self.resolve(r).ok())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
    pub fn object_numbers(&self) -> impl Iterator<Item = u64> + '_ {
        self.objects.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pdf_date_with_offset() {
        let dt = parse_pdf_date("D:20230115120000+02'00'").unwrap();
        assert_eq!(
            dt.with_timezone(&chrono::Utc).format("%Y-%m-%d %H:%M").to_string(),
            "2023-01-15 10:00"
        );
    }

    #[test]
    fn parent_of_resolves_through_registry() {
        let mut doc = Document::new();
        let parent_ref = Reference { object_number: 1, generation_number: 0 };
        doc.insert(parent_ref, Value::dictionary(Dictionary::new()));

        let child = Value::integer(1);
        child.set_parent(parent_ref);
        assert!(doc.parent_of(&child).is_some());
    }

    #[test]
    fn missing_reference_is_reported() {
        let doc = Document::new();
        let r = Reference { object_number: 42, generation_number: 0 };
        assert!(matches!(doc.resolve(r), Err(PdfError::MissingReference { object_number: 42, .. })));
    }

    #[test]
    fn attached_listeners_are_retrievable_by_reference() {
        use std::cell::RefCell as StdRefCell;
        use std::rc::Rc;

        use crate::canvas::event::{ChunkOfTextRenderEvent, EventListener};

        struct Noop;
        impl EventListener for Noop {
            fn on_text_render(&mut self, _event: &ChunkOfTextRenderEvent) {}
        }

        let doc = Document::new();
        let page_ref = Reference { object_number: 4, generation_number: 0 };
        let listener: SharedListener = Rc::new(StdRefCell::new(Noop));

        assert!(doc.listeners_for(page_ref).is_empty());
        doc.attach_listeners(page_ref, &[listener]);
        assert_eq!(doc.listeners_for(page_ref).len(), 1);
    }
}
