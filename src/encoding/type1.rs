//! Type-1 simple font character-identifier <-> Unicode resolution
//! (spec.md §4.6), grounded on `Type1Font`/`StandardType1Font` in the
//! teacher's Python ancestor,
//! `ptext/pdf/canvas/font/simple_font/font_type_1.py`.

use std::cell::RefCell;
use std::collections::HashMap;

use once_cell::unsync::OnceCell;

use crate::canvas::event::TextFont;
use crate::encoding::agl;
use crate::encoding::cmap;
use crate::encoding::standard::NamedEncoding;
use crate::object::document::Document;
use crate::primitive::{Dictionary, Value};

/// The 14 fonts every conforming PDF reader must support without an
/// embedded font program.
pub const STANDARD_14_FONT_NAMES: &[&str] = &[
    "Courier", "Courier-Bold", "Courier-BoldOblique", "Courier-Oblique",
    "Helvetica", "Helvetica-Bold", "Helvetica-BoldOblique", "Helvetica-Oblique",
    "Times-Roman", "Times-Bold", "Times-BoldItalic", "Times-Italic",
    "Symbol", "ZapfDingbats",
];

/// Lowercases and strips everything but `a-z`, so `"ABCDEF+Helvetica-Bold"`
/// (a subset tag PDF producers prepend) and `"Helvetica,Bold"` both
/// canonicalize to the same key as `"Helvetica-Bold"`.
pub fn canonical_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphabetic()).map(|c| c.to_ascii_lowercase()).collect()
}

pub fn is_standard_14(base_font_name: &str) -> bool {
    let target = canonical_name(base_font_name);
    STANDARD_14_FONT_NAMES.iter().any(|n| canonical_name(n) == target)
}

/// A small bundled approximation of Helvetica's AFM advance widths over
/// the printable ASCII range; other standard fonts fall back to a flat
/// estimate. Real AFM metrics files are a straightforward drop-in behind
/// the same `afm_width` seam.
fn afm_width(base_font_name: &str, code: u32) -> f64 {
    let canonical = canonical_name(base_font_name);
    if canonical.starts_with("courier") {
        return 600.0;
    }
    if canonical.starts_with("helvetica") {
        return match code as u8 as char {
            'i' | 'l' | 'j' | '.' | ',' | '\'' | ' ' => 222.0,
            'm' | 'w' | 'M' | 'W' => 833.0,
            c if c.is_ascii_uppercase() => 667.0,
            c if c.is_ascii_lowercase() => 500.0,
            c if c.is_ascii_digit() => 556.0,
            _ => 278.0,
        };
    }
    500.0
}

/// Parses a `/Differences` array (alternating cid cursors and glyph names,
/// PDF 9.6.6.2) into a `cid -> glyph name` table. Resolving those names to
/// Unicode via the Adobe Glyph List happens separately and lazily, see
/// `Type1Font::differences_map`.
fn parse_differences_array(items: &[Value]) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    let mut cid: Option<i64> = None;
    for item in items {
        if let Some(n) = item.as_integer() {
            cid = Some(n);
        } else if let Some(name) = item.as_name() {
            if let Some(c) = cid {
                map.insert(c as u32, name.to_owned());
                cid = Some(c + 1);
            }
        }
    }
    map
}

fn resolve_differences(raw: &HashMap<u32, String>) -> HashMap<u32, String> {
    raw.iter().filter_map(|(&cid, name)| agl::lookup(name).map(|ch| (cid, ch.to_string()))).collect()
}

/// Resolved encoding inputs for a single simple font, in the priority
/// order spec.md §4.6 lays out: a `ToUnicode` CMap always wins if present;
/// otherwise an implicit/named encoding (`WinAnsiEncoding` etc.) is tried;
/// otherwise a `/Differences` array (resolved through the Adobe Glyph
/// List); otherwise the character identifier has no known Unicode value.
///
/// The `ToUnicode` CMap and the `/Differences`-to-Unicode resolution are
/// both parsed lazily, on first lookup, and cached on the font (spec.md
/// §9) -- a font never used for text extraction never pays for either
/// parse.
#[derive(Debug, Default)]
pub struct Type1Font {
    pub base_font_name: String,
    to_unicode_raw: Option<Vec<u8>>,
    to_unicode_cache: OnceCell<HashMap<u32, String>>,
    pub named_encoding: Option<NamedEncoding>,
    differences_raw: Option<HashMap<u32, String>>,
    differences_cache: OnceCell<HashMap<u32, String>>,
    pub widths: HashMap<u32, f64>,
    pub ascent: f64,
    pub descent: f64,
    reverse: RefCell<Option<HashMap<String, u32>>>,
}

impl Type1Font {
    pub fn new(base_font_name: impl Into<String>) -> Type1Font {
        Type1Font {
            base_font_name: base_font_name.into(),
            ascent: 718.0,
            descent: -207.0,
            ..Type1Font::default()
        }
    }

    /// Builds a font from an actual `/Type /Font /Subtype /Type1`
    /// dictionary (spec.md §3's `Font` entity / §4.6): wires up
    /// `/Encoding` (a base-encoding name, or a dictionary with
    /// `/BaseEncoding` + `/Differences`), `/ToUnicode` (a CMap stream,
    /// decoded through `doc`), `/FirstChar`/`/LastChar`/`/Widths`, and
    /// `/FontDescriptor`'s `/Ascent`/`/Descent`. Missing entries fall back
    /// to `Type1Font::new`'s defaults rather than erroring -- every one of
    /// these is optional in a conforming simple font dictionary.
    pub fn from_dictionary(doc: &Document, dict: &Dictionary) -> Type1Font {
        let base_font_name = dict.get("BaseFont").and_then(Value::as_name).unwrap_or("Helvetica").to_owned();
        let mut font = Type1Font::new(base_font_name);

        match dict.get("Encoding") {
            Some(v) if v.as_name().is_some() => {
                font.named_encoding = NamedEncoding::by_name(v.as_name().unwrap());
            }
            Some(v) => {
                if let Some(encoding_dict) = doc.deref(v).ok().and_then(Value::as_dict) {
                    if let Some(base) = encoding_dict.get("BaseEncoding").and_then(Value::as_name) {
                        font.named_encoding = NamedEncoding::by_name(base);
                    }
                    if let Some(items) = encoding_dict.get("Differences").and_then(Value::as_array) {
                        font.differences_raw = Some(parse_differences_array(items));
                    }
                }
            }
            None => font.named_encoding = Some(NamedEncoding::Standard),
        }

        if let Some(to_unicode) = dict.get("ToUnicode") {
            if let Some(stream) = doc.deref(to_unicode).ok().and_then(Value::as_stream) {
                if let Ok(bytes) = stream.decoded_data() {
                    font.to_unicode_raw = Some(bytes);
                }
            }
        }

        if let (Some(first), Some(last), Some(widths)) = (
            dict.get("FirstChar").and_then(Value::as_integer),
            dict.get("LastChar").and_then(Value::as_integer),
            dict.get("Widths").and_then(Value::as_array),
        ) {
            let mut map = HashMap::new();
            for (offset, w) in widths.iter().enumerate() {
                let cid = first + offset as i64;
                if cid > last {
                    break;
                }
                if let Some(width) = w.as_number() {
                    map.insert(cid as u32, width.as_f64());
                }
            }
            font.widths = map;
        }

        if let Some(descriptor) =
            dict.get("FontDescriptor").and_then(|v| doc.deref(v).ok()).and_then(Value::as_dict)
        {
            if let Some(ascent) = descriptor.get("Ascent").and_then(Value::as_number) {
                font.ascent = ascent.as_f64();
            }
            if let Some(descent) = descriptor.get("Descent").and_then(Value::as_number) {
                font.descent = descent.as_f64();
            }
        }

        font
    }

    pub fn with_to_unicode(self, map: HashMap<u32, String>) -> Type1Font {
        let _ = self.to_unicode_cache.set(map);
        self
    }
    pub fn with_named_encoding(mut self, encoding: NamedEncoding) -> Type1Font {
        self.named_encoding = Some(encoding);
        self
    }
    pub fn with_differences(mut self, differences: HashMap<u32, String>) -> Type1Font {
        self.differences_raw = Some(differences);
        self
    }
    pub fn with_widths(mut self, widths: HashMap<u32, f64>) -> Type1Font {
        self.widths = widths;
        self
    }

    /// The decoded `ToUnicode` CMap, parsed once and cached. `None` if no
    /// `ToUnicode` source (raw bytes or a pre-resolved map via
    /// `with_to_unicode`) was ever supplied.
    fn to_unicode_map(&self) -> Option<&HashMap<u32, String>> {
        if let Some(cached) = self.to_unicode_cache.get() {
            return Some(cached);
        }
        let raw = self.to_unicode_raw.as_ref()?;
        Some(self.to_unicode_cache.get_or_init(|| cmap::parse_to_unicode(raw)))
    }

    /// The `/Differences` array resolved through the Adobe Glyph List,
    /// built once and cached.
    fn differences_map(&self) -> Option<&HashMap<u32, String>> {
        if let Some(cached) = self.differences_cache.get() {
            return Some(cached);
        }
        let raw = self.differences_raw.as_ref()?;
        Some(self.differences_cache.get_or_init(|| resolve_differences(raw)))
    }

    /// Resolves a character identifier to Unicode text, trying each
    /// source in priority order and falling through to the next on a miss.
    pub fn character_identifier_to_unicode(&self, cid: u32) -> Option<String> {
        if let Some(text) = self.to_unicode_map().and_then(|m| m.get(&cid)) {
            return Some(text.clone());
        }
        // spec.md §4.6 step 3: a named encoding only defines single-byte
        // codes 0..=256; anything past that can't be a valid index, so skip
        // straight to the Differences branch instead of truncating via
        // `cid as u8`.
        if cid <= 256 {
            if let Some(encoding) = self.named_encoding {
                if let Some(glyph_name) = encoding.glyph_name(cid as u8) {
                    if let Some(ch) = agl::lookup(glyph_name) {
                        return Some(ch.to_string());
                    }
                }
            }
        }
        if let Some(text) = self.differences_map().and_then(|m| m.get(&cid)) {
            return Some(text.clone());
        }
        None
    }

    /// Inverse of `character_identifier_to_unicode`, memoized on first use
    /// (mirrors `_read_to_unicode`'s length-gated memoization in the
    /// teacher's Python ancestor, adapted to Rust's interior mutability).
    pub fn unicode_to_character_identifier(&self, text: &str) -> Option<u32> {
        if self.reverse.borrow().is_none() {
            let mut map = HashMap::new();
            for cid in 0u32..256 {
                if let Some(text) = self.character_identifier_to_unicode(cid) {
                    map.entry(text).or_insert(cid);
                }
            }
            *self.reverse.borrow_mut() = Some(map);
        }
        self.reverse.borrow().as_ref().unwrap().get(text).copied()
    }
}

impl TextFont for Type1Font {
    fn glyph_width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or_else(|| afm_width(&self.base_font_name, code))
    }
    fn ascent(&self) -> f64 {
        self.ascent
    }
    fn descent(&self) -> f64 {
        self.descent
    }
    fn to_unicode(&self, code: u32) -> Option<String> {
        self.character_identifier_to_unicode(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::document::Document;
    use crate::primitive::{PdfStream, Reference};

    #[test]
    fn canonicalizes_subset_tag_and_casing() {
        assert_eq!(canonical_name("ABCDEF+Helvetica-Bold"), canonical_name("Helvetica-Bold"));
        assert!(is_standard_14("ABCDEF+Helvetica-Bold"));
        assert!(!is_standard_14("Arial"));
    }

    #[test]
    fn to_unicode_cmap_takes_priority_over_named_encoding() {
        let mut cmap = HashMap::new();
        cmap.insert(65, "Z".to_string());
        let font = Type1Font::new("Helvetica").with_to_unicode(cmap).with_named_encoding(NamedEncoding::WinAnsi);
        assert_eq!(font.character_identifier_to_unicode(65), Some("Z".to_string()));
    }

    #[test]
    fn named_encoding_used_when_no_to_unicode() {
        let font = Type1Font::new("Helvetica").with_named_encoding(NamedEncoding::WinAnsi);
        assert_eq!(font.character_identifier_to_unicode(b'A' as u32), Some("A".to_string()));
    }

    #[test]
    fn differences_used_as_last_resort() {
        let mut diffs = HashMap::new();
        diffs.insert(128, "Euro".to_string());
        let font = Type1Font::new("Helvetica").with_differences(diffs);
        // "Euro" isn't in the bundled AGL subset, so this falls all the way
        // through to None -- still exercises the priority chain reaching
        // the Differences branch last.
        assert_eq!(font.character_identifier_to_unicode(128), None);
        assert_eq!(font.character_identifier_to_unicode(999), None);
    }

    #[test]
    fn out_of_range_cid_skips_named_encoding_without_truncating() {
        // 300 as u8 truncates to 44 (","), which a naive cast-then-lookup
        // would wrongly resolve; the cid > 256 guard must return None here.
        let font = Type1Font::new("Helvetica").with_named_encoding(NamedEncoding::WinAnsi);
        assert_eq!(font.character_identifier_to_unicode(300), None);
    }

    #[test]
    fn unicode_to_cid_is_inverse_of_forward_resolution() {
        let font = Type1Font::new("Helvetica").with_named_encoding(NamedEncoding::WinAnsi);
        assert_eq!(font.unicode_to_character_identifier("A"), Some(b'A' as u32));
    }

    #[test]
    fn from_dictionary_wires_encoding_widths_and_descriptor() {
        let mut doc = Document::new();

        let descriptor_ref = Reference { object_number: 1, generation_number: 0 };
        let mut descriptor = Dictionary::new();
        descriptor.insert("Ascent", Value::real(700.0));
        descriptor.insert("Descent", Value::real(-210.0));
        doc.insert(descriptor_ref, Value::dictionary(descriptor));

        let to_unicode_ref = Reference { object_number: 2, generation_number: 0 };
        let cmap_bytes = b"1 beginbfchar\n<41> <0042>\nendbfchar".to_vec();
        let mut cmap_dict = Dictionary::new();
        cmap_dict.insert("Length", Value::integer(cmap_bytes.len() as i64));
        doc.insert(to_unicode_ref, Value::stream(PdfStream::new(cmap_dict, cmap_bytes)));

        let encoding_ref = Reference { object_number: 3, generation_number: 0 };
        let mut encoding_dict = Dictionary::new();
        encoding_dict.insert("BaseEncoding", Value::name("WinAnsiEncoding"));
        encoding_dict.insert("Differences", Value::array(vec![Value::integer(200), Value::name("Euro")]));
        doc.insert(encoding_ref, Value::dictionary(encoding_dict));

        let mut font_dict = Dictionary::new();
        font_dict.insert("Type", Value::name("Font"));
        font_dict.insert("Subtype", Value::name("Type1"));
        font_dict.insert("BaseFont", Value::name("Helvetica"));
        font_dict.insert("Encoding", Value::reference(encoding_ref));
        font_dict.insert("ToUnicode", Value::reference(to_unicode_ref));
        font_dict.insert("FirstChar", Value::integer(65));
        font_dict.insert("LastChar", Value::integer(66));
        font_dict.insert("Widths", Value::array(vec![Value::integer(600), Value::integer(700)]));
        font_dict.insert("FontDescriptor", Value::reference(descriptor_ref));

        let font = Type1Font::from_dictionary(&doc, &font_dict);

        assert_eq!(font.base_font_name, "Helvetica");
        assert_eq!(font.ascent, 700.0);
        assert_eq!(font.descent, -210.0);
        assert_eq!(font.glyph_width(65), 600.0);
        assert_eq!(font.glyph_width(66), 700.0);
        // ToUnicode (0x41 -> "B") outranks the WinAnsi named encoding.
        assert_eq!(font.character_identifier_to_unicode(65), Some("B".to_string()));
        // cid 67 has no ToUnicode entry, falls back to WinAnsi.
        assert_eq!(font.character_identifier_to_unicode(67), Some("C".to_string()));
    }

    #[test]
    fn from_dictionary_defaults_when_entries_absent() {
        let doc = Document::new();
        let mut font_dict = Dictionary::new();
        font_dict.insert("Type", Value::name("Font"));
        font_dict.insert("Subtype", Value::name("Type1"));
        font_dict.insert("BaseFont", Value::name("Courier"));

        let font = Type1Font::from_dictionary(&doc, &font_dict);
        assert_eq!(font.base_font_name, "Courier");
        assert_eq!(font.named_encoding, Some(NamedEncoding::Standard));
    }
}
