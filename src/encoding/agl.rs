//! Adobe Glyph List: glyph name -> Unicode scalar value.
//!
//! The full AGL maps several thousand names; this bundles the subset this
//! crate actually needs to resolve -- the Basic Latin glyph names that
//! appear in `/Differences` arrays and the named encodings in
//! `crate::encoding::standard` -- as a compile-time static table, structured
//! so the full AGL file can be dropped in later without changing any
//! caller (same shape `Type1Font` uses it through: `agl::lookup`).

use std::collections::HashMap;

use once_cell::sync::Lazy;

static ENTRIES: &[(&str, char)] = &[
    ("space", ' '), ("exclam", '!'), ("quotedbl", '"'), ("numbersign", '#'),
    ("dollar", '$'), ("percent", '%'), ("ampersand", '&'), ("quotesingle", '\''),
    ("parenleft", '('), ("parenright", ')'), ("asterisk", '*'), ("plus", '+'),
    ("comma", ','), ("hyphen", '-'), ("period", '.'), ("slash", '/'),
    ("zero", '0'), ("one", '1'), ("two", '2'), ("three", '3'), ("four", '4'),
    ("five", '5'), ("six", '6'), ("seven", '7'), ("eight", '8'), ("nine", '9'),
    ("colon", ':'), ("semicolon", ';'), ("less", '<'), ("equal", '='),
    ("greater", '>'), ("question", '?'), ("at", '@'),
    ("A", 'A'), ("B", 'B'), ("C", 'C'), ("D", 'D'), ("E", 'E'), ("F", 'F'),
    ("G", 'G'), ("H", 'H'), ("I", 'I'), ("J", 'J'), ("K", 'K'), ("L", 'L'),
    ("M", 'M'), ("N", 'N'), ("O", 'O'), ("P", 'P'), ("Q", 'Q'), ("R", 'R'),
    ("S", 'S'), ("T", 'T'), ("U", 'U'), ("V", 'V'), ("W", 'W'), ("X", 'X'),
    ("Y", 'Y'), ("Z", 'Z'),
    ("bracketleft", '['), ("backslash", '\\'), ("bracketright", ']'),
    ("asciicircum", '^'), ("underscore", '_'), ("grave", '`'),
    ("a", 'a'), ("b", 'b'), ("c", 'c'), ("d", 'd'), ("e", 'e'), ("f", 'f'),
    ("g", 'g'), ("h", 'h'), ("i", 'i'), ("j", 'j'), ("k", 'k'), ("l", 'l'),
    ("m", 'm'), ("n", 'n'), ("o", 'o'), ("p", 'p'), ("q", 'q'), ("r", 'r'),
    ("s", 's'), ("t", 't'), ("u", 'u'), ("v", 'v'), ("w", 'w'), ("x", 'x'),
    ("y", 'y'), ("z", 'z'),
    ("braceleft", '{'), ("bar", '|'), ("braceright", '}'), ("asciitilde", '~'),
    ("bullet", '\u{2022}'), ("emdash", '\u{2014}'), ("endash", '\u{2013}'),
    ("quotedblleft", '\u{201c}'), ("quotedblright", '\u{201d}'),
    ("quoteleft", '\u{2018}'), ("quoteright", '\u{2019}'),
    ("ellipsis", '\u{2026}'), ("trademark", '\u{2122}'),
];

fn table() -> &'static HashMap<&'static str, char> {
    static TABLE: Lazy<HashMap<&'static str, char>> = Lazy::new(|| ENTRIES.iter().copied().collect());
    &TABLE
}

/// Adobe Glyph List lookup. "uniXXXX"/"uXXXX" glyph names (the convention
/// for glyphs with no standard AGL entry) are decoded directly rather than
/// requiring a table entry.
pub fn lookup(glyph_name: &str) -> Option<char> {
    if let Some(hex) = glyph_name.strip_prefix("uni") {
        return u32::from_str_radix(&hex[..hex.len().min(4)], 16).ok().and_then(char::from_u32);
    }
    if let Some(hex) = glyph_name.strip_prefix('u') {
        if hex.len() >= 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    table().get(glyph_name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_named_glyph() {
        assert_eq!(lookup("space"), Some(' '));
        assert_eq!(lookup("A"), Some('A'));
    }

    #[test]
    fn resolves_uniXXXX_glyph() {
        assert_eq!(lookup("uni0041"), Some('A'));
    }

    #[test]
    fn unknown_glyph_is_none() {
        assert_eq!(lookup("thisIsNotAGlyph"), None);
    }
}
