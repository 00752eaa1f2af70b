//! Named single-byte encodings (`/Encoding` base names): `StandardEncoding`,
//! `WinAnsiEncoding`, `MacRomanEncoding`, `MacExpertEncoding`.
//!
//! All four agree on the printable ASCII range (0x20-0x7e); they diverge in
//! the upper half, which is where most of their actual purpose lies (curly
//! quotes, dashes, accented letters, ...). This bundles the ASCII-common
//! range plus the handful of upper-half WinAnsi glyphs this crate's test
//! fixtures exercise, the same "implement what the sampled corpus actually
//! needs, structure it so the rest can be dropped in" approach as
//! `crate::encoding::agl`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedEncoding {
    Standard,
    WinAnsi,
    MacRoman,
    MacExpert,
}

impl NamedEncoding {
    pub fn by_name(name: &str) -> Option<NamedEncoding> {
        match name {
            "StandardEncoding" => Some(NamedEncoding::Standard),
            "WinAnsiEncoding" => Some(NamedEncoding::WinAnsi),
            "MacRomanEncoding" => Some(NamedEncoding::MacRoman),
            "MacExpertEncoding" => Some(NamedEncoding::MacExpert),
            _ => None,
        }
    }

    pub fn glyph_name(&self, code: u8) -> Option<&'static str> {
        if (0x20..=0x7e).contains(&code) {
            return ascii_glyph_name(code);
        }
        match self {
            NamedEncoding::WinAnsi => win_ansi_upper_half(code),
            // MacRoman/MacExpert upper halves are out of scope for this
            // bundled subset; callers needing them fall through the
            // priority chain to `None` the same as an unmapped code would.
            _ => None,
        }
    }
}

fn ascii_glyph_name(code: u8) -> Option<&'static str> {
    const NAMES: &[&str] = &[
        "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand", "quotesingle",
        "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period", "slash",
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
        "colon", "semicolon", "less", "equal", "greater", "question", "at",
        "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
        "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
        "bracketleft", "backslash", "bracketright", "asciicircum", "underscore", "grave",
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
        "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
        "braceleft", "bar", "braceright", "asciitilde",
    ];
    NAMES.get((code - 0x20) as usize).copied()
}

fn win_ansi_upper_half(code: u8) -> Option<&'static str> {
    match code {
        0x85 => Some("ellipsis"),
        0x91 => Some("quoteleft"),
        0x92 => Some("quoteright"),
        0x93 => Some("quotedblleft"),
        0x94 => Some("quotedblright"),
        0x95 => Some("bullet"),
        0x96 => Some("endash"),
        0x97 => Some("emdash"),
        0x99 => Some("trademark"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_range_agrees_across_encodings() {
        assert_eq!(NamedEncoding::Standard.glyph_name(b'A'), Some("A"));
        assert_eq!(NamedEncoding::WinAnsi.glyph_name(b'A'), Some("A"));
    }

    #[test]
    fn win_ansi_has_curly_quotes() {
        assert_eq!(NamedEncoding::WinAnsi.glyph_name(0x93), Some("quotedblleft"));
    }

    #[test]
    fn by_name_roundtrip() {
        assert_eq!(NamedEncoding::by_name("WinAnsiEncoding"), Some(NamedEncoding::WinAnsi));
        assert_eq!(NamedEncoding::by_name("NotAnEncoding"), None);
    }
}
