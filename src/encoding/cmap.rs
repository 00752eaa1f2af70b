//! `ToUnicode` CMap parsing: the first and highest-priority step of the
//! character-identifier-to-Unicode resolution chain (spec.md §4.6).
//!
//! CMaps are themselves tiny PostScript programs; full PostScript isn't in
//! scope here, only the two constructs a `ToUnicode` stream actually uses --
//! `beginbfchar`/`endbfchar` (one code maps to one string) and
//! `beginbfrange`/`endbfrange` (a contiguous range of codes maps to a
//! contiguous run of destination values) -- which is all `can_be_transformed`
//! in the teacher's Python ancestor (`Type1Font._read_to_unicode`) ever
//! looks for either.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    BfChar,
    BfRange,
}

fn hex_token_to_bytes(token: &str) -> Option<Vec<u8>> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    let mut bytes = Vec::with_capacity(inner.len() / 2);
    let chars: Vec<char> = inner.chars().filter(|c| !c.is_whitespace()).collect();
    for pair in chars.chunks(2) {
        let s: String = pair.iter().collect();
        bytes.push(u8::from_str_radix(&s, 16).ok()?);
    }
    Some(bytes)
}

fn bytes_to_code(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn bytes_to_utf16_string(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes.chunks(2).map(|c| (c[0] as u16) << 8 | *c.get(1).unwrap_or(&0) as u16).collect();
    String::from_utf16_lossy(&units)
}

/// Tokenizes `data` into whitespace-separated keywords and `<...>` hex
/// strings, same lexical shape a real CMap/PostScript tokenizer would
/// produce for these two constructs.
fn tokenize(data: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(data);
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_hex = false;
    for c in text.chars() {
        if in_hex {
            current.push(c);
            if c == '>' {
                tokens.push(std::mem::take(&mut current));
                in_hex = false;
            }
        } else if c == '<' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current.push('<');
            in_hex = true;
        } else if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parses a `ToUnicode` CMap stream's decoded payload into a
/// `character_identifier -> unicode text` table.
pub fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    let mut state = State::Idle;
    let mut pending: Vec<Vec<u8>> = Vec::new();

    for token in tokenize(data) {
        match token.as_str() {
            "beginbfchar" => {
                state = State::BfChar;
                pending.clear();
            }
            "endbfchar" => {
                state = State::Idle;
                pending.clear();
            }
            "beginbfrange" => {
                state = State::BfRange;
                pending.clear();
            }
            "endbfrange" => {
                state = State::Idle;
                pending.clear();
            }
            _ => {
                let Some(bytes) = hex_token_to_bytes(&token) else { continue };
                pending.push(bytes);
                match state {
                    State::BfChar if pending.len() == 2 => {
                        let code = bytes_to_code(&pending[0]);
                        map.insert(code, bytes_to_utf16_string(&pending[1]));
                        pending.clear();
                    }
                    State::BfRange if pending.len() == 3 => {
                        let lo = bytes_to_code(&pending[0]);
                        let hi = bytes_to_code(&pending[1]);
                        let dst_base = bytes_to_code(&pending[2]);
                        for code in lo..=hi {
                            let dst = dst_base + (code - lo);
                            if let Some(ch) = char::from_u32(dst) {
                                map.insert(code, ch.to_string());
                            }
                        }
                        pending.clear();
                    }
                    _ => {}
                }
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bfchar_block() {
        let cmap = b"1 beginbfchar\n<0041> <0042>\nendbfchar";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x41), Some(&"B".to_string()));
    }

    #[test]
    fn parses_bfrange_block() {
        let cmap = b"1 beginbfrange\n<0041> <0043> <0061>\nendbfrange";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x41), Some(&"a".to_string()));
        assert_eq!(map.get(&0x42), Some(&"b".to_string()));
        assert_eq!(map.get(&0x43), Some(&"c".to_string()));
    }
}
