//! Stream filter decoding.
//!
//! Full PDF has a dozen-odd filters (`LZWDecode`, `DCTDecode`, `CCITTFaxDecode`,
//! `JPXDecode`, ...); this crate's scope is the object graph, the content-stream
//! interpreter and font encoding, not image/compression codecs, so only
//! `FlateDecode` -- by far the most common filter wrapping content streams
//! and font programs -- is implemented, via `libflate` the same way the
//! teacher wraps `inflate`/`deflate` in `pdf::enc`. Streams carrying any
//! other filter are returned undecoded rather than erroring, since many
//! callers (e.g. passing an image XObject through unmodified) only need the
//! raw bytes.

use std::io::Read;

use crate::error::*;
use crate::primitive::{Dictionary, Value};

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get("Filter") {
        Some(v) => match &v.kind {
            crate::primitive::ValueKind::Name(n) => vec![n.clone()],
            crate::primitive::ValueKind::Array(items) => {
                items.iter().filter_map(Value::as_name).map(str::to_owned).collect()
            }
            _ => Vec::new(),
        },
        None => Vec::new(),
    }
}

/// Apply the filter chain named in `dict`'s `/Filter` entry to `raw`.
pub fn decode(dict: &Dictionary, raw: &[u8]) -> Result<Vec<u8>> {
    let mut data = raw.to_vec();
    for name in filter_names(dict) {
        data = match name.as_str() {
            "FlateDecode" | "Fl" => flate_decode(&data)?,
            other => {
                log::debug!("filter {} is not implemented, passing stream through undecoded", other);
                data
            }
        };
    }
    Ok(data)
}

fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = libflate::zlib::Decoder::new(data)?;
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filter_passes_through() {
        let mut dict = Dictionary::new();
        dict.insert("Filter", Value::name("DCTDecode"));
        let raw = vec![1, 2, 3];
        assert_eq!(decode(&dict, &raw).unwrap(), raw);
    }

    #[test]
    fn no_filter_passes_through() {
        let dict = Dictionary::new();
        let raw = vec![9, 8, 7];
        assert_eq!(decode(&dict, &raw).unwrap(), raw);
    }
}
