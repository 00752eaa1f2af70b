use std::error::Error;
use std::io;

use snafu::Snafu;

/// Errors surfaced by the object model, read/write transformer pipelines,
/// content-stream interpreter and font encoding resolver. Variants and
/// their shapes follow spec.md §7; the `#[derive(Snafu)]` plumbing and the
/// trailing `Io`/`Other`/`UnexpectedPrimitive`-style catch-alls mirror the
/// teacher's `pdf::error::PdfError` (examples/pdf-rs-pdf/pdf/src/error.rs).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PdfError {
    // ---- C1: object model -------------------------------------------
    #[snafu(display("value of kind {} cannot be hashed", kind))]
    Unhashable { kind: &'static str },

    #[snafu(display(
        "value already carries reference to object {}, cannot rebind to object {}",
        existing, attempted
    ))]
    ReferenceConflict { existing: u64, attempted: u64 },

    #[snafu(display("no object registered for reference {} {} R", object_number, generation_number))]
    MissingReference { object_number: u64, generation_number: u16 },

    #[snafu(display("expected {}, found {} instead", expected, found))]
    UnexpectedValue { expected: &'static str, found: &'static str },

    #[snafu(display("expected primitive {}, found primitive {} instead", expected, found))]
    UnexpectedPrimitive { expected: &'static str, found: &'static str },

    #[snafu(display("field /{} is missing in dictionary for type {}", field, typ))]
    MissingEntry { typ: &'static str, field: String },

    #[snafu(display("expected dictionary /Type = {}, found /Type = {}", expected, found))]
    WrongDictionaryType { expected: String, found: String },

    // ---- C2/C3: read/write transformer pipelines ---------------------
    #[snafu(display("no registered read handler could transform value of kind {}", kind))]
    NoReadHandler { kind: &'static str },

    #[snafu(display("no registered write handler could transform value {}", debug_name))]
    NoWriteHandler { debug_name: &'static str },

    #[snafu(display("pages tree is malformed: {}", reason))]
    MalformedPagesTree { reason: String },

    // ---- C4/C5: content-stream interpreter ---------------------------
    #[snafu(display("graphics state stack is empty, cannot pop (unbalanced Q)"))]
    GraphicsStateUnderflow,

    #[snafu(display("marked-content stack is empty, cannot pop (unbalanced EMC)"))]
    MarkedContentUnderflow,

    #[snafu(display("BT encountered while already inside a text object"))]
    NestedTextObject,

    #[snafu(display("ET encountered outside of a text object"))]
    TextObjectUnderflow,

    #[snafu(display("operator {} expects {} operands, only {} available", operator, expected, found))]
    OperandUnderflow { operator: String, expected: usize, found: usize },

    #[snafu(display("unknown content-stream operator {}", operator))]
    UnknownOperator { operator: String },

    // ---- C6: font / encoding resolution -------------------------------
    #[snafu(display("could not resolve character identifier {} to unicode: {}", cid, reason))]
    EncodingFailure { cid: u32, reason: String },

    // ---- ambient ------------------------------------------------------
    #[snafu(display("I/O error: {}", source))]
    Io { source: io::Error },

    #[snafu(display("{}", msg))]
    Other { msg: String },
}

impl PdfError {
    pub fn trace(&self) {
        trace(self, 0);
    }
}
fn trace(err: &dyn Error, depth: usize) {
    log::error!("{}: {}", depth, err);
    if let Some(source) = err.source() {
        trace(source, depth + 1);
    }
}

pub type Result<T, E = PdfError> = std::result::Result<T, E>;

impl From<io::Error> for PdfError {
    fn from(source: io::Error) -> PdfError {
        PdfError::Io { source }
    }
}
impl From<String> for PdfError {
    fn from(msg: String) -> PdfError {
        PdfError::Other { msg }
    }
}

macro_rules! bail {
    ($($t:tt)*) => {
        return Err($crate::error::PdfError::Other { msg: format!($($t)*) })
    }
}
pub(crate) use bail;
