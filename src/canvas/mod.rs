//! Content-stream interpreter: a stack machine that reads tokens from a
//! `crate::tokenizer::Tokenizer`, dispatches operators against an operand
//! stack and a graphics-state stack, and fans out text-render events to
//! registered `EventListener`s.
//!
//! Grounded on `ptext/pdf/canvas/canvas.py`'s `read()` loop from the
//! teacher's Python ancestor: an operand stack fed until an operator name
//! arrives, arity-checked lookup in an operator table, and a
//! `BX`/`EX`-scoped compatibility mode that swallows unknown operators and
//! operator errors rather than aborting the whole stream.

pub mod event;
pub mod graphics_state;
pub mod matrix;

use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::error::*;
use crate::primitive::Value;
use crate::tokenizer::{Token, Tokenizer};

pub use event::{ChunkOfTextRenderEvent, EventListener, Rectangle, SharedListener, TextFont};
pub use graphics_state::{Color, GraphicsState, RenderingMode};
pub use matrix::Matrix;

#[derive(Debug, Clone, Copy)]
struct OperatorSpec {
    arity: usize,
}

/// The full PDF 1.7 content-stream operator set (Table 51), with the
/// operand count `Canvas::read` enforces before dispatch. Operators this
/// crate has no further use for (path construction/painting, clipping,
/// color, XObjects, inline images, marked-content property lists,
/// rendering intent/flatness/line style) are still registered so their
/// operands are consumed correctly and arity errors are still caught --
/// this crate's Non-goal is rendering to pixels, not the bookkeeping
/// around these operators.
fn operator_table() -> &'static HashMap<&'static str, OperatorSpec> {
    static TABLE: Lazy<HashMap<&'static str, OperatorSpec>> = Lazy::new(|| {
        let specs: &[(&str, usize)] = &[
            // graphics state
            ("q", 0), ("Q", 0), ("cm", 6), ("w", 1), ("J", 1), ("j", 1), ("M", 1),
            ("d", 2), ("ri", 1), ("i", 1), ("gs", 1),
            // path construction
            ("m", 2), ("l", 2), ("c", 6), ("v", 4), ("y", 4), ("h", 0), ("re", 4),
            // path painting
            ("S", 0), ("s", 0), ("f", 0), ("F", 0), ("f*", 0), ("B", 0), ("B*", 0),
            ("b", 0), ("b*", 0), ("n", 0),
            // clipping
            ("W", 0), ("W*", 0),
            // color
            ("CS", 1), ("cs", 1), ("SC", 1), ("sc", 1), ("SCN", 1), ("scn", 1),
            ("G", 1), ("g", 1), ("RG", 3), ("rg", 3), ("K", 4), ("k", 4),
            // text object
            ("BT", 0), ("ET", 0),
            // text state
            ("Tc", 1), ("Tw", 1), ("Tz", 1), ("TL", 1), ("Tf", 2), ("Tr", 1), ("Ts", 1),
            // text positioning
            ("Td", 2), ("TD", 2), ("Tm", 6), ("T*", 0),
            // text showing
            ("Tj", 1), ("'", 1), ("\"", 3), ("TJ", 1),
            // type 3 fonts
            ("d0", 2), ("d1", 6),
            // marked content
            ("MP", 1), ("DP", 2), ("BMC", 1), ("BDC", 2), ("EMC", 0),
            // compatibility
            ("BX", 0), ("EX", 0),
            // XObjects / shading / inline images
            ("Do", 1), ("sh", 1), ("BI", 0), ("ID", 0), ("EI", 0),
        ];
        specs.iter().map(|(name, arity)| (*name, OperatorSpec { arity: *arity })).collect()
    });
    &TABLE
}

/// The stack machine itself. Owns its graphics-state stack, marked-content
/// stack, registered fonts and event listeners; `read` drains a
/// `Tokenizer` to completion.
pub struct Canvas {
    operand_stack: Vec<Value>,
    graphics_state: GraphicsState,
    graphics_state_stack: Vec<GraphicsState>,
    marked_content_stack: Vec<String>,
    in_text_object: bool,
    in_compatibility_section: bool,
    fonts: HashMap<String, Rc<dyn TextFont>>,
    listeners: Vec<Box<dyn EventListener>>,
}

impl Default for Canvas {
    fn default() -> Canvas {
        Canvas {
            operand_stack: Vec::new(),
            graphics_state: GraphicsState::default(),
            graphics_state_stack: Vec::new(),
            marked_content_stack: Vec::new(),
            in_text_object: false,
            in_compatibility_section: false,
            fonts: HashMap::new(),
            listeners: Vec::new(),
        }
    }
}

impl Canvas {
    pub fn new() -> Canvas {
        Canvas::default()
    }

    pub fn register_font(&mut self, resource_name: impl Into<String>, font: Rc<dyn TextFont>) {
        self.fonts.insert(resource_name.into(), font);
    }

    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn graphics_state(&self) -> &GraphicsState {
        &self.graphics_state
    }

    /// Runs the operand-accumulate / operator-dispatch loop until the
    /// tokenizer is exhausted.
    pub fn read(&mut self, tokenizer: &mut dyn Tokenizer) -> Result<()> {
        loop {
            match tokenizer.next_token()? {
                None => return Ok(()),
                Some(Token::Operand(value)) => self.operand_stack.push(value),
                Some(Token::Operator(name)) => self.dispatch(&name)?,
            }
        }
    }

    fn dispatch(&mut self, name: &str) -> Result<()> {
        let spec = match operator_table().get(name) {
            Some(spec) => *spec,
            None => {
                // Always non-fatal (spec.md §4.4 step 3a, §7): an unrecognized
                // operator is logged and skipped regardless of compatibility
                // mode, matching `ptext/pdf/canvas/canvas.py`'s unconditional
                // `logger.debug(...); continue`.
                log::warn!("unknown content-stream operator {}", name);
                self.operand_stack.clear();
                return Ok(());
            }
        };

        let available = self.operand_stack.len();
        let take = if self.in_compatibility_section { spec.arity.min(available) } else { spec.arity };
        if available < take {
            let err = PdfError::OperandUnderflow { operator: name.to_owned(), expected: spec.arity, found: available };
            if self.in_compatibility_section {
                log::warn!("{}", err);
                self.operand_stack.clear();
                return Ok(());
            }
            return Err(err);
        }
        let operands = self.operand_stack.split_off(available - take);

        let result = self.execute(name, &operands);
        if let Err(e) = result {
            if self.in_compatibility_section {
                log::warn!("swallowed error from {} inside BX/EX section: {}", name, e);
                Ok(())
            } else {
                Err(e)
            }
        } else {
            result
        }
    }

    fn execute(&mut self, name: &str, operands: &[Value]) -> Result<()> {
        match name {
            "q" => {
                self.graphics_state_stack.push(self.graphics_state.clone());
            }
            "Q" => {
                self.graphics_state = self
                    .graphics_state_stack
                    .pop()
                    .ok_or(PdfError::GraphicsStateUnderflow)?;
            }
            "cm" => {
                self.graphics_state.ctm = operands_to_matrix(operands)?.mul(&self.graphics_state.ctm);
            }
            "BX" => self.in_compatibility_section = true,
            "EX" => self.in_compatibility_section = false,
            "BMC" => {
                self.marked_content_stack
                    .push(operands.get(0).and_then(Value::as_name).unwrap_or_default().to_owned());
            }
            "BDC" => {
                self.marked_content_stack
                    .push(operands.get(0).and_then(Value::as_name).unwrap_or_default().to_owned());
            }
            "EMC" => {
                self.marked_content_stack.pop().ok_or(PdfError::MarkedContentUnderflow)?;
            }
            "BT" => {
                if self.in_text_object {
                    return Err(PdfError::NestedTextObject);
                }
                self.in_text_object = true;
                self.graphics_state.text_matrix = Matrix::IDENTITY;
                self.graphics_state.line_matrix = Matrix::IDENTITY;
            }
            "ET" => {
                if !self.in_text_object {
                    return Err(PdfError::TextObjectUnderflow);
                }
                self.in_text_object = false;
            }
            "Tc" => self.graphics_state.char_spacing = number(operands, 0)?,
            "Tw" => self.graphics_state.word_spacing = number(operands, 0)?,
            "Tz" => self.graphics_state.horizontal_scaling = number(operands, 0)?,
            "TL" => self.graphics_state.leading = number(operands, 0)?,
            "Ts" => self.graphics_state.text_rise = number(operands, 0)?,
            "Tr" => {
                let mode = operands.get(0).and_then(Value::as_integer).unwrap_or(0);
                self.graphics_state.rendering_mode = RenderingMode::from_operand(mode);
            }
            "Tf" => {
                self.graphics_state.font_resource_name = operands.get(0).and_then(Value::as_name).map(str::to_owned);
                self.graphics_state.font_size = number(operands, 1)?;
            }
            "Td" => {
                let (tx, ty) = (number(operands, 0)?, number(operands, 1)?);
                self.graphics_state.line_matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty).mul(&self.graphics_state.line_matrix);
                self.graphics_state.text_matrix = self.graphics_state.line_matrix;
            }
            "TD" => {
                let (tx, ty) = (number(operands, 0)?, number(operands, 1)?);
                self.graphics_state.leading = -ty;
                self.graphics_state.line_matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty).mul(&self.graphics_state.line_matrix);
                self.graphics_state.text_matrix = self.graphics_state.line_matrix;
            }
            "T*" => {
                let leading = self.graphics_state.leading;
                self.graphics_state.line_matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, -leading).mul(&self.graphics_state.line_matrix);
                self.graphics_state.text_matrix = self.graphics_state.line_matrix;
            }
            "Tm" => {
                let m = operands_to_matrix(operands)?;
                self.graphics_state.text_matrix = m;
                self.graphics_state.line_matrix = m;
            }
            "Tj" => {
                let codes = string_operand_codes(operands, 0)?;
                self.show_text(&codes);
            }
            "'" => {
                let leading = self.graphics_state.leading;
                self.graphics_state.line_matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, -leading).mul(&self.graphics_state.line_matrix);
                self.graphics_state.text_matrix = self.graphics_state.line_matrix;
                let codes = string_operand_codes(operands, 0)?;
                self.show_text(&codes);
            }
            "\"" => {
                self.graphics_state.word_spacing = number(operands, 0)?;
                self.graphics_state.char_spacing = number(operands, 1)?;
                let leading = self.graphics_state.leading;
                self.graphics_state.line_matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, -leading).mul(&self.graphics_state.line_matrix);
                self.graphics_state.text_matrix = self.graphics_state.line_matrix;
                let codes = string_operand_codes(operands, 2)?;
                self.show_text(&codes);
            }
            "TJ" => {
                if let Some(items) = operands.first().and_then(Value::as_array) {
                    for item in items {
                        if let Some(n) = item.as_number() {
                            let dx = -n.as_f64() / 1000.0 * self.graphics_state.font_size
                                * (self.graphics_state.horizontal_scaling / 100.0);
                            self.graphics_state.text_matrix =
                                Matrix::new(1.0, 0.0, 0.0, 1.0, dx, 0.0).mul(&self.graphics_state.text_matrix);
                        } else if let Some(s) = item.as_string() {
                            let codes: Vec<u32> = s.as_bytes().iter().map(|&b| b as u32).collect();
                            self.show_text(&codes);
                        }
                    }
                }
            }
            "w" => self.graphics_state.line_width = number(operands, 0)?,
            "g" => self.graphics_state.non_stroke_color = Color::Gray(number(operands, 0)?),
            "G" => self.graphics_state.stroke_color = Color::Gray(number(operands, 0)?),
            "rg" => {
                self.graphics_state.non_stroke_color =
                    Color::Rgb(number(operands, 0)?, number(operands, 1)?, number(operands, 2)?)
            }
            "RG" => {
                self.graphics_state.stroke_color =
                    Color::Rgb(number(operands, 0)?, number(operands, 1)?, number(operands, 2)?)
            }
            "k" => {
                self.graphics_state.non_stroke_color =
                    Color::Cmyk(number(operands, 0)?, number(operands, 1)?, number(operands, 2)?, number(operands, 3)?)
            }
            "K" => {
                self.graphics_state.stroke_color =
                    Color::Cmyk(number(operands, 0)?, number(operands, 1)?, number(operands, 2)?, number(operands, 3)?)
            }
            // `sc`/`scn`/`SC`/`SCN` are registered with arity 1 (see
            // `operator_table`): this crate tracks no colorspace-resource
            // table to know how many components a `CS`/`cs`-selected space
            // actually takes, so only the single-component (gray-like) case
            // is represented; a Pattern name operand is simply not a number
            // and leaves the prior color in place.
            "sc" | "scn" => {
                if let Some(n) = operands.get(0).and_then(Value::as_number) {
                    self.graphics_state.non_stroke_color = Color::Gray(n.as_f64());
                }
            }
            "SC" | "SCN" => {
                if let Some(n) = operands.get(0).and_then(Value::as_number) {
                    self.graphics_state.stroke_color = Color::Gray(n.as_f64());
                }
            }
            // Path construction/painting, clipping, XObjects, shading and
            // inline images are out of this crate's scope (no rendering to
            // pixels): operands are already consumed for arity purposes,
            // nothing further to do.
            _ => {}
        }
        Ok(())
    }

    fn show_text(&mut self, codes: &[u32]) {
        let Some(resource_name) = self.graphics_state.font_resource_name.clone() else {
            log::warn!("Tj/TJ with no font selected via Tf, ignoring");
            return;
        };
        let Some(font) = self.fonts.get(&resource_name).cloned() else {
            log::warn!("font resource /{} not registered on this canvas, ignoring", resource_name);
            return;
        };
        let gs = &self.graphics_state;
        let event = ChunkOfTextRenderEvent::new(
            gs.text_matrix,
            gs.ctm,
            font.clone(),
            gs.font_size,
            gs.char_spacing,
            gs.word_spacing,
            gs.horizontal_scaling,
            gs.text_rise,
            gs.non_stroke_color,
            codes,
        );
        for listener in &mut self.listeners {
            listener.on_text_render(&event);
        }
        let total_width: f64 = codes
            .iter()
            .map(|&c| {
                let w0 = font.glyph_width(c) / 1000.0;
                let ws = if c == 32 { gs.word_spacing } else { 0.0 };
                (w0 * gs.font_size + gs.char_spacing + ws) * (gs.horizontal_scaling / 100.0)
            })
            .sum();
        self.graphics_state.text_matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, total_width, 0.0).mul(&self.graphics_state.text_matrix);
    }
}

fn number(operands: &[Value], index: usize) -> Result<f64> {
    operands
        .get(index)
        .and_then(Value::as_number)
        .map(|n| n.as_f64())
        .ok_or(PdfError::UnexpectedValue { expected: "Number", found: "missing operand" })
}

fn operands_to_matrix(operands: &[Value]) -> Result<Matrix> {
    Ok(Matrix::new(
        number(operands, 0)?,
        number(operands, 1)?,
        number(operands, 2)?,
        number(operands, 3)?,
        number(operands, 4)?,
        number(operands, 5)?,
    ))
}

fn string_operand_codes(operands: &[Value], index: usize) -> Result<Vec<u32>> {
    let s = operands
        .get(index)
        .and_then(Value::as_string)
        .ok_or(PdfError::UnexpectedValue { expected: "String", found: "missing operand" })?;
    Ok(s.as_bytes().iter().map(|&b| b as u32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::VecTokenizer;

    fn op(name: &str) -> Token {
        VecTokenizer::operator(name)
    }
    fn operand(v: Value) -> Token {
        VecTokenizer::operand(v)
    }

    #[test]
    fn q_q_balances_graphics_state_stack() {
        let mut canvas = Canvas::new();
        let mut tokenizer = VecTokenizer::new(vec![
            operand(Value::real(2.0)),
            operand(Value::real(0.0)),
            operand(Value::real(0.0)),
            operand(Value::real(2.0)),
            operand(Value::real(0.0)),
            operand(Value::real(0.0)),
            op("cm"),
            op("q"),
            op("Q"),
        ]);
        canvas.read(&mut tokenizer).unwrap();
        assert_eq!(canvas.graphics_state().ctm.a, 2.0);
    }

    #[test]
    fn unbalanced_q_fails() {
        let mut canvas = Canvas::new();
        let mut tokenizer = VecTokenizer::new(vec![op("Q")]);
        assert!(matches!(canvas.read(&mut tokenizer), Err(PdfError::GraphicsStateUnderflow)));
    }

    #[test]
    fn nested_bt_fails() {
        let mut canvas = Canvas::new();
        let mut tokenizer = VecTokenizer::new(vec![op("BT"), op("BT")]);
        assert!(matches!(canvas.read(&mut tokenizer), Err(PdfError::NestedTextObject)));
    }

    #[test]
    fn unbalanced_emc_fails() {
        let mut canvas = Canvas::new();
        let mut tokenizer = VecTokenizer::new(vec![op("EMC")]);
        assert!(matches!(canvas.read(&mut tokenizer), Err(PdfError::MarkedContentUnderflow)));
    }

    #[test]
    fn compatibility_section_swallows_unknown_operator() {
        let mut canvas = Canvas::new();
        let mut tokenizer = VecTokenizer::new(vec![op("BX"), op("ZzUnknown"), op("EX")]);
        assert!(canvas.read(&mut tokenizer).is_ok());
    }

    #[test]
    fn unknown_operator_outside_compatibility_is_logged_and_skipped() {
        let mut canvas = Canvas::new();
        let mut tokenizer = VecTokenizer::new(vec![op("ZzUnknown")]);
        assert!(canvas.read(&mut tokenizer).is_ok());
    }

    #[test]
    fn short_operand_list_in_compatibility_section_does_not_panic() {
        let mut canvas = Canvas::new();
        // `BMC` needs one operand; inside `BX`/`EX` the stream supplies none.
        let mut tokenizer = VecTokenizer::new(vec![op("BX"), op("BMC"), op("EX")]);
        assert!(canvas.read(&mut tokenizer).is_ok());
    }

    #[test]
    fn color_operators_update_graphics_state() {
        let mut canvas = Canvas::new();
        let mut tokenizer = VecTokenizer::new(vec![
            operand(Value::real(2.0)),
            op("w"),
            operand(Value::real(1.0)),
            operand(Value::real(0.0)),
            operand(Value::real(0.0)),
            op("rg"),
        ]);
        canvas.read(&mut tokenizer).unwrap();
        assert_eq!(canvas.graphics_state().line_width, 2.0);
        assert_eq!(canvas.graphics_state().non_stroke_color, Color::Rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn operand_underflow_fails_outside_compatibility() {
        let mut canvas = Canvas::new();
        // `re` needs 4 operands, only 1 is pushed.
        let mut tokenizer = VecTokenizer::new(vec![operand(Value::integer(1)), op("re")]);
        assert!(matches!(canvas.read(&mut tokenizer), Err(PdfError::OperandUnderflow { .. })));
    }
}
