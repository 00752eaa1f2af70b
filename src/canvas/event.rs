//! Text-render events emitted by `Canvas` while executing `Tj`/`TJ`/`'`/`"`
//! (spec.md §4.5), and the reading-order comparator used to sort them.
//!
//! Grounded directly on the teacher's Python ancestor,
//! `ptext/pdf/canvas/event/chunk_of_text_render_event.py`: baseline
//! bounding box from `text_matrix.mul(ctm)`, the same "does this text
//! contain a descender letter" heuristic in place of real font descent
//! metrics, and the same `LeftToRightComparator` rounding rule.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::canvas::graphics_state::Color;
use crate::canvas::matrix::Matrix;

/// Minimal font surface the event builder needs. Implemented by
/// `crate::encoding::Type1Font`; kept as a trait here so `crate::canvas`
/// does not need to depend on `crate::encoding`'s concrete types.
pub trait TextFont {
    /// Glyph advance width in glyph space (thousandths of an em).
    fn glyph_width(&self, code: u32) -> f64;
    /// Font's nominal ascent, in glyph space.
    fn ascent(&self) -> f64;
    /// Font's nominal descent (negative), in glyph space.
    fn descent(&self) -> f64;
    /// Character identifier -> Unicode, per `crate::encoding`'s resolver.
    fn to_unicode(&self, code: u32) -> Option<String>;
    /// Estimated width of a space character, in unscaled text space,
    /// mirroring `Font.get_space_character_width_estimate()` in the
    /// teacher's Python ancestor.
    fn space_width_estimate(&self) -> f64 {
        self.glyph_width(32) / 1000.0
    }
}

/// Axis-aligned rectangle in unrotated PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

/// Displacement a single glyph contributes to the text matrix, per the PDF
/// 9.4.3 glyph-positioning equation:
/// `(w0/1000 * Tfs + Tc + Tw) * Th`.
fn glyph_displacement(
    font: &dyn TextFont,
    code: u32,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
) -> f64 {
    let w0 = font.glyph_width(code) / 1000.0;
    let extra_word_spacing = if code == 32 { word_spacing } else { 0.0 };
    (w0 * font_size + char_spacing + extra_word_spacing) * (horizontal_scaling / 100.0)
}

/// One run of text shown by a single `Tj`/`TJ`/`'`/`"` invocation (or, after
/// `split_on_glyphs`, a single glyph within that run). Carries the font it
/// was shown with, the font size, the non-stroke color it was painted in
/// (PDF text is filled with the non-stroke color by default), and an
/// estimate of how wide a space character would render at this font size --
/// useful to a listener reconstructing word boundaries from glyph runs.
#[derive(Clone)]
pub struct ChunkOfTextRenderEvent {
    pub text: String,
    pub codes: Vec<u32>,
    pub bounding_box: Rectangle,
    pub font: Rc<dyn TextFont>,
    pub font_size: f64,
    pub font_color: Color,
    pub space_character_width_estimate: f64,
}

impl ChunkOfTextRenderEvent {
    /// Builds the event for `codes` shown with `text_matrix` composed
    /// against `ctm`, per the teacher ancestor's `__init__`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text_matrix: Matrix,
        ctm: Matrix,
        font: Rc<dyn TextFont>,
        font_size: f64,
        char_spacing: f64,
        word_spacing: f64,
        horizontal_scaling: f64,
        text_rise: f64,
        font_color: Color,
        codes: &[u32],
    ) -> ChunkOfTextRenderEvent {
        let m = text_matrix.mul(&ctm);

        let total_width: f64 = codes
            .iter()
            .map(|&c| glyph_displacement(font.as_ref(), c, font_size, char_spacing, word_spacing, horizontal_scaling))
            .sum();

        let ascent = font.ascent() * 0.001 * font_size;
        let (llx, lly) = m.apply(0.0, text_rise);
        let (urx, ury) = m.apply(total_width, text_rise + ascent);

        let text: String = codes.iter().filter_map(|&c| font.to_unicode(c)).collect();
        let has_descender = text.to_lowercase().chars().any(|c| "ypqfgj".contains(c));
        let lly = if has_descender {
            let descent = font.descent() * 0.001 * font_size;
            let (_, descended_y) = m.apply(0.0, text_rise + descent);
            lly.min(descended_y)
        } else {
            lly
        };

        let space_character_width_estimate = font.space_width_estimate() * font_size;

        ChunkOfTextRenderEvent {
            text,
            codes: codes.to_vec(),
            bounding_box: Rectangle { llx: llx.min(urx), lly, urx: llx.max(urx), ury: ury.max(lly) },
            font,
            font_size,
            font_color,
            space_character_width_estimate,
        }
    }

    /// Decomposes this run into one event per glyph, each with its own
    /// (advanced) text matrix -- mirrors
    /// `ChunkOfTextRenderEvent.split_on_glyphs`.
    #[allow(clippy::too_many_arguments)]
    pub fn split_on_glyphs(
        text_matrix: Matrix,
        ctm: Matrix,
        font: Rc<dyn TextFont>,
        font_size: f64,
        char_spacing: f64,
        word_spacing: f64,
        horizontal_scaling: f64,
        text_rise: f64,
        font_color: Color,
        codes: &[u32],
    ) -> Vec<ChunkOfTextRenderEvent> {
        let mut events = Vec::with_capacity(codes.len());
        let mut running = text_matrix;
        for &code in codes {
            events.push(ChunkOfTextRenderEvent::new(
                running,
                ctm,
                font.clone(),
                font_size,
                char_spacing,
                word_spacing,
                horizontal_scaling,
                text_rise,
                font_color,
                &[code],
            ));
            let dx = glyph_displacement(font.as_ref(), code, font_size, char_spacing, word_spacing, horizontal_scaling);
            running = Matrix::new(1.0, 0.0, 0.0, 1.0, dx, 0.0).mul(&running);
        }
        events
    }
}

/// Anything that wants to observe text as `Canvas` executes a content
/// stream. Listeners are fanned out to in registration order (spec.md
/// §4.5's "fan-out", not a priority queue).
pub trait EventListener {
    fn on_text_render(&mut self, event: &ChunkOfTextRenderEvent);
}

/// A listener shared between the read pipeline (which attaches it to a
/// `Document` object at read time, spec.md §4.2) and a `Canvas` (which
/// fans events out to it while executing a content stream). `Rc<RefCell<_>>`
/// rather than `Box<_>` because the same listener instance needs to be
/// reachable from both the registry on `Document` and whatever constructs
/// the `Canvas` that eventually drives it.
pub type SharedListener = Rc<RefCell<dyn EventListener>>;

/// Reading-order comparator: rounds the baseline `y` down to the nearest 5
/// units (so glyphs on the same visual line of body text compare equal on
/// `y` despite tiny baseline jitter), then orders by ascending `x` within a
/// line and by descending `y` across lines. Ported from
/// `LeftToRightComparator.cmp` in the teacher's Python ancestor.
pub fn reading_order_cmp(a: &Rectangle, b: &Rectangle) -> Ordering {
    fn bucket(y: f64) -> i64 {
        (y / 5.0).floor() as i64
    }
    let (ay, by) = (bucket(a.lly), bucket(b.lly));
    if ay == by {
        a.llx.partial_cmp(&b.llx).unwrap_or(Ordering::Equal)
    } else {
        by.cmp(&ay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFont;
    impl TextFont for FixedFont {
        fn glyph_width(&self, _code: u32) -> f64 {
            500.0
        }
        fn ascent(&self) -> f64 {
            700.0
        }
        fn descent(&self) -> f64 {
            -200.0
        }
        fn to_unicode(&self, code: u32) -> Option<String> {
            Some((code as u8 as char).to_string())
        }
    }

    #[test]
    fn descender_extends_bounding_box_down() {
        let font: Rc<dyn TextFont> = Rc::new(FixedFont);
        let with_descender = ChunkOfTextRenderEvent::new(
            Matrix::IDENTITY,
            Matrix::IDENTITY,
            font.clone(),
            12.0,
            0.0,
            0.0,
            100.0,
            0.0,
            Color::default(),
            &[b'p' as u32],
        );
        let without = ChunkOfTextRenderEvent::new(
            Matrix::IDENTITY,
            Matrix::IDENTITY,
            font,
            12.0,
            0.0,
            0.0,
            100.0,
            0.0,
            Color::default(),
            &[b'A' as u32],
        );
        assert!(with_descender.bounding_box.lly < without.bounding_box.lly);
    }

    #[test]
    fn event_carries_font_size_color_and_space_width_estimate() {
        let font: Rc<dyn TextFont> = Rc::new(FixedFont);
        let event = ChunkOfTextRenderEvent::new(
            Matrix::IDENTITY,
            Matrix::IDENTITY,
            font,
            12.0,
            0.0,
            0.0,
            100.0,
            0.0,
            Color::Rgb(1.0, 0.0, 0.0),
            &[b'A' as u32],
        );
        assert_eq!(event.font_size, 12.0);
        assert_eq!(event.font_color, Color::Rgb(1.0, 0.0, 0.0));
        assert_eq!(event.space_character_width_estimate, FixedFont.space_width_estimate() * 12.0);
    }

    #[test]
    fn reading_order_sorts_lines_top_to_bottom_then_left_to_right() {
        let mut rects = vec![
            Rectangle { llx: 100.0, lly: 0.0, urx: 110.0, ury: 10.0 },
            Rectangle { llx: 0.0, lly: 100.0, urx: 10.0, ury: 110.0 },
            Rectangle { llx: 0.0, lly: 0.0, urx: 10.0, ury: 10.0 },
        ];
        rects.sort_by(reading_order_cmp);
        assert_eq!(rects[0].lly, 100.0);
        assert_eq!(rects[1].llx, 0.0);
        assert_eq!(rects[2].llx, 100.0);
    }

    #[test]
    fn split_on_glyphs_advances_each_glyph() {
        let font: Rc<dyn TextFont> = Rc::new(FixedFont);
        let events = ChunkOfTextRenderEvent::split_on_glyphs(
            Matrix::IDENTITY,
            Matrix::IDENTITY,
            font,
            12.0,
            0.0,
            0.0,
            100.0,
            0.0,
            Color::default(),
            &[b'A' as u32, b'B' as u32],
        );
        assert_eq!(events.len(), 2);
        assert!(events[1].bounding_box.llx > events[0].bounding_box.llx);
    }
}
