//! Graphics state tracked by `Canvas` while executing a content stream
//! (spec.md §4.5). Pushed/popped wholesale by `q`/`Q`; text-object-scoped
//! fields (`text_matrix`/`line_matrix`) are reset by `BT`.

use crate::canvas::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderingMode {
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}
impl Default for RenderingMode {
    fn default() -> RenderingMode {
        RenderingMode::Fill
    }
}
impl RenderingMode {
    pub fn from_operand(n: i64) -> RenderingMode {
        match n {
            0 => RenderingMode::Fill,
            1 => RenderingMode::Stroke,
            2 => RenderingMode::FillStroke,
            3 => RenderingMode::Invisible,
            4 => RenderingMode::FillClip,
            5 => RenderingMode::StrokeClip,
            6 => RenderingMode::FillStrokeClip,
            _ => RenderingMode::Clip,
        }
    }
}

/// A device color in one of the three colorspace families the color
/// operators (`g`/`rg`/`k` and their stroking `G`/`RG`/`K` counterparts)
/// set directly. `sc`/`scn`/`SC`/`SCN` (an arbitrary, possibly
/// `/ColorSpace`-resource-named space) are approximated as `Gray` here,
/// since this crate tracks no colorspace-resource table to interpret their
/// component count against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Gray(f64),
    Rgb(f64, f64, f64),
    Cmyk(f64, f64, f64, f64),
}
impl Default for Color {
    fn default() -> Color {
        Color::Gray(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix.
    pub ctm: Matrix,
    /// Text matrix, valid only between `BT` and `ET`.
    pub text_matrix: Matrix,
    /// Line matrix (text matrix at the start of the current line).
    pub line_matrix: Matrix,

    pub font_resource_name: Option<String>,
    pub font_size: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
    pub horizontal_scaling: f64,
    pub leading: f64,
    pub text_rise: f64,
    pub rendering_mode: RenderingMode,

    pub stroke_color: Color,
    pub non_stroke_color: Color,
    /// Line width in user space units; PDF's initial value is `1.0`.
    pub line_width: f64,
}

impl Default for GraphicsState {
    fn default() -> GraphicsState {
        GraphicsState {
            ctm: Matrix::IDENTITY,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_resource_name: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            text_rise: 0.0,
            rendering_mode: RenderingMode::Fill,
            stroke_color: Color::default(),
            non_stroke_color: Color::default(),
            line_width: 1.0,
        }
    }
}
