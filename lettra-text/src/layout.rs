//! Layout descriptor (caller input plus per-pass derived state) and the
//! layout output written by the processing engine.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size, Vec2};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

/// What happens when text does not fit the label box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Overflow {
    /// The box grows to the text.
    #[default]
    None,
    /// Text is cut at the box edges.
    Clamp,
    /// The font shrinks until the text fits.
    Shrink,
    /// The box height follows the text, width stays.
    ResizeHeight,
}

/// Paragraph layout parameters.
///
/// Fields after `spacing_x` are recomputed on every pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutDescriptor {
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    pub overflow: Overflow,
    pub wrapping: bool,
    /// Line height in points of the style font size; 0 means "font size".
    pub line_height: f32,
    /// Extra advance added after every glyph.
    pub spacing_x: f32,

    #[serde(skip)]
    pub max_line_width: f32,
    #[serde(skip)]
    pub text_width_temp: f32,
    #[serde(skip)]
    pub text_height_temp: f32,
    #[serde(skip)]
    pub lines_width: Vec<f32>,
    #[serde(skip)]
    pub lines_offset_x: Vec<f32>,
    #[serde(skip)]
    pub horizontal_kerning: Vec<f32>,
    #[serde(skip)]
    pub number_of_lines: usize,
    #[serde(skip)]
    pub text_desired_height: f32,
    #[serde(skip)]
    pub letter_offset_y: f32,
    #[serde(skip)]
    pub tailored_top_y: f32,
    #[serde(skip)]
    pub tailored_bottom_y: f32,
}

impl LayoutDescriptor {
    pub fn new(overflow: Overflow, wrapping: bool) -> Self {
        Self {
            overflow,
            wrapping,
            ..Default::default()
        }
    }

    pub fn aligned(mut self, horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        self.horizontal_align = horizontal;
        self.vertical_align = vertical;
        self
    }

    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }
}

/// Sizes and strings produced by a processing pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutOutput {
    /// Label box. Input on entry, resolved logical size on exit.
    pub node_content_size: Size,
    /// Pixel size of the rasterization canvas (canvas path).
    pub canvas_size: Size,
    /// `x`/`y` = left/top padding, `width`/`height` = total padding.
    pub canvas_padding: Rect,
    /// Extra logical size the effects add to the box.
    pub content_size_extend: Size,
    /// Baseline of the first line on the canvas.
    pub start_position: Vec2,
    /// Lines after wrapping.
    pub parsed_string: Vec<String>,
}

impl LayoutOutput {
    pub fn with_content_size(width: f32, height: f32) -> Self {
        Self {
            node_content_size: Size::new(width, height),
            ..Default::default()
        }
    }
}
