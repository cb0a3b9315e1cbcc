//! Headless fixed-pitch surface.
//!
//! Every character advances by a constant fraction of the font size (CJK
//! characters take a full em) and is painted as a solid box between the
//! cap line and the baseline. Layout results are therefore exact and
//! repeatable, which is what servers, tests and benches want.

use std::cell::Cell;
use std::rc::Rc;

use super::raster::{disc_offsets, PixelBuffer};
use super::{Bitmap, Font, LineJoin, ShadowStyle, StrokeStyle, Surface, TextAlign};
use crate::style::Color;
use crate::text_utils::{is_unicode_cjk, is_unicode_space};

/// Fraction of the em a glyph box rises above the baseline.
const ASCENT_RATIO: f32 = 0.74;

/// Draw-call counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub measure_calls: usize,
    pub fill_text_calls: usize,
    pub stroke_text_calls: usize,
    pub fill_rect_calls: usize,
}

pub struct FixedPitchSurface {
    pixels: PixelBuffer,
    font: Font,
    align: TextAlign,
    fill: Color,
    stroke: StrokeStyle,
    shadow: Option<ShadowStyle>,
    advance_ratio: f32,
    stats: Rc<Cell<DrawStats>>,
}

impl Default for FixedPitchSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedPitchSurface {
    /// Half-em advance for non-CJK characters.
    pub fn new() -> Self {
        Self::with_advance_ratio(0.5)
    }

    pub fn with_advance_ratio(advance_ratio: f32) -> Self {
        Self {
            pixels: PixelBuffer::new(0, 0),
            font: Font::default(),
            align: TextAlign::Left,
            fill: Color::BLACK,
            stroke: StrokeStyle::default(),
            shadow: None,
            advance_ratio,
            stats: Rc::new(Cell::new(DrawStats::default())),
        }
    }

    /// Report draw calls into `stats` (shared with the caller).
    pub fn with_stats(mut self, stats: Rc<Cell<DrawStats>>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> DrawStats {
        self.stats.get()
    }

    fn count(&self, bump: impl FnOnce(&mut DrawStats)) {
        let mut stats = self.stats.get();
        bump(&mut stats);
        self.stats.set(stats);
    }

    fn advance(&self, ch: char) -> f32 {
        let em = if is_unicode_cjk(ch) { 1.0 } else { self.advance_ratio };
        em * self.font.size
    }

    fn text_width(&self, text: &str) -> f32 {
        text.chars().map(|ch| self.advance(ch)).sum()
    }

    fn line_start(&self, text: &str, x: f32) -> f32 {
        match self.align {
            TextAlign::Left => x,
            TextAlign::Center => x - self.text_width(text) / 2.0,
            TextAlign::Right => x - self.text_width(text),
        }
    }

    /// Paint one box per visible character, grown by `grow` on every side.
    fn paint_boxes(&mut self, text: &str, x: f32, y: f32, color: Color, grow: f32) {
        let start = self.line_start(text, x);
        let size = self.font.size;
        let boxes: Vec<(f32, f32)> = text
            .chars()
            .scan(start, |pen, ch| {
                let left = *pen;
                *pen += self.advance(ch);
                Some((ch, left, *pen - left))
            })
            .filter(|(ch, _, _)| !is_unicode_space(*ch))
            .map(|(_, left, width)| (left, width))
            .collect();

        let shadow = self.shadow;
        self.pixels
            .paint_shadowed(shadow.as_ref(), color, |target, color, dx, dy| {
                for &(left, width) in &boxes {
                    target.fill_rect(
                        left - grow + dx,
                        y - size * ASCENT_RATIO - grow + dy,
                        width + grow * 2.0,
                        size * ASCENT_RATIO + grow * 2.0,
                        color,
                    );
                }
            });
    }
}

impl Surface for FixedPitchSurface {
    fn width(&self) -> u32 {
        self.pixels.width
    }

    fn height(&self) -> u32 {
        self.pixels.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.pixels.resize(width, height);
    }

    fn font(&self) -> &Font {
        &self.font
    }

    fn set_font(&mut self, font: &Font) {
        self.font = font.clone();
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.align = align;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_stroke(&mut self, color: Color, line_width: f32, line_join: LineJoin) {
        self.stroke = StrokeStyle {
            color,
            line_width,
            line_join,
        };
    }

    fn set_shadow(&mut self, shadow: Option<ShadowStyle>) {
        self.shadow = shadow;
    }

    fn measure_text(&mut self, text: &str) -> f32 {
        self.count(|s| s.measure_calls += 1);
        self.text_width(text)
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.pixels.clear_rect(x, y, width, height);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.count(|s| s.fill_rect_calls += 1);
        self.pixels.fill_rect(x, y, width, height, self.fill);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.count(|s| s.fill_text_calls += 1);
        self.paint_boxes(text, x, y, self.fill, 0.0);
    }

    fn stroke_text(&mut self, text: &str, x: f32, y: f32) {
        self.count(|s| s.stroke_text_calls += 1);
        let stroke = self.stroke;
        // A box dilated by a disc is the round-joined stroke of that box.
        let grow = disc_offsets(stroke.line_width / 2.0)
            .iter()
            .map(|&(dx, _)| dx as f32)
            .fold(0.0, f32::max);
        self.paint_boxes(text, x, y, stroke.color, grow);
    }

    fn to_bitmap(&self) -> Bitmap {
        self.pixels.to_bitmap()
    }
}
