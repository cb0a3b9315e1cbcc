//! Drawing surfaces.
//!
//! The engine never talks to a font rasterizer directly. Everything it
//! needs (measuring, filling, stroking, shadows, reading pixels back) goes
//! through the [`Surface`] trait:
//!
//! ```text
//!  TextProcessing ──┐
//!                   ├──► dyn Surface ──► FixedPitchSurface (headless, deterministic)
//!  Letter raster ───┘                └─► CosmicSurface     (cosmic-text + swash)
//! ```
//!
//! Both backends paint into the same RGBA [`PixelBuffer`](raster::PixelBuffer).

pub mod cosmic;
pub mod fixed;
pub(crate) mod raster;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::HorizontalAlign;
use crate::style::Color;

pub use cosmic::{CosmicSurface, FontContext, SharedFonts};
pub use fixed::{DrawStats, FixedPitchSurface};

// ── Font ────────────────────────────────────────────────────────────

/// A resolved font description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub size: f32,
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self::new(40.0, "Arial")
    }
}

impl Font {
    pub fn new(size: f32, family: impl Into<String>) -> Self {
        Self {
            size,
            family: family.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Same face at `size * scale`.
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            size: self.size * scale,
            ..self.clone()
        }
    }
}

/// CSS font shorthand, e.g. `italic bold 40px Arial`.
impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.italic {
            f.write_str("italic ")?;
        }
        if self.bold {
            f.write_str("bold ")?;
        }
        write!(f, "{}px {}", self.size, self.family)
    }
}

// ── Drawing state ───────────────────────────────────────────────────

/// Anchor of `fill_text`/`stroke_text` relative to the given x.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl From<HorizontalAlign> for TextAlign {
    fn from(align: HorizontalAlign) -> Self {
        match align {
            HorizontalAlign::Left => Self::Left,
            HorizontalAlign::Center => Self::Center,
            HorizontalAlign::Right => Self::Right,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Shadow in surface space (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowStyle {
    pub color: Color,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StrokeStyle {
    pub color: Color,
    pub line_width: f32,
    pub line_join: LineJoin,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            line_width: 1.0,
            line_join: LineJoin::Miter,
        }
    }
}

// ── Bitmap ──────────────────────────────────────────────────────────

/// Straight-alpha RGBA8 pixels read back from a surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels().get((y * self.width + x) as usize).copied()
    }
}

// ── Surface trait ───────────────────────────────────────────────────

/// A 2D drawing surface able to measure and paint single lines of text.
///
/// Text is always positioned on its alphabetic baseline.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Resize the backing store. Always clears it.
    fn resize(&mut self, width: u32, height: u32);

    fn font(&self) -> &Font;
    fn set_font(&mut self, font: &Font);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_fill_color(&mut self, color: Color);
    fn set_stroke(&mut self, color: Color, line_width: f32, line_join: LineJoin);
    fn set_shadow(&mut self, shadow: Option<ShadowStyle>);

    /// Advance width of `text` in the current font.
    fn measure_text(&mut self, text: &str) -> f32;

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
    fn stroke_text(&mut self, text: &str, x: f32, y: f32);

    fn to_bitmap(&self) -> Bitmap;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_shorthand() {
        assert_eq!(Font::new(40.0, "Arial").to_string(), "40px Arial");
        assert_eq!(
            Font::new(12.5, "Verdana").bold(true).italic(true).to_string(),
            "italic bold 12.5px Verdana"
        );
    }

    #[test]
    fn test_font_scaled_keeps_face() {
        let font = Font::new(20.0, "Arial").bold(true);
        let big = font.scaled(2.0);
        assert_eq!(big.size, 40.0);
        assert!(big.bold);
        assert_eq!(big.family, "Arial");
    }

    #[test]
    fn test_bitmap_pixel_bounds() {
        let mut bitmap = Bitmap::new(2, 2);
        bitmap.data[4..8].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(bitmap.pixel(1, 0), Some([1, 2, 3, 4]));
        assert_eq!(bitmap.pixel(2, 0), None);
        assert!(!bitmap.is_empty());
        assert!(Bitmap::new(0, 5).is_empty());
    }
}
