//! `cosmic-text` backed surface.
//!
//! Shaping and glyph rasterization come from a shared [`FontContext`]
//! (`FontSystem` + `SwashCache`), so many surfaces can live in one canvas
//! pool without each loading the system font database.
//!
//! Strokes are emulated by dilating the glyph coverage with a disc of half
//! the line width, which gives round joins.

use std::cell::RefCell;
use std::rc::Rc;

use cosmic_text::{
    Attrs, Buffer, Color as CColor, Family, FontSystem, Metrics, Shaping, Style as CStyle,
    SwashCache, Weight,
};

use super::raster::{disc_offsets, CoverageMask, PixelBuffer};
use super::{Bitmap, Font, LineJoin, ShadowStyle, StrokeStyle, Surface, TextAlign};
use crate::style::Color;

/// Shaping and rasterization state shared between surfaces.
pub struct FontContext {
    pub font_system: FontSystem,
    pub swash_cache: SwashCache,
}

pub type SharedFonts = Rc<RefCell<FontContext>>;

impl FontContext {
    /// Font context with system font discovery.
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    pub fn shared() -> SharedFonts {
        Rc::new(RefCell::new(Self::new()))
    }
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Map the first family of a CSS family list to a cosmic-text family.
fn resolve_family(family: &str) -> Family<'_> {
    let first = family
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
        .find(|f| !f.is_empty())
        .unwrap_or("sans-serif");
    match first.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" => Family::SansSerif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(first),
    }
}

pub struct CosmicSurface {
    fonts: SharedFonts,
    pixels: PixelBuffer,
    font: Font,
    align: TextAlign,
    fill: Color,
    stroke: StrokeStyle,
    shadow: Option<ShadowStyle>,
}

impl CosmicSurface {
    pub fn new(fonts: SharedFonts) -> Self {
        Self {
            fonts,
            pixels: PixelBuffer::new(0, 0),
            font: Font::default(),
            align: TextAlign::Left,
            fill: Color::BLACK,
            stroke: StrokeStyle::default(),
            shadow: None,
        }
    }

    /// Shaping size. cosmic-text needs a positive size, tiny fonts are
    /// shaped at 1px and scaled back.
    fn shaping_size(&self) -> f32 {
        self.font.size.max(1.0)
    }

    /// Factor from shaped units back to the requested font size.
    fn shaping_scale(&self) -> f32 {
        self.font.size.max(0.0) / self.shaping_size()
    }

    fn shape(&self, ctx: &mut FontContext, text: &str) -> Buffer {
        let size = self.shaping_size();
        let mut buffer = Buffer::new(&mut ctx.font_system, Metrics::new(size, size * 1.2));
        buffer.set_size(&mut ctx.font_system, None, None);

        let weight = if self.font.bold {
            Weight::BOLD
        } else {
            Weight::NORMAL
        };
        let style = if self.font.italic {
            CStyle::Italic
        } else {
            CStyle::Normal
        };
        let attrs = Attrs::new()
            .family(resolve_family(&self.font.family))
            .weight(weight)
            .style(style);
        buffer.set_text(&mut ctx.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut ctx.font_system, false);
        buffer
    }

    fn paint_text(&mut self, text: &str, x: f32, y: f32, color: Color, radius: f32) {
        let scale = self.shaping_scale();
        let mut guard = self.fonts.borrow_mut();
        let ctx = &mut *guard;
        let buffer = self.shape(ctx, text);
        let Some((width, baseline)) = buffer
            .layout_runs()
            .next()
            .map(|r| (r.line_w * scale, r.line_y * scale))
        else {
            return;
        };
        let left = match self.align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let origin = (left.round() as i32, (y - baseline).round() as i32);

        // Collect coverage once, then paint it for the shadow and the body.
        let mut glyphs = CoverageMask::default();
        buffer.draw(
            &mut ctx.font_system,
            &mut ctx.swash_cache,
            CColor::rgba(255, 255, 255, 255),
            |gx, gy, w, h, c| {
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        let px = ((gx + dx) as f32 * scale).floor() as i32;
                        let py = ((gy + dy) as f32 * scale).floor() as i32;
                        glyphs.stamp(px, py, c.a());
                    }
                }
            },
        );
        drop(guard);

        let coverage = glyphs.dilate(&disc_offsets(radius));
        let shadow = self.shadow;
        self.pixels
            .paint_shadowed(shadow.as_ref(), color, |target, color, sx, sy| {
                let (ox, oy) = (origin.0 + sx.round() as i32, origin.1 + sy.round() as i32);
                for (px, py, alpha) in coverage.iter() {
                    target.blend(ox + px, oy + py, color, alpha);
                }
            });
    }
}

impl Surface for CosmicSurface {
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
        let mut guard = self.fonts.borrow_mut();
        let buffer = self.shape(&mut guard, text);
        let width = buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max);
        width * self.shaping_scale()
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.pixels.clear_rect(x, y, width, height);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.pixels.fill_rect(x, y, width, height, self.fill);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.paint_text(text, x, y, self.fill, 0.0);
    }

    fn stroke_text(&mut self, text: &str, x: f32, y: f32) {
        let stroke = self.stroke;
        self.paint_text(text, x, y, stroke.color, stroke.line_width / 2.0);
    }

    fn to_bitmap(&self) -> Bitmap {
        self.pixels.to_bitmap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_family() {
        assert_eq!(resolve_family("serif"), Family::Serif);
        assert_eq!(resolve_family("'Open Sans', Arial"), Family::Name("Open Sans"));
        assert_eq!(resolve_family(""), Family::SansSerif);
    }

    #[test]
    fn test_resize_clears() {
        let mut surface = CosmicSurface::new(FontContext::shared());
        surface.resize(8, 4);
        surface.set_fill_color(Color::WHITE);
        surface.fill_rect(0.0, 0.0, 8.0, 4.0);
        surface.resize(8, 4);
        assert!(surface.to_bitmap().data.iter().all(|&b| b == 0));
        assert_eq!((surface.width(), surface.height()), (8, 4));
    }

    #[test]
    fn test_sub_pixel_fonts_scale_back() {
        let mut surface = CosmicSurface::new(FontContext::shared());
        surface.set_font(&Font::new(0.5, "sans-serif"));
        assert_eq!(surface.shaping_size(), 1.0);
        assert_eq!(surface.shaping_scale(), 0.5);
        surface.set_font(&Font::new(16.0, "sans-serif"));
        assert_eq!(surface.shaping_scale(), 1.0);
    }

    #[test]
    fn test_measure_empty_text_is_zero() {
        let mut surface = CosmicSurface::new(FontContext::shared());
        surface.set_font(&Font::new(16.0, "sans-serif"));
        assert_eq!(surface.measure_text(""), 0.0);
    }
}
