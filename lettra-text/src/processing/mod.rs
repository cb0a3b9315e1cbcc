//! Text processing engine.
//!
//! Two rendering strategies share one entry point:
//!
//! ```text
//!                      processing_string            generate_render_info
//!  Canvas ──────► measure / shrink / wrap ─────► rasterize lines ─► upload ─► 1 quad
//!                   (whole string on a surface)
//!
//!  BitmapAtlas ─► kerning / wrap / shrink ─────► per-letter quads (clip, align)
//!     ├─ Letters { atlas, pool }   letters rasterized on demand
//!     └─ Bitmap(&BitmapFont)       pre-baked font atlas
//! ```
//!
//! `processing_string` resolves sizes and line breaks, writing back into the
//! style (`actual_font_size`, `font`, `bmfont_scale`), the layout (derived
//! fields) and the [`LayoutOutput`]. `generate_render_info` turns that into
//! pixels (canvas path) and vertices.

mod bitmap;
mod canvas;

pub use bitmap::LetterInfo;

use crate::atlas::{GlyphDefinition, LetterAtlas, TextureId};
use crate::bitmap_font::{BitmapFont, SpriteFrame};
use crate::config::EngineConfig;
use crate::geometry::Size;
use crate::layout::{LayoutDescriptor, LayoutOutput};
use crate::output::{DescriptorSetCache, RenderOutput};
use crate::pool::CanvasPool;
use crate::style::{LabelInfo, StyleDescriptor};
use crate::surface::Surface;
use crate::text_utils::MeasureCache;

// ── Strategies ──────────────────────────────────────────────────────

/// Where the bitmap path gets its glyphs from.
pub enum GlyphSource<'a> {
    /// Letters rasterized on demand into a shared atlas.
    Letters {
        atlas: &'a mut LetterAtlas,
        pool: &'a mut CanvasPool,
    },
    /// A pre-baked bitmap font.
    Bitmap(&'a BitmapFont),
}

impl GlyphSource<'_> {
    /// Resolve `ch`, rasterizing it on a letter-atlas miss.
    pub(crate) fn resolve(&mut self, ch: char, info: &LabelInfo) -> Option<GlyphDefinition> {
        match self {
            GlyphSource::Letters { atlas, pool } => atlas.lookup(ch, info, pool),
            GlyphSource::Bitmap(font) => font.letter_definition(ch).copied(),
        }
    }

    /// Resolve `ch` without rasterizing.
    pub(crate) fn cached(&self, ch: char, info: &LabelInfo) -> Option<GlyphDefinition> {
        match self {
            GlyphSource::Letters { atlas, .. } => atlas.get_letter(&info.glyph_key(ch)).copied(),
            GlyphSource::Bitmap(font) => font.letter_definition(ch).copied(),
        }
    }

    pub(crate) fn is_bitmap_font(&self) -> bool {
        matches!(self, GlyphSource::Bitmap(_))
    }

    pub(crate) fn texture_id(&self) -> TextureId {
        match self {
            GlyphSource::Letters { atlas, .. } => atlas.texture_id(),
            GlyphSource::Bitmap(font) => font.texture_id(),
        }
    }

    pub(crate) fn texture_size(&self) -> Size {
        match self {
            GlyphSource::Letters { atlas, .. } => {
                Size::new(atlas.width() as f32, atlas.height() as f32)
            }
            GlyphSource::Bitmap(font) => font.texture_size(),
        }
    }

    pub(crate) fn sprite_frame(&self) -> Option<&SpriteFrame> {
        match self {
            GlyphSource::Letters { .. } => None,
            GlyphSource::Bitmap(font) => font.sprite_frame(),
        }
    }

    /// Atlas or font name for diagnostics.
    pub(crate) fn name<'s>(&'s self, info: &'s LabelInfo) -> &'s str {
        match self {
            GlyphSource::Letters { .. } => &info.font.family,
            GlyphSource::Bitmap(font) => font.atlas_name(),
        }
    }
}

/// How a label is turned into pixels.
pub enum RenderStrategy<'a> {
    /// Whole string rasterized into the label's own texture.
    Canvas {
        descriptor_cache: Option<&'a mut dyn DescriptorSetCache>,
    },
    /// One quad per letter sampling a shared atlas.
    BitmapAtlas(GlyphSource<'a>),
}

impl<'a> RenderStrategy<'a> {
    pub fn canvas() -> Self {
        RenderStrategy::Canvas {
            descriptor_cache: None,
        }
    }

    pub fn canvas_with_cache(cache: &'a mut dyn DescriptorSetCache) -> Self {
        RenderStrategy::Canvas {
            descriptor_cache: Some(cache),
        }
    }

    pub fn letters(atlas: &'a mut LetterAtlas, pool: &'a mut CanvasPool) -> Self {
        RenderStrategy::BitmapAtlas(GlyphSource::Letters { atlas, pool })
    }

    pub fn bitmap(font: &'a BitmapFont) -> Self {
        RenderStrategy::BitmapAtlas(GlyphSource::Bitmap(font))
    }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Per-label processing state.
///
/// Holds the surface the canvas path measures and draws on (borrowed from
/// a [`CanvasPool`] for the engine's lifetime) and the letters placed by
/// the last bitmap pass.
pub struct TextProcessing {
    config: EngineConfig,
    surface: Option<Box<dyn Surface>>,
    measure_cache: MeasureCache,
    font_scale: f32,
    letters: Vec<LetterInfo>,
}

impl TextProcessing {
    pub fn new(config: EngineConfig, pool: &mut CanvasPool) -> Self {
        let surface = pool.acquire();
        if surface.is_none() {
            log::warn!("TextProcessing: no surface available, canvas labels will not render");
        }
        Self {
            measure_cache: MeasureCache::new(config.measure_cache_capacity),
            config,
            surface,
            font_scale: 1.0,
            letters: Vec::new(),
        }
    }

    /// Hand the surface back to `pool`.
    pub fn destroy(mut self, pool: &mut CanvasPool) {
        if let Some(surface) = self.surface.take() {
            pool.release(surface);
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Font scale resolved by the last pass.
    pub fn font_scale(&self) -> f32 {
        self.font_scale
    }

    /// Letters placed by the last bitmap pass.
    pub fn letters(&self) -> &[LetterInfo] {
        &self.letters
    }

    pub fn surface(&self) -> Option<&dyn Surface> {
        self.surface.as_deref()
    }

    /// Resolve font size, line breaks and sizes for `input`.
    pub fn processing_string(
        &mut self,
        strategy: &mut RenderStrategy<'_>,
        style: &mut StyleDescriptor,
        layout: &mut LayoutDescriptor,
        out: &mut LayoutOutput,
        input: &str,
    ) {
        match strategy {
            RenderStrategy::Canvas { .. } => self.process_canvas(style, layout, out, input),
            RenderStrategy::BitmapAtlas(source) => {
                self.process_bitmap(source, style, layout, out, input)
            }
        }
    }

    /// Produce pixels and vertices for the layout resolved by
    /// [`processing_string`](Self::processing_string).
    pub fn generate_render_info(
        &mut self,
        strategy: &mut RenderStrategy<'_>,
        style: &mut StyleDescriptor,
        layout: &mut LayoutDescriptor,
        out: &mut LayoutOutput,
        render: &mut RenderOutput,
        input: &str,
    ) {
        match strategy {
            RenderStrategy::Canvas { descriptor_cache } => {
                self.render_canvas(style, layout, out, render, descriptor_cache.as_deref_mut())
            }
            RenderStrategy::BitmapAtlas(source) => {
                self.render_bitmap(source, style, layout, out, render, input)
            }
        }
    }

    /// Device scale, capped so the scaled size does not pass the max font
    /// size and never below 1.
    fn style_font_scale(&self, font_size: f32, requested: f32) -> f32 {
        let max = self.config.max_font_size;
        let mut scale = requested;
        if scale * font_size > max && font_size < max {
            scale = max / font_size;
        }
        scale.max(1.0)
    }
}

/// Line advance for `font_size` when the layout asks for `line_height`
/// at `draw_font_size`.
pub(crate) fn line_height(line_height: f32, font_size: f32, draw_font_size: f32) -> f32 {
    if line_height == 0.0 {
        font_size
    } else if draw_font_size > 0.0 {
        line_height * font_size / draw_font_size
    } else {
        line_height
    }
}
