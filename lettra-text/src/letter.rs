//! Single-letter rasterizer.
//!
//! Renders one character, centered, onto a pooled surface sized to the
//! letter plus its outline margin and a small bleed border:
//!
//! ```text
//!  ┌────────────────────────┐  ▲
//!  │ bleed/2 + margin       │  │
//!  │      ┌─────────┐       │  │ (1 + BASELINE_RATIO) * size * scale
//!  │      │  glyph  │       │  │   + 2 * margin + bleed
//!  │      └─────────┘       │  │
//!  └────────────────────────┘  ▼
//!   round2(advance) * scale + 2 * margin + bleed
//! ```

use crate::atlas::GlyphKey;
use crate::error::TextError;
use crate::pool::CanvasPool;
use crate::style::{Color, LabelInfo};
use crate::surface::{Bitmap, LineJoin, Surface, TextAlign};
use crate::text_utils::{round2, BASELINE_RATIO, INVISIBLE_ALPHA, MIDDLE_RATIO};

/// Border (pixels, both sides together) that keeps filtering from sampling
/// the neighbouring letter in the atlas.
pub const BLEED: f32 = 2.0;

/// A rasterized letter ready for atlas insertion.
#[derive(Clone, Debug)]
pub struct LetterBitmap {
    pub key: GlyphKey,
    pub bitmap: Bitmap,
    /// Logical width, `bitmap.width` is this rounded up.
    pub width: f32,
    pub height: f32,
    pub offset_y: f32,
}

/// Rasterize `ch` with a surface borrowed from `pool`.
pub fn rasterize_letter(
    ch: char,
    info: &LabelInfo,
    pool: &mut CanvasPool,
    baseline_offset: f32,
) -> Result<LetterBitmap, TextError> {
    let mut surface = pool.acquire().ok_or(TextError::NoSurface)?;
    let letter = draw_letter(surface.as_mut(), ch, info, baseline_offset);
    pool.release(surface);
    Ok(letter)
}

fn draw_letter(
    surface: &mut dyn Surface,
    ch: char,
    info: &LabelInfo,
    baseline_offset: f32,
) -> LetterBitmap {
    let scale = info.font_scale;
    let mut utf8 = [0u8; 4];
    let text: &str = ch.encode_utf8(&mut utf8);

    surface.set_font(&info.font);
    let advance = round2(surface.measure_text(text));
    let blank = info.margin * 2.0 + BLEED;
    let width = advance * scale + blank;
    let height = (1.0 + BASELINE_RATIO) * info.font_size * scale + blank;
    let offset_y = -(info.font_size * BASELINE_RATIO) * scale / 2.0;

    surface.resize(width.ceil() as u32, height.ceil() as u32);
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    surface.set_text_align(TextAlign::Center);
    surface.set_shadow(None);
    surface.clear_rect(0.0, 0.0, w, h);
    surface.set_fill_color(Color::WHITE.with_alpha(INVISIBLE_ALPHA));
    surface.fill_rect(0.0, 0.0, w, h);

    let font_size = info.font_size * scale;
    surface.set_font(&info.font.scaled(scale));
    let x = w / 2.0;
    let y = h / 2.0 + font_size * MIDDLE_RATIO + font_size * baseline_offset;

    if let Some(outline) = info.outline {
        surface.set_stroke(outline.color, info.margin * 2.0 * scale, LineJoin::Round);
        surface.stroke_text(text, x, y);
    }
    surface.set_fill_color(info.color.with_alpha(255));
    surface.fill_text(text, x, y);

    LetterBitmap {
        key: info.glyph_key(ch),
        bitmap: surface.to_bitmap(),
        width,
        height,
        offset_y,
    }
}
