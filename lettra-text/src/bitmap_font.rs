//! Pre-baked bitmap fonts.
//!
//! A bitmap font is an atlas image plus a JSON description of where every
//! glyph sits in it:
//!
//! ```json
//! {
//!   "atlas_name": "digits",
//!   "font_size": 32,
//!   "common_height": 38,
//!   "texture_width": 256,
//!   "texture_height": 128,
//!   "glyphs": { "48": { "rect": { "x": 0, "y": 0, "width": 18, "height": 26 },
//!                       "x_offset": 1, "y_offset": 4, "x_advance": 20 } },
//!   "kerning": [ { "first": 49, "second": 49, "amount": -2 } ]
//! }
//! ```
//!
//! The image may itself be packed into a larger sprite sheet, optionally
//! rotated; [`SpriteFrame`] maps glyph rects into sheet space.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::atlas::{GlyphDefinition, TextureId};
use crate::error::TextError;
use crate::geometry::{Rect, Size, Vec2};

// ── Sprite frame ────────────────────────────────────────────────────

/// A sub-rectangle of a texture, possibly trimmed and rotated 90° when it
/// was packed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteFrame {
    pub rect: Rect,
    pub original_size: Size,
    #[serde(default)]
    pub offset: Vec2,
    #[serde(default)]
    pub rotated: bool,
    pub texture_size: Size,
    /// UVs in quad order (bottom-left, bottom-right, top-left, top-right).
    #[serde(skip)]
    pub uv: [f32; 8],
}

impl SpriteFrame {
    /// Untrimmed, unrotated frame over `rect`.
    pub fn new(rect: Rect, texture_size: Size) -> Self {
        let mut frame = Self {
            rect,
            original_size: rect.size(),
            offset: Vec2::ZERO,
            rotated: false,
            texture_size,
            uv: [0.0; 8],
        };
        frame.calculate_uv();
        frame
    }

    /// Frame covering a whole `width` x `height` texture.
    pub fn reset_to_texture(&mut self, width: f32, height: f32) {
        self.rect = Rect::new(0.0, 0.0, width, height);
        self.original_size = Size::new(width, height);
        self.texture_size = Size::new(width, height);
        self.offset = Vec2::ZERO;
        self.rotated = false;
        self.calculate_uv();
    }

    pub fn calculate_uv(&mut self) {
        let (tex_w, tex_h) = (self.texture_size.width, self.texture_size.height);
        if tex_w <= 0.0 || tex_h <= 0.0 {
            self.uv = [0.0; 8];
            return;
        }
        let rect = self.rect;
        if self.rotated {
            let l = rect.x / tex_w;
            let r = (rect.x + rect.height) / tex_w;
            let b = (rect.y + rect.width) / tex_h;
            let t = rect.y / tex_h;
            self.uv = [l, t, l, b, r, t, r, b];
        } else {
            let l = rect.x / tex_w;
            let r = (rect.x + rect.width) / tex_w;
            let b = (rect.y + rect.height) / tex_h;
            let t = rect.y / tex_h;
            self.uv = [l, b, r, b, l, t, r, t];
        }
    }

    /// Move a glyph rect from font-image space into sheet space. Returns
    /// whether the frame is rotated.
    pub fn map_glyph_rect(&self, glyph: &mut Rect) -> bool {
        let rect = self.rect;
        let trimmed_left = self.offset.x + (self.original_size.width - rect.width) / 2.0;
        let trimmed_top = self.offset.y - (self.original_size.height - rect.height) / 2.0;
        if self.rotated {
            let original_x = glyph.x;
            glyph.x = rect.x + rect.height - glyph.y - glyph.height - trimmed_top;
            glyph.y = original_x + rect.y - trimmed_left;
            if glyph.y < 0.0 {
                glyph.height += trimmed_top;
            }
        } else {
            glyph.x += rect.x - trimmed_left;
            glyph.y += rect.y + trimmed_top;
        }
        self.rotated
    }
}

// ── Font config ─────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FntGlyph {
    pub rect: Rect,
    #[serde(default)]
    pub x_offset: f32,
    #[serde(default)]
    pub y_offset: f32,
    pub x_advance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KerningPair {
    pub first: u32,
    pub second: u32,
    pub amount: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BitmapFontConfig {
    pub atlas_name: String,
    pub font_size: f32,
    #[serde(default)]
    pub common_height: f32,
    pub texture_width: u32,
    pub texture_height: u32,
    pub glyphs: HashMap<u32, FntGlyph>,
    #[serde(default)]
    pub kerning: Vec<KerningPair>,
    #[serde(default)]
    pub sprite_frame: Option<SpriteFrame>,
}

// ── Bitmap font ─────────────────────────────────────────────────────

pub struct BitmapFont {
    config: BitmapFontConfig,
    definitions: HashMap<u32, GlyphDefinition>,
    kerning: HashMap<(u32, u32), f32>,
    sprite_frame: Option<SpriteFrame>,
    texture_id: TextureId,
}

impl std::fmt::Debug for BitmapFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmapFont")
            .field("atlas_name", &self.config.atlas_name)
            .field("glyphs", &self.definitions.len())
            .finish()
    }
}

impl BitmapFont {
    pub fn from_config(config: BitmapFontConfig) -> Self {
        let definitions = config
            .glyphs
            .iter()
            .map(|(&code, glyph)| {
                let def = GlyphDefinition {
                    u: glyph.rect.x,
                    v: glyph.rect.y,
                    w: glyph.rect.width,
                    h: glyph.rect.height,
                    offset_x: glyph.x_offset,
                    offset_y: glyph.y_offset,
                    x_advance: glyph.x_advance,
                    valid: true,
                };
                (code, def)
            })
            .collect();
        let kerning = config
            .kerning
            .iter()
            .map(|k| ((k.first, k.second), k.amount))
            .collect();
        let sprite_frame = config.sprite_frame.clone().map(|mut frame| {
            frame.calculate_uv();
            frame
        });
        log::debug!(
            "BitmapFont: loaded '{}' with {} glyphs",
            config.atlas_name,
            config.glyphs.len()
        );
        Self {
            config,
            definitions,
            kerning,
            sprite_frame,
            texture_id: TextureId::next(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, TextError> {
        let config: BitmapFontConfig = serde_json::from_str(json)?;
        Ok(Self::from_config(config))
    }

    pub fn atlas_name(&self) -> &str {
        &self.config.atlas_name
    }

    /// Size the font was baked at.
    pub fn font_size(&self) -> f32 {
        self.config.font_size
    }

    pub fn common_height(&self) -> f32 {
        self.config.common_height
    }

    pub fn letter_definition(&self, ch: char) -> Option<&GlyphDefinition> {
        self.definitions.get(&(ch as u32))
    }

    /// Extra advance between `first` and `second`.
    pub fn kerning_amount(&self, first: char, second: char) -> f32 {
        self.kerning
            .get(&(first as u32, second as u32))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn sprite_frame(&self) -> Option<&SpriteFrame> {
        self.sprite_frame.as_ref()
    }

    /// Size of the texture the glyph UVs are normalized against.
    pub fn texture_size(&self) -> Size {
        self.sprite_frame.as_ref().map_or(
            Size::new(
                self.config.texture_width as f32,
                self.config.texture_height as f32,
            ),
            |frame| frame.texture_size,
        )
    }

    pub fn texture_id(&self) -> TextureId {
        self.texture_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGITS: &str = r#"{
        "atlas_name": "digits",
        "font_size": 32,
        "common_height": 38,
        "texture_width": 256,
        "texture_height": 128,
        "glyphs": {
            "48": { "rect": { "x": 0, "y": 0, "width": 18, "height": 26 },
                    "x_offset": 1, "y_offset": 4, "x_advance": 20 },
            "49": { "rect": { "x": 20, "y": 0, "width": 10, "height": 26 },
                    "x_advance": 14 }
        },
        "kerning": [ { "first": 49, "second": 49, "amount": -2 } ]
    }"#;

    #[test]
    fn test_load_from_json() {
        let font = BitmapFont::from_json(DIGITS).expect("valid font");
        assert_eq!(font.atlas_name(), "digits");
        assert_eq!(font.font_size(), 32.0);
        assert_eq!(font.common_height(), 38.0);
        let zero = font.letter_definition('0').unwrap();
        assert_eq!((zero.u, zero.w, zero.offset_x, zero.x_advance), (0.0, 18.0, 1.0, 20.0));
        assert!(font.letter_definition('7').is_none());
        assert_eq!(font.texture_size(), Size::new(256.0, 128.0));
    }

    #[test]
    fn test_kerning_lookup() {
        let font = BitmapFont::from_json(DIGITS).unwrap();
        assert_eq!(font.kerning_amount('1', '1'), -2.0);
        assert_eq!(font.kerning_amount('0', '1'), 0.0);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            BitmapFont::from_json("{}"),
            Err(TextError::Config(_))
        ));
    }

    #[test]
    fn test_sprite_frame_uv() {
        let frame = SpriteFrame::new(
            Rect::new(10.0, 20.0, 30.0, 40.0),
            Size::new(100.0, 100.0),
        );
        assert_eq!(frame.uv, [0.1, 0.6, 0.4, 0.6, 0.1, 0.2, 0.4, 0.2]);

        let mut rotated = frame.clone();
        rotated.rotated = true;
        rotated.calculate_uv();
        assert_eq!(rotated.uv, [0.1, 0.2, 0.1, 0.5, 0.5, 0.2, 0.5, 0.5]);
    }

    #[test]
    fn test_reset_to_texture() {
        let mut frame = SpriteFrame::new(Rect::new(5.0, 5.0, 1.0, 1.0), Size::new(10.0, 10.0));
        frame.reset_to_texture(64.0, 32.0);
        assert_eq!(frame.rect, Rect::new(0.0, 0.0, 64.0, 32.0));
        assert_eq!(frame.uv, [0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_map_glyph_rect() {
        let frame = SpriteFrame::new(
            Rect::new(100.0, 50.0, 64.0, 64.0),
            Size::new(512.0, 512.0),
        );
        let mut glyph = Rect::new(4.0, 8.0, 10.0, 12.0);
        assert!(!frame.map_glyph_rect(&mut glyph));
        assert_eq!((glyph.x, glyph.y), (104.0, 58.0));

        let mut rotated = frame.clone();
        rotated.rotated = true;
        let mut glyph = Rect::new(4.0, 8.0, 10.0, 12.0);
        assert!(rotated.map_glyph_rect(&mut glyph));
        assert_eq!((glyph.x, glyph.y), (100.0 + 64.0 - 8.0 - 12.0, 54.0));
    }
}
