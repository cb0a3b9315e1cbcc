//! Label style descriptor and the per-pass glyph context derived from it.

use serde::{Deserialize, Serialize};

use crate::atlas::GlyphKey;
use crate::surface::Font;

// ── Color ───────────────────────────────────────────────────────────

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Lowercase `rrggbb` hex, alpha excluded.
    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels normalized to [0.0, 1.0].
    pub fn to_f32(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

// ── Effects ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub width: f32,
    pub color: Color,
}

/// Drop shadow. `offset_y` points up, like the rest of label space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Underline {
    pub height: f32,
}

// ── Style descriptor ────────────────────────────────────────────────

/// Visual style of a label.
///
/// `actual_font_size`, `font` and `bmfont_scale` are written back by the
/// processing engine on every pass; everything else is caller input.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDescriptor {
    pub font_family: String,
    pub font_size: f32,
    pub is_bold: bool,
    pub is_italic: bool,
    pub color: Color,
    pub outline: Option<Outline>,
    pub shadow: Option<Shadow>,
    pub underline: Option<Underline>,
    /// Device / resolution scale requested by the caller.
    pub font_scale: f32,
    #[serde(skip)]
    pub actual_font_size: f32,
    #[serde(skip)]
    pub font: Font,
    #[serde(skip)]
    pub bmfont_scale: f32,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        Self {
            font_family: String::from("Arial"),
            font_size: 40.0,
            is_bold: false,
            is_italic: false,
            color: Color::WHITE,
            outline: None,
            shadow: None,
            underline: None,
            font_scale: 1.0,
            actual_font_size: 40.0,
            font: Font::default(),
            bmfont_scale: 1.0,
        }
    }
}

impl StyleDescriptor {
    pub fn new(font_family: impl Into<String>, font_size: f32) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
            actual_font_size: font_size,
            ..Default::default()
        }
    }

    pub fn outline_width(&self) -> f32 {
        self.outline.map_or(0.0, |o| o.width)
    }

    /// Font description at `size` carrying this style's family and flags.
    pub fn font_at(&self, size: f32) -> Font {
        Font::new(size, self.font_family.clone())
            .bold(self.is_bold)
            .italic(self.is_italic)
    }
}

// ── Per-pass glyph context ──────────────────────────────────────────

/// Everything a glyph source needs to resolve one character for the label
/// currently being processed.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelInfo {
    pub font_size: f32,
    pub line_height: f32,
    pub font: Font,
    pub color: Color,
    pub outline: Option<Outline>,
    /// Extra space around each letter (the outline width).
    pub margin: f32,
    pub font_scale: f32,
    pub hash: String,
}

impl LabelInfo {
    /// Context for letters rasterized on demand from a system font.
    pub fn for_letters(style: &StyleDescriptor, line_height: f32, font_scale: f32) -> Self {
        let outline = style.outline.filter(|o| o.width > 0.0);
        let margin = outline.map_or(0.0, |o| o.width);
        let font = style.font_at(style.font_size);
        let mut info = Self {
            font_size: style.font_size,
            line_height,
            font,
            color: style.color,
            outline,
            margin,
            font_scale,
            hash: String::new(),
        };
        info.hash = info.compute_hash();
        info
    }

    /// Context for a pre-baked bitmap font authored at `origin_size`.
    /// Letters carry no margin.
    pub fn for_bitmap_font(style: &StyleDescriptor, line_height: f32, origin_size: f32) -> Self {
        Self {
            font_size: origin_size,
            line_height,
            font: style.font_at(origin_size),
            color: style.color,
            outline: None,
            margin: 0.0,
            font_scale: 1.0,
            hash: String::new(),
        }
    }

    /// Digest of everything that changes how a letter rasterizes.
    pub fn compute_hash(&self) -> String {
        let mut hash = format!("{}{}", self.font, self.color.to_hex());
        if let Some(outline) = self.outline.filter(|_| self.margin > 0.0) {
            hash.push_str(&format!("{}{}", self.margin, outline.color.to_hex()));
        }
        if self.font_scale != 1.0 {
            hash.push_str(&format!("@{}", self.font_scale));
        }
        hash
    }

    pub fn glyph_key(&self, ch: char) -> GlyphKey {
        GlyphKey::new(ch, self.hash.clone())
    }
}
