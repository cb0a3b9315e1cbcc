//! Letter atlas: shared texture of on-demand rasterized letters.
//!
//! Letters are packed left to right on rows. A row is as tall as the
//! tallest letter placed on it; when a letter does not fit the remaining
//! width the cursor wraps to the next row:
//!
//! ```text
//!  (0,0) ┌────┬──┬─────┬───────── x ──►
//!        │ A  │i │ W   │
//!        ├────┴──┴─────┤◄── next_y
//!        │ g  │
//!        └────┘
//! ```
//!
//! Definitions are immutable until [`LetterAtlas::reset`]. There is no
//! per-letter eviction: a full atlas refuses new letters until the next
//! scene transition resets it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::EngineConfig;
use crate::error::AtlasError;
use crate::geometry::Rect;
use crate::letter::{rasterize_letter, LetterBitmap, BLEED};
use crate::pool::CanvasPool;
use crate::style::LabelInfo;
use crate::surface::Bitmap;

// ── Keys and definitions ────────────────────────────────────────────

/// Identifies a letter: codepoint plus the style hash it was drawn with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub code: u32,
    pub style_hash: String,
}

impl GlyphKey {
    pub fn new(ch: char, style_hash: impl Into<String>) -> Self {
        Self {
            code: ch as u32,
            style_hash: style_hash.into(),
        }
    }
}

/// Where a glyph lives in its texture and how it advances the pen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphDefinition {
    pub u: f32,
    pub v: f32,
    pub w: f32,
    pub h: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub x_advance: f32,
    pub valid: bool,
}

impl GlyphDefinition {
    /// Pixel rect of the glyph in its texture.
    pub fn rect(&self) -> Rect {
        Rect::new(self.u, self.v, self.w, self.h)
    }
}

// ── Pixel targets ───────────────────────────────────────────────────

/// Identity of a texture resource. Changes whenever the resource is
/// recreated, so caches keyed by it can be invalidated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl TextureId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A texture the engine can write pixels into.
pub trait PixelTarget {
    fn size(&self) -> (u32, u32);
    /// Copy `bitmap` with its top-left corner at (`x`, `y`).
    fn copy_region(&mut self, bitmap: &Bitmap, x: u32, y: u32);
    /// Recreate the resource at the given size, contents cleared.
    fn reset(&mut self, width: u32, height: u32);
    /// Replace the whole texture with `bitmap`, resizing to it.
    fn upload(&mut self, bitmap: &Bitmap) {
        self.reset(bitmap.width, bitmap.height);
        self.copy_region(bitmap, 0, 0);
    }
    fn resource_id(&self) -> TextureId;
}

/// RGBA8 texture kept in memory.
#[derive(Clone, Debug)]
pub struct CpuTexture {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    /// Whether data changed since the last GPU upload.
    pub dirty: bool,
    id: TextureId,
}

impl CpuTexture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
            dirty: false,
            id: TextureId::next(),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).and_then(|p| p.try_into().ok())
    }
}

impl PixelTarget for CpuTexture {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn copy_region(&mut self, bitmap: &Bitmap, x: u32, y: u32) {
        let cols = bitmap.width.min(self.width.saturating_sub(x));
        let rows = bitmap.height.min(self.height.saturating_sub(y));
        let row_bytes = cols as usize * 4;
        for row in 0..rows {
            let src = (row * bitmap.width) as usize * 4;
            let dst = ((y + row) as usize * self.width as usize + x as usize) * 4;
            self.data[dst..dst + row_bytes].copy_from_slice(&bitmap.data[src..src + row_bytes]);
        }
        self.dirty = true;
    }

    fn reset(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
        self.dirty = true;
    }

    fn resource_id(&self) -> TextureId {
        self.id
    }
}

// ── Atlas ───────────────────────────────────────────────────────────

/// Scene lifecycle notifications the atlas reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    BeforeSceneLaunch,
}

pub struct LetterAtlas {
    width: u32,
    height: u32,
    spacing: u32,
    baseline_offset: f32,
    x: u32,
    y: u32,
    next_y: u32,
    definitions: HashMap<GlyphKey, GlyphDefinition>,
    texture: Box<dyn PixelTarget>,
    dirty: bool,
}

impl LetterAtlas {
    /// In-memory atlas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_target(width, height, 0, Box::new(CpuTexture::new(width, height)))
    }

    /// Atlas writing into an arbitrary pixel target (a GPU texture).
    pub fn with_target(
        width: u32,
        height: u32,
        spacing: u32,
        texture: Box<dyn PixelTarget>,
    ) -> Self {
        Self {
            width,
            height,
            spacing,
            baseline_offset: 0.0,
            x: spacing,
            y: 0,
            next_y: 0,
            definitions: HashMap::new(),
            texture,
            dirty: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut atlas = Self::with_target(
            config.atlas_width,
            config.atlas_height,
            config.atlas_spacing,
            Box::new(CpuTexture::new(config.atlas_width, config.atlas_height)),
        );
        atlas.baseline_offset = config.baseline_offset;
        atlas
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn glyph_count(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Packing cursor as `(x, y, next_y)`.
    pub fn cursor(&self) -> (u32, u32, u32) {
        (self.x, self.y, self.next_y)
    }

    pub fn texture(&self) -> &dyn PixelTarget {
        self.texture.as_ref()
    }

    pub fn texture_id(&self) -> TextureId {
        self.texture.resource_id()
    }

    pub fn get_letter(&self, key: &GlyphKey) -> Option<&GlyphDefinition> {
        self.definitions.get(key)
    }

    /// Definition for `ch` in the style described by `info`, rasterizing
    /// and packing it on a miss.
    pub fn lookup(
        &mut self,
        ch: char,
        info: &LabelInfo,
        pool: &mut CanvasPool,
    ) -> Option<GlyphDefinition> {
        let key = info.glyph_key(ch);
        if let Some(def) = self.definitions.get(&key) {
            return Some(*def);
        }

        let letter = match rasterize_letter(ch, info, pool, self.baseline_offset) {
            Ok(letter) => letter,
            Err(e) => {
                log::warn!("LetterAtlas: cannot rasterize {ch:?} in {}: {e}", info.font);
                return None;
            }
        };
        match self.insert_letter_texture(&letter) {
            Ok(def) => Some(def),
            Err(e) => {
                log::warn!("LetterAtlas: dropping {ch:?} in {}: {e}", info.font);
                None
            }
        }
    }

    /// Pack `letter` and record its definition. Fails without touching the
    /// cursor when the letter does not fit. A key that is already packed
    /// keeps its definition until [`reset`](Self::reset).
    pub fn insert_letter_texture(
        &mut self,
        letter: &LetterBitmap,
    ) -> Result<GlyphDefinition, AtlasError> {
        if let Some(existing) = self.definitions.get(&letter.key) {
            return Ok(*existing);
        }
        let (w, h) = (letter.bitmap.width, letter.bitmap.height);
        if w + self.spacing * 2 > self.width {
            return Err(AtlasError::TooWide {
                width: self.width,
                glyph_width: w,
            });
        }

        let (mut x, mut y) = (self.x, self.y);
        if x + w + self.spacing > self.width {
            x = self.spacing;
            y = self.next_y;
        }
        let next_y = self.next_y.max(y + h + self.spacing);
        if next_y > self.height {
            return Err(AtlasError::Full {
                width: self.width,
                height: self.height,
                glyph_width: w,
                glyph_height: h,
            });
        }

        self.texture.copy_region(&letter.bitmap, x, y);

        let half_bleed = BLEED / 2.0;
        let def = GlyphDefinition {
            u: x as f32 + half_bleed,
            v: y as f32 + half_bleed,
            w: letter.width - BLEED,
            h: letter.height - BLEED,
            offset_x: 0.0,
            offset_y: letter.offset_y,
            x_advance: letter.width - BLEED,
            valid: true,
        };
        self.definitions.insert(letter.key.clone(), def);

        self.x = x + w + self.spacing;
        self.y = y;
        self.next_y = next_y;
        self.dirty = true;
        Ok(def)
    }

    /// Acknowledge pending pixel changes. Returns whether there were any.
    pub fn update(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Forget every letter and rewind the cursor. Texture pixels stay.
    pub fn reset(&mut self) {
        self.x = self.spacing;
        self.y = 0;
        self.next_y = 0;
        self.definitions.clear();
    }

    /// Reset and recreate the backing texture.
    pub fn clear_all_cache(&mut self) {
        log::debug!(
            "LetterAtlas: clearing {} letters, recreating {}x{} texture",
            self.definitions.len(),
            self.width,
            self.height
        );
        self.reset();
        self.texture.reset(self.width, self.height);
        self.dirty = true;
    }

    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::BeforeSceneLaunch => self.clear_all_cache(),
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleDescriptor;

    fn letter(ch: char, w: u32, h: u32) -> LetterBitmap {
        let mut bitmap = Bitmap::new(w, h);
        bitmap.data.fill(200);
        LetterBitmap {
            key: GlyphKey::new(ch, "test"),
            bitmap,
            width: w as f32,
            height: h as f32,
            offset_y: -1.0,
        }
    }

    #[test]
    fn test_atlas_creation() {
        let atlas = LetterAtlas::new(256, 128);
        assert_eq!(atlas.width(), 256);
        assert_eq!(atlas.height(), 128);
        assert_eq!(atlas.glyph_count(), 0);
        assert!(!atlas.is_dirty());
        assert_eq!(atlas.texture().size(), (256, 128));
    }

    #[test]
    fn test_insert_definition_insets_bleed() {
        let mut atlas = LetterAtlas::new(64, 64);
        let def = atlas.insert_letter_texture(&letter('a', 12, 20)).unwrap();
        assert_eq!((def.u, def.v), (1.0, 1.0));
        assert_eq!((def.w, def.h), (10.0, 18.0));
        assert_eq!(def.x_advance, def.w);
        assert_eq!(def.offset_y, -1.0);
        assert!(def.valid);
        assert_eq!(atlas.cursor(), (12, 0, 20));
        assert!(atlas.is_dirty());
    }

    #[test]
    fn test_update_clears_dirty() {
        let mut atlas = LetterAtlas::new(64, 64);
        assert!(!atlas.update());
        atlas.insert_letter_texture(&letter('a', 12, 20)).unwrap();
        assert!(atlas.update());
        assert!(!atlas.is_dirty());
        assert!(!atlas.update());
    }

    #[test]
    fn test_reinsert_keeps_definition() {
        let mut atlas = LetterAtlas::new(64, 64);
        let first = atlas.insert_letter_texture(&letter('a', 12, 20)).unwrap();
        atlas.update();
        let second = atlas.insert_letter_texture(&letter('a', 12, 20)).unwrap();
        assert_eq!(first, second);
        assert_eq!(atlas.cursor(), (12, 0, 20));
        assert_eq!(atlas.glyph_count(), 1);
        assert!(!atlas.is_dirty());
    }

    #[test]
    fn test_rows_wrap() {
        let mut atlas = LetterAtlas::new(30, 64);
        atlas.insert_letter_texture(&letter('a', 12, 10)).unwrap();
        atlas.insert_letter_texture(&letter('b', 12, 14)).unwrap();
        let third = atlas.insert_letter_texture(&letter('c', 12, 10)).unwrap();
        assert_eq!((third.u, third.v), (1.0, 15.0), "wraps below the tallest letter");
        assert_eq!(atlas.cursor(), (12, 14, 24));
    }

    #[test]
    fn test_full_atlas_fails_atomically() {
        let mut atlas = LetterAtlas::new(24, 20);
        for ch in ['a', 'b', 'c', 'd'] {
            atlas.insert_letter_texture(&letter(ch, 12, 10)).unwrap();
        }
        let before = atlas.cursor();
        let err = atlas.insert_letter_texture(&letter('e', 12, 10)).unwrap_err();
        assert!(matches!(err, AtlasError::Full { .. }));
        assert_eq!(atlas.cursor(), before, "failed insert leaves the cursor alone");
        assert_eq!(atlas.glyph_count(), 4);
    }

    #[test]
    fn test_too_wide() {
        let mut atlas = LetterAtlas::new(10, 100);
        let err = atlas.insert_letter_texture(&letter('w', 11, 5)).unwrap_err();
        assert_eq!(
            err,
            AtlasError::TooWide {
                width: 10,
                glyph_width: 11
            }
        );
    }

    #[test]
    fn test_spacing_separates_letters() {
        let mut atlas = LetterAtlas::with_target(64, 64, 2, Box::new(CpuTexture::new(64, 64)));
        let a = atlas.insert_letter_texture(&letter('a', 10, 10)).unwrap();
        let b = atlas.insert_letter_texture(&letter('b', 10, 10)).unwrap();
        assert_eq!(a.u, 3.0);
        assert_eq!(b.u, 15.0);
    }

    #[test]
    fn test_lookup_rasterizes_once() {
        let mut atlas = LetterAtlas::new(256, 256);
        let mut pool = CanvasPool::fixed_pitch(2);
        let style = StyleDescriptor::new("Arial", 20.0);
        let info = LabelInfo::for_letters(&style, 0.0, 1.0);

        let first = atlas.lookup('A', &info, &mut pool).unwrap();
        let second = atlas.lookup('A', &info, &mut pool).unwrap();
        assert_eq!(first, second);
        assert_eq!(atlas.glyph_count(), 1);
        assert_eq!(pool.created(), 1);
        assert_eq!(atlas.get_letter(&info.glyph_key('A')), Some(&first));
    }

    #[test]
    fn test_lookup_without_surface_is_none() {
        let mut atlas = LetterAtlas::new(256, 256);
        let mut pool = CanvasPool::new(1, || None);
        let info = LabelInfo::for_letters(&StyleDescriptor::new("Arial", 20.0), 0.0, 1.0);
        assert!(atlas.lookup('A', &info, &mut pool).is_none());
        assert_eq!(atlas.glyph_count(), 0);
    }

    #[test]
    fn test_cpu_texture_copy_region() {
        let mut texture = CpuTexture::new(8, 8);
        let mut bitmap = Bitmap::new(2, 2);
        bitmap.data.copy_from_slice(&[
            255, 0, 0, 255, // R
            0, 255, 0, 255, // G
            0, 0, 255, 255, // B
            255, 255, 0, 255, // Y
        ]);
        texture.copy_region(&bitmap, 3, 4);
        assert_eq!(texture.pixel(3, 4), Some([255, 0, 0, 255]));
        assert_eq!(texture.pixel(4, 5), Some([255, 255, 0, 255]));
        assert_eq!(texture.pixel(2, 4), Some([0, 0, 0, 0]));
        assert!(texture.dirty);
    }

    #[test]
    fn test_cpu_texture_clips_at_edge() {
        let mut texture = CpuTexture::new(4, 4);
        let mut bitmap = Bitmap::new(3, 3);
        bitmap.data.fill(9);
        texture.copy_region(&bitmap, 2, 2);
        assert_eq!(texture.pixel(3, 3), Some([9, 9, 9, 9]));
    }

    #[test]
    fn test_reset_forgets_letters() {
        let mut atlas = LetterAtlas::new(64, 64);
        let key = GlyphKey::new('a', "test");
        atlas.insert_letter_texture(&letter('a', 12, 10)).unwrap();
        atlas.reset();
        assert!(atlas.get_letter(&key).is_none());
        assert_eq!(atlas.glyph_count(), 0);
        assert_eq!(atlas.cursor(), (0, 0, 0));
    }

    #[test]
    fn test_scene_launch_recreates_texture() {
        let mut atlas = LetterAtlas::new(64, 64);
        let old = atlas.texture_id();
        atlas.insert_letter_texture(&letter('a', 12, 10)).unwrap();
        assert!(atlas.update());
        assert!(!atlas.update(), "update acknowledges pending changes");

        atlas.handle_lifecycle(LifecycleEvent::BeforeSceneLaunch);
        assert_eq!(atlas.glyph_count(), 0);
        assert_ne!(atlas.texture_id(), old);
        assert!(atlas.is_dirty());
    }
}
