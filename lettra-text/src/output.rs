//! Render output of a processing pass: vertices plus the texture they
//! sample.

use crate::atlas::{PixelTarget, TextureId};
use crate::bitmap_font::SpriteFrame;
use crate::geometry::Size;
use crate::style::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub u: f32,
    pub v: f32,
    pub color: Color,
}

/// Invalidation hook for descriptor sets (bind groups) built over a label
/// texture that just got replaced.
pub trait DescriptorSetCache {
    fn release(&mut self, texture: TextureId);
}

/// Vertices for one label, four per quad in the order bottom-left,
/// bottom-right, top-left, top-right.
pub struct RenderOutput {
    /// Vertex count (4 per quad).
    pub quad_count: usize,
    pub vertex_buffer: Vec<RenderVertex>,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub color: Color,
    /// Per-label texture (canvas path).
    pub texture: Option<Box<dyn PixelTarget>>,
    pub sprite_frame: Option<SpriteFrame>,
    /// Texture the vertices sample.
    pub texture_id: Option<TextureId>,
    pub texture_size: Size,
}

impl Default for RenderOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderOutput {
    pub fn new() -> Self {
        Self {
            quad_count: 0,
            vertex_buffer: Vec::new(),
            anchor_x: 0.5,
            anchor_y: 0.5,
            color: Color::WHITE,
            texture: None,
            sprite_frame: None,
            texture_id: None,
            texture_size: Size::ZERO,
        }
    }

    /// Output rendering into its own texture.
    pub fn with_texture(texture: Box<dyn PixelTarget>) -> Self {
        Self {
            texture_id: Some(texture.resource_id()),
            texture: Some(texture),
            ..Self::new()
        }
    }

    /// Start a fresh vertex list.
    pub fn clear(&mut self) {
        self.quad_count = 0;
        self.vertex_buffer.clear();
    }

    pub fn push_quad(&mut self, quad: [RenderVertex; 4]) {
        self.vertex_buffer.extend_from_slice(&quad);
        self.quad_count += 4;
    }

    pub fn quads(&self) -> impl Iterator<Item = &[RenderVertex]> {
        self.vertex_buffer[..self.quad_count.min(self.vertex_buffer.len())].chunks_exact(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::CpuTexture;

    #[test]
    fn test_push_quad_counts_vertices() {
        let mut out = RenderOutput::new();
        out.push_quad([RenderVertex::default(); 4]);
        out.push_quad([RenderVertex::default(); 4]);
        assert_eq!(out.quad_count, 8);
        assert_eq!(out.quads().count(), 2);
        out.clear();
        assert_eq!(out.quads().count(), 0);
    }

    #[test]
    fn test_with_texture_records_id() {
        let texture = CpuTexture::new(4, 4);
        let id = texture.resource_id();
        let out = RenderOutput::with_texture(Box::new(texture));
        assert_eq!(out.texture_id, Some(id));
        assert_eq!((out.anchor_x, out.anchor_y), (0.5, 0.5));
    }
}
