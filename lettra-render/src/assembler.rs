//! Render-data emission.
//!
//! Both assemblers append to a shared [`RenderData`] so several labels can
//! be batched into one vertex / index buffer pair. Positions are taken
//! from label space to world space through a `glam::Mat4`, dividing by
//! the reciprocal homogeneous w.

use glam::{Mat4, Vec4};
use lettra_text::{RenderOutput, RenderVertex};

use crate::error::RenderError;
use crate::vertex::LabelVertex;

/// Two triangles over the quad corners bottom-left, bottom-right,
/// top-left, top-right.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 1, 3, 2];

/// Largest vertex count addressable by `u16` indices.
const MAX_VERTICES: usize = u16::MAX as usize + 1;

/// CPU-side vertex and index data for one or more labels.
#[derive(Clone, Debug, Default)]
pub struct RenderData {
    pub vertices: Vec<LabelVertex>,
    pub indices: Vec<u16>,
}

impl RenderData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    fn push_quad(&mut self, quad: &[RenderVertex], world: &Mat4) -> Result<(), RenderError> {
        let base = self.vertices.len();
        if base + 4 > MAX_VERTICES {
            return Err(RenderError::IndexOverflow(base + 4));
        }
        self.vertices.extend(quad.iter().map(|v| world_vertex(v, world)));
        self.indices.extend(QUAD_INDICES.iter().map(|&i| base as u16 + i));
        Ok(())
    }
}

fn world_vertex(v: &RenderVertex, world: &Mat4) -> LabelVertex {
    let p = *world * Vec4::new(v.x, v.y, v.z, 1.0);
    let rhw = if p.w != 0.0 { 1.0 / p.w } else { 1.0 };
    LabelVertex {
        position: [p.x * rhw, p.y * rhw, p.z * rhw],
        ..LabelVertex::from(*v)
    }
}

/// Emits the single quad of a canvas-rendered label.
pub struct CanvasAssembler;

impl CanvasAssembler {
    pub fn fill_buffers(
        render: &RenderOutput,
        world: &Mat4,
        data: &mut RenderData,
    ) -> Result<(), RenderError> {
        if render.quad_count != 4 || render.vertex_buffer.len() < 4 {
            return Err(RenderError::QuadCount(render.quad_count));
        }
        data.push_quad(&render.vertex_buffer[..4], world)
    }
}

/// Emits one quad per placed letter.
pub struct BitmapAssembler;

impl BitmapAssembler {
    /// Append every quad of `render`. Returns the number of quads written;
    /// nothing is written when they would overflow 16-bit indices.
    pub fn fill_buffers(
        render: &RenderOutput,
        world: &Mat4,
        data: &mut RenderData,
    ) -> Result<usize, RenderError> {
        let quads = render.quads().count();
        let needed = data.vertices.len() + quads * 4;
        if needed > MAX_VERTICES {
            return Err(RenderError::IndexOverflow(needed));
        }
        data.vertices.reserve(quads * 4);
        data.indices.reserve(quads * 6);
        for quad in render.quads() {
            data.push_quad(quad, world)?;
        }
        log::trace!("BitmapAssembler: {quads} quads, {} vertices total", data.vertices.len());
        Ok(quads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lettra_text::Color;

    fn quad(x: f32, y: f32) -> [RenderVertex; 4] {
        let corner = |dx: f32, dy: f32, u: f32, v: f32| RenderVertex {
            x: x + dx,
            y: y + dy,
            z: 0.0,
            u,
            v,
            color: Color::WHITE,
        };
        [
            corner(0.0, 0.0, 0.0, 1.0),
            corner(10.0, 0.0, 1.0, 1.0),
            corner(0.0, 10.0, 0.0, 0.0),
            corner(10.0, 10.0, 1.0, 0.0),
        ]
    }

    fn output(quads: usize) -> RenderOutput {
        let mut render = RenderOutput::new();
        for i in 0..quads {
            render.push_quad(quad(i as f32 * 10.0, 0.0));
        }
        render
    }

    #[test]
    fn test_canvas_quad_translated() {
        let render = output(1);
        let world = Mat4::from_translation(Vec3::new(100.0, 50.0, 0.0));
        let mut data = RenderData::new();
        CanvasAssembler::fill_buffers(&render, &world, &mut data).unwrap();

        assert_eq!(data.indices, QUAD_INDICES.to_vec());
        assert_eq!(data.vertices[0].position, [100.0, 50.0, 0.0]);
        assert_eq!(data.vertices[3].position, [110.0, 60.0, 0.0]);
        assert_eq!(data.vertices[3].uv, [1.0, 0.0]);
    }

    #[test]
    fn test_canvas_divides_by_w() {
        let render = output(1);
        let mut world = Mat4::IDENTITY;
        world.w_axis.w = 2.0;
        let mut data = RenderData::new();
        CanvasAssembler::fill_buffers(&render, &world, &mut data).unwrap();
        assert_eq!(data.vertices[3].position, [5.0, 5.0, 0.0]);
    }

    #[test]
    fn test_canvas_needs_one_quad() {
        let mut data = RenderData::new();
        let err = CanvasAssembler::fill_buffers(&output(2), &Mat4::IDENTITY, &mut data);
        assert_eq!(err, Err(RenderError::QuadCount(8)));
        assert!(data.vertices.is_empty());
    }

    #[test]
    fn test_bitmap_quads_offset_indices() {
        let mut data = RenderData::new();
        CanvasAssembler::fill_buffers(&output(1), &Mat4::IDENTITY, &mut data).unwrap();
        let written = BitmapAssembler::fill_buffers(&output(2), &Mat4::IDENTITY, &mut data).unwrap();

        assert_eq!(written, 2);
        assert_eq!(data.vertices.len(), 12);
        assert_eq!(&data.indices[6..12], &[4, 5, 6, 5, 7, 6]);
        assert_eq!(&data.indices[12..], &[8, 9, 10, 9, 11, 10]);
        assert_eq!(data.vertex_bytes().len(), 12 * 36);
        assert_eq!(data.index_bytes().len(), 18 * 2);
    }

    #[test]
    fn test_bitmap_overflow_writes_nothing() {
        let mut data = RenderData::new();
        data.vertices.resize(MAX_VERTICES - 4, LabelVertex::default());
        let err = BitmapAssembler::fill_buffers(&output(2), &Mat4::IDENTITY, &mut data);
        assert_eq!(err, Err(RenderError::IndexOverflow(MAX_VERTICES + 4)));
        assert_eq!(data.vertices.len(), MAX_VERTICES - 4);
    }

    #[test]
    fn test_empty_label_writes_nothing() {
        let mut data = RenderData::new();
        let written =
            BitmapAssembler::fill_buffers(&RenderOutput::new(), &Mat4::IDENTITY, &mut data).unwrap();
        assert_eq!(written, 0);
        assert!(data.indices.is_empty());
    }
}
