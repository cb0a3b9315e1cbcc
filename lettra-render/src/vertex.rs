//! GPU vertex type for label quads.
//!
//! Derives `bytemuck::Pod` + `Zeroable` for zero-copy upload to GPU
//! buffers.

use bytemuck::{Pod, Zeroable};
use lettra_text::RenderVertex;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// One corner of a label or letter quad, already in world space.
///
/// 36 bytes per vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LabelVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    /// Normalized sRGB RGBA in [0, 1], bytes divided by 255.
    pub color: [f32; 4],
}

impl LabelVertex {
    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(0) = position
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x3,
            },
            // location(1) = uv
            VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: VertexFormat::Float32x2,
            },
            // location(2) = color
            VertexAttribute {
                offset: 20,
                shader_location: 2,
                format: VertexFormat::Float32x4,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<LabelVertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

impl From<RenderVertex> for LabelVertex {
    fn from(v: RenderVertex) -> Self {
        Self {
            position: [v.x, v.y, v.z],
            uv: [v.u, v.v],
            color: v.color.to_f32(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lettra_text::Color;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<LabelVertex>(), 36);
        let layout = LabelVertex::layout();
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[2].offset, 20);
    }

    #[test]
    fn test_from_render_vertex() {
        let v = LabelVertex::from(RenderVertex {
            x: 1.0,
            y: 2.0,
            z: 0.0,
            u: 0.25,
            v: 0.75,
            color: Color::rgba(255, 0, 0, 255),
        });
        assert_eq!(v.position, [1.0, 2.0, 0.0]);
        assert_eq!(v.uv, [0.25, 0.75]);
        assert_eq!(v.color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_color_stays_in_srgb() {
        let v = LabelVertex::from(RenderVertex {
            color: Color::rgba(128, 0, 0, 255),
            ..RenderVertex::default()
        });
        // No linearization: 128 maps to 128 / 255, not ~0.216.
        assert_eq!(v.color[0], 128.0 / 255.0);
    }

    #[test]
    fn test_bytes_cast() {
        let verts = [LabelVertex::default(); 4];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 144);
    }
}
