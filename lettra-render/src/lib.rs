//! # lettra-render
//!
//! `wgpu` side of Lettra labels: turns a [`RenderOutput`] into vertex and
//! index data ready for upload, and backs label / atlas textures with GPU
//! textures.
//!
//! ## Architecture
//!
//! ```text
//!  TextProcessing (lettra-text)
//!       │ RenderOutput { vertices, texture_id }
//!       ▼
//!  CanvasAssembler / BitmapAssembler ──► RenderData { LabelVertex, u16 }
//!       │                                       │
//!       ▼                                       ▼
//!  GpuTexture (PixelTarget) ◄── atlas pixels   vertex / index buffers
//!       │
//!       ▼
//!  BindGroupCache ◄── release(old id) when a label texture is replaced
//! ```
//!
//! ## Crate modules
//!
//! - [`context`]: headless GPU device/queue initialisation
//! - [`vertex`]: `LabelVertex` and its buffer layout
//! - [`assembler`]: render-data emission for both label paths
//! - [`texture`]: GPU-backed pixel target and bind-group cache

pub mod assembler;
pub mod context;
pub mod error;
pub mod texture;
pub mod vertex;

// Re-exports for convenience
pub use assembler::{BitmapAssembler, CanvasAssembler, RenderData, QUAD_INDICES};
pub use context::{GpuContext, GpuError};
pub use error::RenderError;
pub use texture::{BindGroupCache, GpuTexture};
pub use vertex::LabelVertex;

#[doc(no_inline)]
pub use lettra_text::RenderOutput;
