//! # lettra-text
//!
//! Text layout and glyph atlas engine for game-engine labels. Turns a
//! string plus a style and a box into either one label texture (canvas
//! path) or per-letter quads over a shared atlas (bitmap path).
//!
//! ## Architecture
//!
//! ```text
//! StyleDescriptor + LayoutDescriptor + &str
//!     │
//!     ▼
//! TextProcessing::processing_string ──► LayoutOutput (sizes, lines)
//!     │
//!     ├─ Canvas ───────► Surface (from CanvasPool) ──► PixelTarget ──► 1 quad
//!     │
//!     └─ BitmapAtlas ──► LetterAtlas ◄── rasterize_letter (on miss)
//!                   └──► BitmapFont (pre-baked)
//!                              │
//!                              ▼
//! TextProcessing::generate_render_info ──► RenderOutput { vertices }
//! ```
//!
//! - **`surface`**: drawing-surface trait with a `cosmic-text` backend and a
//!   headless fixed-pitch backend.
//! - **`pool`**: reusable surfaces.
//! - **`letter`** / **`atlas`**: single-letter rasterization and shelf
//!   packing into a shared texture.
//! - **`bitmap_font`**: pre-baked fonts loaded from JSON.
//! - **`processing`**: the layout engine itself.

pub mod atlas;
pub mod bitmap_font;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod letter;
pub mod output;
pub mod pool;
pub mod processing;
pub mod style;
pub mod surface;
pub mod text_utils;

// Re-exports for ergonomic use.
pub use atlas::{
    CpuTexture, GlyphDefinition, GlyphKey, LetterAtlas, LifecycleEvent, PixelTarget, TextureId,
};
pub use bitmap_font::{BitmapFont, BitmapFontConfig, SpriteFrame};
pub use config::EngineConfig;
pub use error::{AtlasError, TextError};
pub use geometry::{Rect, Size, Vec2};
pub use layout::{HorizontalAlign, LayoutDescriptor, LayoutOutput, Overflow, VerticalAlign};
pub use letter::{rasterize_letter, LetterBitmap};
pub use output::{DescriptorSetCache, RenderOutput, RenderVertex};
pub use pool::CanvasPool;
pub use processing::{GlyphSource, LetterInfo, RenderStrategy, TextProcessing};
pub use style::{Color, LabelInfo, Outline, Shadow, StyleDescriptor, Underline};
pub use surface::{Bitmap, CosmicSurface, FixedPitchSurface, Font, Surface};
