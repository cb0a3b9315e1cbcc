//! Error types for the text engine.

use thiserror::Error;

/// Errors raised while packing glyphs into a [`LetterAtlas`](crate::atlas::LetterAtlas).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtlasError {
    #[error("Letter atlas {width}x{height} is full, cannot place a {glyph_width}x{glyph_height} glyph")]
    Full {
        width: u32,
        height: u32,
        glyph_width: u32,
        glyph_height: u32,
    },

    #[error("Glyph of width {glyph_width}px does not fit an atlas row of {width}px")]
    TooWide { width: u32, glyph_width: u32 },
}

/// Top-level error type of the text engine.
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No drawing surface available")]
    NoSurface,

    #[error("Atlas error: {0}")]
    Atlas(#[from] AtlasError),
}
