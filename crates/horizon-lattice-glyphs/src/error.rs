//! Error types for the glyph cache crate.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur while building character buffers or shaping glyphs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlyphError {
    /// An argument was rejected (empty key, zero height).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A buffer could not be grown or duplicated.
    #[error("out of memory")]
    OutOfMemory,

    /// A codepoint is not a valid Unicode scalar value.
    #[error("cannot encode codepoint U+{codepoint:04X}")]
    EncodingFailure { codepoint: u32 },

    /// The shaping engine produced no usable result.
    #[error("shaping failed: {0}")]
    ShapingFailure(String),

    /// A glyph was found in a state that should be unreachable.
    #[error("unsupported glyph state: {0}")]
    UnsupportedState(&'static str),
}

impl From<TryReserveError> for GlyphError {
    fn from(_: TryReserveError) -> Self {
        GlyphError::OutOfMemory
    }
}

/// Result type for glyph cache operations.
pub type GlyphResult<T> = Result<T, GlyphError>;
