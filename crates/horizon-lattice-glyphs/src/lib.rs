//! Shaped glyph cache for terminal cells.
//!
//! A terminal redraws the same few hundred characters over and over. This
//! crate turns the content of one cell (a base character plus any combining
//! marks) into a shaped glyph once and replays the stored result on every
//! later draw, so the text shaping engine only runs on a cache miss.
//!
//! # Getting Started
//!
//! Create one [`GlyphCache`] per font size. Construction measures the average
//! cell width from the ASCII range:
//!
//! ```no_run
//! use horizon_lattice_glyphs::{CharacterBuffer, GlyphCache, RecordingTarget};
//!
//! let cache = GlyphCache::new(16)?;
//! println!("cell: {}x{}", cache.get_width(), cache.get_height());
//!
//! // One buffer per cell; combining marks are appended.
//! let mut cell = CharacterBuffer::new_from_bytes(b"a")?;
//! cell.append_codepoints(&[0x301])?;
//!
//! let mut target = RecordingTarget::new();
//! cache.draw(&cell, &mut target, 0, 0)?;
//! # Ok::<(), horizon_lattice_glyphs::GlyphError>(())
//! ```
//!
//! # Custom engines
//!
//! The cache is generic over a [`ShapingContext`] and draws onto any
//! [`DrawTarget`]. [`text::CosmicShaper`] and [`text::Canvas`] are the
//! cosmic-text implementations; other engines plug in through
//! [`GlyphCache::from_context`].

mod backend;
mod cache;
mod character;
mod error;
mod glyph;
mod hash;
mod target;
pub mod text;

pub use backend::{DrawTarget, ShapingContext};
pub use cache::{GlyphCache, GlyphCacheStats};
pub use character::{CharacterBuffer, DEFAULT_CHARACTER_CAPACITY};
pub use error::{GlyphError, GlyphResult};
pub use glyph::{Glyph, GlyphKind, GlyphPayload, GlyphRef};
pub use hash::{BuildDjb2Hasher, DJB2_SEED, Djb2Hasher, djb2, spread};
pub use target::{DrawCommand, RecordingTarget};
