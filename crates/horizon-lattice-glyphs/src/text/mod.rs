//! cosmic-text backend for the glyph cache.
//!
//! This module provides the production [`ShapingContext`](crate::ShapingContext)
//! and a software [`DrawTarget`](crate::DrawTarget), built on top of
//! cosmic-text and fontdb.
//!
//! # Getting Started
//!
//! ```no_run
//! use horizon_lattice_glyphs::GlyphCache;
//! use horizon_lattice_glyphs::text::{FontSystemConfig, ShaperConfig};
//!
//! let config = ShaperConfig::new()
//!     .family("DejaVu Sans Mono")
//!     .font_system(FontSystemConfig::new().monospace_family("DejaVu Sans Mono"));
//!
//! let cache = GlyphCache::with_config(config, 18)?;
//! println!("cell is {}x{} pixels", cache.get_width(), cache.get_height());
//! # Ok::<(), horizon_lattice_glyphs::GlyphError>(())
//! ```

mod canvas;
mod font_system;
mod shaping;

pub use canvas::{Canvas, GlyphPixelFormat, GlyphRenderMode};
pub use font_system::{FontLoadError, FontSystem, FontSystemConfig};
pub use shaping::{
    CosmicLayout, CosmicShaper, GlyphId, GlyphRun, MONOSPACE_FAMILY, RunFont, ShapedGlyph,
    ShaperConfig,
};

// Re-export fontdb::ID for users who need to work with font face IDs
pub use fontdb::ID as FontFaceId;
