//! The contract between the glyph cache and a shaping / drawing engine.
//!
//! The cache never shapes or rasterizes anything itself. It asks a
//! [`ShapingContext`] to turn cell content into a layout, decides how to keep
//! the result, and later replays it against a [`DrawTarget`].
//!
//! The production implementation is [`CosmicShaper`](crate::text::CosmicShaper).

use crate::error::GlyphResult;

/// A shaping engine configured for one font at one pixel size.
///
/// Handles returned by the context (`Layout`, `Font`, `Run`) own whatever
/// engine resources back them and release them when dropped.
pub trait ShapingContext {
    /// A complete shaping result that may contain several runs and is
    /// re-measured whenever it is drawn.
    type Layout;
    /// The font a single run was shaped against.
    type Font;
    /// A single run of pre-positioned glyphs.
    type Run;

    /// Shape `text` into a layout.
    ///
    /// Fails with [`GlyphError::ShapingFailure`](crate::GlyphError::ShapingFailure)
    /// if the engine cannot lay the content out at all.
    fn create_layout(&mut self, text: &[u8]) -> GlyphResult<Self::Layout>;

    /// Logical width of the layout in pixels.
    fn layout_width(&self, layout: &Self::Layout) -> f32;

    /// Distance from the top of the layout to the first baseline, in pixels.
    fn layout_baseline(&self, layout: &Self::Layout) -> f32;

    /// Number of runs on the first line of the layout.
    fn first_line_run_count(&self, layout: &Self::Layout) -> usize;

    /// Copy the first run of the first line together with its font.
    fn copy_first_run(&self, layout: &Self::Layout) -> GlyphResult<(Self::Run, Self::Font)>;
}

/// Something the cache can issue drawing commands against.
///
/// Coordinates are in pixels. The pen position set by
/// [`move_to`](Self::move_to) is the top-left corner for
/// [`show_layout`](Self::show_layout) and the baseline origin for
/// [`show_glyph_run`](Self::show_glyph_run).
pub trait DrawTarget<C: ShapingContext + ?Sized> {
    /// Move the pen.
    fn move_to(&mut self, x: f32, y: f32);

    /// Draw a full layout at the pen position.
    fn show_layout(&mut self, context: &mut C, layout: &C::Layout);

    /// Draw a single pre-shaped run with its font at the pen position.
    fn show_glyph_run(&mut self, context: &mut C, font: &C::Font, run: &C::Run);
}
