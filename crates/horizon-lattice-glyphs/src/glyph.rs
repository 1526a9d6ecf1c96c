//! Cached glyphs.
//!
//! Glyphs are internal to the cache. Callers hand a [`CharacterBuffer`] to
//! [`GlyphCache`](crate::GlyphCache) and the cache keeps one [`Glyph`] per
//! distinct content. A glyph keeps the shaping result in the cheapest form
//! that can still be drawn:
//!
//! - [`GlyphPayload::Unset`]: nothing attached yet, cannot be drawn.
//! - [`GlyphPayload::LayoutBased`]: the full layout. Slowest, but handles
//!   anything, including clusters that shape into several runs (mixed scripts
//!   or directions) or into no run at all.
//! - [`GlyphPayload::ShapedRun`]: a single pre-positioned run plus its font.
//!   This is the common case for ordinary characters.

use std::fmt;
use std::rc::Rc;

use crate::backend::ShapingContext;
use crate::character::CharacterBuffer;
use crate::error::{GlyphError, GlyphResult};

/// Shared handle to a cached glyph.
///
/// The cache map holds one handle for as long as the entry is resident, and
/// every successful lookup hands out one more. The glyph is destroyed when the
/// last handle is dropped.
pub type GlyphRef<C> = Rc<Glyph<C>>;

/// Shaping result attached to a glyph.
pub enum GlyphPayload<C: ShapingContext> {
    /// No shaping result attached.
    Unset,
    /// Full layout, re-measured on every draw.
    LayoutBased {
        /// The retained layout.
        layout: C::Layout,
    },
    /// A single shaped run.
    ShapedRun {
        /// Positioned glyphs of the run.
        run: C::Run,
        /// Font the run was shaped against.
        font: C::Font,
        /// Baseline offset from the top of the cell, rounded up to whole pixels.
        ascent: u32,
    },
}

/// Discriminant of a [`GlyphPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphKind {
    /// See [`GlyphPayload::Unset`].
    Unset,
    /// See [`GlyphPayload::LayoutBased`].
    LayoutBased,
    /// See [`GlyphPayload::ShapedRun`].
    ShapedRun,
}

/// A cache entry: a private copy of the content it was created for, its pixel
/// width and its shaping result.
pub struct Glyph<C: ShapingContext> {
    payload: GlyphPayload<C>,
    key: CharacterBuffer,
    width: u32,
}

impl<C: ShapingContext> Glyph<C> {
    /// Create an unshaped glyph for `key`.
    pub(crate) fn create(key: &CharacterBuffer) -> GlyphResult<Self> {
        if key.is_empty() {
            return Err(GlyphError::InvalidArgument("glyph key is empty"));
        }

        Ok(Self {
            payload: GlyphPayload::Unset,
            key: key.duplicate()?,
            width: 0,
        })
    }

    /// Drop the attached shaping result.
    pub(crate) fn reset_payload(&mut self) {
        self.payload = GlyphPayload::Unset;
        self.width = 0;
    }

    /// Shape the key with `context` and attach the fastest usable result.
    ///
    /// On failure the glyph keeps whatever it had before.
    pub(crate) fn shape(&mut self, context: &mut C) -> GlyphResult<()> {
        let layout = context.create_layout(self.key.get_bytes())?;
        let width = round_pixels(context.layout_width(&layout));

        if context.first_line_run_count(&layout) == 1 {
            let (run, font) = context.copy_first_run(&layout)?;
            let ascent = ceil_pixels(context.layout_baseline(&layout));

            self.reset_payload();
            self.payload = GlyphPayload::ShapedRun { run, font, ascent };
        } else {
            self.reset_payload();
            self.payload = GlyphPayload::LayoutBased { layout };
        }

        self.width = width;
        Ok(())
    }

    /// The content this glyph was created for.
    pub fn key(&self) -> &CharacterBuffer {
        &self.key
    }

    /// Width in whole pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The attached shaping result.
    pub fn payload(&self) -> &GlyphPayload<C> {
        &self.payload
    }

    /// Which kind of shaping result is attached.
    pub fn kind(&self) -> GlyphKind {
        match self.payload {
            GlyphPayload::Unset => GlyphKind::Unset,
            GlyphPayload::LayoutBased { .. } => GlyphKind::LayoutBased,
            GlyphPayload::ShapedRun { .. } => GlyphKind::ShapedRun,
        }
    }

    /// Baseline offset for single-run glyphs.
    pub fn ascent(&self) -> Option<u32> {
        match self.payload {
            GlyphPayload::ShapedRun { ascent, .. } => Some(ascent),
            _ => None,
        }
    }
}

impl<C: ShapingContext> Drop for Glyph<C> {
    fn drop(&mut self) {
        // Engine resources go before the key.
        self.reset_payload();
    }
}

impl<C: ShapingContext> fmt::Debug for Glyph<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glyph")
            .field("key", &self.key)
            .field("width", &self.width)
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

fn round_pixels(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

fn ceil_pixels(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.ceil() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Splits content on `|` into runs; `!` fails shaping.
    struct PipeContext;

    impl ShapingContext for PipeContext {
        type Layout = Vec<Vec<u8>>;
        type Font = &'static str;
        type Run = Vec<u8>;

        fn create_layout(&mut self, text: &[u8]) -> GlyphResult<Self::Layout> {
            if text.contains(&b'!') {
                return Err(GlyphError::ShapingFailure("rejected".into()));
            }
            Ok(text
                .split(|&b| b == b'|')
                .filter(|run| !run.is_empty())
                .map(<[u8]>::to_vec)
                .collect())
        }

        fn layout_width(&self, layout: &Self::Layout) -> f32 {
            layout.iter().map(Vec::len).sum::<usize>() as f32 * 7.4
        }

        fn layout_baseline(&self, _layout: &Self::Layout) -> f32 {
            12.2
        }

        fn first_line_run_count(&self, layout: &Self::Layout) -> usize {
            layout.len()
        }

        fn copy_first_run(&self, layout: &Self::Layout) -> GlyphResult<(Self::Run, Self::Font)> {
            Ok((layout[0].clone(), "mono"))
        }
    }

    fn key(bytes: &[u8]) -> CharacterBuffer {
        CharacterBuffer::new_from_bytes(bytes).unwrap()
    }

    #[test]
    fn create_rejects_empty_key() {
        let empty = CharacterBuffer::new().unwrap();
        assert_eq!(
            Glyph::<PipeContext>::create(&empty).unwrap_err(),
            GlyphError::InvalidArgument("glyph key is empty")
        );
    }

    #[test]
    fn created_glyph_is_unset() {
        let glyph = Glyph::<PipeContext>::create(&key(b"a")).unwrap();
        assert_eq!(glyph.kind(), GlyphKind::Unset);
        assert_eq!(glyph.width(), 0);
        assert_eq!(glyph.key().get_bytes(), b"a");
    }

    #[test]
    fn single_run_is_kept_as_shaped_run() {
        let mut glyph = Glyph::create(&key(b"ab")).unwrap();
        glyph.shape(&mut PipeContext).unwrap();

        assert_eq!(glyph.kind(), GlyphKind::ShapedRun);
        // 2 * 7.4 = 14.8 rounds to 15, 12.2 rounds up to 13.
        assert_eq!(glyph.width(), 15);
        assert_eq!(glyph.ascent(), Some(13));
        match glyph.payload() {
            GlyphPayload::ShapedRun { run, font, .. } => {
                assert_eq!(run, b"ab");
                assert_eq!(*font, "mono");
            }
            _ => panic!("expected a shaped run"),
        }
    }

    #[test]
    fn multiple_runs_keep_the_layout() {
        let mut glyph = Glyph::create(&key(b"a|b")).unwrap();
        glyph.shape(&mut PipeContext).unwrap();

        assert_eq!(glyph.kind(), GlyphKind::LayoutBased);
        assert_eq!(glyph.ascent(), None);
        // Width is plain rounding: 14.8 -> 15.
        assert_eq!(glyph.width(), 15);
    }

    #[test]
    fn zero_runs_keep_the_layout() {
        let mut glyph = Glyph::create(&key(b"|")).unwrap();
        glyph.shape(&mut PipeContext).unwrap();
        assert_eq!(glyph.kind(), GlyphKind::LayoutBased);
        assert_eq!(glyph.width(), 0);
    }

    #[test]
    fn failed_shape_leaves_glyph_unchanged() {
        let mut glyph = Glyph::create(&key(b"x!")).unwrap();
        assert!(matches!(
            glyph.shape(&mut PipeContext),
            Err(GlyphError::ShapingFailure(_))
        ));
        assert_eq!(glyph.kind(), GlyphKind::Unset);
    }

    #[test]
    fn reset_returns_to_unset() {
        let mut glyph = Glyph::create(&key(b"a")).unwrap();
        glyph.shape(&mut PipeContext).unwrap();
        glyph.reset_payload();
        assert_eq!(glyph.kind(), GlyphKind::Unset);
        assert_eq!(glyph.width(), 0);
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_pixels(7.49), 7);
        assert_eq!(round_pixels(7.5), 8);
        assert_eq!(round_pixels(-3.0), 0);
        assert_eq!(round_pixels(f32::NAN), 0);
        assert_eq!(ceil_pixels(7.01), 8);
        assert_eq!(ceil_pixels(0.0), 0);
    }
}
