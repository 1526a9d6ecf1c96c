//! The per-font glyph cache.
//!
//! A [`GlyphCache`] is what a terminal renderer calls a font: a shaping
//! context bound to a monospace face at a fixed pixel height, the average cell
//! width derived from it, and a map from cell content to shaped [`Glyph`]s.
//!
//! Drawing a cell looks its content up in the map. Only a miss invokes the
//! shaping engine; a hit replays the stored result.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::backend::{DrawTarget, ShapingContext};
use crate::character::CharacterBuffer;
use crate::error::{GlyphError, GlyphResult};
use crate::glyph::{Glyph, GlyphPayload, GlyphRef};
use crate::hash::BuildDjb2Hasher;
use crate::text::{CosmicShaper, ShaperConfig};

/// Bytes probed to derive the average cell width (`0..127`).
const WIDTH_PROBE_END: u8 = 127;

/// Statistics about glyph cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphCacheStats {
    /// Number of lookups, including those made by `draw`.
    pub lookups: u64,
    /// Lookups answered from the map.
    pub hits: u64,
    /// Lookups that had to shape new content.
    pub misses: u64,
    /// Misses whose shaping failed.
    pub shape_failures: u64,
    /// Successful draw calls.
    pub draws: u64,
}

struct CacheInner<C: ShapingContext> {
    // Dropped before the context.
    glyphs: HashMap<CharacterBuffer, GlyphRef<C>, BuildDjb2Hasher>,
    context: C,
    width: u32,
    height: u32,
    stats: GlyphCacheStats,
}

impl<C: ShapingContext> CacheInner<C> {
    fn lookup(&mut self, key: &CharacterBuffer) -> GlyphResult<GlyphRef<C>> {
        if key.is_empty() {
            return Err(GlyphError::InvalidArgument("cannot look up an empty character"));
        }

        self.stats.lookups += 1;

        if let Some(glyph) = self.glyphs.get(key) {
            self.stats.hits += 1;
            trace!(key = ?key, "glyph cache hit");
            return Ok(Rc::clone(glyph));
        }

        self.stats.misses += 1;
        trace!(key = ?key, "glyph cache miss");

        let owned_key = key.duplicate()?;
        let mut glyph = Glyph::create(key)?;
        if let Err(err) = glyph.shape(&mut self.context) {
            self.stats.shape_failures += 1;
            warn!(key = ?key, error = %err, "failed to shape glyph");
            return Err(err);
        }

        let glyph = Rc::new(glyph);
        self.glyphs.insert(owned_key, Rc::clone(&glyph));
        Ok(glyph)
    }

    // Shapes every byte below 127 and averages the non-zero widths. As a side
    // effect the whole ASCII range is resident afterwards.
    fn measure_width(&mut self) -> GlyphResult<u32> {
        let mut probe = CharacterBuffer::new()?;
        let mut total: u64 = 0;
        let mut count: u64 = 0;

        for byte in 0..WIDTH_PROBE_END {
            if probe.set_bytes(&[byte]).is_err() {
                continue;
            }

            let glyph = match self.lookup(&probe) {
                Ok(glyph) => glyph,
                Err(err) => {
                    debug!(byte, error = %err, "skipping width probe");
                    continue;
                }
            };

            if glyph.width() > 0 {
                total += u64::from(glyph.width());
                count += 1;
            }
        }

        if count == 0 {
            return Err(GlyphError::ShapingFailure(
                "no probe character produced a non-zero width".into(),
            ));
        }

        let width = u32::try_from(total / count).unwrap_or(u32::MAX);
        debug!(width, probes = count, "measured average glyph width");
        Ok(width)
    }
}

impl<C: ShapingContext> Drop for CacheInner<C> {
    fn drop(&mut self) {
        debug!(
            height = self.height,
            glyphs = self.glyphs.len(),
            "destroying glyph cache"
        );
    }
}

/// Shaped glyph cache for one monospace font at one pixel height.
///
/// `GlyphCache` is a shared handle: [`Clone`] adds a reference
/// ([`retain`](Self::retain)) and dropping a handle removes one
/// ([`release`](Self::release)). When the last handle goes away every
/// resident glyph is released, then the shaping context.
///
/// The cache is single-threaded and performs no locking. A [`DrawTarget`]
/// must not call back into the cache it is being drawn from.
///
/// # Example
///
/// ```no_run
/// use horizon_lattice_glyphs::{CharacterBuffer, GlyphCache};
/// use horizon_lattice_glyphs::text::Canvas;
///
/// let cache = GlyphCache::new(16)?;
/// let mut canvas = Canvas::new(cache.get_width() * 80, cache.get_height() * 24, cache.render_mode());
///
/// let ch = CharacterBuffer::new_from_bytes(b"A")?;
/// cache.draw(&ch, &mut canvas, 0, 0)?;
/// # Ok::<(), horizon_lattice_glyphs::GlyphError>(())
/// ```
pub struct GlyphCache<C: ShapingContext = CosmicShaper> {
    inner: Rc<RefCell<CacheInner<C>>>,
}

impl GlyphCache<CosmicShaper> {
    /// Create a cache for the default monospace font at `height` pixels.
    ///
    /// This loads the system fonts, which can take a moment.
    pub fn new(height: u32) -> GlyphResult<Self> {
        Self::with_config(ShaperConfig::default(), height)
    }

    /// Create a cache with a custom shaper configuration.
    pub fn with_config(config: ShaperConfig, height: u32) -> GlyphResult<Self> {
        check_height(height)?;
        Self::from_context(CosmicShaper::new(config, height), height)
    }

    /// Rendering mode of the underlying shaper.
    pub fn render_mode(&self) -> crate::text::GlyphRenderMode {
        self.inner.borrow().context.render_mode()
    }
}

impl<C: ShapingContext> GlyphCache<C> {
    /// Create a cache around an already configured shaping context.
    ///
    /// `height` is the pixel height the context was sized for. Construction
    /// shapes the printable ASCII range to derive the average cell width and
    /// fails with [`GlyphError::ShapingFailure`] if none of it has a width.
    pub fn from_context(context: C, height: u32) -> GlyphResult<Self> {
        check_height(height)?;
        debug!(height, "creating glyph cache");

        let mut inner = CacheInner {
            glyphs: HashMap::default(),
            context,
            width: 0,
            height,
            stats: GlyphCacheStats::default(),
        };
        inner.width = inner.measure_width()?;

        Ok(Self {
            inner: Rc::new(RefCell::new(inner)),
        })
    }

    /// Add a reference to this cache.
    pub fn retain(&self) -> Self {
        self.clone()
    }

    /// Drop this reference. The cache is destroyed with its last reference.
    pub fn release(self) {
        drop(self);
    }

    /// Number of live handles to this cache.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Average cell width in pixels, measured at construction.
    pub fn get_width(&self) -> u32 {
        self.inner.borrow().width
    }

    /// Cell height in pixels, as requested at construction.
    pub fn get_height(&self) -> u32 {
        self.inner.borrow().height
    }

    /// Number of resident glyphs.
    pub fn len(&self) -> usize {
        self.inner.borrow().glyphs.len()
    }

    /// Check if no glyph is resident.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().glyphs.is_empty()
    }

    /// Check if a glyph for `key` is resident, without shaping it.
    pub fn contains(&self, key: &CharacterBuffer) -> bool {
        self.inner.borrow().glyphs.contains_key(key)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> GlyphCacheStats {
        self.inner.borrow().stats.clone()
    }

    /// Reset cache statistics.
    pub fn reset_stats(&self) {
        self.inner.borrow_mut().stats = GlyphCacheStats::default();
    }

    /// Run `f` with the shaping context.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls [`lookup`](Self::lookup), [`draw`](Self::draw) or
    /// [`reset_stats`](Self::reset_stats) on this cache. Read-only accessors
    /// are fine.
    pub fn with_context<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.inner.borrow().context)
    }

    /// Get the glyph for `key`, shaping and inserting it on a miss.
    ///
    /// The returned handle is the caller's own reference; the cache keeps its
    /// own. A failed lookup inserts nothing.
    pub fn lookup(&self, key: &CharacterBuffer) -> GlyphResult<GlyphRef<C>> {
        self.inner.borrow_mut().lookup(key)
    }

    /// Draw the glyph for `key` with its top-left corner at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `target` calls back into this cache while drawing.
    pub fn draw<T>(&self, key: &CharacterBuffer, target: &mut T, x: u32, y: u32) -> GlyphResult<()>
    where
        T: DrawTarget<C> + ?Sized,
    {
        let mut inner = self.inner.borrow_mut();
        let glyph = inner.lookup(key)?;

        let result = match glyph.payload() {
            GlyphPayload::LayoutBased { layout } => {
                target.move_to(x as f32, y as f32);
                target.show_layout(&mut inner.context, layout);
                Ok(())
            }
            GlyphPayload::ShapedRun { run, font, ascent } => {
                target.move_to(x as f32, y as f32 + *ascent as f32);
                target.show_glyph_run(&mut inner.context, font, run);
                Ok(())
            }
            GlyphPayload::Unset => Err(GlyphError::UnsupportedState(
                "cached glyph has no shaping result",
            )),
        };

        if result.is_ok() {
            inner.stats.draws += 1;
        }

        drop(glyph);
        result
    }
}

impl<C: ShapingContext> Clone for GlyphCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: ShapingContext> std::fmt::Debug for GlyphCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("GlyphCache")
            .field("width", &inner.width)
            .field("height", &inner.height)
            .field("glyphs", &inner.glyphs.len())
            .field("stats", &inner.stats)
            .finish_non_exhaustive()
    }
}

fn check_height(height: u32) -> GlyphResult<()> {
    if height == 0 {
        return Err(GlyphError::InvalidArgument("font height must be greater than zero"));
    }
    Ok(())
}
