//! Cell shaping with cosmic-text.
//!
//! [`CosmicShaper`] is the production [`ShapingContext`]: one monospace family
//! at an absolute pixel size, the process locale as language, and left-aligned
//! single-line layouts.
//!
//! cosmic-text reports shaped output per visual line. A run here is a maximal
//! sequence of glyphs on that line sharing one font face and one bidi level,
//! which is what a single draw call can replay.

use cosmic_text::{Align, Attrs, Buffer, CacheKeyFlags, Family, Metrics, Shaping, Wrap};
use fontdb::ID as FontFaceId;

use super::{FontSystem, FontSystemConfig, GlyphRenderMode};
use crate::backend::ShapingContext;
use crate::error::{GlyphError, GlyphResult};

/// Name of the generic monospace family.
pub const MONOSPACE_FAMILY: &str = "monospace";

/// A unique identifier for a glyph within a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphId(pub u16);

impl GlyphId {
    /// Create a new glyph ID.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw glyph ID value.
    pub const fn value(self) -> u16 {
        self.0
    }
}

/// A glyph of a run, positioned relative to the run's baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    /// The glyph identifier within the font.
    pub glyph_id: GlyphId,
    /// X position relative to the run origin.
    pub x: f32,
    /// Y position relative to the baseline.
    pub y: f32,
    /// Advance width of the glyph.
    pub width: f32,
    /// Flags for cache key generation during rasterization.
    pub cache_key_flags: CacheKeyFlags,
    /// The level of this glyph for bidirectional text (0 = LTR, 1 = RTL, etc.).
    pub level: u8,
}

impl ShapedGlyph {
    /// Check if this glyph is part of right-to-left text.
    pub fn is_rtl(&self) -> bool {
        self.level % 2 == 1
    }
}

/// A single run copied out of a layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphRun {
    glyphs: Vec<ShapedGlyph>,
}

impl GlyphRun {
    /// The positioned glyphs of the run.
    pub fn glyphs(&self) -> &[ShapedGlyph] {
        &self.glyphs
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Check if the run has no glyphs.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The font face and size a run was shaped with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunFont {
    /// Font face in the font database.
    pub face: FontFaceId,
    /// Size in pixels.
    pub size: f32,
}

/// A shaped cell that keeps the whole cosmic-text buffer.
pub struct CosmicLayout {
    buffer: Buffer,
}

impl CosmicLayout {
    /// The underlying cosmic-text buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

impl std::fmt::Debug for CosmicLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmicLayout")
            .field("lines", &self.buffer.lines.len())
            .finish_non_exhaustive()
    }
}

/// Configuration for [`CosmicShaper`].
///
/// # Examples
///
/// ```
/// use horizon_lattice_glyphs::text::{FontSystemConfig, GlyphRenderMode, ShaperConfig};
///
/// let config = ShaperConfig::new()
///     .family("DejaVu Sans Mono")
///     .render_mode(GlyphRenderMode::Grayscale)
///     .font_system(FontSystemConfig::new().locale("en-GB"));
/// assert_eq!(config.family, "DejaVu Sans Mono");
/// ```
#[derive(Debug, Clone)]
pub struct ShaperConfig {
    /// Font family to shape with. `monospace` selects the generic family.
    pub family: String,
    /// Line height as a multiple of the pixel size.
    pub line_height_factor: f32,
    /// Render mode. `None` selects the platform default.
    pub render_mode: Option<GlyphRenderMode>,
    /// Font system settings.
    pub font_system: FontSystemConfig,
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            family: MONOSPACE_FAMILY.to_string(),
            line_height_factor: 1.0,
            render_mode: None,
            font_system: FontSystemConfig::default(),
        }
    }
}

impl ShaperConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font family.
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Set the line height multiplier.
    pub fn line_height_factor(mut self, factor: f32) -> Self {
        self.line_height_factor = factor;
        self
    }

    /// Set the render mode.
    pub fn render_mode(mut self, mode: GlyphRenderMode) -> Self {
        self.render_mode = Some(mode);
        self
    }

    /// Set the font system configuration.
    pub fn font_system(mut self, config: FontSystemConfig) -> Self {
        self.font_system = config;
        self
    }
}

/// [`ShapingContext`] backed by cosmic-text.
pub struct CosmicShaper {
    font_system: FontSystem,
    metrics: Metrics,
    family: String,
    render_mode: GlyphRenderMode,
}

impl CosmicShaper {
    /// Create a shaper for `config.family` at `pixel_size` pixels.
    pub fn new(config: ShaperConfig, pixel_size: u32) -> Self {
        let font_size = pixel_size as f32;
        let factor = if config.line_height_factor.is_finite() && config.line_height_factor > 0.0 {
            config.line_height_factor
        } else {
            1.0
        };
        let render_mode = config
            .render_mode
            .unwrap_or_else(GlyphRenderMode::detect_platform);

        tracing::debug!(
            family = %config.family,
            pixel_size,
            ?render_mode,
            "creating cosmic shaper"
        );

        Self {
            font_system: FontSystem::with_config(config.font_system),
            metrics: Metrics::new(font_size, font_size * factor),
            family: config.family,
            render_mode,
        }
    }

    /// The font system shaping runs against.
    pub fn font_system(&self) -> &FontSystem {
        &self.font_system
    }

    /// Mutable access to the font system, e.g. to load extra fonts.
    pub fn font_system_mut(&mut self) -> &mut FontSystem {
        &mut self.font_system
    }

    /// Font size in pixels.
    pub fn font_size(&self) -> f32 {
        self.metrics.font_size
    }

    /// Render mode used when rasterizing.
    pub fn render_mode(&self) -> GlyphRenderMode {
        self.render_mode
    }
}

impl std::fmt::Debug for CosmicShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmicShaper")
            .field("family", &self.family)
            .field("font_size", &self.metrics.font_size)
            .field("render_mode", &self.render_mode)
            .finish_non_exhaustive()
    }
}

fn family_for(name: &str) -> Family<'_> {
    if name.eq_ignore_ascii_case(MONOSPACE_FAMILY) {
        Family::Monospace
    } else {
        Family::Name(name)
    }
}

/// Splits the first visual line into runs of equal face and bidi level.
fn first_line_runs(buffer: &Buffer) -> Vec<&[cosmic_text::LayoutGlyph]> {
    let Some(line) = buffer.layout_runs().next() else {
        return Vec::new();
    };

    let glyphs = line.glyphs;
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=glyphs.len() {
        let boundary = i == glyphs.len()
            || glyphs[i].font_id != glyphs[start].font_id
            || glyphs[i].level != glyphs[start].level;
        if boundary {
            runs.push(&glyphs[start..i]);
            start = i;
        }
    }
    runs
}

impl ShapingContext for CosmicShaper {
    type Layout = CosmicLayout;
    type Font = RunFont;
    type Run = GlyphRun;

    fn create_layout(&mut self, text: &[u8]) -> GlyphResult<CosmicLayout> {
        let text = std::str::from_utf8(text)
            .map_err(|e| GlyphError::ShapingFailure(format!("content is not UTF-8: {e}")))?;

        let font_system = self.font_system.inner_mut();
        let mut buffer = Buffer::new(font_system, self.metrics);
        buffer.set_wrap(font_system, Wrap::None);
        buffer.set_size(font_system, None, None);

        let attrs = Attrs::new().family(family_for(&self.family));
        buffer.set_text(font_system, text, attrs, Shaping::Advanced);

        // Terminal cells are laid out left to right.
        for line in buffer.lines.iter_mut() {
            line.set_align(Some(Align::Left));
        }
        buffer.shape_until_scroll(font_system, false);

        Ok(CosmicLayout { buffer })
    }

    fn layout_width(&self, layout: &CosmicLayout) -> f32 {
        layout
            .buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max)
    }

    fn layout_baseline(&self, layout: &CosmicLayout) -> f32 {
        layout
            .buffer
            .layout_runs()
            .next()
            .map(|run| run.line_y)
            .unwrap_or(0.0)
    }

    fn first_line_run_count(&self, layout: &CosmicLayout) -> usize {
        first_line_runs(&layout.buffer).len()
    }

    fn copy_first_run(&self, layout: &CosmicLayout) -> GlyphResult<(GlyphRun, RunFont)> {
        let runs = first_line_runs(&layout.buffer);
        let glyphs = runs
            .first()
            .filter(|glyphs| !glyphs.is_empty())
            .ok_or_else(|| GlyphError::ShapingFailure("layout has no glyph run".into()))?;

        let font = RunFont {
            face: glyphs[0].font_id,
            size: glyphs[0].font_size,
        };

        let mut copied = Vec::new();
        copied.try_reserve_exact(glyphs.len())?;
        copied.extend(glyphs.iter().map(|glyph| ShapedGlyph {
            glyph_id: GlyphId::new(glyph.glyph_id),
            x: glyph.x + glyph.x_offset,
            y: glyph.y + glyph.y_offset,
            width: glyph.w,
            cache_key_flags: glyph.cache_key_flags,
            level: glyph.level.number(),
        }));

        Ok((GlyphRun { glyphs: copied }, font))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_shaper() -> CosmicShaper {
        // Create without system fonts for faster testing
        let config = ShaperConfig::new()
            .render_mode(GlyphRenderMode::Grayscale)
            .font_system(FontSystemConfig::new().load_system_fonts(false));
        CosmicShaper::new(config, 16)
    }

    #[test]
    fn glyph_id_creation() {
        let id = GlyphId::new(42);
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn shaped_glyph_rtl_detection() {
        let ltr = ShapedGlyph {
            glyph_id: GlyphId::new(1),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            cache_key_flags: CacheKeyFlags::empty(),
            level: 0,
        };
        assert!(!ltr.is_rtl());

        let rtl = ShapedGlyph { level: 1, ..ltr };
        assert!(rtl.is_rtl());
    }

    #[test]
    fn config_defaults_to_monospace() {
        let config = ShaperConfig::default();
        assert_eq!(config.family, MONOSPACE_FAMILY);
        assert_eq!(config.line_height_factor, 1.0);
        assert!(config.render_mode.is_none());
    }

    #[test]
    fn generic_family_mapping() {
        assert_eq!(family_for("monospace"), Family::Monospace);
        assert_eq!(family_for("Monospace"), Family::Monospace);
        assert_eq!(family_for("Fira Code"), Family::Name("Fira Code"));
    }

    #[test]
    fn shaper_uses_pixel_size() {
        let shaper = create_test_shaper();
        assert_eq!(shaper.font_size(), 16.0);
        assert_eq!(shaper.render_mode(), GlyphRenderMode::Grayscale);
    }

    #[test]
    fn invalid_line_height_falls_back() {
        let config = ShaperConfig::new()
            .line_height_factor(f32::NAN)
            .font_system(FontSystemConfig::new().load_system_fonts(false));
        let shaper = CosmicShaper::new(config, 10);
        assert_eq!(shaper.metrics.line_height, 10.0);
    }

    #[test]
    fn non_utf8_content_fails_to_shape() {
        let mut shaper = create_test_shaper();
        assert!(matches!(
            shaper.create_layout(&[0xFF, 0xFE]),
            Err(GlyphError::ShapingFailure(_))
        ));
    }
}
