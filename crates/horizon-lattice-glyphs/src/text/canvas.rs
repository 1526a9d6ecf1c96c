//! Software rasterization of cached glyphs.
//!
//! [`Canvas`] is a [`DrawTarget`] for [`CosmicShaper`] that rasterizes glyphs
//! with cosmic-text's `SwashCache` and composites their coverage into a pixel
//! buffer, either as an 8-bit alpha mask or as per-channel subpixel coverage.
//!
//! # Example
//!
//! ```no_run
//! use horizon_lattice_glyphs::{CharacterBuffer, GlyphCache};
//! use horizon_lattice_glyphs::text::Canvas;
//!
//! let cache = GlyphCache::new(16)?;
//! let mut canvas = Canvas::new(cache.get_width(), cache.get_height(), cache.render_mode());
//! cache.draw(&CharacterBuffer::new_from_bytes(b"g")?, &mut canvas, 0, 0)?;
//! println!("{} bytes of coverage", canvas.data().len());
//! # Ok::<(), horizon_lattice_glyphs::GlyphError>(())
//! ```

use cosmic_text::{CacheKey, CacheKeyFlags, SwashCache, SwashContent};
use fontdb::ID as FontFaceId;

use super::{CosmicLayout, CosmicShaper, GlyphRun, RunFont};
use crate::backend::DrawTarget;

/// Rendering mode for glyph rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlyphRenderMode {
    /// Grayscale antialiasing (8-bit alpha mask).
    /// Works well on all displays and is the safest default.
    #[default]
    Grayscale,
    /// Subpixel (LCD) antialiasing using RGB subpixels.
    SubpixelHorizontalRgb,
    /// Subpixel antialiasing with BGR subpixel order.
    SubpixelHorizontalBgr,
    /// Vertical subpixel rendering (rare, for vertically-oriented LCD panels).
    SubpixelVerticalRgb,
    /// Vertical BGR subpixel rendering.
    SubpixelVerticalBgr,
}

impl GlyphRenderMode {
    /// Check if this mode uses subpixel rendering.
    pub fn is_subpixel(&self) -> bool {
        !matches!(self, GlyphRenderMode::Grayscale)
    }

    /// Detect the best rendering mode for the current platform.
    pub fn detect_platform() -> Self {
        // Apple dropped subpixel AA; Linux panels vary too much to guess.
        #[cfg(target_os = "windows")]
        {
            GlyphRenderMode::SubpixelHorizontalRgb
        }

        #[cfg(not(target_os = "windows"))]
        {
            GlyphRenderMode::Grayscale
        }
    }

    fn swaps_red_blue(&self) -> bool {
        matches!(
            self,
            GlyphRenderMode::SubpixelHorizontalBgr | GlyphRenderMode::SubpixelVerticalBgr
        )
    }
}

/// Pixel format of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphPixelFormat {
    /// 8-bit alpha mask (grayscale antialiasing).
    Alpha,
    /// 32-bit RGBA with subpixel coverage in RGB channels.
    SubpixelRgba,
}

impl GlyphPixelFormat {
    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            GlyphPixelFormat::Alpha => 1,
            GlyphPixelFormat::SubpixelRgba => 4,
        }
    }

    fn for_mode(mode: GlyphRenderMode) -> Self {
        if mode.is_subpixel() {
            GlyphPixelFormat::SubpixelRgba
        } else {
            GlyphPixelFormat::Alpha
        }
    }
}

/// Coverage surface that cached glyphs can be drawn onto.
pub struct Canvas {
    width: u32,
    height: u32,
    mode: GlyphRenderMode,
    format: GlyphPixelFormat,
    data: Vec<u8>,
    pen: (f32, f32),
    swash_cache: SwashCache,
}

impl Canvas {
    /// Create a cleared canvas of `width` x `height` pixels.
    pub fn new(width: u32, height: u32, mode: GlyphRenderMode) -> Self {
        let format = GlyphPixelFormat::for_mode(mode);
        let size = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            mode,
            format,
            data: vec![0; size],
            pen: (0.0, 0.0),
            swash_cache: SwashCache::new(),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format of [`data`](Self::data).
    pub fn format(&self) -> GlyphPixelFormat {
        self.format
    }

    /// Current pen position.
    pub fn pen(&self) -> (f32, f32) {
        self.pen
    }

    /// Raw pixel rows, top to bottom.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Coverage of a pixel, averaged over channels for subpixel canvases.
    pub fn coverage(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let idx = (y as usize * self.width as usize + x as usize) * bpp;
        match self.format {
            GlyphPixelFormat::Alpha => Some(self.data[idx]),
            GlyphPixelFormat::SubpixelRgba => Some(average_rgb(&self.data[idx..idx + 3])),
        }
    }

    /// Clear all pixels.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    fn draw_glyph(
        &mut self,
        font_system: &mut cosmic_text::FontSystem,
        face: FontFaceId,
        glyph_id: u16,
        font_size: f32,
        position: (f32, f32),
        flags: CacheKeyFlags,
    ) {
        let (cache_key, x, y) = CacheKey::new(face, glyph_id, font_size, position, flags);

        let Some(img) = self.swash_cache.get_image(font_system, cache_key) else {
            return;
        };
        if img.placement.width == 0 || img.placement.height == 0 {
            return;
        }

        // The image stays borrowed from the swash cache; only the pixel
        // fields of the canvas are written.
        let mut surface = Surface {
            data: &mut self.data,
            width: self.width,
            height: self.height,
            format: self.format,
            mode: self.mode,
        };
        surface.composite(
            img.content,
            img.placement.width,
            img.placement.height,
            x + img.placement.left,
            y - img.placement.top,
            &img.data,
        );
    }
}

/// Mutable view of a canvas' pixels.
struct Surface<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    format: GlyphPixelFormat,
    mode: GlyphRenderMode,
}

impl Surface<'_> {
    fn composite(
        &mut self,
        content: SwashContent,
        width: u32,
        height: u32,
        left: i32,
        top: i32,
        data: &[u8],
    ) {
        let src_bpp = match content {
            SwashContent::Mask => 1,
            SwashContent::SubpixelMask | SwashContent::Color => 4,
        };
        let bpp = self.format.bytes_per_pixel();

        for row in 0..height as i32 {
            let py = top + row;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            for col in 0..width as i32 {
                let px = left + col;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }

                let src = (row as usize * width as usize + col as usize) * src_bpp;
                let Some(texel) = data.get(src..src + src_bpp) else {
                    continue;
                };
                let rgb = texel_coverage(self.mode, content, texel);

                let dst = (py as usize * self.width as usize + px as usize) * bpp;
                match self.format {
                    GlyphPixelFormat::Alpha => {
                        let value = average_rgb(&rgb);
                        self.data[dst] = self.data[dst].max(value);
                    }
                    GlyphPixelFormat::SubpixelRgba => {
                        for (channel, value) in rgb.iter().enumerate() {
                            self.data[dst + channel] = self.data[dst + channel].max(*value);
                        }
                        self.data[dst + 3] = self.data[dst + 3].max(average_rgb(&rgb));
                    }
                }
            }
        }
    }
}

/// Per-channel coverage of one source texel in canvas channel order.
fn texel_coverage(mode: GlyphRenderMode, content: SwashContent, texel: &[u8]) -> [u8; 3] {
    match content {
        SwashContent::Mask => [texel[0]; 3],
        SwashContent::Color => [texel[3]; 3],
        SwashContent::SubpixelMask => {
            if mode.swaps_red_blue() {
                [texel[2], texel[1], texel[0]]
            } else {
                [texel[0], texel[1], texel[2]]
            }
        }
    }
}

fn average_rgb(rgb: &[u8]) -> u8 {
    let sum: u32 = rgb.iter().take(3).map(|&c| u32::from(c)).sum();
    (sum / 3) as u8
}

impl DrawTarget<CosmicShaper> for Canvas {
    fn move_to(&mut self, x: f32, y: f32) {
        self.pen = (x, y);
    }

    fn show_layout(&mut self, context: &mut CosmicShaper, layout: &CosmicLayout) {
        let (pen_x, pen_y) = self.pen;
        let font_system = context.font_system_mut().inner_mut();

        for run in layout.buffer().layout_runs() {
            for glyph in run.glyphs.iter() {
                self.draw_glyph(
                    font_system,
                    glyph.font_id,
                    glyph.glyph_id,
                    glyph.font_size,
                    (
                        pen_x + glyph.x + glyph.x_offset,
                        pen_y + run.line_y + glyph.y + glyph.y_offset,
                    ),
                    glyph.cache_key_flags,
                );
            }
        }
    }

    fn show_glyph_run(&mut self, context: &mut CosmicShaper, font: &RunFont, run: &GlyphRun) {
        let (pen_x, pen_y) = self.pen;
        let font_system = context.font_system_mut().inner_mut();

        for glyph in run.glyphs() {
            self.draw_glyph(
                font_system,
                font.face,
                glyph.glyph_id.value(),
                font.size,
                (pen_x + glyph.x, pen_y + glyph.y),
                glyph.cache_key_flags,
            );
        }
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mode", &self.mode)
            .field("format", &self.format)
            .field("pen", &self.pen)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composite(
        canvas: &mut Canvas,
        content: SwashContent,
        width: u32,
        height: u32,
        left: i32,
        top: i32,
        data: &[u8],
    ) {
        let mut surface = Surface {
            data: &mut canvas.data,
            width: canvas.width,
            height: canvas.height,
            format: canvas.format,
            mode: canvas.mode,
        };
        surface.composite(content, width, height, left, top, data);
    }

    #[test]
    fn test_render_mode_detection() {
        let mode = GlyphRenderMode::detect_platform();
        // Just verify it returns something without panicking
        let _ = mode.is_subpixel();
    }

    #[test]
    fn test_pixel_format_bytes() {
        assert_eq!(GlyphPixelFormat::Alpha.bytes_per_pixel(), 1);
        assert_eq!(GlyphPixelFormat::SubpixelRgba.bytes_per_pixel(), 4);
    }

    #[test]
    fn canvas_format_follows_mode() {
        let gray = Canvas::new(4, 2, GlyphRenderMode::Grayscale);
        assert_eq!(gray.format(), GlyphPixelFormat::Alpha);
        assert_eq!(gray.data().len(), 8);

        let lcd = Canvas::new(4, 2, GlyphRenderMode::SubpixelHorizontalBgr);
        assert_eq!(lcd.format(), GlyphPixelFormat::SubpixelRgba);
        assert_eq!(lcd.data().len(), 32);
    }

    #[test]
    fn mask_composites_with_clipping() {
        let mut canvas = Canvas::new(3, 3, GlyphRenderMode::Grayscale);
        // 2x2 mask placed one pixel off the left edge.
        composite(&mut canvas, SwashContent::Mask, 2, 2, -1, 1, &[10, 20, 30, 40]);

        assert_eq!(canvas.coverage(0, 0), Some(0));
        assert_eq!(canvas.coverage(0, 1), Some(20));
        assert_eq!(canvas.coverage(0, 2), Some(40));
        assert_eq!(canvas.coverage(1, 1), Some(0));
        assert_eq!(canvas.coverage(3, 0), None);
    }

    #[test]
    fn coverage_keeps_maximum() {
        let mut canvas = Canvas::new(1, 1, GlyphRenderMode::Grayscale);
        composite(&mut canvas, SwashContent::Mask, 1, 1, 0, 0, &[200]);
        composite(&mut canvas, SwashContent::Mask, 1, 1, 0, 0, &[50]);
        assert_eq!(canvas.coverage(0, 0), Some(200));

        canvas.clear();
        assert_eq!(canvas.coverage(0, 0), Some(0));
    }

    #[test]
    fn subpixel_to_grayscale() {
        let mut canvas = Canvas::new(1, 1, GlyphRenderMode::Grayscale);
        composite(&mut canvas, SwashContent::SubpixelMask, 1, 1, 0, 0, &[100, 150, 200, 255]);
        assert_eq!(canvas.coverage(0, 0), Some(150)); // (100 + 150 + 200) / 3
    }

    #[test]
    fn bgr_mode_swaps_channels() {
        let mut canvas = Canvas::new(1, 1, GlyphRenderMode::SubpixelHorizontalBgr);
        composite(&mut canvas, SwashContent::SubpixelMask, 1, 1, 0, 0, &[10, 20, 30, 255]);
        assert_eq!(&canvas.data()[0..4], &[30, 20, 10, 20]);
    }

    #[test]
    fn color_glyphs_use_alpha() {
        let mut canvas = Canvas::new(1, 1, GlyphRenderMode::Grayscale);
        composite(&mut canvas, SwashContent::Color, 1, 1, 0, 0, &[255, 0, 0, 128]);
        assert_eq!(canvas.coverage(0, 0), Some(128));
    }

    #[test]
    fn short_source_skips_missing_texels() {
        let mut canvas = Canvas::new(2, 2, GlyphRenderMode::Grayscale);
        // A 2x2 mask with only three texels present.
        let source = vec![1, 2, 3];
        composite(&mut canvas, SwashContent::Mask, 2, 2, 0, 0, &source);

        assert_eq!(canvas.data(), &[1, 2, 3, 0]);
        // The source is only read.
        assert_eq!(source, [1, 2, 3]);
    }

    #[test]
    fn move_to_sets_pen() {
        let mut canvas = Canvas::new(1, 1, GlyphRenderMode::Grayscale);
        DrawTarget::<CosmicShaper>::move_to(&mut canvas, 3.0, 7.5);
        assert_eq!(canvas.pen(), (3.0, 7.5));
    }
}
