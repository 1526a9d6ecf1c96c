//! A draw target that only records commands.
//!
//! Useful for headless pipelines that replay cell drawing elsewhere, and for
//! checking what the cache issued without rasterizing anything.

use crate::backend::{DrawTarget, ShapingContext};

/// A drawing command issued by [`GlyphCache::draw`](crate::GlyphCache::draw).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// Pen moved to the given position.
    MoveTo {
        /// Horizontal position in pixels.
        x: f32,
        /// Vertical position in pixels.
        y: f32,
    },
    /// A full layout was drawn.
    ShowLayout,
    /// A single glyph run was drawn.
    ShowGlyphRun,
}

/// [`DrawTarget`] that appends every command to a list.
#[derive(Debug, Clone, Default)]
pub struct RecordingTarget {
    commands: Vec<DrawCommand>,
}

impl RecordingTarget {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, oldest first.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Forget all recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl<C: ShapingContext + ?Sized> DrawTarget<C> for RecordingTarget {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::MoveTo { x, y });
    }

    fn show_layout(&mut self, _context: &mut C, _layout: &C::Layout) {
        self.commands.push(DrawCommand::ShowLayout);
    }

    fn show_glyph_run(&mut self, _context: &mut C, _font: &C::Font, _run: &C::Run) {
        self.commands.push(DrawCommand::ShowGlyphRun);
    }
}
