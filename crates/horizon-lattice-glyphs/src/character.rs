//! Terminal cell content.
//!
//! A terminal has a fixed grid of cells and every cell shows exactly one
//! printable character. With Unicode a printable character may be built from
//! several codepoints: a base character followed by combining marks. A
//! [`CharacterBuffer`] holds that sequence as UTF-8 bytes, which is what the
//! shaping engine consumes, so no conversion is needed at draw time.
//!
//! Combining marks are attached with [`CharacterBuffer::append_bytes`] or
//! [`CharacterBuffer::append_codepoints`]. Appending a second base character
//! instead puts two printable characters into one cell and the rendered
//! output will overflow the cell.
//!
//! The buffer content is opaque to this crate. It is never normalized and
//! only compared byte for byte.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_glyphs::CharacterBuffer;
//!
//! let mut ch = CharacterBuffer::new_from_bytes(b"e")?;
//! // U+0301 COMBINING ACUTE ACCENT
//! ch.append_codepoints(&[0x301])?;
//! assert_eq!(ch.get_bytes(), "e\u{301}".as_bytes());
//! # Ok::<(), horizon_lattice_glyphs::GlyphError>(())
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{GlyphError, GlyphResult};

/// Capacity of a freshly created buffer, enough for any single UTF-8 sequence.
pub const DEFAULT_CHARACTER_CAPACITY: usize = 6;

/// Owned, growable byte content of a single terminal cell.
///
/// Growth is exact-fit: when new content does not fit, the capacity grows to
/// precisely the required length. The capacity never shrinks, so
/// [`reset`](Self::reset) followed by new content of the same size does not
/// allocate.
///
/// Equality and hashing only look at the content, never at the capacity.
pub struct CharacterBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl CharacterBuffer {
    /// Create an empty buffer with the default capacity.
    pub fn new() -> GlyphResult<Self> {
        Self::with_capacity(DEFAULT_CHARACTER_CAPACITY)
    }

    /// Create a buffer holding a copy of `bytes`.
    ///
    /// An empty slice behaves like [`new`](Self::new).
    pub fn new_from_bytes(bytes: &[u8]) -> GlyphResult<Self> {
        if bytes.is_empty() {
            return Self::new();
        }

        let mut ch = Self::with_capacity(bytes.len())?;
        ch.set_bytes(bytes)?;
        Ok(ch)
    }

    /// Create a buffer from a sequence of Unicode codepoints.
    ///
    /// Fails with [`GlyphError::EncodingFailure`] if any codepoint is not a
    /// Unicode scalar value.
    pub fn new_from_codepoints(codepoints: &[u32]) -> GlyphResult<Self> {
        if codepoints.is_empty() {
            return Self::new();
        }

        let encoded = encode_codepoints(codepoints)?;
        let mut ch = Self::with_capacity(encoded.len())?;
        ch.set_bytes(encoded.as_bytes())?;
        Ok(ch)
    }

    fn with_capacity(capacity: usize) -> GlyphResult<Self> {
        let capacity = if capacity == 0 {
            DEFAULT_CHARACTER_CAPACITY
        } else {
            capacity
        };

        let mut bytes = Vec::new();
        bytes.try_reserve_exact(capacity)?;
        Ok(Self { bytes, capacity })
    }

    /// Deep copy, keeping the capacity of the original.
    pub fn duplicate(&self) -> GlyphResult<Self> {
        let mut ch = Self::with_capacity(self.capacity)?;
        ch.set_bytes(&self.bytes)?;
        Ok(ch)
    }

    /// Drop the content. The capacity is kept.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Replace the content with `bytes`.
    ///
    /// On [`GlyphError::OutOfMemory`] the previous content is untouched.
    pub fn set_bytes(&mut self, bytes: &[u8]) -> GlyphResult<()> {
        self.reserve_exact_total(bytes.len())?;
        self.bytes.clear();
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Replace the content with a copy of another buffer's content.
    pub fn set(&mut self, other: &CharacterBuffer) -> GlyphResult<()> {
        self.set_bytes(other.get_bytes())
    }

    /// Replace the content with the UTF-8 encoding of `codepoints`.
    pub fn set_from_codepoints(&mut self, codepoints: &[u32]) -> GlyphResult<()> {
        let encoded = encode_codepoints(codepoints)?;
        self.set_bytes(encoded.as_bytes())
    }

    /// Append `bytes` to the current content.
    ///
    /// This is how a combining mark is attached to a base character.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> GlyphResult<()> {
        let required = self
            .bytes
            .len()
            .checked_add(bytes.len())
            .ok_or(GlyphError::OutOfMemory)?;
        self.reserve_exact_total(required)?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Append the UTF-8 encoding of `codepoints` to the current content.
    pub fn append_codepoints(&mut self, codepoints: &[u32]) -> GlyphResult<()> {
        let encoded = encode_codepoints(codepoints)?;
        self.append_bytes(encoded.as_bytes())
    }

    /// Borrow the content bytes.
    pub fn get_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the content in bytes.
    pub fn get_length(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the buffer has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes the buffer can hold without growing.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The content as a string slice, if it is valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    // Grows to exactly `required` bytes. Nothing is written before the
    // reservation succeeded.
    fn reserve_exact_total(&mut self, required: usize) -> GlyphResult<()> {
        if self.capacity < required {
            self.bytes.try_reserve_exact(required - self.bytes.len())?;
            self.capacity = required;
        }
        Ok(())
    }
}

fn encode_codepoints(codepoints: &[u32]) -> GlyphResult<String> {
    let mut out = String::new();
    out.try_reserve(codepoints.len())?;

    for &codepoint in codepoints {
        let c = char::from_u32(codepoint).ok_or(GlyphError::EncodingFailure { codepoint })?;
        out.try_reserve(c.len_utf8())?;
        out.push(c);
    }

    Ok(out)
}

impl PartialEq for CharacterBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.len() == other.bytes.len() && self.bytes == other.bytes
    }
}

impl Eq for CharacterBuffer {}

impl Hash for CharacterBuffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Content only, without a length prefix, so the map hash is the
        // plain DJB2 value of the bytes.
        state.write(&self.bytes);
    }
}

impl fmt::Debug for CharacterBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterBuffer")
            .field("content", &String::from_utf8_lossy(&self.bytes))
            .field("len", &self.bytes.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
