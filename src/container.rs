//! Growable little-endian byte sink with backpatching
//!
//! Container formats that carry length fields ahead of their bodies are
//! written as: record the start offset, write a placeholder, write the body,
//! then overwrite the placeholder once the length is known. [`SizeMark`]
//! captures the recorded offset so the pattern reads the same at every
//! nesting level (file, frame, chunk).

/// Initial capacity for a fresh writer.
const INITIAL_CAPACITY: usize = 256;

/// Append-only byte buffer with little-endian primitive writes.
///
/// The cursor is always the end of the buffer. Backpatches overwrite bytes
/// that were already written and never move the cursor.
#[derive(Debug, Default)]
pub struct ContainerWriter {
    buf: Vec<u8>,
}

/// A placeholder dword recorded by [`ContainerWriter::begin_size`].
///
/// Resolve it with [`ContainerWriter::end_size`] once the body is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a size placeholder must be resolved with end_size"]
pub struct SizeMark {
    start: usize,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity.max(1)) }
    }

    /// Current write position (equal to the number of bytes written).
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Grow geometrically so appends stay amortized O(1).
    fn reserve(&mut self, additional: usize) {
        let needed = self.buf.len() + additional;
        if needed > self.buf.capacity() {
            let target = needed.max(self.buf.capacity() * 2);
            self.buf.reserve_exact(target - self.buf.len());
        }
    }

    pub fn write_byte(&mut self, value: u8) {
        self.reserve(1);
        self.buf.push(value);
    }

    pub fn write_word(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Signed 16-bit value, two's complement little-endian.
    pub fn write_short(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_dword(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, raw: &[u8]) {
        self.reserve(raw.len());
        self.buf.extend_from_slice(raw);
    }

    pub fn write_zeros(&mut self, count: usize) {
        self.reserve(count);
        self.buf.resize(self.buf.len() + count, 0);
    }

    /// Write a word byte-length followed by the UTF-8 bytes of `s`.
    ///
    /// Strings longer than `u16::MAX` bytes are truncated at a char boundary.
    pub fn write_string(&mut self, s: &str) {
        let mut end = s.len().min(u16::MAX as usize);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        let bytes = &s.as_bytes()[..end];
        self.write_word(bytes.len() as u16);
        self.write_bytes(bytes);
    }

    /// Overwrite two bytes at `offset` without moving the cursor.
    ///
    /// # Panics
    ///
    /// Panics if `offset..offset + 2` has not been written yet.
    pub fn backpatch_word(&mut self, offset: usize, value: u16) {
        self.patch(offset, &value.to_le_bytes());
    }

    /// Overwrite four bytes at `offset` without moving the cursor.
    ///
    /// # Panics
    ///
    /// Panics if `offset..offset + 4` has not been written yet.
    pub fn backpatch_dword(&mut self, offset: usize, value: u32) {
        self.patch(offset, &value.to_le_bytes());
    }

    fn patch(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset.checked_add(bytes.len());
        assert!(
            end.is_some_and(|end| end <= self.buf.len()),
            "backpatch at {}..{} lies beyond written length {}",
            offset,
            offset.saturating_add(bytes.len()),
            self.buf.len()
        );
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Record the current offset and write a zero dword placeholder.
    pub fn begin_size(&mut self) -> SizeMark {
        let mark = SizeMark { start: self.position() };
        self.write_dword(0);
        mark
    }

    /// Resolve a placeholder to the byte span from its start to the cursor.
    ///
    /// Returns the patched length.
    pub fn end_size(&mut self, mark: SizeMark) -> u32 {
        let len = (self.position() - mark.start) as u32;
        self.backpatch_dword(mark.start, len);
        len
    }

    /// Consume the writer and return the finished buffer.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
