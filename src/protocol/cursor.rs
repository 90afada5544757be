//! Bounds-checked access to a received frame
//!
//! Every structured read of packet bytes goes through [`PacketView::header`],
//! which proves `[offset, offset + size)` lies inside the frame before handing
//! out the sub-slice. The [`ParseCursor`] only moves forward over ranges that
//! were proven this way.

/// Immutable view over one received frame.
///
/// Borrowed for the duration of a single classification; nothing keeps it
/// afterwards.
#[derive(Debug, Clone, Copy)]
pub struct PacketView<'a> {
    data: &'a [u8],
}

impl<'a> PacketView<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Total frame length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check that `size` bytes starting at `offset` are inside the frame.
    pub fn validate(&self, offset: u32, size: u32) -> bool {
        match offset.checked_add(size) {
            Some(end) => end as usize <= self.data.len(),
            None => false,
        }
    }

    /// Validated sub-slice of exactly `size` bytes at `offset`.
    pub fn header(&self, offset: u32, size: u32) -> Option<&'a [u8]> {
        if !self.validate(offset, size) {
            return None;
        }
        let start = offset as usize;
        self.data.get(start..start + size as usize)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}

/// Position of the next header to parse and the protocol expected there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseCursor {
    offset: u32,
    next_protocol: u16,
}

impl ParseCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn next_protocol(&self) -> u16 {
        self.next_protocol
    }

    pub fn set_next_protocol(&mut self, protocol: u16) {
        self.next_protocol = protocol;
    }

    /// Read `size` bytes at the cursor and advance past them.
    ///
    /// Returns `None` without moving when the range is not inside the frame.
    pub fn take<'a>(&mut self, view: &PacketView<'a>, size: u32) -> Option<&'a [u8]> {
        let bytes = view.header(self.offset, size)?;
        // validate() proved offset + size does not overflow
        self.offset += size;
        Some(bytes)
    }

    /// Read `size` bytes at the cursor without advancing.
    pub fn peek<'a>(&self, view: &PacketView<'a>, size: u32) -> Option<&'a [u8]> {
        view.header(self.offset, size)
    }

    /// Advance past `size` bytes that were proven in bounds by a prior
    /// [`PacketView::validate`] of the same range.
    pub fn advance_checked(&mut self, view: &PacketView<'_>, size: u32) -> bool {
        if !view.validate(self.offset, size) {
            return false;
        }
        self.offset += size;
        true
    }

    /// Advance without proving the range. The next read through `take` or
    /// `peek` still validates, so this can only make a later read fail.
    pub fn advance_unchecked(&mut self, size: u32) {
        self.offset = self.offset.saturating_add(size);
    }
}
