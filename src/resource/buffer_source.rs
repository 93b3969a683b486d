//! What the upload path needs to know about anything backed by a device buffer.

use crate::context::AllocationType;
use crate::resource::TypedArray;

/// The sub-range of a buffer pending upload, in elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateRange {
    /// First element to upload.
    pub offset: usize,
    /// Number of elements to upload. `-1` (or any negative value) means the whole buffer, `0` means nothing pending.
    pub count: isize,
}

impl UpdateRange {
    /// The whole buffer is pending.
    pub const WHOLE: UpdateRange = UpdateRange {
        offset: 0,
        count: -1,
    };

    /// A pending span of `count` elements starting at `offset`.
    #[inline]
    pub fn new(offset: usize, count: isize) -> UpdateRange {
        UpdateRange { offset, count }
    }

    /// Does this range cover the whole buffer?
    #[inline]
    pub fn is_whole(&self) -> bool {
        self.count < 0
    }

    /// Is nothing pending?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for UpdateRange {
    fn default() -> Self {
        UpdateRange::WHOLE
    }
}

/// Data that owns a device buffer: a plain attribute or an interleaved buffer.
pub trait BufferSource {
    /// The CPU-side data.
    fn array(&self) -> &TypedArray;

    /// Whether the CPU-side data differs from the last upload.
    fn needs_update(&self) -> bool;

    /// Sets or clears the dirty flag.
    fn set_needs_update(&mut self, value: bool);

    /// The pending sub-range.
    fn update_range(&self) -> UpdateRange;

    /// Mutable access to the pending sub-range.
    fn update_range_mut(&mut self) -> &mut UpdateRange;

    /// Usage hint used when the device buffer is first allocated.
    fn allocation_type(&self) -> AllocationType;
}
