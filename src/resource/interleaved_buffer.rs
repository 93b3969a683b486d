//! CPU-side buffer shared by several interleaved attributes.

use crate::context::AllocationType;
use crate::error::{BufferError, Result};
use crate::ids::InterleavedBufferId;
use crate::resource::{ArrayElement, BufferSource, TypedArray, UpdateRange};

/// A typed array split into fixed-size records, each holding several attributes.
///
/// The buffer, not the attributes viewing it, is what gets uploaded to the
/// device: every [`InterleavedBufferAttribute`](crate::resource::InterleavedBufferAttribute)
/// over the same buffer shares one device buffer.
#[derive(Debug)]
pub struct InterleavedBuffer {
    id: InterleavedBufferId,
    array: TypedArray,
    stride: usize,
    /// Set when the array was modified since the last upload.
    pub needs_update: bool,
    /// Whether the device should expect frequent updates.
    pub dynamic: bool,
    /// Sub-range pending upload when `needs_update` is set.
    pub update_range: UpdateRange,
}

impl InterleavedBuffer {
    /// Creates an interleaved buffer of records of `stride` elements.
    ///
    /// Fails if `array.len()` is not a multiple of `stride`.
    pub fn new(array: impl Into<TypedArray>, stride: usize, dynamic: bool) -> Result<Self> {
        let array = array.into();

        if stride == 0 || array.len() % stride != 0 {
            return Err(BufferError::InvalidStride {
                len: array.len(),
                stride,
            });
        }

        Ok(InterleavedBuffer {
            id: InterleavedBufferId::next(),
            array,
            stride,
            needs_update: false,
            dynamic,
            update_range: UpdateRange::WHOLE,
        })
    }

    /// The process-unique id of this buffer.
    #[inline]
    pub fn id(&self) -> InterleavedBufferId {
        self.id
    }

    /// Number of elements per record.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of elements.
    #[inline]
    pub fn length(&self) -> usize {
        self.array.len()
    }

    /// Number of records.
    #[inline]
    pub fn count(&self) -> usize {
        self.array.len() / self.stride
    }

    /// The backing array.
    #[inline]
    pub fn array(&self) -> &TypedArray {
        &self.array
    }

    /// Copies record `src_index` of `src` into record `dst_index` of this buffer.
    ///
    /// `self.stride()` elements are copied, read from `src` starting at
    /// `src_index * src.stride()`. Strides that differ semantically produce
    /// garbage, not an error; reading or writing past either array fails with
    /// [`BufferError::OutOfBounds`].
    pub fn copy_at(
        &mut self,
        dst_index: usize,
        src: &InterleavedBuffer,
        src_index: usize,
    ) -> Result<&mut Self> {
        let dst_start = dst_index * self.stride;
        let src_start = src_index * src.stride;

        self.array
            .copy_within_from(dst_start, &src.array, src_start, self.stride)?;

        Ok(self)
    }

    /// Overwrites elements starting at `offset`.
    ///
    /// This does not touch `update_range` nor `needs_update`: callers wanting a
    /// partial re-upload set both themselves.
    pub fn set<T: ArrayElement>(&mut self, values: &[T], offset: usize) -> Result<&mut Self> {
        self.array.set(values, offset)?;
        Ok(self)
    }

    /// Mutable access to the raw elements. Does not mark the buffer dirty.
    #[inline]
    pub fn array_mut(&mut self) -> &mut TypedArray {
        &mut self.array
    }

    /// Deep copy with an independent array, the same stride and dynamic flag, and a new id.
    pub fn clone_buffer(&self) -> InterleavedBuffer {
        InterleavedBuffer {
            id: InterleavedBufferId::next(),
            array: self.array.clone(),
            stride: self.stride,
            needs_update: false,
            dynamic: self.dynamic,
            update_range: UpdateRange::WHOLE,
        }
    }
}

impl BufferSource for InterleavedBuffer {
    fn array(&self) -> &TypedArray {
        &self.array
    }

    fn needs_update(&self) -> bool {
        self.needs_update
    }

    fn set_needs_update(&mut self, value: bool) {
        self.needs_update = value;
    }

    fn update_range(&self) -> UpdateRange {
        self.update_range
    }

    fn update_range_mut(&mut self) -> &mut UpdateRange {
        &mut self.update_range
    }

    fn allocation_type(&self) -> AllocationType {
        if self.dynamic {
            AllocationType::DynamicDraw
        } else {
            AllocationType::StaticDraw
        }
    }
}
