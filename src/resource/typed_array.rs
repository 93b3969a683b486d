//! Typed numeric arrays backing attributes and interleaved buffers.

use crate::error::{BufferError, Result};
use bytemuck::Pod;

/// A contiguous array of one of the numeric types a GPU buffer can hold.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypedArray {
    /// 32-bit floats (positions, normals, uvs, weights).
    F32(Vec<f32>),
    /// 16-bit unsigned integers (small index buffers).
    U16(Vec<u16>),
    /// 32-bit unsigned integers (index buffers).
    U32(Vec<u32>),
}

impl TypedArray {
    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            TypedArray::F32(v) => v.len(),
            TypedArray::U16(v) => v.len(),
            TypedArray::U32(v) => v.len(),
        }
    }

    /// Is this array empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of one element, in bytes.
    #[inline]
    pub fn bytes_per_element(&self) -> usize {
        match self {
            TypedArray::F32(_) => 4,
            TypedArray::U16(_) => 2,
            TypedArray::U32(_) => 4,
        }
    }

    /// Name of the element type, for error messages.
    pub fn element_name(&self) -> &'static str {
        match self {
            TypedArray::F32(_) => f32::NAME,
            TypedArray::U16(_) => u16::NAME,
            TypedArray::U32(_) => u32::NAME,
        }
    }

    /// The whole array as raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TypedArray::F32(v) => bytemuck::cast_slice(v),
            TypedArray::U16(v) => bytemuck::cast_slice(v),
            TypedArray::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Bytes of the elements `[offset, offset + count)`, clamped to the array end.
    pub fn byte_range(&self, offset: usize, count: usize) -> &[u8] {
        let bpe = self.bytes_per_element();
        let bytes = self.as_bytes();
        let start = offset.saturating_mul(bpe).min(bytes.len());
        let end = offset
            .saturating_add(count)
            .saturating_mul(bpe)
            .min(bytes.len());
        &bytes[start..end]
    }

    /// Typed read access; `None` if `T` is not the element type.
    #[inline]
    pub fn as_slice<T: ArrayElement>(&self) -> Option<&[T]> {
        T::slice(self)
    }

    /// Typed write access; `None` if `T` is not the element type.
    #[inline]
    pub fn as_mut_slice<T: ArrayElement>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(self)
    }

    /// Copies `count` elements from `src[src_start..]` into `self[dst_start..]`.
    pub(crate) fn copy_within_from(
        &mut self,
        dst_start: usize,
        src: &TypedArray,
        src_start: usize,
        count: usize,
    ) -> Result<()> {
        fn copy<T: Copy>(
            dst: &mut [T],
            dst_start: usize,
            src: &[T],
            src_start: usize,
            count: usize,
        ) -> Result<()> {
            if src_start + count > src.len() {
                return Err(BufferError::OutOfBounds {
                    index: src_start + count - 1,
                    len: src.len(),
                });
            }
            if dst_start + count > dst.len() {
                return Err(BufferError::OutOfBounds {
                    index: dst_start + count - 1,
                    len: dst.len(),
                });
            }
            dst[dst_start..dst_start + count].copy_from_slice(&src[src_start..src_start + count]);
            Ok(())
        }

        match (self, src) {
            (TypedArray::F32(d), TypedArray::F32(s)) => copy(d, dst_start, s, src_start, count),
            (TypedArray::U16(d), TypedArray::U16(s)) => copy(d, dst_start, s, src_start, count),
            (TypedArray::U32(d), TypedArray::U32(s)) => copy(d, dst_start, s, src_start, count),
            (d, s) => Err(BufferError::ElementTypeMismatch {
                expected: d.element_name(),
                found: s.element_name(),
            }),
        }
    }

    /// Overwrites `values.len()` elements starting at `offset`.
    pub fn set<T: ArrayElement>(&mut self, values: &[T], offset: usize) -> Result<()> {
        let expected = self.element_name();
        let dst = T::slice_mut(self).ok_or(BufferError::ElementTypeMismatch {
            expected,
            found: T::NAME,
        })?;

        if offset + values.len() > dst.len() {
            return Err(BufferError::OutOfBounds {
                index: offset + values.len() - 1,
                len: dst.len(),
            });
        }

        dst[offset..offset + values.len()].copy_from_slice(values);
        Ok(())
    }
}

impl From<Vec<f32>> for TypedArray {
    fn from(v: Vec<f32>) -> Self {
        TypedArray::F32(v)
    }
}

impl From<Vec<u16>> for TypedArray {
    fn from(v: Vec<u16>) -> Self {
        TypedArray::U16(v)
    }
}

impl From<Vec<u32>> for TypedArray {
    fn from(v: Vec<u32>) -> Self {
        TypedArray::U32(v)
    }
}

/// A scalar type that can be stored in a [`TypedArray`].
pub trait ArrayElement: Pod {
    /// Human-readable type name.
    const NAME: &'static str;

    /// Typed view of `array` if its elements are `Self`.
    fn slice(array: &TypedArray) -> Option<&[Self]>;

    /// Mutable typed view of `array` if its elements are `Self`.
    fn slice_mut(array: &mut TypedArray) -> Option<&mut [Self]>;
}

macro_rules! array_element(
    ($t: ty, $variant: ident, $name: expr) => {
        impl ArrayElement for $t {
            const NAME: &'static str = $name;

            #[inline]
            fn slice(array: &TypedArray) -> Option<&[Self]> {
                match array {
                    TypedArray::$variant(v) => Some(v),
                    _ => None,
                }
            }

            #[inline]
            fn slice_mut(array: &mut TypedArray) -> Option<&mut [Self]> {
                match array {
                    TypedArray::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    }
);

array_element!(f32, F32, "f32");
array_element!(u16, U16, "u16");
array_element!(u32, U32, "u32");
