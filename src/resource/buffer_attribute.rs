//! Attributes owning their own array.

use crate::context::AllocationType;
use crate::error::{BufferError, Result};
use crate::ids::AttributeId;
use crate::resource::{ArrayElement, BufferSource, TypedArray, UpdateRange};

/// How an attribute's data is expected to change, and how it is stepped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeUsage {
    /// Uploaded once, rarely modified.
    Static,
    /// Modified frequently; always allocated with a dynamic hint.
    Dynamic,
    /// Stepped once per instance rather than per vertex.
    Instanced {
        /// Number of instances sharing one value.
        mesh_per_attribute: u32,
        /// Whether the instance data is modified frequently.
        dynamic: bool,
    },
}

/// A named-by-its-owner array of `item_size`-component items.
#[derive(Debug)]
pub struct BufferAttribute {
    id: AttributeId,
    array: TypedArray,
    item_size: usize,
    usage: AttributeUsage,
    /// Set when the array was modified since the last upload.
    pub needs_update: bool,
    /// Sub-range pending upload when `needs_update` is set.
    pub update_range: UpdateRange,
}

impl BufferAttribute {
    /// Creates a static attribute.
    ///
    /// Fails if `array.len()` is not a multiple of `item_size`.
    pub fn new(array: impl Into<TypedArray>, item_size: usize) -> Result<BufferAttribute> {
        Self::with_usage(array, item_size, AttributeUsage::Static)
    }

    /// Creates an attribute with the given usage.
    pub fn with_usage(
        array: impl Into<TypedArray>,
        item_size: usize,
        usage: AttributeUsage,
    ) -> Result<BufferAttribute> {
        let array = array.into();

        if item_size == 0 || array.len() % item_size != 0 {
            return Err(BufferError::InvalidStride {
                len: array.len(),
                stride: item_size,
            });
        }

        Ok(BufferAttribute {
            id: AttributeId::next(),
            array,
            item_size,
            usage,
            needs_update: false,
            update_range: UpdateRange::WHOLE,
        })
    }

    /// The process-unique id of this attribute.
    #[inline]
    pub fn id(&self) -> AttributeId {
        self.id
    }

    /// Number of components per item.
    #[inline]
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Number of items.
    #[inline]
    pub fn count(&self) -> usize {
        self.array.len() / self.item_size
    }

    /// The usage of this attribute.
    #[inline]
    pub fn usage(&self) -> AttributeUsage {
        self.usage
    }

    /// The backing array.
    #[inline]
    pub fn array(&self) -> &TypedArray {
        &self.array
    }

    /// Mutable access to the raw elements. Does not mark the attribute dirty.
    #[inline]
    pub fn array_mut(&mut self) -> &mut TypedArray {
        &mut self.array
    }

    /// Overwrites elements starting at `offset`.
    ///
    /// Neither `needs_update` nor `update_range` are touched.
    pub fn set<T: ArrayElement>(&mut self, values: &[T], offset: usize) -> Result<&mut Self> {
        self.array.set(values, offset)?;
        Ok(self)
    }

    /// Replaces the whole array and marks the attribute dirty.
    ///
    /// The update range is reset to the whole buffer.
    pub fn replace_array(&mut self, array: impl Into<TypedArray>) -> Result<()> {
        let array = array.into();

        if array.len() % self.item_size != 0 {
            return Err(BufferError::InvalidStride {
                len: array.len(),
                stride: self.item_size,
            });
        }

        self.array = array;
        self.update_range = UpdateRange::WHOLE;
        self.needs_update = true;
        Ok(())
    }
}

impl BufferSource for BufferAttribute {
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
        match self.usage {
            AttributeUsage::Dynamic => AllocationType::DynamicDraw,
            AttributeUsage::Instanced { dynamic: true, .. } => AllocationType::DynamicDraw,
            AttributeUsage::Instanced { dynamic: false, .. } | AttributeUsage::Static => {
                AllocationType::StaticDraw
            }
        }
    }
}
