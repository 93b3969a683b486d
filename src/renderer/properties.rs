//! The side-table of device state kept for objects and buffers.

use crate::context::{AllocationType, BufferHandle, BufferType};
use crate::ids::ObjectId;
use crate::resource::ResourceKey;
use bitflags::bitflags;
use glamx::{Mat3, Mat4};
use std::collections::HashMap;

bitflags! {
    /// Lifecycle flags of an object record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RecordFlags: u8 {
        /// Derived matrices are allocated and removal is tracked.
        const INITIALIZED = 1 << 0;
        /// The object has an entry in the registry or the immediate list.
        const ACTIVE = 1 << 1;
    }
}

/// Per-object transient state.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    /// Lifecycle flags.
    pub flags: RecordFlags,
    /// View-space transform, written by the render pass.
    pub model_view_matrix: Mat4,
    /// Normal transform, written by the render pass.
    pub normal_matrix: Mat3,
}

impl Default for ObjectRecord {
    fn default() -> Self {
        ObjectRecord {
            flags: RecordFlags::empty(),
            model_view_matrix: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
        }
    }
}

/// A device buffer holding the data of one [`ResourceKey`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferRecord {
    /// The device buffer.
    pub handle: BufferHandle,
    /// Bind point the buffer was created for.
    pub kind: BufferType,
    /// Usage hint of the last full upload.
    pub usage: AllocationType,
    /// Size of the last full upload, in bytes.
    pub byte_len: usize,
}

/// Object records and buffer records, keyed by identity.
///
/// A buffer record exists iff its device buffer has been uploaded at least
/// once and not released since.
#[derive(Default)]
pub struct Properties {
    objects: HashMap<ObjectId, ObjectRecord>,
    buffers: HashMap<ResourceKey, BufferRecord>,
}

impl Properties {
    /// An empty table.
    pub fn new() -> Properties {
        Properties::default()
    }

    /// The record of an object, if any.
    #[inline]
    pub fn object(&self, id: ObjectId) -> Option<&ObjectRecord> {
        self.objects.get(&id)
    }

    /// The record of an object, if any.
    #[inline]
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(&id)
    }

    /// The record of an object, created empty if missing.
    pub fn object_entry(&mut self, id: ObjectId) -> &mut ObjectRecord {
        self.objects.entry(id).or_default()
    }

    /// Deletes the record of an object.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<ObjectRecord> {
        self.objects.remove(&id)
    }

    /// Number of object records.
    #[inline]
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// The device buffer of a resource, if uploaded.
    #[inline]
    pub fn buffer(&self, key: ResourceKey) -> Option<&BufferRecord> {
        self.buffers.get(&key)
    }

    /// The device buffer of a resource, if uploaded.
    #[inline]
    pub fn buffer_mut(&mut self, key: ResourceKey) -> Option<&mut BufferRecord> {
        self.buffers.get_mut(&key)
    }

    /// Associates a device buffer with a resource.
    pub fn insert_buffer(&mut self, key: ResourceKey, record: BufferRecord) {
        if let Some(previous) = self.buffers.insert(key, record) {
            log::warn!(
                "{:?} already owned {}; it is no longer tracked",
                key,
                previous.handle
            );
        }
    }

    /// Removes the association of a resource with its device buffer.
    pub fn remove_buffer(&mut self, key: ResourceKey) -> Option<BufferRecord> {
        self.buffers.remove(&key)
    }

    /// Number of live buffer records.
    #[inline]
    pub fn num_buffers(&self) -> usize {
        self.buffers.len()
    }
}
