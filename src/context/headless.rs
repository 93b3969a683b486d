//! In-memory [`GpuDevice`] that records every call.

use crate::context::{AllocationType, BufferHandle, BufferType, GpuDevice, UniformLocation};
use std::collections::HashMap;

/// A device call, as recorded by [`HeadlessDevice`].
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCall {
    /// `create_buffer` returned this handle.
    CreateBuffer(BufferHandle),
    /// `bind_buffer(kind, handle)`.
    BindBuffer(BufferType, BufferHandle),
    /// `buffer_data` uploaded `data` to `handle`.
    BufferData {
        /// Bind point used.
        kind: BufferType,
        /// Buffer that was bound at that point.
        handle: BufferHandle,
        /// Uploaded bytes.
        data: Vec<u8>,
        /// Usage hint.
        usage: AllocationType,
    },
    /// `buffer_sub_data` wrote `data` at `byte_offset` of `handle`.
    BufferSubData {
        /// Bind point used.
        kind: BufferType,
        /// Buffer that was bound at that point.
        handle: BufferHandle,
        /// Destination byte offset.
        byte_offset: u64,
        /// Written bytes.
        data: Vec<u8>,
    },
    /// `delete_buffer(handle)`.
    DeleteBuffer(BufferHandle),
    /// `uniform_1fv(location, values)`.
    Uniform1fv(UniformLocation, Vec<f32>),
}

impl DeviceCall {
    /// Whether this call transferred buffer data (full or partial).
    pub fn is_upload(&self) -> bool {
        matches!(
            self,
            DeviceCall::BufferData { .. } | DeviceCall::BufferSubData { .. }
        )
    }
}

/// A device without a GPU.
///
/// Buffer contents are kept in memory and every call is appended to a log,
/// which makes this backend suitable for tests and for tooling that only
/// needs to observe upload traffic.
#[derive(Default)]
pub struct HeadlessDevice {
    calls: Vec<DeviceCall>,
    buffers: HashMap<BufferHandle, Option<Vec<u8>>>,
    uniforms: HashMap<UniformLocation, Vec<f32>>,
    bound: HashMap<BufferType, BufferHandle>,
    next_handle: u64,
}

impl HeadlessDevice {
    /// Creates a device with no buffers.
    pub fn new() -> HeadlessDevice {
        HeadlessDevice {
            next_handle: 1,
            ..Default::default()
        }
    }

    /// Every call received since creation or since the last [`clear_calls`](Self::clear_calls).
    #[inline]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Forgets the recorded calls. Buffer contents are kept.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls that uploaded data.
    pub fn upload_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_upload()).count()
    }

    /// Current content of a buffer; `None` if it does not exist or was never filled.
    pub fn contents(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).and_then(|b| b.as_deref())
    }

    /// Whether `handle` was created and not deleted yet.
    pub fn is_live(&self, handle: BufferHandle) -> bool {
        self.buffers.contains_key(&handle)
    }

    /// Number of buffers created and not deleted yet.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Last values written to a uniform.
    pub fn uniform(&self, location: &UniformLocation) -> Option<&[f32]> {
        self.uniforms.get(location).map(|v| &v[..])
    }

    fn bound(&self, kind: BufferType) -> Option<BufferHandle> {
        self.bound.get(&kind).copied()
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_buffer(&mut self) -> BufferHandle {
        let handle = BufferHandle(self.next_handle.max(1));
        self.next_handle = handle.0 + 1;
        let _ = self.buffers.insert(handle, None);
        self.calls.push(DeviceCall::CreateBuffer(handle));
        handle
    }

    fn bind_buffer(&mut self, kind: BufferType, handle: BufferHandle) {
        let _ = self.bound.insert(kind, handle);
        self.calls.push(DeviceCall::BindBuffer(kind, handle));
    }

    fn buffer_data(&mut self, kind: BufferType, data: &[u8], usage: AllocationType) {
        let Some(handle) = self.bound(kind) else {
            log::error!("buffer_data called with no {:?} buffer bound", kind);
            return;
        };

        if let Some(content) = self.buffers.get_mut(&handle) {
            *content = Some(data.to_vec());
        }

        self.calls.push(DeviceCall::BufferData {
            kind,
            handle,
            data: data.to_vec(),
            usage,
        });
    }

    fn buffer_sub_data(&mut self, kind: BufferType, byte_offset: u64, data: &[u8]) {
        let Some(handle) = self.bound(kind) else {
            log::error!("buffer_sub_data called with no {:?} buffer bound", kind);
            return;
        };

        if let Some(Some(content)) = self.buffers.get_mut(&handle) {
            let start = byte_offset as usize;
            let end = start + data.len();
            if end <= content.len() {
                content[start..end].copy_from_slice(data);
            } else {
                log::error!(
                    "buffer_sub_data on {}: range {}..{} exceeds {} bytes",
                    handle,
                    start,
                    end,
                    content.len()
                );
            }
        }

        self.calls.push(DeviceCall::BufferSubData {
            kind,
            handle,
            byte_offset,
            data: data.to_vec(),
        });
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        let _ = self.buffers.remove(&handle);
        self.bound.retain(|_, h| *h != handle);
        self.calls.push(DeviceCall::DeleteBuffer(handle));
    }

    fn uniform_1fv(&mut self, location: &UniformLocation, values: &[f32]) {
        let _ = self.uniforms.insert(*location, values.to_vec());
        self.calls
            .push(DeviceCall::Uniform1fv(*location, values.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_data_patches_the_bound_buffer() {
        let mut device = HeadlessDevice::new();
        let handle = device.create_buffer();
        device.bind_buffer(BufferType::Array, handle);
        device.buffer_data(BufferType::Array, &[0, 0, 0, 0], AllocationType::StaticDraw);
        device.buffer_sub_data(BufferType::Array, 1, &[7, 8]);

        assert_eq!(device.contents(handle), Some(&[0u8, 7, 8, 0][..]));
        assert_eq!(device.upload_count(), 2);
    }

    #[test]
    fn deleted_buffers_are_no_longer_live() {
        let mut device = HeadlessDevice::new();
        let a = device.create_buffer();
        let b = device.create_buffer();
        assert_ne!(a, b);

        device.delete_buffer(a);
        assert!(!device.is_live(a));
        assert!(device.is_live(b));
        assert_eq!(device.live_buffers(), 1);
    }
}
