//! [`GpuDevice`] backend over wgpu.

use crate::context::{AllocationType, BufferHandle, BufferType, Context, GpuDevice, UniformLocation};
use std::collections::HashMap;
use thiserror::Error;

const ALIGN: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

struct BufferSlot {
    buffer: Option<wgpu::Buffer>,
    // Usage flags of `buffer`; empty until the first allocation.
    usage: wgpu::BufferUsages,
    // Copy of the buffer content, padded to `ALIGN`. Sub-range writes are
    // widened to aligned boundaries from here.
    shadow: Vec<u8>,
}

/// A [`GpuDevice`] creating real wgpu buffers.
///
/// wgpu has no bind points nor usage hints: binding only selects the target
/// of the next upload, and the allocation type is ignored.
pub struct WgpuDevice {
    context: Context,
    slots: HashMap<BufferHandle, BufferSlot>,
    bound: [Option<BufferHandle>; 2],
    next_handle: u64,
}

impl WgpuDevice {
    /// Creates a backend uploading through the given context.
    pub fn new(context: Context) -> WgpuDevice {
        WgpuDevice {
            context,
            slots: HashMap::new(),
            bound: [None, None],
            next_handle: 1,
        }
    }

    /// The context this backend uploads through.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The wgpu buffer behind `handle`, if data was uploaded to it.
    pub fn buffer(&self, handle: BufferHandle) -> Option<&wgpu::Buffer> {
        self.slots.get(&handle).and_then(|s| s.buffer.as_ref())
    }

    /// Allocates a zeroed uniform buffer of at least `size` bytes.
    ///
    /// Its handle can be used as the `buffer` of a [`UniformLocation`].
    pub fn create_uniform_buffer(&mut self, size: u64) -> BufferHandle {
        let usage = wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST;
        let shadow = vec![0u8; padded_len(size as usize)];
        let buffer = self
            .context
            .create_buffer_init(Some("geobuf uniforms"), &shadow, usage);
        self.insert_slot(Some(buffer), usage, shadow)
    }

    /// Registers a buffer created elsewhere, e.g. one of a render pipeline's
    /// uniform buffers, so `uniform_1fv` can write to it.
    pub fn register_buffer(&mut self, buffer: wgpu::Buffer) -> BufferHandle {
        let usage = buffer.usage();
        let shadow = vec![0u8; buffer.size() as usize];
        self.insert_slot(Some(buffer), usage, shadow)
    }

    fn insert_slot(
        &mut self,
        buffer: Option<wgpu::Buffer>,
        usage: wgpu::BufferUsages,
        shadow: Vec<u8>,
    ) -> BufferHandle {
        let handle = BufferHandle(self.next_handle);
        self.next_handle += 1;
        let _ = self.slots.insert(
            handle,
            BufferSlot {
                buffer,
                usage,
                shadow,
            },
        );
        handle
    }

    fn bound_slot(&mut self, kind: BufferType) -> Option<(BufferHandle, &mut BufferSlot)> {
        let handle = self.bound[kind_index(kind)]?;
        self.slots.get_mut(&handle).map(|slot| (handle, slot))
    }
}

fn kind_index(kind: BufferType) -> usize {
    match kind {
        BufferType::Array => 0,
        BufferType::ElementArray => 1,
    }
}

fn padded_len(len: usize) -> usize {
    (len as u64).div_ceil(ALIGN).max(1) as usize * ALIGN as usize
}

/// Why a uniform write was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UniformWriteError {
    /// The target buffer was not created with `BufferUsages::UNIFORM`.
    #[error("buffer usage {0:?} does not include UNIFORM")]
    NotUniform(wgpu::BufferUsages),
    /// The target buffer cannot be written through the queue.
    #[error("buffer usage {0:?} does not include COPY_DST")]
    NotWritable(wgpu::BufferUsages),
    /// The byte offset is not a multiple of the copy alignment.
    #[error("byte offset {0} is not a multiple of {align}", align = ALIGN)]
    Misaligned(u64),
    /// The write runs past the end of the buffer.
    #[error("write of {len} bytes at {offset} exceeds the {size} buffer bytes")]
    OutOfBounds {
        /// Byte offset of the write.
        offset: u64,
        /// Byte length of the write.
        len: u64,
        /// Size of the buffer.
        size: u64,
    },
}

/// Checks that `len` bytes can be written at `offset` of a uniform buffer.
pub fn validate_uniform_write(
    usage: wgpu::BufferUsages,
    size: u64,
    offset: u64,
    len: u64,
) -> Result<(), UniformWriteError> {
    if !usage.contains(wgpu::BufferUsages::UNIFORM) {
        return Err(UniformWriteError::NotUniform(usage));
    }
    if !usage.contains(wgpu::BufferUsages::COPY_DST) {
        return Err(UniformWriteError::NotWritable(usage));
    }
    if offset % ALIGN != 0 {
        return Err(UniformWriteError::Misaligned(offset));
    }
    if offset.checked_add(len).map_or(true, |end| end > size) {
        return Err(UniformWriteError::OutOfBounds { offset, len, size });
    }
    Ok(())
}

impl GpuDevice for WgpuDevice {
    fn create_buffer(&mut self) -> BufferHandle {
        self.insert_slot(None, wgpu::BufferUsages::empty(), Vec::new())
    }

    fn bind_buffer(&mut self, kind: BufferType, handle: BufferHandle) {
        self.bound[kind_index(kind)] = Some(handle);
    }

    fn buffer_data(&mut self, kind: BufferType, data: &[u8], usage: AllocationType) {
        let ctxt = self.context.clone();
        let Some((handle, slot)) = self.bound_slot(kind) else {
            log::error!("buffer_data called with no {:?} buffer bound", kind);
            return;
        };

        log::trace!("Allocating {} ({} bytes, {:?})", handle, data.len(), usage);

        let mut shadow = vec![0u8; padded_len(data.len())];
        shadow[..data.len()].copy_from_slice(data);

        if let Some(old) = slot.buffer.take() {
            old.destroy();
        }

        let buffer_usage = kind.to_wgpu() | wgpu::BufferUsages::COPY_DST;
        slot.buffer = Some(ctxt.create_buffer_init(Some("geobuf buffer"), &shadow, buffer_usage));
        slot.usage = buffer_usage;
        slot.shadow = shadow;
    }

    fn buffer_sub_data(&mut self, kind: BufferType, byte_offset: u64, data: &[u8]) {
        let ctxt = self.context.clone();
        let Some((handle, slot)) = self.bound_slot(kind) else {
            log::error!("buffer_sub_data called with no {:?} buffer bound", kind);
            return;
        };
        let Some(ref buffer) = slot.buffer else {
            log::error!("buffer_sub_data on {} before any buffer_data", handle);
            return;
        };

        let start = byte_offset as usize;
        let end = start + data.len();
        if end > slot.shadow.len() {
            log::error!(
                "buffer_sub_data on {}: range {}..{} exceeds the {} allocated bytes",
                handle,
                start,
                end,
                slot.shadow.len()
            );
            return;
        }

        slot.shadow[start..end].copy_from_slice(data);

        let aligned_start = (byte_offset / ALIGN * ALIGN) as usize;
        let aligned_end = ((end as u64).div_ceil(ALIGN) * ALIGN) as usize;
        ctxt.write_buffer(
            buffer,
            aligned_start as u64,
            &slot.shadow[aligned_start..aligned_end],
        );
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        if let Some(slot) = self.slots.remove(&handle) {
            log::trace!("Deleting {}", handle);
            if let Some(buffer) = slot.buffer {
                buffer.destroy();
            }
        }

        for bound in self.bound.iter_mut() {
            if *bound == Some(handle) {
                *bound = None;
            }
        }
    }

    fn uniform_1fv(&mut self, location: &UniformLocation, values: &[f32]) {
        let ctxt = self.context.clone();
        let Some(slot) = self.slots.get_mut(&location.buffer) else {
            log::warn!("uniform_1fv: {} does not exist", location.buffer);
            return;
        };
        let Some(ref buffer) = slot.buffer else {
            log::warn!("uniform_1fv: {} holds no data", location.buffer);
            return;
        };

        let data: &[u8] = bytemuck::cast_slice(values);
        if let Err(e) =
            validate_uniform_write(slot.usage, buffer.size(), location.byte_offset, data.len() as u64)
        {
            log::error!("uniform_1fv on {}: {}", location.buffer, e);
            return;
        }

        let start = location.byte_offset as usize;
        let end = start + data.len();
        if end <= slot.shadow.len() {
            slot.shadow[start..end].copy_from_slice(data);
        }
        ctxt.write_buffer(buffer, location.byte_offset, data);
    }
}
