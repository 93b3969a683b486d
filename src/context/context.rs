//! wgpu rendering context.
//!
//! Bundles the wgpu handles the [`WgpuDevice`](crate::context::WgpuDevice)
//! backend needs to create and fill buffers.

use crate::error::{BufferError, Result};
use std::sync::Arc;

/// The wgpu rendering context containing all GPU resources needed for buffer management.
///
/// This struct is cloneable. It wraps wgpu resources in Arc to allow sharing
/// with the rest of an application.
#[derive(Clone)]
pub struct Context {
    /// The wgpu instance the adapter was requested from.
    pub instance: Arc<wgpu::Instance>,
    /// The wgpu device used for creating GPU resources.
    pub device: Arc<wgpu::Device>,
    /// The wgpu queue used for buffer writes.
    pub queue: Arc<wgpu::Queue>,
    /// The wgpu adapter information.
    pub adapter: Arc<wgpu::Adapter>,
}

impl Context {
    /// Wraps already-created wgpu handles.
    ///
    /// Use this when the application owns the window and surface and has
    /// created its device itself.
    pub fn new(
        instance: wgpu::Instance,
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter: wgpu::Adapter,
    ) -> Context {
        Context {
            instance: Arc::new(instance),
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter: Arc::new(adapter),
        }
    }

    /// Requests an adapter and a device that are not tied to any surface.
    pub async fn request_headless() -> Result<Context> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BufferError::AdapterUnavailable(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("geobuf device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await?;

        log::debug!("Created headless wgpu device on {:?}", adapter.get_info().name);

        Ok(Context::new(instance, device, queue, adapter))
    }

    /// Blocking version of [`Context::request_headless`].
    #[cfg(not(target_arch = "wasm32"))]
    pub fn request_headless_blocking() -> Result<Context> {
        pollster::block_on(Self::request_headless())
    }

    /// Creates a buffer initialized with `contents`.
    ///
    /// The size is padded to `wgpu::COPY_BUFFER_ALIGNMENT`.
    pub fn create_buffer_init(
        &self,
        label: Option<&str>,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents,
                usage,
            })
    }

    /// Writes data to a buffer through the queue.
    ///
    /// # Arguments
    /// * `buffer` - The buffer to write to
    /// * `offset` - Byte offset into the buffer, a multiple of `wgpu::COPY_BUFFER_ALIGNMENT`
    /// * `data` - The data to write, its length a multiple of `wgpu::COPY_BUFFER_ALIGNMENT`
    pub fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }
}
