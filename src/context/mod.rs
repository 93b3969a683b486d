//! Device backends: the buffer API consumed by the managers and its implementations.

pub use self::context::Context;
pub use self::device::{AllocationType, BufferHandle, BufferType, GpuDevice, UniformLocation};
pub use self::headless::{DeviceCall, HeadlessDevice};
pub use self::wgpu_device::{validate_uniform_write, UniformWriteError, WgpuDevice};

mod context;
mod device;
mod headless;
mod wgpu_device;
