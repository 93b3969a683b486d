//! CPU-side buffer data: typed arrays, attributes and interleaved buffers.

pub use crate::resource::attribute::{Attribute, InterleavedBufferAttribute, ResourceKey};
pub use crate::resource::buffer_attribute::{AttributeUsage, BufferAttribute};
pub use crate::resource::buffer_source::{BufferSource, UpdateRange};
pub use crate::resource::interleaved_buffer::InterleavedBuffer;
pub use crate::resource::typed_array::{ArrayElement, TypedArray};

mod attribute;
mod buffer_attribute;
mod buffer_source;
mod interleaved_buffer;
mod typed_array;
