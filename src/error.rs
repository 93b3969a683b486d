//! Error types.
//!
//! [`BufferError`] covers the fallible operations of the crate: typed array
//! access, interleaved buffer construction and device creation. Recoverable
//! per-frame problems are not errors; they are reported as
//! [`Diagnostic`](crate::renderer::Diagnostic)s.

use thiserror::Error;

/// The error type of fallible buffer and device operations.
#[derive(Error, Debug)]
pub enum BufferError {
    /// An element index fell outside the backing array.
    #[error("index {index} is out of bounds for an array of length {len}")]
    OutOfBounds {
        /// The first offending element index.
        index: usize,
        /// Length of the array that was accessed.
        len: usize,
    },

    /// Two typed arrays (or an array and a slice) hold different element types.
    #[error("element type mismatch: expected {expected}, found {found}")]
    ElementTypeMismatch {
        /// Element type of the destination.
        expected: &'static str,
        /// Element type of the source.
        found: &'static str,
    },

    /// The array length is not a multiple of the record stride.
    #[error("array of length {len} cannot be split into records of stride {stride}")]
    InvalidStride {
        /// Length of the array, in elements.
        len: usize,
        /// Requested stride, in elements.
        stride: usize,
    },

    /// No compatible GPU adapter was found.
    #[error("failed to request a wgpu adapter: {0}")]
    AdapterUnavailable(String),

    /// The GPU device could not be created.
    #[error("failed to create the wgpu device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Alias for `Result<T, BufferError>`.
pub type Result<T> = std::result::Result<T, BufferError>;
