//! Registration of scene objects and management of their device buffers.

pub use self::diagnostic::Diagnostic;
pub use self::geometries::GeometryCache;
pub use self::info::{MemoryInfo, RenderInfo};
pub use self::objects::ObjectManager;
pub use self::properties::{BufferRecord, ObjectRecord, Properties, RecordFlags};
pub use self::render_list::{ImmediateEntry, RenderEntry};
pub use self::settings::{ObjectSettings, MAX_MORPH_TARGETS};

mod diagnostic;
mod geometries;
mod info;
pub mod morph;
mod objects;
mod properties;
mod render_list;
mod settings;
