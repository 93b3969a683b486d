//! Process-unique identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! unique_id(
    ($(#[$meta: meta])* $name: ident, $counter: ident) => {
        static $counter: AtomicU64 = AtomicU64::new(1);

        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u64);

        impl $name {
            /// Allocates an identifier never returned before in this process.
            #[inline]
            pub fn next() -> $name {
                $name($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// The raw value.
            #[inline]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    }
);

unique_id!(
    /// Identity of a scene object.
    ObjectId,
    NEXT_OBJECT_ID
);
unique_id!(
    /// Identity of a geometry; the key of the geometry cache.
    GeometryId,
    NEXT_GEOMETRY_ID
);
unique_id!(
    /// Identity of a non-interleaved buffer attribute.
    AttributeId,
    NEXT_ATTRIBUTE_ID
);
unique_id!(
    /// Identity of an interleaved buffer.
    InterleavedBufferId,
    NEXT_INTERLEAVED_BUFFER_ID
);
