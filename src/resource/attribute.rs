//! Geometry attributes and their device-resource identity.

use crate::ids::{AttributeId, InterleavedBufferId};
use crate::resource::{BufferAttribute, BufferSource, InterleavedBuffer};
use std::cell::RefCell;
use std::rc::Rc;

/// A view of `item_size` components at element `offset` of every record of an
/// [`InterleavedBuffer`].
#[derive(Clone, Debug)]
pub struct InterleavedBufferAttribute {
    data: Rc<RefCell<InterleavedBuffer>>,
    item_size: usize,
    offset: usize,
}

impl InterleavedBufferAttribute {
    /// Creates a view into `data`.
    pub fn new(
        data: Rc<RefCell<InterleavedBuffer>>,
        item_size: usize,
        offset: usize,
    ) -> InterleavedBufferAttribute {
        InterleavedBufferAttribute {
            data,
            item_size,
            offset,
        }
    }

    /// The shared buffer.
    #[inline]
    pub fn data(&self) -> &Rc<RefCell<InterleavedBuffer>> {
        &self.data
    }

    /// Number of components of this attribute in each record.
    #[inline]
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Element offset of this attribute inside a record.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of items, i.e. the number of records of the shared buffer.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.borrow().count()
    }
}

/// The key of a device buffer in the resource table.
///
/// Interleaved attributes are keyed by their shared buffer so that every view
/// of one buffer resolves to the same device buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// A plain attribute owning its array.
    Attribute(AttributeId),
    /// An interleaved buffer shared by several attributes.
    Interleaved(InterleavedBufferId),
}

/// A geometry attribute.
#[derive(Clone, Debug)]
pub enum Attribute {
    /// An attribute owning its own array.
    Plain(Rc<RefCell<BufferAttribute>>),
    /// A view into a shared interleaved buffer.
    Interleaved(InterleavedBufferAttribute),
}

impl Attribute {
    /// Wraps a plain attribute.
    pub fn plain(attribute: BufferAttribute) -> Attribute {
        Attribute::Plain(Rc::new(RefCell::new(attribute)))
    }

    /// The key of the device buffer holding this attribute's data.
    ///
    /// This is the only place deciding attribute identity; both the upload and
    /// the disposal paths go through it.
    pub fn resource_key(&self) -> ResourceKey {
        match self {
            Attribute::Plain(a) => ResourceKey::Attribute(a.borrow().id()),
            Attribute::Interleaved(a) => ResourceKey::Interleaved(a.data.borrow().id()),
        }
    }

    /// The object owning the uploaded data: the attribute itself or its interleaved buffer.
    pub fn buffer_source(&self) -> Rc<RefCell<dyn BufferSource>> {
        match self {
            Attribute::Plain(a) => a.clone() as Rc<RefCell<dyn BufferSource>>,
            Attribute::Interleaved(a) => a.data.clone() as Rc<RefCell<dyn BufferSource>>,
        }
    }

    /// Number of items.
    pub fn count(&self) -> usize {
        match self {
            Attribute::Plain(a) => a.borrow().count(),
            Attribute::Interleaved(a) => a.count(),
        }
    }

    /// Number of components per item.
    pub fn item_size(&self) -> usize {
        match self {
            Attribute::Plain(a) => a.borrow().item_size(),
            Attribute::Interleaved(a) => a.item_size(),
        }
    }

    /// Marks the underlying data dirty.
    pub fn mark_needs_update(&self) {
        self.buffer_source().borrow_mut().set_needs_update(true);
    }
}

impl From<BufferAttribute> for Attribute {
    fn from(attribute: BufferAttribute) -> Self {
        Attribute::plain(attribute)
    }
}

impl From<InterleavedBufferAttribute> for Attribute {
    fn from(attribute: InterleavedBufferAttribute) -> Self {
        Attribute::Interleaved(attribute)
    }
}
