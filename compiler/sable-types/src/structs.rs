//! Declarations of `struct` and `union` types, and the C-compatible layout
//! that is computed for them when they are finalised.

use bitflags::bitflags;
use sable_target::{alignment::Alignment, size::Size};

use crate::ty::{Identifier, TyId};

/// The name of the builtin aggregate that backs `va_list` on targets where it
/// is a structure.
pub const VA_LIST_TAG_NAME: &str = "__va_list";

bitflags! {
    /// Flags which denote additional information about a declared aggregate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StructFlags: u8 {
        /// The aggregate is a `union`, all fields start at offset zero.
        const UNION = 1 << 0;

        /// Fields are laid out without any padding.
        const PACKED = 1 << 1;

        /// The aggregate has a copy constructor, postblit or destructor, so it
        /// cannot be copied bitwise.
        const NON_POD = 1 << 2;

        /// The aggregate declares a constructor. This alone does not make it
        /// non-POD, but some conventions treat it as such.
        const HAS_CTOR = 1 << 3;

        /// The aggregate is a compiler builtin such as `__va_list_tag`.
        const BUILTIN = 1 << 4;
    }
}

/// A field within a [StructDecl].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// The name of the field.
    pub name: Identifier,

    /// The type of the field.
    pub ty: TyId,

    /// The offset of the field from the start of the aggregate. This is only
    /// meaningful once the aggregate has been finalised.
    pub offset: Size,
}

impl StructField {
    pub fn new(name: impl Into<Identifier>, ty: TyId) -> Self {
        Self { name: name.into(), ty, offset: Size::ZERO }
    }
}

/// The computed layout of a finalised aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructLayout {
    pub size: Size,
    pub align: Alignment,
}

/// A declared `struct` or `union`.
#[derive(Debug, Clone)]
pub struct StructDecl {
    /// The name of the aggregate.
    pub name: Identifier,

    /// The fields in declaration order.
    pub fields: Vec<StructField>,

    /// Additional information about the aggregate.
    pub flags: StructFlags,

    /// An explicit `align(N)` on the declaration.
    pub explicit_align: Option<Alignment>,

    /// The layout of the aggregate, `None` until it has been finalised.
    layout: Option<StructLayout>,
}

impl StructDecl {
    /// Create a new [StructDecl] which has not yet been finalised.
    pub fn new(name: impl Into<Identifier>, fields: Vec<StructField>) -> Self {
        Self {
            name: name.into(),
            fields,
            flags: StructFlags::empty(),
            explicit_align: None,
            layout: None,
        }
    }

    /// Create a [StructDecl] with the specified [StructFlags].
    pub fn with_flags(mut self, flags: StructFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Give the [StructDecl] an explicit alignment.
    pub fn with_align(mut self, align: Alignment) -> Self {
        self.explicit_align = Some(align);
        self
    }

    pub fn is_union(&self) -> bool {
        self.flags.contains(StructFlags::UNION)
    }

    pub fn is_packed(&self) -> bool {
        self.flags.contains(StructFlags::PACKED)
    }

    /// Whether the aggregate can be copied bitwise. If `exclude_ctor` is set,
    /// declaring a constructor also disqualifies the aggregate.
    pub fn is_pod(&self, exclude_ctor: bool) -> bool {
        !self.flags.contains(StructFlags::NON_POD)
            && !(exclude_ctor && self.flags.contains(StructFlags::HAS_CTOR))
    }

    /// Whether this is the builtin aggregate that backs `va_list`.
    pub fn is_va_list_tag(&self) -> bool {
        self.flags.contains(StructFlags::BUILTIN) && &*self.name == VA_LIST_TAG_NAME
    }

    pub fn is_finalised(&self) -> bool {
        self.layout.is_some()
    }

    pub fn layout(&self) -> Option<StructLayout> {
        self.layout
    }

    /// Record the computed layout of the aggregate along with the offsets of
    /// each field.
    pub(crate) fn finalise(&mut self, offsets: Vec<Size>, layout: StructLayout) {
        debug_assert_eq!(offsets.len(), self.fields.len());

        for (field, offset) in self.fields.iter_mut().zip(offsets) {
            field.offset = offset;
        }

        self.layout = Some(layout);
    }
}
