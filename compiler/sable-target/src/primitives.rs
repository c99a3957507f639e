//! Primitive integer and floating-point kinds of the source language, and how
//! large they are on a target.

use std::fmt;

use crate::{alignment::Alignments, data_layout::HasDataLayout, size::Size};

/// A primitive floating-point type.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FloatTy {
    F32,
    F64,

    /// The x87 80-bit extended precision type.
    F80,
}

impl FloatTy {
    /// Number of bytes that hold the value itself, excluding any padding the
    /// target adds when the value is stored in memory.
    #[inline]
    pub fn store_size(self) -> Size {
        match self {
            FloatTy::F32 => Size::from_bytes(4),
            FloatTy::F64 => Size::from_bytes(8),
            FloatTy::F80 => Size::from_bytes(10),
        }
    }

    /// The in-memory size of the type, i.e. the store size rounded up to
    /// the ABI alignment. For `F80` this is 12 bytes on x86 and 16 bytes on
    /// x86-64.
    pub fn size<C: HasDataLayout>(self, cx: &C) -> Size {
        self.store_size().align_to(self.align(cx).abi)
    }

    /// Get the [Alignments] of the [FloatTy].
    pub fn align<C: HasDataLayout>(self, cx: &C) -> Alignments {
        let dl = cx.data_layout();

        match self {
            FloatTy::F32 => dl.f32_align,
            FloatTy::F64 => dl.f64_align,
            FloatTy::F80 => dl.f80_align,
        }
    }
}

impl fmt::Display for FloatTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatTy::F32 => write!(f, "f32"),
            FloatTy::F64 => write!(f, "f64"),
            FloatTy::F80 => write!(f, "f80"),
        }
    }
}

/// Width of an integer type, independent of its signedness.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    W128,

    /// As wide as a pointer on the target.
    Ptr,
}

impl IntWidth {
    /// Get the [Size] of the width given the pointer size of the target.
    pub fn size(self, ptr_size: Size) -> Size {
        match self {
            IntWidth::W8 => Size::from_bytes(1),
            IntWidth::W16 => Size::from_bytes(2),
            IntWidth::W32 => Size::from_bytes(4),
            IntWidth::W64 => Size::from_bytes(8),
            IntWidth::W128 => Size::from_bytes(16),
            IntWidth::Ptr => ptr_size,
        }
    }
}

/// The representation of an integer type.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct IntTy {
    /// How wide the integer is.
    pub width: IntWidth,

    /// Whether the integer is signed.
    pub signed: bool,
}

impl IntTy {
    pub const fn signed(width: IntWidth) -> Self {
        Self { width, signed: true }
    }

    pub const fn unsigned(width: IntWidth) -> Self {
        Self { width, signed: false }
    }

    /// Function to get the size of the integer type in bytes.
    pub fn size(&self, ptr_size: Size) -> Size {
        self.width.size(ptr_size)
    }

    /// Convert the type into a name.
    pub fn to_name(&self) -> &'static str {
        match (self.width, self.signed) {
            (IntWidth::W8, true) => "byte",
            (IntWidth::W8, false) => "ubyte",
            (IntWidth::W16, true) => "short",
            (IntWidth::W16, false) => "ushort",
            (IntWidth::W32, true) => "int",
            (IntWidth::W32, false) => "uint",
            (IntWidth::W64, true) => "long",
            (IntWidth::W64, false) => "ulong",
            (IntWidth::W128, true) => "cent",
            (IntWidth::W128, false) => "ucent",
            (IntWidth::Ptr, true) => "ptrdiff_t",
            (IntWidth::Ptr, false) => "size_t",
        }
    }
}

impl fmt::Display for IntTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_name())
    }
}
