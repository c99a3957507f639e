//! Scalar primitives of target ABIs that are shared between the type system
//! and the calling-convention lowering.

use crate::{alignment::Alignments, data_layout::HasDataLayout, size::Size};

/// ABI representation of an integer scalar type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Integer {
    I8,
    I16,
    I32,
    I64,
    I128,
}

impl Integer {
    /// Compute the [Size] of the [Integer].
    #[inline]
    pub fn size(self) -> Size {
        use Integer::*;

        match self {
            I8 => Size::from_bytes(1),
            I16 => Size::from_bytes(2),
            I32 => Size::from_bytes(4),
            I64 => Size::from_bytes(8),
            I128 => Size::from_bytes(16),
        }
    }

    /// Get the [Alignments] of the [Integer].
    pub fn align<C: HasDataLayout>(self, ctx: &C) -> Alignments {
        use Integer::*;
        let dl = ctx.data_layout();

        match self {
            I8 => dl.i8_align,
            I16 => dl.i16_align,
            I32 => dl.i32_align,
            I64 => dl.i64_align,
            I128 => dl.i128_align,
        }
    }

    /// Find the smallest [Integer] that is at least `size` bytes wide.
    pub fn fitting(size: Size) -> Option<Integer> {
        use Integer::*;

        match size.bytes() {
            0..=1 => Some(I8),
            2 => Some(I16),
            3..=4 => Some(I32),
            5..=8 => Some(I64),
            9..=16 => Some(I128),
            _ => None,
        }
    }
}
