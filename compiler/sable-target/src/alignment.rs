//! Alignment of data on a target. Alignments are always powers of two and
//! are stored as their exponent.

use std::fmt;

use derive_more::{Display, Error};

use crate::size::Size;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, Error)]
pub enum AlignmentError {
    /// The provided alignment size is not a power of two.
    #[display("alignment is not a power of two")]
    NotPowerOfTwo,

    /// The provided alignment value is too large.
    #[display("alignment is larger than 2^32 bytes")]
    TooLarge,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alignment {
    /// The alignment of the data in powers of two bytes.
    ///
    /// N.B. LLVM does not support alignments greater than `2^32`, so the
    /// exponent never exceeds `32`.
    value: u8,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

impl fmt::Debug for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "align[value={}]", self.bytes())
    }
}

impl Alignment {
    pub const ONE: Alignment = Alignment { value: 0 };
    pub const MAX: Alignment = Alignment { value: 32 };

    /// Create a new alignment from the given alignment in bits.
    #[inline]
    pub fn from_bits(size: u64) -> Result<Alignment, AlignmentError> {
        Alignment::from_bytes(Size::from_bits(size).bytes())
    }

    /// Create a new alignment from the given alignment in bytes. A zero
    /// alignment is treated as an alignment of one byte.
    #[inline]
    pub fn from_bytes(size: u64) -> Result<Alignment, AlignmentError> {
        if size == 0 {
            return Ok(Alignment::ONE);
        }

        if !size.is_power_of_two() {
            return Err(AlignmentError::NotPowerOfTwo);
        }

        let value = size.trailing_zeros() as u8;
        if value > Self::MAX.value {
            return Err(AlignmentError::TooLarge);
        }

        Ok(Alignment { value })
    }

    /// The natural alignment of an object of `size`, which is the size
    /// rounded up to a power of two. This is how LLVM aligns vector types
    /// that the data layout does not mention.
    #[inline]
    pub fn natural_for(size: Size) -> Alignment {
        let bytes = size.bytes().max(1).next_power_of_two();
        Alignment { value: (bytes.trailing_zeros() as u8).min(Self::MAX.value) }
    }

    /// Get the alignment value in bytes.
    #[inline]
    pub fn bytes(&self) -> u64 {
        1 << self.value
    }

    /// Get the alignment value in bits.
    #[inline]
    pub fn bits(&self) -> u64 {
        self.bytes() * 8
    }

    /// Lower the [Alignment], if necessary, such that the given `offset`
    /// is a multiple of it.
    ///
    /// N.B. A [Size] of zero is always aligned to any alignment.
    #[inline]
    pub fn restrict_to(self, offset: Size) -> Alignment {
        if offset == Size::ZERO {
            return self;
        }

        self.min(Alignment { value: offset.bytes().trailing_zeros() as u8 })
    }
}

/// A pair of [Alignment]s which represent the ABI specified
/// [Alignment] and a "preferred" [Alignment].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Alignments {
    /// The ABI specified alignment.
    pub abi: Alignment,

    /// The preferred alignment.
    pub preferred: Alignment,
}

impl Alignments {
    /// Create a new [Alignments] pair.
    pub fn new(align: Alignment) -> Alignments {
        Alignments { abi: align, preferred: align }
    }

    /// Get the maximum of two [Alignments].
    #[inline]
    pub fn max(self, other: Alignments) -> Alignments {
        Alignments { abi: self.abi.max(other.abi), preferred: self.preferred.max(other.preferred) }
    }
}
