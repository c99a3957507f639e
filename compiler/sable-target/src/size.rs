//! Byte sizes of types on a target.

use std::{
    fmt,
    ops::{Add, Mul},
};

use crate::alignment::Alignment;

/// The size of a value in bytes. [Size] offers conversions between bits and
/// bytes, and rounding to an [Alignment].
#[derive(Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Size {
    value: u64,
}

impl Size {
    /// The [Size::ZERO] is often used for type of size 0.
    pub const ZERO: Size = Size { value: 0 };

    /// Create a [Size] from the number of bytes.
    #[inline]
    pub const fn from_bytes(value: u64) -> Self {
        Self { value }
    }

    /// Create a [Size] from the number of bits, rounding up to the next whole
    /// byte.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        // Avoid potential overflow from `bits + 7`.
        Size { value: bits / 8 + ((bits % 8) + 7) / 8 }
    }

    /// Return the [Size] in bytes.
    #[inline]
    pub const fn bytes(self) -> u64 {
        self.value
    }

    /// Convert the [Size] into the number of bits.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.value * 8
    }

    /// Round the [Size] up to the next multiple of `align`.
    #[inline]
    pub fn align_to(self, align: Alignment) -> Size {
        let mask = align.bytes() - 1;
        Size::from_bytes((self.value + mask) & !mask)
    }

    /// Check whether the [Size], read as an offset, is a multiple of `align`.
    #[inline]
    pub fn is_aligned(self, align: Alignment) -> bool {
        self.value & (align.bytes() - 1) == 0
    }

    /// Subtract `other` from the size, yielding [None] on underflow.
    #[inline]
    pub fn checked_sub(self, other: Size) -> Option<Size> {
        self.value.checked_sub(other.value).map(Size::from_bytes)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.value)
    }
}

impl Add for Size {
    type Output = Size;
    #[inline]
    fn add(self, other: Size) -> Size {
        match self.bytes().checked_add(other.bytes()) {
            Some(bytes) => Size::from_bytes(bytes),
            None => panic!("Size::add: {} + {} doesn't fit in u64", self.bytes(), other.bytes()),
        }
    }
}

impl Mul<u64> for Size {
    type Output = Size;
    #[inline]
    fn mul(self, count: u64) -> Size {
        match self.bytes().checked_mul(count) {
            Some(bytes) => Size::from_bytes(bytes),
            None => panic!("Size::mul: {} * {} doesn't fit in u64", self.bytes(), count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_round_up() {
        assert_eq!(Size::from_bits(1).bytes(), 1);
        assert_eq!(Size::from_bits(8).bytes(), 1);
        assert_eq!(Size::from_bits(80).bytes(), 10);
        assert_eq!(Size::from_bits(81).bytes(), 11);
    }

    #[test]
    fn test_align_to() {
        let four = Alignment::from_bytes(4).unwrap();
        let sixteen = Alignment::from_bytes(16).unwrap();

        assert_eq!(Size::from_bytes(10).align_to(four), Size::from_bytes(12));
        assert_eq!(Size::from_bytes(10).align_to(sixteen), Size::from_bytes(16));
        assert_eq!(Size::ZERO.align_to(sixteen), Size::ZERO);
        assert!(Size::from_bytes(12).is_aligned(four));
        assert!(!Size::from_bytes(6).is_aligned(four));
    }
}
