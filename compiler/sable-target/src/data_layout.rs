//! Contains common interfaces for layouts on various targets, and
//! as well an interface to access information about a specific
//! layout. Furthermore, this module contains logic about parsing
//! layout from a "layout specification" string, more information
//! about this can be found [here](https://llvm.org/docs/LangRef.html#data-layout).

use std::num::ParseIntError;

use derive_more::{Display, Error};

use crate::{
    abi::Integer,
    alignment::{Alignment, Alignments},
    size::Size,
};

/// Interface to access information about the target layout.
pub trait HasDataLayout {
    fn data_layout(&self) -> &TargetDataLayout;
}

impl HasDataLayout for TargetDataLayout {
    #[inline]
    fn data_layout(&self) -> &TargetDataLayout {
        self
    }
}

/// The byte order of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Values use the little endian format.
    Little,

    /// Values use the big endian format.
    Big,
}

impl Endian {
    /// Convert the [Endian] to a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endian::Little => "little",
            Endian::Big => "big",
        }
    }
}

/// Defines all of the specifics of how primitive types are
/// laid out for a specific target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDataLayout {
    /// The kind of Endianness that the target uses.
    pub endian: Endian,

    /// Alignment of bit values on the target.
    pub i1_align: Alignments,

    /// The alignment of byte values on the target.
    pub i8_align: Alignments,

    /// The alignment of 16-bit values on the target.
    pub i16_align: Alignments,

    /// The alignment of 32-bit values on the target.
    pub i32_align: Alignments,

    /// The alignment of 64-bit values on the target.
    pub i64_align: Alignments,

    /// The alignment of 128-bit values on the target.
    pub i128_align: Alignments,

    /// The [Size] of a pointer on the target.
    pub pointer_size: Size,

    /// The alignment of pointers on the target.
    pub pointer_align: Alignments,

    /// Alignment of `f32` values on the target.
    pub f32_align: Alignments,

    /// Alignment of `f64` values on the target.
    pub f64_align: Alignments,

    /// Alignment of x87 extended precision values on the target.
    pub f80_align: Alignments,

    /// Alignment specifics of aggregate types on the target.
    pub aggregate_align: Alignments,

    /// Alignment of vector types on the target. Each element
    /// corresponds a pair of the "vector" size, and its alignment.
    pub vector_align: Vec<(Size, Alignments)>,
}

impl TargetDataLayout {
    /// Get an equivalent [Integer] representation for a pointer
    /// on the current target.
    pub fn ptr_sized_integer(&self) -> Integer {
        match self.pointer_size.bits() {
            16 => Integer::I16,
            32 => Integer::I32,
            _ => Integer::I64,
        }
    }

    /// Get the alignment of a vector type of the given total `size`. Sizes
    /// that are not listed in the layout are naturally aligned.
    pub fn vector_align_for(&self, size: Size) -> Alignments {
        self.vector_align
            .iter()
            .find(|(vector_size, _)| *vector_size == size)
            .map(|(_, align)| *align)
            .unwrap_or_else(|| Alignments::new(Alignment::natural_for(size)))
    }
}

impl Default for TargetDataLayout {
    /// Create a default value for [`TargetDataLayout`] based on the
    /// LLVM specification for the default data layout.
    ///
    /// N.B. LLVM has no default for `f80`, it is naturally aligned to 16
    /// bytes here like on x86-64.
    fn default() -> Self {
        let align = |bits| Alignments::new(Alignment::from_bits(bits).unwrap_or(Alignment::ONE));
        let align_pair = |abi, preferred| Alignments {
            abi: Alignment::from_bits(abi).unwrap_or(Alignment::ONE),
            preferred: Alignment::from_bits(preferred).unwrap_or(Alignment::ONE),
        };

        Self {
            endian: Endian::Little,
            i1_align: align(8),
            i8_align: align(8),
            i16_align: align(16),
            i32_align: align(32),
            i64_align: align_pair(32, 64),
            i128_align: align_pair(32, 64),
            pointer_size: Size::from_bits(64),
            pointer_align: align(64),
            f32_align: align(32),
            f64_align: align(64),
            f80_align: align(128),
            aggregate_align: align_pair(0, 64),
            vector_align: vec![
                (Size::from_bits(64), align(64)),
                (Size::from_bits(128), align(128)),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TargetDataLayoutParseError {
    /// The data layout string was empty.
    #[display("the data layout string is empty")]
    Malformed,

    /// The string specified an invalid alignment.
    #[display("invalid alignment in `{cause}`")]
    InvalidAlignment { cause: String },

    /// Some unexpected bits were found in the string.
    #[display("invalid {kind} `{bit}` in `{cause}`: {err}")]
    InvalidBits {
        kind: &'static str,
        bit: String,
        cause: String,
        #[error(source)]
        err: ParseIntError,
    },

    /// The string is missing an alignment after a type specifier.
    #[display("missing alignment for `{cause}`")]
    MissingAlignment { cause: String },
}

impl TargetDataLayout {
    /// Parse a [`TargetDataLayout`] from a "layout specification" string.
    ///
    /// The data layout string is specified in the LLVM documentation
    /// [here](https://llvm.org/docs/LangRef.html#data-layout).
    pub fn parse_from_llvm_data_layout_string(
        input: &str,
    ) -> Result<Self, TargetDataLayoutParseError> {
        let mut data_layout = Self::default();
        let mut i128_align_src = 64;

        if input.is_empty() {
            return Err(TargetDataLayoutParseError::Malformed);
        }

        // Each item is separated by a dash
        for component in input.split('-') {
            let parts = component.split(':').collect::<Vec<_>>();

            match &*parts {
                ["e"] => data_layout.endian = Endian::Little,
                ["E"] => data_layout.endian = Endian::Big,

                // this specifies the aggregate alignment
                ["a", values @ ..] => {
                    data_layout.aggregate_align = Self::parse_alignment_specification(values, "a")?;
                }
                ["f32", values @ ..] => {
                    data_layout.f32_align = Self::parse_alignment_specification(values, "f32")?;
                }
                ["f64", values @ ..] => {
                    data_layout.f64_align = Self::parse_alignment_specification(values, "f64")?;
                }
                ["f80", values @ ..] => {
                    data_layout.f80_align = Self::parse_alignment_specification(values, "f80")?;
                }
                [p @ ("p" | "p0"), s, values @ ..] => {
                    data_layout.pointer_align = Self::parse_alignment_specification(values, p)?;
                    data_layout.pointer_size = Size::from_bits(Self::parse_bits(s, "size", p)?);
                }

                // Vector alignments, `v<size>:<abi>[:<pref>]`
                [v, values @ ..] if v.len() > 1 && v.starts_with('v') => {
                    let size = Size::from_bits(Self::parse_bits(&v[1..], "size", v)?);
                    let alignments = Self::parse_alignment_specification(values, v)?;

                    match data_layout.vector_align.iter_mut().find(|(known, _)| *known == size) {
                        Some((_, align)) => *align = alignments,
                        None => data_layout.vector_align.push((size, alignments)),
                    }
                }

                // Integer alignments
                [s, values @ ..] if s.len() > 1 && s.starts_with('i') => {
                    let bits = Self::parse_bits(&s[1..], "size", s)?;
                    let alignments = Self::parse_alignment_specification(values, s)?;

                    match bits {
                        1 => data_layout.i1_align = alignments,
                        8 => data_layout.i8_align = alignments,
                        16 => data_layout.i16_align = alignments,
                        32 => data_layout.i32_align = alignments,
                        64 => data_layout.i64_align = alignments,
                        _ => {}
                    }

                    // From LLVM spec:
                    //
                    // If no match is found, and the type sought is an integer
                    // type, then the smallest integer type that is larger than
                    // the bitwidth of the sought type is used. If none of the
                    // specifications are larger than the bitwidth then the
                    // largest integer type is used.
                    if bits >= i128_align_src && bits <= 128 {
                        data_layout.i128_align = alignments;
                        i128_align_src = bits;
                    }
                }

                // Everything else is ignored since it is not relevant to
                // the layout of data.
                _ => {}
            }
        }

        Ok(data_layout)
    }

    fn parse_bits(
        bits: &str,
        kind: &'static str,
        cause: &str,
    ) -> Result<u64, TargetDataLayoutParseError> {
        bits.parse::<u64>().map_err(|err| TargetDataLayoutParseError::InvalidBits {
            kind,
            bit: bits.to_string(),
            cause: cause.to_string(),
            err,
        })
    }

    /// Parse a specified [Alignments] from the target data layout string. This
    /// will parse the expected "abi" alignment, and an optional "preferred"
    /// alignment value if it is specified.
    fn parse_alignment_specification(
        items: &[&str],
        cause: &str,
    ) -> Result<Alignments, TargetDataLayoutParseError> {
        let Some(abi) = items.first() else {
            return Err(TargetDataLayoutParseError::MissingAlignment { cause: cause.to_string() });
        };

        let alignment_from_bits = |bits: &str| {
            let bits = Self::parse_bits(bits, "alignment", cause)?;
            Alignment::from_bits(bits).map_err(|_| TargetDataLayoutParseError::InvalidAlignment {
                cause: cause.to_string(),
            })
        };

        let abi = alignment_from_bits(*abi)?;
        let preferred = items.get(1).map_or(Ok(abi), |item| alignment_from_bits(*item))?;

        Ok(Alignments { abi, preferred })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_x86_64_layout() {
        let layout = TargetDataLayout::parse_from_llvm_data_layout_string(
            "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128",
        )
        .unwrap();

        assert_eq!(layout.endian, Endian::Little);
        assert_eq!(layout.pointer_size, Size::from_bytes(8));
        assert_eq!(layout.i64_align.abi.bytes(), 8);
        assert_eq!(layout.i128_align.abi.bytes(), 16);
        assert_eq!(layout.f80_align.abi.bytes(), 16);
    }

    #[test]
    fn test_parse_i386_layout() {
        let layout = TargetDataLayout::parse_from_llvm_data_layout_string(
            "e-m:e-p:32:32-p270:32:32-p271:32:32-p272:64:64-i128:128-f64:32:64-f80:32-n8:16:32-S128",
        )
        .unwrap();

        assert_eq!(layout.pointer_size, Size::from_bytes(4));
        assert_eq!(layout.f64_align.abi.bytes(), 4);
        assert_eq!(layout.f64_align.preferred.bytes(), 8);
        assert_eq!(layout.f80_align.abi.bytes(), 4);
        assert_eq!(layout.ptr_sized_integer(), Integer::I32);
    }

    #[test]
    fn test_parse_vector_and_big_endian() {
        let layout = TargetDataLayout::parse_from_llvm_data_layout_string(
            "E-m:e-p:32:32-Fi8-i64:64-v128:64:128-a:0:32-n32-S64",
        )
        .unwrap();

        assert_eq!(layout.endian, Endian::Big);
        assert_eq!(layout.vector_align_for(Size::from_bytes(16)).abi.bytes(), 8);
        assert_eq!(layout.vector_align_for(Size::from_bytes(32)).abi.bytes(), 32);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            TargetDataLayout::parse_from_llvm_data_layout_string(""),
            Err(TargetDataLayoutParseError::Malformed)
        );

        assert!(matches!(
            TargetDataLayout::parse_from_llvm_data_layout_string("e-i64"),
            Err(TargetDataLayoutParseError::MissingAlignment { .. })
        ));

        assert!(matches!(
            TargetDataLayout::parse_from_llvm_data_layout_string("e-f32:24"),
            Err(TargetDataLayoutParseError::InvalidAlignment { .. })
        ));

        assert!(matches!(
            TargetDataLayout::parse_from_llvm_data_layout_string("e-p:abc:64"),
            Err(TargetDataLayoutParseError::InvalidBits { .. })
        ));
    }
}
