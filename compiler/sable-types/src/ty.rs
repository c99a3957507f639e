//! The source-level type hierarchy as it is seen by the calling-convention
//! lowering. Types are interned within a [crate::ctx::TyCtx] and referred to
//! by a [TyId].

use std::sync::Arc;

use index_vec::define_index_type;
use sable_target::primitives::{FloatTy, IntTy, IntWidth};

define_index_type! {
    /// Identifier of an interned [TyKind].
    pub struct TyId = u32;

    MAX_INDEX = i32::max_value() as usize;
    DISABLE_MAX_INDEX_CHECK = cfg!(not(debug_assertions));

    DEBUG_FORMAT = "ty#{}";
}

define_index_type! {
    /// Identifier of a declared [crate::structs::StructDecl].
    pub struct StructId = u32;

    MAX_INDEX = i32::max_value() as usize;
    DISABLE_MAX_INDEX_CHECK = cfg!(not(debug_assertions));

    DEBUG_FORMAT = "struct#{}";
}

/// A name of a nominal type.
pub type Identifier = Arc<str>;

/// The kinds of types that can appear in a function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyKind {
    /// `void`, only meaningful as a return type.
    Void,

    /// `noreturn`, the bottom type.
    NoReturn,

    Bool,

    Int(IntTy),

    /// A real floating-point number.
    Float(FloatTy),

    /// An imaginary number, represented as its real counterpart.
    Imaginary(FloatTy),

    /// A complex number, a pair of reals.
    Complex(FloatTy),

    /// A pointer to the given type.
    Pointer(TyId),

    /// A reference to an instance of a class, which is always a pointer.
    Class(Identifier),

    /// An associative array, which is an opaque pointer.
    AssocArray { key: TyId, value: TyId },

    /// A SIMD vector of `count` elements.
    Vector { element: TyId, count: u64 },

    /// A fixed-length array `T[N]` which is stored inline.
    StaticArray { element: TyId, count: u64 },

    /// A slice `T[]`, a pair of a length and a pointer.
    DynamicArray(TyId),

    /// A delegate, a pair of a context pointer and a function pointer.
    Delegate,

    /// A user or builtin `struct` or `union`.
    Struct(StructId),

    /// A named enumeration with its base type.
    Enum { name: Identifier, base: TyId },

    /// A type alias which is transparent to the lowering.
    Alias { name: Identifier, base: TyId },
}

impl TyKind {
    /// Check if the [TyKind] is a nominal wrapper around another type.
    pub fn is_transparent(&self) -> bool {
        matches!(self, TyKind::Enum { .. } | TyKind::Alias { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, TyKind::Struct(_))
    }

    pub fn is_static_array(&self) -> bool {
        matches!(self, TyKind::StaticArray { .. })
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, TyKind::Vector { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TyKind::Pointer(_) | TyKind::Class(_))
    }

    /// Integral types include `bool`.
    pub fn is_integral(&self) -> bool {
        matches!(self, TyKind::Bool | TyKind::Int(_))
    }

    /// Check if the type is a real, imaginary or complex floating-point type.
    pub fn is_floating(&self) -> bool {
        matches!(self, TyKind::Float(_) | TyKind::Imaginary(_) | TyKind::Complex(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, TyKind::Complex(_))
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, TyKind::Bool | TyKind::Int(IntTy { signed: false, .. }))
    }

    /// Scalars are values that are held in a single machine register.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TyKind::Bool
                | TyKind::Int(_)
                | TyKind::Float(_)
                | TyKind::Imaginary(_)
                | TyKind::Pointer(_)
                | TyKind::Class(_)
                | TyKind::AssocArray { .. }
        )
    }

    /// Get the [FloatTy] of a floating-point kind.
    pub fn float_ty(&self) -> Option<FloatTy> {
        match self {
            TyKind::Float(float) | TyKind::Imaginary(float) | TyKind::Complex(float) => {
                Some(*float)
            }
            _ => None,
        }
    }
}

/// Macro that is used to create the "common" types of a [crate::ctx::TyCtx].
/// Each entry has an associated name, followed by the [TyKind] that it
/// interns.
macro_rules! create_common_ty_table {
    ($($name:ident: $value:expr),* $(,)?) => {
        /// Types which are used frequently by the lowering, interned once
        /// when the [crate::ctx::TyCtx] is created.
        #[derive(Debug, Clone)]
        pub struct CommonTys {
            $(pub $name: TyId, )*
        }

        impl CommonTys {
            pub(crate) fn new(mut intern: impl FnMut(TyKind) -> TyId) -> Self {
                $(let $name = intern($value); )*

                CommonTys { $($name,)* }
            }
        }
    };
}

create_common_ty_table!(
    void: TyKind::Void,
    noreturn: TyKind::NoReturn,
    bool: TyKind::Bool,

    i8: TyKind::Int(IntTy::signed(IntWidth::W8)),
    i16: TyKind::Int(IntTy::signed(IntWidth::W16)),
    i32: TyKind::Int(IntTy::signed(IntWidth::W32)),
    i64: TyKind::Int(IntTy::signed(IntWidth::W64)),
    i128: TyKind::Int(IntTy::signed(IntWidth::W128)),
    isize: TyKind::Int(IntTy::signed(IntWidth::Ptr)),

    u8: TyKind::Int(IntTy::unsigned(IntWidth::W8)),
    u16: TyKind::Int(IntTy::unsigned(IntWidth::W16)),
    u32: TyKind::Int(IntTy::unsigned(IntWidth::W32)),
    u64: TyKind::Int(IntTy::unsigned(IntWidth::W64)),
    u128: TyKind::Int(IntTy::unsigned(IntWidth::W128)),
    usize: TyKind::Int(IntTy::unsigned(IntWidth::Ptr)),

    f32: TyKind::Float(FloatTy::F32),
    f64: TyKind::Float(FloatTy::F64),
    f80: TyKind::Float(FloatTy::F80),

    void_ptr: TyKind::Pointer(void),
    byte_ptr: TyKind::Pointer(u8),
);
