//! Native types are the machine-level types that the code generator emits for
//! source types. They only describe layout, the ABI rewrites change which
//! native type a value travels as.

use std::fmt;

use itertools::Itertools;
use sable_target::{
    abi::Integer,
    alignment::Alignment,
    data_layout::{HasDataLayout, TargetDataLayout},
    primitives::FloatTy,
    size::Size,
};
use sable_types::{
    ctx::TyCtx,
    ty::{TyId, TyKind},
};

/// A type of the native code generator, printed in LLVM syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeTy {
    Void,

    /// An integer of an arbitrary bit width.
    Int { bits: u64 },

    Float(FloatTy),

    /// An opaque pointer.
    Ptr,

    Vector { element: Box<NativeTy>, count: u64 },

    Array { element: Box<NativeTy>, count: u64 },

    /// A structure, `packed` structures have no padding between their fields
    /// and are byte aligned.
    Struct { fields: Vec<NativeTy>, packed: bool },
}

impl NativeTy {
    pub fn int(bits: u64) -> Self {
        NativeTy::Int { bits }
    }

    /// An integer which is exactly `size` bytes wide.
    pub fn int_of_size(size: Size) -> Self {
        NativeTy::Int { bits: size.bits() }
    }

    pub fn array(element: NativeTy, count: u64) -> Self {
        NativeTy::Array { element: Box::new(element), count }
    }

    pub fn vector(element: NativeTy, count: u64) -> Self {
        NativeTy::Vector { element: Box::new(element), count }
    }

    pub fn struct_of(fields: Vec<NativeTy>) -> Self {
        NativeTy::Struct { fields, packed: false }
    }

    /// The padding member `[size x i8]`.
    pub fn padding(size: Size) -> Self {
        NativeTy::array(NativeTy::int(8), size.bytes())
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, NativeTy::Struct { .. })
    }

    /// The number of bytes that a value of this type occupies in memory,
    /// including the tail padding up to its alignment.
    pub fn size<C: HasDataLayout>(&self, cx: &C) -> Size {
        let dl = cx.data_layout();

        match self {
            NativeTy::Void => Size::ZERO,
            NativeTy::Int { bits } => {
                Size::from_bytes(bits.div_ceil(8)).align_to(self.align(dl))
            }
            NativeTy::Float(float) => float.size(dl),
            NativeTy::Ptr => dl.pointer_size,
            NativeTy::Vector { element, count } => {
                let size = element.size(dl) * *count;
                size.align_to(dl.vector_align_for(size).abi)
            }
            NativeTy::Array { element, count } => element.size(dl) * *count,
            NativeTy::Struct { .. } => self.struct_layout(dl).1.align_to(self.align(dl)),
        }
    }

    /// The ABI alignment of this type.
    pub fn align<C: HasDataLayout>(&self, cx: &C) -> Alignment {
        let dl = cx.data_layout();

        match self {
            NativeTy::Void => Alignment::ONE,
            NativeTy::Int { bits } => Integer::fitting(Size::from_bytes(bits.div_ceil(8)))
                .unwrap_or(Integer::I128)
                .align(dl)
                .abi,
            NativeTy::Float(float) => float.align(dl).abi,
            NativeTy::Ptr => dl.pointer_align.abi,
            NativeTy::Vector { element, count } => {
                dl.vector_align_for(element.size(dl) * *count).abi
            }
            NativeTy::Array { element, .. } => element.align(dl),
            NativeTy::Struct { packed: true, .. } => Alignment::ONE,
            NativeTy::Struct { fields, .. } => fields
                .iter()
                .map(|field| field.align(dl))
                .fold(dl.aggregate_align.abi, Alignment::max),
        }
    }

    /// The offsets of the fields of a structure type. Other types have no
    /// fields.
    pub fn field_offsets<C: HasDataLayout>(&self, cx: &C) -> Vec<Size> {
        self.struct_layout(cx.data_layout()).0
    }

    /// Lay out the fields of a structure, returning their offsets and the
    /// offset just past the last field.
    fn struct_layout(&self, dl: &TargetDataLayout) -> (Vec<Size>, Size) {
        let NativeTy::Struct { fields, packed } = self else {
            return (Vec::new(), Size::ZERO);
        };

        let mut offsets = Vec::with_capacity(fields.len());
        let mut offset = Size::ZERO;

        for field in fields {
            if !packed {
                offset = offset.align_to(field.align(dl));
            }

            offsets.push(offset);
            offset = offset + field.size(dl);
        }

        (offsets, offset)
    }

    /// Check whether two types occupy memory in the same way, i.e. they have
    /// the same size and the same scalars at the same offsets. Pointers are
    /// considered to be equivalent to integers of the pointer width.
    pub fn is_layout_equivalent<C: HasDataLayout>(&self, other: &NativeTy, cx: &C) -> bool {
        let dl = cx.data_layout();
        if self.size(dl) != other.size(dl) {
            return false;
        }

        let mut lhs = Vec::new();
        let mut rhs = Vec::new();
        self.flatten_scalars(dl, Size::ZERO, &mut lhs);
        other.flatten_scalars(dl, Size::ZERO, &mut rhs);

        lhs == rhs
    }

    fn flatten_scalars(&self, dl: &TargetDataLayout, base: Size, out: &mut Vec<(Size, NativeTy)>) {
        match self {
            NativeTy::Void => {}
            NativeTy::Ptr => out.push((base, NativeTy::int_of_size(dl.pointer_size))),
            NativeTy::Array { element, count } => {
                let stride = element.size(dl);
                for index in 0..*count {
                    element.flatten_scalars(dl, base + stride * index, out);
                }
            }
            NativeTy::Struct { fields, .. } => {
                for (field, offset) in fields.iter().zip(self.field_offsets(dl)) {
                    field.flatten_scalars(dl, base + offset, out);
                }
            }
            scalar => out.push((base, scalar.clone())),
        }
    }
}

impl fmt::Display for NativeTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeTy::Void => write!(f, "void"),
            NativeTy::Int { bits } => write!(f, "i{bits}"),
            NativeTy::Float(FloatTy::F32) => write!(f, "float"),
            NativeTy::Float(FloatTy::F64) => write!(f, "double"),
            NativeTy::Float(FloatTy::F80) => write!(f, "x86_fp80"),
            NativeTy::Ptr => write!(f, "ptr"),
            NativeTy::Vector { element, count } => write!(f, "<{count} x {element}>"),
            NativeTy::Array { element, count } => write!(f, "[{count} x {element}]"),
            NativeTy::Struct { fields, .. } if fields.is_empty() => write!(f, "{{}}"),
            NativeTy::Struct { fields, packed: false } => {
                write!(f, "{{ {} }}", fields.iter().join(", "))
            }
            NativeTy::Struct { fields, packed: true } => {
                write!(f, "<{{ {} }}>", fields.iter().join(", "))
            }
        }
    }
}

/// The direct native mapping of a source type.
pub fn lower_ty(tcx: &TyCtx, ty: TyId) -> NativeTy {
    let dl = tcx.data_layout();

    match tcx.base_kind(ty) {
        TyKind::Void | TyKind::NoReturn => NativeTy::Void,
        TyKind::Bool => NativeTy::int(8),
        TyKind::Int(int) => NativeTy::int_of_size(int.size(dl.pointer_size)),
        TyKind::Float(float) | TyKind::Imaginary(float) => NativeTy::Float(float),
        TyKind::Complex(float) => {
            NativeTy::struct_of(vec![NativeTy::Float(float), NativeTy::Float(float)])
        }
        TyKind::Pointer(_) | TyKind::Class(_) | TyKind::AssocArray { .. } => NativeTy::Ptr,
        TyKind::Vector { element, count } => NativeTy::vector(lower_ty(tcx, element), count),
        TyKind::StaticArray { element, count } => NativeTy::array(lower_ty(tcx, element), count),
        TyKind::DynamicArray(_) => {
            NativeTy::struct_of(vec![NativeTy::int_of_size(dl.pointer_size), NativeTy::Ptr])
        }
        TyKind::Delegate => NativeTy::struct_of(vec![NativeTy::Ptr, NativeTy::Ptr]),
        TyKind::Struct(_) => lower_struct(tcx, ty),
        TyKind::Enum { .. } | TyKind::Alias { .. } => {
            unreachable!("base type is never transparent")
        }
    }
}

/// Lower an aggregate into its fields with explicit byte padding for the gaps
/// between them. Fields which overlap a previous field are only reachable
/// through that field and are dropped. If the natural layout of the result
/// does not match the declared offsets, the structure is packed.
fn lower_struct(tcx: &TyCtx, ty: TyId) -> NativeTy {
    let dl = tcx.data_layout();
    let Some(decl) = tcx.struct_decl_of(ty) else {
        unreachable!("only called on aggregates")
    };
    let size = tcx.size_of(ty);

    let mut fields = Vec::new();
    let mut offsets = Vec::new();
    let mut end = Size::ZERO;

    if decl.is_union() {
        // The first of several equally large members is kept.
        let largest = decl.fields.iter().rev().max_by_key(|field| tcx.size_of(field.ty));
        if let Some(field) = largest {
            fields.push(lower_ty(tcx, field.ty));
            offsets.push(Size::ZERO);
            end = tcx.size_of(field.ty);
        }
    } else {
        for field in &decl.fields {
            if field.offset < end {
                continue;
            }

            if let Some(gap) = field.offset.checked_sub(end).filter(|gap| *gap > Size::ZERO) {
                fields.push(NativeTy::padding(gap));
                offsets.push(end);
            }

            fields.push(lower_ty(tcx, field.ty));
            offsets.push(field.offset);
            end = field.offset + tcx.size_of(field.ty);
        }
    }

    if let Some(tail) = size.checked_sub(end).filter(|tail| *tail > Size::ZERO) {
        fields.push(NativeTy::padding(tail));
        offsets.push(end);
    }

    let natural = NativeTy::struct_of(fields);
    if natural.field_offsets(dl) == offsets && natural.size(dl) == size {
        return natural;
    }

    let NativeTy::Struct { fields, .. } = natural else { unreachable!() };
    NativeTy::Struct { fields, packed: true }
}

/// The fields of an aggregate in order without any padding, with nested
/// aggregates unpadded as well. Members of a union overlap, so unions keep
/// their direct mapping.
pub fn unpadded_struct_ty(tcx: &TyCtx, ty: TyId) -> NativeTy {
    let Some(decl) = tcx.struct_decl_of(ty).filter(|decl| !decl.is_union()) else {
        return lower_ty(tcx, ty);
    };

    let fields = decl
        .fields
        .iter()
        .map(|field| match tcx.is_struct(field.ty) {
            true => unpadded_struct_ty(tcx, field.ty),
            false => lower_ty(tcx, field.ty),
        })
        .collect();

    NativeTy::struct_of(fields)
}
