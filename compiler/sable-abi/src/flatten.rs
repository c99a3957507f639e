//! Flattening of small aggregates into their scalar leaves. Hard-float
//! conventions pass an aggregate of one or two scalars in the floating-point
//! and integer registers that the scalars would occupy on their own.

use sable_target::{primitives::FloatTy, size::Size};
use sable_types::{
    ctx::TyCtx,
    ty::{TyId, TyKind},
};
use smallvec::SmallVec;

use crate::ty::{NativeTy, lower_ty};

/// The largest scalar that fits a single general purpose or floating-point
/// register of the 64-bit hard-float targets.
const MAX_LEAF_SIZE: u64 = 8;

/// A scalar leaf of an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarField {
    /// The offset of the leaf from the start of the aggregate.
    pub offset: Size,
    pub ty: TyId,
}

pub type ScalarFields = SmallVec<[ScalarField; 2]>;

/// Flatten the aggregate into at most two scalar leaves. Returns `None` if
/// the aggregate has more leaves or contains anything that is not an integer
/// or a floating-point value of at most eight bytes.
pub fn flatten_scalar_fields(tcx: &TyCtx, ty: TyId) -> Option<ScalarFields> {
    let mut fields = ScalarFields::new();
    collect(tcx, ty, Size::ZERO, &mut fields).then_some(fields)
}

fn push(fields: &mut ScalarFields, ty: TyId, offset: Size) -> bool {
    fields.push(ScalarField { offset, ty });
    fields.len() <= 2
}

fn collect(tcx: &TyCtx, ty: TyId, offset: Size, fields: &mut ScalarFields) -> bool {
    match tcx.base_kind(ty) {
        TyKind::Bool | TyKind::Int(_) => {
            tcx.size_of(ty).bytes() <= MAX_LEAF_SIZE && push(fields, tcx.base_ty(ty), offset)
        }
        TyKind::Float(FloatTy::F80)
        | TyKind::Imaginary(FloatTy::F80)
        | TyKind::Complex(FloatTy::F80) => false,
        TyKind::Float(float) | TyKind::Imaginary(float) => push(fields, tcx.float(float), offset),
        TyKind::Complex(float) => {
            let part = tcx.float(float);
            push(fields, part, offset) && push(fields, part, offset + tcx.size_of(part))
        }
        TyKind::StaticArray { element, count } => {
            let stride = tcx.size_of(element);
            (0..count).all(|index| collect(tcx, element, offset + stride * index, fields))
        }
        TyKind::Struct(id) => {
            let decl = tcx.struct_decl(id);
            !decl.is_union()
                && decl
                    .fields
                    .iter()
                    .all(|field| collect(tcx, field.ty, offset + field.offset, fields))
        }
        _ => false,
    }
}

/// Check whether a POD struct is passed in floating-point registers by a
/// hard-float convention: it flattens into one float, two floats, or a float
/// and an integer.
pub fn requires_hard_float_rewrite(tcx: &TyCtx, ty: TyId) -> bool {
    if !tcx.is_struct(ty) || !tcx.is_pod(ty, false) {
        return false;
    }

    match flatten_scalar_fields(tcx, ty).as_deref() {
        Some([only]) => tcx.is_floating(only.ty),
        Some([first, second]) => tcx.is_floating(first.ty) || tcx.is_floating(second.ty),
        _ => false,
    }
}

/// The native structure of the scalar leaves of the aggregate, or its direct
/// mapping if it cannot be flattened.
pub fn scalar_fields_ty(tcx: &TyCtx, ty: TyId) -> NativeTy {
    match flatten_scalar_fields(tcx, ty) {
        Some(fields) if !fields.is_empty() => {
            NativeTy::struct_of(fields.iter().map(|field| lower_ty(tcx, field.ty)).collect())
        }
        _ => lower_ty(tcx, ty),
    }
}
