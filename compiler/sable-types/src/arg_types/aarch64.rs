//! The AAPCS64 table.

use smallvec::smallvec;

use super::{ArgTypes, ArgTypesOracle};
use crate::{
    ctx::TyCtx,
    ty::{TyId, TyKind},
};

/// The largest number of members a homogeneous aggregate may have.
const MAX_HFA_MEMBERS: u64 = 4;

/// Homogeneous floating-point and vector aggregates occupy consecutive SIMD
/// registers and are described by a static array of their element. Other
/// aggregates of at most 16 bytes travel in one or two general purpose
/// registers, larger ones in memory. Scalars are never rewritten.
#[derive(Debug, Clone, Copy)]
pub struct AArch64ArgTypes;

impl ArgTypesOracle for AArch64ArgTypes {
    fn name(&self) -> &'static str {
        "aarch64"
    }

    fn to_arg_types(&self, tcx: &TyCtx, ty: TyId) -> ArgTypes {
        let base = tcx.base_ty(ty);

        match tcx.kind(base) {
            TyKind::Struct(_) | TyKind::StaticArray { .. } | TyKind::Complex(_) => {}
            _ => return ArgTypes::new(),
        }

        if let Some(hfa) = tcx.homogeneous_aggregate(base) {
            if hfa.count <= MAX_HFA_MEMBERS {
                return smallvec![hfa.array_ty(tcx)];
            }
        }

        let size = tcx.size_of(base);
        match size.bytes() {
            1 | 2 | 4 | 8 => tcx.uint_of_size(size).into_iter().collect(),
            bytes @ 1..=16 => smallvec![tcx.static_array(tcx.common().u64, bytes.div_ceil(8))],
            _ => ArgTypes::new(),
        }
    }
}
