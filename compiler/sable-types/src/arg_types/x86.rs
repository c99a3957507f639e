//! The 32-bit x86 table, which returns small aggregates in registers.

use smallvec::smallvec;

use super::{ArgTypes, ArgTypesOracle};
use crate::{
    ctx::TyCtx,
    ty::{TyId, TyKind},
};

/// Aggregates of 1, 2, 4 or 8 bytes occupy an integer register (pair), or a
/// floating-point register if they wrap a single `float` or `double`. Other
/// aggregates are passed in memory.
#[derive(Debug, Clone, Copy)]
pub struct X86ArgTypes;

impl ArgTypesOracle for X86ArgTypes {
    fn name(&self) -> &'static str {
        "x86"
    }

    fn to_arg_types(&self, tcx: &TyCtx, ty: TyId) -> ArgTypes {
        let base = tcx.base_ty(ty);
        let size = tcx.size_of(base);

        match tcx.kind(base) {
            TyKind::Struct(_)
            | TyKind::StaticArray { .. }
            | TyKind::Complex(_)
            | TyKind::DynamicArray(_)
            | TyKind::Delegate => {}
            TyKind::Vector { .. } if size.bytes() > 16 => return ArgTypes::new(),
            _ => return smallvec![ty],
        }

        let single_float = tcx.homogeneous_aggregate(base).filter(|hfa| {
            hfa.count == 1 && !hfa.is_vector(tcx) && tcx.size_of(hfa.element) == size
        });

        if let Some(hfa) = single_float {
            return smallvec![hfa.element];
        }

        match size.bytes() {
            1 | 2 | 4 | 8 => tcx.uint_of_size(size).into_iter().collect(),
            _ => ArgTypes::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sable_target::Target;

    use super::*;
    use crate::structs::{StructDecl, StructField};

    fn declare(tcx: &TyCtx, fields: &[TyId]) -> TyId {
        let fields = fields
            .iter()
            .enumerate()
            .map(|(index, ty)| StructField::new(format!("f{index}"), *ty))
            .collect();
        let ty = tcx.declare_struct(StructDecl::new("S", fields));
        tcx.finalise_struct(tcx.as_struct(ty).unwrap()).unwrap();
        ty
    }

    #[test]
    fn small_aggregates_are_integers() {
        let tcx = TyCtx::new("i686-unknown-linux-gnu".parse::<Target>().unwrap());
        let common = tcx.common().clone();

        let short_pair = declare(&tcx, &[common.u16, common.u16]);
        let three = declare(&tcx, &[common.u8, common.u8, common.u8]);
        let single = declare(&tcx, &[common.f64]);

        assert_eq!(X86ArgTypes.to_arg_types(&tcx, short_pair).as_slice(), &[common.u32]);
        assert!(X86ArgTypes.to_arg_types(&tcx, three).is_empty());
        assert_eq!(X86ArgTypes.to_arg_types(&tcx, single).as_slice(), &[common.f64]);
    }
}
