//! The 64-bit PowerPC ELFv2 convention.

use sable_types::{sig::FnSig, ty::TyId};

use crate::{
    cx::AbiCx,
    fn_abi::{ArgAbi, ArgExtension, RegisterBudget},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
};

/// Homogeneous aggregates of up to eight elements are passed in
/// floating-point or vector registers.
const MAX_HFVA_ELEMENTS: u64 = 8;

const MAX_REGISTER_AGGREGATE_SIZE: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ppc64LeAbi;

impl AbiPolicy for Ppc64LeAbi {
    fn name(&self) -> &'static str {
        "ppc64le"
    }

    fn pass_by_val(&self, cx: &AbiCx, _sig: &FnSig, ty: TyId) -> bool {
        let tcx = cx.tcx();

        generic::is_pod(cx, ty, false)
            && (tcx.is_static_array(ty)
                || (tcx.is_struct(ty)
                    && cx.size_of(ty).bytes() > MAX_REGISTER_AGGREGATE_SIZE
                    && generic::is_hfva(cx, ty, MAX_HFVA_ELEMENTS).is_none()))
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        let tcx = cx.tcx();

        if !generic::is_pod(cx, arg.ty, false) {
            Rewrite::IndirectByval.apply_to(cx, arg, None);
            return;
        }

        if tcx.is_struct(arg.ty) {
            if let Some(array) = generic::is_hfva(cx, arg.ty, MAX_HFVA_ELEMENTS) {
                Rewrite::HomogeneousArray.apply_to(cx, arg, Some(array));
                return;
            }
        }

        if tcx.is_in_memory_only(arg.ty) {
            if !generic::can_rewrite_as_int(cx, arg.ty, true) {
                Rewrite::CompositeToArray64.apply_to(cx, arg, None);
            } else if !generic::is_integer_rewrite_redundant(cx, arg) {
                Rewrite::Integer.apply_to(cx, arg, None);
            }
        } else if tcx.is_integral(arg.ty) && cx.size_of(arg.ty).bytes() < 8 {
            let extension = match tcx.is_unsigned(arg.ty) {
                true => ArgExtension::ZeroExtend,
                false => ArgExtension::SignExtend,
            };
            arg.attributes.extend_with(extension);
        }
    }
}
