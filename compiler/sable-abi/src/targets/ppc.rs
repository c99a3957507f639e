//! The 32-bit PowerPC SVR4 convention and the 64-bit ELFv1 convention.

use sable_target::Target;
use sable_types::{sig::FnSig, ty::TyId};

use crate::{
    cx::AbiCx,
    fn_abi::{ArgAbi, ArgExtension, RegisterBudget},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
};

/// ELFv1 passes aggregates up to this size in general purpose registers.
const MAX_REGISTER_AGGREGATE_SIZE: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpcAbi {
    is_64_bit: bool,
}

impl PpcAbi {
    pub fn new(target: &Target) -> Self {
        Self { is_64_bit: target.is_64_bit() }
    }
}

impl AbiPolicy for PpcAbi {
    fn name(&self) -> &'static str {
        match self.is_64_bit {
            true => "ppc64",
            false => "ppc",
        }
    }

    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        !sig.ret_by_ref
            && (!generic::is_pod(cx, sig.ret, false) || cx.tcx().is_in_memory_only(sig.ret))
    }

    fn pass_by_val(&self, cx: &AbiCx, _sig: &FnSig, ty: TyId) -> bool {
        cx.tcx().is_in_memory_only(ty)
            && (!self.is_64_bit || cx.size_of(ty).bytes() > MAX_REGISTER_AGGREGATE_SIZE)
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        let tcx = cx.tcx();

        if tcx.is_in_memory_only(arg.ty) {
            if generic::can_rewrite_as_int(cx, arg.ty, self.is_64_bit) {
                if !generic::is_integer_rewrite_redundant(cx, arg) {
                    Rewrite::Integer.apply_to(cx, arg, None);
                }
            } else if self.is_64_bit {
                Rewrite::CompositeToArray64.apply_to(cx, arg, None);
            } else {
                Rewrite::CompositeToArray32.apply_to(cx, arg, None);
            }
        } else if tcx.is_integral(arg.ty) && cx.size_of(arg.ty) < cx.target().pointer_size() {
            let extension = match tcx.is_unsigned(arg.ty) {
                true => ArgExtension::ZeroExtend,
                false => ArgExtension::SignExtend,
            };
            arg.attributes.extend_with(extension);
        }
    }
}
