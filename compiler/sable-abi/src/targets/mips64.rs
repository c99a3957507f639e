//! The MIPS `o32`, `n32` and `n64` conventions, as far as the lowering is
//! concerned. Aggregates are always copied through memory.

use sable_target::Target;
use sable_types::{
    sig::FnSig,
    ty::{TyId, TyKind},
};

use crate::{
    cx::AbiCx,
    fn_abi::{ArgAbi, ArgExtension, FnAbi, RegisterBudget},
    generic,
    policy::AbiPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mips64Abi {
    is_64_bit: bool,
}

impl Mips64Abi {
    pub fn new(target: &Target) -> Self {
        Self { is_64_bit: target.is_64_bit() }
    }
}

impl AbiPolicy for Mips64Abi {
    fn name(&self) -> &'static str {
        "mips64"
    }

    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        !sig.ret_by_ref
            && (!generic::is_pod(cx, sig.ret, false) || cx.tcx().is_in_memory_only(sig.ret))
    }

    fn pass_by_val(&self, cx: &AbiCx, _sig: &FnSig, ty: TyId) -> bool {
        cx.tcx().is_in_memory_only(ty)
    }

    /// The return value is left as is.
    fn rewrite_function_type(&self, cx: &AbiCx, fn_abi: &mut FnAbi) {
        let mut budget = fn_abi.register_budget;

        for arg in fn_abi.args.iter_mut().filter(|arg| !arg.by_ref) {
            self.rewrite_argument(cx, arg, &mut budget);
        }
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        // 32-bit values are kept sign-extended in 64-bit registers.
        let is_int32 = matches!(cx.tcx().base_kind(arg.ty), TyKind::Int(_))
            && cx.size_of(arg.ty).bytes() == 4;

        if self.is_64_bit && is_int32 {
            arg.attributes.extend_with(ArgExtension::SignExtend);
        }
    }
}
