//! The 32-bit ARM AAPCS, with the VFP variant on hard-float targets.

use sable_target::Target;
use sable_types::{sig::FnSig, structs::VA_LIST_TAG_NAME, ty::TyId};

use crate::{
    cx::AbiCx,
    error::AbiError,
    fn_abi::{ArgAbi, FnAbi, RegisterBudget},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
};

const MAX_HFVA_ELEMENTS: u64 = 4;

/// Aggregates above this size are copied by the native code generator.
const MAX_BY_VALUE_SIZE: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmAbi {
    hard_float: bool,
}

impl ArmAbi {
    pub fn new(target: &Target) -> Self {
        Self { hard_float: target.is_hard_float() }
    }
}

impl AbiPolicy for ArmAbi {
    fn name(&self) -> &'static str {
        "arm"
    }

    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        let tcx = cx.tcx();
        let ret = sig.ret;

        if sig.ret_by_ref {
            return false;
        }

        if !generic::is_pod(cx, ret, false) || tcx.is_static_array(ret) {
            return true;
        }

        // Only homogeneous aggregates come back in `S0`..`S3` or `D0`..`D3`,
        // other structs have to fit `R0`.
        tcx.is_struct(ret)
            && cx.size_of(ret).bytes() > 4
            && (!self.hard_float || generic::is_hfva(cx, ret, MAX_HFVA_ELEMENTS).is_none())
    }

    fn pass_by_val(&self, cx: &AbiCx, _sig: &FnSig, ty: TyId) -> bool {
        cx.tcx().is_in_memory_only(ty) && cx.size_of(ty).bytes() > MAX_BY_VALUE_SIZE
    }

    fn rewrite_function_type(&self, cx: &AbiCx, fn_abi: &mut FnAbi) {
        let mut budget = fn_abi.register_budget;

        if !self.skip_return_value_rewrite(cx, fn_abi) && cx.tcx().is_struct(fn_abi.ret.ty) {
            let ret = &mut fn_abi.ret;
            if let Some(array) = generic::is_hfva(cx, ret.ty, MAX_HFVA_ELEMENTS) {
                Rewrite::HomogeneousArray.apply_to(cx, ret, Some(array));
            } else if !generic::is_integer_rewrite_redundant(cx, ret) {
                Rewrite::Integer.apply_to(cx, ret, None);
            }
        }

        for arg in fn_abi.args.iter_mut().filter(|arg| !arg.by_ref) {
            self.rewrite_argument(cx, arg, &mut budget);
        }
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        if !cx.tcx().is_in_memory_only(arg.ty) {
            return;
        }

        if !generic::is_pod(cx, arg.ty, false) {
            Rewrite::IndirectByval.apply_to(cx, arg, None);
        } else if let Some(array) = generic::is_hfva(cx, arg.ty, MAX_HFVA_ELEMENTS) {
            Rewrite::HomogeneousArray.apply_to(cx, arg, Some(array));
        } else if cx.align_of(arg.ty).bytes() <= 4 {
            Rewrite::CompositeToArray32.apply_to(cx, arg, None);
        } else {
            Rewrite::CompositeToArray64.apply_to(cx, arg, None);
        }
    }

    fn va_list_ty(&self, cx: &AbiCx) -> TyId {
        let common = cx.tcx().common();
        cx.tcx().builtin_struct(VA_LIST_TAG_NAME, &[("__ap", common.void_ptr)])
    }

    fn objc_msg_send_func(
        &self,
        _cx: &AbiCx,
        _ret: TyId,
        fn_abi: &FnAbi,
        direct_call: bool,
    ) -> Result<&'static str, AbiError> {
        let func = match (fn_abi.arg_sret.is_some(), direct_call) {
            (true, true) => "objc_msgSendSuper_stret",
            (true, false) => "objc_msgSend_stret",
            (false, true) => "objc_msgSendSuper",
            (false, false) => "objc_msgSend",
        };

        Ok(func)
    }
}
