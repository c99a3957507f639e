//! The AArch64 procedure call standard, and the Apple variant of it.

use sable_target::Target;
use sable_types::{sig::FnSig, structs::VA_LIST_TAG_NAME, ty::TyId};

use crate::{
    builder::{AbiBuilderMethods, DValue},
    cx::AbiCx,
    error::AbiError,
    fn_abi::{ArgAbi, FnAbi, RegisterBudget, UnwindTableKind},
    generic,
    policy::AbiPolicy,
    rewrite::{Rewrite, address_of},
};

/// Aggregates of up to four floats or short vectors are passed in `V0` to
/// `V7`.
const MAX_HFVA_ELEMENTS: u64 = 4;

/// Larger aggregates go through a hidden copy.
const MAX_DIRECT_AGGREGATE_SIZE: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AArch64Abi {
    /// Apple targets use a plain pointer as `va_list`.
    is_darwin: bool,
}

impl AArch64Abi {
    pub fn new(target: &Target) -> Self {
        Self { is_darwin: target.is_apple() }
    }

    fn is_va_list(&self, cx: &AbiCx, ty: TyId) -> bool {
        !self.is_darwin
            && cx.tcx().struct_decl_of(ty).is_some_and(|decl| decl.is_va_list_tag())
    }
}

impl AbiPolicy for AArch64Abi {
    fn name(&self) -> &'static str {
        "aarch64"
    }

    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        if sig.ret_by_ref {
            return false;
        }

        let ret = sig.ret;
        if !generic::is_pod(cx, ret, false) {
            return true;
        }

        generic::is_aggregate(cx, ret)
            && generic::is_hfva(cx, ret, MAX_HFVA_ELEMENTS).is_none()
            && cx.size_of(ret).bytes() > MAX_DIRECT_AGGREGATE_SIZE
    }

    fn pass_by_val(&self, _cx: &AbiCx, _sig: &FnSig, _ty: TyId) -> bool {
        false
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        if !generic::is_aggregate(cx, arg.ty) {
            return;
        }

        // The `va_list` structure is passed by reference.
        if self.is_va_list(cx, arg.ty) {
            arg.set_by_ref(cx, true);
            return;
        }

        if let Some(array) = generic::is_hfva(cx, arg.ty, MAX_HFVA_ELEMENTS) {
            Rewrite::HomogeneousArray.apply_to(cx, arg, Some(array));
        } else if !generic::is_pod(cx, arg.ty, false)
            || cx.size_of(arg.ty).bytes() > MAX_DIRECT_AGGREGATE_SIZE
        {
            Rewrite::IndirectByval.apply_to(cx, arg, None);
        } else {
            Rewrite::CompositeToArray64.apply_to(cx, arg, None);
        }
    }

    fn default_unwind_table_kind(&self, _target: &Target) -> UnwindTableKind {
        UnwindTableKind::Async
    }

    fn va_list_ty(&self, cx: &AbiCx) -> TyId {
        let tcx = cx.tcx();
        let common = tcx.common();

        if self.is_darwin {
            return common.byte_ptr;
        }

        tcx.builtin_struct(
            VA_LIST_TAG_NAME,
            &[
                ("__stack", common.void_ptr),
                ("__gr_top", common.void_ptr),
                ("__vr_top", common.void_ptr),
                ("__gr_offs", common.i32),
                ("__vr_offs", common.i32),
            ],
        )
    }

    fn va_copy<B: AbiBuilderMethods>(
        &self,
        bx: &mut B,
        cx: &AbiCx,
        dest: B::Value,
        src: &DValue<B::Value>,
    ) {
        if self.is_darwin {
            return generic::va_copy(self, bx, cx, dest, src);
        }

        let va_list = self.va_list_ty(cx);
        let src = address_of(bx, cx, src);
        bx.mem_copy(dest, src, cx.size_of(va_list), cx.align_of(va_list));
    }

    fn objc_msg_send_func(
        &self,
        _cx: &AbiCx,
        _ret: TyId,
        _fn_abi: &FnAbi,
        direct_call: bool,
    ) -> Result<&'static str, AbiError> {
        match direct_call {
            true => Ok("objc_msgSendSuper"),
            false => Ok("objc_msgSend"),
        }
    }
}
