//! The convention of calls to compiler intrinsics, which is the same on
//! every target.

use sable_types::{sig::FnSig, ty::TyId};
use sable_utils::ice;

use crate::{
    cx::AbiCx,
    fn_abi::{ArgAbi, FnAbi, RegisterBudget},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
    ty::unpadded_struct_ty,
};

/// The convention of compiler intrinsics. Values are never passed through
/// memory, structs are passed without their padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrinsicAbi;

impl AbiPolicy for IntrinsicAbi {
    fn name(&self) -> &'static str {
        "intrinsic"
    }

    fn return_in_arg(&self, _cx: &AbiCx, _sig: &FnSig) -> bool {
        false
    }

    fn pass_by_val(&self, _cx: &AbiCx, _sig: &FnSig, _ty: TyId) -> bool {
        false
    }

    fn rewrite_function_type(&self, cx: &AbiCx, fn_abi: &mut FnAbi) {
        let mut budget = RegisterBudget::default();

        if fn_abi.arg_sret.is_none() && !fn_abi.ret.by_ref && cx.tcx().is_struct(fn_abi.ret.ty) {
            self.rewrite_argument(cx, &mut fn_abi.ret, &mut budget);
        }

        for arg in fn_abi.args.iter_mut().filter(|arg| !arg.by_ref) {
            self.rewrite_argument(cx, arg, &mut budget);
        }
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        if !cx.tcx().is_struct(arg.ty) {
            return;
        }

        if !generic::is_pod(cx, arg.ty, false) {
            ice!("cannot remove the padding of `{}` which is not POD", cx.ty_name(arg.ty));
        }

        let unpadded = unpadded_struct_ty(cx.tcx(), arg.ty);
        if unpadded != *arg.native_ty() {
            Rewrite::RemoveStructPadding.apply_to(cx, arg, Some(unpadded));
        }
    }
}
