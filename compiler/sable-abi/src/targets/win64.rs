//! The Microsoft x64 convention. Aggregates of 1, 2, 4 or 8 bytes are passed
//! as integers, everything else that is not a scalar goes through a hidden
//! copy.

use sable_target::{Target, primitives::FloatTy};
use sable_types::{
    sig::{FnSig, Linkage},
    ty::{TyId, TyKind},
};

use crate::{
    cx::AbiCx,
    fn_abi::{ArgAbi, FnAbi, RegisterBudget},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Win64Abi {
    is_msvc: bool,
}

impl Win64Abi {
    pub fn new(target: &Target) -> Self {
        Self { is_msvc: target.is_msvc() }
    }

    /// Whether the value is passed, or returned when `ret_linkage` is given,
    /// through a pointer to a copy.
    fn passes_via_hidden_copy(&self, cx: &AbiCx, ty: TyId, ret_linkage: Option<Linkage>) -> bool {
        let kind = cx.tcx().base_kind(ty);

        // x87 values are returned in `ST0` but passed in memory.
        if matches!(kind, TyKind::Float(FloatTy::F80) | TyKind::Imaginary(FloatTy::F80)) {
            return ret_linkage.is_none();
        }

        let pod = match ret_linkage {
            Some(linkage) => generic::is_pod(cx, ty, self.is_msvc && linkage == Linkage::Cpp),
            None => generic::is_pod(cx, ty, false),
        };

        if !pod {
            return true;
        }

        if kind.is_vector() {
            return ret_linkage.is_none();
        }

        generic::is_aggregate(cx, ty) && !generic::can_rewrite_as_int(cx, ty, true)
    }

    fn rewrite_value(&self, cx: &AbiCx, arg: &mut ArgAbi, ret_linkage: Option<Linkage>) {
        if self.passes_via_hidden_copy(cx, arg.ty, ret_linkage) {
            Rewrite::IndirectByval.apply_to(cx, arg, None);
        } else if generic::is_aggregate(cx, arg.ty)
            && generic::can_rewrite_as_int(cx, arg.ty, true)
            && !generic::is_integer_rewrite_redundant(cx, arg)
        {
            Rewrite::Integer.apply_to(cx, arg, None);
        }
    }
}

impl AbiPolicy for Win64Abi {
    fn name(&self) -> &'static str {
        "win64"
    }

    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        if sig.ret_by_ref {
            return false;
        }

        // Member functions of MSVC C++ return every struct through memory.
        if self.is_msvc && sig.linkage == Linkage::Cpp && sig.needs_this && cx.tcx().is_struct(sig.ret)
        {
            return true;
        }

        self.passes_via_hidden_copy(cx, sig.ret, Some(sig.linkage))
    }

    fn pass_by_val(&self, _cx: &AbiCx, _sig: &FnSig, _ty: TyId) -> bool {
        false
    }

    fn pass_this_before_sret(&self, _cx: &AbiCx, sig: &FnSig) -> bool {
        sig.linkage == Linkage::Cpp
    }

    fn rewrite_function_type(&self, cx: &AbiCx, fn_abi: &mut FnAbi) {
        if !self.skip_return_value_rewrite(cx, fn_abi) {
            self.rewrite_value(cx, &mut fn_abi.ret, Some(fn_abi.linkage));
        }

        for arg in fn_abi.args.iter_mut().filter(|arg| !arg.by_ref) {
            self.rewrite_value(cx, arg, None);
        }
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        self.rewrite_value(cx, arg, None);
    }
}
