//! The decisions that a target convention makes when lowering a function
//! type. Every decision has a default which is implemented in
//! [crate::generic], architecture policies only override what differs.

use sable_target::Target;
use sable_types::{sig::FnSig, ty::TyId};

use crate::{
    builder::{AbiBuilderMethods, DValue},
    cx::AbiCx,
    error::AbiError,
    fn_abi::{ArgAbi, CallingConvention, FnAbi, RegisterBudget, UnwindTableKind},
    generic,
};

/// A calling convention policy of a target.
pub trait AbiPolicy: Send + Sync {
    /// The name of the policy, used in debug output.
    fn name(&self) -> &'static str;

    /// Whether the return value is written to memory that the caller passes
    /// a hidden pointer to.
    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        generic::return_in_arg(self, cx, sig)
    }

    /// Whether a parameter of the type is passed as a pointer to a copy that
    /// the native code generator makes.
    fn pass_by_val(&self, cx: &AbiCx, _sig: &FnSig, ty: TyId) -> bool {
        generic::pass_by_val(cx, ty)
    }

    /// Whether `this` precedes the hidden return pointer.
    fn pass_this_before_sret(&self, _cx: &AbiCx, _sig: &FnSig) -> bool {
        false
    }

    fn skip_return_value_rewrite(&self, cx: &AbiCx, fn_abi: &FnAbi) -> bool {
        generic::skip_return_value_rewrite(cx, fn_abi)
    }

    /// Rewrite the return value and the parameters of the lowered function.
    fn rewrite_function_type(&self, cx: &AbiCx, fn_abi: &mut FnAbi) {
        generic::rewrite_function_type(self, cx, fn_abi)
    }

    /// Rewrite a single value which is not passed by reference. Conventions
    /// that assign registers in order track them in `budget`.
    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        generic::rewrite_argument(cx, arg)
    }

    /// Rewrite the variadic arguments of a call.
    fn rewrite_varargs(&self, cx: &AbiCx, fn_abi: &FnAbi, args: &mut [ArgAbi]) {
        generic::rewrite_varargs(self, cx, fn_abi, args)
    }

    /// The calling convention of a function that is not C-style variadic.
    fn calling_convention(&self, _cx: &AbiCx, _sig: &FnSig) -> CallingConvention {
        CallingConvention::C
    }

    fn default_unwind_table_kind(&self, target: &Target) -> UnwindTableKind {
        generic::default_unwind_table_kind(target)
    }

    /// The source type of a `va_list`.
    fn va_list_ty(&self, cx: &AbiCx) -> TyId {
        cx.tcx().common().byte_ptr
    }

    /// Produce the pointer that is passed to the native `va_start`, given the
    /// address of the `va_list` variable.
    fn prepare_va_start<B: AbiBuilderMethods>(
        &self,
        _bx: &mut B,
        _cx: &AbiCx,
        ap: B::Value,
    ) -> B::Value {
        ap
    }

    /// Copy the `va_list` `src` into the variable at `dest`.
    fn va_copy<B: AbiBuilderMethods>(
        &self,
        bx: &mut B,
        cx: &AbiCx,
        dest: B::Value,
        src: &DValue<B::Value>,
    ) {
        generic::va_copy(self, bx, cx, dest, src)
    }

    /// Produce the pointer that is passed to the native `va_arg`, given the
    /// address of the `va_list` variable.
    fn prepare_va_arg<B: AbiBuilderMethods>(
        &self,
        _bx: &mut B,
        _cx: &AbiCx,
        ap: B::Value,
    ) -> B::Value {
        ap
    }

    /// The runtime function that dispatches an Objective-C message.
    fn objc_msg_send_func(
        &self,
        cx: &AbiCx,
        _ret: TyId,
        _fn_abi: &FnAbi,
        _direct_call: bool,
    ) -> Result<&'static str, AbiError> {
        Err(AbiError::UnsupportedObjcAbi { target: cx.target().to_string() })
    }
}
