//! The System V AMD64 convention, used by every x86-64 target except
//! Windows.

use log::debug;
use sable_target::{Target, data_layout::HasDataLayout, primitives::FloatTy};
use sable_types::{
    sig::FnSig,
    ty::{TyId, TyKind},
};

use crate::{
    builder::{AbiBuilderMethods, DValue},
    cx::AbiCx,
    error::AbiError,
    fn_abi::{ArgAbi, ArgAttributeFlag, FnAbi, RegisterBudget, UnwindTableKind},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
    ty::NativeTy,
};

/// General purpose argument registers: `RDI`, `RSI`, `RDX`, `RCX`, `R8` and
/// `R9`.
const INT_ARG_REGS: u32 = 6;

/// `XMM0` to `XMM7`.
const SSE_ARG_REGS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    Fully,
    Partially,
    Not,
}

/// The registers that a value of the native type occupies.
fn registers_for(native: &NativeTy) -> RegisterBudget {
    match native {
        NativeTy::Int { .. } | NativeTy::Ptr => RegisterBudget::new(1, 0),
        NativeTy::Float(FloatTy::F80) | NativeTy::Void => RegisterBudget::default(),
        NativeTy::Float(_) | NativeTy::Vector { .. } => RegisterBudget::new(0, 1),
        NativeTy::Array { element, count } => {
            let element = registers_for(element);
            let count = u32::try_from(*count).unwrap_or(u32::MAX);
            RegisterBudget::new(
                element.int_regs.saturating_mul(count),
                element.sse_regs.saturating_mul(count),
            )
        }
        NativeTy::Struct { fields, .. } => {
            fields.iter().map(registers_for).fold(RegisterBudget::default(), |total, field| {
                RegisterBudget::new(total.int_regs + field.int_regs, total.sse_regs + field.sse_regs)
            })
        }
    }
}

/// Take the `wanted` registers out of the budget if all of them are
/// available.
fn try_take(budget: &mut RegisterBudget, wanted: RegisterBudget) -> Fit {
    let int_fits = budget.int_regs >= wanted.int_regs;
    let sse_fits = budget.sse_regs >= wanted.sse_regs;

    if int_fits && sse_fits {
        budget.int_regs -= wanted.int_regs;
        budget.sse_regs -= wanted.sse_regs;
        return Fit::Fully;
    }

    let any_available = (wanted.int_regs > 0 && budget.int_regs > 0)
        || (wanted.sse_regs > 0 && budget.sse_regs > 0);

    match any_available {
        true => Fit::Partially,
        false => Fit::Not,
    }
}

/// The `__va_list_tag` structure that a `va_list` points to.
fn va_list_tag(cx: &AbiCx) -> TyId {
    let common = cx.tcx().common();

    cx.tcx().builtin_struct(
        "__va_list_tag",
        &[
            ("gp_offset", common.u32),
            ("fp_offset", common.u32),
            ("overflow_arg_area", common.void_ptr),
            ("reg_save_area", common.void_ptr),
        ],
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysVAbi;

impl SysVAbi {
    /// The register representation of the type, if it differs from the
    /// direct mapping.
    fn abi_ty(cx: &AbiCx, ty: TyId) -> Option<NativeTy> {
        let native = cx.classifier().rewritten_type_of(ty)?;
        (!native.is_layout_equivalent(&cx.lower_ty(ty), cx)).then_some(native)
    }

    /// Values that the classifier puts into memory.
    fn pass_in_memory(cx: &AbiCx, ty: TyId) -> bool {
        cx.classifier().classify(ty).is_empty()
    }
}

impl AbiPolicy for SysVAbi {
    fn name(&self) -> &'static str {
        "x86-64"
    }

    /// `creal` is returned in `ST0` and `ST1`. As a parameter it is passed
    /// as it is and the code generator puts both parts on the stack.
    fn pass_by_val(&self, cx: &AbiCx, _sig: &FnSig, ty: TyId) -> bool {
        !matches!(cx.tcx().base_kind(ty), TyKind::Complex(FloatTy::F80))
            && generic::is_pod(cx, ty, false)
            && Self::pass_in_memory(cx, ty)
    }

    fn rewrite_function_type(&self, cx: &AbiCx, fn_abi: &mut FnAbi) {
        let mut budget = RegisterBudget::new(INT_ARG_REGS, SSE_ARG_REGS);

        if !self.skip_return_value_rewrite(cx, fn_abi) {
            if let Some(native) = Self::abi_ty(cx, fn_abi.ret.ty) {
                Rewrite::ArgTypes.apply_to(cx, &mut fn_abi.ret, Some(native));
            }
        }

        let hidden = [
            fn_abi.arg_sret.is_some(),
            fn_abi.arg_this.is_some() || fn_abi.arg_nest.is_some(),
            fn_abi.arg_objc_selector.is_some(),
        ];

        for _ in 0..hidden.into_iter().filter(|present| *present).count() {
            budget.take_int();
        }

        for arg in &mut fn_abi.args {
            if !arg.by_ref {
                self.rewrite_argument(cx, arg, &mut budget);
            } else if !arg.attributes.contains(ArgAttributeFlag::BY_VAL) {
                budget.take_int();
            }
        }

        fn_abi.register_budget = budget;
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, budget: &mut RegisterBudget) {
        if !generic::is_pod(cx, arg.ty, false) {
            Rewrite::IndirectByval.apply_to(cx, arg, None);
            budget.take_int();
            return;
        }

        let native = Self::abi_ty(cx, arg.ty);
        let wanted = registers_for(native.as_ref().unwrap_or(arg.native_ty()));

        match try_take(budget, wanted) {
            Fit::Fully => {
                if let Some(native) = native {
                    Rewrite::ArgTypes.apply_to(cx, arg, Some(native));
                }
            }
            Fit::Partially => {
                debug!("`{}` does not fit the remaining registers", cx.ty_name(arg.ty));
                Rewrite::ImplicitByval.apply_to(cx, arg, None);
            }
            Fit::Not => {}
        }
    }

    fn default_unwind_table_kind(&self, _target: &Target) -> UnwindTableKind {
        UnwindTableKind::Async
    }

    fn va_list_ty(&self, cx: &AbiCx) -> TyId {
        cx.tcx().ptr_to(va_list_tag(cx))
    }

    fn prepare_va_start<B: AbiBuilderMethods>(
        &self,
        bx: &mut B,
        cx: &AbiCx,
        ap: B::Value,
    ) -> B::Value {
        let tag = va_list_tag(cx);
        let mem = bx.alloca(&cx.lower_ty(tag), cx.align_of(tag), "__va_list_mem");
        bx.store(mem.clone(), ap, cx.data_layout().pointer_align.abi);
        mem
    }

    fn va_copy<B: AbiBuilderMethods>(
        &self,
        bx: &mut B,
        cx: &AbiCx,
        dest: B::Value,
        src: &DValue<B::Value>,
    ) {
        let tag = va_list_tag(cx);
        let ptr_align = cx.data_layout().pointer_align.abi;

        let mem = bx.alloca(&cx.lower_ty(tag), cx.align_of(tag), "__va_list_mem");
        bx.store(mem.clone(), dest, ptr_align);

        let src = match src {
            DValue::Place { ptr, .. } => bx.load(&NativeTy::Ptr, ptr.clone(), ptr_align),
            DValue::Immediate { value, .. } => value.clone(),
        };

        bx.mem_copy(mem, src, cx.size_of(tag), cx.align_of(tag));
    }

    fn prepare_va_arg<B: AbiBuilderMethods>(
        &self,
        bx: &mut B,
        cx: &AbiCx,
        ap: B::Value,
    ) -> B::Value {
        bx.load(&NativeTy::Ptr, ap, cx.data_layout().pointer_align.abi)
    }

    fn objc_msg_send_func(
        &self,
        cx: &AbiCx,
        ret: TyId,
        fn_abi: &FnAbi,
        direct_call: bool,
    ) -> Result<&'static str, AbiError> {
        if fn_abi.arg_sret.is_some() {
            return Ok(match direct_call {
                true => "objc_msgSendSuper_stret",
                false => "objc_msgSend_stret",
            });
        }

        let func = match cx.tcx().base_kind(ret) {
            TyKind::Complex(FloatTy::F80) if !direct_call => "objc_msgSend_fp2ret",
            TyKind::Float(FloatTy::F80) | TyKind::Imaginary(FloatTy::F80) if !direct_call => {
                "objc_msgSend_fpret"
            }
            _ if direct_call => "objc_msgSendSuper",
            _ => "objc_msgSend",
        };

        Ok(func)
    }
}
