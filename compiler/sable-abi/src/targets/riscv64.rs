//! The RISC-V LP64 conventions. The LoongArch LP64 conventions pass values
//! the same way and share the argument rewrite.

use sable_target::Target;
use sable_types::{
    sig::FnSig,
    ty::{TyId, TyKind},
};

use crate::{
    cx::AbiCx,
    flatten::requires_hard_float_rewrite,
    fn_abi::{ArgAbi, ArgExtension, RegisterBudget, UnwindTableKind},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
    ty::NativeTy,
};

/// Aggregates above two registers are copied by the native code generator.
const MAX_BY_VALUE_SIZE: u64 = 16;

const XLEN: u64 = 8;

pub(super) fn pass_by_val(cx: &AbiCx, ty: TyId) -> bool {
    generic::is_pod(cx, ty, false)
        && cx.tcx().is_in_memory_only(ty)
        && cx.size_of(ty).bytes() > MAX_BY_VALUE_SIZE
}

/// Rewrite a value which is passed in registers by an LP64 convention.
pub(super) fn rewrite_argument(cx: &AbiCx, arg: &mut ArgAbi, hard_float: bool) {
    let tcx = cx.tcx();

    if !generic::is_pod(cx, arg.ty, false) {
        Rewrite::IndirectByval.apply_to(cx, arg, None);
        return;
    }

    if hard_float && requires_hard_float_rewrite(tcx, arg.ty) {
        Rewrite::ScalarFields.apply_to(cx, arg, None);
        return;
    }

    let size = cx.size_of(arg.ty).bytes();

    // 32-bit integers are sign-extended into 64-bit registers even if they
    // are unsigned.
    if matches!(tcx.base_kind(arg.ty), TyKind::Int(_)) && size == 4 {
        arg.attributes.extend_with(ArgExtension::SignExtend);
        return;
    }

    if !generic::is_aggregate(cx, arg.ty) || size == 0 {
        return;
    }

    if size <= XLEN {
        let native = NativeTy::int(XLEN * 8);
        if !arg.native_ty().is_layout_equivalent(&native, cx) {
            Rewrite::Integer.apply_to(cx, arg, Some(native));
        }
    } else {
        Rewrite::CompositeToArray64.apply_to(cx, arg, None);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiscV64Abi {
    /// Floating-point values are passed in `F` registers (`lp64f`, `lp64d`).
    hard_float: bool,
}

impl RiscV64Abi {
    pub fn new(target: &Target) -> Self {
        Self { hard_float: target.is_hard_float() }
    }
}

impl AbiPolicy for RiscV64Abi {
    fn name(&self) -> &'static str {
        "riscv64"
    }

    fn pass_by_val(&self, cx: &AbiCx, _sig: &FnSig, ty: TyId) -> bool {
        pass_by_val(cx, ty)
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        rewrite_argument(cx, arg, self.hard_float)
    }

    fn default_unwind_table_kind(&self, _target: &Target) -> UnwindTableKind {
        UnwindTableKind::Async
    }
}
