//! The LoongArch 64-bit procedure call standard.

use sable_target::Target;
use sable_types::{sig::FnSig, ty::TyId};

use super::riscv64;
use crate::{
    cx::AbiCx,
    fn_abi::{ArgAbi, RegisterBudget, UnwindTableKind},
    policy::AbiPolicy,
};

/// The LoongArch LP64 conventions, `lp64d` on hard-float targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoongArch64Abi {
    hard_float: bool,
}

impl LoongArch64Abi {
    pub fn new(target: &Target) -> Self {
        Self { hard_float: target.is_hard_float() }
    }
}

impl AbiPolicy for LoongArch64Abi {
    fn name(&self) -> &'static str {
        "loongarch64"
    }

    fn pass_by_val(&self, cx: &AbiCx, _sig: &FnSig, ty: TyId) -> bool {
        riscv64::pass_by_val(cx, ty)
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        riscv64::rewrite_argument(cx, arg, self.hard_float)
    }

    fn default_unwind_table_kind(&self, _target: &Target) -> UnwindTableKind {
        UnwindTableKind::Async
    }
}
