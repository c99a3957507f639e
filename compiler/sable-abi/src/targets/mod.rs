//! The calling convention policies of the supported architectures, and the
//! factory which selects one for a target.

mod aarch64;
mod arm;
mod intrinsic;
mod loongarch64;
mod mips64;
mod ppc;
mod ppc64le;
mod riscv64;
mod wasm;
mod win64;
mod x86;
mod x86_64;

use log::debug;
use sable_reporting::reporter::Reporter;
use sable_target::{Target, TargetArch};
use sable_types::{sig::FnSig, ty::TyId};

pub use self::{
    aarch64::AArch64Abi, arm::ArmAbi, intrinsic::IntrinsicAbi, loongarch64::LoongArch64Abi,
    mips64::Mips64Abi, ppc::PpcAbi, ppc64le::Ppc64LeAbi, riscv64::RiscV64Abi, wasm::WasmAbi,
    win64::Win64Abi, x86::X86Abi, x86_64::SysVAbi,
};
use crate::{
    builder::{AbiBuilderMethods, DValue},
    cx::AbiCx,
    error::AbiError,
    fn_abi::{ArgAbi, CallingConvention, FnAbi, RegisterBudget, UnwindTableKind},
    policy::AbiPolicy,
};

/// The policy of targets whose convention is not known. It only applies the
/// default decisions, which are unlikely to match the platform C convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericAbi;

impl AbiPolicy for GenericAbi {
    fn name(&self) -> &'static str {
        "generic"
    }
}

/// The calling convention policy of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAbi {
    Generic(GenericAbi),
    Intrinsic(IntrinsicAbi),
    X86(X86Abi),
    SysV(SysVAbi),
    Win64(Win64Abi),
    AArch64(AArch64Abi),
    Arm(ArmAbi),
    RiscV64(RiscV64Abi),
    LoongArch64(LoongArch64Abi),
    Mips64(Mips64Abi),
    Ppc(PpcAbi),
    Ppc64Le(Ppc64LeAbi),
    Wasm(WasmAbi),
}

/// Run `$body` with `$policy` bound to the concrete policy of a [TargetAbi].
macro_rules! for_each_policy {
    ($abi:expr, $policy:ident => $body:expr) => {
        match $abi {
            TargetAbi::Generic($policy) => $body,
            TargetAbi::Intrinsic($policy) => $body,
            TargetAbi::X86($policy) => $body,
            TargetAbi::SysV($policy) => $body,
            TargetAbi::Win64($policy) => $body,
            TargetAbi::AArch64($policy) => $body,
            TargetAbi::Arm($policy) => $body,
            TargetAbi::RiscV64($policy) => $body,
            TargetAbi::LoongArch64($policy) => $body,
            TargetAbi::Mips64($policy) => $body,
            TargetAbi::Ppc($policy) => $body,
            TargetAbi::Ppc64Le($policy) => $body,
            TargetAbi::Wasm($policy) => $body,
        }
    };
}

static INTRINSIC: TargetAbi = TargetAbi::Intrinsic(IntrinsicAbi);

impl TargetAbi {
    /// Select the policy of the target. Architectures without a dedicated
    /// policy fall back to [GenericAbi] and a warning is reported, since
    /// calls into C code will most likely be miscompiled.
    pub fn for_target(target: &Target, reporter: &mut Reporter) -> TargetAbi {
        let abi = match target.arch() {
            TargetArch::X86 => TargetAbi::X86(X86Abi::new(target)),
            TargetArch::X86_64 if target.is_os_windows() => TargetAbi::Win64(Win64Abi::new(target)),
            TargetArch::X86_64 => TargetAbi::SysV(SysVAbi),
            TargetArch::Mips | TargetArch::Mips64 => TargetAbi::Mips64(Mips64Abi::new(target)),
            TargetArch::RiscV64 => TargetAbi::RiscV64(RiscV64Abi::new(target)),
            TargetArch::PowerPC | TargetArch::PowerPC64 => TargetAbi::Ppc(PpcAbi::new(target)),
            TargetArch::PowerPC64Le => TargetAbi::Ppc64Le(Ppc64LeAbi),
            TargetArch::AArch64 => TargetAbi::AArch64(AArch64Abi::new(target)),
            TargetArch::Arm => TargetAbi::Arm(ArmAbi::new(target)),
            TargetArch::LoongArch64 => TargetAbi::LoongArch64(LoongArch64Abi::new(target)),
            TargetArch::Wasm32 | TargetArch::Wasm64 => TargetAbi::Wasm(WasmAbi),
            TargetArch::Unknown => {
                reporter
                    .warning()
                    .title(format!(
                        "unknown target ABI for architecture `{}`, falling back to the generic implementation",
                        target.triple().architecture
                    ))
                    .add_note("C/C++ interop will almost certainly not work");

                TargetAbi::Generic(GenericAbi)
            }
        };

        debug!("using the {} calling convention policy for `{target}`", abi.name());
        abi
    }

    /// The policy that is used for calls to compiler intrinsics, regardless
    /// of the target.
    pub fn intrinsic() -> &'static TargetAbi {
        &INTRINSIC
    }

    /// The calling convention of a function. C-style variadic functions
    /// always use the C convention.
    pub fn calling_convention_for(&self, cx: &AbiCx, sig: &FnSig) -> CallingConvention {
        match sig.is_c_variadic() {
            true => CallingConvention::C,
            false => self.calling_convention(cx, sig),
        }
    }
}

impl AbiPolicy for TargetAbi {
    fn name(&self) -> &'static str {
        for_each_policy!(self, abi => abi.name())
    }

    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        for_each_policy!(self, abi => abi.return_in_arg(cx, sig))
    }

    fn pass_by_val(&self, cx: &AbiCx, sig: &FnSig, ty: TyId) -> bool {
        for_each_policy!(self, abi => abi.pass_by_val(cx, sig, ty))
    }

    fn pass_this_before_sret(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        for_each_policy!(self, abi => abi.pass_this_before_sret(cx, sig))
    }

    fn skip_return_value_rewrite(&self, cx: &AbiCx, fn_abi: &FnAbi) -> bool {
        for_each_policy!(self, abi => abi.skip_return_value_rewrite(cx, fn_abi))
    }

    fn rewrite_function_type(&self, cx: &AbiCx, fn_abi: &mut FnAbi) {
        for_each_policy!(self, abi => abi.rewrite_function_type(cx, fn_abi))
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, budget: &mut RegisterBudget) {
        for_each_policy!(self, abi => abi.rewrite_argument(cx, arg, budget))
    }

    fn rewrite_varargs(&self, cx: &AbiCx, fn_abi: &FnAbi, args: &mut [ArgAbi]) {
        for_each_policy!(self, abi => abi.rewrite_varargs(cx, fn_abi, args))
    }

    fn calling_convention(&self, cx: &AbiCx, sig: &FnSig) -> CallingConvention {
        for_each_policy!(self, abi => abi.calling_convention(cx, sig))
    }

    fn default_unwind_table_kind(&self, target: &Target) -> UnwindTableKind {
        for_each_policy!(self, abi => abi.default_unwind_table_kind(target))
    }

    fn va_list_ty(&self, cx: &AbiCx) -> TyId {
        for_each_policy!(self, abi => abi.va_list_ty(cx))
    }

    fn prepare_va_start<B: AbiBuilderMethods>(
        &self,
        bx: &mut B,
        cx: &AbiCx,
        ap: B::Value,
    ) -> B::Value {
        for_each_policy!(self, abi => abi.prepare_va_start(bx, cx, ap))
    }

    fn va_copy<B: AbiBuilderMethods>(
        &self,
        bx: &mut B,
        cx: &AbiCx,
        dest: B::Value,
        src: &DValue<B::Value>,
    ) {
        for_each_policy!(self, abi => abi.va_copy(bx, cx, dest, src))
    }

    fn prepare_va_arg<B: AbiBuilderMethods>(
        &self,
        bx: &mut B,
        cx: &AbiCx,
        ap: B::Value,
    ) -> B::Value {
        for_each_policy!(self, abi => abi.prepare_va_arg(bx, cx, ap))
    }

    fn objc_msg_send_func(
        &self,
        cx: &AbiCx,
        ret: TyId,
        fn_abi: &FnAbi,
        direct_call: bool,
    ) -> Result<&'static str, AbiError> {
        for_each_policy!(self, abi => abi.objc_msg_send_func(cx, ret, fn_abi, direct_call))
    }
}
