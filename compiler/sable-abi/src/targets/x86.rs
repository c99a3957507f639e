//! The 32-bit x86 conventions: `cdecl` for C and C++, `stdcall` for the
//! native convention and Windows, `thiscall` for MSVC member functions.
//!
//! The native convention passes its last parameter in `EAX` when it fits,
//! and pushes the parameters in reverse order.

use sable_target::{Target, primitives::FloatTy};
use sable_types::{
    sig::{FnSig, Linkage},
    ty::{TyId, TyKind},
};

use crate::{
    cx::AbiCx,
    error::AbiError,
    fn_abi::{ArgAbi, ArgAttributeFlag, CallingConvention, FnAbi, RegisterBudget},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X86Abi {
    is_msvc: bool,

    /// Small aggregates are returned in `EAX:EDX` instead of memory.
    return_structs_in_regs: bool,
}

impl X86Abi {
    pub fn new(target: &Target) -> Self {
        let returns_in_memory = target.is_os_linux() || target.is_os_solaris() || target.is_os_netbsd();
        Self { is_msvc: target.is_msvc(), return_structs_in_regs: !returns_in_memory }
    }

    fn is_msvc_cpp(&self, linkage: Linkage) -> bool {
        self.is_msvc && linkage == Linkage::Cpp
    }

    /// Whether the last parameter of a native function can be passed in
    /// `EAX`.
    fn fits_eax(cx: &AbiCx, arg: &ArgAbi) -> bool {
        if arg.rewrite() == Some(Rewrite::IndirectByval) {
            return true;
        }

        if arg.by_ref {
            return !arg.attributes.contains(ArgAttributeFlag::BY_VAL);
        }

        !cx.tcx().is_floating(arg.ty) && matches!(cx.size_of(arg.ty).bytes(), 1 | 2 | 4)
    }
}

impl AbiPolicy for X86Abi {
    fn name(&self) -> &'static str {
        "x86"
    }

    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        let ret = sig.ret;

        if sig.ret_by_ref || !generic::is_aggregate(cx, ret) {
            return false;
        }

        let extern_d = generic::is_extern_d(sig);

        if cx.tcx().is_complex(ret) {
            // `cfloat` fits `EAX:EDX`, the native convention returns every
            // complex number in x87 registers.
            return !extern_d && cx.tcx().base_kind(ret) != TyKind::Complex(FloatTy::F32);
        }

        if !extern_d && !self.return_structs_in_regs {
            return true;
        }

        let msvc_cpp = self.is_msvc_cpp(sig.linkage);
        if msvc_cpp && sig.needs_this && cx.tcx().is_struct(ret) {
            return true;
        }

        !generic::is_pod(cx, ret, msvc_cpp) || !generic::can_rewrite_as_int(cx, ret, true)
    }

    fn pass_by_val(&self, cx: &AbiCx, sig: &FnSig, ty: TyId) -> bool {
        // MSVC passes C++ objects on the stack even if they are not POD.
        if !self.is_msvc_cpp(sig.linkage) && !generic::is_pod(cx, ty, false) {
            return false;
        }

        cx.tcx().is_in_memory_only(ty) && !generic::can_rewrite_as_int(cx, ty, true)
    }

    fn rewrite_function_type(&self, cx: &AbiCx, fn_abi: &mut FnAbi) {
        let tcx = cx.tcx();
        let extern_d = fn_abi.linkage == Linkage::D && !fn_abi.c_variadic;
        let msvc_cpp = self.is_msvc_cpp(fn_abi.linkage);

        if !self.skip_return_value_rewrite(cx, fn_abi) {
            let ret = &mut fn_abi.ret;
            let is_cfloat = tcx.base_kind(ret.ty) == TyKind::Complex(FloatTy::F32);

            if generic::is_aggregate(cx, ret.ty)
                && generic::can_rewrite_as_int(cx, ret.ty, true)
                && !(extern_d && is_cfloat)
                && !generic::is_integer_rewrite_redundant(cx, ret)
            {
                Rewrite::Integer.apply_to(cx, ret, None);
            }
        }

        for arg in fn_abi.args.iter_mut().filter(|arg| !arg.by_ref) {
            if !msvc_cpp && !generic::is_pod(cx, arg.ty, false) {
                Rewrite::IndirectByval.apply_to(cx, arg, None);
            } else if tcx.is_in_memory_only(arg.ty)
                && generic::can_rewrite_as_int(cx, arg.ty, true)
                && !generic::is_integer_rewrite_redundant(cx, arg)
            {
                Rewrite::Integer.apply_to(cx, arg, None);
            }
        }

        if !extern_d {
            return;
        }

        let in_eax = if let Some(this) = fn_abi.arg_this.as_mut() {
            Some(this)
        } else if let Some(nest) = fn_abi.arg_nest.as_mut() {
            Some(nest)
        } else if let Some(sret) = fn_abi.arg_sret.as_mut() {
            Some(sret)
        } else {
            fn_abi.args.last_mut().filter(|last| Self::fits_eax(cx, last))
        };

        if let Some(arg) = in_eax {
            arg.attributes.set(ArgAttributeFlag::IN_REG);
        }

        fn_abi.reverse_params = fn_abi.args.len() > 1;
    }

    /// Variadic arguments are only copied if they are not POD.
    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        if !generic::is_pod(cx, arg.ty, false) {
            Rewrite::IndirectByval.apply_to(cx, arg, None);
        }
    }

    fn calling_convention(&self, cx: &AbiCx, sig: &FnSig) -> CallingConvention {
        match sig.linkage.resolve(cx.target().is_os_windows()) {
            Linkage::C | Linkage::ObjC => CallingConvention::C,
            Linkage::Cpp if self.is_msvc && sig.needs_this => CallingConvention::X86ThisCall,
            Linkage::Cpp => CallingConvention::C,
            Linkage::D | Linkage::Windows | Linkage::System => CallingConvention::X86StdCall,
        }
    }

    fn objc_msg_send_func(
        &self,
        cx: &AbiCx,
        ret: TyId,
        fn_abi: &FnAbi,
        direct_call: bool,
    ) -> Result<&'static str, AbiError> {
        let func = if fn_abi.arg_sret.is_some() {
            match direct_call {
                true => "objc_msgSendSuper_stret",
                false => "objc_msgSend_stret",
            }
        } else if !direct_call && cx.tcx().is_floating(ret) && !cx.tcx().is_complex(ret) {
            "objc_msgSend_fpret"
        } else if direct_call {
            "objc_msgSendSuper"
        } else {
            "objc_msgSend"
        };

        Ok(func)
    }
}
