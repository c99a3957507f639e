//! Lowering of a source function signature into its [FnAbi] for a target.

use log::trace;
use sable_types::{
    sig::{FnSig, ParamStorage},
    ty::{TyId, TyKind},
};

use crate::{
    cx::AbiCx,
    fn_abi::{ArgAbi, ArgAttributeFlag, ArgAttributes, ArgExtension, FnAbi, RegisterBudget},
    policy::AbiPolicy,
    targets::TargetAbi,
};

/// Integers narrower than 32 bits are widened by the side that the
/// convention assigns, the attribute tells the native code generator how.
fn extension_of(cx: &AbiCx, ty: TyId) -> ArgAttributes {
    let tcx = cx.tcx();
    let mut attributes = ArgAttributes::new();

    if tcx.is_integral(ty) && cx.size_of(ty).bytes() < 4 {
        attributes.extend_with(match tcx.is_unsigned(ty) {
            true => ArgExtension::ZeroExtend,
            false => ArgExtension::SignExtend,
        });
    }

    attributes
}

impl FnAbi {
    /// Lower the signature with the given policy. The returned [FnAbi] has
    /// every rewrite of the policy applied and is immutable from here on.
    pub fn lower(abi: &TargetAbi, cx: &AbiCx, sig: &FnSig) -> FnAbi {
        let tcx = cx.tcx();
        let common = tcx.common();

        let linkage = sig.linkage.resolve(cx.target().is_os_windows());
        let sig = &FnSig { linkage, ..sig.clone() };

        let (ret, arg_sret) = match abi.return_in_arg(cx, sig) {
            true => {
                let mut attributes = ArgAttributes::new();
                attributes.set(ArgAttributeFlag::STRUCT_RET).set(ArgAttributeFlag::NO_ALIAS);

                let ret = ArgAbi::new(cx, common.void, false, ArgAttributes::new());
                (ret, Some(ArgAbi::new(cx, sig.ret, true, attributes)))
            }
            false => {
                let attributes = match sig.ret_by_ref {
                    true => ArgAttributes::new(),
                    false => extension_of(cx, sig.ret),
                };
                (ArgAbi::new(cx, sig.ret, sig.ret_by_ref, attributes), None)
            }
        };

        let arg_this =
            sig.needs_this.then(|| ArgAbi::new(cx, common.void, true, ArgAttributes::new()));

        let arg_nest = (sig.is_nested && !sig.needs_this).then(|| {
            let mut attributes = ArgAttributes::new();
            attributes.set(ArgAttributeFlag::NEST);
            ArgAbi::new(cx, common.void, true, attributes)
        });

        let arg_objc_selector = sig
            .is_objc_method
            .then(|| ArgAbi::new(cx, common.void_ptr, false, ArgAttributes::new()));

        let args = sig
            .params
            .iter()
            .map(|param| match param.storage {
                // Lazy parameters are evaluated by calling a delegate.
                ParamStorage::Lazy => {
                    ArgAbi::new(cx, tcx.intern(TyKind::Delegate), false, ArgAttributes::new())
                }
                ParamStorage::Ref | ParamStorage::Out => {
                    ArgAbi::new(cx, param.ty, true, ArgAttributes::new())
                }
                ParamStorage::Value if abi.pass_by_val(cx, sig, param.ty) => {
                    let mut attributes = ArgAttributes::new();
                    attributes.set(ArgAttributeFlag::BY_VAL);
                    ArgAbi::new(cx, param.ty, true, attributes)
                }
                ParamStorage::Value => ArgAbi::new(cx, param.ty, false, extension_of(cx, param.ty)),
            })
            .collect();

        let mut fn_abi = FnAbi {
            ret,
            arg_sret,
            arg_this,
            arg_nest,
            arg_objc_selector,
            args,
            reverse_params: false,
            pass_this_before_sret: false,
            calling_convention: Default::default(),
            c_variadic: sig.is_c_variadic(),
            linkage,
            unwind_table_kind: Default::default(),
            register_budget: RegisterBudget::default(),
        };

        abi.rewrite_function_type(cx, &mut fn_abi);

        fn_abi.pass_this_before_sret = abi.pass_this_before_sret(cx, sig);
        fn_abi.calling_convention = abi.calling_convention_for(cx, sig);
        fn_abi.unwind_table_kind = abi.default_unwind_table_kind(cx.target());

        trace!("lowered {linkage} function with the {} policy: {fn_abi}", abi.name());
        fn_abi
    }

    /// Lower the variadic arguments of a call to this C-style variadic
    /// function. Arguments are passed by value and rewritten as the policy
    /// prescribes for the registers that are left.
    pub fn lower_varargs(&self, abi: &TargetAbi, cx: &AbiCx, tys: &[TyId]) -> Vec<ArgAbi> {
        let mut args: Vec<_> =
            tys.iter().map(|ty| ArgAbi::new(cx, *ty, false, extension_of(cx, *ty))).collect();

        abi.rewrite_varargs(cx, self, &mut args);
        args
    }
}
