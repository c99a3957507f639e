//! The WebAssembly C convention. Only aggregates that wrap a single scalar
//! are passed in a value, everything else goes through memory.

use sable_types::{sig::FnSig, ty::TyId};

use crate::{
    cx::AbiCx,
    fn_abi::{ArgAbi, RegisterBudget},
    generic,
    policy::AbiPolicy,
    rewrite::Rewrite,
    ty::NativeTy,
};

/// The scalar that an aggregate of exactly one scalar leaf is passed as.
/// Nested single-field structs are unwrapped.
fn single_scalar(cx: &AbiCx, ty: TyId) -> Option<NativeTy> {
    let tcx = cx.tcx();
    let decl = tcx.struct_decl_of(ty)?;

    let [field] = decl.fields.as_slice() else {
        return None;
    };

    match tcx.is_scalar(field.ty) {
        true => Some(cx.lower_ty(field.ty)),
        false => single_scalar(cx, field.ty),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WasmAbi;

impl AbiPolicy for WasmAbi {
    fn name(&self) -> &'static str {
        "wasm"
    }

    fn return_in_arg(&self, cx: &AbiCx, sig: &FnSig) -> bool {
        let ret = sig.ret;

        !sig.ret_by_ref
            && (!generic::is_pod(cx, ret, false)
                || (generic::is_aggregate(cx, ret) && single_scalar(cx, ret).is_none()))
    }

    fn pass_by_val(&self, _cx: &AbiCx, _sig: &FnSig, _ty: TyId) -> bool {
        false
    }

    fn rewrite_argument(&self, cx: &AbiCx, arg: &mut ArgAbi, _budget: &mut RegisterBudget) {
        if !generic::is_aggregate(cx, arg.ty) {
            return;
        }

        match single_scalar(cx, arg.ty).filter(|_| generic::is_pod(cx, arg.ty, false)) {
            Some(scalar) => Rewrite::ArgTypes.apply_to(cx, arg, Some(scalar)),
            None => Rewrite::IndirectByval.apply_to(cx, arg, None),
        }
    }
}
