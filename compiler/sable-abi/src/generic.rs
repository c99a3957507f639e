//! The default decisions of every [AbiPolicy], and the predicates that the
//! architecture policies are built from.

use sable_target::Target;
use sable_types::{
    sig::{FnSig, Linkage},
    ty::{TyId, TyKind},
};

use crate::{
    builder::{AbiBuilderMethods, DValue},
    cx::AbiCx,
    fn_abi::{ArgAbi, FnAbi, UnwindTableKind},
    policy::AbiPolicy,
    rewrite::Rewrite,
    ty::NativeTy,
};

/// Return through a hidden pointer if the type is not POD, or if a parameter
/// of the same type would be copied through memory.
pub fn return_in_arg<P: AbiPolicy + ?Sized>(abi: &P, cx: &AbiCx, sig: &FnSig) -> bool {
    !sig.ret_by_ref && (!is_pod(cx, sig.ret, false) || abi.pass_by_val(cx, sig, sig.ret))
}

/// Copy POD structs and static arrays through memory.
pub fn pass_by_val(cx: &AbiCx, ty: TyId) -> bool {
    cx.tcx().is_in_memory_only(ty) && is_pod(cx, ty, false)
}

/// The return value is left alone if it is returned by reference or if there
/// is no value.
pub fn skip_return_value_rewrite(cx: &AbiCx, fn_abi: &FnAbi) -> bool {
    fn_abi.ret.by_ref
        || matches!(cx.tcx().base_kind(fn_abi.ret.ty), TyKind::Void | TyKind::NoReturn)
}

pub fn rewrite_function_type<P: AbiPolicy + ?Sized>(abi: &P, cx: &AbiCx, fn_abi: &mut FnAbi) {
    let mut budget = fn_abi.register_budget;

    if !abi.skip_return_value_rewrite(cx, fn_abi) {
        abi.rewrite_argument(cx, &mut fn_abi.ret, &mut budget);
    }

    for arg in fn_abi.args.iter_mut().filter(|arg| !arg.by_ref) {
        abi.rewrite_argument(cx, arg, &mut budget);
    }

    fn_abi.register_budget = budget;
}

/// Pass values that are not POD through a hidden copy, and POD aggregates in
/// the register slots that the classifier assigns to them.
pub fn rewrite_argument(cx: &AbiCx, arg: &mut ArgAbi) {
    let tcx = cx.tcx();

    if !is_pod(cx, arg.ty, false) {
        Rewrite::IndirectByval.apply_to(cx, arg, None);
        return;
    }

    if tcx.is_struct(arg.ty) || tcx.is_static_array(arg.ty) {
        if let Some(native) = cx.classifier().rewritten_type_of(arg.ty) {
            Rewrite::ArgTypes.apply_to(cx, arg, Some(native));
        }
    }
}

/// Rewrite every variadic argument of a call that is not passed by
/// reference. Register assignment continues where the fixed parameters of
/// the function left off.
pub fn rewrite_varargs<P: AbiPolicy + ?Sized>(
    abi: &P,
    cx: &AbiCx,
    fn_abi: &FnAbi,
    args: &mut [ArgAbi],
) {
    let mut budget = fn_abi.register_budget;

    for arg in args.iter_mut().filter(|arg| !arg.by_ref) {
        abi.rewrite_argument(cx, arg, &mut budget);
    }
}

pub fn default_unwind_table_kind(target: &Target) -> UnwindTableKind {
    match target.is_os_windows() {
        true => UnwindTableKind::Async,
        false => UnwindTableKind::None,
    }
}

/// Copy a `va_list` bitwise if it lives in memory, store it otherwise.
pub fn va_copy<P: AbiPolicy + ?Sized, B: AbiBuilderMethods>(
    abi: &P,
    bx: &mut B,
    cx: &AbiCx,
    dest: B::Value,
    src: &DValue<B::Value>,
) {
    let va_list = abi.va_list_ty(cx);
    let align = cx.align_of(va_list);

    match src {
        DValue::Place { ptr, .. } => bx.mem_copy(dest, ptr.clone(), cx.size_of(va_list), align),
        DValue::Immediate { value, .. } => bx.store(value.clone(), dest, align),
    }
}

/// Structs, static arrays, delegates and complex numbers. Dynamic arrays are
/// passed as a pair of scalars and are not aggregates.
pub fn is_aggregate(cx: &AbiCx, ty: TyId) -> bool {
    matches!(
        cx.tcx().base_kind(ty),
        TyKind::Struct(_) | TyKind::StaticArray { .. } | TyKind::Delegate | TyKind::Complex(_)
    )
}

/// Whether values of the type can be copied bitwise. With
/// `exclude_ctor`, structs with a constructor are not POD either.
pub fn is_pod(cx: &AbiCx, ty: TyId, exclude_ctor: bool) -> bool {
    cx.tcx().is_pod(ty, exclude_ctor)
}

/// Whether the type has the size of a 1, 2 or 4 byte integer, or of an 8
/// byte integer if `include_64bit` is set.
pub fn can_rewrite_as_int(cx: &AbiCx, ty: TyId, include_64bit: bool) -> bool {
    match cx.size_of(ty).bytes() {
        1 | 2 | 4 => true,
        8 => include_64bit,
        _ => false,
    }
}

/// Types larger than two machine words are better passed by reference.
pub fn prefer_pass_by_ref(cx: &AbiCx, ty: TyId) -> bool {
    cx.size_of(ty) > cx.target().pointer_size() * 2
}

/// Check whether the type is a homogeneous floating-point or vector
/// aggregate of at most `max` elements, returning the array type that it is
/// rewritten to.
pub fn is_hfva(cx: &AbiCx, ty: TyId, max: u64) -> Option<NativeTy> {
    let tcx = cx.tcx();
    let homogeneous = tcx.homogeneous_aggregate(ty).filter(|found| found.count <= max)?;
    Some(cx.lower_ty(homogeneous.array_ty(tcx)))
}

/// Like [is_hfva], but only for aggregates of vectors.
pub fn is_hva(cx: &AbiCx, ty: TyId, max: u64) -> Option<NativeTy> {
    let tcx = cx.tcx();
    let homogeneous = tcx
        .homogeneous_aggregate(ty)
        .filter(|found| found.count <= max && found.is_vector(tcx))?;
    Some(cx.lower_ty(homogeneous.array_ty(tcx)))
}

/// Functions with D linkage which are not C-style variadic use the native
/// convention of the language.
pub fn is_extern_d(sig: &FnSig) -> bool {
    sig.linkage == Linkage::D && !sig.is_c_variadic()
}

/// Whether passing the value as an integer of its size would not change its
/// native type.
pub fn is_integer_rewrite_redundant(cx: &AbiCx, arg: &ArgAbi) -> bool {
    let int = NativeTy::int_of_size(cx.size_of(arg.ty));
    arg.native_ty().is_layout_equivalent(&int, cx)
}
