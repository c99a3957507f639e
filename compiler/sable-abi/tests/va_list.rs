mod common;

use common::{MemoryBuilder, Value, pod, tcx};
use pretty_assertions::assert_eq;
use sable_abi::{
    builder::{AbiBuilderMethods, DValue},
    cx::AbiCx,
    error::AbiError,
    fn_abi::FnAbi,
    policy::AbiPolicy,
    targets::TargetAbi,
    ty::NativeTy,
};
use sable_reporting::reporter::Reporter;
use sable_target::primitives::FloatTy;
use sable_types::{
    ctx::TyCtx,
    sig::{FnSig, Linkage},
    ty::{TyId, TyKind},
};

fn policy(tcx: &TyCtx) -> TargetAbi {
    TargetAbi::for_target(tcx.target(), &mut Reporter::new())
}

/// A stack slot holding a pointer.
fn ptr_slot(bx: &mut MemoryBuilder, cx: &AbiCx) -> Value {
    let align = cx.align_of(cx.tcx().common().void_ptr);
    bx.alloca(&NativeTy::Ptr, align, "ap")
}

fn load_ptr(bx: &mut MemoryBuilder, cx: &AbiCx, ptr: &Value) -> Value {
    let align = cx.align_of(cx.tcx().common().void_ptr);
    bx.load(&NativeTy::Ptr, ptr.clone(), align)
}

#[test]
fn sysv_va_list_points_to_a_register_save_area() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let abi = policy(&tcx);
    let cx = AbiCx::new(&tcx);
    let mut bx = MemoryBuilder::new(&cx);

    let va_list = abi.va_list_ty(&cx);
    assert_eq!(cx.ty_name(va_list), "__va_list_tag*");
    assert_eq!(cx.lower_ty(va_list), NativeTy::Ptr);

    let ap = ptr_slot(&mut bx, &cx);
    let mem = abi.prepare_va_start(&mut bx, &cx, ap.clone());

    assert_ne!(mem, ap);
    assert_eq!(load_ptr(&mut bx, &cx, &ap), mem);
    assert_eq!(abi.prepare_va_arg(&mut bx, &cx, ap.clone()), mem);
    assert!(bx.allocas.contains(&"__va_list_mem".to_string()));
}

#[test]
fn sysv_va_copy_duplicates_the_save_area() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let abi = policy(&tcx);
    let cx = AbiCx::new(&tcx);
    let mut bx = MemoryBuilder::new(&cx);

    let src = ptr_slot(&mut bx, &cx);
    let src_mem = abi.prepare_va_start(&mut bx, &cx, src.clone());
    let state: Vec<u8> = (1..=24).collect();
    bx.write(&src_mem, &state);

    let dest = ptr_slot(&mut bx, &cx);
    abi.va_copy(&mut bx, &cx, dest.clone(), &DValue::place(abi.va_list_ty(&cx), src));

    let dest_mem = load_ptr(&mut bx, &cx, &dest);
    assert_ne!(dest_mem, src_mem);
    assert_eq!(bx.read(&dest_mem, 24), state);
}

#[test]
fn aapcs_va_list_is_copied_bitwise() {
    let tcx = tcx("aarch64-unknown-linux-gnu");
    let abi = policy(&tcx);
    let cx = AbiCx::new(&tcx);
    let mut bx = MemoryBuilder::new(&cx);

    let va_list = abi.va_list_ty(&cx);
    assert_eq!(cx.size_of(va_list).bytes(), 32);
    assert!(tcx.struct_decl_of(va_list).unwrap().is_va_list_tag());

    let state: Vec<u8> = (1..=32).collect();
    let src = bx.place_with(&state, cx.align_of(va_list));
    let dest = bx.alloca(&cx.lower_ty(va_list), cx.align_of(va_list), "dest");

    assert_eq!(abi.prepare_va_start(&mut bx, &cx, src.clone()), src);
    assert_eq!(abi.prepare_va_arg(&mut bx, &cx, src.clone()), src);

    abi.va_copy(&mut bx, &cx, dest.clone(), &DValue::place(va_list, src));
    assert_eq!(bx.read(&dest, 32), state);
}

#[test]
fn pointer_va_lists_are_stored() {
    for triple in ["aarch64-apple-darwin", "sparc64-unknown-linux-gnu", "x86_64-pc-windows-msvc"] {
        let tcx = tcx(triple);
        let abi = policy(&tcx);
        let cx = AbiCx::new(&tcx);
        let mut bx = MemoryBuilder::new(&cx);

        let va_list = abi.va_list_ty(&cx);
        assert_eq!(va_list, tcx.common().byte_ptr, "{triple}");

        let dest = ptr_slot(&mut bx, &cx);
        abi.va_copy(&mut bx, &cx, dest.clone(), &DValue::immediate(va_list, Value::Ptr(1234)));
        assert_eq!(load_ptr(&mut bx, &cx, &dest), Value::Ptr(1234), "{triple}");

        let src = ptr_slot(&mut bx, &cx);
        bx.write(&src, &5678u64.to_le_bytes());
        abi.va_copy(&mut bx, &cx, dest.clone(), &DValue::place(va_list, src));
        assert_eq!(load_ptr(&mut bx, &cx, &dest), Value::Ptr(5678), "{triple}");
    }
}

#[test]
fn arm_va_list_wraps_a_pointer() {
    let tcx = tcx("armv7-unknown-linux-gnueabihf");
    let abi = policy(&tcx);
    let cx = AbiCx::new(&tcx);

    let va_list = abi.va_list_ty(&cx);
    assert_eq!(cx.lower_ty(va_list).to_string(), "{ ptr }");
    assert_eq!(cx.size_of(va_list).bytes(), 4);
}

fn msg_send(
    triple: &str,
    ret: impl FnOnce(&TyCtx) -> TyId,
    direct_call: bool,
) -> Result<&'static str, AbiError> {
    let tcx = tcx(triple);
    let abi = policy(&tcx);
    let cx = AbiCx::new(&tcx);

    let ret = ret(&tcx);
    let fn_abi = FnAbi::lower(&abi, &cx, &FnSig::new(ret, Linkage::ObjC));
    abi.objc_msg_send_func(&cx, ret, &fn_abi, direct_call)
}

#[test]
fn sysv_message_dispatch() {
    let triple = "x86_64-apple-darwin";
    let creal = |tcx: &TyCtx| tcx.intern(TyKind::Complex(FloatTy::F80));
    let large = |tcx: &TyCtx| {
        let common = tcx.common().clone();
        pod(tcx, "Large", &[common.i64, common.i64, common.i64, common.i64])
    };

    assert_eq!(msg_send(triple, |tcx| tcx.common().i32, false), Ok("objc_msgSend"));
    assert_eq!(msg_send(triple, |tcx| tcx.common().i32, true), Ok("objc_msgSendSuper"));
    assert_eq!(msg_send(triple, |tcx| tcx.common().f80, false), Ok("objc_msgSend_fpret"));
    assert_eq!(msg_send(triple, creal, false), Ok("objc_msgSend_fp2ret"));
    assert_eq!(msg_send(triple, creal, true), Ok("objc_msgSendSuper"));
    assert_eq!(msg_send(triple, large, false), Ok("objc_msgSend_stret"));
    assert_eq!(msg_send(triple, large, true), Ok("objc_msgSendSuper_stret"));
}

#[test]
fn aarch64_message_dispatch_never_uses_stret() {
    let triple = "aarch64-apple-darwin";
    let large = |tcx: &TyCtx| {
        let common = tcx.common().clone();
        pod(tcx, "Large", &[common.i64, common.i64, common.i64, common.i64])
    };

    assert_eq!(msg_send(triple, large, false), Ok("objc_msgSend"));
    assert_eq!(msg_send(triple, large, true), Ok("objc_msgSendSuper"));
}

#[test]
fn message_dispatch_is_unsupported_without_a_runtime_convention() {
    let result = msg_send("sparc64-unknown-linux-gnu", |tcx| tcx.common().i32, false);
    assert!(matches!(result, Err(AbiError::UnsupportedObjcAbi { .. })));
}
