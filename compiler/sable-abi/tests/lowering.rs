mod common;

use common::{declare, pod, tcx};
use pretty_assertions::assert_eq;
use sable_abi::{
    cx::AbiCx,
    fn_abi::{ArgAbi, ArgAttributeFlag, ArgExtension, CallingConvention, FnAbi, RegisterBudget},
    policy::AbiPolicy,
    rewrite::Rewrite,
    targets::TargetAbi,
};
use sable_reporting::reporter::Reporter;
use sable_target::{alignment::Alignment, primitives::FloatTy};
use sable_types::{
    ctx::TyCtx,
    sig::{FnSig, Linkage, Param, ParamStorage, Variadic},
    structs::{StructDecl, StructField, StructFlags},
    ty::{TyId, TyKind},
};

fn policy(tcx: &TyCtx) -> TargetAbi {
    TargetAbi::for_target(tcx.target(), &mut Reporter::new())
}

fn lower(tcx: &TyCtx, sig: &FnSig) -> FnAbi {
    FnAbi::lower(&policy(tcx), &AbiCx::new(tcx), sig)
}

fn params(tys: &[TyId]) -> Vec<Param> {
    tys.iter().copied().map(Param::new).collect()
}

/// The native type and rewrite of a lowered value.
fn shape(arg: &ArgAbi) -> (String, Option<Rewrite>) {
    (arg.native_ty().to_string(), arg.rewrite())
}

fn byval(arg: &ArgAbi) -> bool {
    arg.by_ref && arg.attributes.contains(ArgAttributeFlag::BY_VAL)
}

#[test]
fn implicit_parameters_and_storage_classes() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();

    let sig = FnSig::new(c.u8, Linkage::D)
        .with_params([
            Param::with_storage(c.i64, ParamStorage::Ref),
            Param::with_storage(c.i32, ParamStorage::Lazy),
            Param::new(c.i16),
        ])
        .with_context();
    let fn_abi = lower(&tcx, &sig);

    assert_eq!(fn_abi.ret.attributes.extension(), ArgExtension::ZeroExtend);
    assert!(fn_abi.arg_this.is_none());
    assert!(fn_abi.arg_nest.as_ref().unwrap().attributes.contains(ArgAttributeFlag::NEST));

    assert!(fn_abi.args[0].by_ref);
    assert_eq!(shape(&fn_abi.args[0]), ("ptr".to_string(), None));
    assert_eq!(shape(&fn_abi.args[1]), ("{ ptr, ptr }".to_string(), None));
    assert_eq!(fn_abi.args[2].attributes.extension(), ArgExtension::SignExtend);
}

#[test]
fn member_functions_do_not_take_a_context() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();

    let sig = FnSig::new(c.void, Linkage::D).with_this().with_context();
    let fn_abi = lower(&tcx, &sig);

    assert!(fn_abi.arg_this.as_ref().unwrap().by_ref);
    assert!(fn_abi.arg_nest.is_none());
}

#[test]
fn sysv_small_aggregates_use_register_slots() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);
    let mixed = pod(&tcx, "Mixed", &[c.f64, c.i64]);
    let big = pod(&tcx, "Big", &[c.i64, c.i64, c.i64]);

    let sig = FnSig::new(pair, Linkage::C).with_params(params(&[pair, mixed, big]));
    let fn_abi = lower(&tcx, &sig);

    assert_eq!(shape(&fn_abi.ret), ("i64".to_string(), Some(Rewrite::ArgTypes)));
    assert_eq!(shape(&fn_abi.args[0]), ("i64".to_string(), Some(Rewrite::ArgTypes)));
    assert_eq!(shape(&fn_abi.args[1]), ("{ double, i64 }".to_string(), None));
    assert!(byval(&fn_abi.args[2]));
    assert_eq!(fn_abi.register_budget, RegisterBudget::new(4, 7));
    assert_eq!(fn_abi.calling_convention, CallingConvention::C);
}

#[test]
fn sysv_large_returns_go_through_memory() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let big = pod(&tcx, "Big", &[c.i64, c.i64, c.i64]);

    let fn_abi = lower(&tcx, &FnSig::new(big, Linkage::C).with_params(params(&[c.i64])));
    let sret = fn_abi.arg_sret.as_ref().unwrap();

    assert_eq!(fn_abi.ret.native_ty().to_string(), "void");
    assert!(sret.attributes.contains(ArgAttributeFlag::STRUCT_RET));
    assert_eq!(fn_abi.register_budget, RegisterBudget::new(4, 8));
}

#[test]
fn sysv_creal_is_returned_in_x87_registers() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let creal = tcx.intern(TyKind::Complex(FloatTy::F80));

    let fn_abi = lower(&tcx, &FnSig::new(creal, Linkage::C).with_params(params(&[creal])));

    assert!(fn_abi.arg_sret.is_none());
    assert_eq!(shape(&fn_abi.ret), ("{ x86_fp80, x86_fp80 }".to_string(), None));
    assert!(!fn_abi.args[0].by_ref);
    assert_eq!(shape(&fn_abi.args[0]), ("{ x86_fp80, x86_fp80 }".to_string(), None));
}

#[test]
fn sysv_aggregates_are_not_split_between_registers_and_memory() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let wide = pod(&tcx, "Wide", &[c.i64, c.i64]);

    let sig = FnSig::new(c.void, Linkage::C)
        .with_params(params(&[c.i64, c.i64, c.i64, c.i64, c.i64, wide, wide]));
    let fn_abi = lower(&tcx, &sig);
    let split = &fn_abi.args[5];

    assert_eq!(split.rewrite(), Some(Rewrite::ImplicitByval));
    assert_eq!(split.native_ty().to_string(), "ptr");
    assert!(split.attributes.contains(ArgAttributeFlag::BY_VAL));
    assert_eq!(shape(&fn_abi.args[6]), ("ptr".to_string(), Some(Rewrite::ImplicitByval)));
    assert_eq!(fn_abi.register_budget, RegisterBudget::new(1, 8));
}

#[test]
fn sysv_variadic_arguments_continue_the_register_budget() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);
    let wide = pod(&tcx, "Wide", &[c.i64, c.i64]);

    let sig = FnSig::new(c.i32, Linkage::C)
        .with_params(params(&[c.byte_ptr, c.i64, c.i64, c.i64, c.i64]))
        .with_variadic(Variadic::CStyle);
    let abi = policy(&tcx);
    let cx = AbiCx::new(&tcx);
    let fn_abi = FnAbi::lower(&abi, &cx, &sig);

    assert!(fn_abi.c_variadic);
    assert_eq!(fn_abi.register_budget, RegisterBudget::new(1, 8));

    let varargs = fn_abi.lower_varargs(&abi, &cx, &[c.f64, wide, pair]);
    assert_eq!(shape(&varargs[0]), ("double".to_string(), None));
    assert_eq!(varargs[1].rewrite(), Some(Rewrite::ImplicitByval));
    assert_eq!(shape(&varargs[2]), ("i64".to_string(), Some(Rewrite::ArgTypes)));
}

#[test]
fn win64_aggregates_are_integers_or_hidden_copies() {
    let tcx = tcx("x86_64-pc-windows-msvc");
    let c = tcx.common().clone();
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);
    let odd = pod(&tcx, "Odd", &[c.u8, c.u8, c.u8]);
    let float4 = tcx.vector(c.f32, 4);

    let sig = FnSig::new(float4, Linkage::C).with_params(params(&[pair, odd, c.f80, float4]));
    let fn_abi = lower(&tcx, &sig);

    assert!(fn_abi.arg_sret.is_none());
    assert_eq!(shape(&fn_abi.ret), ("<4 x float>".to_string(), None));
    assert_eq!(shape(&fn_abi.args[0]), ("i64".to_string(), Some(Rewrite::Integer)));

    for hidden in &fn_abi.args[1..] {
        assert_eq!(shape(hidden), ("ptr".to_string(), Some(Rewrite::IndirectByval)));
        assert_eq!(hidden.attributes.to_string(), "noalias nocapture");
        assert!(!hidden.by_ref);
    }

    let fn_abi = lower(&tcx, &FnSig::new(odd, Linkage::C));
    assert!(fn_abi.arg_sret.is_some());
}

#[test]
fn win64_cpp_members_return_structs_in_memory() {
    let tcx = tcx("x86_64-pc-windows-msvc");
    let c = tcx.common().clone();
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);

    let fn_abi = lower(&tcx, &FnSig::new(pair, Linkage::Cpp).with_this());
    let native = fn_abi.native_params();

    assert!(fn_abi.pass_this_before_sret);
    assert!(!native[0].attributes.contains(ArgAttributeFlag::STRUCT_RET));
    assert!(native[1].attributes.contains(ArgAttributeFlag::STRUCT_RET));

    let free = lower(&tcx, &FnSig::new(pair, Linkage::Cpp));
    assert_eq!(shape(&free.ret), ("i64".to_string(), Some(Rewrite::Integer)));
}

#[test]
fn x86_native_convention_reverses_and_uses_eax() {
    let tcx = tcx("i686-unknown-linux-gnu");
    let c = tcx.common().clone();

    let sig = FnSig::new(c.void, Linkage::D).with_params(params(&[c.i32, c.i32, c.i32]));
    let fn_abi = lower(&tcx, &sig);

    assert!(fn_abi.reverse_params);
    assert_eq!(fn_abi.calling_convention, CallingConvention::X86StdCall);
    assert!(fn_abi.args[2].attributes.contains(ArgAttributeFlag::IN_REG));
    assert!(!fn_abi.args[0].attributes.contains(ArgAttributeFlag::IN_REG));

    let native: Vec<_> = fn_abi.native_params().into_iter().map(|arg| arg.ty).collect();
    assert_eq!(native.len(), 3);

    let sig = FnSig::new(c.void, Linkage::C).with_params(params(&[c.i32, c.i32, c.i32]));
    let fn_abi = lower(&tcx, &sig);

    assert!(!fn_abi.reverse_params);
    assert_eq!(fn_abi.calling_convention, CallingConvention::C);
    assert!(fn_abi.args.iter().all(|arg| arg.attributes.is_empty()));
}

#[test]
fn x86_implicit_arguments_take_eax_first() {
    let tcx = tcx("i686-unknown-linux-gnu");
    let c = tcx.common().clone();

    let sig = FnSig::new(c.void, Linkage::D).with_params(params(&[c.i32])).with_this();
    let fn_abi = lower(&tcx, &sig);

    assert!(fn_abi.arg_this.as_ref().unwrap().attributes.contains(ArgAttributeFlag::IN_REG));
    assert!(!fn_abi.args[0].attributes.contains(ArgAttributeFlag::IN_REG));
    assert!(!fn_abi.reverse_params);

    let sig = FnSig::new(c.void, Linkage::D).with_params(params(&[c.i32, c.f32]));
    let fn_abi = lower(&tcx, &sig);
    assert!(fn_abi.args.iter().all(|arg| !arg.attributes.contains(ArgAttributeFlag::IN_REG)));
}

#[test]
fn x86_struct_returns_depend_on_the_os() {
    let c_linux = tcx("i686-unknown-linux-gnu");
    let c = c_linux.common().clone();
    let pair = pod(&c_linux, "Pair", &[c.i32, c.i32]);
    let halves = pod(&c_linux, "Halves", &[c.i16, c.i16]);

    assert!(lower(&c_linux, &FnSig::new(pair, Linkage::C)).arg_sret.is_some());

    let fn_abi = lower(&c_linux, &FnSig::new(halves, Linkage::D));
    assert!(fn_abi.arg_sret.is_none());
    assert_eq!(shape(&fn_abi.ret), ("i32".to_string(), Some(Rewrite::Integer)));

    let windows = tcx("i686-pc-windows-msvc");
    let c = windows.common().clone();
    let pair = pod(&windows, "Pair", &[c.i32, c.i32]);

    let fn_abi = lower(&windows, &FnSig::new(pair, Linkage::C));
    assert!(fn_abi.arg_sret.is_none());
    assert_eq!(shape(&fn_abi.ret), ("i64".to_string(), Some(Rewrite::Integer)));
}

#[test]
fn x86_windows_parameters() {
    let tcx = tcx("i686-pc-windows-msvc");
    let c = tcx.common().clone();
    let big = pod(&tcx, "Big", &[c.i32, c.i32, c.i32]);
    let halves = pod(&tcx, "Halves", &[c.i16, c.i16]);

    let fn_abi = lower(&tcx, &FnSig::new(big, Linkage::C).with_params(params(&[big])));
    assert!(fn_abi.arg_sret.is_some());
    assert!(byval(&fn_abi.args[0]));

    let fn_abi = lower(&tcx, &FnSig::new(c.void, Linkage::D).with_params(params(&[halves])));
    assert_eq!(shape(&fn_abi.args[0]), ("i32".to_string(), Some(Rewrite::Integer)));
    assert!(fn_abi.args[0].attributes.contains(ArgAttributeFlag::IN_REG));

    let member = lower(&tcx, &FnSig::new(c.void, Linkage::Cpp).with_this());
    assert_eq!(member.calling_convention, CallingConvention::X86ThisCall);

    let system = lower(&tcx, &FnSig::new(c.void, Linkage::System));
    assert_eq!(system.linkage, Linkage::Windows);
    assert_eq!(system.calling_convention, CallingConvention::X86StdCall);
}

#[test]
fn variadic_functions_use_the_c_convention() {
    let tcx = tcx("i686-pc-windows-msvc");
    let c = tcx.common().clone();

    let sig = FnSig::new(c.void, Linkage::D)
        .with_params(params(&[c.i32, c.i32]))
        .with_variadic(Variadic::CStyle);
    let fn_abi = lower(&tcx, &sig);

    assert_eq!(fn_abi.calling_convention, CallingConvention::C);
    assert!(!fn_abi.reverse_params);
    assert!(fn_abi.to_string().ends_with(", ...)"));
}

#[test]
fn aarch64_homogeneous_aggregates() {
    let tcx = tcx("aarch64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let four = pod(&tcx, "Four", &[c.f32, c.f32, c.f32, c.f32]);
    let five = pod(&tcx, "Five", &[c.f32, c.f32, c.f32, c.f32, c.f32]);
    let mixed = pod(&tcx, "Mixed", &[c.i64, c.i32]);

    let sig = FnSig::new(four, Linkage::C).with_params(params(&[four, five, mixed]));
    let fn_abi = lower(&tcx, &sig);

    assert_eq!(shape(&fn_abi.ret), ("[4 x float]".to_string(), Some(Rewrite::HomogeneousArray)));
    assert_eq!(
        shape(&fn_abi.args[0]),
        ("[4 x float]".to_string(), Some(Rewrite::HomogeneousArray))
    );
    assert_eq!(shape(&fn_abi.args[1]), ("ptr".to_string(), Some(Rewrite::IndirectByval)));
    assert_eq!(
        shape(&fn_abi.args[2]),
        ("[2 x i64]".to_string(), Some(Rewrite::CompositeToArray64))
    );
    assert_eq!(fn_abi.unwind_table_kind.to_string(), "async");

    assert!(lower(&tcx, &FnSig::new(five, Linkage::C)).arg_sret.is_some());
}

#[test]
fn aarch64_padded_float_aggregates_are_composites() {
    let tcx = tcx("aarch64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let fields = vec![StructField::new("x", c.f32), StructField::new("y", c.f32)];
    let aligned = tcx.declare_struct(
        StructDecl::new("Aligned", fields).with_align(Alignment::from_bytes(16).unwrap()),
    );
    tcx.finalise_struct(tcx.as_struct(aligned).unwrap()).unwrap();

    let fn_abi = lower(&tcx, &FnSig::new(c.void, Linkage::C).with_params(params(&[aligned])));

    assert_eq!(
        shape(&fn_abi.args[0]),
        ("[2 x i64]".to_string(), Some(Rewrite::CompositeToArray64))
    );
}

#[test]
fn aarch64_va_list_is_passed_by_reference() {
    let tcx = tcx("aarch64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let abi = policy(&tcx);
    let cx = AbiCx::new(&tcx);
    let va_list = abi.va_list_ty(&cx);

    let sig = FnSig::new(c.i32, Linkage::C).with_params(params(&[c.byte_ptr, va_list]));
    let fn_abi = FnAbi::lower(&abi, &cx, &sig);

    assert!(fn_abi.args[1].by_ref);
    assert_eq!(shape(&fn_abi.args[1]), ("ptr".to_string(), None));

    let darwin = common::tcx("aarch64-apple-darwin");
    let cx = AbiCx::new(&darwin);
    assert_eq!(policy(&darwin).va_list_ty(&cx), darwin.common().byte_ptr);
}

#[test]
fn arm_hard_float_composites() {
    let tcx = tcx("armv7-unknown-linux-gnueabihf");
    let c = tcx.common().clone();
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);
    let wide = pod(&tcx, "Wide", &[c.i64]);
    let doubles = pod(&tcx, "Doubles", &[c.f64, c.f64]);
    let floats = pod(&tcx, "Floats", &[c.f32, c.f32]);

    let sig = FnSig::new(floats, Linkage::C).with_params(params(&[pair, wide, doubles]));
    let fn_abi = lower(&tcx, &sig);

    assert!(fn_abi.arg_sret.is_none());
    assert_eq!(shape(&fn_abi.ret), ("[2 x float]".to_string(), Some(Rewrite::HomogeneousArray)));
    assert_eq!(
        shape(&fn_abi.args[0]),
        ("[2 x i32]".to_string(), Some(Rewrite::CompositeToArray32))
    );
    assert_eq!(
        shape(&fn_abi.args[1]),
        ("[1 x i64]".to_string(), Some(Rewrite::CompositeToArray64))
    );
    assert_eq!(
        shape(&fn_abi.args[2]),
        ("[2 x double]".to_string(), Some(Rewrite::HomogeneousArray))
    );

    let soft = common::tcx("armv7-unknown-linux-gnueabi");
    let c = soft.common().clone();
    let floats = pod(&soft, "Floats", &[c.f32, c.f32]);
    assert!(lower(&soft, &FnSig::new(floats, Linkage::C)).arg_sret.is_some());
}

#[test]
fn lp64_hard_float_flattening() {
    for triple in ["riscv64gc-unknown-linux-gnu", "loongarch64-unknown-linux-gnu"] {
        let tcx = tcx(triple);
        let c = tcx.common().clone();
        let mixed = pod(&tcx, "Mixed", &[c.f32, c.i64]);
        let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);
        let big = pod(&tcx, "Big", &[c.i64, c.i64, c.i64]);

        let sig = FnSig::new(big, Linkage::C).with_params(params(&[mixed, pair, big, c.u32]));
        let fn_abi = lower(&tcx, &sig);

        assert!(fn_abi.arg_sret.is_some(), "{triple}");
        assert_eq!(
            shape(&fn_abi.args[0]),
            ("{ float, i64 }".to_string(), Some(Rewrite::ScalarFields)),
            "{triple}"
        );
        assert_eq!(shape(&fn_abi.args[1]), ("i64".to_string(), Some(Rewrite::Integer)));
        assert!(byval(&fn_abi.args[2]), "{triple}");
        assert_eq!(fn_abi.args[3].attributes.extension(), ArgExtension::SignExtend);
    }
}

#[test]
fn mips64_aggregates_go_through_memory() {
    let tcx = tcx("mips64el-unknown-linux-gnuabi64");
    let c = tcx.common().clone();
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);

    let fn_abi = lower(&tcx, &FnSig::new(pair, Linkage::C).with_params(params(&[pair, c.i32])));

    assert!(fn_abi.arg_sret.is_some());
    assert!(byval(&fn_abi.args[0]));
    assert_eq!(fn_abi.args[1].attributes.extension(), ArgExtension::SignExtend);
}

#[test]
fn ppc64le_elfv2_aggregates() {
    let tcx = tcx("powerpc64le-unknown-linux-gnu");
    let c = tcx.common().clone();
    let five = pod(&tcx, "Five", &[c.f64, c.f64, c.f64, c.f64, c.f64]);
    let big = pod(&tcx, "Big", &[c.i64, c.i64, c.i64]);
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);
    let mixed = pod(&tcx, "Mixed", &[c.i64, c.i32]);

    let sig = FnSig::new(five, Linkage::C)
        .with_params(params(&[five, big, pair, mixed, c.i32, c.u16]));
    let fn_abi = lower(&tcx, &sig);

    assert!(fn_abi.arg_sret.is_none());
    assert_eq!(
        shape(&fn_abi.ret),
        ("[5 x double]".to_string(), Some(Rewrite::HomogeneousArray))
    );
    assert_eq!(
        shape(&fn_abi.args[0]),
        ("[5 x double]".to_string(), Some(Rewrite::HomogeneousArray))
    );
    assert!(byval(&fn_abi.args[1]));
    assert_eq!(shape(&fn_abi.args[2]), ("i64".to_string(), Some(Rewrite::Integer)));
    assert_eq!(
        shape(&fn_abi.args[3]),
        ("[2 x i64]".to_string(), Some(Rewrite::CompositeToArray64))
    );
    assert_eq!(fn_abi.args[4].attributes.extension(), ArgExtension::SignExtend);
    assert_eq!(fn_abi.args[5].attributes.extension(), ArgExtension::ZeroExtend);
}

#[test]
fn ppc_variadic_aggregates_are_rewritten() {
    let tcx = tcx("powerpc-unknown-linux-gnu");
    let c = tcx.common().clone();
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);
    let halves = pod(&tcx, "Halves", &[c.i16, c.i16]);

    let sig = FnSig::new(c.void, Linkage::C)
        .with_params(params(&[pair]))
        .with_variadic(Variadic::CStyle);
    let abi = policy(&tcx);
    let cx = AbiCx::new(&tcx);
    let fn_abi = FnAbi::lower(&abi, &cx, &sig);

    assert!(byval(&fn_abi.args[0]));

    let varargs = fn_abi.lower_varargs(&abi, &cx, &[pair, halves]);
    assert_eq!(
        shape(&varargs[0]),
        ("[2 x i32]".to_string(), Some(Rewrite::CompositeToArray32))
    );
    assert_eq!(shape(&varargs[1]), ("i32".to_string(), Some(Rewrite::Integer)));
}

#[test]
fn wasm_single_scalar_aggregates_pass_directly() {
    let tcx = tcx("wasm32-unknown-unknown");
    let c = tcx.common().clone();
    let inner = pod(&tcx, "Inner", &[c.f64]);
    let outer = pod(&tcx, "Outer", &[inner]);
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);

    let fn_abi = lower(&tcx, &FnSig::new(outer, Linkage::C).with_params(params(&[outer, pair])));

    assert_eq!(shape(&fn_abi.ret), ("double".to_string(), Some(Rewrite::ArgTypes)));
    assert_eq!(shape(&fn_abi.args[0]), ("double".to_string(), Some(Rewrite::ArgTypes)));
    assert_eq!(shape(&fn_abi.args[1]), ("ptr".to_string(), Some(Rewrite::IndirectByval)));

    assert!(lower(&tcx, &FnSig::new(pair, Linkage::C)).arg_sret.is_some());
}

#[test]
fn intrinsics_remove_struct_padding() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let padded = pod(&tcx, "Padded", &[c.u8, c.i32]);

    let sig = FnSig::new(padded, Linkage::C).with_params(params(&[padded, c.i32]));
    let fn_abi = FnAbi::lower(TargetAbi::intrinsic(), &AbiCx::new(&tcx), &sig);

    assert!(fn_abi.arg_sret.is_none());
    assert_eq!(
        shape(&fn_abi.ret),
        ("{ i8, i32 }".to_string(), Some(Rewrite::RemoveStructPadding))
    );
    assert_eq!(
        shape(&fn_abi.args[0]),
        ("{ i8, i32 }".to_string(), Some(Rewrite::RemoveStructPadding))
    );
    assert!(!fn_abi.args[0].by_ref);
    assert_eq!(shape(&fn_abi.args[1]), ("i32".to_string(), None));
}

#[test]
fn intrinsics_pass_unions_directly() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let union = declare(&tcx, "U", &[c.f64, c.u8, c.i16], StructFlags::UNION);

    let sig = FnSig::new(c.void, Linkage::C).with_params(params(&[union]));
    let fn_abi = FnAbi::lower(TargetAbi::intrinsic(), &AbiCx::new(&tcx), &sig);

    assert_eq!(shape(&fn_abi.args[0]), ("{ double }".to_string(), None));
    assert_eq!(fn_abi.args[0].native_ty().size(&tcx), tcx.size_of(union));
}

#[test]
#[should_panic(expected = "internal compiler error")]
fn intrinsics_reject_non_pod_structs() {
    let tcx = tcx("x86_64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let non_pod = declare(&tcx, "Guard", &[c.i32], StructFlags::NON_POD);

    let sig = FnSig::new(c.void, Linkage::C).with_params(params(&[non_pod]));
    FnAbi::lower(TargetAbi::intrinsic(), &AbiCx::new(&tcx), &sig);
}

#[test]
fn generic_policy_copies_aggregates() {
    let tcx = tcx("sparc64-unknown-linux-gnu");
    let c = tcx.common().clone();
    let pair = pod(&tcx, "Pair", &[c.i32, c.i32]);
    let non_pod = declare(&tcx, "Guard", &[c.i32], StructFlags::NON_POD);

    let fn_abi = lower(&tcx, &FnSig::new(pair, Linkage::C).with_params(params(&[pair, non_pod])));

    assert!(fn_abi.arg_sret.is_some());
    assert!(byval(&fn_abi.args[0]));
    assert_eq!(shape(&fn_abi.args[1]), ("ptr".to_string(), Some(Rewrite::IndirectByval)));
    assert!(!fn_abi.args[1].by_ref);
    assert_eq!(fn_abi.unwind_table_kind.to_string(), "none");
}
