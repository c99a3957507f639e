mod common;

use pretty_assertions::assert_eq;
use sable_abi::{policy::AbiPolicy, targets::TargetAbi};
use sable_reporting::{report::ReportKind, reporter::Reporter};
use sable_target::Target;

fn select(triple: &str) -> (TargetAbi, Reporter) {
    let mut reporter = Reporter::new();
    let abi = TargetAbi::for_target(&triple.parse::<Target>().unwrap(), &mut reporter);
    (abi, reporter)
}

#[test]
fn policies_are_selected_by_architecture() {
    let expected = [
        ("x86_64-unknown-linux-gnu", "x86-64"),
        ("x86_64-apple-darwin", "x86-64"),
        ("x86_64-pc-windows-msvc", "win64"),
        ("x86_64-pc-windows-gnu", "win64"),
        ("i686-unknown-linux-gnu", "x86"),
        ("aarch64-unknown-linux-gnu", "aarch64"),
        ("aarch64-apple-darwin", "aarch64"),
        ("armv7-unknown-linux-gnueabihf", "arm"),
        ("riscv64gc-unknown-linux-gnu", "riscv64"),
        ("loongarch64-unknown-linux-gnu", "loongarch64"),
        ("mips64el-unknown-linux-gnuabi64", "mips64"),
        ("mipsel-unknown-linux-gnu", "mips64"),
        ("powerpc-unknown-linux-gnu", "ppc"),
        ("powerpc64-unknown-linux-gnu", "ppc64"),
        ("powerpc64le-unknown-linux-gnu", "ppc64le"),
        ("wasm32-unknown-unknown", "wasm"),
    ];

    for (triple, name) in expected {
        let (abi, reporter) = select(triple);
        assert_eq!(abi.name(), name, "policy of {triple}");
        assert!(reporter.reports().is_empty(), "{triple} reported {:?}", reporter.reports());
    }
}

#[test]
fn unknown_architecture_warns_once() {
    let (abi, reporter) = select("sparc64-unknown-linux-gnu");

    assert_eq!(abi.name(), "generic");
    assert_eq!(reporter.count(ReportKind::Warning), 1);
    assert_eq!(reporter.reports().len(), 1);
    assert!(reporter.reports()[0].title.contains("sparc64"));
}

#[test]
fn intrinsic_policy_is_shared() {
    assert!(std::ptr::eq(TargetAbi::intrinsic(), TargetAbi::intrinsic()));
    assert_eq!(TargetAbi::intrinsic().name(), "intrinsic");
}
