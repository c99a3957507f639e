//! Lowering of every function of a manifest for the configured target.

use std::fmt::{self, Write};

use itertools::Itertools;
use log::{debug, info};
use sable_abi::{
    cx::AbiCx,
    fn_abi::{ArgAbi, FnAbi},
    policy::AbiPolicy,
    targets::TargetAbi,
};
use sable_reporting::reporter::Reporter;
use sable_types::ctx::TyCtx;

use crate::{
    error::PipelineError,
    manifest::Manifest,
    settings::{AbiSettings, CompilerSettings},
};

/// The lowering of a single function of a manifest.
#[derive(Debug, Clone)]
pub struct LoweredFunction {
    pub name: String,
    pub fn_abi: FnAbi,

    /// The lowered variadic arguments of the call in the manifest.
    pub varargs: Vec<ArgAbi>,

    /// The runtime function that dispatches calls to an Objective-C method.
    pub msg_send: Option<&'static str>,
}

/// Lower every function of the manifest for the target of the settings.
/// Problems which do not stop the lowering are added to the `reporter`.
pub fn lower_manifest(
    settings: &CompilerSettings,
    manifest: &Manifest,
    reporter: &mut Reporter,
) -> Result<Vec<LoweredFunction>, PipelineError> {
    let tcx = TyCtx::new(settings.target().clone());
    let abi = TargetAbi::for_target(tcx.target(), reporter);
    let cx = AbiCx::new(&tcx);

    let requests = manifest.declare(&tcx)?;
    info!("lowering {} functions for `{}`", requests.len(), settings.target());

    let mut lowered = Vec::with_capacity(requests.len());

    for request in requests {
        let fn_abi = FnAbi::lower(&abi, &cx, &request.sig);
        debug!("{}: {fn_abi}", request.name);

        let varargs = match (request.varargs.is_empty(), fn_abi.c_variadic) {
            (true, _) => Vec::new(),
            (false, true) => fn_abi.lower_varargs(&abi, &cx, &request.varargs),
            (false, false) => {
                reporter
                    .warning()
                    .title(format!(
                        "`{}` is not C-style variadic, ignoring its variadic arguments",
                        request.name
                    ))
                    .add_note("set `\"variadic\": \"c\"` to lower the arguments");
                Vec::new()
            }
        };

        let msg_send = match request.sig.is_objc_method {
            true => Some(abi.objc_msg_send_func(&cx, request.sig.ret, &fn_abi, false)?),
            false => None,
        };

        lowered.push(LoweredFunction { name: request.name, fn_abi, varargs, msg_send });
    }

    Ok(lowered)
}

/// Render the lowered functions as the settings request, one function per
/// line followed by its details.
pub fn render(functions: &[LoweredFunction], settings: &AbiSettings) -> String {
    let mut out = String::new();

    for function in functions {
        // Writing into a string cannot fail.
        let _ = render_function(&mut out, function, settings);
    }

    out
}

fn render_function(
    out: &mut String,
    function: &LoweredFunction,
    settings: &AbiSettings,
) -> fmt::Result {
    match settings.dump_abi {
        true => writeln!(out, "{}: {}", function.name, function.fn_abi)?,
        false => writeln!(out, "{}", function.name)?,
    }

    if settings.print_unwind_kind {
        writeln!(out, "  unwind: {}", function.fn_abi.unwind_table_kind)?;
    }

    if settings.print_varargs && !function.varargs.is_empty() {
        writeln!(out, "  varargs: {}", function.varargs.iter().format(", "))?;
    }

    if let Some(msg_send) = function.msg_send {
        writeln!(out, "  dispatch: {msg_send}")?;
    }

    Ok(())
}
