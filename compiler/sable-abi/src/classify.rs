//! The type classifier maps source types to the register slots that the
//! platform convention assigns to them, and derives the native type that a
//! value has to be reinterpreted as to land in those slots.

use log::trace;
use sable_types::{
    arg_types::{ArgTypes, ArgTypesOracle, oracle_for},
    ctx::TyCtx,
    ty::TyId,
};
use sable_utils::ice;

use crate::ty::{NativeTy, lower_ty};

/// Classifies types using the [ArgTypesOracle] of the target, memoising the
/// result for finalised aggregates.
pub struct TypeClassifier<'tcx> {
    tcx: &'tcx TyCtx,
    oracle: &'static dyn ArgTypesOracle,
}

impl<'tcx> TypeClassifier<'tcx> {
    pub fn new(tcx: &'tcx TyCtx) -> Self {
        Self { tcx, oracle: oracle_for(tcx.target()) }
    }

    /// Classify the type into at most two register slots. An empty
    /// classification means that the value is passed in memory.
    pub fn classify(&self, ty: TyId) -> ArgTypes {
        let tcx = self.tcx;

        match tcx.as_struct(ty) {
            Some(id) if tcx.struct_decl(id).is_finalised() => {
                tcx.arg_types().get_or_insert_with(id, || {
                    let computed = self.oracle.to_arg_types(tcx, ty);
                    trace!(
                        "classified `{}` as {} slot(s) with the {} rules",
                        tcx.ty_name(ty),
                        computed.len(),
                        self.oracle.name()
                    );
                    computed
                })
            }
            _ => self.oracle.to_arg_types(tcx, ty),
        }
    }

    /// The native type that a value of `ty` must be reinterpreted as to be
    /// passed in the given slots, or `None` if the value is passed as it is.
    pub fn rewritten_native_type(&self, ty: TyId, arg_types: &ArgTypes) -> Option<NativeTy> {
        match arg_types.as_slice() {
            [] => None,
            [slot] => {
                let native = lower_ty(self.tcx, *slot);
                (native != lower_ty(self.tcx, ty)).then_some(native)
            }
            [first, second] => Some(NativeTy::struct_of(vec![
                lower_ty(self.tcx, *first),
                lower_ty(self.tcx, *second),
            ])),
            slots => ice!(
                "`{}` was classified into {} register slots, at most two are supported",
                self.tcx.ty_name(ty),
                slots.len()
            ),
        }
    }

    /// Classify the type and derive its rewritten native type.
    pub fn rewritten_type_of(&self, ty: TyId) -> Option<NativeTy> {
        self.rewritten_native_type(ty, &self.classify(ty))
    }
}
