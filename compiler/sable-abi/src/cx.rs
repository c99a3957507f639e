//! The context that every ABI decision is made in.

use sable_target::{
    Target,
    alignment::Alignment,
    data_layout::{HasDataLayout, TargetDataLayout},
    size::Size,
};
use sable_types::{ctx::TyCtx, ty::TyId};

use crate::{
    classify::TypeClassifier,
    ty::{NativeTy, lower_ty},
};

/// Access to the type context and the classifier of the target that
/// signatures are being lowered for. An [AbiCx] is cheap to create and can
/// be created per thread, all shared state lives in the [TyCtx].
pub struct AbiCx<'tcx> {
    tcx: &'tcx TyCtx,
    classifier: TypeClassifier<'tcx>,
}

impl<'tcx> AbiCx<'tcx> {
    pub fn new(tcx: &'tcx TyCtx) -> Self {
        Self { tcx, classifier: TypeClassifier::new(tcx) }
    }

    pub fn tcx(&self) -> &'tcx TyCtx {
        self.tcx
    }

    pub fn target(&self) -> &'tcx Target {
        self.tcx.target()
    }

    pub fn classifier(&self) -> &TypeClassifier<'tcx> {
        &self.classifier
    }

    /// The direct native mapping of the type.
    pub fn lower_ty(&self, ty: TyId) -> NativeTy {
        lower_ty(self.tcx, ty)
    }

    pub fn size_of(&self, ty: TyId) -> Size {
        self.tcx.size_of(ty)
    }

    pub fn align_of(&self, ty: TyId) -> Alignment {
        self.tcx.align_of(ty)
    }

    /// Render the type in source syntax, for diagnostics and logging.
    pub fn ty_name(&self, ty: TyId) -> String {
        self.tcx.ty_name(ty)
    }
}

impl HasDataLayout for AbiCx<'_> {
    fn data_layout(&self) -> &TargetDataLayout {
        self.tcx.data_layout()
    }
}
