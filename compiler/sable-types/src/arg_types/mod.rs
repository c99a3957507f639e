//! Argument types describe how a value is split into machine registers by the
//! platform convention. Each target family has an [ArgTypesOracle] which
//! encodes its rule table, and classifications of finalised aggregates are
//! memoised in an [ArgTypesCache].

mod aarch64;
mod sysv;
mod x86;

use dashmap::DashMap;
use sable_target::{Target, TargetArch};
use smallvec::SmallVec;

pub use self::{aarch64::AArch64ArgTypes, sysv::SysVArgTypes, x86::X86ArgTypes};
use crate::{
    ctx::TyCtx,
    ty::{StructId, TyId},
};

/// The register slots of a value. An empty list means the value is passed in
/// memory unchanged, otherwise there are one or two slots.
pub type ArgTypes = SmallVec<[TyId; 2]>;

/// A platform rule table which decides which registers a value occupies.
pub trait ArgTypesOracle: Send + Sync {
    /// A short name of the rule table, used in debug output.
    fn name(&self) -> &'static str;

    /// Classify the type. This must be deterministic for a given type.
    fn to_arg_types(&self, tcx: &TyCtx, ty: TyId) -> ArgTypes;
}

/// The oracle of targets whose conventions do not split values into
/// registers through argument types.
#[derive(Debug, Clone, Copy)]
pub struct NoArgTypes;

impl ArgTypesOracle for NoArgTypes {
    fn name(&self) -> &'static str {
        "none"
    }

    fn to_arg_types(&self, _: &TyCtx, _: TyId) -> ArgTypes {
        ArgTypes::new()
    }
}

/// Select the [ArgTypesOracle] of a target.
pub fn oracle_for(target: &Target) -> &'static dyn ArgTypesOracle {
    match target.arch() {
        TargetArch::X86 => &X86ArgTypes,
        TargetArch::X86_64 if !target.is_os_windows() => &SysVArgTypes,
        TargetArch::AArch64 => &AArch64ArgTypes,
        _ => &NoArgTypes,
    }
}

/// Memoised classifications of aggregates. An entry is only ever added for a
/// struct whose layout has been finalised, and is never invalidated.
#[derive(Debug, Default)]
pub struct ArgTypesCache {
    entries: DashMap<StructId, ArgTypes>,
}

impl ArgTypesCache {
    /// Get the classification of the struct if it has been computed.
    pub fn get(&self, id: StructId) -> Option<ArgTypes> {
        self.entries.get(&id).map(|entry| entry.clone())
    }

    /// Get the classification of the struct, computing it with `compute` if
    /// it is missing. The computation runs without holding any lock, so two
    /// threads may both compute it, in which case the first published value
    /// is kept and returned to both.
    pub fn get_or_insert_with(&self, id: StructId, compute: impl FnOnce() -> ArgTypes) -> ArgTypes {
        if let Some(cached) = self.get(id) {
            return cached;
        }

        let computed = compute();
        self.entries.entry(id).or_insert(computed).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
