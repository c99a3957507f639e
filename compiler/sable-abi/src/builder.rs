//! The interface between the ABI lowering and the code generator. Rewrites
//! and the `va_list` hooks emit their code through these traits, the lowering
//! itself never inspects the values it is handed.

use std::fmt;

use sable_target::{alignment::Alignment, size::Size};
use sable_types::ty::TyId;

use crate::ty::NativeTy;

/// The associated types of a code generation backend.
pub trait BackendTypes {
    /// A value that the backend produced, e.g. an instruction or constant.
    type Value: Clone + fmt::Debug;
}

/// Instructions that the ABI lowering needs to emit to move values between
/// their source representation and the representation that the calling
/// convention prescribes.
pub trait AbiBuilderMethods: BackendTypes {
    /// Allocate a stack slot for a value of the given type.
    fn alloca(&mut self, ty: &NativeTy, align: Alignment, name: &str) -> Self::Value;

    fn load(&mut self, ty: &NativeTy, ptr: Self::Value, align: Alignment) -> Self::Value;

    fn store(&mut self, value: Self::Value, ptr: Self::Value, align: Alignment);

    /// Copy `size` bytes between two non-overlapping locations.
    fn mem_copy(&mut self, dest: Self::Value, src: Self::Value, size: Size, align: Alignment);

    /// Offset a pointer by a number of bytes.
    fn inbounds_byte_offset(&mut self, ptr: Self::Value, offset: Size) -> Self::Value;

    fn extract_value(&mut self, aggregate: Self::Value, index: usize) -> Self::Value;

    fn insert_value(
        &mut self,
        aggregate: Self::Value,
        value: Self::Value,
        index: usize,
    ) -> Self::Value;

    /// An undefined value of the given type.
    fn const_undef(&mut self, ty: &NativeTy) -> Self::Value;
}

/// A value of a source type as the code generator holds it.
#[derive(Debug, Clone)]
pub enum DValue<V> {
    /// The value lives in memory at `ptr`.
    Place { ty: TyId, ptr: V },

    /// The value is held directly in its native representation.
    Immediate { ty: TyId, value: V },
}

impl<V> DValue<V> {
    pub fn place(ty: TyId, ptr: V) -> Self {
        DValue::Place { ty, ptr }
    }

    pub fn immediate(ty: TyId, value: V) -> Self {
        DValue::Immediate { ty, value }
    }

    pub fn ty(&self) -> TyId {
        match self {
            DValue::Place { ty, .. } | DValue::Immediate { ty, .. } => *ty,
        }
    }
}
