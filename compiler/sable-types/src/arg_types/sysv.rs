//! The System V x86-64 classification of values into eightbytes.

use sable_target::primitives::FloatTy;
use smallvec::smallvec;

use super::{ArgTypes, ArgTypesOracle};
use crate::{
    ctx::TyCtx,
    ty::{TyId, TyKind},
};

/// The register class of an eightbyte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    NoClass,
    Integer,
    Sse,

    /// The upper half of a 16-byte vector whose lower half is [Class::Sse].
    SseUp,
    Memory,
}

impl Class {
    fn merge(self, other: Class) -> Class {
        use Class::*;

        match (self, other) {
            (a, b) if a == b => a,
            (NoClass, class) | (class, NoClass) => class,
            (Memory, _) | (_, Memory) => Memory,
            (Integer, _) | (_, Integer) => Integer,
            _ => Sse,
        }
    }
}

/// A scalar piece of an aggregate at a byte offset, never crossing an
/// eightbyte boundary.
#[derive(Debug, Clone, Copy)]
struct Leaf {
    offset: u64,
    class: Class,
    ty: TyId,
}

/// Classifies values according to the System V AMD64 psABI. Aggregates of
/// more than 16 bytes, unaligned fields and x87 values inside aggregates are
/// passed in memory.
#[derive(Debug, Clone, Copy)]
pub struct SysVArgTypes;

impl ArgTypesOracle for SysVArgTypes {
    fn name(&self) -> &'static str {
        "sysv"
    }

    fn to_arg_types(&self, tcx: &TyCtx, ty: TyId) -> ArgTypes {
        let base = tcx.base_ty(ty);
        let size = tcx.size_of(base).bytes();

        match tcx.kind(base) {
            TyKind::Struct(_)
            | TyKind::StaticArray { .. }
            | TyKind::Complex(_)
            | TyKind::DynamicArray(_)
            | TyKind::Delegate => {}
            TyKind::Vector { .. } if size > 16 => return ArgTypes::new(),
            _ => return smallvec![ty],
        }

        if size == 0 || size > 16 {
            return ArgTypes::new();
        }

        let mut leaves = Leaves::default();
        if !leaves.collect(tcx, base, 0) {
            return ArgTypes::new();
        }

        let eightbytes = size.div_ceil(8) as usize;
        let mut classes = [Class::NoClass; 2];
        let mut upper_vector = None;

        for leaf in &leaves.leaves {
            let index = (leaf.offset / 8) as usize;
            classes[index] = classes[index].merge(leaf.class);

            if leaf.class == Class::SseUp {
                upper_vector = Some(leaf.ty);
            }
        }

        if classes.contains(&Class::Memory) {
            return ArgTypes::new();
        }

        // A whole 16-byte vector travels in a single SSE register.
        if let (Some(vector), [Class::Sse, Class::SseUp]) = (upper_vector, classes) {
            return smallvec![vector];
        }

        let common = tcx.common();
        let mut types = ArgTypes::new();

        for (index, class) in classes.iter().take(eightbytes).enumerate() {
            let covered = (size - 8 * index as u64).min(8);
            let is_last = index + 1 == eightbytes;

            let slot = match class {
                Class::NoClass if is_last => continue,
                Class::Integer | Class::NoClass => match covered {
                    1 => common.u8,
                    2 => common.u16,
                    3..=4 => common.u32,
                    _ => common.u64,
                },
                Class::Sse | Class::SseUp if covered <= 4 => common.f32,
                Class::Sse | Class::SseUp => common.f64,
                Class::Memory => unreachable!("memory class is handled above"),
            };

            types.push(slot);
        }

        types
    }
}

/// The flattened scalar pieces of an aggregate.
#[derive(Debug, Default)]
struct Leaves {
    leaves: Vec<Leaf>,
}

impl Leaves {
    fn push(&mut self, ty: TyId, offset: u64, class: Class) -> bool {
        self.leaves.push(Leaf { offset, class, ty });
        true
    }

    /// Flatten the type into [Leaf]s starting at `offset`. Returns `false` if
    /// the type contains anything that forces the whole aggregate into memory.
    fn collect(&mut self, tcx: &TyCtx, ty: TyId, offset: u64) -> bool {
        let ptr_size = tcx.target().pointer_size().bytes();

        match tcx.base_kind(ty) {
            TyKind::Void | TyKind::NoReturn => true,
            TyKind::Bool | TyKind::Int(_) => {
                // `cent` occupies two integer eightbytes.
                let is_wide = tcx.size_of(ty).bytes() > 8;
                self.push(ty, offset, Class::Integer)
                    && (!is_wide || self.push(ty, offset + 8, Class::Integer))
            }
            TyKind::Float(FloatTy::F80)
            | TyKind::Imaginary(FloatTy::F80)
            | TyKind::Complex(FloatTy::F80) => false,
            TyKind::Float(_) | TyKind::Imaginary(_) => self.push(ty, offset, Class::Sse),
            TyKind::Complex(float) => {
                let part = float.store_size().bytes();
                self.push(ty, offset, Class::Sse) && self.push(ty, offset + part, Class::Sse)
            }
            TyKind::Pointer(_) | TyKind::Class(_) | TyKind::AssocArray { .. } => {
                self.push(ty, offset, Class::Integer)
            }
            TyKind::DynamicArray(_) | TyKind::Delegate => {
                self.push(ty, offset, Class::Integer)
                    && self.push(ty, offset + ptr_size, Class::Integer)
            }
            TyKind::Vector { .. } => match tcx.size_of(ty).bytes() {
                8 => self.push(ty, offset, Class::Sse),
                16 => self.push(ty, offset, Class::Sse) && self.push(ty, offset + 8, Class::SseUp),
                _ => false,
            },
            TyKind::StaticArray { element, count } => {
                let stride = tcx.size_of(element).bytes();
                (0..count).all(|index| self.collect(tcx, element, offset + index * stride))
            }
            TyKind::Struct(id) => {
                let decl = tcx.struct_decl(id);

                decl.fields.iter().all(|field| {
                    let field_offset = offset + field.offset.bytes();
                    let is_aligned = field_offset % tcx.align_of(field.ty).bytes() == 0;

                    is_aligned && self.collect(tcx, field.ty, field_offset)
                })
            }
            TyKind::Enum { .. } | TyKind::Alias { .. } => {
                unreachable!("base type is never transparent")
            }
        }
    }
}
