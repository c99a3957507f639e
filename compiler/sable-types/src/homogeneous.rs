//! Detection of homogeneous floating-point and vector aggregates, which are
//! passed in consecutive floating-point or SIMD registers by several
//! conventions.

use sable_target::size::Size;

use crate::{
    ctx::TyCtx,
    ty::{TyId, TyKind},
};

/// An aggregate that consists entirely of `count` values of one fundamental
/// floating-point or vector type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Homogeneous {
    /// The fundamental element type.
    pub element: TyId,

    /// The number of elements, which is always at least one.
    pub count: u64,
}

impl Homogeneous {
    /// Whether the fundamental element type is a SIMD vector.
    pub fn is_vector(&self, tcx: &TyCtx) -> bool {
        tcx.kind(self.element).is_vector()
    }

    /// The static array `element[count]` that the aggregate is rewritten to.
    pub fn array_ty(&self, tcx: &TyCtx) -> TyId {
        tcx.static_array(self.element, self.count)
    }
}

impl TyCtx {
    /// Check whether the type is a POD struct, static array or complex number
    /// made up of a single kind of float or vector, possibly nested. Unions,
    /// empty aggregates and aggregates with padding never qualify.
    pub fn homogeneous_aggregate(&self, ty: TyId) -> Option<Homogeneous> {
        let kind = self.base_kind(ty);
        let is_candidate = kind.is_struct() || kind.is_static_array() || kind.is_complex();

        if !is_candidate || !self.is_pod(ty, false) {
            return None;
        }

        let mut element = None;
        let count = self.homogeneous_count(ty, &mut element)?;
        let element = element?;

        // The elements must cover every byte of the aggregate.
        if self.size_of(element) * count != self.size_of(ty) {
            return None;
        }

        Some(Homogeneous { element, count })
    }

    /// Count the fundamental elements of a type, returning `None` if the type
    /// mixes element kinds or contains anything other than floats or vectors.
    fn homogeneous_count(&self, ty: TyId, element: &mut Option<TyId>) -> Option<u64> {
        let (fundamental, count) = match self.base_kind(ty) {
            TyKind::StaticArray { element: inner, count } => {
                let inner_count = self.homogeneous_count(inner, element)?;
                return (count > 0).then_some(inner_count * count);
            }
            TyKind::Struct(id) => {
                let decl = self.struct_decl(id);
                if decl.is_union() || decl.fields.is_empty() {
                    return None;
                }

                let mut count = 0;
                for field in &decl.fields {
                    count += self.homogeneous_count(field.ty, element)?;
                }

                return Some(count);
            }
            TyKind::Complex(float) => (self.float(float), 2),
            TyKind::Float(float) | TyKind::Imaginary(float) => (self.float(float), 1),
            TyKind::Vector { .. } => {
                let size = self.size_of(ty);
                if size != Size::from_bytes(8) && size != Size::from_bytes(16) {
                    return None;
                }

                (self.base_ty(ty), 1)
            }
            _ => return None,
        };

        match element {
            Some(existing) if *existing != fundamental => None,
            _ => {
                *element = Some(fundamental);
                Some(count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sable_target::{Target, alignment::Alignment};

    use super::*;
    use crate::structs::{StructDecl, StructField, StructFlags};

    fn tcx() -> TyCtx {
        TyCtx::new("aarch64-unknown-linux-gnu".parse::<Target>().unwrap())
    }

    fn declare(tcx: &TyCtx, name: &str, fields: &[TyId], flags: StructFlags) -> TyId {
        let fields = fields
            .iter()
            .enumerate()
            .map(|(index, ty)| StructField::new(format!("f{index}"), *ty))
            .collect();
        let ty = tcx.declare_struct(StructDecl::new(name, fields).with_flags(flags));
        tcx.finalise_struct(tcx.as_struct(ty).unwrap()).unwrap();
        ty
    }

    #[test]
    fn nested_floats_are_counted() {
        let tcx = tcx();
        let f32 = tcx.common().f32;
        let pair = declare(&tcx, "Pair", &[f32, f32], StructFlags::empty());
        let quad = declare(&tcx, "Quad", &[pair, tcx.static_array(f32, 2)], StructFlags::empty());

        assert_eq!(tcx.homogeneous_aggregate(quad), Some(Homogeneous { element: f32, count: 4 }));
    }

    #[test]
    fn mixed_and_union_aggregates_are_rejected() {
        let tcx = tcx();
        let common = tcx.common().clone();
        let mixed = declare(&tcx, "Mixed", &[common.f32, common.f64], StructFlags::empty());
        let with_int = declare(&tcx, "WithInt", &[common.f32, common.i32], StructFlags::empty());
        let union = declare(&tcx, "U", &[common.f32, common.f32], StructFlags::UNION);

        assert_eq!(tcx.homogeneous_aggregate(mixed), None);
        assert_eq!(tcx.homogeneous_aggregate(with_int), None);
        assert_eq!(tcx.homogeneous_aggregate(union), None);
    }

    #[test]
    fn complex_numbers_have_two_parts() {
        let tcx = tcx();
        let cdouble = tcx.intern(TyKind::Complex(sable_target::primitives::FloatTy::F64));

        let hfa = tcx.homogeneous_aggregate(cdouble).unwrap();
        assert_eq!(hfa.count, 2);
        assert_eq!(hfa.element, tcx.common().f64);
    }

    #[test]
    fn vectors_form_homogeneous_vector_aggregates() {
        let tcx = tcx();
        let vector = tcx.vector(tcx.common().f32, 4);
        let hva = declare(&tcx, "HVA", &[vector, vector], StructFlags::empty());

        let found = tcx.homogeneous_aggregate(hva).unwrap();
        assert_eq!(found.count, 2);
        assert!(found.is_vector(&tcx));
    }

    #[test]
    fn padded_aggregates_are_rejected() {
        let tcx = tcx();
        let f32 = tcx.common().f32;
        let fields = vec![StructField::new("x", f32), StructField::new("y", f32)];
        let ty = tcx.declare_struct(
            StructDecl::new("Aligned", fields).with_align(Alignment::from_bytes(16).unwrap()),
        );
        tcx.finalise_struct(tcx.as_struct(ty).unwrap()).unwrap();

        assert_eq!(tcx.size_of(ty), Size::from_bytes(16));
        assert_eq!(tcx.homogeneous_aggregate(ty), None);

        // Padding of a nested member is padding of the outer aggregate too.
        let outer = declare(&tcx, "Outer", &[ty], StructFlags::empty());
        assert_eq!(tcx.homogeneous_aggregate(outer), None);
    }

    #[test]
    fn non_pod_structs_are_never_homogeneous() {
        let tcx = tcx();
        let f32 = tcx.common().f32;
        let ty = declare(&tcx, "NonPod", &[f32, f32], StructFlags::NON_POD);

        assert_eq!(tcx.homogeneous_aggregate(ty), None);
    }
}
