//! The type context, which owns every interned type and declared aggregate of
//! a compilation, and answers layout queries about them.

use std::sync::Arc;

use dashmap::DashMap;
use derive_more::{Display, Error};
use index_vec::IndexVec;
use log::debug;
use parking_lot::RwLock;
use sable_target::{
    Target,
    abi::Integer,
    alignment::Alignment,
    data_layout::{HasDataLayout, TargetDataLayout},
    primitives::FloatTy,
    size::Size,
};
use sable_utils::ice;

use crate::{
    arg_types::ArgTypesCache,
    structs::{StructDecl, StructField, StructFlags, StructLayout},
    ty::{CommonTys, Identifier, StructId, TyId, TyKind},
};

/// Errors that occur when an aggregate cannot be laid out.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TypeError {
    /// The aggregate contains itself by value.
    #[display("struct `{name}` contains itself by value")]
    RecursiveStruct { name: Identifier },
}

/// The type context of a single compilation target. All methods take `&self`
/// so the context can be shared by every thread that lowers signatures.
pub struct TyCtx {
    /// The target that types are laid out for.
    target: Target,

    /// All interned types.
    tys: RwLock<IndexVec<TyId, TyKind>>,

    /// Reverse mapping from a [TyKind] to its interned [TyId].
    interned: DashMap<TyKind, TyId>,

    /// All declared aggregates.
    structs: RwLock<IndexVec<StructId, Arc<StructDecl>>>,

    /// Builtin aggregates that have been created, keyed by name.
    builtins: DashMap<Identifier, TyId>,

    /// Memoised argument-type classifications of finalised aggregates.
    arg_types: ArgTypesCache,

    common: CommonTys,
}

impl TyCtx {
    /// Create a new [TyCtx] for the given target.
    pub fn new(target: Target) -> Self {
        let interned = DashMap::new();
        let mut tys = IndexVec::new();
        let common = CommonTys::new(|kind| Self::intern_into(&mut tys, &interned, kind));

        Self {
            target,
            tys: RwLock::new(tys),
            interned,
            structs: RwLock::new(IndexVec::new()),
            builtins: DashMap::new(),
            arg_types: ArgTypesCache::default(),
            common,
        }
    }

    fn intern_into(
        tys: &mut IndexVec<TyId, TyKind>,
        interned: &DashMap<TyKind, TyId>,
        kind: TyKind,
    ) -> TyId {
        if let Some(id) = interned.get(&kind) {
            return *id;
        }

        let id = tys.push(kind.clone());
        interned.insert(kind, id);
        id
    }

    /// Intern a [TyKind], returning the existing [TyId] if an equal kind was
    /// interned before.
    pub fn intern(&self, kind: TyKind) -> TyId {
        if let Some(id) = self.interned.get(&kind) {
            return *id;
        }

        // Another thread may have interned the same kind between the lookup
        // and taking the lock, so the lookup is repeated under the lock.
        let mut tys = self.tys.write();
        Self::intern_into(&mut tys, &self.interned, kind)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn common(&self) -> &CommonTys {
        &self.common
    }

    /// The memoised argument-type classifications of aggregates.
    pub fn arg_types(&self) -> &ArgTypesCache {
        &self.arg_types
    }

    /// Get the [TyKind] of an interned type.
    pub fn kind(&self, ty: TyId) -> TyKind {
        self.tys.read()[ty].clone()
    }

    /// Strip any enumerations and aliases from the type.
    pub fn base_ty(&self, mut ty: TyId) -> TyId {
        loop {
            match self.kind(ty) {
                TyKind::Enum { base, .. } | TyKind::Alias { base, .. } => ty = base,
                _ => return ty,
            }
        }
    }

    /// Get the [TyKind] of the base type.
    pub fn base_kind(&self, ty: TyId) -> TyKind {
        self.kind(self.base_ty(ty))
    }

    /// Strip all static array dimensions from the type, yielding the base
    /// element type.
    pub fn element_of(&self, mut ty: TyId) -> TyId {
        loop {
            match self.base_kind(ty) {
                TyKind::StaticArray { element, .. } => ty = element,
                _ => return self.base_ty(ty),
            }
        }
    }

    pub fn ptr_to(&self, ty: TyId) -> TyId {
        self.intern(TyKind::Pointer(ty))
    }

    pub fn static_array(&self, element: TyId, count: u64) -> TyId {
        self.intern(TyKind::StaticArray { element, count })
    }

    pub fn vector(&self, element: TyId, count: u64) -> TyId {
        self.intern(TyKind::Vector { element, count })
    }

    pub fn dynamic_array(&self, element: TyId) -> TyId {
        self.intern(TyKind::DynamicArray(element))
    }

    pub fn float(&self, float: FloatTy) -> TyId {
        match float {
            FloatTy::F32 => self.common.f32,
            FloatTy::F64 => self.common.f64,
            FloatTy::F80 => self.common.f80,
        }
    }

    /// The unsigned integer type that is exactly `size` bytes wide, if any.
    pub fn uint_of_size(&self, size: Size) -> Option<TyId> {
        match size.bytes() {
            1 => Some(self.common.u8),
            2 => Some(self.common.u16),
            4 => Some(self.common.u32),
            8 => Some(self.common.u64),
            16 => Some(self.common.u128),
            _ => None,
        }
    }

    pub fn is_integral(&self, ty: TyId) -> bool {
        self.base_kind(ty).is_integral()
    }

    pub fn is_floating(&self, ty: TyId) -> bool {
        self.base_kind(ty).is_floating()
    }

    pub fn is_complex(&self, ty: TyId) -> bool {
        self.base_kind(ty).is_complex()
    }

    pub fn is_unsigned(&self, ty: TyId) -> bool {
        self.base_kind(ty).is_unsigned()
    }

    pub fn is_struct(&self, ty: TyId) -> bool {
        self.base_kind(ty).is_struct()
    }

    pub fn is_static_array(&self, ty: TyId) -> bool {
        self.base_kind(ty).is_static_array()
    }

    pub fn is_scalar(&self, ty: TyId) -> bool {
        self.base_kind(ty).is_scalar()
    }

    /// Structs and static arrays are values that are always kept in memory
    /// rather than in a single register.
    pub fn is_in_memory_only(&self, ty: TyId) -> bool {
        matches!(self.base_kind(ty), TyKind::Struct(_) | TyKind::StaticArray { .. })
    }

    /// Get the [StructId] of the type if it is a `struct` or `union`.
    pub fn as_struct(&self, ty: TyId) -> Option<StructId> {
        match self.base_kind(ty) {
            TyKind::Struct(id) => Some(id),
            _ => None,
        }
    }

    /// Whether a value of the type can be copied bitwise. Static arrays are
    /// POD if their elements are.
    pub fn is_pod(&self, ty: TyId, exclude_ctor: bool) -> bool {
        match self.as_struct(self.element_of(ty)) {
            Some(id) => self.struct_decl(id).is_pod(exclude_ctor),
            None => true,
        }
    }

    /// Declare a new aggregate, returning the type that refers to it. The
    /// aggregate must be finalised before its layout can be queried.
    pub fn declare_struct(&self, decl: StructDecl) -> TyId {
        let id = self.structs.write().push(Arc::new(decl));
        self.intern(TyKind::Struct(id))
    }

    /// Get the declaration of an aggregate.
    pub fn struct_decl(&self, id: StructId) -> Arc<StructDecl> {
        self.structs.read()[id].clone()
    }

    /// Get the declaration of an aggregate that is referred to by `ty`.
    pub fn struct_decl_of(&self, ty: TyId) -> Option<Arc<StructDecl>> {
        self.as_struct(ty).map(|id| self.struct_decl(id))
    }

    /// Get or create a builtin aggregate with the given name and fields. The
    /// aggregate is created at most once per context.
    pub fn builtin_struct(&self, name: &str, fields: &[(&str, TyId)]) -> TyId {
        *self.builtins.entry(name.into()).or_insert_with(|| {
            let fields = fields.iter().map(|(name, ty)| StructField::new(*name, *ty)).collect();
            let ty = self.declare_struct(
                StructDecl::new(name, fields).with_flags(StructFlags::BUILTIN),
            );

            let Some(id) = self.as_struct(ty) else { ice!("builtin `{name}` is not a struct") };
            if let Err(err) = self.finalise_struct(id) {
                ice!("failed to lay out builtin `{name}`: {err}");
            }

            ty
        })
    }

    /// Compute the layout of an aggregate and of every aggregate that it
    /// contains by value. Finalising an aggregate twice is a no-op.
    pub fn finalise_struct(&self, id: StructId) -> Result<StructLayout, TypeError> {
        self.finalise_struct_inner(id, &mut Vec::new())
    }

    fn finalise_struct_inner(
        &self,
        id: StructId,
        visiting: &mut Vec<StructId>,
    ) -> Result<StructLayout, TypeError> {
        let decl = self.struct_decl(id);

        if let Some(layout) = decl.layout() {
            return Ok(layout);
        }

        if visiting.contains(&id) {
            return Err(TypeError::RecursiveStruct { name: decl.name.clone() });
        }

        visiting.push(id);

        let mut offsets = Vec::with_capacity(decl.fields.len());
        let mut offset = Size::ZERO;
        let mut size = Size::ZERO;
        let mut align = Alignment::ONE;

        for field in &decl.fields {
            let (field_size, field_align) = self.field_layout(field.ty, visiting)?;
            let field_align = if decl.is_packed() { Alignment::ONE } else { field_align };
            align = align.max(field_align);

            if decl.is_union() {
                offsets.push(Size::ZERO);
                size = size.max(field_size);
            } else {
                offset = offset.align_to(field_align);
                offsets.push(offset);
                offset = offset + field_size;
                size = offset;
            }
        }

        visiting.pop();

        // Tail padding follows the natural alignment, an explicit alignment
        // then overrides how the aggregate is aligned as a whole.
        let mut size = size.align_to(align);
        if let Some(explicit) = decl.explicit_align {
            align = explicit;
            size = size.align_to(explicit);
        }

        // Empty aggregates still occupy a byte.
        if size == Size::ZERO {
            size = Size::from_bytes(1);
        }

        let layout = StructLayout { size, align };
        debug!("finalised `{}`: size {}, align {}", decl.name, layout.size, layout.align);

        let mut structs = self.structs.write();
        Arc::make_mut(&mut structs[id]).finalise(offsets, layout);

        Ok(layout)
    }

    /// Compute the size and alignment of a field, finalising any aggregate
    /// that it contains by value.
    fn field_layout(
        &self,
        ty: TyId,
        visiting: &mut Vec<StructId>,
    ) -> Result<(Size, Alignment), TypeError> {
        match self.base_kind(ty) {
            TyKind::Struct(id) => {
                let layout = self.finalise_struct_inner(id, visiting)?;
                Ok((layout.size, layout.align))
            }
            TyKind::StaticArray { element, count } => {
                let (size, align) = self.field_layout(element, visiting)?;
                Ok((size * count, align))
            }
            _ => Ok((self.size_of(ty), self.align_of(ty))),
        }
    }

    /// The size of a value of the type in memory.
    pub fn size_of(&self, ty: TyId) -> Size {
        self.layout_of(ty).0
    }

    /// The ABI alignment of a value of the type in memory.
    pub fn align_of(&self, ty: TyId) -> Alignment {
        self.layout_of(ty).1
    }

    fn layout_of(&self, ty: TyId) -> (Size, Alignment) {
        let dl = self.data_layout();
        let pointer = (dl.pointer_size, dl.pointer_align.abi);

        match self.base_kind(ty) {
            TyKind::Void | TyKind::NoReturn => (Size::ZERO, Alignment::ONE),
            TyKind::Bool => (Size::from_bytes(1), dl.i8_align.abi),
            TyKind::Int(int) => {
                let size = int.size(dl.pointer_size);
                let align = Integer::fitting(size).map_or(Alignment::ONE, |int| int.align(dl).abi);
                (size, align)
            }
            TyKind::Float(float) | TyKind::Imaginary(float) => {
                (float.size(dl), float.align(dl).abi)
            }
            TyKind::Complex(float) => (float.size(dl) * 2, float.align(dl).abi),
            TyKind::Pointer(_) | TyKind::Class(_) | TyKind::AssocArray { .. } => pointer,
            TyKind::DynamicArray(_) | TyKind::Delegate => (pointer.0 * 2, pointer.1),
            TyKind::Vector { element, count } => {
                let size = self.size_of(element) * count;
                (size, dl.vector_align_for(size).abi)
            }
            TyKind::StaticArray { element, count } => {
                let (size, align) = self.layout_of(element);
                (size * count, align)
            }
            TyKind::Struct(id) => {
                let decl = self.struct_decl(id);
                match decl.layout() {
                    Some(layout) => (layout.size, layout.align),
                    None => ice!("layout of `{}` was queried before it was finalised", decl.name),
                }
            }
            TyKind::Enum { .. } | TyKind::Alias { .. } => {
                unreachable!("base type is never transparent")
            }
        }
    }

    /// Render the type in source syntax.
    pub fn ty_name(&self, ty: TyId) -> String {
        match self.kind(ty) {
            TyKind::Void => "void".to_string(),
            TyKind::NoReturn => "noreturn".to_string(),
            TyKind::Bool => "bool".to_string(),
            TyKind::Int(int) => int.to_name().to_string(),
            TyKind::Float(float) => float_name(float).to_string(),
            TyKind::Imaginary(float) => format!("i{}", float_name(float)),
            TyKind::Complex(float) => format!("c{}", float_name(float)),
            TyKind::Pointer(inner) => format!("{}*", self.ty_name(inner)),
            TyKind::Class(name) => name.to_string(),
            TyKind::AssocArray { key, value } => {
                format!("{}[{}]", self.ty_name(value), self.ty_name(key))
            }
            TyKind::Vector { element, count } => {
                format!("__vector({}[{count}])", self.ty_name(element))
            }
            TyKind::StaticArray { element, count } => {
                format!("{}[{count}]", self.ty_name(element))
            }
            TyKind::DynamicArray(element) => format!("{}[]", self.ty_name(element)),
            TyKind::Delegate => "delegate".to_string(),
            TyKind::Struct(id) => self.struct_decl(id).name.to_string(),
            TyKind::Enum { name, .. } | TyKind::Alias { name, .. } => name.to_string(),
        }
    }
}

fn float_name(float: FloatTy) -> &'static str {
    match float {
        FloatTy::F32 => "float",
        FloatTy::F64 => "double",
        FloatTy::F80 => "real",
    }
}

impl HasDataLayout for TyCtx {
    fn data_layout(&self) -> &TargetDataLayout {
        self.target.data_layout()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sable_target::Target;

    use super::*;

    fn tcx(triple: &str) -> TyCtx {
        TyCtx::new(triple.parse::<Target>().unwrap())
    }

    #[test]
    fn interning_is_idempotent() {
        let tcx = tcx("x86_64-unknown-linux-gnu");
        let a = tcx.ptr_to(tcx.common().i32);
        let b = tcx.ptr_to(tcx.common().i32);

        assert_eq!(a, b);
        assert_eq!(tcx.intern(TyKind::Bool), tcx.common().bool);
    }

    #[test]
    fn struct_layout_inserts_padding() {
        let tcx = tcx("x86_64-unknown-linux-gnu");
        let common = tcx.common().clone();

        let ty = tcx.declare_struct(StructDecl::new(
            "S",
            vec![
                StructField::new("a", common.u8),
                StructField::new("b", common.i32),
                StructField::new("c", common.u8),
            ],
        ));
        let id = tcx.as_struct(ty).unwrap();
        tcx.finalise_struct(id).unwrap();

        let decl = tcx.struct_decl(id);
        let offsets: Vec<_> = decl.fields.iter().map(|field| field.offset.bytes()).collect();
        assert_eq!(offsets, vec![0, 4, 8]);
        assert_eq!(tcx.size_of(ty), Size::from_bytes(12));
        assert_eq!(tcx.align_of(ty).bytes(), 4);
    }

    #[test]
    fn packed_struct_and_union() {
        let tcx = tcx("x86_64-unknown-linux-gnu");
        let common = tcx.common().clone();
        let fields = vec![StructField::new("a", common.u8), StructField::new("b", common.i64)];

        let packed = tcx.declare_struct(
            StructDecl::new("P", fields.clone()).with_flags(StructFlags::PACKED),
        );
        let union =
            tcx.declare_struct(StructDecl::new("U", fields).with_flags(StructFlags::UNION));

        tcx.finalise_struct(tcx.as_struct(packed).unwrap()).unwrap();
        tcx.finalise_struct(tcx.as_struct(union).unwrap()).unwrap();

        assert_eq!(tcx.size_of(packed), Size::from_bytes(9));
        assert_eq!(tcx.align_of(packed), Alignment::ONE);
        assert_eq!(tcx.size_of(union), Size::from_bytes(8));
    }

    #[test]
    fn nested_structs_are_finalised_together() {
        let tcx = tcx("i686-unknown-linux-gnu");
        let common = tcx.common().clone();

        let inner = tcx.declare_struct(StructDecl::new(
            "Inner",
            vec![StructField::new("x", common.f64), StructField::new("y", common.u8)],
        ));
        let outer = tcx.declare_struct(StructDecl::new(
            "Outer",
            vec![StructField::new("a", common.u8), StructField::new("inner", inner)],
        ));

        tcx.finalise_struct(tcx.as_struct(outer).unwrap()).unwrap();

        // `double` is only 4-byte aligned on i386.
        assert_eq!(tcx.size_of(inner), Size::from_bytes(12));
        assert_eq!(tcx.size_of(outer), Size::from_bytes(16));
    }

    #[test]
    fn recursive_struct_is_rejected() {
        let tcx = tcx("x86_64-unknown-linux-gnu");
        let placeholder = tcx.declare_struct(StructDecl::new("R", vec![]));
        let id = tcx.as_struct(placeholder).unwrap();

        {
            let mut structs = tcx.structs.write();
            Arc::make_mut(&mut structs[id]).fields.push(StructField::new("r", placeholder));
        }

        assert_eq!(
            tcx.finalise_struct(id),
            Err(TypeError::RecursiveStruct { name: "R".into() })
        );
    }

    #[test]
    fn builtin_structs_are_created_once() {
        let tcx = tcx("x86_64-unknown-linux-gnu");
        let common = tcx.common().clone();
        let fields = [("gp_offset", common.u32), ("overflow_arg_area", common.void_ptr)];

        let a = tcx.builtin_struct("__va_list_tag", &fields);
        let b = tcx.builtin_struct("__va_list_tag", &fields);

        assert_eq!(a, b);
        assert_eq!(tcx.size_of(a), Size::from_bytes(16));
    }

    #[test]
    fn real_is_padded_to_its_alignment() {
        let x86_64 = tcx("x86_64-unknown-linux-gnu");
        let i686 = tcx("i686-unknown-linux-gnu");

        assert_eq!(x86_64.size_of(x86_64.common().f80), Size::from_bytes(16));
        assert_eq!(i686.size_of(i686.common().f80), Size::from_bytes(12));
    }

    #[test]
    fn names_render_in_source_syntax() {
        let tcx = tcx("x86_64-unknown-linux-gnu");
        let common = tcx.common().clone();
        let ty = tcx.dynamic_array(tcx.ptr_to(tcx.static_array(common.f32, 4)));

        assert_eq!(tcx.ty_name(ty), "float[4]*[]");
    }
}
