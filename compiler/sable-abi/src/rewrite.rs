//! Rewrites convert a value between its source representation and the native
//! representation that the calling convention prescribes. A [Rewrite] is a
//! plain tag, the same rewrite is shared by any number of parameters.

use derive_more::Display;
use log::debug;
use sable_target::alignment::Alignment;
use sable_types::ty::TyId;
use sable_utils::ice;

use crate::{
    builder::{AbiBuilderMethods, DValue},
    cx::AbiCx,
    flatten::{ScalarFields, flatten_scalar_fields, scalar_fields_ty},
    fn_abi::{ArgAbi, ArgAttributeFlag},
    ty::{NativeTy, unpadded_struct_ty},
};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rewrite {
    /// The caller copies the value into a temporary and passes a pointer to
    /// it.
    IndirectByval,

    /// The value is passed as a pointer with the `byval` attribute, the
    /// native code generator performs the copy.
    ImplicitByval,

    /// The fields of a struct are passed without the padding in between.
    RemoveStructPadding,

    /// The scalar leaves of a small aggregate are passed as a structure of
    /// just those leaves.
    ScalarFields,

    /// The bits of a small aggregate are passed as a single integer.
    Integer,

    /// The value is passed in the register slots that the type classifier
    /// assigns to it.
    ArgTypes,

    /// A homogeneous aggregate is passed as an array of its elements.
    HomogeneousArray,

    /// The bits of an aggregate are passed as an array of 32-bit integers.
    CompositeToArray32,

    /// The bits of an aggregate are passed as an array of 64-bit integers.
    CompositeToArray64,
}

impl Rewrite {
    /// The native type that values of the given type are passed as.
    pub fn native_ty(self, cx: &AbiCx, ty: TyId) -> NativeTy {
        let size = cx.size_of(ty).bytes();

        match self {
            Rewrite::IndirectByval | Rewrite::ImplicitByval => NativeTy::Ptr,
            Rewrite::RemoveStructPadding => unpadded_struct_ty(cx.tcx(), ty),
            Rewrite::ScalarFields => scalar_fields_ty(cx.tcx(), ty),
            Rewrite::Integer => NativeTy::int(size * 8),
            Rewrite::ArgTypes => {
                cx.classifier().rewritten_type_of(ty).unwrap_or_else(|| cx.lower_ty(ty))
            }
            Rewrite::HomogeneousArray => match cx.tcx().homogeneous_aggregate(ty) {
                Some(homogeneous) => cx.lower_ty(homogeneous.array_ty(cx.tcx())),
                None => cx.lower_ty(ty),
            },
            Rewrite::CompositeToArray32 => NativeTy::array(NativeTy::int(32), size.div_ceil(4)),
            Rewrite::CompositeToArray64 => NativeTy::array(NativeTy::int(64), size.div_ceil(8)),
        }
    }

    /// Attach the rewrite to a parameter. The native type of the parameter
    /// becomes `native` or, if it is not given, [Rewrite::native_ty].
    pub fn apply_to(self, cx: &AbiCx, arg: &mut ArgAbi, native: Option<NativeTy>) {
        if arg.by_ref {
            ice!("cannot apply the {self} rewrite to the by-reference `{}`", cx.ty_name(arg.ty));
        }

        if let Some(existing) = arg.rewrite() {
            ice!(
                "cannot apply the {self} rewrite to `{}`, it is already rewritten with {existing}",
                cx.ty_name(arg.ty)
            );
        }

        let native = native.unwrap_or_else(|| self.native_ty(cx, arg.ty));
        debug!("rewriting `{}` with {self} as `{native}`", cx.ty_name(arg.ty));

        match self {
            Rewrite::IndirectByval => {
                arg.attributes.clear();
                arg.attributes.set(ArgAttributeFlag::NO_ALIAS).set(ArgAttributeFlag::NO_CAPTURE);
            }
            Rewrite::ImplicitByval => {
                arg.attributes.set(ArgAttributeFlag::BY_VAL);
            }
            _ => {}
        }

        arg.set_rewrite(self, native);
    }

    /// Produce the native representation of `value` that is passed for the
    /// parameter.
    pub fn put<B: AbiBuilderMethods>(
        self,
        bx: &mut B,
        cx: &AbiCx,
        arg: &ArgAbi,
        value: &DValue<B::Value>,
    ) -> B::Value {
        let ty = value.ty();
        let align = cx.align_of(ty);

        match self {
            Rewrite::IndirectByval => {
                let copy = bx.alloca(&cx.lower_ty(ty), align, ".hidden_copy_for_IndirectByval");
                match value {
                    DValue::Place { ptr, .. } => {
                        bx.mem_copy(copy.clone(), ptr.clone(), cx.size_of(ty), align)
                    }
                    DValue::Immediate { value, .. } => bx.store(value.clone(), copy.clone(), align),
                }
                copy
            }
            Rewrite::ImplicitByval => address_of(bx, cx, value),
            Rewrite::RemoveStructPadding => {
                let ptr = address_of(bx, cx, value);
                load_unpadded(bx, cx, ty, ptr, align)
            }
            Rewrite::ScalarFields => {
                let ptr = address_of(bx, cx, value);
                let mut result = bx.const_undef(arg.native_ty());

                for (index, field) in scalar_fields_of(cx, ty).into_iter().enumerate() {
                    let field_ptr = bx.inbounds_byte_offset(ptr.clone(), field.offset);
                    let field_align = align.restrict_to(field.offset).min(cx.align_of(field.ty));
                    let field_value = bx.load(&cx.lower_ty(field.ty), field_ptr, field_align);
                    result = bx.insert_value(result, field_value, index);
                }

                result
            }
            Rewrite::Integer
            | Rewrite::ArgTypes
            | Rewrite::HomogeneousArray
            | Rewrite::CompositeToArray32
            | Rewrite::CompositeToArray64 => {
                let src = address_of(bx, cx, value);
                let native = arg.native_ty();
                let scratch = reinterpret_slot(bx, cx, ty, native, ".rewritten_arg");
                bx.mem_copy(scratch.clone(), src, cx.size_of(ty), align);
                bx.load(native, scratch, native.align(cx))
            }
        }
    }

    /// Recover the address of source-typed storage that holds the value from
    /// its native representation.
    pub fn get_lvalue<B: AbiBuilderMethods>(
        self,
        bx: &mut B,
        cx: &AbiCx,
        arg: &ArgAbi,
        value: B::Value,
    ) -> B::Value {
        let ty = arg.ty;
        let align = cx.align_of(ty);

        match self {
            Rewrite::IndirectByval | Rewrite::ImplicitByval => value,
            Rewrite::RemoveStructPadding => {
                let ptr = bx.alloca(&cx.lower_ty(ty), align, ".padded");
                store_unpadded(bx, cx, ty, value, ptr.clone(), align);
                ptr
            }
            Rewrite::ScalarFields => {
                let ptr = bx.alloca(&cx.lower_ty(ty), align, ".unflattened");

                for (index, field) in scalar_fields_of(cx, ty).into_iter().enumerate() {
                    let field_value = bx.extract_value(value.clone(), index);
                    let field_ptr = bx.inbounds_byte_offset(ptr.clone(), field.offset);
                    let field_align = align.restrict_to(field.offset).min(cx.align_of(field.ty));
                    bx.store(field_value, field_ptr, field_align);
                }

                ptr
            }
            Rewrite::Integer
            | Rewrite::ArgTypes
            | Rewrite::HomogeneousArray
            | Rewrite::CompositeToArray32
            | Rewrite::CompositeToArray64 => {
                let native = arg.native_ty();
                let scratch = reinterpret_slot(bx, cx, ty, native, ".rewritten_lvalue");
                bx.store(value, scratch.clone(), native.align(cx));
                scratch
            }
        }
    }

    /// Recover the source value from its native representation.
    pub fn get_rvalue<B: AbiBuilderMethods>(
        self,
        bx: &mut B,
        cx: &AbiCx,
        arg: &ArgAbi,
        value: B::Value,
    ) -> B::Value {
        let ptr = self.get_lvalue(bx, cx, arg, value);
        bx.load(&cx.lower_ty(arg.ty), ptr, cx.align_of(arg.ty))
    }
}

/// The address of a value. A place is used directly, an immediate is spilled
/// into a fresh stack slot.
pub fn address_of<B: AbiBuilderMethods>(
    bx: &mut B,
    cx: &AbiCx,
    value: &DValue<B::Value>,
) -> B::Value {
    match value {
        DValue::Place { ptr, .. } => ptr.clone(),
        DValue::Immediate { ty, value } => {
            let align = cx.align_of(*ty);
            let slot = bx.alloca(&cx.lower_ty(*ty), align, ".getAddressOf_dump");
            bx.store(value.clone(), slot.clone(), align);
            slot
        }
    }
}

/// Allocate a stack slot which can hold both the source and the native
/// representation of a value.
fn reinterpret_slot<B: AbiBuilderMethods>(
    bx: &mut B,
    cx: &AbiCx,
    ty: TyId,
    native: &NativeTy,
    name: &str,
) -> B::Value {
    let align = cx.align_of(ty).max(native.align(cx));
    let slot_ty = match native.size(cx) > cx.size_of(ty) {
        true => native.clone(),
        false => cx.lower_ty(ty),
    };

    bx.alloca(&slot_ty, align, name)
}

fn scalar_fields_of(cx: &AbiCx, ty: TyId) -> ScalarFields {
    match flatten_scalar_fields(cx.tcx(), ty) {
        Some(fields) => fields,
        None => ice!("`{}` cannot be passed as scalar fields", cx.ty_name(ty)),
    }
}

/// Load the fields of the struct at `ptr` into its unpadded native
/// representation.
fn load_unpadded<B: AbiBuilderMethods>(
    bx: &mut B,
    cx: &AbiCx,
    ty: TyId,
    ptr: B::Value,
    align: Alignment,
) -> B::Value {
    let Some(decl) = cx.tcx().struct_decl_of(ty).filter(|decl| !decl.is_union()) else {
        return bx.load(&cx.lower_ty(ty), ptr, align);
    };

    let mut result = bx.const_undef(&unpadded_struct_ty(cx.tcx(), ty));

    for (index, field) in decl.fields.iter().enumerate() {
        let field_ptr = bx.inbounds_byte_offset(ptr.clone(), field.offset);
        let field_align = align.restrict_to(field.offset).min(cx.align_of(field.ty));
        let value = load_unpadded(bx, cx, field.ty, field_ptr, field_align);
        result = bx.insert_value(result, value, index);
    }

    result
}

/// Store an unpadded native value into the fields of the struct at `ptr`.
fn store_unpadded<B: AbiBuilderMethods>(
    bx: &mut B,
    cx: &AbiCx,
    ty: TyId,
    value: B::Value,
    ptr: B::Value,
    align: Alignment,
) {
    let Some(decl) = cx.tcx().struct_decl_of(ty).filter(|decl| !decl.is_union()) else {
        bx.store(value, ptr, align);
        return;
    };

    for (index, field) in decl.fields.iter().enumerate() {
        let field_value = bx.extract_value(value.clone(), index);
        let field_ptr = bx.inbounds_byte_offset(ptr.clone(), field.offset);
        let field_align = align.restrict_to(field.offset).min(cx.align_of(field.ty));
        store_unpadded(bx, cx, field.ty, field_value, field_ptr, field_align);
    }
}
