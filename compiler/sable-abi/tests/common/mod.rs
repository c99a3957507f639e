//! Helpers shared by the integration tests: type declarations and a builder
//! that executes the emitted instructions against a byte-addressed memory.

#![allow(dead_code)]

use sable_abi::{
    builder::{AbiBuilderMethods, BackendTypes},
    ty::NativeTy,
};
use sable_target::{
    Target,
    alignment::Alignment,
    data_layout::{HasDataLayout, TargetDataLayout},
    size::Size,
};
use sable_types::{
    ctx::TyCtx,
    structs::{StructDecl, StructField, StructFlags},
    ty::TyId,
};

pub fn tcx(triple: &str) -> TyCtx {
    TyCtx::new(triple.parse::<Target>().unwrap())
}

/// Declare and finalise a struct with the given field types.
pub fn declare(tcx: &TyCtx, name: &str, fields: &[TyId], flags: StructFlags) -> TyId {
    let fields = fields
        .iter()
        .enumerate()
        .map(|(index, ty)| StructField::new(format!("f{index}"), *ty))
        .collect();

    let ty = tcx.declare_struct(StructDecl::new(name, fields).with_flags(flags));
    tcx.finalise_struct(tcx.as_struct(ty).unwrap()).unwrap();
    ty
}

pub fn pod(tcx: &TyCtx, name: &str, fields: &[TyId]) -> TyId {
    declare(tcx, name, fields, StructFlags::empty())
}

/// A value of the simulated machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Ptr(usize),

    /// The bytes of a scalar as they are stored in memory.
    Bytes(Vec<u8>),

    /// The elements of a structure or array with their offsets.
    Aggregate(Vec<(Size, Value)>),

    Undef,
}

impl Value {
    pub fn addr(&self) -> usize {
        match self {
            Value::Ptr(addr) => *addr,
            other => panic!("expected a pointer, got {other:?}"),
        }
    }
}

/// Memory starts with a poisoned byte pattern, so that bytes which are never
/// written stand out.
const POISON: u8 = 0xcd;

pub struct MemoryBuilder {
    dl: TargetDataLayout,
    memory: Vec<u8>,

    /// The names of the stack slots, in allocation order.
    pub allocas: Vec<String>,
}

impl MemoryBuilder {
    pub fn new(cx: &impl HasDataLayout) -> Self {
        Self { dl: cx.data_layout().clone(), memory: vec![POISON; 16], allocas: Vec::new() }
    }

    pub fn write(&mut self, ptr: &Value, bytes: &[u8]) {
        let addr = ptr.addr();
        self.memory[addr..addr + bytes.len()].copy_from_slice(bytes);
    }

    pub fn read(&self, ptr: &Value, len: u64) -> Vec<u8> {
        let addr = ptr.addr();
        self.memory[addr..addr + len as usize].to_vec()
    }

    /// Allocate a slot and fill it with the given bytes.
    pub fn place_with(&mut self, bytes: &[u8], align: Alignment) -> Value {
        let ty = NativeTy::padding(Size::from_bytes(bytes.len() as u64));
        let ptr = self.alloca(&ty, align, "test.input");
        self.write(&ptr, bytes);
        ptr
    }

    fn undef(&self, ty: &NativeTy) -> Value {
        match ty {
            NativeTy::Struct { fields, .. } => Value::Aggregate(
                ty.field_offsets(&self.dl)
                    .into_iter()
                    .zip(fields)
                    .map(|(offset, field)| (offset, self.undef(field)))
                    .collect(),
            ),
            NativeTy::Array { element, count } => {
                let stride = element.size(&self.dl);
                Value::Aggregate(
                    (0..*count).map(|index| (stride * index, self.undef(element))).collect(),
                )
            }
            _ => Value::Undef,
        }
    }

    fn load_at(&self, ty: &NativeTy, addr: usize) -> Value {
        match ty {
            NativeTy::Ptr => {
                let size = self.dl.pointer_size.bytes() as usize;
                let mut bytes = [0; 8];
                bytes[..size].copy_from_slice(&self.memory[addr..addr + size]);
                Value::Ptr(u64::from_le_bytes(bytes) as usize)
            }
            NativeTy::Struct { fields, .. } => Value::Aggregate(
                ty.field_offsets(&self.dl)
                    .into_iter()
                    .zip(fields)
                    .map(|(offset, field)| {
                        (offset, self.load_at(field, addr + offset.bytes() as usize))
                    })
                    .collect(),
            ),
            NativeTy::Array { element, count } => {
                let stride = element.size(&self.dl);
                Value::Aggregate(
                    (0..*count)
                        .map(|index| {
                            let offset = stride * index;
                            (offset, self.load_at(element, addr + offset.bytes() as usize))
                        })
                        .collect(),
                )
            }
            scalar => {
                let size = scalar.size(&self.dl).bytes() as usize;
                Value::Bytes(self.memory[addr..addr + size].to_vec())
            }
        }
    }

    fn store_at(&mut self, value: &Value, addr: usize) {
        match value {
            Value::Ptr(target) => {
                let size = self.dl.pointer_size.bytes() as usize;
                let bytes = (*target as u64).to_le_bytes();
                self.memory[addr..addr + size].copy_from_slice(&bytes[..size]);
            }
            Value::Bytes(bytes) => self.memory[addr..addr + bytes.len()].copy_from_slice(bytes),
            Value::Aggregate(elements) => {
                for (offset, element) in elements {
                    self.store_at(element, addr + offset.bytes() as usize);
                }
            }
            Value::Undef => {}
        }
    }
}

impl BackendTypes for MemoryBuilder {
    type Value = Value;
}

impl AbiBuilderMethods for MemoryBuilder {
    fn alloca(&mut self, ty: &NativeTy, align: Alignment, name: &str) -> Value {
        let size = ty.size(&self.dl).bytes().max(1) as usize;
        let start = self.memory.len().next_multiple_of(align.bytes() as usize);

        self.memory.resize(start + size, POISON);
        self.allocas.push(name.to_string());
        Value::Ptr(start)
    }

    fn load(&mut self, ty: &NativeTy, ptr: Value, _align: Alignment) -> Value {
        self.load_at(ty, ptr.addr())
    }

    fn store(&mut self, value: Value, ptr: Value, _align: Alignment) {
        self.store_at(&value, ptr.addr());
    }

    fn mem_copy(&mut self, dest: Value, src: Value, size: Size, _align: Alignment) {
        let (dest, src) = (dest.addr(), src.addr());
        self.memory.copy_within(src..src + size.bytes() as usize, dest);
    }

    fn inbounds_byte_offset(&mut self, ptr: Value, offset: Size) -> Value {
        Value::Ptr(ptr.addr() + offset.bytes() as usize)
    }

    fn extract_value(&mut self, aggregate: Value, index: usize) -> Value {
        match aggregate {
            Value::Aggregate(mut elements) => elements.swap_remove(index).1,
            other => panic!("cannot extract from {other:?}"),
        }
    }

    fn insert_value(&mut self, aggregate: Value, value: Value, index: usize) -> Value {
        match aggregate {
            Value::Aggregate(mut elements) => {
                elements[index].1 = value;
                Value::Aggregate(elements)
            }
            other => panic!("cannot insert into {other:?}"),
        }
    }

    fn const_undef(&mut self, ty: &NativeTy) -> Value {
        self.undef(ty)
    }
}
