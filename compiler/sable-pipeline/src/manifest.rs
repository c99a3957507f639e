//! Signature manifests describe the aggregates and function signatures that
//! are to be lowered, in JSON. Types are written in source syntax, e.g.
//! `int`, `Point*`, `float[4]`, `__vector(float[4])` or `string[int]`.
//!
//! ```json
//! {
//!     "structs": [
//!         { "name": "Point", "fields": [{ "name": "x", "type": "double" }, { "name": "y", "type": "double" }] }
//!     ],
//!     "functions": [
//!         { "name": "scale", "linkage": "c", "ret": "Point", "params": [{ "type": "Point" }, { "type": "double" }] }
//!     ]
//! }
//! ```

use derive_more::{Display, Error, From};
use serde::Deserialize;
use sable_target::{alignment::Alignment, primitives::FloatTy};
use sable_types::{
    ctx::{TyCtx, TypeError},
    sig::{FnSig, Linkage, Param, ParamStorage, Variadic},
    structs::{StructDecl, StructField, StructFlags},
    ty::{TyId, TyKind},
};
use sable_utils::fxhash::FxHashMap;

/// Errors that occur when reading a manifest or declaring its contents.
#[derive(Debug, Display, Error, From)]
pub enum ManifestError {
    #[display("malformed manifest: {_0}")]
    #[from]
    Json(serde_json::Error),

    #[display("unknown type `{name}`")]
    UnknownType { name: String },

    #[display("struct `{name}` is declared more than once")]
    DuplicateStruct { name: String },

    #[display("struct `{name}` has an invalid alignment of {align} bytes")]
    InvalidAlignment { name: String, align: u64 },

    /// A `__vector` of something that is not a static array.
    #[display("invalid vector type `{name}`")]
    InvalidVector { name: String },

    #[display("{_0}")]
    #[from]
    Layout(TypeError),
}

/// The contents of a manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Aggregates in declaration order. A struct can only refer to the
    /// structs declared before it.
    #[serde(default)]
    pub structs: Vec<StructEntry>,

    #[serde(default)]
    pub functions: Vec<FunctionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructEntry {
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldEntry>,

    /// Whether the struct can be copied bitwise.
    #[serde(default = "default_true")]
    pub pod: bool,

    /// The struct has a constructor.
    #[serde(default)]
    pub ctor: bool,

    #[serde(default)]
    pub union: bool,

    #[serde(default)]
    pub packed: bool,

    /// An explicit alignment in bytes.
    #[serde(default)]
    pub align: Option<u64>,
}

impl StructEntry {
    fn flags(&self) -> StructFlags {
        let mut flags = StructFlags::empty();
        flags.set(StructFlags::UNION, self.union);
        flags.set(StructFlags::PACKED, self.packed);
        flags.set(StructFlags::NON_POD, !self.pod);
        flags.set(StructFlags::HAS_CTOR, self.ctor);
        flags
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldEntry {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionEntry {
    pub name: String,

    #[serde(default = "default_ret")]
    pub ret: String,

    #[serde(default)]
    pub ret_by_ref: bool,

    #[serde(default)]
    pub params: Vec<ParamEntry>,

    #[serde(default)]
    pub linkage: LinkageEntry,

    #[serde(default)]
    pub variadic: VariadicEntry,

    #[serde(default)]
    pub needs_this: bool,

    #[serde(default)]
    pub nested: bool,

    #[serde(default)]
    pub objc_method: bool,

    /// The types of the variadic arguments of a call to the function.
    #[serde(default)]
    pub varargs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamEntry {
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub storage: StorageEntry,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkageEntry {
    #[default]
    D,
    C,
    #[serde(rename = "c++")]
    Cpp,
    Windows,
    ObjC,
    System,
}

impl From<LinkageEntry> for Linkage {
    fn from(value: LinkageEntry) -> Self {
        match value {
            LinkageEntry::D => Linkage::D,
            LinkageEntry::C => Linkage::C,
            LinkageEntry::Cpp => Linkage::Cpp,
            LinkageEntry::Windows => Linkage::Windows,
            LinkageEntry::ObjC => Linkage::ObjC,
            LinkageEntry::System => Linkage::System,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariadicEntry {
    #[default]
    None,
    C,
    TypeSafe,
}

impl From<VariadicEntry> for Variadic {
    fn from(value: VariadicEntry) -> Self {
        match value {
            VariadicEntry::None => Variadic::None,
            VariadicEntry::C => Variadic::CStyle,
            VariadicEntry::TypeSafe => Variadic::TypeSafe,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageEntry {
    #[default]
    Value,
    Ref,
    Out,
    Lazy,
}

impl From<StorageEntry> for ParamStorage {
    fn from(value: StorageEntry) -> Self {
        match value {
            StorageEntry::Value => ParamStorage::Value,
            StorageEntry::Ref => ParamStorage::Ref,
            StorageEntry::Out => ParamStorage::Out,
            StorageEntry::Lazy => ParamStorage::Lazy,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ret() -> String {
    "void".to_string()
}

/// A function of the manifest with its types resolved.
#[derive(Debug, Clone)]
pub struct LoweringRequest {
    pub name: String,
    pub sig: FnSig,

    /// The variadic arguments of a call, empty if there is no call.
    pub varargs: Vec<TyId>,
}

/// Structs that have been declared so far, by name.
pub type DeclaredStructs = FxHashMap<String, TyId>;

impl Manifest {
    pub fn from_json(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Declare and lay out the structs of the manifest, then resolve the
    /// signatures of every function.
    pub fn declare(&self, tcx: &TyCtx) -> Result<Vec<LoweringRequest>, ManifestError> {
        let mut structs = DeclaredStructs::default();

        for entry in &self.structs {
            if structs.contains_key(&entry.name) {
                return Err(ManifestError::DuplicateStruct { name: entry.name.clone() });
            }

            let fields = entry
                .fields
                .iter()
                .map(|field| {
                    Ok(StructField::new(field.name.as_str(), parse_ty(tcx, &structs, &field.ty)?))
                })
                .collect::<Result<Vec<_>, ManifestError>>()?;

            let mut decl = StructDecl::new(entry.name.as_str(), fields).with_flags(entry.flags());

            if let Some(align) = entry.align {
                let align = Alignment::from_bytes(align).map_err(|_| {
                    ManifestError::InvalidAlignment { name: entry.name.clone(), align }
                })?;
                decl = decl.with_align(align);
            }

            let ty = tcx.declare_struct(decl);
            if let Some(id) = tcx.as_struct(ty) {
                tcx.finalise_struct(id)?;
            }

            structs.insert(entry.name.clone(), ty);
        }

        self.functions.iter().map(|function| function.resolve(tcx, &structs)).collect()
    }
}

impl FunctionEntry {
    fn resolve(
        &self,
        tcx: &TyCtx,
        structs: &DeclaredStructs,
    ) -> Result<LoweringRequest, ManifestError> {
        let ret = parse_ty(tcx, structs, &self.ret)?;
        let params = self
            .params
            .iter()
            .map(|param| {
                Ok(Param::with_storage(parse_ty(tcx, structs, &param.ty)?, param.storage.into()))
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        let mut sig = FnSig::new(ret, self.linkage.into())
            .with_params(params)
            .with_variadic(self.variadic.into());
        sig.ret_by_ref = self.ret_by_ref;
        sig.needs_this = self.needs_this;
        sig.is_nested = self.nested;
        sig.is_objc_method = self.objc_method;

        let varargs = self
            .varargs
            .iter()
            .map(|ty| parse_ty(tcx, structs, ty))
            .collect::<Result<Vec<_>, ManifestError>>()?;

        Ok(LoweringRequest { name: self.name.clone(), sig, varargs })
    }
}

/// Parse a type in source syntax.
pub fn parse_ty(
    tcx: &TyCtx,
    structs: &DeclaredStructs,
    text: &str,
) -> Result<TyId, ManifestError> {
    let text = text.trim();

    if let Some(pointee) = text.strip_suffix('*') {
        return Ok(tcx.ptr_to(parse_ty(tcx, structs, pointee)?));
    }

    if let Some(inner) = text.strip_prefix("__vector(").and_then(|rest| rest.strip_suffix(')')) {
        let array = parse_ty(tcx, structs, inner)?;

        return match tcx.kind(array) {
            TyKind::StaticArray { element, count } => Ok(tcx.vector(element, count)),
            _ => Err(ManifestError::InvalidVector { name: text.to_string() }),
        };
    }

    if let Some(open) = opening_bracket(text) {
        let base = parse_ty(tcx, structs, &text[..open])?;
        let index = text[open + 1..text.len() - 1].trim();

        if index.is_empty() {
            return Ok(tcx.dynamic_array(base));
        }

        return match index.parse::<u64>() {
            Ok(count) => Ok(tcx.static_array(base, count)),
            Err(_) => {
                let key = parse_ty(tcx, structs, index)?;
                Ok(tcx.intern(TyKind::AssocArray { key, value: base }))
            }
        };
    }

    if let Some(name) = text.strip_prefix("class ") {
        return Ok(tcx.intern(TyKind::Class(name.trim().into())));
    }

    primitive(tcx, text)
        .or_else(|| structs.get(text).copied())
        .ok_or_else(|| ManifestError::UnknownType { name: text.to_string() })
}

/// The position of the `[` matching a trailing `]`.
fn opening_bracket(text: &str) -> Option<usize> {
    if !text.ends_with(']') {
        return None;
    }

    let mut depth = 0usize;
    for (index, ch) in text.char_indices().rev() {
        match ch {
            ']' => depth += 1,
            '[' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}

fn primitive(tcx: &TyCtx, name: &str) -> Option<TyId> {
    let common = tcx.common();
    let real = tcx.target().real_float_ty();

    let ty = match name {
        "void" => common.void,
        "noreturn" => common.noreturn,
        "bool" => common.bool,
        "byte" => common.i8,
        "ubyte" | "char" => common.u8,
        "short" => common.i16,
        "ushort" | "wchar" => common.u16,
        "int" => common.i32,
        "uint" | "dchar" => common.u32,
        "long" => common.i64,
        "ulong" => common.u64,
        "cent" => common.i128,
        "ucent" => common.u128,
        "ptrdiff_t" => common.isize,
        "size_t" => common.usize,
        "float" => common.f32,
        "double" => common.f64,
        "real" => tcx.float(real),
        "ifloat" => tcx.intern(TyKind::Imaginary(FloatTy::F32)),
        "idouble" => tcx.intern(TyKind::Imaginary(FloatTy::F64)),
        "ireal" => tcx.intern(TyKind::Imaginary(real)),
        "cfloat" => tcx.intern(TyKind::Complex(FloatTy::F32)),
        "cdouble" => tcx.intern(TyKind::Complex(FloatTy::F64)),
        "creal" => tcx.intern(TyKind::Complex(real)),
        "delegate" => tcx.intern(TyKind::Delegate),
        _ => return None,
    };

    Some(ty)
}
