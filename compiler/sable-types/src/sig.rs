//! Function signatures as they are handed to the calling-convention lowering.

use std::fmt;

use crate::ty::TyId;

/// The linkage of a function, which selects the calling convention family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// The native convention of the language.
    D,
    C,
    Cpp,
    Windows,
    ObjC,

    /// `Windows` on Windows targets, `C` everywhere else.
    System,
}

impl Linkage {
    /// Resolve [Linkage::System] for the target.
    pub fn resolve(self, is_windows: bool) -> Linkage {
        match self {
            Linkage::System if is_windows => Linkage::Windows,
            Linkage::System => Linkage::C,
            linkage => linkage,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Linkage::D => write!(f, "D"),
            Linkage::C => write!(f, "C"),
            Linkage::Cpp => write!(f, "C++"),
            Linkage::Windows => write!(f, "Windows"),
            Linkage::ObjC => write!(f, "Objective-C"),
            Linkage::System => write!(f, "System"),
        }
    }
}

/// How a function accepts a variable number of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variadic {
    #[default]
    None,

    /// C-style `...`, the extra arguments are read through a `va_list`.
    CStyle,

    /// Variadic with the dynamic type information passed alongside.
    TypeSafe,
}

/// The storage class of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamStorage {
    /// Passed by value.
    #[default]
    Value,

    /// `ref`, passed as a pointer to the caller's value.
    Ref,

    /// `out`, like `ref` but initialised by the callee.
    Out,

    /// `lazy`, the argument is evaluated by calling a delegate.
    Lazy,
}

impl ParamStorage {
    /// Whether the parameter is passed as a pointer to the argument.
    pub fn is_ref(self) -> bool {
        matches!(self, ParamStorage::Ref | ParamStorage::Out)
    }
}

/// A formal parameter of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub ty: TyId,
    pub storage: ParamStorage,
}

impl Param {
    pub fn new(ty: TyId) -> Self {
        Self { ty, storage: ParamStorage::Value }
    }

    pub fn with_storage(ty: TyId, storage: ParamStorage) -> Self {
        Self { ty, storage }
    }
}

/// The type of a function to be lowered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnSig {
    /// The explicit parameters, excluding any hidden ones.
    pub params: Vec<Param>,

    /// The return type.
    pub ret: TyId,

    /// The function returns by `ref`, the value is a pointer.
    pub ret_by_ref: bool,

    pub linkage: Linkage,

    pub variadic: Variadic,

    /// The function is a member function and takes a `this` pointer.
    pub needs_this: bool,

    /// The function is nested and takes a context pointer.
    pub is_nested: bool,

    /// The function is an Objective-C method and takes a selector.
    pub is_objc_method: bool,
}

impl FnSig {
    /// Create a new free function signature without any parameters.
    pub fn new(ret: TyId, linkage: Linkage) -> Self {
        Self {
            params: Vec::new(),
            ret,
            ret_by_ref: false,
            linkage,
            variadic: Variadic::None,
            needs_this: false,
            is_nested: false,
            is_objc_method: false,
        }
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_variadic(mut self, variadic: Variadic) -> Self {
        self.variadic = variadic;
        self
    }

    pub fn with_this(mut self) -> Self {
        self.needs_this = true;
        self
    }

    pub fn with_context(mut self) -> Self {
        self.is_nested = true;
        self
    }

    pub fn is_c_variadic(&self) -> bool {
        self.variadic == Variadic::CStyle
    }
}
