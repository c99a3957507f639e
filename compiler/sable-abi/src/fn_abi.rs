//! The lowered form of a function type: how the return value and every
//! parameter are passed, which attributes they carry and which rewrite moves
//! them between their source and native representations.

use std::fmt;

use bitflags::bitflags;
use itertools::Itertools;
use sable_types::{sig::Linkage, ty::TyId};
use sable_utils::ice;

use crate::{cx::AbiCx, rewrite::Rewrite, ty::NativeTy};

bitflags! {
    /// Attributes of a parameter or return value in the native function type.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ArgAttributeFlag: u16 {
        /// The pointer refers to a copy of the argument which the callee owns.
        const BY_VAL = 1 << 0;

        /// The pointer refers to the memory that the return value is written to.
        const STRUCT_RET = 1 << 1;

        /// The value is passed in a register rather than on the stack.
        const IN_REG = 1 << 2;

        const NO_ALIAS = 1 << 3;

        /// The callee does not keep the pointer beyond the call.
        const NO_CAPTURE = 1 << 4;

        const NON_NULL = 1 << 5;

        const NO_UNDEF = 1 << 6;

        const READ_ONLY = 1 << 7;

        /// The pointer is the static chain of a nested function.
        const NEST = 1 << 8;
    }
}

/// How an integer smaller than a register is widened.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgExtension {
    #[default]
    None,
    ZeroExtend,
    SignExtend,
}

/// The attributes of a single parameter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgAttributes {
    flags: ArgAttributeFlag,
    extension: ArgExtension,
}

impl ArgAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, flag: ArgAttributeFlag) -> &mut Self {
        self.flags |= flag;
        self
    }

    pub fn contains(&self, flag: ArgAttributeFlag) -> bool {
        self.flags.contains(flag)
    }

    /// Replace the extension of the value.
    pub fn extend_with(&mut self, extension: ArgExtension) -> &mut Self {
        self.extension = extension;
        self
    }

    pub fn extension(&self) -> ArgExtension {
        self.extension
    }

    /// Drop all flags and the extension.
    pub fn clear(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.extension == ArgExtension::None
    }
}

impl fmt::Display for ArgAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ArgAttributeFlag, &str); 9] = [
            (ArgAttributeFlag::STRUCT_RET, "sret"),
            (ArgAttributeFlag::BY_VAL, "byval"),
            (ArgAttributeFlag::IN_REG, "inreg"),
            (ArgAttributeFlag::NEST, "nest"),
            (ArgAttributeFlag::NO_ALIAS, "noalias"),
            (ArgAttributeFlag::NO_CAPTURE, "nocapture"),
            (ArgAttributeFlag::NON_NULL, "nonnull"),
            (ArgAttributeFlag::NO_UNDEF, "noundef"),
            (ArgAttributeFlag::READ_ONLY, "readonly"),
        ];

        let extension = match self.extension {
            ArgExtension::None => None,
            ArgExtension::ZeroExtend => Some("zeroext"),
            ArgExtension::SignExtend => Some("signext"),
        };

        let names = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .chain(extension);

        write!(f, "{}", names.format(" "))
    }
}

/// How a single parameter, or the return value, is passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgAbi {
    /// The source type of the value.
    pub ty: TyId,

    /// The value is passed as a pointer to it.
    pub by_ref: bool,

    pub attributes: ArgAttributes,

    /// The rewrite which converts the value into its native representation.
    rewrite: Option<Rewrite>,

    /// The native type that the value is passed as.
    native_ty: NativeTy,
}

impl ArgAbi {
    pub fn new(cx: &AbiCx, ty: TyId, by_ref: bool, attributes: ArgAttributes) -> Self {
        let native_ty = if by_ref { NativeTy::Ptr } else { cx.lower_ty(ty) };
        Self { ty, by_ref, attributes, rewrite: None, native_ty }
    }

    pub fn rewrite(&self) -> Option<Rewrite> {
        self.rewrite
    }

    pub fn is_rewritten(&self) -> bool {
        self.rewrite.is_some()
    }

    pub fn native_ty(&self) -> &NativeTy {
        &self.native_ty
    }

    /// Change whether the value is passed by reference. The native type is
    /// reset to the direct mapping, so this must happen before a rewrite.
    pub fn set_by_ref(&mut self, cx: &AbiCx, by_ref: bool) {
        if let Some(rewrite) = self.rewrite {
            ice!("cannot change how `{}` is passed after the {rewrite} rewrite", cx.ty_name(self.ty));
        }

        self.by_ref = by_ref;
        self.native_ty = if by_ref { NativeTy::Ptr } else { cx.lower_ty(self.ty) };
    }

    /// Attach a rewrite, freezing the native type.
    pub(crate) fn set_rewrite(&mut self, rewrite: Rewrite, native_ty: NativeTy) {
        self.rewrite = Some(rewrite);
        self.native_ty = native_ty;
    }
}

impl fmt::Display for ArgAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.native_ty)?;

        if !self.attributes.is_empty() {
            write!(f, " {}", self.attributes)?;
        }

        Ok(())
    }
}

/// The calling convention of a native function.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallingConvention {
    /// The platform C convention.
    #[default]
    C,

    /// The callee pops its arguments.
    X86StdCall,

    /// Like [CallingConvention::X86StdCall] with `this` passed in `ECX`.
    X86ThisCall,
}

impl CallingConvention {
    /// The numeric identifier of the convention in LLVM.
    pub fn llvm_id(self) -> u32 {
        match self {
            CallingConvention::C => 0,
            CallingConvention::X86StdCall => 64,
            CallingConvention::X86ThisCall => 70,
        }
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::C => write!(f, "ccc"),
            CallingConvention::X86StdCall => write!(f, "x86_stdcallcc"),
            CallingConvention::X86ThisCall => write!(f, "x86_thiscallcc"),
        }
    }
}

/// The kind of unwind tables that functions are emitted with by default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnwindTableKind {
    #[default]
    None,
    Sync,
    Async,
}

impl fmt::Display for UnwindTableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnwindTableKind::None => write!(f, "none"),
            UnwindTableKind::Sync => write!(f, "sync"),
            UnwindTableKind::Async => write!(f, "async"),
        }
    }
}

/// Argument registers which are still unused.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBudget {
    pub int_regs: u32,
    pub sse_regs: u32,
}

impl RegisterBudget {
    pub fn new(int_regs: u32, sse_regs: u32) -> Self {
        Self { int_regs, sse_regs }
    }

    /// Use up a single integer register if any is left.
    pub fn take_int(&mut self) {
        self.int_regs = self.int_regs.saturating_sub(1);
    }
}

/// A lowered function type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnAbi {
    /// The return value, `void` when it is returned through [FnAbi::arg_sret].
    pub ret: ArgAbi,

    /// The hidden pointer that the return value is written to.
    pub arg_sret: Option<ArgAbi>,

    pub arg_this: Option<ArgAbi>,

    /// The context pointer of a nested function.
    pub arg_nest: Option<ArgAbi>,

    pub arg_objc_selector: Option<ArgAbi>,

    /// The explicit parameters in source order.
    pub args: Vec<ArgAbi>,

    /// The explicit parameters are passed in reverse order.
    pub reverse_params: bool,

    /// `this` is passed before the hidden return pointer.
    pub pass_this_before_sret: bool,

    pub calling_convention: CallingConvention,

    /// The function takes C-style variadic arguments.
    pub c_variadic: bool,

    pub linkage: Linkage,

    pub unwind_table_kind: UnwindTableKind,

    /// The registers that are left after the fixed parameters, which is
    /// where the variadic arguments of a call continue from.
    pub register_budget: RegisterBudget,
}

impl FnAbi {
    /// The hidden and explicit parameters in the order that they appear in
    /// the native function type.
    pub fn native_params(&self) -> Vec<&ArgAbi> {
        let (first, second) = match self.pass_this_before_sret {
            true => (&self.arg_this, &self.arg_sret),
            false => (&self.arg_sret, &self.arg_this),
        };

        let hidden = [first, second, &self.arg_nest, &self.arg_objc_selector]
            .into_iter()
            .filter_map(Option::as_ref);

        match self.reverse_params {
            true => hidden.chain(self.args.iter().rev()).collect(),
            false => hidden.chain(self.args.iter()).collect(),
        }
    }
}

impl fmt::Display for FnAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.native_params();
        write!(f, "{} {} ({}", self.calling_convention, self.ret, params.iter().format(", "))?;

        if self.c_variadic {
            let separator = if params.is_empty() { "" } else { ", " };
            write!(f, "{separator}...")?;
        }

        write!(f, ")")
    }
}
