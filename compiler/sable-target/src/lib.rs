//! Definitions to describe the target of a Sable compilation: the target
//! triple, the architecture family that selects a calling convention, and the
//! data layout that sizes every primitive.

pub mod abi;
pub mod alignment;
pub mod data_layout;
pub mod primitives;
pub mod size;
mod targets;

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
pub use target_lexicon::Triple;
use target_lexicon::{Architecture, Environment, OperatingSystem, Vendor};

use crate::{
    data_layout::{Endian, HasDataLayout, TargetDataLayout, TargetDataLayoutParseError},
    primitives::FloatTy,
    size::Size,
};

/// The triple of the system that the compiler was built for.
pub const HOST_TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");

/// The architecture families that the compiler distinguishes between when
/// lowering calling conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetArch {
    /// 32-bit x86.
    X86,

    /// 64-bit x86.
    X86_64,

    /// 32-bit ARM and Thumb, either endianness.
    Arm,

    /// 64-bit ARM, either endianness.
    AArch64,

    /// 32-bit MIPS, either endianness.
    Mips,

    /// 64-bit MIPS, either endianness.
    Mips64,

    /// 64-bit RISC-V.
    RiscV64,

    /// 32-bit big-endian PowerPC.
    PowerPC,

    /// 64-bit big-endian PowerPC.
    PowerPC64,

    /// 64-bit little-endian PowerPC (ELFv2).
    PowerPC64Le,

    /// 64-bit LoongArch.
    LoongArch64,

    /// 32-bit WebAssembly.
    Wasm32,

    /// 64-bit WebAssembly.
    Wasm64,

    /// Used for when the architecture is not known, but can
    /// still be compiled for.
    Unknown,
}

impl TargetArch {
    /// Classify a [target_lexicon] architecture.
    pub fn from_architecture(architecture: &Architecture) -> Self {
        match architecture {
            Architecture::X86_32(_) => TargetArch::X86,
            Architecture::X86_64 => TargetArch::X86_64,
            Architecture::Arm(_) => TargetArch::Arm,
            Architecture::Aarch64(_) => TargetArch::AArch64,
            Architecture::Mips32(_) => TargetArch::Mips,
            Architecture::Mips64(_) => TargetArch::Mips64,
            Architecture::Riscv64(_) => TargetArch::RiscV64,
            Architecture::Powerpc => TargetArch::PowerPC,
            Architecture::Powerpc64 => TargetArch::PowerPC64,
            Architecture::Powerpc64le => TargetArch::PowerPC64Le,
            Architecture::LoongArch64 => TargetArch::LoongArch64,
            Architecture::Wasm32 => TargetArch::Wasm32,
            Architecture::Wasm64 => TargetArch::Wasm64,
            _ => TargetArch::Unknown,
        }
    }
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetArch::X86 => "x86",
            TargetArch::X86_64 => "x86_64",
            TargetArch::Arm => "arm",
            TargetArch::AArch64 => "aarch64",
            TargetArch::Mips => "mips",
            TargetArch::Mips64 => "mips64",
            TargetArch::RiscV64 => "riscv64",
            TargetArch::PowerPC => "powerpc",
            TargetArch::PowerPC64 => "powerpc64",
            TargetArch::PowerPC64Le => "powerpc64le",
            TargetArch::LoongArch64 => "loongarch64",
            TargetArch::Wasm32 => "wasm32",
            TargetArch::Wasm64 => "wasm64",
            TargetArch::Unknown => "unknown",
        };

        write!(f, "{name}")
    }
}

/// Errors that occur when describing a [Target].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TargetError {
    /// The target triple could not be parsed.
    #[display("invalid target triple `{triple}`: {message}")]
    InvalidTriple { triple: String, message: String },

    /// The data layout for the target is broken.
    #[display("invalid data layout for `{triple}`: {source}")]
    InvalidDataLayout { triple: String, source: TargetDataLayoutParseError },
}

/// The target that the compiler should compile for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// The full target triple.
    triple: Triple,

    /// The architecture family of the triple.
    arch: TargetArch,

    /// The data layout of the target.
    data_layout: TargetDataLayout,
}

impl Target {
    /// Describe the target of the given [Triple].
    pub fn from_triple(triple: Triple) -> Result<Self, TargetError> {
        let arch = TargetArch::from_architecture(&triple.architecture);
        let data_layout =
            TargetDataLayout::parse_from_llvm_data_layout_string(targets::llvm_data_layout(
                arch, &triple,
            ))
            .map_err(|source| TargetError::InvalidDataLayout {
                triple: triple.to_string(),
                source,
            })?;

        Ok(Self { triple, arch, data_layout })
    }

    /// Describe the system that the compiler was built for.
    pub fn host() -> Result<Self, TargetError> {
        let triple = Triple::from_str(HOST_TARGET_TRIPLE).unwrap_or_else(|_| Triple::host());
        Self::from_triple(triple)
    }

    /// Get the [Triple] of the target.
    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    /// Get the architecture family of the target.
    pub fn arch(&self) -> TargetArch {
        self.arch
    }

    /// The [Size] of a pointer on the target.
    pub fn pointer_size(&self) -> Size {
        self.data_layout.pointer_size
    }

    /// Whether pointers on the target are 64 bits wide.
    pub fn is_64_bit(&self) -> bool {
        self.pointer_size().bits() == 64
    }

    /// The byte order of the target.
    pub fn endian(&self) -> Endian {
        self.data_layout.endian
    }

    pub fn is_os_windows(&self) -> bool {
        self.triple.operating_system == OperatingSystem::Windows
    }

    pub fn is_os_linux(&self) -> bool {
        self.triple.operating_system == OperatingSystem::Linux
    }

    pub fn is_os_solaris(&self) -> bool {
        self.triple.operating_system == OperatingSystem::Solaris
    }

    pub fn is_os_netbsd(&self) -> bool {
        self.triple.operating_system == OperatingSystem::Netbsd
    }

    /// Whether the target is one of Apple's platforms.
    pub fn is_apple(&self) -> bool {
        self.triple.vendor == Vendor::Apple
    }

    /// Whether the target uses the Microsoft C runtime environment.
    pub fn is_msvc(&self) -> bool {
        self.triple.environment == Environment::Msvc
    }

    /// Whether floating-point values are passed in floating-point registers.
    pub fn is_hard_float(&self) -> bool {
        match self.arch {
            TargetArch::Arm => self.is_apple() || self.triple.environment.to_string().ends_with("hf"),
            TargetArch::RiscV64 => {
                let name = self.triple.architecture.to_string();
                let extensions = name.trim_start_matches("riscv64");
                extensions.is_empty() || extensions.contains('g') || extensions.contains('d')
            }
            _ => true,
        }
    }

    /// The floating-point type that represents `real` on the target. Only
    /// non-MSVC x86 targets provide the x87 extended precision type.
    pub fn real_float_ty(&self) -> FloatTy {
        match self.arch {
            TargetArch::X86 | TargetArch::X86_64 if !self.is_msvc() => FloatTy::F80,
            _ => FloatTy::F64,
        }
    }
}

impl HasDataLayout for Target {
    fn data_layout(&self) -> &TargetDataLayout {
        &self.data_layout
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(triple: &str) -> Result<Self, Self::Err> {
        let parsed = Triple::from_str(triple).map_err(|err| TargetError::InvalidTriple {
            triple: triple.to_string(),
            message: err.to_string(),
        })?;

        Self::from_triple(parsed)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.triple)
    }
}

/// Holds information about the targets that are used by the compiler.
#[derive(Debug, Clone)]
pub struct TargetInfo {
    /// The target value of the host that the compiler is running
    /// for.
    host: Target,

    /// The target that the compiler is compiling for.
    target: Target,
}

impl TargetInfo {
    /// Create a new target info from the given host and target.
    pub fn new(host: Target, target: Target) -> Self {
        Self { host, target }
    }

    /// Get the target that the compiler is compiling for.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Get the host target that the compiler is running on.
    pub fn host(&self) -> &Target {
        &self.host
    }
}
