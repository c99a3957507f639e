//! Settings that are present on the compiler pipeline when it is launched.

use sable_target::{Target, TargetInfo};

use crate::error::PipelineError;

/// Various settings that are present on the compiler pipeline when initially
/// launching.
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// Whether debugging log statements are enabled.
    pub debug: bool,

    /// The host the compiler runs on and the target it lowers for.
    pub target_info: TargetInfo,

    /// All settings that relate to the calling convention lowering.
    pub abi_settings: AbiSettings,
}

impl CompilerSettings {
    /// Create [CompilerSettings] for the given target, running on the host
    /// that the compiler was built for.
    pub fn new(target: Target) -> Result<Self, PipelineError> {
        let host = Target::host().map_err(PipelineError::InvalidTarget)?;

        Ok(Self {
            debug: false,
            target_info: TargetInfo::new(host, target),
            abi_settings: AbiSettings::default(),
        })
    }

    /// Create [CompilerSettings] which compile for the host.
    pub fn host() -> Result<Self, PipelineError> {
        Self::new(Target::host().map_err(PipelineError::InvalidTarget)?)
    }

    /// Create [CompilerSettings] from a target triple.
    pub fn for_triple(triple: &str) -> Result<Self, PipelineError> {
        let target = triple.parse::<Target>().map_err(PipelineError::InvalidTarget)?;
        Self::new(target)
    }

    /// Get a reference to the current compiled [Target].
    pub fn target(&self) -> &Target {
        self.target_info.target()
    }

    pub fn abi_settings(&self) -> &AbiSettings {
        &self.abi_settings
    }

    pub fn abi_settings_mut(&mut self) -> &mut AbiSettings {
        &mut self.abi_settings
    }

    /// Apply a `key=value` option to the settings.
    pub fn apply_option(&mut self, option: &str) -> Result<(), PipelineError> {
        let (key, value) = option.split_once('=').unwrap_or((option, "true"));
        let flag = parse_bool(key, value)?;

        match key {
            "dump-abi" => self.abi_settings.dump_abi = flag,
            "print-unwind-kind" => self.abi_settings.print_unwind_kind = flag,
            "print-varargs" => self.abi_settings.print_varargs = flag,
            _ => return Err(PipelineError::UnknownOption(key.to_string())),
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, PipelineError> {
    match value {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => Err(PipelineError::InvalidValue(key.to_string(), value.to_string())),
    }
}

/// Settings that control what the lowering reports about each function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiSettings {
    /// Print the lowered descriptor of every function.
    pub dump_abi: bool,

    /// Print the kind of unwind tables that functions get.
    pub print_unwind_kind: bool,

    /// Print the lowering of the variadic arguments of each call site.
    pub print_varargs: bool,
}

impl Default for AbiSettings {
    fn default() -> Self {
        Self { dump_abi: true, print_unwind_kind: false, print_varargs: true }
    }
}
