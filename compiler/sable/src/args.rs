//! Sable compiler arguments management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// CompilerOptions is a structural representation of what arguments the
/// compiler can take when running.
#[derive(Parser)]
#[clap(
    name = "Sable",
    version,
    author = "The Sable authors",
    about = "Lower function signatures into the calling conventions of native targets"
)]
#[clap(disable_colored_help = true)]
pub(crate) struct CompilerOptions {
    /// Run the compiler in debug mode
    #[clap(short, long)]
    pub(crate) debug: bool,

    /// Set a `key=value` configuration option, e.g. `-C print-unwind-kind`
    #[clap(short = 'C', long = "option")]
    pub(crate) options: Vec<String>,

    /// Compiler mode
    #[clap(subcommand)]
    pub(crate) mode: SubCmd,
}

#[derive(Subcommand, Clone)]
pub(crate) enum SubCmd {
    Abi(AbiMode),
}

/// Lower the functions of a signature manifest and print their native
/// signatures
#[derive(Args, Clone)]
pub(crate) struct AbiMode {
    /// The target triple to lower for, the host if omitted
    #[clap(short, long)]
    pub(crate) target: Option<String>,

    /// Path to the JSON signature manifest
    #[clap(required = true)]
    pub(crate) manifest: PathBuf,
}
