//! LLVM data layout strings of the architectures the compiler knows about.
//! Every [Target] derives its [TargetDataLayout] from one of these.
//!
//! [Target]: crate::Target
//! [TargetDataLayout]: crate::data_layout::TargetDataLayout

use target_lexicon::{Endianness, PointerWidth, Triple};

use crate::TargetArch;

/// Select the data layout string for the given architecture and triple.
pub(crate) fn llvm_data_layout(arch: TargetArch, triple: &Triple) -> &'static str {
    let big_endian = matches!(triple.endianness(), Ok(Endianness::Big));
    let windows = matches!(triple.operating_system, target_lexicon::OperatingSystem::Windows);

    match arch {
        TargetArch::X86_64 if windows => {
            "e-m:w-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128"
        }
        TargetArch::X86_64 => {
            "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128"
        }
        TargetArch::X86 if windows => {
            "e-m:x-p:32:32-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:32-n8:16:32-a:0:32-S32"
        }
        TargetArch::X86 => {
            "e-m:e-p:32:32-p270:32:32-p271:32:32-p272:64:64-i128:128-f64:32:64-f80:32-n8:16:32-S128"
        }
        TargetArch::AArch64 if big_endian => "E-m:e-i8:8:32-i16:16:32-i64:64-i128:128-n32:64-S128",
        TargetArch::AArch64 => "e-m:e-i8:8:32-i16:16:32-i64:64-i128:128-n32:64-S128",
        TargetArch::Arm if big_endian => "E-m:e-p:32:32-Fi8-i64:64-v128:64:128-a:0:32-n32-S64",
        TargetArch::Arm => "e-m:e-p:32:32-Fi8-i64:64-v128:64:128-a:0:32-n32-S64",
        TargetArch::Mips if big_endian => "E-m:m-p:32:32-i8:8:32-i16:16:32-i64:64-n32-S64",
        TargetArch::Mips => "e-m:m-p:32:32-i8:8:32-i16:16:32-i64:64-n32-S64",
        TargetArch::Mips64 if big_endian => "E-m:e-i8:8:32-i16:16:32-i64:64-n32:64-S128",
        TargetArch::Mips64 => "e-m:e-i8:8:32-i16:16:32-i64:64-n32:64-S128",
        TargetArch::RiscV64 => "e-m:e-p:64:64-i64:64-i128:128-n32:64-S128",
        TargetArch::PowerPC => "E-m:e-p:32:32-Fn32-i64:64-n32",
        TargetArch::PowerPC64 => "E-m:e-Fn32-i64:64-n32:64-S128-v256:256:256-v512:512:512",
        TargetArch::PowerPC64Le => "e-m:e-Fn32-i64:64-n32:64-S128-v256:256:256-v512:512:512",
        TargetArch::LoongArch64 => "e-m:e-p:64:64-i64:64-i128:128-n32:64-S128",
        TargetArch::Wasm32 => "e-m:e-p:32:32-p10:8:8-p20:8:8-i64:64-n32:64-S128-ni:1:10:20",
        TargetArch::Wasm64 => "e-m:e-p:64:64-p10:8:8-p20:8:8-i64:64-n32:64-S128-ni:1:10:20",

        // Architectures without a dedicated ABI only need the basics right.
        TargetArch::Unknown => match (triple.pointer_width(), big_endian) {
            (Ok(PointerWidth::U16), false) => "e-p:16:16-i64:64",
            (Ok(PointerWidth::U16), true) => "E-p:16:16-i64:64",
            (Ok(PointerWidth::U32), false) => "e-p:32:32-i64:64",
            (Ok(PointerWidth::U32), true) => "E-p:32:32-i64:64",
            (_, false) => "e-i64:64",
            (_, true) => "E-i64:64",
        },
    }
}
