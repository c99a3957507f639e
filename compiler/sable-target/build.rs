//! Export the triple of the target that the compiler itself is being built
//! for, so that the host [Target] can be described without probing the
//! running system.

use std::env;

macro_rules! export_variable {
    ($name:ident, $value:expr) => {
        println!("cargo:rustc-env={}={}", stringify!($name), $value);
    };
}

fn main() {
    let target = env::var("TARGET").unwrap_or_else(|_| String::from("unknown-unknown-unknown"));
    export_variable!(TARGET_TRIPLE, target);

    // Re-run whenever the compilation target changes.
    println!("cargo:rerun-if-env-changed=TARGET")
}
