use std::{env, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let crate_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let shim = crate_dir.join("csrc").join("retro_log.c");
    println!("cargo:rerun-if-changed={}", shim.display());

    let mut build = cc::Build::new();
    build.file(&shim);
    build.warnings(true);
    build.flag_if_supported("-std=c11");

    build.compile("nova_retro_log");
}
