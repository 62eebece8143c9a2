use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/c_api.rs");

    if env::var_os("CARGO_FEATURE_C_API").is_none() {
        return;
    }

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => dir,
        Err(_) => return,
    };
    let include_dir = PathBuf::from(&crate_dir).join("include");
    let header_path = include_dir.join("ply_reader.h");

    if let Err(err) = std::fs::create_dir_all(&include_dir) {
        println!("cargo:warning=Could not create {}: {}", include_dir.display(), err);
        return;
    }

    // Header generation is best-effort; the Rust crate builds without it.
    let bindings = match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_include_guard("PLY_READER_H")
        .with_language(cbindgen::Language::C)
        .with_sys_include("stddef.h")
        .with_sys_include("stdint.h")
        .with_sys_include("stdbool.h")
        .with_header("// GENERATED FILE -- DO NOT EDIT")
        .generate()
    {
        Ok(bindings) => bindings,
        Err(err) => {
            println!("cargo:warning=Skipping C header generation: {}", err);
            return;
        }
    };

    if !bindings.write_to_file(&header_path) {
        println!("cargo:warning=C header unchanged at: {}", header_path.display());
    }

    println!("cargo:include={}", include_dir.display());
}
