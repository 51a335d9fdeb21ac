//! Generates Rust for every fixture schema into `OUT_DIR`, so the crate compiles and
//! tests exactly what `json-msggen generate` emits.
use std::path::PathBuf;

use anyhow::{Context, Result};
use json_msggen::description::Description;
use json_msggen::lower::lower;
use json_msggen::path_de::from_slice_with_path;

const FIXTURES: &[&str] = &["lsp"];

fn main() -> Result<()> {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let fixtures_dir = manifest_dir.join("../fixtures");

    for name in FIXTURES {
        let source = fixtures_dir.join(format!("{name}.json"));
        println!("cargo:rerun-if-changed={}", source.display());
        let bytes = std::fs::read(&source).with_context(|| format!("failed to read {}", source.display()))?;
        let description: Description = from_slice_with_path(&bytes)?;
        let code = lower(&description)?.generate()?;
        // The prelude carries inner attributes, which `include!` rejects; lib.rs supplies them.
        let target = out_dir.join(format!("{name}.rs"));
        std::fs::write(&target, format!("{}\n{}", code.declarations, code.definitions))
            .with_context(|| format!("failed to write {}", target.display()))?;
    }
    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
