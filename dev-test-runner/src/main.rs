//! Regenerates every fixture twice and round-trips its samples through the interpreter.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use json_msggen::description::Description;
use json_msggen::eval;
use json_msggen::lower::lower;
use json_msggen::path_de::from_slice_with_path;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures/*.json");

fn main() -> ExitCode {
    let pattern = std::env::args().nth(1).unwrap_or_else(|| FIXTURES.to_owned());
    let paths: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(error) => {
            eprintln!("{} bad pattern {pattern}: {error}", "✗".red());
            return ExitCode::FAILURE;
        }
    };
    if paths.is_empty() {
        eprintln!("{} no fixtures match {pattern}", "✗".red());
        return ExitCode::FAILURE;
    }

    let mut failed = 0;
    for path in &paths {
        match run_fixture(path) {
            Ok(samples) => eprintln!("{} {} ({samples} samples)", "✓".green(), path.display()),
            Err(error) => {
                failed += 1;
                eprintln!("{} {}: {error:#}", "✗".red(), path.display());
            }
        }
    }
    eprintln!("{} fixtures, {} failed", paths.len(), failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run_fixture(path: &Path) -> Result<usize> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let description: Description = from_slice_with_path(&bytes).context("failed to parse description")?;

    // Lower twice: generation seals objects, and determinism has to hold across graphs.
    let first = lower(&description).and_then(|s| s.generate()).context("first generation failed")?;
    let schema = lower(&description).context("invalid schema")?;
    let second = schema.generate().context("second generation failed")?;
    if first != second {
        bail!("generated code differs between runs");
    }

    for (index, sample) in schema.samples.iter().enumerate() {
        let node = schema.get(&sample.type_name)?;
        let datum = eval::decode(node, &sample.value, &sample.type_name)
            .with_context(|| format!("sample #{index}: decode"))?;
        let encoded = eval::encode(node, &datum, &sample.type_name)
            .with_context(|| format!("sample #{index}: encode"))?;
        if encoded != sample.value {
            bail!("sample #{index}: re-encoded as {encoded}");
        }
    }
    Ok(schema.samples.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_pass() {
        let lsp = Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures/lsp.json");
        assert_eq!(run_fixture(&lsp).unwrap(), 7);
    }

    #[test]
    fn failures_keep_their_context() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, r#"{"types": [{"kind": "object", "name": "A", "fields": 1}]}"#).unwrap();
        let message = format!("{:#}", run_fixture(&broken).unwrap_err());
        assert!(message.starts_with("failed to parse description: at JSON path types[0]"), "{message}");

        let missing = dir.path().join("missing.json");
        let message = format!("{:#}", run_fixture(&missing).unwrap_err());
        assert!(message.starts_with("failed to read "), "{message}");
    }
}
