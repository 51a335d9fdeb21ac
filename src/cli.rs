//! Command line: description files → (generated Rust | sample check | one-off decode)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, info};

use crate::codegen::prelude;
use crate::description::Description;
use crate::eval;
use crate::lower::{Schema, lower};
use crate::path_de::from_slice_with_path;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate serde_json encoders/decoders from a declarative message schema
#[derive(Parser, Debug)]
#[command(name = "json-msggen", version)]
pub struct CommandLineInterface {
    /// tracing filter, e.g. `debug` or `json_msggen::codegen=trace` (overrides JSON_MSGGEN_LOG)
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit Rust declarations and definitions
    Generate(GenerateOut),
    /// lower, generate in memory and round-trip every sample
    Check(CheckArgs),
    /// decode one wire value with the interpreter and print it re-encoded
    Decode(DecodeArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more description files. May be literal paths or quoted glob patterns.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .rs file holding both streams (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// write the declaration stream to its own file
    #[arg(long, requires = "definitions")]
    declarations: Option<PathBuf>,

    /// write the definition stream to its own file
    #[arg(long, requires = "declarations")]
    definitions: Option<PathBuf>,

    /// module path generated code imports the runtime from
    #[arg(long, default_value = "json_msggen::runtime")]
    runtime_path: String,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct DecodeArgs {
    #[command(flatten)]
    input_settings: InputSettings,

    /// name of the type to decode as
    #[arg(long = "type")]
    type_name: String,

    /// file holding the wire JSON value
    #[arg(long)]
    value: PathBuf,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Reads every input and merges them into one description, so types may refer
    /// across files.
    fn load_schema(&self) -> Result<Schema> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut merged = Description { types: Vec::new(), emit: None, samples: Vec::new() };
        for source_path in source_paths {
            let description = load_description(&source_path)?;
            debug!(path = %source_path.display(), types = description.types.len(), "loaded description");
            merged.types.extend(description.types);
            if let Some(emit) = description.emit {
                merged.emit.get_or_insert_with(Vec::new).extend(emit);
            }
            merged.samples.extend(description.samples);
        }
        lower(&merged).context("invalid schema")
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let schema = target.input_settings.load_schema()?;
                let code = schema.generate().context("code generation failed")?;
                match (&target.declarations, &target.definitions) {
                    (Some(declarations), Some(definitions)) => {
                        write_output(declarations, &format!("{}\n{}", prelude(&target.runtime_path), code.declarations))?;
                        write_output(definitions, &format!("// @generated by json-msggen. Do not edit.\n\n{}", code.definitions))?;
                    }
                    _ => {
                        let combined = code.combined(&target.runtime_path);
                        match target.out.as_ref() {
                            Some(out) => write_output(out, &combined)?,
                            None => print!("{combined}"),
                        }
                    }
                }
                info!(types = schema.types.len(), "generation finished");
                Ok(())
            }
            Command::Check(target) => {
                let schema = target.input_settings.load_schema()?;
                schema.generate().context("code generation failed")?;
                let failures = check_samples(&schema);
                if failures > 0 {
                    bail!("{failures} of {} samples failed", schema.samples.len());
                }
                eprintln!("{} {} types, {} samples", "ok".green().bold(), schema.types.len(), schema.samples.len());
                Ok(())
            }
            Command::Decode(target) => {
                let schema = target.input_settings.load_schema()?;
                let node = schema.get(&target.type_name)?;
                let source = std::fs::read(&target.value)
                    .with_context(|| format!("failed to read {}", target.value.display()))?;
                let value: serde_json::Value = serde_json::from_slice(&source)
                    .with_context(|| format!("failed to parse JSON value file ({})", target.value.display()))?;
                let datum = eval::decode(node, &value, &target.type_name)?;
                debug!(?datum, "decoded");
                let encoded = eval::encode(node, &datum, &target.type_name)?;
                println!("{}", serde_json::to_string_pretty(&encoded)?);
                Ok(())
            }
        }
    }
}

/// Decodes each sample, re-encodes it and decodes that again; both decodes must agree.
/// Returns the number of failed samples.
fn check_samples(schema: &Schema) -> usize {
    let mut failures = 0;
    for (index, sample) in schema.samples.iter().enumerate() {
        let label = format!("{} sample #{index}", sample.type_name);
        match round_trip(schema, &sample.type_name, &sample.value) {
            Ok(encoded) if encoded == sample.value => eprintln!("{} {label}", "✓".green()),
            Ok(_) => eprintln!("{} {label} (normalized on re-encode)", "✓".yellow()),
            Err(error) => {
                failures += 1;
                eprintln!("{} {label}: {error:#}", "✗".red());
            }
        }
    }
    failures
}

fn round_trip(schema: &Schema, type_name: &str, value: &serde_json::Value) -> Result<serde_json::Value> {
    let node = schema.get(type_name)?;
    let datum = eval::decode(node, value, type_name)?;
    let encoded = eval::encode(node, &datum, type_name)?;
    let again = eval::decode(node, &encoded, type_name)?;
    if again != datum {
        return Err(anyhow!("re-encoded value decodes differently: {encoded}"));
    }
    Ok(encoded)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_description(path: &Path) -> Result<Description> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read source file ({})", path.display()))?;
    from_slice_with_path(&bytes).with_context(|| format!("failed to parse description ({})", path.display()))
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)
                .with_context(|| format!("bad glob pattern: {pattern}"))?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                bail!("glob pattern matched no files: {pattern}");
            }
            // glob yields alphabetical order already; keep it explicit for reproducible merges
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
    }

    #[test]
    fn empty_globs_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.json", dir.path().display());
        assert!(resolve_file_path_patterns([pattern]).is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = CommandLineInterface::try_parse_from([
            "json-msggen", "--log-filter", "debug", "decode", "-i", "a.json", "--type", "Msg", "--value", "v.json",
        ])
        .unwrap();
        assert_eq!(cli.log_filter.as_deref(), Some("debug"));
        assert!(matches!(cli.cmd, Command::Decode(DecodeArgs { ref type_name, .. }) if type_name == "Msg"));
    }
}
