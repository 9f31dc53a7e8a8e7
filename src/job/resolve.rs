//! Turns a `ConversionTarget` into concrete input/output file pairs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::image_pipeline::{ConversionError, Result};
use crate::job::types::{CONTAINER_EXTENSION, ConversionMode, ConversionTarget, RAW_EXTENSION, ResolvedUnit};

/// True when `path` carries the raw extension, in any letter case.
pub fn is_raw_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(RAW_EXTENSION))
}

fn output_in_dir(dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(CONTAINER_EXTENSION);
    dir.join(name)
}

/// Output path for single-file mode.
///
/// - no output: the input with its extension swapped, in the input's directory
/// - an existing directory: that directory plus the input's stem
/// - anything else: used verbatim
pub fn resolve_single_output(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        None => input.with_extension(CONTAINER_EXTENSION),
        Some(out) if out.is_dir() => output_in_dir(out, input),
        Some(out) => out.to_path_buf(),
    }
}

/// Raw files directly inside `dir`, sorted by name.
pub fn discover_raw_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_raw_file(path))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Resolves every unit of a job. Batch mode creates the output directory.
pub fn resolve_units(target: &ConversionTarget) -> Result<Vec<ResolvedUnit>> {
    match target.mode {
        ConversionMode::Single => {
            if !target.path.is_file() {
                return Err(ConversionError::InvalidTarget(format!(
                    "{} is not a file",
                    target.path.display()
                )));
            }
            Ok(vec![ResolvedUnit {
                input_file: target.path.clone(),
                output_file: resolve_single_output(&target.path, target.output_path.as_deref()),
            }])
        }
        ConversionMode::Batch => {
            let input_dir = &target.path;
            if !input_dir.is_dir() {
                return Err(ConversionError::InvalidTarget(format!(
                    "batch mode requires a directory, got {}",
                    input_dir.display()
                )));
            }

            let output_dir = target.output_path.as_deref().unwrap_or(input_dir);
            fs::create_dir_all(output_dir).map_err(|e| ConversionError::OutputPathError {
                file: output_dir.display().to_string(),
                reason: e.to_string(),
            })?;

            let files = discover_raw_files(input_dir)?;
            if files.is_empty() {
                return Err(ConversionError::NoInputFiles(input_dir.display().to_string()));
            }
            debug!(count = files.len(), dir = %input_dir.display(), "Discovered raw files");

            Ok(files
                .into_iter()
                .map(|input_file| ResolvedUnit {
                    output_file: output_in_dir(output_dir, &input_file),
                    input_file,
                })
                .collect())
        }
    }
}
