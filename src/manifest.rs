//! Manifest handling: which files to convert and where the output goes.
//!
//! A manifest lists one base path per line. Entries may already carry the
//! input suffix (a manifest produced by `find . -name '*.param'` does), so
//! everything from the first occurrence of the suffix onward is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::configuration::Settings;
use crate::errors::{ConvertError, Result};

/// One file to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// The manifest entry without its suffix
    pub base: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConversionJob {
    pub fn new(base: &str, settings: &Settings) -> Self {
        Self {
            base: base.to_string(),
            input: PathBuf::from(format!("{}{}", base, settings.input_suffix)),
            output: PathBuf::from(format!("{}{}", base, settings.output_suffix)),
        }
    }
}

/// Reduces a manifest entry to its base path. Returns `None` for blank lines.
pub fn base_path<'a>(entry: &'a str, input_suffix: &str) -> Option<&'a str> {
    let entry = entry.trim();
    let base = match entry.split_once(input_suffix) {
        Some((base, _)) => base,
        None => entry,
    };
    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}

/// Parses manifest text into base paths, keeping manifest order.
pub fn parse_manifest(text: &str, input_suffix: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| base_path(line, input_suffix))
        .map(str::to_string)
        .collect()
}

pub fn read_manifest(path: &Path, input_suffix: &str) -> Result<Vec<String>> {
    debug!("Reading manifest from: {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| ConvertError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    let bases = parse_manifest(&text, input_suffix);
    debug!("Manifest lists {} file(s)", bases.len());
    Ok(bases)
}

/// Builds the jobs for a list of base paths or manifest entries.
pub fn jobs<S: AsRef<str>>(entries: &[S], settings: &Settings) -> Vec<ConversionJob> {
    entries
        .iter()
        .filter_map(|entry| base_path(entry.as_ref(), &settings.input_suffix))
        .map(|base| ConversionJob::new(base, settings))
        .collect()
}

/// Finds every file under `root` whose name ends with `input_suffix`.
/// Directories are visited in name order so the result is stable, and
/// symbolic links to directories are not followed.
pub fn discover(root: &Path, input_suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    visit(root, input_suffix, &mut found)?;
    Ok(found)
}

fn visit(dir: &Path, input_suffix: &str, found: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| {
            let entry = entry?;
            Ok((entry.path(), entry.file_type()?))
        })
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (path, file_type) in entries {
        // file_type does not follow symlinks: linked directories are never
        // walked, linked files are matched by name like any other
        if file_type.is_dir() {
            visit(&path, input_suffix, found)?;
        } else if path
            .file_name()
            .map_or(false, |name| name.to_string_lossy().ends_with(input_suffix))
        {
            trace!("Found {}", path.display());
            found.push(path);
        }
    }
    Ok(())
}

/// Renders paths as manifest text, one per line.
pub fn render_manifest(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("{}\n", path.display()))
        .collect()
}
