//! Batch driver behind the `convert` and `scan` subcommands.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use tracing::{debug, info, warn};

use crate::configuration::Settings;
use crate::converter::{ConvertStats, Converter};
use crate::errors::{ConvertError, Result};
use crate::manifest::{self, ConversionJob};

/// What happened to each file of a batch, in manifest order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub converted: Vec<(ConversionJob, ConvertStats)>,
    pub skipped: Vec<(ConversionJob, ConvertError)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.converted.len() + self.skipped.len()
    }
}

/// Converts one file. The destination is only created once the source has
/// been opened, and both handles are closed before returning.
pub fn convert_file(job: &ConversionJob, settings: &Settings) -> Result<ConvertStats> {
    let source =
        File::open(&job.input).map_err(|e| ConvertError::source_open(&job.input, e))?;
    let destination =
        File::create(&job.output).map_err(|e| ConvertError::destination_open(&job.output, e))?;

    debug!("{} -> {}", job.input.display(), job.output.display());
    let converter = Converter::new(BufWriter::new(destination), &job.base, settings.dialect)?;
    let (_, stats) = converter.convert(BufReader::new(source))?;
    Ok(stats)
}

/// Converts every job in order. Files that fail are reported and skipped;
/// the rest of the batch still runs.
pub fn convert_command(jobs: &[ConversionJob], settings: &Settings) -> RunSummary {
    let mut summary = RunSummary::default();

    for job in jobs {
        match convert_file(job, settings) {
            Ok(stats) => {
                info!(
                    "{}: {} block(s), {} field(s), {} comment(s)",
                    job.base, stats.blocks, stats.fields, stats.comments
                );
                println!("{} {}", job.base, "done.".green());
                summary.converted.push((job.clone(), stats));
            }
            Err(err) if err.is_skippable() => {
                warn!(category = err.category(), "{}", err);
                let path = err.path().unwrap_or(&job.input);
                eprintln!(
                    "{}",
                    format!("Cannot open {}. Skipping.", path.display()).yellow()
                );
                summary.skipped.push((job.clone(), err));
            }
            Err(err) => {
                warn!(category = err.category(), "{}", err);
                eprintln!("{}", format!("{}: {}. Skipping.", job.base, err).yellow());
                summary.skipped.push((job.clone(), err));
            }
        }
    }

    println!(
        "{} converted, {} skipped",
        summary.converted.len().to_string().green(),
        summary.skipped.len().to_string().yellow()
    );
    summary
}

/// Lists the param files under `root` as a manifest, printing it or writing
/// it to `output`. Returns how many files were found.
pub fn scan_command(
    root: &Path,
    settings: &Settings,
    output: Option<&Path>,
) -> anyhow::Result<usize> {
    let found = manifest::discover(root, &settings.input_suffix)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    let text = manifest::render_manifest(&found);

    match output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
            info!("Wrote {} entries to {}", found.len(), path.display());
        }
        None => print!("{}", text),
    }
    Ok(found.len())
}
