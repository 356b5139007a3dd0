use anyhow::{bail, Context};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use param2json::commands;
use param2json::configuration::Settings;
use param2json::converter::Dialect;
use param2json::manifest;
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::path::PathBuf;

/// Convert legacy .param parameter files into JSON.
#[derive(Parser)]
#[clap(author, version = clap::crate_version!(), max_term_width = 100, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Increase logging level (-v: info, -vv: debug, -vvv: trace)
    #[clap(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Path to a config file (TOML)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts param files to JSON
    Convert {
        /// Base paths to convert; the manifest is read when none are given
        paths: Vec<String>,

        /// Manifest listing one base path per line
        #[clap(short, long, conflicts_with = "paths")]
        manifest: Option<PathBuf>,

        /// Output rendering
        #[clap(long, value_enum)]
        dialect: Option<Dialect>,

        /// Suffix appended to each base path to find the source
        #[clap(long)]
        input_suffix: Option<String>,

        /// Suffix appended to each base path to name the output
        #[clap(long)]
        output_suffix: Option<String>,

        /// Exit with an error if any file was skipped
        #[clap(long)]
        fail_on_skip: bool,
    },
    /// Lists param files under a directory as a manifest
    Scan {
        /// Directory to search
        #[clap(default_value = ".")]
        dir: PathBuf,

        /// Write the manifest to a file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn init_logging(verbose: u8) -> Result<(), anyhow::Error> {
    let log_level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "param2json", &mut std::io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose)?;
    debug!("Argument parsing complete.");

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Convert {
            paths,
            manifest: manifest_path,
            dialect,
            input_suffix,
            output_suffix,
            fail_on_skip,
        } => {
            if let Some(dialect) = dialect {
                settings.dialect = dialect;
            }
            if let Some(suffix) = input_suffix {
                settings.input_suffix = suffix;
            }
            if let Some(suffix) = output_suffix {
                settings.output_suffix = suffix;
            }
            settings.validate()?;

            let entries = if paths.is_empty() {
                let path = manifest_path.unwrap_or_else(|| settings.manifest.clone());
                manifest::read_manifest(&path, &settings.input_suffix)?
            } else {
                paths
            };
            let jobs = manifest::jobs(&entries, &settings);
            info!("Converting {} file(s) as {:?}", jobs.len(), settings.dialect);

            let summary = commands::convert_command(&jobs, &settings);
            if fail_on_skip && !summary.skipped.is_empty() {
                bail!("{} of {} file(s) skipped", summary.skipped.len(), summary.total());
            }
        }
        Commands::Scan { dir, output } => {
            let count = commands::scan_command(&dir, &settings, output.as_deref())?;
            debug!("scan found {} file(s)", count);
        }
        Commands::Completions { shell: _ } => {
            // This is handled earlier in the function
            unreachable!("Completions should be handled before this point");
        }
    }

    Ok(())
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
