//! threemf-merge - merge colored 3MF meshes into one 3MF model
//!
//! Reads source filenames from stdin, one per line, and writes the merged
//! model to the output path given on the command line.

use clap::Parser;
use clap::error::ErrorKind;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use threemf_merge::{
    ColorSpecError, Error, FileOutcome, MergeConfig, Merger, ObjectKind, Reporter, ResourceId,
    Result,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Merge 3MF files named on stdin into one colored 3MF model
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path of the merged 3MF file; must not exist yet
    #[arg(value_name = "OUTPUT_FILE")]
    output: PathBuf,

    /// Use filename colors as given instead of encoding them to sRGB
    #[arg(long)]
    linear_colors: bool,

    /// Do not attach Metadata/model_settings.config
    #[arg(long)]
    no_model_settings: bool,

    /// Do not name merged objects after their filename color
    #[arg(long)]
    no_component_names: bool,
}

impl Cli {
    fn merge_config(&self) -> MergeConfig {
        MergeConfig::new()
            .with_srgb_encoding(!self.linear_colors)
            .with_model_settings(!self.no_model_settings)
            .with_component_names(!self.no_component_names)
    }
}

/// Prints merge events the way users of the tool expect them
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn color_rejected(&mut self, line: &str, error: &ColorSpecError) {
        let _ = writeln!(io::stderr().lock(), "Not coloring '{}': {}", line, error);
    }

    fn object_skipped(&mut self, line: &str, object_id: ResourceId, kind: ObjectKind) {
        let what = match kind {
            ObjectKind::Components => "component",
            _ => "unknown",
        };
        // A closed stdout must not end the run
        let _ = writeln!(
            io::stdout().lock(),
            "{}: skipping {} object #{}",
            line,
            what,
            object_id
        );
    }

    fn file_skipped(&mut self, line: &str, error: &Error) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "Trouble while processing '{}': {}", line, error);
        let _ = writeln!(stderr, "Will skip this file/color, and proceed anyway.");
    }
}

fn print_usage() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "threemf-merge".to_string());
    eprintln!("Usage: {} OUTPUT_FILE", program);
    eprintln!("A list of filenames is read from stdin; these must be .3mf files.");
    eprintln!(
        "After loading each file, its mesh gets assigned a color based on the filename; and finally, all the"
    );
    eprintln!("meshes are merged into one model, which is saved as OUTPUT_FILE.");
    eprintln!("OUTPUT_FILE must not yet exist.");
    eprintln!("Example input line (filename): '[1, 0, 0.5, 0.9].3mf'.");
    eprintln!("This would result in a color assignment of r=1, g=0, b=0.5, alpha=0.9.");
}

/// Merge every file named on stdin and return the number of skipped files
fn run(cli: &Cli) -> Result<usize> {
    if cli.output.exists() {
        return Err(Error::OutputExists(cli.output.clone()));
    }

    let mut merger = Merger::new(cli.merge_config());
    let mut reporter = ConsoleReporter;
    let mut stdin = io::stdin().lock();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if stdin.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let bytes = strip_line_end(&raw);
        match std::str::from_utf8(bytes) {
            Ok(line) => merger.merge_file(line, &mut reporter),
            Err(_) => merge_non_utf8(&mut merger, bytes, &mut reporter),
        };
    }

    let merged = merger.finish()?;
    merged.model.write_to_file(&cli.output)?;
    Ok(merged.skipped)
}

/// The line without its `\n` and any trailing `\r`
fn strip_line_end(raw: &[u8]) -> &[u8] {
    let mut line = raw.strip_suffix(b"\n").unwrap_or(raw);
    while let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    line
}

/// Open a filename that is not UTF-8 by its raw bytes
#[cfg(unix)]
fn merge_non_utf8(
    merger: &mut Merger,
    bytes: &[u8],
    reporter: &mut dyn Reporter,
) -> FileOutcome {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    let line = String::from_utf8_lossy(bytes);
    merger.merge_path(&line, Path::new(OsStr::from_bytes(bytes)), reporter)
}

#[cfg(not(unix))]
fn merge_non_utf8(
    merger: &mut Merger,
    bytes: &[u8],
    reporter: &mut dyn Reporter,
) -> FileOutcome {
    let line = String::from_utf8_lossy(bytes);
    let error = io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8");
    merger.skip_file(&line, Error::Io(error), reporter)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            print_usage();
            return ExitCode::from(1);
        }
    };

    // Contractual messages go through the reporter; logs are opt-in via RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(skipped) => {
            eprintln!("Warning: {} input files were skipped!", skipped);
            ExitCode::from(1)
        }
        Err(err) => {
            tracing::debug!(code = err.code(), "aborting");
            eprintln!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
