use std::fmt;
use std::io::{self as stdio, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

use chem_forge::Frame;
use chem_forge::io::{FormatKind, TextFile, Trajectory, TrajectoryBuilder, TrajectoryWriter};

pub mod convert;
pub mod info;

/// Formats accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    /// Protein Data Bank format.
    #[value(name = "pdb")]
    Pdb,
    /// GROMACS GRO format.
    #[value(name = "gro")]
    Gro,
    /// Tripos MOL2 format.
    #[value(name = "mol2")]
    Mol2,
    /// MDL SDF (V2000) format.
    #[value(name = "sdf")]
    Sdf,
    /// Cambridge CSSR format.
    #[value(name = "cssr")]
    Cssr,
    /// LAMMPS data file.
    #[value(name = "lammps")]
    Lammps,
}

impl FileFormat {
    /// Attempts to infer a format from a file path extension, looking through `.gz`.
    pub fn from_path(path: &Path) -> Option<Self> {
        FormatKind::from_path(path).map(Self::from)
    }
}

impl From<FormatKind> for FileFormat {
    fn from(kind: FormatKind) -> Self {
        match kind {
            FormatKind::Pdb => FileFormat::Pdb,
            FormatKind::Gro => FileFormat::Gro,
            FormatKind::Mol2 => FileFormat::Mol2,
            FormatKind::Sdf => FileFormat::Sdf,
            FormatKind::Cssr => FileFormat::Cssr,
            FormatKind::LammpsData => FileFormat::Lammps,
        }
    }
}

impl From<FileFormat> for FormatKind {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Pdb => FormatKind::Pdb,
            FileFormat::Gro => FormatKind::Gro,
            FileFormat::Mol2 => FormatKind::Mol2,
            FileFormat::Sdf => FormatKind::Sdf,
            FileFormat::Cssr => FormatKind::Cssr,
            FileFormat::Lammps => FormatKind::LammpsData,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", FormatKind::from(*self))
    }
}

/// Aggregated IO parameters shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct IoParameters {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub input_format: Option<FileFormat>,
    pub output_format: Option<FileFormat>,
}

/// Opens the configured input source as a trajectory.
pub fn open_input(params: &IoParameters) -> Result<Trajectory> {
    let format = resolve_input_format(params)?;
    let builder = TrajectoryBuilder::new().format(format.into());

    if let Some(path) = &params.input {
        builder
            .open(path)
            .with_context(|| format!("Failed to open {} input {}", format, path.display()))
    } else {
        let stdin = stdio::stdin();
        if stdin.is_terminal() {
            bail!(
                "No --input provided and stdin is a TTY. Provide -i/--input or pipe a file into chemforge."
            );
        }
        let mut content = String::new();
        stdin
            .lock()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        builder
            .reader(TextFile::from_string(content))
            .with_context(|| format!("Failed to read {} input from stdin", format))
    }
}

/// Writes `frames` to the configured output destination.
pub fn save_frames(frames: &[Frame], params: &IoParameters) -> Result<()> {
    let format = resolve_output_format(params)?;
    let builder = TrajectoryBuilder::new().format(format.into());

    match &params.output {
        Some(path) => {
            let mut writer = builder
                .create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            write_all(&mut writer, frames).with_context(|| {
                format!("Failed to write {} output to {}", format, path.display())
            })?;
            writer
                .close()
                .with_context(|| format!("Failed to close {}", path.display()))?;
        }
        None => {
            let stdout = stdio::stdout();
            let mut writer = builder.writer(BufWriter::new(stdout.lock()))?;
            write_all(&mut writer, frames)
                .with_context(|| format!("Failed to write {} output to stdout", format))?;
            writer
                .finish()
                .context("Failed to flush stdout")?
                .flush()
                .context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

fn write_all<W: Write>(writer: &mut TrajectoryWriter<W>, frames: &[Frame]) -> Result<()> {
    for frame in frames {
        writer.write(frame)?;
    }
    Ok(())
}

fn resolve_input_format(params: &IoParameters) -> Result<FileFormat> {
    if let Some(explicit) = params.input_format {
        Ok(explicit)
    } else if let Some(path) = &params.input {
        FileFormat::from_path(path).ok_or_else(|| {
            anyhow!(
                "Unable to infer input format from '{}'. Please specify --format.",
                path.display()
            )
        })
    } else {
        Ok(FileFormat::Pdb)
    }
}

fn resolve_output_format(params: &IoParameters) -> Result<FileFormat> {
    if let Some(explicit) = params.output_format {
        return Ok(explicit);
    }

    if let Some(path) = &params.output {
        FileFormat::from_path(path).ok_or_else(|| {
            anyhow!(
                "Unable to infer output format from '{}'. Please specify --out-format.",
                path.display()
            )
        })
    } else {
        Ok(FileFormat::Pdb)
    }
}

/// Wraps long-running operations with a spinner rendered to stderr.
pub fn run_with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = work();

    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} ✓", message)),
        Err(_) => spinner.abandon_with_message(format!("{} ✗", message)),
    }

    result
}

/// Returns true when stdout is a TTY and no explicit output file was supplied.
pub fn interactive_stdout_requested(params: &IoParameters) -> bool {
    params.output.is_none() && stdio::stdout().is_terminal()
}

/// Ensures commands do not dump file contents directly into an interactive terminal.
pub fn ensure_noninteractive_stdout(command: &str, params: &IoParameters) -> Result<()> {
    if interactive_stdout_requested(params) {
        bail!(
            "Refusing to stream {command} results to an interactive terminal. Use -o/--output or pipe the command into a file."
        );
    }
    Ok(())
}
