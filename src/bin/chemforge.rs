use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use chem_forge::warnings::{self, StderrSink};

mod commands;

use commands::{FileFormat, IoParameters};
use commands::{convert, info};

#[derive(Parser, Debug)]
#[command(
    name = "chemforge",
    about = "A command-line tool for inspecting and converting molecular structure and trajectory files.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Input file path. When omitted, stdin is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    input: Option<PathBuf>,
    /// Output file path. When omitted, stdout is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,
    /// Force the input format instead of inferring it from the extension.
    #[arg(long = "format", value_enum, global = true)]
    input_format: Option<FileFormat>,
    /// Force the output format instead of inferring it from the extension.
    #[arg(long = "out-format", value_enum, global = true)]
    output_format: Option<FileFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the frames, topology and cell of a file.
    Info(info::InfoArgs),
    /// Re-encode frames into another format.
    Convert(convert::ConvertArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    warnings::set_warning_sink(Arc::new(StderrSink));

    let io_params = IoParameters {
        input: cli.input.clone(),
        output: cli.output.clone(),
        input_format: cli.input_format,
        output_format: cli.output_format,
    };

    match cli.command {
        Command::Info(args) => {
            let mut trajectory = commands::open_input(&io_params)?;
            info::run(&mut trajectory, &args)?;
        }
        Command::Convert(args) => {
            commands::ensure_noninteractive_stdout("convert", &io_params)?;
            let mut trajectory = commands::open_input(&io_params)?;
            let frames = convert::run(&mut trajectory, &args)?;
            commands::save_frames(&frames, &io_params)?;
        }
    }

    Ok(())
}
