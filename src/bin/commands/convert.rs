use anyhow::{Context, Result};
use clap::Args;

use chem_forge::Frame;
use chem_forge::io::Trajectory;

use crate::commands::run_with_spinner;

/// Options for re-encoding a file.
#[derive(Debug, Default, Args)]
pub struct ConvertArgs {
    /// Only convert the frame at this 0-based step.
    #[arg(long, value_name = "N")]
    pub step: Option<usize>,
}

/// Reads the requested frames from `trajectory`.
pub fn run(trajectory: &mut Trajectory, args: &ConvertArgs) -> Result<Vec<Frame>> {
    match args.step {
        Some(step) => run_with_spinner(&format!("Reading step {step}"), || {
            let frame = trajectory
                .read_step(step)
                .with_context(|| format!("Failed to read step {step}"))?;
            Ok(vec![frame])
        }),
        None => run_with_spinner("Reading frames", || {
            trajectory
                .frames()
                .enumerate()
                .map(|(step, frame)| frame.with_context(|| format!("Failed to read step {step}")))
                .collect()
        }),
    }
}
