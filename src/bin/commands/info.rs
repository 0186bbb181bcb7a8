use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};

use chem_forge::io::Trajectory;
use chem_forge::ops::{TypeRegistry, guess_molecules};
use chem_forge::{CellShape, Frame};

use crate::commands::run_with_spinner;

/// Report-only command that summarizes every frame of a file.
#[derive(Debug, Default, Args)]
pub struct InfoArgs {
    /// Print at most this many rows in the frame table.
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub max_rows: usize,
}

/// Reads the whole file and prints frame and topology statistics to stderr.
pub fn run(trajectory: &mut Trajectory, args: &InfoArgs) -> Result<()> {
    let format_name = trajectory.format_info().name;
    let (reports, first) = run_with_spinner("Analyzing file", || {
        let mut reports = Vec::new();
        let mut first = None;
        for (step, frame) in trajectory.frames().enumerate() {
            let frame = frame.with_context(|| format!("Failed to read step {step}"))?;
            reports.push(FrameReport::new(step, &frame));
            if first.is_none() {
                first = Some(TopologyReport::new(&frame));
            }
        }
        Ok((reports, first))
    })?;

    print_tables(format_name, &reports, first.as_ref(), args.max_rows)
}

#[derive(Debug)]
struct FrameReport {
    step: usize,
    atoms: usize,
    bonds: usize,
    residues: usize,
    cell: String,
}

impl FrameReport {
    fn new(step: usize, frame: &Frame) -> Self {
        let topology = frame.topology();
        Self {
            step,
            atoms: frame.size(),
            bonds: topology.bond_count(),
            residues: topology.residues().len(),
            cell: describe_cell(frame),
        }
    }
}

/// Derived statistics of the first frame.
#[derive(Debug)]
struct TopologyReport {
    name: Option<String>,
    molecules: usize,
    angles: usize,
    dihedrals: usize,
    impropers: usize,
    type_counts: [usize; 5],
    has_velocities: bool,
}

impl TopologyReport {
    fn new(frame: &Frame) -> Self {
        let topology = frame.topology();
        let types = TypeRegistry::new(topology);
        let molecules = guess_molecules(topology);
        Self {
            name: frame.name().map(str::to_string),
            molecules: molecules.iter().max().map_or(0, |&id| id + 1),
            angles: topology.angles().len(),
            dihedrals: topology.dihedrals().len(),
            impropers: topology.impropers().len(),
            type_counts: [
                types.atoms().len(),
                types.bonds().len(),
                types.angles().len(),
                types.dihedrals().len(),
                types.impropers().len(),
            ],
            has_velocities: frame.velocities().is_some(),
        }
    }
}

fn describe_cell(frame: &Frame) -> String {
    let cell = &frame.cell;
    match cell.shape() {
        CellShape::Infinite => "Infinite".to_string(),
        shape => {
            let [a, b, c] = cell.lengths();
            let [alpha, beta, gamma] = cell.angles();
            let label = if shape == CellShape::Orthorhombic {
                "Orthorhombic"
            } else {
                "Triclinic"
            };
            format!(
                "{label} a = {a:.2}, b = {b:.2}, c = {c:.2}, α = {alpha:.2}, β = {beta:.2}, γ = {gamma:.2}"
            )
        }
    }
}

fn print_tables(
    format_name: &str,
    reports: &[FrameReport],
    first: Option<&TopologyReport>,
    max_rows: usize,
) -> Result<()> {
    let mut stderr = io::stderr().lock();

    print_boxed_label(&mut stderr, "ChemForge File Report")?;
    writeln!(&mut stderr)?;

    let mut frame_table = Table::new();
    print_boxed_label(&mut stderr, "Frames")?;
    frame_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    frame_table.set_titles(row!["Step", "Atoms", "Bonds", "Residues", "Cell"]);
    for report in reports.iter().take(max_rows) {
        frame_table.add_row(row![
            report.step,
            report.atoms,
            report.bonds,
            report.residues,
            report.cell
        ]);
    }
    frame_table
        .print(&mut stderr)
        .context("Failed to render frame table")?;
    if reports.len() > max_rows {
        writeln!(&mut stderr, "... {} more frames", reports.len() - max_rows)?;
    }
    writeln!(&mut stderr)?;

    let mut summary_table = Table::new();
    print_boxed_label(&mut stderr, "Summary")?;
    summary_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    summary_table.set_titles(row!["Metric", "Value"]);
    summary_table.add_row(row!["Format", format_name]);
    summary_table.add_row(row!["Frames", reports.len()]);

    if let Some(first) = first {
        if let Some(name) = &first.name {
            summary_table.add_row(row!["Name", name]);
        }
        summary_table.add_row(row!["Molecules", first.molecules]);
        summary_table.add_row(row![
            "Angles / Dihedrals / Impropers",
            format!("{} / {} / {}", first.angles, first.dihedrals, first.impropers)
        ]);
        let [atoms, bonds, angles, dihedrals, impropers] = first.type_counts;
        summary_table.add_row(row![
            "Types (atom / bond / angle / dihedral / improper)",
            format!("{atoms} / {bonds} / {angles} / {dihedrals} / {impropers}")
        ]);
        summary_table.add_row(row![
            "Velocities",
            if first.has_velocities { "yes" } else { "no" }
        ]);
    }

    summary_table
        .print(&mut stderr)
        .context("Failed to render file summary")?;

    Ok(())
}

fn print_boxed_label<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    let inner = format!(" {title} ");
    let width = inner.chars().count();
    writeln!(writer, "╭{}╮", "─".repeat(width))?;
    writeln!(writer, "│{}│", inner)?;
    writeln!(writer, "╰{}╯", "─".repeat(width))?;
    Ok(())
}
