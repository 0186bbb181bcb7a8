//! GROMACS coordinate files.
//!
//! Coordinates, velocities and box vectors are stored in nanometers and converted to
//! Ångström on read. Every frame is a title line, an atom count, one fixed-width line per
//! atom and a box line.

use super::error::Error;
use super::fields::{column, parse_column};
use super::format::{FormatInfo, TextFormat};
use super::text::TextFile;
use crate::model::atom::Atom;
use crate::model::cell::{CellShape, UnitCell};
use crate::model::frame::Frame;
use crate::model::residue::Residue;
use crate::model::types::{Point, Vector};
use crate::warnings::{WarningSink, warning};
use nalgebra::Matrix3;
use std::collections::BTreeMap;
use std::io::Write;

pub const INFO: FormatInfo = FormatInfo {
    name: "GRO",
    extension: Some(".gro"),
    description: "GROMACS GRO text format",
};

const NM_TO_ANGSTROM: f64 = 10.0;

#[derive(Debug, Default)]
pub struct GroFormat {
    residues: BTreeMap<i64, Residue>,
}

impl GroFormat {
    fn format_error(file: &TextFile, details: impl Into<String>) -> Error {
        Error::format(INFO.name, file.path_buf(), details)
    }
}

fn parse_vector(line: &str, start: usize, width: usize) -> Option<Vector> {
    let x = parse_column::<f64>(line, start, start + width)?;
    let y = parse_column::<f64>(line, start + width, start + 2 * width)?;
    let z = parse_column::<f64>(line, start + 2 * width, start + 3 * width)?;
    Some(Vector::new(x, y, z) * NM_TO_ANGSTROM)
}

fn read_box(line: &str, sink: &dyn WarningSink) -> Option<UnitCell> {
    let values: Vec<f64> = line
        .split_whitespace()
        .map(|value| value.parse::<f64>().map(|v| v * NM_TO_ANGSTROM))
        .collect::<Result<_, _>>()
        .ok()?;

    match values.as_slice() {
        [a, b, c] => Some(UnitCell::from_lengths(*a, *b, *c)),
        [v1x, v2y, v3z, v1y, v1z, v2x, v2z, v3x, v3y] => {
            if *v1y != 0.0 || *v1z != 0.0 || *v2z != 0.0 {
                warning!(
                    sink,
                    "GRO reader",
                    "box vectors must be upper triangular, ignoring non-zero v1(y), v1(z) or v2(z)"
                );
            }
            #[rustfmt::skip]
            let matrix = Matrix3::new(
                *v1x, *v2x, *v3x,
                0.0,  *v2y, *v3y,
                0.0,  0.0,  *v3z,
            );
            Some(UnitCell::from_matrix(matrix))
        }
        _ => {
            warning!(
                sink,
                "GRO reader",
                "box line should contain 3 or 9 values, got {}",
                values.len()
            );
            Some(UnitCell::infinite())
        }
    }
}

/// Fails when a value would overflow a fixed-width numeric field.
fn check_values_size(values: [f64; 3], width: i32, context: &str) -> Result<(), Error> {
    let max_pos = 10f64.powi(width) - 1.0;
    let max_neg = -(10f64.powi(width - 1)) + 1.0;
    if values.iter().any(|&v| v > max_pos || v < max_neg) {
        return Err(Error::format(
            INFO.name,
            None,
            format!("value in {} is too big for representation in GRO format", context),
        ));
    }
    Ok(())
}

fn gro_index(index: usize) -> String {
    if index >= 99_999 {
        "*****".to_string()
    } else {
        (index + 1).to_string()
    }
}

impl TextFormat for GroFormat {
    fn info(&self) -> FormatInfo {
        INFO
    }

    fn read_next(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        frame.clear();
        self.residues.clear();

        let title = file
            .readline()
            .map_err(|e| Self::format_error(file, format!("can not read next step as GRO: {}", e)))?;
        frame.set("name", title.trim());
        let count_line = file
            .readline()
            .map_err(|e| Self::format_error(file, format!("can not read next step as GRO: {}", e)))?;
        let natoms: usize = count_line.trim().parse().map_err(|_| {
            Self::format_error(
                file,
                format!("can not read next step as GRO: invalid atom count '{}'", count_line.trim()),
            )
        })?;

        for _ in 0..natoms {
            let line = file.readline()?;
            if line.len() < 44 {
                return Err(Self::format_error(
                    file,
                    format!("GRO Atom line is too small: '{}'", line),
                ));
            }

            let Some(position) = parse_vector(&line, 20, 8) else {
                return Err(Self::format_error(
                    file,
                    format!("could not read positions in '{}'", line),
                ));
            };
            let velocity = if line.len() >= 68 {
                let velocity = parse_vector(&line, 44, 8).ok_or_else(|| {
                    Self::format_error(file, format!("could not read velocities in '{}'", line))
                })?;
                frame.add_velocities();
                Some(velocity)
            } else {
                None
            };

            let atom = Atom::new(column(&line, 10, 15).trim());
            frame.add_atom(atom, Point::from(position), velocity);
            let index = frame.size() - 1;

            if let Some(resid) = parse_column::<i64>(&line, 0, 5) {
                self.residues
                    .entry(resid)
                    .or_insert_with(|| Residue::with_id(column(&line, 5, 10).trim(), resid))
                    .add_atom(index);
            }
        }

        let box_line = file.readline()?;
        frame.cell = read_box(&box_line, sink).ok_or_else(|| {
            Self::format_error(file, format!("could not read box line '{}'", box_line))
        })?;

        for residue in std::mem::take(&mut self.residues).into_values() {
            frame.topology_mut().add_residue(residue)?;
        }
        Ok(())
    }

    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>, Error> {
        let position = file.tellg()?;
        if file.try_readline()?.is_none() {
            return Ok(None);
        }
        let Some(natoms) = file
            .try_readline()?
            .and_then(|line| line.trim().parse::<usize>().ok())
        else {
            return Ok(None);
        };

        for _ in 0..=natoms {
            if file.try_readline()?.is_none() {
                let path = file
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                return Err(Self::format_error(
                    file,
                    format!("not enough lines in '{}' for GRO format", path),
                ));
            }
        }
        Ok(Some(position))
    }

    fn write_next(
        &mut self,
        out: &mut dyn Write,
        frame: &Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        let io = |e| Error::from_io(e, None);
        let topology = frame.topology();

        writeln!(out, "{}", frame.name().unwrap_or("GRO File produced by chem-forge")).map_err(io)?;
        writeln!(out, "{:>5}", frame.size()).map_err(io)?;

        let mut next_resid = topology
            .residues()
            .iter()
            .filter_map(|residue| residue.id)
            .max()
            .map_or(1, |max| max.max(0) + 1);

        for (i, atom) in topology.atoms().iter().enumerate() {
            let residue = topology.residue_for_atom(i);
            let resname = match residue {
                Some(residue) if residue.name.chars().count() > 5 => {
                    warning!(
                        sink,
                        "GRO writer",
                        "residue '{}' name is too long, it will be truncated",
                        residue.name
                    );
                    residue.name.chars().take(5).collect()
                }
                Some(residue) => residue.name.clone(),
                None => "XXXXX".to_string(),
            };

            let resid = match residue.and_then(|residue| residue.id) {
                Some(id) if id <= 99_999 => id.to_string(),
                Some(_) => {
                    warning!(sink, "GRO writer", "too many residues, removing residue id");
                    "-1".to_string()
                }
                None => {
                    let value = next_resid;
                    next_resid += 1;
                    if value <= 99_999 {
                        value.to_string()
                    } else {
                        "-1".to_string()
                    }
                }
            };

            let position = frame.positions()[i] / NM_TO_ANGSTROM;
            check_values_size([position.x, position.y, position.z], 8, "atomic position")?;
            write!(
                out,
                "{:>5}{:<5}{:>5}{:>5}{:8.3}{:8.3}{:8.3}",
                resid,
                resname,
                atom.name.as_str(),
                gro_index(i),
                position.x,
                position.y,
                position.z
            )
            .map_err(io)?;

            if let Some(velocities) = frame.velocities() {
                let velocity = velocities[i] / NM_TO_ANGSTROM;
                check_values_size([velocity.x, velocity.y, velocity.z], 8, "atomic velocity")?;
                write!(out, "{:8.4}{:8.4}{:8.4}", velocity.x, velocity.y, velocity.z).map_err(io)?;
            }
            writeln!(out).map_err(io)?;
        }

        let cell = &frame.cell;
        let matrix = cell.matrix() / NM_TO_ANGSTROM;
        if cell.shape() == CellShape::Triclinic {
            let diagonal = [matrix[(0, 0)], matrix[(1, 1)], matrix[(2, 2)]];
            let tilts = [matrix[(0, 1)], matrix[(0, 2)], matrix[(1, 2)]];
            check_values_size(diagonal, 8, "unit cell")?;
            check_values_size(tilts, 8, "unit cell")?;
            writeln!(
                out,
                "  {:8.5}  {:8.5}  {:8.5} 0.0 0.0  {:8.5} 0.0  {:8.5}  {:8.5}",
                diagonal[0], diagonal[1], diagonal[2], tilts[0], tilts[1], tilts[2]
            )
            .map_err(io)?;
        } else {
            let lengths = cell.lengths().map(|length| length / NM_TO_ANGSTROM);
            check_values_size(lengths, 8, "unit cell")?;
            writeln!(
                out,
                "  {:8.5}  {:8.5}  {:8.5}",
                lengths[0], lengths[1], lengths[2]
            )
            .map_err(io)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::CollectingSink;

    const WATER: &str = "\
Two waters, t= 0.0
    6
    1SOL     OW    1   0.126   1.624   1.679  0.1227 -0.0580  0.0434
    1SOL    HW1    2   0.190   1.661   1.747  0.8085  0.3191 -0.7791
    1SOL    HW2    3   0.177   1.568   1.613 -0.9045 -2.6469  1.3180
    2SOL     OW    4   1.275   0.053   0.622  0.2519  0.3140 -0.1734
    2SOL    HW1    5   1.337   0.002   0.680 -1.0641 -1.1349  0.0257
    2SOL    HW2    6   1.326   0.120   0.568  1.9427 -0.8216 -0.0244
   1.82060   1.82060   1.82060
";

    fn read(content: &str) -> (Frame, CollectingSink) {
        let sink = CollectingSink::new();
        let mut frame = Frame::new();
        GroFormat::default()
            .read_next(&mut TextFile::from_string(content), &mut frame, &sink)
            .unwrap();
        (frame, sink)
    }

    #[test]
    fn reads_atoms_residues_velocities_and_box() {
        let (frame, sink) = read(WATER);

        assert_eq!(frame.name(), Some("Two waters, t= 0.0"));
        assert_eq!(frame.size(), 6);
        assert_eq!(frame.topology().atoms()[1].name, "HW1");
        assert!((frame.positions()[0] - Point::new(1.26, 16.24, 16.79)).norm() < 1e-9);

        let velocities = frame.velocities().unwrap();
        assert!((velocities[0] - Vector::new(1.227, -0.58, 0.434)).norm() < 1e-9);

        let residues = frame.topology().residues();
        assert_eq!(residues.len(), 2);
        assert_eq!(residues[1].name, "SOL");
        assert_eq!(residues[1].atoms().collect::<Vec<_>>(), [3, 4, 5]);

        assert_eq!(frame.cell.shape(), CellShape::Orthorhombic);
        assert!((frame.cell.a() - 18.206).abs() < 1e-9);
        assert!(sink.is_empty());
    }

    #[test]
    fn triclinic_boxes_use_nine_values() {
        let content = "t\n1\n    1ALA      N    1   0.000   0.000   0.000\n   \
1.00000   2.00000   3.00000   0.00000   0.00000   0.50000   0.00000   0.20000   0.30000\n";
        let (frame, sink) = read(content);
        let matrix = frame.cell.matrix();

        assert_eq!(frame.cell.shape(), CellShape::Triclinic);
        assert!((matrix[(0, 1)] - 5.0).abs() < 1e-9);
        assert!((matrix[(0, 2)] - 2.0).abs() < 1e-9);
        assert!((matrix[(1, 2)] - 3.0).abs() < 1e-9);
        assert!(frame.velocities().is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn non_zero_lower_box_entries_are_reported() {
        let content = "t\n0\n 1 2 3 0.1 0 0 0 0 0\n";
        let (_, sink) = read(content);
        assert!(sink.contains("box vectors must be upper triangular"));
    }

    #[test]
    fn short_atom_lines_are_format_errors() {
        let err = GroFormat::default()
            .read_next(
                &mut TextFile::from_string("t\n1\n    1ALA      N\n1 1 1\n"),
                &mut Frame::new(),
                &CollectingSink::new(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("GRO Atom line is too small"));
    }

    #[test]
    fn forward_skips_whole_frames_and_reports_truncation() {
        let two_frames = format!("{WATER}{WATER}\n");
        let mut file = TextFile::from_string(two_frames);
        let mut format = GroFormat::default();

        assert_eq!(format.forward(&mut file).unwrap(), Some(0));
        assert_eq!(format.forward(&mut file).unwrap(), Some(WATER.len() as u64));
        assert_eq!(format.forward(&mut file).unwrap(), None);

        let mut truncated = TextFile::from_string("t\n5\nonly one line\n");
        let err = format.forward(&mut truncated).unwrap_err();
        assert!(err.to_string().contains("not enough lines"));
    }

    #[test]
    fn written_frames_read_back() {
        let (frame, _) = read(WATER);
        let sink = CollectingSink::new();
        let mut out = Vec::new();
        GroFormat::default().write_next(&mut out, &frame, &sink).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.lines().nth(2).unwrap().starts_with("    1SOL     OW    1   0.126   1.624   1.679  0.1227"));
        let (back, _) = read(&text);
        assert_eq!(back.size(), 6);
        assert_eq!(back.topology().residues().len(), 2);
        assert!((back.cell.a() - frame.cell.a()).abs() < 1e-6);
        for (a, b) in back.positions().iter().zip(frame.positions()) {
            assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn writer_defaults_for_atoms_without_residue() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::new("Ar"), Point::new(10.0, 0.0, 0.0), None);
        let mut out = Vec::new();
        GroFormat::default()
            .write_next(&mut out, &frame, &CollectingSink::new())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "GRO File produced by chem-forge");
        assert_eq!(lines[1], "    1");
        assert_eq!(lines[2], "    1XXXXX   Ar    1   1.000   0.000   0.000");
        assert_eq!(lines[3], "   0.00000   0.00000   0.00000");
    }
}
