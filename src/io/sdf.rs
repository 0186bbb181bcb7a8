//! MDL structure-data files (V2000 connection tables).
//!
//! Each record is a molfile followed by optional `> <NAME>` data items and a `$$$$`
//! terminator. Data items become string properties of the frame.

use super::error::Error;
use super::fields::{column, parse_column};
use super::format::{FormatInfo, TextFormat};
use super::text::TextFile;
use crate::model::atom::Atom;
use crate::model::frame::Frame;
use crate::model::types::{BondOrder, Point};
use crate::warnings::{WarningSink, warning};
use std::io::Write;

pub const INFO: FormatInfo = FormatInfo {
    name: "SDF",
    extension: Some(".sdf"),
    description: "Structural Data File format",
};

const TERMINATOR: &str = "$$$$";

#[derive(Debug, Default)]
pub struct SdfFormat;

fn format_error(file: &TextFile, details: impl Into<String>) -> Error {
    Error::format(INFO.name, file.path_buf(), details)
}

fn charge_from_code(code: i64) -> Option<f64> {
    match code {
        0 => Some(0.0),
        1 => Some(3.0),
        2 => Some(2.0),
        3 => Some(1.0),
        5 => Some(-1.0),
        6 => Some(-2.0),
        7 => Some(-3.0),
        _ => None,
    }
}

fn code_from_charge(charge: i64) -> Option<u8> {
    match charge {
        0 => Some(0),
        3 => Some(1),
        2 => Some(2),
        1 => Some(3),
        -1 => Some(5),
        -2 => Some(6),
        -3 => Some(7),
        _ => None,
    }
}

fn bond_order(code: u32) -> BondOrder {
    match code {
        1 => BondOrder::Single,
        2 => BondOrder::Double,
        3 => BondOrder::Triple,
        4 => BondOrder::Aromatic,
        _ => BondOrder::Unknown,
    }
}

fn bond_code(order: BondOrder) -> u32 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
        BondOrder::Amide | BondOrder::Unknown => 8,
    }
}

fn read_atom(file: &TextFile, line: &str, sink: &dyn WarningSink) -> Result<(Atom, Point), Error> {
    if line.len() < 34 {
        return Err(format_error(
            file,
            format!("atom line is too small for SDF: '{}'", line),
        ));
    }
    let (Some(x), Some(y), Some(z)) = (
        parse_column::<f64>(line, 0, 10),
        parse_column::<f64>(line, 10, 20),
        parse_column::<f64>(line, 20, 30),
    ) else {
        return Err(format_error(
            file,
            format!("could not read positions in '{}'", line),
        ));
    };

    let mut atom = Atom::new(column(line, 31, 34).trim());
    if line.len() >= 40 {
        let code = parse_column::<i64>(line, 36, 39).unwrap_or_else(|| {
            warning!(
                sink,
                "SDF reader",
                "charge code not numeric: {}",
                column(line, 36, 39)
            );
            0
        });
        match charge_from_code(code) {
            Some(charge) if charge != 0.0 => atom.set_charge(charge),
            Some(_) => {}
            None => warning!(sink, "SDF reader", "unknown charge code: '{}'", code),
        }
    }
    Ok((atom, Point::new(x, y, z)))
}

/// Reads the properties block up to `M  END`. Returns `false` when the record ended early.
fn skip_atom_properties(file: &mut TextFile, sink: &dyn WarningSink) -> Result<bool, Error> {
    loop {
        let Some(line) = file.try_readline()? else {
            warning!(
                sink,
                "SDF reader",
                "premature end of file while reading atom property"
            );
            return Ok(false);
        };
        if line.starts_with(TERMINATOR) {
            return Ok(false);
        }
        if line.starts_with("M  END") {
            return Ok(true);
        }
    }
}

/// Reads `> <NAME>` data items until the record terminator.
fn read_data_items(
    file: &mut TextFile,
    frame: &mut Frame,
    sink: &dyn WarningSink,
) -> Result<(), Error> {
    let mut pending: Option<(String, String)> = None;
    loop {
        let Some(line) = file.try_readline()? else {
            warning!(
                sink,
                "SDF reader",
                "premature end of file while reading global property"
            );
            break;
        };

        if line.is_empty() {
            match pending.take() {
                Some((name, value)) => frame.set(&name, value),
                None => warning!(sink, "SDF reader", "missing property name"),
            }
        } else if line.starts_with(TERMINATOR) {
            break;
        } else if let Some(header) = line.strip_prefix("> <") {
            let name = header.rfind('>').map_or(header, |end| &header[..end]);
            let value = file.try_readline()?.unwrap_or_default();
            pending = Some((name.to_string(), value));
        } else if let Some((_, value)) = pending.as_mut() {
            value.push('\n');
            value.push_str(&line);
        }
    }

    if let Some((name, value)) = pending {
        frame.set(&name, value);
    }
    Ok(())
}

impl TextFormat for SdfFormat {
    fn info(&self) -> FormatInfo {
        INFO
    }

    fn read_next(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        let header = file.readlines(4).map_err(|e| {
            format_error(file, format!("can not read next step as SDF: {}", e))
        })?;
        let counts = &header[3];
        let (Some(natoms), Some(nbonds)) = (
            parse_column::<usize>(counts, 0, 3),
            parse_column::<usize>(counts, 3, 6),
        ) else {
            return Err(format_error(
                file,
                format!("can not read next step as SDF: invalid counts line '{}'", counts),
            ));
        };

        frame.clear();
        frame.set("name", header[0].trim_end());

        let atom_lines = file
            .readlines(natoms)
            .map_err(|e| format_error(file, format!("can not read file: {}", e)))?;
        for line in &atom_lines {
            let (atom, position) = read_atom(file, line, sink)?;
            frame.add_atom(atom, position, None);
        }

        let bond_lines = file
            .readlines(nbonds)
            .map_err(|e| format_error(file, format!("can not read file: {}", e)))?;
        for line in &bond_lines {
            let (Some(i), Some(j), Some(code)) = (
                parse_column::<usize>(line, 0, 3),
                parse_column::<usize>(line, 3, 6),
                parse_column::<u32>(line, 6, 9),
            ) else {
                return Err(format_error(file, format!("invalid bond line '{}'", line)));
            };
            if i == 0 || j == 0 {
                return Err(format_error(
                    file,
                    format!("atom indexes start at 1 in bond line '{}'", line),
                ));
            }
            frame.add_bond(i - 1, j - 1, bond_order(code))?;
        }

        if skip_atom_properties(file, sink)? {
            read_data_items(file, frame, sink)?;
        }
        Ok(())
    }

    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>, Error> {
        let position = file.tellg()?;
        let counts = match file.readlines(4) {
            Ok(mut lines) => lines.swap_remove(3),
            Err(e) if e.is_eof() => return Ok(None),
            Err(e) => return Err(e),
        };
        if counts.len() < 10 {
            return Ok(None);
        }
        let (Some(natoms), Some(nbonds)) = (
            parse_column::<usize>(&counts, 0, 3),
            parse_column::<usize>(&counts, 3, 6),
        ) else {
            return Ok(None);
        };

        match file.skiplines(natoms + nbonds) {
            Ok(()) => {}
            Err(e) if e.is_eof() => {
                let path = file
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                return Err(format_error(
                    file,
                    format!("not enough lines in '{}' for SDF format", path),
                ));
            }
            Err(e) => return Err(e),
        }

        while let Some(line) = file.try_readline()? {
            if line == TERMINATOR {
                break;
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

        writeln!(out, "{}", frame.name().unwrap_or("NONAME")).map_err(io)?;
        writeln!(out, " chem-forge\n").map_err(io)?;
        writeln!(
            out,
            "{:>3}{:>3}  0     0  0  0  0  0  0999 V2000",
            frame.size(),
            topology.bond_count()
        )
        .map_err(io)?;

        for (atom, position) in topology.atoms().iter().zip(frame.positions()) {
            let atom_type = match atom.atom_type.as_str() {
                t if t.is_empty() || t.len() > 3 => "Xxx",
                t => t,
            };

            let charge = atom.charge();
            let code = if charge.fract() == 0.0 {
                code_from_charge(charge as i64).unwrap_or_else(|| {
                    warning!(sink, "SDF writer", "charge code not available for '{}'", charge);
                    0
                })
            } else {
                warning!(sink, "SDF writer", "charge not an integer: '{}'", charge);
                0
            };

            writeln!(
                out,
                "{:>10.4}{:>10.4}{:>10.4} {:<3} 0{:>3}  0  0  0  0  0  0  0  0  0  0",
                position.x, position.y, position.z, atom_type, code
            )
            .map_err(io)?;
        }

        for bond in topology.bonds() {
            writeln!(
                out,
                "{:>3}{:>3}{:>3}  0  0  0  0",
                bond.a1_idx + 1,
                bond.a2_idx + 1,
                bond_code(bond.order)
            )
            .map_err(io)?;
        }
        writeln!(out, "M  END").map_err(io)?;

        for (name, value) in frame.properties() {
            if name == "name" {
                continue;
            }
            writeln!(out, "> <{}>\n{}\n", name, value).map_err(io)?;
        }
        writeln!(out, "{}", TERMINATOR).map_err(io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::property::Property;
    use crate::warnings::CollectingSink;

    const ETHANOL: &str = "\
ethanol
 chem-forge

  3  2  0     0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.0000    1.4000    0.0000 O   0  5  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
  2  3  2  0  0  0  0
M  END
> <source>
hand written
second line

$$$$
";

    const ARGON: &str = "\
argon

 comment
  1  0  0     0  0  0  0  0  0999 V2000
    5.0000    5.0000    5.0000 Ar  0  0  0  0  0  0  0  0  0  0  0  0
M  END
$$$$
";

    fn read_all(content: &str) -> (Vec<Frame>, CollectingSink) {
        let sink = CollectingSink::new();
        let mut file = TextFile::from_string(content);
        let mut frames = Vec::new();
        while !file.eof().unwrap() {
            let mut frame = Frame::new();
            SdfFormat.read_next(&mut file, &mut frame, &sink).unwrap();
            frames.push(frame);
        }
        (frames, sink)
    }

    #[test]
    fn reads_atoms_bonds_charges_and_data_items() {
        let (frames, sink) = read_all(ETHANOL);
        let frame = &frames[0];

        assert_eq!(frame.name(), Some("ethanol"));
        assert_eq!(frame.size(), 3);
        assert_eq!(frame.topology().atoms()[2].atom_type, "O");
        assert_eq!(frame.topology().atoms()[2].charge(), -1.0);
        assert_eq!(frame.topology().atoms()[0].explicit_charge(), None);
        assert_eq!(frame.positions()[2], Point::new(2.0, 1.4, 0.0));
        assert_eq!(frame.topology().bond_order(1, 2), Some(BondOrder::Double));
        assert_eq!(
            frame.get("source").and_then(Property::as_str),
            Some("hand written\nsecond line")
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn records_follow_each_other() {
        let content = format!("{ETHANOL}{ARGON}");
        let (frames, _) = read_all(&content);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].name(), Some("argon"));
        assert_eq!(frames[1].topology().atoms()[0].atom_type, "Ar");
    }

    #[test]
    fn unknown_charge_codes_are_reported() {
        let content = ARGON.replace("Ar  0  0", "Ar  0  4");
        let (frames, sink) = read_all(&content);

        assert_eq!(frames[0].topology().atoms()[0].charge(), 0.0);
        assert!(sink.contains("unknown charge code: '4'"));
    }

    #[test]
    fn short_atom_lines_are_format_errors() {
        let content = ARGON.replace("Ar  0  0  0  0  0  0  0  0  0  0  0  0", "");
        let err = SdfFormat
            .read_next(
                &mut TextFile::from_string(content),
                &mut Frame::new(),
                &CollectingSink::new(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("atom line is too small for SDF"));
    }

    #[test]
    fn forward_returns_record_offsets() {
        let content = format!("{ETHANOL}{ARGON}");
        let mut file = TextFile::from_string(content);

        assert_eq!(SdfFormat.forward(&mut file).unwrap(), Some(0));
        assert_eq!(SdfFormat.forward(&mut file).unwrap(), Some(ETHANOL.len() as u64));
        assert_eq!(SdfFormat.forward(&mut file).unwrap(), None);

        let mut truncated = TextFile::from_string("x\n\n\n  5  0  0     0  0  0  0  0  0999 V2000\n");
        let err = SdfFormat.forward(&mut truncated).unwrap_err();
        assert!(err.to_string().contains("not enough lines"));
    }

    #[test]
    fn writer_output_matches_the_input_layout() {
        let (frames, _) = read_all(ETHANOL);
        let sink = CollectingSink::new();
        let mut out = Vec::new();
        SdfFormat.write_next(&mut out, &frames[0], &sink).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, ETHANOL);
        assert!(sink.is_empty());
    }

    #[test]
    fn writer_reports_unrepresentable_charges() {
        let mut frame = Frame::new();
        let mut atom = Atom::new("Fe");
        atom.set_charge(0.5);
        frame.add_atom(atom, Point::origin(), None);
        let mut atom = Atom::new("Fe");
        atom.set_charge(4.0);
        frame.add_atom(atom, Point::origin(), None);
        frame.add_atom(Atom::new("Unknown"), Point::origin(), None);

        let sink = CollectingSink::new();
        let mut out = Vec::new();
        SdfFormat.write_next(&mut out, &frame, &sink).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("NONAME\n"));
        assert!(text.contains(" Xxx 0  0"));
        assert!(sink.contains("charge not an integer: '0.5'"));
        assert!(sink.contains("charge code not available for '4'"));
    }
}
