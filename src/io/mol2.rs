//! Tripos MOL2 files.
//!
//! Only the MOLECULE, ATOM, BOND and CRYSIN sections are decoded; every other section is
//! skipped. SYBYL atom types are kept in the `sybyl` atom property, and their element part
//! becomes the atom type.

use super::error::Error;
use super::fields::scan;
use super::format::{FormatInfo, TextFormat};
use super::text::TextFile;
use crate::model::atom::Atom;
use crate::model::cell::{CellShape, UnitCell};
use crate::model::element::Element;
use crate::model::frame::Frame;
use crate::model::property::Property;
use crate::model::residue::Residue;
use crate::model::types::{BondOrder, Point};
use crate::warnings::{WarningSink, warning};
use std::collections::BTreeMap;
use std::io::Write;

pub const INFO: FormatInfo = FormatInfo {
    name: "MOL2",
    extension: Some(".mol2"),
    description: "Tripos mol2 text format",
};

const MOLECULE: &str = "@<TRIPOS>MOLECULE";
const ATOM: &str = "@<TRIPOS>ATOM";
const BOND: &str = "@<TRIPOS>BOND";
const CRYSIN: &str = "@<TRIPOS>CRYSIN";

#[derive(Debug, Default)]
pub struct Mol2Format {
    residues: BTreeMap<i64, Residue>,
}

fn format_error(file: &TextFile, details: impl Into<String>) -> Error {
    Error::format(INFO.name, file.path_buf(), details)
}

/// Reads `natoms [nbonds ...]`.
fn parse_counts(line: &str) -> Option<(usize, usize)> {
    let mut tokens = line.split_whitespace();
    let natoms = tokens.next()?.parse().ok()?;
    let nbonds = match tokens.next() {
        Some(token) => token.parse().ok()?,
        None => 0,
    };
    Some((natoms, nbonds))
}

fn bond_order(code: &str) -> BondOrder {
    match code {
        "1" => BondOrder::Single,
        "2" => BondOrder::Double,
        "3" => BondOrder::Triple,
        "ar" => BondOrder::Aromatic,
        "am" => BondOrder::Amide,
        _ => BondOrder::Unknown,
    }
}

fn bond_code(order: BondOrder) -> &'static str {
    match order {
        BondOrder::Single => "1",
        BondOrder::Double => "2",
        BondOrder::Triple => "3",
        BondOrder::Aromatic => "ar",
        BondOrder::Amide => "am",
        BondOrder::Unknown => "du",
    }
}

/// Guesses an element from the longest alphabetic prefix of `name` that is an element.
fn guess_type(name: &str) -> String {
    let mut guess = String::new();
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            break;
        }
        let candidate = format!("{}{}", guess, c);
        if Element::find(&candidate).is_none() {
            break;
        }
        guess = candidate;
    }
    guess
}

/// Reads lines until one starts with `tag`, returning the offset of that line.
fn read_until(file: &mut TextFile, tag: &str) -> Result<Option<u64>, Error> {
    loop {
        let position = file.tellg()?;
        match file.try_readline()? {
            Some(line) if line.starts_with(tag) => return Ok(Some(position)),
            Some(_) => continue,
            None => return Ok(None),
        }
    }
}

impl Mol2Format {
    fn read_atoms(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        natoms: usize,
        charges: bool,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        for line in file.readlines(natoms)? {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let coordinates = tokens
                .get(2..5)
                .and_then(|xyz| scan::<f64, 3>(&xyz.join(" ")));
            let (Some(&name), Some([x, y, z]), Some(&sybyl)) =
                (tokens.get(1), coordinates, tokens.get(5))
            else {
                return Err(format_error(file, format!("invalid atom line '{}'", line)));
            };

            let mut atom = if sybyl.contains('.') || Element::find(sybyl).is_some() {
                let element = sybyl.split('.').next().unwrap_or(sybyl);
                let mut atom = Atom::with_type(name, element);
                atom.set("sybyl", sybyl);
                atom
            } else {
                let guess = guess_type(name);
                warning!(
                    sink,
                    "MOL2 reader",
                    "invalid sybyl type: '{}'; guessing '{}' from '{}'",
                    sybyl,
                    guess,
                    name
                );
                Atom::with_type(name, &guess)
            };

            if charges && let Some(charge) = tokens.get(8) {
                let charge = charge.parse::<f64>().map_err(|_| {
                    format_error(file, format!("invalid charge '{}' in '{}'", charge, line))
                })?;
                atom.set_charge(charge);
            }

            frame.add_atom(atom, Point::new(x, y, z), None);
            let index = frame.size() - 1;

            if let (Some(resid), Some(&resname)) = (
                tokens.get(6).and_then(|id| id.parse::<i64>().ok()),
                tokens.get(7),
            ) {
                self.residues
                    .entry(resid)
                    .or_insert_with(|| Residue::with_id(resname, resid))
                    .add_atom(index);
            }
        }
        Ok(())
    }

    fn read_bonds(file: &mut TextFile, frame: &mut Frame, nbonds: usize) -> Result<(), Error> {
        for line in file.readlines(nbonds)? {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let (Some(i), Some(j)) = (
                tokens.get(1).and_then(|id| id.parse::<usize>().ok()),
                tokens.get(2).and_then(|id| id.parse::<usize>().ok()),
            ) else {
                return Err(format_error(file, format!("invalid bond line '{}'", line)));
            };

            let size = frame.size();
            if i == 0 || j == 0 || i > size || j > size {
                return Err(format_error(
                    file,
                    format!(
                        "found a bond ({}--{}) between atoms at indexes larger than number of atoms '{}' in the frame",
                        i, j, size
                    ),
                ));
            }
            let order = tokens.get(3).map_or(BondOrder::Unknown, |code| bond_order(code));
            frame.add_bond(i - 1, j - 1, order)?;
        }
        Ok(())
    }

    fn skip_molecule(file: &mut TextFile) -> Result<Option<u64>, Error> {
        let Some(position) = read_until(file, MOLECULE)? else {
            return Ok(None);
        };
        file.skipline()?;
        let Some((natoms, nbonds)) = parse_counts(&file.readline()?) else {
            return Ok(None);
        };

        if read_until(file, ATOM)?.is_none() {
            return Ok(None);
        }
        file.skiplines(natoms)?;

        if nbonds > 0 {
            if read_until(file, BOND)?.is_none() {
                return Ok(None);
            }
            file.skiplines(nbonds)?;
        }
        Ok(Some(position))
    }
}

impl TextFormat for Mol2Format {
    fn info(&self) -> FormatInfo {
        INFO
    }

    fn read_next(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        let line = file.readline()?;
        if line.trim() != MOLECULE {
            return Err(format_error(
                file,
                format!("wrong starting line for a molecule in MOL2 format: '{}'", line.trim()),
            ));
        }

        frame.clear();
        self.residues.clear();
        frame.set("name", file.readline()?.trim());

        let counts = file.readline()?;
        let Some((natoms, nbonds)) = parse_counts(&counts) else {
            return Err(format_error(file, format!("invalid counts line '{}'", counts.trim())));
        };

        file.skipline()?;
        let charges = file.readline()?.trim() != "NO_CHARGES";

        while !file.eof()? {
            let position = file.tellg()?;
            let line = file.readline()?;
            match line.trim() {
                ATOM => self.read_atoms(file, frame, natoms, charges, sink)?,
                BOND => Self::read_bonds(file, frame, nbonds)?,
                CRYSIN => {
                    let cryst = file.readline()?;
                    let Some([a, b, c, alpha, beta, gamma]) = scan::<f64, 6>(&cryst) else {
                        return Err(format_error(
                            file,
                            format!("invalid CRYSIN record '{}'", cryst.trim()),
                        ));
                    };
                    frame.cell = UnitCell::from_lengths_angles([a, b, c], [alpha, beta, gamma]);
                }
                MOLECULE => {
                    file.seekg(position)?;
                    break;
                }
                _ => {}
            }
        }

        for residue in std::mem::take(&mut self.residues).into_values() {
            frame.topology_mut().add_residue(residue)?;
        }
        Ok(())
    }

    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>, Error> {
        match Self::skip_molecule(file) {
            Err(e) if e.is_eof() => Ok(None),
            other => other,
        }
    }

    fn write_next(
        &mut self,
        out: &mut dyn Write,
        frame: &Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        let io = |e| Error::from_io(e, None);
        let topology = frame.topology();

        writeln!(out, "{}", MOLECULE).map_err(io)?;
        writeln!(out, "{}", frame.name().unwrap_or("")).map_err(io)?;
        writeln!(
            out,
            "{:4}  {:4}    1    0    0",
            frame.size(),
            topology.bond_count()
        )
        .map_err(io)?;
        writeln!(out, "SMALL\nUSER_CHARGES\n\n{}", ATOM).map_err(io)?;

        let mut max_resid = topology
            .residues()
            .iter()
            .filter_map(|residue| residue.id)
            .fold(0, i64::max);

        for (i, (atom, position)) in topology.atoms().iter().zip(frame.positions()).enumerate() {
            let residue = topology.residue_for_atom(i);
            let resname = residue.map_or("XXX", |residue| residue.name.as_str());
            let resid = match residue.and_then(|residue| residue.id) {
                Some(id) => id,
                None => {
                    max_resid += 1;
                    max_resid
                }
            };

            let sybyl = match atom.get("sybyl").and_then(Property::as_str) {
                Some(sybyl) => sybyl,
                None => {
                    warning!(
                        sink,
                        "MOL2 writer",
                        "sybyl type is not set, using element type instead"
                    );
                    atom.atom_type.as_str()
                }
            };

            writeln!(
                out,
                "{:4} {:<4}  {:.6} {:.6} {:.6} {} {} {} {:.6}",
                i + 1,
                atom.name.as_str(),
                position.x,
                position.y,
                position.z,
                sybyl,
                resid,
                resname,
                atom.charge()
            )
            .map_err(io)?;
        }

        writeln!(out, "{}", BOND).map_err(io)?;
        for (i, bond) in topology.bonds().enumerate() {
            writeln!(
                out,
                "{:4}  {:4}  {:4}    {}",
                i + 1,
                bond.a1_idx + 1,
                bond.a2_idx + 1,
                bond_code(bond.order)
            )
            .map_err(io)?;
        }

        let cell = &frame.cell;
        if cell.shape() != CellShape::Infinite {
            writeln!(out, "{}", CRYSIN).map_err(io)?;
            writeln!(
                out,
                "   {:.4}   {:.4}   {:.4}   {:.4}   {:.4}   {:.4} 1 1",
                cell.a(),
                cell.b(),
                cell.c(),
                cell.alpha(),
                cell.beta(),
                cell.gamma()
            )
            .map_err(io)?;
        }

        writeln!(out, "@<TRIPOS>SUBSTRUCTURE").map_err(io)?;
        writeln!(
            out,
            "   1 ****        1 TEMP                        0 ****  **** 0 ROOT\n"
        )
        .map_err(io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::CollectingSink;

    const WATER: &str = "\
@<TRIPOS>MOLECULE
water
 3 2 1 0 0
SMALL
USER_CHARGES

@<TRIPOS>ATOM
      1 OW          0.0000    0.0000    0.0000 O.3     1  HOH1     -0.8340
      2 HW1         0.9572    0.0000    0.0000 H       1  HOH1      0.4170
      3 HW2        -0.2400    0.9266    0.0000 H       1  HOH1      0.4170
@<TRIPOS>BOND
     1     1     2    1
     2     1     3    1
@<TRIPOS>CRYSIN
   10.0000   12.0000   14.0000   90.0000   90.0000   90.0000 1 1
";

    const METHANE: &str = "\
@<TRIPOS>MOLECULE
methane
 2 1
SMALL
NO_CHARGES
@<TRIPOS>ATOM
      1 C1  0.0 0.0 0.0 Q 1 MET 1.5
      2 Cl2 1.0 0.0 0.0 Cl 1 MET 1.5
@<TRIPOS>BOND
     1     1     2    ar
";

    fn read_all(content: &str) -> (Vec<Frame>, CollectingSink) {
        let sink = CollectingSink::new();
        let mut file = TextFile::from_string(content);
        let mut format = Mol2Format::default();
        let mut frames = Vec::new();
        while !file.eof().unwrap() {
            let mut frame = Frame::new();
            format.read_next(&mut file, &mut frame, &sink).unwrap();
            frames.push(frame);
        }
        (frames, sink)
    }

    #[test]
    fn reads_atoms_bonds_residues_and_cell() {
        let (frames, sink) = read_all(WATER);
        let frame = &frames[0];

        assert_eq!(frames.len(), 1);
        assert_eq!(frame.name(), Some("water"));
        assert_eq!(frame.size(), 3);

        let oxygen = &frame.topology().atoms()[0];
        assert_eq!(oxygen.name, "OW");
        assert_eq!(oxygen.atom_type, "O");
        assert_eq!(oxygen.get("sybyl").and_then(Property::as_str), Some("O.3"));
        assert!((oxygen.charge() + 0.834).abs() < 1e-12);

        assert_eq!(frame.topology().bond_order(0, 1), Some(BondOrder::Single));
        assert_eq!(frame.topology().bond_count(), 2);
        assert_eq!(frame.topology().residues().len(), 1);
        assert_eq!(frame.topology().residues()[0].name, "HOH1");
        assert_eq!(frame.cell.lengths(), [10.0, 12.0, 14.0]);
        assert!(sink.is_empty());
    }

    #[test]
    fn unknown_sybyl_types_are_guessed_from_the_name() {
        let (frames, sink) = read_all(METHANE);
        let atoms = frames[0].topology().atoms();

        assert_eq!(atoms[0].atom_type, "C");
        assert!(atoms[0].get("sybyl").is_none());
        assert_eq!(atoms[1].atom_type, "Cl");
        assert_eq!(atoms[1].charge(), 0.0);
        assert_eq!(
            frames[0].topology().bond_order(0, 1),
            Some(BondOrder::Aromatic)
        );
        assert_eq!(
            sink.messages(),
            vec!["MOL2 reader: invalid sybyl type: 'Q'; guessing 'C' from 'C1'"]
        );
    }

    #[test]
    fn consecutive_molecules_are_separate_frames() {
        let content = format!("{WATER}{METHANE}");
        let (frames, _) = read_all(&content);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].size(), 3);
        assert_eq!(frames[1].name(), Some("methane"));
    }

    #[test]
    fn forward_returns_molecule_offsets() {
        let content = format!("{WATER}{METHANE}");
        let mut file = TextFile::from_string(content);
        let mut format = Mol2Format::default();

        assert_eq!(format.forward(&mut file).unwrap(), Some(0));
        assert_eq!(format.forward(&mut file).unwrap(), Some(WATER.len() as u64));
        assert_eq!(format.forward(&mut file).unwrap(), None);
    }

    #[test]
    fn forward_stops_on_truncated_molecules() {
        let mut file = TextFile::from_string("@<TRIPOS>MOLECULE\nname\n5 0\n@<TRIPOS>ATOM\n1 C 0 0 0 C\n");
        assert_eq!(Mol2Format::default().forward(&mut file).unwrap(), None);
    }

    #[test]
    fn invalid_files_are_format_errors() {
        let sink = CollectingSink::new();
        let err = Mol2Format::default()
            .read_next(
                &mut TextFile::from_string("garbage\n"),
                &mut Frame::new(),
                &sink,
            )
            .unwrap_err();
        assert!(err.to_string().contains("wrong starting line"));

        let bad_bond = WATER.replace("     2     1     3    1", "     2     1     7    1");
        let err = Mol2Format::default()
            .read_next(&mut TextFile::from_string(bad_bond), &mut Frame::new(), &sink)
            .unwrap_err();
        assert!(err.to_string().contains("found a bond (1--7)"));
    }

    #[test]
    fn writer_output_reads_back() {
        let (frames, _) = read_all(WATER);
        let sink = CollectingSink::new();
        let mut out = Vec::new();
        Mol2Format::default()
            .write_next(&mut out, &frames[0], &sink)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("   1 OW    0.000000 0.000000 0.000000 O.3 1 HOH1 -0.834000\n"));
        assert!(text.contains("   1     1     2    1\n"));
        assert!(text.contains("@<TRIPOS>CRYSIN\n   10.0000   12.0000   14.0000   90.0000"));
        assert!(sink.is_empty());

        let (back, _) = read_all(&text);
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].size(), 3);
        assert_eq!(back[0].topology().bond_count(), 2);
        assert_eq!(back[0].cell.lengths(), frames[0].cell.lengths());
        assert_eq!(back[0].topology().atoms()[1].atom_type, "H");
    }

    #[test]
    fn writer_falls_back_to_the_atom_type() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::with_type("Zn1", "Zn"), Point::origin(), None);
        let sink = CollectingSink::new();
        let mut out = Vec::new();
        Mol2Format::default().write_next(&mut out, &frame, &sink).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("   1 Zn1   0.000000 0.000000 0.000000 Zn 1 XXX 0.000000\n"));
        assert!(!text.contains(CRYSIN));
        assert!(sink.contains("sybyl type is not set"));
    }
}
