//! Cambridge Structure Search and Retrieval files.
//!
//! A CSSR file holds exactly one structure: two cell lines, a count line carrying the
//! coordinate style, a title line, and one line per atom with up to eight bonded partners.

use super::error::Error;
use super::fields::{column_from, scan};
use super::format::{FormatInfo, TextFormat};
use super::text::TextFile;
use crate::model::atom::Atom;
use crate::model::cell::{CellShape, UnitCell};
use crate::model::frame::Frame;
use crate::model::types::{BondOrder, Point, Vector};
use crate::warnings::{WarningSink, warning};
use std::io::Write;

pub const INFO: FormatInfo = FormatInfo {
    name: "CSSR",
    extension: Some(".cssr"),
    description: "CSSR text format",
};

const CONTEXT: &str = "CSSR writer";
const MAX_PARTNERS: usize = 8;
const MAX_INDEX: usize = 9999;

#[derive(Debug, Default)]
pub struct CssrFormat {
    written: bool,
}

fn format_error(file: &TextFile, details: impl Into<String>) -> Error {
    Error::format(INFO.name, file.path_buf(), details)
}

/// Atom names are usually `<type><id>`, like `O121` or `H22`.
fn type_from_name(name: &str) -> &str {
    let end = name.find(|c: char| c.is_ascii_digit()).unwrap_or(name.len());
    &name[..end]
}

struct AtomLine<'a> {
    id: usize,
    name: &'a str,
    coordinates: Vector,
    partners: Vec<usize>,
    charge: f64,
}

fn parse_atom_line(line: &str) -> Option<AtomLine<'_>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let id = tokens.first()?.parse().ok()?;
    let name = *tokens.get(1)?;
    let [x, y, z] = scan::<f64, 3>(&tokens.get(2..5)?.join(" "))?;
    let partners = tokens
        .iter()
        .skip(5)
        .take(MAX_PARTNERS)
        .map(|token| token.parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .filter(|&partner| partner != 0)
        .collect();
    let charge = match tokens.get(5 + MAX_PARTNERS) {
        Some(token) => token.parse().ok()?,
        None => 0.0,
    };
    Some(AtomLine {
        id,
        name,
        coordinates: Vector::new(x, y, z),
        partners,
        charge,
    })
}

impl TextFormat for CssrFormat {
    fn info(&self) -> FormatInfo {
        INFO
    }

    fn read_next(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        _sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        if file.tellg()? != 0 {
            return Err(Error::unsupported(INFO.name, "reading more than one frame"));
        }

        let lengths_line = file.readline()?;
        let Some(lengths) = scan::<f64, 3>(column_from(&lengths_line, 38)) else {
            return Err(format_error(
                file,
                format!("could not read cell lengths in '{}'", lengths_line),
            ));
        };
        let angles_line = file.readline()?;
        let Some(angles) = scan::<f64, 3>(column_from(&angles_line, 21)) else {
            return Err(format_error(
                file,
                format!("could not read cell angles in '{}'", angles_line),
            ));
        };

        frame.clear();
        frame.cell = UnitCell::from_lengths_angles(lengths, angles);

        let counts = file.readline()?;
        let mut tokens = counts.split_whitespace();
        let Some(natoms) = tokens.next().and_then(|n| n.parse::<usize>().ok()) else {
            return Err(format_error(
                file,
                format!("could not read atom count in '{}'", counts),
            ));
        };
        let fractional = tokens.next().and_then(|s| s.parse::<i32>().ok()) == Some(0);

        let title = file.readline()?;
        if !title.trim().is_empty() {
            frame.set("name", title.trim());
        }

        let mut connectivity = vec![Vec::new(); natoms];
        for line in file.readlines(natoms)? {
            let Some(parsed) = parse_atom_line(&line) else {
                return Err(format_error(file, format!("invalid atom line '{}'", line)));
            };
            if parsed.id == 0 || parsed.id > natoms {
                return Err(format_error(
                    file,
                    format!("atom id {} is out of range in '{}'", parsed.id, line),
                ));
            }

            let position = if fractional {
                frame.cell.cartesian(&parsed.coordinates)
            } else {
                Point::from(parsed.coordinates)
            };
            let mut atom = Atom::with_type(parsed.name, type_from_name(parsed.name));
            atom.set_charge(parsed.charge);
            frame.add_atom(atom, position, None);

            connectivity[parsed.id - 1].extend(parsed.partners.iter().map(|partner| partner - 1));
        }

        for (i, partners) in connectivity.iter().enumerate() {
            for &j in partners {
                if i != j {
                    frame.add_bond(i, j, BondOrder::Unknown)?;
                }
            }
        }
        Ok(())
    }

    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>, Error> {
        if file.tellg()? == 0 && !file.eof()? {
            file.skipline()?;
            Ok(Some(0))
        } else {
            Ok(None)
        }
    }

    fn write_next(
        &mut self,
        out: &mut dyn Write,
        frame: &Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        if self.written {
            return Err(Error::unsupported(INFO.name, "writing more than one frame"));
        }
        self.written = true;

        let io = |e| Error::from_io(e, None);
        let cell = &frame.cell;
        let cartesian = cell.shape() == CellShape::Infinite;

        writeln!(
            out,
            " REFERENCE STRUCTURE = 00000   A,B,C ={:8.3}{:8.3}{:8.3}",
            cell.a(),
            cell.b(),
            cell.c()
        )
        .map_err(io)?;
        writeln!(
            out,
            "   ALPHA,BETA,GAMMA ={:8.3}{:8.3}{:8.3}    SPGR =  1 P1",
            cell.alpha(),
            cell.beta(),
            cell.gamma()
        )
        .map_err(io)?;

        let style = if cartesian { 1 } else { 0 };
        if frame.size() > MAX_INDEX {
            warning!(
                sink,
                CONTEXT,
                "too many atoms, the file might not open with other programs"
            );
            writeln!(out, "{} {}", frame.size(), style).map_err(io)?;
        } else {
            writeln!(out, "{:>4}   {}", frame.size(), style).map_err(io)?;
        }
        writeln!(out, " {}", frame.name().unwrap_or("file created with chem-forge")).map_err(io)?;

        let mut connectivity = vec![Vec::new(); frame.size()];
        for bond in frame.topology().bonds() {
            if bond.a2_idx >= MAX_INDEX {
                warning!(
                    sink,
                    CONTEXT,
                    "atomic index is too big for connectivity record, removing the bond"
                );
                continue;
            }
            connectivity[bond.a1_idx].push(bond.a2_idx);
            connectivity[bond.a2_idx].push(bond.a1_idx);
        }

        for (i, (atom, position)) in frame
            .topology()
            .atoms()
            .iter()
            .zip(frame.positions())
            .enumerate()
        {
            let id = if i < MAX_INDEX {
                (i + 1).to_string()
            } else {
                "****".to_string()
            };
            let coordinates = if cartesian {
                position.coords
            } else {
                cell.fractional(position).unwrap_or(position.coords)
            };
            write!(
                out,
                "{:>4} {:<4}  {:>9.5} {:>9.5} {:>9.5}",
                id,
                atom.name.as_str(),
                coordinates.x,
                coordinates.y,
                coordinates.z
            )
            .map_err(io)?;

            let partners = &connectivity[i];
            if partners.len() > MAX_PARTNERS {
                warning!(
                    sink,
                    CONTEXT,
                    "too many bonds with atom {}, only {} are supported",
                    i,
                    MAX_PARTNERS
                );
            }
            for slot in 0..MAX_PARTNERS {
                let partner = partners.get(slot).map_or(0, |j| j + 1);
                write!(out, "{:>4}", partner).map_err(io)?;
            }
            writeln!(out, " {:>7.3}", atom.charge()).map_err(io)?;
        }
        Ok(())
    }
}
