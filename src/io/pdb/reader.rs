use super::{INFO, PdbFormat};
use crate::io::error::Error;
use crate::io::fields::{char_at, column, parse_column};
use crate::io::text::TextFile;
use crate::model::atom::Atom;
use crate::model::cell::UnitCell;
use crate::model::frame::Frame;
use crate::model::residue::Residue;
use crate::model::types::{BondOrder, Point};
use crate::ops::{ResidueKey, ResidueLinker};
use crate::warnings::{WarningSink, warning};

const CONTEXT: &str = "PDB reader";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Record {
    Header,
    Title,
    Cryst1,
    Atom,
    Hetatm,
    Conect,
    Model,
    Endmdl,
    Ter,
    End,
    Helix,
    Sheet,
    Turn,
    Ignored,
    Unknown,
}

const IGNORED_RECORDS: &[&str] = &[
    "REMARK", "MASTER", "AUTHOR", "CAVEAT", "COMPND", "EXPDTA", "KEYWDS", "OBSLTE", "SOURCE",
    "SPLIT ", "SPRSDE", "JRNL  ", "SEQRES", "HET   ", "REVDAT", "SCALE1", "SCALE2", "SCALE3",
    "ORIGX1", "ORIGX2", "ORIGX3", "ANISOU", "SITE  ", "FORMUL", "DBREF ", "HETNAM", "HETSYN",
    "SSBOND", "LINK  ", "SEQADV", "MODRES", "CISPEP",
];

fn record(line: &str) -> Record {
    let name = column(line, 0, 6);
    match name {
        "ENDMDL" => Record::Endmdl,
        _ if name.starts_with("END") => Record::End,
        "CRYST1" => Record::Cryst1,
        "ATOM  " => Record::Atom,
        "HETATM" => Record::Hetatm,
        "CONECT" => Record::Conect,
        _ if name.starts_with("MODEL") => Record::Model,
        _ if name.starts_with("TER") => Record::Ter,
        "HELIX " => Record::Helix,
        "SHEET " => Record::Sheet,
        "TURN  " => Record::Turn,
        "HEADER" => Record::Header,
        "TITLE " => Record::Title,
        _ if IGNORED_RECORDS.contains(&name) => Record::Ignored,
        _ if line.trim().is_empty() => Record::Ignored,
        _ => Record::Unknown,
    }
}

/// Peeks at the next line without consuming it.
fn next_is_end(file: &mut TextFile) -> Result<bool, Error> {
    let position = file.tellg()?;
    let next = file.try_readline()?;
    file.seekg(position)?;
    Ok(next.is_some_and(|line| record(&line) == Record::End))
}

/// Skips one model and returns the offset where it started.
///
/// A model ends at an `END` record, or at an `ENDMDL` record not directly followed by `END`.
/// A file without any end record is a single frame, as long as it holds some content.
pub(super) fn skip_frame(file: &mut TextFile) -> Result<Option<u64>, Error> {
    let position = file.tellg()?;
    let mut has_content = false;
    while let Some(line) = file.try_readline()? {
        match record(&line) {
            Record::Endmdl if next_is_end(file)? => continue,
            Record::Endmdl | Record::End => return Ok(Some(position)),
            _ => has_content |= !line.trim().is_empty(),
        }
    }
    if position == 0 && has_content {
        Ok(Some(position))
    } else {
        Ok(None)
    }
}

impl PdbFormat {
    pub(super) fn read_frame(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        frame.clear();
        self.residues.clear();
        self.remap.clear();
        self.secondary.clear();

        let mut got_end = false;
        while !got_end {
            let Some(line) = file.try_readline()? else {
                break;
            };
            match record(&line) {
                Record::Header => {
                    if line.len() >= 66 {
                        frame.set("classification", column(&line, 10, 50).trim());
                        frame.set("deposition_date", column(&line, 50, 59).trim());
                        frame.set("pdb_idcode", column(&line, 62, 66).trim());
                    }
                }
                Record::Title => {
                    if line.len() >= 11 {
                        let title = format!("{}{}", frame.name().unwrap_or(""), column(&line, 10, 80));
                        frame.set("name", title.trim());
                    }
                }
                Record::Cryst1 => read_cryst1(file, frame, &line, sink)?,
                Record::Atom => self.read_atom(file, frame, &line, false, sink)?,
                Record::Hetatm => self.read_atom(file, frame, &line, true, sink)?,
                Record::Conect => self.read_conect(file, frame, &line, sink)?,
                Record::Model | Record::Ignored => {}
                Record::Endmdl => got_end = !next_is_end(file)?,
                Record::End => got_end = true,
                Record::Helix => self.secondary.read_helix(&line, sink),
                Record::Sheet => self.secondary.read_extended(&line, 21, 32, "SHEET", sink),
                Record::Turn => self.secondary.read_extended(&line, 19, 30, "TURN", sink),
                Record::Ter => {
                    if line.len() >= 12 {
                        match parse_column::<u64>(&line, 6, 11) {
                            Some(serial) => self.remap.push_terminator(serial),
                            None => warning!(sink, CONTEXT, "TER record not numeric: {}", line),
                        }
                    }
                    self.chain_ended(frame)?;
                }
                Record::Unknown => {
                    if !file.eof()? {
                        warning!(sink, CONTEXT, "ignoring unknown record: {}", line);
                    }
                }
            }
        }

        if !got_end {
            warning!(sink, CONTEXT, "missing END record in file");
        }

        self.chain_ended(frame)?;
        ResidueLinker::new()
            .context(CONTEXT)
            .link(frame.topology_mut(), sink)?;
        Ok(())
    }

    fn read_atom(
        &mut self,
        file: &TextFile,
        frame: &mut Frame,
        line: &str,
        hetatm: bool,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        if line.len() < 54 {
            return Err(Error::format(
                INFO.name,
                file.path_buf(),
                format!("{} record is too small: '{}'", column(line, 0, 6), line),
            ));
        }

        if !self.remap.is_seeded() {
            self.remap.seed(column(line, 6, 11), CONTEXT, sink);
        }

        let name = column(line, 12, 16).trim();
        let mut atom = match column(line, 76, 78).trim() {
            "" => Atom::new(name),
            element => Atom::with_type(name, element),
        };
        let altloc = char_at(line, 16);
        if altloc != ' ' {
            atom.set("altloc", altloc.to_string());
        }

        let (Some(x), Some(y), Some(z)) = (
            parse_column::<f64>(line, 30, 38),
            parse_column::<f64>(line, 38, 46),
            parse_column::<f64>(line, 46, 54),
        ) else {
            return Err(Error::format(
                INFO.name,
                file.path_buf(),
                format!("could not read positions in '{}'", line),
            ));
        };
        frame.add_atom(atom, Point::new(x, y, z), None);
        let index = frame.size() - 1;

        let Some(resid) = parse_column::<i64>(line, 22, 26) else {
            return Ok(());
        };
        let chain = char_at(line, 21);
        let inscode = char_at(line, 26);
        self.residues
            .entry(ResidueKey::new(chain, resid, inscode))
            .or_insert_with(|| {
                let mut residue = Residue::with_id(column(line, 17, 20).trim(), resid);
                if inscode != ' ' {
                    residue.set("insertion_code", inscode.to_string());
                }
                residue.set("is_standard_pdb", !hetatm);
                residue.set("chainid", chain.to_string());
                residue.set("chainname", chain.to_string());
                residue
            })
            .add_atom(index);
        Ok(())
    }

    fn read_conect(
        &self,
        file: &TextFile,
        frame: &mut Frame,
        line: &str,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        let length = line.trim().len();
        let read_index = |start: usize| -> Result<Option<usize>, Error> {
            let serial = parse_column::<u64>(line, start, start + 5).ok_or_else(|| {
                Error::format(
                    INFO.name,
                    file.path_buf(),
                    format!("could not read atomic number in '{}'", line),
                )
            })?;
            Ok(self.remap.resolve(serial))
        };

        let first = read_index(6)?;
        for start in [11, 16, 21, 26] {
            if length <= start {
                break;
            }
            let second = read_index(start)?;
            match (first, second) {
                (Some(i), Some(j)) if i < frame.size() && j < frame.size() => {
                    if i != j {
                        frame.add_bond(i, j, BondOrder::Unknown)?;
                    }
                }
                _ => warning!(
                    sink,
                    CONTEXT,
                    "ignoring CONECT ('{}') with atomic indexes bigger than frame size ({})",
                    line.trim(),
                    frame.size()
                ),
            }
        }
        Ok(())
    }

    /// Tags and flushes the residues of the chain that just ended.
    fn chain_ended(&mut self, frame: &mut Frame) -> Result<(), Error> {
        self.secondary.apply(&mut self.residues);
        for residue in std::mem::take(&mut self.residues).into_values() {
            frame.topology_mut().add_residue(residue)?;
        }
        Ok(())
    }
}

fn read_cryst1(
    file: &TextFile,
    frame: &mut Frame,
    line: &str,
    sink: &dyn WarningSink,
) -> Result<(), Error> {
    if line.len() < 54 {
        return Err(Error::format(
            INFO.name,
            file.path_buf(),
            format!("CRYST1 record '{}' is too small", line),
        ));
    }

    let fields = [(6, 15), (15, 24), (24, 33), (33, 40), (40, 47), (47, 54)]
        .map(|(start, end)| parse_column::<f64>(line, start, end));
    let [Some(a), Some(b), Some(c), Some(alpha), Some(beta), Some(gamma)] = fields else {
        return Err(Error::format(
            INFO.name,
            file.path_buf(),
            format!("could not read CRYST1 record '{}'", line),
        ));
    };
    frame.cell = UnitCell::from_lengths_angles([a, b, c], [alpha, beta, gamma]);

    let space_group = column(line, 55, 65).trim();
    if !space_group.is_empty() && space_group != "P 1" && space_group != "P1" {
        warning!(
            sink,
            CONTEXT,
            "ignoring custom space group ({}), using P1 instead",
            space_group
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_classified_by_their_first_six_columns() {
        assert_eq!(record("ENDMDL"), Record::Endmdl);
        assert_eq!(record("END"), Record::End);
        assert_eq!(record("ENDXYZ"), Record::End);
        assert_eq!(record("MODEL        1"), Record::Model);
        assert_eq!(record("TER"), Record::Ter);
        assert_eq!(record("HET    HEM  A 154      43"), Record::Ignored);
        assert_eq!(record("HETATM    1"), Record::Hetatm);
        assert_eq!(record("   "), Record::Ignored);
        assert_eq!(record("HELIX"), Record::Unknown);
    }
}
