//! Protein Data Bank files.
//!
//! A PDB file holds one or more models separated by `ENDMDL`/`END` records. The reader
//! rebuilds residues from ATOM/HETATM records, bonds from CONECT records and the residue
//! templates, and secondary structure from HELIX/SHEET/TURN records. The writer emits one
//! MODEL block per frame and a single `END` record once finished.

mod reader;
mod writer;

use super::error::Error;
use super::format::{FormatInfo, TextFormat};
use super::text::TextFile;
use crate::model::frame::Frame;
use crate::model::residue::Residue;
use crate::ops::{AtomIdRemap, ResidueKey, SecondaryStructure};
use crate::warnings::WarningSink;
use std::collections::BTreeMap;
use std::io::Write;

pub const INFO: FormatInfo = FormatInfo {
    name: "PDB",
    extension: Some(".pdb"),
    description: "PDB (RCSB Protein Data Bank) text format",
};

/// Per-file state of the PDB codec.
#[derive(Debug, Default)]
pub struct PdbFormat {
    residues: BTreeMap<ResidueKey, Residue>,
    remap: AtomIdRemap,
    secondary: SecondaryStructure,
    models: usize,
    written: bool,
}

impl TextFormat for PdbFormat {
    fn info(&self) -> FormatInfo {
        INFO
    }

    fn read_next(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        self.read_frame(file, frame, sink)
    }

    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>, Error> {
        reader::skip_frame(file)
    }

    fn write_next(
        &mut self,
        out: &mut dyn Write,
        frame: &Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        self.write_frame(out, frame, sink)
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<(), Error> {
        if self.written {
            writeln!(out, "END").map_err(|e| Error::from_io(e, None))?;
            self.written = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::cell::{CellShape, UnitCell};
    use crate::model::property::Property;
    use crate::model::types::{BondOrder, Point};
    use crate::warnings::CollectingSink;

    /// Places each field at its column, padding the gaps with spaces.
    fn record(fields: &[(usize, &str)]) -> String {
        let mut line = String::new();
        for &(column, text) in fields {
            while line.len() < column {
                line.push(' ');
            }
            line.push_str(text);
        }
        line
    }

    #[allow(clippy::too_many_arguments)]
    fn atom_line(
        record: &str,
        serial: usize,
        name: &str,
        resname: &str,
        chain: char,
        resid: i64,
        position: [f64; 3],
        element: &str,
    ) -> String {
        format!(
            "{:<6}{:>5} {:<4} {:<3} {}{:>4}    {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}",
            record, serial, name, resname, chain, resid, position[0], position[1], position[2],
            1.0, 0.0, element
        )
    }

    fn sample() -> String {
        let mut lines = vec![
            record(&[(0, "HEADER"), (10, "HYDROLASE"), (50, "01-JAN-00"), (62, "1ABC")]),
            "TITLE     A SMALL TEST".to_string(),
            "REMARK   2 RESOLUTION. 1.80 ANGSTROMS.".to_string(),
            format!(
                "CRYST1{:9.3}{:9.3}{:9.3}{:7.2}{:7.2}{:7.2} P 1           1",
                10.0, 20.0, 30.0, 90.0, 90.0, 90.0
            ),
            record(&[
                (0, "HELIX"),
                (7, "1"),
                (11, "1"),
                (15, "GLY"),
                (19, "A"),
                (24, "1"),
                (27, "GLY"),
                (31, "A"),
                (36, "2"),
                (39, "1"),
            ]),
        ];
        let backbone = [("N", 0.0), ("CA", 1.4), ("C", 2.0), ("O", 3.2)];
        let mut serial = 1;
        for resid in 1..=2 {
            for (name, x) in backbone {
                let x = x + 3.8 * (resid - 1) as f64;
                lines.push(atom_line("ATOM", serial, name, "GLY", 'A', resid, [x, 0.0, 0.0], &name[..1]));
                serial += 1;
            }
        }
        lines.push(record(&[(0, "TER"), (7, "9"), (17, "GLY"), (21, "A"), (25, "2")]));
        lines.push(atom_line("HETATM", 10, "C1", "LIG", 'B', 3, [5.0, 5.0, 5.0], "C"));
        lines.push(atom_line("HETATM", 11, "O1", "LIG", 'B', 3, [6.2, 5.0, 5.0], "O"));
        lines.push("CONECT   10   11".to_string());
        lines.push("END".to_string());
        lines.join("\n") + "\n"
    }

    fn read(content: &str) -> (Frame, CollectingSink) {
        let sink = CollectingSink::new();
        let mut file = TextFile::from_string(content);
        let mut frame = Frame::new();
        PdbFormat::default()
            .read_next(&mut file, &mut frame, &sink)
            .unwrap();
        (frame, sink)
    }

    fn write(frames: &[&Frame]) -> (String, CollectingSink) {
        let sink = CollectingSink::new();
        let mut format = PdbFormat::default();
        let mut out = Vec::new();
        for frame in frames {
            format.write_next(&mut out, frame, &sink).unwrap();
        }
        format.finish(&mut out).unwrap();
        (String::from_utf8(out).unwrap(), sink)
    }

    #[test]
    fn reads_metadata_atoms_and_cell() {
        let (frame, sink) = read(&sample());

        assert_eq!(frame.size(), 10);
        assert_eq!(frame.get("classification").and_then(Property::as_str), Some("HYDROLASE"));
        assert_eq!(frame.get("deposition_date").and_then(Property::as_str), Some("01-JAN-00"));
        assert_eq!(frame.get("pdb_idcode").and_then(Property::as_str), Some("1ABC"));
        assert_eq!(frame.name(), Some("A SMALL TEST"));

        assert_eq!(frame.cell.shape(), CellShape::Orthorhombic);
        assert!((frame.cell.c() - 30.0).abs() < 1e-9);

        let ca = &frame.topology().atoms()[1];
        assert_eq!(ca.name, "CA");
        assert_eq!(ca.atom_type, "C");
        assert_eq!(frame.positions()[4], Point::new(3.8, 0.0, 0.0));
        assert!(sink.is_empty(), "{:?}", sink.messages());
    }

    #[test]
    fn residues_carry_chain_and_secondary_structure() {
        let (frame, _) = read(&sample());
        let residues = frame.topology().residues();

        assert_eq!(residues.len(), 3);
        assert_eq!(residues[0].name, "GLY");
        assert_eq!(residues[0].id, Some(1));
        assert_eq!(residues[0].chain_id(), Some("A"));
        assert_eq!(residues[0].get("is_standard_pdb").and_then(Property::as_bool), Some(true));
        for residue in &residues[..2] {
            assert_eq!(
                residue.get("secondary_structure").and_then(Property::as_str),
                Some("alpha helix")
            );
        }

        assert_eq!(residues[2].name, "LIG");
        assert_eq!(residues[2].get("is_standard_pdb").and_then(Property::as_bool), Some(false));
        assert_eq!(residues[2].get("secondary_structure"), None);
    }

    #[test]
    fn bonds_come_from_templates_links_and_conect_records() {
        let (frame, _) = read(&sample());
        let topology = frame.topology();

        assert!(topology.are_bonded(0, 1));
        assert_eq!(topology.bond_order(2, 3), Some(BondOrder::Double));
        // peptide bond between C of GLY 1 and N of GLY 2
        assert!(topology.are_bonded(2, 4));
        // CONECT 10 11 after TER 9 resolves to atoms 8 and 9
        assert!(topology.are_bonded(8, 9));
        assert_eq!(topology.bond_count(), 8);
    }

    #[test]
    fn offset_serials_are_remapped() {
        let content = [
            atom_line("HETATM", 100, "C1", "LIG", 'A', 1, [0.0, 0.0, 0.0], "C"),
            atom_line("HETATM", 101, "C2", "LIG", 'A', 1, [1.5, 0.0, 0.0], "C"),
            "CONECT  100  101".to_string(),
            "CONECT  100  205".to_string(),
            "END".to_string(),
        ]
        .join("\n");
        let (frame, sink) = read(&content);

        assert!(frame.topology().are_bonded(0, 1));
        assert_eq!(frame.topology().bond_count(), 1);
        assert!(sink.contains("ignoring CONECT ('CONECT  100  205') with atomic indexes bigger than frame size (2)"));
    }

    #[test]
    fn conect_records_span_several_terminated_chains() {
        let mut lines = Vec::new();
        let mut serial = 1;
        for chain in ['A', 'B', 'C'] {
            for name in ["C1", "C2"] {
                let x = 1.5 * serial as f64;
                lines.push(atom_line("HETATM", serial, name, "LIG", chain, 1, [x, 0.0, 0.0], "C"));
                serial += 1;
            }
            lines.push(record(&[(0, "TER"), (6, &format!("{:>5}", serial)), (17, "LIG")]));
            serial += 1;
        }
        for (i, j) in [(1, 2), (2, 4), (4, 5), (5, 7), (7, 8)] {
            lines.push(format!("CONECT{:>5}{:>5}", i, j));
        }
        lines.push("END".to_string());
        let (frame, sink) = read(&(lines.join("\n") + "\n"));

        let bonds: Vec<(usize, usize)> = frame
            .topology()
            .bonds()
            .map(|bond| (bond.a1_idx, bond.a2_idx))
            .collect();
        assert_eq!(frame.size(), 6);
        assert_eq!(bonds, [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
        assert!(sink.is_empty(), "{:?}", sink.messages());
    }

    #[test]
    fn terminator_before_the_first_atom_seeds_the_remap() {
        let content = [
            record(&[(0, "TER"), (10, "1"), (17, "LIG")]),
            atom_line("HETATM", 2, "C1", "LIG", 'A', 1, [0.0, 0.0, 0.0], "C"),
            atom_line("HETATM", 3, "C2", "LIG", 'A', 1, [1.5, 0.0, 0.0], "C"),
            "CONECT    2    3".to_string(),
            "END".to_string(),
        ]
        .join("\n");
        let (frame, sink) = read(&content);

        assert_eq!(frame.size(), 2);
        assert!(frame.topology().are_bonded(0, 1));
        assert_eq!(frame.topology().bond_count(), 1);
        assert!(sink.is_empty(), "{:?}", sink.messages());
    }

    #[test]
    fn unknown_records_and_missing_end_are_reported() {
        let content = [
            "FOOBAR this is not a record".to_string(),
            atom_line("ATOM", 1, "C", "XYZ", 'A', 1, [0.0, 0.0, 0.0], "C"),
            "REMARK last line".to_string(),
        ]
        .join("\n");
        let (frame, sink) = read(&content);

        assert_eq!(frame.size(), 1);
        assert!(sink.contains("PDB reader: ignoring unknown record: FOOBAR this is not a record"));
        assert!(sink.contains("missing END record in file"));
    }

    #[test]
    fn malformed_mandatory_fields_are_format_errors() {
        let sink = CollectingSink::new();
        for content in [
            "CRYST1   10.000   20.000\n",
            "ATOM      1  C   XYZ A   1       0.000   abcde   0.000  1.00  0.00           C\n",
            "ATOM      1  C\n",
        ] {
            let mut file = TextFile::from_string(content);
            let err = PdbFormat::default()
                .read_next(&mut file, &mut Frame::new(), &sink)
                .unwrap_err();
            assert!(matches!(err, Error::Format { format: "PDB", .. }), "{err}");
        }
    }

    #[test]
    fn custom_space_groups_are_ignored_with_a_warning() {
        let content = format!(
            "CRYST1{:9.3}{:9.3}{:9.3}{:7.2}{:7.2}{:7.2} P 21 21 21    4\nEND\n",
            10.0, 10.0, 10.0, 90.0, 90.0, 120.0
        );
        let (frame, sink) = read(&content);

        assert_eq!(frame.cell.shape(), CellShape::Triclinic);
        assert!((frame.cell.gamma() - 120.0).abs() < 1e-6);
        assert!(sink.contains("ignoring custom space group (P 21 21 21)"));
    }

    #[test]
    fn forward_counts_endmdl_followed_by_end_once() {
        let content = "MODEL        1\nATOM\nENDMDL\nMODEL        2\nATOM\nENDMDL\nEND\n\n";
        let mut file = TextFile::from_string(content);
        let mut format = PdbFormat::default();

        assert_eq!(reader::skip_frame(&mut file).unwrap(), Some(0));
        assert_eq!(format.forward(&mut file).unwrap(), Some(27));
        assert_eq!(format.forward(&mut file).unwrap(), None);
    }

    #[test]
    fn forward_tolerates_a_single_frame_without_end() {
        let mut file = TextFile::from_string("ATOM\nATOM\n");
        assert_eq!(reader::skip_frame(&mut file).unwrap(), Some(0));
        assert_eq!(reader::skip_frame(&mut file).unwrap(), None);

        let mut empty = TextFile::from_string("\n\n");
        assert_eq!(reader::skip_frame(&mut empty).unwrap(), None);
    }

    #[test]
    fn written_frames_read_back_with_atoms_bonds_and_cell() {
        let (frame, _) = read(&sample());
        let (text, sink) = write(&[&frame]);
        assert!(sink.is_empty(), "{:?}", sink.messages());

        let (back, _) = read(&text);
        assert_eq!(back.size(), frame.size());
        assert_eq!(back.topology().bond_count(), frame.topology().bond_count());
        assert_eq!(back.cell.lengths(), frame.cell.lengths());
        for (a, b) in back.positions().iter().zip(frame.positions()) {
            assert!((a - b).norm() < 1e-3);
        }
        let names: Vec<&str> = back.topology().residues().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["GLY", "GLY", "LIG"]);
    }

    #[test]
    fn writer_layout_follows_fixed_columns() {
        let mut frame = Frame::new();
        frame.cell = UnitCell::from_lengths(10.0, 10.0, 10.0);
        frame.add_atom(Atom::new("O"), Point::new(1.0, 2.0, 3.0), None);
        let (text, _) = write(&[&frame, &frame]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "MODEL    1");
        assert_eq!(
            lines[1],
            "CRYST1   10.000   10.000   10.000  90.00  90.00  90.00 P 1           1"
        );
        assert_eq!(
            lines[2],
            "HETATM    1 O    XXX X   1       1.000   2.000   3.000  1.00  0.00           O"
        );
        assert_eq!(lines[3], "ENDMDL");
        assert_eq!(lines[4], "MODEL    2");
        assert_eq!(lines.last(), Some(&"END"));
        assert_eq!(lines.iter().filter(|l| **l == "END").count(), 1);
    }

    #[test]
    fn conect_records_hold_at_most_four_partners() {
        let mut frame = Frame::new();
        for n in 0..6 {
            frame.add_atom(Atom::new("C"), Point::new(n as f64, 0.0, 0.0), None);
        }
        for j in 1..6 {
            frame.add_bond(0, j, BondOrder::Single).unwrap();
        }
        let (text, _) = write(&[&frame]);
        let conect: Vec<&str> = text.lines().filter(|l| l.starts_with("CONECT")).collect();

        assert_eq!(conect[0], "CONECT    1    2    3    4    5");
        assert_eq!(conect[1], "CONECT    1    6");
        assert_eq!(conect.len(), 2 + 5);
    }

    #[test]
    fn long_residue_fields_are_truncated_with_warnings() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::new("C"), Point::origin(), None);
        let mut residue = Residue::with_id("LONGNAME", 12345);
        residue.set("chainid", "AB");
        residue.add_atom(0);
        frame.topology_mut().add_residue(residue).unwrap();

        let (text, sink) = write(&[&frame]);
        let atom = text.lines().find(|l| l.starts_with("HETATM")).unwrap();

        assert_eq!(&atom[17..20], "LON");
        assert_eq!(&atom[21..22], "A");
        assert_eq!(&atom[22..26], "  -1");
        assert!(sink.contains("residue 'LONGNAME' name is too long"));
        assert!(sink.contains("too many residues, removing residue id 12345"));
        assert!(sink.contains("chain id is too long"));
    }

    #[test]
    fn oversized_cells_can_not_be_written() {
        let mut frame = Frame::new();
        frame.cell = UnitCell::from_lengths(1e10, 1.0, 1.0);
        let mut out = Vec::new();
        let err = PdbFormat::default()
            .write_next(&mut out, &frame, &CollectingSink::new())
            .unwrap_err();
        assert!(err.to_string().contains("too big for representation in PDB format"));
    }

    #[test]
    fn serials_above_five_digits_are_starred() {
        assert_eq!(writer::pdb_index(0), "1");
        assert_eq!(writer::pdb_index(99_998), "99999");
        assert_eq!(writer::pdb_index(99_999), "*****");
    }
}
