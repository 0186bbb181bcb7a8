use super::INFO;
use super::style::AtomStyle;
use crate::io::error::Error;
use crate::io::text::TextFile;
use crate::model::atom::Atom;
use crate::model::cell::{CellShape, UnitCell};
use crate::model::frame::Frame;
use crate::model::residue::Residue;
use crate::model::types::{BondOrder, Vector};
use crate::warnings::{WarningSink, warning};
use nalgebra::Matrix3;
use std::collections::{BTreeMap, HashMap};

const CONTEXT: &str = "LAMMPS Data reader";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Atoms,
    Masses,
    Bonds,
    Velocities,
    Ignored,
}

/// Sections we skip, force field parameters included.
const IGNORED_SECTIONS: &[&str] = &[
    "Ellipsoids",
    "Lines",
    "Triangles",
    "Bodies",
    "Pair Coeffs",
    "PairIJ Coeffs",
    "Bond Coeffs",
    "Angle Coeffs",
    "Dihedral Coeffs",
    "Improper Coeffs",
    "BondBond Coeffs",
    "BondAngle Coeffs",
    "MiddleBondTorsion Coeffs",
    "EndBondTorsion Coeffs",
    "AngleTorsion Coeffs",
    "AngleAngleTorsion Coeffs",
    "BondBond13 Coeffs",
    "AngleAngle Coeffs",
];

/// Header lines whose counts are not needed to decode the file.
const UNUSED_HEADERS: &[&str] = &[
    "angles",
    "dihedrals",
    "impropers",
    "bond types",
    "angle types",
    "dihedral types",
    "improper types",
    "extra bond per atom",
    "extra angle per atom",
    "extra dihedral per atom",
    "extra improper per atom",
    "extra special per atom",
    "ellipsoids",
    "lines",
    "triangles",
    "bodies",
];

/// Splits a line into its data and its comment.
fn split_comment(line: &str) -> (&str, &str) {
    match line.split_once('#') {
        Some((data, comment)) => (data, comment),
        None => (line, ""),
    }
}

/// Reads `id vx vy vz`, returning the 0-based index.
fn parse_velocity(tokens: &[&str]) -> Option<(usize, Vector)> {
    let [id, vx, vy, vz, ..] = tokens else {
        return None;
    };
    let index = id.parse::<usize>().ok()?.checked_sub(1)?;
    let velocity = Vector::new(vx.parse().ok()?, vy.parse().ok()?, vz.parse().ok()?);
    Some((index, velocity))
}

/// Decoding state for a single data file.
pub(super) struct DataReader<'a> {
    file: &'a mut TextFile,
    sink: &'a dyn WarningSink,
    natoms: usize,
    nbonds: usize,
    natom_types: usize,
    style: Option<String>,
    masses: HashMap<String, f64>,
    names: Vec<Option<String>>,
}

impl<'a> DataReader<'a> {
    pub fn new(file: &'a mut TextFile, sink: &'a dyn WarningSink) -> Self {
        Self {
            file,
            sink,
            natoms: 0,
            nbonds: 0,
            natom_types: 0,
            style: None,
            masses: HashMap::new(),
            names: Vec::new(),
        }
    }

    fn error(&self, details: impl Into<String>) -> Error {
        Error::format(INFO.name, self.file.path_buf(), details)
    }

    pub fn read(mut self, frame: &mut Frame) -> Result<(), Error> {
        frame.clear();

        // VMD topotools writes the atom style in the first comment line
        let comment = self.file.readline()?;
        if let Some((_, rest)) = comment.split_once("atom_style") {
            self.style = rest.split_whitespace().next().map(str::to_string);
        }

        let mut section = self.read_header(frame)?;
        while let Some(current) = section {
            section = match current {
                Section::Atoms => self.read_atoms(frame)?,
                Section::Masses => self.read_masses()?,
                Section::Bonds => self.read_bonds(frame)?,
                Section::Velocities => self.read_velocities(frame)?,
                Section::Ignored => self.skip_to_next_section()?,
            };
        }

        for atom in frame.topology_mut().atoms_mut() {
            if let Some(&mass) = self.masses.get(atom.atom_type.as_str()) {
                atom.set_mass(mass);
            }
        }
        for (atom, name) in frame.topology_mut().atoms_mut().iter_mut().zip(&self.names) {
            if let Some(name) = name {
                atom.name = name.as_str().into();
                atom.atom_type = name.as_str().into();
            }
        }
        Ok(())
    }

    /// Classifies a section title line, picking up the atom style of `Atoms # style`.
    fn section(&mut self, line: &str) -> Option<Section> {
        let (title, comment) = split_comment(line);
        let title = title.trim();
        match title {
            "Atoms" => {
                if !comment.trim().is_empty() {
                    self.style = Some(comment.trim().to_string());
                }
                Some(Section::Atoms)
            }
            "Bonds" => Some(Section::Bonds),
            "Velocities" => Some(Section::Velocities),
            "Masses" => Some(Section::Masses),
            // bonded terms are rebuilt from the bonds
            "Angles" | "Dihedrals" | "Impropers" => Some(Section::Ignored),
            _ if IGNORED_SECTIONS.contains(&title) => {
                if !title.contains("Coeffs") {
                    warning!(self.sink, CONTEXT, "ignoring section '{}'", title);
                }
                Some(Section::Ignored)
            }
            _ => None,
        }
    }

    fn next_section(&mut self) -> Result<Option<Section>, Error> {
        while let Some(line) = self.file.try_readline()? {
            if line.trim().is_empty() {
                continue;
            }
            return match self.section(&line) {
                Some(section) => Ok(Some(section)),
                None => Err(self.error(format!("expected section name, got '{}'", line))),
            };
        }
        Ok(None)
    }

    fn skip_to_next_section(&mut self) -> Result<Option<Section>, Error> {
        while let Some(line) = self.file.try_readline()? {
            if let Some(section) = self.section(&line) {
                return Ok(Some(section));
            }
        }
        Ok(None)
    }

    fn header_integer(&self, content: &str, context: &str) -> Result<usize, Error> {
        let tokens: Vec<&str> = content.split_whitespace().collect();
        let count = match tokens.as_slice() {
            [count, _, ..] => count.parse().ok(),
            _ => None,
        };
        count.ok_or_else(|| {
            self.error(format!(
                "invalid header value: expected '<n> {}', got '{}'",
                context, content
            ))
        })
    }

    fn header_length(&self, content: &str, context: &str) -> Result<f64, Error> {
        let tokens: Vec<&str> = content.split_whitespace().collect();
        let bounds = match tokens.as_slice() {
            [lo, hi, _, _, ..] => lo.parse::<f64>().ok().zip(hi.parse::<f64>().ok()),
            _ => None,
        };
        bounds.map(|(lo, hi)| hi - lo).ok_or_else(|| {
            self.error(format!(
                "invalid header value: expected '<lo> <hi> {}', got '{}'",
                context, content
            ))
        })
    }

    fn read_header(&mut self, frame: &mut Frame) -> Result<Option<Section>, Error> {
        let mut matrix = Matrix3::zeros();
        let mut triclinic = false;

        let title = loop {
            let Some(line) = self.file.try_readline()? else {
                break None;
            };
            let content = split_comment(&line).0.trim();
            if content.is_empty() || UNUSED_HEADERS.iter().any(|h| content.contains(h)) {
                continue;
            }

            if content.contains("atoms") {
                self.natoms = self.header_integer(content, "atoms")?;
            } else if content.contains("bonds") {
                self.nbonds = self.header_integer(content, "bonds")?;
            } else if content.contains("atom types") {
                self.natom_types = self.header_integer(content, "atom types")?;
            } else if content.contains("xlo xhi") {
                matrix[(0, 0)] = self.header_length(content, "xlo xhi")?;
            } else if content.contains("ylo yhi") {
                matrix[(1, 1)] = self.header_length(content, "ylo yhi")?;
            } else if content.contains("zlo zhi") {
                matrix[(2, 2)] = self.header_length(content, "zlo zhi")?;
            } else if content.contains("xy xz yz") {
                let tilts: Vec<f64> = content
                    .split_whitespace()
                    .take(3)
                    .filter_map(|value| value.parse().ok())
                    .collect();
                let [xy, xz, yz] = tilts.as_slice() else {
                    return Err(self.error(format!(
                        "invalid header value: expected '<xy> <xz> <yz> xy xz yz', got '{}'",
                        content
                    )));
                };
                matrix[(0, 1)] = *xy;
                matrix[(0, 2)] = *xz;
                matrix[(1, 2)] = *yz;
                triclinic = true;
            } else {
                break Some(line);
            }
        };

        frame.cell = UnitCell::from_matrix(matrix);
        if triclinic {
            frame.cell.set_shape(CellShape::Triclinic);
        }

        match title {
            None => Ok(None),
            Some(line) => match self.section(&line) {
                Some(section) => Ok(Some(section)),
                None => Err(self.error(format!("expected section name, got '{}'", line))),
            },
        }
    }

    fn read_atoms(&mut self, frame: &mut Frame) -> Result<Option<Section>, Error> {
        if self.natoms == 0 {
            return Err(self.error("missing atoms count in header"));
        }

        let name = match &self.style {
            Some(name) => name.clone(),
            None => {
                warning!(self.sink, CONTEXT, "unknown atom style, defaulting to 'full'");
                "full".to_string()
            }
        };
        let style = AtomStyle::from_name(&name)
            .ok_or_else(|| self.error(format!("unknown atom style '{}'", name)))?;
        if style == AtomStyle::Hybrid {
            warning!(
                self.sink,
                CONTEXT,
                "only reading the first style for atom_style hybrid"
            );
        }

        frame.resize(self.natoms);
        self.names = vec![None; self.natoms];
        let mut residues: BTreeMap<usize, Residue> = BTreeMap::new();

        let mut count = 0;
        while count < self.natoms {
            let Some(line) = self.file.try_readline()? else {
                return Err(self.error("end of file found before getting all atoms"));
            };
            let (data, comment) = split_comment(&line);
            if data.trim().is_empty() {
                continue;
            }

            let parsed = style.parse(data).ok_or_else(|| {
                self.error(format!("invalid line for atom style {}: {}", name, line))
            })?;
            let index = parsed.id.checked_sub(1).unwrap_or(count);
            if index >= self.natoms {
                return Err(self.error(format!(
                    "too many atoms in [Atoms] section: expected {} atoms, got atom with index {}",
                    self.natoms, index
                )));
            }

            if let Some(atom_name) = comment.split_whitespace().next() {
                self.names[index] = Some(atom_name.to_string());
            }

            let mut atom = Atom::new(&parsed.atom_type.to_string());
            if let Some(charge) = parsed.charge {
                atom.set_charge(charge);
            }
            if let Some(mass) = parsed.mass {
                atom.set_mass(mass);
            }
            if parsed.molecule != 0 {
                residues
                    .entry(parsed.molecule)
                    .or_insert_with(|| Residue::with_id("", parsed.molecule as i64))
                    .add_atom(index);
            }

            if let Some(slot) = frame.topology_mut().atom_mut(index) {
                *slot = atom;
            }
            frame.positions_mut()[index] = parsed.position;
            count += 1;
        }

        for residue in residues.into_values() {
            frame.topology_mut().add_residue(residue)?;
        }
        self.next_section()
    }

    fn read_masses(&mut self) -> Result<Option<Section>, Error> {
        if self.natom_types == 0 {
            return Err(self.error("missing atom types count in header"));
        }

        let mut count = 0;
        while count < self.natom_types {
            let Some(line) = self.file.try_readline()? else {
                break;
            };
            let data = split_comment(&line).0;
            if data.trim().is_empty() {
                continue;
            }
            let tokens: Vec<&str> = data.split_whitespace().collect();
            let mass = match tokens.as_slice() {
                [atom_type, mass] => mass.parse::<f64>().ok().map(|m| (atom_type.to_string(), m)),
                _ => None,
            };
            let Some((atom_type, mass)) = mass else {
                return Err(self.error(format!("bad mass specification '{}'", line)));
            };
            self.masses.insert(atom_type, mass);
            count += 1;
        }
        self.next_section()
    }

    fn read_bonds(&mut self, frame: &mut Frame) -> Result<Option<Section>, Error> {
        if self.nbonds == 0 {
            return Err(self.error("missing bonds count in header"));
        }

        let mut count = 0;
        while count < self.nbonds {
            let Some(line) = self.file.try_readline()? else {
                return Err(self.error("end of file found before getting all bonds"));
            };
            let data = split_comment(&line).0;
            if data.trim().is_empty() {
                continue;
            }
            let tokens: Vec<&str> = data.split_whitespace().collect();
            let atoms = match tokens.as_slice() {
                [_, _, i, j] => i.parse::<usize>().ok().zip(j.parse::<usize>().ok()),
                _ => None,
            };
            let Some((i, j)) = atoms.filter(|&(i, j)| i > 0 && j > 0) else {
                return Err(self.error(format!("bad bond specification '{}'", line)));
            };
            frame.add_bond(i - 1, j - 1, BondOrder::Unknown)?;
            count += 1;
        }
        self.next_section()
    }

    fn read_velocities(&mut self, frame: &mut Frame) -> Result<Option<Section>, Error> {
        if self.natoms == 0 {
            return Err(self.error("missing atoms count in header"));
        }
        frame.add_velocities();

        let mut count = 0;
        while count < self.natoms {
            let Some(line) = self.file.try_readline()? else {
                return Err(self.error("end of file found before getting all velocities"));
            };
            let data = split_comment(&line).0;
            if data.trim().is_empty() {
                continue;
            }
            let tokens: Vec<&str> = data.split_whitespace().collect();
            let velocity = parse_velocity(&tokens).filter(|&(id, _)| id < self.natoms);
            let Some((index, velocity)) = velocity else {
                return Err(self.error(format!("bad velocity specification '{}'", line)));
            };
            if let Some(velocities) = frame.velocities_mut() {
                velocities[index] = velocity;
            }
            count += 1;
        }
        self.next_section()
    }
}
