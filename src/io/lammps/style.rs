//! Column layouts of the `Atoms` section for every supported `atom_style`.

use crate::model::types::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AtomStyle {
    Angle,
    Atomic,
    Body,
    Bond,
    Charge,
    Dipole,
    Dpd,
    Electron,
    Ellipsoid,
    Full,
    Line,
    Meso,
    Molecular,
    Peri,
    Smd,
    Sphere,
    Template,
    Tri,
    Wavepacket,
    Hybrid,
}

/// Token positions of the fields we keep. The atom id is always the first token and the
/// three coordinates are consecutive.
struct Layout {
    molecule: Option<usize>,
    atom_type: usize,
    charge: Option<usize>,
    mass: Option<usize>,
    position: usize,
}

const fn layout(
    molecule: Option<usize>,
    atom_type: usize,
    charge: Option<usize>,
    mass: Option<usize>,
    position: usize,
) -> Layout {
    Layout {
        molecule,
        atom_type,
        charge,
        mass,
        position,
    }
}

/// Decoded line of the `Atoms` section.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct AtomLine {
    /// 1-based id, `0` when the file does not care about ids.
    pub id: usize,
    /// Molecule id, `0` when absent.
    pub molecule: usize,
    pub atom_type: usize,
    pub charge: Option<f64>,
    pub mass: Option<f64>,
    pub position: Point,
}

impl AtomStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        let style = match name {
            "angle" => Self::Angle,
            "atomic" => Self::Atomic,
            "body" => Self::Body,
            "bond" => Self::Bond,
            "charge" => Self::Charge,
            "dipole" => Self::Dipole,
            "dpd" => Self::Dpd,
            "electron" => Self::Electron,
            "ellipsoid" => Self::Ellipsoid,
            "full" => Self::Full,
            "line" => Self::Line,
            "meso" => Self::Meso,
            "molecular" => Self::Molecular,
            "peri" => Self::Peri,
            "smd" => Self::Smd,
            "sphere" => Self::Sphere,
            "template" => Self::Template,
            "tri" => Self::Tri,
            "wavepacket" => Self::Wavepacket,
            "hybrid" => Self::Hybrid,
            _ => return None,
        };
        Some(style)
    }

    fn layout(self) -> Layout {
        match self {
            // atom-ID molecule-ID atom-type x y z
            Self::Angle | Self::Bond | Self::Molecular => layout(Some(1), 2, None, None, 3),
            // atom-ID atom-type x y z
            Self::Atomic | Self::Hybrid => layout(None, 1, None, None, 2),
            // atom-ID atom-type bodyflag mass x y z
            Self::Body => layout(None, 1, None, Some(3), 4),
            // atom-ID atom-type q x y z [mux muy muz]
            Self::Charge | Self::Dipole => layout(None, 1, Some(2), None, 3),
            // atom-ID atom-type theta x y z
            Self::Dpd => layout(None, 1, None, None, 3),
            // atom-ID atom-type q spin eradius x y z
            Self::Electron => layout(None, 1, None, None, 5),
            // atom-ID atom-type flag density x y z
            Self::Ellipsoid | Self::Peri | Self::Sphere => layout(None, 1, None, None, 4),
            // atom-ID molecule-ID atom-type q x y z
            Self::Full => layout(Some(1), 2, Some(3), None, 4),
            // atom-ID molecule-ID atom-type flag density x y z
            Self::Line | Self::Tri => layout(Some(1), 2, None, None, 5),
            // atom-ID atom-type rho e cv x y z
            Self::Meso => layout(None, 1, None, None, 5),
            // atom-ID atom-type molecule volume mass kernel-radius contact-radius x y z
            Self::Smd => layout(Some(2), 1, None, Some(4), 7),
            // atom-ID molecule-ID template-index template-atom atom-type x y z
            Self::Template => layout(Some(1), 4, None, None, 5),
            // atom-ID atom-type charge spin eradius etag cs_re cs_im x y z
            Self::Wavepacket => layout(None, 1, Some(2), None, 8),
        }
    }

    /// Parses one data line, without its comment. Trailing columns such as image flags
    /// are ignored.
    pub fn parse(self, line: &str) -> Option<AtomLine> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let layout = self.layout();
        if tokens.len() < layout.position + 3 {
            return None;
        }

        let float = |index: usize| tokens[index].parse::<f64>().ok();
        let integer = |index: usize| tokens[index].parse::<usize>().ok();

        Some(AtomLine {
            id: integer(0)?,
            molecule: match layout.molecule {
                Some(index) => integer(index)?,
                None => 0,
            },
            atom_type: integer(layout.atom_type)?,
            charge: match layout.charge {
                Some(index) => Some(float(index)?),
                None => None,
            },
            mass: match layout.mass {
                Some(index) => Some(float(index)?),
                None => None,
            },
            position: Point::new(
                float(layout.position)?,
                float(layout.position + 1)?,
                float(layout.position + 2)?,
            ),
        })
    }
}
