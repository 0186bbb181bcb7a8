use super::{INFO, PdbFormat};
use crate::io::error::Error;
use crate::model::frame::Frame;
use crate::model::property::Property;
use crate::warnings::{WarningSink, warning};
use std::io::Write;

const CONTEXT: &str = "PDB writer";
const MAX_SERIAL: usize = 99_999;

/// Formats a 0-based index as a 1-based PDB serial.
pub(super) fn pdb_index(index: usize) -> String {
    let serial = index + 1;
    if serial > MAX_SERIAL {
        "*****".to_string()
    } else {
        serial.to_string()
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
            format!("value in {} is too big for representation in PDB format", context),
        ));
    }
    Ok(())
}

/// Keeps the first character of a single-column field.
fn single_column(value: &str, what: &str, residue: &str, sink: &dyn WarningSink) -> String {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(_)) => {
            warning!(
                sink,
                CONTEXT,
                "residue '{}' {} is too long, it will be truncated",
                residue,
                what
            );
            first.to_string()
        }
        (Some(first), None) => first.to_string(),
        (None, _) => " ".to_string(),
    }
}

struct ResidueColumns {
    record: &'static str,
    name: String,
    resid: String,
    chain: String,
    inscode: String,
}

impl PdbFormat {
    pub(super) fn write_frame(
        &mut self,
        out: &mut dyn Write,
        frame: &Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        let io = |e| Error::from_io(e, None);

        let cell = &frame.cell;
        check_values_size(cell.lengths(), 9, "cell lengths")?;
        for position in frame.positions() {
            check_values_size([position.x, position.y, position.z], 8, "atomic position")?;
        }

        self.written = true;
        writeln!(out, "MODEL {:>4}", self.models + 1).map_err(io)?;
        let [a, b, c] = cell.lengths();
        let [alpha, beta, gamma] = cell.angles();
        writeln!(
            out,
            "CRYST1{:9.3}{:9.3}{:9.3}{:7.2}{:7.2}{:7.2} P 1           1",
            a, b, c, alpha, beta, gamma
        )
        .map_err(io)?;

        let topology = frame.topology();
        // atoms outside any residue get ids above every real residue
        let mut next_resid = topology
            .residues()
            .iter()
            .filter_map(|residue| residue.id)
            .max()
            .unwrap_or(0)
            .max(0) as usize;

        for (i, (atom, position)) in topology.atoms().iter().zip(frame.positions()).enumerate() {
            let altloc = match atom.get("altloc").and_then(Property::as_str) {
                Some(altloc) if altloc.chars().count() > 1 => {
                    warning!(sink, CONTEXT, "altloc '{}' is too long, it will be truncated", altloc);
                    altloc.chars().take(1).collect()
                }
                Some(altloc) => altloc.to_string(),
                None => " ".to_string(),
            };

            let columns = match topology.residue_for_atom(i) {
                Some(residue) => {
                    let record = if residue
                        .get("is_standard_pdb")
                        .and_then(Property::as_bool)
                        .unwrap_or(false)
                    {
                        "ATOM  "
                    } else {
                        "HETATM"
                    };

                    let mut name = residue.name.clone();
                    if name.chars().count() > 3 {
                        warning!(
                            sink,
                            CONTEXT,
                            "residue '{}' name is too long, it will be truncated",
                            residue.name
                        );
                        name = name.chars().take(3).collect();
                    }

                    let resid = match residue.id {
                        Some(id) if (-999..=9999).contains(&id) => id.to_string(),
                        Some(id) => {
                            warning!(sink, CONTEXT, "too many residues, removing residue id {}", id);
                            "-1".to_string()
                        }
                        None => "-1".to_string(),
                    };

                    let chain = match residue.chain_id() {
                        Some(chain) => single_column(chain, "chain id", &residue.name, sink),
                        None => "X".to_string(),
                    };
                    let inscode = match residue.get("insertion_code").and_then(Property::as_str) {
                        Some(code) => single_column(code, "insertion code", &residue.name, sink),
                        None => " ".to_string(),
                    };

                    ResidueColumns {
                        record,
                        name,
                        resid,
                        chain,
                        inscode,
                    }
                }
                None => {
                    let value = next_resid;
                    next_resid += 1;
                    ResidueColumns {
                        record: "HETATM",
                        name: "XXX".to_string(),
                        resid: if value < 9999 {
                            pdb_index(value)
                        } else {
                            "-1".to_string()
                        },
                        chain: "X".to_string(),
                        inscode: " ".to_string(),
                    }
                }
            };

            writeln!(
                out,
                "{:<6}{:>5} {:<4}{:1}{:3} {:1}{:>4}{:1}   {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}",
                columns.record,
                pdb_index(i),
                atom.name.as_str(),
                altloc,
                columns.name,
                columns.chain,
                columns.resid,
                columns.inscode,
                position.x,
                position.y,
                position.z,
                1.0,
                0.0,
                atom.atom_type.as_str()
            )
            .map_err(io)?;
        }

        let mut partners = vec![Vec::new(); frame.size()];
        for bond in topology.bonds() {
            if bond.a2_idx >= MAX_SERIAL {
                warning!(
                    sink,
                    CONTEXT,
                    "atomic index is too big for CONECT, removing the bond between {} and {}",
                    bond.a1_idx,
                    bond.a2_idx
                );
                continue;
            }
            partners[bond.a1_idx].push(bond.a2_idx);
            partners[bond.a2_idx].push(bond.a1_idx);
        }

        for (i, bonded) in partners.iter().enumerate() {
            for chunk in bonded.chunks(4) {
                write!(out, "CONECT{:>5}", pdb_index(i)).map_err(io)?;
                for &j in chunk {
                    write!(out, "{:>5}", pdb_index(j)).map_err(io)?;
                }
                writeln!(out).map_err(io)?;
            }
        }

        writeln!(out, "ENDMDL").map_err(io)?;
        self.models += 1;
        Ok(())
    }
}
