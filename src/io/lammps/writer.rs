use crate::io::error::Error;
use crate::model::cell::CellShape;
use crate::model::frame::Frame;
use crate::ops::{TypeRegistry, guess_molecules};
use nalgebra::Matrix3;
use std::io::{self, Write};

/// Wraps the tilt factor `matrix[(i, j)]` into `[-matrix[(i, i)] / 2, matrix[(i, i)] / 2]`.
pub(super) fn tilt_factor(matrix: &Matrix3<f64>, i: usize, j: usize) -> f64 {
    let mut factor = matrix[(i, j)];
    let length = matrix[(i, i)];
    if length > 0.0 {
        while factor > length / 2.0 {
            factor -= length;
        }
        while factor < -length / 2.0 {
            factor += length;
        }
    }
    // rounding noise from sin/cos
    if factor.abs() < 1e-15 { 0.0 } else { factor }
}

fn write_header(out: &mut dyn Write, frame: &Frame, types: &TypeRegistry) -> io::Result<()> {
    let topology = frame.topology();
    writeln!(out, "LAMMPS data file -- atom_style full -- generated by chem-forge")?;
    writeln!(out, "{} atoms", frame.size())?;
    writeln!(out, "{} bonds", topology.bond_count())?;
    writeln!(out, "{} angles", topology.angles().len())?;
    writeln!(out, "{} dihedrals", topology.dihedrals().len())?;
    writeln!(out, "{} impropers", topology.impropers().len())?;
    writeln!(out, "{} atom types", types.atoms().len())?;
    writeln!(out, "{} bond types", types.bonds().len())?;
    writeln!(out, "{} angle types", types.angles().len())?;
    writeln!(out, "{} dihedral types", types.dihedrals().len())?;
    writeln!(out, "{} improper types", types.impropers().len())?;

    let matrix = frame.cell.matrix();
    writeln!(out, "0 {} xlo xhi", matrix[(0, 0)])?;
    writeln!(out, "0 {} ylo yhi", matrix[(1, 1)])?;
    writeln!(out, "0 {} zlo zhi", matrix[(2, 2)])?;
    if frame.cell.shape() == CellShape::Triclinic {
        writeln!(
            out,
            "{} {} {} xy xz yz",
            tilt_factor(&matrix, 0, 1),
            tilt_factor(&matrix, 0, 2),
            tilt_factor(&matrix, 1, 2)
        )?;
    }
    writeln!(out)
}

/// Writes the type names as comments, so that force field parameters can be filled in.
fn write_types(out: &mut dyn Write, types: &TypeRegistry) -> io::Result<()> {
    let names: Vec<&str> = types.atoms().iter().map(|t| t.name.as_str()).collect();
    let joined = |ids: &[usize]| {
        ids.iter()
            .map(|&id| names[id])
            .collect::<Vec<_>>()
            .join("-")
    };

    if !names.is_empty() {
        writeln!(out, "# Pair Coeffs")?;
        for (i, name) in names.iter().enumerate() {
            writeln!(out, "# {} {}", i + 1, name)?;
        }
    }

    let blocks: [(&str, Vec<String>); 4] = [
        ("Bond", types.bonds().iter().map(|t| joined(t)).collect()),
        ("Angle", types.angles().iter().map(|t| joined(t)).collect()),
        ("Dihedral", types.dihedrals().iter().map(|t| joined(t)).collect()),
        ("Improper", types.impropers().iter().map(|t| joined(t)).collect()),
    ];
    for (title, entries) in blocks {
        if entries.is_empty() {
            continue;
        }
        writeln!(out, "\n# {} Coeffs", title)?;
        for (i, entry) in entries.iter().enumerate() {
            writeln!(out, "# {} {}", i + 1, entry)?;
        }
    }
    Ok(())
}

fn write_body(out: &mut dyn Write, frame: &Frame, types: &TypeRegistry) -> io::Result<()> {
    let topology = frame.topology();

    writeln!(out, "\nMasses\n")?;
    for (i, atom_type) in types.atoms().iter().enumerate() {
        writeln!(out, "{} {} # {}", i + 1, atom_type.mass, atom_type.name)?;
    }

    writeln!(out, "\nAtoms # full\n")?;
    let molecules = guess_molecules(topology);
    for (i, (atom, position)) in topology.atoms().iter().zip(frame.positions()).enumerate() {
        writeln!(
            out,
            "{} {} {} {} {} {} {} # {}",
            i + 1,
            molecules[i] + 1,
            types.atom_type_of(i) + 1,
            atom.charge(),
            position.x,
            position.y,
            position.z,
            atom.atom_type
        )?;
    }

    if let Some(velocities) = frame.velocities() {
        writeln!(out, "\nVelocities\n")?;
        for (i, velocity) in velocities.iter().enumerate() {
            writeln!(out, "{} {} {} {}", i + 1, velocity.x, velocity.y, velocity.z)?;
        }
    }

    if topology.bond_count() > 0 {
        writeln!(out, "\nBonds\n")?;
        for (n, bond) in topology.bonds().enumerate() {
            let id = types.bond_type_of(bond.a1_idx, bond.a2_idx);
            writeln!(out, "{} {} {} {}", n + 1, id + 1, bond.a1_idx + 1, bond.a2_idx + 1)?;
        }
    }

    if !topology.angles().is_empty() {
        writeln!(out, "\nAngles\n")?;
        for (n, angle) in topology.angles().iter().enumerate() {
            let [i, j, k] = angle.atoms();
            let id = types.angle_type_of(i, j, k);
            writeln!(out, "{} {} {} {} {}", n + 1, id + 1, i + 1, j + 1, k + 1)?;
        }
    }

    if !topology.dihedrals().is_empty() {
        writeln!(out, "\nDihedrals\n")?;
        for (n, dihedral) in topology.dihedrals().iter().enumerate() {
            let [i, j, k, m] = dihedral.atoms();
            let id = types.dihedral_type_of(i, j, k, m);
            writeln!(out, "{} {} {} {} {} {}", n + 1, id + 1, i + 1, j + 1, k + 1, m + 1)?;
        }
    }

    if !topology.impropers().is_empty() {
        writeln!(out, "\nImpropers\n")?;
        for (n, improper) in topology.impropers().iter().enumerate() {
            let [i, j, k, m] = improper.atoms();
            let id = types.improper_type_of(i, j, k, m);
            writeln!(out, "{} {} {} {} {} {}", n + 1, id + 1, i + 1, j + 1, k + 1, m + 1)?;
        }
    }
    Ok(())
}

pub(super) fn write_frame(out: &mut dyn Write, frame: &Frame) -> Result<(), Error> {
    let types = TypeRegistry::new(frame.topology());
    log::debug!(
        "writing LAMMPS data with {} atom types and {} bond types",
        types.atoms().len(),
        types.bonds().len()
    );

    write_header(out, frame, &types)
        .and_then(|()| write_types(out, &types))
        .and_then(|()| write_body(out, frame, &types))
        .map_err(|e| Error::from_io(e, None))
}
