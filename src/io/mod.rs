//! Reading and writing of molecular structure and trajectory files.
//!
//! Every format implements [`TextFormat`] over a seekable [`TextFile`]. A [`Trajectory`]
//! couples one codec with one file and a lazily built [`StepIndex`], so frames can be read
//! sequentially or by step. [`TrajectoryWriter`] encodes frames into any [`std::io::Write`].

mod error;
mod format;
mod steps;
mod text;
mod trajectory;

pub(crate) mod fields;

mod cssr;
mod gro;
mod lammps;
mod mol2;
mod pdb;
mod sdf;

pub use error::Error;
pub use format::{FormatInfo, FormatKind, TextFormat};
pub use steps::StepIndex;
pub use text::{Compression, TextFile, TextWriter};
pub use trajectory::{Trajectory, TrajectoryBuilder, TrajectoryWriter};

pub use cssr::CssrFormat;
pub use gro::GroFormat;
pub use lammps::LammpsDataFormat;
pub use mol2::Mol2Format;
pub use pdb::PdbFormat;
pub use sdf::SdfFormat;
