use super::error::Error;
use super::text::{TextFile, has_gz_extension};
use super::{cssr, gro, lammps, mol2, pdb, sdf};
use crate::model::frame::Frame;
use crate::warnings::WarningSink;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Identity of a file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub name: &'static str,
    /// Canonical extension including the leading dot, when the format has one.
    pub extension: Option<&'static str>,
    pub description: &'static str,
}

/// Capability interface shared by every sequential text format.
///
/// One value holds the per-file state of a format (residue caches, model counters, and so
/// on). A value is used either for reading or for writing, never both.
pub trait TextFormat {
    fn info(&self) -> FormatInfo;

    /// Decodes the frame starting at the current position into `frame`.
    ///
    /// The frame is cleared first. Recoverable problems go to `sink`.
    fn read_next(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error>;

    /// Skips exactly one frame and returns the offset where it started.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn forward(&mut self, file: &mut TextFile) -> Result<Option<u64>, Error>;

    fn write_next(
        &mut self,
        out: &mut dyn Write,
        frame: &Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error>;

    /// Writes any trailer once the last frame has been written.
    fn finish(&mut self, _out: &mut dyn Write) -> Result<(), Error> {
        Ok(())
    }
}

/// Every format known to the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Pdb,
    Gro,
    Mol2,
    Sdf,
    Cssr,
    LammpsData,
}

impl FormatKind {
    pub const ALL: [FormatKind; 6] = [
        FormatKind::Pdb,
        FormatKind::Gro,
        FormatKind::Mol2,
        FormatKind::Sdf,
        FormatKind::Cssr,
        FormatKind::LammpsData,
    ];

    pub fn info(self) -> FormatInfo {
        match self {
            FormatKind::Pdb => pdb::INFO,
            FormatKind::Gro => gro::INFO,
            FormatKind::Mol2 => mol2::INFO,
            FormatKind::Sdf => sdf::INFO,
            FormatKind::Cssr => cssr::INFO,
            FormatKind::LammpsData => lammps::INFO,
        }
    }

    /// Creates a fresh codec holding no per-file state.
    pub fn codec(self) -> Box<dyn TextFormat> {
        match self {
            FormatKind::Pdb => Box::new(pdb::PdbFormat::default()),
            FormatKind::Gro => Box::new(gro::GroFormat::default()),
            FormatKind::Mol2 => Box::new(mol2::Mol2Format::default()),
            FormatKind::Sdf => Box::new(sdf::SdfFormat::default()),
            FormatKind::Cssr => Box::new(cssr::CssrFormat::default()),
            FormatKind::LammpsData => Box::new(lammps::LammpsDataFormat::default()),
        }
    }

    /// Matches a format by its name, case-insensitively (`"PDB"`, `"LAMMPS Data"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.info().name.eq_ignore_ascii_case(name))
    }

    /// Matches a format by extension, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.');
        Self::ALL.into_iter().find(|kind| {
            kind.info()
                .extension
                .is_some_and(|ext| ext[1..].eq_ignore_ascii_case(extension))
        })
    }

    /// Infers the format from a path, looking through a trailing `.gz`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let path = if has_gz_extension(path) {
            Path::new(path.file_stem()?)
        } else {
            path
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info().name)
    }
}
