//! LAMMPS data files.
//!
//! A data file describes a single configuration. The reader understands every standard
//! `atom_style`; the writer always produces `atom_style full`, with dense type ids from the
//! [`TypeRegistry`](crate::ops::TypeRegistry) and molecule ids from the bond graph.

mod reader;
mod style;
mod writer;

use super::error::Error;
use super::format::{FormatInfo, TextFormat};
use super::text::TextFile;
use crate::model::frame::Frame;
use crate::warnings::WarningSink;
use std::io::Write;

pub const INFO: FormatInfo = FormatInfo {
    name: "LAMMPS Data",
    extension: None,
    description: "LAMMPS text input data file",
};

#[derive(Debug, Default)]
pub struct LammpsDataFormat {
    written: bool,
}

impl TextFormat for LammpsDataFormat {
    fn info(&self) -> FormatInfo {
        INFO
    }

    fn read_next(
        &mut self,
        file: &mut TextFile,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        if file.tellg()? != 0 {
            return Err(Error::unsupported(INFO.name, "reading more than one frame"));
        }
        reader::DataReader::new(file, sink).read(frame)
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
        _sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        if self.written {
            return Err(Error::unsupported(INFO.name, "writing more than one frame"));
        }
        self.written = true;
        writer::write_frame(out, frame)
    }
}
