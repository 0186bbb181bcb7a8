//! Byte-offset index of the frames of a sequential text file.
//!
//! Offsets are recorded lazily: sequential reads append the offset they consumed, and the
//! first random access past the known range scans the whole file once through the format's
//! [`forward`](super::format::TextFormat::forward) primitive. The recorded list is strictly
//! increasing, so a partial prefix built by sequential reads is always a prefix of the full
//! index.

use super::error::Error;
use super::format::TextFormat;
use super::text::TextFile;
use crate::model::frame::Frame;
use crate::warnings::WarningSink;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepIndex {
    offsets: Vec<u64>,
    verified: Vec<bool>,
    complete: bool,
}

impl StepIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of offsets recorded so far, without scanning.
    pub fn known_count(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn offset(&self, step: usize) -> Option<u64> {
        self.offsets.get(step).copied()
    }

    /// Records the offset consumed by a sequential read.
    ///
    /// The offset is appended only when it is past the last recorded one. Returns the step
    /// the offset corresponds to, if it is known.
    pub fn append_on_read(&mut self, offset: u64) -> Option<usize> {
        match self.offsets.last() {
            Some(&last) if offset <= last => self.offsets.binary_search(&offset).ok(),
            _ => {
                self.offsets.push(offset);
                self.verified.push(false);
                Some(self.offsets.len() - 1)
            }
        }
    }

    /// Scans the whole file once and records every frame offset.
    ///
    /// Calling this again after a successful scan does nothing. The read position is
    /// restored afterwards, except that a file positioned at its very beginning is left at
    /// the first recorded frame.
    pub fn ensure_indexed(
        &mut self,
        file: &mut TextFile,
        format: &mut dyn TextFormat,
    ) -> Result<(), Error> {
        if self.complete {
            return Ok(());
        }

        let start = file.tellg()?;
        file.seekg(0)?;
        let scanned = scan_offsets(file, format);

        let restore = match &scanned {
            Ok(offsets) if start == 0 => offsets.first().copied().unwrap_or(0),
            _ => start,
        };
        file.seekg(restore)?;
        let offsets = scanned?;

        let verified = offsets
            .iter()
            .enumerate()
            .map(|(step, offset)| {
                self.offsets.get(step) == Some(offset) && self.verified[step]
            })
            .collect();

        log::debug!(
            "indexed {} step(s) in {}",
            offsets.len(),
            file.path().map(|p| p.display().to_string()).unwrap_or_else(|| "stream".into())
        );

        self.offsets = offsets;
        self.verified = verified;
        self.complete = true;
        Ok(())
    }

    /// Total number of frames in the file. Forces a full scan.
    pub fn count(&mut self, file: &mut TextFile, format: &mut dyn TextFormat) -> Result<usize, Error> {
        self.ensure_indexed(file, format)?;
        Ok(self.offsets.len())
    }

    /// Decodes the frame at `step` into `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSteps`] or [`Error::StepOutOfRange`] when the file has fewer frames,
    /// and [`Error::IndexMismatch`] when a frame that decoded before no longer does.
    pub fn read_at(
        &mut self,
        step: usize,
        file: &mut TextFile,
        format: &mut dyn TextFormat,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        if step >= self.offsets.len() {
            self.ensure_indexed(file, format)?;
        }
        let Some(offset) = self.offset(step) else {
            return Err(Error::step_out_of_range(
                file.path_buf(),
                step,
                self.offsets.len(),
            ));
        };

        file.seekg(offset)?;
        self.decode(step, file, format, frame, sink)
    }

    /// Decodes the frame at the current position, which must be the recorded start of `step`.
    pub(crate) fn decode(
        &mut self,
        step: usize,
        file: &mut TextFile,
        format: &mut dyn TextFormat,
        frame: &mut Frame,
        sink: &dyn WarningSink,
    ) -> Result<(), Error> {
        match format.read_next(file, frame, sink) {
            Ok(()) => {
                if let Some(verified) = self.verified.get_mut(step) {
                    *verified = true;
                }
                Ok(())
            }
            Err(err) if self.verified.get(step).copied().unwrap_or(false) => {
                Err(Error::index_mismatch(file.path_buf(), step, err))
            }
            Err(err) => Err(err),
        }
    }
}

fn scan_offsets(file: &mut TextFile, format: &mut dyn TextFormat) -> Result<Vec<u64>, Error> {
    let mut offsets: Vec<u64> = Vec::new();
    while let Some(offset) = format.forward(file)? {
        if offsets.last().is_some_and(|&last| offset <= last) {
            break;
        }
        offsets.push(offset);
    }
    Ok(offsets)
}
