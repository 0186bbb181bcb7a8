//! File handles tying a storage, a format codec and a step index together.

use super::error::Error;
use super::format::{FormatInfo, FormatKind, TextFormat};
use super::steps::StepIndex;
use super::text::{Compression, TextFile, TextWriter};
use crate::model::frame::Frame;
use crate::warnings::{self, WarningSink};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration shared by readers and writers.
///
/// ```no_run
/// use chem_forge::io::{FormatKind, TrajectoryBuilder};
///
/// let mut trajectory = TrajectoryBuilder::new()
///     .format(FormatKind::Pdb)
///     .open("model.ent")?;
/// let frame = trajectory.read()?;
/// # Ok::<(), chem_forge::io::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct TrajectoryBuilder {
    format: Option<FormatKind>,
    sink: Option<Arc<dyn WarningSink>>,
    compression: Compression,
}

impl TrajectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces a format instead of inferring it from the extension.
    pub fn format(mut self, format: FormatKind) -> Self {
        self.format = Some(format);
        self
    }

    /// Routes warnings to `sink` instead of the process-wide default.
    pub fn warning_sink(mut self, sink: Arc<dyn WarningSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`] when no format was set and the extension is not
    /// recognized, or an I/O error when the file can not be opened.
    pub fn open(self, path: impl AsRef<Path>) -> Result<Trajectory, Error> {
        let path = path.as_ref();
        let kind = self.resolve_format(path)?;
        let file = TextFile::open(path, self.compression)?;
        log::debug!("reading {} as {}", path.display(), kind);
        Ok(Trajectory::with_sink(file, kind, self.sink()))
    }

    /// Reads from an already opened storage. A format must have been set.
    pub fn reader(self, file: TextFile) -> Result<Trajectory, Error> {
        let kind = self.format.ok_or_else(|| Error::unknown_format(file.path_buf()))?;
        let sink = self.sink();
        Ok(Trajectory::with_sink(file, kind, sink))
    }

    /// Creates (or truncates) `path` for writing.
    pub fn create(self, path: impl AsRef<Path>) -> Result<TrajectoryWriter<TextWriter>, Error> {
        let path = path.as_ref();
        let kind = self.resolve_format(path)?;
        let out = TextWriter::create(path, self.compression)?;
        log::debug!("writing {} as {}", path.display(), kind);
        let mut writer = TrajectoryWriter::with_sink(out, kind, self.sink());
        writer.path = Some(path.to_path_buf());
        Ok(writer)
    }

    /// Writes into an arbitrary sink. A format must have been set.
    pub fn writer<W: Write>(self, out: W) -> Result<TrajectoryWriter<W>, Error> {
        let kind = self.format.ok_or_else(|| Error::unknown_format(None))?;
        let sink = self.sink();
        Ok(TrajectoryWriter::with_sink(out, kind, sink))
    }

    fn resolve_format(&self, path: &Path) -> Result<FormatKind, Error> {
        self.format
            .or_else(|| FormatKind::from_path(path))
            .ok_or_else(|| Error::unknown_format(Some(path.to_path_buf())))
    }

    fn sink(&self) -> Arc<dyn WarningSink> {
        self.sink.clone().unwrap_or_else(warnings::warning_sink)
    }
}

/// Read handle over a multi-frame file.
pub struct Trajectory {
    file: TextFile,
    format: Box<dyn TextFormat>,
    steps: StepIndex,
    sink: Arc<dyn WarningSink>,
}

impl Trajectory {
    /// Opens `path`, inferring the format from its extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        TrajectoryBuilder::new().open(path)
    }

    /// Reads `file` with the given format, reporting warnings to the default sink.
    pub fn from_text(file: TextFile, kind: FormatKind) -> Self {
        Self::with_sink(file, kind, warnings::warning_sink())
    }

    fn with_sink(file: TextFile, kind: FormatKind, sink: Arc<dyn WarningSink>) -> Self {
        Self {
            file,
            format: kind.codec(),
            steps: StepIndex::new(),
            sink,
        }
    }

    pub fn format_info(&self) -> FormatInfo {
        self.format.info()
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.path()
    }

    pub fn steps(&self) -> &StepIndex {
        &self.steps
    }

    /// Reads the next frame, or `None` once the file is exhausted.
    pub fn read(&mut self) -> Result<Option<Frame>, Error> {
        let offset = match self.format.forward(&mut self.file) {
            Ok(Some(offset)) => offset,
            Ok(None) => return Ok(None),
            Err(err) if err.is_eof() => return Ok(None),
            Err(err) => return Err(err),
        };
        self.file.seekg(offset)?;

        let mut frame = Frame::new();
        let sink = self.sink.as_ref();
        match self.steps.append_on_read(offset) {
            Some(step) => self.steps.decode(
                step,
                &mut self.file,
                self.format.as_mut(),
                &mut frame,
                sink,
            )?,
            None => self.format.read_next(&mut self.file, &mut frame, sink)?,
        }
        Ok(Some(frame))
    }

    /// Reads the frame at `step`. Sequential reads continue after it.
    pub fn read_step(&mut self, step: usize) -> Result<Frame, Error> {
        let mut frame = Frame::new();
        self.steps.read_at(
            step,
            &mut self.file,
            self.format.as_mut(),
            &mut frame,
            self.sink.as_ref(),
        )?;
        Ok(frame)
    }

    /// Number of frames in the file. Scans the whole file on first use.
    pub fn nsteps(&mut self) -> Result<usize, Error> {
        self.steps.count(&mut self.file, self.format.as_mut())
    }

    /// Iterates the remaining frames.
    pub fn frames(&mut self) -> impl Iterator<Item = Result<Frame, Error>> + '_ {
        let mut failed = false;
        std::iter::from_fn(move || {
            if failed {
                return None;
            }
            let next = self.read().transpose();
            failed = matches!(next, Some(Err(_)));
            next
        })
    }
}

/// Write handle over a multi-frame output.
///
/// The format trailer is written by [`finish`](Self::finish). Dropping an unfinished writer
/// still writes it, ignoring errors.
pub struct TrajectoryWriter<W: Write> {
    out: Option<W>,
    format: Box<dyn TextFormat>,
    sink: Arc<dyn WarningSink>,
    path: Option<PathBuf>,
    written: usize,
}

impl<W: Write> TrajectoryWriter<W> {
    /// Writes into `out` with the given format, reporting warnings to the default sink.
    pub fn new(out: W, kind: FormatKind) -> Self {
        Self::with_sink(out, kind, warnings::warning_sink())
    }

    fn with_sink(out: W, kind: FormatKind, sink: Arc<dyn WarningSink>) -> Self {
        Self {
            out: Some(out),
            format: kind.codec(),
            sink,
            path: None,
            written: 0,
        }
    }

    pub fn format_info(&self) -> FormatInfo {
        self.format.info()
    }

    /// Number of frames written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write(&mut self, frame: &Frame) -> Result<(), Error> {
        let info = self.format.info();
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| Error::unsupported(info.name, "writing after finish"))?;
        self.format.write_next(out, frame, self.sink.as_ref())?;
        self.written += 1;
        Ok(())
    }

    /// Writes the trailer, flushes, and hands the underlying writer back.
    pub fn finish(mut self) -> Result<W, Error> {
        let info = self.format.info();
        let mut out = self
            .out
            .take()
            .ok_or_else(|| Error::unsupported(info.name, "finishing twice"))?;
        self.format.finish(&mut out)?;
        out.flush().map_err(|e| Error::from_io(e, self.path.clone()))?;
        Ok(out)
    }
}

impl TrajectoryWriter<TextWriter> {
    /// Finishes the file, including the gzip trailer for compressed output.
    pub fn close(self) -> Result<(), Error> {
        let path = self.path.clone();
        self.finish()?
            .close()
            .map_err(|e| Error::from_io(e, path))
    }
}

impl<W: Write> Drop for TrajectoryWriter<W> {
    fn drop(&mut self) {
        if let Some(mut out) = self.out.take() {
            let _ = self.format.finish(&mut out);
            let _ = out.flush();
        }
    }
}
