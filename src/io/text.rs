//! Line-oriented, seekable storage shared by every text format.
//!
//! Gzip input is decompressed into memory when the file is opened so that step offsets stay
//! meaningful; plain files are read through a buffered handle. Writers transparently encode
//! gzip output when asked to.

use super::error::Error;
use flate2::Compression as GzLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// How a path should be (de)compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Gzip when the path ends in `.gz`, plain text otherwise.
    #[default]
    Auto,
    None,
    Gzip,
}

impl Compression {
    fn is_gzip(self, path: &Path) -> bool {
        match self {
            Compression::Auto => has_gz_extension(path),
            Compression::None => false,
            Compression::Gzip => true,
        }
    }
}

pub(crate) fn has_gz_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

pub trait BufReadSeek: BufRead + Seek {}

impl<T: BufRead + Seek> BufReadSeek for T {}

/// Seekable line reader with byte-offset positioning.
pub struct TextFile {
    reader: Box<dyn BufReadSeek>,
    path: Option<PathBuf>,
}

impl TextFile {
    /// Opens a file for reading, decompressing it first when `compression` says so.
    pub fn open(path: impl AsRef<Path>, compression: Compression) -> Result<Self, Error> {
        let path = path.as_ref();
        let io_err = |e| Error::from_io(e, Some(path.to_path_buf()));
        let file = File::open(path).map_err(io_err)?;

        let reader: Box<dyn BufReadSeek> = if compression.is_gzip(path) {
            let mut bytes = Vec::new();
            GzDecoder::new(file).read_to_end(&mut bytes).map_err(io_err)?;
            log::debug!("decompressed {} bytes from {}", bytes.len(), path.display());
            Box::new(Cursor::new(bytes))
        } else {
            Box::new(BufReader::new(file))
        };

        Ok(Self {
            reader,
            path: Some(path.to_path_buf()),
        })
    }

    /// Wraps an arbitrary seekable reader.
    pub fn from_reader(reader: impl BufRead + Seek + 'static, path: Option<PathBuf>) -> Self {
        Self {
            reader: Box::new(reader),
            path,
        }
    }

    /// Reads from an in-memory string.
    pub fn from_string(content: impl Into<String>) -> Self {
        Self::from_reader(Cursor::new(content.into().into_bytes()), None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Owned copy of the path, for error values.
    pub fn path_buf(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    /// Reads one line without its terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedEof`] when the stream is exhausted.
    pub fn readline(&mut self) -> Result<String, Error> {
        self.try_readline()?
            .ok_or_else(|| Error::unexpected_eof(self.path_buf()))
    }

    /// Reads one line without its terminator, or `None` at end of stream.
    pub fn try_readline(&mut self) -> Result<Option<String>, Error> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| Error::from_io(e, self.path.clone()))?;
        if read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    pub fn skipline(&mut self) -> Result<(), Error> {
        self.readline().map(|_| ())
    }

    pub fn skiplines(&mut self, count: usize) -> Result<(), Error> {
        for _ in 0..count {
            self.skipline()?;
        }
        Ok(())
    }

    pub fn readlines(&mut self, count: usize) -> Result<Vec<String>, Error> {
        (0..count).map(|_| self.readline()).collect()
    }

    /// Current byte offset.
    pub fn tellg(&mut self) -> Result<u64, Error> {
        self.reader
            .stream_position()
            .map_err(|e| Error::from_io(e, self.path.clone()))
    }

    pub fn seekg(&mut self, offset: u64) -> Result<(), Error> {
        self.reader
            .seek(SeekFrom::Start(offset))
            .map(|_| ())
            .map_err(|e| Error::from_io(e, self.path.clone()))
    }

    /// Returns `true` once no byte is left to read.
    pub fn eof(&mut self) -> Result<bool, Error> {
        self.reader
            .fill_buf()
            .map(|buf| buf.is_empty())
            .map_err(|e| Error::from_io(e, self.path.clone()))
    }
}

impl std::fmt::Debug for TextFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextFile").field("path", &self.path).finish()
    }
}

/// Output file, optionally gzip-encoded.
pub enum TextWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl TextWriter {
    pub fn create(path: impl AsRef<Path>, compression: Compression) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
        let buffered = BufWriter::new(file);
        Ok(if compression.is_gzip(path) {
            TextWriter::Gzip(GzEncoder::new(buffered, GzLevel::default()))
        } else {
            TextWriter::Plain(buffered)
        })
    }

    /// Flushes buffered data and writes the gzip trailer when needed.
    pub fn close(self) -> std::io::Result<()> {
        match self {
            TextWriter::Plain(mut out) => out.flush(),
            TextWriter::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for TextWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            TextWriter::Plain(out) => out.write(buf),
            TextWriter::Gzip(out) => out.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            TextWriter::Plain(out) => out.flush(),
            TextWriter::Gzip(out) => out.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readline_strips_both_line_endings() {
        let mut file = TextFile::from_string("first\r\nsecond\nthird");

        assert_eq!(file.readline().unwrap(), "first");
        assert_eq!(file.readline().unwrap(), "second");
        assert_eq!(file.readline().unwrap(), "third");
        assert!(file.eof().unwrap());
    }

    #[test]
    fn readline_past_end_is_unexpected_eof() {
        let mut file = TextFile::from_string("only\n");
        file.skipline().unwrap();

        assert!(file.readline().unwrap_err().is_eof());
        assert_eq!(file.try_readline().unwrap(), None);
    }

    #[test]
    fn tellg_and_seekg_round_trip_offsets() {
        let mut file = TextFile::from_string("aa\nbbb\ncccc\n");
        file.skipline().unwrap();
        let offset = file.tellg().unwrap();
        assert_eq!(offset, 3);

        let lines = file.readlines(2).unwrap();
        assert_eq!(lines, vec!["bbb", "cccc"]);

        file.seekg(offset).unwrap();
        assert_eq!(file.readline().unwrap(), "bbb");
    }

    #[test]
    fn skiplines_fails_when_lines_run_out() {
        let mut file = TextFile::from_string("1\n2\n");
        assert!(file.skiplines(3).is_err());
    }

    #[test]
    fn gzip_files_are_transparently_decompressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("water.txt.gz");

        let mut writer = TextWriter::create(&path, Compression::Auto).unwrap();
        writer.write_all(b"line one\nline two\n").unwrap();
        writer.close().unwrap();

        let mut file = TextFile::open(&path, Compression::Auto).unwrap();
        assert_eq!(file.readline().unwrap(), "line one");
        let offset = file.tellg().unwrap();
        assert_eq!(file.readline().unwrap(), "line two");
        file.seekg(offset).unwrap();
        assert_eq!(file.readline().unwrap(), "line two");
    }

    #[test]
    fn open_reports_missing_files_with_path() {
        let err = TextFile::open("/definitely/not/here.pdb", Compression::Auto).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.pdb"));
    }
}
