use crate::model::topology::TopologyError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "I/O error for {path_desc}: {source}",
        path_desc = PathDisplay(path)
    )]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "unexpected end of {path_desc}",
        path_desc = PathDisplay(path)
    )]
    UnexpectedEof { path: Option<PathBuf> },

    #[error(
        "failed to parse {format} {path_desc}: {details}",
        path_desc = PathDisplay(path)
    )]
    Format {
        format: &'static str,
        path: Option<PathBuf>,
        details: String,
    },

    #[error(
        "can not read {path_desc} at step {step}, it does not contain any step",
        path_desc = PathDisplay(path)
    )]
    NoSteps { path: Option<PathBuf>, step: usize },

    #[error(
        "can not read {path_desc} at step {step}: maximal step is {max}",
        path_desc = PathDisplay(path)
    )]
    StepOutOfRange {
        path: Option<PathBuf>,
        step: usize,
        max: usize,
    },

    #[error(
        "step {step} of {path_desc} no longer matches the recorded index",
        path_desc = PathDisplay(path)
    )]
    IndexMismatch {
        path: Option<PathBuf>,
        step: usize,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(
        "can not infer the format of {path_desc}",
        path_desc = PathDisplay(path)
    )]
    UnknownFormat { path: Option<PathBuf> },

    #[error("{format} format does not support {operation}")]
    Unsupported {
        format: &'static str,
        operation: &'static str,
    },
}

impl Error {
    pub fn from_io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { path, source }
    }

    pub fn unexpected_eof(path: Option<PathBuf>) -> Self {
        Self::UnexpectedEof { path }
    }

    pub fn format(
        format: &'static str,
        path: Option<PathBuf>,
        details: impl Into<String>,
    ) -> Self {
        Self::Format {
            format,
            path,
            details: details.into(),
        }
    }

    /// Builds the error reported when `step` is beyond the last indexed frame.
    pub fn step_out_of_range(path: Option<PathBuf>, step: usize, count: usize) -> Self {
        if count == 0 {
            Self::NoSteps { path, step }
        } else {
            Self::StepOutOfRange {
                path,
                step,
                max: count - 1,
            }
        }
    }

    pub fn index_mismatch(path: Option<PathBuf>, step: usize, source: Error) -> Self {
        Self::IndexMismatch {
            path,
            step,
            source: Box::new(source),
        }
    }

    pub fn unknown_format(path: Option<PathBuf>) -> Self {
        Self::UnknownFormat { path }
    }

    pub fn unsupported(format: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { format, operation }
    }

    /// Returns `true` when the error means the stream ended early.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }
}

struct PathDisplay<'a>(&'a Option<PathBuf>);

impl<'a> fmt::Display for PathDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "file '{}'", p.display()),
            None => write!(f, "stream source"),
        }
    }
}
