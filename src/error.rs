use std::fmt;

use thiserror::Error;

//
// -----

/// Fatal problems when reading an STL file.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The input ends before a full 1024-byte GSI block.
    #[error("input too short for a GSI block ({0} bytes, need 1024)")]
    InputTooShort(usize),
    /// The Disk Format Code is not one of the known values and no frame rate override was given.
    #[error("unrecognized disk format code {0:?} and no frame rate override")]
    UnrecognizedFrameRate(String),
    /// A structural warning escalated through [WarningMode::Error].
    #[error("structural: {0}")]
    Structural(Diagnostic),
}

//
// -----

/// What to do with structural warnings found while reading.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WarningMode {
    /// Drop them entirely.
    Suppress,
    /// Return them in [ReadOutput](crate::stl::reader::ReadOutput) and log them.
    #[default]
    Observe,
    /// Turn them into [ReadError::Structural].
    Error,
}

//
// -----

/// Categories of non-fatal diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// TTI continuation bookkeeping or GSI fields that are wrong but recoverable.
    Structural,
}

/// A non-fatal problem noticed while reading. At most one is emitted per read.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn structural(message: String) -> Diagnostic {
        Diagnostic {
            kind: DiagnosticKind::Structural,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
