/*!
    Failures reported by media collaborators.
*/

use std::fmt;

/**
    Why a source, decoder, converter or renderer gave up.

    The playback core treats these differently by origin: a [`Error::Source`]
    or [`Error::Io`] failure ends the session, while decode and conversion
    failures only cost the unit that produced them.
*/
#[derive(Debug)]
pub enum Error {
    /// The operating system refused a read or write (missing file, full disk)
    Io(std::io::Error),
    /// The container could not be opened, or a packet could not be read from it
    Source { message: String },
    /// A codec refused to open, or rejected a packet
    Codec { message: String },
    /// Decoded data did not match its declared shape
    InvalidData { message: String },
    /// Well-formed data in a layout this player does not handle
    UnsupportedFormat { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Source { message } => write!(f, "source error: {message}"),
            Self::Codec { message } => write!(f, "codec error: {message}"),
            Self::InvalidData { message } => write!(f, "invalid data: {message}"),
            Self::UnsupportedFormat { message } => write!(f, "unsupported format: {message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl Error {
    pub fn source_failure(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
