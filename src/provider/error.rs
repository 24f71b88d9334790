use std::fmt;

use crate::auth::ErrorKind;
use crate::db;

#[derive(Debug)]
pub enum Error {
    /// The request was refused by a protocol step.
    Rejected(ErrorKind),
    Store(db::Error),
}

impl Error {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Rejected(kind) => Some(*kind),
            Self::Store(_) => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::Rejected(kind)
    }
}

impl From<db::Error> for Error {
    fn from(e: db::Error) -> Self {
        Self::Store(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(kind) => write!(f, "{}", kind),
            Self::Store(e) => write!(f, "store failure: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(kind) => Some(kind),
            Self::Store(e) => Some(e),
        }
    }
}
