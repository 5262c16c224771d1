/// Error Module
///
/// Defines the error type shared by every asynchronous operation in this
/// crate. Driver errors are forwarded intact; the only adapter-detected
/// conditions are a closed handle and a failed worker spawn.
use crate::consts;
use thiserror::Error;

/// Errors surfaced by connection and statement operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Error reported by the SQLite engine, forwarded verbatim.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The database handle has already been closed.
    #[error("database handle is closed")]
    Closed,

    /// The worker thread backing the connection could not be started.
    #[error("failed to start database worker: {0}")]
    Thread(#[from] std::io::Error),
}

impl Error {
    /// Returns the engine result code classifying this error.
    ///
    /// For driver failures this is the primary result code the engine
    /// reported (`CANTOPEN`, `BUSY`, ...). Driver-side errors without an
    /// engine code classify as `ERROR`; operations on a closed handle as
    /// `MISUSE`; a failed worker spawn as `INTERNAL`.
    pub fn code(&self) -> i32 {
        match self {
            Error::Sqlite(rusqlite::Error::SqliteFailure(cause, _)) => cause.extended_code & 0xff,
            Error::Sqlite(_) => consts::ERROR,
            Error::Closed => consts::MISUSE,
            Error::Thread(_) => consts::INTERNAL,
        }
    }
}

/// Type alias for Result to use [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
