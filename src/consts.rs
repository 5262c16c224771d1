//! Engine Constants Module
//!
//! Open-mode flags and the SQLite result-code table, re-exported at the
//! crate root. The values are fixed by the engine and must match it
//! exactly; nothing in this module is mutable at runtime.

/// Open the database in read-only mode.
pub const OPEN_READONLY: i32 = 1;
/// Open the database for reading and writing.
pub const OPEN_READWRITE: i32 = 2;
/// Create the database file if it does not exist.
pub const OPEN_CREATE: i32 = 4;

/// Path marker for a private in-memory database.
pub const MEMORY: &str = ":memory:";

// Result codes, as reported by the engine.
pub const OK: i32 = 0;
pub const ERROR: i32 = 1;
pub const INTERNAL: i32 = 2;
pub const PERM: i32 = 3;
pub const ABORT: i32 = 4;
pub const BUSY: i32 = 5;
pub const LOCKED: i32 = 6;
pub const NOMEM: i32 = 7;
pub const READONLY: i32 = 8;
pub const INTERRUPT: i32 = 9;
pub const IOERR: i32 = 10;
pub const CORRUPT: i32 = 11;
pub const NOTFOUND: i32 = 12;
pub const FULL: i32 = 13;
pub const CANTOPEN: i32 = 14;
pub const PROTOCOL: i32 = 15;
pub const EMPTY: i32 = 16;
pub const SCHEMA: i32 = 17;
pub const TOOBIG: i32 = 18;
pub const CONSTRAINT: i32 = 19;
pub const MISMATCH: i32 = 20;
pub const MISUSE: i32 = 21;
pub const NOLFS: i32 = 22;
pub const AUTH: i32 = 23;
pub const FORMAT: i32 = 24;
pub const RANGE: i32 = 25;
pub const NOTADB: i32 = 26;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_flags_match_engine() {
        assert_eq!(OPEN_READONLY, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY.bits());
        assert_eq!(OPEN_READWRITE, rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE.bits());
        assert_eq!(OPEN_CREATE, rusqlite::OpenFlags::SQLITE_OPEN_CREATE.bits());
    }

    #[test]
    fn test_result_codes_match_engine() {
        assert_eq!(OK, rusqlite::ffi::SQLITE_OK);
        assert_eq!(ERROR, rusqlite::ffi::SQLITE_ERROR);
        assert_eq!(BUSY, rusqlite::ffi::SQLITE_BUSY);
        assert_eq!(CANTOPEN, rusqlite::ffi::SQLITE_CANTOPEN);
        assert_eq!(MISUSE, rusqlite::ffi::SQLITE_MISUSE);
        assert_eq!(NOTADB, rusqlite::ffi::SQLITE_NOTADB);
    }
}
