//! asqlite - Future-Returning SQLite Facade
//!
//! A thin adapter over the embedded SQLite driver: every database
//! operation returns a future that settles exactly once with the driver's
//! outcome, so callers compose queries with `async`/`await` instead of
//! blocking calls.
//!
//! SQL execution, transactions, storage and locking all belong to the
//! embedded engine; this crate only adapts the call style. Operations on
//! one [`Connection`] (and on statements prepared from it) are executed in
//! issue order by a worker dedicated to that connection.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> asqlite::Result<()> {
//! let db = asqlite::Connection::open_in_memory().await?;
//! db.run("CREATE TABLE tbl (id INTEGER PRIMARY KEY, name TEXT)").await?;
//! db.run_with("INSERT INTO tbl (name) VALUES (?)", ("foo",)).await?;
//! let rows = db.all("SELECT name FROM tbl ORDER BY id").await?;
//! assert_eq!(rows.len(), 1);
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod consts;

mod connection;
mod error;
mod statement;
mod types;
mod worker;

// Re-export commonly used types for convenience
pub use connection::Connection;
pub use consts::*;
pub use error::{Error, Result};
pub use statement::Statement;
pub use types::{Params, Row, RunResult, Value};
