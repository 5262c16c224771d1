/// Connection Facade Module
///
/// The public database handle. Every method forwards one command to the
/// worker thread owning the driver connection and returns a future that
/// settles with the worker's reply.
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

use crate::consts;
use crate::error::{Error, Result};
use crate::statement::Statement;
use crate::types::{Params, Row, RunResult};
use crate::worker::{request, Command, Worker};

/// An open database handle.
///
/// A `Connection` is the only facade over its underlying driver handle.
/// Operations issued against it (and against statements prepared from it)
/// are executed in issue order by a single worker; callers may issue a
/// batch of operations and join on their futures without waiting for
/// earlier completions.
///
/// # Examples
///
/// ```no_run
/// # async fn demo() -> asqlite::Result<()> {
/// let db = asqlite::Connection::open("app.db").await?;
/// db.run("CREATE TABLE tbl (id INTEGER PRIMARY KEY, name TEXT)").await?;
/// let inserted = db
///     .run_with("INSERT INTO tbl (name) VALUES (?)", ("foo",))
///     .await?;
/// assert_eq!(inserted.last_insert_rowid, 1);
/// db.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    tx: UnboundedSender<Command>,
    closed: AtomicBool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Opens a database file, creating it when absent.
    ///
    /// Equivalent to [`Connection::open_with_flags`] with
    /// `OPEN_READWRITE | OPEN_CREATE`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Connection> {
        Self::open_with_flags(path, consts::OPEN_READWRITE | consts::OPEN_CREATE).await
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Connection> {
        Self::open(consts::MEMORY).await
    }

    /// Opens a database under an explicit open-mode flag bit-set.
    ///
    /// # Arguments
    ///
    /// * `path` - Database file path, or [`consts::MEMORY`] for an
    ///   in-memory database
    /// * `flags` - Bit-set over `OPEN_READONLY`, `OPEN_READWRITE` and
    ///   `OPEN_CREATE`
    ///
    /// # Errors
    ///
    /// Rejects with the driver's open failure; a missing or inaccessible
    /// path without the create flag reports `CANTOPEN`.
    pub async fn open_with_flags(path: impl AsRef<Path>, flags: i32) -> Result<Connection> {
        let (tx, ready) = Worker::spawn(path.as_ref().to_path_buf(), flags)?;
        match ready.await {
            Ok(Ok(())) => Ok(Connection {
                tx,
                closed: AtomicBool::new(false),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Closed),
        }
    }

    /// Executes a statement that produces no rows.
    pub async fn run(&self, sql: &str) -> Result<RunResult> {
        self.run_with(sql, Params::None).await
    }

    /// Executes a statement that produces no rows, binding parameters.
    ///
    /// Resolves with the last-inserted rowid and the affected-row count.
    pub async fn run_with(&self, sql: &str, params: impl Into<Params>) -> Result<RunResult> {
        let (reply, rx) = oneshot::channel();
        self.call(
            Command::Run {
                sql: sql.to_string(),
                params: params.into(),
                reply,
            },
            rx,
        )
        .await
    }

    /// Executes a query and resolves with its first row.
    ///
    /// Zero matching rows resolve with `None`; that is not an error.
    pub async fn get(&self, sql: &str) -> Result<Option<Row>> {
        self.get_with(sql, Params::None).await
    }

    /// Executes a query with parameters and resolves with its first row.
    pub async fn get_with(&self, sql: &str, params: impl Into<Params>) -> Result<Option<Row>> {
        let (reply, rx) = oneshot::channel();
        self.call(
            Command::Get {
                sql: sql.to_string(),
                params: params.into(),
                reply,
            },
            rx,
        )
        .await
    }

    /// Executes a query and resolves with every matching row, in order.
    ///
    /// Zero matching rows resolve with an empty vector.
    pub async fn all(&self, sql: &str) -> Result<Vec<Row>> {
        self.all_with(sql, Params::None).await
    }

    /// Executes a query with parameters and resolves with every row.
    pub async fn all_with(&self, sql: &str, params: impl Into<Params>) -> Result<Vec<Row>> {
        let (reply, rx) = oneshot::channel();
        self.call(
            Command::All {
                sql: sql.to_string(),
                params: params.into(),
                reply,
            },
            rx,
        )
        .await
    }

    /// Executes one or more semicolon-separated statements.
    ///
    /// No parameter binding, no row results. Resolves with the connection
    /// itself so calls can be chained.
    pub async fn exec(&self, sql: &str) -> Result<&Self> {
        let (reply, rx) = oneshot::channel();
        self.call(
            Command::Exec {
                sql: sql.to_string(),
                reply,
            },
            rx,
        )
        .await?;
        Ok(self)
    }

    /// Compiles a statement for repeated execution.
    ///
    /// # Errors
    ///
    /// Rejects with an `ERROR`-kind failure naming the syntax problem when
    /// the SQL is malformed.
    pub async fn prepare(&self, sql: &str) -> Result<Statement> {
        self.prepare_with(sql, Params::None).await
    }

    /// Compiles a statement and binds initial parameters.
    pub async fn prepare_with(&self, sql: &str, params: impl Into<Params>) -> Result<Statement> {
        let (reply, rx) = oneshot::channel();
        let id = self
            .call(
                Command::Prepare {
                    sql: sql.to_string(),
                    params: params.into(),
                    reply,
                },
                rx,
            )
            .await?;
        Ok(Statement::new(id, sql.to_string(), self.tx.clone()))
    }

    /// Shuts the underlying handle down.
    ///
    /// # Errors
    ///
    /// Rejects with `BUSY` while unfinalized statements remain, and with
    /// `MISUSE` when the connection is already closed. After a successful
    /// close every further operation fails; `close` never resolves twice.
    pub async fn close(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.call(Command::Close { reply }, rx).await?;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    async fn call<T>(
        &self,
        command: Command,
        reply: oneshot::Receiver<Result<T>>,
    ) -> Result<T> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        request(&self.tx, command, reply).await
    }
}
