/// Database Worker Module
///
/// Single-owner pattern: one thread owns the driver connection and
/// processes commands from an unbounded channel in issue order. Every
/// command carries a oneshot sender through which exactly one settlement
/// (success or failure) is delivered back to the facade that issued it.
use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;

use rusqlite::OpenFlags;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::types::{Params, Row, RunResult, Value};
use std::sync::Arc;

/// Reply channel for one command.
pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// Commands sent to the worker.
pub(crate) enum Command {
    Run {
        sql: String,
        params: Params,
        reply: Reply<RunResult>,
    },
    Get {
        sql: String,
        params: Params,
        reply: Reply<Option<Row>>,
    },
    All {
        sql: String,
        params: Params,
        reply: Reply<Vec<Row>>,
    },
    Exec {
        sql: String,
        reply: Reply<()>,
    },
    Prepare {
        sql: String,
        params: Params,
        reply: Reply<u64>,
    },
    Close {
        reply: Reply<()>,
    },
    StmtRun {
        id: u64,
        params: Option<Params>,
        reply: Reply<()>,
    },
    StmtGet {
        id: u64,
        params: Option<Params>,
        reply: Reply<Option<Row>>,
    },
    StmtBind {
        id: u64,
        params: Params,
        reply: Reply<()>,
    },
    StmtReset {
        id: u64,
        reply: Reply<()>,
    },
    // Reply is absent when finalization is triggered by a facade drop.
    StmtFinalize {
        id: u64,
        reply: Option<Reply<()>>,
    },
}

/// Sends a command and awaits its settlement.
///
/// A disconnected channel on either side means the worker is gone, which
/// only happens once the handle has been closed.
pub(crate) async fn request<T>(
    tx: &UnboundedSender<Command>,
    command: Command,
    reply: oneshot::Receiver<Result<T>>,
) -> Result<T> {
    tx.send(command).map_err(|_| Error::Closed)?;
    reply.await.unwrap_or(Err(Error::Closed))
}

/// Materialized result cursor of a prepared statement.
struct Cursor {
    rows: Vec<Row>,
    next: usize,
}

/// Worker-side state of one prepared statement.
struct PreparedState {
    sql: String,
    params: Params,
    cursor: Option<Cursor>,
}

/// Owns the driver connection and the prepared-statement table.
pub(crate) struct Worker {
    conn: rusqlite::Connection,
    statements: HashMap<u64, PreparedState>,
    next_id: u64,
    close_reply: Option<Reply<()>>,
}

impl Worker {
    /// Spawns the worker thread and opens the database inside it.
    ///
    /// Returns the command sender and a receiver that settles with the
    /// outcome of the open.
    pub(crate) fn spawn(
        path: PathBuf,
        flags: i32,
    ) -> std::io::Result<(UnboundedSender<Command>, oneshot::Receiver<Result<()>>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        thread::Builder::new()
            .name("asqlite-worker".to_string())
            .spawn(move || {
                let conn = match rusqlite::Connection::open_with_flags(
                    &path,
                    driver_open_flags(flags),
                ) {
                    Ok(conn) => conn,
                    Err(e) => {
                        let _ = ready_tx.send(Err(Error::Sqlite(e)));
                        return;
                    }
                };
                tracing::debug!(path = %path.display(), "database opened");
                let _ = ready_tx.send(Ok(()));

                let worker = Worker {
                    conn,
                    statements: HashMap::new(),
                    next_id: 0,
                    close_reply: None,
                };
                worker.run(rx);
            })?;

        Ok((tx, ready_rx))
    }

    fn run(mut self, mut rx: UnboundedReceiver<Command>) {
        while let Some(command) = rx.blocking_recv() {
            if self.handle_command(command) {
                break;
            }
        }

        let Worker {
            conn, statements, close_reply, ..
        } = self;
        drop(statements);
        let result = conn.close().map_err(|(_, e)| Error::Sqlite(e));
        match &result {
            Ok(()) => tracing::debug!("database closed"),
            Err(e) => tracing::warn!(error = %e, "database close failed"),
        }
        if let Some(reply) = close_reply {
            let _ = reply.send(result);
        }
    }

    /// Handles one command; returns true once shutdown should begin.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Run { sql, params, reply } => {
                let _ = reply.send(self.run_sql(&sql, &params));
            }
            Command::Get { sql, params, reply } => {
                let _ = reply.send(query_first(&self.conn, &sql, &params));
            }
            Command::All { sql, params, reply } => {
                let _ = reply.send(query_all(&self.conn, &sql, &params));
            }
            Command::Exec { sql, reply } => {
                let _ = reply.send(self.conn.execute_batch(&sql).map_err(Error::from));
            }
            Command::Prepare { sql, params, reply } => {
                let _ = reply.send(self.prepare(sql, params));
            }
            Command::Close { reply } => {
                if self.statements.is_empty() {
                    self.close_reply = Some(reply);
                    return true;
                }
                let _ = reply.send(Err(Error::Sqlite(busy_error())));
            }
            Command::StmtRun { id, params, reply } => {
                let _ = reply.send(self.stmt_run(id, params));
            }
            Command::StmtGet { id, params, reply } => {
                let _ = reply.send(self.stmt_get(id, params));
            }
            Command::StmtBind { id, params, reply } => {
                let _ = reply.send(self.stmt_bind(id, params));
            }
            Command::StmtReset { id, reply } => {
                let _ = reply.send(self.stmt_reset(id));
            }
            Command::StmtFinalize { id, reply } => {
                let result = match self.statements.remove(&id) {
                    Some(_) => Ok(()),
                    None => Err(Error::Sqlite(misuse_error())),
                };
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
        }
        false
    }

    fn run_sql(&self, sql: &str, params: &Params) -> Result<RunResult> {
        let mut stmt = self.conn.prepare(sql)?;
        bind(&mut stmt, params)?;
        let changes = stmt.raw_execute()?;
        Ok(RunResult {
            last_insert_rowid: self.conn.last_insert_rowid(),
            changes,
        })
    }

    fn prepare(&mut self, sql: String, params: Params) -> Result<u64> {
        // Probe compilation so syntax errors reject the prepare itself,
        // and eager binding so invalid placeholders do the same.
        let mut stmt = self.conn.prepare(&sql)?;
        bind(&mut stmt, &params)?;
        drop(stmt);

        let id = self.next_id;
        self.next_id += 1;
        self.statements.insert(
            id,
            PreparedState {
                sql,
                params,
                cursor: None,
            },
        );
        Ok(id)
    }

    fn stmt_run(&mut self, id: u64, params: Option<Params>) -> Result<()> {
        let entry = self.statements.get_mut(&id).ok_or_else(finalized_error)?;
        if let Some(params) = params {
            entry.params = params;
        }
        entry.cursor = None;
        let mut stmt = self.conn.prepare(&entry.sql)?;
        bind(&mut stmt, &entry.params)?;
        stmt.raw_execute()?;
        Ok(())
    }

    fn stmt_get(&mut self, id: u64, params: Option<Params>) -> Result<Option<Row>> {
        let entry = self.statements.get_mut(&id).ok_or_else(finalized_error)?;
        if let Some(params) = params {
            entry.params = params;
            entry.cursor = None;
        }
        if entry.cursor.is_none() {
            let rows = query_all(&self.conn, &entry.sql, &entry.params)?;
            entry.cursor = Some(Cursor { rows, next: 0 });
        }
        let cursor = match entry.cursor.as_mut() {
            Some(cursor) => cursor,
            None => return Ok(None),
        };
        let row = cursor.rows.get(cursor.next).cloned();
        if row.is_some() {
            cursor.next += 1;
        }
        Ok(row)
    }

    fn stmt_bind(&mut self, id: u64, params: Params) -> Result<()> {
        let entry = self.statements.get_mut(&id).ok_or_else(finalized_error)?;
        // Bind against a fresh compilation so bad placeholders are
        // reported now rather than at the next execution.
        let mut stmt = self.conn.prepare(&entry.sql)?;
        bind(&mut stmt, &params)?;
        entry.params = params;
        entry.cursor = None;
        Ok(())
    }

    fn stmt_reset(&mut self, id: u64) -> Result<()> {
        let entry = self.statements.get_mut(&id).ok_or_else(finalized_error)?;
        if let Some(cursor) = entry.cursor.as_mut() {
            cursor.next = 0;
        }
        Ok(())
    }
}

/// Translates the public flag bit-set into driver open flags.
fn driver_open_flags(flags: i32) -> OpenFlags {
    OpenFlags::from_bits_truncate(flags)
}

fn bind(stmt: &mut rusqlite::Statement<'_>, params: &Params) -> Result<()> {
    match params {
        Params::None => {}
        Params::Positional(values) => {
            for (index, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(index + 1, value)?;
            }
        }
        Params::Named(pairs) => {
            for (name, value) in pairs {
                let index = stmt
                    .parameter_index(name)?
                    .ok_or_else(|| rusqlite::Error::InvalidParameterName(name.clone()))?;
                stmt.raw_bind_parameter(index, value)?;
            }
        }
    }
    Ok(())
}

fn query_all(conn: &rusqlite::Connection, sql: &str, params: &Params) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    bind(&mut stmt, params)?;
    let columns = column_names(&stmt);
    let mut out = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        out.push(read_row(&columns, row)?);
    }
    Ok(out)
}

fn query_first(conn: &rusqlite::Connection, sql: &str, params: &Params) -> Result<Option<Row>> {
    let mut stmt = conn.prepare(sql)?;
    bind(&mut stmt, params)?;
    let columns = column_names(&stmt);
    let mut rows = stmt.raw_query();
    match rows.next()? {
        Some(row) => Ok(Some(read_row(&columns, row)?)),
        None => Ok(None),
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Arc<Vec<String>> {
    Arc::new(stmt.column_names().iter().map(|c| c.to_string()).collect())
}

fn read_row(columns: &Arc<Vec<String>>, row: &rusqlite::Row<'_>) -> Result<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for index in 0..columns.len() {
        values.push(Value::from(row.get_ref(index)?));
    }
    Ok(Row::new(Arc::clone(columns), values))
}

fn busy_error() -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        Some("unable to close due to unfinalized statements".to_string()),
    )
}

fn misuse_error() -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
        Some("statement has been finalized".to_string()),
    )
}

fn finalized_error() -> Error {
    Error::Sqlite(misuse_error())
}
