/// Statement Facade Module
///
/// The public prepared-statement handle. Commands are forwarded to the
/// worker of the owning connection; the statement is addressed by the slot
/// id the worker assigned at prepare time.
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::types::{Params, Row};
use crate::worker::{request, Command};

/// A compiled statement, bound to the connection that prepared it.
///
/// The owning connection cannot close while the statement is alive and
/// unfinalized; `close` reports `BUSY` until [`Statement::finalize`] has
/// resolved. After `finalize` every operation on the statement fails with
/// a `MISUSE`-kind error.
pub struct Statement {
    id: u64,
    sql: String,
    tx: UnboundedSender<Command>,
    finalized: AtomicBool,
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("finalized", &self.finalized.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Statement {
    pub(crate) fn new(id: u64, sql: String, tx: UnboundedSender<Command>) -> Self {
        Statement {
            id,
            sql,
            tx,
            finalized: AtomicBool::new(false),
        }
    }

    /// The SQL text this statement was compiled from.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Executes the statement with its current parameter bindings.
    ///
    /// Resolves with the statement itself so calls can be chained; may be
    /// called repeatedly.
    pub async fn run(&self) -> Result<&Self> {
        self.run_inner(None).await
    }

    /// Executes the statement with fresh parameters.
    pub async fn run_with(&self, params: impl Into<Params>) -> Result<&Self> {
        self.run_inner(Some(params.into())).await
    }

    async fn run_inner(&self, params: Option<Params>) -> Result<&Self> {
        let (reply, rx) = oneshot::channel();
        request(
            &self.tx,
            Command::StmtRun {
                id: self.id,
                params,
                reply,
            },
            rx,
        )
        .await?;
        Ok(self)
    }

    /// Advances the result cursor by one row.
    ///
    /// Resolves with `None` once the result set is exhausted.
    pub async fn get(&self) -> Result<Option<Row>> {
        self.get_inner(None).await
    }

    /// Rebinds parameters, then advances the cursor of the fresh result.
    pub async fn get_with(&self, params: impl Into<Params>) -> Result<Option<Row>> {
        self.get_inner(Some(params.into())).await
    }

    async fn get_inner(&self, params: Option<Params>) -> Result<Option<Row>> {
        let (reply, rx) = oneshot::channel();
        request(
            &self.tx,
            Command::StmtGet {
                id: self.id,
                params,
                reply,
            },
            rx,
        )
        .await
    }

    /// Attaches parameter values to the statement's placeholders.
    ///
    /// Invalidates any active result cursor; the next `get` starts from
    /// the first row of the rebound result.
    pub async fn bind(&self, params: impl Into<Params>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        request(
            &self.tx,
            Command::StmtBind {
                id: self.id,
                params: params.into(),
                reply,
            },
            rx,
        )
        .await
    }

    /// Rewinds the result cursor without re-binding parameters.
    ///
    /// A following `get` replays the result from its first row. The driver
    /// never reports a reset failure under normal operation.
    pub async fn reset(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        request(&self.tx, Command::StmtReset { id: self.id, reply }, rx).await
    }

    /// Releases the compiled statement.
    ///
    /// Must be called before the owning connection can close. Terminal:
    /// any later operation on this statement fails with a `MISUSE`-kind
    /// error.
    pub async fn finalize(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        let result = request(
            &self.tx,
            Command::StmtFinalize {
                id: self.id,
                reply: Some(reply),
            },
            rx,
        )
        .await;
        if result.is_ok() {
            self.finalized.store(true, Ordering::Release);
        }
        result
    }
}

impl Drop for Statement {
    // A statement abandoned without finalize would hold its slot and keep
    // the connection reporting BUSY on close; release it best-effort.
    fn drop(&mut self) {
        if !self.finalized.load(Ordering::Acquire) {
            let _ = self.tx.send(Command::StmtFinalize {
                id: self.id,
                reply: None,
            });
        }
    }
}
