//! The public session: serializes callers onto one connection and surfaces
//! typed results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;

use tokio::sync::Mutex;

use crate::block::Block;
use crate::connection::{Connection, QueryOutcome};
use crate::errors::{ConnectionError, Error, Result};
use crate::options::Options;
use crate::proto::{Progress, ProfileInfo, ServerInfo};

/// Establish a session: TCP (or TLS) connect plus protocol handshake.
pub async fn connect(options: Options) -> Result<Session> {
    Session::connect(options).await
}

/// Result of a data-returning statement.
#[derive(Debug, Default)]
pub struct QueryResult {
    /// Non-empty data blocks in arrival order.
    pub blocks: Vec<Block>,
    pub totals: Option<Block>,
    pub extremes: Option<Block>,
    pub progress: Progress,
    pub profile: ProfileInfo,
}

impl QueryResult {
    /// Total rows across all returned blocks.
    pub fn row_count(&self) -> usize {
        self.blocks.iter().map(Block::row_count).sum()
    }
}

/// A single-connection session.
///
/// All operations take `&self`; concurrent callers are serialized FIFO on an
/// internal lock, so at most one protocol exchange is ever in flight. A
/// fatal error empties the connection slot; afterwards every operation fails
/// fast until [`Session::reset`].
pub struct Session {
    options: Options,
    conn: Mutex<Option<Connection>>,
    cancel: AtomicBool,
    server: StdMutex<Option<ServerInfo>>,
    last_progress: StdMutex<Progress>,
    last_profile: StdMutex<ProfileInfo>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("options", &self.options).finish_non_exhaustive()
    }
}

impl Session {
    pub async fn connect(options: Options) -> Result<Session> {
        let conn = Connection::connect(&options).await?;
        let server = conn.server_info().clone();
        Ok(Session {
            options,
            conn: Mutex::new(Some(conn)),
            cancel: AtomicBool::new(false),
            server: StdMutex::new(Some(server)),
            last_progress: StdMutex::new(Progress::default()),
            last_profile: StdMutex::new(ProfileInfo::default()),
        })
    }

    /// Run a statement and discard any returned data blocks.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        self.run(sql, false).await.map(|_| ())
    }

    /// Run a statement and return its data blocks.
    pub async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.run(sql, true).await
    }

    async fn run(&self, sql: &str, collect: bool) -> Result<QueryResult> {
        let mut guard = self.conn.lock().await;
        // A cancel issued before any bytes went out is a no-op.
        self.cancel.store(false, Ordering::SeqCst);
        let conn = guard.as_mut().ok_or(ConnectionError::Closed)?;
        let result = conn
            .run_query(sql, "", collect, &self.options, &self.cancel)
            .await;
        let outcome = self.finish(&mut guard, result)?;
        Ok(QueryResult {
            blocks: outcome.blocks,
            totals: outcome.totals,
            extremes: outcome.extremes,
            progress: outcome.progress,
            profile: outcome.profile,
        })
    }

    /// Bulk-insert blocks into `table`.
    ///
    /// Column names must be a subset of the server's schema template and the
    /// types must match it exactly; the server resolves columns by name.
    pub async fn insert(
        &self,
        table: &str,
        blocks: impl IntoIterator<Item = Block>,
    ) -> Result<()> {
        let blocks: Vec<Block> = blocks.into_iter().collect();
        let mut guard = self.conn.lock().await;
        self.cancel.store(false, Ordering::SeqCst);
        let conn = guard.as_mut().ok_or(ConnectionError::Closed)?;
        let result = conn.insert(table, blocks, &self.options).await;
        self.finish(&mut guard, result)?;
        Ok(())
    }

    /// Insert a single block.
    pub async fn insert_block(&self, table: &str, block: Block) -> Result<()> {
        self.insert(table, [block]).await
    }

    /// Ping/Pong round trip.
    pub async fn ping(&self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(ConnectionError::Closed)?;
        let result = conn.ping().await;
        if result.is_err() || conn.is_broken() {
            *guard = None;
        }
        result
    }

    /// Request cancellation of the statement currently in flight.
    ///
    /// The running call still drains the response stream to its end before
    /// returning; whatever blocks arrived by then are returned normally.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Tear down the connection and run the handshake again. Any statement
    /// waiting on the lock runs against the fresh connection.
    pub async fn reset(&self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        *guard = None;
        let conn = Connection::connect(&self.options).await?;
        *self.server.lock().unwrap() = Some(conn.server_info().clone());
        *guard = Some(conn);
        Ok(())
    }

    /// Close the connection; later operations fail until [`Session::reset`].
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        *guard = None;
    }

    /// Server identity captured at the last successful handshake.
    pub fn server_info(&self) -> Option<ServerInfo> {
        self.server.lock().unwrap().clone()
    }

    /// Progress totals of the most recent completed statement.
    pub fn last_progress(&self) -> Progress {
        *self.last_progress.lock().unwrap()
    }

    /// Profile counters of the most recent completed statement.
    pub fn last_profile(&self) -> ProfileInfo {
        *self.last_profile.lock().unwrap()
    }

    /// Apply the post-exchange bookkeeping: drop broken connections, keep
    /// the progress/profile snapshots queryable.
    fn finish(
        &self,
        guard: &mut tokio::sync::MutexGuard<'_, Option<Connection>>,
        result: Result<QueryOutcome>,
    ) -> Result<QueryOutcome> {
        let broken = guard.as_ref().is_some_and(Connection::is_broken);
        let fatal = result.as_ref().err().is_some_and(Error::is_fatal);
        if broken || fatal {
            **guard = None;
        }
        let outcome = result?;
        *self.last_progress.lock().unwrap() = outcome.progress;
        *self.last_profile.lock().unwrap() = outcome.profile;
        Ok(outcome)
    }
}
