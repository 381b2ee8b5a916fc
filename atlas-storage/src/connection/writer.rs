//! Write serialization: BEGIN IMMEDIATE transactions and the batch writer.

use std::sync::Arc;
use std::thread::JoinHandle;

use atlas_core::errors::StorageError;
use crossbeam_channel::{unbounded, Sender};
use rusqlite::Connection;

use super::DatabaseManager;

/// Execute a write operation inside a BEGIN IMMEDIATE transaction.
/// This acquires the write lock at transaction start, preventing SQLITE_BUSY.
pub fn with_immediate_transaction<F, T>(
    conn: &Connection,
    f: F,
) -> Result<T, StorageError>
where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, StorageError>,
{
    // Issue a single `BEGIN IMMEDIATE` and wrap it in a `Transaction` (which
    // commits on `commit()` and rolls back on drop). `new_unchecked` performs
    // exactly one BEGIN with the requested behavior, avoiding the double-BEGIN
    // that a separate `execute_batch("BEGIN IMMEDIATE")` + `unchecked_transaction`
    // would cause.
    let tx = rusqlite::Transaction::new_unchecked(
        conn,
        rusqlite::TransactionBehavior::Immediate,
    )
    .map_err(|e| StorageError::SqliteError {
        message: format!("failed to begin immediate transaction: {e}"),
    })?;

    let result = f(&tx)?;

    tx.commit().map_err(|e| StorageError::SqliteError {
        message: format!("failed to commit: {e}"),
    })?;

    Ok(result)
}

type WriteOp = Box<dyn FnOnce(&Connection) -> Result<(), StorageError> + Send>;

enum Command {
    Write(WriteOp),
    Shutdown,
}

/// Single-writer actor in front of the store.
///
/// Parallel producers submit write closures; a dedicated thread drains them
/// in submission order onto the shared writer connection. Producers never
/// touch the connection themselves.
pub struct BatchWriter {
    sender: Sender<Command>,
    handle: Option<JoinHandle<usize>>,
}

impl BatchWriter {
    /// Spawn the writer thread against a shared database manager.
    pub fn spawn(manager: Arc<DatabaseManager>) -> Self {
        let (sender, receiver) = unbounded::<Command>();
        let handle = std::thread::spawn(move || {
            let mut failures = 0usize;
            while let Ok(command) = receiver.recv() {
                match command {
                    Command::Write(op) => {
                        // Ops manage their own transactions; the actor only
                        // serializes them onto the writer connection.
                        let result = manager.with_writer(|conn| op(conn));
                        if let Err(e) = result {
                            failures += 1;
                            tracing::error!(error = %e, "batch write failed");
                        }
                    }
                    Command::Shutdown => break,
                }
            }
            failures
        });
        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// Submit a write operation. Returns an error if the writer thread is
    /// gone.
    pub fn submit<F>(&self, op: F) -> Result<(), StorageError>
    where
        F: FnOnce(&Connection) -> Result<(), StorageError> + Send + 'static,
    {
        self.sender
            .send(Command::Write(Box::new(op)))
            .map_err(|_| StorageError::BatchChannelClosed)
    }

    /// Drain the queue, stop the writer thread, and return how many submitted
    /// operations failed.
    pub fn shutdown(mut self) -> Result<usize, StorageError> {
        self.sender
            .send(Command::Shutdown)
            .map_err(|_| StorageError::BatchChannelClosed)?;
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| StorageError::SqliteError {
                message: "batch writer thread panicked".to_string(),
            }),
            None => Ok(0),
        }
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        // Best effort: ask the thread to stop if shutdown() was never called.
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
