//! Queued text-file I/O on a single background worker.
//!
//! Producers on any thread enqueue [`PendingFileOp`]s on an unbounded
//! channel; one dedicated OS thread drains it in FIFO order. Writes to the
//! same path from one caller therefore land in submission order. A failed
//! operation is reported through its own [`Completion`] and never stops the
//! worker.
//!
//! ```ignore
//! let io = TextIo::spawn(&registry)?;
//! io.submit_write(vec!["a".into(), "b".into()], "out.txt").wait()?;
//! let lines = io.submit_read("out.txt").await?;
//! ```

use crate::shutdown::{ShutdownParticipant, ShutdownRegistry};
use hearth_core::error::{HearthError, HearthResult};
use std::fs::File;
use std::future::Future;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

pub const WORKER_THREAD_NAME: &str = "hearth-text-io";

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

// ---------------------------------------------------------------------------
// Completion handles
// ---------------------------------------------------------------------------

/// Eventual result of a queued operation.
///
/// Block with [`wait`](Self::wait), poll with [`try_take`](Self::try_take),
/// or `.await` it. If the operation is dropped unexecuted (worker stopped)
/// the handle resolves to `HearthError::WorkerStopped` rather than hanging.
#[must_use = "dropping the handle discards the result; the operation still runs"]
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<HearthResult<T>>,
}

/// Lines of a file, or `FileNotFound` / `FileIo`.
pub type ReadHandle = Completion<Vec<String>>;

/// Completion of a write. Dropping it gives fire-and-forget semantics.
pub type WriteHandle = Completion<()>;

impl<T> Completion<T> {
    fn channel() -> (oneshot::Sender<HearthResult<T>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Blocks the current thread until the worker delivers the result.
    ///
    /// Panics if called from inside an async runtime; `.await` there instead.
    pub fn wait(self) -> HearthResult<T> {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(HearthError::WorkerStopped))
    }

    /// Non-blocking poll. `None` while the operation is still queued or
    /// running; the result is handed out once.
    pub fn try_take(&mut self) -> Option<HearthResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(HearthError::WorkerStopped)),
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = HearthResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(HearthError::WorkerStopped)))
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// A queued file operation. Consumed by the worker in one iteration.
#[derive(Debug)]
pub enum PendingFileOp {
    Write {
        path: PathBuf,
        lines: Vec<String>,
        done: oneshot::Sender<HearthResult<()>>,
    },
    Read {
        path: PathBuf,
        reply: oneshot::Sender<HearthResult<Vec<String>>>,
    },
}

/// Single-worker text file reader/writer.
///
/// Registers itself with the [`ShutdownRegistry`] on construction; its stop
/// action refuses new submissions, lets the queue drain, and joins the
/// worker thread.
pub struct TextIo {
    queue: Mutex<Option<mpsc::UnboundedSender<PendingFileOp>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TextIo {
    /// Starts the worker thread and registers with `registry`.
    pub fn spawn(registry: &ShutdownRegistry) -> HearthResult<Arc<Self>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || run_worker(rx))
            .map_err(|e| HearthError::Internal(format!("failed to spawn text I/O worker: {e}")))?;

        let io = Arc::new(Self {
            queue: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        });
        registry.register(io.clone());
        Ok(io)
    }

    /// Queues a create-or-truncate write of `lines`, each followed by the
    /// platform line separator. Returns without waiting.
    pub fn submit_write<P: AsRef<Path>>(&self, lines: Vec<String>, path: P) -> WriteHandle {
        let (done, handle) = Completion::channel();
        self.enqueue(PendingFileOp::Write {
            path: path.as_ref().to_path_buf(),
            lines,
            done,
        });
        handle
    }

    /// Queues a read of every line in `path`. Returns without waiting.
    pub fn submit_read<P: AsRef<Path>>(&self, path: P) -> ReadHandle {
        let (reply, handle) = Completion::channel();
        self.enqueue(PendingFileOp::Read {
            path: path.as_ref().to_path_buf(),
            reply,
        });
        handle
    }

    /// Whether new submissions are still accepted.
    pub fn is_running(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Dropping a rejected op drops its sender, so the caller's handle
    /// resolves to `WorkerStopped`.
    fn enqueue(&self, op: PendingFileOp) {
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        match queue.as_ref() {
            Some(tx) => {
                if tx.send(op).is_err() {
                    tracing::warn!("text I/O worker is gone; operation dropped");
                }
            }
            None => tracing::warn!("text I/O is shut down; operation rejected"),
        }
    }
}

impl ShutdownParticipant for TextIo {
    fn name(&self) -> &str {
        WORKER_THREAD_NAME
    }

    fn shutdown(&self) -> HearthResult<()> {
        // Closing the channel lets the worker finish what is queued, then exit.
        let sender = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match worker {
            Some(handle) if handle.thread().id() != std::thread::current().id() => handle
                .join()
                .map_err(|_| HearthError::Internal("text I/O worker panicked".into())),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

fn run_worker(mut rx: mpsc::UnboundedReceiver<PendingFileOp>) {
    tracing::info!("text I/O worker started");
    let mut processed = 0usize;

    while let Some(op) = rx.blocking_recv() {
        match op {
            PendingFileOp::Write { path, lines, done } => {
                let result = write_lines(&path, &lines);
                match &result {
                    Ok(()) => tracing::debug!(path = %path.display(), lines = lines.len(), "wrote file"),
                    Err(e) => tracing::error!(path = %path.display(), error = %e, "write failed"),
                }
                // The caller may have dropped the handle.
                let _ = done.send(result);
            }
            PendingFileOp::Read { path, reply } => {
                let result = read_lines(&path);
                match &result {
                    Ok(lines) => tracing::debug!(path = %path.display(), lines = lines.len(), "read file"),
                    Err(HearthError::FileNotFound(_)) => {
                        tracing::warn!(path = %path.display(), "read of missing file")
                    }
                    Err(e) => tracing::error!(path = %path.display(), error = %e, "read failed"),
                }
                let _ = reply.send(result);
            }
        }
        processed += 1;
    }

    tracing::info!(processed, "text I/O worker stopped");
}

fn write_lines(path: &Path, lines: &[String]) -> HearthResult<()> {
    // Not-found is a read-side notion; a missing parent dir is a plain I/O failure.
    let io_err = |e: std::io::Error| HearthError::file_io(path, &e);
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writer.write_all(line.as_bytes()).map_err(io_err)?;
        writer.write_all(LINE_SEPARATOR.as_bytes()).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

fn read_lines(path: &Path) -> HearthResult<Vec<String>> {
    let file = File::open(path).map_err(|e| HearthError::from_io(path, &e))?;
    BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| HearthError::from_io(path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn write_uses_platform_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_lines(&path, &lines(&["a", "b"])).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, format!("a{LINE_SEPARATOR}b{LINE_SEPARATOR}"));
    }

    #[test]
    fn write_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old contents that are longer\n").unwrap();
        write_lines(&path, &lines(&["new"])).unwrap();
        assert_eq!(read_lines(&path).unwrap(), ["new"]);
    }

    #[test]
    fn write_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.txt");
        match write_lines(&path, &lines(&["x"])) {
            Err(HearthError::FileIo { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn read_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin");
        std::fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();
        assert!(matches!(read_lines(&path), Err(HearthError::FileIo { .. })));
    }

    #[test]
    fn try_take_polls_until_done() {
        let registry = ShutdownRegistry::new();
        let io = TextIo::spawn(&registry).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut handle = io.submit_read(dir.path().join("missing"));
        let result = loop {
            if let Some(r) = handle.try_take() {
                break r;
            }
            std::thread::yield_now();
        };
        assert!(matches!(result, Err(HearthError::FileNotFound(_))));
        registry.shutdown_all();
    }

    #[test]
    fn shutdown_drains_queue_then_rejects() {
        let registry = ShutdownRegistry::new();
        let io = TextIo::spawn(&registry).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drained.txt");

        let pending = io.submit_write(lines(&["queued"]), &path);
        assert!(registry.shutdown_all().is_clean());
        assert!(!io.is_running());

        assert_eq!(pending.wait(), Ok(()));
        assert_eq!(read_lines(&path).unwrap(), ["queued"]);
        assert_eq!(io.submit_read(&path).wait(), Err(HearthError::WorkerStopped));
    }
}
