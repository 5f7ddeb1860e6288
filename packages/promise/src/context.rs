//! Execution contexts.
//!
//! An [`ExecutionContext`] accepts a unit of work and runs it later, on some
//! thread of its own choosing. Promises never run callbacks on the thread that
//! settles or observes them; they always hand the callback to a context.
//!
//! Two contexts cover the common cases:
//!
//! - [`DefaultContext`] dispatches onto a shared, lazily started
//!   [`ThreadPool`]. Every combinator without an explicit context uses it.
//! - [`SerialQueue`] owns a single named thread and runs work strictly in
//!   submission order. Use it for callbacks that must never overlap, such as
//!   UI updates.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::{trace, warn};

/// A unit of work submitted to an [`ExecutionContext`].
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to an execution context.
pub type Context = Arc<dyn ExecutionContext>;

/// Schedules work to run asynchronously.
///
/// `execute` is fire-and-forget: it never reports back when the work ran.
/// Implementations must not run `work` on the calling thread before
/// returning, since promises dispatch callbacks while holding their
/// internal lock.
pub trait ExecutionContext: Send + Sync {
    fn execute(&self, work: Work);
}

impl<C: ExecutionContext + ?Sized> ExecutionContext for Arc<C> {
    fn execute(&self, work: Work) {
        (**self).execute(work)
    }
}

lazy_static::lazy_static! {
    static ref DEFAULT_POOL: Option<ThreadPool> = {
        let threads = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        match ThreadPool::new("seeclickfix-worker", threads) {
            Ok(pool) => Some(pool),
            Err(error) => {
                warn!(%error, "failed to start default worker pool");
                None
            }
        }
    };

    static ref DEFAULT_CONTEXT: Context = Arc::new(DefaultContext);
}

/// Returns the shared handle to [`DefaultContext`].
pub fn default_context() -> Context {
    Arc::clone(&DEFAULT_CONTEXT)
}

/// Runs work on the process-wide background worker pool.
///
/// The pool is started on first use with one worker per available CPU. If
/// the pool cannot be started, each unit of work gets its own thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContext;

impl ExecutionContext for DefaultContext {
    fn execute(&self, work: Work) {
        match DEFAULT_POOL.as_ref() {
            Some(pool) => pool.execute(work),
            None => {
                let spawned = thread::Builder::new()
                    .name("seeclickfix-fallback".to_string())
                    .spawn(move || run_guarded("seeclickfix-fallback", work));
                if let Err(error) = spawned {
                    warn!(%error, "dropping work: could not spawn fallback thread");
                }
            }
        }
    }
}

/// A fixed-size pool of worker threads sharing one queue.
///
/// Workers exit once the pool is dropped and the queue drains.
pub struct ThreadPool {
    name: String,
    threads: usize,
    sender: Sender<Work>,
}

impl ThreadPool {
    /// Start a pool with `threads` workers (at least one), named `{name}-{i}`.
    pub fn new(name: impl Into<String>, threads: usize) -> io::Result<Self> {
        let name = name.into();
        let threads = threads.max(1);
        let (sender, receiver) = mpsc::channel::<Work>();
        let receiver = Arc::new(Mutex::new(receiver));

        for index in 0..threads {
            let receiver = Arc::clone(&receiver);
            let worker = format!("{}-{}", name, index);
            thread::Builder::new()
                .name(worker.clone())
                .spawn(move || worker_loop(&worker, &receiver))?;
        }

        Ok(Self {
            name,
            threads,
            sender,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl ExecutionContext for ThreadPool {
    fn execute(&self, work: Work) {
        if self.sender.send(work).is_err() {
            warn!(pool = %self.name, "dropping work: worker pool has shut down");
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("name", &self.name)
            .field("threads", &self.threads)
            .finish()
    }
}

fn worker_loop(worker: &str, receiver: &Mutex<Receiver<Work>>) {
    loop {
        // Hold the queue lock only while waiting for the next item.
        let next = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        match next {
            Ok(work) => run_guarded(worker, work),
            Err(_) => break,
        }
    }
    trace!(worker, "worker exiting");
}

/// A single thread that runs work one item at a time, in submission order.
///
/// Cloning a queue yields another handle to the same thread. The thread
/// exits once every handle is dropped and the queue drains.
#[derive(Clone)]
pub struct SerialQueue {
    label: Arc<str>,
    sender: Sender<Work>,
}

impl SerialQueue {
    /// Start a queue whose thread is named `label`.
    pub fn new(label: impl Into<String>) -> io::Result<Self> {
        let label: Arc<str> = Arc::from(label.into());
        let (sender, receiver) = mpsc::channel::<Work>();

        let thread_label = Arc::clone(&label);
        thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                for work in receiver {
                    run_guarded(&thread_label, work);
                }
                trace!(queue = %thread_label, "serial queue exiting");
            })?;

        Ok(Self { label, sender })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True when called from this queue's thread.
    pub fn is_current(&self) -> bool {
        thread::current().name() == Some(&*self.label)
    }
}

impl ExecutionContext for SerialQueue {
    fn execute(&self, work: Work) {
        if self.sender.send(work).is_err() {
            warn!(queue = %self.label, "dropping work: serial queue has shut down");
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("label", &self.label)
            .finish()
    }
}

#[cfg(feature = "tokio")]
impl ExecutionContext for tokio::runtime::Handle {
    fn execute(&self, work: Work) {
        drop(self.spawn_blocking(work));
    }
}

/// Run `work`, keeping a panicking callback from taking its thread down.
fn run_guarded(thread: &str, work: Work) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
        warn!(
            thread,
            panic = %panic_message(payload.as_ref()),
            "callback panicked"
        );
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
