use tokio::sync::mpsc;

/// Unit of work posted to a [`CallerContext`]
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Execution context that callbacks are posted back to
///
/// Implementations decide where a posted task runs, usually on one particular
/// thread owned by the application.
pub trait CallerContext: Clone + Send + Sync + 'static {
    /// Queue `task` for execution. Returns `false` if the context no longer
    /// accepts work, in which case `task` has been dropped unrun
    fn post(&self, task: Task) -> bool;
}

/// Create a connected [`LooperHandle`] / [`Looper`] pair
///
/// The [`Looper`] stays with the thread that should run the callbacks; handles are
/// cloned into whatever needs to post to it.
#[must_use]
pub fn looper() -> (LooperHandle, Looper) {
    let (tx, rx) = mpsc::unbounded_channel();

    (LooperHandle { tx }, Looper { rx })
}

/// Posting side of a [`Looper`]
#[derive(Debug, Clone)]
pub struct LooperHandle {
    tx: mpsc::UnboundedSender<Task>,
}

impl CallerContext for LooperHandle {
    fn post(&self, task: Task) -> bool {
        self.tx.send(task).is_ok()
    }
}

/// Queue of tasks drained by the thread that owns it
#[derive(Debug)]
pub struct Looper {
    rx: mpsc::UnboundedReceiver<Task>,
}

impl Looper {
    /// Wait for the next task and run it
    ///
    /// Returns `false` once every [`LooperHandle`] is gone and the queue is empty.
    pub async fn run_once(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Blocking version of [`Looper::run_once`] for threads outside of a Tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_run_once(&mut self) -> bool {
        match self.rx.blocking_recv() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run every task already queued without waiting for more
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;

        while let Ok(task) = self.rx.try_recv() {
            task();
            count += 1;
        }

        count
    }
}
