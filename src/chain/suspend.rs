//! Suspending task — bridges single-shot asynchronous work into the chain.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use async_trait::async_trait;

use super::{LaunchTask, NextSlot};
use crate::config::ChainConfig;

/// Single-use completion signal handed to a task's external work.
///
/// `signal()` consumes the value, so the exactly-once contract is enforced
/// by the type system. Dropping the signal without firing it stalls the
/// chain at the owning task — the pipeline's only abort mechanism.
pub struct Completion {
    tx: oneshot::Sender<()>,
}

impl Completion {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Signal that the external work is done, resuming the pipeline.
    ///
    /// May be called from any thread or execution context, including
    /// synchronously from inside the work closure itself.
    pub fn signal(self) {
        // Receiver is gone only if the owning task was dropped mid-run;
        // nothing left to resume then.
        let _ = self.tx.send(());
    }
}

pub(crate) type WorkFn = dyn Fn(Completion) + Send + Sync;

/// Invoke `work` with a fresh completion signal and wait for it to fire.
///
/// Returns `false` when the signal was dropped without firing; the caller
/// must not advance the chain in that case.
pub(crate) async fn run_work(work: &WorkFn, label: &str, stall_warn_after: Duration) -> bool {
    let (completion, mut fired) = Completion::channel();
    work(completion);

    // A zero warn interval would spin the timeout loop hot.
    let interval = stall_warn_after.max(Duration::from_millis(1));
    let mut waited = Duration::ZERO;
    loop {
        match tokio::time::timeout(interval, &mut fired).await {
            Ok(Ok(())) => return true,
            Ok(Err(_)) => {
                warn!(
                    task = label,
                    "completion signal dropped without firing; chain stalled"
                );
                return false;
            }
            Err(_) => {
                waited += interval;
                warn!(
                    task = label,
                    waited_secs = waited.as_secs(),
                    "launch task still suspended"
                );
            }
        }
    }
}

/// A launch task whose work completes asynchronously.
///
/// `handle()` invokes the work closure once, handing it a [`Completion`];
/// the successor is not started until that signal fires. The work may
/// complete synchronously (signalling before it returns) or later from any
/// other execution context.
pub struct SuspendingTask {
    next: NextSlot,
    label: String,
    work: Box<WorkFn>,
    stall_warn_after: Duration,
}

impl SuspendingTask {
    pub fn new(work: impl Fn(Completion) + Send + Sync + 'static) -> Arc<Self> {
        Self::with_config("suspending-task", ChainConfig::default(), work)
    }

    /// Like [`new`](Self::new), with a label used in log output.
    pub fn named(
        label: impl Into<String>,
        work: impl Fn(Completion) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::with_config(label, ChainConfig::default(), work)
    }

    pub fn with_config(
        label: impl Into<String>,
        config: ChainConfig,
        work: impl Fn(Completion) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            next: NextSlot::new(),
            label: label.into(),
            work: Box::new(work),
            stall_warn_after: config.stall_warn_after,
        })
    }
}

#[async_trait]
impl LaunchTask for SuspendingTask {
    fn next_slot(&self) -> &NextSlot {
        &self.next
    }

    async fn handle(self: Arc<Self>) {
        debug!(task = %self.label, "launch task suspending");
        if run_work(&self.work, &self.label, self.stall_warn_after).await {
            debug!(task = %self.label, "launch task completed");
            self.finish().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::sync::mpsc;

    use super::*;
    use crate::chain::InlineTask;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str) -> Arc<InlineTask> {
        let log = Arc::clone(log);
        InlineTask::new(move || log.lock().unwrap().push(name))
    }

    #[tokio::test]
    async fn synchronous_completion_advances_chain() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let task = {
            let log = Arc::clone(&log);
            SuspendingTask::new(move |done| {
                log.lock().unwrap().push("work");
                done.signal();
            })
        };
        task.then(recorder(&log, "next"));

        task.handle().await;

        assert_eq!(*log.lock().unwrap(), vec!["work", "next"]);
    }

    #[tokio::test]
    async fn successors_wait_for_each_completion_signal() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let (tx, mut pending) = mpsc::unbounded_channel::<Completion>();

        let suspended = |name: &'static str| {
            let log = Arc::clone(&log);
            let tx = tx.clone();
            SuspendingTask::named(name, move |done| {
                log.lock().unwrap().push(name);
                tx.send(done).unwrap();
            })
        };

        let a = suspended("a");
        let b = suspended("b");
        let c = suspended("c");
        a.then(b).then(c);

        let run = tokio::spawn(Arc::clone(&a).handle());

        let done_a = pending.recv().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
        done_a.signal();

        let done_b = pending.recv().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
        done_b.signal();

        let done_c = pending.recv().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        done_c.signal();

        run.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_signal_stalls_without_advancing() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let task = SuspendingTask::new(|done| drop(done));
        task.then(recorder(&log, "next"));

        task.handle().await;

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stall_warnings_do_not_disturb_completion() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("launch_flow=debug")
            .with_test_writer()
            .try_init();

        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let task = SuspendingTask::with_config(
            "slow-step",
            ChainConfig {
                stall_warn_after: Duration::from_millis(10),
            },
            |done| {
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(50));
                    done.signal();
                });
            },
        );
        task.then(recorder(&log, "next"));

        // Several warn intervals elapse while suspended; the chain still
        // advances exactly once when the signal finally fires.
        task.handle().await;

        assert_eq!(*log.lock().unwrap(), vec!["next"]);
    }

    #[tokio::test]
    async fn zero_warn_interval_still_completes() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let task = SuspendingTask::with_config(
            "zero-interval",
            ChainConfig {
                stall_warn_after: Duration::ZERO,
            },
            |done| {
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(20));
                    done.signal();
                });
            },
        );
        task.then(recorder(&log, "next"));

        task.handle().await;

        assert_eq!(*log.lock().unwrap(), vec!["next"]);
    }

    #[tokio::test]
    async fn signal_from_another_thread() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let task = SuspendingTask::new(|done| {
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                done.signal();
            });
        });
        task.then(recorder(&log, "next"));

        task.handle().await;

        assert_eq!(*log.lock().unwrap(), vec!["next"]);
    }
}
