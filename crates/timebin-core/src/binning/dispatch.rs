use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::consts::INFLIGHT_WINDOWS_PER_WORKER;
use crate::error::{Result, TimebinError};

/// Ordered parallel map over a fallible source.
///
/// Items are submitted to a dedicated rayon pool in source order and tagged
/// with their submission index. Results come back in completion order and are
/// parked in a reorder buffer until every earlier result has been delivered.
///
/// At most `cap` items are submitted but not yet delivered. Once any failure
/// has been seen no further items are submitted, and after a failure has been
/// delivered the iterator is exhausted.
pub struct OrderedDispatch<S, T, R, F> {
    source: S,
    op: Arc<F>,
    pool: ThreadPool,
    tx: Sender<(usize, Result<R>)>,
    rx: Receiver<(usize, Result<R>)>,
    reorder: BTreeMap<usize, Result<R>>,
    next_submit: usize,
    next_deliver: usize,
    cap: usize,
    source_done: bool,
    failed: bool,
    finished: bool,
    _item: std::marker::PhantomData<fn(T)>,
}

impl<S, T, R, F> OrderedDispatch<S, T, R, F>
where
    S: Iterator<Item = Result<T>>,
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Result<R> + Send + Sync + 'static,
{
    pub fn new(source: S, workers: usize, op: F) -> Result<Self> {
        if workers == 0 {
            return Err(TimebinError::InvalidWorkerCount);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("timebin-worker-{i}"))
            .build()
            .map_err(|e| {
                TimebinError::ThreadPool(format!(
                    "Failed to build pool with {workers} workers: {e}"
                ))
            })?;
        let (tx, rx) = mpsc::channel();
        debug!(workers, cap = workers * INFLIGHT_WINDOWS_PER_WORKER, "Started worker pool");

        Ok(Self {
            source,
            op: Arc::new(op),
            pool,
            tx,
            rx,
            reorder: BTreeMap::new(),
            next_submit: 0,
            next_deliver: 0,
            cap: workers * INFLIGHT_WINDOWS_PER_WORKER,
            source_done: false,
            failed: false,
            finished: false,
            _item: std::marker::PhantomData,
        })
    }

    /// Items submitted (or parked) but not yet delivered.
    pub fn outstanding(&self) -> usize {
        self.next_submit - self.next_deliver
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Submit items until the in-flight cap is reached or the source ends.
    fn fill(&mut self) {
        while !self.source_done && !self.failed && self.outstanding() < self.cap {
            let index = self.next_submit;
            match self.source.next() {
                Some(Ok(item)) => {
                    let op = Arc::clone(&self.op);
                    let tx = self.tx.clone();
                    self.pool.spawn(move || {
                        let result = panic::catch_unwind(AssertUnwindSafe(|| (*op)(item)))
                            .unwrap_or_else(|payload| {
                                Err(TimebinError::WorkerFailure {
                                    window: index,
                                    reason: panic_message(payload.as_ref()),
                                })
                            });
                        // The receiver is gone only if the consumer stopped early.
                        let _ = tx.send((index, result));
                    });
                    self.next_submit += 1;
                }
                Some(Err(e)) => {
                    self.reorder.insert(index, Err(e));
                    self.next_submit += 1;
                    self.source_done = true;
                    self.failed = true;
                }
                None => self.source_done = true,
            }
        }
    }
}

impl<S, T, R, F> Iterator for OrderedDispatch<S, T, R, F>
where
    S: Iterator<Item = Result<T>>,
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Result<R> + Send + Sync + 'static,
{
    type Item = Result<R>;

    fn next(&mut self) -> Option<Result<R>> {
        if self.finished {
            return None;
        }
        self.fill();
        loop {
            if let Some(result) = self.reorder.remove(&self.next_deliver) {
                self.next_deliver += 1;
                if result.is_err() {
                    self.finished = true;
                    self.reorder.clear();
                }
                return Some(result);
            }
            if self.outstanding() == 0 {
                self.finished = true;
                return None;
            }
            match self.rx.recv() {
                Ok((index, result)) => {
                    if result.is_err() && !self.failed {
                        warn!(window = index, "Reduction failed; no further windows will be submitted");
                        self.failed = true;
                    }
                    self.reorder.insert(index, result);
                    self.fill();
                }
                Err(_) => {
                    self.finished = true;
                    return Some(Err(TimebinError::WorkerFailure {
                        window: self.next_deliver,
                        reason: "worker pool disconnected".into(),
                    }));
                }
            }
        }
    }
}

impl<S, T, R, F> std::iter::FusedIterator for OrderedDispatch<S, T, R, F>
where
    S: Iterator<Item = Result<T>>,
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Result<R> + Send + Sync + 'static,
{
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".into()
    }
}
