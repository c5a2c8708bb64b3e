//! Admission control for item extraction.
//!
//! [`PermitGate`] is a counting gate with strict FIFO hand-off: a released
//! permit goes straight to the oldest waiter, so a newly arriving task can
//! never overtake one that is already queued. [`Scheduler`] wraps the gate
//! with progress accounting and the per-task cool-down delay.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::trace;

// ---------------------------------------------------------------------------
// PermitGate
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct GateState {
    available: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

#[derive(Debug)]
struct GateInner {
    capacity: usize,
    state: Mutex<GateState>,
}

/// Counting gate with capacity K and FIFO waiters.
#[derive(Debug, Clone)]
pub struct PermitGate {
    inner: Arc<GateInner>,
}

impl PermitGate {
    /// A gate with `capacity` permits. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(GateInner {
                capacity,
                state: Mutex::new(GateState {
                    available: capacity,
                    waiters: VecDeque::new(),
                }),
            }),
        }
    }

    /// Take a permit, suspending until one is handed over if none remain.
    ///
    /// Returns immediately when a permit is free. Cancel-safe: dropping the
    /// future while queued gives back any permit that was already handed to it.
    pub async fn acquire(&self) -> Permit {
        loop {
            let rx = {
                let mut state = self.lock();
                if state.available > 0 {
                    state.available -= 1;
                    return Permit { gate: self.clone() };
                }
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                rx
            };

            let mut waiter = Waiter {
                gate: self,
                rx,
                granted: false,
            };
            if (&mut waiter.rx).await.is_ok() {
                waiter.granted = true;
                return Permit { gate: self.clone() };
            }
            // The sender was discarded without a hand-off; queue again.
        }
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.lock().available
    }

    /// Callers currently queued (including ones that gave up but have not
    /// yet been skipped by a release).
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Return one permit, handing it straight to the oldest live waiter.
    fn release(&self) {
        let mut state = self.lock();
        state.available += 1;
        while let Some(tx) = state.waiters.pop_front() {
            state.available -= 1;
            if tx.send(()).is_ok() {
                return;
            }
            // Waiter gave up before being served.
            state.available += 1;
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A queued `acquire` call. Dropping it before the hand-off is observed
/// returns the permit if one had already been sent.
struct Waiter<'a> {
    gate: &'a PermitGate,
    rx: oneshot::Receiver<()>,
    granted: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.granted {
            return;
        }
        self.rx.close();
        if self.rx.try_recv().is_ok() {
            self.gate.release();
        }
    }
}

/// One admission slot. Released on drop.
#[derive(Debug)]
pub struct Permit {
    gate: PermitGate,
}

impl Permit {
    /// Release explicitly; same as dropping.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

// ---------------------------------------------------------------------------
// Progress accounting
// ---------------------------------------------------------------------------

/// Running counts emitted after every finished item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    /// 0.0 ..= 100.0
    pub percent: f64,
    pub elapsed: Duration,
    /// `elapsed / processed * remaining`; `None` before the first item.
    pub eta: Option<Duration>,
}

/// Processed-item counter with throughput-based ETA.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    processed: AtomicUsize,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    /// Count one finished item and return the resulting snapshot.
    pub fn record(&self) -> ProgressSnapshot {
        let processed = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        snapshot(processed, self.total, self.started.elapsed())
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

fn snapshot(processed: usize, total: usize, elapsed: Duration) -> ProgressSnapshot {
    let percent = if total == 0 {
        100.0
    } else {
        processed as f64 * 100.0 / total as f64
    };
    let eta = (processed > 0).then(|| {
        let remaining = total.saturating_sub(processed);
        elapsed.mul_f64(remaining as f64 / processed as f64)
    });

    ProgressSnapshot {
        processed,
        total,
        percent,
        elapsed,
        eta,
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Gate + progress counter + inter-task delay.
#[derive(Debug, Clone)]
pub struct Scheduler {
    gate: PermitGate,
    tracker: Arc<ProgressTracker>,
    delay: Duration,
}

impl Scheduler {
    pub fn new(concurrency: usize, delay: Duration, total: usize) -> Self {
        Self {
            gate: PermitGate::new(concurrency),
            tracker: Arc::new(ProgressTracker::new(total)),
            delay,
        }
    }

    /// Run `work` under a permit.
    ///
    /// After `work` finishes, whatever its outcome, the processed counter is
    /// bumped and `report` sees the outcome with the new snapshot. The
    /// permit is then released and the task sleeps for the configured delay
    /// outside the gate.
    pub async fn run<T, Fut, R>(&self, work: Fut, report: R) -> T
    where
        Fut: Future<Output = T>,
        R: FnOnce(&T, ProgressSnapshot),
    {
        let permit = self.gate.acquire().await;
        trace!(available = self.gate.available(), "permit acquired");

        let outcome = work.await;
        let snapshot = self.tracker.record();
        report(&outcome, snapshot);

        permit.release();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        outcome
    }

    pub fn gate(&self) -> &PermitGate {
        &self.gate
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }
}
