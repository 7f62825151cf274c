//! Time-based throttling for streamed message content.
//!
//! Token streams arrive much faster than a markdown tree can usefully be
//! re-rendered. [`Throttle`] limits how often the displayed value changes to
//! once per interval, and always converges to the latest input once the
//! stream settles.
//!
//! [`Throttle`] is a plain state machine driven by explicit timestamps so the
//! render loop can own it directly. [`ThrottledText`] runs one on a tokio task
//! for callers that want the deferred emission scheduled for them.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Default minimum spacing between two displayed updates.
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(100);

/// What happened to a value handed to [`Throttle::on_value_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleOutcome {
    /// The value is displayed now.
    Emitted,
    /// A deferred emission was scheduled for `deadline`.
    Scheduled { deadline: Instant },
    /// An emission is already pending and will pick this value up.
    Coalesced,
    /// The throttle was disposed; the value is dropped.
    Disposed,
}

/// Rate limiter for a single rendered value.
///
/// At most one deferred emission is pending at any time. A deferred emission
/// always publishes the latest value seen when it fires, never the value that
/// was current when it was scheduled.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    displayed: String,
    latest: String,
    last_emit: Instant,
    pending: Option<Instant>,
    emissions: usize,
    disposed: bool,
}

impl Throttle {
    /// Create a throttle whose first value is displayed immediately.
    pub fn new(initial: impl Into<String>, interval: Duration, now: Instant) -> Self {
        let initial = initial.into();
        Self {
            interval,
            displayed: initial.clone(),
            latest: initial,
            last_emit: now,
            pending: None,
            emissions: 1,
            disposed: false,
        }
    }

    /// Record a new input value.
    pub fn on_value_changed(&mut self, value: impl Into<String>, now: Instant) -> ThrottleOutcome {
        if self.disposed {
            return ThrottleOutcome::Disposed;
        }

        self.latest = value.into();
        let elapsed = now.saturating_duration_since(self.last_emit);

        if elapsed >= self.interval {
            if self.pending.take().is_some() {
                trace!(target: "threadview.throttle", "Dropping overdue pending emission");
            }
            self.emit(now);
            return ThrottleOutcome::Emitted;
        }

        if self.pending.is_some() {
            return ThrottleOutcome::Coalesced;
        }

        let deadline = now + (self.interval - elapsed);
        self.pending = Some(deadline);
        trace!(
            target: "threadview.throttle",
            delay_ms = (self.interval - elapsed).as_millis() as u64,
            "Scheduled deferred emission"
        );
        ThrottleOutcome::Scheduled { deadline }
    }

    /// Fire the pending emission if its deadline has passed.
    ///
    /// Returns the newly displayed value when an emission happened.
    pub fn poll(&mut self, now: Instant) -> Option<&str> {
        let deadline = self.pending?;
        if now < deadline {
            return None;
        }
        self.pending = None;
        self.emit(now);
        Some(&self.displayed)
    }

    /// Cancel any pending emission and stop accepting values.
    pub fn dispose(&mut self) {
        if self.pending.take().is_some() {
            debug!(target: "threadview.throttle", "Cancelled pending emission on dispose");
        }
        self.disposed = true;
    }

    fn emit(&mut self, now: Instant) {
        self.last_emit = now;
        if self.displayed != self.latest {
            self.displayed.clone_from(&self.latest);
        }
        self.emissions += 1;
    }

    /// The value currently shown.
    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    /// The most recent input value.
    pub fn latest(&self) -> &str {
        &self.latest
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of emissions so far, including the initial value.
    pub fn emissions(&self) -> usize {
        self.emissions
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// A [`Throttle`] driven by a tokio task.
///
/// Values pushed with [`ThrottledText::update`] are rate limited and the
/// displayed value is published on a watch channel. Dropping or disposing the
/// handle aborts the task, so nothing is emitted after disposal.
///
/// Must be created from within a tokio runtime.
#[derive(Debug)]
pub struct ThrottledText {
    input: mpsc::UnboundedSender<String>,
    output: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl ThrottledText {
    pub fn spawn(initial: impl Into<String>, interval: Duration) -> Self {
        let initial = initial.into();
        let (input, mut values) = mpsc::unbounded_channel::<String>();
        let (publisher, output) = watch::channel(initial.clone());

        let task = tokio::spawn(async move {
            let mut throttle = Throttle::new(initial, interval, clock_now());
            loop {
                let deadline = throttle.pending_deadline();
                tokio::select! {
                    value = values.recv() => {
                        let Some(value) = value else {
                            break;
                        };
                        if throttle.on_value_changed(value, clock_now()) == ThrottleOutcome::Emitted {
                            publisher.send_replace(throttle.displayed().to_string());
                        }
                    }
                    () = sleep_until_deadline(deadline) => {
                        if let Some(value) = throttle.poll(clock_now()) {
                            publisher.send_replace(value.to_string());
                        }
                    }
                }
            }
            throttle.dispose();
            debug!(
                target: "threadview.throttle",
                emissions = throttle.emissions(),
                "Throttle task finished"
            );
        });

        Self {
            input,
            output,
            task,
        }
    }

    /// Push the latest full value of the streamed text.
    pub fn update(&self, value: impl Into<String>) {
        if self.input.send(value.into()).is_err() {
            debug!(target: "threadview.throttle", "Update after throttle task stopped");
        }
    }

    /// The value currently displayed.
    pub fn current(&self) -> String {
        self.output.borrow().clone()
    }

    /// Subscribe to displayed-value changes.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.output.clone()
    }

    /// Cancel any pending emission and stop the driver task.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for ThrottledText {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}
