//! Cooperative, timer-driven multiplexer of resumable logic entries.
//!
//! A [`Scheduler`] owns an ordered list of entries, each a [`Logic`]
//! computation plus the time it still wants to sleep. Every call to
//! [`Scheduler::tick`] advances all sleep counters by the elapsed time and
//! resumes each entry whose counter dropped below zero, exactly once.
//!
//! Entries are added through a [`Registrar`], a cheap cloneable handle that
//! may be used from inside a running entry or from another thread. New
//! entries wait in a buffer that is drained at the start of the next tick.
//!
//! A failing entry (an `Err` result or a panic) is dropped on its own; the
//! rest of the tick proceeds.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{error, warn};

/// What a logic entry wants after being resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Resume again once this many milliseconds have passed.
    Sleep(u64),
    /// The computation is finished; drop the entry.
    Done,
}

impl Step {
    /// Resume on the next tick that advances the clock.
    pub const NEXT_TICK: Self = Self::Sleep(0);
}

/// Error returned by a logic entry that cannot continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicError {
    /// The entry hit a condition it cannot recover from.
    #[error("logic entry failed: {0}")]
    Failed(String),
}

impl LogicError {
    /// Build a [`LogicError::Failed`] from any message.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// A resumable computation driven by a [`Scheduler`] over context `C`.
///
/// Implementations are small state machines: each call to
/// [`resume`](Logic::resume) advances one phase and reports how long to
/// sleep before the next one.
pub trait Logic<C>: Send {
    /// Advance the computation by one step.
    fn resume(&mut self, ctx: &mut C) -> Result<Step, LogicError>;

    /// Short name used in log messages.
    fn label(&self) -> &'static str {
        "logic"
    }
}

/// A [`Logic`] backed by a closure. Built with [`from_fn`].
pub struct FnLogic<F> {
    f: F,
    label: &'static str,
}

/// Wrap a closure as a logic entry.
pub const fn from_fn<C, F>(label: &'static str, f: F) -> FnLogic<F>
where
    F: FnMut(&mut C) -> Result<Step, LogicError> + Send,
{
    FnLogic { f, label }
}

impl<C, F> Logic<C> for FnLogic<F>
where
    F: FnMut(&mut C) -> Result<Step, LogicError> + Send,
{
    fn resume(&mut self, ctx: &mut C) -> Result<Step, LogicError> {
        (self.f)(ctx)
    }

    fn label(&self) -> &'static str {
        self.label
    }
}

type Pending<C> = Vec<Box<dyn Logic<C>>>;

/// Thread-safe handle for adding entries to a [`Scheduler`].
pub struct Registrar<C> {
    pending: Arc<Mutex<Pending<C>>>,
}

impl<C> Clone for Registrar<C> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<C> core::fmt::Debug for Registrar<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registrar")
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl<C> Registrar<C> {
    fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Pending<C>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a logic entry. It starts on the scheduler's next tick.
    pub fn register<L>(&self, logic: L)
    where
        L: Logic<C> + 'static,
    {
        self.register_boxed(Box::new(logic));
    }

    /// Queue an already boxed logic entry.
    pub fn register_boxed(&self, logic: Box<dyn Logic<C>>) {
        self.lock().push(logic);
    }

    /// Number of entries waiting for the next tick.
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    fn take_all(&self) -> Pending<C> {
        core::mem::take(&mut *self.lock())
    }
}

struct Entry<C> {
    logic: Box<dyn Logic<C>>,
    sleep_ms: i64,
}

/// Counters describing one [`Scheduler::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entries resumed during the tick.
    pub resumed: usize,
    /// Entries that finished normally.
    pub finished: usize,
    /// Entries dropped because they failed or panicked.
    pub failed: usize,
    /// Entries still active after the tick.
    pub active: usize,
}

/// Single-threaded cooperative scheduler over context `C`.
pub struct Scheduler<C> {
    entries: Vec<Entry<C>>,
    registrar: Registrar<C>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> core::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("active", &self.entries.len())
            .field("pending", &self.registrar.pending_len())
            .finish()
    }
}

impl<C> Scheduler<C> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            registrar: Registrar::new(),
        }
    }

    /// A handle for registering entries from anywhere.
    pub fn registrar(&self) -> Registrar<C> {
        self.registrar.clone()
    }

    /// Queue a logic entry. Shorthand for `self.registrar().register(..)`.
    pub fn register<L>(&self, logic: L)
    where
        L: Logic<C> + 'static,
    {
        self.registrar.register(logic);
    }

    /// Number of active entries (excluding ones still pending).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are active or pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.registrar.pending_len() == 0
    }

    /// Advance the clock by `elapsed_ms` and resume every due entry once.
    ///
    /// Pending registrations join first with no sleep, so with a non-zero
    /// `elapsed_ms` they run during this very tick. An entry is due when
    /// its remaining sleep becomes strictly negative.
    pub fn tick(&mut self, ctx: &mut C, elapsed_ms: u64) -> TickReport {
        self.entries.extend(
            self.registrar
                .take_all()
                .into_iter()
                .map(|logic| Entry { logic, sleep_ms: 0 }),
        );

        let elapsed = i64::try_from(elapsed_ms).unwrap_or(i64::MAX);
        let mut report = TickReport::default();

        self.entries.retain_mut(|entry| {
            entry.sleep_ms = entry.sleep_ms.saturating_sub(elapsed);
            if entry.sleep_ms >= 0 {
                return true;
            }

            report.resumed = report.resumed.saturating_add(1);
            let label = entry.logic.label();
            match catch_unwind(AssertUnwindSafe(|| entry.logic.resume(ctx))) {
                Ok(Ok(Step::Sleep(ms))) => {
                    entry.sleep_ms = i64::try_from(ms).unwrap_or(i64::MAX);
                    true
                }
                Ok(Ok(Step::Done)) => {
                    report.finished = report.finished.saturating_add(1);
                    false
                }
                Ok(Err(err)) => {
                    warn!(entry = label, %err, "Logic entry failed, dropping it");
                    report.failed = report.failed.saturating_add(1);
                    false
                }
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_owned())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_default();
                    error!(entry = label, panic = %message, "Logic entry panicked, dropping it");
                    report.failed = report.failed.saturating_add(1);
                    false
                }
            }
        });

        report.active = self.entries.len();
        report
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Records which entries ran, in order.
    #[derive(Default)]
    struct Trace(Vec<&'static str>);

    fn sleeper(name: &'static str, sleep_ms: u64, runs: usize) -> impl Logic<Trace> {
        let mut left = runs;
        from_fn(name, move |trace: &mut Trace| {
            trace.0.push(name);
            left = left.saturating_sub(1);
            Ok(if left == 0 { Step::Done } else { Step::Sleep(sleep_ms) })
        })
    }

    #[test]
    fn pending_entries_run_on_the_first_tick() {
        let mut scheduler = Scheduler::new();
        let mut trace = Trace::default();
        scheduler.register(sleeper("a", 0, 1));

        assert_eq!(scheduler.len(), 0);
        assert!(!scheduler.is_empty());

        let report = scheduler.tick(&mut trace, 16);
        assert_eq!(trace.0, vec!["a"]);
        assert_eq!(report.resumed, 1);
        assert_eq!(report.finished, 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn zero_elapsed_does_not_resume() {
        let mut scheduler = Scheduler::new();
        let mut trace = Trace::default();
        scheduler.register(sleeper("a", 0, 1));

        scheduler.tick(&mut trace, 0);
        assert!(trace.0.is_empty());
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn due_check_is_strictly_negative() {
        let mut scheduler = Scheduler::new();
        let mut trace = Trace::default();
        scheduler.register(sleeper("a", 100, 2));

        scheduler.tick(&mut trace, 1);
        assert_eq!(trace.0.len(), 1);

        // Exactly 100 ms elapsed leaves the counter at zero: not yet due.
        scheduler.tick(&mut trace, 60);
        scheduler.tick(&mut trace, 40);
        assert_eq!(trace.0.len(), 1);

        scheduler.tick(&mut trace, 1);
        assert_eq!(trace.0.len(), 2);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn entries_resume_in_registration_order() {
        let mut scheduler = Scheduler::new();
        let mut trace = Trace::default();
        scheduler.register(sleeper("a", 0, 2));
        scheduler.register(sleeper("b", 0, 2));

        scheduler.tick(&mut trace, 16);
        scheduler.tick(&mut trace, 16);
        assert_eq!(trace.0, vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn entries_registered_while_running_start_next_tick() {
        let mut scheduler: Scheduler<Trace> = Scheduler::new();
        let registrar = scheduler.registrar();
        let mut spawned = false;
        scheduler.register(from_fn("parent", move |trace: &mut Trace| {
            trace.0.push("parent");
            if !spawned {
                spawned = true;
                registrar.register(sleeper("child", 0, 1));
            }
            Ok(Step::NEXT_TICK)
        }));

        let mut trace = Trace::default();
        scheduler.tick(&mut trace, 16);
        assert_eq!(trace.0, vec!["parent"]);

        scheduler.tick(&mut trace, 16);
        assert_eq!(trace.0, vec!["parent", "parent", "child"]);
    }

    #[test]
    fn failing_entry_is_dropped_alone() {
        let mut scheduler = Scheduler::new();
        let mut trace = Trace::default();
        scheduler.register(from_fn("broken", |_: &mut Trace| {
            Err(LogicError::failed("boom"))
        }));
        scheduler.register(sleeper("healthy", 0, 3));

        let report = scheduler.tick(&mut trace, 16);
        assert_eq!(report.failed, 1);
        assert_eq!(report.active, 1);

        scheduler.tick(&mut trace, 16);
        assert_eq!(trace.0, vec!["healthy", "healthy"]);
    }

    #[test]
    fn panicking_entry_is_dropped_alone() {
        let mut scheduler = Scheduler::new();
        let mut trace = Trace::default();
        scheduler.register(sleeper("before", 0, 2));
        scheduler.register(from_fn("panics", |_: &mut Trace| -> Result<Step, LogicError> {
            panic!("entry exploded")
        }));
        scheduler.register(sleeper("after", 0, 2));

        let report = scheduler.tick(&mut trace, 16);
        assert_eq!(report.failed, 1);
        assert_eq!(report.active, 2);
        assert_eq!(trace.0, vec!["before", "after"]);

        scheduler.tick(&mut trace, 16);
        assert_eq!(trace.0, vec!["before", "after", "before", "after"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn registrar_is_usable_from_another_thread() {
        let mut scheduler = Scheduler::new();
        let registrar = scheduler.registrar();
        std::thread::spawn(move || registrar.register(sleeper("remote", 0, 1)))
            .join()
            .unwrap();

        let mut trace = Trace::default();
        scheduler.tick(&mut trace, 16);
        assert_eq!(trace.0, vec!["remote"]);
    }
}
