use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

/// Host paint-cadence primitive (for example a display-refresh callback).
///
/// The scheduler calls [`FrameHost::start`] when its first callback registers and
/// [`FrameHost::stop`] when the last one leaves. While started, the host is expected to call
/// [`Scheduler::tick`] once per paint.
pub trait FrameHost {
    /// Begin delivering ticks.
    fn start(&self);
    /// Stop delivering ticks.
    fn stop(&self);
}

/// [`FrameHost`] for hosts that drive ticks themselves (tests, offline rendering).
///
/// Records whether ticks are currently wanted and how often the scheduler toggled it.
#[derive(Debug, Default)]
pub struct ManualFrameHost {
    running: Cell<bool>,
    starts: Cell<u32>,
    stops: Cell<u32>,
}

impl ManualFrameHost {
    /// Create a stopped host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` while the scheduler wants ticks.
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Number of `start` calls received.
    pub fn starts(&self) -> u32 {
        self.starts.get()
    }

    /// Number of `stop` calls received.
    pub fn stops(&self) -> u32 {
        self.stops.get()
    }
}

impl FrameHost for ManualFrameHost {
    fn start(&self) {
        self.running.set(true);
        self.starts.set(self.starts.get() + 1);
    }

    fn stop(&self) {
        self.running.set(false);
        self.stops.set(self.stops.get() + 1);
    }
}

/// Identifier of a registered tick callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickId(u64);

type TickCallback = Rc<dyn Fn()>;

/// Counters exposed for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Ticks delivered while at least one callback was registered.
    pub ticks: u64,
    /// Callbacks that panicked and were isolated.
    pub failed_callbacks: u64,
}

struct SchedulerInner {
    host: Rc<dyn FrameHost>,
    callbacks: Vec<(TickId, TickCallback)>,
    next_id: u64,
    registered: bool,
    stats: SchedulerStats,
}

/// Animation-frame multiplexer shared by every timeline of one host.
///
/// Construct one per host and clone the handle into each [`crate::Timeline`]. Callbacks run in
/// registration order, once per [`Scheduler::tick`]. A panicking callback is caught and logged;
/// the remaining callbacks of the tick still run.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("callbacks", &inner.callbacks.len())
            .field("registered", &inner.registered)
            .field("stats", &inner.stats)
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler bound to `host`. No ticks are requested until a callback registers.
    pub fn new(host: Rc<dyn FrameHost>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                host,
                callbacks: Vec::new(),
                next_id: 0,
                registered: false,
                stats: SchedulerStats::default(),
            })),
        }
    }

    /// Register a per-tick callback.
    pub fn add(&self, callback: impl Fn() + 'static) -> TickId {
        let (id, start) = {
            let mut inner = self.inner.borrow_mut();
            let id = TickId(inner.next_id);
            inner.next_id += 1;
            inner.callbacks.push((id, Rc::new(callback)));
            let start = !inner.registered;
            inner.registered = true;
            (id, start.then(|| inner.host.clone()))
        };
        if let Some(host) = start {
            tracing::trace!("scheduler registering with host");
            host.start();
        }
        id
    }

    /// Deregister a callback. Returns `false` if it was not registered.
    pub fn remove(&self, id: TickId) -> bool {
        let (removed, stop) = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.callbacks.len();
            inner.callbacks.retain(|(cid, _)| *cid != id);
            let removed = inner.callbacks.len() != before;
            let stop = removed && inner.callbacks.is_empty() && inner.registered;
            if stop {
                inner.registered = false;
            }
            (removed, stop.then(|| inner.host.clone()))
        };
        if let Some(host) = stop {
            tracing::trace!("scheduler deregistering from host");
            host.stop();
        }
        removed
    }

    /// Run every registered callback once.
    ///
    /// Returns the number of callbacks invoked. Callbacks registered during the tick run from the
    /// next tick on; callbacks removed during the tick are skipped.
    pub fn tick(&self) -> usize {
        let snapshot: Vec<(TickId, TickCallback)> = {
            let inner = self.inner.borrow();
            if inner.callbacks.is_empty() {
                return 0;
            }
            inner.callbacks.clone()
        };

        let mut ran = 0;
        for (id, callback) in snapshot {
            if !self.contains(id) {
                continue;
            }
            ran += 1;
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback())) {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                tracing::error!(tick = id.0, panic = msg.as_str(), "tick callback panicked");
                self.inner.borrow_mut().stats.failed_callbacks += 1;
            }
        }
        self.inner.borrow_mut().stats.ticks += 1;
        ran
    }

    /// Return `true` when `id` is registered.
    pub fn contains(&self, id: TickId) -> bool {
        self.inner.borrow().callbacks.iter().any(|(cid, _)| *cid == id)
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    /// Return `true` when no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return `true` while registered with the host.
    pub fn is_registered(&self) -> bool {
        self.inner.borrow().registered
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> SchedulerStats {
        self.inner.borrow().stats
    }

    /// Drop every callback and stop the host.
    pub fn shutdown(&self) {
        let stop = {
            let mut inner = self.inner.borrow_mut();
            inner.callbacks.clear();
            let was = inner.registered;
            inner.registered = false;
            was.then(|| inner.host.clone())
        };
        if let Some(host) = stop {
            host.stop();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scheduler.rs"]
mod tests;
