use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::core::Rect;
use crate::timeline::geometry::{ScrollGeometry, progress_changed};
use crate::timeline::scheduler::{Scheduler, TickId};
use crate::timeline::subscription::Subscription;

/// Geometry source for one tracked region.
///
/// Boxes are in one shared coordinate space (typically viewport coordinates).
pub trait ObservableRegion {
    /// Live box of the tracked region.
    fn bounding_box(&self) -> Rect;

    /// Box of the nearest ancestor with scrollable overflow, or of the viewport if there is none.
    fn scroll_port(&self) -> Rect;

    /// Call `listener` whenever the tracked region or its scroll port changes size.
    fn on_resize(&self, listener: Rc<dyn Fn()>) -> Subscription;
}

/// Per-timeline state while at least one subscriber is attached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineState {
    /// Last computed progress in `[0, 1]`.
    pub progress: f64,
    /// Geometry cached since the last invalidation.
    pub geometry: ScrollGeometry,
    /// Geometry must be re-measured on the next tick.
    pub dirty: bool,
}

type ProgressCallback = Rc<dyn Fn(f64)>;

struct Active {
    state: TimelineState,
    last_notified: f64,
    tick: TickId,
    _resize: Subscription,
}

struct TimelineInner {
    region: Rc<dyn ObservableRegion>,
    scheduler: Scheduler,
    subscribers: Vec<(u64, ProgressCallback)>,
    next_subscriber: u64,
    active: Option<Active>,
    dirty: Rc<Cell<bool>>,
}

/// Scroll-driven progress source for one observed region.
///
/// Idle until the first subscriber attaches; then registered with the [`Scheduler`], measuring
/// geometry when dirty and publishing progress on every tick that moves it by more than
/// [`crate::PROGRESS_EPSILON`]. Returns to idle when the last subscriber detaches.
pub struct Timeline {
    inner: Rc<RefCell<TimelineInner>>,
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Timeline")
            .field("subscribers", &inner.subscribers.len())
            .field("state", &inner.snapshot())
            .finish()
    }
}

impl Timeline {
    /// Create an idle timeline for `region`, driven by `scheduler`.
    pub fn new(region: Rc<dyn ObservableRegion>, scheduler: Scheduler) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TimelineInner {
                region,
                scheduler,
                subscribers: Vec::new(),
                next_subscriber: 0,
                active: None,
                dirty: Rc::new(Cell::new(false)),
            })),
        }
    }

    /// Attach a progress listener.
    ///
    /// `callback` is invoked once synchronously with the current progress, then from scheduler
    /// ticks whenever progress changes. The first subscriber activates the timeline.
    pub fn subscribe(&self, callback: impl Fn(f64) + 'static) -> Subscription {
        let callback: ProgressCallback = Rc::new(callback);
        let (id, needs_activation) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_subscriber;
            inner.next_subscriber += 1;
            inner.subscribers.push((id, callback.clone()));
            (id, inner.active.is_none())
        };
        if needs_activation {
            Self::activate(&self.inner);
        }

        let progress = self.progress();
        callback(progress);

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                Self::detach(&inner, id);
            }
        })
    }

    /// Active state; `None` while idle.
    pub fn state(&self) -> Option<TimelineState> {
        self.inner.borrow().snapshot()
    }

    /// Current progress, measuring on demand while idle.
    pub fn progress(&self) -> f64 {
        if let Some(state) = self.state() {
            return state.progress;
        }
        let region = self.inner.borrow().region.clone();
        let geometry = ScrollGeometry::measure(region.bounding_box(), region.scroll_port());
        geometry.progress_at(region.bounding_box().y0)
    }

    /// Return `true` while at least one subscriber is attached.
    pub fn is_active(&self) -> bool {
        self.inner.borrow().active.is_some()
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Mark geometry dirty; it is re-measured on the next tick.
    ///
    /// Has no effect while idle, since activation always measures.
    pub fn invalidate(&self) {
        let inner = self.inner.borrow();
        if inner.active.is_some() {
            inner.dirty.set(true);
        }
    }

    fn activate(this: &Rc<RefCell<TimelineInner>>) {
        let (region, scheduler, dirty) = {
            let inner = this.borrow();
            (inner.region.clone(), inner.scheduler.clone(), inner.dirty.clone())
        };

        // Resizes reported from here on are picked up by the first tick.
        dirty.set(false);
        let resize = region.on_resize(Rc::new(move || dirty.set(true)));

        let geometry = ScrollGeometry::measure(region.bounding_box(), region.scroll_port());
        let progress = geometry.progress_at(region.bounding_box().y0);

        let weak = Rc::downgrade(this);
        let tick = scheduler.add(move || {
            if let Some(inner) = weak.upgrade() {
                Self::tick(&inner);
            }
        });

        tracing::debug!(progress, "timeline active");
        this.borrow_mut().active = Some(Active {
            state: TimelineState {
                progress,
                geometry,
                dirty: false,
            },
            last_notified: progress,
            tick,
            _resize: resize,
        });
    }

    fn detach(this: &Rc<RefCell<TimelineInner>>, id: u64) {
        let released = {
            let mut inner = this.borrow_mut();
            inner.subscribers.retain(|(sid, _)| *sid != id);
            if inner.subscribers.is_empty() {
                let scheduler = inner.scheduler.clone();
                inner.active.take().map(|active| (scheduler, active))
            } else {
                None
            }
        };
        if let Some((scheduler, active)) = released {
            scheduler.remove(active.tick);
            tracing::debug!("timeline idle");
            // Resize subscription is released outside the borrow.
            drop(active);
        }
    }

    fn tick(this: &Rc<RefCell<TimelineInner>>) {
        let (region, dirty) = {
            let inner = this.borrow();
            if inner.active.is_none() {
                return;
            }
            (inner.region.clone(), inner.dirty.replace(false))
        };

        let measured =
            dirty.then(|| ScrollGeometry::measure(region.bounding_box(), region.scroll_port()));
        let live_top = region.bounding_box().y0;

        let notify = {
            let mut inner = this.borrow_mut();
            let subscribers = inner.subscribers.clone();
            let Some(active) = inner.active.as_mut() else {
                return;
            };
            if let Some(geometry) = measured {
                active.state.geometry = geometry;
            }
            let progress = active.state.geometry.progress_at(live_top);
            active.state.progress = progress;
            if progress_changed(active.last_notified, progress) {
                active.last_notified = progress;
                Some((progress, subscribers))
            } else {
                None
            }
        };

        if let Some((progress, subscribers)) = notify {
            for (_, callback) in subscribers {
                callback(progress);
            }
        }
    }
}

impl TimelineInner {
    fn snapshot(&self) -> Option<TimelineState> {
        self.active.as_ref().map(|a| TimelineState {
            dirty: self.dirty.get(),
            ..a.state
        })
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        let released = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.clear();
            let scheduler = inner.scheduler.clone();
            inner.active.take().map(|active| (scheduler, active))
        };
        if let Some((scheduler, active)) = released {
            scheduler.remove(active.tick);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/timeline.rs"]
mod tests;
