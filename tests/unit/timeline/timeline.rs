use std::cell::Cell;

use super::*;
use crate::timeline::scheduler::ManualFrameHost;

/// In-memory region: a tracked box scrolling inside a fixed viewport.
struct FakeRegion {
    region: Cell<Rect>,
    port: Cell<Rect>,
    listeners: Rc<RefCell<Vec<(u64, Rc<dyn Fn()>)>>>,
    next: Cell<u64>,
    box_reads: Cell<u32>,
    resize_on_port_read: Cell<Option<f64>>,
}

impl FakeRegion {
    fn new(tracked_height: f64, viewport_height: f64) -> Rc<Self> {
        Rc::new(Self {
            region: Cell::new(Rect::new(0.0, 0.0, 100.0, tracked_height)),
            port: Cell::new(Rect::new(0.0, 0.0, 100.0, viewport_height)),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next: Cell::new(0),
            box_reads: Cell::new(0),
            resize_on_port_read: Cell::new(None),
        })
    }

    /// Scroll so the region's top sits at `top` in viewport coordinates.
    fn scroll_to(&self, top: f64) {
        let r = self.region.get();
        self.region.set(Rect::new(r.x0, top, r.x1, top + r.height()));
    }

    fn resize_region(&self, height: f64) {
        let r = self.region.get();
        self.region.set(Rect::new(r.x0, r.y0, r.x1, r.y0 + height));
        let listeners: Vec<_> = self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        for l in listeners {
            l();
        }
    }

    fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl ObservableRegion for FakeRegion {
    fn bounding_box(&self) -> Rect {
        self.box_reads.set(self.box_reads.get() + 1);
        self.region.get()
    }

    fn scroll_port(&self) -> Rect {
        if let Some(height) = self.resize_on_port_read.take() {
            self.resize_region(height);
        }
        self.port.get()
    }

    fn on_resize(&self, listener: Rc<dyn Fn()>) -> Subscription {
        let id = self.next.get();
        self.next.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        let listeners = self.listeners.clone();
        Subscription::new(move || listeners.borrow_mut().retain(|(lid, _)| *lid != id))
    }
}

fn setup(tracked: f64, viewport: f64) -> (Rc<ManualFrameHost>, Scheduler, Rc<FakeRegion>, Timeline) {
    let host = Rc::new(ManualFrameHost::new());
    let scheduler = Scheduler::new(host.clone());
    let region = FakeRegion::new(tracked, viewport);
    let timeline = Timeline::new(region.clone(), scheduler.clone());
    (host, scheduler, region, timeline)
}

fn recorder() -> (Rc<RefCell<Vec<f64>>>, impl Fn(f64) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    (seen, move |p| s.borrow_mut().push(p))
}

#[test]
fn subscribe_delivers_current_progress_synchronously() {
    let (host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    region.scroll_to(-500.0);
    assert!(!timeline.is_active());

    let (seen, cb) = recorder();
    let sub = timeline.subscribe(cb);
    assert_eq!(*seen.borrow(), vec![0.25]);
    assert!(timeline.is_active());
    assert!(host.is_running());
    assert_eq!(scheduler.len(), 1);

    sub.unsubscribe();
}

#[test]
fn tick_notifies_in_registration_order_when_progress_moves() {
    let (_host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    let log = Rc::new(RefCell::new(Vec::new()));
    let l1 = log.clone();
    let _a = timeline.subscribe(move |p| l1.borrow_mut().push(("a", p)));
    let l2 = log.clone();
    let _b = timeline.subscribe(move |p| l2.borrow_mut().push(("b", p)));
    log.borrow_mut().clear();

    region.scroll_to(-1000.0);
    scheduler.tick();
    assert_eq!(*log.borrow(), vec![("a", 0.5), ("b", 0.5)]);
    assert_eq!(scheduler.len(), 1);
}

#[test]
fn sub_threshold_jitter_is_not_notified() {
    let (_host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    let (seen, cb) = recorder();
    let _sub = timeline.subscribe(cb);

    region.scroll_to(-0.1); // 0.00005 progress
    scheduler.tick();
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(timeline.state().unwrap().progress, 0.00005);

    region.scroll_to(-10.0);
    scheduler.tick();
    assert_eq!(*seen.borrow(), vec![0.0, 0.005]);
}

#[test]
fn region_not_taller_than_viewport_is_always_complete() {
    let (_host, scheduler, region, timeline) = setup(800.0, 1000.0);
    let (seen, cb) = recorder();
    let _sub = timeline.subscribe(cb);
    for top in [0.0, -300.0, 250.0, -5000.0] {
        region.scroll_to(top);
        scheduler.tick();
        assert_eq!(timeline.state().unwrap().progress, 1.0);
    }
    assert_eq!(*seen.borrow(), vec![1.0]);

    let (_host, scheduler, region, timeline) = setup(1000.0, 1000.0);
    let (seen, cb) = recorder();
    let _sub = timeline.subscribe(cb);
    region.scroll_to(-400.0);
    scheduler.tick();
    assert_eq!(*seen.borrow(), vec![1.0]);
}

#[test]
fn geometry_is_cached_until_resize() {
    let (_host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    let (seen, cb) = recorder();
    let _sub = timeline.subscribe(cb);

    // Grow the box without a resize notification: cached distance (2000) still applies.
    let r = region.region.get();
    region.region.set(Rect::new(r.x0, -1000.0, r.x1, 4000.0));
    scheduler.tick();
    assert_eq!(seen.borrow().last().copied(), Some(0.5));
    assert_eq!(timeline.state().unwrap().geometry.tracked_height, 3000.0);

    // Resize notification marks dirty; next tick re-measures (distance 4000).
    region.resize_region(5000.0);
    assert!(timeline.state().unwrap().dirty);
    scheduler.tick();
    let state = timeline.state().unwrap();
    assert!(!state.dirty);
    assert_eq!(state.geometry.tracked_height, 5000.0);
    assert_eq!(state.progress, 0.25);
    assert_eq!(seen.borrow().last().copied(), Some(0.25));
}

#[test]
fn resize_during_activation_is_measured_on_first_tick() {
    let (_host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    region.scroll_to(-1000.0);
    // Layout changes while the activation measurement is in progress.
    region.resize_on_port_read.set(Some(5000.0));

    let (seen, cb) = recorder();
    let _sub = timeline.subscribe(cb);
    let state = timeline.state().unwrap();
    assert_eq!(state.geometry.tracked_height, 3000.0);
    assert!(state.dirty);
    assert_eq!(*seen.borrow(), vec![0.5]);

    scheduler.tick();
    let state = timeline.state().unwrap();
    assert!(!state.dirty);
    assert_eq!(state.geometry.tracked_height, 5000.0);
    assert_eq!(seen.borrow().last().copied(), Some(0.25));
}

#[test]
fn invalidate_marks_dirty() {
    let (_host, _scheduler, _region, timeline) = setup(3000.0, 1000.0);
    timeline.invalidate(); // idle: no state to mark
    let (_seen, cb) = recorder();
    let _sub = timeline.subscribe(cb);
    assert!(!timeline.state().unwrap().dirty);
    timeline.invalidate();
    assert!(timeline.state().unwrap().dirty);
}

#[test]
fn last_unsubscribe_returns_to_idle_and_deregisters() {
    let (host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    let (_s1, cb1) = recorder();
    let (_s2, cb2) = recorder();
    let a = timeline.subscribe(cb1);
    let b = timeline.subscribe(cb2);
    assert_eq!(region.listener_count(), 1);
    assert_eq!(timeline.subscriber_count(), 2);

    a.unsubscribe();
    assert!(timeline.is_active());
    assert!(host.is_running());

    b.unsubscribe();
    assert!(!timeline.is_active());
    assert!(timeline.state().is_none());
    assert!(scheduler.is_empty());
    assert!(!host.is_running());
    assert_eq!(region.listener_count(), 0);
}

#[test]
fn resubscribe_after_idle_starts_fresh() {
    let (host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    let (_s, cb) = recorder();
    timeline.subscribe(cb).unsubscribe();

    region.scroll_to(-2000.0);
    let (seen, cb) = recorder();
    let _sub = timeline.subscribe(cb);
    assert_eq!(*seen.borrow(), vec![1.0]);
    assert_eq!(host.starts(), 2);
    assert_eq!(scheduler.len(), 1);
}

#[test]
fn late_subscriber_gets_latest_value() {
    let (_host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    let (_s, cb) = recorder();
    let _first = timeline.subscribe(cb);
    region.scroll_to(-1500.0);
    scheduler.tick();

    let (seen, cb) = recorder();
    let _late = timeline.subscribe(cb);
    assert_eq!(*seen.borrow(), vec![0.75]);
}

#[test]
fn unsubscribe_during_notification_is_safe() {
    let (_host, scheduler, region, timeline) = setup(3000.0, 1000.0);
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let s = slot.clone();
    let sub = timeline.subscribe(move |p| {
        if p > 0.4 {
            s.borrow_mut().take();
        }
    });
    *slot.borrow_mut() = Some(sub);

    region.scroll_to(-1000.0);
    scheduler.tick();
    assert!(!timeline.is_active());
    assert!(scheduler.is_empty());
}

#[test]
fn dropping_timeline_deregisters_from_scheduler() {
    let (host, scheduler, _region, timeline) = setup(3000.0, 1000.0);
    let (_s, cb) = recorder();
    let sub = timeline.subscribe(cb);
    drop(timeline);
    assert!(scheduler.is_empty());
    assert!(!host.is_running());
    sub.unsubscribe();
}

#[test]
fn idle_progress_is_measured_on_demand() {
    let (_host, _scheduler, region, timeline) = setup(3000.0, 1000.0);
    region.scroll_to(-200.0);
    assert_eq!(timeline.progress(), 0.1);
    assert!(region.box_reads.get() > 0);
}
