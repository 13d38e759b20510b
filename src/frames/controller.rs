use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::foundation::core::{Size, fit_contain, frame_index_for_progress};
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::frames::cache::{FrameCache, FrameWindow};
use crate::frames::loader::{FrameLoader, LoadCompletion, LoadRequest};
use crate::render::surface::{DrawableSurface, SurfaceSource};

/// Default lazy-window radius, in frames on each side of the current index.
pub const DEFAULT_BUFFER_RADIUS: usize = 10;

/// How frames are brought into memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Load every frame up front and never evict.
    Eager,
    /// Keep only a window around the current index resident.
    #[default]
    Lazy,
}

/// Construction options for [`FrameController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameControllerOpts {
    /// Loading strategy.
    pub strategy: LoadStrategy,
    /// Lazy-window radius. Ignored by [`LoadStrategy::Eager`].
    pub buffer_radius: usize,
}

impl Default for FrameControllerOpts {
    fn default() -> Self {
        Self {
            strategy: LoadStrategy::default(),
            buffer_radius: DEFAULT_BUFFER_RADIUS,
        }
    }
}

/// Counters describing controller activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Loads handed to the loader.
    pub loads_issued: u64,
    /// Successful completions that entered the cache.
    pub completions: u64,
    /// Completions discarded because their load was no longer tracked.
    pub stale_completions: u64,
    /// Loads that finished with an error.
    pub load_failures: u64,
    /// Frames painted.
    pub paints: u64,
    /// Cache entries evicted by window movement.
    pub evictions: u64,
}

/// Selects, loads, caches and paints frames for a progress value.
///
/// Runs on the host thread. Loads report back over a channel that [`FrameController::pump`]
/// drains; every `update` pumps first. Each load carries a token, and a completion whose token
/// is no longer tracked (evicted, or the controller was destroyed) is dropped.
pub struct FrameController<S: DrawableSurface> {
    frames: Vec<String>,
    opts: FrameControllerOpts,
    loader: Arc<dyn FrameLoader>,
    surface: S,
    cache: FrameCache,
    in_flight: HashMap<String, u64>,
    failed: HashSet<String>,
    next_token: u64,
    reply: Sender<LoadCompletion>,
    completions: Receiver<LoadCompletion>,
    window: Option<FrameWindow>,
    last_painted: Option<usize>,
    target: Option<usize>,
    destroyed: bool,
    stats: ControllerStats,
}

impl<S: DrawableSurface> std::fmt::Debug for FrameController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameController")
            .field("frames", &self.frames.len())
            .field("opts", &self.opts)
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .field("window", &self.window)
            .field("last_painted", &self.last_painted)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl<S: DrawableSurface> FrameController<S> {
    /// Acquire a surface from `source` and start loading.
    ///
    /// Eager controllers issue every load now; lazy controllers load the window around index 0.
    /// Fails with [`FlipbookError::Context`] when no 2D surface is available.
    pub fn new<Src>(
        frames: Vec<String>,
        opts: FrameControllerOpts,
        loader: Arc<dyn FrameLoader>,
        source: &mut Src,
    ) -> FlipbookResult<Self>
    where
        Src: SurfaceSource<Surface = S>,
    {
        let surface = source
            .context_2d()
            .ok_or_else(|| FlipbookError::context("2d drawing surface is unavailable"))?;
        let (reply, completions) = mpsc::channel();

        let mut this = Self {
            frames,
            opts,
            loader,
            surface,
            cache: FrameCache::new(),
            in_flight: HashMap::new(),
            failed: HashSet::new(),
            next_token: 0,
            reply,
            completions,
            window: None,
            last_painted: None,
            target: None,
            destroyed: false,
            stats: ControllerStats::default(),
        };

        match opts.strategy {
            LoadStrategy::Eager => {
                for url in this.frames.clone() {
                    this.request(url);
                }
            }
            LoadStrategy::Lazy => this.refresh_window(0),
        }
        tracing::debug!(
            frames = this.frames.len(),
            strategy = ?opts.strategy,
            loads = this.stats.loads_issued,
            "frame controller ready"
        );
        Ok(this)
    }

    /// Show the frame for `progress`.
    ///
    /// Paints immediately when the frame is cached; otherwise the frame becomes the target and
    /// is painted when its load completes, unless a later update retargets first.
    pub fn update(&mut self, progress: f64) {
        if self.destroyed {
            return;
        }
        let Some(index) = frame_index_for_progress(progress, self.frames.len()) else {
            return;
        };
        self.target = Some(index);
        if self.opts.strategy == LoadStrategy::Lazy {
            self.refresh_window(index);
        }
        self.pump();

        if self.last_painted == Some(index) {
            return;
        }
        if self.cache.contains(&self.frames[index]) {
            self.paint(index);
        }
    }

    /// Drain pending load completions without blocking. Returns how many were accepted.
    pub fn pump(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(done) = self.completions.try_recv() {
            if self.accept(done) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Wait up to `timeout` for at least one completion, then drain the rest.
    ///
    /// Returns immediately when nothing is in flight.
    pub fn pump_wait(&mut self, timeout: Duration) -> usize {
        if self.destroyed || self.in_flight.is_empty() {
            return self.pump();
        }
        let first = match self.completions.recv_timeout(timeout) {
            Ok(done) => usize::from(self.accept(done)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        };
        first + self.pump()
    }

    /// Resize the surface and repaint the last painted frame if it is still cached.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.destroyed {
            return;
        }
        self.surface.set_dimensions(width, height);
        if let Some(index) = self.last_painted {
            self.paint(index);
        }
    }

    /// Release every frame and stop accepting completions. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.cache.clear();
        self.in_flight.clear();
        self.failed.clear();
        self.window = None;
        self.target = None;
        self.last_painted = None;
        self.surface.clear();
        self.pump();
        tracing::debug!(stats = ?self.stats, "frame controller destroyed");
    }

    /// Frame URLs, in playback order.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Options the controller was built with.
    pub fn opts(&self) -> FrameControllerOpts {
        self.opts
    }

    /// Number of decoded frames held.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Return `true` when the frame at `index` is decoded and resident.
    pub fn is_cached(&self, index: usize) -> bool {
        self.frames
            .get(index)
            .is_some_and(|url| self.cache.contains(url))
    }

    /// Number of loads issued and not yet completed.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Current lazy window, if any.
    pub fn window(&self) -> Option<FrameWindow> {
        self.window
    }

    /// Index most recently painted.
    pub fn last_painted(&self) -> Option<usize> {
        self.last_painted
    }

    /// Index the last `update` asked for.
    pub fn target_index(&self) -> Option<usize> {
        self.target
    }

    /// Return `true` once [`FrameController::destroy`] has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Activity counters.
    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    /// The drawing surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn request(&mut self, url: String) {
        if self.cache.contains(&url)
            || self.in_flight.contains_key(&url)
            || self.failed.contains(&url)
        {
            return;
        }
        let token = self.next_token;
        self.next_token += 1;
        self.in_flight.insert(url.clone(), token);
        self.stats.loads_issued += 1;
        tracing::trace!(%url, token, "load issued");
        self.loader.load(LoadRequest::new(url, token, self.reply.clone()));
    }

    fn refresh_window(&mut self, index: usize) {
        let Some(window) = FrameWindow::around(index, self.opts.buffer_radius, self.frames.len())
        else {
            return;
        };
        if self.window == Some(window) {
            return;
        }

        let wanted: Vec<String> = self.frames[window.indices()].to_vec();
        {
            let keep: HashSet<&str> = wanted.iter().map(String::as_str).collect();
            let evicted = self.cache.retain(|url| keep.contains(url));
            self.in_flight.retain(|url, _| keep.contains(url.as_str()));
            self.failed.retain(|url| keep.contains(url.as_str()));
            if evicted > 0 {
                self.stats.evictions += evicted as u64;
                tracing::trace!(evicted, start = window.start, end = window.end, "window moved");
            }
        }
        self.window = Some(window);

        for url in wanted {
            self.request(url);
        }
    }

    fn accept(&mut self, done: LoadCompletion) -> bool {
        if self.destroyed || self.in_flight.get(&done.url) != Some(&done.token) {
            self.stats.stale_completions += 1;
            tracing::trace!(url = %done.url, token = done.token, "stale completion dropped");
            return false;
        }
        self.in_flight.remove(&done.url);

        match done.result {
            Ok(frame) => {
                self.cache.insert(done.url.clone(), frame);
                self.stats.completions += 1;
                if let Some(target) = self.target
                    && self.last_painted != Some(target)
                    && self.frames[target] == done.url
                {
                    self.paint(target);
                }
            }
            Err(e) => {
                self.stats.load_failures += 1;
                tracing::warn!(url = %done.url, error = %e, "frame load failed");
                self.failed.insert(done.url);
            }
        }
        true
    }

    fn paint(&mut self, index: usize) {
        let Some(frame) = self.cache.get(&self.frames[index]) else {
            return;
        };
        let (width, height) = self.surface.dimensions();
        let dest = fit_contain(
            Size::new(f64::from(frame.width), f64::from(frame.height)),
            Size::new(f64::from(width), f64::from(height)),
        );
        self.surface.clear();
        self.surface.draw_scaled(frame, dest);
        self.last_painted = Some(index);
        self.stats.paints += 1;
    }
}

impl<S: DrawableSurface> Drop for FrameController<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frames/controller.rs"]
mod tests;
