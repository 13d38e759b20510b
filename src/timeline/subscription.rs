/// Handle that detaches a listener when unsubscribed or dropped.
///
/// Returned by [`crate::Timeline::subscribe`] and by [`crate::ObservableRegion::on_resize`]
/// implementations. Unsubscribing twice is harmless.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a detach action.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to detach.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Detach now.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    /// Return `true` while the detach action has not run yet.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn detach(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
