//! Selector-based subscriptions over the store snapshot.

use parley_core::state::StoreSnapshot;
use std::sync::Arc;
use tokio::sync::watch;

type Selector<T> = Box<dyn Fn(&StoreSnapshot) -> T + Send + Sync>;

/// Follows one derived slice of the store.
///
/// Wakes only when the selected value differs from the last one seen, so a
/// component watching `settings` is not woken by message traffic.
pub struct SliceSubscription<T> {
    receiver: watch::Receiver<Arc<StoreSnapshot>>,
    selector: Selector<T>,
    last: T,
}

impl<T> SliceSubscription<T>
where
    T: PartialEq + Clone,
{
    pub(crate) fn new<F>(mut receiver: watch::Receiver<Arc<StoreSnapshot>>, selector: F) -> Self
    where
        F: Fn(&StoreSnapshot) -> T + Send + Sync + 'static,
    {
        let snapshot = receiver.borrow_and_update().clone();
        let last = selector(&snapshot);
        Self {
            receiver,
            selector: Box::new(selector),
            last,
        }
    }

    /// The last value yielded (or the initial selection).
    pub fn current(&self) -> &T {
        &self.last
    }

    /// Waits for the selected slice to change.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            if self.receiver.changed().await.is_err() {
                return None;
            }
            let snapshot = self.receiver.borrow_and_update().clone();
            let next = (self.selector)(&snapshot);
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::ui::ActiveView;

    #[tokio::test]
    async fn test_skips_unrelated_changes() {
        let (tx, rx) = watch::channel(Arc::new(StoreSnapshot::default()));
        let mut views = SliceSubscription::new(rx, |s: &StoreSnapshot| s.ui.active_view);
        assert_eq!(*views.current(), ActiveView::Chat);

        tx.send_modify(|s| Arc::make_mut(s).recent_projects.push("/tmp".to_string()));
        tx.send_modify(|s| Arc::make_mut(s).ui.active_view = ActiveView::Todos);

        assert_eq!(views.changed().await, Some(ActiveView::Todos));
    }

    #[tokio::test]
    async fn test_ends_when_sender_dropped() {
        let (tx, rx) = watch::channel(Arc::new(StoreSnapshot::default()));
        let mut todos = SliceSubscription::new(rx, |s: &StoreSnapshot| s.todos.len());
        drop(tx);
        assert_eq!(todos.changed().await, None);
    }
}
