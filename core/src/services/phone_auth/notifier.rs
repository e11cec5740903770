//! Change notification fan-out to session observers

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::types::SessionSnapshot;

type Listener = Arc<dyn Fn(&SessionSnapshot) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by [`ChangeNotifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of observers notified on every session state change.
///
/// Listener failures, whether returned errors or panics, are logged and
/// never reach the code that triggered the notification.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionSnapshot) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver a snapshot to every listener, returning how many failed
    pub fn notify(&self, snapshot: &SessionSnapshot) -> usize {
        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<(ListenerId, Listener)> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut failures = 0;
        for (id, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(snapshot))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    failures += 1;
                    tracing::warn!(
                        session_id = %snapshot.session_id,
                        listener = ?id,
                        error = %error,
                        event = "observer_failed",
                        "Session observer returned an error"
                    );
                }
                Err(_) => {
                    failures += 1;
                    tracing::error!(
                        session_id = %snapshot.session_id,
                        listener = ?id,
                        event = "observer_panicked",
                        "Session observer panicked"
                    );
                }
            }
        }
        failures
    }
}
