//! Typed listener registry, one ordered list per event kind.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

use super::events::{
    DataCompletedEvent, EventKind, FileCompletedEvent, ProgressEvent, StringCompletedEvent,
};

/// A registered callback for events of type `E`.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Listener lists for every [`EventKind`].
///
/// Dispatch order is registration order. Cloning is cheap (listeners are
/// reference counted), which lets a background transfer take a snapshot.
#[derive(Clone, Default)]
pub struct Listeners {
    progress: Vec<Listener<ProgressEvent>>,
    file_completed: Vec<Listener<FileCompletedEvent>>,
    string_completed: Vec<Listener<StringCompletedEvent>>,
    data_completed: Vec<Listener<DataCompletedEvent>>,
}

impl Listeners {
    pub fn add_progress(&mut self, listener: impl Fn(&ProgressEvent) + Send + Sync + 'static) {
        self.progress.push(Arc::new(listener));
    }

    pub fn add_file_completed(
        &mut self,
        listener: impl Fn(&FileCompletedEvent) + Send + Sync + 'static,
    ) {
        self.file_completed.push(Arc::new(listener));
    }

    pub fn add_string_completed(
        &mut self,
        listener: impl Fn(&StringCompletedEvent) + Send + Sync + 'static,
    ) {
        self.string_completed.push(Arc::new(listener));
    }

    pub fn add_data_completed(
        &mut self,
        listener: impl Fn(&DataCompletedEvent) + Send + Sync + 'static,
    ) {
        self.data_completed.push(Arc::new(listener));
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Progress => self.progress.len(),
            EventKind::FileCompleted => self.file_completed.len(),
            EventKind::StringCompleted => self.string_completed.len(),
            EventKind::DataCompleted => self.data_completed.len(),
        }
    }

    pub(crate) fn emit_progress(&self, event: &ProgressEvent) {
        dispatch(&self.progress, event, EventKind::Progress);
    }

    pub(crate) fn emit_file_completed(&self, event: &FileCompletedEvent) {
        dispatch(&self.file_completed, event, EventKind::FileCompleted);
    }

    pub(crate) fn emit_string_completed(&self, event: &StringCompletedEvent) {
        dispatch(&self.string_completed, event, EventKind::StringCompleted);
    }

    /// Delivers a data-complete event to its listeners.
    ///
    /// None of the built-in transfers produce raw byte buffers; this is the
    /// hook for callers layering their own transfer kind on the registry.
    pub fn emit_data_completed(&self, event: &DataCompletedEvent) {
        dispatch(&self.data_completed, event, EventKind::DataCompleted);
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("progress", &self.progress.len())
            .field("file_completed", &self.file_completed.len())
            .field("string_completed", &self.string_completed.len())
            .field("data_completed", &self.data_completed.len())
            .finish()
    }
}

/// Runs every listener in order. A panicking listener is logged and skipped;
/// the rest still run.
fn dispatch<E>(listeners: &[Listener<E>], event: &E, kind: EventKind) {
    for (index, listener) in listeners.iter().enumerate() {
        if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
            warn!(?kind, index, "listener panicked; continuing with remaining listeners");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use url::Url;

    use super::*;
    use crate::download::events::TransferOutcome;

    fn sample_progress() -> ProgressEvent {
        let url = Url::parse("https://example.com/f").unwrap();
        ProgressEvent::new(&url, None, 1, Some(2))
    }

    #[test]
    fn test_dispatch_follows_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::default();
        for id in 0..3 {
            let calls = Arc::clone(&calls);
            listeners.add_progress(move |_| calls.lock().unwrap().push(id));
        }

        listeners.emit_progress(&sample_progress());

        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::default();
        let first = Arc::clone(&calls);
        listeners.add_progress(move |_| first.lock().unwrap().push("first"));
        listeners.add_progress(|_| panic!("listener failure"));
        let last = Arc::clone(&calls);
        listeners.add_progress(move |_| last.lock().unwrap().push("last"));

        listeners.emit_progress(&sample_progress());

        assert_eq!(*calls.lock().unwrap(), vec!["first", "last"]);
    }

    #[test]
    fn test_count_per_kind() {
        let mut listeners = Listeners::default();
        listeners.add_progress(|_| {});
        listeners.add_progress(|_| {});
        listeners.add_string_completed(|_| {});

        assert_eq!(listeners.count(EventKind::Progress), 2);
        assert_eq!(listeners.count(EventKind::StringCompleted), 1);
        assert_eq!(listeners.count(EventKind::FileCompleted), 0);
        assert_eq!(listeners.count(EventKind::DataCompleted), 0);
    }

    #[test]
    fn test_data_completed_listeners_receive_manual_emit() {
        let seen = Arc::new(Mutex::new(None));
        let mut listeners = Listeners::default();
        let sink = Arc::clone(&seen);
        listeners.add_data_completed(move |event| {
            *sink.lock().unwrap() = Some(event.data.clone());
        });

        listeners.emit_data_completed(&DataCompletedEvent {
            source: Url::parse("https://example.com/raw").unwrap(),
            data: vec![1, 2, 3],
            outcome: TransferOutcome::Completed,
        });

        assert_eq!(*seen.lock().unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_clone_shares_listeners() {
        let mut listeners = Listeners::default();
        listeners.add_file_completed(|_| {});
        let snapshot = listeners.clone();
        listeners.add_file_completed(|_| {});

        assert_eq!(snapshot.count(EventKind::FileCompleted), 1);
        assert_eq!(listeners.count(EventKind::FileCompleted), 2);
    }

    #[test]
    fn test_debug_shows_counts() {
        let mut listeners = Listeners::default();
        listeners.add_progress(|_| {});
        let rendered = format!("{listeners:?}");
        assert!(rendered.contains("progress: 1"), "{rendered}");
    }
}
