//! Thread-safe progress fan-out for compiler loading.

use super::types::{LoadPhase, ProgressEvent};
use crate::generation::{GenerationCounter, GenerationStamp};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

type Listener = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

struct HubState {
    listeners: BTreeMap<u64, Listener>,
    next_id: u64,
    latest: ProgressEvent,
}

/// Delivers loading progress to subscribers, dropping stale events.
///
/// Events are not replayed: a subscriber only sees events emitted after it
/// subscribed. [`ProgressHub::latest`] returns the last delivered event.
pub struct ProgressHub {
    generation: GenerationCounter,
    state: Arc<Mutex<HubState>>,
}

impl ProgressHub {
    pub fn new(generation: GenerationCounter) -> Self {
        let latest = ProgressEvent::phase(generation.current(), LoadPhase::Uninitialized);
        Self {
            generation,
            state: Arc::new(Mutex::new(HubState {
                listeners: BTreeMap::new(),
                next_id: 0,
                latest,
            })),
        }
    }

    /// Register a listener. It stays registered until the subscription drops.
    pub fn subscribe<F>(&self, listener: F) -> ProgressSubscription
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        let mut state = self.state.lock().expect("progress lock poisoned");
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, Arc::new(listener));
        ProgressSubscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Deliver `event` if `stamp` is still current. Returns whether it was delivered.
    ///
    /// Listeners run outside the lock, so the stamp is checked again before
    /// each call. A refresh that lands mid-delivery stops the remaining calls.
    pub fn emit(&self, stamp: &GenerationStamp, event: ProgressEvent) -> bool {
        let listeners: Vec<Listener> = {
            let mut state = self.state.lock().expect("progress lock poisoned");
            if !stamp.is_current() {
                return false;
            }
            state.latest = event;
            state.listeners.values().cloned().collect()
        };

        for listener in listeners {
            if !stamp.is_current() {
                return false;
            }
            listener(&event);
        }
        true
    }

    /// Forget the last event after a refresh.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("progress lock poisoned");
        state.latest = ProgressEvent::phase(self.generation.current(), LoadPhase::Uninitialized);
    }

    /// The last delivered event of the current generation.
    pub fn latest(&self) -> ProgressEvent {
        self.state.lock().expect("progress lock poisoned").latest
    }

    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .expect("progress lock poisoned")
            .listeners
            .len()
    }
}

/// Keeps a progress listener registered. Dropping it unsubscribes.
pub struct ProgressSubscription {
    id: u64,
    state: Weak<Mutex<HubState>>,
}

impl ProgressSubscription {
    /// Unsubscribe now. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {}
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock().expect("progress lock poisoned");
            state.listeners.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for ProgressSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSubscription")
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(hub: &ProgressHub) -> (Arc<Mutex<Vec<ProgressEvent>>>, ProgressSubscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = hub.subscribe(move |event| sink.lock().unwrap().push(*event));
        (seen, subscription)
    }

    #[test]
    fn test_emit_reaches_subscribers() {
        let counter = GenerationCounter::new();
        let hub = ProgressHub::new(counter.clone());
        let (seen, _subscription) = recorder(&hub);

        let event = ProgressEvent::phase(0, LoadPhase::LoadingCompiler);
        assert!(hub.emit(&counter.stamp(), event));
        assert_eq!(*seen.lock().unwrap(), vec![event]);
        assert_eq!(hub.latest(), event);
    }

    #[test]
    fn test_stale_events_are_dropped() {
        let counter = GenerationCounter::new();
        let hub = ProgressHub::new(counter.clone());
        let (seen, _subscription) = recorder(&hub);

        let stamp = counter.stamp();
        counter.advance();
        hub.reset();

        assert!(!hub.emit(&stamp, ProgressEvent::fonts(0, 10, Some(20))));
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(hub.latest(), ProgressEvent::phase(1, LoadPhase::Uninitialized));
    }

    #[test]
    fn test_refresh_during_delivery_stops_stale_event() {
        let counter = GenerationCounter::new();
        let hub = ProgressHub::new(counter.clone());

        // Registered first, so it runs first and refreshes mid-delivery.
        let refresher = counter.clone();
        let refresh_on_event = hub.subscribe(move |_| {
            refresher.advance();
        });
        let (seen, _subscription) = recorder(&hub);

        let stamp = counter.stamp();
        assert!(!hub.emit(&stamp, ProgressEvent::phase(0, LoadPhase::LoadingCompiler)));
        assert!(seen.lock().unwrap().is_empty());

        // The next generation delivers to everyone again.
        let event = ProgressEvent::phase(1, LoadPhase::LoadingCompiler);
        let (later, _later_subscription) = recorder(&hub);
        drop(refresh_on_event);
        assert!(hub.emit(&counter.stamp(), event));
        assert_eq!(*seen.lock().unwrap(), vec![event]);
        assert_eq!(*later.lock().unwrap(), vec![event]);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let counter = GenerationCounter::new();
        let hub = ProgressHub::new(counter.clone());
        hub.emit(&counter.stamp(), ProgressEvent::phase(0, LoadPhase::Ready));

        let (seen, _subscription) = recorder(&hub);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(hub.latest().phase, LoadPhase::Ready);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let counter = GenerationCounter::new();
        let hub = ProgressHub::new(counter.clone());
        let (seen, subscription) = recorder(&hub);
        assert_eq!(hub.listener_count(), 1);

        subscription.unsubscribe();
        assert_eq!(hub.listener_count(), 0);

        hub.emit(&counter.stamp(), ProgressEvent::phase(0, LoadPhase::Ready));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscription_outliving_hub() {
        let hub = ProgressHub::new(GenerationCounter::new());
        let (_seen, subscription) = recorder(&hub);
        drop(hub);
        drop(subscription);
    }
}
