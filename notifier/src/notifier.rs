//! Observer registry with deferred cleanup
//!
//! The registry tolerates observers that call back into the same instance
//! from inside a notification callback. A depth counter tracks in-progress
//! notification passes; entries removed mid-pass are cleared in place and
//! only physically erased once the outermost pass finishes, so index-based
//! iteration stays valid throughout.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Hook invoked for every newly added observer.
type AddHook<T> = Arc<dyn Fn(&Arc<T>) + Send + Sync>;

/// One slot in the registry.
///
/// A removed slot becomes `Cleared` while a notification pass is running
/// and is erased at the next zero-depth point.
enum Entry<T: ?Sized> {
    Strong(Arc<T>),
    Weak(Weak<T>),
    Cleared,
}

impl<T: ?Sized> Entry<T> {
    /// Data-pointer identity of the registered observer, if the slot is live.
    fn identity(&self) -> Option<*const ()> {
        match self {
            Entry::Strong(observer) => Some(Arc::as_ptr(observer) as *const ()),
            Entry::Weak(observer) => Some(Weak::as_ptr(observer) as *const ()),
            Entry::Cleared => None,
        }
    }

    /// Upgrade the slot to a callable observer reference.
    fn live(&self) -> Option<Arc<T>> {
        match self {
            Entry::Strong(observer) => Some(Arc::clone(observer)),
            Entry::Weak(observer) => observer.upgrade(),
            Entry::Cleared => None,
        }
    }
}

struct Inner<T: ?Sized> {
    observers: Vec<Entry<T>>,
    /// Number of notification passes currently on the stack.
    depth: usize,
    add_hook: Option<AddHook<T>>,
}

/// Thread-safe multi-observer broadcast registry.
///
/// Observers are registered by strong (`Arc`) or weak (`Weak`) reference and
/// notified in insertion order (or reverse). Registration is idempotent by
/// pointer identity, regardless of which mode the observer was first added
/// with. Observer callbacks may add or remove observers on the same
/// instance, or trigger another notification pass, without deadlocking:
/// the internal lock is released around every callback invocation.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use notifier::Notifier;
///
/// trait Listener: Send + Sync {
///     fn on_event(&self);
/// }
///
/// struct Printer;
/// impl Listener for Printer {
///     fn on_event(&self) {}
/// }
///
/// let notifier: Notifier<dyn Listener> = Notifier::new();
/// let listener: Arc<dyn Listener> = Arc::new(Printer);
/// notifier.add_observer(Arc::clone(&listener));
/// notifier.notify_observers(|l| l.on_event());
/// ```
pub struct Notifier<T: ?Sized> {
    inner: Mutex<Inner<T>>,
}

impl<T: ?Sized> Notifier<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                observers: Vec::new(),
                depth: 0,
                add_hook: None,
            }),
        }
    }

    /// Register an observer by strong reference.
    ///
    /// Adding an observer that is already present (by pointer identity, in
    /// either mode) is a no-op. The add hook, if set, fires for genuinely
    /// new additions only.
    pub fn add_observer(&self, observer: Arc<T>) {
        let hook = {
            let mut inner = self.inner.lock();
            let identity = Arc::as_ptr(&observer) as *const ();
            if Self::contains(&inner.observers, identity) {
                return;
            }
            inner.observers.push(Entry::Strong(Arc::clone(&observer)));
            inner.add_hook.clone()
        };
        if let Some(hook) = hook {
            hook(&observer);
        }
    }

    /// Register an observer by weak reference.
    ///
    /// The registry never keeps such an observer alive; once the last strong
    /// reference elsewhere is dropped, the observer silently stops receiving
    /// notifications and its slot is reclaimed at the next quiescent point.
    pub fn add_weak_observer(&self, observer: Weak<T>) {
        let notify = {
            let mut inner = self.inner.lock();
            let identity = Weak::as_ptr(&observer) as *const ();
            if Self::contains(&inner.observers, identity) {
                return;
            }
            let live = observer.upgrade();
            inner.observers.push(Entry::Weak(observer));
            inner.add_hook.clone().zip(live)
        };
        if let Some((hook, observer)) = notify {
            hook(&observer);
        }
    }

    /// Remove an observer registered in either mode.
    ///
    /// If a notification pass is in progress the slot is cleared in place
    /// and erased when the outermost pass completes.
    pub fn remove_observer(&self, observer: &Arc<T>) {
        self.remove_by_identity(Arc::as_ptr(observer) as *const ());
    }

    /// Remove an observer registered in either mode, by weak reference.
    pub fn remove_weak_observer(&self, observer: &Weak<T>) {
        self.remove_by_identity(Weak::as_ptr(observer) as *const ());
    }

    /// Invoke `notify` for each live observer in insertion order.
    ///
    /// Observers whose weak reference has expired are skipped. Observers
    /// added during the pass are not visited by it.
    pub fn notify_observers<F>(&self, notify: F)
    where
        F: Fn(&Arc<T>),
    {
        self.do_notify(&notify, false);
    }

    /// Invoke `notify` for each live observer in reverse insertion order.
    ///
    /// Returns `true` iff no observer was added to the registry during this
    /// pass. Callers sequencing an orderly teardown use a `false` return to
    /// detect late registrations that would otherwise be missed.
    pub fn notify_observers_in_reverse<F>(&self, notify: F) -> bool
    where
        F: Fn(&Arc<T>),
    {
        self.do_notify(&notify, true)
    }

    /// Install a hook invoked for every observer added from now on, and
    /// immediately (synchronously) for every observer already present.
    pub fn set_add_observer_function<F>(&self, hook: F)
    where
        F: Fn(&Arc<T>) + Send + Sync + 'static,
    {
        let hook: AddHook<T> = Arc::new(hook);
        self.inner.lock().add_hook = Some(Arc::clone(&hook));
        self.do_notify(&*hook, false);
    }

    /// Number of live observers currently registered.
    pub fn observer_count(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .observers
            .iter()
            .filter(|entry| entry.live().is_some())
            .count()
    }

    fn contains(observers: &[Entry<T>], identity: *const ()) -> bool {
        observers
            .iter()
            .any(|entry| entry.identity() == Some(identity))
    }

    fn remove_by_identity(&self, identity: *const ()) {
        let mut inner = self.inner.lock();
        let Some(index) = inner
            .observers
            .iter()
            .position(|entry| entry.identity() == Some(identity))
        else {
            return;
        };
        if inner.depth == 0 {
            inner.observers.remove(index);
        } else {
            inner.observers[index] = Entry::Cleared;
        }
    }

    /// Shared notification pass. Returns `true` iff no observer was added
    /// while the pass was running.
    fn do_notify(&self, notify: &dyn Fn(&Arc<T>), reverse: bool) -> bool {
        let mut inner = self.inner.lock();
        inner.depth += 1;
        let initial_len = inner.observers.len();
        let order: Box<dyn Iterator<Item = usize>> = if reverse {
            Box::new((0..initial_len).rev())
        } else {
            Box::new(0..initial_len)
        };
        for index in order {
            if let Some(observer) = inner.observers[index].live() {
                // The lock must not be held across the callback: the
                // observer may call back into this registry.
                drop(inner);
                notify(&observer);
                inner = self.inner.lock();
            }
        }
        // Removals are deferred while depth > 0, so the vector can only
        // have grown during the pass.
        let no_additions = inner.observers.len() == initial_len;
        inner.depth -= 1;
        if inner.depth == 0 {
            inner.observers.retain(|entry| match entry {
                Entry::Strong(_) => true,
                Entry::Weak(observer) => observer.strong_count() > 0,
                Entry::Cleared => false,
            });
        }
        no_additions
    }
}

impl<T: ?Sized> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("observer_count", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    trait TestObserver: Send + Sync {
        fn on_something(&self);
        fn id(&self) -> usize;
    }

    /// Records invocation order into a shared log.
    struct Recorder {
        id: usize,
        log: Arc<StdMutex<Vec<usize>>>,
    }

    impl Recorder {
        fn new(id: usize, log: &Arc<StdMutex<Vec<usize>>>) -> Arc<Self> {
            Arc::new(Self {
                id,
                log: Arc::clone(log),
            })
        }
    }

    impl TestObserver for Recorder {
        fn on_something(&self) {
            self.log.lock().unwrap().push(self.id);
        }

        fn id(&self) -> usize {
            self.id
        }
    }

    fn as_dyn(observer: &Arc<Recorder>) -> Arc<dyn TestObserver> {
        Arc::clone(observer) as Arc<dyn TestObserver>
    }

    #[test]
    fn test_simplest_notification() {
        let notifier: Notifier<dyn TestObserver> = Notifier::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let strong = Recorder::new(0, &log);
        let weakly_held = Recorder::new(1, &log);

        notifier.add_observer(as_dyn(&strong));
        notifier.add_weak_observer(Arc::downgrade(&(as_dyn(&weakly_held))));
        notifier.notify_observers(|o| o.on_something());

        assert_eq!(*log.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_notification_order_is_insertion_order() {
        let notifier: Notifier<dyn TestObserver> = Notifier::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let observers: Vec<_> = (0..6).map(|id| Recorder::new(id, &log)).collect();
        let dyns: Vec<Arc<dyn TestObserver>> = observers.iter().map(as_dyn).collect();

        notifier.add_observer(Arc::clone(&dyns[0]));
        notifier.add_weak_observer(Arc::downgrade(&dyns[1]));
        notifier.add_observer(Arc::clone(&dyns[2]));
        notifier.add_weak_observer(Arc::downgrade(&dyns[3]));
        notifier.add_observer(Arc::clone(&dyns[4]));
        notifier.add_weak_observer(Arc::downgrade(&dyns[5]));
        notifier.notify_observers(|o| o.on_something());

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_duplicate_additions_are_ignored() {
        let notifier: Notifier<dyn TestObserver> = Notifier::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let observer = Recorder::new(7, &log);
        let as_trait = as_dyn(&observer);

        notifier.add_observer(Arc::clone(&as_trait));
        notifier.add_observer(Arc::clone(&as_trait));
        // Re-adding in weak mode is also a duplicate of the same instance.
        notifier.add_weak_observer(Arc::downgrade(&as_trait));
        notifier.notify_observers(|o| o.on_something());

        assert_eq!(*log.lock().unwrap(), vec![7]);
        assert_eq!(notifier.observer_count(), 1);
    }

    #[test]
    fn test_removal() {
        let notifier: Notifier<dyn TestObserver> = Notifier::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let kept = Recorder::new(0, &log);
        let removed = Recorder::new(1, &log);
        let weak_removed = Recorder::new(2, &log);
        let kept_dyn = as_dyn(&kept);
        let removed_dyn = as_dyn(&removed);
        let weak_removed_dyn = as_dyn(&weak_removed);

        notifier.add_observer(Arc::clone(&kept_dyn));
        notifier.add_observer(Arc::clone(&removed_dyn));
        notifier.add_weak_observer(Arc::downgrade(&weak_removed_dyn));
        notifier.remove_observer(&removed_dyn);
        notifier.remove_weak_observer(&Arc::downgrade(&weak_removed_dyn));
        notifier.notify_observers(|o| o.on_something());

        assert_eq!(*log.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_notification_in_reverse_order() {
        let notifier: Notifier<dyn TestObserver> = Notifier::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let observers: Vec<_> = (0..4).map(|id| Recorder::new(id, &log)).collect();
        for observer in &observers {
            notifier.add_observer(as_dyn(observer));
        }

        assert!(notifier.notify_observers_in_reverse(|o| o.on_something()));
        assert_eq!(*log.lock().unwrap(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_remove_within_callback() {
        let notifier: Arc<Notifier<dyn TestObserver>> = Arc::new(Notifier::new());
        let log = Arc::new(StdMutex::new(Vec::new()));

        // Observer 1 removes observer 2 (not yet visited) from inside its
        // own callback; observer 2 must be skipped, observer 3 still runs.
        struct Remover {
            notifier: Arc<Notifier<dyn TestObserver>>,
            victim: StdMutex<Option<Arc<dyn TestObserver>>>,
            log: Arc<StdMutex<Vec<usize>>>,
        }
        impl TestObserver for Remover {
            fn on_something(&self) {
                self.log.lock().unwrap().push(1);
                if let Some(victim) = self.victim.lock().unwrap().take() {
                    self.notifier.remove_observer(&victim);
                }
            }
            fn id(&self) -> usize {
                1
            }
        }

        let first = Recorder::new(0, &log);
        let victim = Recorder::new(2, &log);
        let last = Recorder::new(3, &log);
        let victim_dyn = as_dyn(&victim);
        let remover: Arc<dyn TestObserver> = Arc::new(Remover {
            notifier: Arc::clone(&notifier),
            victim: StdMutex::new(Some(Arc::clone(&victim_dyn))),
            log: Arc::clone(&log),
        });

        notifier.add_observer(as_dyn(&first));
        notifier.add_observer(remover);
        notifier.add_observer(victim_dyn);
        notifier.add_observer(as_dyn(&last));
        notifier.notify_observers(|o| o.on_something());

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 3]);

        // Second pass: the victim is gone for good, everyone else remains.
        log.lock().unwrap().clear();
        notifier.notify_observers(|o| o.on_something());
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn test_reverse_notify_detects_addition_during_pass() {
        let notifier: Arc<Notifier<dyn TestObserver>> = Arc::new(Notifier::new());
        let log = Arc::new(StdMutex::new(Vec::new()));

        struct Adder {
            notifier: Arc<Notifier<dyn TestObserver>>,
            extra: StdMutex<Option<Arc<dyn TestObserver>>>,
            log: Arc<StdMutex<Vec<usize>>>,
        }
        impl TestObserver for Adder {
            fn on_something(&self) {
                self.log.lock().unwrap().push(1);
                if let Some(extra) = self.extra.lock().unwrap().take() {
                    self.notifier.add_observer(extra);
                }
            }
            fn id(&self) -> usize {
                1
            }
        }

        let stable = Recorder::new(0, &log);
        let extra = Recorder::new(9, &log);
        let adder: Arc<dyn TestObserver> = Arc::new(Adder {
            notifier: Arc::clone(&notifier),
            extra: StdMutex::new(Some(as_dyn(&extra))),
            log: Arc::clone(&log),
        });

        notifier.add_observer(as_dyn(&stable));
        notifier.add_observer(adder);

        // The adder fires during this pass, so it must report an addition.
        assert!(!notifier.notify_observers_in_reverse(|o| o.on_something()));
        // The newly added observer was not visited by that pass.
        assert_eq!(*log.lock().unwrap(), vec![1, 0]);

        // A clean pass reports no additions and visits everyone.
        log.lock().unwrap().clear();
        assert!(notifier.notify_observers_in_reverse(|o| o.on_something()));
        assert_eq!(*log.lock().unwrap(), vec![9, 1, 0]);
    }

    #[test]
    fn test_expired_weak_observer_is_skipped() {
        let notifier: Notifier<dyn TestObserver> = Notifier::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let transient = Recorder::new(0, &log);
        let durable = Recorder::new(1, &log);
        let transient_dyn = as_dyn(&transient);

        notifier.add_weak_observer(Arc::downgrade(&transient_dyn));
        notifier.add_weak_observer(Arc::downgrade(&(as_dyn(&durable))));
        notifier.notify_observers(|o| o.on_something());
        assert_eq!(*log.lock().unwrap(), vec![0, 1]);

        drop(transient_dyn);
        drop(transient);
        log.lock().unwrap().clear();
        notifier.notify_observers(|o| o.on_something());
        assert_eq!(*log.lock().unwrap(), vec![1]);
        assert_eq!(notifier.observer_count(), 1);
    }

    #[test]
    fn test_add_observer_function_fires_for_present_and_future() {
        let notifier: Notifier<dyn TestObserver> = Notifier::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let early = Recorder::new(0, &log);
        let late = Recorder::new(1, &log);

        notifier.add_observer(as_dyn(&early));
        notifier.set_add_observer_function(|observer| observer.on_something());
        // Installation replayed the hook over the existing observer.
        assert_eq!(*log.lock().unwrap(), vec![0]);

        notifier.add_observer(as_dyn(&late));
        assert_eq!(*log.lock().unwrap(), vec![0, 1]);

        // Duplicate addition must not re-fire the hook.
        notifier.add_observer(as_dyn(&late));
        assert_eq!(*log.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_reentrant_notify_from_callback() {
        let notifier: Arc<Notifier<dyn TestObserver>> = Arc::new(Notifier::new());
        let log = Arc::new(StdMutex::new(Vec::new()));

        struct Reenter {
            notifier: Arc<Notifier<dyn TestObserver>>,
            armed: StdMutex<bool>,
            log: Arc<StdMutex<Vec<usize>>>,
        }
        impl TestObserver for Reenter {
            fn on_something(&self) {
                self.log.lock().unwrap().push(5);
                let mut armed = self.armed.lock().unwrap();
                if *armed {
                    *armed = false;
                    drop(armed);
                    self.notifier.notify_observers(|o| o.on_something());
                }
            }
            fn id(&self) -> usize {
                5
            }
        }

        let plain = Recorder::new(0, &log);
        let reenter: Arc<dyn TestObserver> = Arc::new(Reenter {
            notifier: Arc::clone(&notifier),
            armed: StdMutex::new(true),
            log: Arc::clone(&log),
        });

        notifier.add_observer(as_dyn(&plain));
        notifier.add_observer(reenter);
        notifier.notify_observers(|o| o.on_something());

        // Outer pass visits 0 then 5; the nested pass visits both again.
        assert_eq!(*log.lock().unwrap(), vec![0, 5, 0, 5]);
    }
}
