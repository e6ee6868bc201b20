// other keepers use HashSet or HashMap
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::hash::BuildHasherDefault;
use std::sync::{Arc, Mutex};
// we will use a fast hashing algo for maps whose keys are property names
use seahash::SeaHasher;
use tracing::warn;

pub type KeyHasher = BuildHasherDefault<SeaHasher>;

type Callback = Arc<dyn Fn(&str) + Send + Sync>;

thread_local! {
    // The active tracking scope, if any. Accesses recorded here let a
    // reactive observer recompute exactly when a dependency changes.
    static TRACKING: RefCell<Option<HashSet<String, KeyHasher>>> = const { RefCell::new(None) };
}

// ------------- ObservationRegistrar -------------
/// Per-instance notification hub. The synthesized accessors call into it
/// around every read and write; none of its operations can fail, and with
/// no observers registered every call is a cheap no-op.
///
/// Observers registered for a property are notified only once the mutation
/// has completed, never while it is in flight, so they never see a
/// half-updated value. Brackets on the same property are expected not to
/// overlap; that is a caller obligation, not something detected here.
pub struct ObservationRegistrar {
    observers: Mutex<HashMap<String, Vec<Callback>, KeyHasher>>,
    pending: Mutex<HashMap<String, usize, KeyHasher>>,
}

impl ObservationRegistrar {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(HashMap::default()),
            pending: Mutex::new(HashMap::default()),
        }
    }

    /// Registers a callback to run after each completed mutation of the
    /// named property.
    pub fn observe(&self, property: impl Into<String>, callback: impl Fn(&str) + Send + Sync + 'static) {
        match self.observers.lock() {
            Ok(mut observers) => {
                observers
                    .entry(property.into())
                    .or_default()
                    .push(Arc::new(callback));
            }
            Err(_) => warn!("registrar lock poisoned, observer dropped"),
        }
    }

    /// Records that the current tracking scope, if one is active on this
    /// thread, read the named property.
    pub fn access(&self, property: &str) {
        TRACKING.with(|tracking| {
            if let Some(accessed) = tracking.borrow_mut().as_mut() {
                accessed.insert(property.to_owned());
            }
        });
    }

    /// Opens a mutation bracket for the named property.
    pub fn will_mutate(&self, property: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending.entry(property.to_owned()).or_insert(0) += 1;
        }
    }

    /// Closes a mutation bracket and notifies the property's observers.
    /// A close without a matching open notifies nobody.
    pub fn did_mutate(&self, property: &str) {
        let opened = match self.pending.lock() {
            Ok(mut pending) => match pending.get_mut(property) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    true
                }
                _ => false,
            },
            Err(_) => false,
        };
        if !opened {
            return;
        }
        // Callbacks run outside the lock so an observer that mutates
        // another property on this instance cannot deadlock.
        let callbacks: Vec<Callback> = match self.observers.lock() {
            Ok(observers) => observers.get(property).cloned().unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        for callback in callbacks {
            callback(property);
        }
    }

    /// Runs `body` inside a tracking scope and returns its result together
    /// with the set of properties it read. Scopes nest; the enclosing scope
    /// is restored afterwards and does not see the inner scope's reads.
    pub fn track<R>(body: impl FnOnce() -> R) -> (R, HashSet<String, KeyHasher>) {
        let enclosing = TRACKING.with(|tracking| {
            tracking.borrow_mut().replace(HashSet::default())
        });
        let result = body();
        let accessed = TRACKING.with(|tracking| {
            let mut slot = tracking.borrow_mut();
            let accessed = slot.take().unwrap_or_default();
            *slot = enclosing;
            accessed
        });
        (result, accessed)
    }
}

impl Default for ObservationRegistrar {
    fn default() -> Self {
        Self::new()
    }
}
