//! Trailing-edge debouncer
//!
//! Each `schedule` call replaces whatever is pending under the same key and
//! restarts that key's delay. Only the last action scheduled for a key before
//! its delay runs out is executed; earlier ones are dropped. With a single
//! shared key this is one global coalescing point.

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

type Action = Box<dyn FnOnce() + Send + 'static>;

struct State<K> {
    pending: HashMap<K, (Instant, Action)>,
    stopped: bool,
}

struct Shared<K> {
    state: Mutex<State<K>>,
    cv: Condvar,
}

pub struct Debouncer<K> {
    shared: Arc<Shared<K>>,
    delay: Duration,
    worker: Option<JoinHandle<()>>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(delay: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                pending: HashMap::new(),
                stopped: false,
            }),
            cv: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("debounce".into())
            .spawn(move || run_timer(worker_shared))
            .map_err(|e| tracing::error!("failed to start debounce timer: {}", e))
            .ok();

        Self {
            shared,
            delay,
            worker,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` once `delay` has passed without another `schedule` for `key`
    pub fn schedule(&self, key: K, action: impl FnOnce() + Send + 'static) {
        let due = Instant::now() + self.delay;
        let mut state = self.shared.state.lock();
        if state.pending.insert(key, (due, Box::new(action))).is_some() {
            tracing::trace!("debounce: replaced pending action");
        }
        self.shared.cv.notify_one();
    }

    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }
}

fn run_timer<K>(shared: Arc<Shared<K>>)
where
    K: Eq + Hash + Clone + Send + 'static,
{
    let mut state = shared.state.lock();
    loop {
        if state.stopped {
            return;
        }

        let now = Instant::now();
        let due: Vec<K> = state
            .pending
            .iter()
            .filter(|(_, (at, _))| *at <= now)
            .map(|(k, _)| k.clone())
            .collect();

        if !due.is_empty() {
            let actions: Vec<Action> = due
                .iter()
                .filter_map(|k| state.pending.remove(k))
                .map(|(_, action)| action)
                .collect();

            // Fire outside the lock so callbacks may schedule again
            drop(state);
            for action in actions {
                fire(action);
            }
            state = shared.state.lock();
            continue;
        }

        match state.pending.values().map(|(at, _)| *at).min() {
            Some(next) => {
                shared.cv.wait_until(&mut state, next);
            }
            None => shared.cv.wait(&mut state),
        }
    }
}

fn fire(action: Action) {
    // Own thread per action, a slow upload must not hold up other keys
    let spawned = thread::Builder::new()
        .name("debounced-action".into())
        .spawn(action);
    if let Err(e) = spawned {
        tracing::error!("failed to spawn debounced action: {}", e);
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.stopped = true;
            state.pending.clear();
        }
        self.shared.cv.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
