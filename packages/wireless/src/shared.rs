//! A [`Configuration`] behind a lock, for hosts that call in from several threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::configuration::Configuration;

/// Serializes every storage call through one mutex.
///
/// Backends are not reentrant; holding the lock for the whole call keeps two
/// operations on the same channel from overlapping.
#[derive(Clone)]
pub struct SharedConfiguration {
    inner: Arc<Mutex<Configuration>>,
}

impl SharedConfiguration {
    pub fn new(config: Configuration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    /// Take the lock, recovering it if a previous holder panicked.
    pub fn lock(&self) -> MutexGuard<'_, Configuration> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut Configuration) -> R) -> R {
        f(&mut self.lock())
    }
}
