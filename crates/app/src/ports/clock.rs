//! Clock port.

use irrihub_domain::time::{EpochMillis, now_millis};

/// Source of the current wall-clock time.
pub trait Clock {
    fn now(&self) -> EpochMillis;
}

/// [`Clock`] reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochMillis {
        now_millis()
    }
}

impl<T: Clock> Clock for std::sync::Arc<T> {
    fn now(&self) -> EpochMillis {
        (**self).now()
    }
}
