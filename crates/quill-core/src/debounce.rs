//! Quiescence timer that turns a burst of changes into one settled value.
//!
//! A [`Debouncer`] owns its timer as a deadline instead of a spawned task, so
//! cancelling it is just forgetting the pending value. It is driven from a
//! `tokio::select!` loop through [`Debouncer::settled`].

use tokio::time::{self, Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    /// Last value emitted (or the initial value).
    current: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    /// `initial` counts as already settled and is never emitted.
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            current: initial,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(value, _)| value)
    }

    /// Feed the latest input. Restarts the timer unless `value` is what is
    /// already waiting (or, with nothing waiting, what last settled).
    pub fn observe(&mut self, value: T) {
        let unchanged = match &self.pending {
            Some((pending, _)) => *pending == value,
            None => self.current == value,
        };
        if unchanged {
            return;
        }
        self.pending = Some((value, Instant::now() + self.delay));
    }

    /// Drop the pending value. It never emits.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Treat `value` as already settled and drop anything pending.
    pub fn reset(&mut self, value: T) {
        self.current = value;
        self.pending = None;
    }

    /// Resolves with the pending value once it has been quiet for the delay
    /// and differs from the last emitted one. Pends forever when idle.
    ///
    /// Cancel safe: dropping the future before it resolves loses nothing.
    pub async fn settled(&mut self) -> T {
        loop {
            let Some((_, deadline)) = self.pending else {
                return std::future::pending().await;
            };
            time::sleep_until(deadline).await;

            let Some((value, _)) = self.pending.take() else {
                continue;
            };
            if value != self.current {
                self.current = value.clone();
                return value;
            }
        }
    }
}
