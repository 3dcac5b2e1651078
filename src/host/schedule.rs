//! Cancellable fixed-period task on the current `LocalSet`.
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// At most one recurring callback. Starting again replaces the previous one;
/// cancelling twice is a no-op.
#[derive(Debug, Default)]
pub struct PeriodicTask {
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `on_tick` every `period`, first one period from now. Ticks are
    /// not skipped when the callback runs long.
    ///
    /// Must be called from inside a `tokio::task::LocalSet`.
    pub fn start(&mut self, period: Duration, mut on_tick: impl FnMut() + 'static) {
        self.cancel();
        let period = period.max(MIN_PERIOD);
        let handle = tokio::task::spawn_local(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                ticker.tick().await;
                on_tick();
            }
        });
        self.handle = Some(handle);
    }

    /// Prevent future ticks. Returns whether a task was active.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn ticks_every_period_until_cancelled() {
        LocalSet::new()
            .run_until(async {
                let hits = Rc::new(Cell::new(0));
                let mut task = PeriodicTask::new();
                let counter = Rc::clone(&hits);
                task.start(Duration::from_millis(100), move || counter.set(counter.get() + 1));
                assert!(task.is_active());

                time::sleep(Duration::from_millis(350)).await;
                assert_eq!(hits.get(), 3);

                assert!(task.cancel());
                assert!(!task.cancel());
                time::sleep(Duration::from_millis(500)).await;
                assert_eq!(hits.get(), 3);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_schedule() {
        LocalSet::new()
            .run_until(async {
                let first = Rc::new(Cell::new(0));
                let second = Rc::new(Cell::new(0));
                let mut task = PeriodicTask::new();
                let a = Rc::clone(&first);
                task.start(Duration::from_millis(100), move || a.set(a.get() + 1));
                let b = Rc::clone(&second);
                task.start(Duration::from_millis(100), move || b.set(b.get() + 1));

                time::sleep(Duration::from_millis(250)).await;
                assert_eq!(first.get(), 0);
                assert_eq!(second.get(), 2);
            })
            .await;
    }
}
