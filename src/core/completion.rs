//! Purpose: One-shot semaphore that signals encoder completion to a waiting host thread.
//! Exports: `Completion`, `WaitOutcome`.
//! Role: The single synchronization point shared between an encoder proxy and its waiter.
//! Invariants: Posts are never lost; a wait after a post returns immediately.
//! Invariants: The first wait that consumes a post releases the semaphore; later waits never block.
//! Invariants: Poisoned locks are recovered, never propagated as panics.
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitOutcome {
    Signaled,
    TimedOut,
}

#[derive(Debug, Default)]
struct Slot {
    posted: u64,
    released: bool,
}

#[derive(Debug, Default)]
pub struct Completion {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self) {
        let mut slot = self.lock();
        if !slot.released {
            slot.posted += 1;
        }
        self.ready.notify_all();
    }

    /// Blocks until posted. There is no deadline; a plugin that never closes hangs the caller.
    pub fn wait(&self) {
        let mut slot = self.lock();
        while !slot.released && slot.posted == 0 {
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        release(&mut slot);
    }

    pub fn wait_timeout(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();
        while !slot.released && slot.posted == 0 {
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut;
            }
            let (next, _) = self
                .ready
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            slot = next;
        }
        release(&mut slot);
        WaitOutcome::Signaled
    }

    pub fn pending(&self) -> u64 {
        self.lock().posted
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn release(slot: &mut Slot) {
    slot.posted = 0;
    slot.released = true;
}

#[cfg(test)]
mod tests {
    use super::{Completion, WaitOutcome};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn post_then_wait_does_not_block() {
        let completion = Completion::new();
        completion.post();
        assert_eq!(completion.pending(), 1);
        completion.wait();
        assert_eq!(completion.pending(), 0);
        assert!(completion.is_released());
    }

    #[test]
    fn waits_after_release_return_immediately() {
        let completion = Completion::new();
        completion.post();
        completion.wait();
        completion.wait();
        assert_eq!(
            completion.wait_timeout(Duration::from_millis(5)),
            WaitOutcome::Signaled
        );
        completion.post();
        assert_eq!(completion.pending(), 0);
    }

    #[test]
    fn wait_timeout_reports_timeout_without_post() {
        let completion = Completion::new();
        assert_eq!(
            completion.wait_timeout(Duration::from_millis(5)),
            WaitOutcome::TimedOut
        );
    }

    #[test]
    fn post_from_another_thread_wakes_waiter() {
        let completion = Arc::new(Completion::new());
        let poster = Arc::clone(&completion);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            poster.post();
        });
        assert_eq!(
            completion.wait_timeout(Duration::from_secs(5)),
            WaitOutcome::Signaled
        );
        handle.join().expect("join");
    }
}
