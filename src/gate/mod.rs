//! Single-flight gate - serializes a class of async operations
//!
//! An async mutex with an explicit FIFO waiter queue. At most one caller
//! holds the gate at a time; the rest suspend in arrival order and are woken
//! one by one. The internal state sits behind a narrow `std::sync::Mutex`
//! that is only taken for queue transitions, never across a suspension of
//! the gated operation itself.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::{debug, trace};

/// A suspended caller waiting for its turn.
struct Waiter {
    id: u64,
    wake: oneshot::Sender<()>,
}

/// Held flag plus the FIFO queue of suspended callers.
struct GateState {
    held: bool,
    wait_queue: VecDeque<Waiter>,
}

/// Serializes access to a scarce external resource across arbitrarily many
/// concurrent callers.
///
/// Waiters are released strictly in enqueue order. Release happens exactly
/// once per acquire on every exit path: the returned [`GateGuard`] releases
/// on drop, whether the gated operation completes, fails, or is cancelled.
/// A waiter whose `acquire()` future is dropped before being woken is
/// removed from the queue; one dropped after being woken hands the slot to
/// the next waiter. The gate imposes no timeout; callers compose their own
/// deadline around `acquire()`.
pub struct SingleFlightGate {
    state: Mutex<GateState>,
    next_waiter_id: AtomicU64,
}

impl SingleFlightGate {
    /// Create an idle gate.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                held: false,
                wait_queue: VecDeque::new(),
            }),
            next_waiter_id: AtomicU64::new(0),
        }
    }

    /// Acquire the gate, suspending in FIFO order while another caller holds
    /// it. The returned guard releases the gate when dropped.
    pub async fn acquire(&self) -> GateGuard<'_> {
        let (id, woken) = {
            let mut state = self.state.lock().expect("gate state lock poisoned");

            if !state.held {
                state.held = true;
                trace!("gate acquired without waiting");
                return GateGuard { gate: self };
            }

            let id = self.next_waiter_id.fetch_add(1, Ordering::Relaxed);
            let (wake, woken) = oneshot::channel();
            state.wait_queue.push_back(Waiter { id, wake });
            debug!(waiter = id, queued = state.wait_queue.len(), "gate busy, waiting");
            (id, woken)
        };

        // If this future is dropped while suspended, the sentinel dequeues
        // the waiter (or, if it was already woken, passes the slot on).
        let mut enqueued = Enqueued {
            gate: self,
            id,
            acquired: false,
        };

        // The sender is owned by the queue and only consumed by a release,
        // so this resolves exactly when our turn comes.
        let _ = woken.await;

        enqueued.acquired = true;
        trace!(waiter = id, "gate acquired after waiting");
        GateGuard { gate: self }
    }

    /// Acquire the gate only if it is idle right now.
    pub fn try_acquire(&self) -> Option<GateGuard<'_>> {
        let mut state = self.state.lock().expect("gate state lock poisoned");
        if state.held {
            return None;
        }
        state.held = true;
        Some(GateGuard { gate: self })
    }

    /// Whether some caller currently holds the gate.
    pub fn is_held(&self) -> bool {
        self.state.lock().expect("gate state lock poisoned").held
    }

    /// Number of callers currently suspended in the queue.
    pub fn waiters(&self) -> usize {
        self.state
            .lock()
            .expect("gate state lock poisoned")
            .wait_queue
            .len()
    }

    /// Wake the next live waiter, or mark the gate idle if none remain.
    fn release(&self) {
        let mut state = self.state.lock().expect("gate state lock poisoned");
        Self::release_locked(&mut state);
    }

    fn release_locked(state: &mut GateState) {
        while let Some(waiter) = state.wait_queue.pop_front() {
            // A failed send means the waiter was abandoned after enqueueing;
            // skip it and try the next one.
            if waiter.wake.send(()).is_ok() {
                trace!(waiter = waiter.id, "gate handed to next waiter");
                return;
            }
        }
        state.held = false;
        trace!("gate idle");
    }
}

impl Default for SingleFlightGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the gate for the scope of the gated operation; releases on drop.
#[must_use = "dropping the guard releases the gate"]
pub struct GateGuard<'a> {
    gate: &'a SingleFlightGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// Drop sentinel for a queued waiter: cleans up if the `acquire()` future is
/// cancelled before it produces a guard.
struct Enqueued<'a> {
    gate: &'a SingleFlightGate,
    id: u64,
    acquired: bool,
}

impl Drop for Enqueued<'_> {
    fn drop(&mut self) {
        if self.acquired {
            return;
        }

        let mut state = self
            .gate
            .state
            .lock()
            .expect("gate state lock poisoned");

        if let Some(pos) = state.wait_queue.iter().position(|w| w.id == self.id) {
            // Never woken: just leave the queue, no side effects.
            state.wait_queue.remove(pos);
            debug!(waiter = self.id, "waiter cancelled while queued");
        } else {
            // Already woken but the caller abandoned the slot before taking
            // the guard; pass it to the next waiter.
            SingleFlightGate::release_locked(&mut state);
            debug!(waiter = self.id, "waiter cancelled after wakeup");
        }
    }
}
